//! CBS token: balances split into partitions
//!
//! Every balance is keyed by `(holder, partition)`. Holders can let an
//! operator act for them inside a single partition; controllers act for
//! everyone in every partition. No interest accrues here.

use dsp_core::{AccessControl, Address, Amount, Partition, Role, RoleGate};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::error::{PartitionedError, PartitionedResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartitionedLedger {
    name: String,
    symbol: String,
    decimals: u32,
    controllers: Vec<Address>,
    default_partitions: Vec<Partition>,
    roles: AccessControl,
    balances: HashMap<Address, BTreeMap<Partition, Amount>>,
    supply: BTreeMap<Partition, Amount>,
    total_supply: Amount,
    /// holder -> partition -> operators
    operators: HashMap<Address, BTreeMap<Partition, BTreeSet<Address>>>,
}

impl PartitionedLedger {
    /// `owner` administers minters and is the first minter
    pub fn new(
        owner: Address,
        name: impl Into<String>,
        symbol: impl Into<String>,
        decimals: u32,
        controllers: Vec<Address>,
        default_partitions: Vec<Partition>,
    ) -> Self {
        let mut roles = AccessControl::with_admin(owner);
        roles.insert(Role::Minter, owner);
        let name = name.into();

        tracing::info!(
            %name,
            %owner,
            controllers = controllers.len(),
            partitions = default_partitions.len(),
            "Partitioned token created"
        );

        Self {
            name,
            symbol: symbol.into(),
            decimals,
            controllers,
            default_partitions,
            roles,
            balances: HashMap::new(),
            supply: BTreeMap::new(),
            total_supply: Amount::ZERO,
            operators: HashMap::new(),
        }
    }

    // === Minters ===

    pub fn add_minter(&mut self, caller: &Address, account: Address) -> PartitionedResult<bool> {
        Ok(self.roles.grant_role(caller, Role::Minter, account)?)
    }

    pub fn remove_minter(&mut self, caller: &Address, account: &Address) -> PartitionedResult<bool> {
        Ok(self.roles.revoke_role(caller, Role::Minter, account)?)
    }

    pub fn is_minter(&self, account: &Address) -> bool {
        self.roles.has_role(Role::Minter, account)
    }

    pub fn is_controller(&self, account: &Address) -> bool {
        self.controllers.contains(account)
    }

    // === Issuance ===

    /// Issue into the first default partition
    pub fn issue(&mut self, caller: &Address, to: Address, amount: Amount) -> PartitionedResult<()> {
        let partition = *self
            .default_partitions
            .first()
            .ok_or(PartitionedError::NoDefaultPartition)?;
        self.issue_by_partition(caller, partition, to, amount)
    }

    pub fn issue_by_partition(
        &mut self,
        caller: &Address,
        partition: Partition,
        to: Address,
        amount: Amount,
    ) -> PartitionedResult<()> {
        if !self.is_controller(caller) && !self.is_minter(caller) {
            return Err(PartitionedError::NotIssuer(*caller));
        }
        if to.is_zero() {
            return Err(PartitionedError::InvalidAddress(
                "issue to the zero address".to_string(),
            ));
        }

        let supply = self
            .total_supply
            .checked_add(&amount)
            .ok_or(PartitionedError::Overflow("total supply"))?;
        let partition_supply = self
            .total_supply_by_partition(&partition)
            .checked_add(&amount)
            .ok_or(PartitionedError::Overflow("partition supply"))?;
        self.credit(to, partition, amount)?;
        self.supply.insert(partition, partition_supply);
        self.total_supply = supply;

        tracing::info!(%to, %partition, %amount, issued_by = %caller, "Issued");
        Ok(())
    }

    // === Transfers ===

    /// Move `amount` within `partition`; returns the destination partition
    pub fn transfer_by_partition(
        &mut self,
        partition: Partition,
        from: Address,
        to: Address,
        amount: Amount,
    ) -> PartitionedResult<Partition> {
        self.move_within(partition, from, to, amount)?;
        tracing::debug!(%from, %to, %partition, %amount, "Partition transfer");
        Ok(partition)
    }

    pub fn operator_transfer_by_partition(
        &mut self,
        operator: &Address,
        partition: Partition,
        from: Address,
        to: Address,
        amount: Amount,
    ) -> PartitionedResult<Partition> {
        self.require_operator(&partition, operator, &from)?;
        self.move_within(partition, from, to, amount)?;
        tracing::debug!(%operator, %from, %to, %partition, %amount, "Operator partition transfer");
        Ok(partition)
    }

    fn move_within(
        &mut self,
        partition: Partition,
        from: Address,
        to: Address,
        amount: Amount,
    ) -> PartitionedResult<()> {
        if to.is_zero() {
            return Err(PartitionedError::InvalidAddress(
                "transfer to the zero address".to_string(),
            ));
        }
        self.debit(from, partition, amount)?;
        self.credit(to, partition, amount)
    }

    // === Redemption ===

    pub fn redeem_by_partition(
        &mut self,
        holder: Address,
        partition: Partition,
        amount: Amount,
    ) -> PartitionedResult<()> {
        self.destroy(holder, partition, amount)
    }

    pub fn operator_redeem_by_partition(
        &mut self,
        operator: &Address,
        partition: Partition,
        holder: Address,
        amount: Amount,
    ) -> PartitionedResult<()> {
        self.require_operator(&partition, operator, &holder)?;
        self.destroy(holder, partition, amount)
    }

    fn destroy(&mut self, holder: Address, partition: Partition, amount: Amount) -> PartitionedResult<()> {
        self.debit(holder, partition, amount)?;
        // the debit succeeded, so both supplies cover the amount
        let partition_supply = self.total_supply_by_partition(&partition).saturating_sub(&amount);
        if partition_supply.is_zero() {
            self.supply.remove(&partition);
        } else {
            self.supply.insert(partition, partition_supply);
        }
        self.total_supply = self.total_supply.saturating_sub(&amount);

        tracing::info!(%holder, %partition, %amount, "Redeemed");
        Ok(())
    }

    // === Operators ===

    pub fn authorize_operator_by_partition(
        &mut self,
        holder: Address,
        partition: Partition,
        operator: Address,
    ) {
        self.operators
            .entry(holder)
            .or_default()
            .entry(partition)
            .or_default()
            .insert(operator);
        tracing::info!(%holder, %partition, %operator, "Operator authorized");
    }

    pub fn revoke_operator_by_partition(
        &mut self,
        holder: &Address,
        partition: &Partition,
        operator: &Address,
    ) -> bool {
        let Some(by_partition) = self.operators.get_mut(holder) else {
            return false;
        };
        let removed = by_partition
            .get_mut(partition)
            .map(|set| set.remove(operator))
            .unwrap_or(false);
        if removed {
            tracing::info!(%holder, %partition, %operator, "Operator revoked");
        }
        removed
    }

    /// Holders operate for themselves; controllers operate for everyone
    pub fn is_operator_for_partition(
        &self,
        partition: &Partition,
        operator: &Address,
        holder: &Address,
    ) -> bool {
        operator == holder
            || self.is_controller(operator)
            || self
                .operators
                .get(holder)
                .and_then(|by_partition| by_partition.get(partition))
                .map(|set| set.contains(operator))
                .unwrap_or(false)
    }

    fn require_operator(
        &self,
        partition: &Partition,
        operator: &Address,
        holder: &Address,
    ) -> PartitionedResult<()> {
        if self.is_operator_for_partition(partition, operator, holder) {
            Ok(())
        } else {
            Err(PartitionedError::NotOperator {
                operator: *operator,
                holder: *holder,
                partition: *partition,
            })
        }
    }

    // === Balances ===

    fn credit(&mut self, holder: Address, partition: Partition, amount: Amount) -> PartitionedResult<()> {
        let balance = self
            .balance_of_by_partition(&partition, &holder)
            .checked_add(&amount)
            .ok_or(PartitionedError::Overflow("balance"))?;
        self.balances.entry(holder).or_default().insert(partition, balance);
        Ok(())
    }

    fn debit(&mut self, holder: Address, partition: Partition, amount: Amount) -> PartitionedResult<()> {
        let available = self.balance_of_by_partition(&partition, &holder);
        let remaining = available.checked_sub(&amount).ok_or_else(|| {
            PartitionedError::InsufficientBalance {
                holder,
                partition,
                available: available.to_string(),
                required: amount.to_string(),
            }
        })?;
        let by_partition = self.balances.entry(holder).or_default();
        if remaining.is_zero() {
            by_partition.remove(&partition);
        } else {
            by_partition.insert(partition, remaining);
        }
        Ok(())
    }

    pub fn balance_of_by_partition(&self, partition: &Partition, holder: &Address) -> Amount {
        self.balances
            .get(holder)
            .and_then(|by_partition| by_partition.get(partition))
            .copied()
            .unwrap_or(Amount::ZERO)
    }

    /// Sum over all partitions
    pub fn balance_of(&self, holder: &Address) -> Amount {
        self.balances
            .get(holder)
            .map(|by_partition| {
                by_partition
                    .values()
                    .fold(Amount::ZERO, |acc, v| Amount::new_unchecked(acc.value() + v.value()))
            })
            .unwrap_or(Amount::ZERO)
    }

    /// Partitions in which `holder` has a balance
    pub fn partitions_of(&self, holder: &Address) -> Vec<Partition> {
        self.balances
            .get(holder)
            .map(|by_partition| by_partition.keys().copied().collect())
            .unwrap_or_default()
    }

    pub fn total_supply(&self) -> Amount {
        self.total_supply
    }

    pub fn total_supply_by_partition(&self, partition: &Partition) -> Amount {
        self.supply.get(partition).copied().unwrap_or(Amount::ZERO)
    }

    /// Partitions with outstanding supply
    pub fn total_partitions(&self) -> Vec<Partition> {
        self.supply.keys().copied().collect()
    }

    // === Metadata ===

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn decimals(&self) -> u32 {
        self.decimals
    }

    pub fn controllers(&self) -> &[Address] {
        &self.controllers
    }

    pub fn default_partitions(&self) -> &[Partition] {
        &self.default_partitions
    }

    pub fn roles(&self) -> &AccessControl {
        &self.roles
    }
}
