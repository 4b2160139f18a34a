//! CB <-> CBS swap bridge
//!
//! CB coming in is parked on the bridge's escrow address and CBS is issued
//! against it; CBS going back is redeemed and the escrowed CB released. Both
//! legs of a swap commit together or not at all.

use dsp_core::{AccessControl, AccrualContext, Address, Amount, Partition, Role, RoleGate};
use dsp_ledger::Ledger;
use serde::{Deserialize, Serialize};

use crate::error::{SwapError, SwapResult};
use crate::token::PartitionedLedger;

/// Label of the bridge's escrow address
pub const SWAP_ESCROW_LABEL: &str = "dsp:token-swap";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenSwap {
    address: Address,
    roles: AccessControl,
}

impl TokenSwap {
    /// Bridge administered by `admin`, who may also swap both ways
    pub fn new(admin: Address) -> Self {
        let mut roles = AccessControl::with_admin(admin);
        roles.insert(Role::SwapCbToCbs, admin);
        roles.insert(Role::SwapCbsToCb, admin);
        Self {
            address: Address::from_label(SWAP_ESCROW_LABEL),
            roles,
        }
    }

    /// Escrow address. It needs a CB allowance from swappers, the minter role
    /// on CBS, and operator rights in the partitions it redeems from.
    pub fn address(&self) -> Address {
        self.address
    }

    pub fn grant_role(&mut self, caller: &Address, role: Role, account: Address) -> SwapResult<bool> {
        Ok(self.roles.grant_role(caller, role, account)?)
    }

    pub fn revoke_role(&mut self, caller: &Address, role: Role, account: &Address) -> SwapResult<bool> {
        Ok(self.roles.revoke_role(caller, role, account)?)
    }

    /// Pull `amount` CB from `caller` into escrow and issue the same amount
    /// of CBS to `caller` in `partition`
    pub fn swap_cb_to_cbs(
        &self,
        ctx: &AccrualContext,
        cb: &mut Ledger,
        cbs: &mut PartitionedLedger,
        caller: &Address,
        partition: Partition,
        amount: Amount,
    ) -> SwapResult<()> {
        self.roles.require_role(Role::SwapCbToCbs, caller)?;

        atomically(cb, cbs, |cb, cbs| {
            let receipt = cb.transfer_from(ctx, &self.address, *caller, self.address, amount)?;
            if !receipt.held.is_zero() {
                return Err(SwapError::EscrowCapped {
                    held: receipt.held.to_string(),
                });
            }
            cbs.issue_by_partition(&self.address, partition, *caller, amount)?;
            Ok(())
        })?;

        tracing::info!(%caller, %partition, %amount, "Swapped CB to CBS");
        Ok(())
    }

    /// Redeem `amount` CBS of `caller` in `partition` and release the same
    /// amount of CB from escrow
    pub fn swap_cbs_to_cb(
        &self,
        ctx: &AccrualContext,
        cb: &mut Ledger,
        cbs: &mut PartitionedLedger,
        caller: &Address,
        partition: Partition,
        amount: Amount,
    ) -> SwapResult<()> {
        self.roles.require_role(Role::SwapCbsToCb, caller)?;

        atomically(cb, cbs, |cb, cbs| {
            cbs.operator_redeem_by_partition(&self.address, partition, *caller, amount)?;
            cb.transfer(ctx, self.address, *caller, amount)?;
            Ok(())
        })?;

        tracing::info!(%caller, %partition, %amount, "Swapped CBS to CB");
        Ok(())
    }
}

impl RoleGate for TokenSwap {
    fn has_role(&self, role: Role, actor: &Address) -> bool {
        self.roles.has_role(role, actor)
    }
}

/// Run `op` against both ledgers, restoring both if it fails
fn atomically<T>(
    cb: &mut Ledger,
    cbs: &mut PartitionedLedger,
    op: impl FnOnce(&mut Ledger, &mut PartitionedLedger) -> SwapResult<T>,
) -> SwapResult<T> {
    let (cb_before, cbs_before) = (cb.clone(), cbs.clone());
    op(cb, cbs).map_err(|err| {
        tracing::warn!(error = %err, "Swap rolled back");
        *cb = cb_before;
        *cbs = cbs_before;
        err
    })
}
