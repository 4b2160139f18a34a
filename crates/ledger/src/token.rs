//! CB token ledger
//!
//! Balances are stored as principal and displayed through the interest index.
//! Every transfer is judged by the policy chain before any balance moves, and
//! policy state is only updated after the balances have been applied.

use dsp_core::{AccessControl, AccrualContext, Address, Amount, Role, RoleGate};
use dsp_interest::InterestIndex;
use dsp_policy::{Outcome, PolicyChain, TransferContext};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::account::Account;
use crate::config::TokenConfig;
use crate::error::{LedgerError, LedgerResult};

/// Label of the account holding balances above receiver caps
pub const OVERFLOW_RESERVE_LABEL: &str = "dsp:overflow-reserve";

/// What an accepted transfer did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferReceipt {
    /// Reached the receiver's balance
    pub credited: Amount,
    /// Held as the receiver's overflow
    pub held: Amount,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ledger {
    pub(crate) config: TokenConfig,
    pub(crate) issuer: Address,
    pub(crate) overflow_reserve: Address,
    pub(crate) roles: AccessControl,
    pub(crate) interest: InterestIndex,
    pub(crate) accounts: HashMap<Address, Account>,
    pub(crate) total_principal: Amount,
    /// owner -> spender -> remaining allowance
    pub(crate) allowances: HashMap<Address, HashMap<Address, Amount>>,
    pub(crate) policies: PolicyChain,
}

impl Ledger {
    /// New token issued by `issuer`, who receives admin, minter and burner roles.
    /// The policy chain starts empty.
    pub fn new(config: TokenConfig, issuer: Address, ctx: AccrualContext) -> Self {
        let mut roles = AccessControl::with_admin(issuer);
        roles.insert(Role::Minter, issuer);
        roles.insert(Role::Burner, issuer);

        tracing::info!(
            name = %config.name,
            symbol = %config.symbol,
            %issuer,
            year = ctx.year,
            "Token created"
        );

        Self {
            interest: InterestIndex::with_max_rate(ctx, config.max_annual_rate),
            config,
            issuer,
            overflow_reserve: Address::from_label(OVERFLOW_RESERVE_LABEL),
            roles,
            accounts: HashMap::new(),
            total_principal: Amount::ZERO,
            allowances: HashMap::new(),
            policies: PolicyChain::new(),
        }
    }

    // === Supply ===

    pub fn mint(
        &mut self,
        ctx: &AccrualContext,
        caller: &Address,
        to: Address,
        amount: Amount,
    ) -> LedgerResult<()> {
        self.roles.require_role(Role::Minter, caller)?;
        if to.is_zero() {
            return Err(LedgerError::InvalidAddress("mint to the zero address".to_string()));
        }
        self.interest.recalculate(ctx)?;

        let principal = self.interest.to_principal(amount)?;
        let total = self
            .total_principal
            .checked_add(&principal)
            .ok_or(LedgerError::Overflow("total principal"))?;
        let year = self.interest.current_year();
        self.accounts.entry(to).or_default().credit(year, principal, amount)?;
        self.total_principal = total;

        tracing::info!(%to, %amount, %principal, "Minted");
        Ok(())
    }

    pub fn burn(
        &mut self,
        ctx: &AccrualContext,
        caller: &Address,
        from: Address,
        amount: Amount,
    ) -> LedgerResult<()> {
        self.roles.require_role(Role::Burner, caller)?;
        self.interest.recalculate(ctx)?;
        self.destroy(from, amount)
    }

    fn destroy(&mut self, from: Address, amount: Amount) -> LedgerResult<()> {
        self.require_balance(&from, amount)?;

        let principal = self.interest.to_principal(amount)?;
        let total = self
            .total_principal
            .checked_sub(&principal)
            .ok_or(LedgerError::Overflow("total principal"))?;
        let year = self.interest.current_year();
        self.accounts.entry(from).or_default().debit(year, principal, amount)?;
        self.total_principal = total;

        tracing::info!(%from, %amount, %principal, "Burned");
        Ok(())
    }

    // === Transfers ===

    /// Move `amount` from `from` to `to` through the policy chain.
    ///
    /// Transfers to the zero address burn, and only the issuer may do that.
    pub fn transfer(
        &mut self,
        ctx: &AccrualContext,
        from: Address,
        to: Address,
        amount: Amount,
    ) -> LedgerResult<TransferReceipt> {
        self.interest.recalculate(ctx)?;

        if to.is_zero() {
            if from != self.issuer {
                return Err(LedgerError::ForbiddenBurnTransfer(from));
            }
            self.destroy(from, amount)?;
            return Ok(TransferReceipt {
                credited: Amount::ZERO,
                held: Amount::ZERO,
            });
        }

        self.require_balance(&from, amount)?;

        let transfer = TransferContext::new(from, to, amount, ctx.now)
            .with_receiver_balance(self.balance_of(&to)?)
            .with_total_supply(self.total_supply()?);
        let evaluation = self.policies.evaluate(&transfer);

        let (credited, held) = match &evaluation.outcome {
            Outcome::Accept(credited) => (*credited, Amount::ZERO),
            Outcome::AcceptWithOverflow { immediate, held } => (*immediate, *held),
            Outcome::Reject(rejection) => {
                tracing::warn!(
                    %from,
                    %to,
                    %amount,
                    policy = %rejection.policy,
                    reason = %rejection.reason,
                    "Transfer rejected"
                );
                return Err(rejection.clone().into());
            }
        };

        self.apply_transfer(from, to, amount, credited)?;
        self.policies.commit(&transfer, &evaluation);

        tracing::debug!(%from, %to, %amount, %credited, %held, "Transfer applied");
        Ok(TransferReceipt { credited, held })
    }

    /// Debit `amount` from `from`; credit `credited` to `to` and the rest to
    /// the overflow reserve. Principal is conserved exactly.
    fn apply_transfer(
        &mut self,
        from: Address,
        to: Address,
        amount: Amount,
        credited: Amount,
    ) -> LedgerResult<()> {
        let year = self.interest.current_year();
        let debit = self.interest.to_principal(amount)?;
        let to_receiver = self.interest.to_principal(credited)?.min(debit);
        let to_reserve = debit.saturating_sub(&to_receiver);
        let held = amount.saturating_sub(&credited);

        // require_balance ran first, so the debit cannot underflow
        self.accounts.entry(from).or_default().debit(year, debit, amount)?;
        self.accounts
            .entry(to)
            .or_default()
            .credit(year, to_receiver, credited)?;
        if !to_reserve.is_zero() {
            self.accounts
                .entry(self.overflow_reserve)
                .or_default()
                .credit(year, to_reserve, held)?;
        }
        Ok(())
    }

    pub fn approve(&mut self, owner: Address, spender: Address, amount: Amount) -> LedgerResult<()> {
        if spender.is_zero() {
            return Err(LedgerError::InvalidAddress("approve the zero address".to_string()));
        }
        self.allowances.entry(owner).or_default().insert(spender, amount);
        tracing::debug!(%owner, %spender, %amount, "Allowance set");
        Ok(())
    }

    pub fn allowance(&self, owner: &Address, spender: &Address) -> Amount {
        self.allowances
            .get(owner)
            .and_then(|spenders| spenders.get(spender))
            .copied()
            .unwrap_or(Amount::ZERO)
    }

    /// Transfer on behalf of `from`, consuming `spender`'s allowance
    pub fn transfer_from(
        &mut self,
        ctx: &AccrualContext,
        spender: &Address,
        from: Address,
        to: Address,
        amount: Amount,
    ) -> LedgerResult<TransferReceipt> {
        let available = self.allowance(&from, spender);
        let remaining = available
            .checked_sub(&amount)
            .ok_or_else(|| LedgerError::InsufficientAllowance {
                owner: from,
                spender: *spender,
                available: available.to_string(),
                required: amount.to_string(),
            })?;

        let receipt = self.transfer(ctx, from, to, amount)?;
        self.allowances.entry(from).or_default().insert(*spender, remaining);
        Ok(receipt)
    }

    fn require_balance(&self, account: &Address, amount: Amount) -> LedgerResult<()> {
        let available = self.balance_of(account)?;
        if available < amount {
            return Err(LedgerError::InsufficientBalance {
                account: *account,
                available: available.to_string(),
                required: amount.to_string(),
            });
        }
        Ok(())
    }

    // === Reads (at the stored index; call recalculate_index first) ===

    pub fn principal_of(&self, account: &Address) -> Amount {
        self.accounts
            .get(account)
            .map(Account::principal)
            .unwrap_or(Amount::ZERO)
    }

    pub fn balance_of(&self, account: &Address) -> LedgerResult<Amount> {
        Ok(self.interest.to_scaled(self.principal_of(account))?)
    }

    pub fn total_principal(&self) -> Amount {
        self.total_principal
    }

    pub fn total_supply(&self) -> LedgerResult<Amount> {
        Ok(self.interest.to_scaled(self.total_principal)?)
    }

    pub fn account(&self, account: &Address) -> Option<&Account> {
        self.accounts.get(account)
    }

    /// Addresses with an account, sorted
    pub fn holders(&self) -> Vec<Address> {
        let mut holders: Vec<Address> = self.accounts.keys().copied().collect();
        holders.sort();
        holders
    }

    // === Interest ===

    pub fn recalculate_index(&mut self, ctx: &AccrualContext) -> LedgerResult<()> {
        Ok(self.interest.recalculate(ctx)?)
    }

    pub fn set_interest_rate(
        &mut self,
        ctx: &AccrualContext,
        caller: &Address,
        ray: u128,
        keep_year_boundary: bool,
    ) -> LedgerResult<()> {
        self.roles.require_role(Role::DefaultAdmin, caller)?;
        Ok(self.interest.set_interest_rate(ctx, ray, keep_year_boundary)?)
    }

    /// Closing index of a finished year
    pub fn calculate_eoy_interest(&mut self, ctx: &AccrualContext, year: i32) -> LedgerResult<Decimal> {
        Ok(self.interest.calculate_eoy_interest(ctx, year)?)
    }

    /// Interest `account` earned during accounting `year`.
    ///
    /// Closing value minus opening value minus net inflow, never negative.
    /// Years the token did not exist in, or that have not started, earn zero.
    pub fn interest_earned(&self, account: &Address, year: i32) -> LedgerResult<Amount> {
        let Some(holder) = self.accounts.get(account) else {
            return Ok(Amount::ZERO);
        };
        let (Some(index_start), Some(index_end)) = (
            self.interest.index_at_year_start(year),
            self.interest.index_at_year_end(year),
        ) else {
            return Ok(Amount::ZERO);
        };

        let opening = InterestIndex::scale_with(holder.opening_principal(year), index_start)?;
        let closing = InterestIndex::scale_with(holder.closing_principal(year), index_end)?;
        let (received, sent) = holder
            .year(year)
            .map(|r| (r.received, r.sent))
            .unwrap_or((Amount::ZERO, Amount::ZERO));

        let earned = closing.value() + sent.value() - opening.value() - received.value();
        if earned <= Decimal::ZERO {
            return Ok(Amount::ZERO);
        }
        Ok(Amount::truncated(earned)?)
    }

    pub fn interest(&self) -> &InterestIndex {
        &self.interest
    }

    // === Roles ===

    pub fn grant_role(&mut self, caller: &Address, role: Role, account: Address) -> LedgerResult<bool> {
        Ok(self.roles.grant_role(caller, role, account)?)
    }

    pub fn revoke_role(&mut self, caller: &Address, role: Role, account: &Address) -> LedgerResult<bool> {
        Ok(self.roles.revoke_role(caller, role, account)?)
    }

    pub fn renounce_role(&mut self, caller: &Address, role: Role, account: &Address) -> LedgerResult<bool> {
        Ok(self.roles.renounce_role(caller, role, account)?)
    }

    pub fn roles(&self) -> &AccessControl {
        &self.roles
    }

    // === Metadata ===

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn symbol(&self) -> &str {
        &self.config.symbol
    }

    pub fn decimals(&self) -> u32 {
        self.config.decimals
    }

    pub fn config(&self) -> &TokenConfig {
        &self.config
    }

    pub fn issuer(&self) -> Address {
        self.issuer
    }

    pub fn overflow_reserve(&self) -> Address {
        self.overflow_reserve
    }
}

impl RoleGate for Ledger {
    fn has_role(&self, role: Role, actor: &Address) -> bool {
        self.roles.has_role(role, actor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dsp_core::ONE_YEAR;
    use dsp_interest::RAY;
    use rust_decimal_macros::dec;

    const JAN_1_2023: i64 = 1_672_531_200;

    fn amount(value: Decimal) -> Amount {
        Amount::new(value).unwrap()
    }

    fn setup() -> (Ledger, AccrualContext, Address) {
        let ctx = AccrualContext::at(JAN_1_2023);
        let issuer = Address::from_label("issuer");
        (Ledger::new(TokenConfig::default(), issuer, ctx), ctx, issuer)
    }

    #[test]
    fn test_mint_requires_minter() {
        let (mut ledger, ctx, _) = setup();
        let alice = Address::from_label("alice");
        let err = ledger.mint(&ctx, &alice, alice, amount(dec!(1))).unwrap_err();
        assert_eq!(
            err,
            LedgerError::Unauthorized {
                actor: alice,
                role: Role::Minter
            }
        );
    }

    #[test]
    fn test_mint_to_zero_rejected() {
        let (mut ledger, ctx, issuer) = setup();
        let err = ledger
            .mint(&ctx, &issuer, Address::ZERO, amount(dec!(1)))
            .unwrap_err();
        assert!(matches!(err, LedgerError::InvalidAddress(_)));
    }

    #[test]
    fn test_mint_then_burn_restores_supply() {
        let (mut ledger, ctx, issuer) = setup();
        ledger.set_interest_rate(&ctx, &issuer, RAY / 3, false).unwrap();
        ledger.mint(&ctx, &issuer, issuer, amount(dec!(1000))).unwrap();

        let later = ctx.advance(1_234_567);
        ledger.recalculate_index(&later).unwrap();
        let before = ledger.total_principal();
        ledger.mint(&later, &issuer, issuer, amount(dec!(77.7777))).unwrap();
        ledger.burn(&later, &issuer, issuer, amount(dec!(77.7777))).unwrap();
        assert_eq!(ledger.total_principal(), before);
    }

    #[test]
    fn test_burn_more_than_balance() {
        let (mut ledger, ctx, issuer) = setup();
        ledger.mint(&ctx, &issuer, issuer, amount(dec!(10))).unwrap();
        let err = ledger
            .burn(&ctx, &issuer, issuer, amount(dec!(10.0001)))
            .unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientBalance { .. }));
    }

    #[test]
    fn test_transfer_to_zero_only_for_issuer() {
        let (mut ledger, ctx, issuer) = setup();
        let alice = Address::from_label("alice");
        ledger.mint(&ctx, &issuer, alice, amount(dec!(10))).unwrap();
        ledger.mint(&ctx, &issuer, issuer, amount(dec!(10))).unwrap();

        assert_eq!(
            ledger.transfer(&ctx, alice, Address::ZERO, amount(dec!(1))),
            Err(LedgerError::ForbiddenBurnTransfer(alice))
        );
        ledger
            .transfer(&ctx, issuer, Address::ZERO, amount(dec!(4)))
            .unwrap();
        assert_eq!(ledger.total_supply().unwrap(), amount(dec!(16)));
    }

    #[test]
    fn test_allowance_consumed_by_transfer_from() {
        let (mut ledger, ctx, issuer) = setup();
        let alice = Address::from_label("alice");
        let spender = Address::from_label("swap");
        ledger.mint(&ctx, &issuer, alice, amount(dec!(100))).unwrap();
        ledger.approve(alice, spender, amount(dec!(60))).unwrap();

        ledger
            .transfer_from(&ctx, &spender, alice, spender, amount(dec!(40)))
            .unwrap();
        assert_eq!(ledger.allowance(&alice, &spender), amount(dec!(20)));
        assert_eq!(ledger.balance_of(&spender).unwrap(), amount(dec!(40)));

        let err = ledger
            .transfer_from(&ctx, &spender, alice, spender, amount(dec!(21)))
            .unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientAllowance { .. }));
        assert_eq!(ledger.balance_of(&alice).unwrap(), amount(dec!(60)));
    }

    #[test]
    fn test_rate_change_requires_admin() {
        let (mut ledger, ctx, _) = setup();
        let alice = Address::from_label("alice");
        assert!(matches!(
            ledger.set_interest_rate(&ctx, &alice, RAY / 2, false),
            Err(LedgerError::Unauthorized { .. })
        ));
    }

    #[test]
    fn test_rate_above_maximum_is_invalid_rate() {
        let (mut ledger, ctx, issuer) = setup();
        assert!(matches!(
            ledger.set_interest_rate(&ctx, &issuer, 5 * RAY, false),
            Err(LedgerError::InvalidRate(_))
        ));
    }

    #[test]
    fn test_interest_earned_zero_without_holding() {
        let (mut ledger, ctx, issuer) = setup();
        ledger.set_interest_rate(&ctx, &issuer, RAY / 2, false).unwrap();
        ledger.recalculate_index(&ctx.advance(ONE_YEAR)).unwrap();

        let nobody = Address::from_label("nobody");
        assert_eq!(ledger.interest_earned(&nobody, 2023).unwrap(), Amount::ZERO);
        assert_eq!(ledger.interest_earned(&issuer, 2022).unwrap(), Amount::ZERO);
        assert_eq!(ledger.interest_earned(&issuer, 2030).unwrap(), Amount::ZERO);
    }

    #[test]
    fn test_ledger_round_trips_through_json() {
        let (mut ledger, ctx, issuer) = setup();
        ledger.mint(&ctx, &issuer, issuer, amount(dec!(5))).unwrap();
        let json = serde_json::to_string(&ledger).unwrap();
        let back: Ledger = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ledger);
    }
}
