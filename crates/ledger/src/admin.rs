//! Policy administration on the ledger
//!
//! The chain and its policies are owned by the ledger. Chain layout, balance
//! caps and bank recognition need DEFAULT_ADMIN; person authentication needs
//! a recognized bank holding the BANK role.

use dsp_core::{AccrualContext, Address, Amount, Role, RoleGate};
use dsp_policy::{AuthenticationStatus, Policy, PolicyChain, PolicyId};

use crate::error::{LedgerError, LedgerResult};
use crate::token::Ledger;

impl Ledger {
    // === Chain layout ===

    pub fn register_policy(&mut self, caller: &Address, policy: Policy) -> LedgerResult<PolicyId> {
        self.roles.require_role(Role::DefaultAdmin, caller)?;
        Ok(self.policies.register(policy))
    }

    pub fn set_default_policy(&mut self, caller: &Address, id: Option<PolicyId>) -> LedgerResult<()> {
        self.roles.require_role(Role::DefaultAdmin, caller)?;
        Ok(self.policies.set_default_policy(id)?)
    }

    pub fn set_next_policy(
        &mut self,
        caller: &Address,
        id: PolicyId,
        next: Option<PolicyId>,
    ) -> LedgerResult<()> {
        self.roles.require_role(Role::DefaultAdmin, caller)?;
        Ok(self.policies.set_next_policy(id, next)?)
    }

    /// Replace the whole chain, e.g. with [`PolicyChain::regulated`]
    pub fn install_policy_chain(&mut self, caller: &Address, chain: PolicyChain) -> LedgerResult<()> {
        self.roles.require_role(Role::DefaultAdmin, caller)?;
        tracing::info!(policies = chain.len(), "Policy chain installed");
        self.policies = chain;
        Ok(())
    }

    pub fn policies(&self) -> &PolicyChain {
        &self.policies
    }

    // === Balance cap ===

    pub fn set_exempt(&mut self, caller: &Address, account: Address, exempt: bool) -> LedgerResult<()> {
        self.roles.require_role(Role::DefaultAdmin, caller)?;
        self.policies.balance_limit_mut()?.set_exempt(account, exempt);
        Ok(())
    }

    pub fn user_balance_limit_of(&self, account: &Address) -> LedgerResult<Amount> {
        let supply = self.total_supply()?;
        Ok(self.policies.balance_limit()?.user_balance_limit_of(account, supply))
    }

    pub fn overflow_balance_of(&self, account: &Address) -> LedgerResult<Amount> {
        Ok(self.policies.balance_limit()?.overflow_balance_of(account))
    }

    /// Pay out as much of `account`'s overflow as fits under its cap.
    /// Only the account holder may drain its own overflow.
    ///
    /// Returns the amount moved from the overflow reserve.
    pub fn release_overflow(
        &mut self,
        ctx: &AccrualContext,
        caller: &Address,
        account: Address,
    ) -> LedgerResult<Amount> {
        if *caller != account {
            return Err(LedgerError::NotAccountHolder {
                caller: *caller,
                account,
            });
        }
        self.interest.recalculate(ctx)?;

        let balance = self.balance_of(&account)?;
        let supply = self.total_supply()?;
        let reserve = self.balance_of(&self.overflow_reserve)?;
        let release = self
            .policies
            .balance_limit()?
            .releasable(&account, balance, supply)
            .min(reserve);
        if release.is_zero() {
            return Ok(Amount::ZERO);
        }

        let principal = self
            .interest
            .to_principal(release)?
            .min(self.principal_of(&self.overflow_reserve));
        let year = self.interest.current_year();
        let reserve_address = self.overflow_reserve;
        self.accounts
            .entry(reserve_address)
            .or_default()
            .debit(year, principal, release)?;
        self.accounts
            .entry(account)
            .or_default()
            .credit(year, principal, release)?;
        self.policies.balance_limit_mut()?.take_overflow(&account, release);

        tracing::info!(%account, %release, "Overflow released");
        Ok(release)
    }

    // === Authentication ===

    /// Recognize a bank and grant it the BANK role
    pub fn authenticate_bank(
        &mut self,
        caller: &Address,
        bank: Address,
        name: impl Into<String>,
    ) -> LedgerResult<()> {
        self.roles.require_role(Role::DefaultAdmin, caller)?;
        self.policies.authenticated_mut()?.authenticate_bank(bank, name);
        self.roles.grant_role(caller, Role::Bank, bank)?;
        Ok(())
    }

    /// Stop recognizing a bank and take its BANK role
    pub fn revoke_bank(&mut self, caller: &Address, bank: &Address) -> LedgerResult<()> {
        self.roles.require_role(Role::DefaultAdmin, caller)?;
        self.policies.authenticated_mut()?.revoke_bank(bank)?;
        self.roles.revoke_role(caller, Role::Bank, bank)?;
        Ok(())
    }

    pub fn set_authenticated_person(
        &mut self,
        ctx: &AccrualContext,
        bank: &Address,
        person: Address,
    ) -> LedgerResult<()> {
        self.roles.require_role(Role::Bank, bank)?;
        Ok(self
            .policies
            .authenticated_mut()?
            .set_authenticated_person(bank, person, ctx.now)?)
    }

    pub fn revoke_authentication_person(&mut self, bank: &Address, person: &Address) -> LedgerResult<()> {
        self.roles.require_role(Role::Bank, bank)?;
        Ok(self
            .policies
            .authenticated_mut()?
            .revoke_authentication_person(bank, person)?)
    }

    /// An authenticated person vouches for a contract address
    pub fn set_authenticated_contract(
        &mut self,
        ctx: &AccrualContext,
        person: &Address,
        contract: Address,
    ) -> LedgerResult<()> {
        if contract.is_zero() {
            return Err(LedgerError::InvalidAddress(
                "authenticate the zero address".to_string(),
            ));
        }
        Ok(self
            .policies
            .authenticated_mut()?
            .set_authenticated_contract(person, contract, ctx.now)?)
    }

    pub fn revoke_authentication_contract(
        &mut self,
        caller: &Address,
        contract: &Address,
    ) -> LedgerResult<()> {
        Ok(self
            .policies
            .authenticated_mut()?
            .revoke_authentication_contract(caller, contract)?)
    }

    pub fn authentication_status(
        &self,
        ctx: &AccrualContext,
        account: &Address,
    ) -> LedgerResult<AuthenticationStatus> {
        Ok(self
            .policies
            .authenticated()?
            .authentication_status(account, ctx.now))
    }

    pub fn is_bank(&self, account: &Address) -> bool {
        self.has_role(Role::Bank, account)
            && self
                .policies
                .authenticated()
                .map(|p| p.is_bank(account))
                .unwrap_or(false)
    }
}
