//! Bank-backed authentication
//!
//! Recognized banks authenticate persons; authenticated persons may vouch for
//! contracts they control. A transfer settles here when both sides resolve to
//! a valid authentication. Otherwise it falls through to the anonymous rules.
//!
//! Expiry is checked for the sender only: a receiver whose authentication has
//! lapsed can still be paid but cannot send until re-authenticated.

use dsp_core::Address;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::context::TransferContext;
use crate::decision::{PolicyRejection, Verdict};
use crate::error::{PolicyError, PolicyResult};
use crate::traits::TransferPolicy;

pub const AUTHENTICATED_POLICY: &str = "AuthenticatedPolicy";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bank {
    pub name: String,
    pub recognized: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonAuthentication {
    pub bank: Address,
    /// Unix seconds
    pub authenticated_at: i64,
}

/// How an address is known to the policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuthenticationStatus {
    Owner,
    Person {
        bank: Address,
        authenticated_at: i64,
        valid: bool,
    },
    Contract {
        person: Address,
        valid: bool,
    },
    Unauthenticated,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthenticatedPolicy {
    /// Issuer; always treated as authenticated
    owner: Address,
    validity_secs: i64,
    banks: HashMap<Address, Bank>,
    persons: HashMap<Address, PersonAuthentication>,
    /// contract -> authorizing person
    contracts: HashMap<Address, Address>,
}

impl AuthenticatedPolicy {
    pub fn new(owner: Address, validity_secs: i64) -> Self {
        Self {
            owner,
            validity_secs,
            banks: HashMap::new(),
            persons: HashMap::new(),
            contracts: HashMap::new(),
        }
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    // === Banks ===

    pub fn authenticate_bank(&mut self, bank: Address, name: impl Into<String>) {
        let name = name.into();
        tracing::info!(%bank, name = %name, "Bank recognized");
        self.banks.insert(
            bank,
            Bank {
                name,
                recognized: true,
            },
        );
    }

    /// Stop recognizing a bank. Persons it authenticated become invalid.
    pub fn revoke_bank(&mut self, bank: &Address) -> PolicyResult<()> {
        let entry = self
            .banks
            .get_mut(bank)
            .ok_or(PolicyError::UnknownBank(*bank))?;
        entry.recognized = false;
        tracing::info!(%bank, "Bank revoked");
        Ok(())
    }

    pub fn is_bank(&self, address: &Address) -> bool {
        self.banks.get(address).map(|b| b.recognized).unwrap_or(false)
    }

    pub fn bank(&self, address: &Address) -> Option<&Bank> {
        self.banks.get(address)
    }

    // === Persons ===

    /// Authenticate (or re-authenticate) `person` at `now`.
    ///
    /// Only the bank that authenticated a person may renew it, unless that
    /// bank is no longer recognized.
    pub fn set_authenticated_person(
        &mut self,
        bank: &Address,
        person: Address,
        now: i64,
    ) -> PolicyResult<()> {
        if !self.is_bank(bank) {
            return Err(PolicyError::NotBank(*bank));
        }
        if let Some(existing) = self.persons.get(&person) {
            if existing.bank != *bank && self.is_bank(&existing.bank) {
                return Err(PolicyError::NotIssuingBank {
                    person,
                    issuer: existing.bank,
                });
            }
        }

        self.persons.insert(
            person,
            PersonAuthentication {
                bank: *bank,
                authenticated_at: now,
            },
        );
        tracing::info!(%person, %bank, authenticated_at = now, "Person authenticated");
        Ok(())
    }

    pub fn revoke_authentication_person(
        &mut self,
        bank: &Address,
        person: &Address,
    ) -> PolicyResult<()> {
        if !self.is_bank(bank) {
            return Err(PolicyError::NotBank(*bank));
        }
        let existing = self
            .persons
            .get(person)
            .ok_or(PolicyError::PersonNotAuthenticated(*person))?;
        if existing.bank != *bank && self.is_bank(&existing.bank) {
            return Err(PolicyError::NotIssuingBank {
                person: *person,
                issuer: existing.bank,
            });
        }

        self.persons.remove(person);
        tracing::info!(%person, %bank, "Person authentication revoked");
        Ok(())
    }

    pub fn person(&self, person: &Address) -> Option<&PersonAuthentication> {
        self.persons.get(person)
    }

    // === Contracts ===

    /// A currently valid person vouches for a contract they control
    pub fn set_authenticated_contract(
        &mut self,
        person: &Address,
        contract: Address,
        now: i64,
    ) -> PolicyResult<()> {
        if *person != self.owner && !self.person_valid(person, now, true) {
            return Err(PolicyError::PersonNotAuthenticated(*person));
        }
        self.contracts.insert(contract, *person);
        tracing::info!(%contract, authorized_by = %person, "Contract authenticated");
        Ok(())
    }

    /// Any recognized bank, or the person who vouched, may revoke a contract
    pub fn revoke_authentication_contract(
        &mut self,
        caller: &Address,
        contract: &Address,
    ) -> PolicyResult<()> {
        let person = *self
            .contracts
            .get(contract)
            .ok_or(PolicyError::ContractNotAuthenticated(*contract))?;
        if !self.is_bank(caller) && *caller != person {
            return Err(PolicyError::NotAuthorizedToRevoke {
                caller: *caller,
                target: *contract,
            });
        }
        self.contracts.remove(contract);
        tracing::info!(%contract, revoked_by = %caller, "Contract authentication revoked");
        Ok(())
    }

    // === Queries ===

    fn person_valid(&self, person: &Address, now: i64, check_expiry: bool) -> bool {
        match self.persons.get(person) {
            Some(auth) => {
                self.is_bank(&auth.bank)
                    && (!check_expiry || now - auth.authenticated_at <= self.validity_secs)
            }
            None => false,
        }
    }

    /// Whether `address` counts as authenticated at `now`.
    ///
    /// `check_expiry` is true for senders and false for receivers.
    pub fn is_authenticated(&self, address: &Address, now: i64, check_expiry: bool) -> bool {
        if *address == self.owner {
            return true;
        }
        if self.persons.contains_key(address) {
            return self.person_valid(address, now, check_expiry);
        }
        match self.contracts.get(address) {
            Some(person) => *person == self.owner || self.person_valid(person, now, check_expiry),
            None => false,
        }
    }

    pub fn authentication_status(&self, address: &Address, now: i64) -> AuthenticationStatus {
        if *address == self.owner {
            return AuthenticationStatus::Owner;
        }
        if let Some(auth) = self.persons.get(address) {
            return AuthenticationStatus::Person {
                bank: auth.bank,
                authenticated_at: auth.authenticated_at,
                valid: self.person_valid(address, now, true),
            };
        }
        if let Some(person) = self.contracts.get(address) {
            return AuthenticationStatus::Contract {
                person: *person,
                valid: self.is_authenticated(address, now, true),
            };
        }
        AuthenticationStatus::Unauthenticated
    }
}

impl TransferPolicy for AuthenticatedPolicy {
    fn name(&self) -> &'static str {
        AUTHENTICATED_POLICY
    }

    fn check(&self, ctx: &TransferContext) -> Verdict {
        let sender_ok = self.is_authenticated(&ctx.from, ctx.now, true);
        let receiver_ok = self.is_authenticated(&ctx.to, ctx.now, false);

        if sender_ok && receiver_ok {
            Verdict::Settle
        } else {
            Verdict::Fallthrough(PolicyRejection::not_authenticated(
                self.name(),
                "Sender and/or recipient not authenticated",
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dsp_core::{Amount, ONE_DAY, ONE_YEAR};

    const T0: i64 = 1_672_531_200;

    struct Fixture {
        policy: AuthenticatedPolicy,
        bank: Address,
        user1: Address,
        user2: Address,
    }

    fn fixture() -> Fixture {
        let bank = Address::from_label("bank");
        let user1 = Address::from_label("user1");
        let user2 = Address::from_label("user2");
        let mut policy = AuthenticatedPolicy::new(Address::from_label("norges-bank"), ONE_YEAR);
        policy.authenticate_bank(bank, "Test bank ASA");
        policy.set_authenticated_person(&bank, user1, T0).unwrap();
        policy.set_authenticated_person(&bank, user2, T0).unwrap();
        Fixture {
            policy,
            bank,
            user1,
            user2,
        }
    }

    fn ctx(from: Address, to: Address, now: i64) -> TransferContext {
        TransferContext::new(from, to, Amount::from_units(1_0000), now)
    }

    #[test]
    fn test_both_authenticated_settles() {
        let f = fixture();
        assert_eq!(f.policy.check(&ctx(f.user1, f.user2, T0)), Verdict::Settle);
    }

    #[test]
    fn test_owner_is_authenticated() {
        let f = fixture();
        let owner = f.policy.owner();
        assert_eq!(f.policy.check(&ctx(owner, f.user1, T0)), Verdict::Settle);
    }

    #[test]
    fn test_unknown_receiver_falls_through() {
        let f = fixture();
        let verdict = f.policy.check(&ctx(f.user1, Address::from_label("stranger"), T0));
        let Verdict::Fallthrough(rejection) = verdict else {
            panic!("expected fallthrough");
        };
        assert_eq!(
            rejection.to_string(),
            "AuthenticatedPolicy: Sender and/or recipient not authenticated"
        );
    }

    #[test]
    fn test_revoked_sender_falls_through() {
        let mut f = fixture();
        f.policy.revoke_authentication_person(&f.bank, &f.user1).unwrap();
        assert!(matches!(
            f.policy.check(&ctx(f.user1, f.user2, T0)),
            Verdict::Fallthrough(_)
        ));
    }

    #[test]
    fn test_expiry_checked_for_sender_only() {
        let mut f = fixture();
        let later = T0 + ONE_YEAR + ONE_DAY;

        // receiver renewed, sender expired
        f.policy.set_authenticated_person(&f.bank, f.user2, later).unwrap();
        assert!(matches!(
            f.policy.check(&ctx(f.user1, f.user2, later)),
            Verdict::Fallthrough(_)
        ));

        // sender renewed, receiver expired
        let mut g = fixture();
        g.policy.set_authenticated_person(&g.bank, g.user1, later).unwrap();
        assert_eq!(g.policy.check(&ctx(g.user1, g.user2, later)), Verdict::Settle);
    }

    #[test]
    fn test_only_issuing_bank_reauthenticates() {
        let mut f = fixture();
        let other = Address::from_label("other-bank");
        f.policy.authenticate_bank(other, "Other bank");

        assert_eq!(
            f.policy.set_authenticated_person(&other, f.user1, T0 + 1),
            Err(PolicyError::NotIssuingBank {
                person: f.user1,
                issuer: f.bank
            })
        );
        assert!(f.policy.revoke_authentication_person(&other, &f.user1).is_err());

        // once the issuing bank is revoked, another bank may take over
        f.policy.revoke_bank(&f.bank).unwrap();
        assert!(!f.policy.is_authenticated(&f.user1, T0, true));
        f.policy.set_authenticated_person(&other, f.user1, T0 + 1).unwrap();
        assert!(f.policy.is_authenticated(&f.user1, T0 + 1, true));
    }

    #[test]
    fn test_non_bank_cannot_authenticate() {
        let mut f = fixture();
        let result = f
            .policy
            .set_authenticated_person(&f.user1, Address::from_label("x"), T0);
        assert_eq!(result, Err(PolicyError::NotBank(f.user1)));
    }

    #[test]
    fn test_contract_follows_person() {
        let mut f = fixture();
        let contract = Address::from_label("contract1");
        f.policy.set_authenticated_contract(&f.user1, contract, T0).unwrap();
        assert_eq!(f.policy.check(&ctx(contract, f.user2, T0)), Verdict::Settle);

        f.policy.revoke_authentication_person(&f.bank, &f.user1).unwrap();
        assert!(matches!(
            f.policy.check(&ctx(contract, f.user2, T0)),
            Verdict::Fallthrough(_)
        ));
    }

    #[test]
    fn test_contract_revocation_rights() {
        let mut f = fixture();
        let contract = Address::from_label("contract1");
        f.policy.set_authenticated_contract(&f.user1, contract, T0).unwrap();

        assert_eq!(
            f.policy.revoke_authentication_contract(&f.user2, &contract),
            Err(PolicyError::NotAuthorizedToRevoke {
                caller: f.user2,
                target: contract
            })
        );
        f.policy.revoke_authentication_contract(&f.bank, &contract).unwrap();
        assert_eq!(
            f.policy.authentication_status(&contract, T0),
            AuthenticationStatus::Unauthenticated
        );
    }

    #[test]
    fn test_unauthenticated_person_cannot_vouch() {
        let mut f = fixture();
        let stranger = Address::from_label("stranger");
        assert_eq!(
            f.policy
                .set_authenticated_contract(&stranger, Address::from_label("c"), T0),
            Err(PolicyError::PersonNotAuthenticated(stranger))
        );
    }
}
