//! Role-based access control
//!
//! The token components only ask one question of their surroundings: does this
//! actor hold this role? [`RoleGate`] is that question; [`AccessControl`] is the
//! in-memory answer used by the ledgers and the swap bridge.

use crate::Address;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use strum_macros::{Display, EnumString};
use thiserror::Error;

/// Capabilities granted to addresses
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, EnumString, Display,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Administers every other role, the rate and the policy chain
    DefaultAdmin,
    Minter,
    Burner,
    /// May move CB into the partitioned token through the swap bridge
    SwapCbToCbs,
    /// May move partitioned balances back into CB
    SwapCbsToCb,
    /// Recognized bank allowed to authenticate persons
    Bank,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccessError {
    #[error("{actor} is missing role {role}")]
    Unauthorized { actor: Address, role: Role },

    #[error("Only the account itself may renounce its role")]
    RenounceForOther,
}

/// Yes/no capability check
pub trait RoleGate {
    fn has_role(&self, role: Role, actor: &Address) -> bool;

    /// Fail with [`AccessError::Unauthorized`] unless `actor` holds `role`
    fn require_role(&self, role: Role, actor: &Address) -> Result<(), AccessError> {
        if self.has_role(role, actor) {
            Ok(())
        } else {
            Err(AccessError::Unauthorized {
                actor: *actor,
                role,
            })
        }
    }
}

/// Role membership table. `DefaultAdmin` administers every role.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccessControl {
    members: HashMap<Role, HashSet<Address>>,
}

impl AccessControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Table with `admin` holding `DefaultAdmin`
    pub fn with_admin(admin: Address) -> Self {
        let mut acl = Self::new();
        acl.insert(Role::DefaultAdmin, admin);
        acl
    }

    /// Grant without an admin check. Used while constructing a component.
    pub fn insert(&mut self, role: Role, account: Address) -> bool {
        self.members.entry(role).or_default().insert(account)
    }

    pub fn grant_role(
        &mut self,
        caller: &Address,
        role: Role,
        account: Address,
    ) -> Result<bool, AccessError> {
        self.require_role(Role::DefaultAdmin, caller)?;
        let added = self.insert(role, account);
        if added {
            tracing::info!(%role, %account, granted_by = %caller, "Role granted");
        }
        Ok(added)
    }

    pub fn revoke_role(
        &mut self,
        caller: &Address,
        role: Role,
        account: &Address,
    ) -> Result<bool, AccessError> {
        self.require_role(Role::DefaultAdmin, caller)?;
        Ok(self.remove(role, account))
    }

    /// An account may only renounce its own roles
    pub fn renounce_role(
        &mut self,
        caller: &Address,
        role: Role,
        account: &Address,
    ) -> Result<bool, AccessError> {
        if caller != account {
            return Err(AccessError::RenounceForOther);
        }
        Ok(self.remove(role, account))
    }

    pub fn members(&self, role: Role) -> Vec<Address> {
        let mut members: Vec<Address> = self
            .members
            .get(&role)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default();
        members.sort();
        members
    }

    fn remove(&mut self, role: Role, account: &Address) -> bool {
        let removed = self
            .members
            .get_mut(&role)
            .map(|set| set.remove(account))
            .unwrap_or(false);
        if removed {
            tracing::info!(%role, %account, "Role revoked");
        }
        removed
    }
}

impl RoleGate for AccessControl {
    fn has_role(&self, role: Role, actor: &Address) -> bool {
        self.members
            .get(&role)
            .map(|set| set.contains(actor))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn admin() -> Address {
        Address::from_label("admin")
    }

    #[test]
    fn test_admin_grants_and_revokes() {
        let alice = Address::from_label("alice");
        let mut acl = AccessControl::with_admin(admin());

        assert!(acl.grant_role(&admin(), Role::Minter, alice).unwrap());
        assert!(acl.has_role(Role::Minter, &alice));
        // second grant is a no-op
        assert!(!acl.grant_role(&admin(), Role::Minter, alice).unwrap());

        assert!(acl.revoke_role(&admin(), Role::Minter, &alice).unwrap());
        assert!(!acl.has_role(Role::Minter, &alice));
    }

    #[test]
    fn test_non_admin_cannot_grant() {
        let alice = Address::from_label("alice");
        let mut acl = AccessControl::with_admin(admin());

        let err = acl.grant_role(&alice, Role::Minter, alice).unwrap_err();
        assert_eq!(
            err,
            AccessError::Unauthorized {
                actor: alice,
                role: Role::DefaultAdmin
            }
        );
    }

    #[test]
    fn test_renounce_only_self() {
        let alice = Address::from_label("alice");
        let mut acl = AccessControl::with_admin(admin());
        acl.insert(Role::Burner, alice);

        assert_eq!(
            acl.renounce_role(&admin(), Role::Burner, &alice),
            Err(AccessError::RenounceForOther)
        );
        assert!(acl.renounce_role(&alice, Role::Burner, &alice).unwrap());
        assert!(!acl.has_role(Role::Burner, &alice));
    }

    #[test]
    fn test_role_text_form() {
        assert_eq!(Role::SwapCbToCbs.to_string(), "SWAP_CB_TO_CBS");
        assert_eq!("MINTER".parse::<Role>().unwrap(), Role::Minter);
    }

    #[test]
    fn test_serialized_roles_round_trip() {
        let mut acl = AccessControl::with_admin(admin());
        acl.insert(Role::Bank, Address::from_label("dnb"));
        let json = serde_json::to_string(&acl).unwrap();
        let back: AccessControl = serde_json::from_str(&json).unwrap();
        assert_eq!(back, acl);
    }
}
