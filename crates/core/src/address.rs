//! Account identity
//!
//! Addresses are opaque 20-byte identities. Stealth destinations, contracts and
//! people all look the same at this layer.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors when parsing an address from text
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("Address must start with 0x: {0}")]
    MissingPrefix(String),

    #[error("Address must be 20 bytes of hex: {0}")]
    InvalidHex(String),
}

/// A 20-byte account address, written as `0x` followed by 40 hex digits.
///
/// Serialized as its text form so it can be used as a JSON map key.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address([u8; 20]);

impl Address {
    /// The burn address
    pub const ZERO: Self = Self([0u8; 20]);

    pub const fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Derive a deterministic address from a human label.
    ///
    /// Used by the CLI and tests to name accounts ("issuer", "alice", ...).
    pub fn from_label(label: &str) -> Self {
        let digest = Sha256::digest(label.as_bytes());
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&digest[..20]);
        Self(bytes)
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .ok_or_else(|| AddressError::MissingPrefix(s.to_string()))?;

        let decoded = hex::decode(digits).map_err(|_| AddressError::InvalidHex(s.to_string()))?;
        let bytes: [u8; 20] = decoded
            .try_into()
            .map_err(|_| AddressError::InvalidHex(s.to_string()))?;
        Ok(Self(bytes))
    }
}

impl TryFrom<String> for Address {
    type Error = AddressError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_zero_address() {
        assert!(Address::ZERO.is_zero());
        assert_eq!(
            Address::ZERO.to_string(),
            "0x0000000000000000000000000000000000000000"
        );
    }

    #[test]
    fn test_label_is_deterministic() {
        assert_eq!(Address::from_label("alice"), Address::from_label("alice"));
        assert_ne!(Address::from_label("alice"), Address::from_label("bob"));
        assert!(!Address::from_label("alice").is_zero());
    }

    #[test]
    fn test_parse_display_agree() {
        let alice = Address::from_label("alice");
        let parsed: Address = alice.to_string().parse().unwrap();
        assert_eq!(parsed, alice);
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            "1234".parse::<Address>(),
            Err(AddressError::MissingPrefix(_))
        ));
        assert!(matches!(
            "0x1234".parse::<Address>(),
            Err(AddressError::InvalidHex(_))
        ));
        assert!(matches!(
            "0xzz00000000000000000000000000000000000000".parse::<Address>(),
            Err(AddressError::InvalidHex(_))
        ));
    }

    #[test]
    fn test_address_as_json_map_key() {
        let mut balances = HashMap::new();
        balances.insert(Address::from_label("alice"), 5u32);
        let json = serde_json::to_string(&balances).unwrap();
        let back: HashMap<Address, u32> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, balances);
    }
}
