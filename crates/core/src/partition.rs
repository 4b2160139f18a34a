//! Partition keys for the partitioned ledger

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PartitionError {
    #[error("Partition name is empty")]
    Empty,

    #[error("Partition name longer than 32 bytes: {0}")]
    TooLong(String),

    #[error("Partition name must be ASCII: {0}")]
    NotAscii(String),

    #[error("Partition name contains a NUL byte: {0:?}")]
    ContainsNul(String),
}

/// A 32-byte tranche key.
///
/// Built from a short ASCII name right-padded with zero bytes, so
/// `Partition::named("issued")` is the same key an on-chain caller would
/// produce by packing the string.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Partition([u8; 32]);

impl Partition {
    pub fn named(name: &str) -> Result<Self, PartitionError> {
        if name.is_empty() {
            return Err(PartitionError::Empty);
        }
        if !name.is_ascii() {
            return Err(PartitionError::NotAscii(name.to_string()));
        }
        if name.len() > 32 {
            return Err(PartitionError::TooLong(name.to_string()));
        }
        // NUL is the padding byte
        if name.contains('\0') {
            return Err(PartitionError::ContainsNul(name.to_string()));
        }
        let mut bytes = [0u8; 32];
        bytes[..name.len()].copy_from_slice(name.as_bytes());
        Ok(Self(bytes))
    }

    pub fn reserved() -> Self {
        Self::from_static(b"reserved")
    }

    pub fn issued() -> Self {
        Self::from_static(b"issued")
    }

    pub fn locked() -> Self {
        Self::from_static(b"locked")
    }

    /// The reserved / issued / locked triple
    pub fn defaults() -> Vec<Self> {
        vec![Self::reserved(), Self::issued(), Self::locked()]
    }

    fn from_static(name: &[u8]) -> Self {
        let mut bytes = [0u8; 32];
        bytes[..name.len()].copy_from_slice(name);
        Self(bytes)
    }

    /// Name with the zero padding stripped
    pub fn name(&self) -> String {
        let end = self.0.iter().position(|b| *b == 0).unwrap_or(32);
        String::from_utf8_lossy(&self.0[..end]).into_owned()
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

impl fmt::Debug for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Partition({})", self.name())
    }
}

impl FromStr for Partition {
    type Err = PartitionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::named(s)
    }
}

impl TryFrom<String> for Partition {
    type Error = PartitionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::named(&value)
    }
}

impl From<Partition> for String {
    fn from(partition: Partition) -> Self {
        partition.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_partitions() {
        let defaults = Partition::defaults();
        assert_eq!(defaults.len(), 3);
        assert_eq!(defaults[0].name(), "reserved");
        assert_eq!(defaults[1].name(), "issued");
        assert_eq!(defaults[2].name(), "locked");
    }

    #[test]
    fn test_named_matches_constants() {
        assert_eq!(Partition::named("issued").unwrap(), Partition::issued());
        assert_eq!(&Partition::issued().as_bytes()[..6], b"issued");
        assert_eq!(Partition::issued().as_bytes()[6], 0);
    }

    #[test]
    fn test_invalid_names() {
        assert_eq!(Partition::named(""), Err(PartitionError::Empty));
        assert!(matches!(
            Partition::named(&"x".repeat(33)),
            Err(PartitionError::TooLong(_))
        ));
        assert!(matches!(
            Partition::named("låst"),
            Err(PartitionError::NotAscii(_))
        ));
        assert!(matches!(
            Partition::named("is\0sued"),
            Err(PartitionError::ContainsNul(_))
        ));
    }

    #[test]
    fn test_json_round_trip() {
        let partition = Partition::named("tranche-a").unwrap();
        let json = serde_json::to_string(&partition).unwrap();
        assert_eq!(json, "\"tranche-a\"");
        assert_eq!(serde_json::from_str::<Partition>(&json).unwrap(), partition);
        assert!(serde_json::from_str::<Partition>("\"a\\u0000b\"").is_err());
    }
}
