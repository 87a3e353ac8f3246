//! Identity types for roster-sync.
//!
//! User and group identifiers are opaque strings assigned by the messaging
//! backend. The only local rule is that they are never blank.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::TypesError;

/// Identifier of a user account.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Uid(String);

impl Uid {
    /// Parse a user id, rejecting empty or whitespace-only input.
    pub fn parse(raw: &str) -> Result<Self, TypesError> {
        Self::try_from(raw.to_string())
    }

    /// Borrow the raw id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Uid {
    type Error = TypesError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        if raw.trim().is_empty() {
            return Err(TypesError::InvalidId(raw));
        }
        Ok(Self(raw))
    }
}

impl From<Uid> for String {
    fn from(id: Uid) -> Self {
        id.0
    }
}

impl fmt::Display for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Uid({})", self.0)
    }
}

/// Identifier of a group conversation.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct GroupId(String);

impl GroupId {
    /// Parse a group id, rejecting empty or whitespace-only input.
    pub fn parse(raw: &str) -> Result<Self, TypesError> {
        Self::try_from(raw.to_string())
    }

    /// Borrow the raw id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for GroupId {
    type Error = TypesError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        if raw.trim().is_empty() {
            return Err(TypesError::InvalidId(raw));
        }
        Ok(Self(raw))
    }
}

impl From<GroupId> for String {
    fn from(id: GroupId) -> Self {
        id.0
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GroupId({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uid_accepts_plain_ids() {
        let uid = Uid::parse("u1").unwrap();
        assert_eq!(uid.as_str(), "u1");
        assert_eq!(uid.to_string(), "u1");
    }

    #[test]
    fn uid_rejects_blank() {
        assert!(matches!(Uid::parse(""), Err(TypesError::InvalidId(_))));
        assert!(matches!(Uid::parse(" \t"), Err(TypesError::InvalidId(_))));
    }

    #[test]
    fn uid_serializes_as_plain_string() {
        let uid = Uid::parse("alice").unwrap();
        assert_eq!(serde_json::to_string(&uid).unwrap(), "\"alice\"");
        let back: Uid = serde_json::from_str("\"alice\"").unwrap();
        assert_eq!(back, uid);
    }

    #[test]
    fn uid_deserialize_rejects_blank() {
        assert!(serde_json::from_str::<Uid>("\"\"").is_err());
    }

    #[test]
    fn uid_ordering_is_lexicographic() {
        let a = Uid::parse("a").unwrap();
        let b = Uid::parse("b").unwrap();
        assert!(a < b);
    }

    #[test]
    fn group_id_rejects_blank() {
        assert!(GroupId::parse("").is_err());
        assert_eq!(GroupId::parse("g-1").unwrap().as_str(), "g-1");
    }
}
