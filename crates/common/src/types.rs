use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Surrogate key of a stored entity.
///
/// Ids are allocated by the entity store on first save and are always
/// strictly positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct EntityId(i64);

/// Error returned when a raw value cannot be used as an entity id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid entity id {0} (must be positive)")]
pub struct InvalidEntityId(pub i64);

impl EntityId {
    /// Creates an id from a raw value, rejecting zero and negatives.
    pub fn new(raw: i64) -> Result<Self, InvalidEntityId> {
        if raw > 0 {
            Ok(Self(raw))
        } else {
            Err(InvalidEntityId(raw))
        }
    }

    /// Returns the underlying integer.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<i64> for EntityId {
    type Error = InvalidEntityId;

    fn try_from(raw: i64) -> Result<Self, Self::Error> {
        Self::new(raw)
    }
}

impl From<EntityId> for i64 {
    fn from(id: EntityId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_id_accepts_positive_values() {
        let id = EntityId::new(42).unwrap();
        assert_eq!(id.as_i64(), 42);
        assert_eq!(id.to_string(), "42");
    }

    #[test]
    fn entity_id_rejects_zero_and_negative() {
        assert_eq!(EntityId::new(0), Err(InvalidEntityId(0)));
        assert_eq!(EntityId::new(-3), Err(InvalidEntityId(-3)));
        assert_eq!(
            InvalidEntityId(-3).to_string(),
            "invalid entity id -3 (must be positive)"
        );
    }

    #[test]
    fn entity_id_serializes_as_plain_integer() {
        let id = EntityId::new(7).unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "7");
        let back: EntityId = serde_json::from_str("7").unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn entity_id_deserialization_rejects_zero() {
        assert!(serde_json::from_str::<EntityId>("0").is_err());
    }

    #[test]
    fn entity_ids_order_by_value() {
        let a = EntityId::new(1).unwrap();
        let b = EntityId::new(2).unwrap();
        assert!(a < b);
    }
}
