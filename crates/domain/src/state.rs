//! Order status state machine.

use serde::{Deserialize, Serialize};

/// The status of a client or supplier order.
///
/// Transitions are monotonic, one step at a time:
/// ```text
/// EnPreparation ──► Validated ──► Delivered
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OrderStatus {
    /// Order is being prepared.
    #[default]
    #[serde(rename = "EN_PREPARATION")]
    EnPreparation,

    /// Order has been validated.
    #[serde(rename = "VALIDEE")]
    Validated,

    /// Order has been delivered (terminal state).
    #[serde(rename = "LIVREE")]
    Delivered,
}

impl OrderStatus {
    /// Returns the only status this one may move to.
    pub fn successor(&self) -> Option<OrderStatus> {
        match self {
            OrderStatus::EnPreparation => Some(OrderStatus::Validated),
            OrderStatus::Validated => Some(OrderStatus::Delivered),
            OrderStatus::Delivered => None,
        }
    }

    /// Returns true if `next` directly follows this status.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        self.successor() == Some(next)
    }

    /// Returns true if the order may still be changed or deleted.
    pub fn is_modifiable(&self) -> bool {
        !self.is_terminal()
    }

    /// Returns true if this is a terminal state (no further transitions possible).
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered)
    }

    /// Returns the status name as stored.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::EnPreparation => "EN_PREPARATION",
            OrderStatus::Validated => "VALIDEE",
            OrderStatus::Delivered => "LIVREE",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
