//! Order status machine.

use serde::{Deserialize, Serialize};

/// The status of an order in its lifecycle.
///
/// Status transitions:
/// ```text
/// PREPAID: CREATED ──► PAID ──► SHIPPED ──► DELIVERED ──┬──► SETTLED
/// COD:     CREATED ───────────► SHIPPED ──► DELIVERED ──┤
///                                                       └──► RETURN_REQUESTED
///                                                              │
///          CREATED | PAID ──► CANCELLED              RETURN_IN_TRANSIT ──► RETURNED
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Order recorded by the seller, nothing paid or shipped yet.
    #[default]
    Created,

    /// Prepaid order whose payment was confirmed by the platform.
    Paid,

    /// Order was cancelled (terminal state).
    Cancelled,

    /// Parcel handed to the shipper.
    Shipped,

    /// Parcel delivered; the payout lock and return window start here.
    Delivered,

    ReturnRequested,

    ReturnInTransit,

    /// Return received by the seller (terminal state).
    Returned,

    /// Seller has been paid out (terminal state).
    Settled,
}

impl OrderStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [OrderStatus; 9] = [
        OrderStatus::Created,
        OrderStatus::Paid,
        OrderStatus::Cancelled,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::ReturnRequested,
        OrderStatus::ReturnInTransit,
        OrderStatus::Returned,
        OrderStatus::Settled,
    ];

    /// Returns true if this is a terminal status (no further transitions possible).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Cancelled | OrderStatus::Returned | OrderStatus::Settled
        )
    }

    /// Returns the status name as persisted.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Created => "CREATED",
            OrderStatus::Paid => "PAID",
            OrderStatus::Cancelled => "CANCELLED",
            OrderStatus::Shipped => "SHIPPED",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::ReturnRequested => "RETURN_REQUESTED",
            OrderStatus::ReturnInTransit => "RETURN_IN_TRANSIT",
            OrderStatus::Returned => "RETURNED",
            OrderStatus::Settled => "SETTLED",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_status_is_created() {
        assert_eq!(OrderStatus::default(), OrderStatus::Created);
    }

    #[test]
    fn test_terminal_statuses() {
        let terminal: Vec<_> = OrderStatus::ALL
            .into_iter()
            .filter(OrderStatus::is_terminal)
            .collect();
        assert_eq!(
            terminal,
            vec![
                OrderStatus::Cancelled,
                OrderStatus::Returned,
                OrderStatus::Settled
            ]
        );
    }

    #[test]
    fn test_serialization_matches_display() {
        for status in OrderStatus::ALL {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
            let back: OrderStatus = serde_json::from_str(&json).unwrap();
            assert_eq!(back, status);
        }
    }
}
