//! Audit trail entries.

use chrono::{DateTime, Utc};
use common::{OrgId, TxId};
use serde::{Deserialize, Serialize};

use crate::context::TxContext;

/// One successful mutation of an order.
///
/// Entries are appended by the command handler in the same write that
/// persists the mutation and are never edited afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(rename = "txID")]
    pub tx_id: TxId,

    pub timestamp: DateTime<Utc>,

    /// Name of the action, e.g. `ShipOrder`.
    pub action: String,

    #[serde(rename = "actorOrg")]
    pub actor_org: OrgId,
}

impl HistoryEntry {
    /// Builds the entry for `action` performed within `ctx`.
    pub fn new(ctx: &TxContext, action: impl Into<String>) -> Self {
        Self {
            tx_id: ctx.tx_id().clone(),
            timestamp: ctx.timestamp(),
            action: action.into(),
            actor_org: ctx.caller().org().clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Caller;
    use chrono::TimeZone;

    #[test]
    fn test_entry_from_context() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let ctx = TxContext::new(
            TxId::from_string("tx-42"),
            at,
            Caller::new("ShipperOrgMSP").with_tenant("SHIP-1"),
        );

        let entry = HistoryEntry::new(&ctx, "ShipOrder");
        assert_eq!(entry.tx_id.as_str(), "tx-42");
        assert_eq!(entry.timestamp, at);
        assert_eq!(entry.action, "ShipOrder");
        assert_eq!(entry.actor_org.as_str(), "ShipperOrgMSP");
    }

    #[test]
    fn test_serialized_field_names() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let ctx = TxContext::new(TxId::from_string("tx-1"), at, Caller::new("SellerOrgMSP"));

        let json = serde_json::to_value(HistoryEntry::new(&ctx, "CreateOrder")).unwrap();
        assert_eq!(json["txID"], "tx-1");
        assert_eq!(json["action"], "CreateOrder");
        assert_eq!(json["actorOrg"], "SellerOrgMSP");
        assert!(json.get("timestamp").is_some());
    }
}
