//! Value objects for the Order aggregate.

use std::str::FromStr;

use common::TenantId;
use serde::{Deserialize, Serialize};

use super::OrderError;

/// How the buyer pays for an order. Fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    /// Paid through the platform before shipping.
    Prepaid,

    /// Cash on delivery, collected by the shipper.
    Cod,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Prepaid => "PREPAID",
            PaymentMethod::Cod => "COD",
        }
    }

    pub fn is_cod(&self) -> bool {
        matches!(self, PaymentMethod::Cod)
    }
}

impl FromStr for PaymentMethod {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PREPAID" => Ok(PaymentMethod::Prepaid),
            "COD" => Ok(PaymentMethod::Cod),
            other => Err(OrderError::MalformedInput(format!(
                "unknown payment method {other:?} (expected PREPAID or COD)"
            ))),
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Cash-on-delivery collection progress.
///
/// Prepaid orders stay at `None` forever.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CodStatus {
    #[default]
    None,
    NotCollected,
    PendingRemittance,
    Remitted,
}

impl CodStatus {
    pub fn is_none(&self) -> bool {
        matches!(self, CodStatus::None)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CodStatus::None => "NONE",
            CodStatus::NotCollected => "NOT_COLLECTED",
            CodStatus::PendingRemittance => "PENDING_REMITTANCE",
            CodStatus::Remitted => "REMITTED",
        }
    }
}

impl std::fmt::Display for CodStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Tenant ownership of one side (seller or shipper) of an order.
///
/// Persisted as a plain string where `""` stands for [`TenantScope::Unscoped`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TenantScope {
    /// Any tenant of the owning organization may act.
    #[default]
    Unscoped,

    /// Only the named tenant may act.
    ScopedTo(TenantId),
}

impl TenantScope {
    /// Parses a tenant field supplied at creation.
    ///
    /// An omitted field means unscoped; an explicitly empty string is rejected.
    pub fn parse(raw: Option<&str>) -> Result<Self, OrderError> {
        match raw {
            None => Ok(TenantScope::Unscoped),
            Some("") => Err(OrderError::MalformedInput(
                "tenant id must not be empty; omit it to leave the order unscoped".to_string(),
            )),
            Some(tenant) => Ok(TenantScope::ScopedTo(TenantId::new(tenant))),
        }
    }

    /// Returns the owning tenant, if scoped.
    pub fn tenant(&self) -> Option<&TenantId> {
        match self {
            TenantScope::Unscoped => None,
            TenantScope::ScopedTo(tenant) => Some(tenant),
        }
    }

    /// Returns true if a caller carrying `tenant` falls inside this scope.
    pub fn admits(&self, tenant: Option<&TenantId>) -> bool {
        match self {
            TenantScope::Unscoped => true,
            TenantScope::ScopedTo(owner) => tenant == Some(owner),
        }
    }
}

impl From<String> for TenantScope {
    fn from(raw: String) -> Self {
        if raw.is_empty() {
            TenantScope::Unscoped
        } else {
            TenantScope::ScopedTo(TenantId::new(raw))
        }
    }
}

impl From<TenantScope> for String {
    fn from(scope: TenantScope) -> Self {
        match scope {
            TenantScope::Unscoped => String::new(),
            TenantScope::ScopedTo(tenant) => tenant.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for TenantScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TenantScope::Unscoped => write!(f, "<unscoped>"),
            TenantScope::ScopedTo(tenant) => write!(f, "{tenant}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_method_parsing() {
        assert_eq!(
            "PREPAID".parse::<PaymentMethod>().unwrap(),
            PaymentMethod::Prepaid
        );
        assert_eq!("COD".parse::<PaymentMethod>().unwrap(), PaymentMethod::Cod);
        assert!(matches!(
            "cod".parse::<PaymentMethod>(),
            Err(OrderError::MalformedInput(_))
        ));
        assert!(matches!(
            "".parse::<PaymentMethod>(),
            Err(OrderError::MalformedInput(_))
        ));
    }

    #[test]
    fn test_cod_status_serialization() {
        let json = serde_json::to_string(&CodStatus::PendingRemittance).unwrap();
        assert_eq!(json, "\"PENDING_REMITTANCE\"");
        assert_eq!(CodStatus::default(), CodStatus::None);
    }

    #[test]
    fn test_tenant_scope_parse() {
        assert_eq!(TenantScope::parse(None).unwrap(), TenantScope::Unscoped);
        assert_eq!(
            TenantScope::parse(Some("SHOP-A")).unwrap(),
            TenantScope::ScopedTo(TenantId::new("SHOP-A"))
        );
        assert!(matches!(
            TenantScope::parse(Some("")),
            Err(OrderError::MalformedInput(_))
        ));
    }

    #[test]
    fn test_tenant_scope_admits() {
        let shop_a = TenantId::new("SHOP-A");
        let shop_b = TenantId::new("SHOP-B");
        let scoped = TenantScope::ScopedTo(shop_a.clone());

        assert!(scoped.admits(Some(&shop_a)));
        assert!(!scoped.admits(Some(&shop_b)));
        assert!(!scoped.admits(None));

        assert!(TenantScope::Unscoped.admits(None));
        assert!(TenantScope::Unscoped.admits(Some(&shop_b)));
    }

    #[test]
    fn test_tenant_scope_persists_as_string() {
        let scoped = TenantScope::ScopedTo(TenantId::new("SHOP-A"));
        assert_eq!(serde_json::to_string(&scoped).unwrap(), "\"SHOP-A\"");
        assert_eq!(serde_json::to_string(&TenantScope::Unscoped).unwrap(), "\"\"");

        let back: TenantScope = serde_json::from_str("\"\"").unwrap();
        assert_eq!(back, TenantScope::Unscoped);
    }
}
