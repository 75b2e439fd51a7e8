//! Organization and tenant authorization for mutating actions.
//!
//! Every action declares an [`ActionPolicy`]. The organization half of the
//! policy is checked before the order is read; the tenant half needs the
//! stored order and is checked right after the read, before any state guard.

use common::OrgId;

use crate::context::Caller;
use crate::order::{Order, OrderAction, OrderError, TenantScope};

/// Platform organization id used when none is configured.
pub const DEFAULT_PLATFORM_ORG: &str = "ECommercePlatformOrgMSP";
/// Seller organization id used when none is configured.
pub const DEFAULT_SELLER_ORG: &str = "SellerOrgMSP";
/// Shipper organization id used when none is configured.
pub const DEFAULT_SHIPPER_ORG: &str = "ShipperOrgMSP";

/// Organization roles known to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Platform,
    Seller,
    Shipper,
}

/// The side of an order that owns a tenant scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Party {
    Seller,
    Shipper,
}

/// The deployment's organization ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Organizations {
    pub platform: OrgId,
    pub seller: OrgId,
    pub shipper: OrgId,
}

impl Default for Organizations {
    fn default() -> Self {
        Self {
            platform: OrgId::new(DEFAULT_PLATFORM_ORG),
            seller: OrgId::new(DEFAULT_SELLER_ORG),
            shipper: OrgId::new(DEFAULT_SHIPPER_ORG),
        }
    }
}

impl Organizations {
    pub fn new(
        platform: impl Into<OrgId>,
        seller: impl Into<OrgId>,
        shipper: impl Into<OrgId>,
    ) -> Self {
        Self {
            platform: platform.into(),
            seller: seller.into(),
            shipper: shipper.into(),
        }
    }

    /// Returns the organization id playing `role`.
    pub fn org_for(&self, role: Role) -> &OrgId {
        match role {
            Role::Platform => &self.platform,
            Role::Seller => &self.seller,
            Role::Shipper => &self.shipper,
        }
    }

    /// Classifies an organization id, `None` for organizations outside the deployment.
    pub fn role_of(&self, org: &OrgId) -> Option<Role> {
        if *org == self.platform {
            Some(Role::Platform)
        } else if *org == self.seller {
            Some(Role::Seller)
        } else if *org == self.shipper {
            Some(Role::Shipper)
        } else {
            None
        }
    }
}

/// Who may perform an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionPolicy {
    /// Organization role the caller must hold.
    pub role: Role,

    /// Side whose tenant scope the caller must also fall inside.
    pub owner: Option<Party>,
}

impl ActionPolicy {
    /// Policy for creating an order.
    pub const CREATE: ActionPolicy = ActionPolicy {
        role: Role::Seller,
        owner: None,
    };

    /// Returns the policy declared for `action`.
    pub fn for_action(action: OrderAction) -> Self {
        let (role, owner) = match action {
            OrderAction::ConfirmPayment
            | OrderAction::CancelOrder
            | OrderAction::RemitCod
            | OrderAction::PayoutToSeller
            | OrderAction::RequestReturn => (Role::Platform, None),
            OrderAction::ShipOrder
            | OrderAction::ConfirmDelivery
            | OrderAction::ConfirmCodDelivery
            | OrderAction::ShipReturn => (Role::Shipper, Some(Party::Shipper)),
            OrderAction::ConfirmReturnReceived => (Role::Seller, Some(Party::Seller)),
        };
        Self { role, owner }
    }
}

/// Checks the caller's organization against the policy. Needs no stored state.
pub fn authorize_org(
    orgs: &Organizations,
    policy: ActionPolicy,
    action: &'static str,
    caller: &Caller,
) -> Result<(), OrderError> {
    let required = orgs.org_for(policy.role);
    if caller.org() == required {
        return Ok(());
    }
    Err(OrderError::Unauthorized {
        action,
        caller_org: caller.org().clone(),
        required_org: required.clone(),
        owner_tenant: None,
        caller_tenant: None,
    })
}

/// Checks ownership of a loaded order for tenant-scoped policies.
///
/// Policies without an owning party pass unconditionally.
pub fn authorize_owner(
    policy: ActionPolicy,
    action: &'static str,
    caller: &Caller,
    order: &Order,
) -> Result<(), OrderError> {
    let Some(party) = policy.owner else {
        return Ok(());
    };
    let (owner_org, scope) = order.party(party);

    if caller.org() == owner_org && scope.admits(caller.tenant()) {
        return Ok(());
    }

    Err(OrderError::Unauthorized {
        action,
        caller_org: caller.org().clone(),
        required_org: owner_org.clone(),
        owner_tenant: match scope {
            TenantScope::Unscoped => None,
            TenantScope::ScopedTo(tenant) => Some(tenant.clone()),
        },
        caller_tenant: caller.tenant().cloned(),
    })
}
