//! Read-path visibility rules.

use common::{OrgId, TenantId};

use crate::authz::{Organizations, Party, Role};
use crate::context::Caller;
use crate::order::{Order, OrderError, TenantScope};

/// Classifies the caller for reads, rejecting organizations outside the deployment.
///
/// Runs before the order is loaded.
pub fn reader_role(orgs: &Organizations, caller: &Caller) -> Result<Role, OrderError> {
    orgs.role_of(caller.org()).ok_or_else(|| OrderError::Forbidden {
        caller_org: caller.org().clone(),
        reason: "organization is not part of this deployment",
    })
}

/// Checks whether `caller` may read `order`.
///
/// The platform sees every order. Seller and shipper organizations see an
/// order when their side is unscoped or scoped to the caller's tenant.
pub fn check(orgs: &Organizations, caller: &Caller, order: &Order) -> Result<(), OrderError> {
    let party = match reader_role(orgs, caller)? {
        Role::Platform => return Ok(()),
        Role::Seller => Party::Seller,
        Role::Shipper => Party::Shipper,
    };

    let (_, scope) = order.party(party);
    if scope.admits(caller.tenant()) {
        Ok(())
    } else {
        Err(OrderError::Forbidden {
            caller_org: caller.org().clone(),
            reason: "order belongs to another tenant",
        })
    }
}

/// An explicit `(organization, tenant)` lookup.
///
/// Stricter than [`check`]: the caller must present exactly the requested
/// identity and the order must be scoped to exactly the requested tenant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopedLookup {
    pub org: OrgId,
    pub tenant: TenantId,
}

impl ScopedLookup {
    pub fn new(org: impl Into<OrgId>, tenant: impl Into<TenantId>) -> Self {
        Self {
            org: org.into(),
            tenant: tenant.into(),
        }
    }

    /// Validates the caller against the lookup and returns the side it targets.
    ///
    /// Runs before the order is loaded.
    pub fn authorize_caller(
        &self,
        orgs: &Organizations,
        caller: &Caller,
    ) -> Result<Party, OrderError> {
        let forbidden = |reason| OrderError::Forbidden {
            caller_org: caller.org().clone(),
            reason,
        };

        if *caller.org() != self.org {
            return Err(forbidden("caller organization does not match the lookup"));
        }
        if caller.tenant() != Some(&self.tenant) {
            return Err(forbidden("caller tenant does not match the lookup"));
        }
        match orgs.role_of(&self.org) {
            Some(Role::Seller) => Ok(Party::Seller),
            Some(Role::Shipper) => Ok(Party::Shipper),
            _ => Err(forbidden("lookup organization must be the seller or shipper")),
        }
    }

    /// Checks that the loaded order's side is owned by exactly the requested tenant.
    pub fn authorize_order(
        &self,
        party: Party,
        caller: &Caller,
        order: &Order,
    ) -> Result<(), OrderError> {
        let (owner_org, scope) = order.party(party);
        let owned = *owner_org == self.org
            && matches!(scope, TenantScope::ScopedTo(tenant) if *tenant == self.tenant);
        if owned {
            Ok(())
        } else {
            Err(OrderError::Forbidden {
                caller_org: caller.org().clone(),
                reason: "order is not owned by the requested tenant",
            })
        }
    }
}

/// Checks whether `caller` may run rich queries.
pub fn check_query(orgs: &Organizations, caller: &Caller) -> Result<(), OrderError> {
    reader_role(orgs, caller).map(|_| ())
}
