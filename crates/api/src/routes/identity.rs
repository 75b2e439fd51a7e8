//! Caller identity taken from the authenticating proxy's headers.

use axum::extract::FromRequestParts;
use axum::http::HeaderMap;
use axum::http::request::Parts;
use domain::Caller;

use crate::error::ApiError;

/// Header carrying the caller's organization id.
pub const ORG_HEADER: &str = "x-org-id";

/// Header carrying the caller's tenant id, if any.
pub const TENANT_HEADER: &str = "x-tenant-id";

/// The authenticated caller of a request.
///
/// Rejects the request with 401 when no organization is present. An absent
/// or empty tenant header means the caller has no tenant.
#[derive(Debug, Clone)]
pub struct Identity(pub Caller);

fn header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let org = header(&parts.headers, ORG_HEADER).ok_or(ApiError::MissingIdentity)?;
        let tenant = header(&parts.headers, TENANT_HEADER);
        Ok(Identity(Caller::from_attributes(org, tenant)))
    }
}
