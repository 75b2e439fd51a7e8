//! Order lifecycle endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use common::{OrderId, OrgId, TenantId};
use domain::{CreateOrder, DomainError, Order, OrderAction, QueryResult};
use ledger::{Ledger, RichQuery};
use serde::Deserialize;

use crate::AppState;
use crate::error::ApiError;
use crate::routes::identity::Identity;

// -- Request types --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    #[serde(rename = "orderID")]
    pub order_id: String,
    pub payment_method: String,
    #[serde(rename = "sellerTenantID", default)]
    pub seller_tenant_id: Option<String>,
    #[serde(rename = "shipperTenantID", default)]
    pub shipper_tenant_id: Option<String>,
    #[serde(default)]
    pub seller_sensitive_data: Option<String>,
    #[serde(default)]
    pub shipper_sensitive_data: Option<String>,
}

impl CreateOrderRequest {
    fn into_command(self) -> Result<CreateOrder, ApiError> {
        let cmd = CreateOrder::from_raw(
            &self.order_id,
            &self.payment_method,
            self.seller_tenant_id.as_deref(),
            self.shipper_tenant_id.as_deref(),
        )?;
        Ok(cmd.with_sensitive_data(
            self.seller_sensitive_data.unwrap_or_default(),
            self.shipper_sensitive_data.unwrap_or_default(),
        ))
    }
}

#[derive(Debug, Deserialize)]
pub struct ScopedParams {
    pub org: String,
    pub tenant: String,
}

/// Maps the path segment of an action route to its action.
pub fn action_for_path(segment: &str) -> Option<OrderAction> {
    let action = match segment {
        "confirm-payment" => OrderAction::ConfirmPayment,
        "cancel" => OrderAction::CancelOrder,
        "ship" => OrderAction::ShipOrder,
        "deliver" => OrderAction::ConfirmDelivery,
        "deliver-cod" => OrderAction::ConfirmCodDelivery,
        "remit-cod" => OrderAction::RemitCod,
        "payout" => OrderAction::PayoutToSeller,
        "request-return" => OrderAction::RequestReturn,
        "ship-return" => OrderAction::ShipReturn,
        "confirm-return" => OrderAction::ConfirmReturnReceived,
        _ => return None,
    };
    Some(action)
}

// -- Handlers --

/// POST /orders: create a new order as the calling seller.
#[tracing::instrument(skip(state, req))]
pub async fn create<L: Ledger + 'static>(
    State(state): State<Arc<AppState<L>>>,
    Identity(caller): Identity,
    Json(req): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<Order>), ApiError> {
    let cmd = req.into_command()?;
    let order = state
        .service
        .create_order(&state.context(caller), cmd)
        .await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// GET /orders/{id}: read an order through the visibility filter.
#[tracing::instrument(skip(state))]
pub async fn get<L: Ledger + 'static>(
    State(state): State<Arc<AppState<L>>>,
    Identity(caller): Identity,
    Path(id): Path<String>,
) -> Result<Json<Order>, ApiError> {
    let order = state
        .service
        .get_order(&state.context(caller), &OrderId::new(id))
        .await?;
    Ok(Json(order))
}

/// GET /orders/{id}/scoped?org=&tenant=: read an order owned by exactly one tenant.
#[tracing::instrument(skip(state))]
pub async fn get_scoped<L: Ledger + 'static>(
    State(state): State<Arc<AppState<L>>>,
    Identity(caller): Identity,
    Path(id): Path<String>,
    Query(params): Query<ScopedParams>,
) -> Result<Json<Order>, ApiError> {
    let order = state
        .service
        .get_order_for(
            &state.context(caller),
            &OrderId::new(id),
            &OrgId::new(params.org),
            &TenantId::new(params.tenant),
        )
        .await?;
    Ok(Json(order))
}

/// POST /orders/query: run a rich query; the body is the query document.
#[tracing::instrument(skip(state, body))]
pub async fn query<L: Ledger + 'static>(
    State(state): State<Arc<AppState<L>>>,
    Identity(caller): Identity,
    body: String,
) -> Result<Json<Vec<QueryResult>>, ApiError> {
    let query = RichQuery::parse(&body).map_err(DomainError::from)?;
    let results = state
        .service
        .query_orders(&state.context(caller), &query)
        .await?;
    Ok(Json(results))
}

/// POST /orders/{id}/{action}: apply one lifecycle action.
#[tracing::instrument(skip(state))]
pub async fn perform<L: Ledger + 'static>(
    State(state): State<Arc<AppState<L>>>,
    Identity(caller): Identity,
    Path((id, segment)): Path<(String, String)>,
) -> Result<Json<Order>, ApiError> {
    let action = action_for_path(&segment).ok_or(ApiError::UnknownAction(segment))?;
    let order = state
        .service
        .perform(&state.context(caller), &OrderId::new(id), action)
        .await?;
    Ok(Json(order))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_action_has_a_route() {
        let segments = [
            "confirm-payment",
            "cancel",
            "ship",
            "deliver",
            "deliver-cod",
            "remit-cod",
            "payout",
            "request-return",
            "ship-return",
            "confirm-return",
        ];
        let mapped: Vec<_> = segments.iter().filter_map(|s| action_for_path(s)).collect();
        assert_eq!(mapped, OrderAction::ALL.to_vec());
        assert!(action_for_path("scoped").is_none());
    }

    #[test]
    fn test_create_request_rejects_empty_tenant() {
        let req: CreateOrderRequest = serde_json::from_value(serde_json::json!({
            "orderID": "ORD-1",
            "paymentMethod": "PREPAID",
            "sellerTenantID": ""
        }))
        .unwrap();
        assert!(req.into_command().is_err());
    }

    #[test]
    fn test_create_request_defaults() {
        let req: CreateOrderRequest = serde_json::from_value(serde_json::json!({
            "orderID": "ORD-1",
            "paymentMethod": "COD"
        }))
        .unwrap();
        let cmd = req.into_command().unwrap();
        assert_eq!(cmd.order_id.as_str(), "ORD-1");
        assert!(cmd.seller_data.is_empty());
    }
}
