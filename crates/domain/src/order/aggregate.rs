//! Order aggregate implementation.

use chrono::{DateTime, Utc};
use common::{OrderId, OrgId};
use serde::{Deserialize, Serialize};

use crate::aggregate::{Aggregate, Change};
use crate::authz::Party;
use crate::context::TxContext;
use crate::policy::SettlementPolicy;

use super::{
    CodStatus, CreateOrder, HistoryEntry, OrderAction, OrderError, OrderStatus, PaymentMethod,
    TenantScope,
};

const DOC_TYPE: &str = "Order";

fn default_doc_type() -> String {
    DOC_TYPE.to_string()
}

/// Order aggregate root.
///
/// Represents an order shared between the platform, the seller and the
/// shipper, from creation to settlement, cancellation or return.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Record type marker, always `Order`.
    #[serde(default = "default_doc_type")]
    doc_type: String,

    #[serde(rename = "orderID")]
    order_id: OrderId,

    status: OrderStatus,

    payment_method: PaymentMethod,

    #[serde(default, skip_serializing_if = "CodStatus::is_none")]
    cod_status: CodStatus,

    #[serde(rename = "sellerOrgID")]
    seller_org: OrgId,

    #[serde(rename = "sellerTenantID", default)]
    seller_tenant: TenantScope,

    #[serde(rename = "shipperOrgID")]
    shipper_org: OrgId,

    #[serde(rename = "shipperTenantID", default)]
    shipper_tenant: TenantScope,

    created_at: DateTime<Utc>,

    updated_at: DateTime<Utc>,

    /// Set once, when the order enters DELIVERED.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    delivery_timestamp: Option<DateTime<Utc>>,

    #[serde(default)]
    seller_sensitive_data: String,

    #[serde(default)]
    shipper_sensitive_data: String,

    /// Audit trail, oldest first.
    history: Vec<HistoryEntry>,
}

/// A validated order transition, ready to be applied.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub action: OrderAction,

    /// New status, `None` when the action leaves the status unchanged.
    pub status: Option<OrderStatus>,

    pub cod_status: Option<CodStatus>,

    pub delivered_at: Option<DateTime<Utc>>,
}

impl Transition {
    fn to(action: OrderAction, status: OrderStatus) -> Self {
        Self {
            action,
            status: Some(status),
            cod_status: None,
            delivered_at: None,
        }
    }

    fn cod(mut self, cod_status: CodStatus) -> Self {
        self.cod_status = Some(cod_status);
        self
    }

    fn delivered(mut self, at: DateTime<Utc>) -> Self {
        self.delivered_at = Some(at);
        self
    }
}

impl Change for Transition {
    fn action_name(&self) -> &'static str {
        self.action.as_str()
    }
}

impl Aggregate for Order {
    type Change = Transition;
    type Error = OrderError;

    fn aggregate_type() -> &'static str {
        DOC_TYPE
    }

    fn creation_action() -> &'static str {
        "CreateOrder"
    }

    fn apply(&mut self, change: Self::Change) {
        if let Some(status) = change.status {
            self.status = status;
        }
        if let Some(cod_status) = change.cod_status {
            self.cod_status = cod_status;
        }
        if self.delivery_timestamp.is_none() {
            self.delivery_timestamp = change.delivered_at;
        }
    }

    fn record(&mut self, ctx: &TxContext, action: &'static str) {
        self.updated_at = ctx.timestamp();
        self.history.push(HistoryEntry::new(ctx, action));
    }
}

// Query methods
impl Order {
    pub fn order_id(&self) -> &OrderId {
        &self.order_id
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn payment_method(&self) -> PaymentMethod {
        self.payment_method
    }

    pub fn cod_status(&self) -> CodStatus {
        self.cod_status
    }

    pub fn seller_org(&self) -> &OrgId {
        &self.seller_org
    }

    pub fn seller_tenant(&self) -> &TenantScope {
        &self.seller_tenant
    }

    pub fn shipper_org(&self) -> &OrgId {
        &self.shipper_org
    }

    pub fn shipper_tenant(&self) -> &TenantScope {
        &self.shipper_tenant
    }

    /// Returns the organization and tenant scope owning one side of the order.
    pub fn party(&self, party: Party) -> (&OrgId, &TenantScope) {
        match party {
            Party::Seller => (&self.seller_org, &self.seller_tenant),
            Party::Shipper => (&self.shipper_org, &self.shipper_tenant),
        }
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn delivery_timestamp(&self) -> Option<DateTime<Utc>> {
        self.delivery_timestamp
    }

    pub fn seller_sensitive_data(&self) -> &str {
        &self.seller_sensitive_data
    }

    pub fn shipper_sensitive_data(&self) -> &str {
        &self.shipper_sensitive_data
    }

    /// Returns the audit trail, oldest entry first.
    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    /// Returns true if the order is in a terminal status.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

// Command methods (return transitions)
impl Order {
    /// Builds a new order from a creation command.
    ///
    /// The seller organization is the creating caller's; the shipper
    /// organization is supplied by the deployment. The history is empty until
    /// the command handler records the creation.
    pub fn create(
        ctx: &TxContext,
        shipper_org: &OrgId,
        cmd: CreateOrder,
    ) -> Result<Self, OrderError> {
        if cmd.order_id.is_empty() {
            return Err(OrderError::MalformedInput(
                "order id must not be empty".to_string(),
            ));
        }

        let cod_status = match cmd.payment_method {
            PaymentMethod::Cod => CodStatus::NotCollected,
            PaymentMethod::Prepaid => CodStatus::None,
        };

        Ok(Self {
            doc_type: default_doc_type(),
            order_id: cmd.order_id,
            status: OrderStatus::Created,
            payment_method: cmd.payment_method,
            cod_status,
            seller_org: ctx.caller().org().clone(),
            seller_tenant: cmd.seller_tenant,
            shipper_org: shipper_org.clone(),
            shipper_tenant: cmd.shipper_tenant,
            created_at: ctx.timestamp(),
            updated_at: ctx.timestamp(),
            delivery_timestamp: None,
            seller_sensitive_data: cmd.seller_data,
            shipper_sensitive_data: cmd.shipper_data,
            history: Vec::new(),
        })
    }

    /// Validates `action` against the current state and returns the transition.
    ///
    /// Guards run in a fixed order: payment branch, source status, COD
    /// remittance, then time locks.
    pub fn decide(
        &self,
        action: OrderAction,
        now: DateTime<Utc>,
        policy: &SettlementPolicy,
    ) -> Result<Transition, OrderError> {
        if let Some(required) = action.payment_branch()
            && self.payment_method != required
        {
            return Err(OrderError::InvalidPaymentBranch {
                action,
                required,
                actual: self.payment_method,
            });
        }

        if let Some(allowed) = action.allowed_from(self.payment_method)
            && !allowed.contains(&self.status)
        {
            return Err(OrderError::InvalidTransition {
                action,
                current: self.status,
                allowed,
            });
        }

        match action {
            OrderAction::ConfirmPayment => self.confirm_payment(),
            OrderAction::CancelOrder => self.cancel(),
            OrderAction::ShipOrder => self.ship(),
            OrderAction::ConfirmDelivery => self.confirm_delivery(now),
            OrderAction::ConfirmCodDelivery => self.confirm_cod_delivery(now),
            OrderAction::RemitCod => self.remit_cod(),
            OrderAction::PayoutToSeller => self.payout(now, policy),
            OrderAction::RequestReturn => self.request_return(now, policy),
            OrderAction::ShipReturn => self.ship_return(),
            OrderAction::ConfirmReturnReceived => self.confirm_return_received(),
        }
    }

    fn confirm_payment(&self) -> Result<Transition, OrderError> {
        Ok(Transition::to(OrderAction::ConfirmPayment, OrderStatus::Paid))
    }

    fn cancel(&self) -> Result<Transition, OrderError> {
        Ok(Transition::to(OrderAction::CancelOrder, OrderStatus::Cancelled))
    }

    fn ship(&self) -> Result<Transition, OrderError> {
        Ok(Transition::to(OrderAction::ShipOrder, OrderStatus::Shipped))
    }

    fn confirm_delivery(&self, now: DateTime<Utc>) -> Result<Transition, OrderError> {
        Ok(Transition::to(OrderAction::ConfirmDelivery, OrderStatus::Delivered).delivered(now))
    }

    fn confirm_cod_delivery(&self, now: DateTime<Utc>) -> Result<Transition, OrderError> {
        Ok(
            Transition::to(OrderAction::ConfirmCodDelivery, OrderStatus::Delivered)
                .cod(CodStatus::PendingRemittance)
                .delivered(now),
        )
    }

    fn remit_cod(&self) -> Result<Transition, OrderError> {
        self.require_cod_status(OrderAction::RemitCod, CodStatus::PendingRemittance)?;
        Ok(Transition {
            action: OrderAction::RemitCod,
            status: None,
            cod_status: Some(CodStatus::Remitted),
            delivered_at: None,
        })
    }

    fn payout(
        &self,
        now: DateTime<Utc>,
        policy: &SettlementPolicy,
    ) -> Result<Transition, OrderError> {
        if self.payment_method.is_cod() {
            self.require_cod_status(OrderAction::PayoutToSeller, CodStatus::Remitted)?;
        }
        policy.check_payout(self.delivery_timestamp, now)?;
        Ok(Transition::to(OrderAction::PayoutToSeller, OrderStatus::Settled))
    }

    fn request_return(
        &self,
        now: DateTime<Utc>,
        policy: &SettlementPolicy,
    ) -> Result<Transition, OrderError> {
        policy.check_return(self.delivery_timestamp, now)?;
        Ok(Transition::to(OrderAction::RequestReturn, OrderStatus::ReturnRequested))
    }

    fn ship_return(&self) -> Result<Transition, OrderError> {
        Ok(Transition::to(OrderAction::ShipReturn, OrderStatus::ReturnInTransit))
    }

    fn confirm_return_received(&self) -> Result<Transition, OrderError> {
        Ok(Transition::to(OrderAction::ConfirmReturnReceived, OrderStatus::Returned))
    }

    fn require_cod_status(
        &self,
        action: OrderAction,
        required: CodStatus,
    ) -> Result<(), OrderError> {
        if self.cod_status != required {
            return Err(OrderError::CodStatusMismatch {
                action,
                current: self.cod_status,
                required,
            });
        }
        Ok(())
    }
}
