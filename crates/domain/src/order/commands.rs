//! Order commands.

use common::OrderId;

use super::{OrderError, OrderStatus, PaymentMethod, TenantScope};

/// Command to create a new order.
#[derive(Debug, Clone)]
pub struct CreateOrder {
    /// The order ID to create.
    pub order_id: OrderId,

    pub payment_method: PaymentMethod,

    pub seller_tenant: TenantScope,

    pub shipper_tenant: TenantScope,

    /// Opaque payload stored for the seller side.
    pub seller_data: String,

    /// Opaque payload stored for the shipper side.
    pub shipper_data: String,
}

impl CreateOrder {
    /// Creates an unscoped CreateOrder command with no sensitive payloads.
    pub fn new(order_id: impl Into<OrderId>, payment_method: PaymentMethod) -> Self {
        Self {
            order_id: order_id.into(),
            payment_method,
            seller_tenant: TenantScope::Unscoped,
            shipper_tenant: TenantScope::Unscoped,
            seller_data: String::new(),
            shipper_data: String::new(),
        }
    }

    /// Builds the command from raw transport fields.
    ///
    /// Tenant fields follow [`TenantScope::parse`]: absent means unscoped,
    /// an explicit empty string is malformed.
    pub fn from_raw(
        order_id: &str,
        payment_method: &str,
        seller_tenant: Option<&str>,
        shipper_tenant: Option<&str>,
    ) -> Result<Self, OrderError> {
        let mut cmd = Self::new(order_id, payment_method.parse()?);
        cmd.seller_tenant = TenantScope::parse(seller_tenant)?;
        cmd.shipper_tenant = TenantScope::parse(shipper_tenant)?;
        Ok(cmd)
    }

    pub fn with_seller_tenant(mut self, tenant: impl Into<common::TenantId>) -> Self {
        self.seller_tenant = TenantScope::ScopedTo(tenant.into());
        self
    }

    pub fn with_shipper_tenant(mut self, tenant: impl Into<common::TenantId>) -> Self {
        self.shipper_tenant = TenantScope::ScopedTo(tenant.into());
        self
    }

    pub fn with_sensitive_data(
        mut self,
        seller_data: impl Into<String>,
        shipper_data: impl Into<String>,
    ) -> Self {
        self.seller_data = seller_data.into();
        self.shipper_data = shipper_data.into();
        self
    }
}

/// A mutating action on an existing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderAction {
    ConfirmPayment,
    CancelOrder,
    ShipOrder,
    ConfirmDelivery,
    ConfirmCodDelivery,
    RemitCod,
    PayoutToSeller,
    RequestReturn,
    ShipReturn,
    ConfirmReturnReceived,
}

impl OrderAction {
    /// Every action, in lifecycle order.
    pub const ALL: [OrderAction; 10] = [
        OrderAction::ConfirmPayment,
        OrderAction::CancelOrder,
        OrderAction::ShipOrder,
        OrderAction::ConfirmDelivery,
        OrderAction::ConfirmCodDelivery,
        OrderAction::RemitCod,
        OrderAction::PayoutToSeller,
        OrderAction::RequestReturn,
        OrderAction::ShipReturn,
        OrderAction::ConfirmReturnReceived,
    ];

    /// Name recorded in the order history.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderAction::ConfirmPayment => "ConfirmPayment",
            OrderAction::CancelOrder => "CancelOrder",
            OrderAction::ShipOrder => "ShipOrder",
            OrderAction::ConfirmDelivery => "ConfirmDelivery",
            OrderAction::ConfirmCodDelivery => "ConfirmCODDelivery",
            OrderAction::RemitCod => "RemitCOD",
            OrderAction::PayoutToSeller => "PayoutToSeller",
            OrderAction::RequestReturn => "RequestReturn",
            OrderAction::ShipReturn => "ShipReturn",
            OrderAction::ConfirmReturnReceived => "ConfirmReturnReceived",
        }
    }

    /// The payment branch this action is restricted to, if any.
    pub fn payment_branch(&self) -> Option<PaymentMethod> {
        match self {
            OrderAction::ConfirmPayment | OrderAction::ConfirmDelivery => {
                Some(PaymentMethod::Prepaid)
            }
            OrderAction::ConfirmCodDelivery | OrderAction::RemitCod => Some(PaymentMethod::Cod),
            _ => None,
        }
    }

    /// Statuses this action may start from for an order paid with `method`.
    ///
    /// `None` means the action does not depend on the order status.
    pub fn allowed_from(&self, method: PaymentMethod) -> Option<&'static [OrderStatus]> {
        let allowed: &'static [OrderStatus] = match self {
            OrderAction::ConfirmPayment => &[OrderStatus::Created],
            OrderAction::CancelOrder => &[OrderStatus::Created, OrderStatus::Paid],
            OrderAction::ShipOrder => match method {
                PaymentMethod::Prepaid => &[OrderStatus::Paid],
                PaymentMethod::Cod => &[OrderStatus::Created],
            },
            OrderAction::ConfirmDelivery | OrderAction::ConfirmCodDelivery => {
                &[OrderStatus::Shipped]
            }
            OrderAction::RemitCod => return None,
            OrderAction::PayoutToSeller | OrderAction::RequestReturn => &[OrderStatus::Delivered],
            OrderAction::ShipReturn => &[OrderStatus::ReturnRequested],
            OrderAction::ConfirmReturnReceived => &[OrderStatus::ReturnInTransit],
        };
        Some(allowed)
    }
}

impl std::fmt::Display for OrderAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
