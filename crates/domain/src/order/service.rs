//! Order service providing the public API for order operations.

use common::{OrderId, OrgId, TenantId};
use ledger::{Ledger, RichQuery};
use serde::Serialize;

use crate::aggregate::Aggregate;
use crate::authz::{self, ActionPolicy, Organizations};
use crate::command::CommandHandler;
use crate::context::TxContext;
use crate::error::{DomainError, ErrorKind};
use crate::policy::SettlementPolicy;
use crate::visibility::{self, ScopedLookup};

use super::{CreateOrder, Order, OrderAction};

/// One record returned by a rich query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResult {
    #[serde(rename = "Key")]
    pub key: String,

    #[serde(rename = "Record")]
    pub record: Order,
}

/// Service for managing orders.
///
/// Every mutating call runs: organization check, ledger read, tenant
/// ownership check, state-machine guards, mutation with audit entry, and a
/// single ledger write. Reads apply the visibility rules instead.
pub struct OrderService<L: Ledger> {
    handler: CommandHandler<L, Order>,
    orgs: Organizations,
    policy: SettlementPolicy,
}

impl<L: Ledger> OrderService<L> {
    /// Creates a service with the default organizations and production time locks.
    pub fn new(ledger: L) -> Self {
        Self::with_config(ledger, Organizations::default(), SettlementPolicy::default())
    }

    pub fn with_config(ledger: L, orgs: Organizations, policy: SettlementPolicy) -> Self {
        Self {
            handler: CommandHandler::new(ledger),
            orgs,
            policy,
        }
    }

    /// Returns a reference to the underlying command handler.
    pub fn handler(&self) -> &CommandHandler<L, Order> {
        &self.handler
    }

    pub fn organizations(&self) -> &Organizations {
        &self.orgs
    }

    pub fn policy(&self) -> &SettlementPolicy {
        &self.policy
    }

    /// Creates a new order. Only the seller organization may create orders.
    #[tracing::instrument(
        skip(self, ctx, cmd),
        fields(order_id = %cmd.order_id, caller = %ctx.caller().org(), tx_id = %ctx.tx_id())
    )]
    pub async fn create_order(
        &self,
        ctx: &TxContext,
        cmd: CreateOrder,
    ) -> Result<Order, DomainError> {
        let result = self.try_create(ctx, cmd).await;
        observe(Order::creation_action(), &result);
        result
    }

    async fn try_create(&self, ctx: &TxContext, cmd: CreateOrder) -> Result<Order, DomainError> {
        authz::authorize_org(
            &self.orgs,
            ActionPolicy::CREATE,
            Order::creation_action(),
            ctx.caller(),
        )?;

        let key = cmd.order_id.clone();
        let shipper_org = &self.orgs.shipper;
        self.handler
            .create(ctx, key.as_str(), || Order::create(ctx, shipper_org, cmd))
            .await
    }

    /// Performs a mutating action on an existing order.
    #[tracing::instrument(
        skip(self, ctx, action),
        fields(action = %action, caller = %ctx.caller().org(), tx_id = %ctx.tx_id())
    )]
    pub async fn perform(
        &self,
        ctx: &TxContext,
        order_id: &OrderId,
        action: OrderAction,
    ) -> Result<Order, DomainError> {
        let result = self.try_perform(ctx, order_id, action).await;
        observe(action.as_str(), &result);
        result
    }

    async fn try_perform(
        &self,
        ctx: &TxContext,
        order_id: &OrderId,
        action: OrderAction,
    ) -> Result<Order, DomainError> {
        let policy = ActionPolicy::for_action(action);
        authz::authorize_org(&self.orgs, policy, action.as_str(), ctx.caller())?;

        let settlement = &self.policy;
        let result = self
            .handler
            .execute(ctx, order_id.as_str(), |order| {
                authz::authorize_owner(policy, action.as_str(), ctx.caller(), order)?;
                order.decide(action, ctx.timestamp(), settlement)
            })
            .await?;

        Ok(result.aggregate)
    }

    /// Confirms payment of a prepaid order (platform).
    pub async fn confirm_payment(
        &self,
        ctx: &TxContext,
        order_id: &OrderId,
    ) -> Result<Order, DomainError> {
        self.perform(ctx, order_id, OrderAction::ConfirmPayment).await
    }

    /// Cancels an order that has not shipped (platform).
    pub async fn cancel_order(
        &self,
        ctx: &TxContext,
        order_id: &OrderId,
    ) -> Result<Order, DomainError> {
        self.perform(ctx, order_id, OrderAction::CancelOrder).await
    }

    /// Hands the parcel to the shipper (shipper tenant).
    pub async fn ship_order(
        &self,
        ctx: &TxContext,
        order_id: &OrderId,
    ) -> Result<Order, DomainError> {
        self.perform(ctx, order_id, OrderAction::ShipOrder).await
    }

    /// Confirms delivery of a prepaid order (shipper tenant).
    pub async fn confirm_delivery(
        &self,
        ctx: &TxContext,
        order_id: &OrderId,
    ) -> Result<Order, DomainError> {
        self.perform(ctx, order_id, OrderAction::ConfirmDelivery).await
    }

    /// Confirms delivery and cash collection of a COD order (shipper tenant).
    pub async fn confirm_cod_delivery(
        &self,
        ctx: &TxContext,
        order_id: &OrderId,
    ) -> Result<Order, DomainError> {
        self.perform(ctx, order_id, OrderAction::ConfirmCodDelivery).await
    }

    /// Records remittance of collected cash to the platform (platform).
    pub async fn remit_cod(
        &self,
        ctx: &TxContext,
        order_id: &OrderId,
    ) -> Result<Order, DomainError> {
        self.perform(ctx, order_id, OrderAction::RemitCod).await
    }

    /// Pays the seller once the payout lock has expired (platform).
    pub async fn payout_to_seller(
        &self,
        ctx: &TxContext,
        order_id: &OrderId,
    ) -> Result<Order, DomainError> {
        self.perform(ctx, order_id, OrderAction::PayoutToSeller).await
    }

    /// Opens a return within the return window (platform).
    pub async fn request_return(
        &self,
        ctx: &TxContext,
        order_id: &OrderId,
    ) -> Result<Order, DomainError> {
        self.perform(ctx, order_id, OrderAction::RequestReturn).await
    }

    /// Picks up the returned parcel (shipper tenant).
    pub async fn ship_return(
        &self,
        ctx: &TxContext,
        order_id: &OrderId,
    ) -> Result<Order, DomainError> {
        self.perform(ctx, order_id, OrderAction::ShipReturn).await
    }

    /// Confirms the returned parcel arrived (seller tenant).
    pub async fn confirm_return_received(
        &self,
        ctx: &TxContext,
        order_id: &OrderId,
    ) -> Result<Order, DomainError> {
        self.perform(ctx, order_id, OrderAction::ConfirmReturnReceived).await
    }

    /// Loads an order the caller is allowed to see.
    #[tracing::instrument(skip(self, ctx), fields(caller = %ctx.caller().org()))]
    pub async fn get_order(
        &self,
        ctx: &TxContext,
        order_id: &OrderId,
    ) -> Result<Order, DomainError> {
        visibility::reader_role(&self.orgs, ctx.caller())?;
        let order = self.handler.load(order_id.as_str()).await?;
        visibility::check(&self.orgs, ctx.caller(), &order)?;
        Ok(order)
    }

    /// Loads an order through an explicit `(organization, tenant)` lookup.
    #[tracing::instrument(skip(self, ctx), fields(caller = %ctx.caller().org()))]
    pub async fn get_order_for(
        &self,
        ctx: &TxContext,
        order_id: &OrderId,
        required_org: &OrgId,
        required_tenant: &TenantId,
    ) -> Result<Order, DomainError> {
        let lookup = ScopedLookup::new(required_org.clone(), required_tenant.clone());
        let party = lookup.authorize_caller(&self.orgs, ctx.caller())?;
        let order = self.handler.load(order_id.as_str()).await?;
        lookup.authorize_order(party, ctx.caller(), &order)?;
        Ok(order)
    }

    /// Runs a rich query; the selector is passed to the ledger as given.
    #[tracing::instrument(skip(self, ctx, query), fields(caller = %ctx.caller().org()))]
    pub async fn query_orders(
        &self,
        ctx: &TxContext,
        query: &RichQuery,
    ) -> Result<Vec<QueryResult>, DomainError> {
        visibility::check_query(&self.orgs, ctx.caller())?;

        let records = self.handler.ledger().query(query).await?;
        tracing::debug!(matched = records.len(), "rich query executed");

        records
            .into_iter()
            .map(|record| -> Result<QueryResult, DomainError> {
                let order = record.decode()?;
                Ok(QueryResult {
                    key: record.key,
                    record: order,
                })
            })
            .collect()
    }
}

fn observe(action: &'static str, result: &Result<Order, DomainError>) {
    match result {
        Ok(order) => {
            metrics::counter!("order_transitions_total", "action" => action).increment(1);
            tracing::info!(
                order_id = %order.order_id(),
                status = %order.status(),
                "{action} applied"
            );
        }
        Err(e) => {
            let kind = e.kind();
            metrics::counter!(
                "order_rejections_total",
                "action" => action,
                "kind" => kind.as_str()
            )
            .increment(1);
            match kind {
                ErrorKind::Ledger | ErrorKind::Serialization => {
                    tracing::error!(error = %e, "{action} failed")
                }
                _ => tracing::warn!(error = %e, kind = %kind, "{action} rejected"),
            }
        }
    }
}
