use log::*;

use crate::{
    db_types::{DeliveryDetails, GroupOrder, NewOrder, Participant},
    foe_api::flow_config::OrderFlowConfig,
    share_calculator::ShareBreakdown,
    traits::{
        CheckoutSessionHandle,
        CheckoutSessionRequest,
        CorrelationMetadata,
        PaymentProcessor,
        SessionCreationError,
        SessionLineItem,
    },
};

pub const GROUP_SHARE_ITEM_NAME: &str = "Your share of the group order";

/// Builds checkout session requests for the two payment paths, and hands them to the payment processor.
pub struct CheckoutSessionFactory<P> {
    processor: P,
    config: OrderFlowConfig,
}

impl<P> CheckoutSessionFactory<P> {
    pub fn new(processor: P, config: OrderFlowConfig) -> Self {
        Self { processor, config }
    }

    pub fn config(&self) -> &OrderFlowConfig {
        &self.config
    }

    /// A request for one participant's share of a group order. The share is a single line item, and delivery is
    /// already part of the share, so no separate delivery fee is charged.
    pub fn group_share_request(
        &self,
        group_order: &GroupOrder,
        payer: &Participant,
        delivery: &DeliveryDetails,
    ) -> CheckoutSessionRequest {
        let metadata = CorrelationMetadata {
            order_id: group_order.id.as_str().into(),
            restaurant_id: group_order.restaurant_id.clone(),
            user_id: payer.id.clone(),
            payer_name: payer_name(payer, delivery),
            group_order_id: Some(group_order.id.clone()),
        };
        CheckoutSessionRequest {
            line_items: vec![SessionLineItem::new(GROUP_SHARE_ITEM_NAME, group_order.amount_per_person, 1)],
            delivery_fee: None,
            currency: self.config.currency.clone(),
            metadata,
            success_url: self.config.group_success_url(),
            cancel_url: self.config.cancel_url(&group_order.restaurant_id),
            customer_email: non_empty(&delivery.email),
        }
    }

    /// A request for a single-payer order. Every cart line becomes a line item and delivery is charged as shipping.
    pub fn individual_request(
        &self,
        order: &NewOrder,
        breakdown: &ShareBreakdown,
        payer: &Participant,
    ) -> CheckoutSessionRequest {
        let metadata = CorrelationMetadata {
            order_id: order.id.clone(),
            restaurant_id: order.restaurant_id.clone(),
            user_id: payer.id.clone(),
            payer_name: payer_name(payer, &order.delivery_details),
            group_order_id: None,
        };
        let line_items =
            breakdown.items.iter().map(|i| SessionLineItem::new(i.name.clone(), i.unit_price, i.quantity)).collect();
        CheckoutSessionRequest {
            line_items,
            delivery_fee: Some(breakdown.delivery_fee),
            currency: self.config.currency.clone(),
            metadata,
            success_url: self.config.individual_success_url(),
            cancel_url: self.config.cancel_url(&order.restaurant_id),
            customer_email: non_empty(&order.delivery_details.email),
        }
    }
}

impl<P: PaymentProcessor> CheckoutSessionFactory<P> {
    /// Asks the processor for a hosted checkout page. Nothing is persisted locally; callers must only write their own
    /// records once this has succeeded.
    pub async fn create_session(
        &self,
        request: CheckoutSessionRequest,
    ) -> Result<CheckoutSessionHandle, SessionCreationError> {
        let total = request.total();
        if !total.is_positive() {
            return Err(SessionCreationError::Rejected(format!("The checkout total must be positive, not {total}")));
        }
        let order_id = request.metadata.order_id.clone();
        let handle = self.processor.create_session(request).await.map_err(|e| {
            warn!("💳️ Checkout session for {order_id} could not be created. {e}");
            e
        })?;
        if handle.url.trim().is_empty() {
            return Err(SessionCreationError::MissingUrl(handle.session_id));
        }
        debug!("💳️ Checkout session {} created for {order_id} ({total})", handle.session_id);
        Ok(handle)
    }
}

fn payer_name(payer: &Participant, delivery: &DeliveryDetails) -> String {
    match delivery.name.trim() {
        "" => payer.name.clone().unwrap_or_default(),
        name => name.to_string(),
    }
}

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}
