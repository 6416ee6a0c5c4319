use checkout_tools::{CheckoutApi, CheckoutApiError, LineItem, NewCheckoutSession, WebhookEvent};
use food_order_common::Cents;
use food_order_engine::{
    order_objects::PaymentConfirmation,
    traits::{CheckoutSessionHandle, CheckoutSessionRequest, CorrelationMetadata, PaymentProcessor, SessionCreationError},
};
use log::*;

use crate::errors::ServerError;

/// The payment processor as seen by the ordering engine.
#[derive(Clone)]
pub struct ProcessorClient {
    api: CheckoutApi,
}

impl ProcessorClient {
    pub fn new(api: CheckoutApi) -> Self {
        Self { api }
    }
}

pub fn new_checkout_session(request: CheckoutSessionRequest) -> NewCheckoutSession {
    let line_items = request
        .line_items
        .into_iter()
        .map(|item| LineItem { currency: request.currency.clone(), ..LineItem::new(item.name, item.unit_amount, item.quantity) })
        .collect();
    NewCheckoutSession {
        line_items,
        delivery_fee: request.delivery_fee,
        success_url: request.success_url,
        cancel_url: request.cancel_url,
        customer_email: request.customer_email,
        metadata: request.metadata.to_map(),
    }
}

impl PaymentProcessor for ProcessorClient {
    async fn create_session(
        &self,
        request: CheckoutSessionRequest,
    ) -> Result<CheckoutSessionHandle, SessionCreationError> {
        let session = new_checkout_session(request);
        let created = self.api.create_session(&session).await.map_err(|e| match e {
            CheckoutApiError::QueryError { status, message } => {
                SessionCreationError::Rejected(format!("Error {status}. {message}"))
            },
            e => SessionCreationError::Unavailable(e.to_string()),
        })?;
        match created.url {
            Some(url) => Ok(CheckoutSessionHandle { session_id: created.id, url }),
            None => {
                warn!("💳️ Checkout session {} was created without a redirect URL", created.id);
                Err(SessionCreationError::MissingUrl(created.id))
            },
        }
    }
}

/// Extracts a payment confirmation from a verified webhook event. Events other than completed checkouts are not
/// acted on, and give `Ok(None)`.
pub fn confirmation_from_event(event: &WebhookEvent) -> Result<Option<PaymentConfirmation>, ServerError> {
    if !event.is_checkout_completed() {
        trace!("💳️ Ignoring {} event {}", event.event_type, event.id);
        return Ok(None);
    }
    let session = event.checkout_session().map_err(|e| ServerError::InvalidWebhookEvent(e.to_string()))?;
    let metadata = CorrelationMetadata::from_map(&session.metadata).map_err(|e| {
        warn!("💳️ Checkout session {} in event {} cannot be matched to an order. {e}", session.id, event.id);
        ServerError::InvalidWebhookEvent(e.to_string())
    })?;
    let payer_email = session.customer_email().unwrap_or_default().to_string();
    let amount_total = Cents::from(session.amount_total.unwrap_or_default());
    Ok(Some(PaymentConfirmation {
        event_id: event.id.clone(),
        session_id: session.id,
        metadata,
        payer_email,
        amount_total,
    }))
}

#[cfg(test)]
mod test {
    use checkout_tools::EventData;
    use food_order_engine::{
        db_types::{GroupOrderId, OrderId, RestaurantId, UserId},
        traits::SessionLineItem,
    };
    use serde_json::json;

    use super::*;

    fn metadata() -> CorrelationMetadata {
        CorrelationMetadata {
            order_id: OrderId::from("g1"),
            restaurant_id: RestaurantId::from("thai-garden"),
            user_id: UserId::from("bob"),
            payer_name: "Bob".into(),
            group_order_id: Some(GroupOrderId::from("g1")),
        }
    }

    fn event(event_type: &str, object: serde_json::Value) -> WebhookEvent {
        WebhookEvent { id: "evt_1".into(), event_type: event_type.into(), data: EventData { object } }
    }

    #[test]
    fn group_share_request_becomes_a_session_without_shipping() {
        let request = CheckoutSessionRequest {
            line_items: vec![SessionLineItem::new("Your share of the group order", Cents::from(1100), 1)],
            delivery_fee: None,
            currency: "usd".into(),
            metadata: metadata(),
            success_url: "https://food.example.com/group-order-status?success=true".into(),
            cancel_url: "https://food.example.com/detail/thai-garden?cancelled=true".into(),
            customer_email: Some("bob@example.com".into()),
        };
        let session = new_checkout_session(request);
        assert_eq!(session.total(), Cents::from(1100));
        assert!(session.delivery_fee.is_none());
        assert_eq!(session.metadata.get("groupOrderId").map(String::as_str), Some("g1"));
        assert_eq!(session.metadata.get("isGroupOrder").map(String::as_str), Some("true"));
        assert_eq!(session.line_items[0].currency, "usd");
    }

    #[test]
    fn completed_checkout_becomes_a_confirmation() {
        let object = json!({
            "id": "cs_1",
            "amount_total": 1100,
            "customer_details": { "email": "Bob@Example.com", "name": "Bob" },
            "metadata": metadata().to_map(),
        });
        let confirmation = confirmation_from_event(&event("checkout.session.completed", object)).unwrap().unwrap();
        assert_eq!(confirmation.session_id, "cs_1");
        assert_eq!(confirmation.amount_total, Cents::from(1100));
        assert_eq!(confirmation.payer_email, "Bob@Example.com");
        assert_eq!(confirmation.metadata, metadata());
    }

    #[test]
    fn other_events_are_ignored() {
        let object = json!({ "id": "cs_1" });
        assert!(confirmation_from_event(&event("checkout.session.expired", object)).unwrap().is_none());
    }

    #[test]
    fn uncorrelated_sessions_are_invalid() {
        let object = json!({ "id": "cs_1", "amount_total": 1100, "metadata": { "restaurantId": "thai-garden" } });
        let err = confirmation_from_event(&event("checkout.session.completed", object)).unwrap_err();
        assert!(matches!(err, ServerError::InvalidWebhookEvent(_)));
    }
}
