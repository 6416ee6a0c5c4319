use std::collections::BTreeMap;

use food_order_common::{Cents, CURRENCY_CODE};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::CheckoutApiError;

/// The only event type the order flow acts on.
pub const CHECKOUT_SESSION_COMPLETED: &str = "checkout.session.completed";

//--------------------------------------   NewCheckoutSession   -------------------------------------------------------
/// A single priced line on the hosted checkout page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub name: String,
    pub unit_amount: Cents,
    pub quantity: i64,
    pub currency: String,
}

impl LineItem {
    pub fn new<S: Into<String>>(name: S, unit_amount: Cents, quantity: i64) -> Self {
        Self { name: name.into(), unit_amount, quantity, currency: CURRENCY_CODE.to_string() }
    }

    pub fn total(&self) -> Cents {
        self.unit_amount * self.quantity
    }
}

/// Request body for `POST /v1/checkout/sessions`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCheckoutSession {
    pub line_items: Vec<LineItem>,
    /// A fixed-amount "Delivery" shipping rate. `None` means no shipping options are offered.
    pub delivery_fee: Option<Cents>,
    pub success_url: String,
    pub cancel_url: String,
    /// Pre-fills the e-mail field on the hosted page.
    pub customer_email: Option<String>,
    /// Opaque key/value pairs echoed back on every event about this session.
    pub metadata: BTreeMap<String, String>,
}

impl NewCheckoutSession {
    pub fn total(&self) -> Cents {
        self.line_items.iter().map(LineItem::total).sum::<Cents>() + self.delivery_fee.unwrap_or_default()
    }

    /// Flattens the request into the bracketed form-encoding the processor expects, e.g.
    /// `line_items[0][price_data][unit_amount]=1100`.
    pub fn to_form_params(&self) -> Vec<(String, String)> {
        let mut params = vec![("mode".to_string(), "payment".to_string())];
        for (i, item) in self.line_items.iter().enumerate() {
            let prefix = format!("line_items[{i}]");
            params.push((format!("{prefix}[price_data][currency]"), item.currency.clone()));
            params.push((format!("{prefix}[price_data][unit_amount]"), item.unit_amount.value().to_string()));
            params.push((format!("{prefix}[price_data][product_data][name]"), item.name.clone()));
            params.push((format!("{prefix}[quantity]"), item.quantity.to_string()));
        }
        if let Some(fee) = self.delivery_fee {
            let prefix = "shipping_options[0][shipping_rate_data]";
            params.push((format!("{prefix}[display_name]"), "Delivery".to_string()));
            params.push((format!("{prefix}[type]"), "fixed_amount".to_string()));
            params.push((format!("{prefix}[fixed_amount][amount]"), fee.value().to_string()));
            params.push((format!("{prefix}[fixed_amount][currency]"), CURRENCY_CODE.to_string()));
        }
        params.push(("success_url".to_string(), self.success_url.clone()));
        params.push(("cancel_url".to_string(), self.cancel_url.clone()));
        if let Some(email) = &self.customer_email {
            params.push(("customer_email".to_string(), email.clone()));
        }
        for (k, v) in &self.metadata {
            params.push((format!("metadata[{k}]"), v.clone()));
        }
        params
    }
}

/// The subset of the session resource returned on creation that the order flow needs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    /// Redirect URL for the hosted checkout page. Absent for sessions that cannot be paid.
    pub url: Option<String>,
}

//--------------------------------------      WebhookEvent      -------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: EventData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventData {
    pub object: Value,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerDetails {
    pub email: Option<String>,
    pub name: Option<String>,
}

/// A checkout session as embedded in a `checkout.session.*` event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSessionObject {
    pub id: String,
    /// The amount actually charged, in cents.
    pub amount_total: Option<i64>,
    pub customer_details: Option<CustomerDetails>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl CheckoutSessionObject {
    pub fn customer_email(&self) -> Option<&str> {
        self.customer_details.as_ref().and_then(|d| d.email.as_deref())
    }

    /// Metadata lookup that treats empty strings as missing.
    pub fn metadata_value(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str).filter(|v| !v.is_empty())
    }
}

impl WebhookEvent {
    pub fn is_checkout_completed(&self) -> bool {
        self.event_type == CHECKOUT_SESSION_COMPLETED
    }

    pub fn checkout_session(&self) -> Result<CheckoutSessionObject, CheckoutApiError> {
        if !self.event_type.starts_with("checkout.session.") {
            return Err(CheckoutApiError::NotACheckoutSession(self.event_type.clone()));
        }
        serde_json::from_value(self.data.object.clone()).map_err(|e| CheckoutApiError::JsonError(e.to_string()))
    }
}
