use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use food_order_common::Cents;
use log::error;
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

//--------------------------------------     Identifiers     ---------------------------------------------------------
macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Type, Serialize, Deserialize)]
        #[sqlx(transparent)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

string_id!(
    /// Primary key of a shared (group) order record
    GroupOrderId
);
string_id!(
    /// Primary key of a restaurant-facing order
    OrderId
);
string_id!(RestaurantId);
string_id!(UserId);
string_id!(MenuItemId);

impl GroupOrderId {
    pub fn random() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl OrderId {
    pub fn random() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid value: {0}")]
pub struct ConversionError(String);

//--------------------------------------      CartItem       ---------------------------------------------------------
/// A single line of a cart. Quantities arrive from browsers as either numbers or numeric strings.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub menu_item_id: MenuItemId,
    pub name: String,
    #[serde(deserialize_with = "quantity_from_number_or_string")]
    pub quantity: i64,
}

impl CartItem {
    pub fn new<S: Into<String>>(menu_item_id: MenuItemId, name: S, quantity: i64) -> Self {
        Self { menu_item_id, name: name.into(), quantity }
    }
}

fn quantity_from_number_or_string<'de, D>(deserializer: D) -> Result<i64, D::Error>
where D: Deserializer<'de> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Quantity {
        Number(i64),
        Text(String),
    }
    match Quantity::deserialize(deserializer)? {
        Quantity::Number(n) => Ok(n),
        Quantity::Text(s) => s.trim().parse::<i64>().map_err(|_| serde::de::Error::custom(format!("Invalid quantity: {s}"))),
    }
}

//--------------------------------------   DeliveryDetails   ---------------------------------------------------------
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryDetails {
    pub email: String,
    pub name: String,
    pub address_line1: String,
    pub city: String,
}

impl DeliveryDetails {
    pub fn new<S: Into<String>>(email: S, name: S, address_line1: S, city: S) -> Self {
        Self { email: email.into(), name: name.into(), address_line1: address_line1.into(), city: city.into() }
    }

    /// Appends a payer's name to the comma-separated recipient list.
    pub fn append_name(&mut self, name: &str) {
        let name = name.trim();
        if name.is_empty() {
            return;
        }
        if self.name.trim().is_empty() {
            self.name = name.to_string();
        } else {
            self.name = format!("{}, {name}", self.name);
        }
    }

    pub fn has_address(&self) -> bool {
        !self.address_line1.trim().is_empty() && !self.city.trim().is_empty()
    }
}

/// Emails are compared case-insensitively and stored trimmed and lower-cased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

//--------------------------------------  GroupOrderStatus   ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GroupOrderStatus {
    /// The shared order exists, but nobody has started a checkout for it yet.
    Created,
    /// At least one participant has started a checkout or paid a share.
    InProgress,
    /// Every share has been paid and the final order was created.
    Paid,
    /// The shared order expired or was abandoned. No further joins or payments are accepted.
    Cancelled,
}

impl GroupOrderStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Paid | Self::Cancelled)
    }
}

impl Display for GroupOrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Created => write!(f, "Created"),
            Self::InProgress => write!(f, "InProgress"),
            Self::Paid => write!(f, "Paid"),
            Self::Cancelled => write!(f, "Cancelled"),
        }
    }
}

impl FromStr for GroupOrderStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Created" => Ok(Self::Created),
            "InProgress" => Ok(Self::InProgress),
            "Paid" => Ok(Self::Paid),
            "Cancelled" => Ok(Self::Cancelled),
            s => Err(ConversionError(format!("Invalid group order status: {s}"))),
        }
    }
}

impl From<String> for GroupOrderStatus {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid group order status: {value}. But this conversion cannot fail. Defaulting to Cancelled");
            Self::Cancelled
        })
    }
}

//--------------------------------------   PaidParticipant   ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaidParticipant {
    pub participant_id: UserId,
    pub email: String,
    pub amount_paid: Cents,
    pub paid_at: DateTime<Utc>,
}

//--------------------------------------    NewGroupOrder    ---------------------------------------------------------
#[derive(Debug, Clone)]
pub struct NewGroupOrder {
    pub id: GroupOrderId,
    pub restaurant_id: RestaurantId,
    pub initiator_id: UserId,
    pub cart_items: Vec<CartItem>,
    pub total_amount: Cents,
    pub total_participants: i64,
    pub amount_per_person: Cents,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl NewGroupOrder {
    pub fn new(
        restaurant_id: RestaurantId,
        initiator_id: UserId,
        cart_items: Vec<CartItem>,
        total_amount: Cents,
        total_participants: i64,
        amount_per_person: Cents,
    ) -> Self {
        Self {
            id: GroupOrderId::random(),
            restaurant_id,
            initiator_id,
            cart_items,
            total_amount,
            total_participants,
            amount_per_person,
            expires_at: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_expiry(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }
}

//--------------------------------------      GroupOrder     ---------------------------------------------------------
/// The shared-order record. `version` increases by one on every successful write and is used for optimistic
/// concurrency control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupOrder {
    pub id: GroupOrderId,
    pub restaurant_id: RestaurantId,
    pub initiator_id: UserId,
    pub cart_items: Vec<CartItem>,
    pub total_amount: Cents,
    pub total_participants: i64,
    pub amount_per_person: Cents,
    pub paid_participants: Vec<PaidParticipant>,
    pub delivery_details: DeliveryDetails,
    pub status: GroupOrderStatus,
    #[serde(skip)]
    pub version: i64,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl GroupOrder {
    pub fn paid_count(&self) -> i64 {
        self.paid_participants.len() as i64
    }

    pub fn remaining_slots(&self) -> i64 {
        (self.total_participants - self.paid_count()).max(0)
    }

    pub fn is_complete(&self) -> bool {
        self.paid_count() == self.total_participants
    }

    pub fn has_paid(&self, email: &str) -> bool {
        let email = normalize_email(email);
        self.paid_participants.iter().any(|p| p.email == email)
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map(|t| t <= now).unwrap_or(false)
    }

    /// A record accepts joins while it is neither terminal nor past its expiry time.
    pub fn accepts_joins_at(&self, now: DateTime<Utc>) -> bool {
        !self.status.is_terminal() && !self.is_expired_at(now)
    }

    /// The status as a reader should see it. Records that expired but have not been swept yet report `Cancelled`.
    pub fn effective_status_at(&self, now: DateTime<Utc>) -> GroupOrderStatus {
        if !self.status.is_terminal() && self.is_expired_at(now) {
            GroupOrderStatus::Cancelled
        } else {
            self.status
        }
    }

    /// Appends a payment to the in-memory record, and the payer's name to the delivery recipients.
    pub fn append_payment(&mut self, payment: PaidParticipant, payer_name: &str) {
        self.delivery_details.append_name(payer_name);
        self.paid_participants.push(payment);
    }
}

//--------------------------------------     OrderStatus     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OrderStatus {
    /// Checkout has started, but no payment has been confirmed.
    Placed,
    Paid,
    InProgress,
    OutForDelivery,
    Delivered,
    Cancelled,
}

impl Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Placed => write!(f, "Placed"),
            Self::Paid => write!(f, "Paid"),
            Self::InProgress => write!(f, "InProgress"),
            Self::OutForDelivery => write!(f, "OutForDelivery"),
            Self::Delivered => write!(f, "Delivered"),
            Self::Cancelled => write!(f, "Cancelled"),
        }
    }
}

impl FromStr for OrderStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Placed" => Ok(Self::Placed),
            "Paid" => Ok(Self::Paid),
            "InProgress" => Ok(Self::InProgress),
            "OutForDelivery" => Ok(Self::OutForDelivery),
            "Delivered" => Ok(Self::Delivered),
            "Cancelled" => Ok(Self::Cancelled),
            s => Err(ConversionError(format!("Invalid order status: {s}"))),
        }
    }
}

impl From<String> for OrderStatus {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid order status: {value}. But this conversion cannot fail. Defaulting to Placed");
            Self::Placed
        })
    }
}

//--------------------------------------      OrderKind      ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum OrderKind {
    Individual,
    #[serde(rename_all = "camelCase")]
    Group {
        group_order_id: GroupOrderId,
    },
}

impl OrderKind {
    pub fn group_order_id(&self) -> Option<&GroupOrderId> {
        match self {
            Self::Individual => None,
            Self::Group { group_order_id } => Some(group_order_id),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Individual => "Individual",
            Self::Group { .. } => "Group",
        }
    }
}

//--------------------------------------       NewOrder      ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub id: OrderId,
    pub kind: OrderKind,
    pub restaurant_id: RestaurantId,
    pub user_id: UserId,
    pub delivery_details: DeliveryDetails,
    pub cart_items: Vec<CartItem>,
    pub total_amount: Cents,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

impl NewOrder {
    /// A single-payer order, awaiting payment confirmation.
    pub fn individual(
        restaurant_id: RestaurantId,
        user_id: UserId,
        delivery_details: DeliveryDetails,
        cart_items: Vec<CartItem>,
        total_amount: Cents,
    ) -> Self {
        Self {
            id: OrderId::random(),
            kind: OrderKind::Individual,
            restaurant_id,
            user_id,
            delivery_details,
            cart_items,
            total_amount,
            status: OrderStatus::Placed,
            created_at: Utc::now(),
        }
    }
}

//--------------------------------------        Order        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub kind: OrderKind,
    pub restaurant_id: RestaurantId,
    pub user_id: UserId,
    pub delivery_details: DeliveryDetails,
    pub cart_items: Vec<CartItem>,
    pub total_amount: Cents,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------      Restaurant     ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    pub id: MenuItemId,
    pub name: String,
    pub price: Cents,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Restaurant {
    pub id: RestaurantId,
    pub name: String,
    pub city: String,
    pub country: String,
    pub delivery_price: Cents,
    pub menu_items: Vec<MenuItem>,
}

impl Restaurant {
    pub fn menu_item(&self, id: &MenuItemId) -> Option<&MenuItem> {
        self.menu_items.iter().find(|m| &m.id == id)
    }
}

//--------------------------------------     Participant     ---------------------------------------------------------
/// An authenticated user, as established by the identity layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub id: UserId,
    pub email: String,
    pub name: Option<String>,
}

impl Participant {
    pub fn new<S: Into<String>>(id: S, email: S) -> Self {
        Self { id: UserId(id.into()), email: email.into(), name: None }
    }

    pub fn with_name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = Some(name.into());
        self
    }
}

#[cfg(test)]
mod test {
    use chrono::Duration;

    use super::*;

    fn group_order(status: GroupOrderStatus) -> GroupOrder {
        let now = Utc::now();
        GroupOrder {
            id: GroupOrderId::from("g1"),
            restaurant_id: RestaurantId::from("r1"),
            initiator_id: UserId::from("u1"),
            cart_items: vec![],
            total_amount: Cents::from(4400),
            total_participants: 4,
            amount_per_person: Cents::from(1100),
            paid_participants: vec![],
            delivery_details: DeliveryDetails::default(),
            status,
            version: 1,
            expires_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn cart_item_quantity_accepts_strings_and_numbers() {
        let item: CartItem = serde_json::from_str(r#"{"menuItemId":"m1","name":"Pad Thai","quantity":"2"}"#).unwrap();
        assert_eq!(item.quantity, 2);
        let item: CartItem = serde_json::from_str(r#"{"menuItemId":"m1","name":"Pad Thai","quantity":3}"#).unwrap();
        assert_eq!(item.quantity, 3);
        let err = serde_json::from_str::<CartItem>(r#"{"menuItemId":"m1","name":"Pad Thai","quantity":"lots"}"#);
        assert!(err.is_err());
    }

    #[test]
    fn append_names() {
        let mut details = DeliveryDetails::new("a@example.com", "", "1 Main St", "Springfield");
        details.append_name("Alice");
        details.append_name("  ");
        details.append_name("Bob");
        assert_eq!(details.name, "Alice, Bob");
    }

    #[test]
    fn status_round_trip_from_db_strings() {
        for status in [
            GroupOrderStatus::Created,
            GroupOrderStatus::InProgress,
            GroupOrderStatus::Paid,
            GroupOrderStatus::Cancelled,
        ] {
            assert_eq!(GroupOrderStatus::from(status.to_string()), status);
        }
        assert!("Expired".parse::<GroupOrderStatus>().is_err());
        assert_eq!(OrderStatus::from("OutForDelivery".to_string()), OrderStatus::OutForDelivery);
    }

    #[test]
    fn expiry_and_joins() {
        let now = Utc::now();
        let mut order = group_order(GroupOrderStatus::InProgress);
        assert!(order.accepts_joins_at(now));
        order.expires_at = Some(now - Duration::minutes(1));
        assert!(order.is_expired_at(now));
        assert!(!order.accepts_joins_at(now));
        assert_eq!(order.effective_status_at(now), GroupOrderStatus::Cancelled);
        let paid = group_order(GroupOrderStatus::Paid);
        assert!(!paid.accepts_joins_at(now));
    }

    #[test]
    fn paid_emails_are_case_insensitive() {
        let mut order = group_order(GroupOrderStatus::InProgress);
        order.append_payment(
            PaidParticipant {
                participant_id: UserId::from("u2"),
                email: normalize_email(" Bob@Example.com "),
                amount_paid: Cents::from(1100),
                paid_at: Utc::now(),
            },
            "Bob",
        );
        assert!(order.has_paid("bob@example.com"));
        assert!(order.has_paid("BOB@EXAMPLE.COM"));
        assert!(!order.has_paid("alice@example.com"));
        assert_eq!(order.remaining_slots(), 3);
        assert_eq!(order.delivery_details.name, "Bob");
    }

    #[test]
    fn order_kind_serialization() {
        let kind = OrderKind::Group { group_order_id: GroupOrderId::from("g1") };
        let json = serde_json::to_string(&kind).unwrap();
        assert_eq!(json, r#"{"type":"group","groupOrderId":"g1"}"#);
        assert_eq!(serde_json::to_string(&OrderKind::Individual).unwrap(), r#"{"type":"individual"}"#);
    }
}
