use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::db_types::{GroupOrder, GroupOrderId, Order, PaidParticipant};

/// An individual (single-payer) order has been paid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderPaidEvent {
    pub order: Order,
}

impl OrderPaidEvent {
    pub fn new(order: Order) -> Self {
        Self { order }
    }
}

/// One share of a group order has been paid, but the group is not complete yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantPaidEvent {
    pub group_order_id: GroupOrderId,
    pub participant: PaidParticipant,
    pub paid_count: i64,
    pub total_participants: i64,
}

impl ParticipantPaidEvent {
    pub fn new(group_order: &GroupOrder, participant: PaidParticipant) -> Self {
        Self {
            group_order_id: group_order.id.clone(),
            participant,
            paid_count: group_order.paid_count(),
            total_participants: group_order.total_participants,
        }
    }
}

/// Every share of a group order is paid and the final order has been created for the restaurant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupOrderPaidEvent {
    pub group_order: GroupOrder,
    pub order: Order,
}

impl GroupOrderPaidEvent {
    pub fn new(group_order: GroupOrder, order: Order) -> Self {
        Self { group_order, order }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertKind {
    /// An internal consistency check failed. Money may have been taken without a matching order.
    InvariantViolation,
    /// A participant paid into a group order that was already paid or cancelled. A refund is probably needed.
    PaymentForClosedOrder,
    /// A payment referenced a record that does not exist.
    UnknownRecord,
}

impl Display for AlertKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvariantViolation => write!(f, "InvariantViolation"),
            Self::PaymentForClosedOrder => write!(f, "PaymentForClosedOrder"),
            Self::UnknownRecord => write!(f, "UnknownRecord"),
        }
    }
}

/// Something happened that needs a human to look at it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperatorAlertEvent {
    pub kind: AlertKind,
    pub group_order_id: Option<GroupOrderId>,
    pub message: String,
}

impl OperatorAlertEvent {
    pub fn new<S: Into<String>>(kind: AlertKind, group_order_id: Option<GroupOrderId>, message: S) -> Self {
        Self { kind, group_order_id, message: message.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventType {
    OrderPaid(OrderPaidEvent),
    ParticipantPaid(ParticipantPaidEvent),
    GroupOrderPaid(GroupOrderPaidEvent),
    OperatorAlert(OperatorAlertEvent),
}
