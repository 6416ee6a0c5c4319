use food_order_common::Cents;
use serde::Serialize;

use crate::{
    db_types::{GroupOrder, GroupOrderId, GroupOrderStatus, OrderId},
    traits::CorrelationMetadata,
};

/// The result of starting a new group order.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedGroupOrder {
    pub group_order_id: GroupOrderId,
    pub shareable_link: String,
    pub amount_per_person: Cents,
    #[serde(skip)]
    pub group_order: GroupOrder,
}

/// A hosted checkout page that a participant can be redirected to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRedirect {
    pub session_id: String,
    pub url: String,
    /// The individual order awaiting payment, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<OrderId>,
}

/// A group order, together with the link that invites others to join it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupOrderWithLink {
    #[serde(flatten)]
    pub group_order: GroupOrder,
    pub shareable_link: String,
}

/// A verified "checkout session completed" notification from the payment processor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentConfirmation {
    pub event_id: String,
    pub session_id: String,
    pub metadata: CorrelationMetadata,
    /// The payer's email address, as collected by the processor
    pub payer_email: String,
    /// The amount actually charged
    pub amount_total: Cents,
}

/// What processing a payment confirmation did. Every variant is a successful acknowledgement; the processor should
/// not redeliver the event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackOutcome {
    /// A share was recorded. The group is not complete yet.
    ParticipantRecorded { group_order_id: GroupOrderId, paid_count: i64, total_participants: i64 },
    /// The last share was recorded and the final order was created.
    GroupOrderCompleted { group_order_id: GroupOrderId, order_id: OrderId },
    /// An individual order was marked as paid.
    IndividualOrderPaid { order_id: OrderId },
    /// This payment has already been processed.
    Duplicate,
    /// The payment references a record that doesn't exist.
    UnknownRecord,
    /// The group order was already paid or cancelled when the payment arrived. The operator has been alerted.
    ClosedGroupOrder { group_order_id: GroupOrderId, status: GroupOrderStatus },
    /// A consistency check failed and nothing was written. The operator has been alerted.
    InvariantViolation { group_order_id: GroupOrderId, reason: String },
}

impl CallbackOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            Self::ParticipantRecorded { .. } => "participant_recorded",
            Self::GroupOrderCompleted { .. } => "group_order_completed",
            Self::IndividualOrderPaid { .. } => "individual_order_paid",
            Self::Duplicate => "duplicate",
            Self::UnknownRecord => "unknown_record",
            Self::ClosedGroupOrder { .. } => "closed_group_order",
            Self::InvariantViolation { .. } => "invariant_violation",
        }
    }
}
