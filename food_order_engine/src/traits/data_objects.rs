use crate::db_types::{GroupOrderStatus, NewOrder, PaidParticipant};

/// Everything that changes on a shared-order record when a participant's payment is accepted.
#[derive(Debug, Clone)]
pub struct ParticipantPaymentUpdate {
    pub payment: PaidParticipant,
    /// The full comma-separated recipient list, including the new payer.
    pub delivery_name: String,
    pub new_status: GroupOrderStatus,
    /// Present only when this payment completes the group.
    pub final_order: Option<NewOrder>,
}

impl ParticipantPaymentUpdate {
    pub fn completes_group(&self) -> bool {
        self.final_order.is_some()
    }
}
