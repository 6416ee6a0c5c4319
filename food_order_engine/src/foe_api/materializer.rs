//! Turns a fully-paid group order into the order the restaurant fulfils.
use chrono::Utc;
use log::*;

use crate::{
    db_types::{GroupOrder, GroupOrderStatus, NewOrder, OrderId, OrderKind, OrderStatus},
    foe_api::errors::OrderFlowError,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct Materializer;

impl Materializer {
    pub fn new() -> Self {
        Self
    }

    /// Builds the final order from `snapshot`, which must be the record with the completing payment already
    /// appended, but before its status is flipped to `Paid`.
    ///
    /// The order is placed on behalf of the initiator, for the full order total, and is already `Paid`.
    ///
    /// Refuses with `InvariantViolation` if the record has already advanced past `InProgress` (it was materialized
    /// before), or if fewer participants than the target have paid.
    pub fn materialize(&self, snapshot: &GroupOrder) -> Result<NewOrder, OrderFlowError> {
        if !matches!(snapshot.status, GroupOrderStatus::Created | GroupOrderStatus::InProgress) {
            let reason = format!("Group order {} is already {} and cannot be finalised again", snapshot.id, snapshot.status);
            error!("🍱️ {reason}");
            return Err(OrderFlowError::InvariantViolation(reason));
        }
        if snapshot.paid_count() != snapshot.total_participants {
            let reason = format!(
                "Group order {} has {} of {} payments and cannot be finalised",
                snapshot.id,
                snapshot.paid_count(),
                snapshot.total_participants
            );
            error!("🍱️ {reason}");
            return Err(OrderFlowError::InvariantViolation(reason));
        }
        let order = NewOrder {
            id: OrderId::random(),
            kind: OrderKind::Group { group_order_id: snapshot.id.clone() },
            restaurant_id: snapshot.restaurant_id.clone(),
            user_id: snapshot.initiator_id.clone(),
            delivery_details: snapshot.delivery_details.clone(),
            cart_items: snapshot.cart_items.clone(),
            total_amount: snapshot.total_amount,
            status: OrderStatus::Paid,
            created_at: Utc::now(),
        };
        debug!("🍱️ Final order {} built for group order {}", order.id, snapshot.id);
        Ok(order)
    }
}
