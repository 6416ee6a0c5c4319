use std::fmt::Debug;

use chrono::Utc;
use log::*;

use crate::{
    db_types::{normalize_email, GroupOrder, GroupOrderId, GroupOrderStatus, OrderId, OrderStatus, PaidParticipant},
    events::{
        AlertKind,
        EventProducers,
        GroupOrderPaidEvent,
        OperatorAlertEvent,
        OrderPaidEvent,
        ParticipantPaidEvent,
    },
    foe_api::{
        errors::OrderFlowError,
        materializer::Materializer,
        order_objects::{CallbackOutcome, PaymentConfirmation},
        retry::{jitter, MAX_CAS_ATTEMPTS},
    },
    traits::{GroupOrderManagement, OrderManagement, ParticipantPaymentUpdate, StorageError},
};

/// `PaymentCallbackApi` applies payment confirmations from the processor to local records.
///
/// Confirmations are delivered at least once and possibly concurrently, so every path here is idempotent. For group
/// orders the read-check-append-persist cycle is a compare-and-swap on the record's version, retried on conflict, so
/// two payments for the same group order never interleave. Payments for different group orders don't contend.
///
/// The caller must have verified the authenticity of the notification before calling in here.
pub struct PaymentCallbackApi<B> {
    db: B,
    producers: EventProducers,
    materializer: Materializer,
}

impl<B> Debug for PaymentCallbackApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PaymentCallbackApi")
    }
}

impl<B> PaymentCallbackApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers, materializer: Materializer::new() }
    }
}

impl<B> PaymentCallbackApi<B>
where B: GroupOrderManagement + OrderManagement
{
    /// Applies a completed checkout. Correlation metadata decides the path: a group order id routes to the group
    /// path, otherwise the individual order named in the metadata is marked as paid.
    ///
    /// Every `Ok` outcome means the notification has been dealt with and must not be redelivered. Errors are
    /// transient (storage failures, or a record too contended to update) and a redelivery may succeed.
    pub async fn process_checkout_completed(
        &self,
        confirmation: PaymentConfirmation,
    ) -> Result<CallbackOutcome, OrderFlowError> {
        trace!("💳️ Processing payment confirmation {} (session {})", confirmation.event_id, confirmation.session_id);
        let outcome = match confirmation.metadata.group_order_id.clone() {
            Some(group_order_id) => self.process_group_payment(&group_order_id, &confirmation).await?,
            None => self.process_individual_payment(&confirmation).await?,
        };
        debug!("💳️ Payment confirmation {} processed: {}", confirmation.event_id, outcome.label());
        Ok(outcome)
    }

    async fn process_individual_payment(
        &self,
        confirmation: &PaymentConfirmation,
    ) -> Result<CallbackOutcome, OrderFlowError> {
        let order_id: &OrderId = &confirmation.metadata.order_id;
        let Some(order) = self.db.fetch_order(order_id).await? else {
            warn!("💳️ Payment {} is for order {order_id}, which doesn't exist", confirmation.event_id);
            let message = format!("Payment {} references unknown order {order_id}", confirmation.event_id);
            self.alert(OperatorAlertEvent::new(AlertKind::UnknownRecord, None, message)).await;
            return Ok(CallbackOutcome::UnknownRecord);
        };
        if order.status != OrderStatus::Placed {
            debug!("💳️ Order {order_id} is already {}. Ignoring payment {}", order.status, confirmation.event_id);
            return Ok(CallbackOutcome::Duplicate);
        }
        match self.db.mark_order_paid(order_id, confirmation.amount_total).await? {
            Some(order) => {
                info!("💳️ Order {order_id} has been paid ({})", order.total_amount);
                self.producers.publish_order_paid(OrderPaidEvent::new(order)).await;
                Ok(CallbackOutcome::IndividualOrderPaid { order_id: order_id.clone() })
            },
            // A concurrent delivery of the same event got there first
            None => Ok(CallbackOutcome::Duplicate),
        }
    }

    async fn process_group_payment(
        &self,
        id: &GroupOrderId,
        confirmation: &PaymentConfirmation,
    ) -> Result<CallbackOutcome, OrderFlowError> {
        let email = normalize_email(&confirmation.payer_email);
        if email.is_empty() {
            // Without an email the payment can't be deduplicated, so it must not be recorded
            let reason = format!("Payment {} for group order {id} carries no payer email", confirmation.event_id);
            return Ok(self.invariant_violation(id, reason).await);
        }
        for attempt in 1..=MAX_CAS_ATTEMPTS {
            let Some(record) = self.db.fetch_group_order(id).await? else {
                warn!("💳️ Payment {} is for group order {id}, which doesn't exist", confirmation.event_id);
                let message = format!("Payment {} from {email} references unknown group order {id}", confirmation.event_id);
                self.alert(OperatorAlertEvent::new(AlertKind::UnknownRecord, Some(id.clone()), message)).await;
                return Ok(CallbackOutcome::UnknownRecord);
            };
            if record.has_paid(&email) {
                debug!("💳️ {email} has already paid into group order {id}. Ignoring duplicate delivery.");
                return Ok(CallbackOutcome::Duplicate);
            }
            if record.status.is_terminal() {
                let message = format!(
                    "{email} paid {} into group order {id}, which is already {}. A refund is probably due.",
                    confirmation.amount_total, record.status
                );
                warn!("💳️ {message}");
                self.alert(OperatorAlertEvent::new(AlertKind::PaymentForClosedOrder, Some(id.clone()), message)).await;
                return Ok(CallbackOutcome::ClosedGroupOrder { group_order_id: id.clone(), status: record.status });
            }
            if record.paid_count() >= record.total_participants {
                let reason = format!(
                    "Group order {id} is {} but already has {}/{} payments",
                    record.status,
                    record.paid_count(),
                    record.total_participants
                );
                return Ok(self.invariant_violation(id, reason).await);
            }

            let payment = PaidParticipant {
                participant_id: confirmation.metadata.user_id.clone(),
                email: email.clone(),
                amount_paid: confirmation.amount_total,
                paid_at: Utc::now(),
            };
            let mut snapshot = record.clone();
            snapshot.append_payment(payment.clone(), &confirmation.metadata.payer_name);
            let final_order = if snapshot.is_complete() {
                match self.materializer.materialize(&snapshot) {
                    Ok(order) => Some(order),
                    Err(e) => return Ok(self.invariant_violation(id, e.to_string()).await),
                }
            } else {
                None
            };
            let final_order_id = final_order.as_ref().map(|o| o.id.clone());
            let update = ParticipantPaymentUpdate {
                payment: payment.clone(),
                delivery_name: snapshot.delivery_details.name.clone(),
                new_status: if final_order.is_some() { GroupOrderStatus::Paid } else { GroupOrderStatus::InProgress },
                final_order,
            };

            match self.db.record_participant_payment(id, record.version, update).await {
                Ok(updated) => return Ok(self.payment_recorded(updated, payment, final_order_id).await),
                Err(StorageError::VersionConflict(_)) => {
                    trace!("💳️ Group order {id} changed under payment from {email} (attempt {attempt}). Retrying.");
                    jitter().await;
                },
                Err(StorageError::DuplicateParticipant { .. }) => {
                    debug!("💳️ {email} has already paid into group order {id}. Ignoring duplicate delivery.");
                    return Ok(CallbackOutcome::Duplicate);
                },
                Err(StorageError::AlreadyMaterialized(_)) => {
                    let reason = format!("Group order {id} already has a final order. Payment from {email} not recorded");
                    return Ok(self.invariant_violation(id, reason).await);
                },
                Err(e) => return Err(e.into()),
            }
        }
        warn!("💳️ Gave up recording payment from {email} into group order {id} after {MAX_CAS_ATTEMPTS} attempts");
        Err(OrderFlowError::TooManyConflicts(id.clone()))
    }

    async fn payment_recorded(
        &self,
        updated: GroupOrder,
        payment: PaidParticipant,
        final_order_id: Option<OrderId>,
    ) -> CallbackOutcome {
        let id = updated.id.clone();
        info!(
            "💳️ {} paid {} into group order {id}. {}/{} shares paid",
            payment.email,
            payment.amount_paid,
            updated.paid_count(),
            updated.total_participants
        );
        self.producers.publish_participant_paid(ParticipantPaidEvent::new(&updated, payment)).await;
        let Some(order_id) = final_order_id else {
            return CallbackOutcome::ParticipantRecorded {
                group_order_id: id,
                paid_count: updated.paid_count(),
                total_participants: updated.total_participants,
            };
        };
        info!("🍱️ Group order {id} is fully paid. Final order {order_id} created.");
        match self.db.fetch_order(&order_id).await {
            Ok(Some(order)) => self.producers.publish_group_order_paid(GroupOrderPaidEvent::new(updated, order)).await,
            Ok(None) => error!("🍱️ Final order {order_id} for group order {id} could not be found after commit"),
            Err(e) => warn!("🍱️ Could not load final order {order_id} for notifications. {e}"),
        }
        CallbackOutcome::GroupOrderCompleted { group_order_id: id, order_id }
    }

    async fn invariant_violation(&self, id: &GroupOrderId, reason: String) -> CallbackOutcome {
        error!("🚨️ Invariant violation on group order {id}: {reason}");
        self.alert(OperatorAlertEvent::new(AlertKind::InvariantViolation, Some(id.clone()), reason.clone())).await;
        CallbackOutcome::InvariantViolation { group_order_id: id.clone(), reason }
    }

    async fn alert(&self, event: OperatorAlertEvent) {
        self.producers.publish_operator_alert(event).await;
    }
}
