use std::fmt::Debug;

use chrono::{DateTime, Utc};
use log::*;

use crate::{
    db_types::{
        CartItem,
        DeliveryDetails,
        GroupOrder,
        GroupOrderId,
        GroupOrderStatus,
        NewGroupOrder,
        Participant,
        RestaurantId,
        UserId,
    },
    foe_api::{
        checkout_session::CheckoutSessionFactory,
        errors::OrderFlowError,
        flow_config::OrderFlowConfig,
        order_objects::{CheckoutRedirect, CreatedGroupOrder, GroupOrderWithLink},
        retry::{jitter, MAX_CAS_ATTEMPTS},
    },
    share_calculator::calculate_shares,
    traits::{Catalog, GroupOrderManagement, PaymentProcessor, StorageError},
};

/// `GroupOrderApi` coordinates the lifecycle of shared orders: creating them, and preparing participants' checkouts.
///
/// Payments themselves are recorded by [`crate::PaymentCallbackApi`] when the processor confirms them.
pub struct GroupOrderApi<B, P> {
    db: B,
    sessions: CheckoutSessionFactory<P>,
}

impl<B, P> Debug for GroupOrderApi<B, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "GroupOrderApi")
    }
}

impl<B, P> GroupOrderApi<B, P> {
    pub fn new(db: B, processor: P, config: OrderFlowConfig) -> Self {
        Self { db, sessions: CheckoutSessionFactory::new(processor, config) }
    }

    pub fn config(&self) -> &OrderFlowConfig {
        self.sessions.config()
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B, P> GroupOrderApi<B, P>
where
    B: Catalog + GroupOrderManagement,
    P: PaymentProcessor,
{
    /// Prices the cart against the restaurant's menu, and stores a new group order with status `Created` and nobody
    /// paid yet. The participant count is a fixed policy, not something the initiator chooses.
    pub async fn create_group_order(
        &self,
        restaurant_id: &RestaurantId,
        cart: &[CartItem],
        initiator: &Participant,
    ) -> Result<CreatedGroupOrder, OrderFlowError> {
        let restaurant = self
            .db
            .fetch_restaurant(restaurant_id)
            .await?
            .ok_or_else(|| OrderFlowError::RestaurantNotFound(restaurant_id.clone()))?;
        let config = self.config();
        let shares = calculate_shares(&restaurant, cart, config.participants_per_group)?;
        let mut new_order = NewGroupOrder::new(
            restaurant.id.clone(),
            initiator.id.clone(),
            shares.cart_items(),
            shares.total_amount,
            shares.participants,
            shares.amount_per_person,
        );
        if let Some(ttl) = config.group_order_ttl {
            let expires_at = new_order.created_at + ttl;
            new_order = new_order.with_expiry(expires_at);
        }
        let group_order = self.db.insert_group_order(new_order).await?;
        info!(
            "🍱️ Group order {} created by {} at {}. {} each for {} participants",
            group_order.id, initiator.id, restaurant.name, group_order.amount_per_person, group_order.total_participants
        );
        Ok(CreatedGroupOrder {
            group_order_id: group_order.id.clone(),
            shareable_link: config.shareable_link(&group_order.id),
            amount_per_person: group_order.amount_per_person,
            group_order,
        })
    }

    /// Prepares a checkout for one participant's share.
    ///
    /// Checks are made in this order: the record must exist, the participant must not have paid already, and the
    /// record must still accept joins (not paid, cancelled or expired). The remote checkout session is created first.
    /// Only once that succeeds are the delivery details merged into the record, and the record moved to
    /// `InProgress`. The first participant to join with an address sets the delivery address for the group.
    pub async fn prepare_join(
        &self,
        id: &GroupOrderId,
        delivery: DeliveryDetails,
        participant: &Participant,
    ) -> Result<CheckoutRedirect, OrderFlowError> {
        let record = self.db.fetch_group_order(id).await?.ok_or_else(|| OrderFlowError::GroupOrderNotFound(id.clone()))?;
        let mut delivery = delivery;
        if delivery.email.trim().is_empty() {
            delivery.email = participant.email.clone();
        }
        delivery.email = delivery.email.trim().to_string();
        if delivery.email.is_empty() {
            return Err(OrderFlowError::Validation("An email address is required to join a group order".into()));
        }
        if record.has_paid(&delivery.email) {
            debug!("🍱️ {} tried to join group order {id} again", delivery.email);
            return Err(OrderFlowError::AlreadyPaid);
        }
        if !record.accepts_joins_at(Utc::now()) {
            debug!("🍱️ Group order {id} is {} and no longer accepts joins", record.effective_status_at(Utc::now()));
            return Err(OrderFlowError::OrderFull);
        }
        let request = self.sessions.group_share_request(&record, participant, &delivery);
        let handle = self.sessions.create_session(request).await?;
        self.merge_join_details(record, &delivery).await?;
        info!("🍱️ {} is checking out a share of group order {id}", participant.id);
        Ok(CheckoutRedirect { session_id: handle.session_id, url: handle.url, order_id: None })
    }

    async fn merge_join_details(&self, mut record: GroupOrder, delivery: &DeliveryDetails) -> Result<(), OrderFlowError> {
        for _ in 0..MAX_CAS_ATTEMPTS {
            let set_address = !record.delivery_details.has_address() && delivery.has_address();
            let set_status = record.status == GroupOrderStatus::Created;
            if record.status.is_terminal() || !(set_address || set_status) {
                return Ok(());
            }
            let mut details = record.delivery_details.clone();
            if set_address {
                // Recipient names are only added once a share is paid
                details.email = delivery.email.clone();
                details.address_line1 = delivery.address_line1.trim().to_string();
                details.city = delivery.city.trim().to_string();
            }
            match self.db.update_group_order_delivery(&record.id, record.version, &details, GroupOrderStatus::InProgress).await {
                Ok(updated) => {
                    trace!("🍱️ Group order {} is now at version {}", updated.id, updated.version);
                    return Ok(());
                },
                Err(StorageError::VersionConflict(id)) => {
                    jitter().await;
                    record = match self.db.fetch_group_order(&id).await? {
                        Some(r) => r,
                        None => return Err(OrderFlowError::GroupOrderNotFound(id)),
                    };
                },
                Err(e) => return Err(e.into()),
            }
        }
        warn!("🍱️ Gave up merging delivery details into group order {} after {MAX_CAS_ATTEMPTS} attempts", record.id);
        Err(OrderFlowError::TooManyConflicts(record.id))
    }

    /// The group orders the user has paid a share of, newest first.
    pub async fn participant_group_orders(&self, user_id: &UserId) -> Result<Vec<GroupOrder>, OrderFlowError> {
        let now = Utc::now();
        let orders = self.db.fetch_group_orders_for_participant(user_id).await?;
        Ok(orders.into_iter().map(|o| with_effective_status(o, now)).collect())
    }

    pub async fn group_order_with_link(&self, id: &GroupOrderId) -> Result<GroupOrderWithLink, OrderFlowError> {
        let group_order = self.db.fetch_group_order(id).await?.ok_or_else(|| OrderFlowError::GroupOrderNotFound(id.clone()))?;
        let shareable_link = self.config().shareable_link(id);
        Ok(GroupOrderWithLink { group_order: with_effective_status(group_order, Utc::now()), shareable_link })
    }
}

impl<B, P> GroupOrderApi<B, P>
where B: GroupOrderManagement
{
    /// Cancels every open group order that expired more than the sweep grace period before `now`.
    ///
    /// Expired records refuse new joins straight away, but checkouts started before expiry stay payable until their
    /// sessions lapse. Sweeping only after the grace period means those payments are recorded whether or not the sweep
    /// has run.
    pub async fn expire_stale_group_orders(&self, now: DateTime<Utc>) -> Result<Vec<GroupOrderId>, OrderFlowError> {
        let cutoff = now - self.config().sweep_grace;
        let expired = self.db.expire_group_orders(cutoff, now).await?;
        for id in &expired {
            info!("🍱️ Group order {id} expired before every share was paid");
        }
        Ok(expired)
    }
}

fn with_effective_status(mut order: GroupOrder, now: DateTime<Utc>) -> GroupOrder {
    order.status = order.effective_status_at(now);
    order
}
