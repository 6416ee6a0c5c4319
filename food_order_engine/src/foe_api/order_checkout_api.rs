use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{CartItem, DeliveryDetails, NewOrder, Order, OrderId, Participant, RestaurantId, UserId},
    foe_api::{
        checkout_session::CheckoutSessionFactory,
        errors::OrderFlowError,
        flow_config::OrderFlowConfig,
        order_objects::CheckoutRedirect,
    },
    share_calculator::calculate_shares,
    traits::{Catalog, OrderManagement, PaymentProcessor},
};

/// `OrderCheckoutApi` handles single-payer orders: pricing a cart, starting a checkout, and listing a user's orders.
pub struct OrderCheckoutApi<B, P> {
    db: B,
    sessions: CheckoutSessionFactory<P>,
}

impl<B, P> Debug for OrderCheckoutApi<B, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderCheckoutApi")
    }
}

impl<B, P> OrderCheckoutApi<B, P> {
    pub fn new(db: B, processor: P, config: OrderFlowConfig) -> Self {
        Self { db, sessions: CheckoutSessionFactory::new(processor, config) }
    }
}

impl<B, P> OrderCheckoutApi<B, P>
where
    B: Catalog + OrderManagement,
    P: PaymentProcessor,
{
    /// Prices the cart, creates the remote checkout session and then stores the order as `Placed`.
    ///
    /// If the session can't be created, nothing is stored. The order is marked as paid when the processor confirms
    /// the payment.
    pub async fn create_individual_checkout(
        &self,
        restaurant_id: &RestaurantId,
        cart: &[CartItem],
        delivery: DeliveryDetails,
        customer: &Participant,
    ) -> Result<CheckoutRedirect, OrderFlowError> {
        let restaurant = self
            .db
            .fetch_restaurant(restaurant_id)
            .await?
            .ok_or_else(|| OrderFlowError::RestaurantNotFound(restaurant_id.clone()))?;
        let breakdown = calculate_shares(&restaurant, cart, 1)?;
        let order = NewOrder::individual(
            restaurant.id.clone(),
            customer.id.clone(),
            delivery,
            breakdown.cart_items(),
            breakdown.total_amount,
        );
        let request = self.sessions.individual_request(&order, &breakdown, customer);
        let handle = self.sessions.create_session(request).await?;
        let order = self.db.insert_order(order).await?;
        info!("📦️ Order {} placed by {} for {}", order.id, customer.id, order.total_amount);
        Ok(CheckoutRedirect { session_id: handle.session_id, url: handle.url, order_id: Some(order.id) })
    }

    /// All of the user's orders, including group orders they initiated, newest first.
    pub async fn orders_for_user(&self, user_id: &UserId) -> Result<Vec<Order>, OrderFlowError> {
        let orders = self.db.fetch_orders_for_user(user_id).await?;
        Ok(orders)
    }

    pub async fn order_for_user(&self, id: &OrderId, user_id: &UserId) -> Result<Order, OrderFlowError> {
        match self.db.fetch_order(id).await? {
            Some(order) if &order.user_id == user_id => Ok(order),
            _ => Err(OrderFlowError::OrderNotFound(id.clone())),
        }
    }
}
