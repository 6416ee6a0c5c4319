use food_order_common::Cents;

use crate::{
    db_types::{NewOrder, Order, OrderId, UserId},
    traits::StorageError,
};

/// Storage behaviour for restaurant-facing orders.
#[allow(async_fn_in_trait)]
pub trait OrderManagement {
    /// Stores a new order. Fails with `OrderAlreadyExists` if the id is taken, or `AlreadyMaterialized` if the order
    /// finalises a group order that already has a final order.
    async fn insert_order(&self, order: NewOrder) -> Result<Order, StorageError>;

    async fn fetch_order(&self, id: &OrderId) -> Result<Option<Order>, StorageError>;

    /// Orders placed by the given user, newest first.
    async fn fetch_orders_for_user(&self, user_id: &UserId) -> Result<Vec<Order>, StorageError>;

    /// Marks a `Placed` individual order as `Paid` and records the amount actually charged.
    ///
    /// Returns the updated order, or `None` if the order was not in the `Placed` state (already paid, for example).
    async fn mark_order_paid(&self, id: &OrderId, amount: Cents) -> Result<Option<Order>, StorageError>;
}
