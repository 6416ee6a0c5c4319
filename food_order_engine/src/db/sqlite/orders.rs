use chrono::{DateTime, Utc};
use food_order_common::Cents;
use log::debug;
use sqlx::{FromRow, SqliteConnection};

use crate::{
    db_types::{CartItem, DeliveryDetails, GroupOrderId, NewOrder, Order, OrderId, OrderKind, OrderStatus, RestaurantId, UserId},
    traits::StorageError,
};

#[derive(FromRow)]
struct OrderRow {
    id: OrderId,
    kind: String,
    group_order_id: Option<GroupOrderId>,
    restaurant_id: RestaurantId,
    user_id: UserId,
    delivery_email: String,
    delivery_name: String,
    delivery_address_line1: String,
    delivery_city: String,
    total_amount: Cents,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl OrderRow {
    fn into_order(self, cart_items: Vec<CartItem>) -> Result<Order, StorageError> {
        let kind = match (self.kind.as_str(), self.group_order_id) {
            ("Individual", None) => OrderKind::Individual,
            ("Group", Some(group_order_id)) => OrderKind::Group { group_order_id },
            (kind, gid) => {
                return Err(StorageError::DataIntegrity(format!(
                    "Order {} has kind {kind} and group order id {gid:?}",
                    self.id
                )))
            },
        };
        Ok(Order {
            id: self.id,
            kind,
            restaurant_id: self.restaurant_id,
            user_id: self.user_id,
            delivery_details: DeliveryDetails {
                email: self.delivery_email,
                name: self.delivery_name,
                address_line1: self.delivery_address_line1,
                city: self.delivery_city,
            },
            cart_items,
            total_amount: self.total_amount,
            status: OrderStatus::from(self.status),
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Inserts a new order and its items. Not atomic; call it inside a transaction.
///
/// A second order for the same group order is refused by the unique index on `group_order_id` and reported as
/// [`StorageError::AlreadyMaterialized`].
pub async fn insert_order(order: NewOrder, conn: &mut SqliteConnection) -> Result<Order, StorageError> {
    let group_order_id = order.kind.group_order_id().cloned();
    let result = sqlx::query(
        r#"
            INSERT INTO orders (
                id,
                kind,
                group_order_id,
                restaurant_id,
                user_id,
                delivery_email,
                delivery_name,
                delivery_address_line1,
                delivery_city,
                total_amount,
                status,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $12)
        "#,
    )
    .bind(order.id.as_str())
    .bind(order.kind.label())
    .bind(group_order_id.as_ref().map(|g| g.as_str()))
    .bind(order.restaurant_id.as_str())
    .bind(order.user_id.as_str())
    .bind(&order.delivery_details.email)
    .bind(&order.delivery_details.name)
    .bind(&order.delivery_details.address_line1)
    .bind(&order.delivery_details.city)
    .bind(order.total_amount.value())
    .bind(order.status.to_string())
    .bind(order.created_at)
    .execute(&mut *conn)
    .await;
    match (result, group_order_id) {
        (Ok(_), _) => {},
        (Err(sqlx::Error::Database(e)), Some(gid)) if e.is_unique_violation() => {
            return Err(StorageError::AlreadyMaterialized(gid));
        },
        (Err(sqlx::Error::Database(e)), None) if e.is_unique_violation() => {
            return Err(StorageError::OrderAlreadyExists(order.id.clone()));
        },
        (Err(e), _) => return Err(e.into()),
    }
    for (position, item) in order.cart_items.iter().enumerate() {
        sqlx::query(
            "INSERT INTO order_items (order_id, position, menu_item_id, name, quantity) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(order.id.as_str())
        .bind(position as i64)
        .bind(item.menu_item_id.as_str())
        .bind(&item.name)
        .bind(item.quantity)
        .execute(&mut *conn)
        .await?;
    }
    debug!("🗃️ {} order {} inserted for {}", order.kind.label(), order.id, order.total_amount);
    fetch_order(&order.id, conn)
        .await?
        .ok_or_else(|| StorageError::DataIntegrity(format!("Order {} vanished after insert", order.id)))
}

pub async fn fetch_order(id: &OrderId, conn: &mut SqliteConnection) -> Result<Option<Order>, StorageError> {
    let row: Option<OrderRow> =
        sqlx::query_as("SELECT * FROM orders WHERE id = $1").bind(id.as_str()).fetch_optional(&mut *conn).await?;
    match row {
        Some(row) => {
            let items = fetch_items(id, conn).await?;
            row.into_order(items).map(Some)
        },
        None => Ok(None),
    }
}

pub async fn fetch_orders_for_user(user_id: &UserId, conn: &mut SqliteConnection) -> Result<Vec<Order>, StorageError> {
    let rows: Vec<OrderRow> = sqlx::query_as("SELECT * FROM orders WHERE user_id = $1 ORDER BY created_at DESC")
        .bind(user_id.as_str())
        .fetch_all(&mut *conn)
        .await?;
    let mut orders = Vec::with_capacity(rows.len());
    for row in rows {
        let items = fetch_items(&row.id, conn).await?;
        orders.push(row.into_order(items)?);
    }
    Ok(orders)
}

/// Moves an individual order from `Placed` to `Paid`. Returns false if the order was not `Placed`.
pub async fn mark_order_paid(id: &OrderId, amount: Cents, conn: &mut SqliteConnection) -> Result<bool, StorageError> {
    let result = sqlx::query(
        r#"
            UPDATE orders SET status = 'Paid', total_amount = $1, updated_at = $2
            WHERE id = $3 AND kind = 'Individual' AND status = 'Placed'
        "#,
    )
    .bind(amount.value())
    .bind(Utc::now())
    .bind(id.as_str())
    .execute(&mut *conn)
    .await?;
    Ok(result.rows_affected() > 0)
}

async fn fetch_items(id: &OrderId, conn: &mut SqliteConnection) -> Result<Vec<CartItem>, StorageError> {
    let items = sqlx::query_as("SELECT menu_item_id, name, quantity FROM order_items WHERE order_id = $1 ORDER BY position")
        .bind(id.as_str())
        .fetch_all(&mut *conn)
        .await?;
    Ok(items)
}
