use chrono::{DateTime, Utc};
use food_order_common::Cents;
use log::{debug, trace};
use sqlx::{FromRow, SqliteConnection};

use crate::{
    db_types::{
        CartItem,
        DeliveryDetails,
        GroupOrder,
        GroupOrderId,
        GroupOrderStatus,
        NewGroupOrder,
        PaidParticipant,
        RestaurantId,
        UserId,
    },
    traits::StorageError,
};

#[derive(FromRow)]
struct GroupOrderRow {
    id: GroupOrderId,
    restaurant_id: RestaurantId,
    initiator_id: UserId,
    total_amount: Cents,
    total_participants: i64,
    amount_per_person: Cents,
    delivery_email: String,
    delivery_name: String,
    delivery_address_line1: String,
    delivery_city: String,
    status: String,
    version: i64,
    expires_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl GroupOrderRow {
    fn into_group_order(self, cart_items: Vec<CartItem>, paid_participants: Vec<PaidParticipant>) -> GroupOrder {
        GroupOrder {
            id: self.id,
            restaurant_id: self.restaurant_id,
            initiator_id: self.initiator_id,
            cart_items,
            total_amount: self.total_amount,
            total_participants: self.total_participants,
            amount_per_person: self.amount_per_person,
            paid_participants,
            delivery_details: DeliveryDetails {
                email: self.delivery_email,
                name: self.delivery_name,
                address_line1: self.delivery_address_line1,
                city: self.delivery_city,
            },
            status: GroupOrderStatus::from(self.status),
            version: self.version,
            expires_at: self.expires_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Inserts a new record with status `Created`, version 1 and no paid participants. Not atomic; call it inside a
/// transaction.
pub async fn insert_group_order(order: NewGroupOrder, conn: &mut SqliteConnection) -> Result<GroupOrder, StorageError> {
    sqlx::query(
        r#"
            INSERT INTO group_orders (
                id,
                restaurant_id,
                initiator_id,
                total_amount,
                total_participants,
                amount_per_person,
                status,
                version,
                expires_at,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, 'Created', 1, $7, $8, $8)
        "#,
    )
    .bind(order.id.as_str())
    .bind(order.restaurant_id.as_str())
    .bind(order.initiator_id.as_str())
    .bind(order.total_amount.value())
    .bind(order.total_participants)
    .bind(order.amount_per_person.value())
    .bind(order.expires_at)
    .bind(order.created_at)
    .execute(&mut *conn)
    .await?;
    for (position, item) in order.cart_items.iter().enumerate() {
        sqlx::query(
            r#"
                INSERT INTO group_order_items (group_order_id, position, menu_item_id, name, quantity)
                VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(order.id.as_str())
        .bind(position as i64)
        .bind(item.menu_item_id.as_str())
        .bind(&item.name)
        .bind(item.quantity)
        .execute(&mut *conn)
        .await?;
    }
    debug!("🗃️ Group order {} inserted", order.id);
    fetch_group_order(&order.id, conn)
        .await?
        .ok_or_else(|| StorageError::DataIntegrity(format!("Group order {} vanished after insert", order.id)))
}

pub async fn fetch_group_order(
    id: &GroupOrderId,
    conn: &mut SqliteConnection,
) -> Result<Option<GroupOrder>, StorageError> {
    let row: Option<GroupOrderRow> =
        sqlx::query_as("SELECT * FROM group_orders WHERE id = $1").bind(id.as_str()).fetch_optional(&mut *conn).await?;
    let Some(row) = row else {
        return Ok(None);
    };
    let items: Vec<CartItem> = sqlx::query_as(
        "SELECT menu_item_id, name, quantity FROM group_order_items WHERE group_order_id = $1 ORDER BY position",
    )
    .bind(id.as_str())
    .fetch_all(&mut *conn)
    .await?;
    let payments: Vec<PaidParticipant> = sqlx::query_as(
        r#"
            SELECT participant_id, email, amount_paid, paid_at FROM group_order_payments
            WHERE group_order_id = $1 ORDER BY id
        "#,
    )
    .bind(id.as_str())
    .fetch_all(&mut *conn)
    .await?;
    Ok(Some(row.into_group_order(items, payments)))
}

/// Records the user has paid into, newest first.
pub async fn fetch_group_orders_for_participant(
    user_id: &UserId,
    conn: &mut SqliteConnection,
) -> Result<Vec<GroupOrder>, StorageError> {
    let ids: Vec<GroupOrderId> = sqlx::query_scalar(
        r#"
            SELECT g.id FROM group_orders g
            WHERE EXISTS (
                SELECT 1 FROM group_order_payments p WHERE p.group_order_id = g.id AND p.participant_id = $1
            )
            ORDER BY g.created_at DESC
        "#,
    )
    .bind(user_id.as_str())
    .fetch_all(&mut *conn)
    .await?;
    let mut result = Vec::with_capacity(ids.len());
    for id in ids {
        if let Some(order) = fetch_group_order(&id, conn).await? {
            result.push(order);
        }
    }
    Ok(result)
}

/// Replaces the delivery details and status if, and only if, the record is still at `expected_version` and not
/// terminal. The version is incremented.
pub async fn update_delivery(
    id: &GroupOrderId,
    expected_version: i64,
    details: &DeliveryDetails,
    status: GroupOrderStatus,
    conn: &mut SqliteConnection,
) -> Result<(), StorageError> {
    let result = sqlx::query(
        r#"
            UPDATE group_orders SET
                delivery_email = $1,
                delivery_name = $2,
                delivery_address_line1 = $3,
                delivery_city = $4,
                status = $5,
                version = version + 1,
                updated_at = $6
            WHERE id = $7 AND version = $8 AND status IN ('Created', 'InProgress')
        "#,
    )
    .bind(&details.email)
    .bind(&details.name)
    .bind(&details.address_line1)
    .bind(&details.city)
    .bind(status.to_string())
    .bind(Utc::now())
    .bind(id.as_str())
    .bind(expected_version)
    .execute(&mut *conn)
    .await?;
    if result.rows_affected() == 0 {
        trace!("🗃️ Delivery update for {id} at version {expected_version} lost the race");
        return Err(StorageError::VersionConflict(id.clone()));
    }
    Ok(())
}

/// The compare-and-swap half of accepting a payment: bumps the version, and sets the recipient names and status. Must
/// be the first statement of its transaction so that the write lock is taken immediately.
pub async fn advance_for_payment(
    id: &GroupOrderId,
    expected_version: i64,
    delivery_name: &str,
    status: GroupOrderStatus,
    conn: &mut SqliteConnection,
) -> Result<(), StorageError> {
    let result = sqlx::query(
        r#"
            UPDATE group_orders SET
                delivery_name = $1,
                status = $2,
                version = version + 1,
                updated_at = $3
            WHERE id = $4 AND version = $5 AND status IN ('Created', 'InProgress')
        "#,
    )
    .bind(delivery_name)
    .bind(status.to_string())
    .bind(Utc::now())
    .bind(id.as_str())
    .bind(expected_version)
    .execute(&mut *conn)
    .await?;
    if result.rows_affected() == 0 {
        trace!("🗃️ Payment for {id} at version {expected_version} lost the race");
        return Err(StorageError::VersionConflict(id.clone()));
    }
    Ok(())
}

pub async fn insert_payment(
    id: &GroupOrderId,
    payment: &PaidParticipant,
    conn: &mut SqliteConnection,
) -> Result<(), StorageError> {
    let result = sqlx::query(
        r#"
            INSERT INTO group_order_payments (group_order_id, participant_id, email, amount_paid, paid_at)
            VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(id.as_str())
    .bind(payment.participant_id.as_str())
    .bind(&payment.email)
    .bind(payment.amount_paid.value())
    .bind(payment.paid_at)
    .execute(&mut *conn)
    .await;
    match result {
        Ok(_) => Ok(()),
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            Err(StorageError::DuplicateParticipant { id: id.clone(), email: payment.email.clone() })
        },
        Err(e) => Err(e.into()),
    }
}

/// Cancels every open record that expired at or before `expired_before`. Returns the ids of the cancelled records.
pub async fn expire_group_orders(
    expired_before: DateTime<Utc>,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Vec<GroupOrderId>, StorageError> {
    let ids: Vec<GroupOrderId> = sqlx::query_scalar(
        r#"
            UPDATE group_orders SET
                status = 'Cancelled',
                version = version + 1,
                updated_at = $1
            WHERE status IN ('Created', 'InProgress')
              AND expires_at IS NOT NULL
              AND julianday(expires_at) <= julianday($2)
            RETURNING id
        "#,
    )
    .bind(now)
    .bind(expired_before)
    .fetch_all(&mut *conn)
    .await?;
    Ok(ids)
}
