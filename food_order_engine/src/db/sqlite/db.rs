//! `SqliteDatabase` is the concrete SQLite implementation of the food ordering engine's storage traits.
use std::fmt::Debug;

use chrono::{DateTime, Utc};
use food_order_common::Cents;
use log::*;
use sqlx::SqlitePool;

use super::{catalog, db_url, group_orders, new_pool, orders};
use crate::{
    db_types::{
        DeliveryDetails,
        GroupOrder,
        GroupOrderId,
        GroupOrderStatus,
        NewGroupOrder,
        NewOrder,
        Order,
        OrderId,
        Restaurant,
        RestaurantId,
        UserId,
    },
    traits::{
        Catalog,
        FoodOrderDatabase,
        GroupOrderManagement,
        OrderManagement,
        ParticipantPaymentUpdate,
        StorageError,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object, using `FOS_DATABASE_URL` or the default location.
    pub async fn new(max_connections: u32) -> Result<Self, StorageError> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, StorageError> {
        let pool = new_pool(url, max_connections).await?;
        Ok(Self { url: url.to_string(), pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Brings the schema up to date.
    pub async fn migrate(&self) -> Result<(), StorageError> {
        sqlx::migrate!("./src/db/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Database migrations complete");
        Ok(())
    }

    /// Adds a restaurant and its menu to the catalog, replacing any previous entry with the same id.
    pub async fn insert_restaurant(&self, restaurant: &Restaurant) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await?;
        catalog::upsert_restaurant(restaurant, &mut tx).await?;
        tx.commit().await?;
        Ok(())
    }
}

impl Catalog for SqliteDatabase {
    async fn fetch_restaurant(&self, id: &RestaurantId) -> Result<Option<Restaurant>, StorageError> {
        let mut conn = self.pool.acquire().await?;
        catalog::fetch_restaurant(id, &mut conn).await
    }
}

impl GroupOrderManagement for SqliteDatabase {
    async fn insert_group_order(&self, order: NewGroupOrder) -> Result<GroupOrder, StorageError> {
        let mut tx = self.pool.begin().await?;
        let order = group_orders::insert_group_order(order, &mut tx).await?;
        tx.commit().await?;
        Ok(order)
    }

    async fn fetch_group_order(&self, id: &GroupOrderId) -> Result<Option<GroupOrder>, StorageError> {
        let mut conn = self.pool.acquire().await?;
        group_orders::fetch_group_order(id, &mut conn).await
    }

    async fn fetch_group_orders_for_participant(&self, user_id: &UserId) -> Result<Vec<GroupOrder>, StorageError> {
        let mut conn = self.pool.acquire().await?;
        group_orders::fetch_group_orders_for_participant(user_id, &mut conn).await
    }

    async fn update_group_order_delivery(
        &self,
        id: &GroupOrderId,
        expected_version: i64,
        details: &DeliveryDetails,
        status: GroupOrderStatus,
    ) -> Result<GroupOrder, StorageError> {
        let mut tx = self.pool.begin().await?;
        group_orders::update_delivery(id, expected_version, details, status, &mut tx).await?;
        let order = group_orders::fetch_group_order(id, &mut tx)
            .await?
            .ok_or_else(|| StorageError::RecordNotFound(id.to_string()))?;
        tx.commit().await?;
        debug!("🗃️ Delivery details for group order {id} updated. Now at version {}", order.version);
        Ok(order)
    }

    async fn record_participant_payment(
        &self,
        id: &GroupOrderId,
        expected_version: i64,
        update: ParticipantPaymentUpdate,
    ) -> Result<GroupOrder, StorageError> {
        let mut tx = self.pool.begin().await?;
        // Dropping `tx` on any early return rolls everything back
        group_orders::advance_for_payment(id, expected_version, &update.delivery_name, update.new_status, &mut tx)
            .await?;
        group_orders::insert_payment(id, &update.payment, &mut tx).await?;
        if let Some(final_order) = update.final_order {
            let order = orders::insert_order(final_order, &mut tx).await?;
            debug!("🗃️ Final order {} created for group order {id}", order.id);
        }
        let order = group_orders::fetch_group_order(id, &mut tx)
            .await?
            .ok_or_else(|| StorageError::RecordNotFound(id.to_string()))?;
        tx.commit().await?;
        debug!(
            "🗃️ Payment from {} recorded against group order {id}. {}/{} paid, status {}",
            update.payment.email,
            order.paid_count(),
            order.total_participants,
            order.status
        );
        Ok(order)
    }

    async fn expire_group_orders(
        &self,
        expired_before: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<Vec<GroupOrderId>, StorageError> {
        let mut conn = self.pool.acquire().await?;
        let expired = group_orders::expire_group_orders(expired_before, now, &mut conn).await?;
        if !expired.is_empty() {
            debug!("🗃️ {} group orders expired", expired.len());
        }
        Ok(expired)
    }
}

impl OrderManagement for SqliteDatabase {
    async fn insert_order(&self, order: NewOrder) -> Result<Order, StorageError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::insert_order(order, &mut tx).await?;
        tx.commit().await?;
        Ok(order)
    }

    async fn fetch_order(&self, id: &OrderId) -> Result<Option<Order>, StorageError> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_order(id, &mut conn).await
    }

    async fn fetch_orders_for_user(&self, user_id: &UserId) -> Result<Vec<Order>, StorageError> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_orders_for_user(user_id, &mut conn).await
    }

    async fn mark_order_paid(&self, id: &OrderId, amount: Cents) -> Result<Option<Order>, StorageError> {
        let mut tx = self.pool.begin().await?;
        if !orders::mark_order_paid(id, amount, &mut tx).await? {
            return Ok(None);
        }
        let order = orders::fetch_order(id, &mut tx).await?;
        tx.commit().await?;
        Ok(order)
    }
}

impl FoodOrderDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn close(&mut self) -> Result<(), StorageError> {
        self.pool.close().await;
        Ok(())
    }
}
