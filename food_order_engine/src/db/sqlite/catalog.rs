use food_order_common::Cents;
use log::debug;
use sqlx::{FromRow, SqliteConnection};

use crate::{
    db_types::{MenuItem, Restaurant, RestaurantId},
    traits::StorageError,
};

#[derive(FromRow)]
struct RestaurantRow {
    id: RestaurantId,
    name: String,
    city: String,
    country: String,
    delivery_price: Cents,
}

pub async fn fetch_restaurant(
    id: &RestaurantId,
    conn: &mut SqliteConnection,
) -> Result<Option<Restaurant>, StorageError> {
    let row: Option<RestaurantRow> =
        sqlx::query_as("SELECT * FROM restaurants WHERE id = $1").bind(id.as_str()).fetch_optional(&mut *conn).await?;
    let Some(row) = row else {
        return Ok(None);
    };
    let menu_items: Vec<MenuItem> =
        sqlx::query_as("SELECT id, name, price FROM menu_items WHERE restaurant_id = $1 ORDER BY position")
            .bind(id.as_str())
            .fetch_all(&mut *conn)
            .await?;
    Ok(Some(Restaurant {
        id: row.id,
        name: row.name,
        city: row.city,
        country: row.country,
        delivery_price: row.delivery_price,
        menu_items,
    }))
}

/// Inserts the restaurant, or replaces it and its whole menu if it already exists. Not atomic on its own; call it
/// inside a transaction.
pub async fn upsert_restaurant(restaurant: &Restaurant, conn: &mut SqliteConnection) -> Result<(), StorageError> {
    sqlx::query(
        r#"
            INSERT INTO restaurants (id, name, city, country, delivery_price) VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO UPDATE SET
                name = excluded.name,
                city = excluded.city,
                country = excluded.country,
                delivery_price = excluded.delivery_price
        "#,
    )
    .bind(restaurant.id.as_str())
    .bind(&restaurant.name)
    .bind(&restaurant.city)
    .bind(&restaurant.country)
    .bind(restaurant.delivery_price.value())
    .execute(&mut *conn)
    .await?;
    sqlx::query("DELETE FROM menu_items WHERE restaurant_id = $1").bind(restaurant.id.as_str()).execute(&mut *conn).await?;
    for (position, item) in restaurant.menu_items.iter().enumerate() {
        sqlx::query("INSERT INTO menu_items (id, restaurant_id, position, name, price) VALUES ($1, $2, $3, $4, $5)")
            .bind(item.id.as_str())
            .bind(restaurant.id.as_str())
            .bind(position as i64)
            .bind(&item.name)
            .bind(item.price.value())
            .execute(&mut *conn)
            .await?;
    }
    debug!("🗃️ Restaurant {} saved with {} menu items", restaurant.id, restaurant.menu_items.len());
    Ok(())
}
