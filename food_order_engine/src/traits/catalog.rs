use crate::{
    db_types::{Restaurant, RestaurantId},
    traits::StorageError,
};

/// Read-only access to restaurant menus and delivery prices.
///
/// Prices are always taken from the catalog, never from client-supplied carts.
#[allow(async_fn_in_trait)]
pub trait Catalog {
    async fn fetch_restaurant(&self, id: &RestaurantId) -> Result<Option<Restaurant>, StorageError>;
}
