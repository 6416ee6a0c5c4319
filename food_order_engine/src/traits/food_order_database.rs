use thiserror::Error;

use crate::{
    db_types::{GroupOrderId, OrderId},
    traits::{Catalog, GroupOrderManagement, OrderManagement},
};

/// The highest level of behaviour a storage backend must provide to run the ordering engine.
#[allow(async_fn_in_trait)]
pub trait FoodOrderDatabase: Clone + Catalog + GroupOrderManagement + OrderManagement {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), StorageError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Group order {0} was modified concurrently, or is no longer open")]
    VersionConflict(GroupOrderId),
    #[error("{email} has already paid into group order {id}")]
    DuplicateParticipant { id: GroupOrderId, email: String },
    #[error("Group order {0} already has a final order")]
    AlreadyMaterialized(GroupOrderId),
    #[error("Order {0} already exists")]
    OrderAlreadyExists(OrderId),
    #[error("Record not found: {0}")]
    RecordNotFound(String),
    #[error("Stored data is inconsistent: {0}")]
    DataIntegrity(String),
}

impl From<sqlx::Error> for StorageError {
    fn from(e: sqlx::Error) -> Self {
        StorageError::DatabaseError(e.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for StorageError {
    fn from(e: sqlx::migrate::MigrateError) -> Self {
        StorageError::DatabaseError(format!("Migration failed: {e}"))
    }
}
