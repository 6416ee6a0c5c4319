use chrono::{DateTime, Utc};

use crate::{
    db_types::{DeliveryDetails, GroupOrder, GroupOrderId, GroupOrderStatus, NewGroupOrder, UserId},
    traits::{data_objects::ParticipantPaymentUpdate, StorageError},
};

/// Storage behaviour for shared-order records.
///
/// Every mutating call takes the `version` the caller read. The write only succeeds if the stored record still has
/// that version, in which case the version is incremented. Otherwise [`StorageError::VersionConflict`] is returned and
/// nothing is changed. Callers are expected to reload the record and re-evaluate.
#[allow(async_fn_in_trait)]
pub trait GroupOrderManagement {
    /// Stores a brand-new record with status `Created` and an empty participant list.
    async fn insert_group_order(&self, order: NewGroupOrder) -> Result<GroupOrder, StorageError>;

    async fn fetch_group_order(&self, id: &GroupOrderId) -> Result<Option<GroupOrder>, StorageError>;

    /// All records in which the given user has paid a share, newest first.
    async fn fetch_group_orders_for_participant(&self, user_id: &UserId) -> Result<Vec<GroupOrder>, StorageError>;

    /// Overwrites the delivery details and status of a record that has not reached a terminal state.
    async fn update_group_order_delivery(
        &self,
        id: &GroupOrderId,
        expected_version: i64,
        details: &DeliveryDetails,
        status: GroupOrderStatus,
    ) -> Result<GroupOrder, StorageError>;

    /// In a single atomic transaction,
    /// * bumps the record version (failing with `VersionConflict` if it moved on, or if the record is terminal),
    /// * appends the payment to the participant list,
    /// * updates the delivery recipient names and the status,
    /// * stores the final order if one is supplied. A second final order for the same record fails with
    ///   `AlreadyMaterialized`.
    ///
    /// Returns the updated record.
    async fn record_participant_payment(
        &self,
        id: &GroupOrderId,
        expected_version: i64,
        update: ParticipantPaymentUpdate,
    ) -> Result<GroupOrder, StorageError>;

    /// Marks every non-terminal record whose expiry time is at or before `expired_before` as `Cancelled`, stamping
    /// them as updated at `now`. Returns the ids of the records that were changed.
    async fn expire_group_orders(
        &self,
        expired_before: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<Vec<GroupOrderId>, StorageError>;
}
