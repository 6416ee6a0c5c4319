use std::time::Duration;

use chrono::Utc;
use food_order_engine::{db_types::GroupOrderId, GroupOrderApi, SqliteDatabase};
use log::*;
use tokio::task::{JoinError, JoinHandle};

/// Starts the expiry worker. Do not await the returned JoinHandle, as it will run indefinitely.
///
/// The worker marks open group orders as cancelled once their expiry time and the checkout session grace period have
/// both passed. Expired group orders refuse new joins whether or not the worker runs; the sweep just makes their
/// status visible to everyone else.
pub fn start_expiry_worker<P>(api: GroupOrderApi<SqliteDatabase, P>, interval: Duration) -> JoinHandle<()>
where P: Send + Sync + 'static {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(interval);
        info!("🕰️ Group order expiry worker started");
        loop {
            timer.tick().await;
            trace!("🕰️ Running group order expiry job");
            match api.expire_stale_group_orders(Utc::now()).await {
                Ok(expired) if expired.is_empty() => trace!("🕰️ No group orders expired"),
                Ok(expired) => {
                    info!("🕰️ {} group orders expired", expired.len());
                    debug!("🕰️ Expired group orders: {}", group_order_list(&expired));
                },
                Err(e) => {
                    error!("🕰️ Error running group order expiry job: {e}");
                },
            }
        }
    })
}

/// Waits for the expiry worker to finish, which only happens if it panicked or was aborted, and reports it.
pub async fn watch_expiry_worker(worker: JoinHandle<()>) -> Result<(), JoinError> {
    let result = worker.await;
    match &result {
        Ok(()) => warn!("🕰️ The group order expiry worker stopped. Expired group orders will no longer be swept."),
        Err(e) if e.is_panic() => {
            error!("🕰️ The group order expiry worker panicked. Expired group orders will no longer be swept. {e}")
        },
        Err(e) => warn!("🕰️ The group order expiry worker was cancelled. {e}"),
    }
    result
}

fn group_order_list(ids: &[GroupOrderId]) -> String {
    ids.iter().map(|id| id.to_string()).collect::<Vec<String>>().join(", ")
}
