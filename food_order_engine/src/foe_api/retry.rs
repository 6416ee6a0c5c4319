use std::time::Duration;

use rand::Rng;

/// How many times a compare-and-swap write is retried before giving up.
pub const MAX_CAS_ATTEMPTS: usize = 25;

/// Sleeps for a short random interval so that writers that collided don't collide again in lock-step.
pub async fn jitter() {
    let millis = rand::thread_rng().gen_range(1..=10u64);
    tokio::time::sleep(Duration::from_millis(millis)).await;
}
