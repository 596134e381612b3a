use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::time::sleep;
use tracing::{debug, error, info};

use crate::error::StoreError;
use crate::store::VerificationStore;

/// Deletes unused verification records that expired at least `retention`
/// before `now`. Used records are kept as the audit trail of a link.
pub async fn sweep_once(
    store: &dyn VerificationStore,
    now: DateTime<Utc>,
    retention: Duration,
) -> Result<usize, StoreError> {
    store.purge_expired(now - retention).await
}

pub async fn run_verification_sweep(store: Arc<dyn VerificationStore>, every: std::time::Duration) {
    let retention = Duration::from_std(every).unwrap_or_else(|_| Duration::hours(1));
    loop {
        sleep(every).await;
        match sweep_once(store.as_ref(), Utc::now(), retention).await {
            Ok(0) => debug!("no expired verification records"),
            Ok(purged) => info!(purged, "purged expired verification records"),
            Err(err) => error!(error = %err, "verification sweep failed"),
        }
    }
}
