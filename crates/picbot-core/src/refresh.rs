use std::{sync::Arc, time::Duration};

use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::{
    filter::{SharedFilter, SubjectFilter},
    ports::SubscriberStore,
    Result,
};

/// Periodically reloads the filter patterns from the store and swaps the
/// shared set. A failed load or compile keeps the previous set in place;
/// only the first load at startup is fatal (done by the caller).
pub async fn run_pattern_refresh(
    store: Arc<dyn SubscriberStore>,
    filter: SharedFilter,
    interval: Duration,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = sleep(interval) => {}
        }

        match refresh_once(store.as_ref(), &filter).await {
            Ok(count) => info!(patterns = count, "filter patterns refreshed"),
            Err(e) => warn!("pattern refresh failed, keeping previous set: {e}"),
        }
    }
}

/// One refresh: load, compile the whole set, swap only on success.
pub async fn refresh_once(store: &dyn SubscriberStore, filter: &SharedFilter) -> Result<usize> {
    let patterns = store.load_patterns().await?;
    let compiled = SubjectFilter::compile(&patterns)?;
    let count = patterns.len();
    filter.replace(compiled).await;
    Ok(count)
}
