use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::Result;
use ticker::TrackerModule;
use tokio_util::sync::CancellationToken;
use tracing::error;

use crate::{
    store::{watch, JsonStore, StateStore},
    tracker::session::SessionTracker,
    utils::clock::{Clock, DefaultClock},
};

pub mod args;
pub mod shutdown;
pub mod ticker;

const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Represents the starting point for the daemon
pub async fn start_daemon(dir: PathBuf) -> Result<()> {
    std::env::set_current_dir("/")?;

    let store = Arc::new(JsonStore::new(dir.join("state"))?.with_external_watch());

    let shutdown_token = CancellationToken::new();

    let tracker = create_tracker(store, &shutdown_token, DefaultClock);

    let (_, tracking_result) = tokio::join!(
        shutdown::detect_shutdown(shutdown_token.clone()),
        tracker.run(),
    );

    if let Err(tracking_result) = tracking_result {
        error!("Tracking module got an error {:?}", tracking_result);
    }

    Ok(())
}

fn create_tracker(
    store: Arc<JsonStore>,
    shutdown_token: &CancellationToken,
    clock: impl Clock + Clone,
) -> TrackerModule<Arc<JsonStore>> {
    let changes = Box::pin(watch::changes(store.subscribe()));
    TrackerModule::new(
        SessionTracker::new(store, Box::new(clock.clone())),
        changes,
        shutdown_token.clone(),
        DEFAULT_TICK_INTERVAL,
        Box::new(clock),
    )
}
