use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, warn};

use crate::{
    store::{entities::Session, StateStore},
    utils::clock::Clock,
};

/// Intervals shorter than this are dropped at [SessionTracker::stop] instead
/// of being logged. Opening the app for a moment shouldn't count against you.
pub const MIN_SESSION_DURATION: Duration = Duration::milliseconds(5000);

/// An open-session marker older than this is treated as a leftover from a
/// run that died without flushing. Its elapsed time can't be trusted, so
/// readers attribute nothing to it.
pub const STALE_MARKER_CUTOFF: Duration = Duration::hours(24);

/// The lifecycle state machine. There are two states: idle (no marker) and
/// tracking (a marker holding the open session's start). The marker slot is
/// the source of truth, this struct holds no session state of its own, so an
/// external wipe of the slot is simply observed on the next operation.
pub struct SessionTracker<S> {
    store: S,
    clock: Box<dyn Clock>,
}

impl<S: StateStore> SessionTracker<S> {
    pub fn new(store: S, clock: Box<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub async fn open_session_start(&self) -> Option<DateTime<Utc>> {
        self.store.current_session().await
    }

    pub async fn is_tracking(&self) -> bool {
        self.open_session_start().await.is_some()
    }

    /// Idle -> tracking. A no-op while a session is already open, so
    /// repeated signals can't restart the clock.
    pub async fn start(&self) {
        if self.store.current_session().await.is_some() {
            debug!("A session is already open");
            return;
        }
        let now = self.clock.time();
        self.store.put_current_session(Some(now)).await;
        info!("Started tracking at {now}");
    }

    /// Tracking -> idle. Appends the closed session to the front of the log
    /// when it meets [MIN_SESSION_DURATION], drops it otherwise, and clears
    /// the marker unconditionally. A no-op while idle.
    pub async fn stop(&self) -> Option<Session> {
        let Some(start) = self.store.current_session().await else {
            debug!("No session to stop");
            return None;
        };

        let now = self.clock.time();
        let duration = (now - start).max(Duration::zero());

        let recorded = if duration >= MIN_SESSION_DURATION {
            let session = Session::closed(start, now);
            let mut sessions = self.store.sessions().await;
            sessions.insert(0, session.clone());
            self.store.put_sessions(sessions).await;
            info!("Recorded a session of {}ms", duration.num_milliseconds());
            Some(session)
        } else {
            debug!(
                "Dropped a {}ms session, too short to count",
                duration.num_milliseconds()
            );
            None
        };

        self.store.put_current_session(None).await;
        recorded
    }

    /// Elapsed time of the open session, zero while idle. Computed, never
    /// stored.
    pub async fn elapsed(&self) -> Duration {
        resumable_elapsed(self.store.current_session().await, self.clock.time())
    }

    /// Unconditional wipe: the history and the open marker are both
    /// discarded. The minimum-duration rule does not apply to whatever was
    /// in progress.
    pub async fn clear_sessions(&self) {
        self.store.put_sessions(Vec::new()).await;
        self.store.put_current_session(None).await;
        info!("Cleared the session history");
    }

    /// A marker found at startup survived a run that never flushed. It is
    /// discarded, never resumed: resuming would inflate the next session by
    /// however long the process was dead.
    pub async fn discard_leftover_marker(&self) {
        if let Some(start) = self.store.current_session().await {
            warn!("Found an open session marker from {start}, discarding it");
            self.store.put_current_session(None).await;
        }
    }
}

/// Elapsed time a reader may attribute to the open marker: the distance to
/// now, unless the marker is older than [STALE_MARKER_CUTOFF].
pub fn resumable_elapsed(marker: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Duration {
    match marker {
        Some(start) if now - start <= STALE_MARKER_CUTOFF => (now - start).max(Duration::zero()),
        _ => Duration::zero(),
    }
}
