use std::{pin::Pin, time::Duration as StdDuration};

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use futures::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{info, trace};

use crate::{
    store::{Slot, StateStore},
    tracker::session::SessionTracker,
    utils::clock::Clock,
};

/// Drives tracking for the lifetime of the daemon: starts a session the
/// moment the process is up, refreshes the elapsed reporter once a second,
/// and flushes the final interval through the regular stop path when the
/// shutdown token fires.
pub struct TrackerModule<S> {
    tracker: SessionTracker<S>,
    changes: Pin<Box<dyn Stream<Item = Slot> + Send>>,
    shutdown: CancellationToken,
    tick_interval: StdDuration,
    clock: Box<dyn Clock>,
}

impl<S: StateStore> TrackerModule<S> {
    pub fn new(
        tracker: SessionTracker<S>,
        changes: Pin<Box<dyn Stream<Item = Slot> + Send>>,
        shutdown: CancellationToken,
        tick_interval: StdDuration,
        clock: Box<dyn Clock>,
    ) -> Self {
        Self {
            tracker,
            changes,
            shutdown,
            tick_interval,
            clock,
        }
    }

    /// Executes the tracking event loop.
    pub async fn run(mut self) -> Result<()> {
        self.tracker.discard_leftover_marker().await;
        self.tracker.start().await;

        let mut reporter = ElapsedReporter::new();
        let mut changes_closed = false;
        let mut tick_point = self.clock.instant();

        'track: loop {
            tick_point += self.tick_interval;

            // Auto-start is re-asserted every tick: as long as the daemon is
            // up there must be an open session.
            let mut start = self.tracker.open_session_start().await;
            if start.is_none() {
                self.tracker.start().await;
                start = self.tracker.open_session_start().await;
            }
            let elapsed = reporter.report(start, self.clock.time());
            trace!("Tracked {}ms this session", elapsed.num_milliseconds());

            'wait: loop {
                tokio::select! {
                    _ = self.shutdown.cancelled() => break 'track,
                    _ = self.clock.sleep_until(tick_point) => break 'wait,
                    changed = self.changes.next(), if !changes_closed => match changed {
                        Some(Slot::Sessions | Slot::CurrentSession) => {
                            // The marker only vanishes mid-run through an
                            // external wipe. The app is still open, so
                            // tracking resumes right away.
                            if self.tracker.open_session_start().await.is_none() {
                                info!("History was cleared externally, starting a new session");
                                self.tracker.start().await;
                            }
                        }
                        Some(_) => (),
                        None => changes_closed = true,
                    },
                }
            }
        }

        // The final interval goes through the same stop contract as any
        // other, short ones are dropped here too.
        if let Some(session) = self.tracker.stop().await {
            info!(
                "Flushed the final session of {}ms",
                session.duration.num_milliseconds()
            );
        }
        Ok(())
    }
}

/// Produces the elapsed value shown for the open session: non-decreasing
/// within one session, reset when the marker changes, zero while idle. Only
/// ever displayed, never persisted.
pub struct ElapsedReporter {
    anchor: Option<DateTime<Utc>>,
    last: Duration,
}

impl ElapsedReporter {
    pub fn new() -> Self {
        Self {
            anchor: None,
            last: Duration::zero(),
        }
    }

    pub fn report(&mut self, start: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Duration {
        if start != self.anchor {
            self.anchor = start;
            self.last = Duration::zero();
        }
        let Some(start) = start else {
            return Duration::zero();
        };
        self.last = self.last.max((now - start).max(Duration::zero()));
        self.last
    }
}

impl Default for ElapsedReporter {
    fn default() -> Self {
        Self::new()
    }
}
