use std::path::Path;

use anyhow::Result;
use futures::Stream;
use notify::{recommended_watcher, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::broadcast;
use tokio_stream::{wrappers::BroadcastStream, StreamExt};
use tracing::trace;

use super::Slot;

/// Watches the state directory and reports which slots other processes have
/// touched. There is no conflict resolution: consumers are expected to
/// re-read the slot, last write observed wins. Events that don't map onto a
/// slot file are ignored.
pub fn watch_state_dir(
    dir: &Path,
    sender: broadcast::Sender<Slot>,
) -> Result<RecommendedWatcher> {
    let mut watcher = recommended_watcher(move |event: notify::Result<Event>| {
        let Ok(event) = event else { return };
        if event.kind.is_access() {
            return;
        }
        for path in &event.paths {
            let slot = path
                .file_name()
                .and_then(|name| name.to_str())
                .and_then(Slot::from_file_name);
            if let Some(slot) = slot {
                trace!("Slot {slot:?} changed on disk");
                let _ = sender.send(slot);
            }
        }
    })?;
    watcher.watch(dir, RecursiveMode::NonRecursive)?;
    Ok(watcher)
}

/// Adapts a subscription into a stream. Lag errors are dropped: a consumer
/// that fell behind just re-reads on the next notification it does see.
pub fn changes(receiver: broadcast::Receiver<Slot>) -> impl Stream<Item = Slot> {
    BroadcastStream::new(receiver).filter_map(|v| v.ok())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use anyhow::Result;
    use tempfile::tempdir;
    use tokio::sync::broadcast;

    use crate::store::Slot;

    use super::watch_state_dir;

    #[tokio::test]
    async fn test_external_write_is_reported() -> Result<()> {
        let dir = tempdir()?;
        let (sender, mut receiver) = broadcast::channel(16);
        let _watcher = watch_state_dir(dir.path(), sender)?;

        std::fs::write(dir.path().join(Slot::Settings.file_name()), "{}")?;

        let slot = tokio::time::timeout(Duration::from_secs(5), receiver.recv()).await??;
        assert_eq!(slot, Slot::Settings);
        Ok(())
    }

    #[tokio::test]
    async fn test_unrelated_files_are_ignored() -> Result<()> {
        let dir = tempdir()?;
        let (sender, mut receiver) = broadcast::channel(16);
        let _watcher = watch_state_dir(dir.path(), sender)?;

        std::fs::write(dir.path().join("unrelated.txt"), "hello")?;

        let outcome =
            tokio::time::timeout(Duration::from_millis(500), receiver.recv()).await;
        assert!(outcome.is_err(), "no notification expected, got {outcome:?}");
        Ok(())
    }
}
