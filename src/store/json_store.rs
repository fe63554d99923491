use std::{io::ErrorKind, ops::Deref, path::PathBuf};

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fs4::tokio::AsyncFileExt;
use serde::{de::DeserializeOwned, Serialize};
use tokio::{
    fs::File,
    io::{AsyncReadExt, AsyncWriteExt},
    sync::broadcast,
};
use tracing::warn;

use super::{
    entities::{Intention, OpenSession, Session, UserSettings},
    watch, Slot,
};

/// Typed access to the four durable slots. Reads degrade to the slot default
/// when the underlying data is missing or unreadable, writes log failures and
/// move on: consumers never see a persistence error.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StateStore: Send + Sync {
    async fn sessions(&self) -> Vec<Session>;

    async fn put_sessions(&self, sessions: Vec<Session>);

    async fn current_session(&self) -> Option<DateTime<Utc>>;

    async fn put_current_session(&self, start: Option<DateTime<Utc>>);

    async fn intentions(&self) -> Vec<Intention>;

    async fn put_intentions(&self, intentions: Vec<Intention>);

    async fn settings(&self) -> UserSettings;

    async fn put_settings(&self, settings: UserSettings);

    /// Change notifications for all slots, fed by this store's own writes
    /// and, when external watching is enabled, by other processes' writes.
    fn subscribe(&self) -> broadcast::Receiver<Slot>;
}

#[async_trait]
impl<T> StateStore for T
where
    T: Deref + Send + Sync,
    T::Target: StateStore,
{
    async fn sessions(&self) -> Vec<Session> {
        self.deref().sessions().await
    }

    async fn put_sessions(&self, sessions: Vec<Session>) {
        self.deref().put_sessions(sessions).await
    }

    async fn current_session(&self) -> Option<DateTime<Utc>> {
        self.deref().current_session().await
    }

    async fn put_current_session(&self, start: Option<DateTime<Utc>>) {
        self.deref().put_current_session(start).await
    }

    async fn intentions(&self) -> Vec<Intention> {
        self.deref().intentions().await
    }

    async fn put_intentions(&self, intentions: Vec<Intention>) {
        self.deref().put_intentions(intentions).await
    }

    async fn settings(&self) -> UserSettings {
        self.deref().settings().await
    }

    async fn put_settings(&self, settings: UserSettings) {
        self.deref().put_settings(settings).await
    }

    fn subscribe(&self) -> broadcast::Receiver<Slot> {
        self.deref().subscribe()
    }
}

/// The main realization of [StateStore]: one JSON file per slot inside a
/// state directory.
pub struct JsonStore {
    state_dir: PathBuf,
    changes: broadcast::Sender<Slot>,
    _watcher: Option<notify::RecommendedWatcher>,
}

impl JsonStore {
    pub fn new(state_dir: PathBuf) -> Result<Self, std::io::Error> {
        std::fs::create_dir_all(&state_dir)?;
        let (changes, _) = broadcast::channel(64);

        Ok(Self {
            state_dir,
            changes,
            _watcher: None,
        })
    }

    /// Enables best-effort observation of writes made by other processes.
    /// A watcher that can't be set up downgrades to a log line: the store
    /// keeps working, consumers just won't hear about external updates.
    pub fn with_external_watch(mut self) -> Self {
        match watch::watch_state_dir(&self.state_dir, self.changes.clone()) {
            Ok(watcher) => self._watcher = Some(watcher),
            Err(e) => warn!("Couldn't watch the state directory for external changes: {e:?}"),
        }
        self
    }

    fn slot_path(&self, slot: Slot) -> PathBuf {
        self.state_dir.join(slot.file_name())
    }

    async fn read_slot<T: DeserializeOwned>(&self, slot: Slot) -> Result<Option<T>> {
        let path = self.slot_path(slot);
        let mut file = match File::open(&path).await {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        file.lock_shared()?;
        let mut raw = String::new();
        let result = file.read_to_string(&mut raw).await;
        file.unlock_async().await?;
        result?;

        Ok(Some(serde_json::from_str(&raw)?))
    }

    async fn write_slot<T: Serialize + Sync>(&self, slot: Slot, value: &T) -> Result<()> {
        let path = self.slot_path(slot);
        let mut file = File::options()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .await?;

        // Semi-safe acquire-release for a file
        file.lock_exclusive()?;
        let result = Self::overwrite(&mut file, value).await;
        file.unlock_async().await?;
        result?;

        let _ = self.changes.send(slot);
        Ok(())
    }

    async fn overwrite<T: Serialize>(file: &mut File, value: &T) -> Result<()> {
        let buffer = serde_json::to_vec(value)?;
        file.set_len(0).await?;
        file.write_all(&buffer).await?;
        file.flush().await?;
        Ok(())
    }

    async fn get_or_default<T: DeserializeOwned + Default>(&self, slot: Slot) -> T {
        match self.read_slot(slot).await {
            Ok(Some(value)) => value,
            Ok(None) => T::default(),
            Err(e) => {
                // Might happen after shutdowns cutting a write short. The
                // next write repairs the file.
                warn!("Failed to read slot {slot:?}, using the default: {e:?}");
                T::default()
            }
        }
    }

    async fn put<T: Serialize + Sync>(&self, slot: Slot, value: &T) {
        if let Err(e) = self.write_slot(slot, value).await {
            warn!("Failed to write slot {slot:?}: {e:?}");
        }
    }
}

#[async_trait]
impl StateStore for JsonStore {
    async fn sessions(&self) -> Vec<Session> {
        self.get_or_default(Slot::Sessions).await
    }

    async fn put_sessions(&self, sessions: Vec<Session>) {
        self.put(Slot::Sessions, &sessions).await
    }

    async fn current_session(&self) -> Option<DateTime<Utc>> {
        self.get_or_default::<OpenSession>(Slot::CurrentSession).await.0
    }

    async fn put_current_session(&self, start: Option<DateTime<Utc>>) {
        self.put(Slot::CurrentSession, &OpenSession(start)).await
    }

    async fn intentions(&self) -> Vec<Intention> {
        self.get_or_default(Slot::Intentions).await
    }

    async fn put_intentions(&self, intentions: Vec<Intention>) {
        self.put(Slot::Intentions, &intentions).await
    }

    async fn settings(&self) -> UserSettings {
        self.get_or_default(Slot::Settings).await
    }

    async fn put_settings(&self, settings: UserSettings) {
        self.put(Slot::Settings, &settings).await
    }

    fn subscribe(&self) -> broadcast::Receiver<Slot> {
        self.changes.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use chrono::{Duration, TimeZone, Utc};
    use tempfile::tempdir;

    use crate::store::{
        entities::{Session, UserSettings},
        json_store::{JsonStore, StateStore},
        Slot,
    };

    fn test_session(offset_minutes: i64) -> Session {
        let start = Utc.with_ymd_and_hms(2018, 7, 4, 10, 0, 0).unwrap()
            + Duration::minutes(offset_minutes);
        Session::closed(start, start + Duration::minutes(5))
    }

    #[tokio::test]
    async fn test_slots_roundtrip() -> Result<()> {
        let dir = tempdir()?;
        let store = JsonStore::new(dir.path().join("state"))?;

        let sessions = vec![test_session(10), test_session(0)];
        store.put_sessions(sessions.clone()).await;
        assert_eq!(store.sessions().await, sessions);

        let start = Utc.with_ymd_and_hms(2018, 7, 4, 12, 0, 0).unwrap();
        store.put_current_session(Some(start)).await;
        assert_eq!(store.current_session().await, Some(start));
        store.put_current_session(None).await;
        assert_eq!(store.current_session().await, None);

        let settings = UserSettings {
            birth_year: 1988,
            life_expectancy: 85,
        };
        store.put_settings(settings).await;
        assert_eq!(store.settings().await, settings);

        Ok(())
    }

    #[tokio::test]
    async fn test_missing_slots_fall_back_to_defaults() -> Result<()> {
        let dir = tempdir()?;
        let store = JsonStore::new(dir.path().join("state"))?;

        assert_eq!(store.sessions().await, vec![]);
        assert_eq!(store.current_session().await, None);
        assert_eq!(store.intentions().await, vec![]);
        assert_eq!(store.settings().await, UserSettings::default());
        Ok(())
    }

    #[tokio::test]
    async fn test_corrupt_slot_falls_back_to_default() -> Result<()> {
        let dir = tempdir()?;
        let state_dir = dir.path().join("state");
        let store = JsonStore::new(state_dir.clone())?;

        std::fs::write(state_dir.join(Slot::Sessions.file_name()), "{not json")?;
        assert_eq!(store.sessions().await, vec![]);

        // A write repairs the slot.
        store.put_sessions(vec![test_session(0)]).await;
        assert_eq!(store.sessions().await.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_writes_notify_subscribers() -> Result<()> {
        let dir = tempdir()?;
        let store = JsonStore::new(dir.path().join("state"))?;

        let mut changes = store.subscribe();
        store.put_sessions(vec![]).await;
        store.put_current_session(None).await;

        assert_eq!(changes.recv().await?, Slot::Sessions);
        assert_eq!(changes.recv().await?, Slot::CurrentSession);
        Ok(())
    }
}
