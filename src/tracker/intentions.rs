use anyhow::{bail, Result};
use uuid::Uuid;

use crate::{
    store::{entities::Intention, StateStore},
    utils::clock::Clock,
};

/// Declares a new intention at the front of the list. The description is
/// trimmed and must survive trimming, the commitment must be at least a
/// minute per day.
pub async fn add_intention<S: StateStore>(
    store: &S,
    clock: &dyn Clock,
    description: &str,
    time_committed: u32,
) -> Result<Intention> {
    let description = description.trim();
    if description.is_empty() {
        bail!("An intention needs a description");
    }
    if time_committed == 0 {
        bail!("Committed time must be at least a minute per day");
    }

    let intention = Intention {
        id: Uuid::new_v4(),
        description: description.to_string(),
        time_committed,
        created_at: clock.time(),
    };

    let mut intentions = store.intentions().await;
    intentions.insert(0, intention.clone());
    store.put_intentions(intentions).await;
    Ok(intention)
}

/// Removes an intention by id. Removing an unknown id is a no-op.
pub async fn remove_intention<S: StateStore>(store: &S, id: Uuid) -> bool {
    let mut intentions = store.intentions().await;
    let before = intentions.len();
    intentions.retain(|intention| intention.id != id);

    let removed = intentions.len() != before;
    if removed {
        store.put_intentions(intentions).await;
    }
    removed
}

pub async fn clear_intentions<S: StateStore>(store: &S) {
    store.put_intentions(Vec::new()).await;
}

/// Total minutes per day the user has promised across all intentions.
pub fn committed_minutes(intentions: &[Intention]) -> u32 {
    intentions.iter().map(|i| i.time_committed).sum()
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use tempfile::tempdir;
    use uuid::Uuid;

    use crate::{
        store::{JsonStore, StateStore},
        utils::clock::DefaultClock,
    };

    use super::{add_intention, clear_intentions, committed_minutes, remove_intention};

    #[tokio::test]
    async fn test_add_trims_and_prepends() -> Result<()> {
        let dir = tempdir()?;
        let store = JsonStore::new(dir.path().join("state"))?;

        add_intention(&store, &DefaultClock, "read more books", 30).await?;
        let second = add_intention(&store, &DefaultClock, "  touch grass  ", 15).await?;
        assert_eq!(second.description, "touch grass");

        let intentions = store.intentions().await;
        assert_eq!(intentions.len(), 2);
        assert_eq!(intentions[0], second);
        assert_eq!(committed_minutes(&intentions), 45);
        Ok(())
    }

    #[tokio::test]
    async fn test_add_rejects_blank_and_zero() -> Result<()> {
        let dir = tempdir()?;
        let store = JsonStore::new(dir.path().join("state"))?;

        assert!(add_intention(&store, &DefaultClock, "   ", 30).await.is_err());
        assert!(add_intention(&store, &DefaultClock, "no time", 0).await.is_err());
        assert_eq!(store.intentions().await, vec![]);
        Ok(())
    }

    #[tokio::test]
    async fn test_remove_by_id() -> Result<()> {
        let dir = tempdir()?;
        let store = JsonStore::new(dir.path().join("state"))?;

        let kept = add_intention(&store, &DefaultClock, "read", 30).await?;
        let dropped = add_intention(&store, &DefaultClock, "sleep", 60).await?;

        assert!(remove_intention(&store, dropped.id).await);
        assert!(!remove_intention(&store, Uuid::new_v4()).await);
        assert_eq!(store.intentions().await, vec![kept]);
        Ok(())
    }

    #[tokio::test]
    async fn test_clear() -> Result<()> {
        let dir = tempdir()?;
        let store = JsonStore::new(dir.path().join("state"))?;

        add_intention(&store, &DefaultClock, "read", 30).await?;
        clear_intentions(&store).await;
        assert_eq!(store.intentions().await, vec![]);
        Ok(())
    }
}
