use std::time::Duration;

use tokio::sync::watch;

use crate::errors::EngineError;
use crate::models::{NewEntry, RunningEntry};
use crate::store::Store;
use crate::time_utils::{format_elapsed, now_secs};

/// Name given to a freshly started running entry, editable afterwards.
pub const DEFAULT_RUNNING_NAME: &str = "Running Entry";

/// Owns the single in-progress interval. All state lives in the store's
/// running slot, the manager only enforces the start/stop lifecycle.
#[derive(Clone)]
pub struct RunningManager {
    store: Store,
}

impl RunningManager {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub async fn current(&self) -> Result<Option<RunningEntry>, EngineError> {
        self.store.get_running().await
    }

    /// Starts a running entry unless one already exists, in which case the
    /// existing one is returned untouched. Requires at least one tag.
    pub async fn start(&self) -> Result<RunningEntry, EngineError> {
        if let Some(existing) = self.store.get_running().await? {
            return Ok(existing);
        }

        let tags = self.store.list_tags().await?;
        let tag = tags.first().ok_or(EngineError::NoTags)?;

        // backdated a second so an immediate stop still ends after it starts
        let running = RunningEntry {
            name: DEFAULT_RUNNING_NAME.to_string(),
            tag_id: tag.id,
            start_time_utc: now_secs() - 1,
            synced: false,
            msg: String::new(),
        };
        self.store.set_running(&running).await?;
        Ok(running)
    }

    /// Converts the running entry into a finished entry ending now and
    /// clears the slot. Returns the new entry's id, or `None` when nothing
    /// was running.
    pub async fn stop(&self) -> Result<Option<i64>, EngineError> {
        let Some(running) = self.store.get_running().await? else {
            return Ok(None);
        };

        let entry = NewEntry {
            name: running.name,
            tag_id: running.tag_id,
            start_time_utc: running.start_time_utc,
            end_time_utc: now_secs(),
            synced: false,
            msg: String::new(),
        };
        let id = self.store.add_entry(&entry).await?;
        self.store.clear_running().await?;
        Ok(Some(id))
    }

    /// Replaces the running entry's name, tag and start time wholesale.
    /// Editing marks it pending again.
    pub async fn edit(
        &self,
        name: String,
        tag_id: i64,
        start_time_utc: i64,
    ) -> Result<(), EngineError> {
        let running = RunningEntry {
            name,
            tag_id,
            start_time_utc,
            synced: false,
            msg: String::new(),
        };
        self.store.set_running(&running).await
    }

    /// Spawns a once-per-second ticker publishing the running entry's
    /// elapsed time as zero-padded `HH:MM:SS`, or `None` while idle. The
    /// ticker only reads.
    pub fn spawn_elapsed_ticker(&self) -> watch::Receiver<Option<String>> {
        let (tx, rx) = watch::channel(None);
        let store = self.store.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));
            loop {
                interval.tick().await;
                let label = match store.get_running().await {
                    Ok(Some(running)) => {
                        Some(format_elapsed(now_secs() - running.start_time_utc))
                    }
                    Ok(None) => None,
                    Err(err) => {
                        tracing::warn!(%err, "failed to read running entry");
                        continue;
                    }
                };
                if tx.send(label).is_err() {
                    break;
                }
            }
        });
        rx
    }
}
