use std::sync::Arc;
use std::time::Duration;

use timeops_remote::domain::AnalyticsReport;
use timeops_remote::RemoteClient;
use tokio::sync::{mpsc, watch};

use crate::connectivity::{spawn_event_listener, ConnectivityHandle};
use crate::errors::EngineError;
use crate::grouping::{group_entries, GroupedEntries};
use crate::models::{Entry, NewEntry, RunningEntry, Tag};
use crate::running::RunningManager;
use crate::settings::Settings;
use crate::store::Store;
use crate::sync::{DynRemoteApi, ExportDocument, Reconciler};
use crate::time_utils::{now_secs, utc_offset_seconds, week_start};

/// Mutations wait this long before pushing, so a burst of edits collapses
/// into one push.
const SYNC_DELAY: Duration = Duration::from_millis(300);

/// Top-level handle tying the store, reconciler and running manager
/// together. Cheap to clone; all clones share the same state.
#[derive(Clone)]
pub struct Engine {
    store: Store,
    reconciler: Arc<Reconciler>,
    running: RunningManager,
    online: watch::Receiver<bool>,
}

impl Engine {
    /// Wires the full stack: opens the store, starts the event listener
    /// and the background sync loop.
    pub async fn start(db_url: &str, settings: &Settings) -> Result<Self, EngineError> {
        let store = Store::new(db_url).await?;
        store.seed_defaults().await?;

        let config = settings.remote_config()?;
        let client = RemoteClient::new(config);
        let ConnectivityHandle {
            online,
            data_updates,
        } = spawn_event_listener(client.clone());

        let engine = Self::with_remote(store, Arc::new(client), online);
        engine.clone().spawn_sync_loop(data_updates);
        Ok(engine)
    }

    /// Assembles an engine over an existing store and remote. No background
    /// tasks are started.
    pub fn with_remote(store: Store, remote: DynRemoteApi, online: watch::Receiver<bool>) -> Self {
        Self {
            running: RunningManager::new(store.clone()),
            reconciler: Arc::new(Reconciler::new(store.clone(), remote)),
            store,
            online,
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn running(&self) -> &RunningManager {
        &self.running
    }

    pub fn is_online(&self) -> bool {
        *self.online.borrow()
    }

    pub fn online_watch(&self) -> watch::Receiver<bool> {
        self.online.clone()
    }

    /// Creates or fully replaces an entry. Either way the row becomes
    /// pending and a push is scheduled.
    pub async fn save_entry(
        &self,
        id: Option<i64>,
        name: String,
        tag_id: i64,
        start_time_utc: i64,
        end_time_utc: i64,
    ) -> Result<i64, EngineError> {
        let id = match id {
            Some(id) => {
                let remote_id = self
                    .store
                    .get_entry(id)
                    .await?
                    .and_then(|existing| existing.remote_id);
                let entry = Entry {
                    id,
                    remote_id,
                    name,
                    tag_id,
                    start_time_utc,
                    end_time_utc,
                    synced: false,
                    msg: String::new(),
                };
                self.store.update_entry(&entry).await?;
                id
            }
            None => {
                let entry = NewEntry {
                    name,
                    tag_id,
                    start_time_utc,
                    end_time_utc,
                    synced: false,
                    msg: String::new(),
                };
                self.store.add_entry(&entry).await?
            }
        };

        self.schedule_push();
        Ok(id)
    }

    pub async fn list_entries(&self) -> Result<Vec<Entry>, EngineError> {
        self.store.list_entries().await
    }

    /// Entries bucketed by week and day, anchored at the most recent local
    /// Monday.
    pub async fn grouped_entries(&self) -> Result<GroupedEntries, EngineError> {
        let entries = self.store.list_entries().await?;
        let anchor = week_start(now_secs(), utc_offset_seconds());
        Ok(group_entries(&entries, anchor))
    }

    pub async fn list_tags(&self) -> Result<Vec<Tag>, EngineError> {
        self.store.list_tags().await
    }

    pub async fn editable_tags(&self) -> Result<Vec<Tag>, EngineError> {
        self.store.editable_tags().await
    }

    /// Saves a tag straight to the remote and pulls the authoritative set
    /// back. Tags are never queued offline.
    pub async fn save_tag(&self, tag: &Tag) -> Result<(), EngineError> {
        self.reconciler.save_tag(tag).await
    }

    pub async fn start_timer(&self) -> Result<RunningEntry, EngineError> {
        self.running.start().await
    }

    /// Stops the running entry. The closed entry is pending, so a push is
    /// scheduled.
    pub async fn stop_timer(&self) -> Result<Option<i64>, EngineError> {
        let stopped = self.running.stop().await?;
        if stopped.is_some() {
            self.schedule_push();
        }
        Ok(stopped)
    }

    pub async fn edit_running(
        &self,
        name: String,
        tag_id: i64,
        start_time_utc: i64,
    ) -> Result<(), EngineError> {
        self.running.edit(name, tag_id, start_time_utc).await
    }

    pub async fn pull(&self) -> Result<(), EngineError> {
        self.reconciler.pull().await
    }

    pub async fn push(&self) -> Result<bool, EngineError> {
        self.reconciler.push().await
    }

    pub async fn wipe_entries(&self) -> Result<(), EngineError> {
        self.reconciler.wipe_entries().await
    }

    pub async fn export(&self) -> Result<ExportDocument, EngineError> {
        self.reconciler.export().await
    }

    pub async fn import(&self, file_name: &str, contents: Vec<u8>) -> Result<(), EngineError> {
        self.reconciler
            .import(file_name, contents, utc_offset_seconds())
            .await
    }

    pub async fn fetch_analytics(&self) -> Result<AnalyticsReport, EngineError> {
        self.reconciler.fetch_analytics(utc_offset_seconds()).await
    }

    /// Pushes after a short delay if we are online by then. Errors are
    /// logged and dropped, the next trigger retries.
    fn schedule_push(&self) {
        let engine = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(SYNC_DELAY).await;
            if !engine.is_online() {
                return;
            }
            if let Err(err) = engine.reconciler.push().await {
                tracing::warn!(%err, "scheduled push failed");
            }
        });
    }

    /// Reacts to connectivity changes and server-side data updates until
    /// the update channel closes.
    pub fn spawn_sync_loop(self, mut data_updates: mpsc::Receiver<()>) {
        let mut online = self.online.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    changed = online.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        if !*online.borrow_and_update() {
                            continue;
                        }
                        tracing::info!("back online, reconciling");
                        if let Err(err) = self.reconciler.pull().await {
                            tracing::warn!(%err, "pull after reconnect failed");
                            continue;
                        }
                        if let Err(err) = self.reconciler.push().await {
                            tracing::warn!(%err, "push after reconnect failed");
                        }
                    }
                    update = data_updates.recv() => {
                        if update.is_none() {
                            break;
                        }
                        if let Err(err) = self.reconciler.pull().await {
                            tracing::warn!(%err, "pull after data update failed");
                        }
                    }
                }
            }
        });
    }
}
