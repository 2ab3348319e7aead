use std::sync::Arc;

use timeops_remote::domain::{AnalyticsReport, TagPayload, UNASSIGNED_TAG_ID};
use timeops_remote::{RemoteApi, RemoteError};

use crate::errors::EngineError;
use crate::models::Tag;
use crate::store::Store;

pub type DynRemoteApi = Arc<dyn RemoteApi + Send + Sync>;

/// Full database export as served by the remote, with a dated file name
/// ready for saving to disk.
pub struct ExportDocument {
    pub file_name: String,
    pub contents: String,
}

/// Moves data between the local store and the remote. All operations are
/// serialized through one guard so a pull never interleaves with a push.
pub struct Reconciler {
    store: Store,
    remote: DynRemoteApi,
    guard: tokio::sync::Mutex<()>,
}

impl Reconciler {
    pub fn new(store: Store, remote: DynRemoteApi) -> Self {
        Self {
            store,
            remote,
            guard: tokio::sync::Mutex::new(()),
        }
    }

    /// Replaces local synced state with the remote snapshot. Pending local
    /// entries survive untouched.
    pub async fn pull(&self) -> Result<(), EngineError> {
        let _held = self.guard.lock().await;
        self.pull_inner().await
    }

    /// Uploads all pending entries, one request each. Returns `true` when
    /// every pending entry was rejected by validation and nothing reached
    /// the remote.
    pub async fn push(&self) -> Result<bool, EngineError> {
        let _held = self.guard.lock().await;
        self.push_inner().await
    }

    /// Creates or updates the tag remotely, then pulls so the local store
    /// picks up the authoritative ids.
    pub async fn save_tag(&self, tag: &Tag) -> Result<(), EngineError> {
        let _held = self.guard.lock().await;

        let payload = TagPayload {
            name: tag.name.clone(),
            color: tag.color,
        };
        if tag.id == UNASSIGNED_TAG_ID {
            self.remote.create_tag(&payload).await?;
        } else {
            self.remote.update_tag(tag.id, &payload).await?;
        }

        self.pull_inner().await
    }

    /// Deletes every entry locally and remotely. Tags are kept.
    pub async fn wipe_entries(&self) -> Result<(), EngineError> {
        let _held = self.guard.lock().await;

        self.store.clear_entries().await?;
        self.remote.delete_all_entries().await?;
        Ok(())
    }

    pub async fn export(&self) -> Result<ExportDocument, EngineError> {
        let contents = self.remote.export_all().await?;
        let file_name = format!("timeops_export_{}.json", chrono::Utc::now().format("%Y-%m-%d"));
        Ok(ExportDocument {
            file_name,
            contents,
        })
    }

    /// Uploads a database file for server-side import. The refresh arrives
    /// through the event stream once the server has applied it.
    pub async fn import(
        &self,
        file_name: &str,
        contents: Vec<u8>,
        utc_offset_seconds: i64,
    ) -> Result<(), EngineError> {
        self.remote
            .import_file(file_name, contents, utc_offset_seconds)
            .await?;
        Ok(())
    }

    pub async fn fetch_analytics(
        &self,
        utc_offset_seconds: i64,
    ) -> Result<AnalyticsReport, EngineError> {
        let report = self.remote.fetch_analytics(utc_offset_seconds).await?;
        Ok(report)
    }

    async fn pull_inner(&self) -> Result<(), EngineError> {
        let entries = self.remote.fetch_entries().await?;
        let tags = self.remote.fetch_tags().await?;
        self.store.apply_remote_snapshot(&entries, &tags).await?;
        Ok(())
    }

    async fn push_inner(&self) -> Result<bool, EngineError> {
        let pending = self.store.pending_entries().await?;
        if pending.is_empty() {
            return Ok(false);
        }

        let mut any_synced = false;
        let mut unsyncable = false;
        for entry in &pending {
            let payload = entry.payload();
            let result = match entry.remote_id {
                Some(remote_id) => self.remote.update_entry(remote_id, &payload).await,
                None => self.remote.create_entry(&payload).await,
            };

            match result {
                Ok(()) => {
                    // the remote copy is authoritative now, the next pull
                    // brings it back with its remote id
                    self.store.delete_entry(entry.id).await?;
                    any_synced = true;
                }
                Err(RemoteError::Validation(msg)) => {
                    tracing::warn!(entry_id = entry.id, %msg, "entry rejected by remote");
                    self.store.set_entry_error(entry.id, &msg).await?;
                    unsyncable = true;
                }
                Err(err) => return Err(err.into()),
            }
        }

        Ok(unsyncable && !any_synced)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use timeops_remote::domain::{EntryPayload, RemoteEntry, RemoteTag, TagColor};
    use timeops_remote::RemoteError;

    use super::*;
    use crate::models::NewEntry;

    /// Scripted remote: serves canned snapshots and records every write,
    /// optionally rejecting entries by name.
    #[derive(Default)]
    struct ScriptedRemote {
        entries: Vec<RemoteEntry>,
        tags: Vec<RemoteTag>,
        reject_names: Vec<String>,
        created: Mutex<Vec<EntryPayload>>,
        updated: Mutex<Vec<(i64, EntryPayload)>>,
        created_tags: Mutex<Vec<TagPayload>>,
        updated_tags: Mutex<Vec<(i64, TagPayload)>>,
        wiped: Mutex<bool>,
    }

    #[async_trait]
    impl RemoteApi for ScriptedRemote {
        async fn fetch_entries(&self) -> Result<Vec<RemoteEntry>, RemoteError> {
            Ok(self.entries.clone())
        }

        async fn fetch_tags(&self) -> Result<Vec<RemoteTag>, RemoteError> {
            Ok(self.tags.clone())
        }

        async fn create_entry(&self, payload: &EntryPayload) -> Result<(), RemoteError> {
            if self.reject_names.contains(&payload.name) {
                return Err(RemoteError::Validation("name required".into()));
            }
            self.created.lock().unwrap().push(payload.clone());
            Ok(())
        }

        async fn update_entry(
            &self,
            remote_id: i64,
            payload: &EntryPayload,
        ) -> Result<(), RemoteError> {
            if self.reject_names.contains(&payload.name) {
                return Err(RemoteError::Validation("name required".into()));
            }
            self.updated.lock().unwrap().push((remote_id, payload.clone()));
            Ok(())
        }

        async fn create_tag(&self, payload: &TagPayload) -> Result<(), RemoteError> {
            self.created_tags.lock().unwrap().push(payload.clone());
            Ok(())
        }

        async fn update_tag(&self, id: i64, payload: &TagPayload) -> Result<(), RemoteError> {
            self.updated_tags.lock().unwrap().push((id, payload.clone()));
            Ok(())
        }

        async fn delete_all_entries(&self) -> Result<(), RemoteError> {
            *self.wiped.lock().unwrap() = true;
            Ok(())
        }

        async fn export_all(&self) -> Result<String, RemoteError> {
            Ok("{\"entries\":[]}".into())
        }

        async fn import_file(
            &self,
            _file_name: &str,
            _contents: Vec<u8>,
            _utc_offset_seconds: i64,
        ) -> Result<(), RemoteError> {
            Ok(())
        }

        async fn fetch_analytics(
            &self,
            _utc_offset_seconds: i64,
        ) -> Result<AnalyticsReport, RemoteError> {
            Ok(AnalyticsReport {
                day: vec![],
                week: vec![],
                month: vec![],
                tags: vec![],
            })
        }
    }

    async fn store_with_tag() -> Store {
        let store = Store::in_memory().await.unwrap();
        store.seed_defaults().await.unwrap();
        store
    }

    fn pending(name: &str, start: i64) -> NewEntry {
        NewEntry {
            name: name.into(),
            tag_id: 1,
            start_time_utc: start,
            end_time_utc: start + 600,
            synced: false,
            msg: String::new(),
        }
    }

    #[tokio::test]
    async fn push_uploads_only_pending_entries() {
        let store = store_with_tag().await;
        store.add_entry(&pending("draft", 100)).await.unwrap();
        let mut synced = pending("already up", 200);
        synced.synced = true;
        store.add_entry(&synced).await.unwrap();

        let remote = Arc::new(ScriptedRemote::default());
        let reconciler = Reconciler::new(store.clone(), remote.clone());

        let all_rejected = reconciler.push().await.unwrap();

        assert!(!all_rejected);
        let created = remote.created.lock().unwrap();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].name, "draft");
        // the uploaded row is gone, the synced one stays
        let remaining = store.list_entries().await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].name, "already up");
    }

    #[tokio::test]
    async fn push_with_nothing_pending_reports_nothing_sent() {
        let store = store_with_tag().await;
        let remote = Arc::new(ScriptedRemote::default());
        let reconciler = Reconciler::new(store, remote);

        assert!(!reconciler.push().await.unwrap());
    }

    #[tokio::test]
    async fn rejected_entry_keeps_its_row_and_message() {
        let store = store_with_tag().await;
        store.add_entry(&pending("good one", 100)).await.unwrap();
        store.add_entry(&pending("", 200)).await.unwrap();
        store.add_entry(&pending("another good", 300)).await.unwrap();

        let remote = Arc::new(ScriptedRemote {
            reject_names: vec![String::new()],
            ..Default::default()
        });
        let reconciler = Reconciler::new(store.clone(), remote.clone());

        let all_rejected = reconciler.push().await.unwrap();

        assert!(!all_rejected);
        assert_eq!(remote.created.lock().unwrap().len(), 2);
        let remaining = store.list_entries().await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert!(!remaining[0].synced);
        assert_eq!(remaining[0].msg, "name required");
    }

    #[tokio::test]
    async fn push_reports_when_every_entry_is_rejected() {
        let store = store_with_tag().await;
        store.add_entry(&pending("", 100)).await.unwrap();

        let remote = Arc::new(ScriptedRemote {
            reject_names: vec![String::new()],
            ..Default::default()
        });
        let reconciler = Reconciler::new(store.clone(), remote);

        assert!(reconciler.push().await.unwrap());
        let remaining = store.list_entries().await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert!(!remaining[0].synced);
        assert_eq!(remaining[0].msg, "name required");
    }

    #[tokio::test]
    async fn push_updates_entries_that_already_exist_remotely() {
        let store = store_with_tag().await;
        let id = store.add_entry(&pending("edited later", 100)).await.unwrap();
        let mut row = store.get_entry(id).await.unwrap().unwrap();
        row.remote_id = Some(42);
        store.update_entry(&row).await.unwrap();

        let remote = Arc::new(ScriptedRemote::default());
        let reconciler = Reconciler::new(store, remote.clone());

        reconciler.push().await.unwrap();

        let updated = remote.updated.lock().unwrap();
        assert_eq!(updated.len(), 1);
        assert_eq!(updated[0].0, 42);
        assert!(remote.created.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn pull_replaces_synced_state_with_the_snapshot() {
        let store = store_with_tag().await;
        store.add_entry(&pending("local draft", 100)).await.unwrap();

        let remote = Arc::new(ScriptedRemote {
            entries: vec![RemoteEntry {
                id: 7,
                name: "from server".into(),
                tag_id: 1,
                start_time_utc: 500,
                end_time_utc: 1100,
            }],
            tags: vec![RemoteTag {
                id: 1,
                name: "No Project".into(),
                color: TagColor::Slate,
            }],
            ..Default::default()
        });
        let reconciler = Reconciler::new(store.clone(), remote);

        reconciler.pull().await.unwrap();

        let entries = store.list_entries().await.unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().any(|e| e.remote_id == Some(7) && e.synced));
        assert!(entries.iter().any(|e| e.name == "local draft" && !e.synced));
    }

    #[tokio::test]
    async fn saving_a_new_tag_creates_it_and_pulls() {
        let store = store_with_tag().await;
        let remote = Arc::new(ScriptedRemote {
            tags: vec![
                RemoteTag {
                    id: 1,
                    name: "No Project".into(),
                    color: TagColor::Slate,
                },
                RemoteTag {
                    id: 2,
                    name: "Research".into(),
                    color: TagColor::Cyan,
                },
            ],
            ..Default::default()
        });
        let reconciler = Reconciler::new(store.clone(), remote.clone());

        let tag = Tag {
            id: UNASSIGNED_TAG_ID,
            name: "Research".into(),
            color: TagColor::Cyan,
        };
        reconciler.save_tag(&tag).await.unwrap();

        assert_eq!(remote.created_tags.lock().unwrap().len(), 1);
        // the pull brought back the server-assigned id
        let tags = store.list_tags().await.unwrap();
        assert!(tags.iter().any(|t| t.id == 2 && t.name == "Research"));
    }

    #[tokio::test]
    async fn saving_an_existing_tag_updates_it() {
        let store = store_with_tag().await;
        let remote = Arc::new(ScriptedRemote {
            tags: vec![RemoteTag {
                id: 1,
                name: "No Project".into(),
                color: TagColor::Slate,
            }],
            ..Default::default()
        });
        let reconciler = Reconciler::new(store, remote.clone());

        let tag = Tag {
            id: 5,
            name: "Renamed".into(),
            color: TagColor::Red,
        };
        reconciler.save_tag(&tag).await.unwrap();

        let updated = remote.updated_tags.lock().unwrap();
        assert_eq!(updated.len(), 1);
        assert_eq!(updated[0].0, 5);
        assert_eq!(updated[0].1.name, "Renamed");
    }

    #[tokio::test]
    async fn wipe_clears_local_entries_before_the_remote() {
        let store = store_with_tag().await;
        store.add_entry(&pending("gone soon", 100)).await.unwrap();

        let remote = Arc::new(ScriptedRemote::default());
        let reconciler = Reconciler::new(store.clone(), remote.clone());

        reconciler.wipe_entries().await.unwrap();

        assert!(store.list_entries().await.unwrap().is_empty());
        assert!(*remote.wiped.lock().unwrap());
        // tags survive a wipe
        assert!(!store.list_tags().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn export_names_the_file_after_the_current_date() {
        let store = store_with_tag().await;
        let remote = Arc::new(ScriptedRemote::default());
        let reconciler = Reconciler::new(store, remote);

        let doc = reconciler.export().await.unwrap();

        assert!(doc.file_name.starts_with("timeops_export_"));
        assert!(doc.file_name.ends_with(".json"));
        assert_eq!(doc.contents, "{\"entries\":[]}");
    }
}
