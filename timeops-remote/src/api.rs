use async_trait::async_trait;

use crate::domain::{AnalyticsReport, EntryPayload, RemoteEntry, RemoteTag, TagPayload};
use crate::{RemoteClient, RemoteError};

/// The remote operations the sync engine depends on. Implemented by
/// [`RemoteClient`]; tests substitute their own implementation.
#[async_trait]
pub trait RemoteApi {
    async fn fetch_entries(&self) -> Result<Vec<RemoteEntry>, RemoteError>;
    async fn fetch_tags(&self) -> Result<Vec<RemoteTag>, RemoteError>;
    async fn create_entry(&self, entry: &EntryPayload) -> Result<(), RemoteError>;
    async fn update_entry(&self, remote_id: i64, entry: &EntryPayload) -> Result<(), RemoteError>;
    async fn create_tag(&self, tag: &TagPayload) -> Result<(), RemoteError>;
    async fn update_tag(&self, id: i64, tag: &TagPayload) -> Result<(), RemoteError>;
    async fn delete_all_entries(&self) -> Result<(), RemoteError>;
    async fn export_all(&self) -> Result<String, RemoteError>;
    async fn import_file(
        &self,
        file_name: &str,
        contents: Vec<u8>,
        utc_offset_seconds: i64,
    ) -> Result<(), RemoteError>;
    async fn fetch_analytics(&self, utc_offset_seconds: i64)
        -> Result<AnalyticsReport, RemoteError>;
}

#[async_trait]
impl RemoteApi for RemoteClient {
    async fn fetch_entries(&self) -> Result<Vec<RemoteEntry>, RemoteError> {
        RemoteClient::fetch_entries(self).await
    }

    async fn fetch_tags(&self) -> Result<Vec<RemoteTag>, RemoteError> {
        RemoteClient::fetch_tags(self).await
    }

    async fn create_entry(&self, entry: &EntryPayload) -> Result<(), RemoteError> {
        RemoteClient::create_entry(self, entry).await
    }

    async fn update_entry(&self, remote_id: i64, entry: &EntryPayload) -> Result<(), RemoteError> {
        RemoteClient::update_entry(self, remote_id, entry).await
    }

    async fn create_tag(&self, tag: &TagPayload) -> Result<(), RemoteError> {
        RemoteClient::create_tag(self, tag).await
    }

    async fn update_tag(&self, id: i64, tag: &TagPayload) -> Result<(), RemoteError> {
        RemoteClient::update_tag(self, id, tag).await
    }

    async fn delete_all_entries(&self) -> Result<(), RemoteError> {
        RemoteClient::delete_all_entries(self).await
    }

    async fn export_all(&self) -> Result<String, RemoteError> {
        RemoteClient::export_all(self).await
    }

    async fn import_file(
        &self,
        file_name: &str,
        contents: Vec<u8>,
        utc_offset_seconds: i64,
    ) -> Result<(), RemoteError> {
        RemoteClient::import_file(self, file_name, contents, utc_offset_seconds).await
    }

    async fn fetch_analytics(
        &self,
        utc_offset_seconds: i64,
    ) -> Result<AnalyticsReport, RemoteError> {
        RemoteClient::fetch_analytics(self, utc_offset_seconds).await
    }
}
