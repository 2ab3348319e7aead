use serde::{Deserialize, Serialize};

/// An entry row as the server returns it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteEntry {
    pub id: i64,
    pub name: String,
    pub tag_id: i64,
    pub start_time_utc: i64,
    pub end_time_utc: i64,
}

/// Body for entry create (POST) and update (PUT) requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryPayload {
    pub name: String,
    pub start_time_utc: i64,
    pub end_time_utc: i64,
    pub tag_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct EntriesResponse {
    pub entries: Vec<RemoteEntry>,
}
