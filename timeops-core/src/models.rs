use serde::{Deserialize, Serialize};
use timeops_remote::domain::{EntryPayload, TagColor};

/// Protected default tag. Always present after seeding, never offered in
/// user-facing edit lists.
pub const DEFAULT_TAG_NAME: &str = "No Project";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub id: i64,
    pub name: String,
    pub color: TagColor,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub id: i64,
    pub remote_id: Option<i64>,
    pub name: String,
    pub tag_id: i64,
    pub start_time_utc: i64,
    pub end_time_utc: i64,
    pub synced: bool,
    /// Last validation error from the remote, empty if none.
    pub msg: String,
}

impl Entry {
    pub fn duration_secs(&self) -> i64 {
        self.end_time_utc - self.start_time_utc
    }

    pub fn payload(&self) -> EntryPayload {
        EntryPayload {
            name: self.name.clone(),
            start_time_utc: self.start_time_utc,
            end_time_utc: self.end_time_utc,
            tag_id: self.tag_id,
        }
    }
}

pub struct NewEntry {
    pub name: String,
    pub tag_id: i64,
    pub start_time_utc: i64,
    pub end_time_utc: i64,
    pub synced: bool,
    pub msg: String,
}

/// The one in-progress interval. Has no end time; stopping it converts it
/// into an [`Entry`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunningEntry {
    pub name: String,
    pub tag_id: i64,
    pub start_time_utc: i64,
    pub synced: bool,
    pub msg: String,
}
