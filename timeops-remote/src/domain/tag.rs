use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Sentinel id for a tag that has not been created remotely yet.
pub const UNASSIGNED_TAG_ID: i64 = -1;

/// A tag row as the server returns it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteTag {
    pub id: i64,
    pub name: String,
    pub color: TagColor,
}

/// Body for tag create (POST) and update (PUT) requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TagPayload {
    pub name: String,
    pub color: TagColor,
}

#[derive(Debug, Deserialize)]
pub struct TagsResponse {
    pub tags: Vec<RemoteTag>,
}

/// The fixed tag palette. Serialized lowercase on the wire and in the local
/// store.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum TagColor {
    #[default]
    Slate,
    Red,
    Amber,
    Lime,
    Emerald,
    Cyan,
    Blue,
    Violet,
    Fuchsia,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_round_trips_through_strings() {
        assert_eq!(TagColor::Emerald.to_string(), "emerald");
        assert_eq!("emerald".parse::<TagColor>().unwrap(), TagColor::Emerald);
        assert_eq!(
            serde_json::to_string(&TagColor::Fuchsia).unwrap(),
            "\"fuchsia\""
        );
    }

    #[test]
    fn tag_payload_uses_wire_field_names() {
        let payload = TagPayload {
            name: "Work".to_string(),
            color: TagColor::Blue,
        };
        assert_eq!(
            serde_json::to_string(&payload).unwrap(),
            r#"{"name":"Work","color":"blue"}"#
        );
    }
}
