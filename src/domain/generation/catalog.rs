//! Read-only catalog entries: avatars and generated-video history
//!
//! Both are owned server-side; this core only renders them.

use serde::Deserialize;

/// One entry from the avatar directory. Opaque to this core beyond display.
#[derive(Debug, Clone, Deserialize)]
pub struct Avatar {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub provider_avatar_id: Option<String>,
}

/// One previously generated video from the history listing
#[derive(Debug, Clone, Deserialize)]
pub struct VideoRecord {
    pub id: String,
    pub title: String,
    pub status: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub video_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn avatar_deserializes_with_optional_fields_absent() {
        let avatar: Avatar = serde_json::from_str(r#"{"id": "3", "name": "Anna"}"#).unwrap();
        assert_eq!(avatar.id, "3");
        assert_eq!(avatar.name, "Anna");
        assert!(avatar.thumbnail.is_none());
        assert!(avatar.provider_avatar_id.is_none());
    }

    #[test]
    fn video_record_deserializes_full_entry() {
        let record: VideoRecord = serde_json::from_str(
            r#"{
                "id": "42",
                "title": "Greeting",
                "status": "completed",
                "created_at": "2025-06-01T10:00:00Z",
                "video_url": "https://cdn.example.com/42.mp4"
            }"#,
        )
        .unwrap();
        assert_eq!(record.title, "Greeting");
        assert_eq!(record.status, "completed");
        assert_eq!(record.video_url.as_deref(), Some("https://cdn.example.com/42.mp4"));
    }
}
