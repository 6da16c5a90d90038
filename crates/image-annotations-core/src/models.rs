//! Core data models for the annotation document.
//!
//! The document is a three-level tree: [`AppState`] holds [`Image`]s, each
//! image holds positional [`Comment`]s, and each comment holds a thread of
//! [`Reply`]s. Images and comments sit behind [`Arc`] so that a state
//! transition only copies the path it modifies; untouched siblings keep
//! their identity and changed nodes get a fresh one.
//!
//! Field names serialize in camelCase (`createdAt`, `selectedImageId`) and
//! timestamps as ISO-8601 UTC with millisecond precision, which is the
//! layout persisted under the storage key.

use std::sync::Arc;

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

/// A reply in a comment's thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reply {
    pub id: String,
    pub text: String,
    #[serde(with = "iso_millis")]
    pub created_at: DateTime<Utc>,
}

/// A comment pinned to a position on an image.
///
/// `x` and `y` are percentages (0–100) of the image's width and height,
/// so markers stay in place regardless of the rendered size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub text: String,
    #[serde(with = "iso_millis")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub replies: Vec<Reply>,
}

impl Comment {
    pub fn reply(&self, id: &str) -> Option<&Reply> {
        self.replies.iter().find(|r| r.id == id)
    }
}

/// An uploaded image and its comments, in insertion (marker) order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    pub id: String,
    /// Data URI or external reference.
    pub url: String,
    pub name: String,
    #[serde(default)]
    pub comments: Vec<Arc<Comment>>,
}

impl Image {
    pub fn comment(&self, id: &str) -> Option<&Arc<Comment>> {
        self.comments.iter().find(|c| c.id == id)
    }
}

/// The whole annotation document.
///
/// `selected_image_id` may point at an image that does not exist (no
/// existence check on selection); readers treat that as "nothing selected".
/// `active_comment_id` is only meaningful within the selected image.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppState {
    #[serde(default)]
    pub images: Vec<Arc<Image>>,
    pub selected_image_id: Option<String>,
    pub active_comment_id: Option<String>,
}

impl AppState {
    pub fn image(&self, id: &str) -> Option<&Arc<Image>> {
        self.images.iter().find(|img| img.id == id)
    }

    pub fn image_index(&self, id: &str) -> Option<usize> {
        self.images.iter().position(|img| img.id == id)
    }

    /// Total number of comments across all images.
    pub fn comment_count(&self) -> usize {
        self.images.iter().map(|img| img.comments.len()).sum()
    }

    /// Total number of replies across all comments.
    pub fn reply_count(&self) -> usize {
        self.images
            .iter()
            .flat_map(|img| img.comments.iter())
            .map(|c| c.replies.len())
            .sum()
    }
}

/// Current time truncated to the precision the document stores.
pub fn now_millis() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// `2024-01-01T09:30:00.000Z` style timestamps.
mod iso_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}
