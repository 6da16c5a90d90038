//! The fixed catalogue of operations the presentation layer may invoke.
//!
//! Actions serialize as `{"type": "<name>", "payload": {...}}`, so a
//! front end can dispatch them by name with the listed input shapes:
//!
//! ```rust
//! use image_annotations_core::action::Action;
//!
//! let action: Action = serde_json::from_str(
//!     r#"{"type":"addComment","payload":{"x":10,"y":20,"text":"hello"}}"#,
//! ).unwrap();
//! assert_eq!(action.name(), "addComment");
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    content = "payload",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum Action {
    AddImage {
        url: String,
        name: String,
    },
    SelectImage {
        image_id: String,
    },
    AddComment {
        x: f64,
        y: f64,
        text: String,
    },
    EditComment {
        comment_id: String,
        text: String,
    },
    DeleteComment {
        comment_id: String,
    },
    AddReply {
        comment_id: String,
        text: String,
    },
    EditReply {
        comment_id: String,
        reply_id: String,
        text: String,
    },
    DeleteReply {
        comment_id: String,
        reply_id: String,
    },
    SetActiveComment {
        comment_id: Option<String>,
    },
}

impl Action {
    /// Operation name as used in the serialized `type` tag.
    pub fn name(&self) -> &'static str {
        match self {
            Action::AddImage { .. } => "addImage",
            Action::SelectImage { .. } => "selectImage",
            Action::AddComment { .. } => "addComment",
            Action::EditComment { .. } => "editComment",
            Action::DeleteComment { .. } => "deleteComment",
            Action::AddReply { .. } => "addReply",
            Action::EditReply { .. } => "editReply",
            Action::DeleteReply { .. } => "deleteReply",
            Action::SetActiveComment { .. } => "setActiveComment",
        }
    }
}

/// Why an action left the state unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("no image is selected")]
    NoSelection,
    #[error("selected image not found: {0}")]
    ImageNotFound(String),
    #[error("comment not found in selected image: {0}")]
    CommentNotFound(String),
    #[error("reply not found: {0}")]
    ReplyNotFound(String),
}
