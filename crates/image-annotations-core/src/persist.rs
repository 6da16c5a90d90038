//! Persistence adapter: the whole document in one storage slot.
//!
//! The document is written as a single JSON object with a `version` tag
//! followed by the [`AppState`] fields:
//!
//! ```json
//! {"version":1,"images":[...],"selectedImageId":null,"activeCommentId":null}
//! ```
//!
//! Neither [`load_state`] nor [`save_state`] fails outward. Storage and
//! parse errors are logged and degrade to "nothing stored" / "not saved";
//! the in-memory state is never affected.
//!
//! # Versions
//!
//! | Version | Handling |
//! |---------|----------|
//! | missing | legacy untagged document, same shape as version 1; upgraded on load |
//! | 1 | current |
//! | > 1 | written by a newer build; ignored (fresh state), logged |

use log::{error, info, trace, warn};
use serde::Serialize;
use thiserror::Error;

use crate::models::AppState;
use crate::storage::Storage;

/// Default slot name for the document.
pub const STORAGE_KEY: &str = "imageAnnotations";

/// Version written by [`encode`].
pub const SCHEMA_VERSION: u64 = 1;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed document: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("document version {0} is newer than supported version {}", SCHEMA_VERSION)]
    UnsupportedVersion(u64),
}

#[derive(Serialize)]
struct Envelope<'a> {
    version: u64,
    #[serde(flatten)]
    state: &'a AppState,
}

/// Serialize `state` with the current version tag.
pub fn encode(state: &AppState) -> serde_json::Result<String> {
    serde_json::to_string(&Envelope {
        version: SCHEMA_VERSION,
        state,
    })
}

/// Like [`encode`], indented for humans.
pub fn encode_pretty(state: &AppState) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&Envelope {
        version: SCHEMA_VERSION,
        state,
    })
}

/// Parse a stored document, upgrading older versions.
pub fn decode(raw: &str) -> Result<AppState, DecodeError> {
    let value: serde_json::Value = serde_json::from_str(raw)?;
    let version = value.get("version").and_then(|v| v.as_u64()).unwrap_or(0);
    if version > SCHEMA_VERSION {
        return Err(DecodeError::UnsupportedVersion(version));
    }
    if version < SCHEMA_VERSION {
        info!(
            "Upgrading stored document from version {} to {}",
            version, SCHEMA_VERSION
        );
    }
    // Version 0 and 1 share the same field layout.
    Ok(serde_json::from_value(value)?)
}

/// Load the document stored under `key`.
///
/// Returns `None` when the slot is empty, unreadable, or holds a document
/// that cannot be used; callers start from [`AppState::default`] then.
pub async fn load_state(storage: &dyn Storage, key: &str) -> Option<AppState> {
    let raw = match storage.get_item(key).await {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            error!("Failed to load state from storage: {:#}", e);
            return None;
        }
    };

    match decode(&raw) {
        Ok(state) => Some(state),
        Err(e) => {
            warn!("Ignoring stored document under '{}': {}", key, e);
            None
        }
    }
}

/// Write `state` under `key`. Errors are logged, never returned.
///
/// A state that would not decode again (a non-finite coordinate) is not
/// written, so the previously stored document survives.
pub async fn save_state(storage: &dyn Storage, key: &str, state: &AppState) {
    let raw = match encode(state) {
        Ok(raw) => raw,
        Err(e) => {
            error!("Failed to serialize state: {}", e);
            return;
        }
    };
    // JSON has no NaN or infinity; such a coordinate would be written as
    // null and the whole document would fail to load.
    if let Err(e) = decode(&raw) {
        error!("Refusing to save a document that would not load back: {}", e);
        return;
    }
    match storage.set_item(key, &raw).await {
        Ok(()) => trace!("Saved {} bytes under '{}'", raw.len(), key),
        Err(e) => error!("Failed to save state to storage: {:#}", e),
    }
}
