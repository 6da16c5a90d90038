//! The state container: current document + storage + the operation table.
//!
//! [`Annotations`] owns the canonical [`AppState`]. Every operation goes
//! through [`Annotations::dispatch`], which runs the pure
//! [`reduce`](crate::reducer::reduce) transition and, when it succeeds,
//! swaps in the new state and saves it. A rejected action leaves the state
//! untouched and writes nothing.
//!
//! ```rust
//! use image_annotations_core::container::Annotations;
//! use image_annotations_core::storage::memory::InMemoryStorage;
//!
//! # tokio_test_block_on(async {
//! let mut store = Annotations::open(InMemoryStorage::new(), "imageAnnotations").await;
//! store.add_image("data:image/png;base64,AAAA", "a.png").await;
//! assert_eq!(store.state().images.len(), 1);
//! # });
//! # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
//! # }
//! ```

use log::debug;

use crate::action::{Action, Rejection};
use crate::models::AppState;
use crate::persist;
use crate::reducer::{reduce, Minter, SystemMinter};
use crate::storage::Storage;

/// Result of dispatching one action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// State replaced and saved.
    Applied,
    /// Precondition unmet; state unchanged and nothing saved.
    Ignored(Rejection),
}

impl Outcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Outcome::Applied)
    }
}

/// Single source of truth for the annotation document.
pub struct Annotations<S: Storage> {
    state: AppState,
    storage: S,
    key: String,
    minter: Box<dyn Minter + Send>,
}

impl<S: Storage> Annotations<S> {
    /// Load the document stored under `key`, or start empty.
    pub async fn open(storage: S, key: impl Into<String>) -> Self {
        let key = key.into();
        let state = persist::load_state(&storage, &key)
            .await
            .unwrap_or_default();
        debug!(
            "Opened '{}' with {} image(s), {} comment(s)",
            key,
            state.images.len(),
            state.comment_count()
        );
        Self {
            state,
            storage,
            key,
            minter: Box::new(SystemMinter),
        }
    }

    /// Replace the id/timestamp source.
    pub fn with_minter(mut self, minter: impl Minter + Send + 'static) -> Self {
        self.minter = Box::new(minter);
        self
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Apply `action`; on success save the resulting state.
    pub async fn dispatch(&mut self, action: Action) -> Outcome {
        match reduce(&self.state, &action, self.minter.as_mut()) {
            Ok(next) => {
                self.state = next;
                persist::save_state(&self.storage, &self.key, &self.state).await;
                Outcome::Applied
            }
            Err(rejection) => {
                debug!("{} ignored: {}", action.name(), rejection);
                Outcome::Ignored(rejection)
            }
        }
    }

    pub async fn add_image(&mut self, url: impl Into<String>, name: impl Into<String>) -> Outcome {
        self.dispatch(Action::AddImage {
            url: url.into(),
            name: name.into(),
        })
        .await
    }

    pub async fn select_image(&mut self, image_id: impl Into<String>) -> Outcome {
        self.dispatch(Action::SelectImage {
            image_id: image_id.into(),
        })
        .await
    }

    pub async fn add_comment(&mut self, x: f64, y: f64, text: impl Into<String>) -> Outcome {
        self.dispatch(Action::AddComment {
            x,
            y,
            text: text.into(),
        })
        .await
    }

    pub async fn edit_comment(
        &mut self,
        comment_id: impl Into<String>,
        text: impl Into<String>,
    ) -> Outcome {
        self.dispatch(Action::EditComment {
            comment_id: comment_id.into(),
            text: text.into(),
        })
        .await
    }

    pub async fn delete_comment(&mut self, comment_id: impl Into<String>) -> Outcome {
        self.dispatch(Action::DeleteComment {
            comment_id: comment_id.into(),
        })
        .await
    }

    pub async fn add_reply(
        &mut self,
        comment_id: impl Into<String>,
        text: impl Into<String>,
    ) -> Outcome {
        self.dispatch(Action::AddReply {
            comment_id: comment_id.into(),
            text: text.into(),
        })
        .await
    }

    pub async fn edit_reply(
        &mut self,
        comment_id: impl Into<String>,
        reply_id: impl Into<String>,
        text: impl Into<String>,
    ) -> Outcome {
        self.dispatch(Action::EditReply {
            comment_id: comment_id.into(),
            reply_id: reply_id.into(),
            text: text.into(),
        })
        .await
    }

    pub async fn delete_reply(
        &mut self,
        comment_id: impl Into<String>,
        reply_id: impl Into<String>,
    ) -> Outcome {
        self.dispatch(Action::DeleteReply {
            comment_id: comment_id.into(),
            reply_id: reply_id.into(),
        })
        .await
    }

    pub async fn set_active_comment(&mut self, comment_id: Option<String>) -> Outcome {
        self.dispatch(Action::SetActiveComment { comment_id }).await
    }
}
