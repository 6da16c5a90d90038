//! Pure state transitions.
//!
//! [`reduce`] applies one [`Action`] to an [`AppState`] and returns the next
//! state, or the [`Rejection`] explaining why the action was a no-op. The
//! input state is never modified: the next state shares every image and
//! comment the action did not touch, and holds fresh copies of the ones it
//! did (`Arc::make_mut` on a state whose nodes are still referenced by the
//! previous one always copies).
//!
//! Persistence is not this module's concern; the owner of the state saves
//! it after each successful transition.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::action::{Action, Rejection};
use crate::models::{now_millis, AppState, Comment, Image, Reply};

/// Source of new identifiers and creation timestamps.
pub trait Minter {
    fn next_id(&mut self) -> String;
    fn now(&mut self) -> DateTime<Utc>;
}

/// UUID v4 identifiers and the wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemMinter;

impl Minter for SystemMinter {
    fn next_id(&mut self) -> String {
        Uuid::new_v4().to_string()
    }

    fn now(&mut self) -> DateTime<Utc> {
        now_millis()
    }
}

/// Apply `action` to `state`.
///
/// # Guarantees
///
/// - On `Err`, nothing was changed (the caller keeps `state`).
/// - On `Ok`, the returned state is complete; there is no partial update.
/// - `selectImage` and `setActiveComment` never fail.
/// - `deleteReply` with an unknown reply id succeeds without changing any
///   value (the parent comment still has to exist).
pub fn reduce(
    state: &AppState,
    action: &Action,
    minter: &mut dyn Minter,
) -> Result<AppState, Rejection> {
    match action {
        Action::AddImage { url, name } => {
            let mut next = state.clone();
            let image = Image {
                id: minter.next_id(),
                url: url.clone(),
                name: name.clone(),
                comments: Vec::new(),
            };
            if next.images.is_empty() {
                next.selected_image_id = Some(image.id.clone());
            }
            next.images.push(Arc::new(image));
            Ok(next)
        }

        Action::SelectImage { image_id } => {
            let mut next = state.clone();
            next.selected_image_id = Some(image_id.clone());
            next.active_comment_id = None;
            Ok(next)
        }

        Action::AddComment { x, y, text } => {
            let (mut next, comment_id) = update_selected_image(state, |image| {
                let comment = Comment {
                    id: minter.next_id(),
                    x: *x,
                    y: *y,
                    text: text.clone(),
                    created_at: minter.now(),
                    replies: Vec::new(),
                };
                let id = comment.id.clone();
                image.comments.push(Arc::new(comment));
                Ok(id)
            })?;
            next.active_comment_id = Some(comment_id);
            Ok(next)
        }

        Action::EditComment { comment_id, text } => update_comment(state, comment_id, |comment| {
            comment.text = text.clone();
            Ok(())
        }),

        Action::DeleteComment { comment_id } => {
            let (mut next, ()) = update_selected_image(state, |image| {
                let index = comment_index(image, comment_id)?;
                image.comments.remove(index);
                Ok(())
            })?;
            if next.active_comment_id.as_deref() == Some(comment_id.as_str()) {
                next.active_comment_id = None;
            }
            Ok(next)
        }

        Action::AddReply { comment_id, text } => update_comment(state, comment_id, |comment| {
            comment.replies.push(Reply {
                id: minter.next_id(),
                text: text.clone(),
                created_at: minter.now(),
            });
            Ok(())
        }),

        Action::EditReply {
            comment_id,
            reply_id,
            text,
        } => update_comment(state, comment_id, |comment| {
            let reply = comment
                .replies
                .iter_mut()
                .find(|r| r.id == *reply_id)
                .ok_or_else(|| Rejection::ReplyNotFound(reply_id.clone()))?;
            reply.text = text.clone();
            Ok(())
        }),

        Action::DeleteReply {
            comment_id,
            reply_id,
        } => update_comment(state, comment_id, |comment| {
            comment.replies.retain(|r| r.id != *reply_id);
            Ok(())
        }),

        Action::SetActiveComment { comment_id } => {
            let mut next = state.clone();
            next.active_comment_id = comment_id.clone();
            Ok(next)
        }
    }
}

fn selected_index(state: &AppState) -> Result<usize, Rejection> {
    let id = state
        .selected_image_id
        .as_deref()
        .ok_or(Rejection::NoSelection)?;
    state
        .image_index(id)
        .ok_or_else(|| Rejection::ImageNotFound(id.to_string()))
}

fn comment_index(image: &Image, comment_id: &str) -> Result<usize, Rejection> {
    image
        .comments
        .iter()
        .position(|c| c.id == comment_id)
        .ok_or_else(|| Rejection::CommentNotFound(comment_id.to_string()))
}

/// Copy-on-write access to the selected image. The clone is discarded if
/// `f` rejects.
fn update_selected_image<T, F>(state: &AppState, f: F) -> Result<(AppState, T), Rejection>
where
    F: FnOnce(&mut Image) -> Result<T, Rejection>,
{
    let index = selected_index(state)?;
    let mut next = state.clone();
    let out = f(Arc::make_mut(&mut next.images[index]))?;
    Ok((next, out))
}

fn update_comment<F>(state: &AppState, comment_id: &str, f: F) -> Result<AppState, Rejection>
where
    F: FnOnce(&mut Comment) -> Result<(), Rejection>,
{
    update_selected_image(state, |image| {
        let index = comment_index(image, comment_id)?;
        f(Arc::make_mut(&mut image.comments[index]))
    })
    .map(|(next, ())| next)
}
