//! Annotation commands: show the selected image and edit its comment threads.
//!
//! Comments are addressed either by id or by marker number (`#2`), both
//! resolved against the selected image. Text is checked for content here,
//! before anything is dispatched; the store itself accepts any string.

use anyhow::{bail, Result};

use image_annotations_core::models::Comment;
use image_annotations_core::view;

use crate::config::Config;
use crate::session::{self, Session};
use crate::stats::format_bytes;

/// `annot show`: the selected image, its markers, and the open thread.
pub async fn run_show(config: &Config) -> Result<()> {
    let session = session::open(config).await?;
    let state = session.state();

    let Some(image) = view::selected_image(state) else {
        println!("No image selected.");
        if state.images.is_empty() {
            println!("Upload images to get started: annot upload <paths...>");
        } else {
            println!("Pick one with: annot select <id>");
        }
        session::close(session).await;
        return Ok(());
    };

    println!("Image:    {}", image.name);
    println!("ID:       {}", image.id);
    println!("Source:   {}", describe_url(&image.url));
    println!();

    let markers = view::markers(image, state.active_comment_id.as_deref());
    if markers.is_empty() {
        println!("No comments yet. Add one with: annot comment add --x <pct> --y <pct> <text>");
    } else {
        println!("Comments ({}):", markers.len());
        for marker in &markers {
            let c = marker.comment;
            println!(
                "{} #{:<3} ({:>5.1}%, {:>5.1}%)  {}  [{} repl{}]",
                if marker.active { "*" } else { " " },
                marker.number,
                c.x,
                c.y,
                first_line(&c.text),
                c.replies.len(),
                if c.replies.len() == 1 { "y" } else { "ies" }
            );
        }
    }

    if let Some(comment) = view::active_comment(state) {
        let number = view::marker_number(image, &comment.id).unwrap_or(0);
        println!();
        print_thread(number, comment);
    }

    session::close(session).await;
    Ok(())
}

fn print_thread(number: usize, comment: &Comment) {
    println!("--- Comment #{} ---", number);
    println!("id:      {}", comment.id);
    println!("created: {}", comment.created_at.format("%Y-%m-%d"));
    println!();
    println!("{}", comment.text);
    println!();
    println!("--- Replies ({}) ---", comment.replies.len());
    for reply in &comment.replies {
        println!(
            "[{}] {}  {}",
            reply.id,
            reply.created_at.format("%Y-%m-%d"),
            reply.text
        );
    }
}

/// Short description of an image URL; data URIs are summarized.
fn describe_url(url: &str) -> String {
    match url.strip_prefix("data:") {
        Some(rest) => {
            let mime = rest.split([';', ',']).next().unwrap_or("");
            let payload = rest.split_once(',').map(|(_, p)| p.len()).unwrap_or(0);
            // base64 carries 3 bytes per 4 characters
            let bytes = (payload as u64) * 3 / 4;
            format!("inline {} (~{})", mime, format_bytes(bytes))
        }
        None => url.to_string(),
    }
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or("")
}

fn require_text(text: &str, what: &str) -> Result<()> {
    if !view::has_content(text) {
        bail!("{} text must not be empty", what);
    }
    Ok(())
}

/// Resolve `#N` or an id against the selected image. Unresolvable refs are
/// passed through so the store reports them as not found.
fn resolve_ref(session: &Session, reference: &str) -> String {
    view::selected_image(session.state())
        .and_then(|image| view::resolve_comment_ref(image, reference))
        .unwrap_or(reference)
        .to_string()
}

fn reply_exists(session: &Session, comment_id: &str, reply_id: &str) -> bool {
    view::selected_image(session.state())
        .and_then(|image| image.comment(comment_id))
        .and_then(|comment| comment.reply(reply_id))
        .is_some()
}

/// Where to place a new comment: percentages, or a click in a box of known size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Position {
    Percent { x: f64, y: f64 },
    Click {
        px: f64,
        py: f64,
        width: f64,
        height: f64,
    },
}

impl Position {
    /// Percentage offsets within the image.
    pub fn resolve(self) -> Result<(f64, f64)> {
        match self {
            Position::Percent { x, y } => {
                if !(0.0..=100.0).contains(&x) || !(0.0..=100.0).contains(&y) {
                    bail!("position must be within 0..=100 percent, got ({}, {})", x, y);
                }
                Ok((x, y))
            }
            Position::Click {
                px,
                py,
                width,
                height,
            } => match view::normalize_click(px, py, width, height) {
                Some(xy) => Ok(xy),
                None => bail!(
                    "click ({}, {}) in a {}x{} image is not a valid position",
                    px,
                    py,
                    width,
                    height
                ),
            },
        }
    }
}

pub async fn run_comment_add(config: &Config, position: Position, text: &str) -> Result<()> {
    require_text(text, "comment")?;
    let (x, y) = position.resolve()?;

    let mut session = session::open(config).await?;
    let outcome = session.add_comment(x, y, text).await;
    let added = view::selected_image(session.state())
        .and_then(|image| image.comments.last().map(|c| (image.comments.len(), c.id.clone())));
    session::close(session).await;

    session::report(&outcome, || {
        if let Some((number, id)) = added {
            println!("Added comment #{} ({}) at ({:.1}%, {:.1}%)", number, id, x, y);
        }
    });
    Ok(())
}

pub async fn run_comment_edit(config: &Config, reference: &str, text: &str) -> Result<()> {
    require_text(text, "comment")?;
    let mut session = session::open(config).await?;
    let id = resolve_ref(&session, reference);
    let outcome = session.edit_comment(id.as_str(), text).await;
    session::close(session).await;

    session::report(&outcome, || println!("Updated comment {}", id));
    Ok(())
}

pub async fn run_comment_delete(config: &Config, reference: &str) -> Result<()> {
    let mut session = session::open(config).await?;
    let id = resolve_ref(&session, reference);
    let outcome = session.delete_comment(id.as_str()).await;
    session::close(session).await;

    session::report(&outcome, || println!("Deleted comment {}", id));
    Ok(())
}

/// `annot comment open <ref>`: make a comment the active thread.
///
/// Any id is accepted, as the store does not check it; an unknown one
/// simply shows no thread.
pub async fn run_comment_open(config: &Config, reference: &str) -> Result<()> {
    let mut session = session::open(config).await?;
    let id = resolve_ref(&session, reference);
    let outcome = session.set_active_comment(Some(id.clone())).await;
    let shown = view::active_comment(session.state()).is_some();
    session::close(session).await;

    session::report(&outcome, || {
        println!("Opened comment {}", id);
        if !shown {
            eprintln!("warning: no comment '{}' on the selected image", id);
        }
    });
    Ok(())
}

pub async fn run_comment_close(config: &Config) -> Result<()> {
    let mut session = session::open(config).await?;
    let outcome = session.set_active_comment(None).await;
    session::close(session).await;

    session::report(&outcome, || println!("Closed active comment"));
    Ok(())
}

pub async fn run_reply_add(config: &Config, reference: &str, text: &str) -> Result<()> {
    require_text(text, "reply")?;
    let mut session = session::open(config).await?;
    let id = resolve_ref(&session, reference);
    let outcome = session.add_reply(id.as_str(), text).await;
    let reply_id = view::selected_image(session.state())
        .and_then(|image| image.comment(&id))
        .and_then(|c| c.replies.last().map(|r| r.id.clone()));
    session::close(session).await;

    session::report(&outcome, || {
        if let Some(reply_id) = reply_id {
            println!("Added reply {} to comment {}", reply_id, id);
        }
    });
    Ok(())
}

pub async fn run_reply_edit(
    config: &Config,
    reference: &str,
    reply_id: &str,
    text: &str,
) -> Result<()> {
    require_text(text, "reply")?;
    let mut session = session::open(config).await?;
    let id = resolve_ref(&session, reference);
    let outcome = session.edit_reply(id.as_str(), reply_id, text).await;
    session::close(session).await;

    session::report(&outcome, || println!("Updated reply {}", reply_id));
    Ok(())
}

pub async fn run_reply_delete(config: &Config, reference: &str, reply_id: &str) -> Result<()> {
    let mut session = session::open(config).await?;
    let id = resolve_ref(&session, reference);
    let existed = reply_exists(&session, &id, reply_id);
    let outcome = session.delete_reply(id.as_str(), reply_id).await;
    session::close(session).await;

    // Deleting an absent reply succeeds without changing anything.
    session::report(&outcome, || {
        if existed {
            println!("Deleted reply {}", reply_id);
        } else {
            eprintln!("warning: comment {} has no reply '{}'", id, reply_id);
        }
    });
    Ok(())
}
