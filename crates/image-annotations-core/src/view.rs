//! Read-only projections the presentation layer renders from.
//!
//! Nothing here is stored: marker numbers come from a comment's position
//! in its image, and the "active" comment is only honoured when it belongs
//! to the selected image.

use std::sync::Arc;

use crate::models::{AppState, Comment, Image};

/// A numbered marker on the selected image.
#[derive(Debug, Clone)]
pub struct Marker<'a> {
    /// 1-based display number.
    pub number: usize,
    pub comment: &'a Arc<Comment>,
    pub active: bool,
}

/// One tile in the gallery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GalleryEntry {
    pub id: String,
    pub name: String,
    pub comment_count: usize,
    pub selected: bool,
}

/// The selected image, or `None` when nothing (or a missing image) is selected.
pub fn selected_image(state: &AppState) -> Option<&Arc<Image>> {
    state
        .selected_image_id
        .as_deref()
        .and_then(|id| state.image(id))
}

/// The active comment, only if it exists in the selected image.
pub fn active_comment(state: &AppState) -> Option<&Arc<Comment>> {
    let image = selected_image(state)?;
    let id = state.active_comment_id.as_deref()?;
    image.comment(id)
}

/// Markers for `image`, numbered from 1 in insertion order.
pub fn markers<'a>(image: &'a Image, active_id: Option<&str>) -> Vec<Marker<'a>> {
    image
        .comments
        .iter()
        .enumerate()
        .map(|(i, comment)| Marker {
            number: i + 1,
            comment,
            active: active_id == Some(comment.id.as_str()),
        })
        .collect()
}

/// 1-based marker number of a comment, if present.
pub fn marker_number(image: &Image, comment_id: &str) -> Option<usize> {
    image
        .comments
        .iter()
        .position(|c| c.id == comment_id)
        .map(|i| i + 1)
}

pub fn gallery(state: &AppState) -> Vec<GalleryEntry> {
    let selected = state.selected_image_id.as_deref();
    state
        .images
        .iter()
        .map(|img| GalleryEntry {
            id: img.id.clone(),
            name: img.name.clone(),
            comment_count: img.comments.len(),
            selected: selected == Some(img.id.as_str()),
        })
        .collect()
}

/// Resolve a comment reference to its id.
///
/// `#N` refers to marker number `N`; anything else must be an exact id.
pub fn resolve_comment_ref<'a>(image: &'a Image, reference: &str) -> Option<&'a str> {
    if let Some(number) = reference.strip_prefix('#') {
        let n: usize = number.parse().ok()?;
        return n
            .checked_sub(1)
            .and_then(|i| image.comments.get(i))
            .map(|c| c.id.as_str());
    }
    image.comment(reference).map(|c| c.id.as_str())
}

/// Convert a click inside a `width` × `height` box to percentage offsets.
///
/// Returns `None` for a degenerate box or a non-finite input. Results are
/// clamped to `0..=100`.
pub fn normalize_click(px: f64, py: f64, width: f64, height: f64) -> Option<(f64, f64)> {
    if ![px, py, width, height].iter().all(|v| v.is_finite()) {
        return None;
    }
    if !(width > 0.0 && height > 0.0) {
        return None;
    }
    let x = (px / width * 100.0).clamp(0.0, 100.0);
    let y = (py / height * 100.0).clamp(0.0, 100.0);
    Some((x, y))
}

/// Whether `text` is acceptable as a new comment or reply.
pub fn has_content(text: &str) -> bool {
    !text.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn comment(id: &str, text: &str) -> Arc<Comment> {
        Arc::new(Comment {
            id: id.to_string(),
            x: 1.0,
            y: 2.0,
            text: text.to_string(),
            created_at: Utc::now(),
            replies: Vec::new(),
        })
    }

    fn state() -> AppState {
        AppState {
            images: vec![
                Arc::new(Image {
                    id: "a".to_string(),
                    url: String::new(),
                    name: "a.png".to_string(),
                    comments: vec![comment("c1", "one"), comment("c2", "two")],
                }),
                Arc::new(Image {
                    id: "b".to_string(),
                    url: String::new(),
                    name: "b.png".to_string(),
                    comments: vec![comment("c3", "three")],
                }),
            ],
            selected_image_id: Some("a".to_string()),
            active_comment_id: Some("c2".to_string()),
        }
    }

    #[test]
    fn test_markers_numbered_by_position() {
        let s = state();
        let image = selected_image(&s).unwrap();
        let m = markers(image, s.active_comment_id.as_deref());
        assert_eq!(m.len(), 2);
        assert_eq!((m[0].number, m[0].active), (1, false));
        assert_eq!((m[1].number, m[1].active), (2, true));
        assert_eq!(marker_number(image, "c2"), Some(2));
    }

    #[test]
    fn test_active_comment_must_belong_to_selection() {
        let mut s = state();
        assert_eq!(active_comment(&s).unwrap().id, "c2");
        s.active_comment_id = Some("c3".to_string());
        assert!(active_comment(&s).is_none());
    }

    #[test]
    fn test_stale_selection_is_no_selection() {
        let mut s = state();
        s.selected_image_id = Some("gone".to_string());
        assert!(selected_image(&s).is_none());
        assert!(active_comment(&s).is_none());
        assert!(gallery(&s).iter().all(|e| !e.selected));
    }

    #[test]
    fn test_gallery_entries() {
        let g = gallery(&state());
        assert_eq!(
            g[1],
            GalleryEntry {
                id: "b".to_string(),
                name: "b.png".to_string(),
                comment_count: 1,
                selected: false,
            }
        );
        assert!(g[0].selected);
    }

    #[test]
    fn test_resolve_comment_ref() {
        let s = state();
        let image = &s.images[0];
        assert_eq!(resolve_comment_ref(image, "#1"), Some("c1"));
        assert_eq!(resolve_comment_ref(image, "#2"), Some("c2"));
        assert_eq!(resolve_comment_ref(image, "#0"), None);
        assert_eq!(resolve_comment_ref(image, "#3"), None);
        assert_eq!(resolve_comment_ref(image, "#x"), None);
        assert_eq!(resolve_comment_ref(image, "c2"), Some("c2"));
        assert_eq!(resolve_comment_ref(image, "c3"), None);
    }

    #[test]
    fn test_normalize_click() {
        assert_eq!(normalize_click(50.0, 25.0, 200.0, 100.0), Some((25.0, 25.0)));
        assert_eq!(normalize_click(-5.0, 150.0, 100.0, 100.0), Some((0.0, 100.0)));
        assert_eq!(normalize_click(1.0, 1.0, 0.0, 100.0), None);
    }

    #[test]
    fn test_normalize_click_rejects_non_finite() {
        assert_eq!(normalize_click(f64::NAN, 5.0, 100.0, 100.0), None);
        assert_eq!(normalize_click(5.0, f64::INFINITY, 100.0, 100.0), None);
        assert_eq!(normalize_click(5.0, 5.0, f64::INFINITY, 100.0), None);
        assert_eq!(normalize_click(5.0, 5.0, 100.0, f64::NAN), None);
    }

    #[test]
    fn test_has_content() {
        assert!(has_content(" hi "));
        assert!(!has_content(""));
        assert!(!has_content(" \n\t "));
    }
}
