//! Storage statistics and health overview.
//!
//! Summarizes what the stored document holds: image, comment and reply
//! counts, plus the size of the database file and when the document was
//! last saved. Used by `annot stats` to confirm uploads and edits landed.

use anyhow::Result;

use image_annotations_core::view;

use crate::config::Config;
use crate::session;

/// Run the stats command: open the store and print a summary.
pub async fn run_stats(config: &Config) -> Result<()> {
    let session = session::open(config).await?;
    let state = session.state();

    let db_size = std::fs::metadata(&config.storage.path)
        .map(|m| m.len())
        .unwrap_or(0);
    let last_saved = session.storage().updated_at(session.key()).await?;

    println!("Image Annotations — Storage Stats");
    println!("=================================");
    println!();
    println!("  Database:    {}", config.storage.path.display());
    println!("  Key:         {}", session.key());
    println!("  Size:        {}", format_bytes(db_size));
    println!(
        "  Last saved:  {}",
        match last_saved {
            Some(ts) => format_ts_relative(ts),
            None => "never".to_string(),
        }
    );
    println!();
    println!("  Images:      {}", state.images.len());
    println!("  Comments:    {}", state.comment_count());
    println!("  Replies:     {}", state.reply_count());
    println!(
        "  Selected:    {}",
        match view::selected_image(state) {
            Some(image) => image.name.as_str(),
            None => "none",
        }
    );

    let busiest: Vec<_> = state
        .images
        .iter()
        .filter(|img| !img.comments.is_empty())
        .collect();
    if !busiest.is_empty() {
        println!();
        println!("  By image:");
        println!("  {:<32} {:>8} {:>8}", "NAME", "COMMENTS", "REPLIES");
        println!("  {}", "-".repeat(50));
        for image in busiest {
            let replies: usize = image.comments.iter().map(|c| c.replies.len()).sum();
            println!(
                "  {:<32} {:>8} {:>8}",
                truncate(&image.name, 32),
                image.comments.len(),
                replies
            );
        }
    }

    println!();

    session::close(session).await;
    Ok(())
}

/// Format a byte count as a human-readable string.
pub(crate) fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}

/// Shorten `s` to at most `max` characters, marking the cut with `…`.
pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let kept: String = s.chars().take(max.saturating_sub(1)).collect();
    format!("{}…", kept)
}

/// Format a Unix timestamp as a relative time string (e.g. "3 hours ago").
fn format_ts_relative(ts: i64) -> String {
    let now = chrono::Utc::now().timestamp();
    let delta = now - ts;

    if delta < 0 {
        return format_ts_iso(ts);
    }

    if delta < 60 {
        "just now".to_string()
    } else if delta < 3600 {
        let mins = delta / 60;
        format!("{} min{} ago", mins, if mins == 1 { "" } else { "s" })
    } else if delta < 86400 {
        let hours = delta / 3600;
        format!("{} hour{} ago", hours, if hours == 1 { "" } else { "s" })
    } else if delta < 86400 * 30 {
        let days = delta / 86400;
        format!("{} day{} ago", days, if days == 1 { "" } else { "s" })
    } else {
        format_ts_iso(ts)
    }
}

fn format_ts_iso(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| ts.to_string())
}
