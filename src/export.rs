//! Export the stored document as JSON.
//!
//! Writes the same versioned document the store persists, indented for
//! reading or for feeding into other tools. Useful for backups and for
//! moving annotations between machines.

use anyhow::{Context, Result};
use std::path::Path;

use image_annotations_core::persist;

use crate::config::Config;
use crate::session;

/// Export the full document.
///
/// If `output` is `Some`, writes to that file path. Otherwise writes
/// to stdout for piping.
pub async fn run_export(config: &Config, output: Option<&Path>) -> Result<()> {
    let session = session::open(config).await?;
    let json = persist::encode_pretty(session.state())?;
    let images = session.state().images.len();
    let comments = session.state().comment_count();
    session::close(session).await;

    match output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, &json)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!(
                "Exported {} images, {} comments to {}",
                images,
                comments,
                path.display()
            );
        }
        None => {
            println!("{}", json);
        }
    }

    Ok(())
}
