//! Gallery commands: list uploaded images and choose the one to annotate.

use anyhow::Result;

use image_annotations_core::view;

use crate::config::Config;
use crate::session;
use crate::stats::truncate;

/// `annot images`: one row per image, in upload order.
pub async fn run_images(config: &Config) -> Result<()> {
    let session = session::open(config).await?;
    let entries = view::gallery(session.state());
    session::close(session).await;

    if entries.is_empty() {
        println!("No images available.");
        println!("Upload images to get started: annot upload <paths...>");
        return Ok(());
    }

    println!("  {:<36}  {:<32} {:>8}", "ID", "NAME", "COMMENTS");
    println!("  {}", "-".repeat(79));
    for entry in &entries {
        println!(
            "{} {:<36}  {:<32} {:>8}",
            if entry.selected { "*" } else { " " },
            entry.id,
            truncate(&entry.name, 32),
            entry.comment_count
        );
    }
    println!();
    println!("{} image(s)", entries.len());
    Ok(())
}

/// `annot select <id>`: make `image_id` the current image.
///
/// The id is stored even when no such image exists; later comment commands
/// then have nothing to act on.
pub async fn run_select(config: &Config, image_id: &str) -> Result<()> {
    let mut session = session::open(config).await?;
    let outcome = session.select_image(image_id).await;
    let found = view::selected_image(session.state()).map(|image| image.name.clone());
    session::close(session).await;

    session::report(&outcome, || match &found {
        Some(name) => println!("Selected {} ({})", image_id, name),
        None => {
            println!("Selected {}", image_id);
            eprintln!("warning: no image with id '{}' exists", image_id);
        }
    });
    Ok(())
}
