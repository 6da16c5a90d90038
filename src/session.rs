//! Store wiring: open the annotation container over the configured
//! SQLite slot store.

use anyhow::{Context, Result};

use image_annotations_core::container::{Annotations, Outcome};

use crate::config::Config;
use crate::db;
use crate::migrate;
use crate::sqlite_storage::SqliteStorage;

/// The container as used by the CLI.
pub type Session = Annotations<SqliteStorage>;

/// Connect to the database (creating it if needed) and load the document.
///
/// Failing to open the database is an error; a missing or unreadable
/// document inside it is not (the session starts empty).
pub async fn open(config: &Config) -> Result<Session> {
    let pool = db::connect(config).await.with_context(|| {
        format!(
            "Failed to open storage at {}",
            config.storage.path.display()
        )
    })?;
    migrate::ensure_schema(&pool).await?;
    Ok(Annotations::open(SqliteStorage::new(pool), config.storage.key.clone()).await)
}

pub async fn close(session: Session) {
    session.storage().pool().close().await;
}

/// Print the outcome of a dispatched action. Ignored actions are reported
/// on stderr; they are not errors.
pub fn report(outcome: &Outcome, applied: impl FnOnce()) {
    match outcome {
        Outcome::Applied => applied(),
        Outcome::Ignored(reason) => eprintln!("Nothing changed: {}", reason),
    }
}
