//! Upload pipeline: files in, `addImage` out.
//!
//! Every candidate file is read on its own task (bounded by
//! `upload.max_concurrent_reads`). As each read finishes, in whatever order
//! that happens, an image file is turned into a `data:` URI and appended to
//! the document with one `addImage` action. Files that are not images are
//! skipped; files that cannot be read are logged and never appended.
//!
//! # Content type
//!
//! A file's declared type wins when it has one. Otherwise the type is
//! sniffed from the file's magic bytes, then guessed from its extension.
//! Only `image/*` types are accepted.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use log::{debug, warn};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use walkdir::WalkDir;

use image_annotations_core::container::Annotations;
use image_annotations_core::storage::Storage;

use crate::config::{Config, UploadConfig};
use crate::progress::{ProgressMode, UploadProgressEvent, UploadProgressReporter};
use crate::session;

/// A file-like object that can be read asynchronously.
#[async_trait]
pub trait FileSource: Send + Sync {
    /// Display name, used as the image name.
    fn name(&self) -> &str;

    /// Content type supplied by whoever produced the file, if any.
    fn declared_type(&self) -> Option<&str> {
        None
    }

    async fn read(&self) -> Result<Vec<u8>>;
}

/// A file on the local filesystem.
pub struct DiskFile {
    path: PathBuf,
    name: String,
}

impl DiskFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        Self { path, name }
    }
}

#[async_trait]
impl FileSource for DiskFile {
    fn name(&self) -> &str {
        &self.name
    }

    async fn read(&self) -> Result<Vec<u8>> {
        tokio::fs::read(&self.path)
            .await
            .with_context(|| format!("Failed to read {}", self.path.display()))
    }
}

/// A file already held in memory (drag-and-drop payloads, tests).
pub struct MemoryFile {
    name: String,
    content_type: Option<String>,
    bytes: Vec<u8>,
}

impl MemoryFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            content_type: None,
            bytes,
        }
    }

    pub fn with_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

#[async_trait]
impl FileSource for MemoryFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn declared_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    async fn read(&self) -> Result<Vec<u8>> {
        Ok(self.bytes.clone())
    }
}

/// Counts for one upload run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct UploadSummary {
    pub added: usize,
    pub skipped: usize,
    pub failed: usize,
}

enum ReadOutcome {
    Image { name: String, url: String },
    NotImage { name: String, content_type: String },
    Failed { name: String, error: anyhow::Error },
}

pub fn is_image_type(content_type: &str) -> bool {
    content_type.starts_with("image/")
}

/// Sniff the content type from magic bytes, falling back to the extension.
///
/// The fallback knows every registered type, not just the raster formats
/// that can be sniffed, so `logo.svg` comes back as `image/svg+xml` and
/// `notes.txt` as `text/plain`.
pub fn detect_content_type(name: &str, bytes: &[u8]) -> Option<&'static str> {
    image::guess_format(bytes)
        .ok()
        .map(|format| format.to_mime_type())
        .or_else(|| mime_guess::from_path(name).first_raw())
}

pub fn to_data_uri(content_type: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", content_type, STANDARD.encode(bytes))
}

async fn read_one(file: &dyn FileSource) -> ReadOutcome {
    let name = file.name().to_string();

    // A declared non-image type is skipped without reading the file.
    if let Some(declared) = file.declared_type() {
        if !is_image_type(declared) {
            return ReadOutcome::NotImage {
                name,
                content_type: declared.to_string(),
            };
        }
    }

    let bytes = match file.read().await {
        Ok(bytes) => bytes,
        Err(error) => return ReadOutcome::Failed { name, error },
    };

    let content_type = match file.declared_type() {
        Some(declared) => declared.to_string(),
        None => match detect_content_type(&name, &bytes) {
            Some(detected) => detected.to_string(),
            None => {
                return ReadOutcome::NotImage {
                    name,
                    content_type: "unknown".to_string(),
                }
            }
        },
    };

    if !is_image_type(&content_type) {
        return ReadOutcome::NotImage { name, content_type };
    }

    ReadOutcome::Image {
        url: to_data_uri(&content_type, &bytes),
        name,
    }
}

/// Read `files` concurrently and add each image to `store` as its read
/// completes.
pub async fn upload_files<S: Storage>(
    store: &mut Annotations<S>,
    files: Vec<Box<dyn FileSource>>,
    max_concurrent_reads: usize,
    reporter: &dyn UploadProgressReporter,
) -> UploadSummary {
    let total = files.len() as u64;
    reporter.report(UploadProgressEvent::Reading { total });

    let permits = Arc::new(Semaphore::new(max_concurrent_reads.max(1)));
    let mut reads = JoinSet::new();
    for file in files {
        let permits = Arc::clone(&permits);
        reads.spawn(async move {
            let _permit = permits.acquire_owned().await.ok();
            read_one(file.as_ref()).await
        });
    }

    let mut summary = UploadSummary::default();
    let mut n = 0u64;
    while let Some(joined) = reads.join_next().await {
        n += 1;
        match joined {
            Ok(ReadOutcome::Image { name, url }) => {
                debug!("Adding {} ({} bytes as data URI)", name, url.len());
                store.add_image(url, name.clone()).await;
                summary.added += 1;
                reporter.report(UploadProgressEvent::Added { name, n, total });
            }
            Ok(ReadOutcome::NotImage { name, content_type }) => {
                debug!("Skipping {}: not an image ({})", name, content_type);
                summary.skipped += 1;
                reporter.report(UploadProgressEvent::Skipped {
                    name,
                    reason: format!("not an image: {}", content_type),
                    n,
                    total,
                });
            }
            Ok(ReadOutcome::Failed { name, error }) => {
                warn!("Failed to read {}: {:#}", name, error);
                summary.failed += 1;
                reporter.report(UploadProgressEvent::Skipped {
                    name,
                    reason: "read failed".to_string(),
                    n,
                    total,
                });
            }
            Err(e) => {
                warn!("Upload task failed: {}", e);
                summary.failed += 1;
            }
        }
    }

    summary
}

/// Expand `inputs` into candidate file paths.
///
/// Files are taken as given. Directories are walked and filtered with the
/// configured include/exclude globs (matched case-insensitively against the
/// path relative to the directory), sorted per directory.
pub fn collect_paths(config: &UploadConfig, inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let include_set = build_globset(&config.include_globs)?;
    let exclude_set = build_globset(&config.exclude_globs)?;

    let mut paths = Vec::new();
    for input in inputs {
        if input.is_file() {
            paths.push(input.clone());
            continue;
        }
        if !input.is_dir() {
            bail!("Upload path does not exist: {}", input.display());
        }

        let mut found = Vec::new();
        let walker = WalkDir::new(input).follow_links(config.follow_symlinks);
        for entry in walker {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            let relative = path.strip_prefix(input).unwrap_or(path);
            let rel_str = relative.to_string_lossy().to_string();

            if exclude_set.is_match(&rel_str) || !include_set.is_match(&rel_str) {
                continue;
            }
            found.push(path.to_path_buf());
        }
        found.sort();
        paths.extend(found);
    }

    Ok(paths)
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(GlobBuilder::new(pattern).case_insensitive(true).build()?);
    }
    Ok(builder.build()?)
}

/// CLI entry point for `annot upload <paths...>`.
pub async fn run_upload(config: &Config, inputs: &[PathBuf], progress: ProgressMode) -> Result<()> {
    let paths = collect_paths(&config.upload, inputs)?;
    if paths.is_empty() {
        println!("No files to upload.");
        return Ok(());
    }

    let files: Vec<Box<dyn FileSource>> = paths
        .iter()
        .map(|p| Box::new(DiskFile::new(p.clone())) as Box<dyn FileSource>)
        .collect();

    let mut session = session::open(config).await?;
    let reporter = progress.reporter();
    let summary = upload_files(
        &mut session,
        files,
        config.upload.max_concurrent_reads,
        reporter.as_ref(),
    )
    .await;
    let selected = session.state().selected_image_id.clone();
    session::close(session).await;

    println!("upload complete");
    println!("  added:   {}", summary.added);
    println!("  skipped: {}", summary.skipped);
    println!("  failed:  {}", summary.failed);
    if let Some(id) = selected {
        println!("  selected: {}", id);
    }
    Ok(())
}
