//! Upload progress reporting.
//!
//! Reports observable progress during `annot upload` so users see how many
//! files were read, added, or skipped. Progress is emitted on **stderr** so
//! stdout remains parseable for scripts.

use std::io::Write;

/// A single progress event for an upload.
#[derive(Clone, Debug)]
pub enum UploadProgressEvent {
    /// Files collected; reading starts. `total` is the number of candidates.
    Reading { total: u64 },
    /// A file was read and added as an image. `n` counts finished files.
    Added { name: String, n: u64, total: u64 },
    /// A file was read but is not an image, or could not be read.
    Skipped {
        name: String,
        reason: String,
        n: u64,
        total: u64,
    },
}

/// Reports upload progress. Implementations write to stderr (human or JSON).
pub trait UploadProgressReporter: Send + Sync {
    fn report(&self, event: UploadProgressEvent);
}

/// Human-friendly progress on stderr: "upload  added  3 / 12  cat.png".
pub struct StderrProgress;

impl UploadProgressReporter for StderrProgress {
    fn report(&self, event: UploadProgressEvent) {
        let line = match &event {
            UploadProgressEvent::Reading { total } => {
                format!("upload  reading {} files...\n", format_number(*total))
            }
            UploadProgressEvent::Added { name, n, total } => format!(
                "upload  added    {} / {}  {}\n",
                format_number(*n),
                format_number(*total),
                name
            ),
            UploadProgressEvent::Skipped {
                name,
                reason,
                n,
                total,
            } => format!(
                "upload  skipped  {} / {}  {} ({})\n",
                format_number(*n),
                format_number(*total),
                name,
                reason
            ),
        };
        let _ = std::io::stderr().lock().write_all(line.as_bytes());
        let _ = std::io::stderr().lock().flush();
    }
}

/// Machine-readable progress: one JSON object per line on stderr.
pub struct JsonProgress;

impl UploadProgressReporter for JsonProgress {
    fn report(&self, event: UploadProgressEvent) {
        let obj = match &event {
            UploadProgressEvent::Reading { total } => serde_json::json!({
                "event": "progress",
                "phase": "reading",
                "total": total
            }),
            UploadProgressEvent::Added { name, n, total } => serde_json::json!({
                "event": "progress",
                "phase": "added",
                "name": name,
                "n": n,
                "total": total
            }),
            UploadProgressEvent::Skipped {
                name,
                reason,
                n,
                total,
            } => serde_json::json!({
                "event": "progress",
                "phase": "skipped",
                "name": name,
                "reason": reason,
                "n": n,
                "total": total
            }),
        };
        if let Ok(line) = serde_json::to_string(&obj) {
            let _ = writeln!(std::io::stderr().lock(), "{}", line);
            let _ = std::io::stderr().lock().flush();
        }
    }
}

/// No-op reporter when progress is disabled.
pub struct NoProgress;

impl UploadProgressReporter for NoProgress {
    fn report(&self, _event: UploadProgressEvent) {}
}

fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + (s.len() - 1) / 3);
    let chars: Vec<char> = s.chars().rev().collect();
    for (i, c) in chars.iter().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(*c);
    }
    result.chars().rev().collect()
}

/// Progress mode for the CLI: off, human (stderr), or JSON (stderr).
#[derive(Clone, Copy, Debug, Eq, PartialEq, clap::ValueEnum)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    /// Default: human progress when stderr is a TTY, otherwise off.
    pub fn default_for_tty() -> Self {
        if atty::is(atty::Stream::Stderr) {
            ProgressMode::Human
        } else {
            ProgressMode::Off
        }
    }

    pub fn reporter(&self) -> Box<dyn UploadProgressReporter> {
        match self {
            ProgressMode::Off => Box::new(NoProgress),
            ProgressMode::Human => Box::new(StderrProgress),
            ProgressMode::Json => Box::new(JsonProgress),
        }
    }
}
