//! # Image Annotations CLI (`annot`)
//!
//! The `annot` binary is the primary interface for Image Annotations. It
//! provides commands for database initialization, image upload, selection,
//! and editing positional comments and their reply threads.
//!
//! ## Usage
//!
//! ```bash
//! annot --config ./config/annot.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `annot init` | Create the SQLite database and its schema |
//! | `annot upload <paths...>` | Add image files (directories are walked) |
//! | `annot images` | List uploaded images |
//! | `annot select <id>` | Choose the image to annotate |
//! | `annot show` | Show the selected image, its markers and the open thread |
//! | `annot comment add/edit/delete/open/close` | Manage comments |
//! | `annot reply add/edit/delete` | Manage replies |
//! | `annot export` | Print or write the stored document as JSON |
//! | `annot stats` | Storage summary |
//!
//! Comments can be referenced by id or by marker number (`#1`, `#2`, ...).

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use image_annotations::annotate::{self, Position};
use image_annotations::progress::ProgressMode;
use image_annotations::{config, export, gallery, migrate, stats, upload};

/// Image Annotations CLI: pin comments to images and discuss them.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. When the file does not exist, built-in defaults are used.
#[derive(Parser)]
#[command(
    name = "annot",
    about = "Image Annotations: positional comments and reply threads over uploaded images",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/annot.toml`. Storage location and upload
    /// filters are read from this file.
    #[arg(long, global = true, default_value = "./config/annot.toml")]
    config: PathBuf,

    /// Enable debug logging (overridden by `RUST_LOG`).
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the SQLite database file and the key-value table.
    /// Running it multiple times is safe.
    Init,

    /// Upload image files.
    ///
    /// Directories are walked and filtered by the configured globs.
    /// Files that are not images are skipped. The first image added to
    /// an empty store becomes the selection.
    Upload {
        /// Files or directories to upload.
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Progress output on stderr. Defaults to `human` on a terminal.
        #[arg(long, value_enum)]
        progress: Option<ProgressMode>,
    },

    /// List uploaded images. The selected one is marked with `*`.
    Images,

    /// Select the image to annotate.
    Select {
        /// Image id (see `annot images`).
        id: String,
    },

    /// Show the selected image, its comment markers and the open thread.
    Show,

    /// Manage comments on the selected image.
    Comment {
        #[command(subcommand)]
        action: CommentAction,
    },

    /// Manage replies to a comment on the selected image.
    Reply {
        #[command(subcommand)]
        action: ReplyAction,
    },

    /// Export the stored document as JSON.
    Export {
        /// Write to this file instead of stdout.
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Show storage statistics.
    Stats,
}

#[derive(Subcommand)]
enum CommentAction {
    /// Add a comment at a position on the selected image.
    Add {
        #[command(flatten)]
        at: PositionArgs,

        /// Comment text.
        text: String,
    },
    /// Replace a comment's text.
    Edit {
        /// Comment id or marker number (`#N`).
        comment: String,
        text: String,
    },
    /// Delete a comment and its replies.
    Delete {
        /// Comment id or marker number (`#N`).
        comment: String,
    },
    /// Open a comment's thread.
    Open {
        /// Comment id or marker number (`#N`).
        comment: String,
    },
    /// Close the open thread.
    Close,
}

#[derive(Subcommand)]
enum ReplyAction {
    /// Reply to a comment.
    Add {
        /// Comment id or marker number (`#N`).
        comment: String,
        text: String,
    },
    /// Replace a reply's text.
    Edit {
        /// Comment id or marker number (`#N`).
        comment: String,
        /// Reply id (see `annot show`).
        reply: String,
        text: String,
    },
    /// Delete a reply.
    Delete {
        /// Comment id or marker number (`#N`).
        comment: String,
        /// Reply id (see `annot show`).
        reply: String,
    },
}

/// Either `--x/--y` percentages or `--click` within `--size`.
#[derive(Args)]
struct PositionArgs {
    /// Horizontal position, percent of image width.
    #[arg(long, value_parser = parse_finite, requires = "y", conflicts_with = "click")]
    x: Option<f64>,

    /// Vertical position, percent of image height.
    #[arg(long, value_parser = parse_finite, requires = "x", conflicts_with = "click")]
    y: Option<f64>,

    /// Click position in pixels, as `PX,PY`.
    #[arg(long, value_parser = parse_click, requires = "size")]
    click: Option<(f64, f64)>,

    /// Displayed image size in pixels, as `WxH`.
    #[arg(long, value_parser = parse_size, requires = "click")]
    size: Option<(f64, f64)>,
}

impl PositionArgs {
    fn position(&self) -> anyhow::Result<Position> {
        match (self.x, self.y, self.click, self.size) {
            (Some(x), Some(y), _, _) => Ok(Position::Percent { x, y }),
            (_, _, Some((px, py)), Some((width, height))) => Ok(Position::Click {
                px,
                py,
                width,
                height,
            }),
            _ => anyhow::bail!("give a position with --x/--y or --click/--size"),
        }
    }
}

fn parse_pair(s: &str, sep: char) -> Result<(f64, f64), String> {
    let (a, b) = s
        .split_once(sep)
        .ok_or_else(|| format!("expected two numbers separated by '{}', got '{}'", sep, s))?;
    Ok((parse_finite(a)?, parse_finite(b)?))
}

fn parse_finite(s: &str) -> Result<f64, String> {
    let v: f64 = s.trim().parse().map_err(|e| format!("'{}': {}", s, e))?;
    if !v.is_finite() {
        return Err(format!("'{}' is not a finite number", s));
    }
    Ok(v)
}

fn parse_click(s: &str) -> Result<(f64, f64), String> {
    parse_pair(s, ',')
}

fn parse_size(s: &str) -> Result<(f64, f64), String> {
    parse_pair(s, 'x')
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp(None)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let cfg = config::load_or_minimal(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Upload { paths, progress } => {
            let mode = progress.unwrap_or_else(ProgressMode::default_for_tty);
            upload::run_upload(&cfg, &paths, mode).await?;
        }
        Commands::Images => {
            gallery::run_images(&cfg).await?;
        }
        Commands::Select { id } => {
            gallery::run_select(&cfg, &id).await?;
        }
        Commands::Show => {
            annotate::run_show(&cfg).await?;
        }
        Commands::Comment { action } => match action {
            CommentAction::Add { at, text } => {
                annotate::run_comment_add(&cfg, at.position()?, &text).await?;
            }
            CommentAction::Edit { comment, text } => {
                annotate::run_comment_edit(&cfg, &comment, &text).await?;
            }
            CommentAction::Delete { comment } => {
                annotate::run_comment_delete(&cfg, &comment).await?;
            }
            CommentAction::Open { comment } => {
                annotate::run_comment_open(&cfg, &comment).await?;
            }
            CommentAction::Close => {
                annotate::run_comment_close(&cfg).await?;
            }
        },
        Commands::Reply { action } => match action {
            ReplyAction::Add { comment, text } => {
                annotate::run_reply_add(&cfg, &comment, &text).await?;
            }
            ReplyAction::Edit {
                comment,
                reply,
                text,
            } => {
                annotate::run_reply_edit(&cfg, &comment, &reply, &text).await?;
            }
            ReplyAction::Delete { comment, reply } => {
                annotate::run_reply_delete(&cfg, &comment, &reply).await?;
            }
        },
        Commands::Export { output } => {
            export::run_export(&cfg, output.as_deref()).await?;
        }
        Commands::Stats => {
            stats::run_stats(&cfg).await?;
        }
    }

    Ok(())
}
