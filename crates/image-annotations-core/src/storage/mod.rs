//! Key-value storage abstraction for the persisted document.
//!
//! The [`Storage`] trait models a string-keyed, string-valued slot store in
//! the shape of browser local storage. Backends are pluggable: the
//! in-memory store here (tests, WASM), and a SQLite-backed store in the
//! `image-annotations` crate.
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;

/// Abstract slot store.
///
/// All operations are async (via `async-trait`) so that native backends can
/// do real I/O. In-memory implementations return immediately-ready futures.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`get_item`](Storage::get_item) | Read the value stored under a key |
/// | [`set_item`](Storage::set_item) | Write (replace) the value under a key |
#[async_trait]
pub trait Storage: Send + Sync {
    /// Returns `None` when nothing is stored under `key`.
    async fn get_item(&self, key: &str) -> Result<Option<String>>;

    async fn set_item(&self, key: &str, value: &str) -> Result<()>;
}
