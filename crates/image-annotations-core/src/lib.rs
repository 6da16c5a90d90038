//! # Image Annotations Core
//!
//! Shared, WASM-safe logic for Image Annotations: the document model, the
//! operation catalogue, pure state transitions, the storage abstraction,
//! the persistence adapter, and view projections.
//!
//! This crate contains no tokio, sqlx, or filesystem I/O. Ids and
//! timestamps come from a [`reducer::Minter`], so hosts without a system
//! clock or RNG can supply their own.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`models`] | Images, comments, replies, and the application state |
//! | [`action`] | The nine operations and rejection reasons |
//! | [`reducer`] | Pure `(state, action) -> state` transitions |
//! | [`storage`] | Key-value slot trait and in-memory backend |
//! | [`persist`] | Versioned load/save of the whole document |
//! | [`container`] | State owner that saves after every applied action |
//! | [`view`] | Marker numbering, gallery, selection helpers |

pub mod action;
pub mod container;
pub mod models;
pub mod persist;
pub mod reducer;
pub mod storage;
pub mod view;
