//! # Image Annotations
//!
//! A local-first image annotation tool: upload images, pin comments at
//! positions on them, and discuss each comment in a reply thread.
//!
//! The document model, the operations on it, and its persistence format
//! live in the `image-annotations-core` crate. This crate adds a SQLite
//! slot store, file uploads, and the `annot` CLI.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌──────────────┐   ┌──────────┐
//! │   Upload    │──▶│  Annotations │──▶│  SQLite   │
//! │ files→URIs  │   │  (reducer)   │   │ kv_store  │
//! └─────────────┘   └──────┬───────┘   └──────────┘
//!                          │
//!                          ▼
//!                     ┌──────────┐
//!                     │   CLI    │
//!                     │ (annot)  │
//!                     └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! annot init                          # create database
//! annot upload ./screenshots          # add every image under a directory
//! annot images                        # list images, * marks the selection
//! annot comment add --x 40 --y 25 "Logo is blurry"
//! annot reply add '#1' "Fixed in the next export"
//! annot show
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |
//! | [`sqlite_storage`] | SQLite implementation of the storage slot trait |
//! | [`session`] | Opens the annotation container over SQLite |
//! | [`upload`] | File reading, type detection, data URIs |
//! | [`progress`] | Upload progress reporting |
//! | [`gallery`] | `images` and `select` commands |
//! | [`annotate`] | `show`, `comment` and `reply` commands |
//! | [`export`] | JSON export |
//! | [`stats`] | Storage statistics |

pub mod annotate;
pub mod config;
pub mod db;
pub mod export;
pub mod gallery;
pub mod migrate;
pub mod progress;
pub mod session;
pub mod sqlite_storage;
pub mod stats;
pub mod upload;
