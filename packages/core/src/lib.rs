//! Arbor Core Business Logic Layer
//!
//! This crate provides the directory tree engine for the Arbor workspace
//! system: a virtual filesystem of folder and document nodes stored as a
//! flat adjacency list, with all structural facts (path, depth, child
//! count, subtree membership) derived on read and defended on write.
//!
//! # Architecture
//!
//! - **Flat adjacency storage**: every node row stores only its own
//!   identity and its parent's identity; the tree shape is recomputed
//! - **Snapshot-per-operation**: each service call reads the node list
//!   once, validates and traverses purely in memory, then writes
//! - **libsql/Turso**: embedded SQLite-compatible database behind the
//!   [`db::NodeStore`] trait, with storage-level constraints as the last
//!   line of defense against racing writers
//!
//! # Modules
//!
//! - [`models`] - Data structures (Node, NodeKind, TreeNode)
//! - [`tree`] - Pure tree algorithms (materialization, subtree walks,
//!   identity reissue, mutation guards)
//! - [`services`] - TreeService orchestration and error taxonomy
//! - [`db`] - Database layer with libsql integration

pub mod db;
pub mod models;
pub mod services;
pub mod tree;

// Re-export commonly used types
pub use models::*;
pub use services::*;
