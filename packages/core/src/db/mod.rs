//! Database Layer
//!
//! This module handles all persistence using libsql/Turso:
//!
//! - Database initialization and connection management
//! - Flat adjacency `nodes` table with a seeded root row
//! - Storage-level constraints (unique sibling names, restricted parent
//!   deletes) as the last line of defense behind the in-memory guards
//!
//! The [`NodeStore`] trait is the sole I/O boundary consumed by the
//! service layer; [`TursoStore`] is its libsql implementation.

mod database;
mod error;
mod node_store;
mod turso_store;

pub use database::{DatabaseService, DbNodeParams};
pub use error::DatabaseError;
pub use node_store::NodeStore;
pub use turso_store::TursoStore;
