//! Business Services
//!
//! This module contains the orchestration layer of the engine:
//!
//! - `TreeService` - the public tree operations (list, subtree view,
//!   create, rename, move, duplicate, delete), each validated against a
//!   point-in-time snapshot before any write
//! - `TreeServiceError` / `ErrorKind` - the HTTP-agnostic failure
//!   taxonomy transport layers map to status codes
//!
//! Services coordinate between the pure tree algorithms and the store,
//! implementing business rules and orchestrating complex operations.

pub mod error;
pub mod tree_service;

pub use error::{ErrorKind, TreeServiceError};
pub use tree_service::{TreeService, TreeServiceConfig};
