//! # Error Handling
//!
//! Domain errors shared by the storage, auth and API layers.

pub mod types;

pub use types::{ConflictKind, Error, Result};
