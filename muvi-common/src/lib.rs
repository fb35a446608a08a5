//! # MUVI Common Library
//!
//! Shared code for the MUVI client crates:
//! - Catalog models (Movie, Genre, favorites and upload payloads)
//! - Error taxonomy
//! - Configuration resolution
//! - Client event bus

pub mod config;
pub mod error;
pub mod events;
pub mod models;

pub use error::{Error, FieldErrors, IdentityErrorKind, Result};
pub use models::{Genre, Movie};
