//! Sakbe Core — shared types, traits, errors, and utilities.
//!
//! This crate provides the foundational types used across all Sakbe crates.
//! It has no internal Sakbe dependencies (dependency level 0).
//!
//! # Modules
//!
//! - [`error`]: Error types and Result alias
//! - [`traits`]: Configuration abstraction
//! - [`util`]: Text normalization and ID utilities

#![doc = include_str!("../README.md")]

pub mod error;
pub mod traits;
pub mod util;

// Re-export key types at crate root for convenience
pub use error::{Error, Result};
pub use traits::ConfigProvider;

// Convenience re-exports from util
pub use util::ids::{document_id, normalize_language, normalize_text, short_hash};
