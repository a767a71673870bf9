//! Shared utilities.

pub mod ids;
