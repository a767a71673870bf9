//! Command-line interface for the Sakbe semantic index.
//!
//! The `sakbe` binary wraps [`sakbe_service::SemanticIndexService`] behind a
//! clap-based CLI: documents go in with `add` and `ingest`, come back out
//! ranked with `search`, and the `config` subcommands manage the TOML file
//! that every invocation loads.
//!
//! Each invocation is short-lived. Mutating commands close the service on the
//! way out so snapshots and the embedding cache land on disk; read-only
//! commands just reopen from the last snapshot pair.

pub mod app;
pub mod cli;
pub mod config;
pub mod config_handlers;

pub use app::SakbeApp;
pub use cli::{Command, ConfigAction, ConfigCommand, SakbeArgs};
pub use config::SakbeConfig;
