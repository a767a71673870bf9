//! Core traits for configuration abstraction.
//!
//! These traits define the extension points that applications embedding
//! Sakbe implement. The primary trait is [`ConfigProvider`], which abstracts
//! over where configuration comes from (a TOML file, environment variables,
//! or a test fixture).

use std::path::PathBuf;

use crate::Result;

/// Trait for application configuration.
///
/// Every Sakbe-based application implements this trait to provide the
/// settings the library crates need: project identity and the paths where
/// durable data lives.
///
/// # Bounds
///
/// - `Send + Sync`: Configuration must be shareable across threads
/// - `Clone`: Configuration can be duplicated for passing to subsystems
/// - `'static`: Configuration lifetime is not borrowed
///
/// # Example
///
/// ```
/// use std::path::PathBuf;
/// use sakbe_core::traits::ConfigProvider;
/// use sakbe_core::Result;
///
/// #[derive(Clone)]
/// struct DictionaryConfig {
///     data_dir: PathBuf,
/// }
///
/// impl ConfigProvider for DictionaryConfig {
///     fn project_name(&self) -> &str {
///         "dictionary"
///     }
///
///     fn base_path(&self) -> Result<PathBuf> {
///         Ok(self.data_dir.clone())
///     }
///
///     fn data_path(&self, kind: &str) -> Result<PathBuf> {
///         Ok(self.data_dir.join(kind))
///     }
/// }
/// ```
pub trait ConfigProvider: Send + Sync + Clone + 'static {
    /// The project name, used for env var prefixes and default paths.
    fn project_name(&self) -> &str;

    /// Base path for all project data.
    ///
    /// This is the root directory under which snapshots, caches, and any
    /// other generated files are stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the path cannot be determined (e.g., missing
    /// environment variable or invalid configuration).
    fn base_path(&self) -> Result<PathBuf>;

    /// Path for a specific kind of durable data.
    ///
    /// `kind` is an application-defined key like `"snapshots"` or
    /// `"models"`. The implementation decides how to map these to actual
    /// filesystem paths.
    ///
    /// # Errors
    ///
    /// Returns an error if the kind is unknown or the path cannot be
    /// resolved.
    fn data_path(&self, kind: &str) -> Result<PathBuf>;
}
