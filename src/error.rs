//! Error types for Unfurl.
//!
//! Every failure during playbook resolution is surfaced as a value of
//! [`Error`], carrying the human-readable context of the enclosing
//! reference (include path or role name) plus the original cause.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for Unfurl operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for Unfurl.
///
/// Any error aborts the entire enclosing resolution call; there is no
/// partial-success mode where plays or tasks are returned alongside an
/// error.
#[derive(Error, Debug)]
pub enum Error {
    /// The playbook document is not valid YAML.
    #[error("failed to parse YAML: {source}")]
    PlaybookParse {
        /// Underlying decode failure
        #[source]
        source: serde_yaml::Error,
    },

    /// An `include_tasks` directive carried a non-string value.
    #[error("include_tasks path must be a string (in '{path}')")]
    IncludePathNotString {
        /// File containing the offending record
        path: PathBuf,
    },

    /// An included task file could not be read.
    #[error("failed to read included task file '{path}': {source}")]
    IncludeRead {
        /// Path of the file the directive referenced
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// An included task file is not valid YAML.
    #[error("failed to parse included task file '{path}': {source}")]
    IncludeParse {
        /// Path of the file the directive referenced
        path: PathBuf,
        /// Underlying decode failure
        #[source]
        source: serde_yaml::Error,
    },

    /// A file re-entered the chain of includes currently being resolved.
    #[error("include cycle detected: '{path}' is already being resolved")]
    IncludeCycle {
        /// Path that appeared twice on the active include chain
        path: PathBuf,
    },

    /// A task record has more than one key that could name its module.
    #[error("task '{task}' in '{path}' has multiple module keys: {keys:?}")]
    AmbiguousModule {
        /// Task name ("" when the record has none)
        task: String,
        /// File containing the offending record
        path: PathBuf,
        /// The competing module-candidate keys, in document order
        keys: Vec<String>,
    },

    /// An `include_role` task has no usable `name` argument.
    #[error("include_role task is missing 'name'")]
    RoleNameMissing,

    /// A role's `tasks/main.yml` could not be read.
    #[error("failed to read role tasks '{path}': {source}")]
    RoleRead {
        /// Path of the role's task file
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// A role's `tasks/main.yml` is not valid YAML.
    #[error("failed to parse tasks YAML '{path}': {source}")]
    RoleParse {
        /// Path of the role's task file
        path: PathBuf,
        /// Underlying decode failure
        #[source]
        source: serde_yaml::Error,
    },

    /// A role referenced by `include_role` failed to resolve.
    #[error("failed to load role '{role}': {source}")]
    RoleLoad {
        /// Name of the role being inlined
        role: String,
        /// The failure that occurred while resolving the role
        #[source]
        source: Box<Error>,
    },

    /// Template rendering failed.
    #[error("template error: {0}")]
    Template(#[from] minijinja::Error),
}
