//! Error types for the mod host.
//!
//! Every failure is local and synchronous: it is reported to the caller of the
//! operation that triggered it (load, unload, emit) and never treated as fatal
//! for the host process.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModError {
    /// The chunk evaluated to something other than a table.
    #[error("mod code must return a table, got {found}")]
    InvalidManifestShape { found: String },

    /// The chunk raised an error while being evaluated.
    #[error("failed to evaluate mod source: {0}")]
    ManifestEvaluation(#[source] mlua::Error),

    #[error("mod manifest is missing a non-empty string `id`")]
    MissingId,

    #[error("mod must have a main() function")]
    MissingEntryPoint,

    /// An optional manifest field is present but has the wrong type.
    #[error("manifest field `{field}` must be {expected}, got {found}")]
    InvalidField {
        field: &'static str,
        expected: &'static str,
        found: String,
    },

    #[error("mod depends on \"{0}\", but \"{0}\" is not loaded")]
    UnsatisfiedDependency(String),

    /// Propagated from the mod's own `main`.
    #[error("main() of mod \"{id}\" failed: {source}")]
    EntryPointExecution {
        id: String,
        #[source]
        source: mlua::Error,
    },

    /// A cleanup action raised; the remaining actions were skipped.
    #[error("cleanup action #{index} of mod \"{id}\" failed: {source}")]
    CleanupExecution {
        id: String,
        index: usize,
        #[source]
        source: mlua::Error,
    },

    #[error("no mod with id \"{0}\" is loaded")]
    NotFound(String),

    #[error("failed to read mod source {path}: {source}")]
    ReadSource {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("host did not become ready within {0:?}")]
    ReadinessTimeout(std::time::Duration),

    #[error("Lua runtime error: {0}")]
    Lua(#[from] mlua::Error),
}

pub type ModResult<T> = Result<T, ModError>;

impl From<ModError> for mlua::Error {
    fn from(err: ModError) -> Self {
        mlua::Error::external(err)
    }
}

pub trait IntoAnyhow<T> {
    fn into_anyhow(self) -> anyhow::Result<T>;
}

impl<T> IntoAnyhow<T> for Result<T, mlua::Error> {
    fn into_anyhow(self) -> anyhow::Result<T> {
        self.map_err(|e| anyhow::anyhow!("{}", e))
    }
}

/// Lock a mutex, recovering the data if a previous holder panicked.
pub(crate) fn lock<'a, T>(mutex: &'a std::sync::Mutex<T>, what: &str) -> std::sync::MutexGuard<'a, T> {
    mutex.lock().unwrap_or_else(|poisoned| {
        log::warn!("{} mutex poisoned, recovering", what);
        poisoned.into_inner()
    })
}
