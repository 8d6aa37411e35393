use std::path::PathBuf;

use thiserror::Error;

/// Fatal error kinds. The first one raised aborts the whole run; `main`
/// prints the message to stderr and exits with code 1.
#[derive(Debug, Error)]
pub enum Error {
    #[error("usage error: {0}")]
    Usage(String),

    #[error("cannot read schema {path}: {reason}")]
    SchemaIo { path: PathBuf, reason: String },

    #[error("unresolved reference: {0}")]
    UnresolvedReference(String),

    #[error("unknown builtin: {0}")]
    UnknownBuiltin(String),

    #[error("name collision: {0}")]
    NameCollision(String),

    #[error("structural error: {0}")]
    Structural(String),

    #[error("cannot write output {path}: {reason}")]
    Output { path: PathBuf, reason: String },
}
