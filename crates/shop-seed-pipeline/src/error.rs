use shop_seed_core::EntityKind;
use thiserror::Error;

/// Failure reported by the persistence gateway for a single operation.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("store error: {0}")]
    Store(String),
    #[error("store executor channel closed")]
    ChannelClosed,
    #[error("store result type mismatch")]
    TypeMismatch,
}

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("network error: {0}")]
    Network(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("download task failed: {0}")]
    Task(String),
    #[error("refusing to store asset under `{0}`")]
    UnsafeFileName(String),
}

#[derive(Debug, Error)]
pub enum RewriteError {
    #[error("output directory does not exist: {0}")]
    MissingRoot(String),
    #[error("failed to walk {path}: {message}")]
    Walk { path: String, message: String },
    #[error("io error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("rewrite task failed: {0}")]
    Task(String),
}

/// Errors that end a seed run early.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("could not persist {kind} `{key}`: {source}")]
    FatalDependency {
        kind: EntityKind,
        key: String,
        #[source]
        source: GatewayError,
    },
}
