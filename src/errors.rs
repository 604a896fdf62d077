// src/errors.rs

// dependencies
use hyper::StatusCode;
use std::path::PathBuf;
use thiserror::Error;

// enum type to represent an error raised while handling a single request
#[derive(Debug, Error)]
pub enum ServeError {
    #[error("request path is not valid percent-encoded UTF-8")]
    InvalidEncoding,

    #[error("request path escapes the served root")]
    PathTraversal,

    #[error("file not found")]
    NotFound,

    #[error("permission denied while reading {0}")]
    Unreadable(PathBuf),

    #[error("directory listing is disabled")]
    Forbidden,

    #[error("requested range cannot be satisfied for a file of {size} bytes")]
    UnsatisfiableRange { size: u64 },

    #[error("method not allowed")]
    MethodNotAllowed,

    #[error("internal I/O error: {0}")]
    Internal(#[from] std::io::Error),
}

// methods for the ServeError type
impl ServeError {
    // map the error onto the status code sent to the client
    pub fn status_code(&self, conceal_unreadable: bool) -> StatusCode {
        match self {
            ServeError::InvalidEncoding | ServeError::PathTraversal => StatusCode::BAD_REQUEST,
            ServeError::NotFound => StatusCode::NOT_FOUND,
            ServeError::Unreadable(_) if conceal_unreadable => StatusCode::NOT_FOUND,
            ServeError::Unreadable(_) | ServeError::Forbidden => StatusCode::FORBIDDEN,
            ServeError::UnsatisfiableRange { .. } => StatusCode::RANGE_NOT_SATISFIABLE,
            ServeError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ServeError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    // classify an I/O error hit while touching the filesystem for a request
    pub fn from_io(err: std::io::Error, path: &std::path::Path) -> Self {
        use std::io::ErrorKind;
        match err.kind() {
            ErrorKind::NotFound | ErrorKind::NotADirectory => ServeError::NotFound,
            ErrorKind::PermissionDenied => ServeError::Unreadable(path.to_path_buf()),
            _ => ServeError::Internal(err),
        }
    }
}

// enum type to represent a fatal error raised before the server starts accepting requests
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("served directory {path:?} is unusable: {source}")]
    Root {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("served path {0:?} is not a directory")]
    RootNotDirectory(PathBuf),

    #[error("--key and --cert are required for TLS")]
    IncompleteTls,

    #[error("couldn't load TLS material from {path:?}: {reason}")]
    Tls { path: PathBuf, reason: String },

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        source: std::io::Error,
    },
}
