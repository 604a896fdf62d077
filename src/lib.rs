// src/lib.rs

// module declarations
pub mod body;
pub mod cli;
pub mod config;
pub mod errors;
pub mod file_response;
pub mod listing;
pub mod metadata;
pub mod range;
pub mod resolve;
pub mod server;
pub mod static_server;
pub mod urls;

// re-exports
pub use config::*;
pub use errors::*;
pub use server::{ListenConfig, Server, TlsFiles};
pub use static_server::*;
