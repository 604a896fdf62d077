// src/config.rs

// dependencies
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// struct type which represents the immutable configuration of the file server,
// created once at startup and shared read-only by every request
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct ServeConfig {
    // directory whose contents are exposed, canonicalized when the server is built
    pub root_dir: PathBuf,
    // render an HTML listing for directories without an index file
    pub dir_listing: bool,
    // show and serve entries whose name starts with `.`
    pub dotfiles: bool,
    // attach `Access-Control-*` headers to every response
    pub cors: bool,
    // suppress the per-request log line; faults are logged regardless
    pub quiet: bool,
    // answer a directory with its `index.html` when one exists
    pub serve_index: bool,
    // report unreadable targets as 404 rather than 403
    pub conceal_unreadable: bool,
    // allow symbolic links whose real path lies outside `root_dir`
    pub follow_symlinks_outside_root: bool,
}

impl Default for ServeConfig {
    fn default() -> Self {
        ServeConfig {
            root_dir: PathBuf::from("."),
            dir_listing: true,
            dotfiles: true,
            cors: true,
            quiet: true,
            serve_index: true,
            conceal_unreadable: false,
            follow_symlinks_outside_root: false,
        }
    }
}

// methods for the ServeConfig type
impl ServeConfig {
    // create a configuration with default policies for the given root directory
    pub fn new<P: Into<PathBuf>>(root_dir: P) -> Self {
        ServeConfig {
            root_dir: root_dir.into(),
            ..ServeConfig::default()
        }
    }
}
