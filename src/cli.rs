// src/cli.rs

// dependencies
use crate::config::ServeConfig;
use crate::errors::StartupError;
use crate::server::{ListenConfig, TlsFiles};
use clap::Parser;
use std::path::PathBuf;

// struct type which represents the command line of the server binary
#[derive(Debug, Parser)]
#[command(
    name = "static_serve",
    version,
    about = "Serves a local directory over HTTP(S)",
    after_help = "Both --cert and --key are required when one is provided."
)]
pub struct CliArgs {
    /// Directory to serve
    #[arg(env = "STATIC_SERVE_ROOT", default_value = ".")]
    pub path: PathBuf,

    /// Port to listen on
    #[arg(short, long, env = "STATIC_SERVE_PORT", default_value_t = 4507)]
    pub port: u16,

    /// Address to listen on (0.0.0.0 listens on every interface)
    #[arg(long, env = "STATIC_SERVE_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// TLS certificate chain in PEM format (enables TLS)
    #[arg(short, long, env = "STATIC_SERVE_CERT", value_name = "FILE")]
    pub cert: Option<PathBuf>,

    /// TLS private key in PEM format (enables TLS)
    #[arg(short, long, env = "STATIC_SERVE_KEY", value_name = "FILE")]
    pub key: Option<PathBuf>,

    /// Disable directory listing
    #[arg(long = "no-dir-listing", overrides_with = "dir_listing")]
    no_dir_listing: bool,

    #[arg(long = "dir-listing", overrides_with = "no_dir_listing", hide = true)]
    dir_listing: bool,

    /// Do not show or serve dotfiles
    #[arg(long = "no-dotfiles", overrides_with = "dotfiles")]
    no_dotfiles: bool,

    #[arg(long = "dotfiles", overrides_with = "no_dotfiles", hide = true)]
    dotfiles: bool,

    /// Disable cross-origin resource sharing headers
    #[arg(long = "no-cors", overrides_with = "cors")]
    no_cors: bool,

    /// Enable CORS via the "Access-Control-Allow-Origin" header (default)
    #[arg(long = "cors", overrides_with = "no_cors")]
    cors: bool,

    /// List directories even when they contain an index.html
    #[arg(long = "no-index")]
    no_index: bool,

    /// Answer unreadable files with 404 instead of 403
    #[arg(long)]
    pub conceal_unreadable: bool,

    /// Serve symbolic links that point outside the served directory
    #[arg(long)]
    pub follow_symlinks: bool,

    /// Print request level logs
    #[arg(short, long)]
    pub verbose: bool,
}

// methods for the CliArgs type
impl CliArgs {
    // split the command line into the request-handling and the listener configuration
    pub fn into_configs(self) -> Result<(ServeConfig, ListenConfig), StartupError> {
        let tls = match (self.cert, self.key) {
            (Some(cert), Some(key)) => Some(TlsFiles { cert, key }),
            (None, None) => None,
            _ => return Err(StartupError::IncompleteTls),
        };

        let serve = ServeConfig {
            root_dir: self.path,
            dir_listing: self.dir_listing || !self.no_dir_listing,
            dotfiles: self.dotfiles || !self.no_dotfiles,
            cors: self.cors || !self.no_cors,
            quiet: !self.verbose,
            serve_index: !self.no_index,
            conceal_unreadable: self.conceal_unreadable,
            follow_symlinks_outside_root: self.follow_symlinks,
        };

        let listen = ListenConfig {
            host: self.host,
            port: self.port,
            tls,
        };

        Ok((serve, listen))
    }
}
