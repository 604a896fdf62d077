// src/static_server.rs

// dependencies
use crate::body::{self, Body};
use crate::config::ServeConfig;
use crate::errors::{ServeError, StartupError};
use crate::file_response;
use crate::listing;
use crate::metadata::{TargetKind, inspect};
use crate::resolve::{RequestPath, ServeRoot};
use hyper::header::{self, HeaderMap, HeaderValue};
use hyper::{Method, Request, Response, StatusCode};
use std::path::{Path, PathBuf};

const INDEX_FILE: &str = "index.html";
const ALLOWED_METHODS: &str = "GET, HEAD, OPTIONS";
const CORS_ALLOW_HEADERS: &str = "Origin, X-Requested-With, Content-Type, Accept, Range";
const CORS_EXPOSE_HEADERS: &str = "Content-Length, Content-Range, ETag, Last-Modified, Accept-Ranges";

// struct type which represents the request dispatcher for one served directory
//
// Holds only immutable state, so a single instance is shared by every connection.
#[derive(Clone, Debug)]
pub struct StaticServer {
    config: ServeConfig,
    root: ServeRoot,
}

// methods for the StaticServer type
impl StaticServer {
    // create the dispatcher from its configuration, canonicalizing the served root
    pub fn from_config(mut config: ServeConfig) -> Result<Self, StartupError> {
        let root = ServeRoot::new(&config.root_dir)?;
        config.root_dir = root.path().to_path_buf();
        Ok(StaticServer { config, root })
    }

    // handle one request; every error becomes a response and the request body is dropped unread
    pub async fn serve<B>(&self, request: Request<B>) -> Response<Body> {
        let (parts, _) = request.into_parts();
        let method = &parts.method;
        let head_only = *method == Method::HEAD;
        let mut resolved: Option<PathBuf> = None;

        let result = match *method {
            Method::GET | Method::HEAD => {
                self.dispatch(parts.uri.path(), &parts.headers, head_only, &mut resolved)
                    .await
            }
            Method::OPTIONS if self.config.cors => Ok(preflight_response()),
            _ => Err(ServeError::MethodNotAllowed),
        };

        let log_path = resolved
            .as_deref()
            .map(|path| path.display().to_string())
            .unwrap_or_else(|| parts.uri.path().to_owned());

        let mut response = match result {
            Ok(response) => response,
            Err(err) => {
                match &err {
                    ServeError::Internal(source) => {
                        tracing::error!(%method, path = %log_path, error = %source, "request failed");
                    }
                    ServeError::Unreadable(path) => {
                        tracing::warn!(%method, path = %path.display(), "permission denied");
                    }
                    _ => {}
                }
                self.error_response(&err, head_only)
            }
        };

        if self.config.cors {
            apply_cors(response.headers_mut());
        }

        if !self.config.quiet {
            tracing::info!(
                %method,
                path = %log_path,
                status = response.status().as_u16(),
                "request"
            );
        }

        response
    }

    // resolve -> inspect -> (listing | file)
    async fn dispatch(
        &self,
        raw_path: &str,
        headers: &HeaderMap,
        head_only: bool,
        resolved: &mut Option<PathBuf>,
    ) -> Result<Response<Body>, ServeError> {
        let request_path = RequestPath::parse(raw_path)?;

        if !self.config.dotfiles && request_path.has_dotfile() {
            return Err(ServeError::NotFound);
        }

        let real_path = self
            .root
            .locate(&request_path, self.config.follow_symlinks_outside_root)
            .await?;
        *resolved = Some(real_path.clone());

        // a visible name may still link to a hidden one
        if !self.config.dotfiles && self.root.hides_dotfile(&real_path) {
            return Err(ServeError::NotFound);
        }

        let type_hint = Path::new(request_path.file_name().unwrap_or_default());
        match inspect(&real_path, type_hint).await? {
            TargetKind::RegularFile(meta) => file_response::respond(&meta, headers, head_only).await,
            TargetKind::Directory => {
                self.serve_directory(&request_path, &real_path, headers, head_only, resolved)
                    .await
            }
            TargetKind::NotFound => Err(ServeError::NotFound),
            TargetKind::Unreadable => Err(ServeError::Unreadable(real_path)),
        }
    }

    // answer a directory with its index file, a listing, or Forbidden
    async fn serve_directory(
        &self,
        request_path: &RequestPath,
        dir: &Path,
        headers: &HeaderMap,
        head_only: bool,
        resolved: &mut Option<PathBuf>,
    ) -> Result<Response<Body>, ServeError> {
        if self.config.serve_index || !self.config.dir_listing {
            let index_request = request_path.child(INDEX_FILE);
            match self
                .root
                .locate(&index_request, self.config.follow_symlinks_outside_root)
                .await
            {
                Ok(index_path) if self.config.dotfiles || !self.root.hides_dotfile(&index_path) => {
                    if let TargetKind::RegularFile(meta) =
                        inspect(&index_path, Path::new(INDEX_FILE)).await?
                    {
                        *resolved = Some(index_path);
                        return file_response::respond(&meta, headers, head_only).await;
                    }
                }
                Err(ServeError::Internal(err)) => return Err(ServeError::Internal(err)),
                _ => {}
            }
        }

        if !self.config.dir_listing {
            return Err(ServeError::Forbidden);
        }

        let entries = listing::read_entries(
            dir,
            &self.root,
            self.config.dotfiles,
            self.config.follow_symlinks_outside_root,
        )
        .await?;
        let page = listing::render(request_path, &entries);

        let content_length = page.len();

        let mut response = Response::new(if head_only {
            body::empty()
        } else {
            body::full(page)
        });
        let headers = response.headers_mut();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/html; charset=utf-8"),
        );
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(content_length));
        Ok(response)
    }

    // build the client-facing response for a failed request
    fn error_response(&self, err: &ServeError, head_only: bool) -> Response<Body> {
        let status = err.status_code(self.config.conceal_unreadable);
        let message = format!(
            "{} {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or_default()
        );

        let content_length = message.len();

        let mut response = Response::new(if head_only {
            body::empty()
        } else {
            body::full(message)
        });
        *response.status_mut() = status;

        let headers = response.headers_mut();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        );
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(content_length));

        match err {
            ServeError::UnsatisfiableRange { size } => {
                if let Ok(value) = HeaderValue::from_str(&format!("bytes */{}", size)) {
                    headers.insert(header::CONTENT_RANGE, value);
                }
            }
            ServeError::MethodNotAllowed => {
                headers.insert(header::ALLOW, HeaderValue::from_static(ALLOWED_METHODS));
            }
            _ => {}
        }

        response
    }

    // utility to return the configuration snapshot
    pub fn config(&self) -> &ServeConfig {
        &self.config
    }

    // utility to return the canonical served root
    pub fn root_dir(&self) -> &Path {
        self.root.path()
    }
}

fn preflight_response() -> Response<Body> {
    let mut response = Response::new(body::empty());
    *response.status_mut() = StatusCode::NO_CONTENT;
    response.headers_mut().insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOWED_METHODS),
    );
    response
}

// helper function to attach the cross-origin headers to any response
fn apply_cors(headers: &mut HeaderMap) {
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(CORS_ALLOW_HEADERS),
    );
    headers.insert(
        header::ACCESS_CONTROL_EXPOSE_HEADERS,
        HeaderValue::from_static(CORS_EXPOSE_HEADERS),
    );
}
