// src/resolve.rs

// dependencies
use crate::errors::{ServeError, StartupError};
use percent_encoding::percent_decode_str;
use std::fmt;
use std::path::{Component, Path, PathBuf};

// struct type which represents the canonical directory every response is confined to
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServeRoot {
    path: PathBuf,
}

// struct type which represents a decoded, lexically normalized request path
//
// Segments never contain `/`, are never empty and are never `.` or `..`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RequestPath {
    segments: Vec<String>,
}

// methods for the ServeRoot type
impl ServeRoot {
    // canonicalize the served directory, failing if it doesn't exist or isn't a directory
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StartupError> {
        let path = path.as_ref();
        let canonical = std::fs::canonicalize(path).map_err(|source| StartupError::Root {
            path: path.to_path_buf(),
            source,
        })?;

        if !canonical.is_dir() {
            return Err(StartupError::RootNotDirectory(canonical));
        }

        Ok(ServeRoot { path: canonical })
    }

    // utility to return the canonical root directory
    pub fn path(&self) -> &Path {
        &self.path
    }

    // component-wise containment, so `/served-evil` never matches `/served`
    pub fn contains(&self, real: &Path) -> bool {
        real.starts_with(&self.path)
    }

    // true when the part of `real` below the root names a dotfile or dot-directory,
    // e.g. the target of a visible link `env.txt -> .env`
    pub fn hides_dotfile(&self, real: &Path) -> bool {
        real.strip_prefix(&self.path).is_ok_and(|relative| {
            relative.components().any(|component| {
                matches!(component, Component::Normal(name) if name.to_string_lossy().starts_with('.'))
            })
        })
    }

    // join a request path onto the root without touching the filesystem
    pub fn join(&self, request: &RequestPath) -> Result<PathBuf, ServeError> {
        let mut full_path = self.path.clone();
        full_path.extend(request.segments());

        if !self.contains(&full_path) {
            return Err(ServeError::PathTraversal);
        }

        Ok(full_path)
    }

    // map a request path onto the real filesystem path it names, enforcing the root boundary
    // on the path obtained after symbolic links are resolved
    pub async fn locate(
        &self,
        request: &RequestPath,
        follow_symlinks_outside_root: bool,
    ) -> Result<PathBuf, ServeError> {
        let lexical = self.join(request)?;

        let real = tokio::fs::canonicalize(&lexical)
            .await
            .map_err(|err| ServeError::from_io(err, &lexical))?;

        if !self.contains(&real) && !follow_symlinks_outside_root {
            tracing::debug!(
                requested = %lexical.display(),
                real = %real.display(),
                "symbolic link points outside the served root"
            );
            return Err(ServeError::PathTraversal);
        }

        Ok(real)
    }
}

// methods for the RequestPath type
impl RequestPath {
    // decode and normalize the path component of a request URI
    pub fn parse(raw: &str) -> Result<Self, ServeError> {
        let decoded = percent_decode_str(raw)
            .decode_utf8()
            .map_err(|_| ServeError::InvalidEncoding)?;

        if decoded.contains('\0') {
            return Err(ServeError::InvalidEncoding);
        }

        let mut segments: Vec<String> = Vec::new();
        for segment in decoded.split('/') {
            match segment {
                "" | "." => continue,
                ".." => {
                    segments.pop().ok_or(ServeError::PathTraversal)?;
                }
                name => segments.push(name.to_owned()),
            }
        }

        Ok(RequestPath { segments })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    // true when any segment names a dotfile or dot-directory
    pub fn has_dotfile(&self) -> bool {
        self.segments.iter().any(|segment| segment.starts_with('.'))
    }

    pub fn file_name(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    pub fn parent(&self) -> Option<RequestPath> {
        let (_, parent) = self.segments.split_last()?;
        Some(RequestPath {
            segments: parent.to_vec(),
        })
    }

    pub fn child(&self, name: &str) -> RequestPath {
        let mut segments = self.segments.clone();
        segments.push(name.to_owned());
        RequestPath { segments }
    }
}

// decoded form, always starting with `/`
impl fmt::Display for RequestPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("/");
        }
        for segment in &self.segments {
            write!(f, "/{}", segment)?;
        }
        Ok(())
    }
}
