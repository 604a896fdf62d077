// src/metadata.rs

// dependencies
use crate::errors::ServeError;
use mime_guess::Mime;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

// struct type which represents what the responder needs to know about a regular file
#[derive(Clone, Debug)]
pub struct FileMeta {
    pub path: PathBuf,
    pub size: u64,
    pub modified: Option<SystemTime>,
    pub content_type: Mime,
}

// enum type which represents what a resolved path turned out to be on disk
#[derive(Debug)]
pub enum TargetKind {
    RegularFile(FileMeta),
    Directory,
    NotFound,
    Unreadable,
}

// stat `path`, following symbolic links; the content type comes from `type_hint`,
// the name the client asked for, and special files count as not found
pub async fn inspect(path: &Path, type_hint: &Path) -> Result<TargetKind, ServeError> {
    let metadata = match tokio::fs::metadata(path).await {
        Ok(metadata) => metadata,
        Err(err) => {
            return match err.kind() {
                ErrorKind::NotFound | ErrorKind::NotADirectory => Ok(TargetKind::NotFound),
                ErrorKind::PermissionDenied => Ok(TargetKind::Unreadable),
                _ => Err(ServeError::Internal(err)),
            };
        }
    };

    if metadata.is_dir() {
        return Ok(TargetKind::Directory);
    }

    if !metadata.is_file() {
        return Ok(TargetKind::NotFound);
    }

    Ok(TargetKind::RegularFile(FileMeta {
        path: path.to_path_buf(),
        size: metadata.len(),
        modified: metadata.modified().ok(),
        content_type: guess_mime_type(type_hint),
    }))
}

// helper function to guess the mime type from a file's extension
pub fn guess_mime_type(path: &Path) -> Mime {
    mime_guess::from_path(path).first_or_octet_stream()
}
