// src/listing.rs

// dependencies
use crate::errors::ServeError;
use crate::resolve::{RequestPath, ServeRoot};
use html_escape::encode_text;
use httpdate::HttpDate;
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use std::cmp::Ordering;
use std::path::Path;
use std::time::SystemTime;

// characters escaped inside one path segment of an href
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'&')
    .add(b'\'')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'\\')
    .add(b'`')
    .add(b'{')
    .add(b'}');

const SIZE_UNITS: [&str; 6] = ["B", "KiB", "MiB", "GiB", "TiB", "PiB"];

// enum type which represents what kind of filesystem object a listing entry is
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
    Symlink { to_dir: bool },
}

// struct type which represents one row of a directory listing
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListingEntry {
    pub name: String,
    pub kind: EntryKind,
    pub size: Option<u64>,
    pub modified: Option<SystemTime>,
}

// methods for the ListingEntry type
impl ListingEntry {
    pub fn is_dir_like(&self) -> bool {
        matches!(
            self.kind,
            EntryKind::Directory | EntryKind::Symlink { to_dir: true }
        )
    }
}

// read the direct children of `dir`, sorted for display
//
// A symlink is listed only when direct access would serve it: its real path must stay
// inside `root` (unless `follow_outside`) and must not be hidden by the dotfile policy.
pub async fn read_entries(
    dir: &Path,
    root: &ServeRoot,
    show_dotfiles: bool,
    follow_outside: bool,
) -> Result<Vec<ListingEntry>, ServeError> {
    let mut read_dir = tokio::fs::read_dir(dir)
        .await
        .map_err(|err| ServeError::from_io(err, dir))?;

    let mut entries = Vec::new();
    while let Some(entry) = read_dir
        .next_entry()
        .await
        .map_err(|err| ServeError::from_io(err, dir))?
    {
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        if !show_dotfiles && name.starts_with('.') {
            continue;
        }

        let Ok(file_type) = entry.file_type().await else {
            continue;
        };

        let entry = if file_type.is_symlink() {
            // a dangling link is still listed, without metadata
            let target = match tokio::fs::canonicalize(entry.path()).await {
                Ok(real) => {
                    if !follow_outside && !root.contains(&real) {
                        continue;
                    }
                    if !show_dotfiles && root.hides_dotfile(&real) {
                        continue;
                    }
                    tokio::fs::metadata(&real).await.ok()
                }
                Err(_) => None,
            };
            ListingEntry {
                name,
                kind: EntryKind::Symlink {
                    to_dir: target.as_ref().is_some_and(|meta| meta.is_dir()),
                },
                size: target.as_ref().filter(|meta| meta.is_file()).map(|meta| meta.len()),
                modified: target.and_then(|meta| meta.modified().ok()),
            }
        } else {
            let Ok(meta) = entry.metadata().await else {
                continue;
            };
            ListingEntry {
                name,
                kind: if meta.is_dir() {
                    EntryKind::Directory
                } else {
                    EntryKind::File
                },
                size: meta.is_file().then(|| meta.len()),
                modified: meta.modified().ok(),
            }
        };
        entries.push(entry);
    }

    sort_entries(&mut entries);
    Ok(entries)
}

// directories (and links to them) first, then everything else; ordinal name order within each group
pub fn sort_entries(entries: &mut [ListingEntry]) {
    entries.sort_by(|a, b| match (a.is_dir_like(), b.is_dir_like()) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        _ => a.name.cmp(&b.name),
    });
}

// render the listing page for the directory at `request`
pub fn render(request: &RequestPath, entries: &[ListingEntry]) -> String {
    let title = encode_text(&display_path(request)).into_owned();

    let mut rows = String::new();
    if let Some(parent) = request.parent() {
        rows.push_str(&format!(
            "<tr><td><a href=\"{}\">../</a></td><td>-</td><td></td></tr>\n",
            dir_href(&parent)
        ));
    }

    for entry in entries {
        let suffix = if entry.is_dir_like() { "/" } else { "" };
        let child = request.child(&entry.name);
        let href = if entry.is_dir_like() {
            dir_href(&child)
        } else {
            file_href(&child)
        };
        let size = entry.size.map_or_else(|| "-".to_owned(), human_size);
        let modified = entry
            .modified
            .map(|time| HttpDate::from(time).to_string())
            .unwrap_or_default();

        rows.push_str(&format!(
            "<tr><td><a href=\"{}\">{}{}</a></td><td>{}</td><td>{}</td></tr>\n",
            href,
            encode_text(&entry.name),
            suffix,
            size,
            modified
        ));
    }

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Index of {title}</title>
<style>
body {{ font-family: system-ui, sans-serif; margin: 1.5rem; }}
table {{ border-collapse: collapse; }}
th, td {{ padding: 0.25rem 1rem; text-align: left; }}
td:nth-child(2) {{ text-align: right; font-variant-numeric: tabular-nums; }}
</style>
</head>
<body>
<h1>Index of {title}</h1>
<table>
<thead><tr><th>Name</th><th>Size</th><th>Modified</th></tr></thead>
<tbody>
{rows}</tbody>
</table>
</body>
</html>
"#
    )
}

// format a byte count with binary units, e.g. `1.5 KiB`
pub fn human_size(bytes: u64) -> String {
    if bytes < 1024 {
        return format!("{} B", bytes);
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", value, SIZE_UNITS[unit])
}

fn display_path(request: &RequestPath) -> String {
    if request.is_root() {
        "/".to_owned()
    } else {
        format!("{}/", request)
    }
}

fn file_href(request: &RequestPath) -> String {
    let mut href = String::new();
    for segment in request.segments() {
        href.push('/');
        href.extend(utf8_percent_encode(segment, SEGMENT));
    }
    if href.is_empty() {
        href.push('/');
    }
    href
}

fn dir_href(request: &RequestPath) -> String {
    if request.is_root() {
        return "/".to_owned();
    }
    format!("{}/", file_href(request))
}
