// src/file_response.rs

// dependencies
use crate::body::{self, Body};
use crate::errors::ServeError;
use crate::metadata::FileMeta;
use crate::range::{ByteRange, parse_range};
use httpdate::HttpDate;
use hyper::header::{self, HeaderMap, HeaderValue};
use hyper::{Response, StatusCode};
use std::io::SeekFrom;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::io::{AsyncReadExt, AsyncSeekExt};

// struct type which represents the validators computed for one version of a file
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Validators {
    pub etag: String,
    pub last_modified: Option<HttpDate>,
}

// methods for the Validators type
impl Validators {
    // derive the entity tag from size and modification time
    pub fn for_file(size: u64, modified: Option<SystemTime>) -> Self {
        let nanos = modified
            .and_then(|time| time.duration_since(UNIX_EPOCH).ok())
            .map_or(0, |elapsed| elapsed.as_nanos());

        Validators {
            etag: format!("W/\"{:x}-{:x}\"", size, nanos),
            last_modified: modified.map(HttpDate::from),
        }
    }

    // true when the request's preconditions say the client already holds this version
    pub fn is_not_modified(&self, headers: &HeaderMap) -> bool {
        // If-None-Match takes precedence over If-Modified-Since
        if let Some(if_none_match) = header_str(headers, header::IF_NONE_MATCH) {
            return etag_list_matches(if_none_match, &self.etag);
        }

        match (header_str(headers, header::IF_MODIFIED_SINCE), self.last_modified) {
            (Some(since), Some(last_modified)) => since
                .parse::<HttpDate>()
                .is_ok_and(|since| SystemTime::from(last_modified) <= SystemTime::from(since)),
            _ => false,
        }
    }

    // true when a Range header may be honoured; an If-Range naming another version disables it
    pub fn if_range_allows(&self, headers: &HeaderMap) -> bool {
        let Some(if_range) = header_str(headers, header::IF_RANGE) else {
            return true;
        };
        let if_range = if_range.trim();

        if if_range.starts_with('"') || if_range.starts_with("W/") {
            // a weak tag can't validate a partial response
            return !self.etag.starts_with("W/") && if_range == self.etag;
        }

        match (if_range.parse::<HttpDate>(), self.last_modified) {
            (Ok(date), Some(last_modified)) => {
                SystemTime::from(last_modified) == SystemTime::from(date)
            }
            _ => false,
        }
    }
}

// build the response for a regular file: 304, 206, 416 or the whole file streamed;
// with `head_only` the headers are computed but the file is never opened
pub async fn respond(
    meta: &FileMeta,
    headers: &HeaderMap,
    head_only: bool,
) -> Result<Response<Body>, ServeError> {
    let validators = Validators::for_file(meta.size, meta.modified);

    if validators.is_not_modified(headers) {
        let mut response = Response::new(body::empty());
        *response.status_mut() = StatusCode::NOT_MODIFIED;
        insert_validators(response.headers_mut(), &validators)?;
        return Ok(response);
    }

    let range = if validators.if_range_allows(headers) {
        parse_range(header_str(headers, header::RANGE), meta.size)?
    } else {
        None
    };

    let (status, span) = match range {
        Some(range) => (StatusCode::PARTIAL_CONTENT, range),
        None if meta.size == 0 => {
            let mut response = Response::new(body::empty());
            insert_entity_headers(response.headers_mut(), meta, &validators, 0)?;
            return Ok(response);
        }
        None => (
            StatusCode::OK,
            ByteRange {
                start: 0,
                end: meta.size - 1,
            },
        ),
    };

    let body = if head_only {
        body::empty()
    } else {
        open_span(meta, span).await?
    };

    let mut response = Response::new(body);
    *response.status_mut() = status;
    insert_entity_headers(response.headers_mut(), meta, &validators, span.len())?;
    if status == StatusCode::PARTIAL_CONTENT {
        response.headers_mut().insert(
            header::CONTENT_RANGE,
            header_value(&span.content_range(meta.size))?,
        );
    }

    Ok(response)
}

// open the file and stream exactly the bytes of `span`
async fn open_span(meta: &FileMeta, span: ByteRange) -> Result<Body, ServeError> {
    // the file may have vanished since it was inspected
    let mut file = tokio::fs::File::open(&meta.path)
        .await
        .map_err(|err| ServeError::from_io(err, &meta.path))?;

    if span.start > 0 {
        file.seek(SeekFrom::Start(span.start)).await?;
    }

    Ok(body::stream(file.take(span.len())))
}

fn insert_entity_headers(
    headers: &mut HeaderMap,
    meta: &FileMeta,
    validators: &Validators,
    content_length: u64,
) -> Result<(), ServeError> {
    headers.insert(
        header::CONTENT_TYPE,
        header_value(meta.content_type.essence_str())?,
    );
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(content_length));
    headers.insert(header::ACCEPT_RANGES, HeaderValue::from_static("bytes"));
    insert_validators(headers, validators)
}

fn insert_validators(headers: &mut HeaderMap, validators: &Validators) -> Result<(), ServeError> {
    headers.insert(header::ETAG, header_value(&validators.etag)?);
    if let Some(last_modified) = validators.last_modified {
        headers.insert(header::LAST_MODIFIED, header_value(&last_modified.to_string())?);
    }
    Ok(())
}

// weak comparison against a comma-separated If-None-Match list
fn etag_list_matches(list: &str, etag: &str) -> bool {
    let opaque = |tag: &str| tag.trim().trim_start_matches("W/").to_owned();
    let current = opaque(etag);

    list.split(',')
        .map(str::trim)
        .any(|candidate| candidate == "*" || opaque(candidate) == current)
}

fn header_str(headers: &HeaderMap, name: header::HeaderName) -> Option<&str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

fn header_value(value: &str) -> Result<HeaderValue, ServeError> {
    HeaderValue::from_str(value).map_err(|err| ServeError::Internal(std::io::Error::other(err)))
}
