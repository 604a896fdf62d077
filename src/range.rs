// src/range.rs

// dependencies
use crate::errors::ServeError;

// struct type to represent an inclusive span of bytes within a file
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

// methods for the ByteRange type
impl ByteRange {
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    // value for the Content-Range header of a 206 response
    pub fn content_range(&self, size: u64) -> String {
        format!("bytes {}-{}/{}", self.start, self.end, size)
    }
}

// parse a `Range` header against a file of `size` bytes; `Ok(None)` means serve the
// whole file (absent, malformed or multi-range header)
pub fn parse_range(header: Option<&str>, size: u64) -> Result<Option<ByteRange>, ServeError> {
    let Some(header) = header else {
        return Ok(None);
    };
    let Some(range_set) = header.trim().strip_prefix("bytes=") else {
        return Ok(None);
    };
    if range_set.contains(',') {
        return Ok(None);
    }
    let Some((start_part, end_part)) = range_set.trim().split_once('-') else {
        return Ok(None);
    };
    let (start_part, end_part) = (start_part.trim(), end_part.trim());

    let unsatisfiable = ServeError::UnsatisfiableRange { size };

    // suffix form: the last N bytes
    if start_part.is_empty() {
        let Ok(suffix) = end_part.parse::<u64>() else {
            return Ok(None);
        };
        if suffix == 0 || size == 0 {
            return Err(unsatisfiable);
        }
        return Ok(Some(ByteRange {
            start: size.saturating_sub(suffix),
            end: size - 1,
        }));
    }

    let Ok(start) = start_part.parse::<u64>() else {
        return Ok(None);
    };
    let end = if end_part.is_empty() {
        None
    } else {
        match end_part.parse::<u64>() {
            Ok(end) if end >= start => Some(end),
            _ => return Ok(None),
        }
    };

    if start >= size {
        return Err(unsatisfiable);
    }

    let last = size - 1;
    Ok(Some(ByteRange {
        start,
        end: end.map_or(last, |end| end.min(last)),
    }))
}
