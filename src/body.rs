// src/body.rs

// dependencies
use bytes::Bytes;
use futures_util::TryStreamExt;
use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Empty, Full, StreamBody};
use hyper::body::Frame;
use std::io;
use tokio::io::AsyncRead;
use tokio_util::io::ReaderStream;

// body type shared by every response the server produces
pub type Body = BoxBody<Bytes, io::Error>;

// chunk size used when streaming file contents
const CHUNK_SIZE: usize = 64 * 1024;

pub fn empty() -> Body {
    Empty::<Bytes>::new()
        .map_err(|never| match never {})
        .boxed()
}

pub fn full<T: Into<Bytes>>(chunk: T) -> Body {
    Full::new(chunk.into())
        .map_err(|never| match never {})
        .boxed()
}

// stream a reader chunk by chunk, so a large file is never held in memory whole
pub fn stream<R>(reader: R) -> Body
where
    R: AsyncRead + Send + Sync + 'static,
{
    let frames = ReaderStream::with_capacity(reader, CHUNK_SIZE).map_ok(Frame::data);
    BodyExt::boxed(StreamBody::new(frames))
}
