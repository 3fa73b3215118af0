//! Response bodies
//!
//! A capability can return any `Body`; the dispatcher copies its headers,
//! uses its status and writes its bytes verbatim. Three variants ship with
//! the crate: [`FileBody`], [`JsonBody`] and [`TextBody`]. Each one is
//! configured through its own `set` method.

mod file;
mod json;
mod text;

pub use file::FileBody;
pub use json::JsonBody;
pub use text::TextBody;

use hyper::body::Bytes;
use hyper::{HeaderMap, StatusCode};

/// Content type shared by the text-like bodies
pub const TEXT_PLAIN: &str = "text/plain; charset=utf8";

pub trait Body: Send {
    /// Headers to send along the response.
    ///
    /// Called before [`Body::status`]; a body may settle its final status here.
    fn headers(&mut self) -> HeaderMap;

    fn status(&self) -> StatusCode;

    /// Payload written verbatim.
    fn bytes(&self) -> Bytes;
}

impl<B: Body + ?Sized> Body for Box<B> {
    fn headers(&mut self) -> HeaderMap {
        (**self).headers()
    }

    fn status(&self) -> StatusCode {
        (**self).status()
    }

    fn bytes(&self) -> Bytes {
        (**self).bytes()
    }
}

fn text_headers() -> HeaderMap {
    let mut header = HeaderMap::new();
    header.insert(
        hyper::header::CONTENT_TYPE,
        hyper::header::HeaderValue::from_static(TEXT_PLAIN),
    );
    header
}
