use super::{text_headers, Body};
use hyper::body::Bytes;
use hyper::{HeaderMap, StatusCode};
use std::fmt::Display;

/// Any value rendered through its `Display` implementation.
#[derive(Debug, Clone)]
pub struct TextBody {
    status: StatusCode,
    content: Bytes,
}

impl Default for TextBody {
    fn default() -> Self {
        Self {
            status: StatusCode::OK,
            content: Bytes::new(),
        }
    }
}

impl TextBody {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_value<T: Display + ?Sized>(value: &T) -> Self {
        let mut body = Self::new();
        body.set(value);
        body
    }

    pub fn set<T: Display + ?Sized>(&mut self, value: &T) {
        self.content = Bytes::from(value.to_string());
    }

    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }
}

impl Body for TextBody {
    fn headers(&mut self) -> HeaderMap {
        text_headers()
    }

    fn status(&self) -> StatusCode {
        self.status
    }

    fn bytes(&self) -> Bytes {
        self.content.clone()
    }
}
