use super::{text_headers, Body};
use crate::logger;
use hyper::body::Bytes;
use hyper::{HeaderMap, StatusCode};
use serde::Serialize;

/// A serialized structured value.
///
/// The value is serialized when `set` is called. A top-level `"error"` key
/// in an object turns the response into a 400.
#[derive(Debug, Clone)]
pub struct JsonBody {
    status: StatusCode,
    content: Bytes,
    data: Option<serde_json::Value>,
}

impl Default for JsonBody {
    fn default() -> Self {
        Self {
            status: StatusCode::OK,
            content: Bytes::new(),
            data: None,
        }
    }
}

impl JsonBody {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_value<T: Serialize + ?Sized>(value: &T) -> Self {
        let mut body = Self::new();
        body.set(value);
        body
    }

    pub fn set<T: Serialize + ?Sized>(&mut self, value: &T) {
        let encoded = serde_json::to_value(value)
            .and_then(|data| serde_json::to_vec(&data).map(|bytes| (data, bytes)));

        match encoded {
            Ok((data, bytes)) => {
                self.content = Bytes::from(bytes);
                self.data = Some(data);
            }
            Err(e) => logger::log_warning(&format!("JsonBody: {e}")),
        }
    }

    fn has_error_key(&self) -> bool {
        self.data
            .as_ref()
            .and_then(serde_json::Value::as_object)
            .and_then(|map| map.get("error"))
            .is_some_and(|value| !value.is_null())
    }
}

impl Body for JsonBody {
    fn headers(&mut self) -> HeaderMap {
        if self.has_error_key() {
            self.status = StatusCode::BAD_REQUEST;
        }
        text_headers()
    }

    fn status(&self) -> StatusCode {
        self.status
    }

    fn bytes(&self) -> Bytes {
        self.content.clone()
    }
}
