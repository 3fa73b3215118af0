//! Capability results and their HTTP rendering

use crate::body::{Body, FileBody, JsonBody, TextBody, TEXT_PLAIN};
use crate::context::Context;
use crate::logger;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{self, HeaderValue};
use hyper::{HeaderMap, Response, StatusCode};
use serde::Serialize;

/// Content type in effect before anything is dispatched
pub const TEXT_HTML: &str = "text/html; charset=utf8";

/// What a capability returned
pub enum Reply {
    /// A body that decides its own status, headers and payload
    Body(Box<dyn Body>),
    /// Markup sent as `text/html`
    Html(String),
    /// No value; renders 404
    Nothing,
    /// Any other structured value, already serialized
    Data(serde_json::Result<Vec<u8>>),
}

impl Reply {
    pub fn body(body: impl Body + 'static) -> Self {
        Self::Body(Box::new(body))
    }

    pub fn data<T: Serialize + ?Sized>(value: &T) -> Self {
        Self::Data(serde_json::to_vec(value))
    }
}

pub trait IntoReply {
    fn into_reply(self) -> Reply;
}

impl IntoReply for Reply {
    fn into_reply(self) -> Reply {
        self
    }
}

impl IntoReply for () {
    fn into_reply(self) -> Reply {
        Reply::Nothing
    }
}

impl IntoReply for String {
    fn into_reply(self) -> Reply {
        Reply::Html(self)
    }
}

impl IntoReply for &str {
    fn into_reply(self) -> Reply {
        Reply::Html(self.to_string())
    }
}

impl<T: IntoReply> IntoReply for Option<T> {
    fn into_reply(self) -> Reply {
        self.map_or(Reply::Nothing, IntoReply::into_reply)
    }
}

impl IntoReply for Box<dyn Body> {
    fn into_reply(self) -> Reply {
        Reply::Body(self)
    }
}

impl IntoReply for FileBody {
    fn into_reply(self) -> Reply {
        Reply::body(self)
    }
}

impl IntoReply for JsonBody {
    fn into_reply(self) -> Reply {
        Reply::body(self)
    }
}

impl IntoReply for TextBody {
    fn into_reply(self) -> Reply {
        Reply::body(self)
    }
}

impl IntoReply for serde_json::Value {
    fn into_reply(self) -> Reply {
        Reply::data(&self)
    }
}

/// Any serializable value returned as-is, e.g. `Data(user)`
#[derive(Debug, Clone)]
pub struct Data<T>(pub T);

impl<T: Serialize> IntoReply for Data<T> {
    fn into_reply(self) -> Reply {
        Reply::data(&self.0)
    }
}

/// Final status, headers and payload of one request
#[derive(Debug, Clone)]
pub struct Rendered {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl Rendered {
    /// Empty response with the default `text/html` content type
    pub fn empty(status: StatusCode) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(TEXT_HTML));
        Self {
            status,
            headers,
            body: Bytes::new(),
        }
    }

    pub fn into_response(self) -> Response<Full<Bytes>> {
        let mut response = Response::new(Full::new(self.body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

/// Turn a capability result into a response, after headers the capability
/// set through its `Context`.
pub fn classify(reply: Reply, ctx: &mut Context) -> Rendered {
    let mut rendered = Rendered {
        status: StatusCode::OK,
        headers: std::mem::take(ctx.response_headers_mut()),
        body: Bytes::new(),
    };

    if let Some(status) = ctx.forced_status() {
        rendered.status = status;
        rendered.headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(TEXT_PLAIN));
        rendered.body = Bytes::from(status.canonical_reason().unwrap_or_default());
        return rendered;
    }

    if !rendered.headers.contains_key(header::CONTENT_TYPE) {
        rendered
            .headers
            .insert(header::CONTENT_TYPE, HeaderValue::from_static(TEXT_PLAIN));
    }

    match reply {
        Reply::Body(mut body) => {
            let body_headers = body.headers();
            for name in body_headers.keys() {
                rendered.headers.remove(name);
                for value in body_headers.get_all(name) {
                    rendered.headers.append(name.clone(), value.clone());
                }
            }
            rendered.body = body.bytes();
            rendered.status = body.status();
        }
        Reply::Html(html) => {
            rendered
                .headers
                .insert(header::CONTENT_TYPE, HeaderValue::from_static(TEXT_HTML));
            rendered.body = Bytes::from(html);
        }
        Reply::Nothing => {
            rendered.status = StatusCode::NOT_FOUND;
        }
        Reply::Data(Ok(bytes)) => {
            rendered.body = Bytes::from(bytes);
        }
        Reply::Data(Err(e)) => {
            logger::log_error(&format!("Failed to serialize reply: {e}"));
            rendered.status = StatusCode::INTERNAL_SERVER_ERROR;
        }
    }

    rendered
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper::{Method, Uri};
    use serde_json::json;
    use std::collections::HashMap;

    fn ctx() -> Context {
        Context::new(Method::GET, Uri::from_static("/"))
    }

    #[test]
    fn test_string_is_html() {
        let rendered = classify("hello".into_reply(), &mut ctx());
        assert_eq!(rendered.status, StatusCode::OK);
        assert_eq!(rendered.headers[header::CONTENT_TYPE], TEXT_HTML);
        assert_eq!(rendered.body.as_ref(), b"hello");
    }

    #[test]
    fn test_nothing_is_404() {
        let rendered = classify(().into_reply(), &mut ctx());
        assert_eq!(rendered.status, StatusCode::NOT_FOUND);
        assert!(rendered.body.is_empty());

        let rendered = classify(None::<String>.into_reply(), &mut ctx());
        assert_eq!(rendered.status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_data_serialized() {
        let rendered = classify(Reply::data(&json!({"n": 1})), &mut ctx());
        assert_eq!(rendered.status, StatusCode::OK);
        assert_eq!(rendered.headers[header::CONTENT_TYPE], TEXT_PLAIN);
        assert_eq!(rendered.body.as_ref(), br#"{"n":1}"#);
    }

    #[test]
    fn test_data_wrapper() {
        #[derive(Serialize)]
        struct User {
            id: u32,
            name: &'static str,
        }

        let rendered = classify(Data(User { id: 7, name: "ada" }).into_reply(), &mut ctx());
        assert_eq!(rendered.status, StatusCode::OK);
        assert_eq!(rendered.headers[header::CONTENT_TYPE], TEXT_PLAIN);
        assert_eq!(rendered.body.as_ref(), br#"{"id":7,"name":"ada"}"#);

        let rendered = classify(Some(Data(vec![1, 2])).into_reply(), &mut ctx());
        assert_eq!(rendered.body.as_ref(), b"[1,2]");
    }

    #[test]
    fn test_data_failure_is_500() {
        let mut map = HashMap::new();
        map.insert((1, 2), 3);
        let rendered = classify(Reply::data(&map), &mut ctx());
        assert_eq!(rendered.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(rendered.body.is_empty());
    }

    #[test]
    fn test_body_headers_and_status() {
        let reply = JsonBody::from_value(&json!({"error": "nope"})).into_reply();
        let rendered = classify(reply, &mut ctx());
        assert_eq!(rendered.status, StatusCode::BAD_REQUEST);
        assert_eq!(rendered.body.as_ref(), br#"{"error":"nope"}"#);
    }

    #[test]
    fn test_context_headers_kept() {
        let mut ctx = ctx();
        ctx.set_header("X-Trace", "abc");
        let rendered = classify("ok".into_reply(), &mut ctx);
        assert_eq!(rendered.headers["x-trace"], "abc");
    }

    #[test]
    fn test_forced_status_wins() {
        let mut ctx = ctx();
        ctx.redirect("/elsewhere");
        let rendered = classify("ignored".into_reply(), &mut ctx);
        assert_eq!(rendered.status, StatusCode::MOVED_PERMANENTLY);
        assert_eq!(rendered.headers[header::LOCATION], "/elsewhere");
        assert_eq!(rendered.body.as_ref(), b"Moved Permanently");
    }

    #[test]
    fn test_into_response() {
        let response = Rendered::empty(StatusCode::NOT_FOUND).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.headers()[header::CONTENT_TYPE], TEXT_HTML);
    }
}
