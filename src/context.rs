//! Per-request context
//!
//! A `Context` is built fresh for every request and handed to the invoked
//! capability by `&mut`. It carries the method flags, the parsed parameters,
//! cookies and uploaded files, plus the response-side state a capability may
//! touch: extra headers, staged cookies and a forced status.

use crate::logger;
use crate::params::{Files, UploadedFile, Value};
use cookie::Cookie;
use futures_util::stream;
use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::body::Bytes;
use hyper::header::{self, HeaderName, HeaderValue};
use hyper::{HeaderMap, Method, Request, StatusCode, Uri, Version};
use percent_encoding::percent_decode_str;
use std::collections::BTreeMap;
use std::error::Error as StdError;

/// Failures while turning a raw request into a `Context`
#[derive(Debug, thiserror::Error)]
pub enum ContextError {
    #[error("request body exceeds {0} bytes")]
    TooLarge(usize),
    #[error("failed to read request body: {0}")]
    Body(String),
    #[error("malformed multipart body: {0}")]
    Multipart(#[from] multer::Error),
}

impl ContextError {
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::TooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Body(_) | Self::Multipart(_) => StatusCode::BAD_REQUEST,
        }
    }
}

pub struct Context {
    pub get: bool,
    pub post: bool,
    pub put: bool,
    pub delete: bool,

    pub method: Method,
    pub uri: Uri,
    pub version: Version,
    pub headers: HeaderMap,
    pub remote_addr: String,

    pub params: Value,
    pub cookies: Value,
    pub files: Files,

    response_headers: HeaderMap,
    staged_cookies: BTreeMap<String, Cookie<'static>>,
    forced_status: Option<StatusCode>,
}

impl Context {
    /// Bare context with no parameters, mostly useful for tests and tooling.
    pub fn new(method: Method, uri: Uri) -> Self {
        Self {
            get: method == Method::GET,
            post: method == Method::POST,
            put: method == Method::PUT,
            delete: method == Method::DELETE,
            method,
            uri,
            version: Version::HTTP_11,
            headers: HeaderMap::new(),
            remote_addr: String::new(),
            params: Value::new(),
            cookies: Value::new(),
            files: Files::new(),
            response_headers: HeaderMap::new(),
            staged_cookies: BTreeMap::new(),
            forced_status: None,
        }
    }

    /// Build a context from an incoming request, reading at most `max_size`
    /// body bytes.
    pub async fn from_request<B>(
        req: Request<B>,
        remote_addr: &str,
        max_size: usize,
    ) -> Result<Self, ContextError>
    where
        B: hyper::body::Body<Data = Bytes>,
        B::Error: Into<Box<dyn StdError + Send + Sync>>,
    {
        let (parts, body) = req.into_parts();

        let mut ctx = Self::new(parts.method, parts.uri);
        ctx.version = parts.version;
        ctx.headers = parts.headers;
        ctx.remote_addr = remote_addr.to_string();
        ctx.cookies = parse_cookies(&ctx.headers);

        if let Some(query) = ctx.uri.query() {
            append_urlencoded(&mut ctx.params, query);
        }

        let data = match Limited::new(body, max_size).collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
                return Err(ContextError::TooLarge(max_size));
            }
            Err(e) => return Err(ContextError::Body(e.to_string())),
        };

        if data.is_empty() {
            return Ok(ctx);
        }

        let content_type = ctx
            .headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();

        if content_type.starts_with("application/x-www-form-urlencoded") {
            append_urlencoded(&mut ctx.params, &String::from_utf8_lossy(&data));
        } else if content_type.starts_with("multipart/form-data") {
            let boundary = multer::parse_boundary(&content_type)?;
            read_multipart(&mut ctx, data, boundary).await?;
        }

        Ok(ctx)
    }

    /// Request path, percent-decoded.
    pub fn path(&self) -> String {
        percent_decode_str(self.uri.path())
            .decode_utf8_lossy()
            .into_owned()
    }

    /// Stage a cookie to be sent with the response and return it for editing.
    pub fn cookie(&mut self, name: &str) -> &mut Cookie<'static> {
        self.staged_cookies
            .entry(name.to_string())
            .or_insert_with(|| Cookie::new(name.to_string(), ""))
    }

    /// Set a header on the outgoing response.
    pub fn set_header(&mut self, name: &str, value: &str) {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                self.response_headers.insert(name, value);
            }
            _ => logger::log_warning(&format!("Ignoring invalid response header '{name}'")),
        }
    }

    /// Answer with the canonical reason text of `status` instead of the
    /// capability's return value.
    pub fn http_error(&mut self, status: StatusCode) {
        self.forced_status = Some(status);
    }

    /// Send a 301 to `location`.
    pub fn redirect(&mut self, location: &str) {
        self.set_header("Location", location);
        self.http_error(StatusCode::MOVED_PERMANENTLY);
    }

    pub const fn forced_status(&self) -> Option<StatusCode> {
        self.forced_status
    }

    pub const fn response_headers(&self) -> &HeaderMap {
        &self.response_headers
    }

    pub(crate) fn response_headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.response_headers
    }

    /// Move every staged cookie into `Set-Cookie` response headers.
    pub(crate) fn flush_cookies(&mut self) {
        for (name, cookie) in std::mem::take(&mut self.staged_cookies) {
            match HeaderValue::from_str(&cookie.to_string()) {
                Ok(value) => {
                    self.response_headers.append(header::SET_COOKIE, value);
                }
                Err(e) => logger::log_warning(&format!("Dropping cookie '{name}': {e}")),
            }
        }
    }
}

fn parse_cookies(headers: &HeaderMap) -> Value {
    let mut cookies = Value::new();
    for raw in headers.get_all(header::COOKIE) {
        let Ok(raw) = raw.to_str() else {
            continue;
        };
        for cookie in Cookie::split_parse(raw).flatten() {
            cookies.append(cookie.name().to_string(), cookie.value().to_string());
        }
    }
    cookies
}

fn append_urlencoded(params: &mut Value, input: &str) {
    match serde_urlencoded::from_str::<Vec<(String, String)>>(input) {
        Ok(pairs) => {
            for (name, value) in pairs {
                params.append(name, value);
            }
        }
        Err(e) => logger::log_warning(&format!("Ignoring malformed form data: {e}")),
    }
}

async fn read_multipart(
    ctx: &mut Context,
    data: Bytes,
    boundary: String,
) -> Result<(), ContextError> {
    let body = stream::once(async move { Ok::<_, std::io::Error>(data) });
    let mut multipart = multer::Multipart::new(body, boundary);

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(ToString::to_string);
        let headers = field.headers().clone();
        let bytes = field.bytes().await?;

        match file_name {
            Some(file_name) => ctx
                .files
                .push(name, UploadedFile::new(file_name, headers, bytes)),
            None => ctx
                .params
                .append(name, String::from_utf8_lossy(&bytes).into_owned()),
        }
    }

    Ok(())
}
