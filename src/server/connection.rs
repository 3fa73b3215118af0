// Connection handling module
// Accepts a single connection, serves it with hyper and dispatches requests

use std::convert::Infallible;
use std::error::Error as StdError;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use http_body_util::Full;
use hyper::body::{Body, Bytes};
use hyper::header::{self, HeaderName};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response};
use hyper_util::rt::TokioIo;
use tokio::io::{AsyncRead, AsyncWrite};

use super::listener::Stream;
use super::ServerState;
use crate::context::Context;
use crate::http::build_status_response;
use crate::logger::{self, AccessLogEntry};

/// Accept a connection, checking the connection limit first.
///
/// Over the limit the stream is dropped right away; otherwise it is served
/// on its own task.
pub fn accept_connection(
    stream: Stream,
    peer_addr: String,
    state: &Arc<ServerState>,
    conn_counter: &Arc<AtomicUsize>,
) {
    // Increment first, then check, so concurrent accepts cannot both pass
    let prev_count = conn_counter.fetch_add(1, Ordering::SeqCst);

    if let Some(max_conn) = state.config.performance.max_connections {
        if prev_count >= usize::try_from(max_conn).unwrap_or(usize::MAX) {
            conn_counter.fetch_sub(1, Ordering::SeqCst);
            logger::log_warning(&format!(
                "Max connections reached: {prev_count}/{max_conn}. Connection rejected."
            ));
            drop(stream);
            return;
        }
    }

    if state.config.logging.access_log {
        logger::log_connection_accepted(&peer_addr);
    }

    match stream {
        Stream::Tcp(stream) => handle_connection(
            stream,
            peer_addr,
            Arc::clone(state),
            Arc::clone(conn_counter),
        ),
        #[cfg(unix)]
        Stream::Unix(stream) => handle_connection(
            stream,
            peer_addr,
            Arc::clone(state),
            Arc::clone(conn_counter),
        ),
    }
}

/// Serve one connection on a spawned task, bounded by the configured
/// read/write timeout, and release its slot in the counter when done.
fn handle_connection<S>(
    stream: S,
    peer_addr: String,
    state: Arc<ServerState>,
    conn_counter: Arc<AtomicUsize>,
) where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let io = TokioIo::new(stream);
        let peer: Arc<str> = Arc::from(peer_addr);

        let keep_alive_timeout = state.config.performance.keep_alive_timeout;
        let timeout_duration = std::time::Duration::from_secs(std::cmp::max(
            state.config.performance.read_timeout,
            state.config.performance.write_timeout,
        ));

        let mut builder = http1::Builder::new();
        builder.keep_alive(keep_alive_timeout > 0);

        let service_state = Arc::clone(&state);
        let conn = builder.serve_connection(
            io,
            service_fn(move |req| {
                handle_request(req, Arc::clone(&service_state), Arc::clone(&peer))
            }),
        );

        match tokio::time::timeout(timeout_duration, conn).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => logger::log_connection_error(&err),
            Err(_) => {
                logger::log_warning(&format!(
                    "Connection timeout after {} seconds",
                    timeout_duration.as_secs()
                ));
            }
        }

        conn_counter.fetch_sub(1, Ordering::SeqCst);
    });
}

/// Build the request's `Context`, dispatch it and write the access log line.
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<ServerState>,
    peer: Arc<str>,
) -> Result<Response<Full<Bytes>>, Infallible>
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn StdError + Send + Sync>>,
{
    let mut entry = AccessLogEntry::new(
        peer.to_string(),
        req.method().to_string(),
        req.uri().to_string(),
    );
    entry.protocol = format!("{:?}", req.version());
    entry.referer = header_string(&req, &header::REFERER);
    entry.user_agent = header_string(&req, &header::USER_AGENT);

    let response =
        match Context::from_request(req, &peer, state.config.request_max_size()).await {
            Ok(mut ctx) => state.router.dispatch(&mut ctx).into_response(),
            Err(e) => {
                logger::log_warning(&format!("Rejected request {}: {e}", entry.request_uri));
                build_status_response(e.status())
            }
        };

    if state.config.logging.access_log {
        entry.status = response.status().as_u16();
        entry.body_bytes = response
            .body()
            .size_hint()
            .exact()
            .map_or(0, |n| usize::try_from(n).unwrap_or(usize::MAX));
        logger::log_access(&entry, &state.config.logging.access_log_format);
    }

    Ok(response)
}

fn header_string<B>(req: &Request<B>, name: &HeaderName) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::dispatch::{Controller, Methods, Router};
    use http_body_util::BodyExt;
    use hyper::StatusCode;

    struct Echo;

    impl Controller for Echo {
        fn methods(methods: &mut Methods<Self>) {
            methods.add("Say", |_: &Self, ctx: &mut Context, word: String| {
                format!("{word} from {}", ctx.remote_addr)
            });
        }
    }

    fn state(max_size: u64) -> Arc<ServerState> {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing");
        let mut config = Config::load_from(&path.to_string_lossy()).unwrap();
        config.server.request_max_size = max_size;
        config.logging.access_log = false;

        let mut router = Router::new();
        router.connect("/echo", Arc::new(Echo));
        Arc::new(ServerState { config, router })
    }

    async fn body_text(response: Response<Full<Bytes>>) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_request_dispatched() {
        let req = Request::get("/echo/say/hi")
            .body(Full::new(Bytes::new()))
            .unwrap();
        let response = handle_request(req, state(1024), Arc::from("10.0.0.1:5000"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "hi from 10.0.0.1:5000");
    }

    #[tokio::test]
    async fn test_unrouted_request_is_404() {
        let req = Request::get("/nowhere").body(Full::new(Bytes::new())).unwrap();
        let response = handle_request(req, state(1024), Arc::from(""))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_oversized_body_is_413() {
        let req = Request::post("/echo/say/hi")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Full::new(Bytes::from("a=0123456789")))
            .unwrap();
        let response = handle_request(req, state(4), Arc::from(""))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
