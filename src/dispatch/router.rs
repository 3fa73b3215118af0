//! Route table and request dispatch
//!
//! Prefixes map to stacks of handlers. A request path resolves to the
//! deepest registered prefix, then to a capability of one handler in that
//! stack; the remaining segments are bound as arguments.

use super::bind::bind;
use super::controller::{BoundMethod, Controller, HandlerEntry, CATCH_ALL, INDEX};
use super::reply::{classify, Rendered};
use crate::context::Context;
use crate::logger;
use hyper::StatusCode;
use std::collections::HashMap;
use std::sync::Arc;

/// Owned route table, built before serving and shared read-only afterwards
#[derive(Default)]
pub struct Router {
    routes: HashMap<String, Vec<HandlerEntry>>,
}

/// Outcome of resolving a path against the table
pub struct Resolution<'r> {
    /// Matched prefix key
    pub prefix: String,
    /// Number of segments the prefix consumed
    pub depth: usize,
    /// Capability name that was selected (`CatchAll` on fallback)
    pub capability: String,
    pub handler: &'r HandlerEntry,
    pub method: &'r BoundMethod,
    /// Lower-cased path segments
    pub segments: Vec<String>,
    /// Index of the first segment bound as an argument
    pub offset: usize,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `handler` to the bucket for `prefix`. Repeated prefixes stack;
    /// earlier handlers are tried first.
    pub fn connect<H: Controller>(&mut self, prefix: &str, handler: Arc<H>) {
        let prefix = normalize_prefix(prefix);
        self.routes
            .entry(prefix)
            .or_default()
            .push(HandlerEntry::new(handler));
    }

    pub fn prefixes(&self) -> impl Iterator<Item = &str> {
        self.routes.keys().map(String::as_str)
    }

    /// Deepest registered prefix of `path`, with the number of segments it
    /// covers.
    pub fn lookup(&self, path: &str) -> Option<(String, usize)> {
        let segments = split_path(path);
        self.lookup_segments(&segments)
            .map(|(prefix, depth, _)| (prefix, depth))
    }

    fn lookup_segments(&self, segments: &[String]) -> Option<(String, usize, &[HandlerEntry])> {
        (0..=segments.len()).rev().find_map(|depth| {
            let prefix = format!("/{}", segments[..depth].join("/"));
            self.routes
                .get(&prefix)
                .map(|bucket| (prefix, depth, bucket.as_slice()))
        })
    }

    /// Pick the handler and capability for `path`.
    ///
    /// Only the deepest matching prefix is considered; if none of its
    /// handlers resolves, the path does not resolve at all.
    pub fn resolve(&self, path: &str) -> Option<Resolution<'_>> {
        let segments = split_path(path);
        let (prefix, depth, bucket) = self.lookup_segments(&segments)?;

        let (capability, offset) = match segments.get(depth) {
            Some(token) if !token.is_empty() => (method_name(token), depth + 1),
            Some(_) => (INDEX.to_string(), depth + 1),
            None => (INDEX.to_string(), depth),
        };

        let found = bucket
            .iter()
            .find_map(|h| h.method(&capability).map(|m| (h, m, capability.clone(), offset)))
            .or_else(|| {
                bucket
                    .iter()
                    .find_map(|h| h.method(CATCH_ALL).map(|m| (h, m, CATCH_ALL.to_string(), depth)))
            });

        let (handler, method, capability, offset) = found?;

        Some(Resolution {
            prefix,
            depth,
            capability,
            handler,
            method,
            segments,
            offset,
        })
    }

    /// Resolve, bind, invoke and render one request.
    pub fn dispatch(&self, ctx: &mut Context) -> Rendered {
        let path = ctx.path();

        let Some(resolution) = self.resolve(&path) else {
            return Rendered::empty(StatusCode::NOT_FOUND);
        };

        let remaining = resolution
            .segments
            .get(resolution.offset..)
            .unwrap_or_default();

        let args = match bind(&resolution.method.signature, remaining) {
            Ok(args) => args,
            Err(e) => {
                logger::log_error(&format!(
                    "{}::{} cannot be bound for '{path}': {e}",
                    resolution.handler.name, resolution.capability
                ));
                return Rendered::empty(StatusCode::INTERNAL_SERVER_ERROR);
            }
        };

        let reply = resolution.method.invoke(ctx, args);
        ctx.flush_cookies();

        classify(reply, ctx)
    }
}

/// Lower-case, trimmed, one leading slash and no trailing slash.
pub fn normalize_prefix(prefix: &str) -> String {
    format!("/{}", prefix.trim().to_lowercase().trim_matches('/'))
}

/// Lower-cased segments of a request path; the root has none.
pub fn split_path(path: &str) -> Vec<String> {
    let path = path.to_lowercase();
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        Vec::new()
    } else {
        trimmed.split('/').map(ToString::to_string).collect()
    }
}

/// Capability name for a path token: `user_list` and `user-list` both give
/// `UserList`.
pub fn method_name(token: &str) -> String {
    token
        .trim()
        .replace('_', "-")
        .split('-')
        .map(|word| {
            let mut chars = word.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars).collect()
            })
        })
        .collect()
}
