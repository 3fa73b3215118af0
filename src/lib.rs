//! A small HTTP server that routes request paths to capabilities of
//! registered handler objects.
//!
//! A path such as `/users/show/42` is resolved against the deepest registered
//! prefix (`/users`), the next segment names the capability (`Show`), and the
//! remaining segments are coerced into the capability's typed parameters.

pub mod app;
pub mod body;
pub mod config;
pub mod context;
pub mod dispatch;
pub mod http;
pub mod logger;
pub mod params;
pub mod server;
pub mod token;
pub mod validation;
