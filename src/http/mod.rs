//! HTTP protocol helpers
//!
//! Pieces of the connection layer that do not depend on routing.

pub mod response;

pub use response::build_status_response;
