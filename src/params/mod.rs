//! Request parameter containers
//!
//! HTTP fields are multivalued, so every container maps a key to a sequence.

mod files;
mod value;

pub use files::{Files, UploadedFile};
pub use value::Value;
