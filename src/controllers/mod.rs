//! Controllers wired up by the server binary

mod hello;
mod static_files;

pub use hello::Hello;
pub use static_files::Static;
