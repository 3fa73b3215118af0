use dispatch_server::body::{Body, FileBody};
use dispatch_server::context::Context;
use dispatch_server::dispatch::{Controller, Methods, Rest, StartUpError, CATCH_ALL};
use dispatch_server::logger;
use hyper::StatusCode;
use std::path::{Component, PathBuf};

/// Serves files below a root directory for any path no route claims
pub struct Static {
    root: PathBuf,
}

impl Static {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    // Segments arrive lower-cased; the file name is rebuilt from the same
    // number of trailing components of the decoded path so case-sensitive
    // names still resolve under any prefix.
    fn serve(&self, ctx: &mut Context, segments: Rest<String>) -> Option<FileBody> {
        let path = ctx.path();
        let parts: Vec<&str> = path.trim_matches('/').split('/').collect();
        let start = parts.len().saturating_sub(segments.len());
        let relative: PathBuf = parts[start..].iter().collect();

        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            logger::log_warning(&format!("Path traversal attempt blocked: {path}"));
            return None;
        }

        let body = FileBody::from_path(self.root.join(&relative));
        if body.status() == StatusCode::NOT_FOUND {
            return None;
        }
        Some(body)
    }
}

impl Controller for Static {
    fn methods(methods: &mut Methods<Self>) {
        methods.add(CATCH_ALL, Self::serve);
    }

    fn start_up(&self) -> Result<(), StartUpError> {
        if !self.root.is_dir() {
            return Err(format!("{} is not a directory", self.root.display()).into());
        }
        Ok(())
    }
}
