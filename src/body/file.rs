use super::Body;
use crate::logger;
use hyper::body::Bytes;
use hyper::header::{self, HeaderValue};
use hyper::{HeaderMap, StatusCode};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

const DIRECTORY_INDEX: &str = "index.html";

/// A file read from disk.
///
/// `set` stats the path: a directory is served through its `index.html`,
/// anything missing answers 404 and a failing read answers 500.
#[derive(Debug, Clone)]
pub struct FileBody {
    status: StatusCode,
    content: Bytes,
    /// Adds `Content-Disposition: attachment` when true
    pub force_download: bool,
    /// Filename offered to the client
    pub name: String,
    pub mime_type: String,
}

impl Default for FileBody {
    fn default() -> Self {
        Self {
            status: StatusCode::OK,
            content: Bytes::new(),
            force_download: false,
            name: "file.bin".to_string(),
            mime_type: "application/octet-stream".to_string(),
        }
    }
}

impl FileBody {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let mut body = Self::new();
        body.set(path);
        body
    }

    /// Load the file at `path` (synchronously).
    pub fn set(&mut self, path: impl AsRef<Path>) {
        let Some(path) = self.resolve(path.as_ref()) else {
            return;
        };

        match fs::read(&path) {
            Ok(data) => {
                self.status = StatusCode::OK;
                self.content = Bytes::from(data);
                if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                    self.name = name.to_string();
                }
                self.mime_type = mime_guess::from_path(&path)
                    .first_or_octet_stream()
                    .to_string();
            }
            Err(e) => {
                logger::log_error(&format!("Failed to read file '{}': {e}", path.display()));
                self.status = StatusCode::INTERNAL_SERVER_ERROR;
            }
        }
    }

    /// Map `path` to the file that should be read, setting the failure
    /// status when there is none.
    fn resolve(&mut self, path: &Path) -> Option<PathBuf> {
        match fs::metadata(path) {
            Ok(meta) if meta.is_dir() => {
                let index = path.join(DIRECTORY_INDEX);
                if index.is_file() {
                    Some(index)
                } else {
                    self.status = StatusCode::NOT_FOUND;
                    None
                }
            }
            Ok(_) => Some(path.to_path_buf()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                self.status = StatusCode::NOT_FOUND;
                None
            }
            Err(e) => {
                logger::log_error(&format!("Failed to stat '{}': {e}", path.display()));
                self.status = StatusCode::INTERNAL_SERVER_ERROR;
                None
            }
        }
    }
}

impl Body for FileBody {
    fn headers(&mut self) -> HeaderMap {
        let mut header = HeaderMap::new();

        if let Ok(value) = HeaderValue::from_str(&self.mime_type) {
            header.insert(header::CONTENT_TYPE, value);
        }

        if self.force_download {
            let disposition = format!("attachment; filename={};", self.name);
            match HeaderValue::from_str(&disposition) {
                Ok(value) => {
                    header.insert(header::CONTENT_DISPOSITION, value);
                }
                Err(_) => logger::log_warning(&format!(
                    "Cannot send filename '{}' in Content-Disposition",
                    self.name
                )),
            }
        }

        header
    }

    fn status(&self) -> StatusCode {
        self.status
    }

    fn bytes(&self) -> Bytes {
        self.content.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_file_and_mime() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logo.PNG");
        fs::write(&path, b"\x89PNG").unwrap();

        let mut body = FileBody::from_path(&path);
        assert_eq!(body.status(), StatusCode::OK);
        assert_eq!(body.bytes().as_ref(), b"\x89PNG");
        assert_eq!(body.name, "logo.PNG");
        assert_eq!(body.headers().get("content-type").unwrap(), "image/png");
    }

    #[test]
    fn test_unknown_extension_is_octet_stream() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blob.qqq");
        fs::write(&path, b"data").unwrap();

        let mut body = FileBody::from_path(&path);
        assert_eq!(
            body.headers().get("content-type").unwrap(),
            "application/octet-stream"
        );
    }

    #[test]
    fn test_force_download() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.pdf");
        fs::write(&path, b"%PDF").unwrap();

        let mut body = FileBody::from_path(&path);
        assert!(body.headers().get("content-disposition").is_none());
        body.force_download = true;
        assert_eq!(
            body.headers().get("content-disposition").unwrap(),
            "attachment; filename=report.pdf;"
        );
    }

    #[test]
    fn test_directory_uses_index() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("index.html"), b"<h1>hi</h1>").unwrap();

        let mut body = FileBody::from_path(dir.path());
        assert_eq!(body.status(), StatusCode::OK);
        assert_eq!(body.bytes().as_ref(), b"<h1>hi</h1>");
        assert_eq!(
            body.headers().get("content-type").unwrap(),
            "text/html"
        );
    }

    #[test]
    fn test_directory_without_index_is_404() {
        let dir = tempfile::tempdir().unwrap();
        let body = FileBody::from_path(dir.path());
        assert_eq!(body.status(), StatusCode::NOT_FOUND);
        assert!(body.bytes().is_empty());
    }

    #[test]
    fn test_directory_index_that_is_a_directory_is_404() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("index.html")).unwrap();
        let body = FileBody::from_path(dir.path());
        assert_eq!(body.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_missing_is_404() {
        let dir = tempfile::tempdir().unwrap();
        let body = FileBody::from_path(dir.path().join("nope.txt"));
        assert_eq!(body.status(), StatusCode::NOT_FOUND);
    }
}
