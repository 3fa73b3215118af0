use hyper::body::Bytes;
use hyper::HeaderMap;
use std::collections::HashMap;
use std::io::Cursor;

/// One uploaded multipart file part.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Client supplied filename
    pub name: String,
    /// Headers of the multipart part (Content-Type, Content-Disposition, ...)
    pub headers: HeaderMap,
    data: Bytes,
}

impl UploadedFile {
    pub const fn new(name: String, headers: HeaderMap, data: Bytes) -> Self {
        Self {
            name,
            headers,
            data,
        }
    }

    pub fn content(&self) -> &[u8] {
        &self.data
    }

    /// Reader over the file content; every call starts at offset zero.
    pub fn reader(&self) -> Cursor<Bytes> {
        Cursor::new(self.data.clone())
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Uploaded files keyed by form field name.
#[derive(Debug, Clone, Default)]
pub struct Files {
    fields: HashMap<String, Vec<UploadedFile>>,
}

impl Files {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, files: Vec<UploadedFile>) {
        self.fields.insert(name.into(), files);
    }

    pub fn push(&mut self, name: impl Into<String>, file: UploadedFile) {
        self.fields.entry(name.into()).or_default().push(file);
    }

    /// First file uploaded under `name`.
    pub fn get(&self, name: &str) -> Option<&UploadedFile> {
        self.fields.get(name).and_then(|files| files.first())
    }

    pub fn get_all(&self, name: &str) -> Option<&[UploadedFile]> {
        self.fields.get(name).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn test_files_lookup() {
        let mut files = Files::new();
        files.push(
            "avatar",
            UploadedFile::new("a.png".into(), HeaderMap::new(), Bytes::from_static(b"one")),
        );
        files.push(
            "avatar",
            UploadedFile::new("b.png".into(), HeaderMap::new(), Bytes::from_static(b"two")),
        );

        assert_eq!(files.get("avatar").map(|f| f.name.as_str()), Some("a.png"));
        assert_eq!(files.get_all("avatar").map(<[UploadedFile]>::len), Some(2));
        assert!(files.get("other").is_none());
    }

    #[test]
    fn test_reader_restarts() {
        let file = UploadedFile::new("x.txt".into(), HeaderMap::new(), Bytes::from_static(b"abc"));
        let mut first = String::new();
        file.reader().read_to_string(&mut first).unwrap();
        let mut second = String::new();
        file.reader().read_to_string(&mut second).unwrap();
        assert_eq!(first, "abc");
        assert_eq!(second, "abc");
        assert_eq!(file.content(), b"abc");
    }
}
