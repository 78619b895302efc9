//! Uploaded radiograph and content-type resolution.

use axum::body::Bytes;
use serde::Serialize;
use uuid::Uuid;

/// Extensions accepted at the upload surface.
pub const ACCEPTED_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// Content types the analysis provider is ever sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ImageMime {
    #[serde(rename = "image/jpeg")]
    Jpeg,
    #[serde(rename = "image/png")]
    Png,
}

impl ImageMime {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageMime::Jpeg => "image/jpeg",
            ImageMime::Png => "image/png",
        }
    }

    /// Resolve the content type of an upload.
    ///
    /// The declared type wins when it is one we know (`image/jpg` is
    /// normalized to `image/jpeg`); otherwise the filename suffix decides,
    /// case-insensitively. Anything else falls back to JPEG.
    pub fn resolve(declared: Option<&str>, filename: &str) -> Self {
        match declared {
            Some("image/jpg") | Some("image/jpeg") => return ImageMime::Jpeg,
            Some("image/png") => return ImageMime::Png,
            _ => {}
        }

        match extension(filename).as_deref() {
            Some("jpg") | Some("jpeg") => ImageMime::Jpeg,
            Some("png") => ImageMime::Png,
            _ => ImageMime::Jpeg,
        }
    }
}

impl std::fmt::Display for ImageMime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lowercased extension of `filename`, if it has one.
fn extension(filename: &str) -> Option<String> {
    let (_, ext) = filename.rsplit_once('.')?;
    Some(ext.to_ascii_lowercase())
}

/// Whether the upload surface accepts a file with this name.
pub fn is_accepted_filename(filename: &str) -> bool {
    extension(filename)
        .map(|ext| ACCEPTED_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

/// A radiograph held for the lifetime of one session.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    /// Distinguishes successive uploads within the same session.
    pub id: Uuid,
    pub filename: String,
    pub declared_type: Option<String>,
    pub bytes: Bytes,
}

impl UploadedImage {
    pub fn new(filename: impl Into<String>, declared_type: Option<String>, bytes: Bytes) -> Self {
        Self {
            id: Uuid::new_v4(),
            filename: filename.into(),
            declared_type,
            bytes,
        }
    }

    pub fn mime(&self) -> ImageMime {
        ImageMime::resolve(self.declared_type.as_deref(), &self.filename)
    }

    pub fn size_bytes(&self) -> usize {
        self.bytes.len()
    }
}
