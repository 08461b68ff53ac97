use serde::Serialize;
use utoipa::ToSchema;

use crate::features::videos::UrlField;

/// What is being attached to a video record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum UploadKind {
    Video,
    Thumbnail,
}

pub const VIDEO_MEDIA_TYPES: &[&str] = &["video/mp4"];
pub const THUMBNAIL_MEDIA_TYPES: &[&str] = &["image/jpeg", "image/png"];

/// Room for multipart boundaries and part headers on top of the file itself
pub const MULTIPART_OVERHEAD_BYTES: usize = 1024 * 1024;

impl UploadKind {
    /// Name of the multipart field carrying the file
    pub fn field_name(&self) -> &'static str {
        match self {
            UploadKind::Video => "video",
            UploadKind::Thumbnail => "thumbnail",
        }
    }

    pub fn allowed_media_types(&self) -> &'static [&'static str] {
        match self {
            UploadKind::Video => VIDEO_MEDIA_TYPES,
            UploadKind::Thumbnail => THUMBNAIL_MEDIA_TYPES,
        }
    }

    /// Record column that receives the published URL
    pub fn url_field(&self) -> UrlField {
        match self {
            UploadKind::Video => UrlField::Video,
            UploadKind::Thumbnail => UrlField::Thumbnail,
        }
    }

    /// File extension for an allowed media type, `None` if the type is not allowed
    pub fn extension_for(&self, media_type: &str) -> Option<&'static str> {
        match (self, media_type) {
            (UploadKind::Video, "video/mp4") => Some("mp4"),
            (UploadKind::Thumbnail, "image/jpeg") => Some("jpg"),
            (UploadKind::Thumbnail, "image/png") => Some("png"),
            _ => None,
        }
    }
}

/// Normalize a declared `Content-Type` to its bare media type.
///
/// Parameters are dropped and the result is lowercased, so
/// `"Video/MP4; codecs=avc1"` becomes `"video/mp4"`.
pub fn parse_media_type(raw: &str) -> Option<String> {
    let essence = raw.split(';').next()?.trim().to_ascii_lowercase();
    let (kind, subtype) = essence.split_once('/')?;

    let is_token = |s: &str| {
        !s.is_empty()
            && s.chars()
                .all(|c| c.is_ascii_alphanumeric() || "!#$&-^_.+".contains(c))
    };
    if is_token(kind) && is_token(subtype) {
        Some(essence)
    } else {
        None
    }
}

/// Video upload form for OpenAPI documentation.
/// The handler reads the multipart stream directly.
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct VideoUploadForm {
    /// MP4 file, sent with `Content-Type: video/mp4`
    #[schema(format = Binary, content_media_type = "video/mp4")]
    pub video: String,
}

/// Thumbnail upload form for OpenAPI documentation
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct ThumbnailUploadForm {
    /// JPEG or PNG image
    #[schema(format = Binary, content_media_type = "image/png")]
    pub thumbnail: String,
}
