use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Multipart, Path, State,
    },
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::core::error::AppError;
use crate::core::extractor::BearerToken;
use crate::features::uploads::dtos::{ThumbnailUploadForm, UploadKind, VideoUploadForm};
use crate::features::uploads::error::UploadError;
use crate::features::uploads::services::UploadOrchestrator;
use crate::features::videos::Video;
use crate::modules::staging::StagingError;
use crate::shared::types::ApiResponse;

/// Upload a video
///
/// Accepts multipart/form-data with a single `video` part (`video/mp4`).
/// The file is classified by aspect ratio, remuxed for fast start and
/// published to object storage; the record's `video_url` is updated.
#[utoipa::path(
    post,
    path = "/api/video_upload/{video_id}",
    tag = "uploads",
    params(
        ("video_id" = Uuid, Path, description = "Video record ID")
    ),
    request_body(
        content = VideoUploadForm,
        content_type = "multipart/form-data",
    ),
    responses(
        (status = 200, description = "Video uploaded", body = ApiResponse<Video>),
        (status = 400, description = "Invalid request or unsupported media type"),
        (status = 401, description = "Missing or invalid credentials"),
        (status = 403, description = "Caller does not own the video"),
        (status = 500, description = "Upload too large, or a processing, storage or database failure")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn upload_video(
    State(orchestrator): State<Arc<UploadOrchestrator>>,
    BearerToken(token): BearerToken,
    Path(video_id): Path<String>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ApiResponse<Video>>, AppError> {
    handle_upload(&orchestrator, token, &video_id, UploadKind::Video, multipart).await
}

/// Upload a thumbnail
///
/// Accepts multipart/form-data with a single `thumbnail` part
/// (`image/jpeg` or `image/png`). The record's `thumbnail_url` is updated.
#[utoipa::path(
    post,
    path = "/api/thumbnail_upload/{video_id}",
    tag = "uploads",
    params(
        ("video_id" = Uuid, Path, description = "Video record ID")
    ),
    request_body(
        content = ThumbnailUploadForm,
        content_type = "multipart/form-data",
    ),
    responses(
        (status = 200, description = "Thumbnail uploaded", body = ApiResponse<Video>),
        (status = 400, description = "Invalid request or unsupported media type"),
        (status = 401, description = "Missing or invalid credentials"),
        (status = 403, description = "Caller does not own the video"),
        (status = 500, description = "Upload too large, or a storage or database failure")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn upload_thumbnail(
    State(orchestrator): State<Arc<UploadOrchestrator>>,
    BearerToken(token): BearerToken,
    Path(video_id): Path<String>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ApiResponse<Video>>, AppError> {
    handle_upload(
        &orchestrator,
        token,
        &video_id,
        UploadKind::Thumbnail,
        multipart,
    )
    .await
}

async fn handle_upload(
    orchestrator: &UploadOrchestrator,
    token: Option<String>,
    video_id: &str,
    kind: UploadKind,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ApiResponse<Video>>, AppError> {
    let video_id = Uuid::parse_str(video_id)
        .map_err(|_| UploadError::InvalidRequest(format!("Invalid video ID '{}'", video_id)))?;

    let authorized = orchestrator.begin(token.as_deref(), video_id).await?;

    let mut multipart = multipart.map_err(|e| {
        UploadError::InvalidRequest(format!("Expected multipart/form-data: {}", e))
    })?;

    let field_name = kind.field_name();
    let max_bytes = orchestrator.limits().for_kind(kind);
    let field = loop {
        let next = multipart
            .next_field()
            .await
            .map_err(|e| multipart_error(e, max_bytes))?;

        match next {
            Some(field) if field.name() == Some(field_name) => break field,
            Some(field) => debug!("Ignoring unknown field: {:?}", field.name()),
            None => {
                return Err(UploadError::InvalidRequest(format!(
                    "Missing '{}' file field",
                    field_name
                ))
                .into())
            }
        }
    };

    let content_type = field
        .content_type()
        .map(str::to_string)
        .ok_or_else(|| {
            UploadError::InvalidRequest(format!("Missing Content-Type for '{}'", field_name))
        })?;

    let video = orchestrator
        .complete(authorized, kind, &content_type, field)
        .await?;

    let message = match kind {
        UploadKind::Video => "Video uploaded successfully",
        UploadKind::Thumbnail => "Thumbnail uploaded successfully",
    };
    Ok(Json(ApiResponse::success(
        Some(video),
        Some(message.to_string()),
    )))
}

/// A body over the route limit fails the same way as one over the staging ceiling
fn multipart_error(err: MultipartError, max_bytes: usize) -> UploadError {
    debug!("Failed to read multipart field: {}", err);
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return StagingError::TooLarge { limit: max_bytes }.into();
    }
    UploadError::InvalidRequest(format!("Failed to read multipart data: {}", err))
}
