use axum::{extract::DefaultBodyLimit, routing::post, Router};
use std::sync::Arc;

use crate::features::uploads::dtos::{UploadKind, MULTIPART_OVERHEAD_BYTES};
use crate::features::uploads::handlers::{upload_thumbnail, upload_video};
use crate::features::uploads::services::UploadOrchestrator;

/// Create routes for the uploads feature
pub fn routes(orchestrator: Arc<UploadOrchestrator>) -> Router {
    let limits = orchestrator.limits();
    let body_limit =
        |kind: UploadKind| DefaultBodyLimit::max(limits.for_kind(kind) + MULTIPART_OVERHEAD_BYTES);

    Router::new()
        .route(
            "/api/video_upload/{video_id}",
            post(upload_video).layer(body_limit(UploadKind::Video)),
        )
        .route(
            "/api/thumbnail_upload/{video_id}",
            post(upload_thumbnail).layer(body_limit(UploadKind::Thumbnail)),
        )
        .with_state(orchestrator)
}
