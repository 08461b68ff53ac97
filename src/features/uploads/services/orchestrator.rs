use std::sync::Arc;

use axum::body::Bytes;
use axum::BoxError;
use chrono::Utc;
use futures::Stream;
use tracing::{info, warn};
use uuid::Uuid;

use crate::features::auth::{AuthError, AuthenticatedUser, Authenticator};
use crate::features::uploads::dtos::{parse_media_type, UploadKind};
use crate::features::uploads::error::UploadError;
use crate::features::videos::{Video, VideoStore};
use crate::modules::keys::{thumbnail_asset_key, video_asset_key};
use crate::modules::media::{ContainerOptimizer, MediaInspector};
use crate::modules::staging::{StagedFile, StagingArea};
use crate::modules::storage::ObjectPublisher;

/// Per-kind byte ceilings enforced while staging
#[derive(Debug, Clone, Copy)]
pub struct UploadLimits {
    pub max_video_bytes: usize,
    pub max_thumbnail_bytes: usize,
}

impl UploadLimits {
    pub fn for_kind(&self, kind: UploadKind) -> usize {
        match kind {
            UploadKind::Video => self.max_video_bytes,
            UploadKind::Thumbnail => self.max_thumbnail_bytes,
        }
    }
}

/// A caller that has been authenticated and owns the target record
#[derive(Debug)]
pub struct AuthorizedUpload {
    pub user: AuthenticatedUser,
    pub video: Video,
}

/// Runs one upload from credential check to committed record.
///
/// Stateless between calls; every invocation owns its own temporary files.
pub struct UploadOrchestrator {
    authenticator: Arc<dyn Authenticator>,
    videos: Arc<dyn VideoStore>,
    staging: StagingArea,
    inspector: Arc<dyn MediaInspector>,
    optimizer: Arc<dyn ContainerOptimizer>,
    video_publisher: Arc<dyn ObjectPublisher>,
    thumbnail_publisher: Arc<dyn ObjectPublisher>,
    limits: UploadLimits,
}

impl UploadOrchestrator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        authenticator: Arc<dyn Authenticator>,
        videos: Arc<dyn VideoStore>,
        staging: StagingArea,
        inspector: Arc<dyn MediaInspector>,
        optimizer: Arc<dyn ContainerOptimizer>,
        video_publisher: Arc<dyn ObjectPublisher>,
        thumbnail_publisher: Arc<dyn ObjectPublisher>,
        limits: UploadLimits,
    ) -> Self {
        Self {
            authenticator,
            videos,
            staging,
            inspector,
            optimizer,
            video_publisher,
            thumbnail_publisher,
            limits,
        }
    }

    pub fn limits(&self) -> UploadLimits {
        self.limits
    }

    /// Authenticate the caller, load the record and check ownership.
    ///
    /// Nothing is read from the request body until this succeeds.
    pub async fn begin(
        &self,
        credential: Option<&str>,
        video_id: Uuid,
    ) -> Result<AuthorizedUpload, UploadError> {
        let token = credential.ok_or(AuthError::MissingToken)?;
        let user = self.authenticator.authenticate(token).await?;

        let video = self
            .videos
            .get(video_id)
            .await
            .map_err(UploadError::RecordLookup)?;

        if video.user_id != user.user_id {
            warn!(
                "User {} attempted to upload to video {} owned by {}",
                user.user_id, video.id, video.user_id
            );
            return Err(UploadError::Forbidden);
        }

        Ok(AuthorizedUpload { user, video })
    }

    /// Validate, stage, process and publish `body`, then commit its URL to
    /// the record. Temporary files are gone when this returns.
    pub async fn complete<S, E>(
        &self,
        upload: AuthorizedUpload,
        kind: UploadKind,
        declared_type: &str,
        body: S,
    ) -> Result<Video, UploadError>
    where
        S: Stream<Item = Result<Bytes, E>> + Send,
        E: Into<BoxError>,
    {
        let AuthorizedUpload { user, video } = upload;

        let media_type = parse_media_type(declared_type).ok_or_else(|| {
            UploadError::InvalidRequest(format!("Invalid Content-Type '{}'", declared_type))
        })?;
        let extension =
            kind.extension_for(&media_type)
                .ok_or_else(|| UploadError::UnsupportedMediaType {
                    media_type: media_type.clone(),
                    allowed: kind.allowed_media_types(),
                })?;

        let staged = self
            .staging
            .stage(body, extension, self.limits.for_kind(kind))
            .await?;
        info!(
            "Staged {} upload for video {} by user {}: {} bytes",
            media_type,
            video.id,
            user.user_id,
            staged.len()
        );

        let published = match kind {
            UploadKind::Video => self.publish_video(&staged, &media_type, video.id).await,
            UploadKind::Thumbnail => {
                self.publish_thumbnail(&staged, extension, &media_type, video.id)
                    .await
            }
        };
        release(staged);
        let url = published?;

        let video = self
            .videos
            .set_url(video.id, kind.url_field(), &url, Utc::now())
            .await
            .map_err(UploadError::Persist)?;
        info!("Committed {:?} URL for video {}", kind, video.id);

        Ok(video)
    }

    async fn publish_video(
        &self,
        staged: &StagedFile,
        media_type: &str,
        video_id: Uuid,
    ) -> Result<String, UploadError> {
        let aspect = self
            .inspector
            .classify(staged.path())
            .await
            .map_err(UploadError::Probe)?;
        info!("Classified video {} as {}", video_id, aspect.folder());

        let optimized = self
            .optimizer
            .optimize(staged)
            .await
            .map_err(UploadError::Remux)?;
        info!(
            "Optimized video {} for fast start ({} bytes)",
            video_id,
            optimized.len()
        );

        let published: Result<String, UploadError> = async {
            let key = video_asset_key(aspect)?;
            let mut reader = optimized.open().await?;
            self.video_publisher
                .publish(&key, media_type, &mut reader)
                .await?;
            info!("Published video {} as '{}'", video_id, key);
            Ok(self.video_publisher.key_to_url(&key))
        }
        .await;

        release(optimized);
        published
    }

    async fn publish_thumbnail(
        &self,
        staged: &StagedFile,
        extension: &str,
        media_type: &str,
        video_id: Uuid,
    ) -> Result<String, UploadError> {
        let key = thumbnail_asset_key(extension)?;
        let mut reader = staged.open().await?;
        self.thumbnail_publisher
            .publish(&key, media_type, &mut reader)
            .await?;
        info!("Published thumbnail for video {} as '{}'", video_id, key);

        Ok(self.thumbnail_publisher.key_to_url(&key))
    }
}

fn release(file: StagedFile) {
    let path = file.path().to_path_buf();
    if let Err(e) = file.release() {
        warn!("Failed to remove temporary file {:?}: {}", path, e);
    }
}
