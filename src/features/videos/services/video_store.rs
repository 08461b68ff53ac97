use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::features::videos::models::{UrlField, Video};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Video {0} not found")]
    NotFound(Uuid),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Metadata store for video records
#[async_trait]
pub trait VideoStore: Send + Sync {
    async fn get(&self, id: Uuid) -> Result<Video, StoreError>;

    /// Set one URL column and `updated_at`; other columns keep their stored
    /// values. Returns the record as persisted.
    async fn set_url(
        &self,
        id: Uuid,
        field: UrlField,
        url: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<Video, StoreError>;
}

/// Postgres-backed [`VideoStore`]
pub struct PgVideoStore {
    pool: PgPool,
}

impl PgVideoStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VideoStore for PgVideoStore {
    async fn get(&self, id: Uuid) -> Result<Video, StoreError> {
        let video = sqlx::query_as::<_, Video>(
            r#"
            SELECT id, created_at, updated_at, title, description, thumbnail_url, video_url, user_id
            FROM videos
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to get video {}: {:?}", id, e);
            StoreError::Database(e)
        })?;

        video.ok_or(StoreError::NotFound(id))
    }

    async fn set_url(
        &self,
        id: Uuid,
        field: UrlField,
        url: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<Video, StoreError> {
        let query = match field {
            UrlField::Video => {
                r#"
                UPDATE videos
                SET video_url = $2, updated_at = $3
                WHERE id = $1
                RETURNING id, created_at, updated_at, title, description, thumbnail_url, video_url, user_id
                "#
            }
            UrlField::Thumbnail => {
                r#"
                UPDATE videos
                SET thumbnail_url = $2, updated_at = $3
                WHERE id = $1
                RETURNING id, created_at, updated_at, title, description, thumbnail_url, video_url, user_id
                "#
            }
        };

        let video = sqlx::query_as::<_, Video>(query)
            .bind(id)
            .bind(url)
            .bind(updated_at)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to set {:?} URL of video {}: {:?}", field, id, e);
                StoreError::Database(e)
            })?;

        video.ok_or(StoreError::NotFound(id))
    }
}
