use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// Video metadata record
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize, ToSchema)]
pub struct Video {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub title: String,
    pub description: String,
    /// Public URL of the thumbnail, once uploaded
    pub thumbnail_url: Option<String>,
    /// Public URL of the optimized video, once uploaded
    pub video_url: Option<String>,
    /// Owner
    pub user_id: Uuid,
}

/// Public URL column filled by an upload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlField {
    Video,
    Thumbnail,
}
