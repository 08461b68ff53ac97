//! In-memory stand-ins for the upload pipeline's collaborators

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use fake::faker::lorem::en::{Paragraph, Sentence};
use fake::Fake;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use uuid::Uuid;

use crate::features::auth::{AuthError, AuthenticatedUser, Authenticator};
use crate::features::videos::{StoreError, UrlField, Video, VideoStore};
use crate::modules::media::{
    AspectClass, ContainerOptimizer, MediaError, MediaInspector, OptimizedFile,
};
use crate::modules::staging::{StagedFile, StagingArea};
use crate::modules::storage::{ObjectPublisher, PublishError};

/// A video record owned by `owner`, last touched a day ago
pub fn fake_video(owner: Uuid) -> Video {
    let yesterday = Utc::now() - Duration::days(1);
    Video {
        id: Uuid::new_v4(),
        created_at: yesterday,
        updated_at: yesterday,
        title: Sentence(2..5).fake(),
        description: Paragraph(1..3).fake(),
        thumbnail_url: None,
        video_url: None,
        user_id: owner,
    }
}

/// Accepts exactly the tokens it was given
#[derive(Default)]
pub struct FakeAuthenticator {
    tokens: HashMap<String, Uuid>,
}

impl FakeAuthenticator {
    pub fn with_user(mut self, token: &str, user_id: Uuid) -> Self {
        self.tokens.insert(token.to_string(), user_id);
        self
    }
}

#[async_trait]
impl Authenticator for FakeAuthenticator {
    async fn authenticate(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        self.tokens
            .get(token)
            .map(|&user_id| AuthenticatedUser { user_id })
            .ok_or_else(|| AuthError::InvalidToken("unknown token".to_string()))
    }
}

#[derive(Default)]
pub struct InMemoryVideoStore {
    videos: Mutex<HashMap<Uuid, Video>>,
    fail_updates: AtomicBool,
}

impl InMemoryVideoStore {
    pub fn insert(&self, video: Video) {
        self.videos.lock().unwrap().insert(video.id, video);
    }

    pub fn snapshot(&self, id: Uuid) -> Option<Video> {
        self.videos.lock().unwrap().get(&id).cloned()
    }

    pub fn fail_updates(&self) {
        self.fail_updates.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl VideoStore for InMemoryVideoStore {
    async fn get(&self, id: Uuid) -> Result<Video, StoreError> {
        self.snapshot(id).ok_or(StoreError::NotFound(id))
    }

    async fn set_url(
        &self,
        id: Uuid,
        field: UrlField,
        url: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<Video, StoreError> {
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
        }
        let mut videos = self.videos.lock().unwrap();
        let stored = videos.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        match field {
            UrlField::Video => stored.video_url = Some(url.to_string()),
            UrlField::Thumbnail => stored.thumbnail_url = Some(url.to_string()),
        }
        stored.updated_at = updated_at;
        Ok(stored.clone())
    }
}

/// Reports a fixed aspect, or a probe failure when built with `None`
pub struct FakeInspector {
    aspect: Option<AspectClass>,
    calls: AtomicUsize,
}

impl FakeInspector {
    pub fn new(aspect: Option<AspectClass>) -> Self {
        Self {
            aspect,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MediaInspector for FakeInspector {
    async fn classify(&self, path: &Path) -> Result<AspectClass, MediaError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        assert!(path.exists(), "classify called on a missing file");
        self.aspect.ok_or_else(|| MediaError::ToolFailed {
            tool: "ffprobe".to_string(),
            status: "exit status: 1".to_string(),
            stderr: "moov atom not found".to_string(),
        })
    }
}

/// Copies the source into a fresh staged file, prefixed with `faststart:`
pub struct FakeOptimizer {
    staging: StagingArea,
    fail: bool,
}

impl FakeOptimizer {
    pub fn new(staging: StagingArea) -> Self {
        Self {
            staging,
            fail: false,
        }
    }

    pub fn failing(staging: StagingArea) -> Self {
        Self {
            staging,
            fail: true,
        }
    }
}

#[async_trait]
impl ContainerOptimizer for FakeOptimizer {
    async fn optimize(&self, source: &StagedFile) -> Result<OptimizedFile, MediaError> {
        let mut output = self.staging.reserve("faststart", "mp4")?;
        if self.fail {
            return Err(MediaError::ToolFailed {
                tool: "ffmpeg".to_string(),
                status: "exit status: 1".to_string(),
                stderr: "Invalid data found when processing input".to_string(),
            });
        }

        let content = tokio::fs::read(source.path()).await.unwrap();
        let mut file = tokio::fs::File::create(output.path()).await.unwrap();
        file.write_all(b"faststart:").await.unwrap();
        file.write_all(&content).await.unwrap();
        file.flush().await.unwrap();
        output.sync_len().await.unwrap();
        Ok(output)
    }
}

/// Keeps published objects in memory
pub struct RecordingPublisher {
    base_url: String,
    objects: Mutex<HashMap<String, (String, Vec<u8>)>>,
    fail: bool,
}

impl RecordingPublisher {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            objects: Mutex::new(HashMap::new()),
            fail: false,
        }
    }

    pub fn failing(base_url: &str) -> Self {
        Self {
            fail: true,
            ..Self::new(base_url)
        }
    }

    /// Published `(key, content type, body)` triples
    pub fn objects(&self) -> Vec<(String, String, Vec<u8>)> {
        self.objects
            .lock()
            .unwrap()
            .iter()
            .map(|(k, (ct, body))| (k.clone(), ct.clone(), body.clone()))
            .collect()
    }
}

#[async_trait]
impl ObjectPublisher for RecordingPublisher {
    async fn publish(
        &self,
        key: &str,
        content_type: &str,
        reader: &mut (dyn AsyncRead + Unpin + Send),
    ) -> Result<(), PublishError> {
        if self.fail {
            return Err(PublishError::Rejected {
                key: key.to_string(),
                status: 503,
            });
        }
        let mut body = Vec::new();
        reader.read_to_end(&mut body).await.unwrap();
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), (content_type.to_string(), body));
        Ok(())
    }

    fn key_to_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url, key)
    }
}
