//! S3-compatible video storage
//!
//! Works against AWS S3 (virtual-host addressing) or any S3-compatible
//! endpoint such as MinIO (path-style addressing). The bucket and its
//! public-read policy are provisioned outside this service.

use async_trait::async_trait;
use s3::creds::Credentials;
use s3::{Bucket, Region};
use tokio::io::AsyncRead;
use tracing::{debug, info};

use super::{ObjectPublisher, PublishError};
use crate::core::config::StorageConfig;

/// How public object URLs are formed, fixed at construction
#[derive(Debug, Clone, PartialEq, Eq)]
enum UrlScheme {
    /// `https://{distribution}/{key}`
    Cdn { distribution: String },
    /// `{endpoint}/{bucket}/{key}`
    PathStyle { endpoint: String, bucket: String },
    /// `https://{bucket}.s3.{region}.amazonaws.com/{key}`
    Regional { bucket: String, region: String },
}

impl UrlScheme {
    fn from_config(config: &StorageConfig) -> Self {
        if let Some(distribution) = &config.cdn_distribution {
            let distribution = distribution
                .trim_start_matches("https://")
                .trim_start_matches("http://")
                .trim_end_matches('/');
            return UrlScheme::Cdn {
                distribution: distribution.to_string(),
            };
        }

        match config.public_endpoint.as_ref().or(config.endpoint.as_ref()) {
            Some(endpoint) => UrlScheme::PathStyle {
                endpoint: endpoint.clone(),
                bucket: config.bucket.clone(),
            },
            None => UrlScheme::Regional {
                bucket: config.bucket.clone(),
                region: config.region.clone(),
            },
        }
    }

    fn url(&self, key: &str) -> String {
        match self {
            UrlScheme::Cdn { distribution } => format!("https://{}/{}", distribution, key),
            UrlScheme::PathStyle { endpoint, bucket } => {
                format!("{}/{}/{}", endpoint, bucket, key)
            }
            UrlScheme::Regional { bucket, region } => {
                format!("https://{}.s3.{}.amazonaws.com/{}", bucket, region, key)
            }
        }
    }
}

/// Publishes videos to a pre-provisioned S3 bucket
pub struct S3Publisher {
    bucket: Box<Bucket>,
    url_scheme: UrlScheme,
}

impl S3Publisher {
    /// Build a publisher from configuration. Performs no network I/O.
    pub fn new(config: StorageConfig) -> Result<Self, PublishError> {
        let credentials = Credentials::new(
            Some(&config.access_key),
            Some(&config.secret_key),
            None,
            None,
            None,
        )
        .map_err(|e| PublishError::Setup(format!("Failed to create S3 credentials: {}", e)))?;

        let endpoint = config
            .endpoint
            .clone()
            .unwrap_or_else(|| format!("https://s3.{}.amazonaws.com", config.region));
        let region = Region::Custom {
            region: config.region.clone(),
            endpoint: endpoint.clone(),
        };

        let mut bucket = Bucket::new(&config.bucket, region, credentials)
            .map_err(|e| PublishError::Setup(format!("Failed to create S3 bucket handle: {}", e)))?;

        // MinIO and friends want http://endpoint/bucket instead of http://bucket.endpoint
        let path_style = config.endpoint.is_some();
        if path_style {
            bucket.set_path_style();
        }

        info!(
            "S3 publisher configured for endpoint: {}, bucket: {}, path_style: {}",
            endpoint,
            bucket.name(),
            path_style
        );

        Ok(Self {
            url_scheme: UrlScheme::from_config(&config),
            bucket,
        })
    }

    pub fn bucket_name(&self) -> String {
        self.bucket.name()
    }
}

#[async_trait]
impl ObjectPublisher for S3Publisher {
    async fn publish(
        &self,
        key: &str,
        content_type: &str,
        reader: &mut (dyn AsyncRead + Unpin + Send),
    ) -> Result<(), PublishError> {
        let mut reader = reader;
        let response = self
            .bucket
            .put_object_stream_with_content_type(&mut reader, key, content_type)
            .await
            .map_err(|e| PublishError::Transport {
                key: key.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status_code();
        if !(200..300).contains(&status) {
            return Err(PublishError::Rejected {
                key: key.to_string(),
                status,
            });
        }

        debug!(
            "Uploaded '{}' ({}, {} bytes) to bucket '{}'",
            key,
            content_type,
            response.uploaded_bytes(),
            self.bucket.name()
        );
        Ok(())
    }

    fn key_to_url(&self, key: &str) -> String {
        self.url_scheme.url(key)
    }
}
