use std::env;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub swagger: SwaggerConfig,
    pub storage: StorageConfig,
    pub media: MediaConfig,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    pub max_lifetime_secs: u64,
}

#[derive(Clone)]
pub struct AuthConfig {
    /// Shared HS256 secret used to verify access tokens
    pub jwt_secret: String,
    pub issuer: String,
    pub jwt_leeway: Duration,
}

// Keep the secret out of startup logs
impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"***")
            .field("issuer", &self.issuer)
            .field("jwt_leeway", &self.jwt_leeway)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct SwaggerConfig {
    pub username: Option<String>,
    pub password: Option<String>,
    pub title: String,
    pub version: String,
    pub description: String,
}

/// Object storage configuration for published videos
#[derive(Clone)]
pub struct StorageConfig {
    /// Bucket that receives optimized videos
    pub bucket: String,
    /// Region used for signing and for regional object URLs
    pub region: String,
    /// S3-compatible endpoint (e.g. MinIO). `None` means AWS S3 in `region`.
    pub endpoint: Option<String>,
    /// Public endpoint for object URLs when using a custom endpoint (defaults to `endpoint`)
    pub public_endpoint: Option<String>,
    /// CDN distribution host; takes precedence over every other URL form
    pub cdn_distribution: Option<String>,
    pub access_key: String,
    pub secret_key: String,
}

impl std::fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageConfig")
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .field("endpoint", &self.endpoint)
            .field("public_endpoint", &self.public_endpoint)
            .field("cdn_distribution", &self.cdn_distribution)
            .field("access_key", &self.access_key)
            .field("secret_key", &"***")
            .finish()
    }
}

/// External media tools, local staging and per-kind upload ceilings
#[derive(Debug, Clone)]
pub struct MediaConfig {
    pub ffprobe_path: String,
    pub ffmpeg_path: String,
    /// Directory for in-flight uploads and remux outputs
    pub staging_dir: PathBuf,
    /// Directory served under `/assets` (thumbnails)
    pub assets_root: PathBuf,
    /// Public base URL of `assets_root`, without trailing slash
    pub assets_base_url: String,
    pub max_video_upload_bytes: usize,
    pub max_thumbnail_upload_bytes: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        // Load .env file if exists, ignore if not found (optional for production)
        if let Err(e) = dotenvy::dotenv() {
            if !e.to_string().contains("not found") {
                eprintln!("Warning: Error loading .env file: {}", e);
            }
        }

        let app = AppConfig::from_env()?;
        let media = MediaConfig::from_env(&app)?;

        Ok(Config {
            database: DatabaseConfig::from_env()?,
            auth: AuthConfig::from_env()?,
            swagger: SwaggerConfig::from_env()?,
            storage: StorageConfig::from_env()?,
            media,
            app,
        })
    }
}

impl AppConfig {
    const DEFAULT_PORT: u16 = 8091;

    pub fn from_env() -> Result<Self, String> {
        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("PORT")
            .unwrap_or_else(|_| Self::DEFAULT_PORT.to_string())
            .parse::<u16>()
            .map_err(|e| format!("Invalid PORT: {}", e))?;

        // Parse CORS allowed origins from comma-separated string
        let cors_allowed_origins = env::var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Self {
            host,
            port,
            cors_allowed_origins,
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl DatabaseConfig {
    const DEFAULT_MAX_CONNECTIONS: u32 = 10;
    const DEFAULT_MIN_CONNECTIONS: u32 = 1;
    const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 5;
    const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 600; // 10 minutes
    const DEFAULT_MAX_LIFETIME_SECS: u64 = 1800; // 30 minutes

    pub fn from_env() -> Result<Self, String> {
        let url = env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set".to_string())?;

        Ok(Self {
            url,
            max_connections: parse_or("DB_MAX_CONNECTIONS", Self::DEFAULT_MAX_CONNECTIONS)?,
            min_connections: parse_or("DB_MIN_CONNECTIONS", Self::DEFAULT_MIN_CONNECTIONS)?,
            acquire_timeout_secs: parse_or(
                "DB_ACQUIRE_TIMEOUT_SECS",
                Self::DEFAULT_ACQUIRE_TIMEOUT_SECS,
            )?,
            idle_timeout_secs: parse_or("DB_IDLE_TIMEOUT_SECS", Self::DEFAULT_IDLE_TIMEOUT_SECS)?,
            max_lifetime_secs: parse_or("DB_MAX_LIFETIME_SECS", Self::DEFAULT_MAX_LIFETIME_SECS)?,
        })
    }
}

impl AuthConfig {
    const DEFAULT_ISSUER: &'static str = "tubely-access";
    const DEFAULT_JWT_LEEWAY_SECS: u64 = 60;

    pub fn from_env() -> Result<Self, String> {
        let jwt_secret = env::var("JWT_SECRET")
            .ok()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| "JWT_SECRET environment variable is required".to_string())?;

        let issuer = env::var("JWT_ISSUER").unwrap_or_else(|_| Self::DEFAULT_ISSUER.to_string());
        let jwt_leeway_secs = parse_or("JWT_LEEWAY", Self::DEFAULT_JWT_LEEWAY_SECS)?;

        Ok(Self {
            jwt_secret,
            issuer,
            jwt_leeway: Duration::from_secs(jwt_leeway_secs),
        })
    }
}

impl SwaggerConfig {
    pub fn from_env() -> Result<Self, String> {
        // Only use credentials if they are non-empty
        let username = env::var("SWAGGER_USERNAME").ok().filter(|s| !s.is_empty());
        let password = env::var("SWAGGER_PASSWORD").ok().filter(|s| !s.is_empty());
        let title = env::var("SWAGGER_TITLE").unwrap_or_else(|_| "Tubely API".to_string());
        let version = env::var("SWAGGER_VERSION").unwrap_or_else(|_| "0.1.0".to_string());
        let description = env::var("SWAGGER_DESCRIPTION")
            .unwrap_or_else(|_| "Video and thumbnail upload API".to_string());

        Ok(Self {
            username,
            password,
            title,
            version,
            description,
        })
    }

    /// Returns credentials in "username:password" format if auth is enabled
    pub fn credentials(&self) -> Option<String> {
        match (&self.username, &self.password) {
            (Some(user), Some(pass)) => Some(format!("{}:{}", user, pass)),
            _ => None,
        }
    }
}

impl StorageConfig {
    pub fn from_env() -> Result<Self, String> {
        let bucket = env::var("S3_BUCKET")
            .ok()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| "S3_BUCKET environment variable is required".to_string())?;

        let region = env::var("S3_REGION").unwrap_or_else(|_| "us-east-1".to_string());

        let endpoint = non_empty_var("S3_ENDPOINT").map(|e| e.trim_end_matches('/').to_string());
        let public_endpoint =
            non_empty_var("S3_PUBLIC_ENDPOINT").map(|e| e.trim_end_matches('/').to_string());
        let cdn_distribution = non_empty_var("S3_CF_DISTRIBUTION");

        let access_key = env::var("AWS_ACCESS_KEY_ID").unwrap_or_else(|_| "minioadmin".to_string());
        let secret_key =
            env::var("AWS_SECRET_ACCESS_KEY").unwrap_or_else(|_| "minioadmin".to_string());

        Ok(Self {
            bucket,
            region,
            endpoint,
            public_endpoint,
            cdn_distribution,
            access_key,
            secret_key,
        })
    }
}

impl MediaConfig {
    const DEFAULT_MAX_VIDEO_UPLOAD_BYTES: usize = 1 << 30; // 1 GiB
    const DEFAULT_MAX_THUMBNAIL_UPLOAD_BYTES: usize = 10 << 20; // 10 MiB

    pub fn from_env(app: &AppConfig) -> Result<Self, String> {
        let ffprobe_path = env::var("FFPROBE_PATH").unwrap_or_else(|_| "ffprobe".to_string());
        let ffmpeg_path = env::var("FFMPEG_PATH").unwrap_or_else(|_| "ffmpeg".to_string());

        let staging_dir = non_empty_var("STAGING_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(env::temp_dir);

        let assets_root = PathBuf::from(
            env::var("ASSETS_ROOT").unwrap_or_else(|_| "./assets".to_string()),
        );

        let assets_base_url = env::var("ASSETS_BASE_URL")
            .unwrap_or_else(|_| format!("http://localhost:{}/assets", app.port))
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            ffprobe_path,
            ffmpeg_path,
            staging_dir,
            assets_root,
            assets_base_url,
            max_video_upload_bytes: parse_or(
                "MAX_VIDEO_UPLOAD_BYTES",
                Self::DEFAULT_MAX_VIDEO_UPLOAD_BYTES,
            )?,
            max_thumbnail_upload_bytes: parse_or(
                "MAX_THUMBNAIL_UPLOAD_BYTES",
                Self::DEFAULT_MAX_THUMBNAIL_UPLOAD_BYTES,
            )?,
        })
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|s| !s.trim().is_empty())
}

fn parse_or<T>(name: &str, default: T) -> Result<T, String>
where
    T: std::str::FromStr + ToString,
{
    env::var(name)
        .unwrap_or_else(|_| default.to_string())
        .parse::<T>()
        .map_err(|_| format!("{} must be a valid {}", name, std::any::type_name::<T>()))
}
