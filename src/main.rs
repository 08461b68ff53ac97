mod core;
mod features;
mod modules;
mod shared;

use crate::core::config::Config;
use crate::core::openapi::{ApiDoc, SwaggerInfoModifier};
use crate::core::{database, middleware};
use crate::features::auth::JwtValidator;
use crate::features::uploads::{routes as uploads_routes, UploadLimits, UploadOrchestrator};
use crate::features::videos::PgVideoStore;
use crate::modules::media::{FfmpegOptimizer, FfprobeInspector};
use crate::modules::staging::StagingArea;
use crate::modules::storage::{LocalAssetPublisher, S3Publisher};
use axum::{middleware::from_fn, Router};
use std::sync::Arc;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::services::ServeDir;
use tower_http::trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::Modify;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

fn main() -> anyhow::Result<()> {
    // Build Tokio runtime with configurable worker threads
    let worker_threads = std::env::var("TOKIO_WORKER_THREADS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|p| p.get())
                .unwrap_or(4)
        });

    // ffprobe/ffmpeg run as child processes, file I/O goes through the blocking pool
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(worker_threads)
        .max_blocking_threads(worker_threads * 4)
        .enable_all()
        .build()?;

    runtime.block_on(async_main(worker_threads))
}

async fn async_main(worker_threads: usize) -> anyhow::Result<()> {
    // Load .env file BEFORE initializing logger so RUST_LOG is available
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().map_err(|e| anyhow::anyhow!(e))?;

    tracing::info!(
        "System info: available_cpus={}, tokio_worker_threads={}, pid={}",
        std::thread::available_parallelism()
            .map(|p| p.get())
            .unwrap_or(1),
        worker_threads,
        std::process::id()
    );
    tracing::info!("Configuration loaded successfully");
    tracing::debug!("Storage configuration: {:?}", config.storage);

    // Create database connection pool
    let pool = database::create_pool(&config.database).await?;
    tracing::info!("Database connection pool created");

    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| anyhow::anyhow!("Migration failed: {}", e))?;
    tracing::info!("Database migrations completed successfully");

    // Auth
    let jwt_validator = Arc::new(JwtValidator::new(
        &config.auth.jwt_secret,
        config.auth.issuer.clone(),
        config.auth.jwt_leeway,
    ));
    tracing::info!("JWT validator initialized for issuer: {}", config.auth.issuer);

    // Local staging for in-flight uploads
    let staging = StagingArea::new(&config.media.staging_dir);
    staging.ensure_dir().await.map_err(|e| {
        anyhow::anyhow!(
            "Failed to create staging directory {:?}: {}",
            staging.dir(),
            e
        )
    })?;
    tracing::info!("Staging uploads in {:?}", staging.dir());

    // Media tools
    let inspector = Arc::new(FfprobeInspector::new(config.media.ffprobe_path.clone()));
    let optimizer = Arc::new(FfmpegOptimizer::new(
        config.media.ffmpeg_path.clone(),
        staging.clone(),
    ));
    tracing::info!(
        "Media tools: ffprobe={}, ffmpeg={}",
        config.media.ffprobe_path,
        config.media.ffmpeg_path
    );

    // Video storage (S3)
    let s3_publisher = S3Publisher::new(config.storage.clone())
        .map_err(|e| anyhow::anyhow!("Failed to initialize S3 publisher: {}", e))?;
    tracing::info!(
        "S3 publisher initialized for bucket: {}",
        s3_publisher.bucket_name()
    );

    // Thumbnail storage (local assets)
    let asset_publisher = LocalAssetPublisher::new(
        &config.media.assets_root,
        config.media.assets_base_url.clone(),
    );
    asset_publisher.ensure_root().await.map_err(|e| {
        anyhow::anyhow!(
            "Failed to create assets directory {:?}: {}",
            asset_publisher.root(),
            e
        )
    })?;
    tracing::info!(
        "Serving assets from {:?} at {}",
        asset_publisher.root(),
        config.media.assets_base_url
    );

    let orchestrator = Arc::new(UploadOrchestrator::new(
        jwt_validator,
        Arc::new(PgVideoStore::new(pool.clone())),
        staging,
        inspector,
        optimizer,
        Arc::new(s3_publisher),
        Arc::new(asset_publisher),
        UploadLimits {
            max_video_bytes: config.media.max_video_upload_bytes,
            max_thumbnail_bytes: config.media.max_thumbnail_upload_bytes,
        },
    ));
    tracing::info!("Upload orchestrator initialized");

    // Build application router with dynamic swagger config
    let swagger_modifier = SwaggerInfoModifier {
        title: config.swagger.title.clone(),
        version: config.swagger.version.clone(),
        description: config.swagger.description.clone(),
    };

    let mut openapi = ApiDoc::openapi();
    swagger_modifier.modify(&mut openapi);

    let swagger = if let Some(credentials) = config.swagger.credentials() {
        tracing::info!("Swagger UI basic auth enabled");
        Router::new()
            .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi))
            .layer(from_fn(middleware::basic_auth_middleware(Arc::new(
                credentials,
            ))))
    } else {
        tracing::info!("Swagger UI basic auth disabled (no credentials configured)");
        Router::new().merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi))
    };

    // Simple health check endpoint (no auth required)
    async fn health_check() -> axum::http::StatusCode {
        axum::http::StatusCode::OK
    }
    let health_route = Router::new().route("/health", axum::routing::get(health_check));

    let app = Router::new()
        .merge(swagger)
        .merge(uploads_routes(orchestrator))
        .merge(health_route)
        .nest_service("/assets", ServeDir::new(&config.media.assets_root))
        .layer(middleware::cors_layer(
            config.app.cors_allowed_origins.clone(),
        ))
        // Propagate X-Request-Id to response headers
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(middleware::MakeSpanWithRequestId)
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // Generate X-Request-Id using UUID v7 (or use client-provided one)
        .layer(SetRequestIdLayer::x_request_id(middleware::MakeRequestUuid));

    // Start server
    let addr = config.app.server_address();
    let socket_addr: std::net::SocketAddr = addr
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid address: {}", e))?;

    // Use socket2 for TCP listener configuration
    let socket = socket2::Socket::new(
        socket2::Domain::for_address(socket_addr),
        socket2::Type::STREAM,
        Some(socket2::Protocol::TCP),
    )?;

    socket.set_reuse_address(true)?;
    #[cfg(unix)]
    socket.set_reuse_port(true)?;
    socket.set_nodelay(true)?;

    // Large uploads: bigger socket buffers than the OS default
    socket.set_recv_buffer_size(1024 * 1024)?;
    socket.set_send_buffer_size(256 * 1024)?;

    let keepalive = socket2::TcpKeepalive::new().with_time(std::time::Duration::from_secs(60));
    socket.set_tcp_keepalive(&keepalive)?;

    socket.set_nonblocking(true)?;
    socket.bind(&socket_addr.into())?;
    socket.listen(1024)?;

    let listener = tokio::net::TcpListener::from_std(socket.into())?;
    tracing::info!("Server listening on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui/", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
