use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::features::auth;
use crate::features::uploads::{dtos as uploads_dtos, handlers as uploads_handlers};
use crate::features::videos::models as videos_models;
use crate::modules::media::AspectClass;
use crate::shared::types::ApiResponse;

#[derive(OpenApi)]
#[openapi(
    paths(
        // Uploads
        uploads_handlers::upload_video,
        uploads_handlers::upload_thumbnail,
    ),
    components(
        schemas(
            // Auth
            auth::model::AuthenticatedUser,
            // Videos
            videos_models::Video,
            ApiResponse<videos_models::Video>,
            // Uploads
            uploads_dtos::UploadKind,
            uploads_dtos::VideoUploadForm,
            uploads_dtos::ThumbnailUploadForm,
            AspectClass,
        )
    ),
    tags(
        (name = "uploads", description = "Video and thumbnail uploads"),
    ),
    modifiers(&SecurityAddon),
    info(
        title = "Tubely API",
        version = "0.1.0",
        description = "API documentation for Tubely",
    )
)]
pub struct ApiDoc;

/// Adds Bearer JWT security scheme to OpenAPI spec
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}
