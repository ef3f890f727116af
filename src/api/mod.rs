// src/api/mod.rs
use actix_web::{web, App, HttpResponse, HttpServer, Responder};
use actix_cors::Cors;
use crate::core::vault::Vault;
use types::HealthResponse;
use utoipa::{OpenApi, Modify};
use utoipa_swagger_ui::SwaggerUi;
use utoipa_redoc::{Redoc, Servable};

// SecurityAddon registers the bearer scheme used by protected routes
#[derive(Default)]
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = &mut openapi.components {
            components.add_security_scheme(
                "bearer_auth",
                utoipa::openapi::security::SecurityScheme::Http(
                    utoipa::openapi::security::HttpBuilder::new()
                        .scheme(utoipa::openapi::security::HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

// This will hold our API documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        // Authentication endpoints
        crate::api::handlers::auth::register,
        crate::api::handlers::auth::login,
        crate::api::handlers::auth::check_status,
        crate::api::handlers::auth::logout,
        crate::api::handlers::auth::change_password,

        // Credential endpoints
        crate::api::handlers::credentials::list_credentials,
        crate::api::handlers::credentials::add_credential,
        crate::api::handlers::credentials::get_credential,
        crate::api::handlers::credentials::update_credential,
        crate::api::handlers::credentials::delete_credential,
        crate::api::handlers::credentials::count_credentials,

        // Generator endpoints
        crate::api::handlers::generator::generate_password,
        crate::api::handlers::generator::analyze_password,

        // Tool endpoints
        crate::api::handlers::tools::breach_check,
        crate::api::handlers::tools::geolocation,
        crate::api::handlers::tools::favicon,

        // System endpoints
        crate::api::health
    ),
    components(
        schemas(
            // Authentication schemas
            crate::api::types::RegisterRequest,
            crate::api::types::LoginRequest,
            crate::api::types::TokenResponse,
            crate::api::types::UserSummary,
            crate::api::types::StatusResponse,
            crate::api::types::SuccessResponse,
            crate::api::types::ChangePasswordRequest,

            // Credential schemas
            crate::api::types::CredentialSummary,
            crate::api::types::CredentialDetail,
            crate::api::types::CredentialListResponse,
            crate::api::types::AddCredentialRequest,
            crate::api::types::UpdateCredentialRequest,
            crate::api::types::CountResponse,

            // Generator schemas
            crate::api::types::GenerationRequest,
            crate::api::types::GenerationResponse,
            crate::api::types::AnalysisResponse,
            crate::models::StrengthLabel,

            // Tool schemas
            crate::api::types::BreachCheckRequest,
            crate::api::types::BreachCheckResponse,
            crate::api::types::GeoResponse,
            crate::api::types::FaviconResponse,
            crate::tools::geo::GeoLocation,

            crate::api::types::HealthResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "Account and session management endpoints"),
        (name = "Credentials", description = "Credential storage endpoints"),
        (name = "Generator", description = "Password generation and analysis endpoints"),
        (name = "Tools", description = "Breach check, geolocation and favicon helpers"),
        (name = "System", description = "System status endpoints")
    ),
    info(
        title = "KeyHaven API",
        version = "0.1.0",
        description = "Multi-user password manager backend",
        license(name = "MIT"),
        contact(
            name = "KeyHaven Team",
            email = "contact@keyhaven.example.com",
            url = "https://keyhaven.example.com"
        )
    )
)]
struct ApiDoc;

/// Liveness check
#[utoipa::path(
    get,
    path = "/health",
    tag = "System",
    responses(
        (status = 200, description = "Server is up", body = HealthResponse)
    )
)]
async fn health() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        success: true,
        service: "keyhaven".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

pub async fn start_server(vault: web::Data<Vault>, host: &str, port: u16) -> std::io::Result<()> {
    log::info!("🚀 Starting KeyHaven API server on {}:{}", host, port);

    // Clone the handle once outside the closure to avoid borrow checker issues
    let vault_data = vault;

    HttpServer::new(move || {
        // Configure CORS
        let cors = Cors::default()
            .allow_any_origin() // Allow requests from any origin during development
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE"])
            .allowed_headers(vec![
                "Authorization",
                "Content-Type",
                "Accept",
                "X-Requested-With",
            ])
            .supports_credentials() // Important for authentication requests
            .max_age(3600);

        App::new()
            .wrap(cors)
            .app_data(vault_data.clone())
            // Add Swagger UI
            .service(
                SwaggerUi::new("/docs/{_:.*}")
                    .url("/api-docs/openapi.json", ApiDoc::openapi())
            )
            // Add Redoc
            .service(Redoc::with_url("/redoc", ApiDoc::openapi()))
            .route("/health", web::get().to(health))
            // Configure the regular API routes
            .configure(routes::configure_routes)
    })
    .bind((host, port))?
    .run()
    .await
}

pub mod types;
pub mod routes;
pub mod handlers;
pub mod middleware;
pub mod utils;
