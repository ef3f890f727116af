// src/api/handlers/generator.rs

use actix_web::{web, HttpResponse, Responder};
use crate::models::GenerationPolicy;
use crate::generators;
use crate::api::types::{GenerationRequest, GenerationResponse, AnalysisResponse};

/// Generate a password
///
/// Generates a password from the requested policy. Absent fields take
/// the policy defaults; out-of-range lengths are normalized rather
/// than rejected.
#[utoipa::path(
    post,
    path = "/generator/password",
    tag = "Generator",
    security(
        ("bearer_auth" = [])
    ),
    request_body = GenerationRequest,
    responses(
        (status = 200, description = "Generated password", body = GenerationResponse),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn generate_password(
    body: web::Json<GenerationRequest>,
) -> impl Responder {
    let policy = GenerationPolicy {
        length: body.length.unwrap_or(16),
        include_uppercase: body.include_uppercase.unwrap_or(true),
        include_lowercase: body.include_lowercase.unwrap_or(true),
        include_numbers: body.include_numbers.unwrap_or(true),
        include_symbols: body.include_symbols.unwrap_or(true),
    };

    let password = generators::generate(&policy);
    let score = generators::strength_score(&password);
    let strength = generators::classify(&password);

    HttpResponse::Ok().json(GenerationResponse {
        success: true,
        password,
        strength,
        score,
    })
}

/// Analyze password strength
///
/// Classifies the candidate and suggests improvements.
#[utoipa::path(
    get,
    path = "/generator/analysis/{candidate}",
    tag = "Generator",
    params(
        ("candidate" = String, Path, description = "Password to analyze (URL-encoded)")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Password analysis result", body = AnalysisResponse),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn analyze_password(
    path: web::Path<String>,
) -> impl Responder {
    let candidate = path.into_inner();

    // URL decode the candidate if needed
    let decoded = match urlencoding::decode(&candidate) {
        Ok(decoded) => decoded.to_string(),
        Err(_) => candidate.clone(),
    };

    let score = generators::strength_score(&decoded);
    let strength = generators::classify(&decoded);
    let feedback = generators::improvement_hints(&decoded);

    HttpResponse::Ok().json(AnalysisResponse {
        success: true,
        strength,
        score,
        feedback,
    })
}
