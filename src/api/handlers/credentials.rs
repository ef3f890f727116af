// src/api/handlers/credentials.rs
use actix_web::{web, HttpRequest, HttpResponse, Responder};
use uuid::Uuid;
use crate::core::vault::Vault;
use crate::core::auth::AuthError;
use crate::db::DbError;
use crate::generators;
use crate::models::CredentialFilter;
use crate::api::types::{
    CredentialListResponse, CredentialSummary, CredentialDetail,
    AddCredentialRequest, UpdateCredentialRequest, SuccessResponse,
    CountResponse, CredentialQuery,
};
use crate::api::utils::bearer_token;
use log::{info, error, debug};

fn unauthorized_envelope() -> HttpResponse {
    HttpResponse::Unauthorized()
        .append_header(("Access-Control-Allow-Origin", "*"))
        .json(SuccessResponse {
            success: false,
            message: None,
            error: Some("Missing or invalid authorization header".to_string()),
        })
}

/// List stored credentials
///
/// Returns the user's credentials, newest first, without secret values.
/// Supports filtering by category and a free-text search.
#[utoipa::path(
    get,
    path = "/credentials",
    tag = "Credentials",
    security(
        ("bearer_auth" = [])
    ),
    params(CredentialQuery),
    responses(
        (status = 200, description = "List of credentials", body = CredentialListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn list_credentials(
    vault: web::Data<Vault>,
    req: HttpRequest,
    query: web::Query<CredentialQuery>,
) -> impl Responder {
    debug!("🔍 list_credentials called");

    let token = match bearer_token(&req) {
        Some(token) => token,
        None => {
            return HttpResponse::Unauthorized()
                .append_header(("Access-Control-Allow-Origin", "*"))
                .json(CredentialListResponse {
                    success: false,
                    credentials: vec![],
                    error: Some("Missing or invalid authorization header".to_string()),
                });
        }
    };

    let query = query.into_inner();
    let filter = CredentialFilter {
        category: query.category,
        search: query.search,
    };

    match vault.get_credentials(&token, &filter).await {
        Ok(records) => {
            debug!("✅ Retrieved {} credentials", records.len());
            let credentials: Vec<CredentialSummary> = records
                .into_iter()
                .map(|record| CredentialSummary {
                    id: record.id.to_string(),
                    name: record.name,
                    username: record.username,
                    url: record.url,
                    category: record.category,
                    notes: record.notes,
                    created_at: record.created_at.to_rfc3339(),
                    updated_at: record.updated_at.to_rfc3339(),
                })
                .collect();

            HttpResponse::Ok()
                .append_header(("Access-Control-Allow-Origin", "*"))
                .json(CredentialListResponse {
                    success: true,
                    credentials,
                    error: None,
                })
        },
        Err(e) => {
            error!("Failed to list credentials: {}", e);
            HttpResponse::InternalServerError()
                .append_header(("Access-Control-Allow-Origin", "*"))
                .json(CredentialListResponse {
                    success: false,
                    credentials: vec![],
                    error: Some(format!("Failed to list credentials: {}", e)),
                })
        }
    }
}

/// Get a specific credential
///
/// Returns one credential including the decrypted secret and its
/// strength label.
#[utoipa::path(
    get,
    path = "/credentials/{id}",
    tag = "Credentials",
    security(
        ("bearer_auth" = [])
    ),
    params(
        ("id" = String, Path, description = "Credential UUID")
    ),
    responses(
        (status = 200, description = "Credential found", body = CredentialDetail),
        (status = 400, description = "Invalid UUID"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Credential not found"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn get_credential(
    vault: web::Data<Vault>,
    req: HttpRequest,
    path: web::Path<String>,
) -> impl Responder {
    debug!("🔍 get_credential called");

    let token = match bearer_token(&req) {
        Some(token) => token,
        None => return unauthorized_envelope(),
    };

    let id = match Uuid::parse_str(&path) {
        Ok(id) => id,
        Err(_) => {
            return HttpResponse::BadRequest()
                .append_header(("Access-Control-Allow-Origin", "*"))
                .json(SuccessResponse {
                    success: false,
                    message: None,
                    error: Some("Invalid UUID format".to_string()),
                });
        }
    };

    match vault.get_credential(&token, id).await {
        Ok((record, secret)) => {
            let strength = generators::classify(&secret);

            let detail = CredentialDetail {
                id: record.id.to_string(),
                name: record.name,
                username: record.username,
                secret,
                strength,
                url: record.url,
                category: record.category,
                notes: record.notes,
                created_at: record.created_at.to_rfc3339(),
                updated_at: record.updated_at.to_rfc3339(),
            };

            HttpResponse::Ok()
                .append_header(("Access-Control-Allow-Origin", "*"))
                .json(detail)
        },
        Err(AuthError::DbError(DbError::NotFound)) => {
            HttpResponse::NotFound()
                .append_header(("Access-Control-Allow-Origin", "*"))
                .json(SuccessResponse {
                    success: false,
                    message: None,
                    error: Some(format!("Credential with ID {} not found", id)),
                })
        },
        Err(e) => {
            error!("Failed to get credential: {}", e);
            HttpResponse::InternalServerError()
                .append_header(("Access-Control-Allow-Origin", "*"))
                .json(SuccessResponse {
                    success: false,
                    message: None,
                    error: Some(format!("Failed to get credential: {}", e)),
                })
        }
    }
}

/// Add a new credential
///
/// Stores a new credential with the secret encrypted under the
/// session's vault key.
#[utoipa::path(
    post,
    path = "/credentials",
    tag = "Credentials",
    security(
        ("bearer_auth" = [])
    ),
    request_body = AddCredentialRequest,
    responses(
        (status = 201, description = "Credential added successfully", body = SuccessResponse),
        (status = 400, description = "Bad request"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn add_credential(
    vault: web::Data<Vault>,
    req: HttpRequest,
    body: web::Json<AddCredentialRequest>,
) -> impl Responder {
    debug!("🔍 add_credential called");

    let token = match bearer_token(&req) {
        Some(token) => token,
        None => return unauthorized_envelope(),
    };

    if body.name.trim().is_empty() {
        return HttpResponse::BadRequest()
            .append_header(("Access-Control-Allow-Origin", "*"))
            .json(SuccessResponse {
                success: false,
                message: None,
                error: Some("Name cannot be empty".to_string()),
            });
    }

    if body.username.trim().is_empty() {
        return HttpResponse::BadRequest()
            .append_header(("Access-Control-Allow-Origin", "*"))
            .json(SuccessResponse {
                success: false,
                message: None,
                error: Some("Username cannot be empty".to_string()),
            });
    }

    if body.secret.trim().is_empty() {
        return HttpResponse::BadRequest()
            .append_header(("Access-Control-Allow-Origin", "*"))
            .json(SuccessResponse {
                success: false,
                message: None,
                error: Some("Secret cannot be empty".to_string()),
            });
    }

    let category = body.category.as_deref().unwrap_or("other");

    match vault.add_credential(
        &token,
        &body.name,
        &body.username,
        &body.secret,
        body.url.as_deref(),
        category,
        body.notes.as_deref(),
    ).await {
        Ok(id) => {
            info!("Credential added successfully with ID: {}", id);
            HttpResponse::Created()
                .append_header(("Access-Control-Allow-Origin", "*"))
                .json(SuccessResponse {
                    success: true,
                    message: Some(format!("Credential added successfully with ID: {}", id)),
                    error: None,
                })
        },
        Err(e) => {
            error!("Failed to add credential: {}", e);
            HttpResponse::InternalServerError()
                .append_header(("Access-Control-Allow-Origin", "*"))
                .json(SuccessResponse {
                    success: false,
                    message: None,
                    error: Some(format!("Failed to add credential: {}", e)),
                })
        }
    }
}

/// Update a credential
///
/// Applies a partial update; omitted fields keep their current values.
#[utoipa::path(
    put,
    path = "/credentials/{id}",
    tag = "Credentials",
    security(
        ("bearer_auth" = [])
    ),
    params(
        ("id" = String, Path, description = "Credential UUID")
    ),
    request_body = UpdateCredentialRequest,
    responses(
        (status = 200, description = "Credential updated successfully", body = SuccessResponse),
        (status = 400, description = "Bad request"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Credential not found"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn update_credential(
    vault: web::Data<Vault>,
    req: HttpRequest,
    path: web::Path<String>,
    body: web::Json<UpdateCredentialRequest>,
) -> impl Responder {
    debug!("🔍 update_credential called");

    let token = match bearer_token(&req) {
        Some(token) => token,
        None => return unauthorized_envelope(),
    };

    let id = match Uuid::parse_str(&path) {
        Ok(id) => id,
        Err(_) => {
            return HttpResponse::BadRequest()
                .append_header(("Access-Control-Allow-Origin", "*"))
                .json(SuccessResponse {
                    success: false,
                    message: None,
                    error: Some("Invalid UUID format".to_string()),
                });
        }
    };

    if body.is_empty() {
        return HttpResponse::BadRequest()
            .append_header(("Access-Control-Allow-Origin", "*"))
            .json(SuccessResponse {
                success: false,
                message: None,
                error: Some("No fields to update".to_string()),
            });
    }

    match vault.update_credential(
        &token,
        id,
        body.name.as_deref(),
        body.username.as_deref(),
        body.secret.as_deref(),
        body.url.as_deref(),
        body.category.as_deref(),
        body.notes.as_deref(),
    ).await {
        Ok(_) => {
            info!("Credential {} updated successfully", id);
            HttpResponse::Ok()
                .append_header(("Access-Control-Allow-Origin", "*"))
                .json(SuccessResponse {
                    success: true,
                    message: Some("Credential updated successfully".to_string()),
                    error: None,
                })
        },
        Err(AuthError::DbError(DbError::NotFound)) => {
            HttpResponse::NotFound()
                .append_header(("Access-Control-Allow-Origin", "*"))
                .json(SuccessResponse {
                    success: false,
                    message: None,
                    error: Some(format!("Credential with ID {} not found", id)),
                })
        },
        Err(e) => {
            error!("Failed to update credential: {}", e);
            HttpResponse::InternalServerError()
                .append_header(("Access-Control-Allow-Origin", "*"))
                .json(SuccessResponse {
                    success: false,
                    message: None,
                    error: Some(format!("Failed to update credential: {}", e)),
                })
        }
    }
}

/// Delete a credential
#[utoipa::path(
    delete,
    path = "/credentials/{id}",
    tag = "Credentials",
    security(
        ("bearer_auth" = [])
    ),
    params(
        ("id" = String, Path, description = "Credential UUID")
    ),
    responses(
        (status = 200, description = "Credential deleted successfully", body = SuccessResponse),
        (status = 400, description = "Invalid UUID"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Credential not found"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn delete_credential(
    vault: web::Data<Vault>,
    req: HttpRequest,
    path: web::Path<String>,
) -> impl Responder {
    debug!("🔍 delete_credential called");

    let token = match bearer_token(&req) {
        Some(token) => token,
        None => return unauthorized_envelope(),
    };

    let id = match Uuid::parse_str(&path) {
        Ok(id) => id,
        Err(_) => {
            return HttpResponse::BadRequest()
                .append_header(("Access-Control-Allow-Origin", "*"))
                .json(SuccessResponse {
                    success: false,
                    message: None,
                    error: Some("Invalid UUID format".to_string()),
                });
        }
    };

    match vault.delete_credential(&token, id).await {
        Ok(_) => {
            info!("Credential {} deleted", id);
            HttpResponse::Ok()
                .append_header(("Access-Control-Allow-Origin", "*"))
                .json(SuccessResponse {
                    success: true,
                    message: Some("Credential deleted successfully".to_string()),
                    error: None,
                })
        },
        Err(AuthError::DbError(DbError::NotFound)) => {
            HttpResponse::NotFound()
                .append_header(("Access-Control-Allow-Origin", "*"))
                .json(SuccessResponse {
                    success: false,
                    message: None,
                    error: Some(format!("Credential with ID {} not found", id)),
                })
        },
        Err(e) => {
            error!("Failed to delete credential: {}", e);
            HttpResponse::InternalServerError()
                .append_header(("Access-Control-Allow-Origin", "*"))
                .json(SuccessResponse {
                    success: false,
                    message: None,
                    error: Some(format!("Failed to delete credential: {}", e)),
                })
        }
    }
}

/// Count stored credentials
#[utoipa::path(
    get,
    path = "/credentials/count",
    tag = "Credentials",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Credential count", body = CountResponse),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn count_credentials(
    vault: web::Data<Vault>,
    req: HttpRequest,
) -> impl Responder {
    let token = match bearer_token(&req) {
        Some(token) => token,
        None => return unauthorized_envelope(),
    };

    match vault.count_credentials(&token).await {
        Ok(count) => {
            HttpResponse::Ok()
                .append_header(("Access-Control-Allow-Origin", "*"))
                .json(CountResponse {
                    success: true,
                    count,
                })
        },
        Err(e) => {
            error!("Failed to count credentials: {}", e);
            HttpResponse::InternalServerError()
                .append_header(("Access-Control-Allow-Origin", "*"))
                .json(SuccessResponse {
                    success: false,
                    message: None,
                    error: Some(format!("Failed to count credentials: {}", e)),
                })
        }
    }
}
