// src/api/handlers/auth.rs

use actix_web::{web, HttpRequest, HttpResponse, Responder};
use crate::core::vault::Vault;
use crate::core::auth::AuthError;
use crate::db::DbError;
use crate::api::types::{
    RegisterRequest, LoginRequest, TokenResponse, StatusResponse,
    SuccessResponse, ChangePasswordRequest, UserSummary,
};
use crate::api::utils::bearer_token;
use log::{info, warn, error};

/// Register a new account
///
/// Creates the account and signs the user in, returning a JWT token.
#[utoipa::path(
    post,
    path = "/auth/register",
    tag = "Authentication",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created and signed in", body = TokenResponse),
        (status = 400, description = "Invalid request", body = TokenResponse),
        (status = 409, description = "Email already registered", body = TokenResponse),
        (status = 500, description = "Internal server error", body = TokenResponse)
    )
)]
pub async fn register(
    vault: web::Data<Vault>,
    req: web::Json<RegisterRequest>,
) -> impl Responder {
    info!("Registration attempt for {}", req.email);

    if req.email.trim().is_empty() {
        return HttpResponse::BadRequest()
            .append_header(("Access-Control-Allow-Origin", "*"))
            .json(TokenResponse {
                success: false,
                token: None,
                user: None,
                error: Some("Email cannot be empty".to_string()),
            });
    }

    if req.display_name.trim().is_empty() {
        return HttpResponse::BadRequest()
            .append_header(("Access-Control-Allow-Origin", "*"))
            .json(TokenResponse {
                success: false,
                token: None,
                user: None,
                error: Some("Display name cannot be empty".to_string()),
            });
    }

    if req.password.is_empty() {
        return HttpResponse::BadRequest()
            .append_header(("Access-Control-Allow-Origin", "*"))
            .json(TokenResponse {
                success: false,
                token: None,
                user: None,
                error: Some("Password cannot be empty".to_string()),
            });
    }

    match vault.register(&req.email, &req.display_name, &req.password).await {
        Ok((token, user)) => {
            info!("Account registered: {}", user.email);
            HttpResponse::Created()
                .append_header(("Access-Control-Allow-Origin", "*"))
                .json(TokenResponse {
                    success: true,
                    token: Some(token),
                    user: Some(UserSummary::from(&user)),
                    error: None,
                })
        },
        Err(AuthError::DbError(DbError::EmailTaken(email))) => {
            warn!("Registration rejected, email already in use: {}", email);
            HttpResponse::Conflict()
                .append_header(("Access-Control-Allow-Origin", "*"))
                .json(TokenResponse {
                    success: false,
                    token: None,
                    user: None,
                    error: Some(format!("An account already exists for {}", email)),
                })
        },
        Err(e) => {
            error!("Failed to register account: {}", e);
            HttpResponse::InternalServerError()
                .append_header(("Access-Control-Allow-Origin", "*"))
                .json(TokenResponse {
                    success: false,
                    token: None,
                    user: None,
                    error: Some(format!("Failed to register account: {}", e)),
                })
        }
    }
}

/// Handle OPTIONS requests for the register endpoint
pub async fn register_options() -> impl Responder {
    HttpResponse::Ok()
        .append_header(("Access-Control-Allow-Origin", "*"))
        .append_header(("Access-Control-Allow-Methods", "POST, OPTIONS"))
        .append_header(("Access-Control-Allow-Headers", "Content-Type, Authorization"))
        .finish()
}

/// Sign in with email and password
///
/// Returns a JWT token for subsequent authenticated requests.
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "Authentication",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in successfully", body = TokenResponse),
        (status = 401, description = "Invalid credentials", body = TokenResponse),
        (status = 500, description = "Internal server error", body = TokenResponse)
    )
)]
pub async fn login(
    vault: web::Data<Vault>,
    req: web::Json<LoginRequest>,
) -> impl Responder {
    info!("Login attempt for {}", req.email);

    match vault.login(&req.email, &req.password).await {
        Ok((token, user)) => {
            info!("User signed in: {}", user.email);
            HttpResponse::Ok()
                .append_header(("Access-Control-Allow-Origin", "*"))
                .json(TokenResponse {
                    success: true,
                    token: Some(token),
                    user: Some(UserSummary::from(&user)),
                    error: None,
                })
        },
        Err(AuthError::InvalidCredentials) => {
            warn!("Invalid credentials for {}", req.email);
            HttpResponse::Unauthorized()
                .append_header(("Access-Control-Allow-Origin", "*"))
                .json(TokenResponse {
                    success: false,
                    token: None,
                    user: None,
                    error: Some("Invalid email or password".to_string()),
                })
        },
        Err(e) => {
            error!("Failed to sign in: {}", e);
            HttpResponse::InternalServerError()
                .append_header(("Access-Control-Allow-Origin", "*"))
                .json(TokenResponse {
                    success: false,
                    token: None,
                    user: None,
                    error: Some(format!("Failed to sign in: {}", e)),
                })
        }
    }
}

/// Handle OPTIONS requests for the login endpoint
pub async fn login_options() -> impl Responder {
    HttpResponse::Ok()
        .append_header(("Access-Control-Allow-Origin", "*"))
        .append_header(("Access-Control-Allow-Methods", "POST, OPTIONS"))
        .append_header(("Access-Control-Allow-Headers", "Content-Type, Authorization"))
        .finish()
}

/// Check if the current session is valid
///
/// Returns the signed-in user and the session expiry for a live token.
#[utoipa::path(
    get,
    path = "/auth/status",
    tag = "Authentication",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Authentication status", body = StatusResponse),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn check_status(
    vault: web::Data<Vault>,
    req: HttpRequest,
) -> impl Responder {
    if let Some(token) = bearer_token(&req) {
        match vault.auth_status(&token).await {
            Ok((user, expires_at)) => {
                return HttpResponse::Ok()
                    .append_header(("Access-Control-Allow-Origin", "*"))
                    .json(StatusResponse {
                        success: true,
                        authenticated: true,
                        user: Some(UserSummary::from(&user)),
                        expires_at: Some(expires_at),
                    });
            },
            Err(e) => {
                info!("Invalid token in status check: {}", e);
            }
        }
    }

    // Not authenticated
    HttpResponse::Ok()
        .append_header(("Access-Control-Allow-Origin", "*"))
        .json(StatusResponse {
            success: true,
            authenticated: false,
            user: None,
            expires_at: None,
        })
}

/// Handle OPTIONS requests for the status endpoint
pub async fn status_options() -> impl Responder {
    HttpResponse::Ok()
        .append_header(("Access-Control-Allow-Origin", "*"))
        .append_header(("Access-Control-Allow-Methods", "GET, OPTIONS"))
        .append_header(("Access-Control-Allow-Headers", "Content-Type, Authorization"))
        .finish()
}

/// Logout (invalidate the current session)
///
/// Removes the session file so the token stops validating.
#[utoipa::path(
    post,
    path = "/auth/logout",
    tag = "Authentication",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Logout successful", body = SuccessResponse),
        (status = 401, description = "Unauthorized", body = SuccessResponse),
        (status = 500, description = "Internal server error", body = SuccessResponse)
    )
)]
pub async fn logout(
    vault: web::Data<Vault>,
    req: HttpRequest,
) -> impl Responder {
    let token = match bearer_token(&req) {
        Some(token) => token,
        None => {
            warn!("Missing authorization header in logout request");
            return HttpResponse::Unauthorized()
                .append_header(("Access-Control-Allow-Origin", "*"))
                .json(SuccessResponse {
                    success: false,
                    message: None,
                    error: Some("Missing or invalid authorization header".to_string()),
                });
        }
    };

    match vault.logout(&token).await {
        Ok(_) => {
            info!("User logged out successfully");
            HttpResponse::Ok()
                .append_header(("Access-Control-Allow-Origin", "*"))
                .json(SuccessResponse {
                    success: true,
                    message: Some("Logged out successfully".to_string()),
                    error: None,
                })
        },
        Err(AuthError::SessionExpired) | Err(AuthError::InvalidSession) | Err(AuthError::JwtError(_)) => {
            HttpResponse::Unauthorized()
                .append_header(("Access-Control-Allow-Origin", "*"))
                .json(SuccessResponse {
                    success: false,
                    message: None,
                    error: Some("Invalid or expired token".to_string()),
                })
        },
        Err(e) => {
            error!("Failed to logout: {}", e);
            HttpResponse::InternalServerError()
                .append_header(("Access-Control-Allow-Origin", "*"))
                .json(SuccessResponse {
                    success: false,
                    message: None,
                    error: Some(format!("Failed to logout: {}", e)),
                })
        }
    }
}

/// Handle OPTIONS requests for the logout endpoint
pub async fn logout_options() -> impl Responder {
    HttpResponse::Ok()
        .append_header(("Access-Control-Allow-Origin", "*"))
        .append_header(("Access-Control-Allow-Methods", "POST, OPTIONS"))
        .append_header(("Access-Control-Allow-Headers", "Content-Type, Authorization"))
        .finish()
}

/// Change the login password
///
/// Changes the login password and re-encrypts all stored secrets under
/// the new vault key.
#[utoipa::path(
    post,
    path = "/auth/change-password",
    tag = "Authentication",
    request_body = ChangePasswordRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Password changed successfully", body = SuccessResponse),
        (status = 400, description = "Invalid request", body = SuccessResponse),
        (status = 401, description = "Unauthorized or wrong current password", body = SuccessResponse),
        (status = 500, description = "Internal server error", body = SuccessResponse)
    )
)]
pub async fn change_password(
    vault: web::Data<Vault>,
    req: web::Json<ChangePasswordRequest>,
    http_req: HttpRequest,
) -> impl Responder {
    let token = match bearer_token(&http_req) {
        Some(token) => token,
        None => {
            return HttpResponse::Unauthorized()
                .append_header(("Access-Control-Allow-Origin", "*"))
                .json(SuccessResponse {
                    success: false,
                    message: None,
                    error: Some("Missing or invalid authorization header".to_string()),
                });
        }
    };

    if req.new_password.is_empty() {
        return HttpResponse::BadRequest()
            .append_header(("Access-Control-Allow-Origin", "*"))
            .json(SuccessResponse {
                success: false,
                message: None,
                error: Some("New password cannot be empty".to_string()),
            });
    }

    match vault.change_password(&token, &req.current_password, &req.new_password).await {
        Ok(_) => {
            info!("Login password changed successfully");
            HttpResponse::Ok()
                .append_header(("Access-Control-Allow-Origin", "*"))
                .json(SuccessResponse {
                    success: true,
                    message: Some("Password changed successfully".to_string()),
                    error: None,
                })
        },
        Err(AuthError::InvalidCredentials) => {
            warn!("Wrong current password in change password request");
            HttpResponse::Unauthorized()
                .append_header(("Access-Control-Allow-Origin", "*"))
                .json(SuccessResponse {
                    success: false,
                    message: None,
                    error: Some("Current password is incorrect".to_string()),
                })
        },
        Err(e) => {
            error!("Failed to change password: {}", e);
            HttpResponse::InternalServerError()
                .append_header(("Access-Control-Allow-Origin", "*"))
                .json(SuccessResponse {
                    success: false,
                    message: None,
                    error: Some(format!("Failed to change password: {}", e)),
                })
        }
    }
}

/// Handle OPTIONS requests for the change-password endpoint
pub async fn change_password_options() -> impl Responder {
    HttpResponse::Ok()
        .append_header(("Access-Control-Allow-Origin", "*"))
        .append_header(("Access-Control-Allow-Methods", "POST, OPTIONS"))
        .append_header(("Access-Control-Allow-Headers", "Content-Type, Authorization"))
        .finish()
}
