// src/api/types.rs
use serde::{Serialize, Deserialize};
use utoipa::ToSchema;
use utoipa::IntoParams;
use crate::models::{StrengthLabel, User};
use crate::tools::geo::GeoLocation;

// Authentication requests and responses
#[derive(Serialize, Deserialize, ToSchema)]
pub struct RegisterRequest {
    /// Email address to register with
    pub email: String,
    /// Display name shown in the UI
    pub display_name: String,
    /// Login password (also derives the vault key)
    pub password: String,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    /// Registered email address
    pub email: String,
    /// Login password
    pub password: String,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct UserSummary {
    /// User ID
    pub id: String,
    /// Email address
    pub email: String,
    /// Display name
    pub display_name: String,
    /// Account creation timestamp
    pub created_at: String,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        UserSummary {
            id: user.id.to_string(),
            email: user.email.clone(),
            display_name: user.display_name.clone(),
            created_at: user.created_at.to_rfc3339(),
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    /// Whether the operation was successful
    pub success: bool,
    /// JWT token for authenticated requests (only present on success)
    pub token: Option<String>,
    /// The signed-in user (only present on success)
    pub user: Option<UserSummary>,
    /// Error message (only present on failure)
    pub error: Option<String>,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct StatusResponse {
    /// Whether the operation was successful
    pub success: bool,
    /// Whether the token maps to a live session
    pub authenticated: bool,
    /// The authenticated user (when authenticated)
    pub user: Option<UserSummary>,
    /// Session expiry as a unix timestamp (when authenticated)
    pub expires_at: Option<i64>,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct SuccessResponse {
    /// Whether the operation was successful
    pub success: bool,
    /// Success message (only present on success)
    pub message: Option<String>,
    /// Error message (only present on failure)
    pub error: Option<String>,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct ChangePasswordRequest {
    /// Current login password
    pub current_password: String,
    /// New login password to set
    pub new_password: String,
}

// Credential requests and responses
#[derive(Deserialize, IntoParams)]
pub struct CredentialQuery {
    /// Restrict results to one category
    pub category: Option<String>,
    /// Case-insensitive substring match on name, username, url and notes
    pub search: Option<String>,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct CredentialSummary {
    /// Credential ID
    pub id: String,
    /// Account or site name
    pub name: String,
    /// Username or email for the account
    pub username: String,
    /// Account URL
    pub url: Option<String>,
    /// Category tag
    pub category: String,
    /// Free-form notes
    pub notes: Option<String>,
    /// Creation timestamp
    pub created_at: String,
    /// Last update timestamp
    pub updated_at: String,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct CredentialDetail {
    /// Credential ID
    pub id: String,
    /// Account or site name
    pub name: String,
    /// Username or email for the account
    pub username: String,
    /// Decrypted secret value
    pub secret: String,
    /// Strength label for the stored secret
    pub strength: StrengthLabel,
    /// Account URL
    pub url: Option<String>,
    /// Category tag
    pub category: String,
    /// Free-form notes
    pub notes: Option<String>,
    /// Creation timestamp
    pub created_at: String,
    /// Last update timestamp
    pub updated_at: String,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct CredentialListResponse {
    /// Whether the operation was successful
    pub success: bool,
    /// Stored credentials, newest first, secrets omitted
    pub credentials: Vec<CredentialSummary>,
    /// Error message (if operation failed)
    pub error: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AddCredentialRequest {
    pub name: String,
    pub username: String,
    pub secret: String,
    pub url: Option<String>,
    pub category: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdateCredentialRequest {
    pub name: Option<String>,
    pub username: Option<String>,
    pub secret: Option<String>,
    pub url: Option<String>,
    pub category: Option<String>,
    pub notes: Option<String>,
}

impl UpdateCredentialRequest {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.username.is_none()
            && self.secret.is_none()
            && self.url.is_none()
            && self.category.is_none()
            && self.notes.is_none()
    }
}

/// Response type for count endpoints
#[derive(Serialize, ToSchema)]
pub struct CountResponse {
    /// Whether the operation was successful
    pub success: bool,
    /// Total number of stored credentials
    pub count: usize,
}

// Password generation types
#[derive(Serialize, Deserialize, ToSchema)]
pub struct GenerationRequest {
    /// Password length (default: 16)
    pub length: Option<usize>,
    /// Include uppercase letters (default: true)
    pub include_uppercase: Option<bool>,
    /// Include lowercase letters (default: true)
    pub include_lowercase: Option<bool>,
    /// Include numbers (default: true)
    pub include_numbers: Option<bool>,
    /// Include symbols (default: true)
    pub include_symbols: Option<bool>,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct GenerationResponse {
    /// Whether the operation was successful
    pub success: bool,
    /// Generated password
    pub password: String,
    /// Strength label for the generated password
    pub strength: StrengthLabel,
    /// Raw strength score (0-7)
    pub score: u8,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct AnalysisResponse {
    /// Whether the operation was successful
    pub success: bool,
    /// Strength label for the analyzed password
    pub strength: StrengthLabel,
    /// Raw strength score (0-7)
    pub score: u8,
    /// Suggestions for improvement
    pub feedback: Vec<String>,
}

// Tool types
#[derive(Serialize, Deserialize, ToSchema)]
pub struct BreachCheckRequest {
    /// Secret to check against the breach corpus
    pub secret: String,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct BreachCheckResponse {
    /// Whether the operation was successful
    pub success: bool,
    /// Whether the secret appears in the breach corpus (null when the lookup was unavailable)
    pub breached: Option<bool>,
    /// How many times the secret appears in the corpus
    pub times_seen: Option<u64>,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct GeoResponse {
    /// Whether the operation was successful
    pub success: bool,
    /// Resolved location (null when the lookup was unavailable)
    pub location: Option<GeoLocation>,
}

#[derive(Deserialize, IntoParams)]
pub struct FaviconQuery {
    /// Site or account name to derive the favicon from
    pub name: String,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct FaviconResponse {
    /// Whether the operation was successful
    pub success: bool,
    /// Favicon URL for the given name
    pub url: String,
}

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    /// Whether the server is up
    pub success: bool,
    /// Service name
    pub service: String,
    /// Server version
    pub version: String,
}
