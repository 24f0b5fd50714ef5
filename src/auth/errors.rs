use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::error;

use crate::auth::{dto::ErrorBody, repo::StoreError, validation::ValidationError};

/// Error name reported for every rejected credential sign-in.
pub const CREDENTIALS_SIGNIN: &str = "CredentialsSignin";

#[derive(Debug, thiserror::Error)]
pub enum SignupError {
    #[error("{0}")]
    InvalidJson(String),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("User already exists")]
    Conflict,
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl From<StoreError> for SignupError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::DuplicateEmail => SignupError::Conflict,
            StoreError::Other(e) => SignupError::Unexpected(e),
        }
    }
}

impl IntoResponse for SignupError {
    fn into_response(self) -> Response {
        let status = match &self {
            SignupError::InvalidJson(_) | SignupError::Validation(_) => StatusCode::BAD_REQUEST,
            SignupError::Conflict => StatusCode::CONFLICT,
            SignupError::Unexpected(e) => {
                error!(error = ?e, "signup failed");
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorBody::new("Internal server error")),
                )
                    .into_response();
            }
        };
        (status, Json(ErrorBody::new(self.to_string()))).into_response()
    }
}

/// Rejections produced by the credentials provider.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid sign-in input: {0}")]
    InvalidInput(#[from] ValidationError),
    #[error("User not found")]
    UserNotFound,
    #[error("Try Sign with Google. User password not found.")]
    PasswordNotSet,
    #[error("Invalid credentials.")]
    InvalidCredentials,
    #[error("Email not verified")]
    EmailNotVerified { email_sent: bool },
    #[error("AUTH_SECRET is not defined")]
    MissingSecret,
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl AuthError {
    /// Human-readable cause shown to the end user.
    pub fn cause(&self) -> String {
        match self {
            AuthError::InvalidInput(e) => e.to_string(),
            AuthError::EmailNotVerified { email_sent: true } => {
                "Check your email to verify first".into()
            }
            AuthError::EmailNotVerified { email_sent: false } => "Email not verified: ".into(),
            AuthError::Unexpected(_) => "Something went wrong".into(),
            other => other.to_string(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AuthError::MissingSecret | AuthError::Unexpected(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            _ => StatusCode::UNAUTHORIZED,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        if let AuthError::Unexpected(e) = &self {
            error!(error = ?e, "credentials sign-in failed");
        }
        let body = ErrorBody {
            error: CREDENTIALS_SIGNIN.into(),
            cause: Some(self.cause()),
        };
        (self.status(), Json(body)).into_response()
    }
}
