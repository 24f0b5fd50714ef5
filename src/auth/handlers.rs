use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use time::OffsetDateTime;
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{
        credentials::CredentialsProvider,
        dto::{
            CredentialsRequest, ErrorBody, ProviderInfo, PublicUser, SignupRequest,
            SignupResponse, VerifyEmailResponse,
        },
        errors::{SignupError, CREDENTIALS_SIGNIN},
        password::hash_password,
        repo_types::NewUser,
        verification::VerificationKeys,
    },
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/callback/credentials", post(credentials_callback))
        .route("/auth/providers", get(providers))
}

/// Target of the link mailed to unverified users.
pub fn verify_routes() -> Router<AppState> {
    Router::new().route("/verify-email/:token", get(verify_email))
}

#[instrument(skip(state, payload))]
pub async fn signup(
    State(state): State<AppState>,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SignupResponse>), SignupError> {
    let Json(payload) = payload.map_err(|e| {
        warn!(error = %e, "malformed signup body");
        SignupError::InvalidJson(e.body_text())
    })?;

    let input = payload.validate().map_err(|e| {
        warn!(field = e.field, "signup validation failed");
        e
    })?;

    if state.users.find_by_email(&input.email).await?.is_some() {
        warn!(email = %input.email, "email already registered");
        return Err(SignupError::Conflict);
    }

    let password_hash = hash_password(&input.password)?;

    let user = state
        .users
        .create(NewUser {
            name: input.name,
            email: input.email,
            password_hash,
        })
        .await?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            message: "User created successfully".into(),
            user: user.into(),
        }),
    ))
}

#[instrument(skip(provider, payload))]
pub async fn credentials_callback(
    State(provider): State<CredentialsProvider>,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Response {
    let Json(credentials) = match payload {
        Ok(p) => p,
        Err(e) => {
            warn!(error = %e, "malformed credentials body");
            let body = ErrorBody {
                error: CREDENTIALS_SIGNIN.into(),
                cause: Some(e.body_text()),
            };
            return (StatusCode::BAD_REQUEST, Json(body)).into_response();
        }
    };

    match provider.authorize(credentials).await {
        Ok(user) => Json(user).into_response(),
        Err(e) => e.into_response(),
    }
}

#[instrument(skip(state))]
pub async fn providers(State(state): State<AppState>) -> Json<Vec<ProviderInfo>> {
    let mut list = Vec::with_capacity(2);
    if let Some(google) = &state.config.google {
        list.push(ProviderInfo {
            id: "google".into(),
            name: "Google".into(),
            kind: "oauth".into(),
            client_id: Some(google.client_id.clone()),
        });
    }
    list.push(ProviderInfo {
        id: "credentials".into(),
        name: "Credentials".into(),
        kind: "credentials".into(),
        client_id: None,
    });
    Json(list)
}

#[instrument(skip(state, token))]
pub async fn verify_email(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<VerifyEmailResponse>, (StatusCode, Json<ErrorBody>)> {
    let invalid = || {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorBody::new("Invalid or expired token")),
        )
    };
    let internal = |e: anyhow::Error| {
        error!(error = ?e, "verify email failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorBody::new("Internal server error")),
        )
    };

    let Some(secret) = state.config.auth_secret.as_deref() else {
        error!("AUTH_SECRET not set; cannot verify emails");
        return Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorBody::new("Email verification is not configured")),
        ));
    };

    let claims = VerificationKeys::from_secret(secret)
        .verify(&token)
        .map_err(|e| {
            warn!(error = %e, "rejected verification token");
            invalid()
        })?;

    let user = state
        .users
        .find_by_id(claims.user_id)
        .await
        .map_err(internal)?
        .ok_or_else(invalid)?;

    if user.is_verified() {
        return Ok(Json(VerifyEmailResponse {
            message: "Email already verified".into(),
            user: user.into(),
        }));
    }

    let now = OffsetDateTime::now_utc();
    let current = user.verification_token.as_deref() == Some(token.as_str())
        && user
            .verification_token_expires_at
            .is_some_and(|expires_at| expires_at > now);
    if !current {
        warn!(user_id = %user.id, "verification token superseded or expired");
        return Err(invalid());
    }

    state
        .users
        .mark_email_verified(user.id, now)
        .await
        .map_err(internal)?;

    info!(user_id = %user.id, "email verified");
    let mut user = PublicUser::from(user);
    user.email_verified = Some(now);
    Ok(Json(VerifyEmailResponse {
        message: "Email verified".into(),
        user,
    }))
}
