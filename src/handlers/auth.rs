// src/handlers/auth.rs

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{Duration, Utc};
use serde_json::json;
use url::Url;
use validator::Validate;

use crate::{
    error::AppError,
    models::profile::{LoginToken, MagicLinkRequest, Principal, SignInResponse, VerifyRequest},
    state::AppState,
    store::AuthStore,
    utils::{
        hash::{hash_secret, verify_secret},
        jwt::sign_jwt,
        token::MagicToken,
    },
};

/// Builds `<base>/auth/callback?token=<token>`.
pub fn magic_link_url(base: &Url, token: &MagicToken) -> Result<Url, AppError> {
    let mut link = base
        .join("auth/callback")
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;
    link.query_pairs_mut().append_pair("token", &token.encode());
    Ok(link)
}

fn invalid_link() -> AppError {
    AppError::AuthError("Invalid or expired sign-in link".to_string())
}

/// Starts a passwordless sign-in.
///
/// Stores a single-use token (secret hashed with Argon2) and mails the link.
/// Always answers 202 so the endpoint does not reveal which emails have profiles.
pub async fn request_magic_link(
    State(state): State<AppState>,
    payload: Result<Json<MagicLinkRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(payload) = payload?;
    payload.validate()?;

    let email = payload.email.trim().to_lowercase();
    let token = MagicToken::generate();

    let pending = LoginToken {
        id: token.id,
        email: email.clone(),
        secret_hash: hash_secret(&token.secret)?,
        expires_at: Utc::now() + Duration::seconds(state.config.magic_link_ttl),
    };
    state.auth_store.create_login_token(&pending).await?;

    let link = magic_link_url(&state.config.app_base_url, &token)?;
    state.mailer.send_magic_link(&email, &link).await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(json!({ "message": "Check your email for a sign-in link." })),
    ))
}

/// Exchanges a magic-link token for a bearer token.
///
/// The token is consumed before it is checked, so a link works at most once.
/// First sign-in for an email creates its profile.
pub async fn verify_magic_link(
    State(state): State<AppState>,
    payload: Result<Json<VerifyRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(payload) = payload?;
    payload.validate()?;

    let token = MagicToken::parse(&payload.token).ok_or_else(invalid_link)?;
    let pending = state
        .auth_store
        .consume_login_token(token.id)
        .await?
        .ok_or_else(invalid_link)?;

    if pending.expires_at <= Utc::now() {
        return Err(invalid_link());
    }
    if !verify_secret(&token.secret, &pending.secret_hash)? {
        return Err(invalid_link());
    }

    let profile = state.auth_store.find_or_create_profile(&pending.email).await?;
    let jwt = sign_jwt(&profile, &state.config.jwt_secret, state.config.jwt_expiration)?;

    tracing::info!(user_id = %profile.id, role = %profile.role, "User signed in");

    Ok(Json(SignInResponse {
        token: jwt,
        token_type: "Bearer".to_string(),
        profile,
    }))
}

/// Returns the caller's profile.
pub async fn me(
    State(store): State<Arc<dyn AuthStore>>,
    Extension(principal): Extension<Principal>,
) -> Result<impl IntoResponse, AppError> {
    let profile = store
        .get_profile(principal.user_id)
        .await?
        .ok_or(AppError::NotFound("Profile not found".to_string()))?;

    Ok(Json(profile))
}
