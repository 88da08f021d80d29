use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use tradepost_core::{SessionGrant, Validator};

use crate::error::ApiError;
use crate::extract::JsonBody;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
        .route("/auth/session/{token}", get(check_session))
}

#[derive(Debug, Deserialize)]
pub struct Credentials {
    username: Option<String>,
    password: Option<String>,
}

impl Credentials {
    /// Validate the fields and charge one attempt to the username.
    fn admit(self, state: &AppState) -> Result<(String, String), ApiError> {
        let (username, password) = Validator::validate_credentials(self.username, self.password)?;
        if let Err(wait) = state.login_limiter.check(&username) {
            tracing::warn!("Rate limited attempts for {}", username);
            return Err(ApiError::RateLimited(wait.as_secs().max(1)));
        }
        Ok((username, password))
    }
}

async fn signup(
    State(state): State<AppState>,
    JsonBody(credentials): JsonBody<Credentials>,
) -> Result<Json<SessionGrant>, ApiError> {
    let (username, password) = credentials.admit(&state)?;
    let grant = state.market.accounts().signup(&username, &password)?;
    Ok(Json(grant))
}

async fn login(
    State(state): State<AppState>,
    JsonBody(credentials): JsonBody<Credentials>,
) -> Result<Json<SessionGrant>, ApiError> {
    let (username, password) = credentials.admit(&state)?;
    let grant = state.market.accounts().login(&username, &password)?;
    Ok(Json(grant))
}

async fn check_session(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<SessionGrant>, ApiError> {
    Ok(Json(state.market.sessions().check_session(&token)?))
}
