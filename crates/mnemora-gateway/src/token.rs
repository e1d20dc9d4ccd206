//! Bearer-auth extractor (A1): every protected handler takes a
//! [`CurrentUser`] argument instead of parsing the `Authorization` header
//! itself.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use mnemora_core::AppError;

use crate::app::AppState;
use crate::error::GatewayError;

pub struct CurrentUser {
    pub user_id: String,
}

impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = GatewayError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or_else(|| GatewayError(AppError::Auth("missing bearer token".to_string())))?;

        let claims = mnemora_users::auth::verify_token(token, &state.config.auth.jwt_secret)
            .map_err(AppError::from)?;

        Ok(CurrentUser {
            user_id: claims.sub,
        })
    }
}
