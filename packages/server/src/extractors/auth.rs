use axum::{extract::FromRequestParts, http::request::Parts};
use sea_orm::EntityTrait;

use crate::entity::{auth_token, user};
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::token;

/// Authenticated user resolved from the `Authorization: Bearer <token>` header.
///
/// Add this as a handler parameter to require authentication. The token is
/// checked against the stored key on every request, so deleting the row
/// revokes it immediately.
pub struct AuthUser {
    pub user_id: i32,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("Authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or(AppError::TokenMissing)?;

        let key = token::parse_authorization(auth_header).ok_or(AppError::TokenInvalid)?;

        let (_, user) = auth_token::Entity::find_by_id(key.to_string())
            .find_also_related(user::Entity)
            .one(&state.db)
            .await?
            .ok_or(AppError::TokenInvalid)?;

        let user = user.filter(|u| u.is_active).ok_or(AppError::TokenInvalid)?;

        Ok(AuthUser { user_id: user.id })
    }
}
