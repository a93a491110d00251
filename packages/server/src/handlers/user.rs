use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use sea_orm::*;
use tracing::instrument;

use crate::account;
use crate::entity::user;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::user::{
    CreateUserRequest, TokenRequest, TokenResponse, UpdateProfileRequest, UserResponse,
    validate_create_user, validate_token_request, validate_update_profile,
};
use crate::state::AppState;
use crate::utils::{email::normalize_email, hash};

#[utoipa::path(
    post,
    path = "/create/",
    tag = "User",
    operation_id = "createUser",
    summary = "Register a new user",
    description = "Creates a user with a normalized email and a hashed password. The password is never returned.",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 400, description = "Validation error or duplicate email (VALIDATION_ERROR, EMAIL_TAKEN)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(email = %payload.email))]
pub async fn create_user(
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_create_user(&payload)?;

    let user =
        account::create_user(&state.db, &payload.email, &payload.password, &payload.name).await?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

#[utoipa::path(
    post,
    path = "/token/",
    tag = "User",
    operation_id = "createToken",
    summary = "Obtain an auth token",
    description = "Exchanges an email and password for the user's bearer token. Any mismatch yields the same 400 response.",
    request_body = TokenRequest,
    responses(
        (status = 200, description = "Token issued", body = TokenResponse),
        (status = 400, description = "Missing field or bad credentials (VALIDATION_ERROR, INVALID_CREDENTIALS)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(email = %payload.email))]
pub async fn create_token(
    State(state): State<AppState>,
    AppJson(payload): AppJson<TokenRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    validate_token_request(&payload)?;

    let user = account::authenticate(&state.db, &payload.email, &payload.password).await?;
    let token = account::get_or_create_token(&state.db, user.id).await?;

    Ok(Json(TokenResponse { token: token.key }))
}

#[utoipa::path(
    get,
    path = "/profile/",
    tag = "User",
    operation_id = "getProfile",
    summary = "Get the authenticated user's profile",
    responses(
        (status = 200, description = "Profile", body = UserResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("token" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn get_profile(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<UserResponse>, AppError> {
    let user = find_user(&state.db, auth_user.user_id).await?;
    Ok(Json(user.into()))
}

#[utoipa::path(
    patch,
    path = "/profile/",
    tag = "User",
    operation_id = "updateProfile",
    summary = "Partially update the authenticated user's profile",
    description = "Only supplied fields change. A new password is re-hashed; a new email is normalized and must be unused.",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = UserResponse),
        (status = 400, description = "Validation error or duplicate email (VALIDATION_ERROR, EMAIL_TAKEN)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("token" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn update_profile(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<UpdateProfileRequest>,
) -> Result<Json<UserResponse>, AppError> {
    validate_update_profile(&payload)?;

    let existing = find_user(&state.db, auth_user.user_id).await?;
    if payload == UpdateProfileRequest::default() {
        return Ok(Json(existing.into()));
    }

    let mut active: user::ActiveModel = existing.into();
    if let Some(ref email) = payload.email {
        active.email = Set(normalize_email(email));
    }
    if let Some(ref name) = payload.name {
        active.name = Set(name.trim().to_string());
    }
    if let Some(ref password) = payload.password {
        active.password = Set(hash_password(password)?);
    }

    let model = active
        .update(&state.db)
        .await
        .map_err(account::map_unique_email)?;

    Ok(Json(model.into()))
}

#[utoipa::path(
    put,
    path = "/profile/",
    tag = "User",
    operation_id = "replaceProfile",
    summary = "Replace the authenticated user's profile",
    description = "Full update: `email` and `password` are required, `name` defaults to empty.",
    request_body = CreateUserRequest,
    responses(
        (status = 200, description = "Profile replaced", body = UserResponse),
        (status = 400, description = "Validation error or duplicate email (VALIDATION_ERROR, EMAIL_TAKEN)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("token" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn replace_profile(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateUserRequest>,
) -> Result<Json<UserResponse>, AppError> {
    validate_create_user(&payload)?;

    let existing = find_user(&state.db, auth_user.user_id).await?;
    let mut active: user::ActiveModel = existing.into();
    active.email = Set(normalize_email(&payload.email));
    active.name = Set(payload.name.trim().to_string());
    active.password = Set(hash_password(&payload.password)?);

    let model = active
        .update(&state.db)
        .await
        .map_err(account::map_unique_email)?;

    Ok(Json(model.into()))
}

fn hash_password(password: &str) -> Result<String, AppError> {
    hash::hash_password(password)
        .map_err(|e| AppError::Internal(format!("Password hash error: {}", e)))
}

async fn find_user<C: ConnectionTrait>(db: &C, id: i32) -> Result<user::Model, AppError> {
    user::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))
}
