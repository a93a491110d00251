use serde::{Deserialize, Serialize};

use super::shared::MAX_TEXT_LEN;
use crate::error::AppError;
use crate::utils::email::is_valid_email;

/// Passwords shorter than this are rejected.
pub const MIN_PASSWORD_LEN: usize = 5;

/// Request body for user registration.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateUserRequest {
    #[schema(example = "example@example.com")]
    pub email: String,
    /// At least 5 characters. Never echoed back.
    #[schema(example = "testpass123")]
    pub password: String,
    #[serde(default)]
    #[schema(example = "Test User")]
    pub name: String,
}

pub fn validate_create_user(payload: &CreateUserRequest) -> Result<(), AppError> {
    validate_email(&payload.email)?;
    validate_password(&payload.password)?;
    validate_name(&payload.name)
}

/// Request body for token issuance. Both fields are required; serde defaults
/// let a missing field surface as the same validation error as an empty one.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct TokenRequest {
    #[serde(default)]
    #[schema(example = "example@example.com")]
    pub email: String,
    #[serde(default)]
    #[schema(example = "testpass123")]
    pub password: String,
}

pub fn validate_token_request(payload: &TokenRequest) -> Result<(), AppError> {
    if payload.email.trim().is_empty() {
        return Err(AppError::Validation("Email must not be empty".into()));
    }
    if payload.password.is_empty() {
        return Err(AppError::Validation("Password must not be empty".into()));
    }
    Ok(())
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct TokenResponse {
    #[schema(example = "9944b09199c62bcf9418ad846dd0e4bbdfc6ee4b")]
    pub token: String,
}

/// Partial profile update; absent fields are left untouched.
#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
pub struct UpdateProfileRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
}

pub fn validate_update_profile(payload: &UpdateProfileRequest) -> Result<(), AppError> {
    if let Some(ref email) = payload.email {
        validate_email(email)?;
    }
    if let Some(ref password) = payload.password {
        validate_password(password)?;
    }
    if let Some(ref name) = payload.name {
        validate_name(name)?;
    }
    Ok(())
}

/// Public view of a user. The password hash is never part of it.
#[derive(Serialize, utoipa::ToSchema)]
pub struct UserResponse {
    #[schema(example = "example@example.com")]
    pub email: String,
    #[schema(example = "Test User")]
    pub name: String,
}

impl From<crate::entity::user::Model> for UserResponse {
    fn from(user: crate::entity::user::Model) -> Self {
        Self {
            email: user.email,
            name: user.name,
        }
    }
}

fn validate_email(email: &str) -> Result<(), AppError> {
    let email = email.trim();
    if email.is_empty() {
        return Err(AppError::Validation("Email must not be empty".into()));
    }
    if email.chars().count() > MAX_TEXT_LEN || !is_valid_email(email) {
        return Err(AppError::Validation("Enter a valid email address".into()));
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), AppError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

fn validate_name(name: &str) -> Result<(), AppError> {
    if name.trim().chars().count() > MAX_TEXT_LEN {
        return Err(AppError::Validation(format!(
            "Name must be at most {MAX_TEXT_LEN} characters"
        )));
    }
    Ok(())
}
