//! User factories and credential checks shared by the HTTP handlers and the
//! management commands.

use sea_orm::*;
use tracing::instrument;

use crate::entity::{auth_token, user};
use crate::error::AppError;
use crate::utils::email::normalize_email;
use crate::utils::{hash, token};

/// Create a regular user. The email is normalized and the password hashed.
#[instrument(skip(db, password))]
pub async fn create_user<C: ConnectionTrait>(
    db: &C,
    email: &str,
    password: &str,
    name: &str,
) -> Result<user::Model, AppError> {
    insert_user(db, email, password, name, false).await
}

/// Create a user with the staff and superuser flags set.
#[instrument(skip(db, password))]
pub async fn create_superuser<C: ConnectionTrait>(
    db: &C,
    email: &str,
    password: &str,
    name: &str,
) -> Result<user::Model, AppError> {
    insert_user(db, email, password, name, true).await
}

async fn insert_user<C: ConnectionTrait>(
    db: &C,
    email: &str,
    password: &str,
    name: &str,
    superuser: bool,
) -> Result<user::Model, AppError> {
    if email.trim().is_empty() {
        return Err(AppError::Validation(
            "Users must have an email address".into(),
        ));
    }

    let password = hash::hash_password(password)
        .map_err(|e| AppError::Internal(format!("Password hash error: {}", e)))?;

    let new_user = user::ActiveModel {
        email: Set(normalize_email(email)),
        password: Set(password),
        name: Set(name.trim().to_string()),
        is_active: Set(true),
        is_staff: Set(superuser),
        is_superuser: Set(superuser),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };

    new_user.insert(db).await.map_err(map_unique_email)
}

/// Translate a unique-constraint violation on insert/update into `EmailTaken`.
pub fn map_unique_email(e: DbErr) -> AppError {
    match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            tracing::debug!("Unique constraint caught on user email");
            AppError::EmailTaken
        }
        _ => AppError::from(e),
    }
}

/// Look up a user by email and check the password.
///
/// Unknown email, wrong password and inactive account all yield
/// `InvalidCredentials` so callers cannot tell which emails exist.
pub async fn authenticate<C: ConnectionTrait>(
    db: &C,
    email: &str,
    password: &str,
) -> Result<user::Model, AppError> {
    let user = user::Entity::find()
        .filter(user::Column::Email.eq(normalize_email(email)))
        .one(db)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    let is_valid = hash::verify_password(password, &user.password)
        .map_err(|e| AppError::Internal(format!("Password verify error: {}", e)))?;

    if !is_valid || !user.is_active {
        return Err(AppError::InvalidCredentials);
    }

    Ok(user)
}

/// Return the user's existing token, creating one on first login.
pub async fn get_or_create_token<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
) -> Result<auth_token::Model, AppError> {
    if let Some(existing) = auth_token::Entity::find()
        .filter(auth_token::Column::UserId.eq(user_id))
        .one(db)
        .await?
    {
        return Ok(existing);
    }

    let new_token = auth_token::ActiveModel {
        key: Set(token::generate_key()),
        user_id: Set(user_id),
        created_at: Set(chrono::Utc::now()),
    };

    match new_token.insert(db).await {
        Ok(model) => Ok(model),
        // A concurrent login for the same user won the race; use its token.
        Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
            auth_token::Entity::find()
                .filter(auth_token::Column::UserId.eq(user_id))
                .one(db)
                .await?
                .ok_or_else(|| AppError::Internal("Token vanished after conflict".into()))
        }
        Err(e) => Err(e.into()),
    }
}
