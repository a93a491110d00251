use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use sea_orm::sea_query::Query as SeaQuery;
use sea_orm::*;
use tracing::instrument;

use crate::entity::{recipe_tag, tag};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::extractors::query::AppQuery;
use crate::models::shared::AssignedQuery;
use crate::models::tag::{TagRequest, TagResponse, validate_tag};
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/tags/",
    tag = "Tags",
    operation_id = "listTags",
    summary = "List the caller's tags",
    description = "Returns only tags owned by the caller, ordered by name descending. With `assigned_only=1`, only tags attached to at least one recipe are returned, each once.",
    params(AssignedQuery),
    responses(
        (status = 200, description = "Tags", body = Vec<TagResponse>),
        (status = 400, description = "Malformed query (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("token" = [])),
)]
#[instrument(skip(state, auth_user, query), fields(user_id = auth_user.user_id))]
pub async fn list_tags(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppQuery(query): AppQuery<AssignedQuery>,
) -> Result<Json<Vec<TagResponse>>, AppError> {
    let mut select = tag::Entity::find().filter(tag::Column::UserId.eq(auth_user.user_id));

    if query.assigned_only()? {
        select = select.filter(
            tag::Column::Id.in_subquery(
                SeaQuery::select()
                    .column(recipe_tag::Column::TagId)
                    .from(recipe_tag::Entity)
                    .to_owned(),
            ),
        );
    }

    let tags = select
        .order_by_desc(tag::Column::Name)
        .order_by_desc(tag::Column::Id)
        .all(&state.db)
        .await?
        .into_iter()
        .map(TagResponse::from)
        .collect();

    Ok(Json(tags))
}

#[utoipa::path(
    post,
    path = "/tags/",
    tag = "Tags",
    operation_id = "createTag",
    summary = "Create a tag",
    request_body = TagRequest,
    responses(
        (status = 201, description = "Tag created", body = TagResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("token" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn create_tag(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<TagRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_tag(&payload)?;

    let model = tag::ActiveModel {
        name: Set(payload.name.trim().to_string()),
        user_id: Set(auth_user.user_id),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(TagResponse::from(model))))
}

#[utoipa::path(
    patch,
    path = "/tags/{id}/",
    tag = "Tags",
    operation_id = "renameTag",
    summary = "Rename a tag",
    params(("id" = i32, Path, description = "Tag ID")),
    request_body = TagRequest,
    responses(
        (status = 200, description = "Tag renamed", body = TagResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Tag not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("token" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id, id))]
pub async fn rename_tag(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<TagRequest>,
) -> Result<Json<TagResponse>, AppError> {
    validate_tag(&payload)?;

    let existing = find_owned_tag(&state.db, auth_user.user_id, id).await?;
    let mut active: tag::ActiveModel = existing.into();
    active.name = Set(payload.name.trim().to_string());
    let model = active.update(&state.db).await?;

    Ok(Json(model.into()))
}

#[utoipa::path(
    delete,
    path = "/tags/{id}/",
    tag = "Tags",
    operation_id = "deleteTag",
    summary = "Delete a tag",
    description = "Deletes the tag and detaches it from every recipe.",
    params(("id" = i32, Path, description = "Tag ID")),
    responses(
        (status = 204, description = "Tag deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Tag not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("token" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id, id))]
pub async fn delete_tag(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let txn = state.db.begin().await?;

    find_owned_tag(&txn, auth_user.user_id, id).await?;

    recipe_tag::Entity::delete_many()
        .filter(recipe_tag::Column::TagId.eq(id))
        .exec(&txn)
        .await?;
    tag::Entity::delete_by_id(id).exec(&txn).await?;

    txn.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Rows owned by someone else are reported exactly like missing rows.
async fn find_owned_tag<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    id: i32,
) -> Result<tag::Model, AppError> {
    tag::Entity::find_by_id(id)
        .filter(tag::Column::UserId.eq(user_id))
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Tag not found".into()))
}
