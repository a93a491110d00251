use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use sea_orm::sea_query::Query as SeaQuery;
use sea_orm::*;
use tracing::instrument;

use crate::entity::{ingredient, recipe_ingredient};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::extractors::query::AppQuery;
use crate::models::ingredient::{IngredientRequest, IngredientResponse, validate_ingredient};
use crate::models::shared::AssignedQuery;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/ingredients/",
    tag = "Ingredients",
    operation_id = "listIngredients",
    summary = "List the caller's ingredients",
    description = "Returns only ingredients owned by the caller, ordered by name descending. With `assigned_only=1`, only ingredients used by at least one recipe are returned, each once.",
    params(AssignedQuery),
    responses(
        (status = 200, description = "Ingredients", body = Vec<IngredientResponse>),
        (status = 400, description = "Malformed query (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("token" = [])),
)]
#[instrument(skip(state, auth_user, query), fields(user_id = auth_user.user_id))]
pub async fn list_ingredients(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppQuery(query): AppQuery<AssignedQuery>,
) -> Result<Json<Vec<IngredientResponse>>, AppError> {
    let mut select =
        ingredient::Entity::find().filter(ingredient::Column::UserId.eq(auth_user.user_id));

    if query.assigned_only()? {
        select = select.filter(
            ingredient::Column::Id.in_subquery(
                SeaQuery::select()
                    .column(recipe_ingredient::Column::IngredientId)
                    .from(recipe_ingredient::Entity)
                    .to_owned(),
            ),
        );
    }

    let ingredients = select
        .order_by_desc(ingredient::Column::Name)
        .order_by_desc(ingredient::Column::Id)
        .all(&state.db)
        .await?
        .into_iter()
        .map(IngredientResponse::from)
        .collect();

    Ok(Json(ingredients))
}

#[utoipa::path(
    post,
    path = "/ingredients/",
    tag = "Ingredients",
    operation_id = "createIngredient",
    summary = "Create an ingredient",
    request_body = IngredientRequest,
    responses(
        (status = 201, description = "Ingredient created", body = IngredientResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("token" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn create_ingredient(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<IngredientRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_ingredient(&payload)?;

    let model = ingredient::ActiveModel {
        name: Set(payload.name.trim().to_string()),
        user_id: Set(auth_user.user_id),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(IngredientResponse::from(model))))
}

#[utoipa::path(
    patch,
    path = "/ingredients/{id}/",
    tag = "Ingredients",
    operation_id = "renameIngredient",
    summary = "Rename an ingredient",
    params(("id" = i32, Path, description = "Ingredient ID")),
    request_body = IngredientRequest,
    responses(
        (status = 200, description = "Ingredient renamed", body = IngredientResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Ingredient not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("token" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id, id))]
pub async fn rename_ingredient(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<IngredientRequest>,
) -> Result<Json<IngredientResponse>, AppError> {
    validate_ingredient(&payload)?;

    let existing = find_owned_ingredient(&state.db, auth_user.user_id, id).await?;
    let mut active: ingredient::ActiveModel = existing.into();
    active.name = Set(payload.name.trim().to_string());
    let model = active.update(&state.db).await?;

    Ok(Json(model.into()))
}

#[utoipa::path(
    delete,
    path = "/ingredients/{id}/",
    tag = "Ingredients",
    operation_id = "deleteIngredient",
    summary = "Delete an ingredient",
    description = "Deletes the ingredient and removes it from every recipe.",
    params(("id" = i32, Path, description = "Ingredient ID")),
    responses(
        (status = 204, description = "Ingredient deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Ingredient not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("token" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id, id))]
pub async fn delete_ingredient(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let txn = state.db.begin().await?;

    find_owned_ingredient(&txn, auth_user.user_id, id).await?;

    recipe_ingredient::Entity::delete_many()
        .filter(recipe_ingredient::Column::IngredientId.eq(id))
        .exec(&txn)
        .await?;
    ingredient::Entity::delete_by_id(id).exec(&txn).await?;

    txn.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn find_owned_ingredient<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    id: i32,
) -> Result<ingredient::Model, AppError> {
    ingredient::Entity::find_by_id(id)
        .filter(ingredient::Column::UserId.eq(user_id))
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Ingredient not found".into()))
}
