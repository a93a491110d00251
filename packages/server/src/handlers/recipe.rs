use std::collections::HashMap;

use axum::Json;
use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use sea_orm::sea_query::Query as SeaQuery;
use sea_orm::*;
use tracing::instrument;
use uuid::Uuid;

use crate::entity::{ingredient, recipe, recipe_ingredient, recipe_tag, tag};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::extractors::query::AppQuery;
use crate::models::ingredient::IngredientResponse;
use crate::models::recipe::*;
use crate::models::shared::dedup_ids;
use crate::models::tag::TagResponse;
use crate::state::AppState;

/// Media directory recipe images are written to.
const RECIPE_IMAGE_DIR: &str = "uploads/recipe";

pub fn image_upload_body_limit() -> DefaultBodyLimit {
    DefaultBodyLimit::max(16 * 1024 * 1024) // 16 MB
}

#[utoipa::path(
    get,
    path = "/recipes/",
    tag = "Recipes",
    operation_id = "listRecipes",
    summary = "List the caller's recipes",
    description = "Returns recipes owned by the caller, newest first. `tags` and `ingredients` take comma-separated IDs and keep recipes linked to any of them.",
    params(RecipeListQuery),
    responses(
        (status = 200, description = "Recipes", body = Vec<RecipeResponse>),
        (status = 400, description = "Malformed ID list (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("token" = [])),
)]
#[instrument(skip(state, auth_user, query), fields(user_id = auth_user.user_id))]
pub async fn list_recipes(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppQuery(query): AppQuery<RecipeListQuery>,
) -> Result<Json<Vec<RecipeResponse>>, AppError> {
    let mut select = recipe::Entity::find().filter(recipe::Column::UserId.eq(auth_user.user_id));

    if let Some(tag_ids) = query.tag_ids()?
        && !tag_ids.is_empty()
    {
        select = select.filter(
            recipe::Column::Id.in_subquery(
                SeaQuery::select()
                    .column(recipe_tag::Column::RecipeId)
                    .from(recipe_tag::Entity)
                    .and_where(recipe_tag::Column::TagId.is_in(tag_ids))
                    .to_owned(),
            ),
        );
    }

    if let Some(ingredient_ids) = query.ingredient_ids()?
        && !ingredient_ids.is_empty()
    {
        select = select.filter(
            recipe::Column::Id.in_subquery(
                SeaQuery::select()
                    .column(recipe_ingredient::Column::RecipeId)
                    .from(recipe_ingredient::Entity)
                    .and_where(recipe_ingredient::Column::IngredientId.is_in(ingredient_ids))
                    .to_owned(),
            ),
        );
    }

    let recipes = select
        .order_by_desc(recipe::Column::Id)
        .all(&state.db)
        .await?;

    let ids: Vec<i32> = recipes.iter().map(|r| r.id).collect();
    let mut tags = tag_ids_by_recipe(&state.db, &ids).await?;
    let mut ingredients = ingredient_ids_by_recipe(&state.db, &ids).await?;

    let data = recipes
        .into_iter()
        .map(|r| {
            let tag_ids = tags.remove(&r.id).unwrap_or_default();
            let ingredient_ids = ingredients.remove(&r.id).unwrap_or_default();
            RecipeResponse::new(r, tag_ids, ingredient_ids)
        })
        .collect();

    Ok(Json(data))
}

#[utoipa::path(
    post,
    path = "/recipes/",
    tag = "Recipes",
    operation_id = "createRecipe",
    summary = "Create a recipe",
    description = "Creates a recipe and links it to existing tags and ingredients by ID. Every ID must belong to the caller.",
    request_body = RecipeRequest,
    responses(
        (status = 201, description = "Recipe created", body = RecipeResponse),
        (status = 400, description = "Validation error or unknown tag/ingredient (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("token" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id, title = %payload.title))]
pub async fn create_recipe(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<RecipeRequest>,
) -> Result<impl IntoResponse, AppError> {
    let fields = validate_recipe(&payload)?;

    let txn = state.db.begin().await?;

    let tag_ids = owned_tag_ids(&txn, auth_user.user_id, payload.tags).await?;
    let ingredient_ids =
        owned_ingredient_ids(&txn, auth_user.user_id, payload.ingredients).await?;

    let model = recipe::ActiveModel {
        title: Set(fields.title),
        time_minutes: Set(fields.time_minutes),
        price: Set(fields.price),
        link: Set(fields.link),
        image: Set(None),
        user_id: Set(auth_user.user_id),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    set_recipe_tags(&txn, model.id, &tag_ids).await?;
    set_recipe_ingredients(&txn, model.id, &ingredient_ids).await?;

    txn.commit().await?;

    Ok((
        StatusCode::CREATED,
        Json(RecipeResponse::new(model, tag_ids, ingredient_ids)),
    ))
}

#[utoipa::path(
    get,
    path = "/recipes/{id}/",
    tag = "Recipes",
    operation_id = "getRecipe",
    summary = "Get a recipe with its tags and ingredients",
    params(("id" = i32, Path, description = "Recipe ID")),
    responses(
        (status = 200, description = "Recipe details", body = RecipeDetailResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Recipe not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("token" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id, id))]
pub async fn get_recipe(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<RecipeDetailResponse>, AppError> {
    let model = find_owned_recipe(&state.db, auth_user.user_id, id).await?;

    let tags = tag::Entity::find()
        .filter(
            tag::Column::Id.in_subquery(
                SeaQuery::select()
                    .column(recipe_tag::Column::TagId)
                    .from(recipe_tag::Entity)
                    .and_where(recipe_tag::Column::RecipeId.eq(id))
                    .to_owned(),
            ),
        )
        .order_by_asc(tag::Column::Id)
        .all(&state.db)
        .await?;

    let ingredients = ingredient::Entity::find()
        .filter(
            ingredient::Column::Id.in_subquery(
                SeaQuery::select()
                    .column(recipe_ingredient::Column::IngredientId)
                    .from(recipe_ingredient::Entity)
                    .and_where(recipe_ingredient::Column::RecipeId.eq(id))
                    .to_owned(),
            ),
        )
        .order_by_asc(ingredient::Column::Id)
        .all(&state.db)
        .await?;

    Ok(Json(RecipeDetailResponse {
        image: model.image.as_deref().map(|p| state.config.media.url_for(p)),
        id: model.id,
        title: model.title,
        time_minutes: model.time_minutes,
        price: model.price,
        link: model.link,
        tags: tags.into_iter().map(TagResponse::from).collect(),
        ingredients: ingredients
            .into_iter()
            .map(IngredientResponse::from)
            .collect(),
    }))
}

#[utoipa::path(
    patch,
    path = "/recipes/{id}/",
    tag = "Recipes",
    operation_id = "updateRecipe",
    summary = "Partially update a recipe",
    description = "Only supplied fields are modified. A supplied `tags` or `ingredients` list replaces that relation; omitted lists are kept.",
    params(("id" = i32, Path, description = "Recipe ID")),
    request_body = UpdateRecipeRequest,
    responses(
        (status = 200, description = "Recipe updated", body = RecipeResponse),
        (status = 400, description = "Validation error or unknown tag/ingredient (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Recipe not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("token" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id, id))]
pub async fn update_recipe(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateRecipeRequest>,
) -> Result<Json<RecipeResponse>, AppError> {
    validate_update_recipe(&payload)?;

    let txn = state.db.begin().await?;

    let existing = find_owned_recipe(&txn, auth_user.user_id, id).await?;
    let mut active: recipe::ActiveModel = existing.clone().into();

    if let Some(ref title) = payload.title {
        active.title = Set(title.trim().to_string());
    }
    if let Some(minutes) = payload.time_minutes {
        active.time_minutes = Set(minutes);
    }
    if let Some(price) = payload.price {
        active.price = Set(normalize_price(price)?);
    }
    if let Some(ref link) = payload.link {
        active.link = Set(link.trim().to_string());
    }

    let model = if active.is_changed() {
        active.update(&txn).await?
    } else {
        existing
    };

    if let Some(tags) = payload.tags {
        let tag_ids = owned_tag_ids(&txn, auth_user.user_id, tags).await?;
        set_recipe_tags(&txn, id, &tag_ids).await?;
    }
    if let Some(ingredients) = payload.ingredients {
        let ingredient_ids = owned_ingredient_ids(&txn, auth_user.user_id, ingredients).await?;
        set_recipe_ingredients(&txn, id, &ingredient_ids).await?;
    }

    let response = recipe_response(&txn, model).await?;
    txn.commit().await?;

    Ok(Json(response))
}

#[utoipa::path(
    put,
    path = "/recipes/{id}/",
    tag = "Recipes",
    operation_id = "replaceRecipe",
    summary = "Fully update a recipe",
    description = "Replaces every scalar field and both relations. Omitted `link` becomes empty and omitted lists clear the relation. The recipe keeps its ID.",
    params(("id" = i32, Path, description = "Recipe ID")),
    request_body = RecipeRequest,
    responses(
        (status = 200, description = "Recipe replaced", body = RecipeResponse),
        (status = 400, description = "Validation error or unknown tag/ingredient (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Recipe not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("token" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id, id))]
pub async fn replace_recipe(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<RecipeRequest>,
) -> Result<Json<RecipeResponse>, AppError> {
    let fields = validate_recipe(&payload)?;

    let txn = state.db.begin().await?;

    let existing = find_owned_recipe(&txn, auth_user.user_id, id).await?;
    let tag_ids = owned_tag_ids(&txn, auth_user.user_id, payload.tags).await?;
    let ingredient_ids =
        owned_ingredient_ids(&txn, auth_user.user_id, payload.ingredients).await?;

    let mut active: recipe::ActiveModel = existing.into();
    active.title = Set(fields.title);
    active.time_minutes = Set(fields.time_minutes);
    active.price = Set(fields.price);
    active.link = Set(fields.link);
    let model = active.update(&txn).await?;

    set_recipe_tags(&txn, id, &tag_ids).await?;
    set_recipe_ingredients(&txn, id, &ingredient_ids).await?;

    txn.commit().await?;

    Ok(Json(RecipeResponse::new(model, tag_ids, ingredient_ids)))
}

#[utoipa::path(
    delete,
    path = "/recipes/{id}/",
    tag = "Recipes",
    operation_id = "deleteRecipe",
    summary = "Delete a recipe",
    description = "Deletes the recipe, its tag/ingredient links, and its stored image. Tags and ingredients themselves are kept.",
    params(("id" = i32, Path, description = "Recipe ID")),
    responses(
        (status = 204, description = "Recipe deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Recipe not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("token" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id, id))]
pub async fn delete_recipe(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let txn = state.db.begin().await?;

    let existing = find_owned_recipe(&txn, auth_user.user_id, id).await?;

    recipe_tag::Entity::delete_many()
        .filter(recipe_tag::Column::RecipeId.eq(id))
        .exec(&txn)
        .await?;
    recipe_ingredient::Entity::delete_many()
        .filter(recipe_ingredient::Column::RecipeId.eq(id))
        .exec(&txn)
        .await?;
    recipe::Entity::delete_by_id(id).exec(&txn).await?;

    txn.commit().await?;

    if let Some(path) = existing.image {
        remove_image(&state, &path).await;
    }

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/recipes/{id}/upload-image/",
    tag = "Recipes",
    operation_id = "uploadRecipeImage",
    summary = "Upload an image for a recipe",
    description = "Stores the multipart `image` field under a random name and replaces any previous image. Only image files are accepted.",
    params(("id" = i32, Path, description = "Recipe ID")),
    request_body(content_type = "multipart/form-data", description = "Image file in the `image` field"),
    responses(
        (status = 200, description = "Image stored", body = RecipeImageResponse),
        (status = 400, description = "Missing or non-image file (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Recipe not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("token" = [])),
)]
#[instrument(skip(state, auth_user, multipart), fields(user_id = auth_user.user_id, id))]
pub async fn upload_image(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    mut multipart: Multipart,
) -> Result<Json<RecipeImageResponse>, AppError> {
    // Fail fast before buffering the body; the row is re-read under lock below.
    find_owned_recipe(&state.db, auth_user.user_id, id).await?;

    let mut upload: Option<(String, Vec<u8>)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
    {
        if field.name() != Some("image") {
            continue;
        }
        let file_name = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| AppError::Validation("Image field must have a filename".into()))?;
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Failed to read image: {e}")))?;
        upload = Some((file_name, bytes.to_vec()));
    }

    let (file_name, bytes) =
        upload.ok_or_else(|| AppError::Validation("Missing 'image' field".into()))?;
    if bytes.is_empty() {
        return Err(AppError::Validation("The submitted file is empty".into()));
    }
    let path = format!(
        "{RECIPE_IMAGE_DIR}/{}.{}",
        Uuid::new_v4(),
        image_extension(&file_name, &bytes)?
    );

    state.media.put(&path, &bytes).await?;

    let old = match replace_image(&state.db, auth_user.user_id, id, &path).await {
        Ok(old) => old,
        Err(e) => {
            remove_image(&state, &path).await;
            return Err(e);
        }
    };

    if let Some(old) = old {
        remove_image(&state, &old).await;
    }

    Ok(Json(RecipeImageResponse {
        id,
        image: Some(state.config.media.url_for(&path)),
    }))
}

/// Point the recipe at `path` and return the image it replaced.
///
/// The row is locked so concurrent uploads each see the path written by the
/// previous one, and every superseded file is deleted exactly once.
async fn replace_image(
    db: &DatabaseConnection,
    user_id: i32,
    id: i32,
    path: &str,
) -> Result<Option<String>, AppError> {
    let txn = db.begin().await?;

    let existing = recipe::Entity::find_by_id(id)
        .filter(recipe::Column::UserId.eq(user_id))
        .lock_exclusive()
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Recipe not found".into()))?;
    let old = existing.image.clone();

    let mut active: recipe::ActiveModel = existing.into();
    active.image = Set(Some(path.to_string()));
    active.update(&txn).await?;

    txn.commit().await?;
    Ok(old)
}

/// Extension to store an upload under, taken from its sniffed content.
///
/// The file name must also name a raster image type; SVG is refused because
/// media is served from the API origin.
fn image_extension(file_name: &str, bytes: &[u8]) -> Result<&'static str, AppError> {
    let invalid = || {
        AppError::Validation("Upload a valid image. The file was not recognized as an image".into())
    };

    let named_image = mime_guess::from_path(file_name)
        .first()
        .is_some_and(|m| m.type_() == mime_guess::mime::IMAGE && m.subtype() != "svg");
    if !named_image {
        return Err(invalid());
    }

    let format = image::guess_format(bytes).map_err(|_| invalid())?;
    format.extensions_str().first().copied().ok_or_else(invalid)
}

async fn remove_image(state: &AppState, path: &str) {
    if let Err(e) = state.media.delete(path).await {
        tracing::warn!(path, "Failed to delete recipe image: {}", e);
    }
}

async fn find_owned_recipe<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    id: i32,
) -> Result<recipe::Model, AppError> {
    recipe::Entity::find_by_id(id)
        .filter(recipe::Column::UserId.eq(user_id))
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Recipe not found".into()))
}

async fn recipe_response<C: ConnectionTrait>(
    db: &C,
    model: recipe::Model,
) -> Result<RecipeResponse, AppError> {
    let ids = [model.id];
    let tag_ids = tag_ids_by_recipe(db, &ids)
        .await?
        .remove(&model.id)
        .unwrap_or_default();
    let ingredient_ids = ingredient_ids_by_recipe(db, &ids)
        .await?
        .remove(&model.id)
        .unwrap_or_default();
    Ok(RecipeResponse::new(model, tag_ids, ingredient_ids))
}

/// Check every requested tag exists and belongs to `user_id`. Returns the sorted, deduplicated IDs.
async fn owned_tag_ids<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    ids: Vec<i32>,
) -> Result<Vec<i32>, AppError> {
    let ids = dedup_ids(ids);
    if ids.is_empty() {
        return Ok(ids);
    }

    let found: Vec<i32> = tag::Entity::find()
        .select_only()
        .column(tag::Column::Id)
        .filter(tag::Column::Id.is_in(ids.clone()))
        .filter(tag::Column::UserId.eq(user_id))
        .into_tuple()
        .all(db)
        .await?;

    if let Some(missing) = ids.iter().find(|id| !found.contains(id)) {
        return Err(AppError::Validation(format!(
            "Invalid tag ID {missing}: object does not exist"
        )));
    }
    Ok(ids)
}

async fn owned_ingredient_ids<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    ids: Vec<i32>,
) -> Result<Vec<i32>, AppError> {
    let ids = dedup_ids(ids);
    if ids.is_empty() {
        return Ok(ids);
    }

    let found: Vec<i32> = ingredient::Entity::find()
        .select_only()
        .column(ingredient::Column::Id)
        .filter(ingredient::Column::Id.is_in(ids.clone()))
        .filter(ingredient::Column::UserId.eq(user_id))
        .into_tuple()
        .all(db)
        .await?;

    if let Some(missing) = ids.iter().find(|id| !found.contains(id)) {
        return Err(AppError::Validation(format!(
            "Invalid ingredient ID {missing}: object does not exist"
        )));
    }
    Ok(ids)
}

async fn set_recipe_tags(
    txn: &DatabaseTransaction,
    recipe_id: i32,
    tag_ids: &[i32],
) -> Result<(), AppError> {
    recipe_tag::Entity::delete_many()
        .filter(recipe_tag::Column::RecipeId.eq(recipe_id))
        .exec(txn)
        .await?;

    if !tag_ids.is_empty() {
        recipe_tag::Entity::insert_many(tag_ids.iter().map(|&tag_id| recipe_tag::ActiveModel {
            recipe_id: Set(recipe_id),
            tag_id: Set(tag_id),
        }))
        .exec(txn)
        .await?;
    }
    Ok(())
}

async fn set_recipe_ingredients(
    txn: &DatabaseTransaction,
    recipe_id: i32,
    ingredient_ids: &[i32],
) -> Result<(), AppError> {
    recipe_ingredient::Entity::delete_many()
        .filter(recipe_ingredient::Column::RecipeId.eq(recipe_id))
        .exec(txn)
        .await?;

    if !ingredient_ids.is_empty() {
        recipe_ingredient::Entity::insert_many(ingredient_ids.iter().map(|&ingredient_id| {
            recipe_ingredient::ActiveModel {
                recipe_id: Set(recipe_id),
                ingredient_id: Set(ingredient_id),
            }
        }))
        .exec(txn)
        .await?;
    }
    Ok(())
}

async fn tag_ids_by_recipe<C: ConnectionTrait>(
    db: &C,
    recipe_ids: &[i32],
) -> Result<HashMap<i32, Vec<i32>>, AppError> {
    if recipe_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows: Vec<(i32, i32)> = recipe_tag::Entity::find()
        .select_only()
        .column(recipe_tag::Column::RecipeId)
        .column(recipe_tag::Column::TagId)
        .filter(recipe_tag::Column::RecipeId.is_in(recipe_ids.to_vec()))
        .order_by_asc(recipe_tag::Column::TagId)
        .into_tuple()
        .all(db)
        .await?;

    let mut map: HashMap<i32, Vec<i32>> = HashMap::new();
    for (recipe_id, tag_id) in rows {
        map.entry(recipe_id).or_default().push(tag_id);
    }
    Ok(map)
}

async fn ingredient_ids_by_recipe<C: ConnectionTrait>(
    db: &C,
    recipe_ids: &[i32],
) -> Result<HashMap<i32, Vec<i32>>, AppError> {
    if recipe_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows: Vec<(i32, i32)> = recipe_ingredient::Entity::find()
        .select_only()
        .column(recipe_ingredient::Column::RecipeId)
        .column(recipe_ingredient::Column::IngredientId)
        .filter(recipe_ingredient::Column::RecipeId.is_in(recipe_ids.to_vec()))
        .order_by_asc(recipe_ingredient::Column::IngredientId)
        .into_tuple()
        .all(db)
        .await?;

    let mut map: HashMap<i32, Vec<i32>> = HashMap::new();
    for (recipe_id, ingredient_id) in rows {
        map.entry(recipe_id).or_default().push(ingredient_id);
    }
    Ok(map)
}
