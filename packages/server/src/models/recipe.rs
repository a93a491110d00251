use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::IntoParams;

use super::ingredient::IngredientResponse;
use super::shared::{MAX_TEXT_LEN, parse_id_list, validate_text};
use super::tag::TagResponse;
use crate::error::AppError;

/// Decimal places stored for prices.
const PRICE_SCALE: u32 = 2;
/// Largest price magnitude that fits `NUMERIC(5, 2)`, exclusive.
const PRICE_LIMIT: i64 = 1000;

/// Body for `POST` and `PUT`. On `PUT`, absent tag/ingredient lists clear the relation.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct RecipeRequest {
    #[schema(example = "Spaghetti Carbonara")]
    pub title: String,
    #[schema(example = 21)]
    pub time_minutes: i32,
    /// Accepts a JSON number or a decimal string.
    #[schema(value_type = String, example = "3.75")]
    pub price: Decimal,
    #[serde(default)]
    #[schema(example = "https://example.com/carbonara")]
    pub link: String,
    #[serde(default)]
    #[schema(example = json!([1, 2]))]
    pub tags: Vec<i32>,
    #[serde(default)]
    #[schema(example = json!([3]))]
    pub ingredients: Vec<i32>,
}

/// Validated scalar fields, with the price rescaled to two decimal places.
pub struct RecipeFields {
    pub title: String,
    pub time_minutes: i32,
    pub price: Decimal,
    pub link: String,
}

pub fn validate_recipe(payload: &RecipeRequest) -> Result<RecipeFields, AppError> {
    validate_text(&payload.title, "Title")?;
    validate_time_minutes(payload.time_minutes)?;
    validate_link(&payload.link)?;
    Ok(RecipeFields {
        title: payload.title.trim().to_string(),
        time_minutes: payload.time_minutes,
        price: normalize_price(payload.price)?,
        link: payload.link.trim().to_string(),
    })
}

/// Body for `PATCH`. Only supplied fields change; a supplied list replaces the relation.
#[derive(Deserialize, Default, utoipa::ToSchema)]
pub struct UpdateRecipeRequest {
    pub title: Option<String>,
    pub time_minutes: Option<i32>,
    #[schema(value_type = Option<String>)]
    pub price: Option<Decimal>,
    pub link: Option<String>,
    pub tags: Option<Vec<i32>>,
    pub ingredients: Option<Vec<i32>>,
}

pub fn validate_update_recipe(payload: &UpdateRecipeRequest) -> Result<(), AppError> {
    if let Some(ref title) = payload.title {
        validate_text(title, "Title")?;
    }
    if let Some(minutes) = payload.time_minutes {
        validate_time_minutes(minutes)?;
    }
    if let Some(price) = payload.price {
        normalize_price(price)?;
    }
    if let Some(ref link) = payload.link {
        validate_link(link)?;
    }
    Ok(())
}

fn validate_time_minutes(minutes: i32) -> Result<(), AppError> {
    if minutes < 0 {
        return Err(AppError::Validation("time_minutes must be >= 0".into()));
    }
    Ok(())
}

fn validate_link(link: &str) -> Result<(), AppError> {
    if link.trim().chars().count() > MAX_TEXT_LEN {
        return Err(AppError::Validation(format!(
            "Link must be at most {MAX_TEXT_LEN} characters"
        )));
    }
    Ok(())
}

/// Check a price fits `NUMERIC(5, 2)` and return it with exactly two decimal places.
pub fn normalize_price(price: Decimal) -> Result<Decimal, AppError> {
    if price.is_sign_negative() && !price.is_zero() {
        return Err(AppError::Validation("Price must be >= 0".into()));
    }
    let mut price = price.normalize();
    if price.scale() > PRICE_SCALE {
        return Err(AppError::Validation(
            "Price must have at most 2 decimal places".into(),
        ));
    }
    if price >= Decimal::from(PRICE_LIMIT) {
        return Err(AppError::Validation(
            "Price must have at most 3 digits before the decimal point".into(),
        ));
    }
    price.rescale(PRICE_SCALE);
    Ok(price)
}

/// Query parameters for the recipe list.
#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RecipeListQuery {
    /// Comma-separated tag IDs; recipes with any of them are returned.
    #[param(example = "1,2")]
    pub tags: Option<String>,
    /// Comma-separated ingredient IDs; recipes with any of them are returned.
    #[param(example = "3")]
    pub ingredients: Option<String>,
}

impl RecipeListQuery {
    pub fn tag_ids(&self) -> Result<Option<Vec<i32>>, AppError> {
        self.tags
            .as_deref()
            .map(|raw| parse_id_list(raw, "tag"))
            .transpose()
    }

    pub fn ingredient_ids(&self) -> Result<Option<Vec<i32>>, AppError> {
        self.ingredients
            .as_deref()
            .map(|raw| parse_id_list(raw, "ingredient"))
            .transpose()
    }
}

/// List representation: relations are plain ID lists.
#[derive(Serialize, Deserialize, Debug, PartialEq, utoipa::ToSchema)]
pub struct RecipeResponse {
    #[schema(example = 7)]
    pub id: i32,
    #[schema(example = "Spaghetti Carbonara")]
    pub title: String,
    #[schema(example = 21)]
    pub time_minutes: i32,
    #[schema(value_type = String, example = "3.75")]
    pub price: Decimal,
    #[schema(example = "")]
    pub link: String,
    #[schema(example = json!([1, 2]))]
    pub tags: Vec<i32>,
    #[schema(example = json!([3]))]
    pub ingredients: Vec<i32>,
}

impl RecipeResponse {
    pub fn new(m: crate::entity::recipe::Model, tags: Vec<i32>, ingredients: Vec<i32>) -> Self {
        Self {
            id: m.id,
            title: m.title,
            time_minutes: m.time_minutes,
            price: m.price,
            link: m.link,
            tags,
            ingredients,
        }
    }
}

/// Detail representation: relations are nested objects, plus the image URL.
#[derive(Serialize, Deserialize, Debug, PartialEq, utoipa::ToSchema)]
pub struct RecipeDetailResponse {
    pub id: i32,
    pub title: String,
    pub time_minutes: i32,
    #[schema(value_type = String, example = "3.75")]
    pub price: Decimal,
    pub link: String,
    pub tags: Vec<TagResponse>,
    pub ingredients: Vec<IngredientResponse>,
    /// Public URL of the uploaded image, if any.
    #[schema(example = "/media/uploads/recipe/0192f0c4-7f8e-7c3e-a7a5-1c2b3d4e5f60.jpg")]
    pub image: Option<String>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct RecipeImageResponse {
    pub id: i32,
    pub image: Option<String>,
}
