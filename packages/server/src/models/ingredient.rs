use serde::{Deserialize, Serialize};

use super::shared::validate_text;
use crate::error::AppError;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct IngredientRequest {
    #[serde(default)]
    #[schema(example = "Garlic")]
    pub name: String,
}

pub fn validate_ingredient(payload: &IngredientRequest) -> Result<(), AppError> {
    validate_text(&payload.name, "Name")
}

#[derive(Serialize, Deserialize, PartialEq, Debug, utoipa::ToSchema)]
pub struct IngredientResponse {
    #[schema(example = 3)]
    pub id: i32,
    #[schema(example = "Garlic")]
    pub name: String,
}

impl From<crate::entity::ingredient::Model> for IngredientResponse {
    fn from(m: crate::entity::ingredient::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
        }
    }
}
