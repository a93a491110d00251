use serde::{Deserialize, Serialize};

use super::shared::validate_text;
use crate::error::AppError;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct TagRequest {
    #[serde(default)]
    #[schema(example = "Vegan")]
    pub name: String,
}

pub fn validate_tag(payload: &TagRequest) -> Result<(), AppError> {
    validate_text(&payload.name, "Name")
}

#[derive(Serialize, Deserialize, PartialEq, Debug, utoipa::ToSchema)]
pub struct TagResponse {
    #[schema(example = 1)]
    pub id: i32,
    #[schema(example = "Vegan")]
    pub name: String,
}

impl From<crate::entity::tag::Model> for TagResponse {
    fn from(m: crate::entity::tag::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
        }
    }
}
