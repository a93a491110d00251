use serde::Deserialize;
use utoipa::IntoParams;

use crate::error::AppError;

/// Longest accepted value for short text columns (names, titles, links).
pub const MAX_TEXT_LEN: usize = 255;

/// Validate a trimmed name or title (1-255 Unicode characters).
pub fn validate_text(value: &str, field: &str) -> Result<(), AppError> {
    let value = value.trim();
    if value.is_empty() || value.chars().count() > MAX_TEXT_LEN {
        return Err(AppError::Validation(format!(
            "{field} must be 1-{MAX_TEXT_LEN} characters"
        )));
    }
    Ok(())
}

/// Query parameters accepted by the tag and ingredient list endpoints.
#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AssignedQuery {
    /// When truthy (`1`, `true`), only return rows attached to at least one recipe.
    #[param(example = "1")]
    pub assigned_only: Option<String>,
}

impl AssignedQuery {
    pub fn assigned_only(&self) -> Result<bool, AppError> {
        match self.assigned_only.as_deref().map(str::trim) {
            None | Some("") => Ok(false),
            Some(raw) => parse_flag(raw).ok_or_else(|| {
                AppError::Validation("assigned_only must be an integer or boolean".into())
            }),
        }
    }
}

/// Interpret `1`/`0`/`true`/`false` style flags. Any non-zero integer is true.
fn parse_flag(raw: &str) -> Option<bool> {
    if let Ok(n) = raw.parse::<i64>() {
        return Some(n != 0);
    }
    match raw.to_ascii_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

/// Parse a comma-separated ID list such as `1,2,3`. Empty segments are skipped.
pub fn parse_id_list(raw: &str, name: &str) -> Result<Vec<i32>, AppError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<i32>()
                .map_err(|_| AppError::Validation(format!("Invalid {name} ID: '{s}'")))
        })
        .collect()
}

/// Sort and deduplicate a list of IDs from a request body.
pub fn dedup_ids(mut ids: Vec<i32>) -> Vec<i32> {
    ids.sort_unstable();
    ids.dedup();
    ids
}
