pub mod admin_types;
pub mod auth_types;
pub mod bet_types;
pub mod category_types;
pub mod pagination;
pub mod vote_types;

use crate::error::{AppError, AppResult};

/// Path ids arrive as signed integers; only positive ones address a row.
pub fn positive_id(id: i64) -> AppResult<i64> {
    if id < 1 {
        return Err(AppError::field("id", "ID must be a positive integer"));
    }
    Ok(id)
}
