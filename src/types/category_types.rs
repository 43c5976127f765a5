use std::borrow::Cow;

use serde::Deserialize;
use validator::{Validate, ValidationError};

use super::pagination::{PageRequest, SortOrder};

#[derive(Deserialize, Validate, Debug, Clone)]
pub struct CreateCategoryRequest {
    #[validate(custom(function = "validate_category_title"))]
    pub title: String,
}

#[derive(Deserialize, Validate, Debug, Clone)]
pub struct UpdateCategoryRequest {
    #[validate(custom(function = "validate_category_title"))]
    pub title: String,
}

#[derive(Deserialize, Validate, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct CategoryQuery {
    #[validate(range(min = 1, message = "Page must be at least 1"))]
    pub page: Option<u32>,

    #[validate(range(min = 1, max = 100, message = "Limit must be between 1 and 100"))]
    pub limit: Option<u32>,

    pub sort_order: Option<SortOrder>,
    pub search: Option<String>,
}

impl CategoryQuery {
    pub fn page_request(&self) -> PageRequest {
        PageRequest::new(self.page, self.limit)
    }

    pub fn filter(&self) -> CategoryFilter {
        CategoryFilter {
            search: self
                .search
                .as_ref()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            sort_order: self.sort_order.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CategoryFilter {
    pub search: Option<String>,
    pub sort_order: SortOrder,
}

fn validate_category_title(title: &str) -> Result<(), ValidationError> {
    let trimmed = title.trim();
    let len = trimmed.chars().count();

    let message: Option<&'static str> = if len < 2 {
        Some("Title must be at least 2 characters")
    } else if len > 50 {
        Some("Title cannot exceed 50 characters")
    } else if !trimmed
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c.is_whitespace() || c == '-' || c == '_')
    {
        Some("Title contains invalid characters")
    } else {
        None
    };

    match message {
        Some(message) => {
            let mut err = ValidationError::new("title");
            err.message = Some(Cow::Borrowed(message));
            Err(err)
        }
        None => Ok(()),
    }
}
