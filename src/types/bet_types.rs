use std::borrow::Cow;
use std::collections::HashSet;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Deserializer, Serialize};
use validator::{Validate, ValidationError};

use super::pagination::{PageRequest, SortOrder};
use crate::error::{AppError, AppResult};
use crate::models::{BetChanges, BetStatus, NewBet, NewOdd};

pub const MIN_ODDS: usize = 2;
pub const MAX_ODDS: usize = 10;
pub const MIN_ODD_VALUE: Decimal = dec!(1.01);
pub const MAX_ODD_VALUE: Decimal = dec!(1000);
/// Matches the `NUMERIC(10, 2)` column.
pub const ODD_VALUE_SCALE: u32 = 2;

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CreateOddInput {
    pub title: String,
    pub value: Decimal,
}

#[derive(Deserialize, Validate, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CreateBetRequest {
    #[validate(custom(function = "validate_bet_title"))]
    pub title: String,

    #[validate(length(max = 1000, message = "Description cannot exceed 1000 characters"))]
    pub description: Option<String>,

    #[validate(range(min = 1, message = "Category ID must be a positive integer"))]
    pub category_id: i64,

    #[validate(custom(function = "validate_odds"))]
    pub odds: Vec<CreateOddInput>,
}

impl CreateBetRequest {
    pub fn into_new_bet(self) -> NewBet {
        NewBet {
            title: self.title.trim().to_string(),
            description: self.description,
            category_id: self.category_id,
            odds: self
                .odds
                .into_iter()
                .map(|odd| NewOdd {
                    title: odd.title.trim().to_string(),
                    value: odd.value,
                })
                .collect(),
        }
    }
}

#[derive(Deserialize, Validate, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBetRequest {
    #[validate(custom(function = "validate_bet_title"))]
    pub title: Option<String>,

    #[serde(default, deserialize_with = "present_or_null")]
    pub description: Option<Option<String>>,

    #[validate(range(min = 1, message = "Category ID must be a positive integer"))]
    pub category_id: Option<i64>,
}

impl UpdateBetRequest {
    pub fn into_changes(self) -> AppResult<BetChanges> {
        if let Some(Some(description)) = &self.description {
            if description.chars().count() > 1000 {
                return Err(AppError::field(
                    "description",
                    "Description cannot exceed 1000 characters",
                ));
            }
        }

        let changes = BetChanges {
            title: self.title.map(|t| t.trim().to_string()),
            description: self.description,
            category_id: self.category_id,
        };

        if changes.is_empty() {
            return Err(AppError::validation("At least one field must be provided"));
        }

        Ok(changes)
    }
}

#[derive(Deserialize, Validate, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ResolveBetRequest {
    #[validate(range(min = 1, message = "Winning odd ID must be a positive integer"))]
    pub winning_odd_id: i64,
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BetSortField {
    #[default]
    #[serde(rename = "createdAt")]
    CreatedAt,
    #[serde(rename = "title")]
    Title,
}

#[derive(Deserialize, Validate, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct BetQuery {
    #[validate(range(min = 1, message = "Page must be at least 1"))]
    pub page: Option<u32>,

    #[validate(range(min = 1, max = 100, message = "Limit must be between 1 and 100"))]
    pub limit: Option<u32>,

    pub sort_by: Option<BetSortField>,
    pub sort_order: Option<SortOrder>,
    pub status: Option<BetStatus>,

    #[validate(range(min = 1, message = "Category ID must be a positive integer"))]
    pub category_id: Option<i64>,

    pub search: Option<String>,
}

impl BetQuery {
    pub fn page_request(&self) -> PageRequest {
        PageRequest::new(self.page, self.limit)
    }

    pub fn filter(&self) -> BetFilter {
        BetFilter {
            status: self.status,
            category_id: self.category_id,
            search: self
                .search
                .as_ref()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            sort_by: self.sort_by.unwrap_or_default(),
            sort_order: self.sort_order.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct BetFilter {
    pub status: Option<BetStatus>,
    pub category_id: Option<i64>,
    pub search: Option<String>,
    pub sort_by: BetSortField,
    pub sort_order: SortOrder,
}

fn present_or_null<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

fn invalid(code: &'static str, message: impl Into<Cow<'static, str>>) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    err
}

fn validate_bet_title(title: &str) -> Result<(), ValidationError> {
    let len = title.trim().chars().count();
    if len < 2 {
        return Err(invalid("length", "Title must be at least 2 characters"));
    }
    if len > 255 {
        return Err(invalid("length", "Title cannot exceed 255 characters"));
    }
    Ok(())
}

#[allow(clippy::ptr_arg)]
fn validate_odds(odds: &Vec<CreateOddInput>) -> Result<(), ValidationError> {
    if odds.len() < MIN_ODDS {
        return Err(invalid("odds_count", "At least 2 odds are required"));
    }
    if odds.len() > MAX_ODDS {
        return Err(invalid("odds_count", "Cannot have more than 10 odds"));
    }

    let mut seen = HashSet::new();
    for odd in odds {
        let title = odd.title.trim();
        let len = title.chars().count();
        if len == 0 {
            return Err(invalid("odd_title", "Odd title is required"));
        }
        if len > 100 {
            return Err(invalid("odd_title", "Odd title cannot exceed 100 characters"));
        }
        if odd.value < MIN_ODD_VALUE {
            return Err(invalid("odd_value", "Odd value must be greater than 1.00"));
        }
        if odd.value > MAX_ODD_VALUE {
            return Err(invalid("odd_value", "Odd value cannot exceed 1000"));
        }
        if odd.value.normalize().scale() > ODD_VALUE_SCALE {
            return Err(invalid(
                "odd_value",
                "Odd value can have at most 2 decimal places",
            ));
        }
        if !seen.insert(title.to_lowercase()) {
            return Err(invalid("odd_unique", "Odd titles must be unique"));
        }
    }

    Ok(())
}
