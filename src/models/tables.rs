use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;

use super::admin_model::Admin;
use super::bet_model::{Bet, Category, CategoryWithStats, Odd, Vote};
use crate::error::AppError;

#[derive(Debug, Clone, FromRow)]
pub struct CategoryTable {
    pub id: i64,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub bet_count: i64,
}

impl From<CategoryTable> for CategoryWithStats {
    fn from(row: CategoryTable) -> Self {
        CategoryWithStats {
            category: Category {
                id: row.id,
                title: row.title,
                created_at: row.created_at,
            },
            bet_count: row.bet_count,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct BetTable {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub status: String,
    pub category_id: i64,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub category_title: Option<String>,
}

impl TryFrom<BetTable> for Bet {
    type Error = AppError;

    fn try_from(row: BetTable) -> Result<Self, Self::Error> {
        Ok(Bet {
            id: row.id,
            title: row.title,
            description: row.description,
            status: row
                .status
                .parse()
                .map_err(|_| {
                    AppError::Internal(format!("bet {} has status '{}'", row.id, row.status))
                })?,
            category_id: row.category_id,
            created_at: row.created_at,
            resolved_at: row.resolved_at,
        })
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct OddTable {
    pub id: i64,
    pub title: String,
    pub value: Decimal,
    pub bet_id: i64,
    pub result: String,
    pub created_at: DateTime<Utc>,
    pub total_votes: i64,
}

impl TryFrom<OddTable> for Odd {
    type Error = AppError;

    fn try_from(row: OddTable) -> Result<Self, Self::Error> {
        Ok(Odd {
            id: row.id,
            title: row.title,
            value: row.value,
            bet_id: row.bet_id,
            result: row.result.parse()?,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct VoteTable {
    pub id: i64,
    pub odd_id: i64,
    pub created_at: DateTime<Utc>,
}

impl From<VoteTable> for Vote {
    fn from(row: VoteTable) -> Self {
        Vote {
            id: row.id,
            odd_id: row.odd_id,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct AdminTable {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl From<AdminTable> for Admin {
    fn from(row: AdminTable) -> Self {
        Admin {
            id: row.id,
            username: row.username,
            email: row.email,
            password_hash: row.password_hash,
            created_at: row.created_at,
        }
    }
}
