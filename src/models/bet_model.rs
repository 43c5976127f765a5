use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum BetStatus {
    Open,
    Closed,
    Resolved,
}

impl BetStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BetStatus::Open => "open",
            BetStatus::Closed => "closed",
            BetStatus::Resolved => "resolved",
        }
    }
}

impl fmt::Display for BetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BetStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(BetStatus::Open),
            "closed" => Ok(BetStatus::Closed),
            "resolved" => Ok(BetStatus::Resolved),
            other => Err(AppError::field(
                "status",
                format!("Invalid bet status '{other}', expected open, closed or resolved"),
            )),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum OddResult {
    Pending,
    Won,
    Lost,
}

impl OddResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            OddResult::Pending => "pending",
            OddResult::Won => "won",
            OddResult::Lost => "lost",
        }
    }
}

impl FromStr for OddResult {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OddResult::Pending),
            "won" => Ok(OddResult::Won),
            "lost" => Ok(OddResult::Lost),
            other => Err(AppError::Internal(format!("unknown odd result '{other}'"))),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: i64,
    pub title: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CategoryWithStats {
    #[serde(flatten)]
    pub category: Category,
    pub bet_count: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CategorySummary {
    pub id: i64,
    pub title: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Bet {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub status: BetStatus,
    pub category_id: i64,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Odd {
    pub id: i64,
    pub title: String,
    pub value: Decimal,
    pub bet_id: i64,
    pub result: OddResult,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Vote {
    pub id: i64,
    pub odd_id: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OddWithVotes {
    #[serde(flatten)]
    pub odd: Odd,
    pub total_votes: i64,
}

/// Read model returned to clients: the bet, its odds and derived vote totals.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BetWithOdds {
    #[serde(flatten)]
    pub bet: Bet,
    pub category: Option<CategorySummary>,
    pub odds: Vec<OddWithVotes>,
    pub total_votes: i64,
}

/// Raw bet state as loaded from a store, before totals are derived.
#[derive(Debug, Clone)]
pub struct BetAggregate {
    pub bet: Bet,
    pub category: Option<CategorySummary>,
    pub odds: Vec<Odd>,
    /// Vote count per odd id. Odds without votes may be absent.
    pub vote_counts: HashMap<i64, i64>,
}

#[derive(Debug, Clone)]
pub struct NewOdd {
    pub title: String,
    pub value: Decimal,
}

#[derive(Debug, Clone)]
pub struct NewBet {
    pub title: String,
    pub description: Option<String>,
    pub category_id: i64,
    pub odds: Vec<NewOdd>,
}

#[derive(Debug, Clone, Default)]
pub struct BetChanges {
    pub title: Option<String>,
    /// `Some(None)` clears the description.
    pub description: Option<Option<String>>,
    pub category_id: Option<i64>,
}

impl BetChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.category_id.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_text() {
        for status in [BetStatus::Open, BetStatus::Closed, BetStatus::Resolved] {
            assert_eq!(status.as_str().parse::<BetStatus>().unwrap(), status);
        }
        assert!("pending".parse::<BetStatus>().is_err());
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&BetStatus::Closed).unwrap(), "\"closed\"");
        assert_eq!(serde_json::to_string(&OddResult::Won).unwrap(), "\"won\"");
    }
}
