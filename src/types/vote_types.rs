use serde::Deserialize;
use validator::Validate;

use super::pagination::{PageRequest, SortOrder};

#[derive(Deserialize, Validate, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CreateVoteRequest {
    #[validate(range(min = 1, message = "Odd ID must be a positive integer"))]
    pub odd_id: i64,
}

#[derive(Deserialize, Validate, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct VoteQuery {
    #[validate(range(min = 1, message = "Page must be at least 1"))]
    pub page: Option<u32>,

    #[validate(range(min = 1, max = 100, message = "Limit must be between 1 and 100"))]
    pub limit: Option<u32>,

    pub sort_order: Option<SortOrder>,

    #[validate(range(min = 1, message = "Bet ID must be a positive integer"))]
    pub bet_id: Option<i64>,

    #[validate(range(min = 1, message = "Odd ID must be a positive integer"))]
    pub odd_id: Option<i64>,
}

impl VoteQuery {
    pub fn page_request(&self) -> PageRequest {
        PageRequest::new(self.page, self.limit)
    }

    pub fn filter(&self) -> VoteFilter {
        VoteFilter {
            bet_id: self.bet_id,
            odd_id: self.odd_id,
            sort_order: self.sort_order.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct VoteFilter {
    pub bet_id: Option<i64>,
    pub odd_id: Option<i64>,
    pub sort_order: SortOrder,
}
