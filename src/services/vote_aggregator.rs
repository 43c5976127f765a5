//! Vote totals are never stored; they are derived from the vote rows on every read.

use std::sync::Arc;

use log::info;

use crate::error::{AppError, AppResult};
use crate::models::{BetAggregate, BetWithOdds, OddWithVotes, Vote};
use crate::store::Store;
use crate::types::pagination::{PageRequest, Paginated};
use crate::types::vote_types::VoteFilter;

/// Per-odd counts plus their sum for the bet.
pub fn compute_totals(aggregate: BetAggregate) -> BetWithOdds {
    let BetAggregate {
        bet,
        category,
        odds,
        vote_counts,
    } = aggregate;

    let odds: Vec<OddWithVotes> = odds
        .into_iter()
        .map(|odd| {
            let total_votes = vote_counts.get(&odd.id).copied().unwrap_or(0);
            OddWithVotes { odd, total_votes }
        })
        .collect();

    let total_votes = odds.iter().map(|o| o.total_votes).sum();

    BetWithOdds {
        bet,
        category,
        odds,
        total_votes,
    }
}

#[derive(Clone)]
pub struct VoteAggregator {
    store: Arc<dyn Store>,
}

impl VoteAggregator {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Appends one vote. Accepted whatever the bet's status.
    pub async fn cast_vote(&self, odd_id: i64) -> AppResult<Vote> {
        let vote = self.store.insert_vote(odd_id).await?;
        info!("Vote cast: vote_id={}, odd_id={}", vote.id, odd_id);
        Ok(vote)
    }

    pub async fn find_odd(&self, odd_id: i64) -> AppResult<OddWithVotes> {
        self.store
            .find_odd(odd_id)
            .await?
            .ok_or_else(|| AppError::not_found("Odd", odd_id))
    }

    pub async fn list_odds(&self) -> AppResult<Vec<OddWithVotes>> {
        self.store.list_odds().await
    }

    pub async fn list_votes(
        &self,
        filter: &VoteFilter,
        page: PageRequest,
    ) -> AppResult<Paginated<Vote>> {
        let (votes, total) = self.store.list_votes(filter, page).await?;
        Ok(Paginated::new(votes, page, total))
    }
}
