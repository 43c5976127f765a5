use std::sync::Arc;

use log::info;

use super::vote_aggregator::compute_totals;
use crate::error::{AppError, AppResult};
use crate::models::{BetChanges, BetStatus, BetWithOdds, NewBet};
use crate::store::Store;
use crate::types::bet_types::BetFilter;
use crate::types::pagination::{PageRequest, Paginated};

/// CRUD over bets. Status moves only through [`super::bet_lifecycle::BetLifecycle`].
#[derive(Clone)]
pub struct BetService {
    store: Arc<dyn Store>,
}

impl BetService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn create(&self, new_bet: NewBet) -> AppResult<BetWithOdds> {
        let aggregate = self.store.create_bet(&new_bet).await?;
        info!(
            "Created bet: bet_id={}, category_id={}, odds={}",
            aggregate.bet.id,
            aggregate.bet.category_id,
            aggregate.odds.len()
        );
        Ok(compute_totals(aggregate))
    }

    pub async fn find_by_id(&self, id: i64) -> AppResult<BetWithOdds> {
        self.store
            .find_bet(id)
            .await?
            .map(compute_totals)
            .ok_or_else(|| AppError::not_found("Bet", id))
    }

    pub async fn find_all(
        &self,
        filter: &BetFilter,
        page: PageRequest,
    ) -> AppResult<Paginated<BetWithOdds>> {
        let (bets, total) = self.store.list_bets(filter, Some(page)).await?;
        let bets = bets.into_iter().map(compute_totals).collect();
        Ok(Paginated::new(bets, page, total))
    }

    pub async fn find_by_status(&self, status: BetStatus) -> AppResult<Vec<BetWithOdds>> {
        let filter = BetFilter {
            status: Some(status),
            ..BetFilter::default()
        };
        let (bets, _) = self.store.list_bets(&filter, None).await?;
        Ok(bets.into_iter().map(compute_totals).collect())
    }

    pub async fn find_by_category(&self, category_id: i64) -> AppResult<Vec<BetWithOdds>> {
        if self.store.find_category(category_id).await?.is_none() {
            return Err(AppError::not_found("Category", category_id));
        }

        let filter = BetFilter {
            category_id: Some(category_id),
            ..BetFilter::default()
        };
        let (bets, _) = self.store.list_bets(&filter, None).await?;
        Ok(bets.into_iter().map(compute_totals).collect())
    }

    pub async fn update(&self, id: i64, changes: BetChanges) -> AppResult<BetWithOdds> {
        let aggregate = self.store.update_bet(id, &changes).await?;
        info!("Updated bet: bet_id={}", id);
        Ok(compute_totals(aggregate))
    }

    pub async fn delete(&self, id: i64) -> AppResult<()> {
        self.store.delete_bet(id).await?;
        info!("Deleted bet: bet_id={}", id);
        Ok(())
    }
}
