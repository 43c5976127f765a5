//! Bet lifecycle: `open -> closed -> resolved`.
//!
//! The rules here are pure; each [`Store`] applies them inside its own
//! transaction so the status check and the writes are isolated together.
//! Resolution is allowed from `open` as well as `closed`; `resolved` is terminal.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::info;

use super::vote_aggregator::compute_totals;
use crate::error::{AppError, AppResult};
use crate::models::{Bet, BetStatus, BetWithOdds, Odd, OddResult};
use crate::store::Store;

pub const CLOSE_CONFLICT: &str = "Only open bets can be closed";
pub const ALREADY_RESOLVED: &str = "Bet is already resolved";
pub const INVALID_WINNING_ODD: &str = "Invalid winning odd: it does not belong to this bet";
pub const FROZEN_BET: &str = "Cannot update a resolved bet";

/// Writes produced by a successful resolution check.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub bet_id: i64,
    pub winning_odd_id: i64,
    pub losing_odd_ids: Vec<i64>,
    pub resolved_at: DateTime<Utc>,
}

pub fn ensure_closable(bet: &Bet) -> AppResult<()> {
    if bet.status != BetStatus::Open {
        return Err(AppError::conflict(CLOSE_CONFLICT));
    }
    Ok(())
}

pub fn ensure_editable(bet: &Bet) -> AppResult<()> {
    if bet.status == BetStatus::Resolved {
        return Err(AppError::conflict(FROZEN_BET));
    }
    Ok(())
}

/// `odds` must be the bet's full odd set as read inside the caller's transaction.
pub fn plan_resolution(
    bet: &Bet,
    odds: &[Odd],
    winning_odd_id: i64,
    now: DateTime<Utc>,
) -> AppResult<Resolution> {
    if bet.status == BetStatus::Resolved {
        return Err(AppError::conflict(ALREADY_RESOLVED));
    }

    let belongs = odds
        .iter()
        .any(|odd| odd.id == winning_odd_id && odd.bet_id == bet.id);
    if !belongs {
        return Err(AppError::field("winningOddId", INVALID_WINNING_ODD));
    }

    let losing_odd_ids = odds
        .iter()
        .filter(|odd| odd.bet_id == bet.id && odd.id != winning_odd_id)
        .map(|odd| odd.id)
        .collect();

    Ok(Resolution {
        bet_id: bet.id,
        winning_odd_id,
        losing_odd_ids,
        resolved_at: now,
    })
}

pub fn apply_close(bet: &mut Bet) {
    bet.status = BetStatus::Closed;
}

pub fn apply_resolution(bet: &mut Bet, odds: &mut [Odd], resolution: &Resolution) {
    bet.status = BetStatus::Resolved;
    bet.resolved_at = Some(resolution.resolved_at);

    for odd in odds.iter_mut().filter(|odd| odd.bet_id == resolution.bet_id) {
        odd.result = if odd.id == resolution.winning_odd_id {
            OddResult::Won
        } else {
            OddResult::Lost
        };
    }
}

#[derive(Clone)]
pub struct BetLifecycle {
    store: Arc<dyn Store>,
}

impl BetLifecycle {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn close_bet(&self, bet_id: i64) -> AppResult<BetWithOdds> {
        let aggregate = self.store.close_bet(bet_id).await?;
        info!("Closed bet: bet_id={}", bet_id);
        Ok(compute_totals(aggregate))
    }

    pub async fn resolve_bet(&self, bet_id: i64, winning_odd_id: i64) -> AppResult<BetWithOdds> {
        let aggregate = self.store.resolve_bet(bet_id, winning_odd_id).await?;
        info!(
            "Resolved bet: bet_id={}, winning_odd_id={}",
            bet_id, winning_odd_id
        );
        Ok(compute_totals(aggregate))
    }
}
