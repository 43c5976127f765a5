//! Persistence seam. Every multi-row write runs as one unit inside the store:
//! either all of it becomes visible or none of it does.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;

use crate::error::AppResult;
use crate::models::{
    Admin, AdminChanges, BetAggregate, BetChanges, CategoryWithStats, NewBet, OddWithVotes, Vote,
};
use crate::types::bet_types::BetFilter;
use crate::types::category_types::CategoryFilter;
use crate::types::pagination::PageRequest;
use crate::types::vote_types::VoteFilter;

pub use memory::MemoryStore;
pub use postgres::PgStore;

pub const CATEGORY_HAS_BETS: &str = "Cannot delete category that has bets";
pub const CATEGORY_TITLE_TAKEN: &str = "Category with this title already exists";
pub const ADMIN_TAKEN: &str = "Admin with this username or email already exists";

#[async_trait]
pub trait Store: Send + Sync {
    /// Fails with Conflict when the title exists, compared case-insensitively.
    async fn create_category(&self, title: &str) -> AppResult<CategoryWithStats>;
    async fn find_category(&self, id: i64) -> AppResult<Option<CategoryWithStats>>;
    async fn find_category_by_title(&self, title: &str) -> AppResult<Option<CategoryWithStats>>;
    async fn list_categories(
        &self,
        filter: &CategoryFilter,
        page: PageRequest,
    ) -> AppResult<(Vec<CategoryWithStats>, i64)>;
    async fn update_category(&self, id: i64, title: &str) -> AppResult<CategoryWithStats>;
    /// Fails with Conflict while the category still owns bets.
    async fn delete_category(&self, id: i64) -> AppResult<()>;

    /// Creates the bet and all of its odds together; NotFound for an unknown category.
    async fn create_bet(&self, bet: &NewBet) -> AppResult<BetAggregate>;
    async fn find_bet(&self, id: i64) -> AppResult<Option<BetAggregate>>;
    /// `page = None` returns every match.
    async fn list_bets(
        &self,
        filter: &BetFilter,
        page: Option<PageRequest>,
    ) -> AppResult<(Vec<BetAggregate>, i64)>;
    /// Resolved bets are frozen (Conflict).
    async fn update_bet(&self, id: i64, changes: &BetChanges) -> AppResult<BetAggregate>;
    /// Cascades to the bet's odds and their votes.
    async fn delete_bet(&self, id: i64) -> AppResult<()>;
    async fn close_bet(&self, id: i64) -> AppResult<BetAggregate>;
    async fn resolve_bet(&self, id: i64, winning_odd_id: i64) -> AppResult<BetAggregate>;

    async fn find_odd(&self, id: i64) -> AppResult<Option<OddWithVotes>>;
    async fn list_odds(&self) -> AppResult<Vec<OddWithVotes>>;

    /// NotFound when the odd does not exist.
    async fn insert_vote(&self, odd_id: i64) -> AppResult<Vote>;
    async fn list_votes(&self, filter: &VoteFilter, page: PageRequest)
        -> AppResult<(Vec<Vote>, i64)>;

    async fn create_admin(&self, username: &str, email: &str, password_hash: &str)
        -> AppResult<Admin>;
    /// Matches either the username or the e-mail.
    async fn find_admin_by_login(&self, login: &str) -> AppResult<Option<Admin>>;
    async fn find_admin(&self, id: i64) -> AppResult<Option<Admin>>;
    async fn list_admins(&self) -> AppResult<Vec<Admin>>;
    /// Conflict when the new username or e-mail belongs to another admin.
    async fn update_admin(&self, id: i64, changes: &AdminChanges) -> AppResult<Admin>;
    async fn delete_admin(&self, id: i64) -> AppResult<()>;
}
