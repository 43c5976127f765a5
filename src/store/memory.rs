use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::Utc;

use super::{Store, ADMIN_TAKEN, CATEGORY_HAS_BETS, CATEGORY_TITLE_TAKEN};
use crate::error::{AppError, AppResult};
use crate::models::{
    Admin, AdminChanges, Bet, BetAggregate, BetChanges, BetStatus, Category, CategorySummary,
    CategoryWithStats, NewBet, Odd, OddResult, OddWithVotes, Vote,
};
use crate::services::bet_lifecycle;
use crate::types::bet_types::{BetFilter, BetSortField};
use crate::types::category_types::CategoryFilter;
use crate::types::pagination::{PageRequest, SortOrder};
use crate::types::vote_types::VoteFilter;

#[derive(Default)]
struct Tables {
    next_id: i64,
    categories: BTreeMap<i64, Category>,
    bets: BTreeMap<i64, Bet>,
    odds: BTreeMap<i64, Odd>,
    votes: BTreeMap<i64, Vote>,
    admins: BTreeMap<i64, Admin>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn bet_count(&self, category_id: i64) -> i64 {
        self.bets
            .values()
            .filter(|b| b.category_id == category_id)
            .count() as i64
    }

    fn vote_count(&self, odd_id: i64) -> i64 {
        self.votes.values().filter(|v| v.odd_id == odd_id).count() as i64
    }

    fn category_with_stats(&self, category: &Category) -> CategoryWithStats {
        CategoryWithStats {
            category: category.clone(),
            bet_count: self.bet_count(category.id),
        }
    }

    fn title_taken(&self, title: &str, except: Option<i64>) -> bool {
        let wanted = title.to_lowercase();
        self.categories
            .values()
            .any(|c| Some(c.id) != except && c.title.to_lowercase() == wanted)
    }

    fn odds_of(&self, bet_id: i64) -> Vec<Odd> {
        self.odds
            .values()
            .filter(|o| o.bet_id == bet_id)
            .cloned()
            .collect()
    }

    fn aggregate(&self, bet: &Bet) -> BetAggregate {
        let odds = self.odds_of(bet.id);
        let vote_counts: HashMap<i64, i64> =
            odds.iter().map(|o| (o.id, self.vote_count(o.id))).collect();

        BetAggregate {
            bet: bet.clone(),
            category: self.categories.get(&bet.category_id).map(|c| CategorySummary {
                id: c.id,
                title: c.title.clone(),
            }),
            odds,
            vote_counts,
        }
    }

    fn bet(&self, id: i64) -> AppResult<&Bet> {
        self.bets.get(&id).ok_or_else(|| AppError::not_found("Bet", id))
    }
}

/// In-process store. One lock guards every table, so each operation is
/// applied as a single serializable unit.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> AppResult<RwLockReadGuard<'_, Tables>> {
        self.inner
            .read()
            .map_err(|_| AppError::Internal("memory store poisoned".into()))
    }

    fn write(&self) -> AppResult<RwLockWriteGuard<'_, Tables>> {
        self.inner
            .write()
            .map_err(|_| AppError::Internal("memory store poisoned".into()))
    }
}

fn paginate<T>(items: Vec<T>, page: PageRequest) -> Vec<T> {
    items
        .into_iter()
        .skip(page.offset() as usize)
        .take(page.limit as usize)
        .collect()
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_category(&self, title: &str) -> AppResult<CategoryWithStats> {
        let mut tables = self.write()?;
        if tables.title_taken(title, None) {
            return Err(AppError::conflict(CATEGORY_TITLE_TAKEN));
        }

        let category = Category {
            id: tables.next_id(),
            title: title.to_string(),
            created_at: Utc::now(),
        };
        tables.categories.insert(category.id, category.clone());

        Ok(CategoryWithStats {
            category,
            bet_count: 0,
        })
    }

    async fn find_category(&self, id: i64) -> AppResult<Option<CategoryWithStats>> {
        let tables = self.read()?;
        Ok(tables
            .categories
            .get(&id)
            .map(|c| tables.category_with_stats(c)))
    }

    async fn find_category_by_title(&self, title: &str) -> AppResult<Option<CategoryWithStats>> {
        let tables = self.read()?;
        let wanted = title.to_lowercase();
        Ok(tables
            .categories
            .values()
            .find(|c| c.title.to_lowercase() == wanted)
            .map(|c| tables.category_with_stats(c)))
    }

    async fn list_categories(
        &self,
        filter: &CategoryFilter,
        page: PageRequest,
    ) -> AppResult<(Vec<CategoryWithStats>, i64)> {
        let tables = self.read()?;
        let needle = filter.search.as_ref().map(|s| s.to_lowercase());

        let mut matches: Vec<&Category> = tables
            .categories
            .values()
            .filter(|c| match &needle {
                Some(n) => c.title.to_lowercase().contains(n),
                None => true,
            })
            .collect();

        matches.sort_by_key(|c| (c.created_at, c.id));
        if filter.sort_order == SortOrder::Desc {
            matches.reverse();
        }

        let total = matches.len() as i64;
        let rows = paginate(matches, page)
            .into_iter()
            .map(|c| tables.category_with_stats(c))
            .collect();

        Ok((rows, total))
    }

    async fn update_category(&self, id: i64, title: &str) -> AppResult<CategoryWithStats> {
        let mut tables = self.write()?;
        if !tables.categories.contains_key(&id) {
            return Err(AppError::not_found("Category", id));
        }
        if tables.title_taken(title, Some(id)) {
            return Err(AppError::conflict(CATEGORY_TITLE_TAKEN));
        }

        let Some(category) = tables.categories.get_mut(&id) else {
            return Err(AppError::not_found("Category", id));
        };
        category.title = title.to_string();
        let category = category.clone();

        Ok(tables.category_with_stats(&category))
    }

    async fn delete_category(&self, id: i64) -> AppResult<()> {
        let mut tables = self.write()?;
        if !tables.categories.contains_key(&id) {
            return Err(AppError::not_found("Category", id));
        }
        if tables.bet_count(id) > 0 {
            return Err(AppError::conflict(CATEGORY_HAS_BETS));
        }
        tables.categories.remove(&id);
        Ok(())
    }

    async fn create_bet(&self, new_bet: &NewBet) -> AppResult<BetAggregate> {
        let mut tables = self.write()?;
        if !tables.categories.contains_key(&new_bet.category_id) {
            return Err(AppError::not_found("Category", new_bet.category_id));
        }

        let now = Utc::now();
        let bet = Bet {
            id: tables.next_id(),
            title: new_bet.title.clone(),
            description: new_bet.description.clone(),
            status: BetStatus::Open,
            category_id: new_bet.category_id,
            created_at: now,
            resolved_at: None,
        };

        for input in &new_bet.odds {
            let odd = Odd {
                id: tables.next_id(),
                title: input.title.clone(),
                value: input.value,
                bet_id: bet.id,
                result: OddResult::Pending,
                created_at: now,
            };
            tables.odds.insert(odd.id, odd);
        }
        tables.bets.insert(bet.id, bet.clone());

        Ok(tables.aggregate(&bet))
    }

    async fn find_bet(&self, id: i64) -> AppResult<Option<BetAggregate>> {
        let tables = self.read()?;
        Ok(tables.bets.get(&id).map(|b| tables.aggregate(b)))
    }

    async fn list_bets(
        &self,
        filter: &BetFilter,
        page: Option<PageRequest>,
    ) -> AppResult<(Vec<BetAggregate>, i64)> {
        let tables = self.read()?;
        let needle = filter.search.as_ref().map(|s| s.to_lowercase());

        let mut matches: Vec<&Bet> = tables
            .bets
            .values()
            .filter(|b| filter.status.map_or(true, |s| b.status == s))
            .filter(|b| filter.category_id.map_or(true, |c| b.category_id == c))
            .filter(|b| match &needle {
                Some(n) => b.title.to_lowercase().contains(n),
                None => true,
            })
            .collect();

        match filter.sort_by {
            BetSortField::CreatedAt => matches.sort_by_key(|b| (b.created_at, b.id)),
            BetSortField::Title => {
                matches.sort_by(|a, b| {
                    a.title
                        .to_lowercase()
                        .cmp(&b.title.to_lowercase())
                        .then(a.id.cmp(&b.id))
                })
            }
        }
        if filter.sort_order == SortOrder::Desc {
            matches.reverse();
        }

        let total = matches.len() as i64;
        let matches = match page {
            Some(page) => paginate(matches, page),
            None => matches,
        };

        Ok((matches.into_iter().map(|b| tables.aggregate(b)).collect(), total))
    }

    async fn update_bet(&self, id: i64, changes: &BetChanges) -> AppResult<BetAggregate> {
        let mut tables = self.write()?;
        bet_lifecycle::ensure_editable(tables.bet(id)?)?;

        if let Some(category_id) = changes.category_id {
            if !tables.categories.contains_key(&category_id) {
                return Err(AppError::not_found("Category", category_id));
            }
        }

        let Some(bet) = tables.bets.get_mut(&id) else {
            return Err(AppError::not_found("Bet", id));
        };
        if let Some(title) = &changes.title {
            bet.title = title.clone();
        }
        if let Some(description) = &changes.description {
            bet.description = description.clone();
        }
        if let Some(category_id) = changes.category_id {
            bet.category_id = category_id;
        }
        let bet = bet.clone();

        Ok(tables.aggregate(&bet))
    }

    async fn delete_bet(&self, id: i64) -> AppResult<()> {
        let mut tables = self.write()?;
        if tables.bets.remove(&id).is_none() {
            return Err(AppError::not_found("Bet", id));
        }

        let odd_ids: Vec<i64> = tables
            .odds
            .values()
            .filter(|o| o.bet_id == id)
            .map(|o| o.id)
            .collect();
        tables.votes.retain(|_, v| !odd_ids.contains(&v.odd_id));
        tables.odds.retain(|_, o| o.bet_id != id);

        Ok(())
    }

    async fn close_bet(&self, id: i64) -> AppResult<BetAggregate> {
        let mut tables = self.write()?;
        bet_lifecycle::ensure_closable(tables.bet(id)?)?;

        let Some(bet) = tables.bets.get_mut(&id) else {
            return Err(AppError::not_found("Bet", id));
        };
        bet_lifecycle::apply_close(bet);
        let bet = bet.clone();

        Ok(tables.aggregate(&bet))
    }

    async fn resolve_bet(&self, id: i64, winning_odd_id: i64) -> AppResult<BetAggregate> {
        let mut tables = self.write()?;
        let mut bet = tables.bet(id)?.clone();
        let mut odds = tables.odds_of(id);

        let resolution = bet_lifecycle::plan_resolution(&bet, &odds, winning_odd_id, Utc::now())?;
        bet_lifecycle::apply_resolution(&mut bet, &mut odds, &resolution);

        for odd in odds {
            tables.odds.insert(odd.id, odd);
        }
        tables.bets.insert(bet.id, bet.clone());

        Ok(tables.aggregate(&bet))
    }

    async fn find_odd(&self, id: i64) -> AppResult<Option<OddWithVotes>> {
        let tables = self.read()?;
        Ok(tables.odds.get(&id).map(|odd| OddWithVotes {
            odd: odd.clone(),
            total_votes: tables.vote_count(odd.id),
        }))
    }

    async fn list_odds(&self) -> AppResult<Vec<OddWithVotes>> {
        let tables = self.read()?;
        Ok(tables
            .odds
            .values()
            .map(|odd| OddWithVotes {
                odd: odd.clone(),
                total_votes: tables.vote_count(odd.id),
            })
            .collect())
    }

    async fn insert_vote(&self, odd_id: i64) -> AppResult<Vote> {
        let mut tables = self.write()?;
        if !tables.odds.contains_key(&odd_id) {
            return Err(AppError::not_found("Odd", odd_id));
        }

        let vote = Vote {
            id: tables.next_id(),
            odd_id,
            created_at: Utc::now(),
        };
        tables.votes.insert(vote.id, vote.clone());
        Ok(vote)
    }

    async fn list_votes(
        &self,
        filter: &VoteFilter,
        page: PageRequest,
    ) -> AppResult<(Vec<Vote>, i64)> {
        let tables = self.read()?;

        let mut matches: Vec<Vote> = tables
            .votes
            .values()
            .filter(|v| filter.odd_id.map_or(true, |o| v.odd_id == o))
            .filter(|v| match filter.bet_id {
                Some(bet_id) => tables.odds.get(&v.odd_id).map(|o| o.bet_id) == Some(bet_id),
                None => true,
            })
            .cloned()
            .collect();

        matches.sort_by_key(|v| (v.created_at, v.id));
        if filter.sort_order == SortOrder::Desc {
            matches.reverse();
        }

        let total = matches.len() as i64;
        Ok((paginate(matches, page), total))
    }

    async fn create_admin(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> AppResult<Admin> {
        let mut tables = self.write()?;
        let taken = tables.admins.values().any(|a| {
            a.username == username || a.email.eq_ignore_ascii_case(email)
        });
        if taken {
            return Err(AppError::conflict(ADMIN_TAKEN));
        }

        let admin = Admin {
            id: tables.next_id(),
            username: username.to_string(),
            email: email.to_lowercase(),
            password_hash: password_hash.to_string(),
            created_at: Utc::now(),
        };
        tables.admins.insert(admin.id, admin.clone());
        Ok(admin)
    }

    async fn find_admin_by_login(&self, login: &str) -> AppResult<Option<Admin>> {
        let tables = self.read()?;
        Ok(tables
            .admins
            .values()
            .find(|a| a.username == login || a.email.eq_ignore_ascii_case(login))
            .cloned())
    }

    async fn find_admin(&self, id: i64) -> AppResult<Option<Admin>> {
        Ok(self.read()?.admins.get(&id).cloned())
    }

    async fn list_admins(&self) -> AppResult<Vec<Admin>> {
        Ok(self.read()?.admins.values().cloned().collect())
    }

    async fn update_admin(&self, id: i64, changes: &AdminChanges) -> AppResult<Admin> {
        let mut tables = self.write()?;
        if !tables.admins.contains_key(&id) {
            return Err(AppError::not_found("Admin", id));
        }

        let taken = tables.admins.values().any(|a| {
            a.id != id
                && (changes
                    .username
                    .as_ref()
                    .is_some_and(|u| a.username == *u)
                    || changes
                        .email
                        .as_ref()
                        .is_some_and(|e| a.email.eq_ignore_ascii_case(e)))
        });
        if taken {
            return Err(AppError::conflict(ADMIN_TAKEN));
        }

        let Some(admin) = tables.admins.get_mut(&id) else {
            return Err(AppError::not_found("Admin", id));
        };
        if let Some(username) = &changes.username {
            admin.username = username.clone();
        }
        if let Some(email) = &changes.email {
            admin.email = email.to_lowercase();
        }
        if let Some(hash) = &changes.password_hash {
            admin.password_hash = hash.clone();
        }
        Ok(admin.clone())
    }

    async fn delete_admin(&self, id: i64) -> AppResult<()> {
        if self.write()?.admins.remove(&id).is_none() {
            return Err(AppError::not_found("Admin", id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;
    use crate::models::NewOdd;

    async fn seed(store: &MemoryStore) -> (i64, BetAggregate) {
        let category = store.create_category("Sports").await.unwrap();
        let bet = store
            .create_bet(&NewBet {
                title: "Brazil vs Argentina".into(),
                description: Some("Final".into()),
                category_id: category.category.id,
                odds: vec![
                    NewOdd {
                        title: "Brazil".into(),
                        value: dec!(2.1),
                    },
                    NewOdd {
                        title: "Argentina".into(),
                        value: dec!(1.8),
                    },
                ],
            })
            .await
            .unwrap();
        (category.category.id, bet)
    }

    #[tokio::test]
    async fn create_bet_starts_open_with_pending_odds() {
        let store = MemoryStore::new();
        let (_, bet) = seed(&store).await;

        assert_eq!(bet.bet.status, BetStatus::Open);
        assert!(bet.bet.resolved_at.is_none());
        assert_eq!(bet.odds.len(), 2);
        assert!(bet.odds.iter().all(|o| o.result == OddResult::Pending));
        assert_eq!(bet.category.unwrap().title, "Sports");
    }

    #[tokio::test]
    async fn create_bet_in_unknown_category_fails() {
        let store = MemoryStore::new();
        let err = store
            .create_bet(&NewBet {
                title: "Orphan".into(),
                description: None,
                category_id: 404,
                odds: vec![],
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert!(store.list_odds().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn category_titles_are_unique_ignoring_case() {
        let store = MemoryStore::new();
        store.create_category("Politics").await.unwrap();
        let err = store.create_category("POLITICS").await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn failed_resolution_leaves_state_untouched() {
        let store = MemoryStore::new();
        let (_, first) = seed(&store).await;
        let second = store
            .create_bet(&NewBet {
                title: "Second".into(),
                description: None,
                category_id: first.bet.category_id,
                odds: vec![
                    NewOdd {
                        title: "Yes".into(),
                        value: dec!(1.5),
                    },
                    NewOdd {
                        title: "No".into(),
                        value: dec!(2.5),
                    },
                ],
            })
            .await
            .unwrap();

        let foreign_odd = second.odds[0].id;
        let err = store.resolve_bet(first.bet.id, foreign_odd).await.unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));

        for id in [first.bet.id, second.bet.id] {
            let bet = store.find_bet(id).await.unwrap().unwrap();
            assert_eq!(bet.bet.status, BetStatus::Open);
            assert!(bet.odds.iter().all(|o| o.result == OddResult::Pending));
        }
    }

    #[tokio::test]
    async fn deleting_bet_cascades_to_odds_and_votes() {
        let store = MemoryStore::new();
        let (category_id, bet) = seed(&store).await;
        let odd_id = bet.odds[0].id;
        store.insert_vote(odd_id).await.unwrap();

        store.delete_bet(bet.bet.id).await.unwrap();

        assert!(store.find_odd(odd_id).await.unwrap().is_none());
        let (votes, total) = store
            .list_votes(&VoteFilter::default(), PageRequest::default())
            .await
            .unwrap();
        assert!(votes.is_empty());
        assert_eq!(total, 0);
        assert_eq!(
            store.find_category(category_id).await.unwrap().unwrap().bet_count,
            0
        );
    }

    #[tokio::test]
    async fn concurrent_resolutions_have_one_winner() {
        let store = MemoryStore::new();
        let (_, bet) = seed(&store).await;
        let (a, b) = (bet.odds[0].id, bet.odds[1].id);

        let s1 = store.clone();
        let s2 = store.clone();
        let bet_id = bet.bet.id;
        let first = tokio::spawn(async move { s1.resolve_bet(bet_id, a).await });
        let second = tokio::spawn(async move { s2.resolve_bet(bet_id, b).await });

        let outcomes = [first.await.unwrap(), second.await.unwrap()];
        let succeeded = outcomes.iter().filter(|r| r.is_ok()).count();
        assert_eq!(succeeded, 1);
        assert!(outcomes
            .iter()
            .any(|r| matches!(r, Err(AppError::Conflict(_)))));

        let stored = store.find_bet(bet_id).await.unwrap().unwrap();
        let winners = stored.odds.iter().filter(|o| o.result == OddResult::Won).count();
        assert_eq!(winners, 1);
    }

    #[tokio::test]
    async fn votes_filter_by_bet() {
        let store = MemoryStore::new();
        let (_, bet) = seed(&store).await;
        store.insert_vote(bet.odds[0].id).await.unwrap();
        store.insert_vote(bet.odds[1].id).await.unwrap();

        let filter = VoteFilter {
            bet_id: Some(bet.bet.id),
            ..VoteFilter::default()
        };
        let (_, total) = store.list_votes(&filter, PageRequest::default()).await.unwrap();
        assert_eq!(total, 2);

        let other = VoteFilter {
            bet_id: Some(bet.bet.id + 1000),
            ..VoteFilter::default()
        };
        let (_, total) = store.list_votes(&other, PageRequest::default()).await.unwrap();
        assert_eq!(total, 0);
    }
}
