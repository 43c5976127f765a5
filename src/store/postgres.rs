use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use log::info;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};

use super::{Store, ADMIN_TAKEN, CATEGORY_HAS_BETS, CATEGORY_TITLE_TAKEN};
use crate::error::{AppError, AppResult};
use crate::models::tables::{AdminTable, BetTable, CategoryTable, OddTable, VoteTable};
use crate::models::{
    Admin, AdminChanges, Bet, BetAggregate, BetChanges, CategorySummary, CategoryWithStats, NewBet,
    Odd, OddWithVotes, Vote,
};
use crate::services::bet_lifecycle;
use crate::types::bet_types::{BetFilter, BetSortField};
use crate::types::category_types::CategoryFilter;
use crate::types::pagination::PageRequest;
use crate::types::vote_types::VoteFilter;

const CATEGORY_SELECT: &str = r#"
    SELECT c.id, c.title, c.created_at,
        (SELECT COUNT(*) FROM bets b WHERE b.category_id = c.id) AS bet_count
    FROM categories c
"#;

const BET_SELECT: &str = r#"
    SELECT b.id, b.title, b.description, b.status, b.category_id,
        b.created_at, b.resolved_at, c.title AS category_title
    FROM bets b
    LEFT JOIN categories c ON c.id = b.category_id
"#;

const ODD_SELECT: &str = r#"
    SELECT o.id, o.title, o.value, o.bet_id, o.result, o.created_at,
        COUNT(v.id) AS total_votes
    FROM odds o
    LEFT JOIN votes v ON v.odd_id = o.id
"#;

/// Postgres-backed store. Lifecycle writes lock the bet row (`FOR UPDATE`)
/// before checking its status, inside the same transaction as the writes.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str, max_connections: u32) -> AppResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        info!("Connected to Postgres database");
        Ok(Self::new(pool))
    }

    pub async fn run_migrations(&self) -> AppResult<()> {
        sqlx::migrate!()
            .run(&self.pool)
            .await
            .map_err(|e| AppError::Internal(format!("failed to run migrations: {e}")))?;

        info!("Database migrations applied");
        Ok(())
    }
}

/// `ILIKE` pattern matching `search` literally anywhere in the column.
fn contains_pattern(search: &str) -> String {
    let escaped = search
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

fn unique_violation_as(err: sqlx::Error, message: &str) -> AppError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => AppError::conflict(message),
        _ => AppError::Database(err),
    }
}

async fn fetch_bet(conn: &mut PgConnection, id: i64, lock: bool) -> AppResult<Option<BetTable>> {
    let mut sql = format!("{BET_SELECT} WHERE b.id = $1");
    if lock {
        sql.push_str(" FOR UPDATE OF b");
    }

    Ok(sqlx::query_as::<_, BetTable>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?)
}

async fn fetch_odds(conn: &mut PgConnection, bet_ids: &[i64]) -> AppResult<Vec<OddTable>> {
    let sql = format!("{ODD_SELECT} WHERE o.bet_id = ANY($1) GROUP BY o.id ORDER BY o.id ASC");

    Ok(sqlx::query_as::<_, OddTable>(&sql)
        .bind(bet_ids)
        .fetch_all(&mut *conn)
        .await?)
}

async fn category_exists(conn: &mut PgConnection, id: i64) -> AppResult<bool> {
    let found: Option<i64> =
        sqlx::query_scalar("SELECT id FROM categories WHERE id = $1 FOR SHARE")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;
    Ok(found.is_some())
}

async fn assemble(conn: &mut PgConnection, rows: Vec<BetTable>) -> AppResult<Vec<BetAggregate>> {
    let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
    let mut odds_by_bet: HashMap<i64, Vec<OddTable>> = HashMap::new();

    if !ids.is_empty() {
        for odd in fetch_odds(conn, &ids).await? {
            odds_by_bet.entry(odd.bet_id).or_default().push(odd);
        }
    }

    rows.into_iter()
        .map(|row| {
            let category = row.category_title.clone().map(|title| CategorySummary {
                id: row.category_id,
                title,
            });
            let odd_rows = odds_by_bet.remove(&row.id).unwrap_or_default();
            let vote_counts = odd_rows.iter().map(|o| (o.id, o.total_votes)).collect();
            let odds = odd_rows
                .into_iter()
                .map(Odd::try_from)
                .collect::<AppResult<Vec<_>>>()?;

            Ok(BetAggregate {
                bet: Bet::try_from(row)?,
                category,
                odds,
                vote_counts,
            })
        })
        .collect()
}

async fn load_aggregate(conn: &mut PgConnection, id: i64) -> AppResult<BetAggregate> {
    let row = fetch_bet(conn, id, false)
        .await?
        .ok_or_else(|| AppError::not_found("Bet", id))?;

    assemble(conn, vec![row])
        .await?
        .pop()
        .ok_or_else(|| AppError::Internal(format!("bet {id} vanished while loading")))
}

fn push_bet_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &BetFilter) {
    qb.push(" WHERE TRUE");
    if let Some(status) = filter.status {
        qb.push(" AND b.status = ").push_bind(status.as_str());
    }
    if let Some(category_id) = filter.category_id {
        qb.push(" AND b.category_id = ").push_bind(category_id);
    }
    if let Some(search) = &filter.search {
        qb.push(" AND b.title ILIKE ").push_bind(contains_pattern(search));
    }
}

fn push_vote_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &VoteFilter) {
    qb.push(" WHERE TRUE");
    if let Some(odd_id) = filter.odd_id {
        qb.push(" AND v.odd_id = ").push_bind(odd_id);
    }
    if let Some(bet_id) = filter.bet_id {
        qb.push(" AND o.bet_id = ").push_bind(bet_id);
    }
}

fn odd_with_votes(row: OddTable) -> AppResult<OddWithVotes> {
    let total_votes = row.total_votes;
    Ok(OddWithVotes {
        odd: Odd::try_from(row)?,
        total_votes,
    })
}

#[async_trait]
impl Store for PgStore {
    async fn create_category(&self, title: &str) -> AppResult<CategoryWithStats> {
        let row = sqlx::query_as::<_, CategoryTable>(
            r#"
            INSERT INTO categories (title)
            VALUES ($1)
            RETURNING id, title, created_at, 0::BIGINT AS bet_count
            "#,
        )
        .bind(title)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| unique_violation_as(e, CATEGORY_TITLE_TAKEN))?;

        Ok(row.into())
    }

    async fn find_category(&self, id: i64) -> AppResult<Option<CategoryWithStats>> {
        let row =
            sqlx::query_as::<_, CategoryTable>(&format!("{CATEGORY_SELECT} WHERE c.id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(Into::into))
    }

    async fn find_category_by_title(&self, title: &str) -> AppResult<Option<CategoryWithStats>> {
        let row = sqlx::query_as::<_, CategoryTable>(&format!(
            "{CATEGORY_SELECT} WHERE LOWER(c.title) = LOWER($1)"
        ))
        .bind(title)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn list_categories(
        &self,
        filter: &CategoryFilter,
        page: PageRequest,
    ) -> AppResult<(Vec<CategoryWithStats>, i64)> {
        let search = filter.search.as_deref().map(contains_pattern);

        let mut qb = QueryBuilder::<Postgres>::new(CATEGORY_SELECT);
        qb.push(" WHERE TRUE");
        if let Some(search) = &search {
            qb.push(" AND c.title ILIKE ").push_bind(search.clone());
        }
        qb.push(" ORDER BY c.created_at ")
            .push(filter.sort_order.as_sql())
            .push(", c.id ")
            .push(filter.sort_order.as_sql())
            .push(" LIMIT ")
            .push_bind(page.limit as i64)
            .push(" OFFSET ")
            .push_bind(page.offset());

        let rows = qb
            .build_query_as::<CategoryTable>()
            .fetch_all(&self.pool)
            .await?;

        let mut count =
            QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM categories c WHERE TRUE");
        if let Some(search) = search {
            count.push(" AND c.title ILIKE ").push_bind(search);
        }
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        Ok((rows.into_iter().map(Into::into).collect(), total))
    }

    async fn update_category(&self, id: i64, title: &str) -> AppResult<CategoryWithStats> {
        let row = sqlx::query_as::<_, CategoryTable>(
            r#"
            UPDATE categories
            SET title = $1
            WHERE id = $2
            RETURNING id, title, created_at,
                (SELECT COUNT(*) FROM bets b WHERE b.category_id = categories.id) AS bet_count
            "#,
        )
        .bind(title)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| unique_violation_as(e, CATEGORY_TITLE_TAKEN))?;

        row.map(Into::into)
            .ok_or_else(|| AppError::not_found("Category", id))
    }

    async fn delete_category(&self, id: i64) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        let found: Option<i64> =
            sqlx::query_scalar("SELECT id FROM categories WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        if found.is_none() {
            return Err(AppError::not_found("Category", id));
        }

        let bets: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM bets WHERE category_id = $1")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;
        if bets > 0 {
            return Err(AppError::conflict(CATEGORY_HAS_BETS));
        }

        sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn create_bet(&self, new_bet: &NewBet) -> AppResult<BetAggregate> {
        let mut tx = self.pool.begin().await?;

        if !category_exists(&mut tx, new_bet.category_id).await? {
            return Err(AppError::not_found("Category", new_bet.category_id));
        }

        let bet_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO bets (title, description, status, category_id)
            VALUES ($1, $2, 'open', $3)
            RETURNING id
            "#,
        )
        .bind(&new_bet.title)
        .bind(&new_bet.description)
        .bind(new_bet.category_id)
        .fetch_one(&mut *tx)
        .await?;

        for odd in &new_bet.odds {
            sqlx::query(
                r#"
                INSERT INTO odds (title, value, bet_id, result)
                VALUES ($1, $2, $3, 'pending')
                "#,
            )
            .bind(&odd.title)
            .bind(odd.value)
            .bind(bet_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| unique_violation_as(e, "Odd titles must be unique"))?;
        }

        let aggregate = load_aggregate(&mut tx, bet_id).await?;
        tx.commit().await?;
        Ok(aggregate)
    }

    async fn find_bet(&self, id: i64) -> AppResult<Option<BetAggregate>> {
        let mut conn = self.pool.acquire().await?;
        match fetch_bet(&mut conn, id, false).await? {
            Some(row) => Ok(assemble(&mut conn, vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn list_bets(
        &self,
        filter: &BetFilter,
        page: Option<PageRequest>,
    ) -> AppResult<(Vec<BetAggregate>, i64)> {
        let mut conn = self.pool.acquire().await?;

        let sort_column = match filter.sort_by {
            BetSortField::CreatedAt => "b.created_at",
            BetSortField::Title => "LOWER(b.title)",
        };
        let order = filter.sort_order.as_sql();

        let mut qb = QueryBuilder::<Postgres>::new(BET_SELECT);
        push_bet_filters(&mut qb, filter);
        qb.push(" ORDER BY ")
            .push(sort_column)
            .push(" ")
            .push(order)
            .push(", b.id ")
            .push(order);
        if let Some(page) = page {
            qb.push(" LIMIT ")
                .push_bind(page.limit as i64)
                .push(" OFFSET ")
                .push_bind(page.offset());
        }

        let rows = qb
            .build_query_as::<BetTable>()
            .fetch_all(&mut *conn)
            .await?;

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM bets b");
        push_bet_filters(&mut count, filter);
        let total: i64 = count.build_query_scalar().fetch_one(&mut *conn).await?;

        Ok((assemble(&mut conn, rows).await?, total))
    }

    async fn update_bet(&self, id: i64, changes: &BetChanges) -> AppResult<BetAggregate> {
        let mut tx = self.pool.begin().await?;

        let current: Bet = fetch_bet(&mut tx, id, true)
            .await?
            .ok_or_else(|| AppError::not_found("Bet", id))?
            .try_into()?;
        bet_lifecycle::ensure_editable(&current)?;

        if let Some(category_id) = changes.category_id {
            if !category_exists(&mut tx, category_id).await? {
                return Err(AppError::not_found("Category", category_id));
            }
        }

        let title = changes.title.as_ref().unwrap_or(&current.title);
        let description = changes
            .description
            .clone()
            .unwrap_or_else(|| current.description.clone());
        let category_id = changes.category_id.unwrap_or(current.category_id);

        sqlx::query(
            r#"
            UPDATE bets
            SET title = $1,
                description = $2,
                category_id = $3
            WHERE id = $4
            "#,
        )
        .bind(title)
        .bind(description)
        .bind(category_id)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        let aggregate = load_aggregate(&mut tx, id).await?;
        tx.commit().await?;
        Ok(aggregate)
    }

    async fn delete_bet(&self, id: i64) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM bets WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Bet", id));
        }
        Ok(())
    }

    async fn close_bet(&self, id: i64) -> AppResult<BetAggregate> {
        let mut tx = self.pool.begin().await?;

        let bet: Bet = fetch_bet(&mut tx, id, true)
            .await?
            .ok_or_else(|| AppError::not_found("Bet", id))?
            .try_into()?;
        bet_lifecycle::ensure_closable(&bet)?;

        sqlx::query("UPDATE bets SET status = 'closed' WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let aggregate = load_aggregate(&mut tx, id).await?;
        tx.commit().await?;
        Ok(aggregate)
    }

    async fn resolve_bet(&self, id: i64, winning_odd_id: i64) -> AppResult<BetAggregate> {
        let mut tx = self.pool.begin().await?;

        let bet: Bet = fetch_bet(&mut tx, id, true)
            .await?
            .ok_or_else(|| AppError::not_found("Bet", id))?
            .try_into()?;
        let odds = fetch_odds(&mut tx, &[id])
            .await?
            .into_iter()
            .map(Odd::try_from)
            .collect::<AppResult<Vec<_>>>()?;

        let resolution = bet_lifecycle::plan_resolution(&bet, &odds, winning_odd_id, Utc::now())?;

        let updated = sqlx::query(
            r#"
            UPDATE odds
            SET result = CASE WHEN id = $2 THEN 'won' ELSE 'lost' END
            WHERE bet_id = $1
            "#,
        )
        .bind(id)
        .bind(resolution.winning_odd_id)
        .execute(&mut *tx)
        .await?;

        let expected = 1 + resolution.losing_odd_ids.len() as u64;
        if updated.rows_affected() != expected {
            return Err(AppError::Internal(format!(
                "resolution of bet {id} touched {} odds, expected {expected}",
                updated.rows_affected()
            )));
        }

        sqlx::query("UPDATE bets SET status = 'resolved', resolved_at = $2 WHERE id = $1")
            .bind(id)
            .bind(resolution.resolved_at)
            .execute(&mut *tx)
            .await?;

        let aggregate = load_aggregate(&mut tx, id).await?;
        tx.commit().await?;
        Ok(aggregate)
    }

    async fn find_odd(&self, id: i64) -> AppResult<Option<OddWithVotes>> {
        let row = sqlx::query_as::<_, OddTable>(&format!(
            "{ODD_SELECT} WHERE o.id = $1 GROUP BY o.id"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(odd_with_votes).transpose()
    }

    async fn list_odds(&self) -> AppResult<Vec<OddWithVotes>> {
        let rows = sqlx::query_as::<_, OddTable>(&format!(
            "{ODD_SELECT} GROUP BY o.id ORDER BY o.bet_id ASC, o.id ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(odd_with_votes).collect()
    }

    async fn insert_vote(&self, odd_id: i64) -> AppResult<Vote> {
        let row = sqlx::query_as::<_, VoteTable>(
            r#"
            INSERT INTO votes (odd_id)
            VALUES ($1)
            RETURNING id, odd_id, created_at
            "#,
        )
        .bind(odd_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                AppError::not_found("Odd", odd_id)
            }
            _ => AppError::Database(e),
        })?;

        Ok(row.into())
    }

    async fn list_votes(
        &self,
        filter: &VoteFilter,
        page: PageRequest,
    ) -> AppResult<(Vec<Vote>, i64)> {
        let order = filter.sort_order.as_sql();

        let mut qb = QueryBuilder::<Postgres>::new(
            "SELECT v.id, v.odd_id, v.created_at FROM votes v JOIN odds o ON o.id = v.odd_id",
        );
        push_vote_filters(&mut qb, filter);
        qb.push(" ORDER BY v.created_at ")
            .push(order)
            .push(", v.id ")
            .push(order)
            .push(" LIMIT ")
            .push_bind(page.limit as i64)
            .push(" OFFSET ")
            .push_bind(page.offset());

        let rows = qb
            .build_query_as::<VoteTable>()
            .fetch_all(&self.pool)
            .await?;

        let mut count = QueryBuilder::<Postgres>::new(
            "SELECT COUNT(*) FROM votes v JOIN odds o ON o.id = v.odd_id",
        );
        push_vote_filters(&mut count, filter);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        Ok((rows.into_iter().map(Into::into).collect(), total))
    }

    async fn create_admin(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> AppResult<Admin> {
        let row = sqlx::query_as::<_, AdminTable>(
            r#"
            INSERT INTO admins (username, email, password_hash)
            VALUES ($1, LOWER($2), $3)
            RETURNING id, username, email, password_hash, created_at
            "#,
        )
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| unique_violation_as(e, ADMIN_TAKEN))?;

        Ok(row.into())
    }

    async fn find_admin_by_login(&self, login: &str) -> AppResult<Option<Admin>> {
        let row = sqlx::query_as::<_, AdminTable>(
            r#"
            SELECT id, username, email, password_hash, created_at
            FROM admins
            WHERE username = $1 OR email = LOWER($1)
            "#,
        )
        .bind(login)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn find_admin(&self, id: i64) -> AppResult<Option<Admin>> {
        let row = sqlx::query_as::<_, AdminTable>(
            r#"
            SELECT id, username, email, password_hash, created_at
            FROM admins
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn list_admins(&self) -> AppResult<Vec<Admin>> {
        let rows = sqlx::query_as::<_, AdminTable>(
            r#"
            SELECT id, username, email, password_hash, created_at
            FROM admins
            ORDER BY id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn update_admin(&self, id: i64, changes: &AdminChanges) -> AppResult<Admin> {
        let row = sqlx::query_as::<_, AdminTable>(
            r#"
            UPDATE admins
            SET username = COALESCE($1, username),
                email = COALESCE(LOWER($2), email),
                password_hash = COALESCE($3, password_hash)
            WHERE id = $4
            RETURNING id, username, email, password_hash, created_at
            "#,
        )
        .bind(&changes.username)
        .bind(&changes.email)
        .bind(&changes.password_hash)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| unique_violation_as(e, ADMIN_TAKEN))?;

        row.map(Into::into)
            .ok_or_else(|| AppError::not_found("Admin", id))
    }

    async fn delete_admin(&self, id: i64) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM admins WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Admin", id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::contains_pattern;

    #[test]
    fn like_metacharacters_match_literally() {
        assert_eq!(contains_pattern("cup"), "%cup%");
        assert_eq!(contains_pattern("50%"), "%50\\%%");
        assert_eq!(contains_pattern("a_b"), "%a\\_b%");
        assert_eq!(contains_pattern("c:\\x"), "%c:\\\\x%");
    }
}
