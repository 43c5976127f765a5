use std::sync::Arc;

use log::info;

use crate::error::{AppError, AppResult};
use crate::models::CategoryWithStats;
use crate::store::{Store, CATEGORY_TITLE_TAKEN};
use crate::types::category_types::CategoryFilter;
use crate::types::pagination::{PageRequest, Paginated};

#[derive(Clone)]
pub struct CategoryService {
    store: Arc<dyn Store>,
}

impl CategoryService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn create(&self, title: &str) -> AppResult<CategoryWithStats> {
        let title = title.trim();
        if self.store.find_category_by_title(title).await?.is_some() {
            return Err(AppError::conflict(CATEGORY_TITLE_TAKEN));
        }

        let category = self.store.create_category(title).await?;
        info!(
            "Created category: category_id={}, title={}",
            category.category.id, category.category.title
        );
        Ok(category)
    }

    pub async fn find_by_id(&self, id: i64) -> AppResult<CategoryWithStats> {
        self.store
            .find_category(id)
            .await?
            .ok_or_else(|| AppError::not_found("Category", id))
    }

    pub async fn find_all(
        &self,
        filter: &CategoryFilter,
        page: PageRequest,
    ) -> AppResult<Paginated<CategoryWithStats>> {
        let (categories, total) = self.store.list_categories(filter, page).await?;
        Ok(Paginated::new(categories, page, total))
    }

    pub async fn update(&self, id: i64, title: &str) -> AppResult<CategoryWithStats> {
        let title = title.trim();
        self.find_by_id(id).await?;

        if let Some(existing) = self.store.find_category_by_title(title).await? {
            if existing.category.id != id {
                return Err(AppError::conflict(CATEGORY_TITLE_TAKEN));
            }
        }

        let category = self.store.update_category(id, title).await?;
        info!("Renamed category: category_id={}, title={}", id, title);
        Ok(category)
    }

    pub async fn delete(&self, id: i64) -> AppResult<()> {
        self.store.delete_category(id).await?;
        info!("Deleted category: category_id={}", id);
        Ok(())
    }
}
