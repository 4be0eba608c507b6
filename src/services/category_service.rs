// src/services/category_service.rs

use crate::{common::error::AppError, db::CategoryRepository, models::category::Category};

#[derive(Clone)]
pub struct CategoryService {
    category_repo: CategoryRepository,
}

impl CategoryService {
    pub fn new(category_repo: CategoryRepository) -> Self {
        Self { category_repo }
    }

    pub async fn get_all_categories(&self) -> Result<Vec<Category>, AppError> {
        self.category_repo.find_all_active().await
    }

    pub async fn get_category(&self, id: i32) -> Result<Category, AppError> {
        self.category_repo
            .find_by_id(id)
            .await?
            .ok_or(AppError::CategoryNotFound)
    }

    pub async fn create_category(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> Result<Category, AppError> {
        let category = self.category_repo.create(name, description).await?;
        tracing::info!("Categoria criada: {}", category.name);
        Ok(category)
    }

    pub async fn update_category(
        &self,
        id: i32,
        name: Option<&str>,
        description: Option<&str>,
    ) -> Result<Category, AppError> {
        let updated = self
            .category_repo
            .update(id, name, description)
            .await?
            .ok_or(AppError::CategoryNotFound)?;
        tracing::info!("Categoria atualizada: {}", updated.name);
        Ok(updated)
    }

    pub async fn delete_category(&self, id: i32) -> Result<(), AppError> {
        let deleted = self
            .category_repo
            .soft_delete(id)
            .await?
            .ok_or(AppError::CategoryNotFound)?;
        tracing::info!("Categoria desativada: {}", deleted.name);
        Ok(())
    }
}
