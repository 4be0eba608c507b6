// src/db/category_repo.rs

use sqlx::PgPool;

use crate::{common::error::AppError, models::category::Category};

#[derive(Clone)]
pub struct CategoryRepository {
    pool: PgPool,
}

impl CategoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---
    // Funções de "Leitura" (Getters)
    // ---

    // Lista apenas categorias ativas: o soft-delete é um filtro explícito,
    // nunca um escopo implícito.
    pub async fn find_all_active(&self) -> Result<Vec<Category>, AppError> {
        let categories = sqlx::query_as::<_, Category>(
            "SELECT * FROM categories WHERE active = TRUE ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(categories)
    }

    // Busca em lote para montar a listagem de produtos com categoria.
    pub async fn find_by_ids(&self, ids: &[i32]) -> Result<Vec<Category>, AppError> {
        let categories = sqlx::query_as::<_, Category>(
            "SELECT * FROM categories WHERE id = ANY($1)",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(categories)
    }

    pub async fn find_by_id(&self, id: i32) -> Result<Option<Category>, AppError> {
        let maybe_category = sqlx::query_as::<_, Category>(
            "SELECT * FROM categories WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(maybe_category)
    }

    // ---
    // Funções de "Escrita"
    // ---
    // Todas de um statement só: não precisam de transação externa.

    pub async fn create(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> Result<Category, AppError> {
        let category = sqlx::query_as::<_, Category>(
            r#"
            INSERT INTO categories (name, description)
            VALUES ($1, $2)
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(description)
        .fetch_one(&self.pool)
        .await?;
        Ok(category)
    }

    // Atualização parcial: campos ausentes mantêm o valor atual.
    pub async fn update(
        &self,
        id: i32,
        name: Option<&str>,
        description: Option<&str>,
    ) -> Result<Option<Category>, AppError> {
        let maybe_category = sqlx::query_as::<_, Category>(
            r#"
            UPDATE categories SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(description)
        .fetch_optional(&self.pool)
        .await?;
        Ok(maybe_category)
    }

    // Soft-delete: desliga o flag, preservando o histórico referencial.
    pub async fn soft_delete(&self, id: i32) -> Result<Option<Category>, AppError> {
        let maybe_category = sqlx::query_as::<_, Category>(
            r#"
            UPDATE categories SET active = FALSE, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(maybe_category)
    }
}
