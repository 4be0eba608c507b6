// src/db/product_image_repo.rs

use sqlx::{Executor, PgPool, Postgres};

use crate::{
    common::error::AppError,
    models::product::{NewProductImage, ProductImage},
};

// Repositório do conjunto de imagens de um produto. As operações de
// escrita compõem o invariante "no máximo uma imagem principal" e por
// isso rodam sempre dentro da transação aberta pelo service.
#[derive(Clone)]
pub struct ProductImageRepository {
    pool: PgPool,
}

impl ProductImageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---
    // Funções de "Leitura" (Getters)
    // ---

    // Ordenação: principal primeiro, depois as mais novas. O 'id DESC'
    // desempata criações no mesmo instante, mantendo a listagem estável.
    pub async fn find_by_product(&self, product_id: i32) -> Result<Vec<ProductImage>, AppError> {
        let images = sqlx::query_as::<_, ProductImage>(
            r#"
            SELECT * FROM product_images
            WHERE product_id = $1
            ORDER BY is_main_image DESC, created_at DESC, id DESC
            "#,
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(images)
    }

    // Busca em lote para a listagem do catálogo com imagens.
    pub async fn find_by_products(&self, product_ids: &[i32]) -> Result<Vec<ProductImage>, AppError> {
        let images = sqlx::query_as::<_, ProductImage>(
            r#"
            SELECT * FROM product_images
            WHERE product_id = ANY($1)
            ORDER BY is_main_image DESC, created_at DESC, id DESC
            "#,
        )
        .bind(product_ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(images)
    }

    // ---
    // Funções de "Escrita" (Transacionais)
    // ---

    /// Carrega a imagem escopada ao produto dono. Retorna None se o id
    /// não pertence a esse produto.
    pub async fn find_scoped<'e, E>(
        &self,
        executor: E,
        image_id: i32,
        product_id: i32,
    ) -> Result<Option<ProductImage>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let maybe_image = sqlx::query_as::<_, ProductImage>(
            "SELECT * FROM product_images WHERE id = $1 AND product_id = $2",
        )
        .bind(image_id)
        .bind(product_id)
        .fetch_optional(executor)
        .await?;
        Ok(maybe_image)
    }

    /// O produto já tem alguma imagem principal?
    pub async fn has_main<'e, E>(&self, executor: E, product_id: i32) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM product_images WHERE product_id = $1 AND is_main_image)",
        )
        .bind(product_id)
        .fetch_one(executor)
        .await?;
        Ok(exists)
    }

    pub async fn insert<'e, E>(
        &self,
        executor: E,
        product_id: i32,
        image: &NewProductImage,
    ) -> Result<ProductImage, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let created = sqlx::query_as::<_, ProductImage>(
            r#"
            INSERT INTO product_images (product_id, filename, original_name, mimetype, size, is_main_image)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(product_id)
        .bind(&image.filename)
        .bind(&image.original_name)
        .bind(&image.mimetype)
        .bind(image.size)
        .bind(image.is_main_image)
        .fetch_one(executor)
        .await?;
        Ok(created)
    }

    /// Zera o flag principal de TODAS as imagens do produto. Primeiro
    /// passo de qualquer troca de imagem principal.
    pub async fn clear_main<'e, E>(&self, executor: E, product_id: i32) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            UPDATE product_images SET is_main_image = FALSE, updated_at = NOW()
            WHERE product_id = $1 AND is_main_image
            "#,
        )
        .bind(product_id)
        .execute(executor)
        .await?;
        Ok(())
    }

    /// Marca a imagem como principal, escopada ao produto dono.
    /// Retorna quantas linhas mudaram (0 = id estranho ao produto).
    pub async fn set_main<'e, E>(
        &self,
        executor: E,
        image_id: i32,
        product_id: i32,
    ) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            UPDATE product_images SET is_main_image = TRUE, updated_at = NOW()
            WHERE id = $1 AND product_id = $2
            "#,
        )
        .bind(image_id)
        .bind(product_id)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn delete<'e, E>(&self, executor: E, image_id: i32) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("DELETE FROM product_images WHERE id = $1")
            .bind(image_id)
            .execute(executor)
            .await?;
        Ok(())
    }

    /// Promove a imagem remanescente mais recente (id maior desempata) a
    /// principal. Usada quando a principal acabou de ser removida.
    pub async fn promote_latest<'e, E>(
        &self,
        executor: E,
        product_id: i32,
    ) -> Result<Option<i32>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let promoted: Option<i32> = sqlx::query_scalar(
            r#"
            UPDATE product_images SET is_main_image = TRUE, updated_at = NOW()
            WHERE id = (
                SELECT id FROM product_images
                WHERE product_id = $1
                ORDER BY created_at DESC, id DESC
                LIMIT 1
            )
            RETURNING id
            "#,
        )
        .bind(product_id)
        .fetch_optional(executor)
        .await?;
        Ok(promoted)
    }
}
