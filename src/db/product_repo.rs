// src/db/product_repo.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};

use crate::{common::error::AppError, models::product::Product};

#[derive(Clone)]
pub struct ProductRepository {
    pool: PgPool,
}

impl ProductRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---
    // Funções de "Leitura" (Getters)
    // ---

    // Página do catálogo: só produtos ativos, mais recentes primeiro.
    pub async fn find_page(&self, limit: i64, offset: i64) -> Result<Vec<Product>, AppError> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT * FROM products
            WHERE active = TRUE
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(products)
    }

    pub async fn count_active(&self) -> Result<i64, AppError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE active = TRUE")
            .fetch_one(&self.pool)
            .await?;
        Ok(total)
    }

    pub async fn find_by_id(&self, id: i32) -> Result<Option<Product>, AppError> {
        let maybe_product = sqlx::query_as::<_, Product>(
            "SELECT * FROM products WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(maybe_product)
    }

    // Busca em lote, para montar os itens de compra com seus produtos.
    // Sem filtro de 'active': compras antigas continuam mostrando
    // produtos já desativados.
    pub async fn find_by_ids(&self, ids: &[i32]) -> Result<Vec<Product>, AppError> {
        let products = sqlx::query_as::<_, Product>(
            "SELECT * FROM products WHERE id = ANY($1)",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(products)
    }

    // ---
    // Funções de "Escrita" (Transacionais)
    // ---

    /// Carrega um produto ativo travando a linha até o fim da transação
    /// (SELECT ... FOR UPDATE). Duas compras concorrentes sobre o mesmo
    /// produto serializam aqui.
    pub async fn find_active_for_update<'e, E>(
        &self,
        executor: E,
        id: i32,
    ) -> Result<Option<Product>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let maybe_product = sqlx::query_as::<_, Product>(
            "SELECT * FROM products WHERE id = $1 AND active = TRUE FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;
        Ok(maybe_product)
    }

    /// Baixa de estoque guardada: o WHERE revalida o saldo no próprio
    /// UPDATE. Zero linhas afetadas = saldo insuficiente.
    pub async fn reduce_stock<'e, E>(
        &self,
        executor: E,
        id: i32,
        quantity: i32,
    ) -> Result<Option<Product>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let maybe_product = sqlx::query_as::<_, Product>(
            r#"
            UPDATE products SET
                available_quantity = available_quantity - $2,
                updated_at = NOW()
            WHERE id = $1 AND available_quantity >= $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(quantity)
        .fetch_optional(executor)
        .await?;
        Ok(maybe_product)
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        batch_number: &str,
        name: &str,
        price: Decimal,
        available_quantity: i32,
        entry_date: NaiveDate,
        category_id: Option<i32>,
    ) -> Result<Product, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products (batch_number, name, price, available_quantity, entry_date, category_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(batch_number)
        .bind(name)
        .bind(price)
        .bind(available_quantity)
        .bind(entry_date)
        .bind(category_id)
        .fetch_one(executor)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AppError::BatchNumberAlreadyExists(batch_number.to_string());
                }
            }
            e.into()
        })
    }

    // Atualização parcial: campos ausentes mantêm o valor atual.
    pub async fn update<'e, E>(
        &self,
        executor: E,
        id: i32,
        batch_number: Option<&str>,
        name: Option<&str>,
        price: Option<Decimal>,
        available_quantity: Option<i32>,
        entry_date: Option<NaiveDate>,
        category_id: Option<i32>,
    ) -> Result<Option<Product>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Product>(
            r#"
            UPDATE products SET
                batch_number = COALESCE($2, batch_number),
                name = COALESCE($3, name),
                price = COALESCE($4, price),
                available_quantity = COALESCE($5, available_quantity),
                entry_date = COALESCE($6, entry_date),
                category_id = COALESCE($7, category_id),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(batch_number)
        .bind(name)
        .bind(price)
        .bind(available_quantity)
        .bind(entry_date)
        .bind(category_id)
        .fetch_optional(executor)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AppError::BatchNumberAlreadyExists(
                        batch_number.unwrap_or_default().to_string(),
                    );
                }
            }
            e.into()
        })
    }

    // Soft-delete: o produto sai do catálogo mas as compras que o
    // referenciam permanecem íntegras.
    pub async fn soft_delete<'e, E>(
        &self,
        executor: E,
        id: i32,
    ) -> Result<Option<Product>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let maybe_product = sqlx::query_as::<_, Product>(
            r#"
            UPDATE products SET active = FALSE, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;
        Ok(maybe_product)
    }
}
