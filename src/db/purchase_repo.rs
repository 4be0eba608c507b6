// src/db/purchase_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres, QueryBuilder};

use crate::{
    common::error::AppError,
    models::purchase::{BuyerSummary, Purchase, PurchaseDetail, PurchaseDetailDraft},
};

#[derive(Clone)]
pub struct PurchaseRepository {
    pool: PgPool,
}

impl PurchaseRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---
    // Funções de "Escrita" (Transacionais)
    // ---

    /// Insere o cabeçalho da compra. Sempre chamada dentro da transação
    /// do orquestrador, junto com insert_details.
    pub async fn insert_purchase<'e, E>(
        &self,
        executor: E,
        user_id: i32,
        total_amount: Decimal,
    ) -> Result<Purchase, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let purchase = sqlx::query_as::<_, Purchase>(
            r#"
            INSERT INTO purchases (user_id, total_amount, status)
            VALUES ($1, $2, 'completed')
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(total_amount)
        .fetch_one(executor)
        .await?;
        Ok(purchase)
    }

    /// Insere todos os itens de uma vez (um único INSERT com VALUES em
    /// lote), cada um com o preço unitário fotografado pelo orquestrador.
    pub async fn insert_details<'e, E>(
        &self,
        executor: E,
        purchase_id: i32,
        details: &[PurchaseDetailDraft],
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
            "INSERT INTO purchase_details (purchase_id, product_id, quantity, unit_price, subtotal) ",
        );
        builder.push_values(details, |mut row, detail| {
            row.push_bind(purchase_id)
                .push_bind(detail.product_id)
                .push_bind(detail.quantity)
                .push_bind(detail.unit_price)
                .push_bind(detail.subtotal);
        });
        builder.build().execute(executor).await?;
        Ok(())
    }

    // ---
    // Funções de "Leitura" (Getters)
    // ---

    // Compra escopada ao comprador: cada usuário só enxerga as suas.
    pub async fn find_by_id_for_user(
        &self,
        id: i32,
        user_id: i32,
    ) -> Result<Option<Purchase>, AppError> {
        let maybe_purchase = sqlx::query_as::<_, Purchase>(
            "SELECT * FROM purchases WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(maybe_purchase)
    }

    pub async fn find_all_by_user(&self, user_id: i32) -> Result<Vec<Purchase>, AppError> {
        let purchases = sqlx::query_as::<_, Purchase>(
            "SELECT * FROM purchases WHERE user_id = $1 ORDER BY purchase_date DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(purchases)
    }

    pub async fn find_all(&self) -> Result<Vec<Purchase>, AppError> {
        let purchases = sqlx::query_as::<_, Purchase>(
            "SELECT * FROM purchases ORDER BY purchase_date DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(purchases)
    }

    // Itens de várias compras de uma vez (evita uma query por compra).
    pub async fn find_details_for_purchases(
        &self,
        purchase_ids: &[i32],
    ) -> Result<Vec<PurchaseDetail>, AppError> {
        let details = sqlx::query_as::<_, PurchaseDetail>(
            r#"
            SELECT * FROM purchase_details
            WHERE purchase_id = ANY($1)
            ORDER BY purchase_id, id
            "#,
        )
        .bind(purchase_ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(details)
    }

    // Identidade pública dos compradores, para a listagem administrativa.
    pub async fn find_buyers(&self, user_ids: &[i32]) -> Result<Vec<BuyerSummary>, AppError> {
        let buyers = sqlx::query_as::<_, BuyerSummary>(
            "SELECT id, name, email FROM users WHERE id = ANY($1)",
        )
        .bind(user_ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(buyers)
    }
}
