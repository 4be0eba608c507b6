// src/services/purchase_service.rs

use std::collections::HashMap;

use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::{
    common::error::AppError,
    db::{ProductRepository, PurchaseRepository},
    models::{
        product::Product,
        purchase::{
            AdminPurchaseView, Purchase, PurchaseDetailDraft, PurchaseDetailWithProduct,
            PurchaseItemInput, PurchaseWithDetails,
        },
    },
};

#[derive(Clone)]
pub struct PurchaseService {
    purchase_repo: PurchaseRepository,
    product_repo: ProductRepository,
    pool: PgPool,
}

impl PurchaseService {
    pub fn new(
        purchase_repo: PurchaseRepository,
        product_repo: ProductRepository,
        pool: PgPool,
    ) -> Self {
        Self { purchase_repo, product_repo, pool }
    }

    // --- CRIAÇÃO DE COMPRA (o caminho crítico) ---
    //
    // Tudo dentro de UMA transação: validação, fotografia de preço,
    // baixa de estoque e gravação da compra com seus itens. Qualquer
    // falha no meio desfaz o conjunto inteiro. Nunca sobra baixa de
    // estoque órfã nem compra pela metade.
    pub async fn create_purchase(
        &self,
        user_id: i32,
        items: &[PurchaseItemInput],
    ) -> Result<PurchaseWithDetails, AppError> {
        let mut tx = self.pool.begin().await?;

        let mut total_amount = Decimal::ZERO;
        let mut drafts: Vec<PurchaseDetailDraft> = Vec::with_capacity(items.len());

        for item in items {
            // Trava a linha do produto (FOR UPDATE): compras concorrentes
            // sobre o mesmo produto esperam aqui até o nosso commit.
            let product = self
                .product_repo
                .find_active_for_update(&mut *tx, item.product_id)
                .await?
                .ok_or(AppError::ProductUnavailable(item.product_id))?;

            if !product.has_stock(item.quantity) {
                return Err(AppError::InsufficientStock {
                    name: product.name,
                    available: product.available_quantity,
                });
            }

            let draft = PurchaseDetailDraft::snapshot(&product, item.quantity);
            total_amount += draft.subtotal;
            drafts.push(draft);

            // Baixa guardada: o UPDATE revalida o saldo. Com a linha já
            // travada e checada, zero linhas afetadas só aparece se o
            // mesmo produto se repetiu no pedido e esgotou o saldo.
            let updated = self
                .product_repo
                .reduce_stock(&mut *tx, product.id, item.quantity)
                .await?;
            if updated.is_none() {
                return Err(AppError::InsufficientStock {
                    name: product.name,
                    available: product.available_quantity,
                });
            }
        }

        let purchase = self
            .purchase_repo
            .insert_purchase(&mut *tx, user_id, total_amount)
            .await?;
        self.purchase_repo
            .insert_details(&mut *tx, purchase.id, &drafts)
            .await?;

        tx.commit().await?;

        tracing::info!("🛒 Compra realizada: ID {} - Usuário {}", purchase.id, user_id);

        // Recarrega com itens e produtos aninhados
        self.get_purchase(purchase.id, user_id).await
    }

    // --- LEITURA ---

    pub async fn get_purchase(
        &self,
        id: i32,
        user_id: i32,
    ) -> Result<PurchaseWithDetails, AppError> {
        let purchase = self
            .purchase_repo
            .find_by_id_for_user(id, user_id)
            .await?
            .ok_or(AppError::PurchaseNotFound)?;

        let mut assembled = self.attach_details(vec![purchase]).await?;
        // attach_details preserva a ordem; aqui só existe uma compra.
        assembled
            .pop()
            .ok_or_else(|| anyhow::anyhow!("compra sumiu durante a montagem").into())
    }

    pub async fn get_my_purchases(&self, user_id: i32) -> Result<Vec<PurchaseWithDetails>, AppError> {
        let purchases = self.purchase_repo.find_all_by_user(user_id).await?;
        self.attach_details(purchases).await
    }

    // Listagem administrativa: todas as compras, com a identidade
    // pública de cada comprador.
    pub async fn get_all_purchases(&self) -> Result<Vec<AdminPurchaseView>, AppError> {
        let purchases = self.purchase_repo.find_all().await?;

        let user_ids: Vec<i32> = purchases.iter().map(|p| p.user_id).collect();
        let mut buyers = HashMap::new();
        if !user_ids.is_empty() {
            for buyer in self.purchase_repo.find_buyers(&user_ids).await? {
                buyers.insert(buyer.id, buyer);
            }
        }

        let with_details = self.attach_details(purchases).await?;
        Ok(with_details
            .into_iter()
            .map(|p| {
                let user = buyers.get(&p.purchase.user_id).cloned();
                AdminPurchaseView { purchase: p.purchase, user, details: p.details }
            })
            .collect())
    }

    // Anexa itens (e produtos dos itens) a um lote de compras com três
    // queries no total, preservando a ordem recebida.
    async fn attach_details(
        &self,
        purchases: Vec<Purchase>,
    ) -> Result<Vec<PurchaseWithDetails>, AppError> {
        if purchases.is_empty() {
            return Ok(Vec::new());
        }

        let purchase_ids: Vec<i32> = purchases.iter().map(|p| p.id).collect();
        let details = self
            .purchase_repo
            .find_details_for_purchases(&purchase_ids)
            .await?;

        let mut product_ids: Vec<i32> = details.iter().map(|d| d.product_id).collect();
        product_ids.sort_unstable();
        product_ids.dedup();

        let mut products: HashMap<i32, Product> = HashMap::new();
        if !product_ids.is_empty() {
            for product in self.product_repo.find_by_ids(&product_ids).await? {
                products.insert(product.id, product);
            }
        }

        let mut details_by_purchase: HashMap<i32, Vec<PurchaseDetailWithProduct>> = HashMap::new();
        for detail in details {
            let product = products.get(&detail.product_id).cloned();
            details_by_purchase
                .entry(detail.purchase_id)
                .or_default()
                .push(PurchaseDetailWithProduct { detail, product });
        }

        Ok(purchases
            .into_iter()
            .map(|purchase| {
                let details = details_by_purchase.remove(&purchase.id).unwrap_or_default();
                PurchaseWithDetails { purchase, details }
            })
            .collect())
    }
}
