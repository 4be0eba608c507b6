// src/models/purchase.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::models::product::Product;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "purchase_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PurchaseStatus {
    Pending,
    Completed,
    Cancelled,
}

// Cabeçalho da compra. Criado uma única vez pelo orquestrador,
// junto com todos os itens, na mesma transação.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Purchase {
    pub id: i32,
    pub user_id: i32,
    pub total_amount: Decimal,
    pub purchase_date: DateTime<Utc>,
    pub status: PurchaseStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Item da compra. 'unit_price' é uma fotografia do preço do produto no
// momento da compra; mudanças de preço posteriores não o afetam.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseDetail {
    pub id: i32,
    pub purchase_id: i32,
    pub product_id: i32,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Item pedido pelo comprador: (produto, quantidade). Chega ao
// orquestrador já validado e tipado.
#[derive(Debug, Clone, Serialize, Deserialize, validator::Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseItemInput {
    pub product_id: i32,

    #[validate(range(min = 1, message = "A quantidade deve ser maior que 0."))]
    pub quantity: i32,
}

// Rascunho de item montado pelo orquestrador antes do INSERT.
#[derive(Debug, Clone)]
pub struct PurchaseDetailDraft {
    pub product_id: i32,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
}

impl PurchaseDetailDraft {
    // Fotografa o preço do produto e calcula o subtotal em Decimal
    // (sem passar por ponto flutuante).
    pub fn snapshot(product: &Product, quantity: i32) -> Self {
        let subtotal = product.price * Decimal::from(quantity);
        Self {
            product_id: product.id,
            quantity,
            unit_price: product.price,
            subtotal,
        }
    }
}

// --- Respostas com relações ---

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseDetailWithProduct {
    #[serde(flatten)]
    pub detail: PurchaseDetail,
    pub product: Option<Product>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseWithDetails {
    #[serde(flatten)]
    pub purchase: Purchase,
    pub details: Vec<PurchaseDetailWithProduct>,
}

// Identidade pública do comprador na listagem administrativa.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BuyerSummary {
    pub id: i32,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminPurchaseView {
    #[serde(flatten)]
    pub purchase: Purchase,
    pub user: Option<BuyerSummary>,
    pub details: Vec<PurchaseDetailWithProduct>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn product(price: Decimal) -> Product {
        Product {
            id: 10,
            batch_number: "L010".into(),
            name: "Produto B".into(),
            price,
            available_quantity: 100,
            entry_date: NaiveDate::from_ymd_opt(2026, 2, 1).unwrap(),
            category_id: None,
            active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn snapshot_freezes_unit_price_and_computes_subtotal() {
        let p = product(Decimal::new(1999, 2)); // 19.99
        let draft = PurchaseDetailDraft::snapshot(&p, 3);

        assert_eq!(draft.product_id, 10);
        assert_eq!(draft.quantity, 3);
        assert_eq!(draft.unit_price, Decimal::new(1999, 2));
        // 19.99 * 3 = 59.97, exato, sem deriva de arredondamento
        assert_eq!(draft.subtotal, Decimal::new(5997, 2));
    }

    #[test]
    fn subtotals_accumulate_exactly() {
        let a = PurchaseDetailDraft::snapshot(&product(Decimal::new(1050, 2)), 2); // 21.00
        let b = PurchaseDetailDraft::snapshot(&product(Decimal::new(333, 2)), 3); // 9.99

        let total: Decimal = [&a, &b].iter().map(|d| d.subtotal).sum();
        assert_eq!(total, Decimal::new(3099, 2)); // 30.99
    }
}
