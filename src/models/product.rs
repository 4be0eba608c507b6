// src/models/product.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::models::category::Category;

// --- 1. Produto (catálogo + saldo de estoque) ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: i32,
    pub batch_number: String,
    pub name: String,
    pub price: Decimal,

    // Saldo físico disponível. Nunca fica negativo: a baixa de estoque
    // só acontece dentro da transação de compra, depois da checagem.
    pub available_quantity: i32,

    pub entry_date: NaiveDate,
    pub category_id: Option<i32>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    // Checagem de saldo usada pelo orquestrador de compras.
    pub fn has_stock(&self, quantity: i32) -> bool {
        self.available_quantity >= quantity
    }
}

// --- 2. Imagem de produto ---
// Por produto: no máximo uma imagem com is_main_image = true, e
// exatamente uma quando existir qualquer imagem.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductImage {
    pub id: i32,
    pub product_id: i32,
    pub filename: String,
    pub original_name: String,
    pub mimetype: String,
    pub size: i32,
    pub is_main_image: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Metadados de upload já materializados pelo colaborador externo.
// O core nunca vê os bytes do arquivo, só esta descrição.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewProductImage {
    pub filename: String,
    pub original_name: String,
    pub mimetype: String,
    pub size: i32,
    #[serde(default)]
    pub is_main_image: bool,
}

// --- 3. Produto com relações (resposta de detalhe) ---
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductWithDetails {
    #[serde(flatten)]
    pub product: Product,
    pub category: Option<Category>,
    pub images: Vec<ProductImage>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product_with_quantity(quantity: i32) -> Product {
        Product {
            id: 1,
            batch_number: "L001".into(),
            name: "Produto A".into(),
            price: Decimal::new(1999, 2), // 19.99
            available_quantity: quantity,
            entry_date: NaiveDate::from_ymd_opt(2026, 1, 15).unwrap(),
            category_id: None,
            active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn has_stock_compares_against_available_quantity() {
        let product = product_with_quantity(5);
        assert!(product.has_stock(3));
        assert!(product.has_stock(5));
        assert!(!product.has_stock(6));
    }

    #[test]
    fn has_stock_on_empty_inventory() {
        let product = product_with_quantity(0);
        assert!(product.has_stock(0));
        assert!(!product.has_stock(1));
    }
}
