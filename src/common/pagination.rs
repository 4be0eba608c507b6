// src/common/pagination.rs

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

const DEFAULT_PAGE: i64 = 1;
const DEFAULT_LIMIT: i64 = 20;

// Parâmetros de paginação vindos da query string (?page=1&limit=20)
#[derive(Debug, Clone, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct PaginationParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl PaginationParams {
    // Normaliza os valores: página mínima 1, limite mínimo 1.
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(DEFAULT_PAGE).max(1)
    }

    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LIMIT).max(1)
    }

    pub fn offset(&self) -> i64 {
        (self.page() - 1) * self.limit()
    }
}

// Metadados que acompanham toda listagem paginada
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub total_pages: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub meta: PageMeta,
}

impl<T> Paginated<T> {
    pub fn new(data: Vec<T>, total: i64, page: i64, limit: i64) -> Self {
        Self {
            data,
            meta: PageMeta {
                total,
                page,
                limit,
                total_pages: total_pages(total, limit),
            },
        }
    }
}

// totalPages = ceil(total / limit), ou 0 quando não há resultados.
pub fn total_pages(total: i64, limit: i64) -> i64 {
    if total == 0 {
        return 0;
    }
    (total + limit - 1) / limit
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_pages_is_zero_for_empty_listing() {
        assert_eq!(total_pages(0, 20), 0);
    }

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(total_pages(1, 20), 1);
        assert_eq!(total_pages(20, 20), 1);
        assert_eq!(total_pages(21, 20), 2);
        assert_eq!(total_pages(41, 20), 3);
    }

    #[test]
    fn params_normalize_page_and_limit() {
        let params = PaginationParams { page: Some(0), limit: Some(-5) };
        assert_eq!(params.page(), 1);
        assert_eq!(params.limit(), 1);
        assert_eq!(params.offset(), 0);

        let params = PaginationParams { page: None, limit: None };
        assert_eq!(params.page(), 1);
        assert_eq!(params.limit(), 20);

        let params = PaginationParams { page: Some(3), limit: Some(10) };
        assert_eq!(params.offset(), 20);
    }
}
