// src/handlers/purchases.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        rbac::{RequireRole, RoleAdmin, RoleClient},
    },
    models::purchase::{AdminPurchaseView, PurchaseItemInput, PurchaseWithDetails},
};

// ---
// Payload: CreatePurchase
// ---
// Lista tipada e não-vazia de (produto, quantidade). O orquestrador
// recebe exatamente isto, nada mais solto.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePurchasePayload {
    #[validate(length(min = 1, message = "Deve incluir pelo menos um produto."), nested)]
    pub products: Vec<PurchaseItemInput>,
}

#[utoipa::path(
    post,
    path = "/api/purchases",
    tag = "Purchases",
    request_body = CreatePurchasePayload,
    responses(
        (status = 201, description = "Compra realizada", body = PurchaseWithDetails),
        (status = 400, description = "Produto inexistente/inativo ou estoque insuficiente")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_purchase(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    _guard: RequireRole<RoleClient>,
    Json(payload): Json<CreatePurchasePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let purchase = app_state
        .purchase_service
        .create_purchase(user.0.id, &payload.products)
        .await?;

    Ok((StatusCode::CREATED, Json(purchase)))
}

#[utoipa::path(
    get,
    path = "/api/purchases/my-purchases",
    tag = "Purchases",
    responses(
        (status = 200, description = "Histórico de compras do usuário", body = [PurchaseWithDetails])
    ),
    security(("api_jwt" = []))
)]
pub async fn get_my_purchases(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    _guard: RequireRole<RoleClient>,
) -> Result<impl IntoResponse, AppError> {
    let purchases = app_state.purchase_service.get_my_purchases(user.0.id).await?;
    Ok((StatusCode::OK, Json(purchases)))
}

#[utoipa::path(
    get,
    path = "/api/purchases/{id}",
    tag = "Purchases",
    params(("id" = i32, Path, description = "ID da compra")),
    responses(
        (status = 200, description = "Detalhe da compra (apenas do próprio usuário)", body = PurchaseWithDetails),
        (status = 404, description = "Compra não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_purchase_by_id(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let purchase = app_state.purchase_service.get_purchase(id, user.0.id).await?;
    Ok((StatusCode::OK, Json(purchase)))
}

#[utoipa::path(
    get,
    path = "/api/purchases",
    tag = "Purchases",
    responses(
        (status = 200, description = "Todas as compras do sistema", body = [AdminPurchaseView])
    ),
    security(("api_jwt" = []))
)]
pub async fn get_all_purchases(
    State(app_state): State<AppState>,
    _guard: RequireRole<RoleAdmin>,
) -> Result<impl IntoResponse, AppError> {
    let purchases = app_state.purchase_service.get_all_purchases().await?;
    Ok((StatusCode::OK, Json(purchases)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_rejects_empty_product_list() {
        let payload = CreatePurchasePayload { products: vec![] };
        let errors = payload.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("products"));
    }

    #[test]
    fn payload_rejects_zero_quantity() {
        let payload = CreatePurchasePayload {
            products: vec![PurchaseItemInput { product_id: 1, quantity: 0 }],
        };
        assert!(payload.validate().is_err());
    }

    #[test]
    fn payload_accepts_valid_items() {
        let payload = CreatePurchasePayload {
            products: vec![
                PurchaseItemInput { product_id: 1, quantity: 3 },
                PurchaseItemInput { product_id: 2, quantity: 1 },
            ],
        };
        assert!(payload.validate().is_ok());
    }
}
