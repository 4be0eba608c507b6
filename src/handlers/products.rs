// src/handlers/products.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

use crate::{
    common::{error::AppError, pagination::{Paginated, PaginationParams}},
    config::AppState,
    middleware::rbac::{RequireRole, RoleAdmin},
    models::product::{NewProductImage, ProductImage, ProductWithDetails},
    services::product_service::ProductChanges,
};

// ---
// Validação Customizada
// ---
fn validate_positive(val: &Decimal) -> Result<(), ValidationError> {
    if val.is_sign_negative() || val.is_zero() {
        let mut err = ValidationError::new("range");
        err.message = Some("O preço deve ser maior que 0.".into());
        return Err(err);
    }
    Ok(())
}

// ---
// Query: listagem do catálogo
// ---
#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct ProductListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub include_images: Option<bool>,
}

// ---
// Payload: CreateProduct
// ---
// As imagens chegam como metadados já materializados pelo colaborador
// de upload; os bytes nunca passam por aqui.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductPayload {
    #[validate(length(min = 1, max = 50, message = "O número de lote é obrigatório."))]
    pub batch_number: String,

    #[validate(length(min = 1, max = 100, message = "O nome é obrigatório."))]
    pub name: String,

    #[validate(custom(function = "validate_positive"))]
    pub price: Decimal,

    #[validate(range(min = 0, message = "A quantidade deve ser maior ou igual a 0."))]
    pub available_quantity: i32,

    pub entry_date: NaiveDate,

    pub category_id: Option<i32>,

    #[validate(length(min = 1, message = "É necessária pelo menos uma imagem para o produto."))]
    pub images: Vec<NewProductImage>,
}

// ---
// Payload: UpdateProduct (tudo opcional)
// ---
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductPayload {
    #[validate(length(min = 1, max = 50, message = "O número de lote não pode ser vazio."))]
    pub batch_number: Option<String>,

    #[validate(length(min = 1, max = 100, message = "O nome não pode ser vazio."))]
    pub name: Option<String>,

    #[validate(custom(function = "validate_positive"))]
    pub price: Option<Decimal>,

    #[validate(range(min = 0, message = "A quantidade deve ser maior ou igual a 0."))]
    pub available_quantity: Option<i32>,

    pub entry_date: Option<NaiveDate>,

    pub category_id: Option<i32>,

    // Novas imagens a anexar
    #[serde(default)]
    pub images: Vec<NewProductImage>,

    // IDs de imagens existentes a remover (lista tipada; nada de
    // strings separadas por vírgula chegando até aqui)
    #[serde(default)]
    pub delete_images: Vec<i32>,

    // ID de imagem já existente para virar a principal
    pub main_image_id: Option<i32>,
}

// ---
// Handler: listagem paginada
// ---
#[utoipa::path(
    get,
    path = "/api/products",
    tag = "Products",
    params(ProductListQuery),
    responses(
        (status = 200, description = "Página do catálogo", body = Paginated<ProductWithDetails>)
    )
)]
pub async fn get_all_products(
    State(app_state): State<AppState>,
    Query(query): Query<ProductListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let pagination = PaginationParams { page: query.page, limit: query.limit };
    let include_images = query.include_images.unwrap_or(false);

    let page = app_state
        .product_service
        .get_products(pagination.page(), pagination.limit(), include_images)
        .await?;

    Ok((StatusCode::OK, Json(page)))
}

#[utoipa::path(
    get,
    path = "/api/products/{id}",
    tag = "Products",
    params(("id" = i32, Path, description = "ID do produto")),
    responses(
        (status = 200, description = "Produto com categoria e imagens", body = ProductWithDetails),
        (status = 404, description = "Produto não encontrado")
    )
)]
pub async fn get_product_by_id(
    State(app_state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let product = app_state.product_service.get_product(id).await?;
    Ok((StatusCode::OK, Json(product)))
}

#[utoipa::path(
    post,
    path = "/api/products",
    tag = "Products",
    request_body = CreateProductPayload,
    responses(
        (status = 201, description = "Produto criado com imagens", body = ProductWithDetails),
        (status = 400, description = "Categoria inexistente/inativa ou payload inválido"),
        (status = 409, description = "Número de lote já em uso")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_product(
    State(app_state): State<AppState>,
    _guard: RequireRole<RoleAdmin>,
    Json(payload): Json<CreateProductPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let product = app_state
        .product_service
        .create_product_with_images(
            &payload.batch_number,
            &payload.name,
            payload.price,
            payload.available_quantity,
            payload.entry_date,
            payload.category_id,
            payload.images,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(product)))
}

#[utoipa::path(
    put,
    path = "/api/products/{id}",
    tag = "Products",
    params(("id" = i32, Path, description = "ID do produto")),
    request_body = UpdateProductPayload,
    responses(
        (status = 200, description = "Produto atualizado", body = ProductWithDetails),
        (status = 404, description = "Produto ou imagem não encontrados")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_product(
    State(app_state): State<AppState>,
    _guard: RequireRole<RoleAdmin>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateProductPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let changes = ProductChanges {
        batch_number: payload.batch_number,
        name: payload.name,
        price: payload.price,
        available_quantity: payload.available_quantity,
        entry_date: payload.entry_date,
        category_id: payload.category_id,
    };

    let product = app_state
        .product_service
        .update_product(id, changes, payload.images, payload.delete_images, payload.main_image_id)
        .await?;

    Ok((StatusCode::OK, Json(product)))
}

#[utoipa::path(
    delete,
    path = "/api/products/{id}",
    tag = "Products",
    params(("id" = i32, Path, description = "ID do produto")),
    responses(
        (status = 204, description = "Produto desativado"),
        (status = 404, description = "Produto não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_product(
    State(app_state): State<AppState>,
    _guard: RequireRole<RoleAdmin>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    app_state.product_service.delete_product(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---
// Imagens do produto
// ---

#[utoipa::path(
    get,
    path = "/api/products/{id}/images",
    tag = "Products",
    params(("id" = i32, Path, description = "ID do produto")),
    responses(
        (status = 200, description = "Imagens (principal primeiro, depois as mais novas)", body = [ProductImage]),
        (status = 404, description = "Produto não encontrado")
    )
)]
pub async fn get_product_images(
    State(app_state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let images = app_state.product_service.get_images(id).await?;
    Ok((StatusCode::OK, Json(images)))
}

#[utoipa::path(
    post,
    path = "/api/products/{id}/images",
    tag = "Products",
    params(("id" = i32, Path, description = "ID do produto")),
    request_body = NewProductImage,
    responses(
        (status = 201, description = "Imagem adicionada", body = ProductImage),
        (status = 404, description = "Produto não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn add_product_image(
    State(app_state): State<AppState>,
    _guard: RequireRole<RoleAdmin>,
    Path(id): Path<i32>,
    Json(payload): Json<NewProductImage>,
) -> Result<impl IntoResponse, AppError> {
    let image = app_state.product_service.add_image(id, payload).await?;
    Ok((StatusCode::CREATED, Json(image)))
}

#[utoipa::path(
    put,
    path = "/api/products/{id}/images/{image_id}/main",
    tag = "Products",
    params(
        ("id" = i32, Path, description = "ID do produto"),
        ("image_id" = i32, Path, description = "ID da imagem")
    ),
    responses(
        (status = 200, description = "Conjunto de imagens após a troca", body = [ProductImage]),
        (status = 404, description = "Produto ou imagem não encontrados")
    ),
    security(("api_jwt" = []))
)]
pub async fn set_main_product_image(
    State(app_state): State<AppState>,
    _guard: RequireRole<RoleAdmin>,
    Path((id, image_id)): Path<(i32, i32)>,
) -> Result<impl IntoResponse, AppError> {
    let images = app_state.product_service.set_main_image(id, image_id).await?;
    Ok((StatusCode::OK, Json(images)))
}

#[utoipa::path(
    delete,
    path = "/api/products/{id}/images/{image_id}",
    tag = "Products",
    params(
        ("id" = i32, Path, description = "ID do produto"),
        ("image_id" = i32, Path, description = "ID da imagem")
    ),
    responses(
        (status = 204, description = "Imagem removida (outra promovida a principal, se houver)"),
        (status = 404, description = "Produto ou imagem não encontrados")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_product_image(
    State(app_state): State<AppState>,
    _guard: RequireRole<RoleAdmin>,
    Path((id, image_id)): Path<(i32, i32)>,
) -> Result<impl IntoResponse, AppError> {
    app_state.product_service.delete_image(id, image_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(is_main: bool) -> NewProductImage {
        NewProductImage {
            filename: "abc123.jpg".into(),
            original_name: "produto.jpg".into(),
            mimetype: "image/jpeg".into(),
            size: 1024,
            is_main_image: is_main,
        }
    }

    #[test]
    fn create_payload_requires_at_least_one_image() {
        let payload = CreateProductPayload {
            batch_number: "L001".into(),
            name: "Produto A".into(),
            price: Decimal::new(1999, 2),
            available_quantity: 10,
            entry_date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            category_id: None,
            images: vec![],
        };
        let errors = payload.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("images"));
    }

    #[test]
    fn create_payload_rejects_non_positive_price() {
        let mut payload = CreateProductPayload {
            batch_number: "L001".into(),
            name: "Produto A".into(),
            price: Decimal::ZERO,
            available_quantity: 10,
            entry_date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            category_id: None,
            images: vec![image(true)],
        };
        assert!(payload.validate().is_err());

        payload.price = Decimal::new(-100, 2);
        assert!(payload.validate().is_err());

        payload.price = Decimal::new(1, 2); // 0.01
        assert!(payload.validate().is_ok());
    }
}
