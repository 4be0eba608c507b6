// src/docs.rs

use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::OpenApi;

use crate::common;
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::get_profile,

        // --- Categories ---
        handlers::categories::get_all_categories,
        handlers::categories::get_category_by_id,
        handlers::categories::create_category,
        handlers::categories::update_category,
        handlers::categories::delete_category,

        // --- Products ---
        handlers::products::get_all_products,
        handlers::products::get_product_by_id,
        handlers::products::create_product,
        handlers::products::update_product,
        handlers::products::delete_product,
        handlers::products::get_product_images,
        handlers::products::add_product_image,
        handlers::products::set_main_product_image,
        handlers::products::delete_product_image,

        // --- Purchases ---
        handlers::purchases::create_purchase,
        handlers::purchases::get_my_purchases,
        handlers::purchases::get_purchase_by_id,
        handlers::purchases::get_all_purchases,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::UserRole,
            models::auth::User,
            models::auth::RegisterUserPayload,
            models::auth::LoginUserPayload,
            models::auth::AuthResponse,

            // --- Catálogo ---
            models::category::Category,
            models::product::Product,
            models::product::ProductImage,
            models::product::NewProductImage,
            models::product::ProductWithDetails,

            // --- Compras ---
            models::purchase::PurchaseStatus,
            models::purchase::Purchase,
            models::purchase::PurchaseDetail,
            models::purchase::PurchaseItemInput,
            models::purchase::PurchaseDetailWithProduct,
            models::purchase::PurchaseWithDetails,
            models::purchase::BuyerSummary,
            models::purchase::AdminPurchaseView,

            // --- Paginação ---
            common::pagination::PageMeta,

            // --- Payloads ---
            handlers::categories::CreateCategoryPayload,
            handlers::categories::UpdateCategoryPayload,
            handlers::products::CreateProductPayload,
            handlers::products::UpdateProductPayload,
            handlers::purchases::CreatePurchasePayload,
        )
    ),
    tags(
        (name = "Auth", description = "Autenticação e Registro"),
        (name = "Categories", description = "Categorias do Catálogo"),
        (name = "Products", description = "Produtos, Estoque e Imagens"),
        (name = "Purchases", description = "Compras e Histórico")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }
}
