//src/main.rs

use axum::{
    middleware as axum_middleware,
    routing::{delete, get, post, put},
    Router,
};
use tokio::net::TcpListener;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

// Declaração dos nossos módulos
mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod middleware;
mod models;
mod services;

// Importações principais
use crate::config::AppState;
use crate::docs::ApiDoc;
use crate::middleware::auth::auth_guard;

#[tokio::main]
async fn main() {
    // Inicializa o logger
    tracing_subscriber::fmt().with_target(false).compact().init();

    // .expect() é bom aqui: se a configuração falhar, a aplicação não deve iniciar.
    let app_state = AppState::new()
        .await
        .expect("Falha ao inicializar o estado da aplicação.");

    // Roda as migrações do SQLx na inicialização
    sqlx::migrate!()
        .run(&app_state.db_pool)
        .await
        .expect("Falha ao rodar as migrações do banco de dados.");

    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    // Rotas de autenticação: registro e login públicos, perfil protegido
    let auth_routes = Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login))
        .merge(
            Router::new()
                .route("/profile", get(handlers::auth::get_profile))
                .layer(axum_middleware::from_fn_with_state(
                    app_state.clone(),
                    auth_guard,
                )),
        );

    // Categorias: leitura pública; escrita exige admin (o RequireRole
    // nos handlers valida o token e o papel)
    let category_routes = Router::new()
        .route(
            "/",
            get(handlers::categories::get_all_categories)
                .post(handlers::categories::create_category),
        )
        .route(
            "/{id}",
            get(handlers::categories::get_category_by_id)
                .put(handlers::categories::update_category)
                .delete(handlers::categories::delete_category),
        );

    // Produtos: catálogo público, gestão (inclusive imagens) de admin
    let product_routes = Router::new()
        .route(
            "/",
            get(handlers::products::get_all_products).post(handlers::products::create_product),
        )
        .route(
            "/{id}",
            get(handlers::products::get_product_by_id)
                .put(handlers::products::update_product)
                .delete(handlers::products::delete_product),
        )
        .route(
            "/{id}/images",
            get(handlers::products::get_product_images)
                .post(handlers::products::add_product_image),
        )
        .route(
            "/{id}/images/{image_id}/main",
            put(handlers::products::set_main_product_image),
        )
        .route(
            "/{id}/images/{image_id}",
            delete(handlers::products::delete_product_image),
        );

    // Compras: tudo autenticado; cliente compra e consulta as suas,
    // admin lista todas
    let purchase_routes = Router::new()
        .route(
            "/",
            post(handlers::purchases::create_purchase)
                .get(handlers::purchases::get_all_purchases),
        )
        .route("/my-purchases", get(handlers::purchases::get_my_purchases))
        .route("/{id}", get(handlers::purchases::get_purchase_by_id))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    // Combina tudo no router principal
    let app = Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api/auth", auth_routes)
        .nest("/api/categories", category_routes)
        .nest("/api/products", product_routes)
        .nest("/api/purchases", purchase_routes)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(app_state);

    // Inicia o servidor
    let addr = "0.0.0.0:3000";
    let listener = TcpListener::bind(addr)
        .await
        .expect("Falha ao iniciar o listener TCP");
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr().unwrap());
    axum::serve(listener, app)
        .await
        .expect("Erro no servidor Axum");
}
