// src/config.rs

use crate::{
    db::{
        CategoryRepository, ProductImageRepository, ProductRepository, PurchaseRepository,
        UserRepository,
    },
    services::{
        auth::AuthService, category_service::CategoryService, product_service::ProductService,
        purchase_service::PurchaseService,
    },
};
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::{env, path::PathBuf, time::Duration};

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    // Os serviços ficam no estado, montados uma vez na subida
    pub auth_service: AuthService,
    pub category_service: CategoryService,
    pub product_service: ProductService,
    pub purchase_service: PurchaseService,
}

impl AppState {
    pub async fn new() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL deve ser definida");
        let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET deve ser definido");

        // Diretório onde o colaborador de upload grava os arquivos.
        // O backend só precisa dele para apagar imagens removidas.
        let uploads_dir = PathBuf::from(env::var("UPLOADS_DIR").unwrap_or_else(|_| "uploads".into()));

        // Conecta ao banco de dados, usando '?' para propagar erros
        let db_pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&database_url)
            .await?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        // --- Monta o gráfico de dependências ---
        let user_repo = UserRepository::new(db_pool.clone());
        let category_repo = CategoryRepository::new(db_pool.clone());
        let product_repo = ProductRepository::new(db_pool.clone());
        let image_repo = ProductImageRepository::new(db_pool.clone());
        let purchase_repo = PurchaseRepository::new(db_pool.clone());

        let auth_service = AuthService::new(user_repo, jwt_secret);
        let category_service = CategoryService::new(category_repo.clone());
        let product_service = ProductService::new(
            product_repo.clone(),
            image_repo,
            category_repo,
            uploads_dir,
            db_pool.clone(),
        );
        let purchase_service = PurchaseService::new(purchase_repo, product_repo, db_pool.clone());

        Ok(Self {
            db_pool,
            auth_service,
            category_service,
            product_service,
            purchase_service,
        })
    }
}
