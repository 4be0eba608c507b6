// src/services/product_service.rs

use std::collections::HashMap;
use std::path::PathBuf;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::{
    common::{error::AppError, pagination::Paginated},
    db::{CategoryRepository, ProductImageRepository, ProductRepository},
    models::product::{NewProductImage, Product, ProductImage, ProductWithDetails},
};

// Campos alteráveis de um produto. Tudo opcional: o que não vier
// mantém o valor atual.
#[derive(Debug, Default, Clone)]
pub struct ProductChanges {
    pub batch_number: Option<String>,
    pub name: Option<String>,
    pub price: Option<Decimal>,
    pub available_quantity: Option<i32>,
    pub entry_date: Option<NaiveDate>,
    pub category_id: Option<i32>,
}

#[derive(Clone)]
pub struct ProductService {
    product_repo: ProductRepository,
    image_repo: ProductImageRepository,
    category_repo: CategoryRepository,
    uploads_dir: PathBuf,
    pool: PgPool,
}

impl ProductService {
    pub fn new(
        product_repo: ProductRepository,
        image_repo: ProductImageRepository,
        category_repo: CategoryRepository,
        uploads_dir: PathBuf,
        pool: PgPool,
    ) -> Self {
        Self { product_repo, image_repo, category_repo, uploads_dir, pool }
    }

    // ---
    // Catálogo (leitura)
    // ---

    pub async fn get_products(
        &self,
        page: i64,
        limit: i64,
        include_images: bool,
    ) -> Result<Paginated<ProductWithDetails>, AppError> {
        let offset = (page - 1) * limit;
        let products = self.product_repo.find_page(limit, offset).await?;
        let total = self.product_repo.count_active().await?;

        // Categorias das páginas atuais, em lote
        let category_ids: Vec<i32> = products.iter().filter_map(|p| p.category_id).collect();
        let mut categories: HashMap<i32, _> = HashMap::new();
        if !category_ids.is_empty() {
            for category in self.category_repo.find_by_ids(&category_ids).await? {
                categories.insert(category.id, category);
            }
        }

        // Imagens só quando pedidas (listagens grandes dispensam)
        let mut images_by_product: HashMap<i32, Vec<ProductImage>> = HashMap::new();
        if include_images && !products.is_empty() {
            let product_ids: Vec<i32> = products.iter().map(|p| p.id).collect();
            for image in self.image_repo.find_by_products(&product_ids).await? {
                images_by_product.entry(image.product_id).or_default().push(image);
            }
        }

        let data = products
            .into_iter()
            .map(|product| {
                let category = product.category_id.and_then(|id| categories.get(&id).cloned());
                let images = images_by_product.remove(&product.id).unwrap_or_default();
                ProductWithDetails { product, category, images }
            })
            .collect();

        Ok(Paginated::new(data, total, page, limit))
    }

    pub async fn get_product(&self, id: i32) -> Result<ProductWithDetails, AppError> {
        let product = self
            .product_repo
            .find_by_id(id)
            .await?
            .ok_or(AppError::ProductNotFound)?;
        self.with_details(product).await
    }

    async fn with_details(&self, product: Product) -> Result<ProductWithDetails, AppError> {
        let category = match product.category_id {
            Some(category_id) => self.category_repo.find_by_id(category_id).await?,
            None => None,
        };
        let images = self.image_repo.find_by_product(product.id).await?;
        Ok(ProductWithDetails { product, category, images })
    }

    // Categoria referenciada precisa existir e estar ativa.
    async fn ensure_category_active(&self, category_id: i32) -> Result<(), AppError> {
        let category = self
            .category_repo
            .find_by_id(category_id)
            .await?
            .ok_or(AppError::CategoryInactive)?;
        if !category.active {
            return Err(AppError::CategoryInactive);
        }
        Ok(())
    }

    // ---
    // Catálogo (escrita, admin)
    // ---

    pub async fn create_product_with_images(
        &self,
        batch_number: &str,
        name: &str,
        price: Decimal,
        available_quantity: i32,
        entry_date: NaiveDate,
        category_id: Option<i32>,
        mut images: Vec<NewProductImage>,
    ) -> Result<ProductWithDetails, AppError> {
        if let Some(category_id) = category_id {
            self.ensure_category_active(category_id).await?;
        }

        // Sem imagem marcada como principal, a primeira assume o posto:
        // produto com imagens sempre tem exatamente uma principal.
        if !images.iter().any(|i| i.is_main_image) {
            if let Some(first) = images.first_mut() {
                first.is_main_image = true;
            }
        }

        let mut tx = self.pool.begin().await?;

        let product = self
            .product_repo
            .create(
                &mut *tx,
                batch_number,
                name,
                price,
                available_quantity,
                entry_date,
                category_id,
            )
            .await?;

        for image in &images {
            if image.is_main_image {
                self.image_repo.clear_main(&mut *tx, product.id).await?;
            }
            self.image_repo.insert(&mut *tx, product.id, image).await?;
        }

        tx.commit().await?;

        tracing::info!(
            "Produto criado: {} ({}) com {} imagens",
            product.name,
            product.batch_number,
            images.len()
        );

        self.get_product(product.id).await
    }

    pub async fn update_product(
        &self,
        id: i32,
        changes: ProductChanges,
        new_images: Vec<NewProductImage>,
        images_to_delete: Vec<i32>,
        main_image_id: Option<i32>,
    ) -> Result<ProductWithDetails, AppError> {
        if let Some(category_id) = changes.category_id {
            self.ensure_category_active(category_id).await?;
        }

        let mut tx = self.pool.begin().await?;

        let product = self
            .product_repo
            .update(
                &mut *tx,
                id,
                changes.batch_number.as_deref(),
                changes.name.as_deref(),
                changes.price,
                changes.available_quantity,
                changes.entry_date,
                changes.category_id,
            )
            .await?
            .ok_or(AppError::ProductNotFound)?;

        // Novas imagens
        for image in &new_images {
            if image.is_main_image {
                self.image_repo.clear_main(&mut *tx, product.id).await?;
            }
            self.image_repo.insert(&mut *tx, product.id, image).await?;
        }

        // Remoções. Os arquivos só são apagados depois do commit: o
        // registro no banco é a autoridade, o arquivo é consequência.
        let mut removed_files: Vec<String> = Vec::new();
        for image_id in images_to_delete {
            let image = self
                .image_repo
                .find_scoped(&mut *tx, image_id, product.id)
                .await?
                .ok_or(AppError::ImageNotFound)?;

            self.image_repo.delete(&mut *tx, image.id).await?;
            if image.is_main_image {
                self.image_repo.promote_latest(&mut *tx, product.id).await?;
            }
            removed_files.push(image.filename);
        }

        // Troca de imagem principal por id já existente
        if let Some(main_image_id) = main_image_id {
            self.image_repo.clear_main(&mut *tx, product.id).await?;
            let changed = self
                .image_repo
                .set_main(&mut *tx, main_image_id, product.id)
                .await?;
            if changed == 0 {
                return Err(AppError::ImageNotFound);
            }
        }

        // Depois de adicionar/remover, um conjunto não-vazio não pode
        // ficar sem imagem principal.
        if !self.image_repo.has_main(&mut *tx, product.id).await? {
            self.image_repo.promote_latest(&mut *tx, product.id).await?;
        }

        tx.commit().await?;

        for filename in &removed_files {
            self.remove_stored_file(filename).await;
        }

        tracing::info!("Produto atualizado: {} (ID: {})", product.name, id);

        self.get_product(id).await
    }

    pub async fn delete_product(&self, id: i32) -> Result<(), AppError> {
        let product = self
            .product_repo
            .soft_delete(&self.pool, id)
            .await?
            .ok_or(AppError::ProductNotFound)?;
        tracing::info!("Produto desativado: {}", product.name);
        Ok(())
    }

    // ---
    // Conjunto de imagens
    // ---
    // Invariante mantido por estas operações: por produto, no máximo uma
    // imagem principal, e exatamente uma quando houver qualquer imagem.

    pub async fn add_image(
        &self,
        product_id: i32,
        image: NewProductImage,
    ) -> Result<ProductImage, AppError> {
        let product = self
            .product_repo
            .find_by_id(product_id)
            .await?
            .ok_or(AppError::ProductNotFound)?;

        let mut tx = self.pool.begin().await?;

        let created = if image.is_main_image {
            // Nova principal: despromove as demais antes de inserir.
            self.image_repo.clear_main(&mut *tx, product_id).await?;
            self.image_repo.insert(&mut *tx, product_id, &image).await?
        } else {
            let created = self.image_repo.insert(&mut *tx, product_id, &image).await?;
            // Primeira imagem do produto entra como principal mesmo sem
            // o flag, para o conjunto nunca ficar sem principal.
            if !self.image_repo.has_main(&mut *tx, product_id).await? {
                self.image_repo.promote_latest(&mut *tx, product_id).await?;
            }
            created
        };

        tx.commit().await?;

        tracing::info!("Imagem adicionada ao produto {}: {}", product.name, created.filename);
        Ok(created)
    }

    pub async fn set_main_image(
        &self,
        product_id: i32,
        image_id: i32,
    ) -> Result<Vec<ProductImage>, AppError> {
        let product = self
            .product_repo
            .find_by_id(product_id)
            .await?
            .ok_or(AppError::ProductNotFound)?;

        let mut tx = self.pool.begin().await?;

        self.image_repo.clear_main(&mut *tx, product_id).await?;
        let changed = self.image_repo.set_main(&mut *tx, image_id, product_id).await?;
        if changed == 0 {
            // Id estranho ao produto: aborta e o rollback restaura o
            // flag que acabou de ser limpo.
            return Err(AppError::ImageNotFound);
        }

        tx.commit().await?;

        tracing::info!("Imagem principal atualizada para o produto {}", product.name);
        self.image_repo.find_by_product(product_id).await
    }

    pub async fn delete_image(&self, product_id: i32, image_id: i32) -> Result<(), AppError> {
        let product = self
            .product_repo
            .find_by_id(product_id)
            .await?
            .ok_or(AppError::ProductNotFound)?;

        let mut tx = self.pool.begin().await?;

        let image = self
            .image_repo
            .find_scoped(&mut *tx, image_id, product_id)
            .await?
            .ok_or(AppError::ImageNotFound)?;

        self.image_repo.delete(&mut *tx, image.id).await?;

        // Se a removida era a principal, promove a remanescente mais
        // recente. Sem remanescentes, o conjunto fica (corretamente) vazio.
        if image.is_main_image {
            self.image_repo.promote_latest(&mut *tx, product_id).await?;
        }

        tx.commit().await?;

        self.remove_stored_file(&image.filename).await;

        tracing::info!("Imagem removida do produto {}", product.name);
        Ok(())
    }

    pub async fn get_images(&self, product_id: i32) -> Result<Vec<ProductImage>, AppError> {
        self.product_repo
            .find_by_id(product_id)
            .await?
            .ok_or(AppError::ProductNotFound)?;
        self.image_repo.find_by_product(product_id).await
    }

    // Remoção do arquivo físico: melhor esforço. Falha vira log, nunca
    // erro. O registro já saiu do banco.
    async fn remove_stored_file(&self, filename: &str) {
        let path = self.uploads_dir.join(filename);
        if let Err(e) = tokio::fs::remove_file(&path).await {
            tracing::warn!("Falha ao remover arquivo {}: {}", path.display(), e);
        }
    }
}
