//! Menu catalog: categories and products.
//!
//! Reads are cached with `moka` for one minute. Any write clears the whole
//! cache, so a change is visible on the next read.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use sqlx::PgPool;
use thiserror::Error;
use tracing::debug;

use fastlanche_core::{CategoryId, ProductId};

use crate::db::RepositoryError;
use crate::db::categories::CategoryRepository;
use crate::db::products::{ProductListing, ProductRepository};
use crate::models::{Category, CategoryUpdate, NewCategory, NewProduct, Product, ProductUpdate};
use crate::validation::ValidationErrors;

const CACHE_TTL: Duration = Duration::from_secs(60);
const CACHE_CAPACITY: u64 = 1000;

/// Errors from catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("invalid input: {0}")]
    Validation(ValidationErrors),

    #[error("category {0} not found")]
    CategoryNotFound(CategoryId),

    #[error("product {0} not found")]
    ProductNotFound(ProductId),

    /// A write would break a reference, such as deleting a category that
    /// still has products.
    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Repository(RepositoryError),
}

impl From<RepositoryError> for CatalogError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Conflict(msg) => Self::Conflict(msg),
            other => Self::Repository(other),
        }
    }
}

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
enum CacheKey {
    Categories,
    Category(CategoryId),
    Products(ProductListing),
    Product(ProductId),
}

#[derive(Debug, Clone)]
enum CacheValue {
    Categories(Vec<Category>),
    Category(Box<Category>),
    Products(Vec<Product>),
    Product(Box<Product>),
}

/// Catalog service with a read-through cache.
///
/// Cheaply cloneable; clones share the cache.
#[derive(Clone)]
pub struct CatalogService {
    inner: Arc<CatalogServiceInner>,
}

struct CatalogServiceInner {
    pool: PgPool,
    cache: Cache<CacheKey, CacheValue>,
}

impl CatalogService {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        let cache = Cache::builder()
            .max_capacity(CACHE_CAPACITY)
            .time_to_live(CACHE_TTL)
            .build();

        Self {
            inner: Arc::new(CatalogServiceInner { pool, cache }),
        }
    }

    fn categories(&self) -> CategoryRepository<'_> {
        CategoryRepository::new(&self.inner.pool)
    }

    fn products(&self) -> ProductRepository<'_> {
        ProductRepository::new(&self.inner.pool)
    }

    // =========================================================================
    // Categories
    // =========================================================================

    /// All categories, by name.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Repository` if the database operation fails.
    pub async fn list_categories(&self) -> Result<Vec<Category>, CatalogError> {
        if let Some(CacheValue::Categories(categories)) =
            self.inner.cache.get(&CacheKey::Categories).await
        {
            debug!("Cache hit for categories");
            return Ok(categories);
        }

        let categories = self.categories().list().await?;
        self.inner
            .cache
            .insert(CacheKey::Categories, CacheValue::Categories(categories.clone()))
            .await;
        Ok(categories)
    }

    /// # Errors
    ///
    /// Returns `CatalogError::CategoryNotFound` if the category doesn't exist.
    pub async fn get_category(&self, id: CategoryId) -> Result<Category, CatalogError> {
        let key = CacheKey::Category(id);
        if let Some(CacheValue::Category(category)) = self.inner.cache.get(&key).await {
            debug!(category_id = %id, "Cache hit for category");
            return Ok(*category);
        }

        let category = self
            .categories()
            .get(id)
            .await?
            .ok_or(CatalogError::CategoryNotFound(id))?;
        self.inner
            .cache
            .insert(key, CacheValue::Category(Box::new(category.clone())))
            .await;
        Ok(category)
    }

    /// # Errors
    ///
    /// Returns `CatalogError::Validation` if the name is blank.
    pub async fn create_category(&self, new: &NewCategory) -> Result<Category, CatalogError> {
        new.validate().map_err(CatalogError::Validation)?;
        let category = self.categories().create(new).await?;
        self.invalidate().await;
        tracing::info!(category_id = %category.id, name = %category.name, "Category created");
        Ok(category)
    }

    /// # Errors
    ///
    /// Returns `CatalogError::Validation` if a provided name is blank.
    /// Returns `CatalogError::CategoryNotFound` if the category doesn't exist.
    pub async fn update_category(
        &self,
        id: CategoryId,
        update: &CategoryUpdate,
    ) -> Result<Category, CatalogError> {
        update.validate().map_err(CatalogError::Validation)?;
        let category = self
            .categories()
            .update(id, update)
            .await
            .map_err(|e| not_found_as(e, CatalogError::CategoryNotFound(id)))?;
        self.invalidate().await;
        tracing::info!(category_id = %id, "Category updated");
        Ok(category)
    }

    /// # Errors
    ///
    /// Returns `CatalogError::CategoryNotFound` if the category doesn't exist.
    /// Returns `CatalogError::Conflict` if products still belong to it.
    pub async fn delete_category(&self, id: CategoryId) -> Result<(), CatalogError> {
        self.categories()
            .delete(id)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => CatalogError::CategoryNotFound(id),
                RepositoryError::Conflict(_) => {
                    CatalogError::Conflict("category still has products".to_string())
                }
                other => CatalogError::Repository(other),
            })?;
        self.invalidate().await;
        tracing::info!(category_id = %id, "Category deleted");
        Ok(())
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// Products for a listing, by name.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Repository` if the database operation fails.
    pub async fn list_products(
        &self,
        listing: ProductListing,
    ) -> Result<Vec<Product>, CatalogError> {
        let key = CacheKey::Products(listing);
        if let Some(CacheValue::Products(products)) = self.inner.cache.get(&key).await {
            debug!(?listing, "Cache hit for products");
            return Ok(products);
        }

        let products = self.products().list(listing).await?;
        self.inner
            .cache
            .insert(key, CacheValue::Products(products.clone()))
            .await;
        Ok(products)
    }

    /// # Errors
    ///
    /// Returns `CatalogError::ProductNotFound` if the product doesn't exist.
    pub async fn get_product(&self, id: ProductId) -> Result<Product, CatalogError> {
        let key = CacheKey::Product(id);
        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&key).await {
            debug!(product_id = %id, "Cache hit for product");
            return Ok(*product);
        }

        let product = self
            .products()
            .get(id)
            .await?
            .ok_or(CatalogError::ProductNotFound(id))?;
        self.inner
            .cache
            .insert(key, CacheValue::Product(Box::new(product.clone())))
            .await;
        Ok(product)
    }

    /// # Errors
    ///
    /// Returns `CatalogError::Validation` if the input is invalid.
    /// Returns `CatalogError::Conflict` if the category doesn't exist.
    pub async fn create_product(&self, new: &NewProduct) -> Result<Product, CatalogError> {
        new.validate().map_err(CatalogError::Validation)?;
        let product = self.products().create(new).await?;
        self.invalidate().await;
        tracing::info!(product_id = %product.id, name = %product.name, "Product created");
        Ok(product)
    }

    /// # Errors
    ///
    /// Returns `CatalogError::Validation` if the input is invalid.
    /// Returns `CatalogError::ProductNotFound` if the product doesn't exist.
    /// Returns `CatalogError::Conflict` if the new category doesn't exist.
    pub async fn update_product(
        &self,
        id: ProductId,
        update: &ProductUpdate,
    ) -> Result<Product, CatalogError> {
        update.validate().map_err(CatalogError::Validation)?;
        let product = self
            .products()
            .update(id, update)
            .await
            .map_err(|e| not_found_as(e, CatalogError::ProductNotFound(id)))?;
        self.invalidate().await;
        tracing::info!(product_id = %id, "Product updated");
        Ok(product)
    }

    /// # Errors
    ///
    /// Returns `CatalogError::ProductNotFound` if the product doesn't exist.
    /// Returns `CatalogError::Conflict` if orders reference it.
    pub async fn delete_product(&self, id: ProductId) -> Result<(), CatalogError> {
        self.products()
            .delete(id)
            .await
            .map_err(|e| not_found_as(e, CatalogError::ProductNotFound(id)))?;
        self.invalidate().await;
        tracing::info!(product_id = %id, "Product deleted");
        Ok(())
    }

    /// Drop every cached entry.
    pub async fn invalidate(&self) {
        self.inner.cache.invalidate_all();
        self.inner.cache.run_pending_tasks().await;
    }
}

fn not_found_as(err: RepositoryError, not_found: CatalogError) -> CatalogError {
    match err {
        RepositoryError::NotFound => not_found,
        other => other.into(),
    }
}
