//! Product repository.

use sqlx::{PgConnection, PgPool};

use fastlanche_core::{CategoryId, ProductId};

use super::RepositoryError;
use crate::models::{NewProduct, Product, ProductUpdate};

/// Which slice of the menu to list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProductListing {
    /// Every product, optionally restricted to one category.
    All(Option<CategoryId>),
    /// Featured and available.
    Featured,
    /// On promotion and available.
    Promotions,
}

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List products by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, listing: ProductListing) -> Result<Vec<Product>, RepositoryError> {
        let query = match listing {
            ProductListing::All(None) => {
                sqlx::query_as::<_, Product>("SELECT * FROM products ORDER BY name")
            }
            ProductListing::All(Some(category_id)) => sqlx::query_as::<_, Product>(
                "SELECT * FROM products WHERE category_id = $1 ORDER BY name",
            )
            .bind(category_id),
            ProductListing::Featured => sqlx::query_as::<_, Product>(
                "SELECT * FROM products WHERE is_featured AND available ORDER BY name",
            ),
            ProductListing::Promotions => sqlx::query_as::<_, Product>(
                "SELECT * FROM products WHERE is_promotion AND available ORDER BY name",
            ),
        };

        Ok(query.fetch_all(self.pool).await?)
    }

    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(product)
    }

    /// Load the given products inside a transaction, share-locked so their
    /// price and availability cannot change before the transaction commits.
    ///
    /// Missing IDs are simply absent from the result.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn lock_for_order(
        conn: &mut PgConnection,
        ids: &[ProductId],
    ) -> Result<Vec<Product>, RepositoryError> {
        let ids: Vec<i32> = ids.iter().map(ProductId::as_i32).collect();
        let products = sqlx::query_as::<_, Product>(
            "SELECT * FROM products WHERE id = ANY($1) FOR SHARE",
        )
        .bind(ids)
        .fetch_all(conn)
        .await?;
        Ok(products)
    }

    /// Load the given products (for order detail).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_many(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError> {
        let ids: Vec<i32> = ids.iter().map(ProductId::as_i32).collect();
        let products = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(self.pool)
            .await?;
        Ok(products)
    }

    /// Count all products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM products")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }

    /// Insert a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the category doesn't exist.
    pub async fn create(&self, new: &NewProduct) -> Result<Product, RepositoryError> {
        sqlx::query_as::<_, Product>(
            r"
            INSERT INTO products
                (name, description, price, image_url, is_featured, is_promotion,
                 old_price, category_id, available)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            ",
        )
        .bind(new.name.trim())
        .bind(&new.description)
        .bind(new.price)
        .bind(&new.image_url)
        .bind(new.is_featured)
        .bind(new.is_promotion)
        .bind(new.old_price)
        .bind(new.category_id)
        .bind(new.available)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_write(e, "product"))
    }

    /// Apply a partial update. Nullable columns are cleared when their
    /// field was sent as `null`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    /// Returns `RepositoryError::Conflict` if the new category doesn't exist.
    pub async fn update(
        &self,
        id: ProductId,
        update: &ProductUpdate,
    ) -> Result<Product, RepositoryError> {
        sqlx::query_as::<_, Product>(
            r"
            UPDATE products SET
                name = COALESCE($2, name),
                description = CASE WHEN $3 THEN $4 ELSE description END,
                price = COALESCE($5, price),
                image_url = CASE WHEN $6 THEN $7 ELSE image_url END,
                is_featured = COALESCE($8, is_featured),
                is_promotion = COALESCE($9, is_promotion),
                old_price = CASE WHEN $10 THEN $11 ELSE old_price END,
                category_id = COALESCE($12, category_id),
                available = COALESCE($13, available),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            ",
        )
        .bind(id)
        .bind(update.name.as_deref().map(str::trim))
        .bind(update.description.is_some())
        .bind(update.description.as_ref().and_then(Option::as_deref))
        .bind(update.price)
        .bind(update.image_url.is_some())
        .bind(update.image_url.as_ref().and_then(Option::as_deref))
        .bind(update.is_featured)
        .bind(update.is_promotion)
        .bind(update.old_price.is_some())
        .bind(update.old_price.flatten())
        .bind(update.category_id)
        .bind(update.available)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| RepositoryError::from_write(e, "product"))?
        .ok_or(RepositoryError::NotFound)
    }

    /// Delete a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    /// Returns `RepositoryError::Conflict` if existing orders reference it.
    pub async fn delete(&self, id: ProductId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| RepositoryError::from_write(e, "product"))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
