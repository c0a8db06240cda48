use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use tracing::debug;

use stockroom_core::domain::product::{Product, ProductChanges, ProductDraft, ProductId};

use super::{ProductRepository, RepositoryError};
use crate::DbPool;

const PRODUCT_COLUMNS: &str = "id, name, price";

pub struct SqlProductRepository {
    pool: DbPool,
}

impl SqlProductRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn product_from_row(row: &SqliteRow) -> Result<Product, RepositoryError> {
    let id: i64 = row.try_get("id")?;
    let name: String = row.try_get("name")?;
    let price: f64 = row.try_get("price")?;

    if !price.is_finite() {
        return Err(RepositoryError::Decode(format!("product {id} has a non-finite price")));
    }

    Ok(Product { id: ProductId(id), name, price })
}

fn products_from_rows(rows: Vec<SqliteRow>) -> Result<Vec<Product>, RepositoryError> {
    rows.iter().map(product_from_row).collect()
}

#[async_trait::async_trait]
impl ProductRepository for SqlProductRepository {
    async fn list(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query(&format!("SELECT {PRODUCT_COLUMNS} FROM product ORDER BY id"))
            .fetch_all(&self.pool)
            .await?;
        products_from_rows(rows)
    }

    async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {PRODUCT_COLUMNS} FROM product WHERE id = ?1"))
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(product_from_row).transpose()
    }

    async fn create(&self, draft: ProductDraft) -> Result<Product, RepositoryError> {
        let row = sqlx::query(&format!(
            "INSERT INTO product (name, price) VALUES (?1, ?2) RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(&draft.name)
        .bind(draft.price)
        .fetch_one(&self.pool)
        .await?;

        let product = product_from_row(&row)?;
        debug!(product_id = product.id.0, "inserted product row");
        Ok(product)
    }

    async fn replace(
        &self,
        id: ProductId,
        draft: ProductDraft,
    ) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query(&format!(
            "UPDATE product SET name = ?1, price = ?2 WHERE id = ?3 RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(&draft.name)
        .bind(draft.price)
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(product_from_row).transpose()
    }

    async fn merge(
        &self,
        id: ProductId,
        changes: ProductChanges,
    ) -> Result<Option<Product>, RepositoryError> {
        if changes.is_empty() {
            return self.find_by_id(id).await;
        }

        // COALESCE keeps the stored value for every field left out of the change set.
        let row = sqlx::query(&format!(
            "UPDATE product
             SET name = COALESCE(?1, name), price = COALESCE(?2, price)
             WHERE id = ?3
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(changes.name)
        .bind(changes.price)
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(product_from_row).transpose()
    }

    async fn delete(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row =
            sqlx::query(&format!("DELETE FROM product WHERE id = ?1 RETURNING {PRODUCT_COLUMNS}"))
                .bind(id.0)
                .fetch_optional(&self.pool)
                .await?;
        row.as_ref().map(product_from_row).transpose()
    }

    async fn find_by_price_greater_than(
        &self,
        threshold: f64,
    ) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM product WHERE price > ?1 ORDER BY id"
        ))
        .bind(threshold)
        .fetch_all(&self.pool)
        .await?;
        products_from_rows(rows)
    }

    async fn count(&self) -> Result<i64, RepositoryError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(1) FROM product").fetch_one(&self.pool).await?;
        Ok(count)
    }
}
