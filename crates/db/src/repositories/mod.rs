use async_trait::async_trait;
use thiserror::Error;

use stockroom_core::domain::product::{Product, ProductChanges, ProductDraft, ProductId};

pub mod memory;
pub mod product;

pub use memory::InMemoryProductRepository;
pub use product::SqlProductRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

/// Persistence boundary for products.
///
/// Implementations assign ids on `create`; lookups by id report absence as
/// `Ok(None)` rather than an error.
#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn list(&self) -> Result<Vec<Product>, RepositoryError>;

    async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError>;

    async fn create(&self, draft: ProductDraft) -> Result<Product, RepositoryError>;

    async fn replace(
        &self,
        id: ProductId,
        draft: ProductDraft,
    ) -> Result<Option<Product>, RepositoryError>;

    async fn merge(
        &self,
        id: ProductId,
        changes: ProductChanges,
    ) -> Result<Option<Product>, RepositoryError>;

    async fn delete(&self, id: ProductId) -> Result<Option<Product>, RepositoryError>;

    /// Products with `price` strictly greater than `threshold`, ordered by id.
    async fn find_by_price_greater_than(
        &self,
        threshold: f64,
    ) -> Result<Vec<Product>, RepositoryError>;

    async fn count(&self) -> Result<i64, RepositoryError>;
}
