//! Product catalog service: validation and persistence composed behind one API.
//!
//! The catalog owns not-found semantics. Repositories report absence as
//! `Ok(None)`; the catalog turns that into [`CatalogError::NotFound`].

use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use stockroom_core::domain::product::{Product, ProductId};
use stockroom_core::validation::{ProductSubmission, ProductValidator, ValidationErrors};
use stockroom_db::{ProductRepository, RepositoryError};
use thiserror::Error;
use tracing::{error, info};

pub const PRODUCTS_NOT_FOUND: &str = "Products not found";

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
    #[error("{0}")]
    NotFound(String),
    #[error("invalid {name} `{value}`")]
    InvalidParameter { name: &'static str, value: String },
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl CatalogError {
    pub fn product_not_found(id: impl std::fmt::Display) -> Self {
        Self::NotFound(format!("product `{id}` not found"))
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl IntoResponse for CatalogError {
    fn into_response(self) -> Response {
        match self {
            Self::Validation(errors) => (StatusCode::BAD_REQUEST, Json(errors)).into_response(),
            Self::NotFound(message) => {
                (StatusCode::NOT_FOUND, Json(ErrorBody { error: message })).into_response()
            }
            invalid @ Self::InvalidParameter { .. } => {
                (StatusCode::BAD_REQUEST, Json(ErrorBody { error: invalid.to_string() }))
                    .into_response()
            }
            Self::Repository(source) => {
                error!(
                    event_name = "catalog.repository.error",
                    error = %source,
                    "product repository error"
                );
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorBody { error: "an internal repository error occurred".to_string() }),
                )
                    .into_response()
            }
        }
    }
}

#[derive(Clone)]
pub struct ProductCatalog {
    repository: Arc<dyn ProductRepository>,
    validator: ProductValidator,
}

impl ProductCatalog {
    pub fn new(repository: Arc<dyn ProductRepository>, validator: ProductValidator) -> Self {
        Self { repository, validator }
    }

    pub async fn list(&self) -> Result<Vec<Product>, CatalogError> {
        Ok(self.repository.list().await?)
    }

    pub async fn get(&self, id: ProductId) -> Result<Product, CatalogError> {
        self.repository.find_by_id(id).await?.ok_or_else(|| CatalogError::product_not_found(id))
    }

    pub async fn create(&self, submission: ProductSubmission) -> Result<Product, CatalogError> {
        let draft = self.validator.validate_draft(submission)?;
        let product = self.repository.create(draft).await?;

        info!(
            event_name = "catalog.product.created",
            product_id = product.id.0,
            "product created"
        );
        Ok(product)
    }

    /// Full update. The product must exist before the body is validated.
    pub async fn replace(
        &self,
        id: ProductId,
        submission: ProductSubmission,
    ) -> Result<Product, CatalogError> {
        self.get(id).await?;
        let draft = self.validator.validate_draft(submission)?;
        let product = self
            .repository
            .replace(id, draft)
            .await?
            .ok_or_else(|| CatalogError::product_not_found(id))?;

        info!(event_name = "catalog.product.replaced", product_id = id.0, "product replaced");
        Ok(product)
    }

    /// Partial update: only fields present in the submission are validated and written.
    pub async fn merge(
        &self,
        id: ProductId,
        submission: ProductSubmission,
    ) -> Result<Product, CatalogError> {
        self.get(id).await?;
        let changes = self.validator.validate_changes(submission)?;
        let product = self
            .repository
            .merge(id, changes)
            .await?
            .ok_or_else(|| CatalogError::product_not_found(id))?;

        info!(event_name = "catalog.product.merged", product_id = id.0, "product merged");
        Ok(product)
    }

    pub async fn delete(&self, id: ProductId) -> Result<Product, CatalogError> {
        let product =
            self.repository.delete(id).await?.ok_or_else(|| CatalogError::product_not_found(id))?;

        info!(event_name = "catalog.product.deleted", product_id = id.0, "product deleted");
        Ok(product)
    }

    pub async fn filter_price_greater_than(
        &self,
        threshold: f64,
    ) -> Result<Vec<Product>, CatalogError> {
        let products = self.repository.find_by_price_greater_than(threshold).await?;
        if products.is_empty() {
            return Err(CatalogError::NotFound(PRODUCTS_NOT_FOUND.to_string()));
        }
        Ok(products)
    }
}
