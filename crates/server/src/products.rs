//! JSON API routes for the product resource.
//!
//! - `GET    /api/product/` list products
//! - `POST   /api/product/` create a product
//! - `GET    /api/product/{id}` show a product
//! - `PUT    /api/product/{id}` replace a product
//! - `PATCH  /api/product/{id}` merge supplied fields
//! - `DELETE /api/product/{id}` delete a product
//! - `GET    /api/product/price-grater-than/{price}` products priced above a threshold
//!
//! `GET /api/product` permanently redirects to the collection path with its trailing slash.
//!
//! Successful PUT and PATCH answer `201 Created`, matching the contract
//! existing clients were written against.

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{Method, StatusCode},
    response::Redirect,
    routing::get,
    Json, Router,
};
use stockroom_core::domain::product::{ProductId, ProductView};
use stockroom_core::validation::ProductSubmission;

use crate::catalog::{CatalogError, ProductCatalog};

const COLLECTION_PATH: &str = "/api/product/";

pub fn router(catalog: ProductCatalog) -> Router {
    Router::new()
        .route("/api/product", get(redirect_to_collection))
        .route(COLLECTION_PATH, get(list_products).post(create_product))
        .route(
            "/api/product/{id}",
            get(show_product).put(update_product).patch(update_product).delete(delete_product),
        )
        .route("/api/product/price-grater-than/{price}", get(products_above_price))
        .with_state(catalog)
}

async fn redirect_to_collection() -> Redirect {
    Redirect::permanent(COLLECTION_PATH)
}

/// Ids that are not integers cannot name a stored product.
fn parse_product_id(raw: &str) -> Result<ProductId, CatalogError> {
    raw.parse::<ProductId>().map_err(|_| CatalogError::product_not_found(raw))
}

fn parse_price_threshold(raw: &str) -> Result<f64, CatalogError> {
    match raw.trim().parse::<f64>() {
        Ok(price) if price.is_finite() => Ok(price),
        _ => Err(CatalogError::InvalidParameter {
            name: "price threshold",
            value: raw.to_string(),
        }),
    }
}

fn views(products: Vec<stockroom_core::Product>) -> Vec<ProductView> {
    products.into_iter().map(ProductView::from).collect()
}

async fn list_products(
    State(catalog): State<ProductCatalog>,
) -> Result<Json<Vec<ProductView>>, CatalogError> {
    Ok(Json(views(catalog.list().await?)))
}

async fn show_product(
    Path(raw_id): Path<String>,
    State(catalog): State<ProductCatalog>,
) -> Result<Json<ProductView>, CatalogError> {
    let id = parse_product_id(&raw_id)?;
    Ok(Json(catalog.get(id).await?.into()))
}

async fn create_product(
    State(catalog): State<ProductCatalog>,
    body: Bytes,
) -> Result<(StatusCode, Json<ProductView>), CatalogError> {
    let product = catalog.create(ProductSubmission::from_json_bytes(&body)).await?;
    Ok((StatusCode::CREATED, Json(product.into())))
}

/// PUT requires every field; PATCH validates and writes only the fields it was sent.
async fn update_product(
    method: Method,
    Path(raw_id): Path<String>,
    State(catalog): State<ProductCatalog>,
    body: Bytes,
) -> Result<(StatusCode, Json<ProductView>), CatalogError> {
    let id = parse_product_id(&raw_id)?;
    let submission = ProductSubmission::from_json_bytes(&body);

    let product = if method == Method::PATCH {
        catalog.merge(id, submission).await?
    } else {
        catalog.replace(id, submission).await?
    };

    Ok((StatusCode::CREATED, Json(product.into())))
}

async fn delete_product(
    Path(raw_id): Path<String>,
    State(catalog): State<ProductCatalog>,
) -> Result<Json<ProductView>, CatalogError> {
    let id = parse_product_id(&raw_id)?;
    Ok(Json(catalog.delete(id).await?.into()))
}

async fn products_above_price(
    Path(raw_price): Path<String>,
    State(catalog): State<ProductCatalog>,
) -> Result<Json<Vec<ProductView>>, CatalogError> {
    let threshold = parse_price_threshold(&raw_price)?;
    Ok(Json(views(catalog.filter_price_greater_than(threshold).await?)))
}
