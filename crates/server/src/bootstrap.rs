use std::sync::Arc;

use axum::Router;
use stockroom_core::config::{AppConfig, ConfigError, LoadOptions};
use stockroom_core::validation::ProductValidator;
use stockroom_db::{
    connect_with_settings, migrations, DbPool, ProductFixtures, RepositoryError,
    SqlProductRepository,
};
use thiserror::Error;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::catalog::ProductCatalog;
use crate::{health, products};

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub catalog: ProductCatalog,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("fixture seeding failed: {0}")]
    Seed(#[source] RepositoryError),
}

impl Application {
    /// Product API and health check behind a shared request trace layer.
    pub fn router(&self) -> Router {
        products::router(self.catalog.clone())
            .merge(health::router(self.db_pool.clone()))
            .layer(TraceLayer::new_for_http())
    }
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(event_name = "system.bootstrap.start", "starting application bootstrap");

    let db_pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(BootstrapError::DatabaseConnect)?;
    info!(event_name = "system.bootstrap.database_connected", "database connection established");

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(event_name = "system.bootstrap.migrations_applied", "database migrations applied");

    let repository = Arc::new(SqlProductRepository::new(db_pool.clone()));
    if config.server.seed_fixtures {
        let seeded =
            ProductFixtures::load(repository.as_ref()).await.map_err(BootstrapError::Seed)?;
        info!(
            event_name = "system.bootstrap.fixtures_seeded",
            inserted = seeded.inserted.len(),
            skipped = seeded.skipped.len(),
            "product fixtures seeded"
        );
    }

    let validator = ProductValidator::with_name_min_length(config.catalog.name_min_length);
    let catalog = ProductCatalog::new(repository, validator);

    Ok(Application { config, db_pool, catalog })
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Method, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use stockroom_core::config::{ConfigOverrides, LoadOptions};
    use tower::ServiceExt;

    use crate::bootstrap::{bootstrap, BootstrapError};

    fn overrides(database_url: &str, seed_fixtures: bool) -> LoadOptions {
        LoadOptions {
            overrides: ConfigOverrides {
                database_url: Some(database_url.to_string()),
                seed_fixtures: Some(seed_fixtures),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        }
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.expect("body");
        serde_json::from_slice(&bytes).expect("json body")
    }

    #[tokio::test]
    async fn bootstrap_rejects_non_sqlite_urls() {
        let result = bootstrap(overrides("mysql://localhost/stockroom", false)).await;

        let message = match result {
            Err(error @ BootstrapError::Config(_)) => error.to_string(),
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("bootstrap should fail"),
        };
        assert!(message.contains("database.url"));
    }

    #[tokio::test]
    async fn bootstrap_seeds_fixtures_and_serves_products_over_sqlite() {
        let app = bootstrap(overrides("sqlite::memory:", true))
            .await
            .expect("bootstrap should succeed with in-memory database");
        let router = app.router();

        let list = router
            .clone()
            .oneshot(Request::builder().uri("/api/product/").body(Body::empty()).expect("request"))
            .await
            .expect("response");
        assert_eq!(list.status(), StatusCode::OK);
        assert_eq!(body_json(list).await.as_array().map(Vec::len), Some(3));

        let created = router
            .clone()
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/api/product/")
                    .body(Body::from(json!({"name": "New Product", "price": 9.99}).to_string()))
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(created.status(), StatusCode::CREATED);
        assert_eq!(body_json(created).await["name"], "New Product");

        let health = router
            .oneshot(Request::builder().uri("/health").body(Body::empty()).expect("request"))
            .await
            .expect("response");
        assert_eq!(health.status(), StatusCode::OK);

        let count: i64 = sqlx::query_scalar("SELECT COUNT(1) FROM product")
            .fetch_one(&app.db_pool)
            .await
            .expect("count products");
        assert_eq!(count, 4);

        app.db_pool.close().await;
    }

    #[tokio::test]
    async fn bootstrap_without_seeding_starts_empty() {
        let app = bootstrap(overrides("sqlite::memory:", false)).await.expect("bootstrap");

        let products = app.catalog.list().await.expect("list");

        assert!(products.is_empty());
        app.db_pool.close().await;
    }
}
