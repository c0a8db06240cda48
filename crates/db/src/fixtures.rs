use stockroom_core::domain::product::{Product, ProductDraft};
use tracing::info;

use crate::repositories::{ProductRepository, RepositoryError};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SeedProduct {
    pub name: &'static str,
    pub price: f64,
}

/// Canonical demo/test catalog.
const SEED_PRODUCTS: &[SeedProduct] = &[
    SeedProduct { name: "First Product", price: 1.0 },
    SeedProduct { name: "Second Product", price: 2.2 },
    SeedProduct { name: "Third Product", price: 3.33 },
];

const PRICE_TOLERANCE: f64 = 1e-9;

/// Deterministic product fixtures.
///
/// Loading is idempotent: a seed product is only inserted when no stored
/// product carries its name.
pub struct ProductFixtures;

#[derive(Clone, Debug, PartialEq)]
pub struct SeedResult {
    pub inserted: Vec<Product>,
    pub skipped: Vec<&'static str>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerificationResult {
    pub all_present: bool,
    pub checks: Vec<(&'static str, bool)>,
}

impl VerificationResult {
    pub fn failed_checks(&self) -> Vec<&'static str> {
        self.checks.iter().filter_map(|(check, passed)| (!passed).then_some(*check)).collect()
    }
}

impl ProductFixtures {
    pub const GROUP: &'static str = "products";

    pub fn products() -> &'static [SeedProduct] {
        SEED_PRODUCTS
    }

    pub async fn load(repository: &dyn ProductRepository) -> Result<SeedResult, RepositoryError> {
        let existing = repository.list().await?;
        let mut inserted = Vec::new();
        let mut skipped = Vec::new();

        for seed in SEED_PRODUCTS {
            if existing.iter().any(|product| product.name == seed.name) {
                skipped.push(seed.name);
                continue;
            }

            let product = repository
                .create(ProductDraft { name: seed.name.to_string(), price: seed.price })
                .await?;
            inserted.push(product);
        }

        info!(
            event_name = "fixtures.products.loaded",
            group = Self::GROUP,
            inserted = inserted.len(),
            skipped = skipped.len(),
            "product fixtures loaded"
        );

        Ok(SeedResult { inserted, skipped })
    }

    /// Checks that every seed product is stored with its canonical price.
    pub async fn verify(
        repository: &dyn ProductRepository,
    ) -> Result<VerificationResult, RepositoryError> {
        let existing = repository.list().await?;

        let checks = SEED_PRODUCTS
            .iter()
            .map(|seed| {
                let present = existing.iter().any(|product| {
                    product.name == seed.name
                        && (product.price - seed.price).abs() < PRICE_TOLERANCE
                });
                (seed.name, present)
            })
            .collect::<Vec<_>>();

        let all_present = checks.iter().all(|(_, present)| *present);
        Ok(VerificationResult { all_present, checks })
    }
}
