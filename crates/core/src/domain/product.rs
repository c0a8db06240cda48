use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub i64);

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ProductId {
    type Err = std::num::ParseIntError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        value.trim().parse::<i64>().map(ProductId)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: f64,
}

/// Field values for a product that passed full validation (create or replace).
#[derive(Clone, Debug, PartialEq)]
pub struct ProductDraft {
    pub name: String,
    pub price: f64,
}

/// Validated subset of fields for a partial update. `None` leaves the stored value untouched.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProductChanges {
    pub name: Option<String>,
    pub price: Option<f64>,
}

impl ProductChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.price.is_none()
    }

    pub fn apply_to(self, product: &mut Product) {
        if let Some(name) = self.name {
            product.name = name;
        }
        if let Some(price) = self.price {
            product.price = price;
        }
    }
}

impl Product {
    pub fn from_draft(id: ProductId, draft: ProductDraft) -> Self {
        Self { id, name: draft.name, price: draft.price }
    }
}

/// Wire representation of a product, version 1 of the JSON contract.
///
/// Exposes exactly `id`, `name` and `price`; nothing else about the stored
/// record leaks into responses.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProductView {
    pub id: i64,
    pub name: String,
    pub price: f64,
}

impl From<Product> for ProductView {
    fn from(product: Product) -> Self {
        Self { id: product.id.0, name: product.name, price: product.price }
    }
}

impl From<&Product> for ProductView {
    fn from(product: &Product) -> Self {
        Self { id: product.id.0, name: product.name.clone(), price: product.price }
    }
}
