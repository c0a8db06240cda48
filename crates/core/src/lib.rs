pub mod config;
pub mod domain;
pub mod validation;

pub use domain::product::{Product, ProductChanges, ProductDraft, ProductId, ProductView};
pub use validation::{FieldInput, ProductSubmission, ProductValidator, ValidationErrors};
