use std::collections::BTreeMap;

use tokio::sync::RwLock;

use stockroom_core::domain::product::{Product, ProductChanges, ProductDraft, ProductId};

use super::{ProductRepository, RepositoryError};

#[derive(Default)]
struct ProductTable {
    rows: BTreeMap<ProductId, Product>,
    last_id: i64,
}

/// Product store backed by an ordered map; ids are never reused.
#[derive(Default)]
pub struct InMemoryProductRepository {
    table: RwLock<ProductTable>,
}

#[async_trait::async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn list(&self) -> Result<Vec<Product>, RepositoryError> {
        let table = self.table.read().await;
        Ok(table.rows.values().cloned().collect())
    }

    async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let table = self.table.read().await;
        Ok(table.rows.get(&id).cloned())
    }

    async fn create(&self, draft: ProductDraft) -> Result<Product, RepositoryError> {
        let mut table = self.table.write().await;
        table.last_id += 1;
        let product = Product::from_draft(ProductId(table.last_id), draft);
        table.rows.insert(product.id, product.clone());
        Ok(product)
    }

    async fn replace(
        &self,
        id: ProductId,
        draft: ProductDraft,
    ) -> Result<Option<Product>, RepositoryError> {
        let mut table = self.table.write().await;
        Ok(table.rows.get_mut(&id).map(|product| {
            *product = Product::from_draft(id, draft);
            product.clone()
        }))
    }

    async fn merge(
        &self,
        id: ProductId,
        changes: ProductChanges,
    ) -> Result<Option<Product>, RepositoryError> {
        let mut table = self.table.write().await;
        Ok(table.rows.get_mut(&id).map(|product| {
            changes.apply_to(product);
            product.clone()
        }))
    }

    async fn delete(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let mut table = self.table.write().await;
        Ok(table.rows.remove(&id))
    }

    async fn find_by_price_greater_than(
        &self,
        threshold: f64,
    ) -> Result<Vec<Product>, RepositoryError> {
        let table = self.table.read().await;
        Ok(table.rows.values().filter(|product| product.price > threshold).cloned().collect())
    }

    async fn count(&self) -> Result<i64, RepositoryError> {
        let table = self.table.read().await;
        Ok(table.rows.len() as i64)
    }
}

#[cfg(test)]
mod tests {
    use stockroom_core::domain::product::{ProductChanges, ProductDraft, ProductId};

    use crate::repositories::{InMemoryProductRepository, ProductRepository};

    fn draft(name: &str, price: f64) -> ProductDraft {
        ProductDraft { name: name.to_string(), price }
    }

    #[tokio::test]
    async fn in_memory_product_repo_round_trip() {
        let repo = InMemoryProductRepository::default();

        let product = repo.create(draft("Pro Plan Box", 12.5)).await.expect("save product");
        let found = repo.find_by_id(product.id).await.expect("find product");

        assert_eq!(found, Some(product));
    }

    #[tokio::test]
    async fn list_is_ordered_by_id() {
        let repo = InMemoryProductRepository::default();
        let seeds = [("First Product", 1.0), ("Second Product", 2.2), ("Third Product", 3.33)];
        for (name, price) in seeds {
            repo.create(draft(name, price)).await.expect("create");
        }

        let ids = repo.list().await.expect("list").into_iter().map(|p| p.id).collect::<Vec<_>>();

        assert_eq!(ids, vec![ProductId(1), ProductId(2), ProductId(3)]);
    }

    #[tokio::test]
    async fn delete_returns_removed_product_without_reusing_id() {
        let repo = InMemoryProductRepository::default();
        let first = repo.create(draft("First Product", 1.0)).await.expect("create");

        let removed = repo.delete(first.id).await.expect("delete");
        let next = repo.create(draft("Second Product", 2.0)).await.expect("create");

        assert_eq!(removed, Some(first));
        assert_eq!(next.id, ProductId(2));
        assert_eq!(repo.count().await.expect("count"), 1);
    }

    #[tokio::test]
    async fn merge_and_replace_update_in_place() {
        let repo = InMemoryProductRepository::default();
        let product = repo.create(draft("Second Product", 2.2)).await.expect("create");

        let merged = repo
            .merge(product.id, ProductChanges { name: None, price: Some(8.0) })
            .await
            .expect("merge")
            .expect("exists");
        assert_eq!(merged.name, "Second Product");
        assert_eq!(merged.price, 8.0);

        let replaced = repo
            .replace(product.id, draft("Updated Product", 9.0))
            .await
            .expect("replace")
            .expect("exists");
        assert_eq!(replaced.name, "Updated Product");
        assert_eq!(replaced.price, 9.0);
        assert_eq!(replaced.id, product.id);
    }
}
