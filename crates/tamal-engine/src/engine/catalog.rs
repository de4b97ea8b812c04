//! Catalog maintenance and stock movement.

use tamal_core::{Category, Location, PricingUpdate, PricingView, Product, TransferReceipt};
use tamal_store::schema::MENU;
use tamal_store::SnapshotStore;
use tracing::info;

use super::Engine;
use crate::error::EngineResult;

impl<S: SnapshotStore> Engine<S> {
    /// Adds a product and saves the catalog.
    pub async fn create_product(&self, product: Product) -> EngineResult<Product> {
        let _guard = self.locks.acquire(&[MENU]).await;

        let (mut catalog, _) = self.read_catalog().await?;
        let name = product.name.trim().to_string();
        catalog.create(product)?;
        let created = catalog.get(&name)?.clone();
        self.save_catalog(&catalog).await?;

        info!(product = %created.name, category = %created.category, "Product created");
        Ok(created)
    }

    /// Deletes a product row. Its ledger lines and recipe rows are kept.
    pub async fn remove_product(&self, name: &str) -> EngineResult<Product> {
        let _guard = self.locks.acquire(&[MENU]).await;

        let (mut catalog, _) = self.read_catalog().await?;
        let removed = catalog.remove(name)?;
        self.save_catalog(&catalog).await?;

        info!(product = %removed.name, "Product removed");
        Ok(removed)
    }

    /// Edits price, cost and/or category.
    pub async fn update_pricing(&self, name: &str, update: PricingUpdate) -> EngineResult<Product> {
        let _guard = self.locks.acquire(&[MENU]).await;

        let (mut catalog, _) = self.read_catalog().await?;
        let product = catalog.update_pricing(name, update)?.clone();
        self.save_catalog(&catalog).await?;

        info!(
            product = %product.name,
            price = %product.price,
            cost = %product.cost,
            "Pricing updated"
        );
        Ok(product)
    }

    /// Applies a signed stock change (restock or shrinkage) at one location.
    ///
    /// ## Returns
    /// The new quantity at `location`.
    pub async fn adjust_stock(&self, name: &str, location: Location, delta: i64) -> EngineResult<i64> {
        let _guard = self.locks.acquire(&[MENU]).await;

        let (mut catalog, _) = self.read_catalog().await?;
        let remaining = catalog.adjust_stock(name, location, delta)?;
        self.save_catalog(&catalog).await?;

        info!(product = %name.trim(), location = %location, delta, remaining, "Stock adjusted");
        Ok(remaining)
    }

    /// Moves stock between two locations in one catalog save.
    pub async fn transfer(
        &self,
        name: &str,
        from: Location,
        to: Location,
        quantity: i64,
    ) -> EngineResult<TransferReceipt> {
        let _guard = self.locks.acquire(&[MENU]).await;

        let (mut catalog, _) = self.read_catalog().await?;
        let receipt = catalog.transfer(name, from, to, quantity)?;
        self.save_catalog(&catalog).await?;

        info!(
            product = %receipt.product,
            from = %receipt.from,
            to = %receipt.to,
            quantity = receipt.quantity,
            "Stock transferred"
        );
        Ok(receipt)
    }

    /// Products of one category, in catalog order.
    pub async fn products_by_category(&self, category: Category) -> EngineResult<Vec<Product>> {
        let catalog = self.load_catalog().await?;
        Ok(catalog.list_by_category(category).cloned().collect())
    }

    /// Price, cost, margin and suggested prices for one product.
    pub async fn pricing_view(&self, name: &str) -> EngineResult<PricingView> {
        let catalog = self.load_catalog().await?;
        Ok(catalog.pricing_view(name)?)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use tamal_core::{Category, CoreError, Location, Money, PricingUpdate, Product};
    use tamal_store::schema::MENU;

    use crate::error::{EngineError, ErrorCode};

    #[tokio::test]
    async fn test_create_and_remove() {
        let (engine, store, _) = engine();

        let created = engine
            .create_product(Product::new(
                "  Champurrado ",
                Category::Bebidas,
                Money::from_cents(1800),
                Money::from_cents(500),
            ))
            .await
            .unwrap();
        assert_eq!(created.name, "Champurrado");
        assert_eq!(engine.load_catalog().await.unwrap().len(), 3);

        let dup = engine.create_product(tamal_verde()).await.unwrap_err();
        assert!(matches!(dup, EngineError::Core(CoreError::DuplicateProduct(_))));

        engine.remove_product("Champurrado").await.unwrap();
        assert!(!engine.load_catalog().await.unwrap().contains("Champurrado"));
        assert_eq!(store.save_count(), 2);
    }

    #[tokio::test]
    async fn test_update_pricing_persists() {
        let (engine, _, _) = engine();
        engine
            .update_pricing(
                "Atole",
                PricingUpdate {
                    price: Some(Money::from_cents(1700)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let view = engine.pricing_view("Atole").await.unwrap();
        assert_eq!(view.price, Money::from_cents(1700));
        assert_eq!(view.margin, Money::from_cents(1300));
    }

    #[tokio::test]
    async fn test_adjust_stock_never_negative() {
        let (engine, store, _) = engine();
        assert_eq!(engine.adjust_stock("Atole", Location::Feria, 10).await.unwrap(), 15);

        let saves = store.save_count();
        let err = engine.adjust_stock("Atole", Location::Feria, -16).await.unwrap_err();
        assert!(matches!(
            err,
            EngineError::Core(CoreError::InsufficientStock { available: 15, requested: 16, .. })
        ));
        assert_eq!(store.save_count(), saves);
        assert_eq!(
            engine.load_catalog().await.unwrap().stock("Atole", Location::Feria).unwrap(),
            15
        );
    }

    #[tokio::test]
    async fn test_transfer_all_or_nothing() {
        let (engine, store, _) = engine();

        let receipt = engine
            .transfer("Tamal Verde", Location::Local1, Location::Feria, 20)
            .await
            .unwrap();
        assert_eq!((receipt.from_remaining, receipt.to_total), (30, 20));

        let before = store.snapshot(MENU).await;
        let err = engine
            .transfer("Tamal Verde", Location::Local2, Location::Feria, 31)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Core(CoreError::InsufficientStock { .. })));
        assert_eq!(store.snapshot(MENU).await, before);
    }

    #[tokio::test]
    async fn test_bulk_transfer_and_overflowing_adjustment() {
        let (engine, store, _) = engine();
        engine.adjust_stock("Tamal Verde", Location::Local1, 1950).await.unwrap();

        let receipt = engine
            .transfer("Tamal Verde", Location::Local1, Location::Feria, 1500)
            .await
            .unwrap();
        assert_eq!((receipt.from_remaining, receipt.to_total), (500, 1500));

        let saves = store.save_count();
        let err = engine
            .adjust_stock("Tamal Verde", Location::Local1, i64::MAX)
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationError);
        assert_eq!(store.save_count(), saves);
        assert_eq!(
            engine.load_catalog().await.unwrap().stock("Tamal Verde", Location::Local1).unwrap(),
            500
        );
    }

    #[tokio::test]
    async fn test_products_by_category() {
        let (engine, _, _) = engine();
        let drinks = engine.products_by_category(Category::Bebidas).await.unwrap();
        assert_eq!(drinks.len(), 1);
        assert_eq!(drinks[0].name, "Atole");
    }
}
