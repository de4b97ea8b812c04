//! Recipe costing: selecting a product's working list and committing it.

use tamal_core::validation::{validate_ingredient_label, validate_measure, validate_product_name};
use tamal_core::{RecipeBook, RecipeCommit, RecipeSession};
use tamal_store::schema::{MENU, RECETAS};
use tamal_store::SnapshotStore;
use tracing::info;

use super::Engine;
use crate::error::EngineResult;

impl<S: SnapshotStore> Engine<S> {
    /// Points the session at `product`, loading its saved ingredient rows
    /// when the product changes.
    ///
    /// ## Returns
    /// `true` if the working list was reset.
    pub async fn select_recipe(&self, session: &mut RecipeSession, product: &str) -> EngineResult<bool> {
        let catalog = self.load_catalog().await?;
        let name = catalog.get(product)?.name.clone();
        let book = self.load_recipes().await?;
        Ok(session.select(&name, &book))
    }

    /// Writes the session's unit cost into the catalog and replaces the
    /// product's recipe rows.
    ///
    /// `menu` is saved first; if `recetas` then fails, `menu` is restored.
    ///
    /// ## Errors
    /// - `InvalidYield` for a zero yield in lot mode
    /// - `UnknownProduct` if the product left the catalog since selection
    pub async fn commit_recipe(&self, session: &RecipeSession, yield_count: u32) -> EngineResult<RecipeCommit> {
        let commit = session.commit(yield_count)?;

        let _guard = self.locks.acquire(&[MENU, RECETAS]).await;
        let (mut catalog, previous_catalog) = self.read_catalog().await?;
        let (mut book, _) = self.read_recipes().await?;

        commit.apply(&mut catalog, &mut book)?;

        self.save_catalog(&catalog).await?;
        if let Err(err) = self.save_recipes(&book).await {
            return Err(self.restore(MENU, &previous_catalog, err).await);
        }

        info!(
            product = %commit.product,
            total = %commit.total,
            yield_count = commit.yield_count,
            unit_cost = %commit.unit_cost,
            ingredients = commit.rows.len(),
            "Recipe committed"
        );
        Ok(commit)
    }

    /// Saves an edited recipe table wholesale.
    pub async fn replace_recipes(&self, book: RecipeBook) -> EngineResult<()> {
        for row in book.rows() {
            validate_product_name(&row.product)?;
            validate_ingredient_label(&row.ingredient)?;
            validate_measure("quantity", row.quantity)?;
        }

        let _guard = self.locks.acquire(&[RECETAS]).await;
        self.save_recipes(&book).await?;

        info!(rows = book.rows().len(), "Recipe table replaced");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use tamal_core::{CoreError, CostingMode, IngredientInput, Location, Money, RecipeBook, RecipeLine, RecipeSession};
    use tamal_store::schema::{MENU, RECETAS};

    use crate::error::EngineError;

    fn masa() -> IngredientInput {
        IngredientInput::Lot {
            purchase_cost: Money::from_cents(30000),
            fraction_used: 0.5,
        }
    }

    fn hojas() -> IngredientInput {
        IngredientInput::Lot {
            purchase_cost: Money::from_cents(6000),
            fraction_used: 1.0,
        }
    }

    #[tokio::test]
    async fn test_commit_updates_cost_and_rows() {
        let (engine, _, _) = engine();
        let mut session = RecipeSession::new();

        assert!(engine.select_recipe(&mut session, "Tamal Verde").await.unwrap());
        session.add_line("Masa", masa()).unwrap();
        session.add_line("Hojas", hojas()).unwrap();
        assert_eq!(session.preview(30).unwrap(), Money::from_cents(700));

        let commit = engine.commit_recipe(&session, 30).await.unwrap();
        assert_eq!(commit.total, Money::from_cents(21000));
        assert_eq!(commit.unit_cost, Money::from_cents(700));

        let catalog = engine.load_catalog().await.unwrap();
        assert_eq!(catalog.get("Tamal Verde").unwrap().cost, Money::from_cents(700));
        assert_eq!(catalog.stock("Tamal Verde", Location::Local1).unwrap(), 50);

        let book = engine.load_recipes().await.unwrap();
        assert_eq!(book.for_product("Tamal Verde").count(), 2);
    }

    #[tokio::test]
    async fn test_reselect_loads_saved_rows() {
        let (engine, _, _) = engine();
        let mut session = RecipeSession::new();
        engine.select_recipe(&mut session, "Tamal Verde").await.unwrap();
        session.add_line("Masa", masa()).unwrap();
        engine.commit_recipe(&session, 10).await.unwrap();

        // Same product keeps the working list.
        assert!(!engine.select_recipe(&mut session, "Tamal Verde").await.unwrap());
        assert_eq!(session.lines().len(), 1);

        assert!(engine.select_recipe(&mut session, "Atole").await.unwrap());
        assert!(session.lines().is_empty());

        assert!(engine.select_recipe(&mut session, "Tamal Verde").await.unwrap());
        assert_eq!(session.lines().len(), 1);
        assert_eq!(session.lines()[0].contribution, Money::from_cents(15000));
    }

    #[tokio::test]
    async fn test_zero_yield_saves_nothing() {
        let (engine, store, _) = engine();
        let mut session = RecipeSession::new();
        engine.select_recipe(&mut session, "Tamal Verde").await.unwrap();
        session.add_line("Masa", masa()).unwrap();

        let err = engine.commit_recipe(&session, 0).await.unwrap_err();
        assert!(matches!(err, EngineError::Core(CoreError::InvalidYield(0))));
        assert_eq!(store.save_count(), 0);
    }

    #[tokio::test]
    async fn test_unit_mode_ignores_yield() {
        let (engine, _, _) = engine();
        let mut session = RecipeSession::new();
        engine.select_recipe(&mut session, "Atole").await.unwrap();
        session.set_mode(CostingMode::Unit);
        session
            .add_line(
                "Leche",
                IngredientInput::Unit {
                    purchase_cost: Money::from_cents(2800),
                    package_size: 1000.0,
                    amount_used: 250.0,
                },
            )
            .unwrap();

        let commit = engine.commit_recipe(&session, 0).await.unwrap();
        assert_eq!(commit.unit_cost, Money::from_cents(700));
        assert_eq!(commit.yield_count, 1);
    }

    #[tokio::test]
    async fn test_select_unknown_product() {
        let (engine, _, _) = engine();
        let mut session = RecipeSession::new();
        let err = engine.select_recipe(&mut session, "Pozole").await.unwrap_err();
        assert!(matches!(err, EngineError::Core(CoreError::UnknownProduct(_))));
        assert_eq!(session.product(), None);
    }

    #[tokio::test]
    async fn test_recipe_save_failure_restores_catalog() {
        let (engine, store, _) = engine();
        let menu_before = store.snapshot(MENU).await;
        let mut session = RecipeSession::new();
        engine.select_recipe(&mut session, "Tamal Verde").await.unwrap();
        session.add_line("Masa", masa()).unwrap();

        store.fail_saves_to(RECETAS);
        assert!(engine.commit_recipe(&session, 30).await.is_err());
        assert_eq!(store.snapshot(MENU).await, menu_before);
    }

    #[tokio::test]
    async fn test_replace_recipes() {
        let (engine, _, _) = engine();
        let book = RecipeBook::from_rows(vec![RecipeLine {
            product: "Atole".into(),
            ingredient: "Maíz".into(),
            quantity: 0.25,
            cost: Money::from_cents(1200),
        }]);
        engine.replace_recipes(book.clone()).await.unwrap();
        assert_eq!(engine.load_recipes().await.unwrap(), book);

        let bad = RecipeBook::from_rows(vec![RecipeLine {
            product: "Atole".into(),
            ingredient: " ".into(),
            quantity: 1.0,
            cost: Money::zero(),
        }]);
        assert!(engine.replace_recipes(bad).await.is_err());
    }
}
