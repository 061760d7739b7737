use rand::seq::SliceRandom;

use crate::recipe::{Recipe, RecipeDraft};
use crate::store::{RecipeStore, StoreError};

/// The recipe list as the user sees it, kept in step with the persistence
/// source: every mutation goes to the store first and only lands in the
/// list once the store accepted it.
pub struct RecipeBook {
    store: Box<dyn RecipeStore>,
    recipes: Vec<Recipe>,
}

impl RecipeBook {
    pub fn new(store: Box<dyn RecipeStore>) -> Self {
        Self {
            store,
            recipes: Vec::new(),
        }
    }

    /// Replace the list wholesale with whatever the store holds.
    pub async fn load(&mut self) -> Result<(), StoreError> {
        self.recipes = self.store.list().await?;
        Ok(())
    }

    pub fn recipes(&self) -> &[Recipe] {
        &self.recipes
    }

    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }

    pub fn get(&self, id: i64) -> Option<&Recipe> {
        self.recipes.iter().find(|recipe| recipe.id == Some(id))
    }

    /// Read one record straight from the persistence source.
    pub async fn fetch(&self, id: i64) -> Result<Recipe, StoreError> {
        self.store.fetch(id).await
    }

    pub fn random(&self) -> Option<&Recipe> {
        self.recipes.choose(&mut rand::thread_rng())
    }

    pub async fn create(&mut self, draft: &RecipeDraft) -> Result<Recipe, StoreError> {
        let created = self.store.create(draft).await?;
        self.recipes.push(created.clone());
        Ok(created)
    }

    pub async fn update(&mut self, id: i64, draft: &RecipeDraft) -> Result<Recipe, StoreError> {
        let updated = self.store.update(id, draft).await?;
        // An edit that lands after its record was already removed from the
        // list drops its result here.
        if let Some(slot) = self.recipes.iter_mut().find(|recipe| recipe.id == Some(id)) {
            *slot = updated.clone();
        }
        Ok(updated)
    }

    pub async fn delete(&mut self, id: i64) -> Result<(), StoreError> {
        self.store.delete(id).await?;
        self.recipes.retain(|recipe| recipe.id != Some(id));
        Ok(())
    }
}
