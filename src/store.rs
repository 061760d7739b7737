use std::fs;
use std::path::PathBuf;

use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;

use crate::recipe::{Recipe, RecipeDraft};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server answered with status {0}")]
    Status(u16),
    #[error("storage failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("stored recipes are unreadable: {0}")]
    Corrupt(#[from] serde_json::Error),
    #[error("no recipe with id {0}")]
    NotFound(i64),
}

/// The persistence source behind the recipe book. Which implementation is
/// active is a deployment choice, see [`store_from_env`].
#[async_trait]
pub trait RecipeStore: Send + Sync {
    async fn list(&self) -> Result<Vec<Recipe>, StoreError>;
    async fn fetch(&self, id: i64) -> Result<Recipe, StoreError>;
    async fn create(&self, draft: &RecipeDraft) -> Result<Recipe, StoreError>;
    async fn update(&self, id: i64, draft: &RecipeDraft) -> Result<Recipe, StoreError>;
    async fn delete(&self, id: i64) -> Result<(), StoreError>;
}

/// Remote recipe service speaking JSON over HTTP.
pub struct ApiStore {
    base_url: String,
    client: Client,
}

impl ApiStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: Client::new(),
        }
    }

    fn recipes_url(&self) -> String {
        format!("{}/recipes", self.base_url)
    }

    fn recipe_url(&self, id: i64) -> String {
        format!("{}/recipes/{}", self.base_url, id)
    }
}

// Non-2xx answers only carry their status; the body is never parsed.
fn check_status(response: reqwest::Response) -> Result<reqwest::Response, StoreError> {
    if response.status().is_success() {
        Ok(response)
    } else {
        Err(StoreError::Status(response.status().as_u16()))
    }
}

#[async_trait]
impl RecipeStore for ApiStore {
    async fn list(&self) -> Result<Vec<Recipe>, StoreError> {
        let response = self.client.get(self.recipes_url()).send().await?;
        Ok(check_status(response)?.json().await?)
    }

    async fn fetch(&self, id: i64) -> Result<Recipe, StoreError> {
        let response = self.client.get(self.recipe_url(id)).send().await?;
        Ok(check_status(response)?.json().await?)
    }

    async fn create(&self, draft: &RecipeDraft) -> Result<Recipe, StoreError> {
        let response = self
            .client
            .post(self.recipes_url())
            .json(draft)
            .send()
            .await?;
        Ok(check_status(response)?.json().await?)
    }

    async fn update(&self, id: i64, draft: &RecipeDraft) -> Result<Recipe, StoreError> {
        let response = self
            .client
            .put(self.recipe_url(id))
            .json(draft)
            .send()
            .await?;
        Ok(check_status(response)?.json().await?)
    }

    async fn delete(&self, id: i64) -> Result<(), StoreError> {
        let response = self.client.delete(self.recipe_url(id)).send().await?;
        check_status(response)?;
        Ok(())
    }
}

/// All recipes in one JSON document, read wholesale and rewritten wholesale
/// after every mutation.
pub struct LocalStore {
    path: PathBuf,
}

impl LocalStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read_all(&self) -> Result<Vec<Recipe>, StoreError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let raw = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    fn write_all(&self, recipes: &[Recipe]) -> Result<(), StoreError> {
        fs::write(&self.path, serde_json::to_string(recipes)?)?;
        Ok(())
    }

    fn next_id(recipes: &[Recipe]) -> i64 {
        recipes.iter().filter_map(|recipe| recipe.id).max().unwrap_or(0) + 1
    }
}

#[async_trait]
impl RecipeStore for LocalStore {
    async fn list(&self) -> Result<Vec<Recipe>, StoreError> {
        self.read_all()
    }

    async fn fetch(&self, id: i64) -> Result<Recipe, StoreError> {
        self.read_all()?
            .into_iter()
            .find(|recipe| recipe.id == Some(id))
            .ok_or(StoreError::NotFound(id))
    }

    async fn create(&self, draft: &RecipeDraft) -> Result<Recipe, StoreError> {
        let mut recipes = self.read_all()?;
        let recipe = draft.clone().into_recipe(Self::next_id(&recipes));
        recipes.push(recipe.clone());
        self.write_all(&recipes)?;
        Ok(recipe)
    }

    async fn update(&self, id: i64, draft: &RecipeDraft) -> Result<Recipe, StoreError> {
        let mut recipes = self.read_all()?;
        let slot = recipes
            .iter_mut()
            .find(|recipe| recipe.id == Some(id))
            .ok_or(StoreError::NotFound(id))?;
        *slot = draft.clone().into_recipe(id);
        let updated = slot.clone();
        self.write_all(&recipes)?;
        Ok(updated)
    }

    async fn delete(&self, id: i64) -> Result<(), StoreError> {
        let mut recipes = self.read_all()?;
        let before = recipes.len();
        recipes.retain(|recipe| recipe.id != Some(id));
        if recipes.len() == before {
            return Err(StoreError::NotFound(id));
        }
        self.write_all(&recipes)?;
        Ok(())
    }
}

/// Pick the persistence source for this deployment. RECIPE_STORE is either
/// "api" (the default) or "local".
pub fn store_from_env() -> Box<dyn RecipeStore> {
    let kind = std::env::var("RECIPE_STORE").unwrap_or_else(|_| "api".to_string());
    match kind.as_str() {
        "api" => {
            let base_url = std::env::var("RECIPE_API_URL")
                .unwrap_or_else(|_| "http://localhost:8000".to_string());
            log::info!("Using the recipe API at {}", base_url);
            Box::new(ApiStore::new(base_url))
        }
        "local" => {
            let path = std::env::var("RECIPE_FILE").unwrap_or_else(|_| "recipes.json".to_string());
            log::info!("Keeping recipes in {}", path);
            Box::new(LocalStore::new(path))
        }
        other => panic!("RECIPE_STORE must be \"api\" or \"local\", got {}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn draft(name: &str) -> RecipeDraft {
        RecipeDraft {
            name: name.to_string(),
            ingredients: "Pasta, Sauce".to_string(),
            steps: "Boil, mix".to_string(),
            image: None,
        }
    }

    #[tokio::test]
    async fn missing_document_is_an_empty_list() {
        let dir = tempdir().unwrap();
        let store = LocalStore::new(dir.path().join("recipes.json"));
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn created_recipes_survive_a_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("recipes.json");
        let store = LocalStore::new(path.clone());
        store.create(&draft("Pasta")).await.unwrap();
        store.create(&draft("Soup")).await.unwrap();

        let reopened = LocalStore::new(path);
        let recipes = reopened.list().await.unwrap();
        let names: Vec<&str> = recipes.iter().map(|recipe| recipe.name.as_str()).collect();
        assert_eq!(names, ["Pasta", "Soup"]);
        let ids: Vec<Option<i64>> = recipes.iter().map(|recipe| recipe.id).collect();
        assert_eq!(ids, [Some(1), Some(2)]);
    }

    #[tokio::test]
    async fn ids_keep_growing_after_a_delete() {
        let dir = tempdir().unwrap();
        let store = LocalStore::new(dir.path().join("recipes.json"));
        store.create(&draft("Pasta")).await.unwrap();
        store.create(&draft("Soup")).await.unwrap();
        store.delete(1).await.unwrap();

        let replacement = store.create(&draft("Stew")).await.unwrap();
        assert_eq!(replacement.id, Some(3));
    }

    #[tokio::test]
    async fn update_replaces_the_whole_record() {
        let dir = tempdir().unwrap();
        let store = LocalStore::new(dir.path().join("recipes.json"));
        store.create(&draft("Pasta")).await.unwrap();

        let mut changed = draft("Pasta v2");
        changed.image = Some("http://example.com/pasta.png".to_string());
        let updated = store.update(1, &changed).await.unwrap();
        assert_eq!(updated.name, "Pasta v2");

        let listed = store.fetch(1).await.unwrap();
        assert_eq!(listed, updated);
    }

    #[tokio::test]
    async fn unknown_ids_are_not_found() {
        let dir = tempdir().unwrap();
        let store = LocalStore::new(dir.path().join("recipes.json"));
        assert!(matches!(
            store.update(9, &draft("Ghost")).await,
            Err(StoreError::NotFound(9))
        ));
        assert!(matches!(store.delete(9).await, Err(StoreError::NotFound(9))));
        assert!(matches!(store.fetch(9).await, Err(StoreError::NotFound(9))));
    }

    #[test]
    fn api_urls_drop_trailing_slashes() {
        let store = ApiStore::new("http://localhost:8000/");
        assert_eq!(store.recipes_url(), "http://localhost:8000/recipes");
        assert_eq!(store.recipe_url(7), "http://localhost:8000/recipes/7");
    }
}
