use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    #[serde(default)]
    pub id: Option<i64>,
    pub name: String,
    pub ingredients: String,
    pub steps: String,
    #[serde(default)]
    pub image: Option<String>,
}

impl Recipe {
    /// An absent or empty URL means the card has no picture.
    pub fn image_url(&self) -> Option<&str> {
        self.image.as_deref().filter(|url| !url.is_empty())
    }
}

/// What the form collects: a recipe without an id yet.
#[derive(Debug, Clone, Serialize)]
pub struct RecipeDraft {
    pub name: String,
    pub ingredients: String,
    pub steps: String,
    pub image: Option<String>,
}

impl RecipeDraft {
    pub fn into_recipe(self, id: i64) -> Recipe {
        Recipe {
            id: Some(id),
            name: self.name,
            ingredients: self.ingredients,
            steps: self.steps,
            image: self.image,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_without_image_field_parses() {
        let recipe: Recipe = serde_json::from_str(
            r#"{"id": 1, "name": "Pasta", "ingredients": "Pasta, Sauce", "steps": "Boil, mix"}"#,
        )
        .unwrap();
        assert_eq!(recipe.name, "Pasta");
        assert!(recipe.image_url().is_none());
    }

    #[test]
    fn empty_image_counts_as_missing() {
        let mut recipe = RecipeDraft {
            name: "Soup".to_string(),
            ingredients: "Water".to_string(),
            steps: "Heat".to_string(),
            image: Some(String::new()),
        }
        .into_recipe(3);
        assert!(recipe.image_url().is_none());
        recipe.image = Some("http://example.com/soup.png".to_string());
        assert_eq!(recipe.image_url(), Some("http://example.com/soup.png"));
    }
}
