use crate::recipe::Recipe;

static SPECIAL_CHARACTERS: [char; 18] = [
    '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!',
];

pub fn escape_markdown(text: &str) -> String {
    let mut escaped = String::new();
    for c in text.chars() {
        if SPECIAL_CHARACTERS.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c)
    }
    escaped
}

/// The card body: name, ingredients, steps, and the id-keyed controls.
/// Sent as a caption when the recipe has a picture, as a plain message
/// otherwise.
pub fn card_text(recipe: &Recipe) -> String {
    let mut text = format!(
        "*{}*\nIngredients: {}\nSteps: {}",
        escape_markdown(&recipe.name),
        escape_markdown(&recipe.ingredients),
        escape_markdown(&recipe.steps),
    );
    if let Some(id) = recipe.id {
        text.push_str(&format!("\n\n/show {0} /edit {0} /delete {0}", id));
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipe::RecipeDraft;

    #[test]
    fn special_characters_are_escaped() {
        assert_eq!(escape_markdown("a_b*c!"), "a\\_b\\*c\\!");
        assert_eq!(escape_markdown("plain text"), "plain text");
    }

    #[test]
    fn card_shows_every_field_and_its_controls() {
        let recipe = RecipeDraft {
            name: "Pasta".to_string(),
            ingredients: "Pasta, Sauce".to_string(),
            steps: "Boil, mix".to_string(),
            image: None,
        }
        .into_recipe(4);

        let text = card_text(&recipe);
        assert!(text.contains("*Pasta*"));
        assert!(text.contains("Ingredients: Pasta, Sauce"));
        assert!(text.contains("Steps: Boil, mix"));
        assert!(text.contains("/show 4"));
        assert!(text.contains("/edit 4"));
        assert!(text.contains("/delete 4"));
    }

    #[test]
    fn unsaved_recipes_get_no_controls() {
        let mut recipe = RecipeDraft {
            name: "Pasta".to_string(),
            ingredients: "Pasta".to_string(),
            steps: "Boil".to_string(),
            image: None,
        }
        .into_recipe(1);
        recipe.id = None;

        assert!(!card_text(&recipe).contains("/delete"));
    }
}
