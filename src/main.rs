use std::sync::Arc;

use dotenv::dotenv;
use teloxide::dispatching::dialogue::InMemStorage;
use teloxide::types::{InputFile, ParseMode};
use teloxide::{prelude::*, utils::command::BotCommands};
use tokio::sync::Mutex;

mod book;
mod card;
mod recipe;
mod store;

use book::RecipeBook;
use recipe::{Recipe, RecipeDraft};

type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;
type MyDialogue = Dialogue<State, InMemStorage<State>>;
type SharedBook = Arc<Mutex<RecipeBook>>;

#[derive(BotCommands, Clone)]
#[command(
    rename_rule = "lowercase",
    description = "These commands are supported:"
)]
enum Command {
    #[command(description = "Display this text.")]
    Help,
    #[command(description = "Show all saved recipes.")]
    List,
    #[command(description = "Add a new recipe.")]
    Add,
    #[command(description = "Look up one recipe by its id.")]
    Show(i64),
    #[command(description = "Edit a recipe by its id.")]
    Edit(i64),
    #[command(description = "Delete a recipe by its id.")]
    Delete(i64),
    #[command(description = "Suggest a random recipe.")]
    Random,
    #[command(description = "Abort the current add or edit.")]
    Cancel,
}

/// Where an open add or edit form currently stands. The collected answers
/// ride along so nothing is lost until the final submit.
#[derive(Clone, Default)]
pub enum State {
    #[default]
    Start,
    AddName,
    AddIngredients {
        name: String,
    },
    AddSteps {
        name: String,
        ingredients: String,
    },
    AddImage {
        name: String,
        ingredients: String,
        steps: String,
    },
    EditName {
        current: Recipe,
    },
    EditIngredients {
        current: Recipe,
        name: String,
    },
    EditSteps {
        current: Recipe,
        name: String,
        ingredients: String,
    },
    EditImage {
        current: Recipe,
        name: String,
        ingredients: String,
        steps: String,
    },
}

#[tokio::main]
async fn main() {
    // Load all env variables from .env file.
    dotenv().ok();
    std::env::set_var("RUST_LOG", "debug");
    pretty_env_logger::init();
    log::info!("Starting recipe keeper...");

    let bot = Bot::from_env();

    let mut book = RecipeBook::new(store::store_from_env());
    match book.load().await {
        Ok(()) => log::info!("Loaded {} recipes", book.len()),
        Err(e) => log::error!("Error fetching recipes: {}", e),
    }

    let handler = Update::filter_message()
        .enter_dialogue::<Message, InMemStorage<State>, State>()
        .branch(
            teloxide::filter_command::<Command, _>()
                .branch(dptree::case![Command::Help].endpoint(help))
                .branch(dptree::case![Command::List].endpoint(list_recipes))
                .branch(dptree::case![Command::Add].endpoint(start_add))
                .branch(dptree::case![Command::Show(id)].endpoint(show_recipe))
                .branch(dptree::case![Command::Edit(id)].endpoint(start_edit))
                .branch(dptree::case![Command::Delete(id)].endpoint(delete_recipe))
                .branch(dptree::case![Command::Random].endpoint(random_recipe))
                .branch(dptree::case![Command::Cancel].endpoint(cancel)),
        )
        .branch(dptree::case![State::AddName].endpoint(add_name))
        .branch(dptree::case![State::AddIngredients { name }].endpoint(add_ingredients))
        .branch(dptree::case![State::AddSteps { name, ingredients }].endpoint(add_steps))
        .branch(dptree::case![State::AddImage { name, ingredients, steps }].endpoint(add_image))
        .branch(dptree::case![State::EditName { current }].endpoint(edit_name))
        .branch(dptree::case![State::EditIngredients { current, name }].endpoint(edit_ingredients))
        .branch(dptree::case![State::EditSteps { current, name, ingredients }].endpoint(edit_steps))
        .branch(
            dptree::case![State::EditImage { current, name, ingredients, steps }]
                .endpoint(edit_image),
        );

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![
            Arc::new(Mutex::new(book)),
            InMemStorage::<State>::new()
        ])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}

async fn send_card(bot: &Bot, chat_id: ChatId, recipe: &Recipe) -> HandlerResult {
    let text = card::card_text(recipe);
    match recipe.image_url().and_then(|raw| url::Url::parse(raw).ok()) {
        Some(image) => {
            bot.send_photo(chat_id, InputFile::url(image))
                .caption(text)
                .parse_mode(ParseMode::MarkdownV2)
                .await?;
        }
        None => {
            bot.send_message(chat_id, text)
                .parse_mode(ParseMode::MarkdownV2)
                .await?;
        }
    }
    Ok(())
}

async fn send_all_cards(bot: &Bot, chat_id: ChatId, book: &RecipeBook) -> HandlerResult {
    if book.is_empty() {
        bot.send_message(chat_id, "No recipes saved yet. Add one with /add.")
            .await?;
        return Ok(());
    }
    for recipe in book.recipes() {
        send_card(bot, chat_id, recipe).await?;
    }
    Ok(())
}

async fn help(bot: Bot, msg: Message) -> HandlerResult {
    bot.send_message(msg.chat.id, Command::descriptions().to_string())
        .await?;
    Ok(())
}

async fn list_recipes(bot: Bot, book: SharedBook, msg: Message) -> HandlerResult {
    let book = book.lock().await;
    send_all_cards(&bot, msg.chat.id, &book).await
}

async fn show_recipe(bot: Bot, book: SharedBook, id: i64, msg: Message) -> HandlerResult {
    let book = book.lock().await;
    match book.fetch(id).await {
        Ok(recipe) => send_card(&bot, msg.chat.id, &recipe).await?,
        Err(e) => log::error!("Error fetching recipe {}: {}", id, e),
    }
    Ok(())
}

async fn random_recipe(bot: Bot, book: SharedBook, msg: Message) -> HandlerResult {
    let book = book.lock().await;
    match book.random() {
        Some(recipe) => send_card(&bot, msg.chat.id, recipe).await?,
        None => {
            bot.send_message(msg.chat.id, "No recipes saved yet. Add one with /add.")
                .await?;
        }
    }
    Ok(())
}

async fn cancel(bot: Bot, dialogue: MyDialogue, msg: Message) -> HandlerResult {
    dialogue.update(State::Start).await?;
    bot.send_message(msg.chat.id, "Form closed, nothing was saved.")
        .await?;
    Ok(())
}

async fn start_add(bot: Bot, dialogue: MyDialogue, msg: Message) -> HandlerResult {
    bot.send_message(msg.chat.id, "What is the recipe called?")
        .await?;
    dialogue.update(State::AddName).await?;
    Ok(())
}

async fn add_name(bot: Bot, dialogue: MyDialogue, msg: Message) -> HandlerResult {
    let name = match msg.text() {
        Some(text) => text.to_string(),
        None => {
            bot.send_message(msg.chat.id, "Please answer with text.")
                .await?;
            return Ok(());
        }
    };
    bot.send_message(msg.chat.id, "Which ingredients go in it?")
        .await?;
    dialogue.update(State::AddIngredients { name }).await?;
    Ok(())
}

async fn add_ingredients(
    bot: Bot,
    dialogue: MyDialogue,
    name: String,
    msg: Message,
) -> HandlerResult {
    let ingredients = match msg.text() {
        Some(text) => text.to_string(),
        None => {
            bot.send_message(msg.chat.id, "Please answer with text.")
                .await?;
            return Ok(());
        }
    };
    bot.send_message(msg.chat.id, "How is it prepared?").await?;
    dialogue
        .update(State::AddSteps { name, ingredients })
        .await?;
    Ok(())
}

async fn add_steps(
    bot: Bot,
    dialogue: MyDialogue,
    (name, ingredients): (String, String),
    msg: Message,
) -> HandlerResult {
    let steps = match msg.text() {
        Some(text) => text.to_string(),
        None => {
            bot.send_message(msg.chat.id, "Please answer with text.")
                .await?;
            return Ok(());
        }
    };
    bot.send_message(
        msg.chat.id,
        "Send an image URL for the recipe, or /skip for none.",
    )
    .await?;
    dialogue
        .update(State::AddImage {
            name,
            ingredients,
            steps,
        })
        .await?;
    Ok(())
}

async fn add_image(
    bot: Bot,
    dialogue: MyDialogue,
    book: SharedBook,
    (name, ingredients, steps): (String, String, String),
    msg: Message,
) -> HandlerResult {
    let image = match msg.text() {
        Some("/skip") => None,
        Some(text) => Some(text.to_string()),
        None => {
            bot.send_message(msg.chat.id, "Please answer with text, or /skip.")
                .await?;
            return Ok(());
        }
    };

    let draft = RecipeDraft {
        name,
        ingredients,
        steps,
        image,
    };
    let mut book = book.lock().await;
    match book.create(&draft).await {
        Ok(created) => {
            // The form resets only once the store accepted the recipe.
            dialogue.update(State::Start).await?;
            send_card(&bot, msg.chat.id, &created).await?;
        }
        Err(e) => log::error!("Error adding recipe {}: {}", draft.name, e),
    }
    Ok(())
}

async fn start_edit(
    bot: Bot,
    dialogue: MyDialogue,
    book: SharedBook,
    id: i64,
    msg: Message,
) -> HandlerResult {
    let current = { book.lock().await.get(id).cloned() };
    let current = match current {
        Some(recipe) => recipe,
        None => {
            bot.send_message(msg.chat.id, format!("No recipe with id {}.", id))
                .await?;
            return Ok(());
        }
    };
    bot.send_message(
        msg.chat.id,
        format!(
            "Editing \"{}\". Send a new name, or /keep to keep it.",
            current.name
        ),
    )
    .await?;
    dialogue.update(State::EditName { current }).await?;
    Ok(())
}

async fn edit_name(bot: Bot, dialogue: MyDialogue, current: Recipe, msg: Message) -> HandlerResult {
    let name = match msg.text() {
        Some("/keep") => current.name.clone(),
        Some(text) => text.to_string(),
        None => {
            bot.send_message(msg.chat.id, "Please answer with text, or /keep.")
                .await?;
            return Ok(());
        }
    };
    bot.send_message(
        msg.chat.id,
        format!(
            "Current ingredients: {}\nSend new ingredients, or /keep.",
            current.ingredients
        ),
    )
    .await?;
    dialogue
        .update(State::EditIngredients { current, name })
        .await?;
    Ok(())
}

async fn edit_ingredients(
    bot: Bot,
    dialogue: MyDialogue,
    (current, name): (Recipe, String),
    msg: Message,
) -> HandlerResult {
    let ingredients = match msg.text() {
        Some("/keep") => current.ingredients.clone(),
        Some(text) => text.to_string(),
        None => {
            bot.send_message(msg.chat.id, "Please answer with text, or /keep.")
                .await?;
            return Ok(());
        }
    };
    bot.send_message(
        msg.chat.id,
        format!("Current steps: {}\nSend new steps, or /keep.", current.steps),
    )
    .await?;
    dialogue
        .update(State::EditSteps {
            current,
            name,
            ingredients,
        })
        .await?;
    Ok(())
}

async fn edit_steps(
    bot: Bot,
    dialogue: MyDialogue,
    (current, name, ingredients): (Recipe, String, String),
    msg: Message,
) -> HandlerResult {
    let steps = match msg.text() {
        Some("/keep") => current.steps.clone(),
        Some(text) => text.to_string(),
        None => {
            bot.send_message(msg.chat.id, "Please answer with text, or /keep.")
                .await?;
            return Ok(());
        }
    };
    let image_note = match current.image_url() {
        Some(url) => format!(
            "Current image: {}\nSend a new URL, /keep, or /skip for none.",
            url
        ),
        None => "No image yet. Send a URL, or /skip for none.".to_string(),
    };
    bot.send_message(msg.chat.id, image_note).await?;
    dialogue
        .update(State::EditImage {
            current,
            name,
            ingredients,
            steps,
        })
        .await?;
    Ok(())
}

async fn edit_image(
    bot: Bot,
    dialogue: MyDialogue,
    book: SharedBook,
    (current, name, ingredients, steps): (Recipe, String, String, String),
    msg: Message,
) -> HandlerResult {
    let image = match msg.text() {
        Some("/keep") => current.image.clone(),
        Some("/skip") => None,
        Some(text) => Some(text.to_string()),
        None => {
            bot.send_message(msg.chat.id, "Please answer with text, /keep or /skip.")
                .await?;
            return Ok(());
        }
    };
    let id = match current.id {
        Some(id) => id,
        None => {
            log::error!("Recipe under edit lost its id, dropping the form");
            dialogue.update(State::Start).await?;
            return Ok(());
        }
    };

    let draft = RecipeDraft {
        name,
        ingredients,
        steps,
        image,
    };
    let mut book = book.lock().await;
    match book.update(id, &draft).await {
        Ok(_) => {
            dialogue.update(State::Start).await?;
            send_all_cards(&bot, msg.chat.id, &book).await?;
        }
        // The form stays open so the entered values are not lost.
        Err(e) => log::error!("Error updating recipe {}: {}", id, e),
    }
    Ok(())
}

async fn delete_recipe(bot: Bot, book: SharedBook, id: i64, msg: Message) -> HandlerResult {
    let mut book = book.lock().await;
    match book.delete(id).await {
        Ok(()) => {
            bot.send_message(msg.chat.id, format!("Deleted recipe {}.", id))
                .await?;
            send_all_cards(&bot, msg.chat.id, &book).await?;
        }
        Err(e) => log::error!("Error deleting recipe {}: {}", id, e),
    }
    Ok(())
}
