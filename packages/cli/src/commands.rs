//! One function per subcommand. Input is validated here, at the edge; the
//! repositories store whatever they are given.

use anyhow::{bail, Result};
use auth::{Credentials, SignUpData};
use clap::Args;
use store::{MadeEntry, MadeEntryInput, Recipe, RecipeInput};
use sync::{SyncOutcome, SyncStatus};

use crate::app::App;

#[derive(Args)]
pub(crate) struct RecipeArgs {
    #[arg(long)]
    title: String,
    #[arg(long)]
    category: String,
    /// Minutes
    #[arg(long)]
    cook_time: u32,
    #[arg(long)]
    servings: u32,
    #[arg(long, default_value = "")]
    description: String,
    #[arg(long, value_name = "URL")]
    image: Option<String>,
    /// Repeat once per ingredient
    #[arg(long = "ingredient")]
    ingredients: Vec<String>,
    /// Repeat once per step, in order
    #[arg(long = "instruction")]
    instructions: Vec<String>,
}

impl From<RecipeArgs> for RecipeInput {
    fn from(args: RecipeArgs) -> Self {
        RecipeInput {
            title: args.title,
            description: args.description,
            image: args.image,
            category: args.category,
            cook_time: args.cook_time,
            servings: args.servings,
            ingredients: args.ingredients,
            instructions: args.instructions,
        }
    }
}

#[derive(Args)]
pub(crate) struct MadeArgs {
    recipe_id: String,
    /// 1 to 5
    #[arg(long)]
    grade: u8,
    #[arg(long)]
    cost: Option<f64>,
    /// Actual cook time in minutes
    #[arg(long)]
    time: Option<u32>,
    #[arg(long)]
    parts: Option<u32>,
    #[arg(long)]
    comment: Option<String>,
}

#[derive(Args)]
pub(crate) struct SignUpArgs {
    #[arg(long)]
    email: String,
    #[arg(long)]
    password: String,
    #[arg(long)]
    pseudo: String,
    #[arg(long, default_value = "")]
    first_name: String,
    #[arg(long, default_value = "")]
    last_name: String,
}

fn pending(synced: bool) -> &'static str {
    if synced {
        ""
    } else {
        "  [pending]"
    }
}

fn print_recipe_line(recipe: &Recipe) {
    println!(
        "{}  {} ({}, {} min, serves {}){}",
        recipe.id,
        recipe.title,
        recipe.category,
        recipe.cook_time,
        recipe.servings,
        pending(recipe.synced)
    );
}

fn print_entry_line(entry: &MadeEntry) {
    let mut details = vec![format!("grade {}/5", entry.grade)];
    if let Some(cost) = entry.total_cost {
        details.push(format!("cost {cost:.2}"));
    }
    if let Some(minutes) = entry.actual_cook_time {
        details.push(format!("{minutes} min"));
    }
    if let Some(parts) = entry.number_of_parts {
        details.push(format!("{parts} parts"));
    }
    println!(
        "  {}  {}  {}{}",
        entry.created_at.format("%Y-%m-%d"),
        entry.id,
        details.join(", "),
        pending(entry.synced)
    );
    if let Some(comment) = &entry.comment {
        println!("      {comment}");
    }
}

pub(crate) fn list(app: &App, search: Option<&str>) -> Result<()> {
    let recipes = match search {
        Some(query) => app.recipes.search(query),
        None => app.recipes.list(),
    };
    if recipes.is_empty() {
        println!("No recipes.");
    }
    for recipe in &recipes {
        print_recipe_line(recipe);
    }
    Ok(())
}

pub(crate) fn show(app: &App, id: &str) -> Result<()> {
    let Some(recipe) = app.recipes.get(id) else {
        bail!("no recipe with id {id}");
    };
    println!("{}{}", recipe.title, pending(recipe.synced));
    println!(
        "{} | {} min | serves {}",
        recipe.category, recipe.cook_time, recipe.servings
    );
    if !recipe.description.is_empty() {
        println!("\n{}", recipe.description);
    }
    if !recipe.ingredients.is_empty() {
        println!("\nIngredients:");
        for ingredient in &recipe.ingredients {
            println!("  - {ingredient}");
        }
    }
    if !recipe.instructions.is_empty() {
        println!("\nInstructions:");
        for (step, instruction) in recipe.instructions.iter().enumerate() {
            println!("  {}. {instruction}", step + 1);
        }
    }

    let entries = app.entries.entries_for_recipe(id);
    if !entries.is_empty() {
        match app.entries.average_grade(id) {
            Some(average) => println!("\nMade {} times, average grade {average:.1}", entries.len()),
            None => println!("\nMade {} times", entries.len()),
        }
        for entry in &entries {
            print_entry_line(entry);
        }
    }
    Ok(())
}

pub(crate) fn add(app: &App, args: RecipeArgs) -> Result<()> {
    let input = RecipeInput::from(args);
    input.validate()?;
    let recipe = app.recipes.add(input)?;
    println!("Added {}", recipe.id);
    Ok(())
}

pub(crate) fn edit(app: &App, id: &str, args: RecipeArgs) -> Result<()> {
    let input = RecipeInput::from(args);
    input.validate()?;
    if !app.recipes.update(id, input)? {
        bail!("no recipe with id {id}");
    }
    println!("Updated {id}");
    Ok(())
}

pub(crate) fn delete(app: &App, id: &str) -> Result<()> {
    if app.recipes.delete(id)? {
        println!("Deleted {id}");
    } else {
        println!("No recipe with id {id}");
    }
    Ok(())
}

pub(crate) fn made(app: &App, args: MadeArgs) -> Result<()> {
    let input = MadeEntryInput {
        recipe_id: args.recipe_id,
        total_cost: args.cost,
        actual_cook_time: args.time,
        number_of_parts: args.parts,
        grade: args.grade,
        comment: args.comment,
    };
    input.validate()?;
    if app.recipes.get(&input.recipe_id).is_none() {
        tracing::warn!(recipe = %input.recipe_id, "logging an entry for an unknown recipe");
    }
    let entry = app.entries.add(input)?;
    println!("Logged {}", entry.id);
    Ok(())
}

pub(crate) fn unmake(app: &App, id: &str) -> Result<()> {
    if app.entries.delete(id)? {
        println!("Deleted entry {id}");
    } else {
        println!("No entry with id {id}");
    }
    Ok(())
}

fn describe(outcome: &SyncOutcome) -> String {
    match outcome {
        SyncOutcome::Offline => "Offline. Changes are kept locally.".to_string(),
        SyncOutcome::Busy => "A sync is already running.".to_string(),
        SyncOutcome::Clean => "Nothing to sync.".to_string(),
        SyncOutcome::Synced(_) => "All changes synced!".to_string(),
        SyncOutcome::Failed { collection, error, .. } => {
            format!("Sync of {collection} failed: {error}. Will retry when online.")
        }
    }
}

pub(crate) async fn sync(app: &App) -> Result<()> {
    let manager = app.sync_manager();
    let outcome = manager.sync_now().await;
    println!("{}", describe(&outcome));
    if let SyncOutcome::Failed { .. } = outcome {
        bail!("sync failed");
    }
    Ok(())
}

pub(crate) async fn watch(app: &App) -> Result<()> {
    let manager = app.sync_manager();
    let mut notices = manager.notices();
    let mut view = app.recipes.watch(app.config.poll_interval());
    let _sync = manager.start();

    println!("{} recipes. Watching, Ctrl-C to stop.", view.current().len());
    loop {
        tokio::select! {
            alive = view.changed() => {
                if !alive {
                    break;
                }
                let recipes = view.current();
                let dirty = recipes.iter().filter(|r| !r.synced).count();
                println!("{} recipes, {dirty} pending", recipes.len());
            }
            notice = notices.recv() => {
                if let Ok(notice) = notice {
                    println!("{}", notice.message);
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }
    Ok(())
}

pub(crate) fn status(app: &App) -> Result<()> {
    let manager = app.sync_manager();
    let status = manager.status();
    println!("Data: {}", app.store.base().display());
    println!("Online: {}", if manager.is_online() { "yes" } else { "no" });
    if manager.has_unsynced() {
        println!(
            "Pending: {} recipes, {} made entries",
            app.recipes.collection().dirty_count(),
            app.entries.collection().dirty_count()
        );
    }
    match status.label() {
        Some(label) => println!("{label}"),
        None if status == SyncStatus::UpToDate => println!("Up to date"),
        None => {}
    }
    Ok(())
}

pub(crate) fn sign_up(app: &App, args: SignUpArgs) -> Result<()> {
    let user = app.accounts.sign_up(SignUpData {
        email: args.email,
        password: args.password,
        pseudo: args.pseudo,
        first_name: args.first_name,
        last_name: args.last_name,
    })?;
    println!("Account created! Welcome, {}!", user.pseudo);
    Ok(())
}

pub(crate) fn sign_in(app: &App, email: String, password: String) -> Result<()> {
    let user = app.accounts.sign_in(Credentials { email, password })?;
    println!("Welcome back! Signed in as {}", user.pseudo);
    Ok(())
}

pub(crate) fn sign_out(app: &App) -> Result<()> {
    app.accounts.sign_out()?;
    println!("You have been signed out successfully");
    Ok(())
}

pub(crate) fn whoami(app: &App) -> Result<()> {
    match app.accounts.current_user() {
        Some(user) => println!("{} <{}> ({})", user.pseudo, user.email, user.full_name()),
        None => println!("Not signed in"),
    }
    Ok(())
}

/// Settings after the file, environment and flags were applied.
pub(crate) fn effective_config(app: &App) -> Result<String> {
    Ok(app.config.to_toml()?)
}

pub(crate) fn show_config(app: &App) -> Result<()> {
    print!("{}", effective_config(app)?);
    Ok(())
}
