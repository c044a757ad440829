//! Command-line front end for the Macro Util database
//!
//! Usage:
//! ```bash
//! macro-cli list
//! macro-cli show "Omelette"
//! macro-cli rename "Omelette" "Cheese Omelette"
//! macro-cli delete "Cheese Omelette"
//! macro-cli summary yesterday
//! macro-cli reset-journal 2025-01-09 --yes
//! macro-cli ingredients --query oat
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use macro_util::config::Config;
use macro_util::db::Database;
use macro_util::models::MacroSummary;
use macro_util::tools::recipes::RecipeDetail;
use macro_util::tools::{ingredients, journal, recipes, ToolError};

#[derive(Parser)]
#[command(
    name = "macro-cli",
    version,
    about = "Inspect and maintain Macro Util recipes and journals"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Database path override
    #[arg(long, global = true, env = "MACRO_UTIL_DATABASE_PATH")]
    database: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, short = 'v', global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// List all recipes
    List,
    /// Show a recipe with its nutrition
    Show { recipe: String },
    /// Rename a recipe
    Rename { old_name: String, new_name: String },
    /// Delete a recipe (journal entries are kept)
    Delete { recipe: String },
    /// Show journal entries and totals (YYYY-MM-DD, today, yesterday)
    Summary { date: Option<String> },
    /// Delete every journal entry for a date
    ResetJournal {
        date: String,
        /// Confirm the reset
        #[arg(long)]
        yes: bool,
    },
    /// List stored ingredients
    Ingredients {
        /// Name fragment to filter by
        #[arg(long, short)]
        query: Option<String>,
        #[arg(long, default_value_t = 100)]
        limit: i64,
    },
}

fn print_totals(totals: &MacroSummary) {
    println!("Calories: {:.1}", totals.total_calories);
    println!(
        "Protein: {:.1}g ({:.1}% of calories)",
        totals.total_protein, totals.protein_percentage
    );
    println!("Fat: {:.1}g ({:.1}% of calories)", totals.total_fat, totals.fat_percentage);
    println!(
        "Carbs: {:.1}g ({:.1}% of calories)",
        totals.total_carbs, totals.carbs_percentage
    );
}

fn print_recipe(recipe: &RecipeDetail) {
    println!("\n=== Recipe: {} ===", recipe.name);
    println!("Yields {} servings", recipe.servings);
    println!("\nIngredients:");
    for line in &recipe.ingredients {
        println!(
            "  - {}: {} = {:.1} cal, {:.1}g protein, {:.1}g fat, {:.1}g carbs",
            line.name,
            line.amount,
            line.nutrition.calories,
            line.nutrition.protein,
            line.nutrition.fat,
            line.nutrition.carbs
        );
    }

    println!("\n=== Total Nutrition ===");
    print_totals(&recipe.total);
    println!("\n=== Per Serving ===");
    print_totals(&recipe.per_serving);
}

fn run(cli: Cli, db: &Database) -> Result<(), ToolError> {
    match cli.command {
        Command::List => {
            let list = recipes::list_recipes(db)?;
            if list.recipes.is_empty() {
                println!("No recipes found.");
                return Ok(());
            }
            println!("Available recipes:");
            for recipe in &list.recipes {
                println!(
                    "  - {} ({} ingredients, {} servings, {:.0} cal per serving)",
                    recipe.name, recipe.ingredient_count, recipe.servings, recipe.calories_per_serving
                );
            }
        }
        Command::Show { recipe } => {
            print_recipe(&recipes::show_recipe(db, &recipe)?);
        }
        Command::Rename { old_name, new_name } => {
            let renamed = recipes::rename_recipe(db, &old_name, &new_name)?;
            println!("Recipe renamed from '{}' to '{}'.", renamed.old_name, renamed.new_name);
        }
        Command::Delete { recipe } => {
            let deleted = recipes::delete_recipe(db, &recipe)?;
            println!("Recipe '{}' deleted.", deleted.deleted);
        }
        Command::Summary { date } => {
            let summary = journal::get_journal_summary(db, date.as_deref())?;
            if summary.entries.is_empty() {
                println!("No journal entries found for {}.", summary.date);
                return Ok(());
            }
            println!("Journal entries for {}:", summary.date);
            for entry in &summary.entries {
                println!(
                    "  - {} ({} servings, {:.0} cal)",
                    entry.name, entry.servings, entry.nutrition.calories
                );
            }
            println!("\n=== Day Summary for {} ===", summary.date);
            print_totals(&summary.totals);
        }
        Command::ResetJournal { date, yes } => {
            let summary = journal::get_journal_summary(db, Some(&date))?;
            if !yes {
                println!(
                    "{} has {} entries ({:.0} cal). Re-run with --yes to reset it.",
                    summary.date,
                    summary.entries.len(),
                    summary.totals.total_calories
                );
                return Ok(());
            }
            let reset = journal::reset_journal(db, Some(&summary.date))?;
            if reset.reset {
                println!("Journal for {} has been reset to empty.", reset.date);
            } else {
                println!("No journal found for {}.", reset.date);
            }
        }
        Command::Ingredients { query, limit } => {
            let list = ingredients::list_ingredients(db, query.as_deref(), limit, 0)?;
            if list.ingredients.is_empty() {
                println!("No ingredients found.");
                return Ok(());
            }
            for item in &list.ingredients {
                let weight = item
                    .serving_weight_grams
                    .map(|w| format!(", {}g", w))
                    .unwrap_or_default();
                println!(
                    "  - {} ({} {}{}): {:.0} cal, {:.1}g protein, {:.1}g fat, {:.1}g carbs",
                    item.name,
                    item.serving_size,
                    item.serving_unit,
                    weight,
                    item.nutrition.calories,
                    item.nutrition.protein,
                    item.nutrition.fat,
                    item.nutrition.carbs
                );
            }
            println!("{} of {} ingredients", list.ingredients.len(), list.total);
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let directive = if cli.verbose { "macro_util=debug" } else { "macro_util=warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive)),
        )
        .with_writer(std::io::stderr)
        .init();

    let db_path = cli
        .database
        .clone()
        .unwrap_or_else(|| Config::from_env().database_path);

    if let Some(parent) = db_path.parent() {
        if let Err(e) = std::fs::create_dir_all(parent) {
            eprintln!("Cannot create {}: {}", parent.display(), e);
            return ExitCode::FAILURE;
        }
    }

    let db = match Database::open(&db_path) {
        Ok(db) => db,
        Err(e) => {
            eprintln!("Cannot open database {}: {}", db_path.display(), e);
            return ExitCode::FAILURE;
        }
    };

    match run(cli, &db) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}
