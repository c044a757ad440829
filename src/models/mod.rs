//! Data models
//!
//! Rust structs representing stored entities and their SQL.

mod ingredient;
mod journal;
mod nutrition;
mod recipe;
mod recipe_ingredient;

pub use ingredient::{Ingredient, StoreId};
pub use journal::{EntryType, FoodJournal, JournalDate, JournalEntry, DATE_FORMAT};
pub use nutrition::{DayNutrition, MacroSummary, Nutrition, RecipeNutrition};
pub use recipe::Recipe;
pub use recipe_ingredient::RecipeIngredient;
