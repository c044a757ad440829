//! Nutrition computation
//!
//! Serving parsing, recipe/day aggregation, and ingredient customization.

pub mod calculator;
pub mod customize;
pub mod serving;

pub use calculator::{
    calories_from_macros, day_nutrition, ingredient_entry, line_multiplier, recipe_entry,
    recipe_nutrition, recipe_nutrition_per_serving, summarize,
};
pub use customize::{customize, IngredientEdit};
pub use serving::{
    parse_serving, parse_servings_count, servings_display, ServingAmount, ServingError,
    GRAMS_PER_OUNCE,
};
