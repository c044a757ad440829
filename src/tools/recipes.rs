//! Recipe tools
//!
//! Creating, listing, showing, renaming and deleting recipes.

use serde::{Deserialize, Serialize};

use super::ingredients::resolve_for_use;
use super::{ToolError, ToolResult};
use crate::db::Database;
use crate::lookup::FoodLookup;
use crate::models::{Nutrition, Recipe, RecipeIngredient, RecipeNutrition};
use crate::nutrition::calculator::line_nutrition;
use crate::resolve::IngredientStore;
use crate::nutrition::{
    parse_serving, recipe_nutrition, recipe_nutrition_per_serving, servings_display,
};

/// One ingredient line of a new recipe
#[derive(Debug, Clone, Deserialize)]
pub struct RecipeLineInput {
    /// Ingredient name; resolved against the store, then the lookup
    pub ingredient: String,
    /// Servings ("2", "0.5") or weight ("150g", "5oz")
    pub amount: String,
    /// 1-based candidate number if the name is ambiguous
    #[serde(default)]
    pub choice: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateRecipeInput {
    pub name: String,
    /// Servings the recipe yields; defaults to 1
    #[serde(default)]
    pub servings: Option<f64>,
    pub ingredients: Vec<RecipeLineInput>,
}

#[derive(Debug, Serialize)]
pub struct RecipeLineDetail {
    pub name: String,
    pub amount: String,
    pub servings: f64,
    pub weight_grams: Option<f64>,
    pub nutrition: Nutrition,
}

/// Full recipe with computed nutrition
#[derive(Debug, Serialize)]
pub struct RecipeDetail {
    pub name: String,
    pub servings: f64,
    pub ingredients: Vec<RecipeLineDetail>,
    pub total: RecipeNutrition,
    pub per_serving: RecipeNutrition,
}

#[derive(Debug, Serialize)]
pub struct RecipeSummary {
    pub name: String,
    pub servings: f64,
    pub ingredient_count: usize,
    pub calories_per_serving: f64,
}

#[derive(Debug, Serialize)]
pub struct ListRecipesResponse {
    pub recipes: Vec<RecipeSummary>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct RenameRecipeResponse {
    pub old_name: String,
    pub new_name: String,
}

#[derive(Debug, Serialize)]
pub struct DeleteRecipeResponse {
    pub deleted: String,
}

fn line_amount(line: &RecipeIngredient) -> String {
    match (line.weight_grams, line.ingredient.weight_basis()) {
        (Some(grams), Some(_)) => format!("{}g", grams),
        _ => servings_display(line.servings),
    }
}

impl From<&Recipe> for RecipeDetail {
    fn from(recipe: &Recipe) -> Self {
        let ingredients = recipe
            .ingredients
            .iter()
            .map(|line| RecipeLineDetail {
                name: line.ingredient.name.clone(),
                amount: line_amount(line),
                servings: line.servings,
                weight_grams: line.weight_grams,
                nutrition: line_nutrition(line),
            })
            .collect();

        RecipeDetail {
            name: recipe.name.clone(),
            servings: recipe.servings,
            ingredients,
            total: recipe_nutrition(recipe),
            per_serving: recipe_nutrition_per_serving(recipe),
        }
    }
}

fn get_or_not_found(db: &Database, name: &str) -> ToolResult<Recipe> {
    db.with_conn(|conn| Recipe::get_by_name(conn, name))?
        .ok_or_else(|| ToolError::NotFound(format!("Recipe '{}' not found", name.trim())))
}

// ============================================================================
// Recipe Tools
// ============================================================================

/// Create a recipe, resolving each ingredient by name.
///
/// Ingredients that come from the lookup are stored along with the recipe.
/// A looked-up ingredient whose name already belongs to a stored one is
/// rejected, since the stored record would silently replace it.
pub fn create_recipe(
    db: &Database,
    lookup: &dyn FoodLookup,
    input: CreateRecipeInput,
) -> ToolResult<RecipeDetail> {
    let name = input.name.trim();
    if name.is_empty() {
        return Err(ToolError::Invalid("Recipe name cannot be empty".to_string()));
    }
    if db.with_conn(|conn| Recipe::get_by_name(conn, name))?.is_some() {
        return Err(ToolError::AlreadyExists(format!("Recipe '{}' already exists", name)));
    }

    let mut lines = Vec::with_capacity(input.ingredients.len());
    for line in &input.ingredients {
        let ingredient = resolve_for_use(db, lookup, &line.ingredient, line.choice)?;
        if !ingredient.store_id.is_stored()
            && db.get_ingredient(&ingredient.name)?.is_some()
        {
            return Err(ToolError::AlreadyExists(format!(
                "'{}' from the lookup has the same name as a stored ingredient; \
                 use the stored one by name or pick another match",
                ingredient.name
            )));
        }
        let amount = parse_serving(&line.amount, &ingredient).map_err(|e| {
            ToolError::Invalid(format!("{}: {}", ingredient.name, e))
        })?;
        lines.push(RecipeIngredient::from_amount(ingredient, &amount));
    }

    let recipe = Recipe::new(name, input.servings.unwrap_or(1.0), lines);
    recipe.validate().map_err(ToolError::Invalid)?;

    let saved = db.with_conn_mut(|conn| Recipe::save(conn, &recipe))?;
    tracing::info!(
        "Created recipe '{}' with {} ingredients",
        saved.name,
        saved.ingredients.len()
    );

    Ok(RecipeDetail::from(&saved))
}

/// All recipes with per-serving calories
pub fn list_recipes(db: &Database) -> ToolResult<ListRecipesResponse> {
    let recipes: Vec<RecipeSummary> = db
        .with_conn(Recipe::list_all)?
        .iter()
        .map(|recipe| RecipeSummary {
            name: recipe.name.clone(),
            servings: recipe.servings,
            ingredient_count: recipe.ingredients.len(),
            calories_per_serving: recipe_nutrition_per_serving(recipe).total_calories,
        })
        .collect();

    Ok(ListRecipesResponse {
        count: recipes.len(),
        recipes,
    })
}

/// A recipe with its lines and nutrition
pub fn show_recipe(db: &Database, name: &str) -> ToolResult<RecipeDetail> {
    let recipe = get_or_not_found(db, name)?;
    Ok(RecipeDetail::from(&recipe))
}

/// Rename a recipe; the new name must be free
pub fn rename_recipe(db: &Database, old_name: &str, new_name: &str) -> ToolResult<RenameRecipeResponse> {
    let new_name = new_name.trim();
    if new_name.is_empty() {
        return Err(ToolError::Invalid("New recipe name cannot be empty".to_string()));
    }

    let recipe = get_or_not_found(db, old_name)?;

    // Changing only the case of the same recipe is allowed
    if let Some(existing) = db.with_conn(|conn| Recipe::get_by_name(conn, new_name))? {
        if existing.store_id != recipe.store_id {
            return Err(ToolError::AlreadyExists(format!(
                "Recipe '{}' already exists",
                existing.name
            )));
        }
    }

    if !db.with_conn(|conn| Recipe::rename(conn, &recipe.name, new_name))? {
        return Err(ToolError::NotFound(format!("Recipe '{}' not found", old_name.trim())));
    }
    tracing::info!("Renamed recipe '{}' to '{}'", recipe.name, new_name);

    Ok(RenameRecipeResponse {
        old_name: recipe.name,
        new_name: new_name.to_string(),
    })
}

/// Delete a recipe. Journal entries made from it are kept.
pub fn delete_recipe(db: &Database, name: &str) -> ToolResult<DeleteRecipeResponse> {
    let recipe = get_or_not_found(db, name)?;
    db.with_conn(|conn| Recipe::delete(conn, &recipe.name))?;
    tracing::info!("Deleted recipe '{}'", recipe.name);

    Ok(DeleteRecipeResponse {
        deleted: recipe.name,
    })
}
