//! Ingredient tools
//!
//! Manual entry, lookup-backed resolution, customization and serving
//! previews.

use serde::{Deserialize, Serialize};

use super::{ToolError, ToolResult};
use crate::db::Database;
use crate::lookup::FoodLookup;
use crate::models::{Ingredient, Nutrition};
use crate::nutrition::{customize, parse_serving, IngredientEdit};
use crate::resolve::{self, Resolution, Selection};

/// Fields for a manually entered ingredient
#[derive(Debug, Clone, Deserialize)]
pub struct IngredientInput {
    pub name: String,
    pub serving_size: f64,
    pub serving_unit: String,
    pub serving_weight_grams: Option<f64>,
    pub calories: f64,
    pub protein: f64,
    pub fat: f64,
    pub carbs: f64,
}

impl From<IngredientInput> for Ingredient {
    fn from(input: IngredientInput) -> Self {
        Ingredient::new(
            input.name.trim(),
            input.serving_size,
            input.serving_unit.trim(),
            input.serving_weight_grams,
            Nutrition {
                calories: input.calories,
                protein: input.protein,
                fat: input.fat,
                carbs: input.carbs,
            },
        )
    }
}

/// Ingredient plus the recipes that use it
#[derive(Debug, Serialize)]
pub struct IngredientDetail {
    #[serde(flatten)]
    pub ingredient: Ingredient,
    pub used_in_recipes: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ListIngredientsResponse {
    pub ingredients: Vec<Ingredient>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

/// A numbered candidate for disambiguation
#[derive(Debug, Serialize)]
pub struct Candidate {
    pub number: usize,
    pub incomplete: bool,
    #[serde(flatten)]
    pub ingredient: Ingredient,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub candidates: Vec<Candidate>,
}

/// Where a resolved ingredient came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    Store,
    Lookup,
}

/// Result of the resolve flow
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ResolveOutcome {
    Resolved {
        ingredient: Ingredient,
        source: Source,
        saved: bool,
    },
    /// Call again with `choice` set to a candidate number, or to
    /// `none_of_these` to search under a different name
    Choose {
        query: String,
        candidates: Vec<Candidate>,
        none_of_these: usize,
    },
    RetrySearch {
        message: String,
    },
}

#[derive(Debug, Serialize)]
pub struct CustomizeResponse {
    pub base: String,
    pub ingredient: Ingredient,
    pub saved: bool,
}

#[derive(Debug, Serialize)]
pub struct ParseServingResponse {
    pub ingredient: String,
    pub servings: f64,
    pub grams: Option<f64>,
    pub display_text: String,
    pub nutrition: Nutrition,
}

fn numbered(candidates: Vec<Ingredient>) -> Vec<Candidate> {
    candidates
        .into_iter()
        .enumerate()
        .map(|(i, ingredient)| Candidate {
            number: i + 1,
            incomplete: ingredient.is_incomplete(),
            ingredient,
        })
        .collect()
}

fn stored_or_not_found(db: &Database, name: &str) -> ToolResult<Ingredient> {
    db.with_conn(|conn| Ingredient::get_by_name(conn, name))?
        .ok_or_else(|| ToolError::NotFound(format!("Ingredient '{}' not found", name.trim())))
}

/// Store a new ingredient under a name that must be free
fn save_new(db: &Database, ingredient: &Ingredient) -> ToolResult<Ingredient> {
    resolve::persist(ingredient, db)?.ok_or_else(|| {
        ToolError::AlreadyExists(format!(
            "Ingredient '{}' already exists",
            ingredient.name.trim()
        ))
    })
}

// ============================================================================
// Ingredient Tools
// ============================================================================

/// Store a manually entered ingredient
pub fn create_custom_ingredient(db: &Database, input: IngredientInput) -> ToolResult<Ingredient> {
    let ingredient = Ingredient::from(input);
    ingredient.validate().map_err(ToolError::Invalid)?;
    save_new(db, &ingredient)
}

/// Get a stored ingredient by name
pub fn get_ingredient(db: &Database, name: &str) -> ToolResult<IngredientDetail> {
    let ingredient = stored_or_not_found(db, name)?;
    let used_in_recipes = match ingredient.store_id.id() {
        Some(id) => db.with_conn(|conn| Ingredient::get_used_in_recipes(conn, id))?,
        None => Vec::new(),
    };

    Ok(IngredientDetail {
        ingredient,
        used_in_recipes,
    })
}

/// List stored ingredients
pub fn list_ingredients(
    db: &Database,
    query: Option<&str>,
    limit: i64,
    offset: i64,
) -> ToolResult<ListIngredientsResponse> {
    let limit = limit.clamp(1, 500);
    let offset = offset.max(0);

    let ingredients = db.with_conn(|conn| Ingredient::list(conn, query, limit, offset))?;
    let total = db.with_conn(Ingredient::count)?;

    Ok(ListIngredientsResponse {
        ingredients,
        total,
        limit,
        offset,
    })
}

/// Raw lookup candidates for a query, without touching the store
pub fn search_ingredient(lookup: &dyn FoodLookup, query: &str) -> ToolResult<SearchResponse> {
    let query = query.trim();
    if query.is_empty() {
        return Err(ToolError::Invalid("Search query cannot be empty".to_string()));
    }

    Ok(SearchResponse {
        query: query.to_string(),
        candidates: numbered(lookup.search_candidates(query)),
    })
}

/// Resolve a name to an ingredient: store first, then lookup.
///
/// `choice` is a 1-based candidate number for an ambiguous result, with
/// `count + 1` meaning none of these. When `save` is set a looked-up
/// ingredient is stored so later calls find it directly.
pub fn resolve_ingredient(
    db: &Database,
    lookup: &dyn FoodLookup,
    name: &str,
    choice: Option<usize>,
    save: bool,
) -> ToolResult<ResolveOutcome> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ToolError::Invalid("Ingredient name cannot be empty".to_string()));
    }

    let from_lookup = |ingredient: Ingredient| -> ToolResult<ResolveOutcome> {
        let stored = if save {
            resolve::persist(&ingredient, db)?
        } else {
            None
        };
        Ok(ResolveOutcome::Resolved {
            saved: stored.is_some(),
            ingredient: stored.unwrap_or(ingredient),
            source: Source::Lookup,
        })
    };

    match resolve::resolve_ingredient(name, lookup, db)? {
        Resolution::Stored(ingredient) => Ok(ResolveOutcome::Resolved {
            ingredient,
            source: Source::Store,
            saved: true,
        }),
        Resolution::Resolved(ingredient) => from_lookup(ingredient),
        Resolution::NotFound => Err(ToolError::NotFound(format!(
            "No ingredient or lookup match for '{}'",
            name
        ))),
        Resolution::Ambiguous(candidates) => match choice {
            None => Ok(ResolveOutcome::Choose {
                query: name.to_string(),
                none_of_these: candidates.len() + 1,
                candidates: numbered(candidates),
            }),
            Some(number) => match resolve::choose_by_number(&candidates, number, lookup) {
                Selection::Resolved(ingredient) => from_lookup(ingredient),
                Selection::RetrySearch => Ok(ResolveOutcome::RetrySearch {
                    message: format!(
                        "None of the matches for '{}' fit; try a different name",
                        name
                    ),
                }),
                Selection::Invalid(reason) => Err(ToolError::Invalid(reason)),
            },
        },
    }
}

/// Resolve a name for immediate use by another tool. Anything short of a
/// single resolved ingredient is reported as an error telling the caller
/// how to proceed.
pub fn resolve_for_use(
    db: &Database,
    lookup: &dyn FoodLookup,
    name: &str,
    choice: Option<usize>,
) -> ToolResult<Ingredient> {
    match resolve_ingredient(db, lookup, name, choice, false)? {
        ResolveOutcome::Resolved { ingredient, .. } => Ok(ingredient),
        ResolveOutcome::Choose { candidates, none_of_these, .. } => {
            let names: Vec<String> = candidates
                .iter()
                .map(|c| format!("{}. {}", c.number, c.ingredient.name))
                .collect();
            Err(ToolError::Invalid(format!(
                "'{}' matched several foods: {}; pass choice (or {} for none of these)",
                name.trim(),
                names.join(", "),
                none_of_these
            )))
        }
        ResolveOutcome::RetrySearch { message } => Err(ToolError::NotFound(message)),
    }
}

/// Derive a new ingredient from a stored one, optionally saving it
pub fn customize_ingredient(
    db: &Database,
    base_name: &str,
    edit: &IngredientEdit,
    save: bool,
) -> ToolResult<CustomizeResponse> {
    let base = stored_or_not_found(db, base_name)?;
    let custom = customize(&base, edit).map_err(ToolError::Invalid)?;

    let (ingredient, saved) = if save {
        (save_new(db, &custom)?, true)
    } else {
        (custom, false)
    };

    Ok(CustomizeResponse {
        base: base.name,
        ingredient,
        saved,
    })
}

/// Interpret a serving amount for a stored ingredient and preview the
/// nutrition it would contribute
pub fn parse_serving_amount(
    db: &Database,
    ingredient_name: &str,
    amount: &str,
) -> ToolResult<ParseServingResponse> {
    let ingredient = stored_or_not_found(db, ingredient_name)?;
    let parsed = parse_serving(amount, &ingredient)?;

    Ok(ParseServingResponse {
        nutrition: ingredient.nutrition.scale(parsed.servings),
        ingredient: ingredient.name,
        servings: parsed.servings,
        grams: parsed.grams,
        display_text: parsed.display_text,
    })
}
