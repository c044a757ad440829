//! Macro Util MCP Server Implementation
//!
//! Implements the MCP server with all Macro Util tools.

use std::path::PathBuf;
use std::sync::Arc;

use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo,
};
use rmcp::{schemars, tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::db::Database;
use crate::lookup::FoodLookup;
use crate::nutrition::IngredientEdit;
use crate::tools::ingredients::{self, IngredientInput};
use crate::tools::journal;
use crate::tools::recipes::{self, CreateRecipeInput, RecipeLineInput};
use crate::tools::status::{StatusTracker, USAGE_INSTRUCTIONS};
use crate::tools::{ToolError, ToolResult};

/// Macro Util MCP Service
#[derive(Clone)]
pub struct MacroUtilService {
    status_tracker: Arc<Mutex<StatusTracker>>,
    database: Database,
    lookup: Arc<dyn FoodLookup>,
    tool_router: ToolRouter<MacroUtilService>,
}

impl MacroUtilService {
    pub fn new(
        database_path: PathBuf,
        database: Database,
        lookup: Arc<dyn FoodLookup>,
        lookup_enabled: bool,
    ) -> Self {
        Self {
            status_tracker: Arc::new(Mutex::new(StatusTracker::new(
                database_path,
                lookup_enabled,
            ))),
            database,
            lookup,
            tool_router: Self::tool_router(),
        }
    }

    /// Run a tool that may call the remote lookup on a blocking worker
    async fn run_blocking<T, F>(&self, f: F) -> Result<CallToolResult, McpError>
    where
        T: Serialize + Send + 'static,
        F: FnOnce(&Database, &dyn FoodLookup) -> ToolResult<T> + Send + 'static,
    {
        let database = self.database.clone();
        let lookup = Arc::clone(&self.lookup);
        let result = tokio::task::spawn_blocking(move || f(&database, lookup.as_ref()))
            .await
            .map_err(|e| McpError::internal_error(format!("Tool worker failed: {}", e), None))?;
        respond(result)
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<String, McpError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| McpError::internal_error(format!("Serialization error: {}", e), None))
}

/// Map a tool result onto the protocol. Domain failures become error tool
/// results the caller can act on; store failures are internal errors.
fn respond<T: Serialize>(result: ToolResult<T>) -> Result<CallToolResult, McpError> {
    match result {
        Ok(value) => Ok(CallToolResult::success(vec![Content::text(to_json(&value)?)])),
        Err(ToolError::Database(e)) => {
            tracing::error!("Database error: {}", e);
            Err(McpError::internal_error(format!("Database error: {}", e), None))
        }
        Err(e) => {
            let body = serde_json::json!({ "error": e.kind(), "message": e.to_string() });
            Ok(CallToolResult::error(vec![Content::text(to_json(&body)?)]))
        }
    }
}

// ============================================================================
// Ingredient Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct CreateCustomIngredientParams {
    /// Unique ingredient name
    pub name: String,
    /// Amount of one serving, e.g. 1 or 0.5
    pub serving_size: f64,
    /// Unit of one serving, e.g. "medium", "cup", "slice"
    pub serving_unit: String,
    /// Mass of one serving in grams (enables "150g" style amounts)
    pub serving_weight_grams: Option<f64>,
    pub calories: f64,
    pub protein: f64,
    pub fat: f64,
    pub carbs: f64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct IngredientNameParams {
    /// Ingredient name (case-insensitive)
    pub name: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListIngredientsParams {
    /// Optional name fragment to filter by
    pub query: Option<String>,
    #[serde(default = "default_list_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_list_limit() -> i64 { 50 }

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SearchIngredientParams {
    /// Food to search for
    pub query: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ResolveIngredientParams {
    /// Ingredient name
    pub name: String,
    /// 1-based candidate number from a previous `choose` response;
    /// candidates + 1 means none of these
    pub choice: Option<usize>,
    /// Store the ingredient if it came from the lookup
    #[serde(default)]
    pub save: bool,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct CustomizeIngredientParams {
    /// Stored ingredient to start from
    pub base_name: String,
    /// New name (required when saving)
    pub name: Option<String>,
    pub serving_size: Option<f64>,
    pub serving_unit: Option<String>,
    pub serving_weight_grams: Option<f64>,
    pub protein: Option<f64>,
    pub fat: Option<f64>,
    pub carbs: Option<f64>,
    #[serde(default)]
    pub save: bool,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ParseServingParams {
    /// Stored ingredient name
    pub ingredient: String,
    /// Servings ("2", "0.5") or weight ("150g", "5oz")
    pub amount: String,
}

// ============================================================================
// Recipe Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct RecipeLineParams {
    /// Ingredient name
    pub ingredient: String,
    /// Servings ("2", "0.5") or weight ("150g", "5oz")
    pub amount: String,
    /// 1-based candidate number if the name is ambiguous
    pub choice: Option<usize>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct CreateRecipeParams {
    /// Unique recipe name
    pub name: String,
    /// Servings the recipe yields (default 1)
    pub servings: Option<f64>,
    pub ingredients: Vec<RecipeLineParams>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct RecipeNameParams {
    /// Recipe name (case-insensitive)
    pub name: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct RenameRecipeParams {
    pub old_name: String,
    pub new_name: String,
}

// ============================================================================
// Journal Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct AddIngredientToJournalParams {
    /// Ingredient name
    pub ingredient: String,
    /// Servings ("2", "0.5") or weight ("150g", "5oz")
    #[serde(default = "default_amount")]
    pub amount: String,
    /// YYYY-MM-DD, "today" or "yesterday" (default today)
    pub date: Option<String>,
    /// 1-based candidate number if the name is ambiguous
    pub choice: Option<usize>,
    /// Store the ingredient if it came from the lookup
    #[serde(default)]
    pub save: bool,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct AddRecipeToJournalParams {
    /// Recipe name
    pub recipe: String,
    /// Number of recipe servings eaten (default 1)
    #[serde(default = "default_amount")]
    pub servings: String,
    /// YYYY-MM-DD, "today" or "yesterday" (default today)
    pub date: Option<String>,
}

fn default_amount() -> String { "1".to_string() }

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct JournalDateParams {
    /// YYYY-MM-DD, "today" or "yesterday" (default today)
    pub date: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListJournalDatesParams {
    #[serde(default = "default_dates_limit")]
    pub limit: i64,
}

fn default_dates_limit() -> i64 { 30 }

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ResetJournalParams {
    /// YYYY-MM-DD, "today" or "yesterday"; required so a reset is never implicit
    pub date: String,
}

// ============================================================================
// Tool Implementations
// ============================================================================

#[tool_router]
impl MacroUtilService {
    // --- Status ---

    #[tool(description = "Get the current status of the Macro Util service including build info, database status, stored counts, and process information")]
    async fn macro_status(&self) -> Result<CallToolResult, McpError> {
        let tracker = self.status_tracker.lock().await;
        respond(tracker.get_status(&self.database))
    }

    #[tool(description = "Get instructions for using the ingredient, recipe and journal tools. Call this when starting a session or when unsure how amounts, dates or ingredient resolution work.")]
    fn usage_instructions(&self) -> Result<CallToolResult, McpError> {
        Ok(CallToolResult::success(vec![Content::text(USAGE_INSTRUCTIONS)]))
    }

    // --- Ingredients ---

    #[tool(description = "Create an ingredient from manually entered nutrition facts (per one serving)")]
    fn create_custom_ingredient(&self, Parameters(p): Parameters<CreateCustomIngredientParams>) -> Result<CallToolResult, McpError> {
        let input = IngredientInput {
            name: p.name, serving_size: p.serving_size, serving_unit: p.serving_unit,
            serving_weight_grams: p.serving_weight_grams,
            calories: p.calories, protein: p.protein, fat: p.fat, carbs: p.carbs,
        };
        respond(ingredients::create_custom_ingredient(&self.database, input))
    }

    #[tool(description = "Get a stored ingredient by name, with the recipes that use it")]
    fn get_ingredient(&self, Parameters(p): Parameters<IngredientNameParams>) -> Result<CallToolResult, McpError> {
        respond(ingredients::get_ingredient(&self.database, &p.name))
    }

    #[tool(description = "List stored ingredients alphabetically, optionally filtered by a name fragment")]
    fn list_ingredients(&self, Parameters(p): Parameters<ListIngredientsParams>) -> Result<CallToolResult, McpError> {
        respond(ingredients::list_ingredients(&self.database, p.query.as_deref(), p.limit, p.offset))
    }

    #[tool(description = "Search the Nutritionix food database. Returns numbered candidates; nothing is stored. Candidates marked incomplete only carry calories.")]
    async fn search_ingredient(&self, Parameters(p): Parameters<SearchIngredientParams>) -> Result<CallToolResult, McpError> {
        self.run_blocking(move |_, lookup| ingredients::search_ingredient(lookup, &p.query)).await
    }

    #[tool(description = "Resolve an ingredient name: stored ingredient first, otherwise Nutritionix. Returns status resolved, choose (call again with choice), or retry_search. Set save=true to store a looked-up ingredient.")]
    async fn resolve_ingredient(&self, Parameters(p): Parameters<ResolveIngredientParams>) -> Result<CallToolResult, McpError> {
        self.run_blocking(move |db, lookup| {
            ingredients::resolve_ingredient(db, lookup, &p.name, p.choice, p.save)
        })
        .await
    }

    #[tool(description = "Derive a new ingredient from a stored one. Changing protein/fat/carbs recomputes calories (4/9/4 per gram); changing only the serving weight rescales calories. The original is unchanged.")]
    fn customize_ingredient(&self, Parameters(p): Parameters<CustomizeIngredientParams>) -> Result<CallToolResult, McpError> {
        let edit = IngredientEdit {
            name: p.name, serving_size: p.serving_size, serving_unit: p.serving_unit,
            serving_weight_grams: p.serving_weight_grams,
            protein: p.protein, fat: p.fat, carbs: p.carbs,
        };
        respond(ingredients::customize_ingredient(&self.database, &p.base_name, &edit, p.save))
    }

    #[tool(description = "Preview how a serving amount (e.g. 2, 0.5, 150g, 5oz) is interpreted for a stored ingredient, with the resulting nutrition")]
    fn parse_serving(&self, Parameters(p): Parameters<ParseServingParams>) -> Result<CallToolResult, McpError> {
        respond(ingredients::parse_serving_amount(&self.database, &p.ingredient, &p.amount))
    }

    // --- Recipes ---

    #[tool(description = "Create a recipe from ingredient lines. Each line names an ingredient and an amount (servings or weight); ingredients are resolved like resolve_ingredient and looked-up ones are stored.")]
    async fn create_recipe(&self, Parameters(p): Parameters<CreateRecipeParams>) -> Result<CallToolResult, McpError> {
        let input = CreateRecipeInput {
            name: p.name,
            servings: p.servings,
            ingredients: p
                .ingredients
                .into_iter()
                .map(|l| RecipeLineInput { ingredient: l.ingredient, amount: l.amount, choice: l.choice })
                .collect(),
        };
        self.run_blocking(move |db, lookup| recipes::create_recipe(db, lookup, input)).await
    }

    #[tool(description = "List all recipes with servings, ingredient count and calories per serving")]
    fn list_recipes(&self) -> Result<CallToolResult, McpError> {
        respond(recipes::list_recipes(&self.database))
    }

    #[tool(description = "Show a recipe with its ingredient lines, total nutrition and per-serving nutrition")]
    fn show_recipe(&self, Parameters(p): Parameters<RecipeNameParams>) -> Result<CallToolResult, McpError> {
        respond(recipes::show_recipe(&self.database, &p.name))
    }

    #[tool(description = "Rename a recipe. The new name must not belong to another recipe.")]
    fn rename_recipe(&self, Parameters(p): Parameters<RenameRecipeParams>) -> Result<CallToolResult, McpError> {
        respond(recipes::rename_recipe(&self.database, &p.old_name, &p.new_name))
    }

    #[tool(description = "Delete a recipe. Journal entries already logged from it are kept.")]
    fn delete_recipe(&self, Parameters(p): Parameters<RecipeNameParams>) -> Result<CallToolResult, McpError> {
        respond(recipes::delete_recipe(&self.database, &p.name))
    }

    // --- Journal ---

    #[tool(description = "Log an ingredient to the journal. Amount is servings or weight (e.g. 150g). The ingredient is resolved like resolve_ingredient.")]
    async fn add_ingredient_to_journal(&self, Parameters(p): Parameters<AddIngredientToJournalParams>) -> Result<CallToolResult, McpError> {
        self.run_blocking(move |db, lookup| {
            journal::add_ingredient_to_journal(
                db, lookup, &p.ingredient, &p.amount, p.date.as_deref(), p.choice, p.save,
            )
        })
        .await
    }

    #[tool(description = "Log servings of a stored recipe to the journal, using its per-serving nutrition")]
    fn add_recipe_to_journal(&self, Parameters(p): Parameters<AddRecipeToJournalParams>) -> Result<CallToolResult, McpError> {
        respond(journal::add_recipe_to_journal(&self.database, &p.recipe, &p.servings, p.date.as_deref()))
    }

    #[tool(description = "Get journal entries and calorie/macro totals with macro percentages for a date")]
    fn get_journal_summary(&self, Parameters(p): Parameters<JournalDateParams>) -> Result<CallToolResult, McpError> {
        respond(journal::get_journal_summary(&self.database, p.date.as_deref()))
    }

    #[tool(description = "List dates that have journal entries, newest first")]
    fn list_journal_dates(&self, Parameters(p): Parameters<ListJournalDatesParams>) -> Result<CallToolResult, McpError> {
        respond(journal::list_journal_dates(&self.database, p.limit))
    }

    #[tool(description = "Delete all journal entries for a date")]
    fn reset_journal(&self, Parameters(p): Parameters<ResetJournalParams>) -> Result<CallToolResult, McpError> {
        respond(journal::reset_journal(&self.database, Some(&p.date)))
    }
}

// ============================================================================
// Server Handler
// ============================================================================

#[tool_handler]
impl ServerHandler for MacroUtilService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "macro-util".into(),
                version: crate::build_info::VERSION.into(),
                title: Some("Macro Util".into()),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Macro Util - ingredients, recipes and a daily food journal with calorie and macro totals. \
                 IMPORTANT: Call usage_instructions before logging food. \
                 Ingredients: create_custom_ingredient, get_ingredient, list_ingredients, search_ingredient, \
                 resolve_ingredient, customize_ingredient, parse_serving. \
                 Recipes: create_recipe, list_recipes, show_recipe, rename_recipe, delete_recipe. \
                 Journal: add_ingredient_to_journal, add_recipe_to_journal, get_journal_summary, \
                 list_journal_dates, reset_journal. \
                 Amounts are servings (1, 0.5) or weights (150g, 5oz). Dates are YYYY-MM-DD, today or yesterday."
                    .into(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_errors_become_error_results() {
        let result = respond::<()>(Err(ToolError::NotFound("Recipe 'x' not found".to_string())))
            .unwrap();
        assert_eq!(result.is_error, Some(true));
    }

    #[test]
    fn test_database_errors_are_internal() {
        let result = respond::<()>(Err(ToolError::Database(crate::db::DbError::Sqlite(
            rusqlite::Error::QueryReturnedNoRows,
        ))));
        assert!(result.is_err());
    }

    #[test]
    fn test_success_is_not_error() {
        let result = respond(Ok(serde_json::json!({ "ok": true }))).unwrap();
        assert_eq!(result.is_error, Some(false));
    }
}
