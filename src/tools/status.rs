//! Macro Util status tool
//!
//! Runtime status and usage instructions for the service.

use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use sysinfo::{Pid, ProcessesToUpdate, System};

use super::ToolResult;
use crate::build_info::BuildInfo;
use crate::db::Database;
use crate::models::{FoodJournal, Ingredient, Recipe};

/// Usage instructions for AI assistants
pub const USAGE_INSTRUCTIONS: &str = r#"
# Macro Util Instructions

Macro Util tracks ingredients, recipes and a daily food journal, and reports
calories and macros (protein, fat, carbs) with each macro's share of calories.

## Ingredients

Every ingredient stores nutrition for ONE serving, as declared by
`serving_size` + `serving_unit` (e.g. 1 "medium", 0.5 "cup").
`serving_weight_grams` is the mass of that serving. It is optional, but
without it weights like "150g" cannot be converted for that ingredient.

- `get_ingredient` / `list_ingredients` - stored ingredients only
- `search_ingredient` - raw Nutritionix candidates, nothing is stored
- `resolve_ingredient` - stored ingredient first, otherwise Nutritionix
- `create_custom_ingredient` - manual entry from a nutrition label
- `customize_ingredient` - derive a variant of a stored ingredient

### Resolving names

`resolve_ingredient` returns one of:
- `resolved` - a single ingredient (`source` is `store` or `lookup`)
- `choose` - several candidates, numbered from 1. Call again with
  `choice` set to a number, or to `none_of_these` (candidates + 1) when
  nothing fits
- `retry_search` - the user rejected every candidate; ask for another name

Candidates marked `incomplete` only carry calories. Choosing one fetches the
full macros automatically.

Pass `save: true` to store a looked-up ingredient. Saving is skipped when an
ingredient with that name is already stored. Unsaved ingredients are used
once and must be resolved again next time.

### Customizing

Changing protein, fat or carbs recomputes calories as
protein*4 + fat*9 + carbs*4. Changing only the serving weight rescales
calories proportionally. The original ingredient is never modified.

## Serving Amounts

- Servings: `1`, `2`, `0.5`
- Weight: `150g`, `150 g`, `5oz`, `5 OZ` (needs `serving_weight_grams`)

Zero, negative and unrecognised amounts are rejected. Use `parse_serving`
to preview how an amount is interpreted.

## Recipes

`create_recipe` takes a name, the number of servings it yields (default 1)
and a list of `{ingredient, amount, choice?}` lines. Ingredients are resolved
like `resolve_ingredient`; ones found through Nutritionix are stored with the
recipe. If a line's weight is given and the ingredient knows its serving
weight, the weight decides the amount.

Recipe names are unique, ignoring case.

## Journal

- `add_ingredient_to_journal` - ingredient name + amount (servings or weight)
- `add_recipe_to_journal` - recipe name + servings (recipes take servings only)
- `get_journal_summary` - entries and totals for a date
- `list_journal_dates` - dates that have entries, newest first
- `reset_journal` - delete all entries for a date

Dates are `YYYY-MM-DD`, `today` or `yesterday`; omitted means today.

Journal entries are snapshots. Editing or deleting an ingredient or recipe
later does not change what was already logged.
"#;

/// Runtime status of the Macro Util service
#[derive(Debug, Clone, Serialize)]
pub struct MacroUtilStatus {
    /// Build information
    pub build_number: u64,
    pub build_timestamp: &'static str,
    pub version: &'static str,

    /// Database information
    pub database_path: String,
    pub database_size_bytes: Option<u64>,
    pub ingredient_count: i64,
    pub recipe_count: i64,
    pub journal_count: i64,

    /// Process information
    pub uptime_seconds: u64,
    pub process_id: u32,
    pub memory_usage_bytes: u64,

    pub lookup_enabled: bool,
}

/// Status tracker for collecting runtime information
pub struct StatusTracker {
    start_time: Instant,
    database_path: PathBuf,
    lookup_enabled: bool,
}

impl StatusTracker {
    /// Create a new status tracker
    pub fn new(database_path: PathBuf, lookup_enabled: bool) -> Self {
        Self {
            start_time: Instant::now(),
            database_path,
            lookup_enabled,
        }
    }

    /// Get the current status
    pub fn get_status(&self, db: &Database) -> ToolResult<MacroUtilStatus> {
        let build_info = BuildInfo::current();

        // Get database size if it exists
        let database_size_bytes = std::fs::metadata(&self.database_path)
            .ok()
            .map(|m| m.len());

        let ingredient_count = db.with_conn(Ingredient::count)?;
        let recipe_count = db.with_conn(Recipe::count)?;
        let journal_count = db.with_conn(FoodJournal::count)?;

        // Get process info
        let pid = std::process::id();
        let mut sys = System::new();
        sys.refresh_processes(ProcessesToUpdate::Some(&[Pid::from_u32(pid)]));

        let memory_usage_bytes = sys
            .process(Pid::from_u32(pid))
            .map(|p| p.memory())
            .unwrap_or(0);

        Ok(MacroUtilStatus {
            build_number: build_info.build_number,
            build_timestamp: build_info.build_timestamp,
            version: build_info.version,
            database_path: self.database_path.display().to_string(),
            database_size_bytes,
            ingredient_count,
            recipe_count,
            journal_count,
            uptime_seconds: self.start_time.elapsed().as_secs(),
            process_id: pid,
            memory_usage_bytes,
            lookup_enabled: self.lookup_enabled,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_reports_counts() {
        let db = Database::in_memory().unwrap();
        let tracker = StatusTracker::new(PathBuf::from("/nonexistent/macro_util.db"), false);

        let status = tracker.get_status(&db).unwrap();
        assert_eq!(status.ingredient_count, 0);
        assert_eq!(status.recipe_count, 0);
        assert_eq!(status.journal_count, 0);
        assert_eq!(status.database_size_bytes, None);
        assert_eq!(status.process_id, std::process::id());
        assert!(!status.lookup_enabled);
    }
}
