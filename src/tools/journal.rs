//! Journal tools
//!
//! Logging ingredients and recipes against a date and reporting day totals.

use chrono::NaiveDate;
use serde::Serialize;

use super::ingredients::resolve_for_use;
use super::{ToolError, ToolResult};
use crate::db::Database;
use crate::journal::{self, parse_journal_date};
use crate::lookup::FoodLookup;
use crate::models::{DayNutrition, FoodJournal, JournalDate, JournalEntry, Recipe, DATE_FORMAT};
use crate::nutrition::{ingredient_entry, parse_serving, parse_servings_count, recipe_entry};
use crate::resolve;

const MAX_DATES: i64 = 365;

/// Entry just added plus the day's running totals
#[derive(Debug, Serialize)]
pub struct AddEntryResponse {
    pub date: String,
    pub amount: String,
    pub entry: JournalEntry,
    pub saved_ingredient: bool,
    pub entry_count: usize,
    pub day_totals: DayNutrition,
}

#[derive(Debug, Serialize)]
pub struct JournalSummary {
    pub date: String,
    pub entries: Vec<JournalEntry>,
    pub totals: DayNutrition,
}

#[derive(Debug, Serialize)]
pub struct ListDatesResponse {
    pub dates: Vec<JournalDate>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct ResetJournalResponse {
    pub date: String,
    /// False when the date had no journal
    pub reset: bool,
}

fn date_key(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn added(
    journal: FoodJournal,
    entry: JournalEntry,
    amount: String,
    saved_ingredient: bool,
) -> AddEntryResponse {
    AddEntryResponse {
        date: date_key(journal.date),
        amount,
        entry,
        saved_ingredient,
        entry_count: journal.entries.len(),
        day_totals: crate::nutrition::day_nutrition(&journal.entries),
    }
}

// ============================================================================
// Journal Tools
// ============================================================================

/// Journal an amount of an ingredient, resolving it by name.
///
/// `amount` is servings or a weight. With `save`, an ingredient found
/// through the lookup is stored as well, unless its name is already taken.
/// The entry always uses the resolved ingredient's nutrition.
pub fn add_ingredient_to_journal(
    db: &Database,
    lookup: &dyn FoodLookup,
    name: &str,
    amount: &str,
    date: Option<&str>,
    choice: Option<usize>,
    save: bool,
) -> ToolResult<AddEntryResponse> {
    let date = parse_journal_date(date, journal::today())?;

    let ingredient = resolve_for_use(db, lookup, name, choice)?;
    let parsed = parse_serving(amount, &ingredient)?;

    let saved_ingredient = save
        && !ingredient.store_id.is_stored()
        && resolve::persist(&ingredient, db)?.is_some();

    let entry = ingredient_entry(&ingredient, parsed.servings);
    let updated = journal::add_entry(db, date, &entry)?;
    Ok(added(updated, entry, parsed.display_text, saved_ingredient))
}

/// Journal a number of servings of a stored recipe
pub fn add_recipe_to_journal(
    db: &Database,
    recipe_name: &str,
    servings: &str,
    date: Option<&str>,
) -> ToolResult<AddEntryResponse> {
    let date = parse_journal_date(date, journal::today())?;

    let recipe = db
        .with_conn(|conn| Recipe::get_by_name(conn, recipe_name))?
        .ok_or_else(|| ToolError::NotFound(format!("Recipe '{}' not found", recipe_name.trim())))?;
    let parsed = parse_servings_count(servings)?;

    let entry = recipe_entry(&recipe, parsed.servings);
    let updated = journal::add_entry(db, date, &entry)?;
    Ok(added(updated, entry, parsed.display_text, false))
}

/// Entries and totals for a date; a date with no journal is empty
pub fn get_journal_summary(db: &Database, date: Option<&str>) -> ToolResult<JournalSummary> {
    let date = parse_journal_date(date, journal::today())?;
    let (entries, totals) = journal::summary(db, date)?;

    Ok(JournalSummary {
        date: date_key(date),
        entries,
        totals,
    })
}

/// Dates with a journal, newest first
pub fn list_journal_dates(db: &Database, limit: i64) -> ToolResult<ListDatesResponse> {
    let limit = limit.clamp(1, MAX_DATES);
    let dates = db.with_conn(|conn| FoodJournal::list_dates(conn, limit))?;

    Ok(ListDatesResponse {
        count: dates.len(),
        dates,
    })
}

/// Remove every entry for a date
pub fn reset_journal(db: &Database, date: Option<&str>) -> ToolResult<ResetJournalResponse> {
    let date = parse_journal_date(date, journal::today())?;
    let reset = journal::reset_journal(db, date)?;

    Ok(ResetJournalResponse {
        date: date_key(date),
        reset,
    })
}
