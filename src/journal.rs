//! Journal aggregation
//!
//! Date handling and the store-facing journal operations. Entries are built
//! by the calculator and are snapshots; nothing here recomputes them.

use chrono::{Duration, Local, NaiveDate};
use thiserror::Error;

use crate::db::{Database, DbResult};
use crate::models::{DayNutrition, FoodJournal, JournalEntry, DATE_FORMAT};
use crate::nutrition::day_nutrition;

#[derive(Debug, Clone, PartialEq, Error)]
#[error("Invalid date '{0}'; use YYYY-MM-DD, 'today' or 'yesterday'")]
pub struct DateError(pub String);

/// Wall-clock local date
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Resolve a journal date relative to `today`.
///
/// `None`, empty text and "today" give `today`; "yesterday" the day before.
/// Otherwise the text must be `YYYY-MM-DD`.
pub fn parse_journal_date(input: Option<&str>, today: NaiveDate) -> Result<NaiveDate, DateError> {
    let Some(text) = input.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(today);
    };

    match text.to_lowercase().as_str() {
        "today" => Ok(today),
        "yesterday" => Ok(today - Duration::days(1)),
        _ => NaiveDate::parse_from_str(text, DATE_FORMAT)
            .map_err(|_| DateError(text.to_string())),
    }
}

/// Append an entry to a date's journal, creating the journal on first use
pub fn add_entry(db: &Database, date: NaiveDate, entry: &JournalEntry) -> DbResult<FoodJournal> {
    let journal = db.with_conn(|conn| FoodJournal::add_entry(conn, date, entry))?;
    tracing::info!(
        "Journaled {} x {} ({:.0} cal) on {}",
        entry.servings,
        entry.name,
        entry.nutrition.calories,
        date.format(DATE_FORMAT)
    );
    Ok(journal)
}

/// Delete a date's journal. Returns whether one existed.
pub fn reset_journal(db: &Database, date: NaiveDate) -> DbResult<bool> {
    let existed = db.with_conn(|conn| FoodJournal::reset(conn, date))?;
    if existed {
        tracing::info!("Reset journal for {}", date.format(DATE_FORMAT));
    }
    Ok(existed)
}

/// Entries and totals for a date. A date without a journal is empty.
pub fn summary(db: &Database, date: NaiveDate) -> DbResult<(Vec<JournalEntry>, DayNutrition)> {
    let entries = db
        .with_conn(|conn| FoodJournal::get_by_date(conn, date))?
        .map(|journal| journal.entries)
        .unwrap_or_default();
    let totals = day_nutrition(&entries);
    Ok((entries, totals))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Ingredient, Nutrition, Recipe, RecipeIngredient};
    use crate::nutrition::{ingredient_entry, recipe_entry};

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, DATE_FORMAT).unwrap()
    }

    fn egg() -> Ingredient {
        Ingredient::new(
            "Egg",
            1.0,
            "large",
            Some(50.0),
            Nutrition { calories: 70.0, protein: 6.0, fat: 5.0, carbs: 0.5 },
        )
    }

    #[test]
    fn test_date_shorthands() {
        let today = day("2025-03-01");
        assert_eq!(parse_journal_date(None, today), Ok(today));
        assert_eq!(parse_journal_date(Some("  "), today), Ok(today));
        assert_eq!(parse_journal_date(Some("Today"), today), Ok(today));
        assert_eq!(parse_journal_date(Some("YESTERDAY"), today), Ok(day("2025-02-28")));
        assert_eq!(parse_journal_date(Some("2024-12-31"), today), Ok(day("2024-12-31")));
    }

    #[test]
    fn test_bad_dates_are_rejected() {
        let today = day("2025-03-01");
        for bad in ["tomorrow", "2025-13-01", "03/01/2025", "2025-02-30"] {
            assert!(parse_journal_date(Some(bad), today).is_err(), "{bad} should fail");
        }
    }

    #[test]
    fn test_summary_of_missing_date_is_zero() {
        let db = Database::in_memory().unwrap();
        let (entries, totals) = summary(&db, day("2025-01-01")).unwrap();
        assert!(entries.is_empty());
        assert_eq!(totals, DayNutrition::default());
    }

    #[test]
    fn test_entries_accumulate_and_reset() {
        let db = Database::in_memory().unwrap();
        let date = day("2025-04-10");
        let omelette = Recipe::new(
            "Omelette",
            2.0,
            vec![RecipeIngredient::with_servings(egg(), 2.0)],
        );

        add_entry(&db, date, &ingredient_entry(&egg(), 1.0)).unwrap();
        let journal = add_entry(&db, date, &recipe_entry(&omelette, 1.0)).unwrap();
        assert_eq!(journal.entries.len(), 2);

        let (_, totals) = summary(&db, date).unwrap();
        assert!((totals.total_calories - 140.0).abs() < 1e-9);

        assert!(reset_journal(&db, date).unwrap());
        assert!(!reset_journal(&db, date).unwrap());
        let (entries, _) = summary(&db, date).unwrap();
        assert!(entries.is_empty());
    }
}
