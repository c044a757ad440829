//! Food journal model
//!
//! One journal per calendar date holding immutable consumption snapshots.

use chrono::NaiveDate;
use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use super::Nutrition;
use crate::db::{DbError, DbResult};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// What kind of source an entry was computed from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EntryType {
    Recipe,
    Ingredient,
}

impl EntryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryType::Recipe => "recipe",
            EntryType::Ingredient => "ingredient",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "recipe" => EntryType::Recipe,
            _ => EntryType::Ingredient,
        }
    }
}

/// Absolute nutrition consumed in one event. The name is copied at entry
/// time; nothing links back to the ingredient or recipe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub entry_type: EntryType,
    pub name: String,
    pub servings: f64,
    pub nutrition: Nutrition,
}

impl JournalEntry {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            entry_type: EntryType::from_str(row.get::<_, String>("entry_type")?.as_str()),
            name: row.get("name")?,
            servings: row.get("servings")?,
            nutrition: Nutrition {
                calories: row.get("calories")?,
                protein: row.get("protein")?,
                fat: row.get("fat")?,
                carbs: row.get("carbs")?,
            },
        })
    }
}

/// The entries recorded for one date, in insertion order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodJournal {
    pub id: i64,
    pub date: NaiveDate,
    pub entries: Vec<JournalEntry>,
}

/// A date that has a journal, with its entry count
#[derive(Debug, Clone, Serialize)]
pub struct JournalDate {
    pub date: String,
    pub entry_count: i64,
}

impl FoodJournal {
    fn load(conn: &Connection, id: i64, date: NaiveDate) -> DbResult<Self> {
        let mut stmt = conn.prepare(
            "SELECT * FROM journal_entries WHERE journal_id = ?1 ORDER BY id ASC",
        )?;

        let entries = stmt
            .query_map([id], JournalEntry::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { id, date, entries })
    }

    fn find_id(conn: &Connection, date: NaiveDate) -> DbResult<Option<i64>> {
        let key = date.format(DATE_FORMAT).to_string();
        match conn.query_row("SELECT id FROM food_journals WHERE date = ?1", [key], |row| {
            row.get(0)
        }) {
            Ok(id) => Ok(Some(id)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Get the journal for a date, if one has been created
    pub fn get_by_date(conn: &Connection, date: NaiveDate) -> DbResult<Option<Self>> {
        match Self::find_id(conn, date)? {
            Some(id) => Ok(Some(Self::load(conn, id, date)?)),
            None => Ok(None),
        }
    }

    /// Get or create the journal for a date. Creation is keyed by the
    /// unique date, so repeated calls never duplicate it.
    pub fn get_or_create(conn: &Connection, date: NaiveDate) -> DbResult<Self> {
        let key = date.format(DATE_FORMAT).to_string();
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO food_journals (date) VALUES (?1)",
            [&key],
        )?;
        if inserted > 0 {
            tracing::info!("Created food journal for {}", key);
        }

        Self::get_by_date(conn, date)?
            .ok_or(DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows))
    }

    /// Append an entry to the date's journal, creating the journal if needed
    pub fn add_entry(conn: &Connection, date: NaiveDate, entry: &JournalEntry) -> DbResult<Self> {
        let journal = Self::get_or_create(conn, date)?;

        conn.execute(
            r#"
            INSERT INTO journal_entries (
                journal_id, entry_type, name, servings, calories, protein, fat, carbs
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                journal.id,
                entry.entry_type.as_str(),
                entry.name,
                entry.servings,
                entry.nutrition.calories,
                entry.nutrition.protein,
                entry.nutrition.fat,
                entry.nutrition.carbs,
            ],
        )?;

        Self::load(conn, journal.id, date)
    }

    /// Remove a date's entries and the journal itself.
    /// Returns whether a journal existed.
    pub fn reset(conn: &Connection, date: NaiveDate) -> DbResult<bool> {
        let key = date.format(DATE_FORMAT).to_string();
        // Entries go with the journal via ON DELETE CASCADE
        let rows = conn.execute("DELETE FROM food_journals WHERE date = ?1", [key])?;
        Ok(rows > 0)
    }

    /// Dates that have a journal, newest first
    pub fn list_dates(conn: &Connection, limit: i64) -> DbResult<Vec<JournalDate>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT j.date, COUNT(e.id) AS entry_count
            FROM food_journals j
            LEFT JOIN journal_entries e ON e.journal_id = j.id
            GROUP BY j.id
            ORDER BY j.date DESC
            LIMIT ?1
            "#,
        )?;

        let dates = stmt
            .query_map([limit], |row| {
                Ok(JournalDate {
                    date: row.get("date")?,
                    entry_count: row.get("entry_count")?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(dates)
    }

    /// Count journals
    pub fn count(conn: &Connection) -> DbResult<i64> {
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM food_journals", [], |row| row.get(0))?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, DATE_FORMAT).unwrap()
    }

    fn entry(name: &str, calories: f64) -> JournalEntry {
        JournalEntry {
            entry_type: EntryType::Ingredient,
            name: name.to_string(),
            servings: 1.0,
            nutrition: Nutrition { calories, protein: 1.0, fat: 1.0, carbs: 1.0 },
        }
    }

    #[test]
    fn test_add_entry_creates_single_journal_per_date() {
        let db = Database::in_memory().unwrap();
        let day = date("2025-01-09");

        db.with_conn(|conn| FoodJournal::add_entry(conn, day, &entry("Banana", 105.0))).unwrap();
        let journal = db
            .with_conn(|conn| FoodJournal::add_entry(conn, day, &entry("Apple", 95.0)))
            .unwrap();

        assert_eq!(db.with_conn(FoodJournal::count).unwrap(), 1);
        let names: Vec<_> = journal.entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Banana", "Apple"]);
    }

    #[test]
    fn test_get_or_create_is_idempotent() {
        let db = Database::in_memory().unwrap();
        let day = date("2025-02-01");

        let first = db.with_conn(|conn| FoodJournal::get_or_create(conn, day)).unwrap();
        let second = db.with_conn(|conn| FoodJournal::get_or_create(conn, day)).unwrap();
        assert_eq!(first.id, second.id);
        assert!(second.entries.is_empty());
    }

    #[test]
    fn test_reset_removes_journal_and_entries() {
        let db = Database::in_memory().unwrap();
        let day = date("2025-03-15");
        db.with_conn(|conn| FoodJournal::add_entry(conn, day, &entry("Toast", 80.0))).unwrap();

        assert!(db.with_conn(|conn| FoodJournal::reset(conn, day)).unwrap());
        assert!(db.with_conn(|conn| FoodJournal::get_by_date(conn, day)).unwrap().is_none());
        assert!(!db.with_conn(|conn| FoodJournal::reset(conn, day)).unwrap());

        let orphans: i64 = db
            .with_conn(|conn| {
                Ok(conn.query_row("SELECT COUNT(*) FROM journal_entries", [], |row| row.get(0))?)
            })
            .unwrap();
        assert_eq!(orphans, 0);
    }

    #[test]
    fn test_list_dates_newest_first() {
        let db = Database::in_memory().unwrap();
        db.with_conn(|conn| FoodJournal::add_entry(conn, date("2025-01-01"), &entry("A", 1.0)))
            .unwrap();
        db.with_conn(|conn| FoodJournal::add_entry(conn, date("2025-01-02"), &entry("B", 1.0)))
            .unwrap();
        db.with_conn(|conn| FoodJournal::add_entry(conn, date("2025-01-02"), &entry("C", 1.0)))
            .unwrap();

        let dates = db.with_conn(|conn| FoodJournal::list_dates(conn, 10)).unwrap();
        assert_eq!(dates.len(), 2);
        assert_eq!(dates[0].date, "2025-01-02");
        assert_eq!(dates[0].entry_count, 2);
    }
}
