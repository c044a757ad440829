//! Ingredient model
//!
//! Per-serving nutrition facts for one named food.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use super::Nutrition;
use crate::db::{DbError, DbResult};

/// Whether a record has been persisted, and under which row id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", content = "id", rename_all = "lowercase")]
pub enum StoreId {
    #[default]
    Unsaved,
    Stored(i64),
}

impl StoreId {
    pub fn id(&self) -> Option<i64> {
        match self {
            StoreId::Unsaved => None,
            StoreId::Stored(id) => Some(*id),
        }
    }

    pub fn is_stored(&self) -> bool {
        matches!(self, StoreId::Stored(_))
    }
}

/// An ingredient with nutrition per one declared serving
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    #[serde(default)]
    pub store_id: StoreId,
    pub name: String,
    pub serving_size: f64,
    pub serving_unit: String,
    /// Mass of one serving; the only basis for weight-based scaling
    pub serving_weight_grams: Option<f64>,
    pub nutrition: Nutrition,
}

impl Ingredient {
    /// Build an unsaved ingredient
    pub fn new(
        name: impl Into<String>,
        serving_size: f64,
        serving_unit: impl Into<String>,
        serving_weight_grams: Option<f64>,
        nutrition: Nutrition,
    ) -> Self {
        Self {
            store_id: StoreId::Unsaved,
            name: name.into(),
            serving_size,
            serving_unit: serving_unit.into(),
            serving_weight_grams,
            nutrition,
        }
    }

    /// Grams per serving, if known and usable as a divisor
    pub fn weight_basis(&self) -> Option<f64> {
        self.serving_weight_grams.filter(|w| *w > 0.0)
    }

    /// Lookup summaries carry calories only; all three macros are zero
    pub fn is_incomplete(&self) -> bool {
        self.nutrition.has_no_macros()
    }

    /// Check the field invariants before persisting
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Ingredient name cannot be empty".to_string());
        }
        if !(self.serving_size > 0.0) {
            return Err("serving_size must be greater than 0".to_string());
        }
        if self.serving_unit.trim().is_empty() {
            return Err("serving_unit cannot be empty".to_string());
        }
        if let Some(weight) = self.serving_weight_grams {
            if !(weight > 0.0) {
                return Err("serving_weight_grams must be greater than 0".to_string());
            }
        }

        let n = &self.nutrition;
        for (label, value) in [
            ("calories", n.calories),
            ("protein", n.protein),
            ("fat", n.fat),
            ("carbs", n.carbs),
        ] {
            if !(value >= 0.0) {
                return Err(format!("{} cannot be negative", label));
            }
        }
        Ok(())
    }

    /// Create from a database row
    pub(crate) fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            store_id: StoreId::Stored(row.get("id")?),
            name: row.get("name")?,
            serving_size: row.get("serving_size")?,
            serving_unit: row.get("serving_unit")?,
            serving_weight_grams: row.get("serving_weight_grams")?,
            nutrition: Nutrition {
                calories: row.get("calories")?,
                protein: row.get("protein")?,
                fat: row.get("fat")?,
                carbs: row.get("carbs")?,
            },
        })
    }

    /// Get an ingredient by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM ingredients WHERE id = ?1")?;

        match stmt.query_row([id], Self::from_row) {
            Ok(item) => Ok(Some(item)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Get an ingredient by exact name, ignoring case
    pub fn get_by_name(conn: &Connection, name: &str) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM ingredients WHERE name = ?1")?;

        match stmt.query_row([name.trim()], Self::from_row) {
            Ok(item) => Ok(Some(item)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Persist an ingredient. A duplicate name returns the existing record
    /// untouched instead of failing.
    pub fn save(conn: &Connection, ingredient: &Ingredient) -> DbResult<Self> {
        if let Some(existing) = Self::get_by_name(conn, &ingredient.name)? {
            return Ok(existing);
        }
        Self::insert(conn, ingredient)
    }

    /// Insert a new row. Fails on the UNIQUE constraint if the name is
    /// already stored.
    pub fn insert(conn: &Connection, ingredient: &Ingredient) -> DbResult<Self> {
        conn.execute(
            r#"
            INSERT INTO ingredients (
                name, serving_size, serving_unit, serving_weight_grams,
                calories, protein, fat, carbs
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                ingredient.name.trim(),
                ingredient.serving_size,
                ingredient.serving_unit,
                ingredient.serving_weight_grams,
                ingredient.nutrition.calories,
                ingredient.nutrition.protein,
                ingredient.nutrition.fat,
                ingredient.nutrition.carbs,
            ],
        )?;

        let id = conn.last_insert_rowid();
        Self::get_by_id(conn, id)?
            .ok_or(DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows))
    }

    /// List stored ingredients alphabetically, optionally filtered by a
    /// name fragment
    pub fn list(
        conn: &Connection,
        query: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> DbResult<Vec<Self>> {
        let pattern = format!("%{}%", query.unwrap_or("").trim());
        let mut stmt = conn.prepare(
            r#"
            SELECT * FROM ingredients
            WHERE name LIKE ?1
            ORDER BY name ASC
            LIMIT ?2 OFFSET ?3
            "#,
        )?;

        let items = stmt
            .query_map(params![pattern, limit, offset], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(items)
    }

    /// Count stored ingredients
    pub fn count(conn: &Connection) -> DbResult<i64> {
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM ingredients", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Get names of recipes that reference this ingredient
    pub fn get_used_in_recipes(conn: &Connection, id: i64) -> DbResult<Vec<String>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT DISTINCT r.name FROM recipes r
            INNER JOIN recipe_ingredients ri ON r.id = ri.recipe_id
            WHERE ri.ingredient_id = ?1
            ORDER BY r.name
            "#,
        )?;

        let names = stmt
            .query_map([id], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;

        Ok(names)
    }
}
