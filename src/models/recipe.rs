//! Recipe model
//!
//! A named composition of ingredient lines with a serving yield.

use std::collections::HashMap;

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use super::{Ingredient, RecipeIngredient, StoreId};
use crate::db::{DbError, DbResult};

fn default_servings() -> f64 {
    1.0
}

/// A recipe and its ordered ingredient lines
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    #[serde(default)]
    pub store_id: StoreId,
    pub name: String,
    /// How many servings the whole recipe yields
    #[serde(default = "default_servings")]
    pub servings: f64,
    pub ingredients: Vec<RecipeIngredient>,
}

impl Recipe {
    pub fn new(name: impl Into<String>, servings: f64, ingredients: Vec<RecipeIngredient>) -> Self {
        Self {
            store_id: StoreId::Unsaved,
            name: name.into(),
            servings,
            ingredients,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Recipe name cannot be empty".to_string());
        }
        if !(self.servings > 0.0) || !self.servings.is_finite() {
            return Err("servings must be greater than 0".to_string());
        }
        if self.ingredients.is_empty() {
            return Err("A recipe needs at least one ingredient".to_string());
        }
        for line in &self.ingredients {
            if !(line.servings > 0.0) {
                return Err(format!(
                    "servings for '{}' must be greater than 0",
                    line.ingredient.name
                ));
            }
        }
        Ok(())
    }

    /// Create from a `recipes` row; lines are loaded separately
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            store_id: StoreId::Stored(row.get("id")?),
            name: row.get("name")?,
            servings: row.get("servings")?,
            ingredients: Vec::new(),
        })
    }

    fn with_lines(conn: &Connection, mut recipe: Recipe) -> DbResult<Self> {
        if let Some(id) = recipe.store_id.id() {
            recipe.ingredients = RecipeIngredient::get_for_recipe(conn, id)?;
        }
        Ok(recipe)
    }

    /// Get a recipe (with lines) by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM recipes WHERE id = ?1")?;

        match stmt.query_row([id], Self::from_row) {
            Ok(recipe) => Ok(Some(Self::with_lines(conn, recipe)?)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Get a recipe (with lines) by name, ignoring case
    pub fn get_by_name(conn: &Connection, name: &str) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM recipes WHERE name = ?1")?;

        match stmt.query_row([name.trim()], Self::from_row) {
            Ok(recipe) => Ok(Some(Self::with_lines(conn, recipe)?)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Persist a new recipe and its lines in one transaction.
    ///
    /// Lines referring to unsaved ingredients insert those ingredients first,
    /// since a stored line must reference a stored ingredient. An unsaved
    /// ingredient whose name is already stored fails the whole save rather
    /// than pointing the line at a different record. The caller is
    /// responsible for rejecting duplicate recipe names.
    pub fn save(conn: &mut Connection, recipe: &Recipe) -> DbResult<Self> {
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT INTO recipes (name, servings) VALUES (?1, ?2)",
            params![recipe.name.trim(), recipe.servings],
        )?;
        let recipe_id = tx.last_insert_rowid();

        // Unsaved ingredients inserted by this save, by lowercased name
        let mut inserted: HashMap<String, i64> = HashMap::new();

        for (position, line) in recipe.ingredients.iter().enumerate() {
            let ingredient_id = match line.ingredient.store_id {
                StoreId::Stored(id) => id,
                StoreId::Unsaved => {
                    let key = line.ingredient.name.trim().to_lowercase();
                    match inserted.get(&key) {
                        Some(&id) => id,
                        None => {
                            let id = Ingredient::insert(&tx, &line.ingredient)?
                                .store_id
                                .id()
                                .ok_or(DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows))?;
                            inserted.insert(key, id);
                            id
                        }
                    }
                }
            };
            RecipeIngredient::insert(&tx, recipe_id, ingredient_id, position, line)?;
        }

        tx.commit()?;

        Self::get_by_id(conn, recipe_id)?
            .ok_or(DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows))
    }

    /// All recipes with their lines, by name
    pub fn list_all(conn: &Connection) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM recipes ORDER BY name ASC")?;

        let recipes = stmt
            .query_map([], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        recipes
            .into_iter()
            .map(|recipe| Self::with_lines(conn, recipe))
            .collect()
    }

    /// Rename a recipe. Returns Ok(false) if no recipe had the old name.
    pub fn rename(conn: &Connection, old_name: &str, new_name: &str) -> DbResult<bool> {
        let rows = conn.execute(
            "UPDATE recipes SET name = ?1, updated_at = datetime('now') WHERE name = ?2",
            params![new_name.trim(), old_name.trim()],
        )?;
        Ok(rows > 0)
    }

    /// Delete a recipe and its lines. Journal entries are snapshots and
    /// are left untouched.
    pub fn delete(conn: &Connection, name: &str) -> DbResult<bool> {
        let rows = conn.execute("DELETE FROM recipes WHERE name = ?1", [name.trim()])?;
        Ok(rows > 0)
    }

    /// Count stored recipes
    pub fn count(conn: &Connection) -> DbResult<i64> {
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM recipes", [], |row| row.get(0))?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::models::Nutrition;

    fn egg() -> Ingredient {
        Ingredient::new(
            "Egg",
            1.0,
            "large",
            Some(50.0),
            Nutrition { calories: 70.0, protein: 6.0, fat: 5.0, carbs: 0.4 },
        )
    }

    fn cheese() -> Ingredient {
        Ingredient::new(
            "Cheddar",
            1.0,
            "oz",
            Some(28.0),
            Nutrition { calories: 110.0, protein: 7.0, fat: 9.0, carbs: 0.4 },
        )
    }

    fn omelette() -> Recipe {
        Recipe::new(
            "Omelette",
            2.0,
            vec![
                RecipeIngredient::with_servings(egg(), 2.0),
                RecipeIngredient {
                    ingredient: cheese(),
                    servings: 1.0,
                    weight_grams: Some(28.0),
                },
            ],
        )
    }

    #[test]
    fn test_save_persists_unsaved_ingredients_and_order() {
        let db = Database::in_memory().unwrap();
        let saved = db.with_conn_mut(|conn| Recipe::save(conn, &omelette())).unwrap();

        assert!(saved.store_id.is_stored());
        assert_eq!(saved.servings, 2.0);
        let names: Vec<_> = saved.ingredients.iter().map(|l| l.ingredient.name.as_str()).collect();
        assert_eq!(names, vec!["Egg", "Cheddar"]);
        assert!(saved.ingredients.iter().all(|l| l.ingredient.store_id.is_stored()));
        assert_eq!(saved.ingredients[1].weight_grams, Some(28.0));
        assert_eq!(db.with_conn(Ingredient::count).unwrap(), 2);
    }

    #[test]
    fn test_get_by_name_ignores_case() {
        let db = Database::in_memory().unwrap();
        db.with_conn_mut(|conn| Recipe::save(conn, &omelette())).unwrap();

        let found = db.with_conn(|conn| Recipe::get_by_name(conn, "OMELETTE")).unwrap().unwrap();
        assert_eq!(found.ingredients.len(), 2);
    }

    #[test]
    fn test_rename_and_delete() {
        let db = Database::in_memory().unwrap();
        db.with_conn_mut(|conn| Recipe::save(conn, &omelette())).unwrap();

        assert!(db.with_conn(|conn| Recipe::rename(conn, "omelette", "Cheese Omelette")).unwrap());
        assert!(db.with_conn(|conn| Recipe::get_by_name(conn, "Omelette")).unwrap().is_none());

        assert!(db.with_conn(|conn| Recipe::delete(conn, "cheese omelette")).unwrap());
        assert!(!db.with_conn(|conn| Recipe::delete(conn, "cheese omelette")).unwrap());
        assert_eq!(db.with_conn(Recipe::count).unwrap(), 0);
        // Ingredients outlive the recipe
        assert_eq!(db.with_conn(Ingredient::count).unwrap(), 2);
    }

    #[test]
    fn test_save_rejects_unsaved_ingredient_with_stored_name() {
        let db = Database::in_memory().unwrap();
        let stored = Ingredient::new(
            "Cheddar",
            1.0,
            "slice",
            None,
            Nutrition { calories: 80.0, protein: 5.0, fat: 6.0, carbs: 0.2 },
        );
        db.with_conn(|conn| Ingredient::save(conn, &stored)).unwrap();

        let result = db.with_conn_mut(|conn| Recipe::save(conn, &omelette()));
        assert!(result.is_err());

        // Rolled back, including the egg inserted before the conflict
        assert_eq!(db.with_conn(Recipe::count).unwrap(), 0);
        assert_eq!(db.with_conn(Ingredient::count).unwrap(), 1);
    }

    #[test]
    fn test_save_shares_one_row_for_repeated_unsaved_ingredient() {
        let db = Database::in_memory().unwrap();
        let recipe = Recipe::new(
            "Two Eggs",
            1.0,
            vec![
                RecipeIngredient::with_servings(egg(), 1.0),
                RecipeIngredient::with_servings(egg(), 1.0),
            ],
        );

        let saved = db.with_conn_mut(|conn| Recipe::save(conn, &recipe)).unwrap();
        assert_eq!(saved.ingredients.len(), 2);
        assert_eq!(
            saved.ingredients[0].ingredient.store_id,
            saved.ingredients[1].ingredient.store_id
        );
        assert_eq!(db.with_conn(Ingredient::count).unwrap(), 1);
    }

    #[test]
    fn test_validate() {
        let mut recipe = omelette();
        assert!(recipe.validate().is_ok());
        recipe.servings = 0.0;
        assert!(recipe.validate().is_err());

        let empty = Recipe::new("Nothing", 1.0, Vec::new());
        assert!(empty.validate().is_err());
    }
}
