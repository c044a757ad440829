//! Recipe Ingredient model
//!
//! One ordered line of a recipe: an ingredient plus how much of it.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use super::Ingredient;
use crate::db::DbResult;
use crate::nutrition::ServingAmount;

/// A recipe line scaled either by a servings multiplier or by weight.
///
/// When both `weight_grams` and the ingredient's serving weight are known,
/// weight governs and `servings` is informational only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeIngredient {
    pub ingredient: Ingredient,
    pub servings: f64,
    pub weight_grams: Option<f64>,
}

impl RecipeIngredient {
    pub fn with_servings(ingredient: Ingredient, servings: f64) -> Self {
        Self {
            ingredient,
            servings,
            weight_grams: None,
        }
    }

    /// Build a line from a parsed serving amount, keeping the gram figure
    /// when the amount was given as a weight
    pub fn from_amount(ingredient: Ingredient, amount: &ServingAmount) -> Self {
        Self {
            ingredient,
            servings: amount.servings,
            weight_grams: amount.grams,
        }
    }

    /// Create from a joined `ingredients` + `recipe_ingredients` row
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            ingredient: Ingredient::from_row(row)?,
            servings: row.get("line_servings")?,
            weight_grams: row.get("line_weight_grams")?,
        })
    }

    /// Load the ordered lines of a recipe
    pub fn get_for_recipe(conn: &Connection, recipe_id: i64) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT i.*, ri.servings AS line_servings, ri.weight_grams AS line_weight_grams
            FROM recipe_ingredients ri
            INNER JOIN ingredients i ON ri.ingredient_id = i.id
            WHERE ri.recipe_id = ?1
            ORDER BY ri.position ASC, ri.id ASC
            "#,
        )?;

        let lines = stmt
            .query_map([recipe_id], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(lines)
    }

    /// Insert one line; the ingredient must already be stored
    pub(crate) fn insert(
        conn: &Connection,
        recipe_id: i64,
        ingredient_id: i64,
        position: usize,
        line: &RecipeIngredient,
    ) -> DbResult<()> {
        conn.execute(
            r#"
            INSERT INTO recipe_ingredients (recipe_id, ingredient_id, position, servings, weight_grams)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                recipe_id,
                ingredient_id,
                position as i64,
                line.servings,
                line.weight_grams
            ],
        )?;
        Ok(())
    }
}
