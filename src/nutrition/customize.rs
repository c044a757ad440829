//! Ingredient customization
//!
//! Derives a new unsaved ingredient from an existing one. The base record
//! is never modified, so recipes and journal entries built on it keep
//! their values.

use serde::Deserialize;

use super::calculator::calories_from_macros;
use crate::models::{Ingredient, StoreId};

/// Fields to override; `None` keeps the base value
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct IngredientEdit {
    pub name: Option<String>,
    pub serving_size: Option<f64>,
    pub serving_unit: Option<String>,
    pub serving_weight_grams: Option<f64>,
    pub protein: Option<f64>,
    pub fat: Option<f64>,
    pub carbs: Option<f64>,
}

impl IngredientEdit {
    fn changes_macros(&self) -> bool {
        self.protein.is_some() || self.fat.is_some() || self.carbs.is_some()
    }
}

/// Apply `edit` to `base`.
///
/// Editing any macro recomputes calories with Atwater factors. Otherwise a
/// new serving weight rescales calories proportionally, provided the base
/// had a weight to compare against.
pub fn customize(base: &Ingredient, edit: &IngredientEdit) -> Result<Ingredient, String> {
    let mut custom = base.clone();
    custom.store_id = StoreId::Unsaved;

    if let Some(name) = &edit.name {
        custom.name = name.trim().to_string();
    }
    if let Some(size) = edit.serving_size {
        custom.serving_size = size;
    }
    if let Some(unit) = &edit.serving_unit {
        custom.serving_unit = unit.trim().to_string();
    }
    if let Some(weight) = edit.serving_weight_grams {
        custom.serving_weight_grams = Some(weight);
    }
    if let Some(protein) = edit.protein {
        custom.nutrition.protein = protein;
    }
    if let Some(fat) = edit.fat {
        custom.nutrition.fat = fat;
    }
    if let Some(carbs) = edit.carbs {
        custom.nutrition.carbs = carbs;
    }

    custom.validate()?;

    if edit.changes_macros() {
        let n = &custom.nutrition;
        custom.nutrition.calories = calories_from_macros(n.protein, n.fat, n.carbs);
    } else if let (Some(new_weight), Some(old_weight)) =
        (edit.serving_weight_grams, base.weight_basis())
    {
        custom.nutrition.calories = base.nutrition.calories * new_weight / old_weight;
    }

    Ok(custom)
}
