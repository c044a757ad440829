//! Shared nutrition data structures
//!
//! Used across ingredients, recipes, journal entries, and day summaries.

use serde::{Deserialize, Serialize};

/// Absolute calories and macro grams
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Nutrition {
    pub calories: f64,
    pub protein: f64, // grams
    pub fat: f64,     // grams
    pub carbs: f64,   // grams
}

impl Nutrition {
    pub fn zero() -> Self {
        Self::default()
    }

    /// Scale nutrition values by a multiplier
    pub fn scale(&self, multiplier: f64) -> Self {
        Self {
            calories: self.calories * multiplier,
            protein: self.protein * multiplier,
            fat: self.fat * multiplier,
            carbs: self.carbs * multiplier,
        }
    }

    /// Add another nutrition to this one
    pub fn add(&self, other: &Nutrition) -> Self {
        Self {
            calories: self.calories + other.calories,
            protein: self.protein + other.protein,
            fat: self.fat + other.fat,
            carbs: self.carbs + other.carbs,
        }
    }

    /// True when every macro is exactly zero (summary-only lookup data)
    pub fn has_no_macros(&self) -> bool {
        self.protein == 0.0 && self.fat == 0.0 && self.carbs == 0.0
    }
}

impl std::ops::Add for Nutrition {
    type Output = Nutrition;

    fn add(self, other: Nutrition) -> Nutrition {
        Nutrition::add(&self, &other)
    }
}

impl std::iter::Sum for Nutrition {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Nutrition::zero(), |acc, n| acc + n)
    }
}

/// Totals plus the share of calories each macro contributes.
///
/// Percentages are 0 when total calories are 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MacroSummary {
    pub total_calories: f64,
    pub total_protein: f64,
    pub total_fat: f64,
    pub total_carbs: f64,
    pub protein_percentage: f64,
    pub fat_percentage: f64,
    pub carbs_percentage: f64,
}

/// Aggregate for a recipe (whole batch or one serving)
pub type RecipeNutrition = MacroSummary;

/// Aggregate for one journal date
pub type DayNutrition = MacroSummary;

impl MacroSummary {
    pub fn totals(&self) -> Nutrition {
        Nutrition {
            calories: self.total_calories,
            protein: self.total_protein,
            fat: self.total_fat,
            carbs: self.total_carbs,
        }
    }
}
