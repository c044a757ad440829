//! Nutrition calculator
//!
//! Pure aggregation over recipes and journals. Nothing here touches the
//! database or fails; division by zero is guarded and reported as zero.

use crate::models::{
    DayNutrition, EntryType, Ingredient, JournalEntry, MacroSummary, Nutrition, Recipe,
    RecipeIngredient, RecipeNutrition,
};

/// Atwater factors, calories per gram
pub const CALORIES_PER_GRAM_PROTEIN: f64 = 4.0;
pub const CALORIES_PER_GRAM_CARBS: f64 = 4.0;
pub const CALORIES_PER_GRAM_FAT: f64 = 9.0;

/// Multiplier applied to an ingredient's per-serving values for one line.
///
/// An explicit line weight wins over the servings count whenever the
/// ingredient knows its serving weight.
pub fn line_multiplier(line: &RecipeIngredient) -> f64 {
    match (line.weight_grams, line.ingredient.weight_basis()) {
        (Some(grams), Some(per_serving)) => grams / per_serving,
        _ => line.servings,
    }
}

/// Absolute nutrition contributed by one recipe line
pub fn line_nutrition(line: &RecipeIngredient) -> Nutrition {
    line.ingredient.nutrition.scale(line_multiplier(line))
}

/// Attach macro percentages to a set of totals
pub fn summarize(totals: Nutrition) -> MacroSummary {
    let share = |grams: f64, factor: f64| {
        if totals.calories > 0.0 {
            (grams * factor / totals.calories) * 100.0
        } else {
            0.0
        }
    };

    MacroSummary {
        total_calories: totals.calories,
        total_protein: totals.protein,
        total_fat: totals.fat,
        total_carbs: totals.carbs,
        protein_percentage: share(totals.protein, CALORIES_PER_GRAM_PROTEIN),
        fat_percentage: share(totals.fat, CALORIES_PER_GRAM_FAT),
        carbs_percentage: share(totals.carbs, CALORIES_PER_GRAM_CARBS),
    }
}

/// Totals for the whole recipe batch
pub fn recipe_nutrition(recipe: &Recipe) -> RecipeNutrition {
    summarize(recipe.ingredients.iter().map(line_nutrition).sum())
}

/// Totals for one serving of the recipe; percentages are unchanged.
///
/// A non-positive yield is treated as a single serving.
pub fn recipe_nutrition_per_serving(recipe: &Recipe) -> RecipeNutrition {
    let batch = recipe_nutrition(recipe);
    let yield_servings = if recipe.servings > 0.0 { recipe.servings } else { 1.0 };
    let per_serving = batch.totals().scale(1.0 / yield_servings);

    MacroSummary {
        total_calories: per_serving.calories,
        total_protein: per_serving.protein,
        total_fat: per_serving.fat,
        total_carbs: per_serving.carbs,
        ..batch
    }
}

/// Totals for a day. Entries already hold absolute values.
pub fn day_nutrition(entries: &[JournalEntry]) -> DayNutrition {
    summarize(entries.iter().map(|e| e.nutrition).sum())
}

/// Snapshot of eating `servings` of an ingredient
pub fn ingredient_entry(ingredient: &Ingredient, servings: f64) -> JournalEntry {
    JournalEntry {
        entry_type: EntryType::Ingredient,
        name: ingredient.name.clone(),
        servings,
        nutrition: ingredient.nutrition.scale(servings),
    }
}

/// Snapshot of eating `servings` of a recipe, scaled from its per-serving
/// nutrition
pub fn recipe_entry(recipe: &Recipe, servings: f64) -> JournalEntry {
    let per_serving = recipe_nutrition_per_serving(recipe).totals();
    JournalEntry {
        entry_type: EntryType::Recipe,
        name: recipe.name.clone(),
        servings,
        nutrition: per_serving.scale(servings),
    }
}

/// Calories implied by macro grams
pub fn calories_from_macros(protein: f64, fat: f64, carbs: f64) -> f64 {
    protein * CALORIES_PER_GRAM_PROTEIN + fat * CALORIES_PER_GRAM_FAT + carbs * CALORIES_PER_GRAM_CARBS
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nutrition::parse_serving;

    const EPS: f64 = 1e-9;

    fn ingredient(name: &str, weight: Option<f64>, n: Nutrition) -> Ingredient {
        Ingredient::new(name, 1.0, "serving", weight, n)
    }

    fn egg() -> Ingredient {
        ingredient(
            "Egg",
            Some(50.0),
            Nutrition { calories: 70.0, protein: 6.0, fat: 5.0, carbs: 0.5 },
        )
    }

    fn cheese() -> Ingredient {
        ingredient(
            "Cheese",
            Some(28.0),
            Nutrition { calories: 110.0, protein: 7.0, fat: 9.0, carbs: 1.0 },
        )
    }

    fn omelette() -> Recipe {
        Recipe::new(
            "Omelette",
            2.0,
            vec![
                RecipeIngredient::with_servings(egg(), 2.0),
                RecipeIngredient::with_servings(cheese(), 1.0),
            ],
        )
    }

    #[test]
    fn test_omelette_totals_and_per_serving() {
        let recipe = omelette();
        let batch = recipe_nutrition(&recipe);
        assert!((batch.total_calories - 250.0).abs() < EPS);
        assert!((batch.total_protein - 19.0).abs() < EPS);

        let per_serving = recipe_nutrition_per_serving(&recipe);
        assert!((per_serving.total_calories - 125.0).abs() < EPS);
        assert!((per_serving.total_calories * recipe.servings - batch.total_calories).abs() < EPS);
        assert_eq!(per_serving.protein_percentage, batch.protein_percentage);
        assert_eq!(per_serving.fat_percentage, batch.fat_percentage);
    }

    #[test]
    fn test_weight_override_beats_servings() {
        let line = RecipeIngredient {
            ingredient: cheese(),
            servings: 5.0,
            weight_grams: Some(56.0),
        };
        assert!((line_multiplier(&line) - 2.0).abs() < EPS);
    }

    #[test]
    fn test_weight_ignored_without_serving_weight() {
        let mut item = cheese();
        item.serving_weight_grams = None;
        let line = RecipeIngredient {
            ingredient: item,
            servings: 3.0,
            weight_grams: Some(56.0),
        };
        assert_eq!(line_multiplier(&line), 3.0);
    }

    #[test]
    fn test_percentages_sum_to_hundred_when_consistent() {
        // 10g protein, 5g fat, 20g carbs -> 40 + 45 + 80 = 165 kcal
        let item = ingredient(
            "Balanced",
            None,
            Nutrition { calories: 165.0, protein: 10.0, fat: 5.0, carbs: 20.0 },
        );
        let recipe = Recipe::new("Balanced", 1.0, vec![RecipeIngredient::with_servings(item, 1.5)]);
        let summary = recipe_nutrition(&recipe);
        let total = summary.protein_percentage + summary.fat_percentage + summary.carbs_percentage;
        assert!((total - 100.0).abs() < 1e-6);
    }

    #[test]
    fn test_zero_calories_reports_zero_percentages() {
        let water = ingredient("Water", Some(240.0), Nutrition::zero());
        let recipe = Recipe::new("Water", 1.0, vec![RecipeIngredient::with_servings(water, 2.0)]);
        let summary = recipe_nutrition(&recipe);
        assert_eq!(summary.total_calories, 0.0);
        assert_eq!(summary.protein_percentage, 0.0);
        assert_eq!(summary.fat_percentage, 0.0);
        assert_eq!(summary.carbs_percentage, 0.0);
    }

    #[test]
    fn test_empty_day_is_all_zero() {
        let summary = day_nutrition(&[]);
        assert_eq!(summary, MacroSummary::default());
    }

    #[test]
    fn test_day_sums_absolute_entries() {
        let entries = vec![
            ingredient_entry(&egg(), 2.0),
            recipe_entry(&omelette(), 1.0),
        ];
        let summary = day_nutrition(&entries);
        assert!((summary.total_calories - 265.0).abs() < EPS);
    }

    #[test]
    fn test_recipe_entry_scales_per_serving() {
        let entry = recipe_entry(&omelette(), 1.5);
        assert_eq!(entry.entry_type, EntryType::Recipe);
        assert!((entry.nutrition.calories - 187.5).abs() < EPS);
    }

    #[test]
    fn test_entries_are_snapshots() {
        let mut item = egg();
        let entry = ingredient_entry(&item, 1.0);
        item.nutrition.calories = 500.0;
        assert_eq!(entry.nutrition.calories, 70.0);
    }

    #[test]
    fn test_banana_by_weight() {
        let banana = Ingredient::new(
            "Banana",
            1.0,
            "medium",
            Some(118.0),
            Nutrition { calories: 105.0, protein: 1.3, fat: 0.4, carbs: 27.0 },
        );
        let parsed = parse_serving("236g", &banana).unwrap();
        let entry = ingredient_entry(&banana, parsed.servings);
        assert!((entry.nutrition.calories - 210.0).abs() < EPS);

        let line = RecipeIngredient::from_amount(banana.clone(), &parse_serving("118g", &banana).unwrap());
        let recipe = Recipe::new("One Banana", 1.0, vec![line]);
        assert!((recipe_nutrition(&recipe).total_calories - 105.0).abs() < EPS);
    }

    #[test]
    fn test_calories_from_macros() {
        assert_eq!(calories_from_macros(10.0, 5.0, 20.0), 165.0);
    }
}
