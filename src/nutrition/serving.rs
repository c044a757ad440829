//! Serving amount parsing
//!
//! Turns user text such as "1", "0.5", "150g" or "5 oz" into a servings
//! count for a particular ingredient.

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;
use thiserror::Error;

use crate::models::Ingredient;

/// 1 oz = 28.3495 g
pub const GRAMS_PER_OUNCE: f64 = 28.3495;

/// A normalized serving amount
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServingAmount {
    pub servings: f64,
    /// Gram amount when the input was a weight
    pub grams: Option<f64>,
    pub display_text: String,
}

/// Why a serving string was rejected
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ServingError {
    #[error("'{0}' has no serving weight, so a gram or ounce amount cannot be converted; use servings instead")]
    NoWeightBasis(String),

    #[error("'{0}' is not a number")]
    NotANumber(String),

    #[error("Serving amount must be greater than 0")]
    NonPositive,

    #[error("Could not understand '{0}'; use servings (e.g. 1, 0.5) or a weight (e.g. 150g, 5oz)")]
    Unparseable(String),
}

fn weight_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)^(\d+(?:\.\d+)?)\s*(g|oz)$").expect("weight pattern is a valid regex")
    })
}

/// Parse a serving amount for `ingredient`.
///
/// Weights are converted through the ingredient's serving weight; anything
/// else must be a plain positive number of servings.
pub fn parse_serving(input: &str, ingredient: &Ingredient) -> Result<ServingAmount, ServingError> {
    let trimmed = input.trim();

    let Some(caps) = weight_pattern().captures(trimmed) else {
        return parse_servings_count(trimmed);
    };

    let amount: f64 = caps[1]
        .parse()
        .map_err(|_| ServingError::NotANumber(trimmed.to_string()))?;
    let grams = if caps[2].eq_ignore_ascii_case("oz") {
        amount * GRAMS_PER_OUNCE
    } else {
        amount
    };

    let grams_per_serving = ingredient
        .weight_basis()
        .ok_or_else(|| ServingError::NoWeightBasis(ingredient.name.clone()))?;

    if grams <= 0.0 {
        return Err(ServingError::NonPositive);
    }

    let servings = grams / grams_per_serving;
    Ok(ServingAmount {
        servings,
        grams: Some(grams),
        display_text: format!("{:.1} servings ({}g)", servings, grams as i64),
    })
}

/// Parse a plain servings count. Recipes only accept this form since they
/// carry no serving weight.
pub fn parse_servings_count(input: &str) -> Result<ServingAmount, ServingError> {
    let trimmed = input.trim();

    match trimmed.parse::<f64>() {
        Ok(value) if !value.is_finite() => Err(ServingError::NotANumber(trimmed.to_string())),
        Ok(value) if value <= 0.0 => Err(ServingError::NonPositive),
        Ok(servings) => Ok(ServingAmount {
            servings,
            grams: None,
            display_text: servings_display(servings),
        }),
        Err(_) if starts_with_number(trimmed) => {
            Err(ServingError::Unparseable(trimmed.to_string()))
        }
        Err(_) => Err(ServingError::NotANumber(trimmed.to_string())),
    }
}

/// "2 servings" for whole numbers, "0.5 servings" otherwise
pub fn servings_display(servings: f64) -> String {
    if servings.fract() == 0.0 {
        format!("{} servings", servings as i64)
    } else {
        format!("{:.1} servings", servings)
    }
}

/// Numeric prefix followed by something else, e.g. "3xyz" or "5 lb"
fn starts_with_number(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_digit() => true,
        Some('.' | '-' | '+') => chars.next().is_some_and(|c| c.is_ascii_digit()),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Nutrition;

    fn banana() -> Ingredient {
        Ingredient::new(
            "Banana",
            1.0,
            "medium",
            Some(118.0),
            Nutrition { calories: 105.0, protein: 1.3, fat: 0.4, carbs: 27.0 },
        )
    }

    fn no_weight() -> Ingredient {
        Ingredient::new(
            "Mystery Bar",
            1.0,
            "bar",
            None,
            Nutrition { calories: 200.0, protein: 10.0, fat: 8.0, carbs: 20.0 },
        )
    }

    #[test]
    fn test_weight_in_grams() {
        let parsed = parse_serving("236g", &banana()).unwrap();
        assert!((parsed.servings - 2.0).abs() < 1e-9);
        assert_eq!(parsed.grams, Some(236.0));
        assert_eq!(parsed.display_text, "2.0 servings (236g)");
    }

    #[test]
    fn test_exact_serving_weight_is_one_serving() {
        let parsed = parse_serving("118g", &banana()).unwrap();
        assert!((parsed.servings - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_weight_variants_accepted() {
        for input in ["150g", "150 g", "150G", "5oz", "5 OZ", "  5 oz  ", "12.5g"] {
            assert!(parse_serving(input, &banana()).is_ok(), "{input} should parse");
        }
    }

    #[test]
    fn test_ounces_convert_to_grams() {
        let parsed = parse_serving("5oz", &banana()).unwrap();
        let grams = 5.0 * GRAMS_PER_OUNCE;
        assert!((parsed.servings - grams / 118.0).abs() < 1e-9);
        assert_eq!(parsed.display_text, "1.2 servings (141g)");
    }

    #[test]
    fn test_weight_without_basis_is_rejected() {
        assert_eq!(
            parse_serving("150g", &no_weight()),
            Err(ServingError::NoWeightBasis("Mystery Bar".to_string()))
        );
        // A plain count still works for the same ingredient
        assert!(parse_serving("2", &no_weight()).is_ok());
    }

    #[test]
    fn test_plain_servings() {
        let two = parse_serving("2", &banana()).unwrap();
        assert_eq!(two.servings, 2.0);
        assert_eq!(two.grams, None);
        assert_eq!(two.display_text, "2 servings");

        let half = parse_serving("0.5", &banana()).unwrap();
        assert_eq!(half.servings, 0.5);
        assert_eq!(half.display_text, "0.5 servings");
    }

    #[test]
    fn test_rejections() {
        let item = banana();
        assert_eq!(parse_serving("0", &item), Err(ServingError::NonPositive));
        assert_eq!(parse_serving("-1", &item), Err(ServingError::NonPositive));
        assert_eq!(parse_serving("-3", &item), Err(ServingError::NonPositive));
        assert_eq!(parse_serving("0g", &item), Err(ServingError::NonPositive));
        assert!(matches!(parse_serving("abc", &item), Err(ServingError::NotANumber(_))));
        assert!(matches!(parse_serving("", &item), Err(ServingError::NotANumber(_))));
        assert!(matches!(parse_serving("NaN", &item), Err(ServingError::NotANumber(_))));
        assert!(matches!(parse_serving("3xyz", &item), Err(ServingError::Unparseable(_))));
        assert!(matches!(parse_serving("5 lb", &item), Err(ServingError::Unparseable(_))));
        assert!(matches!(parse_serving("150gg", &item), Err(ServingError::Unparseable(_))));
    }
}
