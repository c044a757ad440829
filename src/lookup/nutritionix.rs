//! Nutritionix API client
//!
//! Uses the blocking reqwest client, so calls must run off the async
//! runtime (the MCP server wraps them in `spawn_blocking`).

use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;

use super::FoodLookup;
use crate::config::NutritionixConfig;
use crate::models::{Ingredient, Nutrition};

/// Instant search returns at most this many candidates
const MAX_CANDIDATES: usize = 5;

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Default, Deserialize)]
struct InstantResponse {
    #[serde(default)]
    common: Vec<InstantFood>,
    #[serde(default)]
    branded: Vec<InstantFood>,
}

#[derive(Debug, Deserialize)]
struct InstantFood {
    food_name: String,
    brand_name: Option<String>,
    serving_qty: Option<f64>,
    serving_unit: Option<String>,
    nf_calories: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct NaturalResponse {
    #[serde(default)]
    foods: Vec<NaturalFood>,
}

#[derive(Debug, Deserialize)]
struct NaturalFood {
    food_name: String,
    serving_qty: Option<f64>,
    serving_unit: Option<String>,
    serving_weight_grams: Option<f64>,
    nf_calories: Option<f64>,
    nf_protein: Option<f64>,
    nf_total_fat: Option<f64>,
    nf_total_carbohydrate: Option<f64>,
}

fn serving_qty(qty: Option<f64>) -> f64 {
    qty.filter(|q| *q > 0.0).unwrap_or(1.0)
}

fn serving_unit(unit: Option<String>) -> String {
    unit.filter(|u| !u.trim().is_empty())
        .unwrap_or_else(|| "serving".to_string())
}

impl InstantFood {
    /// Summary-only candidate: calories but no macros or weight
    fn into_candidate(self) -> Ingredient {
        let name = match self.brand_name.as_deref().map(str::trim) {
            Some(brand) if !brand.is_empty() => format!("{} ({})", self.food_name, brand),
            _ => self.food_name,
        };

        Ingredient::new(
            name,
            serving_qty(self.serving_qty),
            serving_unit(self.serving_unit),
            None,
            Nutrition {
                calories: self.nf_calories.unwrap_or(0.0),
                ..Nutrition::zero()
            },
        )
    }
}

impl NaturalFood {
    fn into_ingredient(self) -> Ingredient {
        Ingredient::new(
            self.food_name,
            serving_qty(self.serving_qty),
            serving_unit(self.serving_unit),
            self.serving_weight_grams.filter(|w| *w > 0.0),
            Nutrition {
                calories: self.nf_calories.unwrap_or(0.0),
                protein: self.nf_protein.unwrap_or(0.0),
                fat: self.nf_total_fat.unwrap_or(0.0),
                carbs: self.nf_total_carbohydrate.unwrap_or(0.0),
            },
        )
    }
}

/// Branded results first, then common foods, capped at five
fn merge_instant(response: InstantResponse) -> Vec<Ingredient> {
    response
        .branded
        .into_iter()
        .chain(response.common)
        .take(MAX_CANDIDATES)
        .map(InstantFood::into_candidate)
        .collect()
}

// ============================================================================
// Client
// ============================================================================

/// Lookup backed by the Nutritionix v2 API
#[derive(Debug, Clone)]
pub struct NutritionixClient {
    config: NutritionixConfig,
}

impl NutritionixClient {
    pub fn new(config: NutritionixConfig) -> Self {
        Self { config }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// Send a request and decode the JSON body. Failures are logged and
    /// reported as `None`.
    fn send<T: DeserializeOwned>(
        &self,
        build: impl FnOnce(&Client) -> reqwest::blocking::RequestBuilder,
    ) -> Option<T> {
        let client = match Client::builder().timeout(self.config.timeout).build() {
            Ok(client) => client,
            Err(e) => {
                tracing::warn!("Failed to build HTTP client: {}", e);
                return None;
            }
        };

        let request = build(&client)
            .header("x-app-id", &self.config.app_id)
            .header("x-app-key", &self.config.app_key);

        let response = match request.send() {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("Nutritionix request failed: {}", e);
                return None;
            }
        };

        let status = response.status();
        if !status.is_success() {
            tracing::warn!("Nutritionix returned HTTP {}", status);
            return None;
        }

        match response.json::<T>() {
            Ok(body) => Some(body),
            Err(e) => {
                tracing::warn!("Failed to decode Nutritionix response: {}", e);
                None
            }
        }
    }

    fn instant_search(&self, query: &str) -> Vec<Ingredient> {
        let url = self.url("/v2/search/instant");
        self.send::<InstantResponse>(|client| client.get(&url).query(&[("query", query)]))
            .map(merge_instant)
            .unwrap_or_default()
    }

    fn natural_nutrients(&self, query: &str) -> Vec<Ingredient> {
        let url = self.url("/v2/natural/nutrients");
        self.send::<NaturalResponse>(|client| client.post(&url).json(&json!({ "query": query })))
            .map(|body| {
                body.foods
                    .into_iter()
                    .map(NaturalFood::into_ingredient)
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl FoodLookup for NutritionixClient {
    fn search_candidates(&self, query: &str) -> Vec<Ingredient> {
        let candidates = self.instant_search(query);
        if !candidates.is_empty() {
            tracing::debug!("Instant search for '{}' gave {} candidates", query, candidates.len());
            return candidates;
        }

        tracing::debug!("Instant search for '{}' was empty; trying natural nutrients", query);
        self.natural_nutrients(query)
    }

    fn search_detailed(&self, query: &str) -> Option<Ingredient> {
        best_detail(self.natural_nutrients(query))
    }
}

/// First food with macros and a serving weight, else the first food
fn best_detail(foods: Vec<Ingredient>) -> Option<Ingredient> {
    let complete = foods
        .iter()
        .position(|food| !food.is_incomplete() && food.weight_basis().is_some());
    foods.into_iter().nth(complete.unwrap_or(0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instant_results_put_branded_first_and_cap_at_five() {
        let body = r#"{
            "common": [
                {"food_name": "apple", "serving_qty": 1, "serving_unit": "medium"},
                {"food_name": "apple pie"},
                {"food_name": "apple juice", "serving_unit": "cup"}
            ],
            "branded": [
                {"food_name": "Apple Chips", "brand_name": "Bare", "nf_calories": 140, "serving_qty": 1, "serving_unit": "bag"},
                {"food_name": "Apple Sauce", "brand_name": "", "nf_calories": 50},
                {"food_name": "Apple Bar", "brand_name": "Larabar", "nf_calories": 190}
            ]
        }"#;
        let response: InstantResponse = serde_json::from_str(body).unwrap();
        let candidates = merge_instant(response);

        let names: Vec<_> = candidates.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["Apple Chips (Bare)", "Apple Sauce", "Apple Bar (Larabar)", "apple", "apple pie"]
        );
        assert!(candidates.iter().all(Ingredient::is_incomplete));
        assert!(candidates.iter().all(|c| c.serving_weight_grams.is_none()));
        assert_eq!(candidates[0].nutrition.calories, 140.0);
        assert_eq!(candidates[4].serving_unit, "serving");
        assert_eq!(candidates[4].serving_size, 1.0);
    }

    #[test]
    fn test_natural_food_maps_full_macros() {
        let body = r#"{"foods": [{
            "food_name": "banana",
            "serving_qty": 1,
            "serving_unit": "medium (7\" to 7-7/8\" long)",
            "serving_weight_grams": 118,
            "nf_calories": 105.02,
            "nf_protein": 1.29,
            "nf_total_fat": 0.39,
            "nf_total_carbohydrate": 26.95
        }]}"#;
        let response: NaturalResponse = serde_json::from_str(body).unwrap();
        let banana = response.foods.into_iter().next().unwrap().into_ingredient();

        assert_eq!(banana.serving_weight_grams, Some(118.0));
        assert!(!banana.is_incomplete());
        assert!(!banana.store_id.is_stored());
        assert!((banana.nutrition.carbs - 26.95).abs() < 1e-9);
    }

    #[test]
    fn test_detail_prefers_complete_food_with_weight() {
        let body = r#"{"foods": [
            {"food_name": "oats", "nf_calories": 150},
            {"food_name": "oats", "nf_calories": 300, "nf_protein": 10, "nf_total_fat": 5},
            {"food_name": "oats", "serving_weight_grams": 40, "nf_calories": 150, "nf_protein": 5, "nf_total_carbohydrate": 27}
        ]}"#;
        let response: NaturalResponse = serde_json::from_str(body).unwrap();
        let foods: Vec<_> = response.foods.into_iter().map(NaturalFood::into_ingredient).collect();

        let detail = best_detail(foods.clone()).unwrap();
        assert_eq!(detail.serving_weight_grams, Some(40.0));

        let fallback = best_detail(foods[..2].to_vec()).unwrap();
        assert_eq!(fallback.nutrition.calories, 150.0);
        assert!(best_detail(Vec::new()).is_none());
    }

    #[test]
    fn test_missing_lists_decode_as_empty() {
        let response: InstantResponse = serde_json::from_str("{}").unwrap();
        assert!(merge_instant(response).is_empty());
        let response: NaturalResponse = serde_json::from_str("{}").unwrap();
        assert!(response.foods.is_empty());
    }
}
