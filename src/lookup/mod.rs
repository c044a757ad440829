//! Remote food lookup
//!
//! A best-effort query-in/record-out collaborator. Implementations never
//! return errors: a failed call yields no candidates so resolution can fall
//! back to whatever it already has.

mod nutritionix;

pub use nutritionix::NutritionixClient;

use crate::config::Config;
use crate::models::Ingredient;

/// Source of ingredient candidates
pub trait FoodLookup: Send + Sync {
    /// Candidate matches for a query. Candidates may be incomplete
    /// (calories only, all macros zero).
    fn search_candidates(&self, query: &str) -> Vec<Ingredient>;

    /// A single complete record for a query, if the service has one
    fn search_detailed(&self, query: &str) -> Option<Ingredient>;
}

/// Lookup used when no credentials are configured
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledLookup;

impl FoodLookup for DisabledLookup {
    fn search_candidates(&self, _query: &str) -> Vec<Ingredient> {
        Vec::new()
    }

    fn search_detailed(&self, _query: &str) -> Option<Ingredient> {
        None
    }
}

/// Build the lookup described by the configuration
pub fn from_config(config: &Config) -> Box<dyn FoodLookup> {
    match &config.nutritionix {
        Some(nutritionix) => Box::new(NutritionixClient::new(nutritionix.clone())),
        None => {
            tracing::warn!(
                "NUTRITIONIX_APP_ID / NUTRITIONIX_APP_KEY not set; remote lookup disabled"
            );
            Box::new(DisabledLookup)
        }
    }
}
