//! Ingredient resolution
//!
//! Decides where an ingredient's nutrition comes from: the local store
//! first, then the remote lookup. Candidates that only carry summary data
//! are enriched with a detail lookup before use.

use serde::Serialize;

use crate::db::{Database, DbResult};
use crate::lookup::FoodLookup;
use crate::models::Ingredient;

/// Persistence needed by resolution
pub trait IngredientStore {
    /// Case-insensitive exact name match
    fn get_ingredient(&self, name: &str) -> DbResult<Option<Ingredient>>;

    /// Save, returning the existing record on a duplicate name
    fn save_ingredient(&self, ingredient: &Ingredient) -> DbResult<Ingredient>;
}

impl IngredientStore for Database {
    fn get_ingredient(&self, name: &str) -> DbResult<Option<Ingredient>> {
        self.with_conn(|conn| Ingredient::get_by_name(conn, name))
    }

    fn save_ingredient(&self, ingredient: &Ingredient) -> DbResult<Ingredient> {
        self.with_conn(|conn| Ingredient::save(conn, ingredient))
    }
}

/// Outcome of resolving a name
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "result", rename_all = "snake_case")]
pub enum Resolution {
    /// Found in the store; used as-is
    Stored(Ingredient),
    /// Came from the lookup and has not been saved
    Resolved(Ingredient),
    /// Several lookup candidates; the caller must pick one
    Ambiguous(Vec<Ingredient>),
    NotFound,
}

/// A caller's pick from an ambiguous candidate list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    /// Zero-based candidate index
    Candidate(usize),
    /// None of the candidates fit; search again under another name
    NoneOfThese,
}

impl Choice {
    /// Interpret a 1-based menu number where `count + 1` means
    /// "none of these". Anything else is out of range.
    pub fn from_menu_number(number: usize, count: usize) -> Option<Self> {
        match number {
            n if n >= 1 && n <= count => Some(Choice::Candidate(n - 1)),
            n if n == count + 1 => Some(Choice::NoneOfThese),
            _ => None,
        }
    }
}

/// Result of applying a choice
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    Resolved(Ingredient),
    RetrySearch,
    Invalid(String),
}

/// Resolve `name` against the store, then the lookup.
///
/// Store failures propagate. Lookup failures look the same as no match.
pub fn resolve_ingredient(
    name: &str,
    lookup: &dyn FoodLookup,
    store: &dyn IngredientStore,
) -> DbResult<Resolution> {
    let name = name.trim();

    if let Some(stored) = store.get_ingredient(name)? {
        tracing::debug!("Resolved '{}' from the store", name);
        return Ok(Resolution::Stored(stored));
    }

    let mut candidates = lookup.search_candidates(name);
    let resolution = match candidates.len() {
        0 => Resolution::NotFound,
        1 => {
            let candidate = candidates.remove(0);
            Resolution::Resolved(enrich(candidate, lookup))
        }
        _ => Resolution::Ambiguous(candidates),
    };

    match &resolution {
        Resolution::NotFound => tracing::info!("No match for '{}'", name),
        Resolution::Ambiguous(list) => {
            tracing::info!("'{}' matched {} candidates", name, list.len())
        }
        _ => tracing::info!("Resolved '{}' from lookup", name),
    }

    Ok(resolution)
}

/// Fill in macros for an incomplete candidate with a detail lookup keyed by
/// its name. The candidate's own display name is kept. When the detail
/// lookup fails the candidate is returned unchanged.
pub fn enrich(candidate: Ingredient, lookup: &dyn FoodLookup) -> Ingredient {
    if !candidate.is_incomplete() {
        return candidate;
    }

    match lookup.search_detailed(&candidate.name) {
        Some(detail) => Ingredient {
            name: candidate.name,
            ..detail
        },
        None => {
            tracing::warn!(
                "Detail lookup for '{}' failed; using summary data",
                candidate.name
            );
            candidate
        }
    }
}

/// Apply a disambiguation choice to a candidate list
pub fn choose_candidate(
    candidates: &[Ingredient],
    choice: Choice,
    lookup: &dyn FoodLookup,
) -> Selection {
    match choice {
        Choice::NoneOfThese => Selection::RetrySearch,
        Choice::Candidate(index) => match candidates.get(index) {
            Some(candidate) => Selection::Resolved(enrich(candidate.clone(), lookup)),
            None => Selection::Invalid(format!(
                "Choice {} is out of range; pick 1-{} or {} for none of these",
                index + 1,
                candidates.len(),
                candidates.len() + 1
            )),
        },
    }
}

/// Apply a 1-based menu number to a candidate list
pub fn choose_by_number(
    candidates: &[Ingredient],
    number: usize,
    lookup: &dyn FoodLookup,
) -> Selection {
    match Choice::from_menu_number(number, candidates.len()) {
        Some(choice) => choose_candidate(candidates, choice, lookup),
        None => Selection::Invalid(format!(
            "Choice {} is out of range; pick 1-{} or {} for none of these",
            number,
            candidates.len(),
            candidates.len() + 1
        )),
    }
}

/// Store a resolved ingredient so later lookups find it.
///
/// Returns `None` when the name already belongs to a stored ingredient; that
/// record is left as it is and the caller keeps using its own ingredient.
pub fn persist(
    ingredient: &Ingredient,
    store: &dyn IngredientStore,
) -> DbResult<Option<Ingredient>> {
    if let Some(existing) = store.get_ingredient(&ingredient.name)? {
        tracing::warn!(
            "Not saving '{}': an ingredient with that name is already stored",
            existing.name
        );
        return Ok(None);
    }

    let saved = store.save_ingredient(ingredient)?;
    tracing::info!("Saved ingredient '{}'", saved.name);
    Ok(Some(saved))
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::models::{Nutrition, StoreId};

    fn summary(name: &str, calories: f64) -> Ingredient {
        Ingredient::new(
            name,
            1.0,
            "serving",
            None,
            Nutrition { calories, ..Nutrition::zero() },
        )
    }

    fn complete(name: &str) -> Ingredient {
        Ingredient::new(
            name,
            1.0,
            "cup",
            Some(245.0),
            Nutrition { calories: 150.0, protein: 8.0, fat: 8.0, carbs: 12.0 },
        )
    }

    #[derive(Default)]
    struct FakeLookup {
        candidates: Vec<Ingredient>,
        detailed: Option<Ingredient>,
        detail_queries: Mutex<Vec<String>>,
    }

    impl FoodLookup for FakeLookup {
        fn search_candidates(&self, _query: &str) -> Vec<Ingredient> {
            self.candidates.clone()
        }

        fn search_detailed(&self, query: &str) -> Option<Ingredient> {
            self.detail_queries.lock().unwrap().push(query.to_string());
            self.detailed.clone()
        }
    }

    #[derive(Default)]
    struct FakeStore {
        items: Mutex<Vec<Ingredient>>,
    }

    impl IngredientStore for FakeStore {
        fn get_ingredient(&self, name: &str) -> DbResult<Option<Ingredient>> {
            let items = self.items.lock().unwrap();
            Ok(items.iter().find(|i| i.name.eq_ignore_ascii_case(name)).cloned())
        }

        fn save_ingredient(&self, ingredient: &Ingredient) -> DbResult<Ingredient> {
            if let Some(existing) = self.get_ingredient(&ingredient.name)? {
                return Ok(existing);
            }
            let mut items = self.items.lock().unwrap();
            let mut saved = ingredient.clone();
            saved.store_id = StoreId::Stored(items.len() as i64 + 1);
            items.push(saved.clone());
            Ok(saved)
        }
    }

    #[test]
    fn test_store_hit_skips_lookup() {
        let store = FakeStore::default();
        store.save_ingredient(&complete("Whole Milk")).unwrap();
        let lookup = FakeLookup {
            candidates: vec![summary("milk", 100.0)],
            ..Default::default()
        };

        match resolve_ingredient("whole milk", &lookup, &store).unwrap() {
            Resolution::Stored(item) => assert_eq!(item.name, "Whole Milk"),
            other => panic!("expected stored, got {:?}", other),
        }
        assert!(lookup.detail_queries.lock().unwrap().is_empty());
    }

    #[test]
    fn test_no_candidates_is_not_found() {
        let resolution =
            resolve_ingredient("unobtainium", &FakeLookup::default(), &FakeStore::default())
                .unwrap();
        assert_eq!(resolution, Resolution::NotFound);
    }

    #[test]
    fn test_single_incomplete_candidate_is_enriched() {
        let lookup = FakeLookup {
            candidates: vec![summary("Milk (Horizon)", 150.0)],
            detailed: Some(complete("milk")),
            ..Default::default()
        };

        let Resolution::Resolved(item) =
            resolve_ingredient("milk", &lookup, &FakeStore::default()).unwrap()
        else {
            panic!("expected resolved");
        };

        assert_eq!(item.name, "Milk (Horizon)");
        assert_eq!(item.nutrition.protein, 8.0);
        assert_eq!(item.serving_weight_grams, Some(245.0));
        assert_eq!(item.store_id, StoreId::Unsaved);
        assert_eq!(*lookup.detail_queries.lock().unwrap(), vec!["Milk (Horizon)"]);
    }

    #[test]
    fn test_failed_enrichment_falls_back_to_candidate() {
        let lookup = FakeLookup {
            candidates: vec![summary("Mystery Snack", 90.0)],
            ..Default::default()
        };

        let resolution = resolve_ingredient("mystery", &lookup, &FakeStore::default()).unwrap();
        assert_eq!(resolution, Resolution::Resolved(summary("Mystery Snack", 90.0)));
    }

    #[test]
    fn test_single_complete_candidate_used_directly() {
        let lookup = FakeLookup {
            candidates: vec![complete("yogurt")],
            ..Default::default()
        };

        let resolution = resolve_ingredient("yogurt", &lookup, &FakeStore::default()).unwrap();
        assert_eq!(resolution, Resolution::Resolved(complete("yogurt")));
        assert!(lookup.detail_queries.lock().unwrap().is_empty());
    }

    #[test]
    fn test_two_incomplete_candidates_then_choose_second() {
        let lookup = FakeLookup {
            candidates: vec![summary("Oat Milk (Oatly)", 120.0), summary("Oat Milk (Silk)", 110.0)],
            detailed: Some(complete("oat milk")),
            ..Default::default()
        };

        let Resolution::Ambiguous(candidates) =
            resolve_ingredient("oat milk", &lookup, &FakeStore::default()).unwrap()
        else {
            panic!("expected ambiguous");
        };
        assert_eq!(candidates.len(), 2);

        match choose_by_number(&candidates, 2, &lookup) {
            Selection::Resolved(item) => {
                assert_eq!(item.name, "Oat Milk (Silk)");
                assert!(!item.is_incomplete());
            }
            other => panic!("expected resolved, got {:?}", other),
        }
        assert_eq!(*lookup.detail_queries.lock().unwrap(), vec!["Oat Milk (Silk)"]);

        assert_eq!(choose_by_number(&candidates, 3, &lookup), Selection::RetrySearch);
        assert!(matches!(choose_by_number(&candidates, 0, &lookup), Selection::Invalid(_)));
        assert!(matches!(choose_by_number(&candidates, 4, &lookup), Selection::Invalid(_)));
        assert!(matches!(
            choose_candidate(&candidates, Choice::Candidate(9), &lookup),
            Selection::Invalid(_)
        ));
    }

    #[test]
    fn test_menu_numbers() {
        assert_eq!(Choice::from_menu_number(1, 3), Some(Choice::Candidate(0)));
        assert_eq!(Choice::from_menu_number(3, 3), Some(Choice::Candidate(2)));
        assert_eq!(Choice::from_menu_number(4, 3), Some(Choice::NoneOfThese));
        assert_eq!(Choice::from_menu_number(0, 3), None);
        assert_eq!(Choice::from_menu_number(5, 3), None);
    }

    #[test]
    fn test_unsaved_resolution_is_not_found_later() {
        let store = FakeStore::default();
        let lookup = FakeLookup {
            candidates: vec![complete("kefir")],
            ..Default::default()
        };

        resolve_ingredient("kefir", &lookup, &store).unwrap();
        assert!(store.get_ingredient("kefir").unwrap().is_none());

        let Resolution::Resolved(item) = resolve_ingredient("kefir", &lookup, &store).unwrap()
        else {
            panic!("expected resolved");
        };
        let saved = persist(&item, &store).unwrap().unwrap();
        assert!(saved.store_id.is_stored());
        assert!(matches!(
            resolve_ingredient("KEFIR", &lookup, &store).unwrap(),
            Resolution::Stored(_)
        ));
    }

    #[test]
    fn test_database_is_an_ingredient_store() {
        let db = Database::in_memory().unwrap();
        let saved = persist(&complete("Skyr"), &db).unwrap();
        assert_eq!(db.get_ingredient("skyr").unwrap(), saved);
    }

    #[test]
    fn test_persist_leaves_stored_name_alone() {
        let store = FakeStore::default();
        let stored = summary("Steel Cut Oats", 300.0);
        store.save_ingredient(&stored).unwrap();

        let looked_up = complete("steel cut oats");
        assert_eq!(persist(&looked_up, &store).unwrap(), None);

        let kept = store.get_ingredient("Steel Cut Oats").unwrap().unwrap();
        assert_eq!(kept.nutrition.calories, 300.0);
        assert_eq!(kept.serving_weight_grams, None);
    }
}
