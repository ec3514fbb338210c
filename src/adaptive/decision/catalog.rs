//! Rule-first selection with a cascading catalog lookup: concept at the
//! matched difficulty, then the concept at any difficulty, then the
//! "General" shelf at the matched difficulty. Each tier is an explicit
//! step tried in order until one yields an entry.

use std::sync::Arc;

use crate::adaptive::decision::policy::{ResourceSelectionPolicy, SelectionRequest};
use crate::adaptive::decision::rules::first_matching_rule;
use crate::adaptive::types::{DifficultyTier, ResourceEntry, ResourcePick, GENERAL_CONCEPT};
use crate::store::{ResourceCatalog, RuleStore, StoreError};

/// One catalog fallback tier.
trait CatalogTier: Send + Sync {
    fn try_select(
        &self,
        catalog: &Arc<dyn ResourceCatalog>,
        concept: &str,
        tier: DifficultyTier,
    ) -> Result<Option<ResourceEntry>, StoreError>;
}

struct ConceptAtTier;
struct ConceptAnyTier;
struct GeneralAtTier;

impl CatalogTier for ConceptAtTier {
    fn try_select(
        &self,
        catalog: &Arc<dyn ResourceCatalog>,
        concept: &str,
        tier: DifficultyTier,
    ) -> Result<Option<ResourceEntry>, StoreError> {
        catalog.find(concept, Some(tier))
    }
}

impl CatalogTier for ConceptAnyTier {
    fn try_select(
        &self,
        catalog: &Arc<dyn ResourceCatalog>,
        concept: &str,
        _tier: DifficultyTier,
    ) -> Result<Option<ResourceEntry>, StoreError> {
        catalog.find(concept, None)
    }
}

impl CatalogTier for GeneralAtTier {
    fn try_select(
        &self,
        catalog: &Arc<dyn ResourceCatalog>,
        _concept: &str,
        tier: DifficultyTier,
    ) -> Result<Option<ResourceEntry>, StoreError> {
        catalog.find(GENERAL_CONCEPT, Some(tier))
    }
}

const FALLBACK_TIERS: [&dyn CatalogTier; 3] = [&ConceptAtTier, &ConceptAnyTier, &GeneralAtTier];

/// The launch selection policy: adaptive-rule overrides first, then the
/// difficulty-matched catalog cascade.
pub struct RuleAndCatalogPolicy {
    rules: Arc<dyn RuleStore>,
    catalog: Arc<dyn ResourceCatalog>,
}

impl RuleAndCatalogPolicy {
    pub fn new(rules: Arc<dyn RuleStore>, catalog: Arc<dyn ResourceCatalog>) -> Self {
        Self { rules, catalog }
    }
}

impl ResourceSelectionPolicy for RuleAndCatalogPolicy {
    fn select(&self, request: &SelectionRequest) -> Result<Option<ResourcePick>, StoreError> {
        if let Some(pick) = first_matching_rule(&self.rules, request)? {
            return Ok(Some(pick));
        }

        let target = DifficultyTier::from_score(request.score);
        for tier in FALLBACK_TIERS {
            if let Some(entry) = tier.try_select(&self.catalog, &request.concept, target)? {
                return Ok(Some(ResourcePick::from_catalog(&entry)));
            }
        }

        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adaptive::types::{AdaptiveRule, Priority};
    use crate::store::memory::InMemoryStore;

    fn resource(id: &str, concept: &str, tier: DifficultyTier) -> ResourceEntry {
        ResourceEntry {
            id: id.to_string(),
            title: format!("{concept} {id}"),
            url: format!("https://example.com/{id}"),
            resource_type: "article".to_string(),
            difficulty: tier,
            concepts: vec![concept.to_string()],
            estimated_time: Some("20 mins".to_string()),
        }
    }

    fn policy(store: Arc<InMemoryStore>) -> RuleAndCatalogPolicy {
        RuleAndCatalogPolicy::new(store.clone(), store)
    }

    #[test]
    fn rule_override_beats_catalog_match() {
        let store = Arc::new(InMemoryStore::new());
        store.add_resource(resource("generic", "Loops", DifficultyTier::Intermediate));
        store.add_rule(AdaptiveRule {
            id: "r1".to_string(),
            course_id: 1,
            concept: "Loops".to_string(),
            threshold: 60.0,
            resource_title: "Staff pick".to_string(),
            resource_url: "https://example.com/staff".to_string(),
            resource_type: "video".to_string(),
            priority: Priority::High,
        });

        let pick = policy(store)
            .select(&SelectionRequest::new("Loops", 0.5, Some(1)))
            .unwrap()
            .unwrap();
        assert_eq!(pick.title, "Staff pick");
        assert!(pick.resource_id.is_none());
    }

    #[test]
    fn difficulty_matched_entry_preferred() {
        let store = Arc::new(InMemoryStore::new());
        store.add_resource(resource("advanced", "Loops", DifficultyTier::Advanced));
        store.add_resource(resource("beginner", "Loops", DifficultyTier::Beginner));

        let pick = policy(store)
            .select(&SelectionRequest::new("Loops", 0.1, None))
            .unwrap()
            .unwrap();
        assert_eq!(pick.resource_id.as_deref(), Some("beginner"));
    }

    #[test]
    fn falls_back_to_concept_at_any_difficulty() {
        let store = Arc::new(InMemoryStore::new());
        store.add_resource(resource("advanced", "Loops", DifficultyTier::Advanced));

        let pick = policy(store)
            .select(&SelectionRequest::new("Loops", 0.1, None))
            .unwrap()
            .unwrap();
        assert_eq!(pick.resource_id.as_deref(), Some("advanced"));
    }

    #[test]
    fn falls_back_to_general_shelf() {
        let store = Arc::new(InMemoryStore::new());
        store.add_resource(resource("g1", "General", DifficultyTier::Beginner));

        let pick = policy(store)
            .select(&SelectionRequest::new("Loops", 0.1, None))
            .unwrap()
            .unwrap();
        assert_eq!(pick.resource_id.as_deref(), Some("g1"));
    }

    #[test]
    fn general_fallback_still_filters_by_difficulty() {
        let store = Arc::new(InMemoryStore::new());
        store.add_resource(resource("g1", "General", DifficultyTier::Advanced));

        // Target tier is beginner; the advanced General entry must not match.
        let pick = policy(store)
            .select(&SelectionRequest::new("Loops", 0.1, None))
            .unwrap();
        assert!(pick.is_none());
    }

    #[test]
    fn empty_catalog_yields_none() {
        let store = Arc::new(InMemoryStore::new());
        let pick = policy(store)
            .select(&SelectionRequest::new("Loops", 0.5, Some(1)))
            .unwrap();
        assert!(pick.is_none());
    }
}
