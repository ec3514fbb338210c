use crate::adaptive::types::ResourcePick;
use crate::store::StoreError;

/// One resource-selection decision point.
#[derive(Debug, Clone)]
pub struct SelectionRequest {
    pub concept: String,
    /// Mastery fraction in [0, 1] driving difficulty matching.
    pub score: f64,
    pub course_id: Option<i64>,
}

impl SelectionRequest {
    pub fn new(concept: impl Into<String>, score: f64, course_id: Option<i64>) -> Self {
        Self {
            concept: concept.into(),
            score,
            course_id,
        }
    }
}

/// Strategy seam for resource selection. `Ok(None)` means "no
/// recommendation issuable", never an error.
pub trait ResourceSelectionPolicy: Send + Sync {
    fn select(&self, request: &SelectionRequest) -> Result<Option<ResourcePick>, StoreError>;

    /// Feed an observed reward back into the policy. The rule/catalog
    /// policy learns nothing; the bandit updates its arm statistics.
    fn observe_reward(
        &self,
        _request: &SelectionRequest,
        _resource_id: &str,
        _reward: f64,
    ) -> Result<(), StoreError> {
        Ok(())
    }
}
