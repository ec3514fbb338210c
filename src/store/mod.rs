//! Storage seam: the engine reads rules, catalog entries, and answer
//! history, and writes recommendations, learning-log entries, and bandit
//! parameters, all through these traits. The concrete backend is the
//! host application's concern; [`memory::InMemoryStore`] is the reference
//! implementation.

pub mod memory;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::adaptive::decision::linucb::ArmParameters;
use crate::adaptive::types::{
    AdaptiveRule, AnswerEvent, DifficultyTier, LearningLogEntry, Recommendation, ResourceEntry,
    SubmissionRecord,
};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage backend failure: {0}")]
    Backend(String),
    #[error("stored record could not be decoded: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Read side of grading: a user's answers and submissions.
pub trait AnswerHistory: Send + Sync {
    /// Graded answers for a user, oldest first, optionally restricted to
    /// one course.
    fn answers(
        &self,
        user_id: &str,
        course_id: Option<i64>,
    ) -> Result<Vec<AnswerEvent>, StoreError>;

    /// Submissions at or after `since`, ascending by submission time.
    fn submissions_since(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<SubmissionRecord>, StoreError>;
}

/// Course-staff-authored rule overrides, in insertion order.
pub trait RuleStore: Send + Sync {
    fn rules_for(&self, course_id: i64, concept: &str) -> Result<Vec<AdaptiveRule>, StoreError>;
}

/// Read-only remediation resource catalog.
pub trait ResourceCatalog: Send + Sync {
    /// First entry tagged with `concept`, optionally difficulty-filtered.
    fn find(
        &self,
        concept: &str,
        tier: Option<DifficultyTier>,
    ) -> Result<Option<ResourceEntry>, StoreError>;

    /// Every entry tagged with `concept`; the bandit's candidate arms.
    fn candidates(&self, concept: &str) -> Result<Vec<ResourceEntry>, StoreError>;
}

/// Recommendation persistence. `insert_batch` is atomic: implementations
/// must commit the whole batch or none of it.
pub trait RecommendationStore: Send + Sync {
    fn insert_batch(&self, recommendations: &[Recommendation]) -> Result<(), StoreError>;

    fn list_for_user(&self, user_id: &str) -> Result<Vec<Recommendation>, StoreError>;
}

/// Append-only replay buffer for future RL training.
pub trait LearningLogStore: Send + Sync {
    fn append(&self, entries: &[LearningLogEntry]) -> Result<(), StoreError>;

    fn replay_for_user(&self, user_id: &str) -> Result<Vec<LearningLogEntry>, StoreError>;
}

/// Per-resource LinUCB sufficient statistics. Records are created lazily
/// on first exposure and never deleted while the resource exists.
pub trait BanditStore: Send + Sync {
    fn load(&self, resource_id: &str) -> Result<Option<ArmParameters>, StoreError>;

    fn save(&self, params: &ArmParameters) -> Result<(), StoreError>;
}
