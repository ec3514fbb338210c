use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Concept label applied to answers whose question carries no tag.
pub const GENERAL_CONCEPT: &str = "General";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[derive(Default)]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "easy" => Self::Easy,
            "hard" => Self::Hard,
            _ => Self::Medium,
        }
    }
}

/// Catalog difficulty tier, derived from a mastery score when matching
/// resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[derive(Default)]
pub enum DifficultyTier {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

impl DifficultyTier {
    pub fn from_score(score: f64) -> Self {
        if score < 0.3 {
            Self::Beginner
        } else if score < 0.6 {
            Self::Intermediate
        } else {
            Self::Advanced
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[derive(Default)]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[derive(Default)]
pub enum RecommendationStatus {
    #[default]
    Active,
    Completed,
    Dismissed,
}

/// One graded answer, immutable once produced by grading.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerEvent {
    /// Concept tag of the answered question; `None` maps to "General".
    pub concept: Option<String>,
    pub is_correct: bool,
    pub difficulty: Difficulty,
    /// Missing timestamps are treated as answered just now (no decay).
    pub timestamp: Option<DateTime<Utc>>,
    pub time_spent_ms: i64,
}

impl AnswerEvent {
    pub fn concept_label(&self) -> &str {
        match self.concept.as_deref() {
            Some(c) if !c.is_empty() => c,
            _ => GENERAL_CONCEPT,
        }
    }
}

/// Per-concept tally from an auto-graded quiz submission.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ConceptResult {
    pub correct: u32,
    pub total: u32,
}

impl ConceptResult {
    pub fn new(correct: u32, total: u32) -> Self {
        Self { correct, total }
    }

    /// Fraction correct; zero-attempt concepts carry no signal and score 0.
    pub fn mastery(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            f64::from(self.correct) / f64::from(self.total)
        }
    }
}

/// A graded submission as seen by the velocity calculation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionRecord {
    pub id: String,
    /// Overall score as a percentage (0-100).
    pub score: f64,
    pub submitted_at: DateTime<Utc>,
}

/// Course-staff-authored override: below `threshold` percent, serve this
/// resource instead of consulting the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdaptiveRule {
    pub id: String,
    pub course_id: i64,
    pub concept: String,
    /// Stored as a percentage, e.g. 60 fires below a score of 0.6.
    pub threshold: f64,
    pub resource_title: String,
    pub resource_url: String,
    pub resource_type: String,
    pub priority: Priority,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceEntry {
    pub id: String,
    pub title: String,
    pub url: String,
    pub resource_type: String,
    pub difficulty: DifficultyTier,
    pub concepts: Vec<String>,
    pub estimated_time: Option<String>,
}

impl ResourceEntry {
    pub fn covers(&self, concept: &str) -> bool {
        self.concepts.iter().any(|c| c == concept)
    }
}

/// What resource selection hands back to the generator. Rule-based picks
/// carry no catalog id.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourcePick {
    pub resource_id: Option<String>,
    pub title: String,
    pub url: String,
    pub resource_type: String,
    pub estimated_time: Option<String>,
}

impl ResourcePick {
    pub fn from_catalog(entry: &ResourceEntry) -> Self {
        Self {
            resource_id: Some(entry.id.clone()),
            title: entry.title.clone(),
            url: entry.url.clone(),
            resource_type: entry.resource_type.clone(),
            estimated_time: entry.estimated_time.clone(),
        }
    }

    pub fn from_rule(rule: &AdaptiveRule) -> Self {
        Self {
            resource_id: None,
            title: rule.resource_title.clone(),
            url: rule.resource_url.clone(),
            resource_type: rule.resource_type.clone(),
            estimated_time: Some("15 mins".to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub id: String,
    pub user_id: String,
    pub submission_id: Option<String>,
    pub concept: String,
    pub reason: String,
    pub priority: Priority,
    pub resource: ResourcePick,
    pub status: RecommendationStatus,
    /// 1 (helpful) or -1 (not helpful); set by the learner, not the engine.
    pub user_rating: Option<i32>,
    pub user_feedback: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Recommendation {
    pub fn new(
        user_id: impl Into<String>,
        submission_id: Option<String>,
        concept: impl Into<String>,
        reason: impl Into<String>,
        priority: Priority,
        resource: ResourcePick,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            submission_id,
            concept: concept.into(),
            reason: reason.into(),
            priority,
            resource,
            status: RecommendationStatus::Active,
            user_rating: None,
            user_feedback: None,
            created_at,
            completed_at: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeakConcept {
    pub concept: String,
    pub mastery: f64,
}

/// Snapshot of per-concept mastery at decision time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperienceState {
    pub concept_mastery: HashMap<String, f64>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperienceAction {
    pub action_type: String,
    pub action_id: Option<String>,
}

/// Reward components; all unset at log time and populated later by the
/// delayed-outcome measurement process.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardSignal {
    pub immediate: Option<f64>,
    pub delayed: Option<f64>,
    pub engagement: Option<f64>,
}

/// One (state, action, reward, next-state) tuple of the replay buffer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningLogEntry {
    pub id: String,
    pub user_id: String,
    pub state: ExperienceState,
    pub action: ExperienceAction,
    pub reward: RewardSignal,
    pub next_state: Option<ExperienceState>,
    pub created_at: DateTime<Utc>,
}
