use serde::{Deserialize, Serialize};

use crate::adaptive::types::Difficulty;

/// Weights for the mastery fold. All deltas are applied multiplied by the
/// recency and difficulty weights, and the running score is clamped to
/// [0, 1] after every event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MasteryWeights {
    pub initial_mastery: f64,
    /// Per-week exponential decay applied to older answers.
    pub recency_decay: f64,
    pub correct_delta: f64,
    pub incorrect_delta: f64,
    pub easy_weight: f64,
    pub medium_weight: f64,
    pub hard_weight: f64,
}

impl Default for MasteryWeights {
    fn default() -> Self {
        Self {
            initial_mastery: 0.5,
            recency_decay: 0.9,
            correct_delta: 0.15,
            incorrect_delta: -0.2,
            easy_weight: 0.8,
            medium_weight: 1.0,
            hard_weight: 1.2,
        }
    }
}

impl MasteryWeights {
    pub fn difficulty_weight(&self, difficulty: Difficulty) -> f64 {
        match difficulty {
            Difficulty::Easy => self.easy_weight,
            Difficulty::Medium => self.medium_weight,
            Difficulty::Hard => self.hard_weight,
        }
    }
}

/// When prerequisite caps are applied to estimated mastery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[derive(Default)]
pub enum PropagationMode {
    /// Cap only course-agnostic estimates; per-course estimates pass
    /// through raw.
    #[default]
    CourseAgnosticOnly,
    Always,
    Disabled,
}

impl PropagationMode {
    pub fn applies(&self, course_scoped: bool) -> bool {
        match self {
            Self::CourseAgnosticOnly => !course_scoped,
            Self::Always => true,
            Self::Disabled => false,
        }
    }

    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "always" => Self::Always,
            "disabled" => Self::Disabled,
            _ => Self::CourseAgnosticOnly,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DependencyConfig {
    pub mode: PropagationMode,
    /// A concept may exceed its weakest prerequisite by this factor.
    pub prerequisite_margin: f64,
    /// Assumed mastery for prerequisites absent from the score map.
    pub missing_prerequisite_mastery: f64,
}

impl Default for DependencyConfig {
    fn default() -> Self {
        Self {
            mode: PropagationMode::default(),
            prerequisite_margin: 1.2,
            missing_prerequisite_mastery: 0.5,
        }
    }
}

/// Mastery cutoffs that drive recommendation priority and prerequisite
/// discovery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriorityBands {
    /// Below this, a quiz concept gets a high-priority recommendation.
    pub high_below: f64,
    /// Below this (and at or above `high_below`), medium priority.
    pub review_below: f64,
    /// Assessment path: only concepts below this get a recommendation.
    pub assessment_review_below: f64,
    /// Concepts below this trigger a prerequisite inspection.
    pub prerequisite_check_below: f64,
    /// A co-tested prerequisite below this is recommended directly.
    pub weak_prerequisite_below: f64,
}

impl Default for PriorityBands {
    fn default() -> Self {
        Self {
            high_below: 0.4,
            review_below: 0.7,
            assessment_review_below: 0.6,
            prerequisite_check_below: 0.5,
            weak_prerequisite_below: 0.6,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BanditConfig {
    /// Exploration coefficient for the UCB term.
    pub alpha: f64,
    /// Dimension of the context vector; arm matrices are d x d.
    pub context_dim: usize,
}

impl Default for BanditConfig {
    fn default() -> Self {
        Self {
            alpha: 1.0,
            context_dim: 4,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub mastery: MasteryWeights,
    pub dependencies: DependencyConfig,
    pub priorities: PriorityBands,
    pub bandit: BanditConfig,
    /// Default cutoff for `identify_weak_concepts`.
    pub weak_threshold: f64,
    /// Default window for `learning_velocity`.
    pub velocity_window_days: i64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            mastery: MasteryWeights::default(),
            dependencies: DependencyConfig::default(),
            priorities: PriorityBands::default(),
            bandit: BanditConfig::default(),
            weak_threshold: 0.6,
            velocity_window_days: 7,
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("ENGINE_PROPAGATION_MODE") {
            config.dependencies.mode = PropagationMode::parse(&val);
        }
        if let Ok(val) = std::env::var("ENGINE_RECENCY_DECAY") {
            if let Ok(parsed) = val.parse::<f64>() {
                config.mastery.recency_decay = parsed;
            }
        }
        if let Ok(val) = std::env::var("ENGINE_BANDIT_ALPHA") {
            if let Ok(parsed) = val.parse::<f64>() {
                config.bandit.alpha = parsed;
            }
        }
        if let Ok(val) = std::env::var("ENGINE_WEAK_THRESHOLD") {
            if let Ok(parsed) = val.parse::<f64>() {
                config.weak_threshold = parsed;
            }
        }

        config
    }
}
