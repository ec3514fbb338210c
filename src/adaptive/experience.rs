//! Replay-buffer writes: one (state, action, reward, next-state) tuple per
//! emitted recommendation, sharing a single mastery snapshot of the
//! submission. Reward and next-state stay unset here; the delayed-outcome
//! measurement process fills them in later.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::adaptive::types::{
    ConceptResult, ExperienceAction, ExperienceState, LearningLogEntry, Recommendation,
    RewardSignal,
};
use crate::store::{LearningLogStore, StoreError};

pub const ACTION_RECOMMENDATION: &str = "recommendation";

pub struct ExperienceLogger {
    store: Arc<dyn LearningLogStore>,
}

impl ExperienceLogger {
    pub fn new(store: Arc<dyn LearningLogStore>) -> Self {
        Self { store }
    }

    pub fn log(
        &self,
        user_id: &str,
        concept_results: &HashMap<String, ConceptResult>,
        recommendations: &[Recommendation],
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        if recommendations.is_empty() {
            return Ok(());
        }

        let state = ExperienceState {
            concept_mastery: concept_results
                .iter()
                .map(|(concept, result)| (concept.clone(), result.mastery()))
                .collect(),
            timestamp: now,
        };

        let entries: Vec<LearningLogEntry> = recommendations
            .iter()
            .map(|rec| LearningLogEntry {
                id: uuid::Uuid::new_v4().to_string(),
                user_id: user_id.to_string(),
                state: state.clone(),
                action: ExperienceAction {
                    action_type: ACTION_RECOMMENDATION.to_string(),
                    action_id: Some(rec.id.clone()),
                },
                reward: RewardSignal::default(),
                next_state: None,
                created_at: now,
            })
            .collect();

        self.store.append(&entries)
    }
}
