//! In-memory reference store: a key-value-style backend good enough for
//! tests, demos, and single-process deployments. Each write method takes
//! its write lock for the whole batch, so one generation call's writes
//! never interleave with another's.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use crate::adaptive::decision::linucb::ArmParameters;
use crate::adaptive::types::{
    AdaptiveRule, AnswerEvent, DifficultyTier, LearningLogEntry, Recommendation, ResourceEntry,
    SubmissionRecord,
};
use crate::store::{
    AnswerHistory, BanditStore, LearningLogStore, RecommendationStore, ResourceCatalog, RuleStore,
    StoreError,
};

#[derive(Debug, Clone)]
struct StoredAnswer {
    course_id: Option<i64>,
    event: AnswerEvent,
}

#[derive(Default)]
pub struct InMemoryStore {
    answers: RwLock<HashMap<String, Vec<StoredAnswer>>>,
    submissions: RwLock<HashMap<String, Vec<SubmissionRecord>>>,
    rules: RwLock<Vec<AdaptiveRule>>,
    resources: RwLock<Vec<ResourceEntry>>,
    recommendations: RwLock<HashMap<String, Vec<Recommendation>>>,
    learning_logs: RwLock<HashMap<String, Vec<LearningLogEntry>>>,
    arms: RwLock<HashMap<String, ArmParameters>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_answer(&self, user_id: &str, course_id: Option<i64>, event: AnswerEvent) {
        self.answers
            .write()
            .entry(user_id.to_string())
            .or_default()
            .push(StoredAnswer { course_id, event });
    }

    pub fn add_submission(&self, user_id: &str, submission: SubmissionRecord) {
        self.submissions
            .write()
            .entry(user_id.to_string())
            .or_default()
            .push(submission);
    }

    pub fn add_rule(&self, rule: AdaptiveRule) {
        self.rules.write().push(rule);
    }

    pub fn add_resource(&self, resource: ResourceEntry) {
        self.resources.write().push(resource);
    }
}

impl AnswerHistory for InMemoryStore {
    fn answers(
        &self,
        user_id: &str,
        course_id: Option<i64>,
    ) -> Result<Vec<AnswerEvent>, StoreError> {
        let guard = self.answers.read();
        let mut events: Vec<AnswerEvent> = guard
            .get(user_id)
            .map(|stored| {
                stored
                    .iter()
                    .filter(|s| course_id.is_none() || s.course_id == course_id)
                    .map(|s| s.event.clone())
                    .collect()
            })
            .unwrap_or_default();
        events.sort_by_key(|e| e.timestamp);
        Ok(events)
    }

    fn submissions_since(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<SubmissionRecord>, StoreError> {
        let guard = self.submissions.read();
        let mut records: Vec<SubmissionRecord> = guard
            .get(user_id)
            .map(|subs| {
                subs.iter()
                    .filter(|s| s.submitted_at >= since)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        records.sort_by_key(|s| s.submitted_at);
        Ok(records)
    }
}

impl RuleStore for InMemoryStore {
    fn rules_for(&self, course_id: i64, concept: &str) -> Result<Vec<AdaptiveRule>, StoreError> {
        Ok(self
            .rules
            .read()
            .iter()
            .filter(|r| r.course_id == course_id && r.concept == concept)
            .cloned()
            .collect())
    }
}

impl ResourceCatalog for InMemoryStore {
    fn find(
        &self,
        concept: &str,
        tier: Option<DifficultyTier>,
    ) -> Result<Option<ResourceEntry>, StoreError> {
        Ok(self
            .resources
            .read()
            .iter()
            .find(|r| r.covers(concept) && tier.map_or(true, |t| r.difficulty == t))
            .cloned())
    }

    fn candidates(&self, concept: &str) -> Result<Vec<ResourceEntry>, StoreError> {
        Ok(self
            .resources
            .read()
            .iter()
            .filter(|r| r.covers(concept))
            .cloned()
            .collect())
    }
}

impl RecommendationStore for InMemoryStore {
    fn insert_batch(&self, recommendations: &[Recommendation]) -> Result<(), StoreError> {
        let mut guard = self.recommendations.write();
        for rec in recommendations {
            guard
                .entry(rec.user_id.clone())
                .or_default()
                .push(rec.clone());
        }
        Ok(())
    }

    fn list_for_user(&self, user_id: &str) -> Result<Vec<Recommendation>, StoreError> {
        Ok(self
            .recommendations
            .read()
            .get(user_id)
            .cloned()
            .unwrap_or_default())
    }
}

impl LearningLogStore for InMemoryStore {
    fn append(&self, entries: &[LearningLogEntry]) -> Result<(), StoreError> {
        let mut guard = self.learning_logs.write();
        for entry in entries {
            guard
                .entry(entry.user_id.clone())
                .or_default()
                .push(entry.clone());
        }
        Ok(())
    }

    fn replay_for_user(&self, user_id: &str) -> Result<Vec<LearningLogEntry>, StoreError> {
        Ok(self
            .learning_logs
            .read()
            .get(user_id)
            .cloned()
            .unwrap_or_default())
    }
}

impl BanditStore for InMemoryStore {
    fn load(&self, resource_id: &str) -> Result<Option<ArmParameters>, StoreError> {
        Ok(self.arms.read().get(resource_id).cloned())
    }

    fn save(&self, params: &ArmParameters) -> Result<(), StoreError> {
        self.arms
            .write()
            .insert(params.resource_id.clone(), params.clone());
        Ok(())
    }
}
