//! Recommendation generation: turns a submission's per-concept results
//! into a persisted batch of remediation recommendations plus replay-buffer
//! entries.
//!
//! Batches are all-or-nothing: a persistence failure aborts the whole
//! generation call. Experience logging is best-effort and never rolls back
//! recommendations that already committed. Repeated calls with identical
//! arguments produce independent batches; deduplication is deliberately
//! not applied, including across overlapping weak-prerequisite chains.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::adaptive::config::PriorityBands;
use crate::adaptive::decision::{ResourceSelectionPolicy, SelectionRequest};
use crate::adaptive::dependencies::ConceptGraph;
use crate::adaptive::experience::ExperienceLogger;
use crate::adaptive::types::{ConceptResult, Priority, Recommendation};
use crate::store::{RecommendationStore, StoreError};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to persist recommendation batch: {0}")]
    Persistence(#[source] StoreError),
    #[error("storage read failed: {0}")]
    Store(#[from] StoreError),
}

pub struct RecommendationGenerator {
    bands: PriorityBands,
    graph: ConceptGraph,
    policy: Arc<dyn ResourceSelectionPolicy>,
    recommendations: Arc<dyn RecommendationStore>,
    experience: ExperienceLogger,
}

impl RecommendationGenerator {
    pub fn new(
        bands: PriorityBands,
        graph: ConceptGraph,
        policy: Arc<dyn ResourceSelectionPolicy>,
        recommendations: Arc<dyn RecommendationStore>,
        experience: ExperienceLogger,
    ) -> Self {
        Self {
            bands,
            graph,
            policy,
            recommendations,
            experience,
        }
    }

    /// Quiz path: per-concept answer tallies in, persisted batch out.
    pub fn generate(
        &self,
        user_id: &str,
        submission_id: &str,
        concept_results: &HashMap<String, ConceptResult>,
        now: DateTime<Utc>,
    ) -> Result<Vec<Recommendation>, EngineError> {
        let mut batch = Vec::new();

        for (concept, result) in sorted(concept_results) {
            if result.total == 0 {
                continue;
            }
            let mastery = result.mastery();

            let (priority, reason) = if mastery < self.bands.high_below {
                (
                    Priority::High,
                    format!(
                        "You scored {}% on {concept}. This concept needs immediate attention.",
                        percent(mastery)
                    ),
                )
            } else if mastery < self.bands.review_below {
                (
                    Priority::Medium,
                    format!(
                        "You scored {}% on {concept}. Some review would be beneficial.",
                        percent(mastery)
                    ),
                )
            } else {
                continue;
            };

            let request = SelectionRequest::new(concept.as_str(), mastery, None);
            if let Some(resource) = self.policy.select(&request)? {
                batch.push(Recommendation::new(
                    user_id,
                    Some(submission_id.to_string()),
                    concept.as_str(),
                    reason,
                    priority,
                    resource,
                    now,
                ));
            }
        }

        batch.extend(self.prerequisite_recommendations(user_id, concept_results, now)?);

        self.recommendations
            .insert_batch(&batch)
            .map_err(EngineError::Persistence)?;

        if let Err(err) = self
            .experience
            .log(user_id, concept_results, &batch, now)
        {
            tracing::warn!(error = %err, user_id, "experience logging failed; recommendations kept");
        }

        Ok(batch)
    }

    /// Assessment path: pre-graded concept fractions, course-scoped rule
    /// lookup, no prerequisite discovery, no experience log.
    pub fn generate_from_assessment(
        &self,
        user_id: &str,
        submission_id: &str,
        concept_scores: &HashMap<String, f64>,
        course_id: Option<i64>,
        now: DateTime<Utc>,
    ) -> Result<Vec<Recommendation>, EngineError> {
        let mut batch = Vec::new();

        for (concept, &score) in sorted(concept_scores) {
            if score >= self.bands.assessment_review_below {
                continue;
            }
            let priority = if score < self.bands.high_below {
                Priority::High
            } else {
                Priority::Medium
            };
            let reason = format!("Based on your assessment, you need to review {concept}.");

            let request = SelectionRequest::new(concept, score, course_id);
            if let Some(resource) = self.policy.select(&request)? {
                batch.push(Recommendation::new(
                    user_id,
                    Some(submission_id.to_string()),
                    concept,
                    reason,
                    priority,
                    resource,
                    now,
                ));
            }
        }

        self.recommendations
            .insert_batch(&batch)
            .map_err(EngineError::Persistence)?;

        Ok(batch)
    }

    /// Struggling concepts point back at prerequisites that were also weak
    /// in the same submission: recommend the prerequisite, not the
    /// dependent. One recommendation per (weak concept, weak prerequisite)
    /// pair.
    fn prerequisite_recommendations(
        &self,
        user_id: &str,
        concept_results: &HashMap<String, ConceptResult>,
        now: DateTime<Utc>,
    ) -> Result<Vec<Recommendation>, EngineError> {
        let mut extra = Vec::new();

        for (concept, result) in sorted(concept_results) {
            if result.total == 0 || result.mastery() >= self.bands.prerequisite_check_below {
                continue;
            }

            for prereq in self.graph.prerequisites_of(concept) {
                let Some(prereq_result) = concept_results.get(prereq) else {
                    continue;
                };
                if prereq_result.total == 0 {
                    continue;
                }
                let prereq_mastery = prereq_result.mastery();
                if prereq_mastery >= self.bands.weak_prerequisite_below {
                    continue;
                }

                let request = SelectionRequest::new(prereq.clone(), prereq_mastery, None);
                if let Some(resource) = self.policy.select(&request)? {
                    extra.push(Recommendation::new(
                        user_id,
                        None,
                        prereq.clone(),
                        format!(
                            "Strengthen your {prereq} skills to better understand {concept}."
                        ),
                        Priority::High,
                        resource,
                        now,
                    ));
                }
            }
        }

        Ok(extra)
    }
}

fn percent(fraction: f64) -> i32 {
    (fraction * 100.0) as i32
}

/// Deterministic concept order so batches are reproducible across calls.
fn sorted<V>(map: &HashMap<String, V>) -> Vec<(&String, &V)> {
    let mut entries: Vec<(&String, &V)> = map.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));
    entries
}
