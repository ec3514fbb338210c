//! Engine facade: the external surface consumed by HTTP routes and admin
//! tooling. Wires the estimator, prerequisite graph, selection policy, and
//! generator over the storage traits; swapping the rule/catalog policy for
//! the bandit is a constructor argument, not a rewrite.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, Utc};

use crate::adaptive::config::EngineConfig;
use crate::adaptive::decision::{ResourceSelectionPolicy, RuleAndCatalogPolicy};
use crate::adaptive::dependencies::{apply_dependency_caps, ConceptGraph};
use crate::adaptive::experience::ExperienceLogger;
use crate::adaptive::generator::{EngineError, RecommendationGenerator};
use crate::adaptive::mastery::{self, MasteryEstimator};
use crate::adaptive::types::{ConceptResult, Recommendation, WeakConcept};
use crate::store::{
    AnswerHistory, LearningLogStore, RecommendationStore, ResourceCatalog, RuleStore,
};

pub struct AdaptiveEngine {
    config: EngineConfig,
    estimator: MasteryEstimator,
    graph: ConceptGraph,
    history: Arc<dyn AnswerHistory>,
    generator: RecommendationGenerator,
}

impl AdaptiveEngine {
    /// Engine with the launch policy: rule overrides plus the catalog
    /// cascade.
    pub fn new(
        config: EngineConfig,
        graph: ConceptGraph,
        history: Arc<dyn AnswerHistory>,
        rules: Arc<dyn RuleStore>,
        catalog: Arc<dyn ResourceCatalog>,
        recommendations: Arc<dyn RecommendationStore>,
        learning_logs: Arc<dyn LearningLogStore>,
    ) -> Self {
        let policy: Arc<dyn ResourceSelectionPolicy> =
            Arc::new(RuleAndCatalogPolicy::new(rules, catalog));
        Self::with_policy(config, graph, history, policy, recommendations, learning_logs)
    }

    /// Engine with an explicit selection policy (e.g. `LinUCBPolicy`).
    pub fn with_policy(
        config: EngineConfig,
        graph: ConceptGraph,
        history: Arc<dyn AnswerHistory>,
        policy: Arc<dyn ResourceSelectionPolicy>,
        recommendations: Arc<dyn RecommendationStore>,
        learning_logs: Arc<dyn LearningLogStore>,
    ) -> Self {
        let estimator = MasteryEstimator::new(config.mastery.clone());
        let generator = RecommendationGenerator::new(
            config.priorities.clone(),
            graph.clone(),
            policy,
            recommendations,
            ExperienceLogger::new(learning_logs),
        );
        Self {
            config,
            estimator,
            graph,
            history,
            generator,
        }
    }

    /// Per-concept mastery recomputed from the user's full answer history,
    /// optionally restricted to one course. Prerequisite caps apply per
    /// the configured propagation mode.
    pub fn estimate_mastery(
        &self,
        user_id: &str,
        course_id: Option<i64>,
    ) -> Result<HashMap<String, f64>, EngineError> {
        let answers = self.history.answers(user_id, course_id)?;
        let scores = self.estimator.estimate(&answers, Utc::now());

        if self.config.dependencies.mode.applies(course_id.is_some()) {
            Ok(apply_dependency_caps(
                &scores,
                &self.graph,
                &self.config.dependencies,
            ))
        } else {
            Ok(scores)
        }
    }

    /// Concepts below `threshold` (default from config), weakest first.
    pub fn identify_weak_concepts(
        &self,
        user_id: &str,
        threshold: Option<f64>,
    ) -> Result<Vec<WeakConcept>, EngineError> {
        let scores = self.estimate_mastery(user_id, None)?;
        Ok(mastery::weak_concepts(
            &scores,
            threshold.unwrap_or(self.config.weak_threshold),
        ))
    }

    /// Improvement slope over recent submissions; 0.0 with fewer than two
    /// submissions in the window.
    pub fn learning_velocity(
        &self,
        user_id: &str,
        window_days: Option<i64>,
    ) -> Result<f64, EngineError> {
        let days = window_days.unwrap_or(self.config.velocity_window_days);
        let since = Utc::now() - Duration::days(days);
        let submissions = self.history.submissions_since(user_id, since)?;
        Ok(mastery::learning_velocity(&submissions))
    }

    pub fn generate_recommendations(
        &self,
        user_id: &str,
        submission_id: &str,
        concept_results: &HashMap<String, ConceptResult>,
    ) -> Result<Vec<Recommendation>, EngineError> {
        self.generator
            .generate(user_id, submission_id, concept_results, Utc::now())
    }

    pub fn generate_recommendations_from_assessment(
        &self,
        user_id: &str,
        submission_id: &str,
        concept_scores: &HashMap<String, f64>,
        course_id: Option<i64>,
    ) -> Result<Vec<Recommendation>, EngineError> {
        self.generator.generate_from_assessment(
            user_id,
            submission_id,
            concept_scores,
            course_id,
            Utc::now(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adaptive::config::PropagationMode;
    use crate::adaptive::types::{AnswerEvent, Difficulty};
    use crate::store::memory::InMemoryStore;

    fn engine_over(store: &Arc<InMemoryStore>, config: EngineConfig) -> AdaptiveEngine {
        AdaptiveEngine::new(
            config,
            ConceptGraph::with_default_curriculum(),
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
        )
    }

    fn answer(concept: &str, is_correct: bool) -> AnswerEvent {
        AnswerEvent {
            concept: Some(concept.to_string()),
            is_correct,
            difficulty: Difficulty::Medium,
            timestamp: Some(Utc::now()),
            time_spent_ms: 3000,
        }
    }

    #[test]
    fn course_agnostic_estimates_are_capped_by_default() {
        let store = Arc::new(InMemoryStore::new());
        // Variables weak, Functions strong.
        for _ in 0..3 {
            store.add_answer("u1", Some(1), answer("Functions", true));
        }
        store.add_answer("u1", Some(1), answer("Variables", false));

        let engine = engine_over(&store, EngineConfig::default());

        let agnostic = engine.estimate_mastery("u1", None).unwrap();
        // Functions raw = 0.95, capped by Variables 0.3 * 1.2 = 0.36.
        assert!((agnostic["Functions"] - 0.36).abs() < 1e-9);

        let scoped = engine.estimate_mastery("u1", Some(1)).unwrap();
        assert!((scoped["Functions"] - 0.95).abs() < 1e-9);
    }

    #[test]
    fn propagation_can_be_disabled() {
        let store = Arc::new(InMemoryStore::new());
        for _ in 0..3 {
            store.add_answer("u1", Some(1), answer("Functions", true));
        }
        store.add_answer("u1", Some(1), answer("Variables", false));

        let mut config = EngineConfig::default();
        config.dependencies.mode = PropagationMode::Disabled;
        let engine = engine_over(&store, config);

        let scores = engine.estimate_mastery("u1", None).unwrap();
        assert!((scores["Functions"] - 0.95).abs() < 1e-9);
    }

    #[test]
    fn weak_concepts_come_back_weakest_first() {
        let store = Arc::new(InMemoryStore::new());
        store.add_answer("u1", None, answer("Variables", true));
        for _ in 0..2 {
            store.add_answer("u1", None, answer("Loops", false));
        }

        let engine = engine_over(&store, EngineConfig::default());
        let weak = engine.identify_weak_concepts("u1", None).unwrap();
        assert_eq!(weak[0].concept, "Loops");
        assert!(weak
            .windows(2)
            .all(|pair| pair[0].mastery <= pair[1].mastery));
    }

    #[test]
    fn no_history_means_no_weak_concepts() {
        let store = Arc::new(InMemoryStore::new());
        let engine = engine_over(&store, EngineConfig::default());
        assert!(engine.identify_weak_concepts("ghost", None).unwrap().is_empty());
        assert!(engine.estimate_mastery("ghost", None).unwrap().is_empty());
    }
}
