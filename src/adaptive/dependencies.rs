//! Prerequisite graph and dependency propagation.
//!
//! A concept's estimated mastery cannot exceed what its prerequisites
//! justify: the cap is the weakest prerequisite's raw score times a fixed
//! margin. This is a single pass over pre-propagation scores, not a
//! fixed-point iteration; already-capped concepts never feed back into
//! another concept's cap.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::adaptive::config::DependencyConfig;

/// Static concept -> prerequisites map. Configuration, not user data.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConceptGraph {
    prerequisites: HashMap<String, Vec<String>>,
}

impl ConceptGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// The programming-fundamentals curriculum the platform ships with.
    pub fn with_default_curriculum() -> Self {
        let mut graph = Self::new();
        graph.add("Functions", &["Variables"]);
        graph.add("Loops", &["Variables"]);
        graph.add("Arrays", &["Variables", "Loops"]);
        graph.add("Objects", &["Variables", "Functions"]);
        graph.add("Async", &["Functions", "Objects"]);
        graph.add("Closures", &["Functions", "Objects"]);
        graph
    }

    pub fn add(&mut self, concept: impl Into<String>, prerequisites: &[&str]) {
        self.prerequisites.insert(
            concept.into(),
            prerequisites.iter().map(|p| p.to_string()).collect(),
        );
    }

    pub fn prerequisites_of(&self, concept: &str) -> &[String] {
        self.prerequisites
            .get(concept)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.prerequisites.is_empty()
    }
}

/// Cap each concept's score by its prerequisites' pre-propagation scores.
/// Concepts without declared prerequisites pass through unchanged, as do
/// prerequisites absent from the graph entirely.
pub fn apply_dependency_caps(
    scores: &HashMap<String, f64>,
    graph: &ConceptGraph,
    config: &DependencyConfig,
) -> HashMap<String, f64> {
    let mut capped = HashMap::with_capacity(scores.len());

    for (concept, &score) in scores {
        let prerequisites = graph.prerequisites_of(concept);
        if prerequisites.is_empty() {
            capped.insert(concept.clone(), score);
            continue;
        }

        let weakest = prerequisites
            .iter()
            .map(|prereq| {
                scores
                    .get(prereq)
                    .copied()
                    .unwrap_or(config.missing_prerequisite_mastery)
            })
            .fold(f64::INFINITY, f64::min);

        let cap = (weakest * config.prerequisite_margin).min(1.0);
        capped.insert(concept.clone(), score.min(cap));
    }

    capped
}
