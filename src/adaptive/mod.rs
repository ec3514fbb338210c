//! Adaptive learning core: mastery estimation, dependency propagation,
//! resource selection, recommendation generation, experience logging.

pub mod config;
pub mod decision;
pub mod dependencies;
pub mod engine;
pub mod experience;
pub mod generator;
pub mod mastery;
pub mod types;

pub use config::EngineConfig;
pub use dependencies::ConceptGraph;
pub use engine::AdaptiveEngine;
pub use generator::RecommendationGenerator;
pub use mastery::MasteryEstimator;
#[allow(unused_imports)]
pub use types::*;
