//! Concept mastery estimation and adaptive resource recommendation.
//!
//! The crate models each learner's per-concept proficiency from their graded
//! answer history (recency-decayed, difficulty-weighted), constrains it with
//! a static prerequisite graph, selects remediation resources through a
//! pluggable policy (threshold rules + catalog fallback today, LinUCB
//! tomorrow), and appends (state, action, reward, next-state) tuples to a
//! replay buffer for future reinforcement-learning training.
//!
//! Storage is consumed through the traits in [`store`]; an in-memory
//! reference implementation backs the tests and small deployments.

pub mod adaptive;
pub mod logging;
pub mod store;

pub use adaptive::engine::AdaptiveEngine;
pub use adaptive::EngineConfig;
