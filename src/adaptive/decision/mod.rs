//! Resource selection: rule-first, then either a cascading catalog lookup
//! or LinUCB arm selection, behind one policy trait so the bandit swap is
//! a wiring change.

pub mod catalog;
pub mod linucb;
pub mod policy;
pub mod rules;

pub use catalog::RuleAndCatalogPolicy;
pub use linucb::{ArmParameters, LinUCBPolicy};
pub use policy::{ResourceSelectionPolicy, SelectionRequest};
