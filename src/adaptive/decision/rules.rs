//! Course-specific rule tier, consulted before any other selection logic
//! under every policy: rule-based overrides always win.

use std::sync::Arc;

use crate::adaptive::decision::policy::SelectionRequest;
use crate::adaptive::types::ResourcePick;
use crate::store::{RuleStore, StoreError};

/// First qualifying rule for the request's course and concept. Rules are
/// tried in ascending threshold order (ties keep insertion order), so the
/// tightest intervention that still fires wins deterministically.
pub fn first_matching_rule(
    rules: &Arc<dyn RuleStore>,
    request: &SelectionRequest,
) -> Result<Option<ResourcePick>, StoreError> {
    let course_id = match request.course_id {
        Some(id) => id,
        None => return Ok(None),
    };

    let mut candidates = rules.rules_for(course_id, &request.concept)?;
    candidates.sort_by(|a, b| a.threshold.total_cmp(&b.threshold));

    for rule in &candidates {
        if request.score < rule.threshold / 100.0 {
            tracing::debug!(
                concept = %request.concept,
                rule_id = %rule.id,
                threshold = rule.threshold,
                "adaptive rule override selected"
            );
            return Ok(Some(ResourcePick::from_rule(rule)));
        }
    }

    Ok(None)
}
