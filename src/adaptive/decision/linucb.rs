//! LinUCB selection over per-resource arms.
//!
//! Each catalog resource is an arm carrying the sufficient statistics of a
//! linear contextual bandit: a d x d design matrix `A` (identity at
//! creation) and a d-vector `b` (zero at creation). Arm score is
//! `theta . x + alpha * sqrt(x^T A^-1 x)` with `theta = A^-1 b`; after an
//! observed reward, `A += x x^T` and `b += r x`. Arms are created lazily on
//! first exposure and never deleted while the resource exists.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::adaptive::config::BanditConfig;
use crate::adaptive::decision::policy::{ResourceSelectionPolicy, SelectionRequest};
use crate::adaptive::decision::rules::first_matching_rule;
use crate::adaptive::types::{DifficultyTier, ResourcePick};
use crate::store::{BanditStore, ResourceCatalog, RuleStore, StoreError};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArmParameters {
    pub resource_id: String,
    pub a: Vec<Vec<f64>>,
    pub b: Vec<f64>,
}

impl ArmParameters {
    pub fn new(resource_id: impl Into<String>, dim: usize) -> Self {
        let mut a = vec![vec![0.0; dim]; dim];
        for (i, row) in a.iter_mut().enumerate() {
            row[i] = 1.0;
        }
        Self {
            resource_id: resource_id.into(),
            a,
            b: vec![0.0; dim],
        }
    }

    pub fn dim(&self) -> usize {
        self.b.len()
    }

    /// Reset to a fresh arm if the stored dimensions no longer match the
    /// configured context. Old statistics are not portable across
    /// dimension changes.
    pub fn ensure_dim(&mut self, dim: usize) {
        let a_matches = self.a.len() == dim && self.a.iter().all(|row| row.len() == dim);
        if !a_matches || self.b.len() != dim {
            *self = Self::new(self.resource_id.clone(), dim);
        }
    }

    pub fn ucb_score(&self, x: &[f64], alpha: f64) -> f64 {
        if x.len() != self.dim() {
            return f64::NEG_INFINITY;
        }
        let a_inv = invert_matrix(&self.a);
        let theta = matrix_vector_mul(&a_inv, &self.b);
        let exploitation = dot_product(&theta, x);
        let exploration = dot_product(x, &matrix_vector_mul(&a_inv, x)).max(0.0).sqrt();
        exploitation + alpha * exploration
    }

    pub fn update(&mut self, x: &[f64], reward: f64) {
        let d = self.dim();
        if x.len() != d {
            return;
        }
        for i in 0..d {
            for j in 0..d {
                self.a[i][j] += x[i] * x[j];
            }
            self.b[i] += reward * x[i];
        }
    }
}

/// Gauss-Jordan inversion with partial pivoting; singular pivots are
/// floored so a degenerate arm scores finitely instead of poisoning the
/// argmax.
fn invert_matrix(m: &[Vec<f64>]) -> Vec<Vec<f64>> {
    let n = m.len();
    let mut aug = vec![vec![0.0; 2 * n]; n];
    for i in 0..n {
        for j in 0..n {
            aug[i][j] = m[i][j];
        }
        aug[i][n + i] = 1.0;
    }

    for i in 0..n {
        let mut max_row = i;
        for k in (i + 1)..n {
            if aug[k][i].abs() > aug[max_row][i].abs() {
                max_row = k;
            }
        }
        aug.swap(i, max_row);

        if aug[i][i].abs() < 1e-10 {
            aug[i][i] = 1e-10;
        }

        let pivot = aug[i][i];
        for j in 0..(2 * n) {
            aug[i][j] /= pivot;
        }

        for k in 0..n {
            if k != i {
                let factor = aug[k][i];
                for j in 0..(2 * n) {
                    aug[k][j] -= factor * aug[i][j];
                }
            }
        }
    }

    let mut result = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in 0..n {
            let val = aug[i][n + j];
            result[i][j] = if val.is_finite() {
                val
            } else if i == j {
                1.0
            } else {
                0.0
            };
        }
    }
    result
}

fn matrix_vector_mul(m: &[Vec<f64>], v: &[f64]) -> Vec<f64> {
    let n = m.len();
    let mut result = vec![0.0; n];
    for i in 0..n {
        for j in 0..n {
            result[i] += m[i][j] * v[j];
        }
    }
    result
}

fn dot_product(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Contextual-bandit selection policy. Rule overrides still win; the
/// bandit replaces the catalog cascade only.
pub struct LinUCBPolicy {
    rules: Arc<dyn RuleStore>,
    catalog: Arc<dyn ResourceCatalog>,
    bandit: Arc<dyn BanditStore>,
    config: BanditConfig,
}

impl LinUCBPolicy {
    pub fn new(
        rules: Arc<dyn RuleStore>,
        catalog: Arc<dyn ResourceCatalog>,
        bandit: Arc<dyn BanditStore>,
        config: BanditConfig,
    ) -> Self {
        Self {
            rules,
            catalog,
            bandit,
            config,
        }
    }

    /// Context = [score, one-hot difficulty tier], padded or truncated to
    /// the configured dimension.
    fn context_vector(&self, request: &SelectionRequest) -> Vec<f64> {
        let tier = DifficultyTier::from_score(request.score);
        let mut x = vec![
            request.score,
            f64::from(u8::from(tier == DifficultyTier::Beginner)),
            f64::from(u8::from(tier == DifficultyTier::Intermediate)),
            f64::from(u8::from(tier == DifficultyTier::Advanced)),
        ];
        x.resize(self.config.context_dim, 0.0);
        x
    }

    fn arm_for(&self, resource_id: &str) -> Result<ArmParameters, StoreError> {
        let mut arm = self
            .bandit
            .load(resource_id)?
            .unwrap_or_else(|| ArmParameters::new(resource_id, self.config.context_dim));
        arm.ensure_dim(self.config.context_dim);
        Ok(arm)
    }
}

impl ResourceSelectionPolicy for LinUCBPolicy {
    fn select(&self, request: &SelectionRequest) -> Result<Option<ResourcePick>, StoreError> {
        if let Some(pick) = first_matching_rule(&self.rules, request)? {
            return Ok(Some(pick));
        }

        let candidates = self.catalog.candidates(&request.concept)?;
        if candidates.is_empty() {
            return Ok(None);
        }

        let x = self.context_vector(request);
        let mut best: Option<(f64, &crate::adaptive::types::ResourceEntry)> = None;
        for entry in &candidates {
            let arm = self.arm_for(&entry.id)?;
            let score = arm.ucb_score(&x, self.config.alpha);
            if best.map_or(true, |(s, _)| score > s) {
                best = Some((score, entry));
            }
        }

        match best {
            Some((score, entry)) => {
                // First exposure materializes the arm record.
                if self.bandit.load(&entry.id)?.is_none() {
                    self.bandit
                        .save(&ArmParameters::new(&entry.id, self.config.context_dim))?;
                }
                tracing::debug!(
                    concept = %request.concept,
                    resource_id = %entry.id,
                    ucb = score,
                    "bandit arm selected"
                );
                Ok(Some(ResourcePick::from_catalog(entry)))
            }
            None => Ok(None),
        }
    }

    fn observe_reward(
        &self,
        request: &SelectionRequest,
        resource_id: &str,
        reward: f64,
    ) -> Result<(), StoreError> {
        let mut arm = self.arm_for(resource_id)?;
        let x = self.context_vector(request);
        arm.update(&x, reward);
        self.bandit.save(&arm)
    }
}
