//! Mastery estimation from graded answer history.
//!
//! A concept's mastery starts at the neutral prior and folds over its
//! answers oldest-first: each answer moves the score by a fixed delta,
//! scaled by a per-week exponential recency decay and the question's
//! difficulty weight, clamping to [0, 1] after every step. Clamping
//! mid-stream matters: a learner who saturates at 1.0 and then slips
//! decays from 1.0, not from an unclamped overshoot.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::adaptive::config::MasteryWeights;
use crate::adaptive::types::{AnswerEvent, SubmissionRecord, WeakConcept};

const DAYS_PER_WEEK: f64 = 7.0;

#[derive(Debug, Clone, Default)]
pub struct MasteryEstimator {
    weights: MasteryWeights,
}

impl MasteryEstimator {
    pub fn new(weights: MasteryWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &MasteryWeights {
        &self.weights
    }

    /// Mastery for all concepts present in `answers`, grouped by concept
    /// label. Concepts with no answers simply do not appear.
    pub fn estimate(&self, answers: &[AnswerEvent], now: DateTime<Utc>) -> HashMap<String, f64> {
        let mut grouped: HashMap<&str, Vec<&AnswerEvent>> = HashMap::new();
        for answer in answers {
            grouped.entry(answer.concept_label()).or_default().push(answer);
        }

        grouped
            .into_iter()
            .map(|(concept, history)| {
                (
                    concept.to_string(),
                    self.concept_mastery(history.into_iter(), now),
                )
            })
            .collect()
    }

    /// Mastery for a single concept's history. Empty history returns the
    /// initial mastery unchanged.
    pub fn concept_mastery<'a>(
        &self,
        history: impl Iterator<Item = &'a AnswerEvent>,
        now: DateTime<Utc>,
    ) -> f64 {
        let mut mastery = self.weights.initial_mastery;

        for answer in history {
            let days_ago = answer
                .timestamp
                .map(|ts| (now - ts).num_days().max(0))
                .unwrap_or(0);
            let weeks_ago = days_ago as f64 / DAYS_PER_WEEK;
            let recency_weight = self.weights.recency_decay.powf(weeks_ago);
            let difficulty_weight = self.weights.difficulty_weight(answer.difficulty);

            let delta = if answer.is_correct {
                self.weights.correct_delta
            } else {
                self.weights.incorrect_delta
            };

            mastery = (mastery + delta * recency_weight * difficulty_weight).clamp(0.0, 1.0);
        }

        round3(mastery)
    }
}

/// Concepts strictly below `threshold`, sorted ascending by mastery.
pub fn weak_concepts(scores: &HashMap<String, f64>, threshold: f64) -> Vec<WeakConcept> {
    let mut weak: Vec<WeakConcept> = scores
        .iter()
        .filter(|(_, &mastery)| mastery < threshold)
        .map(|(concept, &mastery)| WeakConcept {
            concept: concept.clone(),
            mastery,
        })
        .collect();

    weak.sort_by(|a, b| a.mastery.total_cmp(&b.mastery).then(a.concept.cmp(&b.concept)));
    weak
}

/// Improvement trend over a window of submissions: the least-squares slope
/// of normalized scores (0-1) against submission index. Fewer than two
/// submissions yield no trend.
pub fn learning_velocity(submissions: &[SubmissionRecord]) -> f64 {
    if submissions.len() < 2 {
        return 0.0;
    }

    let n = submissions.len() as f64;
    let ys: Vec<f64> = submissions.iter().map(|s| s.score / 100.0).collect();

    let x_mean = (n - 1.0) / 2.0;
    let y_mean = ys.iter().sum::<f64>() / n;

    let mut numerator = 0.0;
    let mut denominator = 0.0;
    for (i, y) in ys.iter().enumerate() {
        let dx = i as f64 - x_mean;
        numerator += dx * (y - y_mean);
        denominator += dx * dx;
    }

    if denominator == 0.0 {
        return 0.0;
    }

    round4(numerator / denominator)
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

fn round4(value: f64) -> f64 {
    (value * 10000.0).round() / 10000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use crate::adaptive::types::Difficulty;

    fn answer(
        concept: &str,
        is_correct: bool,
        difficulty: Difficulty,
        timestamp: Option<DateTime<Utc>>,
    ) -> AnswerEvent {
        AnswerEvent {
            concept: Some(concept.to_string()),
            is_correct,
            difficulty,
            timestamp,
            time_spent_ms: 4000,
        }
    }

    fn submission(id: &str, score: f64, submitted_at: DateTime<Utc>) -> SubmissionRecord {
        SubmissionRecord {
            id: id.to_string(),
            score,
            submitted_at,
        }
    }

    #[test]
    fn empty_history_returns_initial_mastery() {
        let estimator = MasteryEstimator::default();
        let now = Utc::now();
        assert_eq!(estimator.concept_mastery(std::iter::empty(), now), 0.5);
        assert!(estimator.estimate(&[], now).is_empty());
    }

    #[test]
    fn single_correct_medium_today() {
        let estimator = MasteryEstimator::default();
        let now = Utc::now();
        let history = [answer("Loops", true, Difficulty::Medium, Some(now))];
        let mastery = estimator.concept_mastery(history.iter(), now);
        assert!((mastery - 0.65).abs() < 1e-9);
    }

    #[test]
    fn single_incorrect_hard_today() {
        let estimator = MasteryEstimator::default();
        let now = Utc::now();
        let history = [answer("Loops", false, Difficulty::Hard, Some(now))];
        let mastery = estimator.concept_mastery(history.iter(), now);
        assert!((mastery - 0.26).abs() < 1e-9);
    }

    #[test]
    fn missing_timestamp_means_no_decay() {
        let estimator = MasteryEstimator::default();
        let now = Utc::now();
        let dated = [answer("Loops", true, Difficulty::Medium, Some(now))];
        let undated = [answer("Loops", true, Difficulty::Medium, None)];
        assert_eq!(
            estimator.concept_mastery(dated.iter(), now),
            estimator.concept_mastery(undated.iter(), now)
        );
    }

    #[test]
    fn older_answers_move_the_score_less() {
        let estimator = MasteryEstimator::default();
        let now = Utc::now();
        let recent = [answer("Loops", true, Difficulty::Medium, Some(now))];
        let stale = [answer(
            "Loops",
            true,
            Difficulty::Medium,
            Some(now - Duration::days(70)),
        )];
        let recent_mastery = estimator.concept_mastery(recent.iter(), now);
        let stale_mastery = estimator.concept_mastery(stale.iter(), now);
        assert!(stale_mastery < recent_mastery);
        assert!(stale_mastery > 0.5);
    }

    #[test]
    fn clamps_after_every_event() {
        let estimator = MasteryEstimator::default();
        let now = Utc::now();
        // Five correct answers would overshoot 1.0 unclamped; the incorrect
        // answer must decay from exactly 1.0.
        let mut history: Vec<AnswerEvent> = (0..5)
            .map(|_| answer("Loops", true, Difficulty::Hard, Some(now)))
            .collect();
        history.push(answer("Loops", false, Difficulty::Medium, Some(now)));
        let mastery = estimator.concept_mastery(history.iter(), now);
        assert!((mastery - 0.8).abs() < 1e-9);
    }

    #[test]
    fn never_leaves_unit_interval() {
        let estimator = MasteryEstimator::default();
        let now = Utc::now();
        let all_wrong: Vec<AnswerEvent> = (0..20)
            .map(|_| answer("Loops", false, Difficulty::Hard, Some(now)))
            .collect();
        assert_eq!(estimator.concept_mastery(all_wrong.iter(), now), 0.0);

        let all_right: Vec<AnswerEvent> = (0..20)
            .map(|_| answer("Loops", true, Difficulty::Hard, Some(now)))
            .collect();
        assert_eq!(estimator.concept_mastery(all_right.iter(), now), 1.0);
    }

    #[test]
    fn estimate_groups_by_concept_and_defaults_untagged() {
        let estimator = MasteryEstimator::default();
        let now = Utc::now();
        let answers = vec![
            answer("Loops", true, Difficulty::Medium, Some(now)),
            answer("Arrays", false, Difficulty::Medium, Some(now)),
            AnswerEvent {
                concept: None,
                is_correct: true,
                difficulty: Difficulty::Easy,
                timestamp: Some(now),
                time_spent_ms: 2000,
            },
        ];
        let scores = estimator.estimate(&answers, now);
        assert_eq!(scores.len(), 3);
        assert!((scores["Loops"] - 0.65).abs() < 1e-9);
        assert!((scores["Arrays"] - 0.3).abs() < 1e-9);
        assert!(scores.contains_key("General"));
    }

    #[test]
    fn weak_concepts_sorted_ascending_and_strictly_below() {
        let mut scores = HashMap::new();
        scores.insert("Loops".to_string(), 0.2);
        scores.insert("Arrays".to_string(), 0.55);
        scores.insert("Variables".to_string(), 0.6);
        scores.insert("Functions".to_string(), 0.9);

        let weak = weak_concepts(&scores, 0.6);
        let names: Vec<&str> = weak.iter().map(|w| w.concept.as_str()).collect();
        assert_eq!(names, vec!["Loops", "Arrays"]);
        assert!(weak.windows(2).all(|w| w[0].mastery <= w[1].mastery));
    }

    #[test]
    fn velocity_requires_two_submissions() {
        let now = Utc::now();
        assert_eq!(learning_velocity(&[]), 0.0);
        assert_eq!(learning_velocity(&[submission("s1", 80.0, now)]), 0.0);
    }

    #[test]
    fn velocity_positive_for_improving_scores() {
        let now = Utc::now();
        let submissions = vec![
            submission("s1", 40.0, now - Duration::days(3)),
            submission("s2", 60.0, now - Duration::days(2)),
            submission("s3", 80.0, now - Duration::days(1)),
        ];
        let velocity = learning_velocity(&submissions);
        assert!(velocity > 0.0);
        assert!((velocity - 0.2).abs() < 1e-9);
    }

    #[test]
    fn velocity_negative_for_declining_scores() {
        let now = Utc::now();
        let submissions = vec![
            submission("s1", 90.0, now - Duration::days(2)),
            submission("s2", 50.0, now - Duration::days(1)),
        ];
        assert!(learning_velocity(&submissions) < 0.0);
    }

    #[test]
    fn velocity_zero_for_flat_scores() {
        let now = Utc::now();
        let submissions = vec![
            submission("s1", 70.0, now - Duration::days(2)),
            submission("s2", 70.0, now - Duration::days(1)),
        ];
        assert_eq!(learning_velocity(&submissions), 0.0);
    }
}
