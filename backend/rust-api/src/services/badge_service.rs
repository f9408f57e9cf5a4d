use std::sync::Arc;

use crate::config::AssessmentConfig;
use crate::error::AssessmentError;
use crate::metrics::BADGES_AWARDED_TOTAL;
use crate::models::assessment::{AssessmentAttempt, BadgeDecision, Level};
use crate::repositories::{CandidateStore, ResultLedger};

#[derive(Debug, Clone)]
pub struct BadgeRules {
    pub final_level: Level,
    pub pass_threshold: u32,
    pub badge_threshold: f64,
    pub label: String,
}

impl From<&AssessmentConfig> for BadgeRules {
    fn from(config: &AssessmentConfig) -> Self {
        Self {
            final_level: config.max_level,
            pass_threshold: config.pass_threshold,
            badge_threshold: config.badge_threshold,
            label: config.badge_label.clone(),
        }
    }
}

impl BadgeRules {
    /// Cumulative standing over every recorded attempt; `None` without attempts.
    pub fn decide(&self, attempts: &[AssessmentAttempt]) -> Option<BadgeDecision> {
        if attempts.is_empty() {
            return None;
        }

        let total_score: u64 = attempts.iter().map(|a| u64::from(a.score)).sum();
        let total_possible = 100 * attempts.len() as u64;
        let cumulative_percentage = total_score as f64 * 100.0 / total_possible as f64;

        let final_attempt = attempts.iter().find(|a| a.level == self.final_level);
        let reached_final_level = final_attempt.is_some();
        let passed_final_level = final_attempt.is_some_and(|a| a.passed(self.pass_threshold));

        Some(BadgeDecision {
            cumulative_percentage,
            reached_final_level,
            passed_final_level,
            awarded: reached_final_level
                && passed_final_level
                && cumulative_percentage >= self.badge_threshold,
        })
    }
}

/// Grants the award label once the final level is on the ledger.
///
/// A badge is sticky: only an unset badge is written, and a decision that no
/// longer qualifies leaves an existing one in place.
pub struct BadgeAggregator {
    ledger: Arc<dyn ResultLedger>,
    candidates: Arc<dyn CandidateStore>,
    rules: BadgeRules,
}

impl BadgeAggregator {
    pub fn new(
        ledger: Arc<dyn ResultLedger>,
        candidates: Arc<dyn CandidateStore>,
        rules: BadgeRules,
    ) -> Self {
        Self {
            ledger,
            candidates,
            rules,
        }
    }

    pub fn rules(&self) -> &BadgeRules {
        &self.rules
    }

    /// Idempotent: without new attempts, re-running yields the same badge state.
    pub async fn recompute_badge(
        &self,
        candidate_id: &str,
    ) -> Result<Option<BadgeDecision>, AssessmentError> {
        let attempts = self.ledger.attempts_for(candidate_id).await?;
        let Some(decision) = self.rules.decide(&attempts) else {
            tracing::debug!("No attempts for candidate {}, badge untouched", candidate_id);
            return Ok(None);
        };

        tracing::info!(
            "Badge decision for candidate {}: cumulative={:.1}%, reached_final={}, passed_final={}, awarded={}",
            candidate_id,
            decision.cumulative_percentage,
            decision.reached_final_level,
            decision.passed_final_level,
            decision.awarded
        );

        if !decision.awarded {
            return Ok(Some(decision));
        }

        let mut candidate = self
            .candidates
            .load(candidate_id)
            .await?
            .ok_or_else(|| AssessmentError::CandidateNotFound(candidate_id.to_string()))?;

        // Only an unset badge is ever written.
        if let Some(existing) = &candidate.badge {
            tracing::debug!(
                "Candidate {} already holds badge '{}', leaving it",
                candidate_id,
                existing
            );
            return Ok(Some(decision));
        }

        candidate.badge = Some(self.rules.label.clone());
        self.candidates.save(&candidate).await?;
        BADGES_AWARDED_TOTAL.inc();
        tracing::info!(
            "Badge '{}' awarded to candidate {}",
            self.rules.label,
            candidate_id
        );

        Ok(Some(decision))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::candidate::Candidate;
    use crate::repositories::memory::{InMemoryCandidateStore, InMemoryResultLedger};

    fn rules() -> BadgeRules {
        BadgeRules::from(&AssessmentConfig::default())
    }

    fn attempts(scores: &[(Level, u32)]) -> Vec<AssessmentAttempt> {
        scores
            .iter()
            .map(|(level, score)| AssessmentAttempt::new("c1", *level, *score))
            .collect()
    }

    #[test]
    fn failed_final_level_blocks_badge() {
        let decision = rules().decide(&attempts(&[(1, 60), (2, 70), (3, 40)])).unwrap();

        assert!((decision.cumulative_percentage - 56.666).abs() < 0.01);
        assert!(decision.reached_final_level);
        assert!(!decision.passed_final_level);
        assert!(!decision.awarded);
    }

    #[test]
    fn high_cumulative_with_final_pass_awards() {
        let decision = rules().decide(&attempts(&[(1, 100), (2, 95), (3, 96)])).unwrap();

        assert!((decision.cumulative_percentage - 97.0).abs() < f64::EPSILON);
        assert!(decision.awarded);
    }

    #[test]
    fn cumulative_below_threshold_denies_badge() {
        let decision = rules().decide(&attempts(&[(1, 90), (2, 90), (3, 100)])).unwrap();
        assert!(decision.passed_final_level);
        assert!(!decision.awarded);
    }

    #[test]
    fn unreached_final_level_denies_badge() {
        let decision = rules().decide(&attempts(&[(1, 100), (2, 100)])).unwrap();
        assert!(!decision.reached_final_level);
        assert!(!decision.awarded);
    }

    #[test]
    fn no_attempts_no_decision() {
        assert!(rules().decide(&[]).is_none());
    }

    async fn aggregator_with(scores: &[(Level, u32)]) -> (BadgeAggregator, Arc<InMemoryCandidateStore>) {
        let ledger = Arc::new(InMemoryResultLedger::new());
        for (level, score) in scores {
            ledger.record_attempt("c1", *level, *score).await.unwrap();
        }
        let candidates = Arc::new(InMemoryCandidateStore::new());
        candidates
            .insert(Candidate::new("c1", "Asha Rao", "asha@example.test"))
            .await;
        let aggregator = BadgeAggregator::new(ledger, candidates.clone(), rules());
        (aggregator, candidates)
    }

    #[tokio::test]
    async fn recompute_is_idempotent() {
        let (aggregator, candidates) = aggregator_with(&[(1, 100), (2, 95), (3, 96)]).await;

        let first = aggregator.recompute_badge("c1").await.unwrap();
        let badge_after_first = candidates.load("c1").await.unwrap().unwrap().badge;
        let second = aggregator.recompute_badge("c1").await.unwrap();
        let badge_after_second = candidates.load("c1").await.unwrap().unwrap().badge;

        assert_eq!(first, second);
        assert_eq!(badge_after_first, Some("Java Expert".to_string()));
        assert_eq!(badge_after_first, badge_after_second);
    }

    #[tokio::test]
    async fn existing_badge_is_not_revoked() {
        let (aggregator, candidates) = aggregator_with(&[(1, 60), (2, 70), (3, 40)]).await;
        let mut candidate = candidates.load("c1").await.unwrap().unwrap();
        candidate.badge = Some("Java Expert".to_string());
        candidates.save(&candidate).await.unwrap();

        let decision = aggregator.recompute_badge("c1").await.unwrap().unwrap();

        assert!(!decision.awarded);
        assert_eq!(
            candidates.load("c1").await.unwrap().unwrap().badge,
            Some("Java Expert".to_string())
        );
    }

    #[tokio::test]
    async fn different_existing_badge_is_kept() {
        let (aggregator, candidates) = aggregator_with(&[(1, 100), (2, 95), (3, 96)]).await;
        let mut candidate = candidates.load("c1").await.unwrap().unwrap();
        candidate.badge = Some("Kotlin Expert".to_string());
        candidates.save(&candidate).await.unwrap();

        let decision = aggregator.recompute_badge("c1").await.unwrap().unwrap();

        assert!(decision.awarded);
        assert_eq!(
            candidates.load("c1").await.unwrap().unwrap().badge,
            Some("Kotlin Expert".to_string())
        );
    }

    #[tokio::test]
    async fn empty_ledger_leaves_candidate_untouched() {
        let (aggregator, candidates) = aggregator_with(&[]).await;
        assert!(aggregator.recompute_badge("c1").await.unwrap().is_none());
        assert!(candidates.load("c1").await.unwrap().unwrap().badge.is_none());
    }
}
