use std::sync::Arc;

use crate::config::AssessmentConfig;
use crate::error::AssessmentError;
use crate::metrics::{record_attempt, record_rejection, BADGE_AGGREGATION_FAILURES_TOTAL};
use crate::models::{
    assessment::{
        CurrentLevelResponse, EvaluationOutcome, Level, LevelResultView, LevelStatus,
        SubmittedAnswers,
    },
    candidate::Candidate,
    question::{Question, QuestionView},
};
use crate::repositories::{CandidateStore, QuestionBank, ResultLedger};
use crate::utils::retry::{retry_if, RetryConfig};

use super::badge_service::{BadgeAggregator, BadgeRules};
use super::level_gate::LevelGate;
use super::scorer::Scorer;

/// Request-scoped progression logic over the ledger. Holds no per-candidate
/// state between calls.
pub struct AssessmentService {
    questions: Arc<dyn QuestionBank>,
    ledger: Arc<dyn ResultLedger>,
    candidates: Arc<dyn CandidateStore>,
    gate: LevelGate,
    scorer: Scorer,
    badges: BadgeAggregator,
}

impl AssessmentService {
    pub fn new(
        config: &AssessmentConfig,
        questions: Arc<dyn QuestionBank>,
        ledger: Arc<dyn ResultLedger>,
        candidates: Arc<dyn CandidateStore>,
    ) -> Self {
        let badges = BadgeAggregator::new(
            ledger.clone(),
            candidates.clone(),
            BadgeRules::from(config),
        );
        Self {
            questions,
            ledger,
            candidates,
            gate: LevelGate::new(config.max_level),
            scorer: Scorer::new(config.pass_threshold),
            badges,
        }
    }

    pub fn gate(&self) -> &LevelGate {
        &self.gate
    }

    pub fn badges(&self) -> &BadgeAggregator {
        &self.badges
    }

    async fn require_candidate(&self, candidate_id: &str) -> Result<Candidate, AssessmentError> {
        self.candidates
            .load(candidate_id)
            .await?
            .ok_or_else(|| AssessmentError::CandidateNotFound(candidate_id.to_string()))
    }

    /// Level -> passed, straight from the ledger.
    pub async fn level_results(&self, candidate_id: &str) -> Result<LevelResultView, AssessmentError> {
        let attempts = self.ledger.attempts_for(candidate_id).await?;
        Ok(LevelResultView::from_attempts(
            &attempts,
            self.scorer.pass_threshold(),
        ))
    }

    pub async fn level_states(&self, candidate_id: &str) -> Result<Vec<LevelStatus>, AssessmentError> {
        self.require_candidate(candidate_id).await?;
        let results = self.level_results(candidate_id).await?;
        Ok(self.gate.states(&results))
    }

    pub async fn current_level(
        &self,
        candidate_id: &str,
    ) -> Result<CurrentLevelResponse, AssessmentError> {
        self.require_candidate(candidate_id).await?;
        let results = self.level_results(candidate_id).await?;

        let level = self.gate.resolve_current_level(&results);
        let finished = level > self.gate.max_level();
        let state = (!finished).then(|| self.gate.state_of(&results, level));

        Ok(CurrentLevelResponse {
            candidate_id: candidate_id.to_string(),
            level,
            state,
            finished,
            levels: self.gate.states(&results),
            results,
        })
    }

    pub async fn can_enter(&self, candidate_id: &str, level: Level) -> Result<(), AssessmentError> {
        let results = self.level_results(candidate_id).await?;
        self.gate.can_enter(&results, level).inspect_err(|e| {
            tracing::info!(
                "Candidate {} refused entry to level {}: {}",
                candidate_id,
                level,
                e
            );
            record_rejection(rejection_reason(e));
        })
    }

    async fn load_level(&self, level: Level) -> Result<Vec<Question>, AssessmentError> {
        let questions = self.questions.questions_for_level(level).await?;
        if questions.is_empty() {
            tracing::warn!("No questions configured for level {}", level);
            record_rejection("configuration_error");
            return Err(AssessmentError::ConfigurationError { level });
        }
        Ok(questions)
    }

    /// Questions for a level the candidate is allowed to enter, without answer keys.
    pub async fn questions_for(
        &self,
        candidate_id: &str,
        level: Level,
    ) -> Result<Vec<QuestionView>, AssessmentError> {
        self.require_candidate(candidate_id).await?;
        self.can_enter(candidate_id, level).await?;
        let questions = self.load_level(level).await?;
        Ok(questions.iter().map(Question::view).collect())
    }

    /// Runs badge aggregation, retrying storage failures. Aggregation is
    /// idempotent, so a repeat after a partial failure is safe. Returns false
    /// when the badge state could not be settled.
    async fn award_badge(&self, candidate_id: &str) -> bool {
        let result = retry_if(
            RetryConfig::default(),
            |e: &AssessmentError| matches!(e, AssessmentError::Storage(_)),
            || self.badges.recompute_badge(candidate_id),
        )
        .await;

        match result {
            Ok(_) => true,
            Err(e) => {
                // The attempt is already durable; a failed badge write must not undo it.
                tracing::error!(
                    "Badge aggregation failed for candidate {}: {}",
                    candidate_id,
                    e
                );
                BADGE_AGGREGATION_FAILURES_TOTAL.inc();
                false
            }
        }
    }

    /// Scores and records the single attempt at `level`. Submitting the final
    /// level triggers badge aggregation.
    pub async fn submit_attempt(
        &self,
        candidate_id: &str,
        level: Level,
        answers: SubmittedAnswers,
    ) -> Result<EvaluationOutcome, AssessmentError> {
        tracing::info!(
            "Processing submission: candidate={}, level={}, answers={}",
            candidate_id,
            level,
            answers.len()
        );
        if answers.is_empty() {
            tracing::warn!(
                "Empty submission for candidate {} at level {}; it will score 0",
                candidate_id,
                level
            );
        }

        self.require_candidate(candidate_id).await?;
        self.can_enter(candidate_id, level).await?;

        let questions = self.load_level(level).await?;
        answers.validate_against(level, &questions)?;
        let mut outcome = self.scorer.evaluate(&questions, &answers);

        // The ledger write is the only guard against a concurrent twin submission.
        if let Err(e) = self
            .ledger
            .record_attempt(candidate_id, level, outcome.score)
            .await
        {
            if let AssessmentError::DuplicateAttempt { .. } = e {
                tracing::warn!(
                    "Concurrent submission lost the race: candidate={}, level={}",
                    candidate_id,
                    level
                );
                record_rejection("duplicate_attempt");
            }
            return Err(e);
        }
        record_attempt(level, outcome.passed);

        tracing::info!(
            "Attempt recorded: candidate={}, level={}, score={}/{}, passed={}",
            candidate_id,
            level,
            outcome.score,
            outcome.total,
            outcome.passed
        );

        if level == self.gate.max_level() {
            outcome.badge_pending = !self.award_badge(candidate_id).await;
        }

        Ok(outcome)
    }
}

fn rejection_reason(err: &AssessmentError) -> &'static str {
    match err {
        AssessmentError::AlreadyAttempted { .. } => "already_attempted",
        AssessmentError::PriorLevelNotPassed { .. } => "prior_level_not_passed",
        AssessmentError::LevelOutOfRange { .. } => "level_out_of_range",
        AssessmentError::DuplicateAttempt { .. } => "duplicate_attempt",
        AssessmentError::ConfigurationError { .. } => "configuration_error",
        AssessmentError::UnknownQuestion { .. } => "unknown_question",
        AssessmentError::CandidateNotFound(_) => "candidate_not_found",
        AssessmentError::Storage(_) => "storage",
    }
}
