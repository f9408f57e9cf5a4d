use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use validator::Validate;

use super::question::Question;
use crate::error::AssessmentError;

/// Ordered difficulty tier, starting at 1.
pub type Level = u32;

/// Ledger record: the single scored attempt of a candidate at one level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssessmentAttempt {
    pub candidate_id: String,
    pub level: Level,
    pub score: u32,
    pub attempted_at: DateTime<Utc>,
}

impl AssessmentAttempt {
    pub fn new(candidate_id: impl Into<String>, level: Level, score: u32) -> Self {
        Self {
            candidate_id: candidate_id.into(),
            level,
            score,
            attempted_at: Utc::now(),
        }
    }

    pub fn passed(&self, pass_threshold: u32) -> bool {
        self.score >= pass_threshold
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum LevelState {
    Locked,
    Available,
    Completed { passed: bool },
}

impl LevelState {
    pub fn is_completed(&self) -> bool {
        matches!(self, LevelState::Completed { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelStatus {
    pub level: Level,
    #[serde(flatten)]
    pub state: LevelState,
}

/// Level -> passed, derived from the ledger on demand. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LevelResultView(BTreeMap<Level, bool>);

impl LevelResultView {
    pub fn from_attempts(attempts: &[AssessmentAttempt], pass_threshold: u32) -> Self {
        Self(
            attempts
                .iter()
                .map(|attempt| (attempt.level, attempt.passed(pass_threshold)))
                .collect(),
        )
    }

    /// `None` when the level was never attempted.
    pub fn outcome(&self, level: Level) -> Option<bool> {
        self.0.get(&level).copied()
    }

    pub fn has_attempted(&self, level: Level) -> bool {
        self.0.contains_key(&level)
    }

    pub fn has_passed(&self, level: Level) -> bool {
        self.outcome(level) == Some(true)
    }
}

/// Answers keyed by question id. Keys need not cover every question.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubmittedAnswers(HashMap<String, String>);

impl SubmittedAnswers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, question_id: impl Into<String>, answer: impl Into<String>) -> Self {
        self.0.insert(question_id.into(), answer.into());
        self
    }

    pub fn get(&self, question_id: &str) -> Option<&str> {
        self.0.get(question_id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Every key must name a question of the level being submitted.
    pub fn validate_against(
        &self,
        level: Level,
        questions: &[Question],
    ) -> Result<(), AssessmentError> {
        let known: HashSet<&str> = questions.iter().map(|q| q.id.as_str()).collect();
        let mut unknown: Vec<&String> = self
            .0
            .keys()
            .filter(|id| !known.contains(id.as_str()))
            .collect();
        unknown.sort();

        match unknown.first() {
            Some(id) => Err(AssessmentError::UnknownQuestion {
                id: (*id).clone(),
                level,
            }),
            None => Ok(()),
        }
    }
}

impl From<HashMap<String, String>> for SubmittedAnswers {
    fn from(answers: HashMap<String, String>) -> Self {
        Self(answers)
    }
}

/// Scorer verdict returned to the candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationOutcome {
    pub score: u32,
    pub total: u32,
    pub passed: bool,
    /// Set when the final-level badge could not be written; the attempt itself is recorded.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub badge_pending: bool,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SubmitAttemptRequest {
    #[validate(length(max = 500, message = "Too many answers in one submission"))]
    #[serde(default)]
    pub answers: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CurrentLevelResponse {
    pub candidate_id: String,
    /// First level not passed yet; `max_level + 1` once everything is passed.
    pub level: Level,
    /// State of `level`; absent once the assessment is finished.
    #[serde(flatten)]
    pub state: Option<LevelState>,
    pub finished: bool,
    pub results: LevelResultView,
    pub levels: Vec<LevelStatus>,
}

/// Outcome of the cumulative badge computation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BadgeDecision {
    pub cumulative_percentage: f64,
    pub reached_final_level: bool,
    pub passed_final_level: bool,
    pub awarded: bool,
}
