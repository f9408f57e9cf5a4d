//! Storage seams of the engine. Services only talk to these traits; the
//! MongoDB adapters back production and the in-memory adapters back tests and
//! local runs.

use anyhow::Result;
use async_trait::async_trait;

use crate::error::AssessmentError;
use crate::models::{
    assessment::{AssessmentAttempt, Level},
    candidate::Candidate,
    hr::HrAccount,
    question::Question,
};

pub mod memory;
pub mod mongo;

/// Read-only question lookup.
#[async_trait]
pub trait QuestionBank: Send + Sync {
    /// Questions of one level in a stable order.
    async fn questions_for_level(&self, level: Level) -> Result<Vec<Question>>;
}

/// Append-only store of one attempt per (candidate, level).
#[async_trait]
pub trait ResultLedger: Send + Sync {
    /// Persists a new attempt stamped with the current time. Fails with
    /// [`AssessmentError::DuplicateAttempt`] when the pair already has one,
    /// atomically with respect to concurrent writers.
    async fn record_attempt(
        &self,
        candidate_id: &str,
        level: Level,
        score: u32,
    ) -> Result<AssessmentAttempt, AssessmentError>;

    /// All attempts of a candidate ordered by level.
    async fn attempts_for(&self, candidate_id: &str) -> Result<Vec<AssessmentAttempt>>;
}

#[async_trait]
pub trait CandidateStore: Send + Sync {
    async fn load(&self, candidate_id: &str) -> Result<Option<Candidate>>;
    async fn save(&self, candidate: &Candidate) -> Result<()>;
}

#[async_trait]
pub trait HrAccountStore: Send + Sync {
    async fn load(&self, hr_id: &str) -> Result<Option<HrAccount>>;
    async fn save(&self, account: &HrAccount) -> Result<()>;

    /// Atomically takes one counted view if any are left. Returns the updated
    /// account, or `None` when nothing was taken. The plan is cleared when the
    /// last view is used.
    async fn take_view(&self, hr_id: &str) -> Result<Option<HrAccount>>;
}
