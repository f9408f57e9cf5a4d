use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;

use super::{CandidateStore, HrAccountStore, QuestionBank, ResultLedger};
use crate::error::AssessmentError;
use crate::models::{
    assessment::{AssessmentAttempt, Level},
    candidate::Candidate,
    hr::HrAccount,
    question::Question,
};

#[derive(Debug, Default)]
pub struct InMemoryQuestionBank {
    questions: Vec<Question>,
}

impl InMemoryQuestionBank {
    pub fn new(questions: Vec<Question>) -> Self {
        Self { questions }
    }
}

#[async_trait]
impl QuestionBank for InMemoryQuestionBank {
    async fn questions_for_level(&self, level: Level) -> Result<Vec<Question>> {
        Ok(self
            .questions
            .iter()
            .filter(|q| q.level == level)
            .cloned()
            .collect())
    }
}

/// Ledger keyed by (candidate, level). The map lock makes check-and-insert a
/// single step, so concurrent submissions for one pair produce one record.
#[derive(Debug, Default)]
pub struct InMemoryResultLedger {
    attempts: Mutex<HashMap<(String, Level), AssessmentAttempt>>,
}

impl InMemoryResultLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.attempts.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.attempts.lock().await.is_empty()
    }
}

#[async_trait]
impl ResultLedger for InMemoryResultLedger {
    async fn record_attempt(
        &self,
        candidate_id: &str,
        level: Level,
        score: u32,
    ) -> Result<AssessmentAttempt, AssessmentError> {
        let mut attempts = self.attempts.lock().await;
        let key = (candidate_id.to_string(), level);
        if attempts.contains_key(&key) {
            return Err(AssessmentError::DuplicateAttempt { level });
        }

        let attempt = AssessmentAttempt::new(candidate_id, level, score);
        attempts.insert(key, attempt.clone());
        Ok(attempt)
    }

    async fn attempts_for(&self, candidate_id: &str) -> Result<Vec<AssessmentAttempt>> {
        let attempts = self.attempts.lock().await;
        let mut found: Vec<AssessmentAttempt> = attempts
            .values()
            .filter(|a| a.candidate_id == candidate_id)
            .cloned()
            .collect();
        found.sort_by_key(|a| a.level);
        Ok(found)
    }
}

#[derive(Debug, Default)]
pub struct InMemoryCandidateStore {
    candidates: Mutex<HashMap<String, Candidate>>,
}

impl InMemoryCandidateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, candidate: Candidate) {
        self.candidates
            .lock()
            .await
            .insert(candidate.id.clone(), candidate);
    }
}

#[async_trait]
impl CandidateStore for InMemoryCandidateStore {
    async fn load(&self, candidate_id: &str) -> Result<Option<Candidate>> {
        Ok(self.candidates.lock().await.get(candidate_id).cloned())
    }

    async fn save(&self, candidate: &Candidate) -> Result<()> {
        self.candidates
            .lock()
            .await
            .insert(candidate.id.clone(), candidate.clone());
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryHrAccountStore {
    accounts: Mutex<HashMap<String, HrAccount>>,
}

impl InMemoryHrAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, account: HrAccount) {
        self.accounts
            .lock()
            .await
            .insert(account.id.clone(), account);
    }
}

#[async_trait]
impl HrAccountStore for InMemoryHrAccountStore {
    async fn load(&self, hr_id: &str) -> Result<Option<HrAccount>> {
        Ok(self.accounts.lock().await.get(hr_id).cloned())
    }

    async fn save(&self, account: &HrAccount) -> Result<()> {
        self.accounts
            .lock()
            .await
            .insert(account.id.clone(), account.clone());
        Ok(())
    }

    async fn take_view(&self, hr_id: &str) -> Result<Option<HrAccount>> {
        let mut accounts = self.accounts.lock().await;
        let Some(account) = accounts.get_mut(hr_id) else {
            return Ok(None);
        };
        if account.remaining_views == 0 {
            return Ok(None);
        }

        account.remaining_views -= 1;
        if account.remaining_views == 0 {
            account.plan = None;
        }
        Ok(Some(account.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn ledger_rejects_second_attempt() {
        let ledger = InMemoryResultLedger::new();
        ledger.record_attempt("c1", 1, 70).await.unwrap();

        let err = ledger.record_attempt("c1", 1, 90).await.unwrap_err();
        assert!(matches!(err, AssessmentError::DuplicateAttempt { level: 1 }));

        let stored = ledger.attempts_for("c1").await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].score, 70);
    }

    #[tokio::test]
    async fn ledger_keeps_candidates_apart() {
        let ledger = InMemoryResultLedger::new();
        ledger.record_attempt("c1", 1, 70).await.unwrap();
        ledger.record_attempt("c2", 1, 30).await.unwrap();
        ledger.record_attempt("c1", 2, 55).await.unwrap();

        let attempts = ledger.attempts_for("c1").await.unwrap();
        assert_eq!(
            attempts.iter().map(|a| a.level).collect::<Vec<_>>(),
            vec![1, 2]
        );
        assert_eq!(ledger.len().await, 3);
    }

    #[tokio::test]
    async fn concurrent_writers_leave_one_attempt() {
        let ledger = Arc::new(InMemoryResultLedger::new());
        let mut handles = Vec::new();
        for score in 0..16u32 {
            let ledger = ledger.clone();
            handles.push(tokio::spawn(async move {
                ledger.record_attempt("c1", 2, score).await
            }));
        }

        let mut successes = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                successes += 1;
            }
        }

        assert_eq!(successes, 1);
        assert_eq!(ledger.attempts_for("c1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn take_view_stops_at_zero() {
        let store = InMemoryHrAccountStore::new();
        let mut account = HrAccount::new("hr1", "Acme", "hr@acme.test");
        account.remaining_views = 1;
        account.plan = Some(crate::models::hr::PlanType::SingleCandidate);
        store.insert(account).await;

        let updated = store.take_view("hr1").await.unwrap().unwrap();
        assert_eq!(updated.remaining_views, 0);
        assert!(updated.plan.is_none());
        assert!(store.take_view("hr1").await.unwrap().is_none());
    }
}
