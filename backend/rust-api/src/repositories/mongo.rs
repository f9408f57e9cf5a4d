use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, oid::ObjectId, Bson, DateTime as BsonDateTime},
    error::{ErrorKind, WriteFailure},
    options::{IndexOptions, ReturnDocument},
    Collection, Database, IndexModel,
};
use serde::{Deserialize, Serialize};

use super::{CandidateStore, HrAccountStore, QuestionBank, ResultLedger};
use crate::error::AssessmentError;
use crate::metrics::track_db_operation;
use crate::models::{
    assessment::{AssessmentAttempt, Level},
    candidate::Candidate,
    hr::HrAccount,
    question::Question,
};
use crate::utils::retry::{retry_if, RetryConfig};
use crate::utils::time::{bson_to_chrono, chrono_to_bson};

pub const QUESTIONS_COLLECTION: &str = "questions";
pub const ATTEMPTS_COLLECTION: &str = "assessment_attempts";
pub const CANDIDATES_COLLECTION: &str = "candidates";
pub const HR_ACCOUNTS_COLLECTION: &str = "hr_accounts";

const DUPLICATE_KEY_CODE: i32 = 11000;

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        *err.kind,
        ErrorKind::Write(WriteFailure::WriteError(ref we)) if we.code == DUPLICATE_KEY_CODE
    )
}

/// Connection-level failures worth another read.
fn is_transient(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        cause
            .downcast_ref::<mongodb::error::Error>()
            .is_some_and(|e| {
                matches!(
                    *e.kind,
                    ErrorKind::Io(_)
                        | ErrorKind::ServerSelection { .. }
                        | ErrorKind::ConnectionPoolCleared { .. }
                )
            })
    })
}

pub struct MongoQuestionBank {
    collection: Collection<Question>,
}

impl MongoQuestionBank {
    pub fn new(mongo: &Database) -> Self {
        Self {
            collection: mongo.collection(QUESTIONS_COLLECTION),
        }
    }

    pub async fn ensure_indexes(&self) -> Result<()> {
        self.collection
            .create_index(IndexModel::builder().keys(doc! { "level": 1 }).build())
            .await
            .context("Failed to create questions level index")?;
        Ok(())
    }

    /// Inserts questions that are not stored yet; existing ids are left alone.
    pub async fn seed(&self, questions: &[Question]) -> Result<usize> {
        let raw = self.collection.clone_with_type::<mongodb::bson::Document>();
        let mut inserted = 0;
        for question in questions {
            let document = mongodb::bson::to_document(question)
                .with_context(|| format!("Failed to encode question {}", question.id))?;
            let result = raw
                .update_one(
                    doc! { "_id": &question.id },
                    doc! { "$setOnInsert": document },
                )
                .upsert(true)
                .await
                .with_context(|| format!("Failed to seed question {}", question.id))?;
            if result.upserted_id.is_some() {
                inserted += 1;
            }
        }
        Ok(inserted)
    }
}

#[async_trait]
impl QuestionBank for MongoQuestionBank {
    async fn questions_for_level(&self, level: Level) -> Result<Vec<Question>> {
        retry_if(RetryConfig::default(), is_transient, || {
            track_db_operation("find", QUESTIONS_COLLECTION, async {
                let cursor = self
                    .collection
                    .find(doc! { "level": i64::from(level) })
                    .sort(doc! { "_id": 1 })
                    .await
                    .context("Failed to query questions")?;
                cursor
                    .try_collect::<Vec<Question>>()
                    .await
                    .context("Failed to read questions cursor")
            })
        })
        .await
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct AttemptDocument {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    id: Option<ObjectId>,
    candidate_id: String,
    level: i64,
    score: i64,
    attempted_at: BsonDateTime,
}

impl From<&AssessmentAttempt> for AttemptDocument {
    fn from(attempt: &AssessmentAttempt) -> Self {
        Self {
            id: None,
            candidate_id: attempt.candidate_id.clone(),
            level: i64::from(attempt.level),
            score: i64::from(attempt.score),
            attempted_at: chrono_to_bson(attempt.attempted_at),
        }
    }
}

impl TryFrom<AttemptDocument> for AssessmentAttempt {
    type Error = anyhow::Error;

    fn try_from(document: AttemptDocument) -> Result<Self> {
        Ok(Self {
            level: Level::try_from(document.level)
                .with_context(|| format!("Invalid level {} in attempt", document.level))?,
            score: u32::try_from(document.score)
                .with_context(|| format!("Invalid score {} in attempt", document.score))?,
            candidate_id: document.candidate_id,
            attempted_at: bson_to_chrono(document.attempted_at),
        })
    }
}

/// Ledger backed by a unique (candidate_id, level) index. The index is what
/// makes concurrent submissions safe: the losing insert fails with a
/// duplicate-key error.
pub struct MongoResultLedger {
    collection: Collection<AttemptDocument>,
}

impl MongoResultLedger {
    pub fn new(mongo: &Database) -> Self {
        Self {
            collection: mongo.collection(ATTEMPTS_COLLECTION),
        }
    }

    pub async fn ensure_indexes(&self) -> Result<()> {
        let index = IndexModel::builder()
            .keys(doc! { "candidate_id": 1, "level": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("candidate_level_unique".to_string())
                    .build(),
            )
            .build();
        self.collection
            .create_index(index)
            .await
            .context("Failed to create unique attempt index")?;
        Ok(())
    }
}

#[async_trait]
impl ResultLedger for MongoResultLedger {
    async fn record_attempt(
        &self,
        candidate_id: &str,
        level: Level,
        score: u32,
    ) -> Result<AssessmentAttempt, AssessmentError> {
        let attempt = AssessmentAttempt::new(candidate_id, level, score);
        let document = AttemptDocument::from(&attempt);

        // No retry here: a retried insert could turn our own write into a duplicate.
        let result = track_db_operation("insert", ATTEMPTS_COLLECTION, async {
            match self.collection.insert_one(&document).await {
                Ok(_) => Ok(None),
                Err(e) if is_duplicate_key(&e) => Ok(Some(())),
                Err(e) => Err(anyhow::Error::new(e).context("Failed to insert attempt")),
            }
        })
        .await?;

        match result {
            None => Ok(attempt),
            Some(()) => Err(AssessmentError::DuplicateAttempt { level }),
        }
    }

    async fn attempts_for(&self, candidate_id: &str) -> Result<Vec<AssessmentAttempt>> {
        let documents = retry_if(RetryConfig::default(), is_transient, || {
            track_db_operation("find", ATTEMPTS_COLLECTION, async {
                let cursor = self
                    .collection
                    .find(doc! { "candidate_id": candidate_id })
                    .sort(doc! { "level": 1 })
                    .await
                    .context("Failed to query attempts")?;
                cursor
                    .try_collect::<Vec<AttemptDocument>>()
                    .await
                    .context("Failed to read attempts cursor")
            })
        })
        .await?;

        documents
            .into_iter()
            .map(AssessmentAttempt::try_from)
            .collect()
    }
}

pub struct MongoCandidateStore {
    collection: Collection<Candidate>,
}

impl MongoCandidateStore {
    pub fn new(mongo: &Database) -> Self {
        Self {
            collection: mongo.collection(CANDIDATES_COLLECTION),
        }
    }
}

#[async_trait]
impl CandidateStore for MongoCandidateStore {
    async fn load(&self, candidate_id: &str) -> Result<Option<Candidate>> {
        retry_if(RetryConfig::default(), is_transient, || {
            track_db_operation("find_one", CANDIDATES_COLLECTION, async {
                self.collection
                    .find_one(doc! { "_id": candidate_id })
                    .await
                    .context("Failed to query candidate")
            })
        })
        .await
    }

    async fn save(&self, candidate: &Candidate) -> Result<()> {
        // $set keeps profile fields this service does not model.
        let badge: Bson = candidate.badge.clone().into();
        track_db_operation("update", CANDIDATES_COLLECTION, async {
            self.collection
                .update_one(
                    doc! { "_id": &candidate.id },
                    doc! { "$set": {
                        "full_name": &candidate.full_name,
                        "email": &candidate.email,
                        "badge": badge,
                    }},
                )
                .upsert(true)
                .await
                .context("Failed to save candidate")?;
            Ok(())
        })
        .await
    }
}

pub struct MongoHrAccountStore {
    collection: Collection<HrAccount>,
}

impl MongoHrAccountStore {
    pub fn new(mongo: &Database) -> Self {
        Self {
            collection: mongo.collection(HR_ACCOUNTS_COLLECTION),
        }
    }
}

#[async_trait]
impl HrAccountStore for MongoHrAccountStore {
    async fn load(&self, hr_id: &str) -> Result<Option<HrAccount>> {
        retry_if(RetryConfig::default(), is_transient, || {
            track_db_operation("find_one", HR_ACCOUNTS_COLLECTION, async {
                self.collection
                    .find_one(doc! { "_id": hr_id })
                    .await
                    .context("Failed to query HR account")
            })
        })
        .await
    }

    async fn save(&self, account: &HrAccount) -> Result<()> {
        track_db_operation("replace", HR_ACCOUNTS_COLLECTION, async {
            self.collection
                .replace_one(doc! { "_id": &account.id }, account)
                .upsert(true)
                .await
                .context("Failed to save HR account")?;
            Ok(())
        })
        .await
    }

    async fn take_view(&self, hr_id: &str) -> Result<Option<HrAccount>> {
        let updated = track_db_operation("find_one_and_update", HR_ACCOUNTS_COLLECTION, async {
            self.collection
                .find_one_and_update(
                    doc! { "_id": hr_id, "remaining_views": { "$gt": 0 } },
                    doc! { "$inc": { "remaining_views": -1 } },
                )
                .return_document(ReturnDocument::After)
                .await
                .context("Failed to decrement HR views")
        })
        .await?;

        let Some(mut account) = updated else {
            return Ok(None);
        };

        if account.remaining_views == 0 {
            track_db_operation("update", HR_ACCOUNTS_COLLECTION, async {
                self.collection
                    .update_one(
                        doc! { "_id": hr_id, "remaining_views": 0 },
                        doc! { "$set": { "plan": Bson::Null } },
                    )
                    .await
                    .context("Failed to clear exhausted plan")?;
                Ok(())
            })
            .await?;
            account.plan = None;
        }

        Ok(Some(account))
    }
}
