use crate::config::{Config, StorageBackend};
use crate::models::question::Question;
use crate::repositories::{
    memory::{
        InMemoryCandidateStore, InMemoryHrAccountStore, InMemoryQuestionBank,
        InMemoryResultLedger,
    },
    mongo::{MongoCandidateStore, MongoHrAccountStore, MongoQuestionBank, MongoResultLedger},
    CandidateStore, HrAccountStore, QuestionBank, ResultLedger,
};
use mongodb::{Client as MongoClient, Database};
use std::sync::Arc;

pub mod assessment_service;
pub mod badge_service;
pub mod hr_credit_service;
pub mod level_gate;
pub mod question_seed;
pub mod scorer;

use assessment_service::AssessmentService;
use hr_credit_service::HrCreditService;

/// Storage collaborators the services are built on.
#[derive(Clone)]
pub struct Stores {
    pub questions: Arc<dyn QuestionBank>,
    pub ledger: Arc<dyn ResultLedger>,
    pub candidates: Arc<dyn CandidateStore>,
    pub hr_accounts: Arc<dyn HrAccountStore>,
}

impl Stores {
    pub fn in_memory(questions: Vec<Question>) -> Self {
        Self {
            questions: Arc::new(InMemoryQuestionBank::new(questions)),
            ledger: Arc::new(InMemoryResultLedger::new()),
            candidates: Arc::new(InMemoryCandidateStore::new()),
            hr_accounts: Arc::new(InMemoryHrAccountStore::new()),
        }
    }

    /// MongoDB-backed stores. Creates the unique attempt index and seeds questions.
    pub async fn mongo(mongo: &Database, seed: &[Question]) -> anyhow::Result<Self> {
        let questions = MongoQuestionBank::new(mongo);
        questions.ensure_indexes().await?;
        if !seed.is_empty() {
            let inserted = questions.seed(seed).await?;
            tracing::info!("Seeded {} new questions into MongoDB", inserted);
        }

        let ledger = MongoResultLedger::new(mongo);
        ledger.ensure_indexes().await?;

        Ok(Self {
            questions: Arc::new(questions),
            ledger: Arc::new(ledger),
            candidates: Arc::new(MongoCandidateStore::new(mongo)),
            hr_accounts: Arc::new(MongoHrAccountStore::new(mongo)),
        })
    }
}

pub struct AppState {
    pub config: Config,
    pub mongo: Option<Database>,
    pub assessment: AssessmentService,
    pub hr_credits: HrCreditService,
}

impl AppState {
    pub fn from_stores(config: Config, stores: Stores, mongo: Option<Database>) -> Self {
        let assessment = AssessmentService::new(
            &config.assessment,
            stores.questions,
            stores.ledger,
            stores.candidates.clone(),
        );
        let hr_credits = HrCreditService::new(stores.hr_accounts, stores.candidates);

        Self {
            config,
            mongo,
            assessment,
            hr_credits,
        }
    }

    pub async fn new(config: Config, mongo_client: Option<MongoClient>) -> anyhow::Result<Self> {
        let seed = question_seed::load_seed_file(config.question_seed_file.as_deref()).await?;

        match (config.storage, mongo_client) {
            (StorageBackend::Mongo, Some(client)) => {
                let mongo = client.database(&config.mongo_database);
                tracing::info!("Preparing MongoDB collections in {}", config.mongo_database);
                let stores = Stores::mongo(&mongo, &seed).await?;
                Ok(Self::from_stores(config, stores, Some(mongo)))
            }
            (StorageBackend::Mongo, None) => {
                anyhow::bail!("MongoDB storage selected but no client was provided")
            }
            (StorageBackend::Memory, _) => {
                tracing::warn!("Using in-memory storage; attempts are lost on restart");
                Ok(Self::from_stores(config, Stores::in_memory(seed), None))
            }
        }
    }
}
