#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use std::sync::Arc;
use tower::ServiceExt;
use virtuehire_api::{
    config::Config,
    create_router,
    models::{
        assessment::{Level, SubmittedAnswers},
        candidate::Candidate,
        hr::{HrAccount, PlanType},
        question::Question,
    },
    repositories::memory::{
        InMemoryCandidateStore, InMemoryHrAccountStore, InMemoryQuestionBank,
        InMemoryResultLedger,
    },
    services::{AppState, Stores},
};

pub const CANDIDATE: &str = "alice";
pub const OTHER_CANDIDATE: &str = "bob";
pub const VERIFIED_HR: &str = "acme";
pub const UNVERIFIED_HR: &str = "pending-co";

/// Question count per level, chosen so every score in 0..=100 the
/// scenarios need is reachable.
pub fn questions_in_level(level: Level) -> usize {
    match level {
        1 => 10,
        2 => 20,
        _ => 25,
    }
}

pub fn question_id(level: Level, index: usize) -> String {
    format!("L{}-Q{}", level, index + 1)
}

pub fn sample_questions() -> Vec<Question> {
    (1..=3)
        .flat_map(|level| {
            (0..questions_in_level(level)).map(move |index| Question {
                id: question_id(level, index),
                level,
                subject: Some("Java".to_string()),
                text: format!("Level {} question {}", level, index + 1),
                options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
                correct_answer: "a".to_string(),
            })
        })
        .collect()
}

/// Answers every question of `level`, exactly `correct` of them right.
pub fn answers_with_correct(level: Level, correct: usize) -> SubmittedAnswers {
    (0..questions_in_level(level)).fold(SubmittedAnswers::new(), |answers, index| {
        let answer = if index < correct { "a" } else { "b" };
        answers.with(question_id(level, index), answer)
    })
}

pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
    pub ledger: Arc<InMemoryResultLedger>,
    pub candidates: Arc<InMemoryCandidateStore>,
    pub hr_accounts: Arc<InMemoryHrAccountStore>,
}

pub async fn create_test_app() -> TestApp {
    create_test_app_with(Config::in_memory(), sample_questions()).await
}

pub async fn create_test_app_with(config: Config, questions: Vec<Question>) -> TestApp {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();

    let ledger = Arc::new(InMemoryResultLedger::new());
    let candidates = Arc::new(InMemoryCandidateStore::new());
    let hr_accounts = Arc::new(InMemoryHrAccountStore::new());

    candidates
        .insert(Candidate::new(CANDIDATE, "Alice Example", "alice@example.com"))
        .await;
    candidates
        .insert(Candidate::new(OTHER_CANDIDATE, "Bob Example", "bob@example.com"))
        .await;

    let mut verified = HrAccount::new(VERIFIED_HR, "Acme Hiring", "hr@acme.test");
    verified.verified = true;
    verified.apply_plan(PlanType::SingleCandidate, chrono::Utc::now());
    hr_accounts.insert(verified).await;
    hr_accounts
        .insert(HrAccount::new(UNVERIFIED_HR, "Pending Co", "hr@pending.test"))
        .await;

    let stores = Stores {
        questions: Arc::new(InMemoryQuestionBank::new(questions)),
        ledger: ledger.clone(),
        candidates: candidates.clone(),
        hr_accounts: hr_accounts.clone(),
    };
    let state = Arc::new(AppState::from_stores(config, stores, None));

    TestApp {
        router: create_router(state.clone()),
        state,
        ledger,
        candidates,
        hr_accounts,
    }
}

pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&json).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
    };
    (status, json)
}
