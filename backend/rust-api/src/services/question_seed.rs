use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use tokio::fs;

use crate::models::question::Question;

/// Seed file layout: `{ "questions": [ { "id", "level", "text", "options", "correct_answer" } ] }`.
#[derive(Debug, Deserialize)]
pub struct QuestionSeed {
    #[serde(default)]
    pub questions: Vec<Question>,
}

impl QuestionSeed {
    /// Drops malformed entries (no options, answer key not among the options).
    pub fn into_valid_questions(self) -> Vec<Question> {
        self.questions
            .into_iter()
            .filter(|q| {
                let valid = q.level >= 1
                    && !q.options.is_empty()
                    && q.options.iter().any(|option| q.is_correct(option));
                if !valid {
                    tracing::warn!("Skipping malformed seed question {}", q.id);
                }
                valid
            })
            .collect()
    }
}

/// Reads the configured seed file. A missing path or file yields no questions.
pub async fn load_seed_file(path: Option<&str>) -> Result<Vec<Question>> {
    let path = match path {
        Some(path) if !path.is_empty() => Path::new(path),
        _ => {
            tracing::debug!("No question seed file configured, skipping");
            return Ok(Vec::new());
        }
    };

    if !path.exists() {
        tracing::warn!("Question seed file {} not found, skipping", path.display());
        return Ok(Vec::new());
    }

    let contents = fs::read_to_string(path)
        .await
        .context("Failed to read question seed file")?;
    let seed: QuestionSeed =
        serde_json::from_str(&contents).context("Failed to deserialize question seed payload")?;

    let questions = seed.into_valid_questions();
    tracing::info!(
        "Loaded {} questions from seed file {}",
        questions.len(),
        path.display()
    );
    Ok(questions)
}
