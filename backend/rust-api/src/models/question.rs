use serde::{Deserialize, Serialize};

use super::assessment::Level;

/// Multiple-choice question as stored in the "questions" collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub level: Level,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    pub text: String,
    #[serde(default)]
    pub options: Vec<String>,
    pub correct_answer: String,
}

impl Question {
    /// Case-insensitive comparison against the answer key.
    pub fn is_correct(&self, submitted: &str) -> bool {
        submitted.trim().to_lowercase() == self.correct_answer.trim().to_lowercase()
    }

    pub fn view(&self) -> QuestionView {
        QuestionView {
            id: self.id.clone(),
            level: self.level,
            subject: self.subject.clone(),
            text: self.text.clone(),
            options: self.options.clone(),
        }
    }
}

/// Question as delivered to a candidate. Never carries the answer key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionView {
    pub id: String,
    pub level: Level,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    pub text: String,
    pub options: Vec<String>,
}
