use axum::http::StatusCode;
use thiserror::Error;

use crate::models::assessment::Level;

/// Business and storage failures of the progression engine.
#[derive(Debug, Error)]
pub enum AssessmentError {
    #[error("You have already attempted Level {level}.")]
    AlreadyAttempted { level: Level },

    #[error("You must pass Level {required} before attempting Level {level}.")]
    PriorLevelNotPassed { level: Level, required: Level },

    #[error("Level {level} does not exist; levels run from 1 to {max}.")]
    LevelOutOfRange { level: Level, max: Level },

    /// Lost a race against a concurrent submission for the same level.
    #[error("Level {level} has already been submitted.")]
    DuplicateAttempt { level: Level },

    #[error("Assessment unavailable: no questions are configured for Level {level}.")]
    ConfigurationError { level: Level },

    #[error("Question {id} does not belong to Level {level}.")]
    UnknownQuestion { id: String, level: Level },

    #[error("Candidate {0} not found")]
    CandidateNotFound(String),

    #[error("Storage error: {0:#}")]
    Storage(#[from] anyhow::Error),
}

impl AssessmentError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AssessmentError::AlreadyAttempted { .. } | AssessmentError::DuplicateAttempt { .. } => {
                StatusCode::CONFLICT
            }
            AssessmentError::PriorLevelNotPassed { .. } => StatusCode::FORBIDDEN,
            AssessmentError::LevelOutOfRange { .. } | AssessmentError::UnknownQuestion { .. } => {
                StatusCode::BAD_REQUEST
            }
            AssessmentError::CandidateNotFound(_) => StatusCode::NOT_FOUND,
            AssessmentError::ConfigurationError { .. } => StatusCode::SERVICE_UNAVAILABLE,
            AssessmentError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Failures of the recruiter view entitlement ledger.
#[derive(Debug, Error)]
pub enum HrCreditError {
    #[error("HR account {0} not found")]
    HrNotFound(String),

    #[error("HR account is waiting for admin approval")]
    NotVerified,

    #[error("You need an active plan to view candidate details. Please purchase a plan.")]
    NoViewsRemaining,

    #[error("Candidate {0} not found")]
    CandidateNotFound(String),

    #[error("Storage error: {0:#}")]
    Storage(#[from] anyhow::Error),
}

impl HrCreditError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            HrCreditError::HrNotFound(_) | HrCreditError::CandidateNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            HrCreditError::NotVerified => StatusCode::FORBIDDEN,
            HrCreditError::NoViewsRemaining => StatusCode::PAYMENT_REQUIRED,
            HrCreditError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_level() {
        let err = AssessmentError::PriorLevelNotPassed {
            level: 3,
            required: 2,
        };
        assert_eq!(
            err.to_string(),
            "You must pass Level 2 before attempting Level 3."
        );
    }

    #[test]
    fn duplicate_is_treated_as_already_attempted() {
        assert_eq!(
            AssessmentError::AlreadyAttempted { level: 1 }.status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AssessmentError::DuplicateAttempt { level: 1 }.status_code(),
            StatusCode::CONFLICT
        );
    }
}
