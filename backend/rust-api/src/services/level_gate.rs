use crate::error::AssessmentError;
use crate::models::assessment::{Level, LevelResultView, LevelState, LevelStatus};

/// Strict top-down progression over levels `1..=max_level`.
///
/// The gate keeps no state of its own. Every decision is derived from a
/// [`LevelResultView`] freshly computed from the ledger, so it always agrees
/// with what has been persisted.
#[derive(Debug, Clone, Copy)]
pub struct LevelGate {
    max_level: Level,
}

impl LevelGate {
    pub fn new(max_level: Level) -> Self {
        Self { max_level }
    }

    pub fn max_level(&self) -> Level {
        self.max_level
    }

    /// Sentinel returned by [`resolve_current_level`](Self::resolve_current_level)
    /// once every level is passed.
    pub fn finished_level(&self) -> Level {
        self.max_level + 1
    }

    pub fn state_of(&self, results: &LevelResultView, level: Level) -> LevelState {
        if let Some(passed) = results.outcome(level) {
            return LevelState::Completed { passed };
        }
        if level <= 1 || results.has_passed(level - 1) {
            LevelState::Available
        } else {
            LevelState::Locked
        }
    }

    pub fn states(&self, results: &LevelResultView) -> Vec<LevelStatus> {
        (1..=self.max_level)
            .map(|level| LevelStatus {
                level,
                state: self.state_of(results, level),
            })
            .collect()
    }

    /// First level not passed. A failed level is returned forever: nothing
    /// after it can unlock.
    pub fn resolve_current_level(&self, results: &LevelResultView) -> Level {
        (1..=self.max_level)
            .find(|level| !results.has_passed(*level))
            .unwrap_or_else(|| self.finished_level())
    }

    pub fn is_finished(&self, results: &LevelResultView) -> bool {
        self.resolve_current_level(results) > self.max_level
    }

    pub fn can_enter(&self, results: &LevelResultView, level: Level) -> Result<(), AssessmentError> {
        if level == 0 || level > self.max_level {
            return Err(AssessmentError::LevelOutOfRange {
                level,
                max: self.max_level,
            });
        }
        if results.has_attempted(level) {
            return Err(AssessmentError::AlreadyAttempted { level });
        }
        if level > 1 && !results.has_passed(level - 1) {
            return Err(AssessmentError::PriorLevelNotPassed {
                level,
                required: level - 1,
            });
        }
        Ok(())
    }
}
