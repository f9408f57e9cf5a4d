use crate::models::{
    assessment::{EvaluationOutcome, SubmittedAnswers},
    question::Question,
};

/// Pure scoring of one submission against a level's question set.
#[derive(Debug, Clone, Copy)]
pub struct Scorer {
    pass_threshold: u32,
}

impl Scorer {
    pub fn new(pass_threshold: u32) -> Self {
        Self { pass_threshold }
    }

    pub fn pass_threshold(&self) -> u32 {
        self.pass_threshold
    }

    pub fn evaluate(&self, questions: &[Question], answers: &SubmittedAnswers) -> EvaluationOutcome {
        let correct = questions
            .iter()
            .filter(|q| answers.get(&q.id).is_some_and(|answer| q.is_correct(answer)))
            .count();
        let score = score_percentage(correct, questions.len());

        EvaluationOutcome {
            score,
            total: questions.len() as u32,
            passed: score >= self.pass_threshold,
            badge_pending: false,
        }
    }
}

/// `round(correct * 100 / total)`, 0 for an empty question set.
pub fn score_percentage(correct: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    ((correct as f64 * 100.0) / total as f64).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn questions(count: usize) -> Vec<Question> {
        (1..=count)
            .map(|i| Question {
                id: format!("q{}", i),
                level: 1,
                subject: None,
                text: format!("Question {}", i),
                options: vec!["A".into(), "B".into(), "C".into()],
                correct_answer: "A".into(),
            })
            .collect()
    }

    fn answer_correctly(count: usize) -> SubmittedAnswers {
        (1..=count).fold(SubmittedAnswers::new(), |answers, i| {
            answers.with(format!("q{}", i), "a")
        })
    }

    #[test]
    fn half_correct_passes_at_default_threshold() {
        let outcome = Scorer::new(50).evaluate(&questions(10), &answer_correctly(5));
        assert_eq!(
            outcome,
            EvaluationOutcome {
                score: 50,
                total: 10,
                passed: true,
                badge_pending: false,
            }
        );
    }

    #[test]
    fn four_of_ten_fails() {
        let outcome = Scorer::new(50).evaluate(&questions(10), &answer_correctly(4));
        assert_eq!(outcome.score, 40);
        assert!(!outcome.passed);
    }

    #[test]
    fn wrong_and_missing_answers_score_nothing() {
        let answers = SubmittedAnswers::new().with("q1", "B").with("q2", "");
        let outcome = Scorer::new(50).evaluate(&questions(3), &answers);
        assert_eq!(outcome.score, 0);
        assert_eq!(outcome.total, 3);
    }

    #[test]
    fn empty_question_set_scores_zero() {
        let outcome = Scorer::new(50).evaluate(&[], &answer_correctly(3));
        assert_eq!(
            outcome,
            EvaluationOutcome {
                score: 0,
                total: 0,
                passed: false,
                badge_pending: false,
            }
        );
    }

    #[test]
    fn zero_threshold_passes_empty_score() {
        let outcome = Scorer::new(0).evaluate(&questions(2), &SubmittedAnswers::new());
        assert!(outcome.passed);
    }

    #[test]
    fn percentage_rounds_to_nearest() {
        assert_eq!(score_percentage(1, 3), 33);
        assert_eq!(score_percentage(2, 3), 67);
        assert_eq!(score_percentage(1, 8), 13);
        assert_eq!(score_percentage(3, 3), 100);
    }

    #[test]
    fn evaluation_is_deterministic() {
        let scorer = Scorer::new(50);
        let qs = questions(7);
        let answers = answer_correctly(4).with("q6", "c");
        let first = scorer.evaluate(&qs, &answers);
        for _ in 0..10 {
            assert_eq!(scorer.evaluate(&qs, &answers), first);
        }
    }
}
