//! Quiz grading
//!
//! Multiple choice and true/false questions are graded automatically.
//! Short answers are reported with their reference answer for the learner
//! to compare, and never count towards the score.

use crate::types::quiz::{parse_boolean_answer, strip_option_label};
use crate::types::{AnswerSet, Question, QuestionResult, Quiz, ScoreRating, ScoreReport};

/// Grade submitted answers against a quiz
pub fn grade(quiz: &Quiz, answers: &AnswerSet) -> ScoreReport {
    let per_question: Vec<QuestionResult> = quiz
        .questions
        .iter()
        .enumerate()
        .map(|(index, question)| {
            let submitted = answers.get(index);
            QuestionResult {
                index,
                kind: question.kind(),
                question: question.prompt().to_string(),
                submitted: submitted.map(str::to_string),
                expected: question.expected_answer(),
                explanation: question.explanation().map(str::to_string),
                is_correct: is_correct(question, submitted),
            }
        })
        .collect();

    let gradable_count = per_question.iter().filter(|r| r.is_correct.is_some()).count();
    let correct_count = per_question
        .iter()
        .filter(|r| r.is_correct == Some(true))
        .count();

    let percentage = (gradable_count > 0)
        .then(|| round1(correct_count as f64 / gradable_count as f64 * 100.0));

    ScoreReport {
        correct_count,
        gradable_count,
        total_count: quiz.len(),
        percentage,
        no_gradable_questions: gradable_count == 0,
        rating: percentage.map(ScoreRating::from_percentage),
        per_question,
    }
}

/// `None` for questions that are not auto-graded
fn is_correct(question: &Question, submitted: Option<&str>) -> Option<bool> {
    match question {
        Question::Mcq(q) => Some(submitted.is_some_and(|answer| {
            q.options
                .get(q.correct_option_index)
                .is_some_and(|correct| strip_option_label(answer) == strip_option_label(correct))
        })),
        Question::TrueFalse(q) => {
            Some(submitted.and_then(parse_boolean_answer) == Some(q.correct_answer))
        }
        Question::ShortAnswer(_) => None,
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{MultipleChoice, ShortAnswer, TrueFalse};

    fn capital_question() -> Question {
        Question::Mcq(MultipleChoice {
            prompt: "What is the capital of France?".to_string(),
            options: vec!["A. Paris".to_string(), "B. Lyon".to_string()],
            correct_option_index: 0,
            explanation: "Paris is the capital.".to_string(),
        })
    }

    fn sun_question() -> Question {
        Question::TrueFalse(TrueFalse {
            prompt: "The sun is a star.".to_string(),
            correct_answer: true,
            explanation: None,
        })
    }

    fn short_question() -> Question {
        Question::ShortAnswer(ShortAnswer {
            prompt: "Define photosynthesis.".to_string(),
            explanation: "Light turned into chemical energy.".to_string(),
        })
    }

    fn quiz(questions: Vec<Question>) -> Quiz {
        Quiz { questions }
    }

    #[test]
    fn test_mcq_label_stripping() {
        let q = quiz(vec![capital_question()]);

        for answer in ["Paris", "A. Paris", " Paris "] {
            let report = grade(&q, &AnswerSet::new().with(0, answer));
            assert_eq!(report.per_question[0].is_correct, Some(true), "{}", answer);
        }
        for answer in ["B. Lyon", "Lyon", "paris"] {
            let report = grade(&q, &AnswerSet::new().with(0, answer));
            assert_eq!(report.per_question[0].is_correct, Some(false), "{}", answer);
        }

        let report = grade(&q, &AnswerSet::new().with(0, "Paris"));
        assert_eq!(report.per_question[0].expected, "Paris");
        assert_eq!(report.percentage, Some(100.0));
        assert_eq!(report.rating, Some(ScoreRating::Excellent));
    }

    #[test]
    fn test_true_false() {
        let q = quiz(vec![sun_question()]);

        let report = grade(&q, &AnswerSet::new().with(0, "Vrai"));
        assert_eq!(report.per_question[0].is_correct, Some(true));
        assert_eq!(report.per_question[0].expected, "True");

        let report = grade(&q, &AnswerSet::new().with(0, "Faux"));
        assert_eq!(report.per_question[0].is_correct, Some(false));

        let report = grade(&q, &AnswerSet::new().with(0, "perhaps"));
        assert_eq!(report.per_question[0].is_correct, Some(false));

        let report = grade(&q, &AnswerSet::new());
        assert_eq!(report.per_question[0].is_correct, Some(false));
        assert_eq!(report.per_question[0].submitted, None);
    }

    #[test]
    fn test_aggregate_excludes_short_answers() {
        let mut second = capital_question();
        if let Question::Mcq(mcq) = &mut second {
            mcq.correct_option_index = 1;
        }
        let q = quiz(vec![capital_question(), second, sun_question(), short_question()]);
        let answers = AnswerSet::new()
            .with(0, "Paris")
            .with(1, "Paris")
            .with(2, "true")
            .with(3, "Plants make food from light.");

        let report = grade(&q, &answers);
        assert_eq!(report.total_count, 4);
        assert_eq!(report.gradable_count, 3);
        assert_eq!(report.correct_count, 2);
        assert_eq!(report.percentage, Some(66.7));
        assert_eq!(report.rating, Some(ScoreRating::Good));
        assert!(!report.no_gradable_questions);

        let short = &report.per_question[3];
        assert_eq!(short.is_correct, None);
        assert_eq!(short.expected, "Light turned into chemical energy.");
        assert_eq!(short.submitted.as_deref(), Some("Plants make food from light."));
    }

    #[test]
    fn test_no_gradable_questions() {
        let report = grade(&quiz(vec![short_question()]), &AnswerSet::new());

        assert_eq!(report.gradable_count, 0);
        assert_eq!(report.percentage, None);
        assert_eq!(report.rating, None);
        assert!(report.no_gradable_questions);
    }

    #[test]
    fn test_blank_answer_is_unanswered() {
        let report = grade(&quiz(vec![capital_question()]), &AnswerSet::new().with(0, "   "));
        assert_eq!(report.per_question[0].is_correct, Some(false));
        assert_eq!(report.per_question[0].submitted, None);
        assert_eq!(report.percentage, Some(0.0));
        assert_eq!(report.rating, Some(ScoreRating::KeepStudying));
    }
}
