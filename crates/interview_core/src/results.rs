//! crates/interview_core/src/results.rs
//!
//! Derived statistics over a question list. Pure functions, no I/O.

use serde::{Deserialize, Serialize};

use crate::domain::{
    Difficulty, EvaluationReport, HireRecommendation, Question, QuestionAnalysis,
};

/// Average score for one difficulty band.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DifficultyScore {
    pub difficulty: Difficulty,
    pub answered: usize,
    pub average_score: u32,
}

/// Summary shown on the results view and sent along with the final report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultSummary {
    pub total_questions: usize,
    pub answered: usize,
    /// Rounded mean over answered questions, 0 if none were answered.
    pub average_score: u32,
    pub total_time_spent_secs: u32,
    pub by_difficulty: Vec<DifficultyScore>,
}

fn rounded_mean(scores: &[u32]) -> u32 {
    if scores.is_empty() {
        return 0;
    }
    let sum: u64 = scores.iter().map(|&s| u64::from(s)).sum();
    (sum as f64 / scores.len() as f64).round() as u32
}

fn answered_scores<'a>(questions: impl Iterator<Item = &'a Question>) -> Vec<u32> {
    questions
        .filter(|q| q.is_answered())
        .map(|q| u32::from(q.score.unwrap_or(0)))
        .collect()
}

pub fn summarize(questions: &[Question]) -> ResultSummary {
    let scores = answered_scores(questions.iter());

    let by_difficulty = Difficulty::ALL
        .iter()
        .map(|&difficulty| {
            let band = answered_scores(questions.iter().filter(|q| q.difficulty == difficulty));
            DifficultyScore {
                difficulty,
                answered: band.len(),
                average_score: rounded_mean(&band),
            }
        })
        .collect();

    ResultSummary {
        total_questions: questions.len(),
        answered: scores.len(),
        average_score: rounded_mean(&scores),
        total_time_spent_secs: questions.iter().map(|q| q.time_spent_secs).sum(),
        by_difficulty,
    }
}

/// Canned report used when the report service's reply can't be parsed.
pub fn fallback_report(questions: &[Question]) -> EvaluationReport {
    let summary = summarize(questions);
    let to_strings = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();

    EvaluationReport {
        overall_score: summary.average_score,
        summary: format!(
            "The candidate scored {}% overall with {} out of {} questions answered.",
            summary.average_score, summary.answered, summary.total_questions
        ),
        strengths: to_strings(&[
            "Demonstrated technical knowledge",
            "Provided structured answers",
        ]),
        weaknesses: to_strings(&[
            "Could improve on specific examples",
            "Some answers lacked depth",
        ]),
        recommendations: to_strings(&[
            "Practice with more complex scenarios",
            "Focus on practical examples",
        ]),
        question_analysis: questions
            .iter()
            .enumerate()
            .map(|(i, q)| QuestionAnalysis {
                question_number: i as u32 + 1,
                difficulty: q.difficulty,
                score: u32::from(q.score.unwrap_or(0)),
                feedback: q
                    .feedback
                    .clone()
                    .unwrap_or_else(|| "No feedback available".to_string()),
                time_spent: q.time_spent_secs,
                strengths: to_strings(&["Answered the question"]),
                improvements: to_strings(&["Could provide more detail"]),
            })
            .collect(),
        final_recommendation: HireRecommendation::from_average(summary.average_score),
        next_steps: to_strings(&[
            "Review technical fundamentals",
            "Practice coding problems",
        ]),
    }
}
