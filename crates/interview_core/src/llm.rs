//! crates/interview_core/src/llm.rs
//!
//! Best-effort parsing of free-text replies from generative AI services.
//!
//! Models tend to wrap JSON in markdown fences or surround it with prose. Each
//! parser here is fallible; the `*_or_fallback` helpers substitute a fixed value
//! so a malformed reply never reaches the session as an error.

use std::sync::OnceLock;

use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::domain::{Difficulty, Evaluation, EvaluationReport, GeneratedQuestion, Question};
use crate::results::fallback_report;

/// Score applied when the scoring reply can't be parsed.
pub const FALLBACK_SCORE: u8 = 70;

pub const FALLBACK_FEEDBACK: &str =
    "Your answer was received, but the automated evaluation could not be read. A default score was applied.";

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("No JSON object found in the response")]
    NoJson,
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Missing or invalid field: {0}")]
    Field(&'static str),
}

fn fence_regex() -> &'static Regex {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    FENCE.get_or_init(|| {
        Regex::new(r"(?s)```[A-Za-z]*\s*(.*?)```").expect("fence pattern is valid")
    })
}

/// Finds the JSON payload in a model reply: the first fenced block if there is
/// one, otherwise the outermost `{...}` or `[...]` span.
pub fn extract_json(text: &str) -> Option<&str> {
    if let Some(inner) = fence_regex().captures(text).and_then(|c| c.get(1)) {
        let inner = inner.as_str().trim();
        if !inner.is_empty() {
            return Some(inner);
        }
    }

    let text = text.trim();
    let object = text.find('{').zip(text.rfind('}'));
    let array = text.find('[').zip(text.rfind(']'));
    let span = match (object, array) {
        (Some(o), Some(a)) => Some(if a.0 < o.0 { a } else { o }),
        (o, a) => o.or(a),
    };
    span.filter(|(start, end)| start < end)
        .map(|(start, end)| &text[start..=end])
}

fn parse_value(text: &str) -> Result<Value, ParseError> {
    let json = extract_json(text).ok_or(ParseError::NoJson)?;
    Ok(serde_json::from_str(json)?)
}

fn score_from(value: &Value) -> Option<u8> {
    let raw = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().trim_end_matches('%').parse::<f64>().ok()?,
        _ => return None,
    };
    if !raw.is_finite() {
        return None;
    }
    Some(raw.round().clamp(0.0, 100.0) as u8)
}

//=========================================================================================
// Scoring
//=========================================================================================

pub fn parse_evaluation(text: &str) -> Result<Evaluation, ParseError> {
    let value = parse_value(text)?;
    let score = value
        .get("score")
        .and_then(score_from)
        .ok_or(ParseError::Field("score"))?;
    let feedback = value
        .get("feedback")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .ok_or(ParseError::Field("feedback"))?;
    Ok(Evaluation {
        score,
        feedback: feedback.to_string(),
    })
}

pub fn fallback_evaluation() -> Evaluation {
    Evaluation {
        score: FALLBACK_SCORE,
        feedback: FALLBACK_FEEDBACK.to_string(),
    }
}

pub fn evaluation_or_fallback(text: &str) -> Evaluation {
    parse_evaluation(text).unwrap_or_else(|e| {
        warn!("Could not parse scoring reply ({}); using fallback evaluation.", e);
        fallback_evaluation()
    })
}

//=========================================================================================
// Question generation
//=========================================================================================

#[derive(Deserialize)]
struct RawQuestion {
    question: String,
    #[serde(default)]
    difficulty: Option<String>,
    #[serde(default)]
    solution: Option<String>,
}

pub fn parse_generated_question(text: &str) -> Result<GeneratedQuestion, ParseError> {
    let value = match parse_value(text)? {
        // Some models answer with a one-element array even when asked for an object.
        Value::Array(items) => items.into_iter().next().ok_or(ParseError::Field("question"))?,
        other => other,
    };
    let raw: RawQuestion = serde_json::from_value(value)?;
    let question = raw.question.trim();
    if question.is_empty() {
        return Err(ParseError::Field("question"));
    }
    Ok(GeneratedQuestion {
        question: question.to_string(),
        difficulty: raw.difficulty.as_deref().and_then(Difficulty::parse),
        solution: raw.solution.unwrap_or_default().trim().to_string(),
    })
}

pub fn fallback_question() -> GeneratedQuestion {
    GeneratedQuestion {
        question: "Explain the difference between controlled and uncontrolled components in React, and provide an example of each.".to_string(),
        difficulty: Some(Difficulty::Medium),
        solution: "Controlled components: form elements whose values are driven by React state, e.g. an input whose value is tied to `useState`. Uncontrolled components: form elements whose values live in the DOM, e.g. an input read through a `useRef`.".to_string(),
    }
}

pub fn question_or_fallback(text: &str) -> GeneratedQuestion {
    parse_generated_question(text).unwrap_or_else(|e| {
        warn!("Could not parse generated question ({}); using fallback question.", e);
        fallback_question()
    })
}

//=========================================================================================
// Reports
//=========================================================================================

pub fn parse_report(text: &str) -> Result<EvaluationReport, ParseError> {
    let value = parse_value(text)?;
    Ok(serde_json::from_value(value)?)
}

pub fn report_or_fallback(text: &str, questions: &[Question]) -> EvaluationReport {
    parse_report(text).unwrap_or_else(|e| {
        warn!("Could not parse report reply ({}); using fallback report.", e);
        fallback_report(questions)
    })
}
