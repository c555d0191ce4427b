//! Lenient parsing of model output into an [`LlmEvaluationResult`].
//!
//! Fallback chain: strict JSON (after removing code fences), then a regex
//! salvage of the score, then a default. Never fails.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::domain::quality::{truncate_chars, LlmEvaluationResult, SUMMARY_MAX_CHARS};

static SCORE_FIELD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)"?\bscore"?\s*[:=]\s*"?(-?\d+(?:\.\d+)?)"#).expect("valid regex")
});

const EMPTY_RESPONSE_SUMMARY: &str = "The evaluator returned an empty response.";
const NO_SUMMARY: &str = "No summary provided.";

/// Which tier of the fallback chain produced the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseSource {
    Json,
    Salvaged,
    Default,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedEvaluation {
    pub result: LlmEvaluationResult,
    pub source: ParseSource,
}

/// Parse `raw` model output, clamping the score to `[0, max_score]`.
pub fn parse_evaluation(raw: &str, max_score: u32) -> ParsedEvaluation {
    if let Some(result) = parse_json(raw, max_score) {
        return ParsedEvaluation {
            result,
            source: ParseSource::Json,
        };
    }

    debug!("Evaluator response is not JSON, salvaging");
    let summary = if raw.trim().is_empty() {
        EMPTY_RESPONSE_SUMMARY.to_string()
    } else {
        truncate_chars(raw.trim(), SUMMARY_MAX_CHARS)
    };

    let (score, source) = match SCORE_FIELD
        .captures(raw)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
    {
        Some(value) => (clamp_score(value, max_score), ParseSource::Salvaged),
        None => (0, ParseSource::Default),
    };

    ParsedEvaluation {
        result: LlmEvaluationResult::new(score, max_score, &summary, Vec::new(), Vec::new(), ""),
        source,
    }
}

/// Body of the first markdown code fence, or the trimmed input when there
/// is none. The info string (`json`, `JSON`, `jsonc`, ...) is dropped and an
/// unclosed fence runs to the end of the reply.
pub fn strip_code_fence(content: &str) -> &str {
    const FENCE: &str = "```";

    let trimmed = content.trim();
    let Some(open) = trimmed.find(FENCE) else {
        return trimmed;
    };

    let rest = &trimmed[open + FENCE.len()..];
    let tag_len = rest
        .find(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '+')))
        .unwrap_or(rest.len());
    let body = &rest[tag_len..];

    match body.find(FENCE) {
        Some(close) => body[..close].trim(),
        None => body.trim(),
    }
}

fn parse_json(raw: &str, max_score: u32) -> Option<LlmEvaluationResult> {
    let body = strip_code_fence(raw);
    let value: Value = serde_json::from_str(body).ok().or_else(|| {
        // Prose around an object: take the outermost braces.
        let start = body.find('{')?;
        let end = body.rfind('}')?;
        (start < end)
            .then(|| serde_json::from_str(&body[start..=end]).ok())
            .flatten()
    })?;
    let obj = value.as_object()?;

    let score = obj
        .get("score")
        .and_then(coerce_number)
        .map(|n| clamp_score(n, max_score))
        .unwrap_or(0);
    let summary = obj
        .get("summary")
        .and_then(coerce_string)
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| NO_SUMMARY.to_string());
    let recommendation = obj
        .get("recommendation")
        .and_then(coerce_string)
        .unwrap_or_default();

    Some(LlmEvaluationResult::new(
        score,
        max_score,
        &summary,
        coerce_list(obj.get("strengths")),
        coerce_list(obj.get("weaknesses")),
        &recommendation,
    ))
}

fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn coerce_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        Value::Array(_) | Value::Object(_) => None,
        other => Some(other.to_string()),
    }
}

fn coerce_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items.iter().filter_map(coerce_string).collect(),
        Some(Value::String(s)) => vec![s.clone()],
        _ => Vec::new(),
    }
}

fn clamp_score(value: f64, max_score: u32) -> u32 {
    if !value.is_finite() || value <= 0.0 {
        return 0;
    }
    let rounded = value.round();
    if rounded >= f64::from(max_score) {
        max_score
    } else {
        rounded as u32
    }
}
