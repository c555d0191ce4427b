//! Code-quality evaluation result and its payload limits.

use serde::{Deserialize, Serialize};

pub const SUMMARY_MAX_CHARS: usize = 300;
pub const ITEM_MAX_CHARS: usize = 150;
pub const MAX_ITEMS: usize = 5;
pub const RECOMMENDATION_MAX_CHARS: usize = 200;

/// Outcome of the LLM quality evaluation.
///
/// Constructed only through [`LlmEvaluationResult::new`], which enforces the
/// length caps regardless of what the model returned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LlmEvaluationResult {
    pub score: u32,
    pub summary: String,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub recommendation: String,
}

impl LlmEvaluationResult {
    pub fn new(
        score: u32,
        max_score: u32,
        summary: &str,
        strengths: Vec<String>,
        weaknesses: Vec<String>,
        recommendation: &str,
    ) -> Self {
        Self {
            score: score.min(max_score),
            summary: truncate_chars(summary.trim(), SUMMARY_MAX_CHARS),
            strengths: cap_items(strengths),
            weaknesses: cap_items(weaknesses),
            recommendation: truncate_chars(recommendation.trim(), RECOMMENDATION_MAX_CHARS),
        }
    }

    /// Zero-score result carrying a description of why evaluation failed.
    pub fn unavailable(reason: &str) -> Self {
        Self::new(
            0,
            0,
            &format!("Code quality evaluation unavailable: {reason}"),
            Vec::new(),
            Vec::new(),
            "Re-run the evaluation once the quality evaluator is reachable.",
        )
    }
}

/// Truncate to at most `max` characters (not bytes).
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

fn cap_items(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .take(MAX_ITEMS)
        .map(|item| truncate_chars(&item, ITEM_MAX_CHARS))
        .collect()
}
