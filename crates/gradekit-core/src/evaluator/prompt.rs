//! Evaluation prompt construction.

use crate::collect::CollectedFile;
use crate::domain::quality::{ITEM_MAX_CHARS, MAX_ITEMS, RECOMMENDATION_MAX_CHARS, SUMMARY_MAX_CHARS};

/// Concatenate files in collection order, each behind a path header.
pub fn build_code_blob(files: &[CollectedFile]) -> String {
    let mut blob = String::new();
    for file in files {
        blob.push_str("// File: ");
        blob.push_str(&file.relative_path);
        blob.push('\n');
        blob.push_str(&file.content);
        blob.push_str("\n\n");
    }
    blob
}

/// Build the grading prompt for `code` with a ceiling of `max_score` points.
pub fn build_prompt(code: &str, max_score: u32) -> String {
    format!(
        r#"You are grading a Flutter mobile application submitted as a programming assignment.
Evaluate the Dart source code below for code quality. Consider:
- project organization and separation of widgets, state and logic
- widget composition and reuse
- state management choices
- naming, readability and formatting
- error handling and null safety
- idiomatic Dart and Flutter practices

Award an integer score from 0 to {max_score}.

SOURCE CODE:
{code}
Respond with ONLY a JSON object, no markdown, in exactly this shape:
{{
  "score": <integer 0-{max_score}>,
  "summary": "<at most {SUMMARY_MAX_CHARS} characters>",
  "strengths": ["<at most {ITEM_MAX_CHARS} characters>", "... up to {MAX_ITEMS} items"],
  "weaknesses": ["<at most {ITEM_MAX_CHARS} characters>", "... up to {MAX_ITEMS} items"],
  "recommendation": "<at most {RECOMMENDATION_MAX_CHARS} characters>"
}}
Keep every field concise."#
    )
}
