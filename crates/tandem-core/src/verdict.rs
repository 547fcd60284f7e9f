// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use serde::{Deserialize, Serialize};

/// A reviewer's structured decision about the current answer.
///
/// Invariants (enforced by [`parse_verdict`]):
/// - `output` is non-empty;
/// - accepted ⇒ `added_notes` is empty;
/// - rejected ⇒ `added_notes` has 2–8 entries.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReviewerVerdict {
    /// Wire key is `review_result`.
    #[serde(rename = "review_result")]
    pub accepted: bool,
    #[serde(default)]
    pub added_notes: Vec<String>,
    pub output: String,
}

/// Strip one optional markdown fence wrapper.
///
/// The opening fence may carry a language tag (```json); the closing fence
/// line is removed only when it is exactly ``` after trimming.
pub(crate) fn strip_fence(text: &str) -> String {
    let text = text.trim();
    if !text.starts_with("```") {
        return text.to_string();
    }
    let mut lines: Vec<&str> = text.lines().collect();
    if lines.len() > 1 && lines.last().is_some_and(|l| l.trim() == "```") {
        lines.pop();
    }
    lines.remove(0);
    lines.join("\n")
}

/// Parse raw assistant content into a [`ReviewerVerdict`].
///
/// Returns the failure reason on error; the caller attaches the raw content
/// for diagnostics.
pub fn parse_verdict(content: &str) -> Result<ReviewerVerdict, String> {
    let body = strip_fence(content);
    let verdict: ReviewerVerdict =
        serde_json::from_str(&body).map_err(|e| format!("invalid JSON: {e}"))?;

    if verdict.output.is_empty() {
        return Err("output must be a non-empty string".to_string());
    }
    if verdict.accepted && !verdict.added_notes.is_empty() {
        return Err(format!(
            "added_notes must be empty when review_result is true (got {})",
            verdict.added_notes.len()
        ));
    }
    if !verdict.accepted && !(2..=8).contains(&verdict.added_notes.len()) {
        return Err(format!(
            "added_notes must contain 2-8 items when review_result is false (got {})",
            verdict.added_notes.len()
        ));
    }
    Ok(verdict)
}

// ─── Unit tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn accepted_json(output: &str) -> String {
        serde_json::json!({
            "review_result": true,
            "added_notes": [],
            "output": output,
        })
        .to_string()
    }

    // ── Parsing ───────────────────────────────────────────────────────────────

    #[test]
    fn parses_plain_json() {
        let v = parse_verdict(&accepted_json("42")).unwrap();
        assert!(v.accepted);
        assert!(v.added_notes.is_empty());
        assert_eq!(v.output, "42");
    }

    #[test]
    fn parses_with_surrounding_whitespace() {
        let raw = format!("\n  {}  \n", accepted_json("ok"));
        assert!(parse_verdict(&raw).is_ok());
    }

    #[test]
    fn parses_fenced_json_with_language_tag() {
        let raw = format!("```json\n{}\n```", accepted_json("fenced"));
        let v = parse_verdict(&raw).unwrap();
        assert_eq!(v.output, "fenced");
    }

    #[test]
    fn parses_fenced_json_without_language_tag() {
        let raw = format!("```\n{}\n```", accepted_json("fenced"));
        assert!(parse_verdict(&raw).is_ok());
    }

    #[test]
    fn parses_fence_without_closing_line() {
        let raw = format!("```json\n{}", accepted_json("open"));
        let v = parse_verdict(&raw).unwrap();
        assert_eq!(v.output, "open");
    }

    #[test]
    fn missing_added_notes_defaults_to_empty() {
        let v = parse_verdict(r#"{"review_result": true, "output": "x"}"#).unwrap();
        assert!(v.added_notes.is_empty());
    }

    #[test]
    fn rejects_non_json_content() {
        let err = parse_verdict("I think the answer is fine.").unwrap_err();
        assert!(err.contains("invalid JSON"), "got: {err}");
    }

    // ── Invariants (property 5) ───────────────────────────────────────────────

    #[test]
    fn rejected_verdict_with_valid_notes_parses() {
        let raw = serde_json::json!({
            "review_result": false,
            "added_notes": ["n1", "n2"],
            "output": "improved",
        })
        .to_string();
        let v = parse_verdict(&raw).unwrap();
        assert!(!v.accepted);
        assert_eq!(v.added_notes.len(), 2);
    }

    #[test]
    fn accepted_with_notes_is_rejected() {
        let raw = serde_json::json!({
            "review_result": true,
            "added_notes": ["leftover"],
            "output": "x",
        })
        .to_string();
        assert!(parse_verdict(&raw).is_err());
    }

    #[test]
    fn rejected_with_one_note_is_rejected() {
        let raw = serde_json::json!({
            "review_result": false,
            "added_notes": ["only one"],
            "output": "x",
        })
        .to_string();
        assert!(parse_verdict(&raw).is_err());
    }

    #[test]
    fn rejected_with_nine_notes_is_rejected() {
        let notes: Vec<String> = (0..9).map(|i| format!("n{i}")).collect();
        let raw = serde_json::json!({
            "review_result": false,
            "added_notes": notes,
            "output": "x",
        })
        .to_string();
        assert!(parse_verdict(&raw).is_err());
    }

    #[test]
    fn empty_output_is_rejected() {
        let raw = serde_json::json!({
            "review_result": true,
            "added_notes": [],
            "output": "",
        })
        .to_string();
        let err = parse_verdict(&raw).unwrap_err();
        assert!(err.contains("output"), "got: {err}");
    }

    // ── Fence stripping edge cases ────────────────────────────────────────────

    #[test]
    fn strip_fence_leaves_plain_text_alone() {
        assert_eq!(strip_fence("  {\"a\": 1}  "), "{\"a\": 1}");
    }

    #[test]
    fn strip_fence_handles_lone_fence() {
        assert_eq!(strip_fence("```"), "");
    }

    #[test]
    fn strip_fence_keeps_interior_lines() {
        assert_eq!(strip_fence("```json\nline1\nline2\n```"), "line1\nline2");
    }
}
