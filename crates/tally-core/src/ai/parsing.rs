//! JSON parsing helpers for model responses
//!
//! Models often wrap the JSON payload in prose or code fences; these helpers
//! extract the object and deserialize it.

use crate::error::{Error, Result};
use crate::models::{ExtractedExpense, ExtractedGoal};

/// Locate the JSON object in a model reply (first `{` to last `}`)
fn json_slice(response: &str) -> Result<&str> {
    let response = response.trim();
    let start = response.find('{');
    let end = response.rfind('}');

    match (start, end) {
        (Some(s), Some(e)) if s < e => Ok(&response[s..=e]),
        _ => Err(Error::Model(format!(
            "No JSON found in model response | Raw: {}",
            truncate(response)
        ))),
    }
}

fn truncate(s: &str) -> String {
    if s.len() > 200 {
        let cut = s
            .char_indices()
            .take_while(|(i, _)| *i < 200)
            .last()
            .map(|(i, c)| i + c.len_utf8())
            .unwrap_or(0);
        format!("{}...", &s[..cut])
    } else {
        s.to_string()
    }
}

/// Parse an expense extraction from a model response
pub fn parse_expense_response(response: &str) -> Result<ExtractedExpense> {
    let json_str = json_slice(response)?;
    serde_json::from_str(json_str).map_err(|e| {
        Error::Model(format!(
            "Invalid expense JSON from model: {} | Raw: {}",
            e,
            truncate(json_str)
        ))
    })
}

/// Parse a goal extraction from a model response
pub fn parse_goal_response(response: &str) -> Result<ExtractedGoal> {
    let json_str = json_slice(response)?;
    serde_json::from_str(json_str).map_err(|e| {
        Error::Model(format!(
            "Invalid goal JSON from model: {} | Raw: {}",
            e,
            truncate(json_str)
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_expense() {
        let response =
            r#"{"amount": 12.5, "category": "Groceries", "merchant": "Rewe", "note": ""}"#;
        let result = parse_expense_response(response).unwrap();
        assert_eq!(result.amount, 12.5);
        assert_eq!(result.category, "Groceries");
        assert_eq!(result.merchant, "Rewe");
    }

    #[test]
    fn test_parse_expense_with_code_fence() {
        let response = "```json\n{\"amount\": 5.0, \"category\": \"Other\", \"merchant\": \"dm-drogerie markt\", \"note\": \"\"}\n```";
        let result = parse_expense_response(response).unwrap();
        assert_eq!(result.amount, 5.0);
        assert_eq!(result.merchant, "dm-drogerie markt");
    }

    #[test]
    fn test_parse_expense_missing_fields_default() {
        let response = r#"{"amount": 3.0}"#;
        let result = parse_expense_response(response).unwrap();
        assert_eq!(result.category, "");
        assert_eq!(result.note, "");
    }

    #[test]
    fn test_parse_goal() {
        let response = r#"Here you go:
{"type": "Item", "goal": "New bike", "target_amount": 500, "target_date": "2025-06-01"}"#;
        let result = parse_goal_response(response).unwrap();
        assert_eq!(result.goal, "New bike");
        assert_eq!(result.target_amount, 500.0);
        assert_eq!(result.target_date.as_deref(), Some("2025-06-01"));
    }

    #[test]
    fn test_parse_goal_null_date() {
        let response = r#"{"type": "Task", "goal": "Learn Rust", "target_amount": 0, "target_date": null}"#;
        let result = parse_goal_response(response).unwrap();
        assert_eq!(result.target_date, None);
    }

    #[test]
    fn test_non_json_is_model_error() {
        let err = parse_expense_response("I could not understand that").unwrap_err();
        assert!(matches!(err, Error::Model(_)));
    }
}
