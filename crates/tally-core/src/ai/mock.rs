//! Mock model backend for testing
//!
//! Deterministic extractions so handler tests don't need a live model:
//! the leading number becomes the amount, the remainder the merchant or
//! goal name. Input containing "unreadable" simulates a model failure.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::{Error, Result};
use crate::models::{ExtractedExpense, ExtractedGoal};

use super::ModelBackend;

#[derive(Clone, Default)]
pub struct MockBackend;

impl MockBackend {
    pub fn new() -> Self {
        Self
    }
}

/// Split "45 Rewe" into (45.0, "Rewe"); the amount is 0 when no leading
/// number is present
fn split_amount(text: &str) -> (f64, String) {
    let mut parts = text.trim().splitn(2, char::is_whitespace);
    let first = parts.next().unwrap_or("");
    let rest = parts.next().unwrap_or("").trim().to_string();
    match first.replace(',', ".").parse::<f64>() {
        Ok(amount) => (amount, rest),
        Err(_) => (0.0, text.trim().to_string()),
    }
}

#[async_trait]
impl ModelBackend for MockBackend {
    async fn extract_expense(
        &self,
        text: Option<&str>,
        image: Option<&[u8]>,
        _today: NaiveDate,
    ) -> Result<ExtractedExpense> {
        if let Some(t) = text {
            if t.contains("unreadable") {
                return Err(Error::Model("mock: cannot read input".into()));
            }
            let (amount, merchant) = split_amount(t);
            let category = if merchant.to_lowercase().contains("rewe") {
                "Groceries"
            } else {
                "Other"
            };
            return Ok(ExtractedExpense {
                amount,
                category: category.into(),
                merchant,
                note: String::new(),
            });
        }
        if image.is_some() {
            // Canned receipt
            return Ok(ExtractedExpense {
                amount: 23.45,
                category: "Groceries".into(),
                merchant: "Rewe".into(),
                note: "receipt".into(),
            });
        }
        Err(Error::Model("mock: nothing to extract from".into()))
    }

    async fn extract_goal(&self, text: &str, _today: NaiveDate) -> Result<ExtractedGoal> {
        if text.contains("unreadable") {
            return Err(Error::Model("mock: cannot read input".into()));
        }
        let (amount, name) = split_amount(text);
        Ok(ExtractedGoal {
            goal_type: "Other".into(),
            goal: if name.is_empty() { text.trim().into() } else { name },
            target_amount: amount,
            target_date: None,
        })
    }

    fn model(&self) -> &str {
        "mock"
    }
}
