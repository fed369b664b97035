//! Prompt builders for the extraction model
//!
//! The current date is embedded so relative wording ("yesterday", "by next
//! summer") resolves correctly.

use chrono::NaiveDate;

/// System prompt for expense extraction (text or receipt image)
pub fn expense_prompt(today: NaiveDate) -> String {
    format!(
        r#"Current Date: {today}
Categories: Groceries, Food Takeout, Travel, Subscription, Investment, Household, Transport, Other.
Task: Parse the input (text or receipt image) into JSON: {{"amount": float, "category": str, "merchant": str, "note": str}}.

CRITICAL RULES:
1. "DM" or "dm" means the shop "dm-drogerie markt". DO NOT treat it as Deutsche Mark currency.
2. Always output the amount in EUR.
3. If no currency is specified, assume EUR.
4. If the category is ambiguous, use "Other".
5. Output JSON only."#
    )
}

/// Extra instruction appended for receipt photos
pub const RECEIPT_SUFFIX: &str = "\nAnalyze this receipt.";

/// System prompt for goal extraction
pub fn goal_prompt(today: NaiveDate) -> String {
    format!(
        r#"Current Date: {today}
Goal types: Financial, Vacation, Item, Activity, Skill, Task, Other.
Task: Parse the input into JSON: {{"type": str, "goal": str, "target_amount": float, "target_date": "YYYY-MM-DD" or null}}.

RULES:
1. "goal" is a short name for the goal (3-100 characters).
2. "target_amount" is 0 if no amount is mentioned. Amounts are EUR.
3. "target_date" resolves relative dates against the current date; null if none is mentioned.
4. If the type is ambiguous, use "Other".
5. Output JSON only."#
    )
}
