//! Goal creation, validation, and listing
//!
//! Goals live in their own table with a fixed positional schema (see
//! [`crate::models::GOAL_COLUMNS`]). Creation validates the model's
//! extraction; completion goes through the optimistic mutator.

use chrono::{NaiveDate, NaiveDateTime};
use sha2::{Digest, Sha256};

use crate::analytics::Button;
use crate::callback::CallbackIntent;
use crate::error::{Error, Result};
use crate::models::{
    ExtractedGoal, Goal, GoalStatus, GoalType, GOAL_COLUMNS, TIMESTAMP_FORMAT,
};

/// Column indexes into a Goals row (matching GOAL_COLUMNS)
pub const GOAL_TYPE_COL: usize = 1;
pub const GOAL_NAME_COL: usize = 2;
pub const GOAL_AMOUNT_COL: usize = 3;
pub const GOAL_TARGET_DATE_COL: usize = 4;
pub const GOAL_STATUS_COL: usize = 5;
pub const GOAL_CREATOR_COL: usize = 6;
pub const GOAL_ID_COL: usize = 7;
pub const GOAL_COMPLETED_COL: usize = 8;

/// Goal name column accessor tolerant of short rows
pub fn goal_name(row: &[String]) -> String {
    row.get(GOAL_NAME_COL).cloned().unwrap_or_default()
}

/// Derive the short opaque goal id from creation time and name
fn goal_id(created: &str, name: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(created.as_bytes());
    hasher.update(name.as_bytes());
    hex::encode(hasher.finalize())[..8].to_string()
}

/// Validate a model extraction into a goal ready to append.
///
/// - name: 3-100 chars after trim
/// - target amount: 0 <= amount <= ceiling
/// - target date: `YYYY-MM-DD`, strictly in the future, otherwise nulled out
pub fn new_goal(
    extracted: ExtractedGoal,
    creator: &str,
    now: NaiveDateTime,
    ceiling: f64,
) -> Result<Goal> {
    let name = extracted.goal.trim().to_string();
    if name.chars().count() < 3 || name.chars().count() > 100 {
        return Err(Error::Validation(
            "Goal name must be between 3 and 100 characters.".into(),
        ));
    }
    if extracted.target_amount < 0.0 {
        return Err(Error::Validation("Target amount cannot be negative.".into()));
    }
    if extracted.target_amount > ceiling {
        return Err(Error::Validation(format!(
            "Target amount €{:.2} exceeds the limit of €{:.2}.",
            extracted.target_amount, ceiling
        )));
    }

    let today = now.date();
    let target_date = extracted
        .target_date
        .as_deref()
        .and_then(|s| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok())
        .filter(|d| *d > today);

    let created = now.format(TIMESTAMP_FORMAT).to_string();
    let id = goal_id(&created, &name);

    Ok(Goal {
        id,
        created,
        goal_type: GoalType::coerce(&extracted.goal_type),
        name,
        target_amount: extracted.target_amount,
        target_date,
        status: GoalStatus::Pending,
        creator: creator.to_string(),
        completed: None,
        notes: String::new(),
    })
}

/// Parse one raw Goals row; rows without an id are skipped by callers
pub fn parse_goal_row(row: &[String]) -> Option<Goal> {
    let cell = |i: usize| row.get(i).map(String::as_str).unwrap_or("").trim().to_string();
    let id = cell(GOAL_ID_COL);
    if id.is_empty() {
        return None;
    }
    Some(Goal {
        id,
        created: cell(0),
        goal_type: GoalType::coerce(&cell(GOAL_TYPE_COL)),
        name: cell(GOAL_NAME_COL),
        target_amount: cell(GOAL_AMOUNT_COL).replace(',', ".").parse().unwrap_or(0.0),
        target_date: NaiveDate::parse_from_str(&cell(GOAL_TARGET_DATE_COL), "%Y-%m-%d").ok(),
        status: cell(GOAL_STATUS_COL)
            .parse()
            .unwrap_or(GoalStatus::Pending),
        creator: cell(GOAL_CREATOR_COL),
        completed: NaiveDate::parse_from_str(&cell(GOAL_COMPLETED_COL), "%Y-%m-%d").ok(),
        notes: cell(9),
    })
}

/// All goals still pending, in table order
pub fn pending_goals(rows: &[Vec<String>]) -> Vec<Goal> {
    rows.iter()
        .skip(1)
        .filter_map(|r| parse_goal_row(r))
        .filter(|g| g.status == GoalStatus::Pending)
        .collect()
}

/// Render the pending-goal list with one completion button per goal
pub fn render_goal_list(goals: &[Goal]) -> (String, Vec<Button>) {
    if goals.is_empty() {
        return ("🎯 No open goals. Add one with /newgoal.".into(), vec![]);
    }

    let mut text = String::from("🎯 *Open goals*\n\n");
    let mut buttons = Vec::with_capacity(goals.len());
    for goal in goals {
        text.push_str(&format!("• *{}* ({})", goal.name, goal.goal_type));
        if goal.target_amount > 0.0 {
            text.push_str(&format!(" — €{:.2}", goal.target_amount));
        }
        if let Some(date) = goal.target_date {
            text.push_str(&format!(" by {}", date));
        }
        text.push('\n');
        buttons.push(Button {
            label: format!("✅ {}", goal.name.chars().take(24).collect::<String>()),
            intent: CallbackIntent::CompleteGoal {
                id: goal.id.clone(),
            },
        });
    }
    text.push_str("\nTap to mark a goal done.");
    (text, buttons)
}

/// Operator instructions shown when the Goals table is missing: the exact
/// column schema, so the sheet can be fixed by hand
pub fn setup_instructions() -> String {
    format!(
        "⚠️ The Goals sheet is missing.\n\nCreate a tab named *Goals* with this header row:\n`{}`",
        GOAL_COLUMNS.join(" | ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extracted(name: &str, amount: f64, date: Option<&str>) -> ExtractedGoal {
        ExtractedGoal {
            goal_type: "Item".into(),
            goal: name.into(),
            target_amount: amount,
            target_date: date.map(String::from),
        }
    }

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, 20)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_new_goal_happy_path() {
        let goal = new_goal(extracted("New bike", 500.0, Some("2025-06-01")), "Alice", now(), 1_000_000.0)
            .unwrap();
        assert_eq!(goal.name, "New bike");
        assert_eq!(goal.goal_type, GoalType::Item);
        assert_eq!(goal.status, GoalStatus::Pending);
        assert_eq!(goal.id.len(), 8);
        assert_eq!(
            goal.target_date,
            NaiveDate::from_ymd_opt(2025, 6, 1)
        );
    }

    #[test]
    fn test_goal_name_length_bounds() {
        assert!(new_goal(extracted("ab", 0.0, None), "A", now(), 1e6).is_err());
        let long = "x".repeat(101);
        assert!(new_goal(extracted(&long, 0.0, None), "A", now(), 1e6).is_err());
        let max = "x".repeat(100);
        assert!(new_goal(extracted(&max, 0.0, None), "A", now(), 1e6).is_ok());
    }

    #[test]
    fn test_negative_or_excessive_amount_rejected() {
        assert!(new_goal(extracted("Trip", -1.0, None), "A", now(), 1e6).is_err());
        assert!(new_goal(extracted("Trip", 2e6, None), "A", now(), 1e6).is_err());
    }

    #[test]
    fn test_past_target_date_is_nulled_not_rejected() {
        let goal = new_goal(extracted("Trip", 100.0, Some("2024-01-01")), "A", now(), 1e6).unwrap();
        assert_eq!(goal.target_date, None);
        // Today itself is not "strictly in the future"
        let goal = new_goal(extracted("Trip", 100.0, Some("2025-01-20")), "A", now(), 1e6).unwrap();
        assert_eq!(goal.target_date, None);
    }

    #[test]
    fn test_goal_ids_differ_per_name() {
        let a = new_goal(extracted("Bike", 0.0, None), "A", now(), 1e6).unwrap();
        let b = new_goal(extracted("Boat", 0.0, None), "A", now(), 1e6).unwrap();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_round_trip_row() {
        let goal = new_goal(extracted("New bike", 500.0, Some("2025-06-01")), "Alice", now(), 1e6)
            .unwrap();
        let row = goal.to_row();
        assert_eq!(row.len(), GOAL_COLUMNS.len());
        let parsed = parse_goal_row(&row).unwrap();
        assert_eq!(parsed.id, goal.id);
        assert_eq!(parsed.name, "New bike");
        assert_eq!(parsed.status, GoalStatus::Pending);
    }

    #[test]
    fn test_pending_goals_filters_done() {
        let header: Vec<String> = GOAL_COLUMNS.iter().map(|s| s.to_string()).collect();
        let mut done = new_goal(extracted("Old goal", 0.0, None), "A", now(), 1e6).unwrap();
        done.status = GoalStatus::Done;
        let open = new_goal(extracted("Open goal", 0.0, None), "A", now(), 1e6).unwrap();
        let rows = vec![header, done.to_row(), open.to_row()];

        let pending = pending_goals(&rows);
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].name, "Open goal");
    }

    #[test]
    fn test_render_goal_list_buttons() {
        let goal = new_goal(extracted("New bike", 500.0, None), "Alice", now(), 1e6).unwrap();
        let (text, buttons) = render_goal_list(&[goal.clone()]);
        assert!(text.contains("New bike"));
        assert_eq!(buttons.len(), 1);
        assert_eq!(
            buttons[0].intent,
            CallbackIntent::CompleteGoal { id: goal.id }
        );
    }

    #[test]
    fn test_setup_instructions_name_all_columns() {
        let text = setup_instructions();
        for col in GOAL_COLUMNS {
            assert!(text.contains(col), "missing column {}", col);
        }
    }
}
