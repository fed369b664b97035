//! Domain models for tally

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Timestamp format used for the first cell of every appended row.
/// The same string doubles as the optimistic-concurrency fingerprint.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Expense table name in the backing spreadsheet
pub const EXPENSES_TABLE: &str = "Expenses";

/// Goals table name in the backing spreadsheet
pub const GOALS_TABLE: &str = "Goals";

/// Column order for the Expenses table. Appends are positional.
pub const EXPENSE_COLUMNS: [&str; 6] =
    ["Timestamp", "Amount", "Category", "Merchant", "Note", "User"];

/// Column order for the Goals table. Appends are positional.
pub const GOAL_COLUMNS: [&str; 10] = [
    "Created_Date",
    "Type",
    "Goal_Name",
    "Target_Amount",
    "Target_Date",
    "Status",
    "Created_By",
    "Goal_ID",
    "Completed_Date",
    "Notes",
];

/// Expense categories (closed set). Anything the model invents outside
/// this set is coerced to `Other`, never rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    Groceries,
    #[serde(rename = "Food Takeout")]
    FoodTakeout,
    Travel,
    Subscription,
    Investment,
    Household,
    Transport,
    Other,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Groceries => "Groceries",
            Self::FoodTakeout => "Food Takeout",
            Self::Travel => "Travel",
            Self::Subscription => "Subscription",
            Self::Investment => "Investment",
            Self::Household => "Household",
            Self::Transport => "Transport",
            Self::Other => "Other",
        }
    }

    /// Coerce a free-text category from the model into the closed set.
    pub fn coerce(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "groceries" => Self::Groceries,
            "food takeout" | "takeout" | "food" => Self::FoodTakeout,
            "travel" => Self::Travel,
            "subscription" | "subscriptions" => Self::Subscription,
            "investment" | "investments" => Self::Investment,
            "household" => Self::Household,
            "transport" | "transportation" => Self::Transport,
            _ => Self::Other,
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A validated expense ready to append to the Expenses table
#[derive(Debug, Clone, Serialize)]
pub struct Expense {
    pub timestamp: NaiveDateTime,
    /// Non-negative, EUR
    pub amount: f64,
    pub category: Category,
    pub merchant: String,
    pub note: String,
    /// Display name of the user who created the record
    pub owner: String,
}

impl Expense {
    /// Positional row values matching [`EXPENSE_COLUMNS`]
    pub fn to_row(&self) -> Vec<String> {
        vec![
            self.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            format!("{:.2}", self.amount),
            self.category.to_string(),
            self.merchant.clone(),
            self.note.clone(),
            self.owner.clone(),
        ]
    }
}

/// Raw expense extraction from the model, before validation
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractedExpense {
    #[serde(default)]
    pub amount: f64,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub merchant: String,
    #[serde(default)]
    pub note: String,
}

impl ExtractedExpense {
    /// Validate and coerce into an [`Expense`].
    ///
    /// The amount must be strictly positive and at most `ceiling`; the
    /// category is silently coerced to the closed set; merchant falls back
    /// to "Unknown".
    pub fn validate(
        self,
        owner: &str,
        now: NaiveDateTime,
        ceiling: f64,
    ) -> crate::error::Result<Expense> {
        if self.amount <= 0.0 {
            return Err(crate::error::Error::Validation(
                "Amount must be greater than 0.".into(),
            ));
        }
        if self.amount > ceiling {
            return Err(crate::error::Error::Validation(format!(
                "Amount €{:.2} exceeds the limit of €{:.2}.",
                self.amount, ceiling
            )));
        }
        let merchant = if self.merchant.trim().is_empty() {
            "Unknown".to_string()
        } else {
            self.merchant.trim().to_string()
        };
        Ok(Expense {
            timestamp: now,
            amount: self.amount,
            category: Category::coerce(&self.category),
            merchant,
            note: self.note.trim().to_string(),
            owner: owner.to_string(),
        })
    }
}

/// Goal types (closed set, unknown coerces to Other)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GoalType {
    Financial,
    Vacation,
    Item,
    Activity,
    Skill,
    Task,
    Other,
}

impl GoalType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Financial => "Financial",
            Self::Vacation => "Vacation",
            Self::Item => "Item",
            Self::Activity => "Activity",
            Self::Skill => "Skill",
            Self::Task => "Task",
            Self::Other => "Other",
        }
    }

    pub fn coerce(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "financial" => Self::Financial,
            "vacation" => Self::Vacation,
            "item" => Self::Item,
            "activity" => Self::Activity,
            "skill" => Self::Skill,
            "task" => Self::Task,
            _ => Self::Other,
        }
    }
}

impl std::fmt::Display for GoalType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Goal status. The only transition is Pending -> Done, one-way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GoalStatus {
    Pending,
    Done,
}

impl GoalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Done => "Done",
        }
    }
}

impl std::str::FromStr for GoalStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "done" => Ok(Self::Done),
            _ => Err(format!("Unknown goal status: {}", s)),
        }
    }
}

impl std::fmt::Display for GoalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A goal row from the Goals table
#[derive(Debug, Clone, Serialize)]
pub struct Goal {
    /// Short opaque token, unique per goal
    pub id: String,
    pub created: String,
    pub goal_type: GoalType,
    pub name: String,
    pub target_amount: f64,
    pub target_date: Option<NaiveDate>,
    pub status: GoalStatus,
    pub creator: String,
    pub completed: Option<NaiveDate>,
    pub notes: String,
}

impl Goal {
    /// Positional row values matching [`GOAL_COLUMNS`]
    pub fn to_row(&self) -> Vec<String> {
        vec![
            self.created.clone(),
            self.goal_type.to_string(),
            self.name.clone(),
            format!("{:.2}", self.target_amount),
            self.target_date
                .map(|d| d.to_string())
                .unwrap_or_default(),
            self.status.to_string(),
            self.creator.clone(),
            self.id.clone(),
            self.completed.map(|d| d.to_string()).unwrap_or_default(),
            self.notes.clone(),
        ]
    }
}

/// Raw goal extraction from the model, before validation
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractedGoal {
    #[serde(default, rename = "type")]
    pub goal_type: String,
    #[serde(default)]
    pub goal: String,
    #[serde(default)]
    pub target_amount: f64,
    #[serde(default)]
    pub target_date: Option<String>,
}
