//! Analytics and reporting over a normalized expense table
//!
//! Every view starts with the period filter, then aggregates in memory.
//! Records without a parseable date are included only when the period is
//! `All` (see the policy note in `crate::normalize`).
//!
//! Sorting by summed amount uses `Vec::sort_by`, which is stable: groups
//! with equal sums keep their first-appearance order in the table.

use chrono::{Datelike, NaiveDate};

use crate::callback::CallbackIntent;
use crate::normalize::{NormalizedTable, Record};

/// Maximum merchants shown in the merchant ranking
const TOP_MERCHANTS: usize = 10;

/// Maximum records shown in the history view
const HISTORY_LEN: usize = 10;

/// Drill-down button labels are truncated to this many characters; the
/// drill filter matches owners by prefix to compensate
pub const USER_LABEL_LEN: usize = 20;

/// Byte ceiling for the drill prefix. The callback token is capped at
/// 64 bytes and the "u:<period>:" framing takes 4, so a multibyte name
/// must also be cut on bytes, not just characters.
pub const USER_LABEL_BYTES: usize = 60;

/// Reporting period, evaluated against an injected "today"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    CurrentMonth,
    LastMonth,
    Year,
    All,
}

impl Period {
    pub fn code(&self) -> &'static str {
        match self {
            Self::CurrentMonth => "m",
            Self::LastMonth => "l",
            Self::Year => "y",
            Self::All => "a",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "m" => Some(Self::CurrentMonth),
            "l" => Some(Self::LastMonth),
            "y" => Some(Self::Year),
            "a" => Some(Self::All),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::CurrentMonth => "this month",
            Self::LastMonth => "last month",
            Self::Year => "this year",
            Self::All => "all time",
        }
    }

    /// Whether a record date falls inside the period
    fn contains(&self, date: NaiveDate, now: NaiveDate) -> bool {
        match self {
            Self::CurrentMonth => date.year() == now.year() && date.month() == now.month(),
            Self::LastMonth => {
                let (year, month) = if now.month() == 1 {
                    (now.year() - 1, 12)
                } else {
                    (now.year(), now.month() - 1)
                };
                date.year() == year && date.month() == month
            }
            Self::Year => date.year() == now.year(),
            Self::All => true,
        }
    }
}

/// View kinds reachable from the summary menu
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewKind {
    Overview,
    Category,
    User,
    Merchant,
    History,
}

impl ViewKind {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Overview => "o",
            Self::Category => "c",
            Self::User => "u",
            Self::Merchant => "m",
            Self::History => "h",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "o" => Some(Self::Overview),
            "c" => Some(Self::Category),
            "u" => Some(Self::User),
            "m" => Some(Self::Merchant),
            "h" => Some(Self::History),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Overview => "Overview",
            Self::Category => "Categories",
            Self::User => "Users",
            Self::Merchant => "Merchants",
            Self::History => "History",
        }
    }
}

/// One auxiliary button emitted alongside the rendered text
#[derive(Debug, Clone)]
pub struct Button {
    pub label: String,
    pub intent: CallbackIntent,
}

/// A rendered analytics view
#[derive(Debug, Clone)]
pub struct SummaryView {
    pub text: String,
    pub buttons: Vec<Button>,
}

impl SummaryView {
    fn text_only(text: String) -> Self {
        Self {
            text,
            buttons: vec![],
        }
    }
}

/// Apply the period filter. `All` keeps date-less records; every other
/// period requires a parsed date inside the window.
fn filter_period<'a>(table: &'a NormalizedTable, period: Period, now: NaiveDate) -> Vec<&'a Record> {
    table
        .records
        .iter()
        .filter(|r| match period {
            Period::All => true,
            _ => r.date.map(|d| period.contains(d.date(), now)).unwrap_or(false),
        })
        .collect()
}

/// Sum amounts grouped by a key, preserving first-appearance order, then
/// sort by sum descending (stable, so equal sums keep insertion order)
fn grouped_sums<'a, F>(records: &[&'a Record], key: F) -> Vec<(String, f64)>
where
    F: Fn(&Record) -> String,
{
    let mut order: Vec<String> = Vec::new();
    let mut sums: std::collections::HashMap<String, f64> = std::collections::HashMap::new();
    for record in records {
        let k = key(record);
        if !sums.contains_key(&k) {
            order.push(k.clone());
        }
        *sums.entry(k).or_insert(0.0) += record.amount;
    }
    let mut grouped: Vec<(String, f64)> = order
        .into_iter()
        .map(|k| {
            let sum = sums[&k];
            (k, sum)
        })
        .collect();
    grouped.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    grouped
}

fn percentage(amount: f64, total: f64) -> f64 {
    if total > 0.0 {
        amount / total * 100.0
    } else {
        0.0
    }
}

/// Truncate on a character cap and a byte ceiling, on char boundaries
fn truncate_label(s: &str, max_chars: usize, max_bytes: usize) -> String {
    let mut out = String::new();
    for c in s.chars().take(max_chars) {
        if out.len() + c.len_utf8() > max_bytes {
            break;
        }
        out.push(c);
    }
    out
}

fn category_of(record: &Record) -> String {
    let c = record.field("Category");
    if c.is_empty() {
        "Other".to_string()
    } else {
        c.to_string()
    }
}

fn owner_of(record: &Record) -> String {
    let u = record.field("User");
    if u.is_empty() {
        "Unknown".to_string()
    } else {
        u.to_string()
    }
}

fn merchant_of(record: &Record) -> String {
    let m = record.field("Merchant");
    if m.is_empty() {
        "Unknown".to_string()
    } else {
        m.to_string()
    }
}

/// Render one analytics view over the filtered table
pub fn summarize(
    table: &NormalizedTable,
    view: ViewKind,
    period: Period,
    now: NaiveDate,
) -> SummaryView {
    let records = filter_period(table, period, now);
    if records.is_empty() {
        return SummaryView::text_only(format!("📭 No data for {}.", period.label()));
    }

    match view {
        ViewKind::Overview => overview(&records, period),
        ViewKind::Category => by_category(&records, period),
        ViewKind::User => by_user(&records, period),
        ViewKind::Merchant => by_merchant(&records, period),
        ViewKind::History => history(&records, period),
    }
}

/// Drill-down: records whose owner starts with the (possibly truncated)
/// button label. Emits a single back button to the user view.
pub fn drill_user(
    table: &NormalizedTable,
    prefix: &str,
    period: Period,
    now: NaiveDate,
) -> SummaryView {
    let records: Vec<&Record> = filter_period(table, period, now)
        .into_iter()
        .filter(|r| owner_of(r).starts_with(prefix))
        .collect();

    let back = Button {
        label: "⬅️ Back".into(),
        intent: CallbackIntent::View {
            view: ViewKind::User,
            period,
        },
    };

    if records.is_empty() {
        return SummaryView {
            text: format!("📭 No data for {} ({}).", prefix, period.label()),
            buttons: vec![back],
        };
    }

    let total: f64 = records.iter().map(|r| r.amount).sum();
    let count = records.len();
    let mut text = format!(
        "👤 *{}* — {}\n\n💶 Total: €{:.2}\n🧾 Entries: {}\n⌀ Average: €{:.2}\n",
        prefix,
        period.label(),
        total,
        count,
        total / count as f64
    );

    text.push_str("\n*Categories*\n");
    for (category, sum) in grouped_sums(&records, category_of) {
        text.push_str(&format!(
            "• {} — €{:.2} ({:.1}%)\n",
            category,
            sum,
            percentage(sum, total)
        ));
    }

    SummaryView {
        text,
        buttons: vec![back],
    }
}

fn overview(records: &[&Record], period: Period) -> SummaryView {
    let total: f64 = records.iter().map(|r| r.amount).sum();
    let count = records.len();
    let average = total / count as f64;

    let mut text = format!(
        "📊 *Overview* — {}\n\n💶 Total: €{:.2}\n🧾 Entries: {}\n⌀ Average: €{:.2}\n",
        period.label(),
        total,
        count,
        average
    );

    text.push_str("\n*Top categories*\n");
    for (i, (category, sum)) in grouped_sums(records, category_of).iter().take(3).enumerate() {
        text.push_str(&format!(
            "{}. {} — €{:.2} ({:.1}%)\n",
            i + 1,
            category,
            sum,
            percentage(*sum, total)
        ));
    }

    SummaryView::text_only(text)
}

fn by_category(records: &[&Record], period: Period) -> SummaryView {
    let total: f64 = records.iter().map(|r| r.amount).sum();
    let mut text = format!("🗂 *Spending by category* — {}\n\n", period.label());
    for (category, sum) in grouped_sums(records, category_of) {
        text.push_str(&format!(
            "• {} — €{:.2} ({:.1}%)\n",
            category,
            sum,
            percentage(sum, total)
        ));
    }
    SummaryView::text_only(text)
}

fn by_user(records: &[&Record], period: Period) -> SummaryView {
    let total: f64 = records.iter().map(|r| r.amount).sum();
    let grouped = grouped_sums(records, owner_of);

    let mut text = format!("👥 *Spending by user* — {}\n\n", period.label());
    let mut buttons = Vec::with_capacity(grouped.len());
    for (owner, sum) in &grouped {
        text.push_str(&format!(
            "• {} — €{:.2} ({:.1}%)\n",
            owner,
            sum,
            percentage(*sum, total)
        ));
        let label = truncate_label(owner, USER_LABEL_LEN, USER_LABEL_BYTES);
        buttons.push(Button {
            intent: CallbackIntent::DrillUser {
                prefix: label.clone(),
                period,
            },
            label,
        });
    }
    text.push_str("\nTap a name for details.");

    SummaryView { text, buttons }
}

fn by_merchant(records: &[&Record], period: Period) -> SummaryView {
    let mut text = format!("🏪 *Top merchants* — {}\n\n", period.label());
    for (i, (merchant, sum)) in grouped_sums(records, merchant_of)
        .iter()
        .take(TOP_MERCHANTS)
        .enumerate()
    {
        text.push_str(&format!("{}. {} — €{:.2}\n", i + 1, merchant, sum));
    }
    SummaryView::text_only(text)
}

fn history(records: &[&Record], period: Period) -> SummaryView {
    // Date-less records sort last; among them insertion order is kept
    let mut ordered: Vec<&&Record> = records.iter().collect();
    ordered.sort_by(|a, b| b.date.cmp(&a.date));

    let mut text = format!("🕘 *Recent entries* — {}\n\n", period.label());
    for record in ordered.iter().take(HISTORY_LEN) {
        let date = record
            .date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "????-??-??".to_string());
        text.push_str(&format!(
            "• {} — €{:.2} {} ({})\n",
            date,
            record.amount,
            category_of(record),
            owner_of(record)
        ));
    }
    SummaryView::text_only(text)
}
