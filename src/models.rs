//! Data models for candidate snapshots and the reports derived from them.
//!
//! The record types (`Candidate`, `PromiseItem`, `FundRecord`) are the
//! validated form of what the candidate store hands out. Everything below
//! the "Derived views" marker is computed by the aggregation engine and is
//! never persisted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::iter::Sum;

/// Paise per rupee.
const PAISE_PER_RUPEE: u64 = 100;

/// Unit written next to serialized amounts in report metadata.
pub const AMOUNT_UNIT: &str = "paise";

/// An exact currency amount, stored as a whole number of paise.
///
/// Serializes as the bare paise count, so `"allocated": 800000` in a JSON
/// report means ₹8,000.00, not ₹8,00,000.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Amount(u64);

impl Amount {
    pub const ZERO: Amount = Amount(0);

    /// Creates an amount from a paise count.
    pub const fn from_paise(paise: u64) -> Self {
        Self(paise)
    }

    /// Creates an amount from whole rupees.
    pub const fn from_rupees(rupees: u64) -> Self {
        Self(rupees.saturating_mul(PAISE_PER_RUPEE))
    }

    /// Converts a decimal rupee value into paise, rounding to the nearest paisa.
    ///
    /// Returns `None` for negative, non-finite or unrepresentably large values.
    pub fn from_decimal_rupees(value: f64) -> Option<Self> {
        if !value.is_finite() || value < 0.0 {
            return None;
        }

        let paise = (value * PAISE_PER_RUPEE as f64).round();
        if paise > u64::MAX as f64 {
            return None;
        }

        Some(Self(paise as u64))
    }

    /// Returns the raw paise count.
    pub const fn paise(self) -> u64 {
        self.0
    }

    /// Returns the amount in rupees as a float, for display only.
    pub fn as_rupees_f64(self) -> f64 {
        self.0 as f64 / PAISE_PER_RUPEE as f64
    }

    pub fn saturating_add(self, other: Amount) -> Amount {
        Amount(self.0.saturating_add(other.0))
    }

    pub fn saturating_sub(self, other: Amount) -> Amount {
        Amount(self.0.saturating_sub(other.0))
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Amount>>(iter: I) -> Self {
        iter.fold(Amount::ZERO, Amount::saturating_add)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "₹{}.{:02}",
            self.0 / PAISE_PER_RUPEE,
            self.0 % PAISE_PER_RUPEE
        )
    }
}

/// Progress status of a manifesto promise.
///
/// Only built from store labels via `From<&str>`; serializes back to the label.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PromiseStatus {
    NotStarted,
    InProgress,
    Completed,
    Broken,
    /// A status label outside the four known values, kept verbatim.
    Unrecognized(String),
}

impl PromiseStatus {
    /// Returns the wire label for this status.
    pub fn as_str(&self) -> &str {
        match self {
            PromiseStatus::NotStarted => "not-started",
            PromiseStatus::InProgress => "in-progress",
            PromiseStatus::Completed => "completed",
            PromiseStatus::Broken => "broken",
            PromiseStatus::Unrecognized(s) => s,
        }
    }
}

impl From<&str> for PromiseStatus {
    fn from(s: &str) -> Self {
        match s {
            "not-started" => PromiseStatus::NotStarted,
            "in-progress" => PromiseStatus::InProgress,
            "completed" => PromiseStatus::Completed,
            "broken" => PromiseStatus::Broken,
            other => PromiseStatus::Unrecognized(other.to_string()),
        }
    }
}

impl Serialize for PromiseStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

// Record types are serialize-only: `snapshot::parse` is the one way to build
// them from store data, since it converts rupees to paise and checks ranges.

/// A single manifesto commitment.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PromiseItem {
    /// Identifier, unique within the owning candidate.
    pub id: String,
    pub title: String,
    pub description: String,
    /// Free-text category (e.g. "Infrastructure").
    pub category: String,
    pub status: PromiseStatus,
    /// Completion in percent (0-100), set independently of `status`.
    pub completion_percentage: u8,
}

/// A funded project in a candidate's constituency.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Project {
    pub name: String,
    pub cost: Amount,
    pub status: String,
}

/// Allocated and utilized funds for a candidate's constituency work.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FundRecord {
    pub allocated: Amount,
    /// Not guaranteed to be within `allocated`; overruns are reported, not rejected.
    pub utilized: Amount,
    pub projects: Vec<Project>,
}

/// A validated candidate record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    /// Externally assigned identifier, unique within a snapshot.
    pub id: String,
    pub name: String,
    pub party: String,
    pub constituency: String,
    /// Grouping key for ward views. Compared as an exact string.
    pub ward: String,
    pub gender: String,
    pub age: u32,
    pub education: String,
    pub image: String,
    pub criminal_cases: u32,
    /// Declared net assets, free text (e.g. "₹5.2 Cr").
    pub assets: String,
    /// Attendance in percent (0-100).
    pub attendance: u8,
    pub bio: String,
    pub promises: Vec<PromiseItem>,
    pub funds: FundRecord,
}

// ---------------------------------------------------------------------------
// Derived views
// ---------------------------------------------------------------------------

/// Promise counts per status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusTally {
    pub completed: usize,
    pub in_progress: usize,
    pub not_started: usize,
    pub broken: usize,
    /// Promises whose status is none of the four known values.
    pub unrecognized: usize,
}

impl StatusTally {
    /// Creates a tally from a list of promises.
    pub fn from_promises(promises: &[PromiseItem]) -> Self {
        let mut tally = Self::default();

        for promise in promises {
            match promise.status {
                PromiseStatus::Completed => tally.completed += 1,
                PromiseStatus::InProgress => tally.in_progress += 1,
                PromiseStatus::NotStarted => tally.not_started += 1,
                PromiseStatus::Broken => tally.broken += 1,
                PromiseStatus::Unrecognized(_) => tally.unrecognized += 1,
            }
        }

        tally
    }

    /// Total number of promises counted, including unrecognized ones.
    pub fn total(&self) -> usize {
        self.completed + self.in_progress + self.not_started + self.broken + self.unrecognized
    }
}

/// Funds summed over every candidate sharing a ward label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WardAggregate {
    pub ward: String,
    pub allocated: Amount,
    pub utilized: Amount,
    /// Candidate names in the order they appeared in the snapshot.
    pub candidates: Vec<String>,
    pub over_budget: bool,
}

impl WardAggregate {
    /// Utilized funds as a percentage of allocated, or `None` when nothing was allocated.
    pub fn utilization_percent(&self) -> Option<f64> {
        utilization_percent(self.allocated, self.utilized)
    }
}

/// Utilization figures for a single candidate's fund record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundBreakdown {
    pub allocated: Amount,
    pub utilized: Amount,
    /// Allocated minus utilized, floored at zero.
    pub remaining: Amount,
    pub utilization_percent: Option<f64>,
    pub over_budget: bool,
    pub project_count: usize,
    pub project_cost: Amount,
}

/// Profile and card view of one candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateScorecard {
    pub id: String,
    pub name: String,
    pub party: String,
    pub ward: String,
    pub constituency: String,
    pub score: u8,
    pub tally: StatusTally,
    pub funds: FundBreakdown,
}

/// Title and category of a promise, for quick scanning in comparisons.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromiseHighlight {
    pub title: String,
    pub category: String,
}

/// One column of a side-by-side candidate comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonRow {
    pub id: String,
    pub name: String,
    pub party: String,
    pub ward: String,
    pub constituency: String,
    pub criminal_cases: u32,
    pub education: String,
    pub assets: String,
    pub attendance: u8,
    pub top_promises: Vec<PromiseHighlight>,
    pub score: u8,
}

/// A data-integrity condition found in the snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DataWarning {
    /// A candidate utilized more than was allocated.
    CandidateOverBudget {
        candidate_id: String,
        name: String,
        allocated: Amount,
        utilized: Amount,
    },
    /// A ward's summed utilization exceeds its summed allocation.
    WardOverBudget {
        ward: String,
        allocated: Amount,
        utilized: Amount,
    },
    /// A promise carries a status outside the known set.
    UnrecognizedStatus {
        candidate_id: String,
        promise_id: String,
        status: String,
    },
}

impl DataWarning {
    /// Returns true for fund overrun warnings.
    pub fn is_overrun(&self) -> bool {
        matches!(
            self,
            DataWarning::CandidateOverBudget { .. } | DataWarning::WardOverBudget { .. }
        )
    }
}

impl fmt::Display for DataWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataWarning::CandidateOverBudget {
                candidate_id,
                name,
                allocated,
                utilized,
            } => write!(
                f,
                "Candidate {} ({}) utilized {} of {} allocated",
                name, candidate_id, utilized, allocated
            ),
            DataWarning::WardOverBudget {
                ward,
                allocated,
                utilized,
            } => write!(
                f,
                "Ward {} utilized {} of {} allocated",
                ward, utilized, allocated
            ),
            DataWarning::UnrecognizedStatus {
                candidate_id,
                promise_id,
                status,
            } => write!(
                f,
                "Promise {} of candidate {} has unrecognized status {:?}",
                promise_id, candidate_id, status
            ),
        }
    }
}

/// Utilization of `allocated` by `utilized`, in percent.
pub fn utilization_percent(allocated: Amount, utilized: Amount) -> Option<f64> {
    if allocated.is_zero() {
        None
    } else {
        Some(utilized.paise() as f64 / allocated.paise() as f64 * 100.0)
    }
}

/// A candidate comparison, titled by what was selected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    pub title: String,
    pub rows: Vec<ComparisonRow>,
}

/// Metadata about a generated report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Path of the snapshot the report was built from.
    pub snapshot: String,
    pub generated_at: DateTime<Utc>,
    pub candidates: usize,
    pub wards: usize,
    pub promises: usize,
    /// Unit of every amount field in the report, always [`AMOUNT_UNIT`].
    pub amount_unit: String,
    /// Directory search applied to the scorecards, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directory_filter: Option<String>,
    pub duration_seconds: f64,
}

/// The complete snapshot report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub metadata: ReportMetadata,
    pub wards: Vec<WardAggregate>,
    /// Scorecards matching the directory filter; `None` when left out.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scorecards: Option<Vec<CandidateScorecard>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comparison: Option<Comparison>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warnings: Option<Vec<DataWarning>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn promise(id: &str, status: PromiseStatus) -> PromiseItem {
        PromiseItem {
            id: id.to_string(),
            title: format!("Promise {}", id),
            description: String::new(),
            category: "Infrastructure".to_string(),
            status,
            completion_percentage: 0,
        }
    }

    #[test]
    fn test_status_from_str() {
        assert_eq!(PromiseStatus::from("completed"), PromiseStatus::Completed);
        assert_eq!(PromiseStatus::from("in-progress"), PromiseStatus::InProgress);
        assert_eq!(PromiseStatus::from("not-started"), PromiseStatus::NotStarted);
        assert_eq!(PromiseStatus::from("broken"), PromiseStatus::Broken);
        assert_eq!(
            PromiseStatus::from("Completed"),
            PromiseStatus::Unrecognized("Completed".to_string())
        );
        assert_eq!(PromiseStatus::from("stalled").as_str(), "stalled");
    }

    #[test]
    fn test_status_serializes_as_store_label() {
        let known = serde_json::to_value(promise("1", PromiseStatus::InProgress)).unwrap();
        assert_eq!(known["status"], "in-progress");
        assert_eq!(known["completionPercentage"], 0);

        let unknown = PromiseStatus::Unrecognized("stalled".to_string());
        assert_eq!(serde_json::to_string(&unknown).unwrap(), "\"stalled\"");
    }

    #[test]
    fn test_amount_from_decimal_rupees() {
        assert_eq!(
            Amount::from_decimal_rupees(150000000.0),
            Some(Amount::from_rupees(150_000_000))
        );
        assert_eq!(Amount::from_decimal_rupees(2.125), Some(Amount::from_paise(213)));
        assert_eq!(Amount::from_decimal_rupees(-1.0), None);
        assert_eq!(Amount::from_decimal_rupees(f64::NAN), None);
    }

    #[test]
    fn test_amount_sum_and_display() {
        let total: Amount = [Amount::from_paise(150), Amount::from_rupees(2)]
            .into_iter()
            .sum();
        assert_eq!(total.paise(), 350);
        assert_eq!(total.to_string(), "₹3.50");

        let capped = Amount::from_paise(u64::MAX).saturating_add(Amount::from_paise(1));
        assert_eq!(capped.paise(), u64::MAX);
    }

    #[test]
    fn test_status_tally_counts_every_promise() {
        let promises = vec![
            promise("1", PromiseStatus::Completed),
            promise("2", PromiseStatus::Completed),
            promise("3", PromiseStatus::InProgress),
            promise("4", PromiseStatus::Broken),
            promise("5", PromiseStatus::Unrecognized("paused".to_string())),
        ];

        let tally = StatusTally::from_promises(&promises);
        assert_eq!(tally.completed, 2);
        assert_eq!(tally.in_progress, 1);
        assert_eq!(tally.not_started, 0);
        assert_eq!(tally.broken, 1);
        assert_eq!(tally.unrecognized, 1);
        assert_eq!(tally.total(), promises.len());
    }

    #[test]
    fn test_utilization_percent() {
        assert_eq!(
            utilization_percent(Amount::from_rupees(200), Amount::from_rupees(50)),
            Some(25.0)
        );
        assert_eq!(utilization_percent(Amount::ZERO, Amount::from_rupees(5)), None);
    }

    #[test]
    fn test_warning_display() {
        let warning = DataWarning::WardOverBudget {
            ward: "Ward 5".to_string(),
            allocated: Amount::from_rupees(100),
            utilized: Amount::from_rupees(120),
        };
        assert!(warning.is_overrun());
        assert_eq!(
            warning.to_string(),
            "Ward Ward 5 utilized ₹120.00 of ₹100.00 allocated"
        );
    }
}
