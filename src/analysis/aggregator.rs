//! Promise and fund aggregation.
//!
//! Every view of a candidate (card, profile, ward dashboard, comparison
//! table) derives its numbers from the functions in this module. They are
//! pure: each takes a borrowed snapshot and returns fresh values.

use super::ordering::{leading_number, natural_cmp};
use crate::models::{
    utilization_percent, Candidate, CandidateScorecard, Comparison, ComparisonRow, DataWarning,
    FundBreakdown, PromiseHighlight, PromiseStatus, StatusTally, WardAggregate,
};
use std::collections::HashMap;
use std::collections::HashSet;

/// Number of promises shown per candidate in a comparison.
pub const DEFAULT_TOP_PROMISES: usize = 2;

/// Compute a candidate's promise-completion score (0-100).
///
/// The score is the mean of every promise's `completion_percentage`,
/// rounded half up. A candidate without promises scores 0.
pub fn completion_score(candidate: &Candidate) -> u8 {
    let count = candidate.promises.len() as u64;
    if count == 0 {
        return 0;
    }

    let sum: u64 = candidate
        .promises
        .iter()
        .map(|p| u64::from(p.completion_percentage))
        .sum();

    // floor(sum / count + 1/2)
    ((2 * sum + count) / (2 * count)) as u8
}

/// Count a candidate's promises per status.
pub fn status_tally(candidate: &Candidate) -> StatusTally {
    StatusTally::from_promises(&candidate.promises)
}

/// Sum funds per ward.
///
/// Candidates are grouped by exact `ward` string; candidates with an empty
/// ward are left out. Wards come back in natural label order, ties in
/// first-seen order.
pub fn aggregate_by_ward(candidates: &[Candidate]) -> Vec<WardAggregate> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut wards: Vec<WardAggregate> = Vec::new();

    for candidate in candidates {
        if candidate.ward.is_empty() {
            continue;
        }

        let slot = *index.entry(candidate.ward.as_str()).or_insert_with(|| {
            wards.push(WardAggregate {
                ward: candidate.ward.clone(),
                allocated: Default::default(),
                utilized: Default::default(),
                candidates: Vec::new(),
                over_budget: false,
            });
            wards.len() - 1
        });

        let ward = &mut wards[slot];
        ward.allocated = ward.allocated.saturating_add(candidate.funds.allocated);
        ward.utilized = ward.utilized.saturating_add(candidate.funds.utilized);
        ward.candidates.push(candidate.name.clone());
    }

    for ward in &mut wards {
        ward.over_budget = ward.utilized > ward.allocated;
    }

    wards.sort_by(|a, b| natural_cmp(&a.ward, &b.ward));
    wards
}

/// Compute utilization figures for one candidate.
pub fn fund_breakdown(candidate: &Candidate) -> FundBreakdown {
    let funds = &candidate.funds;

    FundBreakdown {
        allocated: funds.allocated,
        utilized: funds.utilized,
        remaining: funds.allocated.saturating_sub(funds.utilized),
        utilization_percent: utilization_percent(funds.allocated, funds.utilized),
        over_budget: funds.utilized > funds.allocated,
        project_count: funds.projects.len(),
        project_cost: funds.projects.iter().map(|p| p.cost).sum(),
    }
}

/// Build the profile/card view of a candidate.
pub fn scorecard(candidate: &Candidate) -> CandidateScorecard {
    CandidateScorecard {
        id: candidate.id.clone(),
        name: candidate.name.clone(),
        party: candidate.party.clone(),
        ward: candidate.ward.clone(),
        constituency: candidate.constituency.clone(),
        score: completion_score(candidate),
        tally: status_tally(candidate),
        funds: fund_breakdown(candidate),
    }
}

/// Which candidates a comparison covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComparisonSelector {
    /// Every candidate whose ward equals the given label.
    Ward(String),
    /// The candidate with this id together with its ward-mates.
    Candidate(String),
    /// The whole snapshot.
    All,
}

/// Ordering of comparison rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RowOrder {
    /// Keep snapshot order.
    #[default]
    Input,
    /// Natural ward order, snapshot order within a ward.
    WardNatural,
}

/// Options for [`build_comparison_rows`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComparisonOptions {
    pub top_promises: usize,
    pub order: RowOrder,
}

impl Default for ComparisonOptions {
    fn default() -> Self {
        Self {
            top_promises: DEFAULT_TOP_PROMISES,
            order: RowOrder::Input,
        }
    }
}

fn select<'a>(candidates: &'a [Candidate], selector: &ComparisonSelector) -> Vec<&'a Candidate> {
    match selector {
        ComparisonSelector::Ward(ward) if ward.is_empty() => Vec::new(),
        ComparisonSelector::Ward(ward) => candidates.iter().filter(|c| &c.ward == ward).collect(),
        ComparisonSelector::Candidate(id) => match candidates.iter().find(|c| &c.id == id) {
            None => Vec::new(),
            Some(anchor) if anchor.ward.is_empty() => vec![anchor],
            Some(anchor) => candidates
                .iter()
                .filter(|c| c.ward == anchor.ward)
                .collect(),
        },
        ComparisonSelector::All => candidates.iter().collect(),
    }
}

fn comparison_row(candidate: &Candidate, top_promises: usize) -> ComparisonRow {
    ComparisonRow {
        id: candidate.id.clone(),
        name: candidate.name.clone(),
        party: candidate.party.clone(),
        ward: candidate.ward.clone(),
        constituency: candidate.constituency.clone(),
        criminal_cases: candidate.criminal_cases,
        education: candidate.education.clone(),
        assets: candidate.assets.clone(),
        attendance: candidate.attendance,
        top_promises: candidate
            .promises
            .iter()
            .take(top_promises)
            .map(|p| PromiseHighlight {
                title: p.title.clone(),
                category: p.category.clone(),
            })
            .collect(),
        score: completion_score(candidate),
    }
}

/// Build side-by-side comparison rows for the selected candidates.
pub fn build_comparison_rows(
    candidates: &[Candidate],
    selector: &ComparisonSelector,
    options: &ComparisonOptions,
) -> Vec<ComparisonRow> {
    let mut selected = select(candidates, selector);

    if options.order == RowOrder::WardNatural {
        selected.sort_by(|a, b| natural_cmp(&a.ward, &b.ward));
    }

    selected
        .into_iter()
        .map(|c| comparison_row(c, options.top_promises))
        .collect()
}

/// Build a titled comparison for the selected candidates.
pub fn build_comparison(
    candidates: &[Candidate],
    selector: &ComparisonSelector,
    options: &ComparisonOptions,
) -> Comparison {
    let rows = build_comparison_rows(candidates, selector, options);

    let title = match selector {
        ComparisonSelector::Ward(ward) => format!("Compare Candidates: {}", ward),
        ComparisonSelector::Candidate(_) if rows.len() > 1 => {
            format!("Compare Candidates: {}", rows[0].ward)
        }
        ComparisonSelector::Candidate(id) => match rows.first() {
            Some(row) => format!("Candidate Details: {}", row.name),
            None => format!("Candidate Details: {}", id),
        },
        ComparisonSelector::All => "Compare Candidates: All Wards".to_string(),
    };

    Comparison { title, rows }
}

/// Directory filter over the snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryQuery {
    /// Case-insensitive substring matched against name and constituency.
    pub search: Option<String>,
    /// Exact ward label.
    pub ward: Option<String>,
}

impl DirectoryQuery {
    fn matches(&self, candidate: &Candidate) -> bool {
        let matches_search = match self.search.as_deref() {
            None | Some("") => true,
            Some(term) => {
                let term = term.to_lowercase();
                candidate.name.to_lowercase().contains(&term)
                    || candidate.constituency.to_lowercase().contains(&term)
            }
        };

        let matches_ward = self
            .ward
            .as_deref()
            .map_or(true, |ward| candidate.ward == ward);

        matches_search && matches_ward
    }
}

/// List candidates matching a directory query, ordered by numeric id.
pub fn filter_directory<'a>(
    candidates: &'a [Candidate],
    query: &DirectoryQuery,
) -> Vec<&'a Candidate> {
    let mut listed: Vec<&Candidate> = candidates.iter().filter(|c| query.matches(c)).collect();
    listed.sort_by_key(|c| leading_number(&c.id));
    listed
}

/// Distinct non-empty ward labels in natural order.
pub fn unique_wards(candidates: &[Candidate]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut wards: Vec<String> = candidates
        .iter()
        .filter(|c| !c.ward.is_empty())
        .filter(|c| seen.insert(c.ward.as_str()))
        .map(|c| c.ward.clone())
        .collect();

    wards.sort_by(|a, b| natural_cmp(a, b));
    wards
}

/// Collect data-integrity warnings for a snapshot and its ward aggregates.
pub fn collect_warnings(candidates: &[Candidate], wards: &[WardAggregate]) -> Vec<DataWarning> {
    let mut warnings = Vec::new();

    for candidate in candidates {
        if candidate.funds.utilized > candidate.funds.allocated {
            warnings.push(DataWarning::CandidateOverBudget {
                candidate_id: candidate.id.clone(),
                name: candidate.name.clone(),
                allocated: candidate.funds.allocated,
                utilized: candidate.funds.utilized,
            });
        }
    }

    for ward in wards.iter().filter(|w| w.over_budget) {
        warnings.push(DataWarning::WardOverBudget {
            ward: ward.ward.clone(),
            allocated: ward.allocated,
            utilized: ward.utilized,
        });
    }

    for candidate in candidates {
        for promise in &candidate.promises {
            if let PromiseStatus::Unrecognized(ref status) = promise.status {
                warnings.push(DataWarning::UnrecognizedStatus {
                    candidate_id: candidate.id.clone(),
                    promise_id: promise.id.clone(),
                    status: status.clone(),
                });
            }
        }
    }

    warnings
}
