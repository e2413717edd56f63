//! Markdown and JSON report generation.
//!
//! The engine hands over raw paise amounts; this module owns all display
//! formatting (crore figures, percentages, table layout).

use crate::models::{
    Amount, CandidateScorecard, Comparison, ComparisonRow, DataWarning, Report, ReportMetadata,
    WardAggregate,
};
use anyhow::Result;

/// Rupees per crore.
const RUPEES_PER_CRORE: f64 = 10_000_000.0;

/// Format an amount in crores, e.g. `₹15.0Cr`.
pub fn format_crore(amount: Amount) -> String {
    format!("₹{:.1}Cr", amount.as_rupees_f64() / RUPEES_PER_CRORE)
}

/// Format an optional percentage, `n/a` when undefined.
pub fn format_percent(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.0}%", v),
        None => "n/a".to_string(),
    }
}

/// Escape a value for use inside a Markdown table cell.
fn cell(value: &str) -> String {
    if value.is_empty() {
        "-".to_string()
    } else {
        value.replace('|', "\\|").replace('\n', " ")
    }
}

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &Report) -> String {
    let mut output = String::new();

    output.push_str("# JanTrack Mumbai Report\n\n");

    output.push_str(&generate_metadata_section(&report.metadata));
    output.push_str(&generate_table_of_contents(report));
    output.push_str(&generate_ward_section(&report.wards));

    if let Some(ref scorecards) = report.scorecards {
        output.push_str(&generate_scorecard_section(scorecards));
    }

    if let Some(ref comparison) = report.comparison {
        output.push_str(&generate_comparison_section(comparison));
    }

    if let Some(ref warnings) = report.warnings {
        output.push_str(&generate_warnings_section(warnings));
    }

    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Snapshot:** `{}`\n", metadata.snapshot));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **Candidates:** {}\n", metadata.candidates));
    section.push_str(&format!("- **Wards:** {}\n", metadata.wards));
    section.push_str(&format!("- **Promises Tracked:** {}\n", metadata.promises));
    if let Some(ref filter) = metadata.directory_filter {
        section.push_str(&format!("- **Directory Filter:** {}\n", filter));
    }
    section.push_str(&format!(
        "- **Processing Time:** {:.3}s\n",
        metadata.duration_seconds
    ));
    section.push('\n');

    section
}

/// Generate the table of contents.
fn generate_table_of_contents(report: &Report) -> String {
    let mut toc = String::new();

    toc.push_str("## Table of Contents\n\n");
    toc.push_str("- [Metadata](#metadata)\n");
    toc.push_str("- [Ward Fund Summary](#ward-fund-summary)\n");

    if report.scorecards.is_some() {
        toc.push_str("- [Candidate Scorecards](#candidate-scorecards)\n");
    }

    if report.comparison.is_some() {
        toc.push_str("- [Comparison](#comparison)\n");
    }

    if report.warnings.is_some() {
        toc.push_str("- [Data Warnings](#data-warnings)\n");
    }

    toc.push('\n');

    toc
}

/// Generate the ward fund table.
fn generate_ward_section(wards: &[WardAggregate]) -> String {
    let mut section = String::new();

    section.push_str("## Ward Fund Summary\n\n");

    if wards.is_empty() {
        section.push_str("No candidates with a ward were found in the snapshot.\n\n");
        return section;
    }

    section.push_str("| Ward | Candidates | Allocated | Utilized | Utilization |\n");
    section.push_str("|:---|:---|---:|---:|:---:|\n");

    for ward in wards {
        let flag = if ward.over_budget { " ⚠️" } else { "" };
        section.push_str(&format!(
            "| {} | {} | {} | {} | {}{} |\n",
            cell(&ward.ward),
            cell(&ward.candidates.join(", ")),
            format_crore(ward.allocated),
            format_crore(ward.utilized),
            format_percent(ward.utilization_percent()),
            flag
        ));
    }
    section.push('\n');

    let allocated: Amount = wards.iter().map(|w| w.allocated).sum();
    let utilized: Amount = wards.iter().map(|w| w.utilized).sum();
    section.push_str(&format!(
        "**Total:** {} allocated, {} utilized.\n\n",
        format_crore(allocated),
        format_crore(utilized)
    ));

    section
}

/// Generate the candidate scorecard table.
fn generate_scorecard_section(scorecards: &[CandidateScorecard]) -> String {
    let mut section = String::new();

    section.push_str("## Candidate Scorecards\n\n");

    if scorecards.is_empty() {
        section.push_str("No candidates match the directory filter.\n\n");
        return section;
    }

    section.push_str(concat!(
        "| ID | Candidate | Party | Ward | Score ",
        "| ✅ Completed | 🔄 In Progress | ⏳ Not Started | ❌ Broken | Funds Utilized |\n",
    ));
    section.push_str("|:---|:---|:---|:---|:---:|:---:|:---:|:---:|:---:|:---:|\n");

    for card in scorecards {
        let unrecognized = if card.tally.unrecognized > 0 {
            format!(" (+{} unrecognized)", card.tally.unrecognized)
        } else {
            String::new()
        };

        section.push_str(&format!(
            "| {} | {} | {} | {} | **{}%** | {} | {} | {} | {}{} | {} |\n",
            cell(&card.id),
            cell(&card.name),
            cell(&card.party),
            cell(&card.ward),
            card.score,
            card.tally.completed,
            card.tally.in_progress,
            card.tally.not_started,
            card.tally.broken,
            unrecognized,
            format_percent(card.funds.utilization_percent),
        ));
    }
    section.push('\n');

    section
}

/// Generate the side-by-side comparison table.
///
/// Candidates are columns and attributes are rows.
fn generate_comparison_section(comparison: &Comparison) -> String {
    let mut section = String::new();

    section.push_str("## Comparison\n\n");
    section.push_str(&format!("### {}\n\n", comparison.title));

    if comparison.rows.is_empty() {
        section.push_str("No candidates found for comparison.\n\n");
        return section;
    }

    let rows = &comparison.rows;

    section.push_str("| |");
    for row in rows {
        section.push_str(&format!(" {} |", cell(&row.name)));
    }
    section.push('\n');

    section.push_str("|:---|");
    section.push_str(&":---:|".repeat(rows.len()));
    section.push('\n');

    let attributes: [(&str, fn(&ComparisonRow) -> String); 8] = [
        ("Party", |r| cell(&r.party)),
        ("Ward", |r| cell(&r.ward)),
        ("Criminal Cases", |r| r.criminal_cases.to_string()),
        ("Education", |r| cell(&r.education)),
        ("Net Assets", |r| cell(&r.assets)),
        ("Attendance", |r| format!("{}%", r.attendance)),
        ("Key Promises", |r| {
            let titles: Vec<String> = r
                .top_promises
                .iter()
                .map(|p| format!("{} ({})", cell(&p.title), cell(&p.category)))
                .collect();
            if titles.is_empty() {
                "-".to_string()
            } else {
                titles.join("<br>")
            }
        }),
        ("Manifesto Score", |r| format!("**{}%**", r.score)),
    ];

    for (label, render) in attributes {
        section.push_str(&format!("| **{}** |", label));
        for row in rows {
            section.push_str(&format!(" {} |", render(row)));
        }
        section.push('\n');
    }
    section.push('\n');

    section
}

/// Generate the data warnings section.
fn generate_warnings_section(warnings: &[DataWarning]) -> String {
    let mut section = String::new();

    section.push_str("## Data Warnings\n\n");

    if warnings.is_empty() {
        section.push_str("No data-integrity warnings. 🎉\n\n");
        return section;
    }

    for warning in warnings {
        let marker = if warning.is_overrun() { "💸" } else { "❓" };
        section.push_str(&format!("- {} {}\n", marker, warning));
    }
    section.push('\n');

    section
}

/// Generate the report footer.
fn generate_footer() -> String {
    let mut footer = String::new();

    footer.push_str("---\n\n");
    footer.push_str("*Report generated by JanTrack*\n");

    footer
}

/// Generate a JSON report.
pub fn generate_json_report(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FundBreakdown, PromiseHighlight, StatusTally, AMOUNT_UNIT};
    use chrono::Utc;

    fn create_test_metadata() -> ReportMetadata {
        ReportMetadata {
            snapshot: "fixtures/candidates.json".to_string(),
            generated_at: Utc::now(),
            candidates: 3,
            wards: 2,
            promises: 5,
            amount_unit: AMOUNT_UNIT.to_string(),
            directory_filter: None,
            duration_seconds: 0.002,
        }
    }

    fn create_test_row(id: &str, name: &str, score: u8) -> ComparisonRow {
        ComparisonRow {
            id: id.to_string(),
            name: name.to_string(),
            party: "Civic Front".to_string(),
            ward: "Ward 1".to_string(),
            constituency: "Mumbai South".to_string(),
            criminal_cases: 1,
            education: "B.E. Civil".to_string(),
            assets: "₹8.4 Cr".to_string(),
            attendance: 72,
            top_promises: vec![PromiseHighlight {
                title: "Water Supply".to_string(),
                category: "Utilities".to_string(),
            }],
            score,
        }
    }

    fn create_test_report() -> Report {
        Report {
            metadata: create_test_metadata(),
            wards: vec![WardAggregate {
                ward: "Ward 1".to_string(),
                allocated: Amount::from_rupees(200_000_000),
                utilized: Amount::from_rupees(140_000_000),
                candidates: vec!["Rahul Deshmukh".to_string(), "Vikram Rane".to_string()],
                over_budget: false,
            }],
            scorecards: Some(vec![CandidateScorecard {
                id: "1".to_string(),
                name: "Rahul Deshmukh".to_string(),
                party: "Civic Front".to_string(),
                ward: "Ward 1".to_string(),
                constituency: "Mumbai South".to_string(),
                score: 48,
                tally: StatusTally {
                    completed: 1,
                    in_progress: 1,
                    not_started: 1,
                    broken: 0,
                    unrecognized: 0,
                },
                funds: FundBreakdown {
                    allocated: Amount::from_rupees(150_000_000),
                    utilized: Amount::from_rupees(110_000_000),
                    remaining: Amount::from_rupees(40_000_000),
                    utilization_percent: Some(73.3),
                    over_budget: false,
                    project_count: 0,
                    project_cost: Amount::ZERO,
                },
            }]),
            comparison: Some(Comparison {
                title: "Compare Candidates: Ward 1".to_string(),
                rows: vec![
                    create_test_row("1", "Rahul Deshmukh", 48),
                    create_test_row("4", "Vikram Rane", 10),
                ],
            }),
            warnings: Some(vec![DataWarning::CandidateOverBudget {
                candidate_id: "3".to_string(),
                name: "Meera Kulkarni".to_string(),
                allocated: Amount::from_rupees(80_000_000),
                utilized: Amount::from_rupees(92_000_000),
            }]),
        }
    }

    #[test]
    fn test_format_crore() {
        assert_eq!(format_crore(Amount::from_rupees(150_000_000)), "₹15.0Cr");
        assert_eq!(format_crore(Amount::from_rupees(45_000_000)), "₹4.5Cr");
        assert_eq!(format_crore(Amount::ZERO), "₹0.0Cr");
    }

    #[test]
    fn test_format_percent() {
        assert_eq!(format_percent(Some(73.33)), "73%");
        assert_eq!(format_percent(None), "n/a");
    }

    #[test]
    fn test_cell_escapes_pipes() {
        assert_eq!(cell("A|B"), "A\\|B");
        assert_eq!(cell(""), "-");
    }

    #[test]
    fn test_generate_markdown_report() {
        let report = create_test_report();
        let markdown = generate_markdown_report(&report);

        assert!(markdown.contains("# JanTrack Mumbai Report"));
        assert!(markdown.contains("## Metadata"));
        assert!(markdown.contains("## Ward Fund Summary"));
        assert!(markdown.contains("## Candidate Scorecards"));
        assert!(markdown.contains("### Compare Candidates: Ward 1"));
        assert!(markdown.contains("## Data Warnings"));
        assert!(markdown
            .contains("| Ward 1 | Rahul Deshmukh, Vikram Rane | ₹20.0Cr | ₹14.0Cr | 70% |"));
        assert!(markdown.contains("Meera Kulkarni"));
    }

    #[test]
    fn test_optional_sections_are_omitted() {
        let mut report = create_test_report();
        report.scorecards = None;
        report.comparison = None;
        report.warnings = None;

        let markdown = generate_markdown_report(&report);
        assert!(!markdown.contains("## Candidate Scorecards"));
        assert!(!markdown.contains("## Comparison"));
        assert!(!markdown.contains("## Data Warnings"));
        assert!(!markdown.contains("(#comparison)"));
    }

    #[test]
    fn test_generate_comparison_section() {
        let report = create_test_report();
        let section = generate_comparison_section(report.comparison.as_ref().unwrap());

        assert!(section.contains("| | Rahul Deshmukh | Vikram Rane |"));
        assert!(section.contains("|:---|:---:|:---:|"));
        assert!(section.contains("| **Manifesto Score** | **48%** | **10%** |"));
        assert!(section.contains("Water Supply (Utilities)"));
    }

    #[test]
    fn test_empty_comparison() {
        let comparison = Comparison {
            title: "Compare Candidates: Ward 99".to_string(),
            rows: Vec::new(),
        };
        let section = generate_comparison_section(&comparison);
        assert!(section.contains("No candidates found for comparison."));
    }

    #[test]
    fn test_generate_metadata_section() {
        let mut metadata = create_test_metadata();
        metadata.directory_filter = Some("search \"rane\"".to_string());

        let section = generate_metadata_section(&metadata);
        assert!(section.contains("fixtures/candidates.json"));
        assert!(section.contains("**Candidates:** 3"));
        assert!(section.contains("Directory Filter:"));
    }

    #[test]
    fn test_generate_json_report() {
        let report = create_test_report();
        let json = generate_json_report(&report).unwrap();

        assert!(json.contains("\"wards\""));
        assert!(json.contains("\"scorecards\""));
        assert!(json.contains("\"kind\": \"candidate_over_budget\""));
        assert!(json.contains("\"allocated\": 20000000000"));
        assert!(json.contains("\"amount_unit\": \"paise\""));
    }
}
