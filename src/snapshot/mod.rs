//! Candidate snapshot loading and boundary validation.
//!
//! A snapshot is the JSON array of candidate records exported by the
//! candidate store. Records are parsed into loose raw structs first, then
//! checked and converted into the typed models exactly once. Nothing past
//! this module re-validates.

use crate::models::{Amount, Candidate, FundRecord, Project, PromiseItem, PromiseStatus};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info, warn};

/// How promises with a status outside the known set are handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownStatusPolicy {
    /// Keep the promise, count it as unrecognized and warn.
    #[default]
    Count,
    /// Fail the whole snapshot.
    Reject,
}

/// Errors raised while validating a snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("Malformed snapshot: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Candidate at position {index} has no id")]
    MissingId { index: usize },

    #[error("Duplicate candidate id {0:?}")]
    DuplicateCandidateId(String),

    #[error("Candidate {candidate:?} has duplicate promise id {promise:?}")]
    DuplicatePromiseId { candidate: String, promise: String },

    #[error("Candidate {candidate:?}: {field} must be {expected}, got {value}")]
    InvalidValue {
        candidate: String,
        field: String,
        expected: &'static str,
        value: f64,
    },

    #[error("Candidate {candidate:?}: promise {promise:?} has unrecognized status {status:?}")]
    UnknownStatus {
        candidate: String,
        promise: String,
        status: String,
    },
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCandidate {
    #[serde(default)]
    id: Option<String>,
    #[serde(default, rename = "_id")]
    store_id: Option<serde_json::Value>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    party: Option<String>,
    #[serde(default)]
    constituency: Option<String>,
    #[serde(default)]
    ward: Option<String>,
    #[serde(default)]
    gender: Option<String>,
    #[serde(default)]
    age: Option<f64>,
    #[serde(default)]
    education: Option<String>,
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    criminal_cases: Option<f64>,
    #[serde(default)]
    assets: Option<String>,
    #[serde(default)]
    attendance: Option<f64>,
    #[serde(default)]
    bio: Option<String>,
    #[serde(default)]
    promises: Option<Vec<RawPromise>>,
    #[serde(default)]
    funds: Option<RawFunds>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPromise {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    completion_percentage: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawFunds {
    #[serde(default)]
    allocated: Option<f64>,
    #[serde(default)]
    utilized: Option<f64>,
    #[serde(default)]
    projects: Option<Vec<RawProject>>,
}

#[derive(Debug, Deserialize)]
struct RawProject {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    cost: Option<f64>,
    #[serde(default)]
    status: Option<String>,
}

/// Read and validate a snapshot file.
pub fn load(path: &Path, policy: UnknownStatusPolicy) -> Result<Vec<Candidate>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read snapshot: {}", path.display()))?;

    let candidates = parse(&content, policy)
        .with_context(|| format!("Invalid snapshot: {}", path.display()))?;

    info!(
        "Loaded {} candidates from {}",
        candidates.len(),
        path.display()
    );
    Ok(candidates)
}

/// Parse and validate a snapshot from JSON text.
pub fn parse(json: &str, policy: UnknownStatusPolicy) -> Result<Vec<Candidate>, SnapshotError> {
    let raw: Vec<RawCandidate> = serde_json::from_str(json)?;

    let mut seen = HashSet::new();
    let mut candidates = Vec::with_capacity(raw.len());

    for (index, record) in raw.into_iter().enumerate() {
        let candidate = validate_candidate(index, record, policy)?;

        if !seen.insert(candidate.id.clone()) {
            return Err(SnapshotError::DuplicateCandidateId(candidate.id));
        }

        debug!(
            "Validated candidate {} ({} promises)",
            candidate.id,
            candidate.promises.len()
        );
        candidates.push(candidate);
    }

    Ok(candidates)
}

fn validate_candidate(
    index: usize,
    raw: RawCandidate,
    policy: UnknownStatusPolicy,
) -> Result<Candidate, SnapshotError> {
    // Store exports may carry only the document `_id`.
    let id = raw
        .id
        .filter(|id| !id.is_empty())
        .or_else(|| {
            raw.store_id
                .as_ref()
                .and_then(|v| v.as_str())
                .map(str::to_string)
        })
        .ok_or(SnapshotError::MissingId { index })?;

    let field = Field { candidate: &id };

    let age = field.whole("age", raw.age, u32::MAX as f64)? as u32;
    let criminal_cases = field.whole("criminalCases", raw.criminal_cases, u32::MAX as f64)? as u32;
    let attendance = field.whole("attendance", raw.attendance, 100.0)? as u8;

    let mut promise_ids = HashSet::new();
    let mut promises = Vec::new();
    for (i, promise) in raw.promises.unwrap_or_default().into_iter().enumerate() {
        let promise = field.promise(i, promise, policy)?;

        if !promise.id.is_empty() && !promise_ids.insert(promise.id.clone()) {
            return Err(SnapshotError::DuplicatePromiseId {
                candidate: id.clone(),
                promise: promise.id,
            });
        }
        promises.push(promise);
    }

    let funds = match raw.funds {
        Some(funds) => field.funds(funds)?,
        None => FundRecord::default(),
    };

    Ok(Candidate {
        name: raw.name.unwrap_or_default(),
        party: raw.party.unwrap_or_default(),
        constituency: raw.constituency.unwrap_or_default(),
        ward: raw.ward.unwrap_or_default(),
        gender: raw.gender.unwrap_or_default(),
        age,
        education: raw.education.unwrap_or_default(),
        image: raw.image.unwrap_or_default(),
        criminal_cases,
        assets: raw.assets.unwrap_or_default(),
        attendance,
        bio: raw.bio.unwrap_or_default(),
        promises,
        funds,
        id,
    })
}

/// Field checks scoped to one candidate, for error messages.
struct Field<'a> {
    candidate: &'a str,
}

impl Field<'_> {
    fn invalid(&self, field: &str, expected: &'static str, value: f64) -> SnapshotError {
        SnapshotError::InvalidValue {
            candidate: self.candidate.to_string(),
            field: field.to_string(),
            expected,
            value,
        }
    }

    /// A whole number in `0..=max`; missing means 0.
    fn whole(&self, field: &str, value: Option<f64>, max: f64) -> Result<u64, SnapshotError> {
        let value = value.unwrap_or(0.0);

        if !value.is_finite() || value < 0.0 || value.fract() != 0.0 || value > max {
            return Err(self.invalid(field, "a whole number in range", value));
        }

        Ok(value as u64)
    }

    /// A non-negative amount in rupees; missing means 0.
    fn amount(&self, field: &str, value: Option<f64>) -> Result<Amount, SnapshotError> {
        let value = value.unwrap_or(0.0);

        Amount::from_decimal_rupees(value)
            .ok_or_else(|| self.invalid(field, "a non-negative amount", value))
    }

    fn promise(
        &self,
        index: usize,
        raw: RawPromise,
        policy: UnknownStatusPolicy,
    ) -> Result<PromiseItem, SnapshotError> {
        let id = raw.id.unwrap_or_default();
        let completion = self.whole(
            &format!("promises[{}].completionPercentage", index),
            raw.completion_percentage,
            100.0,
        )? as u8;

        let status = PromiseStatus::from(raw.status.as_deref().unwrap_or(""));
        if let PromiseStatus::Unrecognized(ref label) = status {
            match policy {
                UnknownStatusPolicy::Reject => {
                    return Err(SnapshotError::UnknownStatus {
                        candidate: self.candidate.to_string(),
                        promise: id,
                        status: label.clone(),
                    });
                }
                UnknownStatusPolicy::Count => {
                    warn!(
                        "Candidate {}: promise {:?} has unrecognized status {:?}",
                        self.candidate, id, label
                    );
                }
            }
        }

        Ok(PromiseItem {
            id,
            title: raw.title.unwrap_or_default(),
            description: raw.description.unwrap_or_default(),
            category: raw.category.unwrap_or_default(),
            status,
            completion_percentage: completion,
        })
    }

    fn funds(&self, raw: RawFunds) -> Result<FundRecord, SnapshotError> {
        let allocated = self.amount("funds.allocated", raw.allocated)?;
        let utilized = self.amount("funds.utilized", raw.utilized)?;

        let projects = raw
            .projects
            .unwrap_or_default()
            .into_iter()
            .enumerate()
            .map(|(i, p)| -> Result<Project, SnapshotError> {
                Ok(Project {
                    cost: self.amount(&format!("funds.projects[{}].cost", i), p.cost)?,
                    name: p.name.unwrap_or_default(),
                    status: p.status.unwrap_or_default(),
                })
            })
            .collect::<Result<Vec<_>, SnapshotError>>()?;

        Ok(FundRecord {
            allocated,
            utilized,
            projects,
        })
    }
}
