use crate::error::Result;
use crate::types::{CrashGroup, VersionData};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use tracing::{info, warn};

/// Issues plus the version tree, as supplied by the data source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    pub issues: Vec<CrashGroup>,
    #[serde(default)]
    pub versions: Vec<VersionData>,
}

/// A non-fatal inconsistency found in loaded data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Finding {
    DuplicateIssueId(String),
    TotalEventsMismatch {
        issue: String,
        recorded: u64,
        expected: u64,
    },
    SeenVersionMismatch {
        issue: String,
        recorded: (String, String),
        observed: (String, String),
    },
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Finding::DuplicateIssueId(id) => write!(f, "duplicate issue id {}", id),
            Finding::TotalEventsMismatch {
                issue,
                recorded,
                expected,
            } => write!(
                f,
                "issue {}: totalEvents is {} but variants sum to {}",
                issue, recorded, expected
            ),
            Finding::SeenVersionMismatch {
                issue,
                recorded,
                observed,
            } => write!(
                f,
                "issue {}: seen versions {}..{} but events span {}..{}",
                issue, recorded.0, recorded.1, observed.0, observed.1
            ),
        }
    }
}

impl Dataset {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let dataset: Dataset = serde_json::from_str(json)?;
        dataset.report();
        Ok(dataset)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let dataset = Self::from_json_str(&raw)?;
        info!(
            "loaded {} issues and {} versions from {}",
            dataset.issues.len(),
            dataset.versions.len(),
            path.display()
        );
        Ok(dataset)
    }

    pub fn validate(&self) -> Vec<Finding> {
        let mut findings = Vec::new();
        let mut seen = HashSet::new();

        for issue in &self.issues {
            if !seen.insert(issue.id.as_str()) {
                findings.push(Finding::DuplicateIssueId(issue.id.clone()));
            }
            if let Some((recorded, expected)) = issue.aggregate_mismatch() {
                findings.push(Finding::TotalEventsMismatch {
                    issue: issue.id.clone(),
                    recorded,
                    expected,
                });
            }
            if let Some((min, max)) = issue.seen_versions() {
                if issue.first_seen_version != min || issue.last_seen_version != max {
                    findings.push(Finding::SeenVersionMismatch {
                        issue: issue.id.clone(),
                        recorded: (
                            issue.first_seen_version.clone(),
                            issue.last_seen_version.clone(),
                        ),
                        observed: (min.to_string(), max.to_string()),
                    });
                }
            }
        }
        findings
    }

    fn report(&self) {
        for finding in self.validate() {
            warn!("dataset: {}", finding);
        }
    }
}
