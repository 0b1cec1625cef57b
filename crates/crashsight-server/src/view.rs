//! Serializable projections shared by the HTTP API and the terminal UI.

use crashsight_core::detail::{affected_users, variant_shares, visible_events, EventCursor, VariantFocus};
use crashsight_core::types::{CrashEvent, CrashGroup, IssueStatus, VersionData};
use crashsight_core::version_tree::{BuildSet, SelectionState, VersionTree};
use serde::Serialize;

/// One line of the issue list.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueRow {
    pub id: String,
    pub status: IssueStatus,
    pub site: String,
    pub package: String,
    pub top_exception: String,
    pub top_message: String,
    pub first_seen_version: String,
    pub last_seen_version: String,
    pub total_events: u64,
    pub affected_users: u64,
    pub variant_count: usize,
    pub note_count: usize,
    pub history: Vec<u64>,
}

impl IssueRow {
    pub fn from_issue(issue: &CrashGroup) -> Self {
        let top = issue.top_variant();
        Self {
            id: issue.id.clone(),
            status: issue.status,
            site: issue.site_label(),
            package: issue.package_name().to_string(),
            top_exception: top.map(|v| v.exception_type.clone()).unwrap_or_default(),
            top_message: top.map(|v| v.message.clone()).unwrap_or_default(),
            first_seen_version: issue.first_seen_version.clone(),
            last_seen_version: issue.last_seen_version.clone(),
            total_events: issue.total_events,
            affected_users: issue.affected_users,
            variant_count: issue.variants.len(),
            note_count: issue.notes.len(),
            history: issue.history.iter().map(|h| h.count).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionSummary {
    #[serde(flatten)]
    pub version: VersionData,
    pub event_total: u64,
    pub selection: SelectionState,
}

pub fn version_summaries(tree: &VersionTree, selected: &BuildSet) -> Vec<VersionSummary> {
    tree.versions()
        .iter()
        .map(|v| VersionSummary {
            version: v.clone(),
            event_total: tree.event_total(&v.version_name),
            selection: tree.state_of(&v.version_name, selected),
        })
        .collect()
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantBar {
    pub id: String,
    pub exception_type: String,
    pub message: String,
    pub count: u64,
    pub share: f64,
}

/// Detail view state for one variant focus and event position.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventsPage {
    pub issue_id: String,
    pub title: String,
    pub focus: VariantFocus,
    pub affected_users: u64,
    pub position: String,
    pub total: usize,
    pub variants: Vec<VariantBar>,
    pub event: Option<CrashEvent>,
}

impl EventsPage {
    pub fn build(issue: &CrashGroup, focus: VariantFocus, page: usize) -> Self {
        let events = visible_events(issue, focus);
        let mut cursor = EventCursor::new(events.len());
        cursor.seek(page);
        let variants = issue
            .variants
            .iter()
            .zip(variant_shares(issue))
            .map(|(v, share)| VariantBar {
                id: v.id.clone(),
                exception_type: v.exception_type.clone(),
                message: v.message.clone(),
                count: v.count,
                share,
            })
            .collect();

        Self {
            issue_id: issue.id.clone(),
            title: focus.title(),
            focus,
            affected_users: affected_users(issue, focus),
            position: cursor.position(),
            total: cursor.len(),
            variants,
            event: cursor.current(&events).cloned(),
        }
    }
}
