use crate::dataset::Dataset;
use crate::error::{CrashSightError, Result};
use crate::filter::{self, FilterState};
use crate::time_range::TimeRange;
use crate::types::{CrashGroup, IssueNote, IssueStatus, NoteAction};
use crate::version_tree::{SelectionDraft, VersionTree};
use crate::workflow::NoteDraft;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

pub const DEFAULT_AUTHOR: &str = "Current User";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DashboardOptions {
    /// Author recorded on notes written through this dashboard.
    pub author: String,
    /// Also drop issues with no event inside the resolved time window.
    pub enforce_time_range: bool,
}

impl Default for DashboardOptions {
    fn default() -> Self {
        Self {
            author: DEFAULT_AUTHOR.to_string(),
            enforce_time_range: false,
        }
    }
}

/// Application state: the issue list, reference versions, the committed
/// filter and the issue currently opened in detail.
#[derive(Debug, Clone)]
pub struct Dashboard {
    issues: Vec<CrashGroup>,
    versions: VersionTree,
    filter: FilterState,
    selected: Option<String>,
    options: DashboardOptions,
    note_seq: u64,
}

impl Dashboard {
    pub fn new(dataset: Dataset, options: DashboardOptions) -> Self {
        Self {
            issues: dataset.issues,
            versions: VersionTree::new(dataset.versions),
            filter: FilterState::default(),
            selected: None,
            options,
            note_seq: 0,
        }
    }

    pub fn issues(&self) -> &[CrashGroup] {
        &self.issues
    }

    pub fn versions(&self) -> &VersionTree {
        &self.versions
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    pub fn options(&self) -> &DashboardOptions {
        &self.options
    }

    pub fn issue(&self, id: &str) -> Option<&CrashGroup> {
        self.issues.iter().find(|i| i.id == id)
    }

    pub fn count_by_status(&self, status: IssueStatus) -> usize {
        self.issues.iter().filter(|i| i.status == status).count()
    }

    /// Issues passing the committed filter, in dataset order.
    pub fn visible<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Vec<&CrashGroup> {
        self.query(&self.filter, now)
    }

    /// Runs an ad hoc filter without touching the committed one.
    pub fn query<Tz: TimeZone>(&self, wanted: &FilterState, now: &DateTime<Tz>) -> Vec<&CrashGroup> {
        if self.options.enforce_time_range {
            let window = wanted.time_range.resolve(now);
            filter::apply_within(&self.issues, wanted, &window)
        } else {
            filter::apply(&self.issues, wanted)
        }
    }

    pub fn set_filter(&mut self, filter: FilterState) {
        self.filter = filter;
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        self.filter.search = search.into();
    }

    pub fn set_time_range(&mut self, range: TimeRange) {
        self.filter.time_range = range;
    }

    pub fn open_selection(&self) -> SelectionDraft {
        SelectionDraft::open(&self.filter.selected_builds)
    }

    pub fn commit_builds(&mut self, draft: SelectionDraft) {
        draft.commit(&mut self.filter.selected_builds);
    }

    /// Opens an issue in detail, or closes the detail with `None`.
    /// Returns `false` for an unknown id and leaves the selection alone.
    pub fn select(&mut self, id: Option<&str>) -> bool {
        match id {
            None => {
                self.selected = None;
                true
            }
            Some(id) if self.issue(id).is_some() => {
                self.selected = Some(id.to_string());
                true
            }
            Some(id) => {
                debug!("select ignored, unknown issue {}", id);
                false
            }
        }
    }

    pub fn selected_issue(&self) -> Option<&CrashGroup> {
        self.selected.as_deref().and_then(|id| self.issue(id))
    }

    fn issue_mut(&mut self, id: &str) -> Option<&mut CrashGroup> {
        self.issues.iter_mut().find(|i| i.id == id)
    }

    /// Sets the status of issue `id`. Unknown ids and moves out of `CLOSED`
    /// are ignored and return `false`.
    pub fn update_status(&mut self, id: &str, status: IssueStatus) -> bool {
        let Some(issue) = self.issue_mut(id) else {
            debug!("update_status ignored, unknown issue {}", id);
            return false;
        };
        if issue.status == status {
            return true;
        }
        if !issue.status.can_transition_to(status) {
            debug!("update_status ignored, {} -> {} on issue {}", issue.status, status, id);
            return false;
        }
        issue.status = status;
        true
    }

    /// Prepends `note` to the issue's notes. Unknown ids return `false`.
    pub fn add_note(&mut self, id: &str, note: IssueNote) -> bool {
        let Some(issue) = self.issue_mut(id) else {
            debug!("add_note ignored, unknown issue {}", id);
            return false;
        };
        issue.notes.insert(0, note);
        true
    }

    fn make_note(&mut self, draft: NoteDraft, action: NoteAction, now: DateTime<Utc>) -> IssueNote {
        self.note_seq += 1;
        IssueNote {
            id: format!("note_{}_{}", now.timestamp_millis(), self.note_seq),
            author: self.options.author.clone(),
            date: now,
            content: draft.into_content(),
            action,
        }
    }

    /// Closes an open issue with a note. Either both the note and the status
    /// change land or nothing does.
    pub fn close_issue(&mut self, id: &str, draft: NoteDraft, now: DateTime<Utc>) -> Result<IssueNote> {
        let issue = self
            .issue(id)
            .ok_or_else(|| CrashSightError::IssueNotFound(id.to_string()))?;
        if !issue.status.can_transition_to(IssueStatus::Closed) {
            return Err(CrashSightError::AlreadyClosed(id.to_string()));
        }

        let note = self.make_note(draft, NoteAction::Closed, now);
        self.add_note(id, note.clone());
        self.update_status(id, IssueStatus::Closed);
        info!("issue {} closed by {}", id, note.author);
        Ok(note)
    }

    pub fn annotate(&mut self, id: &str, draft: NoteDraft, now: DateTime<Utc>) -> Result<IssueNote> {
        if self.issue(id).is_none() {
            return Err(CrashSightError::IssueNotFound(id.to_string()));
        }
        let note = self.make_note(draft, NoteAction::Note, now);
        self.add_note(id, note.clone());
        debug!("note {} added to issue {}", note.id, id);
        Ok(note)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time_range::Preset;
    use crate::types::fixtures::*;
    use crate::types::VersionData;

    fn dashboard() -> Dashboard {
        let mut closed = group("3", "com.example.db.DatabaseHelper", "getUser", vec![]);
        closed.status = IssueStatus::Closed;
        let dataset = Dataset {
            issues: vec![
                group(
                    "1",
                    "com.example.Foo",
                    "run",
                    vec![variant("1-v0", "E", "m", 4, vec![event("a", "1.0", "100", 1_000)])],
                ),
                group(
                    "2",
                    "com.example.Bar",
                    "load",
                    vec![variant("2-v0", "E", "n", 2, vec![event("b", "1.1", "110", 50_000)])],
                ),
                closed,
            ],
            versions: Vec::<VersionData>::new(),
        };
        Dashboard::new(dataset, DashboardOptions::default())
    }

    #[test]
    fn test_close_issue_prepends_closed_note() {
        let mut d = dashboard();
        d.annotate("1", NoteDraft::new("first look").unwrap(), ts(10)).unwrap();
        let note = d.close_issue("1", NoteDraft::new("fixed").unwrap(), ts(20)).unwrap();

        let issue = d.issue("1").unwrap();
        assert_eq!(issue.status, IssueStatus::Closed);
        assert_eq!(issue.notes.len(), 2);
        assert_eq!(issue.notes[0], note);
        assert_eq!(note.action, NoteAction::Closed);
        assert_eq!(note.author, DEFAULT_AUTHOR);
        assert_eq!(issue.notes[1].action, NoteAction::Note);
    }

    #[test]
    fn test_close_with_blank_note_changes_nothing() {
        let d = dashboard();
        let before = d.issue("1").cloned();
        assert!(NoteDraft::new("   ").is_err());
        assert_eq!(d.issue("1").cloned(), before);
    }

    #[test]
    fn test_close_errors_leave_state() {
        let mut d = dashboard();
        let err = d.close_issue("3", NoteDraft::new("again").unwrap(), ts(0)).unwrap_err();
        assert!(matches!(err, CrashSightError::AlreadyClosed(_)));
        assert!(d.issue("3").unwrap().notes.is_empty());

        let err = d.close_issue("404", NoteDraft::new("x").unwrap(), ts(0)).unwrap_err();
        assert!(matches!(err, CrashSightError::IssueNotFound(_)));
    }

    #[test]
    fn test_unknown_id_is_silent_noop() {
        let mut d = dashboard();
        let before: Vec<CrashGroup> = d.issues().to_vec();
        assert!(!d.update_status("nope", IssueStatus::Closed));
        let note = IssueNote {
            id: "n".to_string(),
            author: "x".to_string(),
            date: ts(0),
            content: "c".to_string(),
            action: NoteAction::Note,
        };
        assert!(!d.add_note("nope", note));
        assert_eq!(d.issues(), before.as_slice());
    }

    #[test]
    fn test_update_status_never_reopens() {
        let mut d = dashboard();
        assert!(!d.update_status("3", IssueStatus::Open));
        assert_eq!(d.issue("3").unwrap().status, IssueStatus::Closed);
        assert!(d.update_status("2", IssueStatus::Closed));
    }

    #[test]
    fn test_note_ids_are_unique() {
        let mut d = dashboard();
        let a = d.annotate("1", NoteDraft::new("a").unwrap(), ts(5)).unwrap();
        let b = d.annotate("1", NoteDraft::new("b").unwrap(), ts(5)).unwrap();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_visible_time_stage_is_opt_in() {
        let mut d = dashboard();
        d.set_time_range(TimeRange::Preset(Preset::LastHour));
        let now = ts(3_000);
        assert_eq!(d.visible(&now).len(), 3);

        d.options.enforce_time_range = true;
        let ids: Vec<&str> = d.visible(&now).iter().map(|g| g.id.as_str()).collect();
        assert_eq!(ids, vec!["1"]);
    }

    #[test]
    fn test_commit_builds_and_search() {
        let mut d = dashboard();
        let mut draft = d.open_selection();
        draft.toggle_build("110");
        assert_eq!(d.visible(&ts(0)).len(), 3);
        d.commit_builds(draft);
        d.set_search("LOAD");
        let ids: Vec<&str> = d.visible(&ts(0)).iter().map(|g| g.id.as_str()).collect();
        assert_eq!(ids, vec!["2"]);
    }

    #[test]
    fn test_select() {
        let mut d = dashboard();
        assert!(d.select(Some("2")));
        assert_eq!(d.selected_issue().map(|i| i.id.as_str()), Some("2"));
        assert!(!d.select(Some("nope")));
        assert_eq!(d.selected_issue().map(|i| i.id.as_str()), Some("2"));
        assert!(d.select(None));
        assert!(d.selected_issue().is_none());
    }
}
