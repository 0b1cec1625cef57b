use crate::types::VersionData;
use serde::Serialize;
use std::collections::BTreeSet;

/// Selected build numbers. Empty means every version.
pub type BuildSet = BTreeSet<String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionState {
    All,
    Some,
    None,
}

/// Release taxonomy: version names owning ordered build numbers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionTree {
    versions: Vec<VersionData>,
}

impl VersionTree {
    pub fn new(versions: Vec<VersionData>) -> Self {
        Self { versions }
    }

    pub fn versions(&self) -> &[VersionData] {
        &self.versions
    }

    pub fn find(&self, version_name: &str) -> Option<&VersionData> {
        self.versions.iter().find(|v| v.version_name == version_name)
    }

    pub fn builds_of(&self, version_name: &str) -> Vec<&str> {
        self.find(version_name)
            .map(|v| v.builds.iter().map(|b| b.build_number.as_str()).collect())
            .unwrap_or_default()
    }

    pub fn state_of(&self, version_name: &str, selected: &BuildSet) -> SelectionState {
        let builds = self.builds_of(version_name);
        if builds.is_empty() {
            return SelectionState::None;
        }
        let hits = builds.iter().filter(|b| selected.contains(**b)).count();
        if hits == builds.len() {
            SelectionState::All
        } else if hits > 0 {
            SelectionState::Some
        } else {
            SelectionState::None
        }
    }

    /// Deselects every build of the version when all are selected, otherwise selects them all.
    pub fn toggle_version(&self, version_name: &str, selected: &BuildSet) -> BuildSet {
        let builds = self.builds_of(version_name);
        let mut next = selected.clone();
        match self.state_of(version_name, selected) {
            SelectionState::All => {
                for build in builds {
                    next.remove(build);
                }
            }
            SelectionState::Some | SelectionState::None => {
                next.extend(builds.into_iter().map(str::to_string));
            }
        }
        next
    }

    /// Sum of the informational per-build event counts.
    pub fn event_total(&self, version_name: &str) -> u64 {
        self.find(version_name)
            .map(|v| v.builds.iter().map(|b| b.event_count).sum())
            .unwrap_or(0)
    }

    /// Version name owning `build_number`, if any.
    pub fn version_of(&self, build_number: &str) -> Option<&str> {
        self.versions
            .iter()
            .find(|v| v.builds.iter().any(|b| b.build_number == build_number))
            .map(|v| v.version_name.as_str())
    }
}

pub fn toggle_build(build_number: &str, selected: &BuildSet) -> BuildSet {
    let mut next = selected.clone();
    if !next.remove(build_number) {
        next.insert(build_number.to_string());
    }
    next
}

pub fn clear(_selected: &BuildSet) -> BuildSet {
    BuildSet::new()
}

pub fn selection_label(selected: &BuildSet) -> String {
    if selected.is_empty() {
        "All versions".to_string()
    } else {
        format!("Selected versions ({})", selected.len())
    }
}

/// Pending build selection, edited apart from the committed filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionDraft {
    pending: BuildSet,
}

impl SelectionDraft {
    /// Seeds from the committed selection; earlier uncommitted edits are dropped.
    pub fn open(committed: &BuildSet) -> Self {
        Self {
            pending: committed.clone(),
        }
    }

    pub fn pending(&self) -> &BuildSet {
        &self.pending
    }

    pub fn state_of(&self, tree: &VersionTree, version_name: &str) -> SelectionState {
        tree.state_of(version_name, &self.pending)
    }

    pub fn is_selected(&self, build_number: &str) -> bool {
        self.pending.contains(build_number)
    }

    pub fn toggle_version(&mut self, tree: &VersionTree, version_name: &str) {
        self.pending = tree.toggle_version(version_name, &self.pending);
    }

    pub fn toggle_build(&mut self, build_number: &str) {
        self.pending = toggle_build(build_number, &self.pending);
    }

    pub fn clear(&mut self) {
        self.pending = clear(&self.pending);
    }

    /// Replaces the committed selection with the draft.
    pub fn commit(self, committed: &mut BuildSet) {
        *committed = self.pending;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BuildInfo;

    fn tree() -> VersionTree {
        let build = |n: &str, c: u64| BuildInfo {
            build_number: n.to_string(),
            event_count: c,
        };
        VersionTree::new(vec![
            VersionData {
                version_name: "1.3.4.0".to_string(),
                builds: vec![build("103040007", 1500), build("103040006", 0)],
            },
            VersionData {
                version_name: "1.3.3.1".to_string(),
                builds: vec![build("103030012", 96), build("103030010", 20)],
            },
            VersionData {
                version_name: "1.1.4.0".to_string(),
                builds: vec![build("101040001", 500)],
            },
            VersionData {
                version_name: "0.9.0".to_string(),
                builds: vec![],
            },
        ])
    }

    fn set(items: &[&str]) -> BuildSet {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_builds_of() {
        let t = tree();
        assert_eq!(t.builds_of("1.3.4.0"), vec!["103040007", "103040006"]);
        assert!(t.builds_of("9.9.9").is_empty());
    }

    #[test]
    fn test_state_of() {
        let t = tree();
        assert_eq!(t.state_of("1.3.4.0", &set(&["103040007", "103040006"])), SelectionState::All);
        assert_eq!(t.state_of("1.3.4.0", &set(&["103040007"])), SelectionState::Some);
        assert_eq!(t.state_of("1.3.4.0", &set(&["101040001"])), SelectionState::None);
        assert_eq!(t.state_of("0.9.0", &set(&[])), SelectionState::None);
        assert_eq!(t.state_of("unknown", &set(&["103040007"])), SelectionState::None);
    }

    #[test]
    fn test_toggle_version_all_removes_only_that_version() {
        let t = tree();
        let selected = set(&["103040007", "103040006", "101040001"]);
        let next = t.toggle_version("1.3.4.0", &selected);
        assert_eq!(next, set(&["101040001"]));
    }

    #[test]
    fn test_toggle_version_some_or_none_adds_builds() {
        let t = tree();
        let from_some = t.toggle_version("1.3.3.1", &set(&["103030012", "101040001"]));
        assert_eq!(from_some, set(&["103030012", "103030010", "101040001"]));

        let from_none = t.toggle_version("1.3.3.1", &set(&[]));
        assert_eq!(from_none, set(&["103030012", "103030010"]));
    }

    #[test]
    fn test_toggle_version_twice_returns_to_empty() {
        let t = tree();
        let once = t.toggle_version("1.3.4.0", &BuildSet::new());
        let twice = t.toggle_version("1.3.4.0", &once);
        assert!(twice.is_empty());
    }

    #[test]
    fn test_toggle_build_flips_membership() {
        let selected = toggle_build("103040007", &BuildSet::new());
        assert_eq!(selected, set(&["103040007"]));
        assert!(toggle_build("103040007", &selected).is_empty());
    }

    #[test]
    fn test_event_total_and_lookup() {
        let t = tree();
        assert_eq!(t.event_total("1.3.3.1"), 116);
        assert_eq!(t.event_total("nope"), 0);
        assert_eq!(t.version_of("101040001"), Some("1.1.4.0"));
        assert_eq!(t.version_of("0"), None);
    }

    #[test]
    fn test_draft_is_staged_until_commit() {
        let t = tree();
        let mut committed = set(&["101040001"]);

        let mut draft = SelectionDraft::open(&committed);
        draft.toggle_version(&t, "1.3.4.0");
        draft.toggle_build("101040001");
        assert_eq!(committed, set(&["101040001"]));

        // reopening discards the uncommitted edits
        let draft_again = SelectionDraft::open(&committed);
        assert_eq!(draft_again.pending(), &committed);

        draft.commit(&mut committed);
        assert_eq!(committed, set(&["103040007", "103040006"]));
    }

    #[test]
    fn test_draft_clear_and_label() {
        let mut draft = SelectionDraft::open(&set(&["1", "2"]));
        assert_eq!(selection_label(draft.pending()), "Selected versions (2)");
        draft.clear();
        assert_eq!(selection_label(draft.pending()), "All versions");
    }
}
