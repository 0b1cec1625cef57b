use crate::time_range::{TimeRange, TimeWindow};
use crate::types::CrashGroup;
use crate::version_tree::BuildSet;
use serde::{Deserialize, Serialize};

/// The committed query behind the issue list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterState {
    pub time_range: TimeRange,
    /// Empty means every version.
    #[serde(default)]
    pub selected_builds: BuildSet,
    #[serde(default)]
    pub search: String,
}

impl FilterState {
    pub fn has_build_filter(&self) -> bool {
        !self.selected_builds.is_empty()
    }

    /// Lower-cased search term, or `None` while the trimmed input is blank.
    ///
    /// The returned term keeps surrounding whitespace.
    pub fn search_term(&self) -> Option<String> {
        if self.search.trim().is_empty() {
            None
        } else {
            Some(self.search.to_lowercase())
        }
    }
}

pub fn matches_builds(issue: &CrashGroup, builds: &BuildSet) -> bool {
    issue.events().any(|e| builds.contains(&e.build_number))
}

/// `term` must already be lower-cased. User ids are never searched.
pub fn matches_search(issue: &CrashGroup, term: &str) -> bool {
    let hit = |s: &str| s.to_lowercase().contains(term);
    hit(&issue.class_name)
        || hit(&issue.method_name)
        || issue
            .variants
            .iter()
            .any(|v| hit(&v.message) || hit(&v.exception_type))
}

pub fn within_window(issue: &CrashGroup, window: &TimeWindow) -> bool {
    issue.events().any(|e| window.contains(&e.timestamp))
}

/// Runs the build and search stages. Order is preserved and the time range is
/// carried but not applied.
pub fn apply<'a>(issues: &'a [CrashGroup], filter: &FilterState) -> Vec<&'a CrashGroup> {
    let term = filter.search_term();
    issues
        .iter()
        .filter(|issue| !filter.has_build_filter() || matches_builds(issue, &filter.selected_builds))
        .filter(|issue| term.as_deref().map_or(true, |t| matches_search(issue, t)))
        .collect()
}

/// [`apply`] followed by a timestamp stage: an issue stays when any of its
/// events falls inside `window`.
pub fn apply_within<'a>(
    issues: &'a [CrashGroup],
    filter: &FilterState,
    window: &TimeWindow,
) -> Vec<&'a CrashGroup> {
    apply(issues, filter)
        .into_iter()
        .filter(|issue| within_window(issue, window))
        .collect()
}
