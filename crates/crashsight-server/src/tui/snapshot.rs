use crate::tui::app::{Screen, TuiApp};
use crate::view::{EventsPage, IssueRow};
use chrono::{DateTime, Local};
use crashsight_core::dashboard::Dashboard;
use crashsight_core::types::{CrashGroup, IssueStatus};
use crashsight_core::version_tree::{selection_label, VersionTree};

/// Everything one frame needs, copied out so the lock is not held while drawing.
#[derive(Clone)]
pub struct UiSnapshot {
    pub rows: Vec<IssueRow>,
    pub total_issues: usize,
    pub open_issues: usize,
    pub version_label: String,
    pub time_label: String,
    pub search: String,
    pub versions: VersionTree,
    pub detail: Option<DetailSnapshot>,
    pub uptime_seconds: u64,
}

#[derive(Clone)]
pub struct DetailSnapshot {
    pub issue: CrashGroup,
    pub page: EventsPage,
}

impl UiSnapshot {
    pub fn capture(app: &TuiApp, dashboard: &Dashboard, now: &DateTime<Local>, uptime_seconds: u64) -> Self {
        let filter = dashboard.filter();
        let rows: Vec<IssueRow> = dashboard
            .visible(now)
            .into_iter()
            .map(IssueRow::from_issue)
            .collect();

        let detail = match app.screen {
            Screen::Detail => dashboard.selected_issue().map(|issue| DetailSnapshot {
                page: EventsPage::build(issue, app.focus, app.cursor.index()),
                issue: issue.clone(),
            }),
            Screen::List => None,
        };

        Self {
            rows,
            total_issues: dashboard.issues().len(),
            open_issues: dashboard.issues().len() - dashboard.count_by_status(IssueStatus::Closed),
            version_label: selection_label(&filter.selected_builds),
            time_label: filter.time_range.label(&Local),
            search: filter.search.clone(),
            versions: dashboard.versions().clone(),
            detail,
            uptime_seconds,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::sample_dataset;
    use crashsight_core::dashboard::DashboardOptions;

    #[test]
    fn test_capture_list_and_detail() {
        let mut dashboard = Dashboard::new(sample_dataset().unwrap(), DashboardOptions::default());
        let mut app = TuiApp::new();
        let now = Local::now();

        let snap = UiSnapshot::capture(&app, &dashboard, &now, 5);
        assert_eq!(snap.rows.len(), 4);
        assert_eq!(snap.open_issues, 3);
        assert_eq!(snap.version_label, "All versions");
        assert_eq!(snap.time_label, "Last 30 days");
        assert!(snap.detail.is_none());

        dashboard.select(Some("2"));
        app.screen = Screen::Detail;
        let snap = UiSnapshot::capture(&app, &dashboard, &now, 5);
        let detail = snap.detail.unwrap();
        assert_eq!(detail.issue.id, "2");
        assert_eq!(detail.page.variants.len(), 2);
        assert_eq!(detail.page.position, "1 / 12");
    }
}
