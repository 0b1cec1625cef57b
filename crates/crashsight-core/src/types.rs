use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum IssueStatus {
    New,
    Open,
    Regression,
    Closed,
}

impl IssueStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueStatus::New => "NEW",
            IssueStatus::Open => "OPEN",
            IssueStatus::Regression => "REGRESSION",
            IssueStatus::Closed => "CLOSED",
        }
    }
}

impl fmt::Display for IssueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One frame of a captured stack, innermost first within a trace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StackFrame {
    pub library: String,
    pub method: String,
    pub file: String,
    pub line: u32,
    pub is_app_code: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrashEvent {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub app_version: String,
    pub build_number: String,
    pub device_model: String,
    pub os_version: String,
    pub user_id: String,
    pub exception_type: String,
    pub message: String,
    #[serde(default)]
    pub stack_trace: Vec<StackFrame>,
}

/// Events sharing an exception type and message inside one crash group.
///
/// `count` and `affected_users` are cumulative figures from the source system;
/// `events` may be a sample and is kept newest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrashVariant {
    pub id: String,
    pub exception_type: String,
    pub message: String,
    pub count: u64,
    pub affected_users: u64,
    #[serde(default)]
    pub events: Vec<CrashEvent>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryPoint {
    pub date: NaiveDate,
    pub count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteAction {
    Closed,
    #[default]
    Note,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueNote {
    pub id: String,
    pub author: String,
    pub date: DateTime<Utc>,
    pub content: String,
    #[serde(default)]
    pub action: NoteAction,
}

/// A crash group: every crash observed at one (class, method) site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrashGroup {
    pub id: String,
    pub class_name: String,
    pub method_name: String,
    pub status: IssueStatus,
    pub first_seen_date: DateTime<Utc>,
    pub first_seen_version: String,
    pub last_seen_date: DateTime<Utc>,
    pub last_seen_version: String,
    pub total_events: u64,
    pub affected_users: u64,
    #[serde(default)]
    pub history: Vec<HistoryPoint>,
    /// Significance order; never re-sorted.
    pub variants: Vec<CrashVariant>,
    /// Newest first.
    #[serde(default)]
    pub notes: Vec<IssueNote>,
}

impl CrashGroup {
    pub fn events(&self) -> impl Iterator<Item = &CrashEvent> {
        self.variants.iter().flat_map(|v| v.events.iter())
    }

    /// Lowest and highest app version seen across all events.
    ///
    /// Plain string ordering, so "1.10.0" sorts before "1.2.0".
    pub fn seen_versions(&self) -> Option<(&str, &str)> {
        let mut versions = self.events().map(|e| e.app_version.as_str());
        let first = versions.next()?;
        let (min, max) = versions.fold((first, first), |(min, max), v| {
            (if v < min { v } else { min }, if v > max { v } else { max })
        });
        Some((min, max))
    }

    pub fn variant_count_sum(&self) -> u64 {
        self.variants.iter().map(|v| v.count).sum()
    }

    /// Returns `(recorded, expected)` when `total_events` disagrees with the variants.
    pub fn aggregate_mismatch(&self) -> Option<(u64, u64)> {
        let expected = self.variant_count_sum();
        if self.total_events == expected {
            None
        } else {
            Some((self.total_events, expected))
        }
    }

    /// Variant with the highest count. On a tie the later variant wins.
    pub fn top_variant(&self) -> Option<&CrashVariant> {
        self.variants
            .iter()
            .reduce(|prev, cur| if prev.count > cur.count { prev } else { cur })
    }

    pub fn package_name(&self) -> &str {
        match self.class_name.rfind('.') {
            Some(idx) => &self.class_name[..idx],
            None => "",
        }
    }

    pub fn simple_class_name(&self) -> &str {
        self.class_name.rsplit('.').next().unwrap_or(&self.class_name)
    }

    /// `SimpleClass.method`, the headline used in list rows.
    pub fn site_label(&self) -> String {
        format!("{}.{}", self.simple_class_name(), self.method_name)
    }

    pub fn is_closed(&self) -> bool {
        self.status == IssueStatus::Closed
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildInfo {
    pub build_number: String,
    /// Informational only.
    #[serde(default)]
    pub event_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionData {
    pub version_name: String,
    #[serde(default)]
    pub builds: Vec<BuildInfo>,
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use chrono::TimeZone;

    pub fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    pub fn event(id: &str, version: &str, build: &str, secs: i64) -> CrashEvent {
        CrashEvent {
            id: id.to_string(),
            timestamp: ts(secs),
            app_version: version.to_string(),
            build_number: build.to_string(),
            device_model: "Pixel 7".to_string(),
            os_version: "Android 13".to_string(),
            user_id: format!("user_{}", id),
            exception_type: "java.lang.IllegalStateException".to_string(),
            message: "boom".to_string(),
            stack_trace: vec![StackFrame {
                library: "com.example.app".to_string(),
                method: "run".to_string(),
                file: "Main.java".to_string(),
                line: 42,
                is_app_code: true,
            }],
        }
    }

    pub fn variant(id: &str, exception: &str, message: &str, count: u64, events: Vec<CrashEvent>) -> CrashVariant {
        CrashVariant {
            id: id.to_string(),
            exception_type: exception.to_string(),
            message: message.to_string(),
            count,
            affected_users: count * 7 / 10,
            events,
        }
    }

    pub fn group(id: &str, class_name: &str, method: &str, variants: Vec<CrashVariant>) -> CrashGroup {
        let total_events = variants.iter().map(|v| v.count).sum();
        let affected_users = variants.iter().map(|v| v.affected_users).sum();
        CrashGroup {
            id: id.to_string(),
            class_name: class_name.to_string(),
            method_name: method.to_string(),
            status: IssueStatus::Open,
            first_seen_date: ts(0),
            first_seen_version: "1.0.0".to_string(),
            last_seen_date: ts(0),
            last_seen_version: "1.0.0".to_string(),
            total_events,
            affected_users,
            history: Vec::new(),
            variants,
            notes: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn test_seen_versions_are_lexicographic() {
        let g = group(
            "1",
            "com.example.Foo",
            "bar",
            vec![variant(
                "1-v0",
                "E",
                "m",
                3,
                vec![
                    event("a", "1.2.0", "10200", 10),
                    event("b", "1.10.0", "11000", 20),
                    event("c", "1.3.0", "10300", 30),
                ],
            )],
        );
        // "1.10.0" < "1.2.0" as strings
        assert_eq!(g.seen_versions(), Some(("1.10.0", "1.3.0")));
    }

    #[test]
    fn test_seen_versions_empty() {
        let g = group("1", "com.example.Foo", "bar", vec![variant("1-v0", "E", "m", 0, vec![])]);
        assert_eq!(g.seen_versions(), None);
    }

    #[test]
    fn test_top_variant_tie_prefers_later() {
        let g = group(
            "1",
            "com.example.Foo",
            "bar",
            vec![
                variant("1-v0", "E", "first", 10, vec![]),
                variant("1-v1", "E", "second", 10, vec![]),
                variant("1-v2", "E", "third", 3, vec![]),
            ],
        );
        assert_eq!(g.top_variant().map(|v| v.id.as_str()), Some("1-v1"));
    }

    #[test]
    fn test_site_and_package() {
        let g = group("1", "android.database.sqlite.SQLiteConnection", "nativeExecute", vec![]);
        assert_eq!(g.package_name(), "android.database.sqlite");
        assert_eq!(g.site_label(), "SQLiteConnection.nativeExecute");

        let bare = group("2", "Main", "run", vec![]);
        assert_eq!(bare.package_name(), "");
        assert_eq!(bare.site_label(), "Main.run");
    }

    #[test]
    fn test_aggregate_mismatch() {
        let mut g = group("1", "a.B", "c", vec![variant("v", "E", "m", 80, vec![]), variant("w", "E", "n", 20, vec![])]);
        assert_eq!(g.aggregate_mismatch(), None);
        g.total_events = 99;
        assert_eq!(g.aggregate_mismatch(), Some((99, 100)));
    }

    #[test]
    fn test_json_shape_is_camel_case() {
        let g = group("1", "a.B", "c", vec![variant("v", "E", "m", 1, vec![event("e", "1.0", "100", 5)])]);
        let json = serde_json::to_value(&g).unwrap();
        assert!(json.get("className").is_some());
        assert_eq!(json["status"], "OPEN");
        assert!(json["variants"][0]["events"][0].get("buildNumber").is_some());
        assert_eq!(json["variants"][0]["events"][0]["stackTrace"][0]["isAppCode"], true);
    }
}
