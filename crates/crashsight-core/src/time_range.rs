use chrono::{
    DateTime, Datelike, Duration, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, Offset,
    TimeZone, Timelike, Utc, Weekday,
};
use serde::{Deserialize, Serialize};

/// Named shortcut ranges offered by the time picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Preset {
    #[serde(rename = "1h")]
    LastHour,
    #[serde(rename = "24h")]
    Last24Hours,
    #[serde(rename = "yesterday")]
    Yesterday,
    #[serde(rename = "7d")]
    Last7Days,
    #[serde(rename = "30d")]
    Last30Days,
}

impl Preset {
    pub const ALL: [Preset; 5] = [
        Preset::LastHour,
        Preset::Last24Hours,
        Preset::Yesterday,
        Preset::Last7Days,
        Preset::Last30Days,
    ];

    pub fn tag(&self) -> &'static str {
        match self {
            Preset::LastHour => "1h",
            Preset::Last24Hours => "24h",
            Preset::Yesterday => "yesterday",
            Preset::Last7Days => "7d",
            Preset::Last30Days => "30d",
        }
    }

    /// Unknown tags yield `None`; callers keep whatever range they had.
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.tag() == tag)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Preset::LastHour => "Last 1 hour",
            Preset::Last24Hours => "Last 24 hours",
            Preset::Yesterday => "Yesterday",
            Preset::Last7Days => "Last 7 days",
            Preset::Last30Days => "Last 30 days",
        }
    }

    pub fn resolve<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> TimeWindow {
        let end = now.with_timezone(&Utc);
        let trailing = |hours: i64| TimeWindow {
            start: end - Duration::hours(hours),
            end,
        };
        match self {
            Preset::LastHour => trailing(1),
            Preset::Last24Hours => trailing(24),
            Preset::Last7Days => trailing(7 * 24),
            Preset::Last30Days => trailing(30 * 24),
            Preset::Yesterday => {
                let today = now.date_naive();
                let day = today.pred_opt().unwrap_or(today);
                let midnight = day.and_time(NaiveTime::MIN);
                let tz = now.timezone();
                TimeWindow {
                    start: localize(&tz, midnight),
                    end: localize(&tz, midnight + Duration::milliseconds(86_399_999)),
                }
            }
        }
    }
}

/// Concrete instants a range resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// Half-open: `start <= ts < end`.
    pub fn contains(&self, ts: &DateTime<Utc>) -> bool {
        *ts >= self.start && *ts < self.end
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}

/// The time-range part of the filter: a preset or explicit bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum TimeRange {
    Preset(Preset),
    Custom {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

impl Default for TimeRange {
    fn default() -> Self {
        TimeRange::Preset(Preset::Last30Days)
    }
}

impl TimeRange {
    /// Custom bounds come back untouched.
    pub fn resolve<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> TimeWindow {
        match self {
            TimeRange::Preset(preset) => preset.resolve(now),
            TimeRange::Custom { start, end } => TimeWindow {
                start: *start,
                end: *end,
            },
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            TimeRange::Preset(preset) => preset.tag(),
            TimeRange::Custom { .. } => "custom",
        }
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, TimeRange::Custom { .. })
    }

    pub fn label<Tz: TimeZone>(&self, tz: &Tz) -> String {
        match self {
            TimeRange::Preset(preset) => preset.label().to_string(),
            TimeRange::Custom { start, end } => {
                let short = |ts: &DateTime<Utc>| {
                    let local = ts.with_timezone(tz);
                    format!(
                        "{}/{} {}:{:02}",
                        local.month(),
                        local.day(),
                        local.hour(),
                        local.minute()
                    )
                };
                format!("{} - {}", short(start), short(end))
            }
        }
    }
}

/// Range produced by clicking a single calendar day: `[00:00:00, 23:59:59]` local.
pub fn day_range<Tz: TimeZone>(day: NaiveDate, tz: &Tz) -> TimeRange {
    let midnight = day.and_time(NaiveTime::MIN);
    TimeRange::Custom {
        start: localize(tz, midnight),
        end: localize(tz, midnight + Duration::seconds(86_399)),
    }
}

/// Pins a wall-clock time to an instant in `tz`.
///
/// Ambiguous times take the earlier instant. Times inside a DST gap use the
/// zone's offset at that moment read as UTC.
fn localize<Tz: TimeZone>(tz: &Tz, naive: NaiveDateTime) -> DateTime<Utc> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => dt.with_timezone(&Utc),
        LocalResult::Ambiguous(earliest, _) => earliest.with_timezone(&Utc),
        LocalResult::None => {
            let offset = tz.offset_from_utc_datetime(&naive).fix();
            let shifted = naive - Duration::seconds(i64::from(offset.local_minus_utc()));
            Utc.from_utc_datetime(&shifted)
        }
    }
}

/// Staged edits of the time range, committed with [`RangeDraft::apply`].
///
/// `selected == None` means the draft is custom. Editing either boundary by
/// hand switches to custom and the preset is never re-derived from the bounds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeDraft {
    selected: Option<Preset>,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
}

impl RangeDraft {
    pub fn open<Tz: TimeZone>(committed: &TimeRange, now: &DateTime<Tz>) -> Self {
        let window = committed.resolve(now);
        let selected = match committed {
            TimeRange::Preset(preset) => Some(*preset),
            TimeRange::Custom { .. } => None,
        };
        Self {
            selected,
            start: Some(window.start),
            end: Some(window.end),
        }
    }

    pub fn selected_preset(&self) -> Option<Preset> {
        self.selected
    }

    pub fn is_custom(&self) -> bool {
        self.selected.is_none()
    }

    pub fn start(&self) -> Option<DateTime<Utc>> {
        self.start
    }

    pub fn end(&self) -> Option<DateTime<Utc>> {
        self.end
    }

    pub fn pick_preset<Tz: TimeZone>(&mut self, preset: Preset, now: &DateTime<Tz>) {
        let window = preset.resolve(now);
        self.selected = Some(preset);
        self.start = Some(window.start);
        self.end = Some(window.end);
    }

    /// Switches to custom keeping the current bounds.
    pub fn pick_custom(&mut self) {
        self.selected = None;
    }

    pub fn click_day<Tz: TimeZone>(&mut self, day: NaiveDate, tz: &Tz) {
        if let TimeRange::Custom { start, end } = day_range(day, tz) {
            self.start = Some(start);
            self.end = Some(end);
        }
        self.selected = None;
    }

    pub fn edit_start(&mut self, start: Option<DateTime<Utc>>) {
        self.start = start;
        self.selected = None;
    }

    pub fn edit_end(&mut self, end: Option<DateTime<Utc>>) {
        self.end = end;
        self.selected = None;
    }

    /// Whether noon of `day` falls inside the draft bounds.
    pub fn covers_day<Tz: TimeZone>(&self, day: NaiveDate, tz: &Tz) -> bool {
        let (Some(start), Some(end)) = (self.start, self.end) else {
            return false;
        };
        let noon = localize(tz, day.and_time(NaiveTime::MIN) + Duration::hours(12));
        noon >= start && noon <= end
    }

    /// The range to commit, or `None` while a custom bound is missing.
    pub fn apply(&self) -> Option<TimeRange> {
        match self.selected {
            Some(preset) => Some(TimeRange::Preset(preset)),
            None => Some(TimeRange::Custom {
                start: self.start?,
                end: self.end?,
            }),
        }
    }
}

/// Layout of one month for the calendar grid, weeks starting on Sunday.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarMonth {
    pub year: i32,
    pub month: u32,
    pub leading_blanks: u32,
    pub days: u32,
}

impl CalendarMonth {
    pub fn containing(date: NaiveDate) -> Self {
        let year = date.year();
        let month = date.month();
        let first = date.with_day(1).unwrap_or(date);
        let next_first = if month == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)
        };
        let days = next_first
            .map(|next| (next - first).num_days() as u32)
            .unwrap_or(31);
        Self {
            year,
            month,
            leading_blanks: first.weekday().num_days_from_sunday(),
            days,
        }
    }

    pub fn date(&self, day: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, day)
    }

    pub fn first_weekday(&self) -> Weekday {
        self.date(1).map(|d| d.weekday()).unwrap_or(Weekday::Sun)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, NaiveDate};

    fn shanghai() -> FixedOffset {
        FixedOffset::east_opt(8 * 3600).unwrap()
    }

    fn at(tz: &FixedOffset, y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<FixedOffset> {
        tz.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn test_24h_is_exact() {
        let tz = shanghai();
        let now = at(&tz, 2024, 3, 15, 9, 30);
        let window = Preset::Last24Hours.resolve(&now);
        assert_eq!(window.end, now.with_timezone(&Utc));
        assert_eq!(window.duration(), Duration::hours(24));
    }

    #[test]
    fn test_trailing_presets() {
        let now = Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap();
        assert_eq!(Preset::LastHour.resolve(&now).duration(), Duration::hours(1));
        assert_eq!(Preset::Last7Days.resolve(&now).duration(), Duration::hours(168));
        assert_eq!(Preset::Last30Days.resolve(&now).duration(), Duration::hours(720));
        assert_eq!(Preset::Last30Days.resolve(&now).end, now);
    }

    #[test]
    fn test_yesterday_is_previous_local_day() {
        let tz = shanghai();
        for (h, min) in [(0, 0), (0, 1), (12, 0), (23, 59)] {
            let now = at(&tz, 2024, 3, 15, h, min);
            let window = Preset::Yesterday.resolve(&now);
            let start = window.start.with_timezone(&tz);
            let end = window.end.with_timezone(&tz);
            assert_eq!(start.date_naive(), NaiveDate::from_ymd_opt(2024, 3, 14).unwrap());
            assert_eq!((start.hour(), start.minute(), start.second()), (0, 0, 0));
            assert_eq!(start.timestamp_subsec_millis(), 0);
            assert_eq!(end.date_naive(), NaiveDate::from_ymd_opt(2024, 3, 14).unwrap());
            assert_eq!((end.hour(), end.minute(), end.second()), (23, 59, 59));
            assert_eq!(end.timestamp_subsec_millis(), 999);
        }
    }

    #[test]
    fn test_yesterday_across_month_boundary() {
        let tz = shanghai();
        let now = at(&tz, 2024, 3, 1, 8, 0);
        let window = Preset::Yesterday.resolve(&now);
        assert_eq!(
            window.start.with_timezone(&tz).date_naive(),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
    }

    #[test]
    fn test_custom_resolves_unchanged() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        let range = TimeRange::Custom { start, end };
        let now = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(range.resolve(&now), TimeWindow { start, end });
    }

    #[test]
    fn test_from_tag() {
        assert_eq!(Preset::from_tag("7d"), Some(Preset::Last7Days));
        assert_eq!(Preset::from_tag("yesterday"), Some(Preset::Yesterday));
        assert_eq!(Preset::from_tag("90d"), None);
        assert_eq!(Preset::from_tag("custom"), None);
    }

    #[test]
    fn test_day_range_spans_local_day() {
        let tz = shanghai();
        let day = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let TimeRange::Custom { start, end } = day_range(day, &tz) else {
            panic!("expected custom range");
        };
        let start = start.with_timezone(&tz);
        let end = end.with_timezone(&tz);
        assert_eq!(start.date_naive(), day);
        assert_eq!((start.hour(), start.minute(), start.second()), (0, 0, 0));
        assert_eq!(end.date_naive(), day);
        assert_eq!((end.hour(), end.minute(), end.second()), (23, 59, 59));
    }

    #[test]
    fn test_draft_click_day_switches_to_custom() {
        let tz = shanghai();
        let now = at(&tz, 2024, 3, 15, 10, 0);
        let mut draft = RangeDraft::open(&TimeRange::Preset(Preset::Last7Days), &now);
        assert_eq!(draft.selected_preset(), Some(Preset::Last7Days));

        let day = NaiveDate::from_ymd_opt(2024, 3, 12).unwrap();
        draft.click_day(day, &tz);
        assert!(draft.is_custom());
        assert!(draft.covers_day(day, &tz));
        assert!(!draft.covers_day(NaiveDate::from_ymd_opt(2024, 3, 13).unwrap(), &tz));
        assert_eq!(draft.apply(), Some(day_range(day, &tz)));
    }

    #[test]
    fn test_draft_manual_edit_forces_custom_and_keeps_bounds() {
        let now = Utc.with_ymd_and_hms(2024, 3, 15, 10, 0, 0).unwrap();
        let mut draft = RangeDraft::open(&TimeRange::Preset(Preset::Last24Hours), &now);
        let preset_window = Preset::Last24Hours.resolve(&now);
        let new_start = Utc.with_ymd_and_hms(2024, 3, 14, 0, 0, 0).unwrap();

        draft.edit_start(Some(new_start));
        assert!(draft.is_custom());
        assert_eq!(
            draft.apply(),
            Some(TimeRange::Custom {
                start: new_start,
                end: preset_window.end
            })
        );

        // picking a preset afterwards is explicit, never automatic
        draft.pick_preset(Preset::LastHour, &now);
        assert_eq!(draft.apply(), Some(TimeRange::Preset(Preset::LastHour)));
    }

    #[test]
    fn test_draft_custom_needs_both_bounds() {
        let now = Utc.with_ymd_and_hms(2024, 3, 15, 10, 0, 0).unwrap();
        let mut draft = RangeDraft::open(&TimeRange::default(), &now);
        draft.edit_end(None);
        assert_eq!(draft.apply(), None);
    }

    #[test]
    fn test_label() {
        let tz = shanghai();
        assert_eq!(TimeRange::Preset(Preset::Yesterday).label(&tz), "Yesterday");
        let range = day_range(NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(), &tz);
        assert_eq!(range.label(&tz), "3/5 0:00 - 3/5 23:59");
    }

    #[test]
    fn test_serde_roundtrip_keeps_custom_bounds() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 1, 1, 23, 59, 59).unwrap();
        let range = TimeRange::Custom { start, end };
        let json = serde_json::to_string(&range).unwrap();
        assert_eq!(serde_json::from_str::<TimeRange>(&json).unwrap(), range);

        let preset = serde_json::to_value(TimeRange::Preset(Preset::Last24Hours)).unwrap();
        assert_eq!(preset["kind"], "preset");
        assert_eq!(preset["value"], "24h");
    }

    #[test]
    fn test_calendar_month() {
        // March 2024 starts on a Friday
        let month = CalendarMonth::containing(NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
        assert_eq!(month.leading_blanks, 5);
        assert_eq!(month.days, 31);
        assert_eq!(month.first_weekday(), Weekday::Fri);

        let feb = CalendarMonth::containing(NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        assert_eq!(feb.days, 29);
        let dec = CalendarMonth::containing(NaiveDate::from_ymd_opt(2023, 12, 31).unwrap());
        assert_eq!(dec.days, 31);
    }
}
