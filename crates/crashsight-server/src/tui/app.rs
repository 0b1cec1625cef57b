use crate::tui::keys::{InputMode, TuiAction};
use chrono::{DateTime, Duration as ChronoDuration, Local, NaiveDate, Utc};
use crashsight_core::dashboard::Dashboard;
use crashsight_core::detail::{EventCursor, VariantFocus};
use crashsight_core::time_range::{day_range, Preset, RangeDraft, TimeRange};
use crashsight_core::version_tree::{SelectionDraft, VersionTree};
use crashsight_core::workflow::NoteDraft;
use std::time::{Duration, Instant};

pub const NOTIFICATION_TTL: Duration = Duration::from_secs(3);
pub const NOTES_DISMISS_DELAY: Duration = Duration::from_millis(300);

/// Row index of the "Custom" entry after the presets.
pub const CUSTOM_ROW: usize = Preset::ALL.len();

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    List,
    Detail,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickerColumn {
    Versions,
    Builds,
}

#[derive(Debug, Clone)]
pub struct VersionPicker {
    pub draft: SelectionDraft,
    pub column: PickerColumn,
    pub version_index: usize,
    pub build_index: usize,
}

impl VersionPicker {
    fn current_builds<'a>(&self, tree: &'a VersionTree) -> Vec<&'a str> {
        tree.versions()
            .get(self.version_index)
            .map(|v| tree.builds_of(&v.version_name))
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeFocus {
    Presets,
    Calendar,
}

#[derive(Debug, Clone)]
pub struct TimePicker {
    pub draft: RangeDraft,
    pub focus: TimeFocus,
    pub preset_index: usize,
    pub day: NaiveDate,
}

impl TimePicker {
    pub fn open(committed: &TimeRange, now: &DateTime<Local>) -> Self {
        let preset_index = match committed {
            TimeRange::Preset(p) => Preset::ALL.iter().position(|x| x == p).unwrap_or(0),
            TimeRange::Custom { .. } => CUSTOM_ROW,
        };
        Self {
            draft: RangeDraft::open(committed, now),
            focus: TimeFocus::Presets,
            preset_index,
            day: now.date_naive(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteKind {
    Close,
    Note,
}

#[derive(Debug, Clone)]
pub struct NoteModal {
    pub kind: NoteKind,
    pub issue_id: String,
    pub text: String,
}

#[derive(Debug, Clone)]
pub enum Overlay {
    None,
    Help,
    Versions(VersionPicker),
    Time(TimePicker),
    Note(NoteModal),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub message: String,
    pub success: bool,
    pub at: Instant,
}

/// What the event loop has to do after an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Continue,
    Quit,
    Export(String),
}

pub struct TuiApp {
    pub screen: Screen,
    pub overlay: Overlay,
    pub searching: bool,
    pub selected_row: usize,
    pub focus: VariantFocus,
    pub cursor: EventCursor,
    pub notes_pinned: bool,
    pub notes_hide_at: Option<Instant>,
    pub notification: Option<Notification>,
}

impl Default for TuiApp {
    fn default() -> Self {
        Self::new()
    }
}

impl TuiApp {
    pub fn new() -> Self {
        Self {
            screen: Screen::List,
            overlay: Overlay::None,
            searching: false,
            selected_row: 0,
            focus: VariantFocus::All,
            cursor: EventCursor::default(),
            notes_pinned: false,
            notes_hide_at: None,
            notification: None,
        }
    }

    pub fn input_mode(&self) -> InputMode {
        if self.searching || matches!(self.overlay, Overlay::Note(_)) {
            InputMode::Text
        } else {
            InputMode::Normal
        }
    }

    pub fn notify(&mut self, message: impl Into<String>, success: bool) {
        self.notification = Some(Notification {
            message: message.into(),
            success,
            at: Instant::now(),
        });
    }

    pub fn notes_visible(&self, tick: Instant) -> bool {
        self.notes_pinned || self.notes_hide_at.map_or(false, |at| tick < at)
    }

    /// Drops the notification and the notes panel once their time is up.
    pub fn expire(&mut self, tick: Instant) {
        if let Some(n) = &self.notification {
            if tick.duration_since(n.at) >= NOTIFICATION_TTL {
                self.notification = None;
            }
        }
        if matches!(self.notes_hide_at, Some(at) if tick >= at) {
            self.notes_hide_at = None;
        }
    }

    pub fn handle_action(
        &mut self,
        action: TuiAction,
        dashboard: &mut Dashboard,
        now: DateTime<Local>,
        tick: Instant,
    ) -> Outcome {
        match std::mem::replace(&mut self.overlay, Overlay::None) {
            Overlay::Help => {
                if !matches!(action, TuiAction::ToggleHelp | TuiAction::Back) {
                    self.overlay = Overlay::Help;
                }
                return if action == TuiAction::Quit {
                    Outcome::Quit
                } else {
                    Outcome::Continue
                };
            }
            Overlay::Versions(picker) => {
                self.overlay = self.on_version_picker(picker, action, dashboard, &now);
                return Outcome::Continue;
            }
            Overlay::Time(picker) => {
                self.overlay = self.on_time_picker(picker, action, dashboard, &now);
                return Outcome::Continue;
            }
            Overlay::Note(modal) => {
                self.overlay = self.on_note(modal, action, dashboard);
                return Outcome::Continue;
            }
            Overlay::None => {}
        }

        if self.searching {
            self.on_search(action, dashboard, &now);
            return Outcome::Continue;
        }

        match self.screen {
            Screen::List => self.on_list(action, dashboard, &now),
            Screen::Detail => self.on_detail(action, dashboard, tick),
        }
    }

    fn after_filter_change(&mut self, dashboard: &Dashboard, now: &DateTime<Local>) {
        let visible = dashboard.visible(now).len();
        crate::metrics::record_filter_apply(visible);
        self.selected_row = self.selected_row.min(visible.saturating_sub(1));
    }

    fn on_list(&mut self, action: TuiAction, dashboard: &mut Dashboard, now: &DateTime<Local>) -> Outcome {
        let selected_id = dashboard
            .visible(now)
            .get(self.selected_row)
            .map(|g| g.id.clone());
        let visible = dashboard.visible(now).len();

        match action {
            TuiAction::Quit => return Outcome::Quit,
            TuiAction::Up => self.selected_row = self.selected_row.saturating_sub(1),
            TuiAction::Down => {
                if self.selected_row + 1 < visible {
                    self.selected_row += 1;
                }
            }
            TuiAction::Confirm => {
                if let Some(id) = selected_id {
                    self.open_detail(&id, dashboard);
                }
            }
            TuiAction::Search => self.searching = true,
            TuiAction::OpenVersions => {
                self.overlay = Overlay::Versions(VersionPicker {
                    draft: dashboard.open_selection(),
                    column: PickerColumn::Versions,
                    version_index: 0,
                    build_index: 0,
                });
            }
            TuiAction::OpenTime => {
                self.overlay = Overlay::Time(TimePicker::open(&dashboard.filter().time_range, now));
            }
            TuiAction::Clear => {
                let mut draft = dashboard.open_selection();
                draft.clear();
                dashboard.commit_builds(draft);
                dashboard.set_search("");
                self.after_filter_change(dashboard, now);
            }
            TuiAction::Export => {
                if let Some(id) = selected_id {
                    return Outcome::Export(id);
                }
            }
            TuiAction::ToggleHelp => self.overlay = Overlay::Help,
            _ => {}
        }
        Outcome::Continue
    }

    fn open_detail(&mut self, id: &str, dashboard: &mut Dashboard) {
        if !dashboard.select(Some(id)) {
            return;
        }
        self.screen = Screen::Detail;
        self.set_focus(VariantFocus::All, dashboard);
        self.notes_pinned = false;
        self.notes_hide_at = None;
    }

    fn set_focus(&mut self, focus: VariantFocus, dashboard: &Dashboard) {
        self.focus = focus;
        self.cursor = dashboard
            .selected_issue()
            .map(|issue| EventCursor::for_focus(issue, focus))
            .unwrap_or_default();
    }

    fn on_detail(&mut self, action: TuiAction, dashboard: &mut Dashboard, tick: Instant) -> Outcome {
        let Some(issue) = dashboard.selected_issue() else {
            self.screen = Screen::List;
            return Outcome::Continue;
        };
        let id = issue.id.clone();
        let closed = issue.is_closed();
        let variants = issue.variants.len();

        match action {
            TuiAction::Quit => return Outcome::Quit,
            TuiAction::Back => {
                dashboard.select(None);
                self.screen = Screen::List;
            }
            TuiAction::Down | TuiAction::NextPane => {
                let next = match self.focus {
                    VariantFocus::All if variants > 0 => VariantFocus::Variant(0),
                    VariantFocus::Variant(i) if i + 1 < variants => VariantFocus::Variant(i + 1),
                    _ => VariantFocus::All,
                };
                self.set_focus(next, dashboard);
            }
            TuiAction::Up => {
                let prev = match self.focus {
                    VariantFocus::All if variants > 0 => VariantFocus::Variant(variants - 1),
                    VariantFocus::Variant(i) if i > 0 => VariantFocus::Variant(i - 1),
                    _ => VariantFocus::All,
                };
                self.set_focus(prev, dashboard);
            }
            TuiAction::Left => self.cursor.prev(),
            TuiAction::Right => self.cursor.next(),
            TuiAction::CloseIssue => {
                if closed {
                    self.notify("Issue is already closed", false);
                } else {
                    self.overlay = Overlay::Note(NoteModal {
                        kind: NoteKind::Close,
                        issue_id: id,
                        text: String::new(),
                    });
                }
            }
            TuiAction::AddNote => {
                self.overlay = Overlay::Note(NoteModal {
                    kind: NoteKind::Note,
                    issue_id: id,
                    text: String::new(),
                });
            }
            TuiAction::ToggleNotes => {
                if self.notes_pinned {
                    self.notes_pinned = false;
                    self.notes_hide_at = Some(tick + NOTES_DISMISS_DELAY);
                } else {
                    self.notes_pinned = true;
                    self.notes_hide_at = None;
                }
            }
            TuiAction::Export => return Outcome::Export(id),
            TuiAction::ToggleHelp => self.overlay = Overlay::Help,
            _ => {}
        }
        Outcome::Continue
    }

    fn on_search(&mut self, action: TuiAction, dashboard: &mut Dashboard, now: &DateTime<Local>) {
        let mut search = dashboard.filter().search.clone();
        match action {
            TuiAction::Input(c) => search.push(c),
            TuiAction::Backspace => {
                search.pop();
            }
            TuiAction::Confirm | TuiAction::Back => {
                self.searching = false;
                return;
            }
            _ => return,
        }
        dashboard.set_search(search);
        self.after_filter_change(dashboard, now);
    }

    fn on_version_picker(
        &mut self,
        mut picker: VersionPicker,
        action: TuiAction,
        dashboard: &mut Dashboard,
        now: &DateTime<Local>,
    ) -> Overlay {
        let tree = dashboard.versions();
        let version_count = tree.versions().len();
        let builds = picker.current_builds(tree);

        match (action, picker.column) {
            (TuiAction::Back | TuiAction::Quit, _) => return Overlay::None,
            (TuiAction::Confirm | TuiAction::Apply, _) => {
                dashboard.commit_builds(picker.draft);
                self.after_filter_change(dashboard, now);
                return Overlay::None;
            }
            (TuiAction::Up, PickerColumn::Versions) => {
                picker.version_index = picker.version_index.saturating_sub(1);
                picker.build_index = 0;
            }
            (TuiAction::Down, PickerColumn::Versions) => {
                if picker.version_index + 1 < version_count {
                    picker.version_index += 1;
                    picker.build_index = 0;
                }
            }
            (TuiAction::Up, PickerColumn::Builds) => {
                picker.build_index = picker.build_index.saturating_sub(1);
            }
            (TuiAction::Down, PickerColumn::Builds) => {
                if picker.build_index + 1 < builds.len() {
                    picker.build_index += 1;
                }
            }
            (TuiAction::Right | TuiAction::NextPane, PickerColumn::Versions) => {
                if !builds.is_empty() {
                    picker.column = PickerColumn::Builds;
                }
            }
            (TuiAction::Left | TuiAction::NextPane, PickerColumn::Builds) => {
                picker.column = PickerColumn::Versions;
            }
            (TuiAction::Toggle, PickerColumn::Versions) => {
                if let Some(v) = tree.versions().get(picker.version_index) {
                    let name = v.version_name.clone();
                    picker.draft.toggle_version(tree, &name);
                }
            }
            (TuiAction::Toggle, PickerColumn::Builds) => {
                if let Some(build) = builds.get(picker.build_index) {
                    picker.draft.toggle_build(build);
                }
            }
            (TuiAction::Clear, _) => picker.draft.clear(),
            _ => {}
        }
        Overlay::Versions(picker)
    }

    fn on_time_picker(
        &mut self,
        mut picker: TimePicker,
        action: TuiAction,
        dashboard: &mut Dashboard,
        now: &DateTime<Local>,
    ) -> Overlay {
        match (action, picker.focus) {
            (TuiAction::Back | TuiAction::Quit, _) => return Overlay::None,
            (TuiAction::Confirm | TuiAction::Apply, _) => match picker.draft.apply() {
                Some(range) => {
                    dashboard.set_time_range(range);
                    self.after_filter_change(dashboard, now);
                    return Overlay::None;
                }
                None => self.notify("Custom range needs a start and an end", false),
            },
            (TuiAction::NextPane, TimeFocus::Presets) => picker.focus = TimeFocus::Calendar,
            (TuiAction::NextPane, TimeFocus::Calendar) => picker.focus = TimeFocus::Presets,
            (TuiAction::Up, TimeFocus::Presets) => {
                picker.preset_index = picker.preset_index.saturating_sub(1);
            }
            (TuiAction::Down, TimeFocus::Presets) => {
                picker.preset_index = (picker.preset_index + 1).min(CUSTOM_ROW);
            }
            (TuiAction::Toggle, TimeFocus::Presets) => match Preset::ALL.get(picker.preset_index) {
                Some(preset) => picker.draft.pick_preset(*preset, now),
                None => picker.draft.pick_custom(),
            },
            (TuiAction::Left, TimeFocus::Calendar) => picker.day = shift_day(picker.day, -1),
            (TuiAction::Right, TimeFocus::Calendar) => picker.day = shift_day(picker.day, 1),
            (TuiAction::Up, TimeFocus::Calendar) => picker.day = shift_day(picker.day, -7),
            (TuiAction::Down, TimeFocus::Calendar) => picker.day = shift_day(picker.day, 7),
            (TuiAction::Toggle, TimeFocus::Calendar) => {
                picker.draft.click_day(picker.day, &Local);
                picker.preset_index = CUSTOM_ROW;
            }
            (TuiAction::MarkStart, _) => {
                if let TimeRange::Custom { start, .. } = day_range(picker.day, &Local) {
                    picker.draft.edit_start(Some(start));
                    picker.preset_index = CUSTOM_ROW;
                }
            }
            (TuiAction::MarkEnd, _) => {
                if let TimeRange::Custom { end, .. } = day_range(picker.day, &Local) {
                    picker.draft.edit_end(Some(end));
                    picker.preset_index = CUSTOM_ROW;
                }
            }
            _ => {}
        }
        Overlay::Time(picker)
    }

    fn on_note(&mut self, mut modal: NoteModal, action: TuiAction, dashboard: &mut Dashboard) -> Overlay {
        match action {
            TuiAction::Input(c) => modal.text.push(c),
            TuiAction::Backspace => {
                modal.text.pop();
            }
            TuiAction::Back => return Overlay::None,
            TuiAction::Confirm => {
                let Ok(draft) = NoteDraft::new(modal.text.clone()) else {
                    self.notify("Note cannot be empty", false);
                    return Overlay::Note(modal);
                };
                let result = match modal.kind {
                    NoteKind::Close => dashboard.close_issue(&modal.issue_id, draft, Utc::now()),
                    NoteKind::Note => dashboard.annotate(&modal.issue_id, draft, Utc::now()),
                };
                match result {
                    Ok(note) => {
                        crate::metrics::record_note(note.action);
                        let message = match modal.kind {
                            NoteKind::Close => "Issue closed",
                            NoteKind::Note => "Note added",
                        };
                        self.notify(message, true);
                    }
                    Err(e) => self.notify(e.to_string(), false),
                }
                return Overlay::None;
            }
            _ => {}
        }
        Overlay::Note(modal)
    }
}

fn shift_day(day: NaiveDate, days: i64) -> NaiveDate {
    day.checked_add_signed(ChronoDuration::days(days)).unwrap_or(day)
}
