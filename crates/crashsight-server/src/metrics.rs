use crashsight_core::types::NoteAction;
use metrics::{counter, gauge};

pub fn record_filter_apply(visible: usize) {
    counter!("filter_apply_total").increment(1);
    gauge!("visible_issues").set(visible as f64);
}

pub fn record_note(action: NoteAction) {
    match action {
        NoteAction::Closed => counter!("issues_closed_total").increment(1),
        NoteAction::Note => counter!("notes_added_total").increment(1),
    }
}

pub fn record_export() {
    counter!("exports_total").increment(1);
}
