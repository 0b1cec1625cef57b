//! Derived values behind the issue detail view.

use crate::types::{CrashEvent, CrashGroup, CrashVariant};
use serde::{Deserialize, Serialize};

/// Which variants the detail view is looking at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariantFocus {
    #[default]
    All,
    Variant(usize),
}

impl VariantFocus {
    /// Out-of-range indexes fall back to `All`.
    pub fn from_index(issue: &CrashGroup, index: Option<usize>) -> Self {
        match index {
            Some(i) if i < issue.variants.len() => VariantFocus::Variant(i),
            _ => VariantFocus::All,
        }
    }

    pub fn variants<'a>(&self, issue: &'a CrashGroup) -> &'a [CrashVariant] {
        match *self {
            VariantFocus::All => &issue.variants,
            VariantFocus::Variant(i) => issue.variants.get(i..=i).unwrap_or(&[]),
        }
    }

    pub fn title(&self) -> String {
        match self {
            VariantFocus::All => "All Events".to_string(),
            VariantFocus::Variant(i) => format!("Exception #{}", i + 1),
        }
    }
}

/// Events of the focused variants, newest first. Equal timestamps keep
/// variant order.
pub fn visible_events<'a>(issue: &'a CrashGroup, focus: VariantFocus) -> Vec<&'a CrashEvent> {
    let mut events: Vec<&CrashEvent> = focus
        .variants(issue)
        .iter()
        .flat_map(|v| v.events.iter())
        .collect();
    events.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    events
}

pub fn affected_users(issue: &CrashGroup, focus: VariantFocus) -> u64 {
    match focus {
        VariantFocus::All => issue.affected_users,
        VariantFocus::Variant(i) => issue.variants.get(i).map(|v| v.affected_users).unwrap_or(0),
    }
}

/// Each variant's count as a percentage of the largest count.
pub fn variant_shares(issue: &CrashGroup) -> Vec<f64> {
    let max = issue.variants.iter().map(|v| v.count).max().unwrap_or(0);
    issue
        .variants
        .iter()
        .map(|v| {
            if max == 0 {
                0.0
            } else {
                v.count as f64 * 100.0 / max as f64
            }
        })
        .collect()
}

/// Position in the visible event list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventCursor {
    index: usize,
    len: usize,
}

impl EventCursor {
    pub fn new(len: usize) -> Self {
        Self { index: 0, len }
    }

    pub fn for_focus(issue: &CrashGroup, focus: VariantFocus) -> Self {
        Self::new(visible_events(issue, focus).len())
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn next(&mut self) {
        if self.index + 1 < self.len {
            self.index += 1;
        }
    }

    pub fn prev(&mut self) {
        self.index = self.index.saturating_sub(1);
    }

    /// Jumps to `index`, clamped to the last event.
    pub fn seek(&mut self, index: usize) {
        self.index = index.min(self.len.saturating_sub(1));
    }

    pub fn current<'a>(&self, events: &[&'a CrashEvent]) -> Option<&'a CrashEvent> {
        events.get(self.index).copied()
    }

    /// One-based "i / n", or "0 / 0" without events.
    pub fn position(&self) -> String {
        if self.len == 0 {
            "0 / 0".to_string()
        } else {
            format!("{} / {}", self.index + 1, self.len)
        }
    }
}
