use crate::error::{CrashSightError, Result};
use crate::types::IssueStatus;

impl IssueStatus {
    /// `CLOSED` is terminal and reachable from every other state.
    pub fn can_transition_to(&self, next: IssueStatus) -> bool {
        match (self, next) {
            (IssueStatus::Closed, _) => false,
            (_, IssueStatus::Closed) => true,
            _ => false,
        }
    }
}

/// Note content that passed the non-blank check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteDraft {
    content: String,
}

impl NoteDraft {
    pub fn new(content: impl Into<String>) -> Result<Self> {
        let content = content.into();
        if content.trim().is_empty() {
            return Err(CrashSightError::EmptyNote);
        }
        Ok(Self { content })
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn into_content(self) -> String {
        self.content
    }
}
