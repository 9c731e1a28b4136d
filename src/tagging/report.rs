use serde::Serialize;

use super::types::Identifier;

/// A story that received a new identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaggedStory {
    pub story_id: u64,
    pub identifier: Identifier,
    pub old_title: String,
    pub new_title: String,
}

/// A story left untouched because it could not be classified or numbered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedStory {
    pub story_id: u64,
    pub title: String,
    pub reason: String,
}

/// A story whose title update was refused by the tracker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedUpdate {
    pub story_id: u64,
    pub new_title: String,
    pub error: String,
}

/// Result of one tagging pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PassReport {
    /// Every story fetched.
    pub examined: usize,
    /// Stories whose title already carried an identifier.
    pub already_tagged: usize,
    pub tagged: Vec<TaggedStory>,
    pub skipped: Vec<SkippedStory>,
    pub failed: Vec<FailedUpdate>,
    /// No updates were sent; `tagged` lists what would have changed.
    pub dry_run: bool,
}

impl PassReport {
    pub fn tagged_count(&self) -> usize {
        self.tagged.len()
    }

    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }

    pub fn summary_line(&self) -> String {
        let verb = if self.dry_run { "Would tag" } else { "Tagged" };
        format!(
            "{} {} new stories out of {} total.",
            verb,
            self.tagged_count(),
            self.examined
        )
    }
}
