use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A Pivotal Tracker label attached to a story (subset of fields we care about).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    #[serde(default)]
    pub id: Option<u64>,
    pub name: String,
}

impl Label {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
        }
    }
}

/// A Pivotal Tracker story (subset of fields).
///
/// Only `id`, `name`, `created_at` and `labels` take part in tagging; the
/// descriptive fields are carried so reports can link back to the story.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Story {
    pub id: u64,
    pub name: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub labels: Vec<Label>,
    #[serde(default)]
    pub estimate: Option<f64>,
    #[serde(default)]
    pub story_type: Option<String>,
    #[serde(default)]
    pub current_state: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

impl Story {
    /// Build a bare story, mostly useful for tests and fakes.
    pub fn new(id: u64, name: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            name: name.into(),
            created_at,
            labels: Vec::new(),
            estimate: None,
            story_type: None,
            current_state: None,
            description: None,
            url: None,
        }
    }

    pub fn with_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.labels = labels.into_iter().map(Label::new).collect();
        self
    }

    pub fn label_names(&self) -> Vec<String> {
        self.labels.iter().map(|l| l.name.clone()).collect()
    }
}

/// Body of the `PUT /projects/{id}/stories/{id}` request.
#[derive(Debug, Serialize)]
pub struct StoryNameUpdate<'a> {
    pub name: &'a str,
}
