//! Typed error hierarchy for storytag.
//!
//! Four enums cover the subsystems:
//! - `ConfigError` — settings that are missing, malformed or contradictory
//! - `TrackerError` — Pivotal Tracker transport and response failures
//! - `RecognitionError` — per-story classification failures (never fatal)
//! - `TagError` — anything that aborts a whole tagging pass

use thiserror::Error;

/// Errors from loading and validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required settings: please set {}", .names.join(", "))]
    Missing { names: Vec<String> },

    #[error(
        "Both a story prefix and categories are configured; set PIVOTAL_TRACKER_STORY_PREFIX \
         or PIVOTAL_TRACKER_CATEGORIES, not both"
    )]
    ConflictingScheme,

    #[error("Invalid category mapping '{entry}': expected CODE=label")]
    InvalidCategory { entry: String },

    #[error("Invalid value for {name}: {message}")]
    InvalidValue { name: String, message: String },

    #[error("Failed to read config file at {path}: {source}")]
    ReadFailed {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    ParseFailed {
        path: std::path::PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Errors from talking to the Pivotal Tracker API.
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("Request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Pivotal Tracker rejected the API token (HTTP {status})")]
    Unauthorized { status: u16 },

    #[error("Pivotal Tracker returned HTTP {status} for {url}: {body}")]
    Status { url: String, status: u16, body: String },

    #[error("Malformed response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

impl TrackerError {
    /// Whether the error means no further request can succeed in this run.
    ///
    /// Rejected credentials and an unreachable service abort the pass;
    /// everything else is scoped to the single request that failed.
    pub fn is_fatal(&self) -> bool {
        match self {
            TrackerError::Unauthorized { .. } => true,
            TrackerError::Request { source, .. } => source.is_connect() || source.is_builder(),
            TrackerError::Status { .. } | TrackerError::Decode { .. } => false,
        }
    }

    /// Whether the server answered and refused the request, so nothing was applied.
    pub fn was_refused(&self) -> bool {
        matches!(
            self,
            TrackerError::Unauthorized { .. } | TrackerError::Status { .. }
        )
    }
}

/// Reasons a single story cannot take part in identifier assignment.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecognitionError {
    #[error("no label matches a configured category (labels: [{}])", .labels.join(", "))]
    UnmatchedLabel { labels: Vec<String> },

    #[error("identifier number '{digits}' is too large")]
    NumericOverflow { digits: String },

    #[error("no identifiers left in category {category}")]
    SequenceExhausted { category: String },
}

/// Errors that abort a tagging pass.
#[derive(Debug, Error)]
pub enum TagError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to fetch stories: {0}")]
    Fetch(#[source] TrackerError),

    #[error("Failed to update story {story_id}: {source}")]
    Update {
        story_id: u64,
        #[source]
        source: TrackerError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_config_lists_every_name() {
        let err = ConfigError::Missing {
            names: vec![
                "PIVOTAL_TRACKER_PROJECT_ID".to_string(),
                "PIVOTAL_TRACKER_API_TOKEN".to_string(),
            ],
        };
        let msg = err.to_string();
        assert!(msg.contains("PIVOTAL_TRACKER_PROJECT_ID"));
        assert!(msg.contains("PIVOTAL_TRACKER_API_TOKEN"));
    }

    #[test]
    fn unauthorized_is_fatal() {
        assert!(TrackerError::Unauthorized { status: 401 }.is_fatal());
    }

    #[test]
    fn status_error_is_not_fatal() {
        let err = TrackerError::Status {
            url: "http://localhost/stories/1".to_string(),
            status: 500,
            body: "boom".to_string(),
        };
        assert!(!err.is_fatal());
        assert!(err.was_refused());
        assert!(err.to_string().contains("500"));
    }

    #[test]
    fn decode_error_is_not_a_refusal() {
        let err = TrackerError::Decode {
            url: "http://localhost/stories/1".to_string(),
            source: serde_json::from_str::<u8>("x").unwrap_err(),
        };
        assert!(!err.was_refused());
        assert!(!err.is_fatal());
    }

    #[test]
    fn unmatched_label_names_labels() {
        let err = RecognitionError::UnmatchedLabel {
            labels: vec!["design".to_string(), "ux".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "no label matches a configured category (labels: [design, ux])"
        );
    }

    #[test]
    fn tag_error_converts_from_config_error() {
        let err: TagError = ConfigError::ConflictingScheme.into();
        assert!(matches!(err, TagError::Config(ConfigError::ConflictingScheme)));
    }

    #[test]
    fn all_error_types_implement_std_error_trait() {
        fn assert_std_error<E: std::error::Error>(_: &E) {}
        assert_std_error(&ConfigError::ConflictingScheme);
        assert_std_error(&TrackerError::Unauthorized { status: 403 });
        assert_std_error(&RecognitionError::NumericOverflow {
            digits: "9".repeat(30),
        });
        assert_std_error(&TagError::Config(ConfigError::ConflictingScheme));
    }
}
