//! Identifier recognition.
//!
//! A story is classified by an ordered list of rules. The first rule that
//! has an opinion decides; when none does, the scheme's fallback applies:
//!
//! | Rule      | Looks at | Yields                                    |
//! |-----------|----------|-------------------------------------------|
//! | `pattern` | title    | `Tagged` (or `Rejected` on digit overflow) |
//! | `label`   | labels   | `Untagged` in the label's category        |
//!
//! Fallback: prefix schemes treat the story as `Untagged` in the implicit
//! category; categorized schemes reject it with `UnmatchedLabel`.

use regex::Regex;

use super::types::{Category, CategoryDef, Identifier, TaggingScheme};
use crate::errors::{ConfigError, RecognitionError};
use crate::tracker::Story;

/// Outcome of classifying one story.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// The title already carries an identifier.
    Tagged(Identifier),
    /// No identifier yet; a new one should be allocated in this category.
    Untagged(Category),
    /// The story cannot take part in this pass.
    Rejected(RecognitionError),
}

/// A single recognition rule. `None` means the rule does not apply.
pub trait RecognitionRule: Send + Sync {
    fn name(&self) -> &'static str;
    fn evaluate(&self, story: &Story) -> Option<Classification>;
}

/// Matches an identifier at the start of the title.
pub struct PatternRule {
    regex: Regex,
    categorized: bool,
}

impl PatternRule {
    /// `[sep]PREFIX<digits><sep|end>` where sep is whitespace, `#`, `:`, `_` or `-`.
    pub fn for_prefix(prefix: &str) -> Result<Self, ConfigError> {
        let pattern = format!(
            r"^[\s#:_-]?{}(?P<number>\d+)(?:[\s#:_-]|$)",
            regex::escape(prefix)
        );
        Ok(Self {
            regex: compile(&pattern)?,
            categorized: false,
        })
    }

    /// `CODE<delim><digits>:` for any configured code, where delim is `-`, `_` or space.
    pub fn for_categories(categories: &[CategoryDef]) -> Result<Self, ConfigError> {
        if let Some(blank) = categories.iter().find(|c| c.code.trim().is_empty()) {
            return Err(ConfigError::InvalidCategory {
                entry: format!("{}={}", blank.code, blank.label),
            });
        }
        let mut codes: Vec<&str> = categories.iter().map(|c| c.code.as_str()).collect();
        // Longest first so `APIX` is never read as `API` + garbage.
        codes.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
        let alternation = codes
            .iter()
            .map(|code| regex::escape(code))
            .collect::<Vec<_>>()
            .join("|");
        let pattern = format!(r"^(?P<code>{})[-_ ](?P<number>\d+):", alternation);
        Ok(Self {
            regex: compile(&pattern)?,
            categorized: true,
        })
    }
}

fn compile(pattern: &str) -> Result<Regex, ConfigError> {
    Regex::new(pattern).map_err(|e| ConfigError::InvalidValue {
        name: "identifier pattern".to_string(),
        message: e.to_string(),
    })
}

impl RecognitionRule for PatternRule {
    fn name(&self) -> &'static str {
        "pattern"
    }

    fn evaluate(&self, story: &Story) -> Option<Classification> {
        let caps = self.regex.captures(&story.name)?;
        let digits = caps.name("number")?.as_str();
        let category = match caps.name("code") {
            Some(code) if self.categorized => Category::code(code.as_str()),
            _ => Category::Implicit,
        };

        Some(match digits.parse::<u64>() {
            Ok(number) => Classification::Tagged(Identifier::new(category, number)),
            Err(_) => Classification::Rejected(RecognitionError::NumericOverflow {
                digits: digits.to_string(),
            }),
        })
    }
}

/// Resolves a category from the first label naming one.
pub struct LabelRule {
    categories: Vec<CategoryDef>,
}

impl LabelRule {
    pub fn new(categories: &[CategoryDef]) -> Self {
        Self {
            categories: categories.to_vec(),
        }
    }
}

impl RecognitionRule for LabelRule {
    fn name(&self) -> &'static str {
        "label"
    }

    fn evaluate(&self, story: &Story) -> Option<Classification> {
        story.labels.iter().find_map(|label| {
            self.categories
                .iter()
                .find(|def| def.label == label.name)
                .map(|def| Classification::Untagged(Category::code(def.code.as_str())))
        })
    }
}

/// Classifies stories against a tagging scheme.
pub struct Recognizer {
    rules: Vec<Box<dyn RecognitionRule>>,
    categorized: bool,
}

impl Recognizer {
    pub fn new(scheme: &TaggingScheme) -> Result<Self, ConfigError> {
        let rules: Vec<Box<dyn RecognitionRule>> = match scheme {
            TaggingScheme::Prefix(prefix) => vec![Box::new(PatternRule::for_prefix(prefix)?)],
            TaggingScheme::Categorized(categories) => vec![
                Box::new(PatternRule::for_categories(categories)?),
                Box::new(LabelRule::new(categories)),
            ],
        };
        Ok(Self {
            rules,
            categorized: scheme.is_categorized(),
        })
    }

    pub fn classify(&self, story: &Story) -> Classification {
        for (idx, rule) in self.rules.iter().enumerate() {
            if let Some(outcome) = rule.evaluate(story) {
                if let Classification::Tagged(id) = &outcome {
                    self.warn_on_conflict(story, id, idx + 1);
                }
                tracing::trace!(story_id = story.id, rule = rule.name(), ?outcome, "Classified story");
                return outcome;
            }
        }

        if self.categorized {
            Classification::Rejected(RecognitionError::UnmatchedLabel {
                labels: story.label_names(),
            })
        } else {
            Classification::Untagged(Category::Implicit)
        }
    }

    /// Title identifiers always win; lower-priority rules disagreeing is only logged.
    fn warn_on_conflict(&self, story: &Story, id: &Identifier, from: usize) {
        for rule in &self.rules[from..] {
            if let Some(Classification::Untagged(other)) = rule.evaluate(story)
                && other != id.category
            {
                tracing::warn!(
                    story_id = story.id,
                    title_category = %id.category,
                    label_category = %other,
                    "Title identifier disagrees with story labels; keeping the title's"
                );
            }
        }
    }
}
