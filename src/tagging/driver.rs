//! The tagging pass.
//!
//! Runs in two phases over the ordered stories:
//! 1. classify every story and observe every existing identifier,
//! 2. allocate, compose and persist a title for each untagged story.
//!
//! Observing everything first means a new number always exceeds every
//! existing number in its category, whatever order the stories were created in.

use std::collections::HashSet;

use super::allocator::SequenceAllocator;
use super::composer::compose_title;
use super::ordering::order_stories;
use super::recognizer::{Classification, Recognizer};
use super::report::{FailedUpdate, PassReport, SkippedStory, TaggedStory};
use super::types::{Identifier, TaggingScheme};
use crate::errors::{ConfigError, TagError};
use crate::tracker::{Story, StoryRepository, fetch_all_stories};

pub const DEFAULT_PAGE_SIZE: u32 = 500;
pub const DEFAULT_MAX_PAGES: u32 = 2;

/// Knobs for a single pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassOptions {
    pub page_size: u32,
    pub max_pages: u32,
    /// Compute new titles without sending updates.
    pub dry_run: bool,
}

impl Default for PassOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            max_pages: DEFAULT_MAX_PAGES,
            dry_run: false,
        }
    }
}

/// Drives one fetch-classify-allocate-update pass over a project.
pub struct Tagger<'a> {
    repo: &'a dyn StoryRepository,
    scheme: TaggingScheme,
    recognizer: Recognizer,
    options: PassOptions,
}

impl<'a> Tagger<'a> {
    pub fn new(
        repo: &'a dyn StoryRepository,
        scheme: TaggingScheme,
        options: PassOptions,
    ) -> Result<Self, ConfigError> {
        let recognizer = Recognizer::new(&scheme)?;
        Ok(Self {
            repo,
            scheme,
            recognizer,
            options,
        })
    }

    /// Fetch every story and tag the untagged ones.
    pub async fn run(&self) -> Result<PassReport, TagError> {
        let stories = fetch_all_stories(self.repo, self.options.page_size, self.options.max_pages)
            .await
            .map_err(TagError::Fetch)?;
        self.tag_stories(stories).await
    }

    /// Tag an already-fetched set of stories.
    pub async fn tag_stories(&self, mut stories: Vec<Story>) -> Result<PassReport, TagError> {
        order_stories(&mut stories);
        tracing::info!(count = stories.len(), "Number of stories found");

        let mut report = PassReport {
            examined: stories.len(),
            dry_run: self.options.dry_run,
            ..Default::default()
        };

        let classified: Vec<(Story, Classification)> = stories
            .into_iter()
            .map(|story| {
                let outcome = self.recognizer.classify(&story);
                (story, outcome)
            })
            .collect();

        let mut allocator = SequenceAllocator::new();
        let mut seen: HashSet<&Identifier> = HashSet::new();
        for (story, outcome) in &classified {
            if let Classification::Tagged(id) = outcome {
                allocator.observe(&id.category, id.number);
                if !seen.insert(id) {
                    tracing::warn!(
                        story_id = story.id,
                        category = %id.category,
                        number = id.number,
                        "Identifier is used by more than one story"
                    );
                }
                tracing::debug!(story_id = story.id, title = %story.name, "Skipping story with existing ID");
                report.already_tagged += 1;
            }
        }

        for (story, outcome) in &classified {
            let category = match outcome {
                Classification::Tagged(_) => continue,
                Classification::Rejected(reason) => {
                    tracing::warn!(story_id = story.id, title = %story.name, %reason, "Skipping story");
                    report.skipped.push(SkippedStory {
                        story_id: story.id,
                        title: story.name.clone(),
                        reason: reason.to_string(),
                    });
                    continue;
                }
                Classification::Untagged(category) => category,
            };

            let number = match allocator.allocate(category) {
                Ok(n) => n,
                Err(reason) => {
                    tracing::warn!(story_id = story.id, %reason, "Skipping story");
                    report.skipped.push(SkippedStory {
                        story_id: story.id,
                        title: story.name.clone(),
                        reason: reason.to_string(),
                    });
                    continue;
                }
            };

            let new_title = compose_title(&self.scheme, category, number, &story.name);
            tracing::info!(story_id = story.id, title = %new_title, "Adding new ID to story");

            if !self.options.dry_run
                && let Err(source) = self.repo.update_story_title(story.id, &new_title).await
            {
                if source.is_fatal() {
                    return Err(TagError::Update {
                        story_id: story.id,
                        source,
                    });
                }
                if source.was_refused() {
                    allocator.release(category, number);
                }
                tracing::error!(story_id = story.id, error = %source, "Failed to update story");
                report.failed.push(FailedUpdate {
                    story_id: story.id,
                    new_title,
                    error: source.to_string(),
                });
                continue;
            }

            report.tagged.push(TaggedStory {
                story_id: story.id,
                identifier: Identifier::new(category.clone(), number),
                old_title: story.name.clone(),
                new_title,
            });
        }

        Ok(report)
    }
}
