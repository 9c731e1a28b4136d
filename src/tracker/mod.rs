//! Pivotal Tracker access: wire models, the `StoryRepository` seam and its
//! HTTP implementation.

pub mod client;
pub mod models;

pub use client::{
    DEFAULT_API_URL, StoryRepository, TrackerClient, TrackerSettings, fetch_all_stories,
};
pub use models::{Label, Story};
