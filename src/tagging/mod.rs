//! Identifier assignment.
//!
//! | Module       | Role                                             |
//! |--------------|--------------------------------------------------|
//! | `ordering`   | deterministic processing order                   |
//! | `recognizer` | decides whether a story already has an identifier |
//! | `allocator`  | per-category high-water marks                    |
//! | `composer`   | builds the new title                             |
//! | `driver`     | runs a pass and builds the `PassReport`          |

pub mod allocator;
pub mod composer;
pub mod driver;
pub mod ordering;
pub mod recognizer;
pub mod report;
pub mod types;

pub use allocator::SequenceAllocator;
pub use composer::compose_title;
pub use driver::{DEFAULT_MAX_PAGES, DEFAULT_PAGE_SIZE, PassOptions, Tagger};
pub use ordering::order_stories;
pub use recognizer::{Classification, Recognizer};
pub use report::{FailedUpdate, PassReport, SkippedStory, TaggedStory};
pub use types::{Category, CategoryDef, Identifier, TaggingScheme};
