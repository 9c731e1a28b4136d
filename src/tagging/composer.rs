use super::types::{Category, TaggingScheme};

/// Build the title for a newly tagged story.
///
/// Prefix schemes produce `PROJ6 - Title`, categorized schemes `API-1: Title`.
/// The original title is embedded as-is.
pub fn compose_title(scheme: &TaggingScheme, category: &Category, number: u64, title: &str) -> String {
    match (scheme, category) {
        (_, Category::Code(code)) => format!("{}-{}: {}", code, number, title),
        (TaggingScheme::Prefix(prefix), Category::Implicit) => {
            format!("{}{} - {}", prefix, number, title)
        }
        // Implicit category without a prefix never comes out of the recognizer.
        (TaggingScheme::Categorized(_), Category::Implicit) => format!("{} - {}", number, title),
    }
}
