use crate::tracker::Story;

/// Put stories into processing order: oldest first, ties by story id.
pub fn order_stories(stories: &mut [Story]) {
    stories.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
}
