//! Projection of remote posts onto quote candidates.

use super::RemotePost;
use crate::config::SyncSettings;
use crate::models::Quote;

/// Maps remote posts onto quotes.
///
/// `text` is the trimmed title; `category` is the first non-empty line of
/// the body, trimmed and cut to `category_max_chars` characters (0 keeps the
/// whole line); `server_id` is the post id. Posts that end up with a blank
/// text or category are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostProjection {
    /// Maximum category length in characters.
    pub category_max_chars: usize,
    /// Maximum number of posts used per fetch (0 means all).
    pub fetch_limit: usize,
}

impl Default for PostProjection {
    fn default() -> Self {
        Self {
            category_max_chars: 20,
            fetch_limit: 10,
        }
    }
}

impl PostProjection {
    /// Builds the projection from sync settings.
    #[must_use]
    pub const fn from_settings(settings: &SyncSettings) -> Self {
        Self {
            category_max_chars: settings.category_max_chars,
            fetch_limit: settings.fetch_limit,
        }
    }

    /// Projects a single post. Returns `None` if it yields a blank field.
    #[must_use]
    pub fn project(&self, post: &RemotePost) -> Option<Quote> {
        let text = post.title.trim();
        let line = post.body.lines().map(str::trim).find(|l| !l.is_empty())?;
        let category = self.truncate(line);

        if text.is_empty() || category.is_empty() {
            return None;
        }

        Some(Quote::new(text, category).with_server_id(post.id.to_string()))
    }

    /// Projects the first `fetch_limit` posts, dropping unusable ones.
    #[must_use]
    pub fn project_all(&self, posts: &[RemotePost]) -> Vec<Quote> {
        let limit = if self.fetch_limit == 0 {
            posts.len()
        } else {
            self.fetch_limit
        };

        posts
            .iter()
            .take(limit)
            .filter_map(|post| self.project(post))
            .collect()
    }

    fn truncate<'a>(&self, line: &'a str) -> &'a str {
        if self.category_max_chars == 0 {
            return line;
        }
        match line.char_indices().nth(self.category_max_chars) {
            Some((cut, _)) => line[..cut].trim_end(),
            None => line,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::RemoteId;

    fn post(id: u64, title: &str, body: &str) -> RemotePost {
        RemotePost {
            id: RemoteId::Number(id),
            title: title.to_string(),
            body: body.to_string(),
        }
    }

    #[test]
    fn test_project_placeholder_post() {
        let quote = PostProjection::default()
            .project(&post(
                1,
                "  sunt aut facere repellat  ",
                "quia et suscipit recusandae\nsuscipit recusandae",
            ))
            .unwrap();

        assert_eq!(quote.text, "sunt aut facere repellat");
        assert_eq!(quote.category, "quia et suscipit rec");
        assert_eq!(quote.server_id.as_deref(), Some("1"));
    }

    #[test]
    fn test_category_uses_first_non_empty_line() {
        let quote = PostProjection::default()
            .project(&post(2, "Alpha", "\n   \n  Cats \nDogs"))
            .unwrap();
        assert_eq!(quote.category, "Cats");
    }

    #[test]
    fn test_truncation_counts_characters() {
        let projection = PostProjection {
            category_max_chars: 3,
            fetch_limit: 0,
        };
        let quote = projection.project(&post(3, "Alpha", "čćžšđ")).unwrap();
        assert_eq!(quote.category, "čćž");
    }

    #[test]
    fn test_truncation_trims_trailing_space() {
        let projection = PostProjection {
            category_max_chars: 4,
            fetch_limit: 0,
        };
        let quote = projection.project(&post(3, "Alpha", "ab cd")).unwrap();
        assert_eq!(quote.category, "ab c");

        let quote = projection.project(&post(3, "Alpha", "abc def")).unwrap();
        assert_eq!(quote.category, "abc");
    }

    #[test]
    fn test_blank_posts_are_dropped() {
        let projection = PostProjection::default();
        assert!(projection.project(&post(4, "   ", "Cats")).is_none());
        assert!(projection.project(&post(5, "Alpha", " \n ")).is_none());
    }

    #[test]
    fn test_fetch_limit() {
        let posts: Vec<_> = (1..=15).map(|i| post(i, "title", "body")).collect();

        assert_eq!(PostProjection::default().project_all(&posts).len(), 10);

        let unlimited = PostProjection {
            fetch_limit: 0,
            ..PostProjection::default()
        };
        assert_eq!(unlimited.project_all(&posts).len(), 15);
    }
}
