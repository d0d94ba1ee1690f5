// src/triage/mod.rs
//! Importance triage: decides which posts are worth a summary.

pub mod config;

use crate::post::Post;

/// Keywords used when no keyword file is configured.
pub const DEFAULT_KEYWORDS: &[&str] = &["update", "announcement"];

/// Swappable triage policy. The pipeline only sees this trait.
pub trait ImportanceFilter: Send + Sync {
    fn is_important(&self, post: &Post) -> bool;
    /// Policy name for diagnostics.
    fn name(&self) -> &'static str;
}

/// Case-insensitive substring match against a keyword list.
/// Substring hits like "updated" count; this is a precision-biased heuristic.
#[derive(Debug, Clone)]
pub struct KeywordFilter {
    keywords: Vec<String>,
}

impl KeywordFilter {
    /// Keywords are lower-cased; empty entries are ignored.
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keywords = keywords
            .into_iter()
            .map(|k| k.as_ref().trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        Self { keywords }
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }
}

impl Default for KeywordFilter {
    fn default() -> Self {
        Self::new(DEFAULT_KEYWORDS)
    }
}

// keywords must already be lower-case
fn mentions_any<'a>(text: &str, keywords: impl IntoIterator<Item = &'a str>) -> bool {
    let text = text.to_lowercase();
    keywords.into_iter().any(|k| text.contains(k))
}

impl ImportanceFilter for KeywordFilter {
    fn is_important(&self, post: &Post) -> bool {
        mentions_any(&post.text, self.keywords.iter().map(String::as_str))
    }

    fn name(&self) -> &'static str {
        "keyword"
    }
}

/// Default keyword policy as a free function.
pub fn is_important(post: &Post) -> bool {
    mentions_any(&post.text, DEFAULT_KEYWORDS.iter().copied())
}
