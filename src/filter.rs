// src/filter.rs
//! Keyword gate per category.

use crate::category::Category;
use crate::ingest::types::FeedEntry;

/// Text the keyword gate looks at: title and body joined by a space.
pub fn combined_text(entry: &FeedEntry) -> String {
    format!("{} {}", entry.title, entry.body)
}

/// Case-insensitive "any keyword is a substring" check.
/// Categories without keywords (absent, empty or all blank) accept
/// everything; blank text never matches a keyword-filtered category.
pub fn matches(category: &Category, text: &str) -> bool {
    let keywords: Vec<String> = category
        .keywords
        .as_deref()
        .unwrap_or_default()
        .iter()
        .map(|k| k.trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .collect();
    if keywords.is_empty() {
        return true;
    }
    if text.trim().is_empty() {
        return false;
    }
    let haystack = text.to_lowercase();
    keywords.iter().any(|k| haystack.contains(k.as_str()))
}
