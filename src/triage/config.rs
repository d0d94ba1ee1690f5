// src/triage/config.rs
//! Keyword list for the triage filter, read from a TOML or JSON file.
//!
//! TOML files carry a `keywords = [...]` table entry. JSON files hold either a
//! bare array or `{"keywords": [...]}`. The format follows the file extension.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use super::{KeywordFilter, DEFAULT_KEYWORDS};
use crate::error::ConfigError;

pub const ENV_KEYWORDS_PATH: &str = "TRIAGE_KEYWORDS_PATH";

/// Checked in order when `$TRIAGE_KEYWORDS_PATH` is unset.
pub const DEFAULT_KEYWORD_FILES: [&str; 2] = [
    "config/triage_keywords.toml",
    "config/triage_keywords.json",
];

#[derive(Deserialize)]
struct KeywordTable {
    keywords: Vec<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum JsonKeywords {
    List(Vec<String>),
    Table(KeywordTable),
}

enum Format {
    Toml,
    Json,
}

impl Format {
    fn of(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        if ext.eq_ignore_ascii_case("toml") {
            Some(Format::Toml)
        } else if ext.eq_ignore_ascii_case("json") {
            Some(Format::Json)
        } else {
            None
        }
    }
}

/// Keywords from `path`, lower-cased and de-duplicated in file order.
pub fn load_keywords_from(path: &Path) -> Result<Vec<String>, ConfigError> {
    let file_err = |reason: String| ConfigError::File {
        path: path.display().to_string(),
        reason,
    };
    let format = Format::of(path)
        .ok_or_else(|| file_err("expected a .toml or .json keyword file".to_string()))?;
    let raw = fs::read_to_string(path).map_err(|e| file_err(e.to_string()))?;

    let listed = match format {
        Format::Toml => toml::from_str::<KeywordTable>(&raw)
            .map(|t| t.keywords)
            .map_err(|e| file_err(e.to_string()))?,
        Format::Json => match serde_json::from_str::<JsonKeywords>(&raw)
            .map_err(|e| file_err(e.to_string()))?
        {
            JsonKeywords::List(v) => v,
            JsonKeywords::Table(t) => t.keywords,
        },
    };
    Ok(clean_keywords(listed))
}

/// `$TRIAGE_KEYWORDS_PATH`, then the default files, then [`DEFAULT_KEYWORDS`].
/// An explicit path that cannot be read is an error, not a fallback.
pub fn load_keywords_default() -> Result<Vec<String>, ConfigError> {
    if let Ok(p) = std::env::var(ENV_KEYWORDS_PATH) {
        return load_keywords_from(Path::new(&p));
    }
    for candidate in DEFAULT_KEYWORD_FILES {
        let path = Path::new(candidate);
        if path.exists() {
            return load_keywords_from(path);
        }
    }
    Ok(DEFAULT_KEYWORDS.iter().map(|s| s.to_string()).collect())
}

pub fn keyword_filter_from_env() -> Result<KeywordFilter, ConfigError> {
    let keywords = load_keywords_default()?;
    tracing::info!(keywords = ?keywords, "triage keywords loaded");
    Ok(KeywordFilter::new(keywords))
}

fn clean_keywords(items: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .map(|k| k.trim().to_lowercase())
        .filter(|k| !k.is_empty() && seen.insert(k.clone()))
        .collect()
}
