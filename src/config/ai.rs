// src/config/ai.rs
use serde::{Deserialize, Serialize};
use std::{env, fs, path::Path};

use crate::error::ConfigError;

pub const DEFAULT_AI_CONFIG_PATH: &str = "config/ai.json";
pub const ENV_AI_CONFIG_PATH: &str = "AI_CONFIG_PATH";

fn default_model() -> String {
    "gpt-4".to_string()
}
fn default_max_tokens() -> u32 {
    150
}
fn default_base_url() -> String {
    "https://api.openai.com/v1/chat/completions".to_string()
}
fn default_api_key() -> String {
    "ENV".to_string()
}

/// Completion capability settings, optionally read from `config/ai.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionConfig {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Full chat-completions URL (OpenAI-compatible).
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// "ENV" means: read from OPENAI_API_KEY
    #[serde(default = "default_api_key")]
    pub api_key: String,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            max_tokens: default_max_tokens(),
            base_url: default_base_url(),
            api_key: default_api_key(),
        }
    }
}

impl CompletionConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let file_err = |reason: String| ConfigError::File {
            path: path.display().to_string(),
            reason,
        };
        let data = fs::read_to_string(path).map_err(|e| file_err(e.to_string()))?;
        let mut cfg: CompletionConfig =
            serde_json::from_str(&data).map_err(|e| file_err(e.to_string()))?;
        cfg.sanitize();
        Ok(cfg)
    }

    /// `$AI_CONFIG_PATH`, then `config/ai.json`, then built-in defaults.
    pub fn load_default() -> Result<Self, ConfigError> {
        if let Ok(p) = env::var(ENV_AI_CONFIG_PATH) {
            return Self::load_from_file(p);
        }
        if Path::new(DEFAULT_AI_CONFIG_PATH).exists() {
            return Self::load_from_file(DEFAULT_AI_CONFIG_PATH);
        }
        Ok(Self::default())
    }

    /// Resolve the credential; "ENV" reads OPENAI_API_KEY.
    pub fn resolve_api_key(&self) -> Result<String, ConfigError> {
        if self.api_key.trim().eq_ignore_ascii_case("env") {
            return env::var("OPENAI_API_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty())
                .ok_or(ConfigError::Missing("OPENAI_API_KEY"));
        }
        Ok(self.api_key.clone())
    }

    fn sanitize(&mut self) {
        if self.max_tokens == 0 {
            self.max_tokens = default_max_tokens();
        }
        if self.model.trim().is_empty() {
            self.model = default_model();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("ai.json");
        fs::write(&p, r#"{"model":"gpt-4o-mini","max_tokens":0}"#).unwrap();
        let cfg = CompletionConfig::load_from_file(&p).unwrap();
        assert_eq!(cfg.model, "gpt-4o-mini");
        assert_eq!(cfg.max_tokens, 150);
        assert_eq!(cfg.api_key, "ENV");
        assert!(cfg.base_url.ends_with("/chat/completions"));
    }

    #[test]
    fn literal_key_is_returned_as_is() {
        let cfg = CompletionConfig {
            api_key: "sk-literal".into(),
            ..Default::default()
        };
        assert_eq!(cfg.resolve_api_key().unwrap(), "sk-literal");
    }

    #[test]
    fn bad_json_is_a_file_error() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("ai.json");
        fs::write(&p, "{").unwrap();
        assert!(matches!(
            CompletionConfig::load_from_file(&p),
            Err(ConfigError::File { .. })
        ));
    }
}
