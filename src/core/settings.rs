//! Typed configuration loaded from environment variables.
//!
//! `.env` files are honored by the binary before this is called. Missing
//! provider credentials are not fatal; malformed values are.

use std::env;
use std::path::PathBuf;

use anyhow::{bail, Context};

pub const PROVIDER_OPENAI: &str = "openai";
pub const PROVIDER_GEMINI: &str = "gemini";

#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub log_dir: PathBuf,
    pub port: u16,

    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub default_provider: String,

    pub max_tokens: u32,
    pub max_context_documents: usize,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        let settings = Settings {
            database_url: var_or("DATABASE_URL", "sqlite://dossier.db?mode=rwc"),
            log_dir: PathBuf::from(var_or("LOG_DIR", "logs")),
            port: parse_var("PORT", 8000)?,
            openai_api_key: non_empty_var("OPENAI_API_KEY"),
            openai_model: var_or("OPENAI_MODEL", "gpt-4o-mini"),
            gemini_api_key: non_empty_var("GEMINI_API_KEY"),
            gemini_model: var_or("GEMINI_MODEL", "gemini-1.5-flash"),
            default_provider: var_or("DEFAULT_AI_PROVIDER", PROVIDER_GEMINI),
            max_tokens: parse_var("MAX_TOKENS", 1000)?,
            max_context_documents: parse_var("MAX_CONTEXT_DOCUMENTS", 10)?,
            chunk_size: parse_var("CHUNK_SIZE", 1000)?,
            chunk_overlap: parse_var("CHUNK_OVERLAP", 200)?,
        };
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.default_provider != PROVIDER_OPENAI && self.default_provider != PROVIDER_GEMINI {
            bail!(
                "DEFAULT_AI_PROVIDER must be '{}' or '{}', got '{}'",
                PROVIDER_OPENAI,
                PROVIDER_GEMINI,
                self.default_provider
            );
        }
        if self.chunk_size == 0 {
            bail!("CHUNK_SIZE must be greater than zero");
        }
        if self.chunk_overlap >= self.chunk_size {
            bail!(
                "CHUNK_OVERLAP ({}) must be smaller than CHUNK_SIZE ({})",
                self.chunk_overlap,
                self.chunk_size
            );
        }
        if self.max_context_documents == 0 {
            bail!("MAX_CONTEXT_DOCUMENTS must be greater than zero");
        }
        Ok(())
    }
}

fn var_or(name: &str, default: &str) -> String {
    match env::var(name) {
        Ok(val) if !val.trim().is_empty() => val,
        _ => default.to_string(),
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|val| val.trim().to_string())
        .filter(|val| !val.is_empty())
}

fn parse_var<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(val) if !val.trim().is_empty() => val
            .trim()
            .parse::<T>()
            .with_context(|| format!("{} has an invalid value: '{}'", name, val)),
        _ => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_settings() -> Settings {
        Settings {
            database_url: "sqlite://test.db?mode=rwc".to_string(),
            log_dir: PathBuf::from("logs"),
            port: 8000,
            openai_api_key: None,
            openai_model: "gpt-4o-mini".to_string(),
            gemini_api_key: None,
            gemini_model: "gemini-1.5-flash".to_string(),
            default_provider: PROVIDER_GEMINI.to_string(),
            max_tokens: 1000,
            max_context_documents: 10,
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }

    #[test]
    fn rejects_unknown_default_provider() {
        let mut settings = base_settings();
        settings.default_provider = "claude".to_string();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn rejects_overlap_not_smaller_than_chunk_size() {
        let mut settings = base_settings();
        settings.chunk_overlap = 1000;
        assert!(settings.validate().is_err());

        settings.chunk_overlap = 999;
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn rejects_zero_chunk_size() {
        let mut settings = base_settings();
        settings.chunk_size = 0;
        settings.chunk_overlap = 0;
        assert!(settings.validate().is_err());
    }
}
