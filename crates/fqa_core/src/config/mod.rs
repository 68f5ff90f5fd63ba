use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{codes, AppError};

pub const ENV_DATA_DIR: &str = "FILINGQA_DATA_DIR";
pub const ENV_LLM_MODEL: &str = "FILINGQA_LLM_MODEL";
pub const ENV_LLM_BASE_URL: &str = "FILINGQA_LLM_BASE_URL";
pub const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const ENV_DART_API_KEY: &str = "DART_API_KEY";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub chunking: ChunkingConfig,
    pub retrieval: RetrievalConfig,
    pub llm: LlmConfig,
    pub dart: DartConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            chunking: ChunkingConfig::default(),
            retrieval: RetrievalConfig::default(),
            llm: LlmConfig::default(),
            dart: DartConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Upper bound on chunk length, in characters.
    pub max_chars: usize,
    /// Characters shared by consecutive windows of an over-long segment.
    pub overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_chars: 900,
            overlap: 120,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RetrievalConfig {
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { top_k: 3 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub system_prompt: String,
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o".to_string(),
            temperature: 0.0,
            max_output_tokens: 350,
            system_prompt: "You answer in Korean and follow the rules strictly.".to_string(),
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DartConfig {
    pub base_url: String,
    pub viewer_base_url: String,
    pub page_count: u32,
    pub timeout_secs: u64,
}

impl Default for DartConfig {
    fn default() -> Self {
        Self {
            base_url: "https://opendart.fss.or.kr/api".to_string(),
            viewer_base_url: "https://dart.fss.or.kr/dsaf001/main.do".to_string(),
            page_count: 20,
            timeout_secs: 60,
        }
    }
}

impl DartConfig {
    pub fn viewer_url(&self, rcept_no: &str) -> String {
        format!("{}?rcpNo={}", self.viewer_base_url, rcept_no)
    }
}

impl AppConfig {
    /// Load from an optional TOML file, then apply environment overrides and validate.
    pub fn load(path: Option<&Path>) -> Result<Self, AppError> {
        let mut cfg = match path {
            Some(p) => Self::from_toml_file(p)?,
            None => Self::default(),
        };
        cfg.apply_env_overrides(|k| std::env::var(k).ok());
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_toml_file(path: &Path) -> Result<Self, AppError> {
        let raw = fs::read_to_string(path).map_err(|e| {
            AppError::new(codes::CONFIG_READ_FAILED, "Failed to read config file")
                .with_details(format!("path={}; err={}", path.display(), e))
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, AppError> {
        toml::from_str(raw).map_err(|e| {
            AppError::new(codes::CONFIG_INVALID, "Failed to parse config file")
                .with_details(e.to_string())
        })
    }

    pub fn apply_env_overrides<F>(&mut self, get: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |k: &str| get(k).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        if let Some(v) = non_blank(ENV_DATA_DIR) {
            self.data_dir = PathBuf::from(v);
        }
        if let Some(v) = non_blank(ENV_LLM_MODEL) {
            self.llm.model = v;
        }
        if let Some(v) = non_blank(ENV_LLM_BASE_URL) {
            self.llm.base_url = v;
        }
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.chunking.max_chars == 0 {
            return Err(AppError::new(
                codes::CONFIG_INVALID,
                "chunking.max_chars must be greater than zero",
            ));
        }
        if self.chunking.overlap >= self.chunking.max_chars {
            return Err(AppError::new(
                codes::CONFIG_INVALID,
                "chunking.overlap must be smaller than chunking.max_chars",
            )
            .with_details(format!(
                "max_chars={}; overlap={}",
                self.chunking.max_chars, self.chunking.overlap
            )));
        }
        if self.retrieval.top_k == 0 {
            return Err(AppError::new(
                codes::CONFIG_INVALID,
                "retrieval.top_k must be at least 1",
            ));
        }
        if self.llm.model.trim().is_empty() {
            return Err(AppError::new(codes::CONFIG_INVALID, "llm.model is required"));
        }
        Ok(())
    }
}

/// API keys for the external collaborators. Each command asks only for the key it needs.
#[derive(Clone, Default)]
pub struct Credentials {
    openai_api_key: Option<String>,
    dart_api_key: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("openai_api_key", &self.openai_api_key.as_ref().map(|_| "<set>"))
            .field("dart_api_key", &self.dart_api_key.as_ref().map(|_| "<set>"))
            .finish()
    }
}

impl Credentials {
    pub fn from_env() -> Self {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    pub fn from_lookup<F>(get: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |k: &str| get(k).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        Self {
            openai_api_key: non_blank(ENV_OPENAI_API_KEY),
            dart_api_key: non_blank(ENV_DART_API_KEY),
        }
    }

    pub fn openai_api_key(&self) -> Result<&str, AppError> {
        self.openai_api_key
            .as_deref()
            .ok_or_else(|| missing_credential(ENV_OPENAI_API_KEY))
    }

    pub fn dart_api_key(&self) -> Result<&str, AppError> {
        self.dart_api_key
            .as_deref()
            .ok_or_else(|| missing_credential(ENV_DART_API_KEY))
    }
}

fn missing_credential(var: &str) -> AppError {
    AppError::new(
        codes::CONFIG_MISSING_CREDENTIAL,
        "Required API credential is not set",
    )
    .with_details(format!("env={var}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg = AppConfig::from_toml_str(
            r#"
data_dir = "/tmp/filings"

[chunking]
max_chars = 500
"#,
        )
        .expect("parse");
        assert_eq!(cfg.data_dir, PathBuf::from("/tmp/filings"));
        assert_eq!(cfg.chunking.max_chars, 500);
        assert_eq!(cfg.chunking.overlap, 120);
        assert_eq!(cfg.retrieval.top_k, 3);
        assert_eq!(cfg.llm, LlmConfig::default());
    }

    #[test]
    fn example_config_matches_defaults() {
        let raw = include_str!(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/../../filingqa.example.toml"
        ));
        let cfg = AppConfig::from_toml_str(raw).expect("parse");
        cfg.validate().expect("valid");
        assert_eq!(cfg, AppConfig::default());
    }

    #[test]
    fn rejects_overlap_not_smaller_than_window() {
        let mut cfg = AppConfig::default();
        cfg.chunking.overlap = cfg.chunking.max_chars;
        let err = cfg.validate().expect_err("invalid");
        assert_eq!(err.code, codes::CONFIG_INVALID);
    }

    #[test]
    fn env_overrides_ignore_blank_values() {
        let env: HashMap<&str, &str> =
            [(ENV_LLM_MODEL, "gpt-4o-mini"), (ENV_DATA_DIR, "  ")].into_iter().collect();
        let mut cfg = AppConfig::default();
        cfg.apply_env_overrides(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(cfg.llm.model, "gpt-4o-mini");
        assert_eq!(cfg.data_dir, PathBuf::from("data"));
    }

    #[test]
    fn missing_credentials_fail_fast_with_env_name() {
        let creds = Credentials::from_lookup(|k| {
            (k == ENV_DART_API_KEY).then(|| "dart-key".to_string())
        });
        assert_eq!(creds.dart_api_key().expect("dart"), "dart-key");
        let err = creds.openai_api_key().expect_err("missing");
        assert_eq!(err.code, codes::CONFIG_MISSING_CREDENTIAL);
        assert_eq!(err.details.as_deref(), Some("env=OPENAI_API_KEY"));
    }

    #[test]
    fn viewer_url_uses_receipt_number() {
        let cfg = DartConfig::default();
        assert_eq!(
            cfg.viewer_url("20251127000739"),
            "https://dart.fss.or.kr/dsaf001/main.do?rcpNo=20251127000739"
        );
    }
}
