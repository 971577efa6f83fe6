//! Configuration loading from palette.toml.

use runtime::{AnthropicBackend, AnyBackend, DEFAULT_MAX_PAIRS, OpenAiBackend};
use serde::Deserialize;
use std::path::Path;

/// Config file looked up in the working directory when none is given.
pub const CONFIG_FILE: &str = "palette.toml";

/// Environment variable that overrides `backend.model`.
pub const MODEL_ENV: &str = "PALETTE_MODEL";

const DEFAULT_SYSTEM_PROMPT: &str = "You are a friendly color consultant. When the user \
describes how they feel, call the get-colors-for-mood tool and suggest the returned colors.";

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub backend: BackendConfig,
    pub session: SessionConfig,
}

/// Completion provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    OpenAi,
    Anthropic,
}

impl Provider {
    fn default_model(self) -> &'static str {
        match self {
            Self::OpenAi => "gpt-4o-mini",
            Self::Anthropic => "claude-sonnet-4-20250514",
        }
    }

    fn api_key_env(self) -> &'static str {
        match self {
            Self::OpenAi => "OPENAI_API_KEY",
            Self::Anthropic => "ANTHROPIC_API_KEY",
        }
    }
}

/// Backend provider configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub provider: Provider,

    /// Model to use. Falls back to the provider's default.
    pub model: Option<String>,

    /// API key. The provider's environment variable is used when unset.
    pub api_key: Option<String>,

    /// OpenAI-compatible endpoint.
    pub base_url: Option<String>,

    pub max_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Recent user/assistant pairs kept in the transcript.
    pub max_pairs: usize,
    pub system_prompt: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_pairs: DEFAULT_MAX_PAIRS,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML string.
    pub fn parse(toml: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load `path` if given, else `palette.toml` if present, else defaults.
    pub fn resolve(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None if Path::new(CONFIG_FILE).exists() => Self::load(CONFIG_FILE),
            None => Ok(Self::default()),
        }
    }

    /// Build the completion backend.
    ///
    /// `env` looks up environment variables; the model override and the
    /// provider's API key variable are read through it.
    pub fn backend(
        &self,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<AnyBackend, ConfigError> {
        let provider = self.backend.provider;
        let model = env(MODEL_ENV)
            .or_else(|| self.backend.model.clone())
            .unwrap_or_else(|| provider.default_model().to_string());
        let api_key = self
            .backend
            .api_key
            .clone()
            .or_else(|| env(provider.api_key_env()))
            .filter(|key| !key.trim().is_empty())
            .ok_or(ConfigError::MissingAuth {
                var: provider.api_key_env(),
            })?;

        let backend: AnyBackend = match provider {
            Provider::OpenAi => {
                let mut builder = OpenAiBackend::builder(api_key, model);
                if let Some(url) = &self.backend.base_url {
                    builder = builder.base_url(url.clone());
                }
                if let Some(max_tokens) = self.backend.max_tokens {
                    builder = builder.max_tokens(max_tokens);
                }
                builder.build().into()
            }
            Provider::Anthropic => {
                let mut builder = AnthropicBackend::builder(api_key, model);
                if let Some(max_tokens) = self.backend.max_tokens {
                    builder = builder.max_tokens(max_tokens);
                }
                builder.build().into()
            }
        };
        Ok(backend)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("authentication not configured: set backend.api_key or {var}")]
    MissingAuth { var: &'static str },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn empty_file_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.backend.provider, Provider::OpenAi);
        assert_eq!(config.session.max_pairs, 10);
        assert!(config.session.system_prompt.contains("get-colors-for-mood"));
    }

    #[test]
    fn parses_full_file() {
        let config = Config::parse(
            r#"
            [backend]
            provider = "anthropic"
            model = "claude-test"
            max_tokens = 512

            [session]
            max_pairs = 4
            system_prompt = "Be brief."
            "#,
        )
        .unwrap();
        assert_eq!(config.backend.provider, Provider::Anthropic);
        assert_eq!(config.backend.model.as_deref(), Some("claude-test"));
        assert_eq!(config.backend.max_tokens, Some(512));
        assert_eq!(config.session.max_pairs, 4);
        assert_eq!(config.session.system_prompt, "Be brief.");
    }

    #[test]
    fn unknown_provider_is_a_parse_error() {
        let err = Config::parse("[backend]\nprovider = \"llamas\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn missing_credential_is_fatal() {
        let err = Config::default().backend(env(&[])).err().unwrap();
        assert!(matches!(err, ConfigError::MissingAuth { var: "OPENAI_API_KEY" }));
    }

    #[test]
    fn key_from_env_and_model_override() {
        let backend = Config::default()
            .backend(env(&[("OPENAI_API_KEY", "sk-test"), (MODEL_ENV, "gpt-test")]))
            .unwrap();
        assert_eq!(
            backend.to_string(),
            "openai(gpt-test, https://api.openai.com/v1)"
        );
    }

    #[test]
    fn anthropic_reads_its_own_key() {
        let config = Config::parse("[backend]\nprovider = \"anthropic\"").unwrap();
        assert!(config.backend(env(&[("OPENAI_API_KEY", "sk")])).is_err());

        let backend = config
            .backend(env(&[("ANTHROPIC_API_KEY", "sk-ant")]))
            .unwrap();
        assert_eq!(backend.to_string(), "anthropic(claude-sonnet-4-20250514)");
    }
}
