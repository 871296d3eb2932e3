use std::fmt;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::breakdown::ExtractionMode;

pub const DEFAULT_LISTEN: &str = "127.0.0.1:3000";
pub const CONFIG_ENV: &str = "BREAKDOWN_CONFIG";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    Gemini,
    #[serde(rename = "openai")]
    #[value(name = "openai")]
    OpenAi,
}

impl Provider {
    pub fn default_base_url(self) -> &'static str {
        match self {
            Provider::Gemini => "https://generativelanguage.googleapis.com",
            Provider::OpenAi => "https://api.openai.com/v1",
        }
    }

    pub fn default_model(self) -> &'static str {
        match self {
            Provider::Gemini => "gemini-2.5-flash",
            Provider::OpenAi => "gpt-4o-mini",
        }
    }

    /// Environment variable the credential is read from.
    pub fn api_key_env(self) -> &'static str {
        match self {
            Provider::Gemini => "GOOGLE_AI_API_KEY",
            Provider::OpenAi => "OPENAI_API_KEY",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provider::Gemini => f.write_str("gemini"),
            Provider::OpenAi => f.write_str("openai"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing {provider} API key: set {env_var} or pass --api-key")]
    MissingApiKey {
        provider: Provider,
        env_var: &'static str,
    },
    #[error("invalid listen address {value:?}: {source}")]
    InvalidListen {
        value: String,
        source: std::net::AddrParseError,
    },
    #[error("invalid value {value:?} for {key}")]
    InvalidValue { key: &'static str, value: String },
    #[error("read config file {}: {source}", .path.display())]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LlmConfig {
    pub connect_timeout_ms: u64,
    /// Unset leaves the HTTP client's own default in place.
    pub request_timeout_ms: Option<u64>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: 10_000,
            request_timeout_ms: None,
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub listen: SocketAddr,
    pub provider: Provider,
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub extraction: ExtractionMode,
    pub llm: LlmConfig,
}

// Hand-written so the startup log line never carries the credential.
impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("listen", &self.listen)
            .field("provider", &self.provider)
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("extraction", &self.extraction)
            .field("llm", &self.llm)
            .finish()
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct FileConfig {
    pub listen: Option<String>,
    pub provider: Option<Provider>,
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub api_key: Option<String>,
    pub extraction: Option<ExtractionMode>,
    pub llm: Option<PartialLlmConfig>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct PartialLlmConfig {
    pub connect_timeout_ms: Option<u64>,
    pub request_timeout_ms: Option<u64>,
}

impl AppConfig {
    pub fn from_cli(cli: &crate::Cli) -> Result<Self, ConfigError> {
        let file_cfg = load_file_config(cli.config.as_deref())?;
        Self::resolve(cli, file_cfg, |key| std::env::var(key).ok())
    }

    /// Merge CLI flags, environment and the config file, in that order of precedence.
    pub fn resolve(
        cli: &crate::Cli,
        file_cfg: FileConfig,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let non_empty = |key: &str| env(key).filter(|v| !v.is_empty());

        let provider = match (cli.provider, non_empty("BREAKDOWN_PROVIDER")) {
            (Some(p), _) => p,
            (None, Some(v)) => parse_enum::<Provider>("BREAKDOWN_PROVIDER", &v)?,
            (None, None) => file_cfg.provider.unwrap_or_default(),
        };

        let listen = cli
            .listen
            .clone()
            .or_else(|| non_empty("BREAKDOWN_LISTEN"))
            .or(file_cfg.listen)
            .unwrap_or_else(|| DEFAULT_LISTEN.to_string());
        let listen = listen
            .parse::<SocketAddr>()
            .map_err(|source| ConfigError::InvalidListen {
                value: listen.clone(),
                source,
            })?;

        let base_url = cli
            .base_url
            .clone()
            .or_else(|| non_empty("BREAKDOWN_BASE_URL"))
            .or(file_cfg.base_url)
            .unwrap_or_else(|| provider.default_base_url().to_string());
        let model = cli
            .model
            .clone()
            .or_else(|| non_empty("BREAKDOWN_MODEL"))
            .or(file_cfg.model)
            .unwrap_or_else(|| provider.default_model().to_string());
        let api_key = cli
            .api_key
            .clone()
            .or_else(|| non_empty(provider.api_key_env()))
            .or(file_cfg.api_key)
            .filter(|k| !k.is_empty());

        let extraction = match (cli.extraction, non_empty("BREAKDOWN_EXTRACTION")) {
            (Some(m), _) => m,
            (None, Some(v)) => parse_enum::<ExtractionMode>("BREAKDOWN_EXTRACTION", &v)?,
            (None, None) => file_cfg.extraction.unwrap_or_default(),
        };

        let llm_defaults = LlmConfig::default();
        let llm = match file_cfg.llm {
            Some(p) => LlmConfig {
                connect_timeout_ms: p
                    .connect_timeout_ms
                    .unwrap_or(llm_defaults.connect_timeout_ms),
                request_timeout_ms: p.request_timeout_ms.or(llm_defaults.request_timeout_ms),
            },
            None => llm_defaults,
        };

        Ok(Self {
            listen,
            provider,
            base_url,
            model,
            api_key,
            extraction,
            llm,
        })
    }

    /// Startup check: the service refuses to run without a credential.
    pub fn require_api_key(&self) -> Result<&str, ConfigError> {
        self.api_key
            .as_deref()
            .ok_or(ConfigError::MissingApiKey {
                provider: self.provider,
                env_var: self.provider.api_key_env(),
            })
    }
}

fn parse_enum<T: clap::ValueEnum>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    T::from_str(value, true).map_err(|_| ConfigError::InvalidValue {
        key,
        value: value.to_string(),
    })
}

fn candidate_paths(explicit: Option<&Path>) -> Vec<PathBuf> {
    if let Some(p) = explicit {
        return vec![p.to_path_buf()];
    }
    let mut v = Vec::new();
    if let Ok(p) = std::env::var(CONFIG_ENV) {
        v.push(PathBuf::from(p));
    }
    if let Some(dir) = dirs::config_dir() {
        v.push(dir.join("idea-breakdown/config.toml"));
    }
    v
}

/// Load the first config file found. An explicitly passed path must exist.
pub fn load_file_config(explicit: Option<&Path>) -> Result<FileConfig, ConfigError> {
    if let Some(p) = explicit
        && !p.exists()
    {
        return Err(ConfigError::ReadFile {
            path: p.to_path_buf(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        });
    }

    for p in candidate_paths(explicit) {
        if p.exists() {
            let s = fs::read_to_string(&p).map_err(|source| ConfigError::ReadFile {
                path: p.clone(),
                source,
            })?;
            match toml::from_str::<FileConfig>(&s) {
                Ok(cfg) => {
                    info!(path=%p.display(), "loaded config file");
                    return Ok(cfg);
                }
                Err(e) => {
                    warn!(path=%p.display(), error=%e.to_string(), "parse config failed");
                    continue;
                }
            }
        }
    }
    Ok(FileConfig::default())
}
