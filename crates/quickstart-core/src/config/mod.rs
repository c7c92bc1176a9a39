//! Configuration types for the admin quickstart.
//!
//! Configuration is loaded from a YAML file (`quickstart.yaml`). Content types
//! may be declared inline or in a directory of YAML/JSON documents referenced
//! by `content_types_dir`.

pub mod content;
pub mod panels;
pub mod policy;

use crate::content_type::ContentType;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub use content::{ContentConfig, FeaturesConfig};
pub use panels::PanelDefinition;
pub use policy::PolicyConfig;

/// Complete quickstart configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuickstartConfig {
    /// Path prefix every console route is mounted under.
    #[serde(default = "default_base_path")]
    pub base_path: String,

    /// Locale used when the request carries none.
    #[serde(default = "default_locale")]
    pub default_locale: String,

    /// HTTP listener settings.
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub content: ContentConfig,

    #[serde(default)]
    pub features: FeaturesConfig,

    #[serde(default)]
    pub policy: PolicyConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,

    /// Directory of `.html` view templates (`resources/<slug>/<op>.html`).
    #[serde(default)]
    pub templates_dir: Option<PathBuf>,

    /// Directory of content type documents (`*.yaml`, `*.yml`, `*.json`).
    #[serde(default)]
    pub content_types_dir: Option<PathBuf>,

    /// Inline content types.
    #[serde(default)]
    pub content_types: Vec<ContentType>,

    /// Inline panel definitions.
    #[serde(default)]
    pub panels: Vec<PanelDefinition>,
}

impl Default for QuickstartConfig {
    fn default() -> Self {
        Self {
            base_path: default_base_path(),
            default_locale: default_locale(),
            server: ServerConfig::default(),
            content: ContentConfig::default(),
            features: FeaturesConfig::default(),
            policy: PolicyConfig::default(),
            observability: ObservabilityConfig::default(),
            templates_dir: None,
            content_types_dir: None,
            content_types: Vec::new(),
            panels: Vec::new(),
        }
    }
}

/// HTTP listener configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Maximum accepted request body size.
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            body_limit_bytes: default_body_limit(),
        }
    }
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// `tracing_subscriber::EnvFilter` directive, overridden by `RUST_LOG`.
    #[serde(default = "default_log_filter")]
    pub log_filter: String,

    #[serde(default)]
    pub log_format: LogFormat,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_filter: default_log_filter(),
            log_format: LogFormat::default(),
        }
    }
}

fn default_base_path() -> String {
    "/admin".to_string()
}

fn default_locale() -> String {
    "en".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_body_limit() -> usize {
    2 * 1024 * 1024
}

fn default_log_filter() -> String {
    "info".to_string()
}

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl QuickstartConfig {
    /// Load configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML content.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration and the content type documents it references.
    pub fn load_with_context(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let mut config = Self::from_file(path)?;

        let base_dir = path
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        if let Some(dir) = &config.content_types_dir {
            let dir = if dir.is_absolute() {
                dir.clone()
            } else {
                base_dir.join(dir)
            };
            let loaded = load_content_types_dir(&dir)?;
            config.content_types.extend(loaded);
        }

        if let Some(templates) = &config.templates_dir
            && !templates.is_absolute()
        {
            config.templates_dir = Some(base_dir.join(templates));
        }

        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let base = self.base_path.trim();
        if !base.is_empty() && !base.starts_with('/') {
            return Err(ConfigError::Config(format!(
                "base_path must start with '/': {}",
                self.base_path
            )));
        }
        Ok(())
    }

    /// Base path without a trailing slash (`""` for root mounting).
    pub fn normalized_base_path(&self) -> String {
        self.base_path.trim().trim_end_matches('/').to_string()
    }
}

/// Load every content type document found in `dir`, sorted by file name.
pub fn load_content_types_dir(dir: &Path) -> Result<Vec<ContentType>, ConfigError> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .map(|e| matches!(e, "yaml" | "yml" | "json"))
                .unwrap_or(false)
        })
        .collect();
    paths.sort();

    let mut out = Vec::with_capacity(paths.len());
    for path in paths {
        let raw = fs::read_to_string(&path)?;
        let ct: ContentType = if path.extension().is_some_and(|e| e == "json") {
            serde_json::from_str(&raw)?
        } else {
            serde_yaml::from_str(&raw)?
        };
        out.push(ct);
    }
    Ok(out)
}
