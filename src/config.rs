//! Configuration types for vidfetch

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, path::Path, path::PathBuf};
use utoipa::ToSchema;

/// External extractor (yt-dlp) settings
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ExtractorConfig {
    /// Path to the yt-dlp executable (auto-detected if None)
    #[serde(default)]
    pub binary_path: Option<PathBuf>,

    /// Whether to search PATH for yt-dlp if no explicit path is set (default: true)
    #[serde(default = "default_true")]
    pub search_path: bool,

    /// Format selector passed to `-f` (default: "best")
    #[serde(default = "default_format")]
    pub format: String,

    /// Download only the single video when the URL also names a playlist (default: true)
    #[serde(default = "default_true")]
    pub no_playlist: bool,

    /// Additional arguments inserted before the URL on every invocation
    #[serde(default)]
    pub extra_args: Vec<String>,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            binary_path: None,
            search_path: true,
            format: default_format(),
            no_playlist: true,
            extra_args: Vec::new(),
        }
    }
}

/// Where per-task scratch directories are created
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct StorageConfig {
    /// Parent directory for scratch directories (default: `<system temp>/vidfetch`)
    #[serde(default = "default_scratch_root")]
    pub scratch_root: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            scratch_root: default_scratch_root(),
        }
    }
}

/// Main configuration for VideoFetcher
///
/// The `server` sub-config is flattened, so the TOML layout is:
///
/// ```toml
/// [extractor]
/// format = "best"
///
/// [storage]
/// scratch_root = "/var/tmp/vidfetch"
///
/// [api]
/// bind_address = "0.0.0.0:5000"
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct Config {
    /// External extractor settings
    #[serde(default)]
    pub extractor: ExtractorConfig,

    /// Scratch storage settings
    #[serde(default)]
    pub storage: StorageConfig,

    /// API and external server integration
    #[serde(flatten)]
    pub server: ServerIntegrationConfig,
}

impl Config {
    /// Parse a configuration from TOML text and validate it
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Config = toml::from_str(text).map_err(|e| Error::Config {
            message: e.to_string(),
            key: None,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file from disk
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| Error::Config {
            message: format!("failed to read {}: {}", path.display(), e),
            key: None,
        })?;
        Self::from_toml_str(&text)
    }

    /// Check values serde cannot reject on its own
    pub fn validate(&self) -> Result<()> {
        if self.extractor.format.trim().is_empty() {
            return Err(Error::Config {
                message: "format selector must not be empty".to_string(),
                key: Some("extractor.format".to_string()),
            });
        }
        if self.storage.scratch_root.as_os_str().is_empty() {
            return Err(Error::Config {
                message: "scratch root must not be empty".to_string(),
                key: Some("storage.scratch_root".to_string()),
            });
        }
        Ok(())
    }
}

/// API and external server integration configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct ServerIntegrationConfig {
    /// REST API configuration
    #[serde(default)]
    pub api: ApiConfig,
}

/// REST API configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiConfig {
    /// Address to bind to (default: 127.0.0.1:5000)
    #[serde(default = "default_bind_address")]
    pub bind_address: SocketAddr,

    /// Optional API key for authentication
    #[serde(default)]
    pub api_key: Option<String>,

    /// Enable CORS for browser access (default: true)
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// Allowed CORS origins (default: ["*"])
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Enable Swagger UI at /swagger-ui (default: true)
    #[serde(default = "default_true")]
    pub swagger_ui: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            api_key: None,
            cors_enabled: true,
            cors_origins: default_cors_origins(),
            swagger_ui: true,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_format() -> String {
    "best".into()
}

fn default_scratch_root() -> PathBuf {
    std::env::temp_dir().join("vidfetch")
}

fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 5000))
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".into()]
}
