//! Proxy target resolution.
//!
//! Two modes feed one [`Resolver`]: a flat list of `kind/name[/alias]` strings sharing a single
//! proxy address, or a structured YAML document with per-provider settings.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::target::{Target, TargetKind};

/// File name of the structured config in the user's home directory.
pub const DEFAULT_CONFIG_FILE: &str = ".tf-proxy.yaml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no default proxy address set (use TF_PROXY_HOST or --proxy-host)")]
    MissingProxyHost,

    #[error("no proxy address configured for '{provider}'")]
    MissingProxy { provider: String },

    #[error("invalid provider type: {0}")]
    InvalidProviderType(String),

    #[error("invalid type for provider {provider}: {kind}")]
    InvalidType { provider: String, kind: String },

    #[error("invalid target format: {0}")]
    InvalidTarget(String),

    #[error("config file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("could not determine home directory")]
    NoHomeDir,

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawConfig {
    default_proxy: String,
    providers: BTreeMap<String, RawProviderConfig>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawProviderConfig {
    #[serde(rename = "type")]
    kind: Option<String>,
    proxy: Option<String>,
    alias: Option<String>,
}

/// Per-provider settings of the structured config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    pub kind: TargetKind,
    /// Falls back to [`StructuredConfig::default_proxy`] when unset.
    pub proxy: Option<String>,
    pub alias: Option<String>,
}

impl ProviderConfig {
    pub fn new(kind: TargetKind) -> Self {
        Self {
            kind,
            proxy: None,
            alias: None,
        }
    }
}

/// Validated structured configuration document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuredConfig {
    pub default_proxy: String,
    pub providers: BTreeMap<String, ProviderConfig>,
}

impl Default for StructuredConfig {
    fn default() -> Self {
        Self {
            default_proxy: String::new(),
            providers: fallback_providers(),
        }
    }
}

fn fallback_providers() -> BTreeMap<String, ProviderConfig> {
    BTreeMap::from([
        ("s3".to_string(), ProviderConfig::new(TargetKind::Backend)),
        ("aws".to_string(), ProviderConfig::new(TargetKind::Provider)),
    ])
}

impl StructuredConfig {
    /// Parses and validates a YAML document.
    ///
    /// A document without providers gets the built-in `backend/s3`, `provider/aws` set, and an
    /// entry without `type` is a provider.
    pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        let raw: Option<RawConfig> = serde_yaml::from_str(contents)?;
        let raw = raw.unwrap_or_default();

        if raw.providers.is_empty() {
            return Ok(Self {
                default_proxy: raw.default_proxy,
                providers: fallback_providers(),
            });
        }

        let mut providers = BTreeMap::new();
        for (name, entry) in raw.providers {
            let kind = match entry.kind.as_deref() {
                None | Some("") => TargetKind::Provider,
                Some(kind) => kind.parse::<TargetKind>().map_err(|_| ConfigError::InvalidType {
                    provider: name.clone(),
                    kind: kind.to_string(),
                })?,
            };
            providers.insert(
                name,
                ProviderConfig {
                    kind,
                    proxy: entry.proxy,
                    alias: entry.alias,
                },
            );
        }

        Ok(Self {
            default_proxy: raw.default_proxy,
            providers,
        })
    }

    /// Loads the config at `path`; the file must exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let contents = fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Loads the config at `path`, or the fallback config when there is no such file.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        match fs::read_to_string(path) {
            Ok(contents) => Self::from_yaml(&contents),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, using fallback providers");
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn proxy_for(&self, name: &str) -> &str {
        self.providers
            .get(name)
            .and_then(|p| p.proxy.as_deref())
            .unwrap_or(&self.default_proxy)
    }

    /// Targets ordered by kind, then name.
    pub fn targets(&self) -> Vec<Target> {
        let mut targets: Vec<Target> = self
            .providers
            .iter()
            .map(|(name, cfg)| Target {
                kind: cfg.kind,
                name: name.clone(),
                alias: cfg.alias.clone(),
            })
            .collect();
        targets.sort();
        targets
    }
}

/// `~/.tf-proxy.yaml`
pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    dirs::home_dir()
        .map(|home| home.join(DEFAULT_CONFIG_FILE))
        .ok_or(ConfigError::NoHomeDir)
}

/// Where the proxy targets come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionMode {
    /// One address shared by an explicit target list.
    Flat { proxy: String, targets: Vec<Target> },
    /// Per-provider settings from a config document.
    Structured { config: StructuredConfig },
}

/// Inputs gathered from the command line and environment.
#[derive(Debug, Clone, Default)]
pub struct ResolverOptions {
    pub proxy_host: Option<String>,
    pub config_path: Option<PathBuf>,
    pub providers: Option<Vec<String>>,
}

#[derive(Debug, Clone)]
pub struct Resolver {
    mode: ResolutionMode,
}

impl Resolver {
    pub fn new(mode: ResolutionMode) -> Self {
        Self { mode }
    }

    /// Builds a flat resolver, parsing every target string up front.
    pub fn flat<S: AsRef<str>>(proxy: &str, specs: &[S]) -> Result<Self, ConfigError> {
        if proxy.is_empty() {
            return Err(ConfigError::MissingProxyHost);
        }
        let targets = specs
            .iter()
            .map(|s| s.as_ref().parse::<Target>())
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::new(ResolutionMode::Flat {
            proxy: proxy.to_string(),
            targets,
        }))
    }

    pub fn structured(config: StructuredConfig) -> Self {
        Self::new(ResolutionMode::Structured { config })
    }

    /// Picks the mode: an explicit provider list means flat, anything else reads the config
    /// document (`config_path`, or `~/.tf-proxy.yaml` when unset).
    pub fn from_options(options: &ResolverOptions) -> Result<Self, ConfigError> {
        let host = options.proxy_host.clone().unwrap_or_default();

        if let Some(providers) = &options.providers {
            return Self::flat(&host, providers.as_slice());
        }

        let mut config = match &options.config_path {
            Some(path) => StructuredConfig::load(path)?,
            None => StructuredConfig::load_or_default(&default_config_path()?)?,
        };
        if config.default_proxy.is_empty() {
            config.default_proxy = host;
        }

        Ok(Self::structured(config))
    }

    pub fn mode(&self) -> &ResolutionMode {
        &self.mode
    }

    pub fn proxy_for(&self, name: &str) -> &str {
        match &self.mode {
            ResolutionMode::Flat { proxy, .. } => proxy,
            ResolutionMode::Structured { config } => config.proxy_for(name),
        }
    }

    pub fn targets(&self) -> Vec<Target> {
        match &self.mode {
            ResolutionMode::Flat { targets, .. } => targets.clone(),
            ResolutionMode::Structured { config } => config.targets(),
        }
    }

    /// Every target must resolve to a non-empty proxy address.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for target in self.targets() {
            if self.proxy_for(&target.name).trim().is_empty() {
                return Err(ConfigError::MissingProxy {
                    provider: target.name,
                });
            }
        }
        Ok(())
    }
}
