//! tf-proxy - per-provider proxies for Terraform
//!
//! Injects an `https_proxy` attribute into selected provider and backend blocks through a
//! generated `*_override.tf` file, runs terraform, and removes the file again. The user's own
//! configuration files are never modified.

pub mod cli;
pub mod config;
pub mod error;
pub mod loader;
pub mod logging;
pub mod override_file;
pub mod preflight;
pub mod runner;
pub mod target;

pub use config::{ConfigError, ResolutionMode, Resolver, ResolverOptions, StructuredConfig};
pub use error::{Result, TfProxyError};
pub use loader::{ConfigurationDocument, EmptyPolicy, LoadError};
pub use override_file::{InjectedProxy, OVERRIDE_FILENAME, OverrideDocument, synthesize};
pub use preflight::PreflightError;
pub use runner::{Executor, ProcessExecutor, RunError, RunSettings, Runner};
pub use target::{Target, TargetKind};
