use std::path::{Path, PathBuf};

use clap::Parser;

use crate::config::ResolverOptions;
use crate::loader::EmptyPolicy;
use crate::runner::{DEFAULT_BINARY, RunSettings};

/// Runs terraform with per-provider proxies injected through an override file.
///
/// Every argument that is not one of the options below is passed to terraform untouched.
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about,
    disable_help_flag = true,
    disable_version_flag = true
)]
pub struct Cli {
    /// Default proxy address.
    #[arg(long, env = "TF_PROXY_HOST", hide_env_values = true)]
    pub proxy_host: Option<String>,

    /// Structured config file (defaults to ~/.tf-proxy.yaml).
    #[arg(long, env = "TF_PROXY_CONFIG")]
    pub proxy_config: Option<PathBuf>,

    /// Comma-separated `kind/name[/alias]` targets; all share the default proxy.
    #[arg(long, env = "TF_PROXY_PROVIDERS", value_delimiter = ',')]
    pub providers: Option<Vec<String>>,

    /// Leave the override file in place after terraform exits.
    #[arg(long, env = "TF_PROXY_KEEP_OVERRIDE")]
    pub keep_override: bool,

    /// Run terraform even when the directory has no `*.tf` files.
    #[arg(long, env = "TF_PROXY_ALLOW_EMPTY")]
    pub allow_empty: bool,

    /// Binary to wrap.
    #[arg(long, env = "TF_PROXY_BINARY", default_value = DEFAULT_BINARY)]
    pub terraform_binary: String,

    /// Arguments for terraform.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}

impl Cli {
    pub fn resolver_options(&self) -> ResolverOptions {
        ResolverOptions {
            proxy_host: self.proxy_host.clone(),
            config_path: self.proxy_config.clone(),
            providers: self.providers.clone(),
        }
    }

    pub fn run_settings(&self, work_dir: &Path) -> RunSettings {
        RunSettings {
            binary: self.terraform_binary.clone(),
            keep_override: self.keep_override,
            empty_policy: if self.allow_empty {
                EmptyPolicy::Allow
            } else {
                EmptyPolicy::Error
            },
            ..RunSettings::new(work_dir)
        }
    }
}
