mod args;

pub use args::Cli;

use std::path::Path;
use std::process::ExitStatus;

use crate::config::Resolver;
use crate::error::Result;
use crate::runner::Runner;

/// Runs one wrapped invocation for `cli` in `work_dir`.
///
/// The binary is looked up first, so a missing terraform is reported before any config file is
/// read.
pub async fn execute(cli: &Cli, work_dir: &Path) -> Result<ExitStatus> {
    let runner = Runner::new(cli.run_settings(work_dir));
    let binary = runner.resolve_binary()?;

    let resolver = Resolver::from_options(&cli.resolver_options())?;
    resolver.validate()?;

    runner.run_resolved(&binary, &resolver, &cli.args).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TfProxyError;
    use crate::runner::RunError;

    fn cli(binary: &str, config: &Path) -> Cli {
        Cli {
            proxy_host: None,
            proxy_config: Some(config.to_path_buf()),
            providers: None,
            keep_override: false,
            allow_empty: false,
            terraform_binary: binary.to_string(),
            args: vec!["plan".to_string()],
        }
    }

    #[tokio::test]
    async fn test_missing_binary_reported_before_config() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.yaml");

        let err = execute(&cli("tf-proxy-no-such-terraform", &missing), dir.path())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            TfProxyError::Run(RunError::BinaryNotFound { .. })
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_config_checked_once_binary_found() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.yaml");

        let err = execute(&cli("sh", &missing), dir.path()).await.unwrap_err();
        assert!(err.to_string().contains("config file not found"));
    }
}
