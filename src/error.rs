use thiserror::Error;

use crate::config::ConfigError;
use crate::loader::LoadError;
use crate::preflight::PreflightError;
use crate::runner::RunError;

#[derive(Debug, Error)]
pub enum TfProxyError {
    #[error(transparent)]
    Preflight(#[from] PreflightError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Run(#[from] RunError),
}

pub type Result<T> = std::result::Result<T, TfProxyError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_preflight_error_from_conversion() {
        let err: TfProxyError = PreflightError::ProxyVariableSet {
            name: "HTTPS_PROXY".to_string(),
        }
        .into();
        assert!(matches!(err, TfProxyError::Preflight(_)));
        assert_eq!(
            err.to_string(),
            "'HTTPS_PROXY' is already set. Unset it before using this wrapper"
        );
    }

    #[test]
    fn test_config_error_from_conversion() {
        let err: TfProxyError = ConfigError::InvalidTarget("aws".to_string()).into();
        assert!(matches!(err, TfProxyError::Config(_)));
        assert_eq!(err.to_string(), "invalid target format: aws");
    }

    #[test]
    fn test_load_error_from_conversion() {
        let err: TfProxyError = LoadError::NoConfigurationFiles {
            dir: PathBuf::from("/work"),
        }
        .into();
        assert!(matches!(err, TfProxyError::Load(_)));
        assert!(err.to_string().contains("/work"));
    }

    #[test]
    fn test_run_error_from_conversion() {
        let err: TfProxyError = RunError::BinaryNotFound {
            binary: "terraform".to_string(),
            message: "cannot find binary path".to_string(),
        }
        .into();
        assert!(matches!(err, TfProxyError::Run(_)));
        assert!(err.to_string().contains("terraform binary not found"));
    }
}
