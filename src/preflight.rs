use thiserror::Error;

/// Variables that would give the wrapped binary a global proxy on top of the injected ones.
pub const CONFLICTING_VARIABLES: [&str; 2] = ["HTTPS_PROXY", "HTTP_PROXY"];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PreflightError {
    #[error("'{name}' is already set. Unset it before using this wrapper")]
    ProxyVariableSet { name: String },
}

/// Fails when any of [`CONFLICTING_VARIABLES`] is present in the environment seen by `lookup`.
///
/// Names are matched exactly; presence alone is a conflict, even with an empty value.
pub fn check_environment<F>(lookup: F) -> Result<(), PreflightError>
where
    F: Fn(&str) -> Option<String>,
{
    for name in CONFLICTING_VARIABLES {
        if lookup(name).is_some() {
            return Err(PreflightError::ProxyVariableSet {
                name: name.to_string(),
            });
        }
    }
    Ok(())
}

/// [`check_environment`] against the real process environment.
pub fn check_process_environment() -> Result<(), PreflightError> {
    check_environment(|name| std::env::var_os(name).map(|v| v.to_string_lossy().into_owned()))
}
