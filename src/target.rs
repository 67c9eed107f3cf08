use std::fmt;
use std::str::FromStr;

use crate::config::ConfigError;

/// Block kind a [`Target`] can point at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TargetKind {
    Provider,
    Backend,
}

impl TargetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetKind::Provider => "provider",
            TargetKind::Backend => "backend",
        }
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TargetKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "provider" => Ok(TargetKind::Provider),
            "backend" => Ok(TargetKind::Backend),
            other => Err(ConfigError::InvalidProviderType(other.to_string())),
        }
    }
}

/// One provider or backend declaration to patch.
///
/// `alias == None` matches any alias, including blocks without one.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Target {
    pub kind: TargetKind,
    pub name: String,
    pub alias: Option<String>,
}

impl Target {
    pub fn new(kind: TargetKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            alias: None,
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.name)?;
        if let Some(alias) = &self.alias {
            write!(f, "/{}", alias)?;
        }
        Ok(())
    }
}

impl FromStr for Target {
    type Err = ConfigError;

    /// Parses `kind/name` or `kind/name/alias`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::InvalidTarget(s.to_string());

        let parts: Vec<&str> = s.trim().split('/').collect();
        if !(2..=3).contains(&parts.len()) || parts.iter().any(|p| p.is_empty()) {
            return Err(invalid());
        }

        let kind = parts[0].parse::<TargetKind>().map_err(|_| invalid())?;
        let target = Target::new(kind, parts[1]);

        Ok(match parts.get(2) {
            Some(alias) => target.with_alias(*alias),
            None => target,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_two_segments_has_no_alias() {
        let target: Target = "provider/aws".parse().unwrap();
        assert_eq!(target.kind, TargetKind::Provider);
        assert_eq!(target.name, "aws");
        assert!(target.alias.is_none());
    }

    #[test]
    fn test_parse_three_segments_sets_alias() {
        let target: Target = "provider/aws/east".parse().unwrap();
        assert_eq!(target.kind, TargetKind::Provider);
        assert_eq!(target.name, "aws");
        assert_eq!(target.alias.as_deref(), Some("east"));
    }

    #[test]
    fn test_parse_backend() {
        let target: Target = "backend/s3".parse().unwrap();
        assert_eq!(target, Target::new(TargetKind::Backend, "s3"));
    }

    #[test]
    fn test_parse_rejects_other_arity() {
        for input in ["aws", "provider", "provider/aws/east/extra", "a/b/c/d/e", ""] {
            let result = input.parse::<Target>();
            assert!(
                matches!(result, Err(ConfigError::InvalidTarget(ref s)) if s == input),
                "expected InvalidTarget for {input:?}, got {result:?}"
            );
        }
    }

    #[test]
    fn test_parse_rejects_empty_segments() {
        assert!("provider/".parse::<Target>().is_err());
        assert!("/aws".parse::<Target>().is_err());
        assert!("provider/aws/".parse::<Target>().is_err());
    }

    #[test]
    fn test_parse_rejects_unknown_kind() {
        let result = "module/aws".parse::<Target>();
        assert!(matches!(result, Err(ConfigError::InvalidTarget(_))));
    }

    #[test]
    fn test_kind_from_str_reports_value() {
        let err = "data".parse::<TargetKind>().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidProviderType(ref t) if t == "data"));
    }

    #[test]
    fn test_display_is_canonical() {
        assert_eq!(Target::new(TargetKind::Backend, "s3").to_string(), "backend/s3");
        assert_eq!(
            Target::new(TargetKind::Provider, "aws")
                .with_alias("east")
                .to_string(),
            "provider/aws/east"
        );
    }
}
