//! Group/Version/Kind identifiers

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// Identifies a resource type. The group is empty for the core API.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Gvk {
    #[serde(default)]
    pub group: String,
    pub version: String,
    pub kind: String,
}

impl Gvk {
    pub fn new(group: impl Into<String>, version: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            version: version.into(),
            kind: kind.into(),
        }
    }

    /// The `apiVersion` value resources of this kind carry
    pub fn api_version(&self) -> String {
        if self.group.is_empty() {
            self.version.clone()
        } else {
            format!("{}/{}", self.group, self.version)
        }
    }

    /// Type name under which the kind is exported from a package (`#Kind`)
    pub fn definition_name(&self) -> String {
        format!("#{}", self.kind)
    }
}

impl fmt::Display for Gvk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.api_version(), self.kind)
    }
}

/// Parses `v1/Kind` or `group/v1/Kind`
impl FromStr for Gvk {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('/').collect();
        match parts.as_slice() {
            [version, kind] if !version.is_empty() && !kind.is_empty() => {
                Ok(Gvk::new("", *version, *kind))
            }
            [group, version, kind]
                if !group.is_empty() && !version.is_empty() && !kind.is_empty() =>
            {
                Ok(Gvk::new(*group, *version, *kind))
            }
            _ => Err(CoreError::InvalidGvk(format!(
                "{} (expected v1/Kind or group/v1/Kind)",
                s
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_version_core_group() {
        let gvk = Gvk::new("", "v1", "Service");
        assert_eq!(gvk.api_version(), "v1");
        assert_eq!(gvk.to_string(), "v1/Service");
    }

    #[test]
    fn test_api_version_named_group() {
        let gvk = Gvk::new("apps", "v1", "Deployment");
        assert_eq!(gvk.api_version(), "apps/v1");
        assert_eq!(gvk.definition_name(), "#Deployment");
    }

    #[test]
    fn test_parse_gvk() {
        assert_eq!("v1/Secret".parse::<Gvk>().unwrap(), Gvk::new("", "v1", "Secret"));
        assert_eq!(
            "example.com/v1/Foo".parse::<Gvk>().unwrap(),
            Gvk::new("example.com", "v1", "Foo")
        );
        assert!("Foo".parse::<Gvk>().is_err());
        assert!("a/b/c/d".parse::<Gvk>().is_err());
        assert!("/v1/Foo".parse::<Gvk>().is_err());
    }
}
