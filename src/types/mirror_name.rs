// ABOUTME: Validated registry mirror name.
// ABOUTME: The name doubles as a container name suffix and a node directory name.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MirrorNameError {
    #[error("mirror name cannot be empty")]
    Empty,

    #[error("mirror name exceeds maximum length of 200 characters")]
    TooLong,

    #[error("mirror name must start with a letter or digit")]
    InvalidStart,

    #[error("mirror name cannot contain '..'")]
    ParentReference,

    #[error("invalid character in mirror name: '{0}'")]
    InvalidChar(char),
}

/// Name of a pull-through mirror, e.g. `docker.io` or `quay.io`.
///
/// Two mirrors with the same name are the same resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MirrorName(String);

impl MirrorName {
    pub fn new(value: &str) -> Result<Self, MirrorNameError> {
        let value = value.trim();
        if value.is_empty() {
            return Err(MirrorNameError::Empty);
        }

        if value.len() > 200 {
            return Err(MirrorNameError::TooLong);
        }

        // Docker container names must start with [a-zA-Z0-9]
        if !value.starts_with(|c: char| c.is_ascii_alphanumeric()) {
            return Err(MirrorNameError::InvalidStart);
        }

        if value.contains("..") {
            return Err(MirrorNameError::ParentReference);
        }

        if let Some(c) = value
            .chars()
            .find(|c| !c.is_ascii_alphanumeric() && !matches!(c, '.' | '-' | '_'))
        {
            return Err(MirrorNameError::InvalidChar(c));
        }

        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for MirrorName {
    type Err = MirrorNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Display for MirrorName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
