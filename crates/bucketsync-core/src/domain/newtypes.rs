//! Domain newtypes with validation
//!
//! This module provides strongly-typed wrappers for domain values.
//! Each newtype ensures data validity at construction time.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::errors::DomainError;

// ============================================================================
// Path types
// ============================================================================

/// An absolute, `/`-separated path in the filer namespace
///
/// FullPath ensures the path is:
/// - Absolute (starts with /)
/// - Free of trailing slashes (except the root itself)
///
/// Joining never produces doubled or missing separators.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FullPath(String);

impl FullPath {
    /// Create a new FullPath, validating it is absolute
    ///
    /// # Errors
    /// Returns `DomainError::InvalidPath` if the path does not start with `/`
    pub fn new(path: impl Into<String>) -> Result<Self, DomainError> {
        let path = path.into();
        if !path.starts_with('/') {
            return Err(DomainError::InvalidPath(format!(
                "Path must be absolute: {path}"
            )));
        }

        let trimmed = path.trim_end_matches('/');
        if trimmed.is_empty() {
            return Ok(Self::root());
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Create the root path "/"
    #[must_use]
    pub fn root() -> Self {
        Self("/".to_string())
    }

    /// Get the inner string reference
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if this is the root path
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0 == "/"
    }

    /// Appends a child name (or a `/`-prefixed relative path) to this path
    #[must_use]
    pub fn child(&self, name: &str) -> Self {
        Self(join_path(&self.0, name))
    }

    /// Splits the path into its parent directory and final component
    #[must_use]
    pub fn dir_and_name(&self) -> (&str, &str) {
        match self.0.rfind('/') {
            Some(0) => ("/", &self.0[1..]),
            Some(idx) => (&self.0[..idx], &self.0[idx + 1..]),
            None => ("/", self.0.as_str()),
        }
    }

    /// Returns the part of this path below `ancestor`, starting with `/`
    ///
    /// Returns `Some("")` when the two paths are equal and `None` when
    /// `ancestor` is not an ancestor of this path.
    #[must_use]
    pub fn relative_to(&self, ancestor: &FullPath) -> Option<&str> {
        if ancestor.is_root() {
            return Some(if self.is_root() { "" } else { self.as_str() });
        }
        let rest = self.0.strip_prefix(ancestor.as_str())?;
        if rest.is_empty() || rest.starts_with('/') {
            Some(rest)
        } else {
            None
        }
    }
}

/// Joins `name` onto `dir` with exactly one separator between them
///
/// A leading `/` on `name` is ignored, an empty `dir` is treated as the root.
#[must_use]
pub fn join_path(dir: &str, name: &str) -> String {
    let name = name.strip_prefix('/').unwrap_or(name);
    if dir.ends_with('/') {
        format!("{dir}{name}")
    } else {
        format!("{dir}/{name}")
    }
}

impl Display for FullPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for FullPath {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for FullPath {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<FullPath> for String {
    fn from(path: FullPath) -> Self {
        path.0
    }
}
