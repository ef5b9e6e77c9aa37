use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

const FILE_SCHEME: &str = "file:";
const OBJECT_SCHEME: &str = "object:";

/// Opaque reference to a byte sequence.
///
/// A locator is resolved to a byte source on every request; nothing about the
/// underlying bytes is cached.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Locator {
    /// Absolute path on the local filesystem.
    File(PathBuf),
    /// Key inside the configured object store.
    Object(String),
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum LocatorParseError {
    #[error("locator is missing a scheme: {0}")]
    MissingScheme(String),
    #[error("locator has an empty target: {0}")]
    Empty(String),
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::File(path) => write!(f, "{}{}", FILE_SCHEME, path.display()),
            Locator::Object(key) => write!(f, "{}{}", OBJECT_SCHEME, key),
        }
    }
}

impl FromStr for Locator {
    type Err = LocatorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (locator, target) = if let Some(path) = s.strip_prefix(FILE_SCHEME) {
            (Locator::File(PathBuf::from(path)), path)
        } else if let Some(key) = s.strip_prefix(OBJECT_SCHEME) {
            (Locator::Object(key.to_string()), key)
        } else {
            return Err(LocatorParseError::MissingScheme(s.to_string()));
        };

        if target.is_empty() {
            return Err(LocatorParseError::Empty(s.to_string()));
        }
        Ok(locator)
    }
}
