//! Emission requests and call-site locations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Source location a warning was issued from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    /// Source file path.
    pub file: String,
    /// 1-based line number.
    pub line: u32,
    /// 1-based column number.
    pub column: u32,
}

impl Location {
    /// Create a location from explicit parts.
    pub fn new(file: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            file: file.into(),
            line,
            column,
        }
    }

    /// Location of the caller of the enclosing `#[track_caller]` function.
    #[track_caller]
    pub fn caller() -> Self {
        Self::from(std::panic::Location::caller())
    }
}

impl From<&std::panic::Location<'_>> for Location {
    fn from(loc: &std::panic::Location<'_>) -> Self {
        Self::new(loc.file(), loc.line(), loc.column())
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// A single warning on its way through the router.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Emission {
    /// Category name.
    pub category: String,
    /// Warning text.
    pub message: String,
    /// Optional prefix naming the object that raised the warning,
    /// e.g. the pathname of a model subsystem.
    pub prefix: Option<String>,
    /// Call site.
    pub location: Location,
    /// When the warning was issued.
    pub emitted_at: DateTime<Utc>,
}

impl Emission {
    /// Create an emission stamped with the current time.
    pub fn new(category: impl Into<String>, message: impl Into<String>, location: Location) -> Self {
        Self {
            category: category.into(),
            message: message.into(),
            prefix: None,
            location,
            emitted_at: Utc::now(),
        }
    }

    /// Attach a prefix. Empty prefixes are dropped.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        self.prefix = if prefix.is_empty() { None } else { Some(prefix) };
        self
    }

    /// Message with the prefix applied, as it is shown to the user.
    pub fn full_message(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}: {}", prefix, self.message),
            None => self.message.clone(),
        }
    }
}

impl std::fmt::Display for Emission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {}: {}",
            self.location,
            self.category,
            self.full_message()
        )
    }
}
