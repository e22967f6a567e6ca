//! Filter actions and scopes.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Policy applied when a warning of a given category is emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FilterAction {
    /// Write the warning on every emission.
    #[serde(alias = "always")]
    DisplayAlways,
    /// Write the warning the first time a (category, message, location)
    /// triple is seen; suppress identical repeats.
    #[serde(alias = "once")]
    DisplayOnce,
    /// Drop the warning without any observable effect.
    Ignore,
    /// Turn the warning into an error returned to the caller.
    #[serde(alias = "error")]
    EscalateToError,
}

impl FilterAction {
    /// All actions, in declaration order.
    pub const ALL: [FilterAction; 4] = [
        FilterAction::DisplayAlways,
        FilterAction::DisplayOnce,
        FilterAction::Ignore,
        FilterAction::EscalateToError,
    ];

    /// Canonical text form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DisplayAlways => "display-always",
            Self::DisplayOnce => "display-once",
            Self::Ignore => "ignore",
            Self::EscalateToError => "escalate-to-error",
        }
    }

    /// Whether emissions under this action reach the diagnostic sink.
    pub fn displays(&self) -> bool {
        matches!(self, Self::DisplayAlways | Self::DisplayOnce)
    }
}

impl std::fmt::Display for FilterAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unrecognized action name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown filter action: {0:?} (expected always, once, ignore or error)")]
pub struct ParseActionError(pub String);

impl FromStr for FilterAction {
    type Err = ParseActionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "always" | "display-always" | "default" => Ok(Self::DisplayAlways),
            "once" | "display-once" => Ok(Self::DisplayOnce),
            "ignore" | "off" => Ok(Self::Ignore),
            "error" | "escalate-to-error" => Ok(Self::EscalateToError),
            _ => Err(ParseActionError(s.to_string())),
        }
    }
}

/// How far a filter override reaches in the category tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterScope {
    /// Only the named category.
    Exact,
    /// The named category and every descendant without a more specific override.
    #[default]
    Subtree,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_aliases() {
        assert_eq!("always".parse::<FilterAction>().unwrap(), FilterAction::DisplayAlways);
        assert_eq!("Once".parse::<FilterAction>().unwrap(), FilterAction::DisplayOnce);
        assert_eq!(" ignore ".parse::<FilterAction>().unwrap(), FilterAction::Ignore);
        assert_eq!("error".parse::<FilterAction>().unwrap(), FilterAction::EscalateToError);
        assert_eq!(
            "escalate-to-error".parse::<FilterAction>().unwrap(),
            FilterAction::EscalateToError
        );
    }

    #[test]
    fn test_parse_unknown() {
        let err = "loud".parse::<FilterAction>().unwrap_err();
        assert_eq!(err, ParseActionError("loud".to_string()));
    }

    #[test]
    fn test_display_matches_serde() {
        for action in FilterAction::ALL {
            let json = serde_json::to_string(&action).unwrap();
            assert_eq!(json, format!("\"{}\"", action));
            assert_eq!(action.as_str().parse::<FilterAction>().unwrap(), action);
        }
    }

    #[test]
    fn test_serde_alias() {
        let action: FilterAction = serde_json::from_str("\"once\"").unwrap();
        assert_eq!(action, FilterAction::DisplayOnce);
    }

    #[test]
    fn test_displays() {
        assert!(FilterAction::DisplayAlways.displays());
        assert!(FilterAction::DisplayOnce.displays());
        assert!(!FilterAction::Ignore.displays());
        assert!(!FilterAction::EscalateToError.displays());
    }
}
