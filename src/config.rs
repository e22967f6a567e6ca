//! Warning filter configuration.
//!
//! ## Directive Syntax
//!
//! `MDAO_WARNINGS` holds comma-separated directives:
//!
//! ```text
//! units=ignore,setup=error,!mdao=always
//! ```
//!
//! - `category=action` overrides the category and every descendant without
//!   an override of its own
//! - `category*=action` is the same, with the subtree spelled out
//! - `!category=action` overrides exactly that category
//!
//! Actions accept `always`, `once`, `ignore`, `error` and their long forms.
//!
//! `MDAO_WARNINGS_OUTPUT` selects the sink: `stderr` (default), `tracing`
//! or `silent`.
//!
//! The same configuration can be given as JSON:
//!
//! ```json
//! {"filters": [{"category": "setup", "action": "error", "scope": "subtree"}],
//!  "output": "tracing"}
//! ```

use serde::{Deserialize, Serialize};

use crate::sink::{OutputTarget, ParseOutputError};
use crate::types::{FilterAction, FilterScope, ParseActionError};

/// Environment variable holding filter directives.
pub const FILTER_ENV_VAR: &str = "MDAO_WARNINGS";

/// Environment variable selecting the output sink.
pub const OUTPUT_ENV_VAR: &str = "MDAO_WARNINGS_OUTPUT";

/// Error raised while reading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Directive is not of the form `category=action`, `category*=action`
    /// or `!category=action`.
    #[error("Malformed filter directive {0:?}: expected category=action, category*=action or !category=action")]
    MalformedDirective(String),

    /// Directive names an action that does not exist.
    #[error("Invalid action in filter directive {directive:?}: {source}")]
    InvalidAction {
        /// The offending directive.
        directive: String,
        /// Parse failure.
        source: ParseActionError,
    },

    /// Output target is not recognized.
    #[error(transparent)]
    UnknownOutput(#[from] ParseOutputError),

    /// JSON configuration did not parse.
    #[error("Invalid JSON warning config: {0}")]
    Json(#[from] serde_json::Error),
}

/// One filter override to apply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterDirective {
    /// Category name.
    pub category: String,
    /// Action to set.
    pub action: FilterAction,
    /// Reach of the override; subtree when omitted.
    #[serde(default)]
    pub scope: FilterScope,
}

impl FilterDirective {
    /// Create a directive.
    pub fn new(category: impl Into<String>, action: FilterAction, scope: FilterScope) -> Self {
        Self {
            category: category.into(),
            action,
            scope,
        }
    }
}

impl std::str::FromStr for FilterDirective {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (key, value) = s
            .split_once('=')
            .ok_or_else(|| ConfigError::MalformedDirective(s.to_string()))?;

        let key = key.trim();
        let (category, scope) = match (key.strip_prefix('!'), key.strip_suffix('*')) {
            (Some(_), Some(_)) => return Err(ConfigError::MalformedDirective(s.to_string())),
            (Some(category), None) => (category.trim_start(), FilterScope::Exact),
            (None, Some(category)) => (category.trim_end(), FilterScope::Subtree),
            (None, None) => (key, FilterScope::Subtree),
        };
        if category.is_empty() {
            return Err(ConfigError::MalformedDirective(s.to_string()));
        }

        let action = value.parse::<FilterAction>().map_err(|source| ConfigError::InvalidAction {
            directive: s.to_string(),
            source,
        })?;

        Ok(Self::new(category, action, scope))
    }
}

/// Complete warnings configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarningConfig {
    /// Overrides, applied in order.
    #[serde(default)]
    pub filters: Vec<FilterDirective>,
    /// Sink for displayed warnings.
    #[serde(default)]
    pub output: OutputTarget,
}

impl WarningConfig {
    /// Parse a comma-separated directive list. Empty items are skipped.
    pub fn from_directives(spec: &str) -> Result<Self, ConfigError> {
        let filters = spec
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::parse)
            .collect::<Result<Vec<FilterDirective>, _>>()?;

        Ok(Self {
            filters,
            output: OutputTarget::default(),
        })
    }

    /// Parse the JSON form.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Build from raw variable values; `None` means unset.
    pub fn from_vars(filters: Option<&str>, output: Option<&str>) -> Result<Self, ConfigError> {
        let mut config = match filters {
            Some(spec) => Self::from_directives(spec)?,
            None => Self::default(),
        };
        if let Some(output) = output {
            config.output = output.parse::<OutputTarget>()?;
        }
        Ok(config)
    }

    /// Read `MDAO_WARNINGS` and `MDAO_WARNINGS_OUTPUT`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let filters = std::env::var(FILTER_ENV_VAR).ok();
        let output = std::env::var(OUTPUT_ENV_VAR).ok();
        Self::from_vars(filters.as_deref(), output.as_deref())
    }

    /// Append a directive.
    pub fn with_filter(mut self, directive: FilterDirective) -> Self {
        self.filters.push(directive);
        self
    }

    /// Set the output target.
    pub fn with_output(mut self, output: OutputTarget) -> Self {
        self.output = output;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_directives() {
        let config = WarningConfig::from_directives(" units=ignore, setup*=error,,! mdao = always ").unwrap();
        assert_eq!(
            config.filters,
            vec![
                FilterDirective::new("units", FilterAction::Ignore, FilterScope::Subtree),
                FilterDirective::new("setup", FilterAction::EscalateToError, FilterScope::Subtree),
                FilterDirective::new("mdao", FilterAction::DisplayAlways, FilterScope::Exact),
            ]
        );
        assert_eq!(config.output, OutputTarget::Stderr);
    }

    #[test]
    fn test_empty_spec() {
        assert!(WarningConfig::from_directives("").unwrap().filters.is_empty());
        assert!(WarningConfig::from_directives(" , ").unwrap().filters.is_empty());
    }

    #[test]
    fn test_malformed_directive() {
        assert!(matches!(
            WarningConfig::from_directives("units"),
            Err(ConfigError::MalformedDirective(_))
        ));
        for bad in ["*=ignore", "!=ignore", "!setup*=ignore"] {
            assert!(matches!(
                WarningConfig::from_directives(bad),
                Err(ConfigError::MalformedDirective(_))
            ));
        }
    }

    #[test]
    fn test_invalid_action() {
        let err = WarningConfig::from_directives("units=shout").unwrap_err();
        match err {
            ConfigError::InvalidAction { directive, .. } => assert_eq!(directive, "units=shout"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_from_vars_output() {
        let config = WarningConfig::from_vars(Some("units=once"), Some("tracing")).unwrap();
        assert_eq!(config.output, OutputTarget::Tracing);
        assert_eq!(config.filters.len(), 1);

        match WarningConfig::from_vars(None, Some("pager")) {
            Err(ConfigError::UnknownOutput(err)) => assert_eq!(err, ParseOutputError("pager".to_string())),
            other => panic!("unexpected result: {other:?}"),
        }
        assert_eq!(WarningConfig::from_vars(None, None).unwrap(), WarningConfig::default());
    }

    #[test]
    fn test_from_json() {
        let config = WarningConfig::from_json(
            r#"{"filters":[{"category":"setup","action":"error","scope":"subtree"},
                           {"category":"units","action":"display-once"}],
                "output":"silent"}"#,
        )
        .unwrap();
        assert_eq!(config.output, OutputTarget::Silent);
        assert_eq!(config.filters[0].scope, FilterScope::Subtree);
        assert_eq!(config.filters[1].scope, FilterScope::Subtree);
        assert_eq!(config.filters[1].action, FilterAction::DisplayOnce);

        assert!(matches!(WarningConfig::from_json("{"), Err(ConfigError::Json(_))));
    }
}
