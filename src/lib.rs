//! # mdao-warnings
//!
//! Warning categories and user-controllable filter policies for a
//! multidisciplinary design optimization framework.
//!
//! The subsystem answers one question:
//!
//! > A component noticed something questionable. What does the user see?
//!
//! ## Core Contract
//!
//! 1. Warnings belong to a category in a fixed tree ([`CategoryRegistry`])
//! 2. Each category has an effective [`FilterAction`]: its compiled-in default
//!    unless the user overrides it ([`FilterPolicyStore`])
//! 3. Every warning goes through one router that displays, deduplicates,
//!    ignores, or escalates it to an error ([`EmissionRouter`])
//! 4. One call restores all defaults, so tests stay isolated
//!    ([`EmissionRouter::reset_to_defaults`], [`isolate`])
//!
//! ## Architecture
//!
//! ```text
//! issue_warning(category, message) → EmissionRouter → FilterPolicyStore → action
//!                                          ↓                  ↓
//!                                    DiagnosticSink    CategoryRegistry (defaults)
//! ```
//!
//! ## Resolution Guarantees
//!
//! - An override on a category beats anything inherited
//! - A subtree override reaches every descendant without a nearer override
//! - Without overrides, the category's own default applies, else the nearest
//!   ancestor's, ending at the root which always has one

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod types;
pub mod registry;
pub mod policy;
pub mod router;
pub mod sink;
pub mod config;
pub mod global;

// Re-exports
pub use types::{CategoryId, Emission, FilterAction, FilterScope, Location, ParseActionError, WarningCategory};
pub use registry::{CategoryRegistry, RegistryError, UnknownCategoryError, DEPRECATION_CATEGORY, ROOT_CATEGORY};
pub use policy::{ActionSource, FilterPolicyStore, PolicyOverride, PolicySnapshot, ResolvedAction};
pub use router::{EmissionRouter, EmitError, EmitOutcome, EscalatedWarningError};
pub use sink::{
    CaptureSink, DiagnosticSink, NoOpSink, OutputTarget, ParseOutputError, StderrSink, TracingSink, WriterSink,
};
pub use config::{ConfigError, FilterDirective, WarningConfig, FILTER_ENV_VAR, OUTPUT_ENV_VAR};
pub use global::{
    isolate, issue_warning, issue_warning_with_prefix, reset_warnings, router,
    set_filter, set_filter_exact, warn_deprecation, IsolationGuard,
};
