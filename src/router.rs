//! Emission router: the single path every warning takes.
//!
//! ## Dispatch
//!
//! | Effective action | Result |
//! |------------------|--------|
//! | `display-always` | written to the sink, `Ok(Displayed)` |
//! | `display-once` | written the first time the (category, message, location) triple is seen, then `Ok(Suppressed)` |
//! | `ignore` | nothing, `Ok(Ignored)` |
//! | `escalate-to-error` | nothing written, `Err(EmitError::Escalated)` |
//!
//! An emission against an unregistered category is a caller bug and always
//! fails with [`EmitError::UnknownCategory`], whatever the policy.
//!
//! ## Shared State
//!
//! The policy store sits behind a `RwLock` (many emitters, rare writers) and
//! the display-once dedup set behind a `Mutex`. Only those two and the sink
//! are touched by an emission.

use std::collections::HashSet;
use std::hash::Hasher;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use xxhash_rust::xxh64::Xxh64;

use crate::config::WarningConfig;
use crate::policy::{FilterPolicyStore, PolicySnapshot, ResolvedAction};
use crate::registry::{CategoryRegistry, UnknownCategoryError};
use crate::sink::{DiagnosticSink, StderrSink};
use crate::types::{Emission, FilterAction, FilterScope, Location};

/// A warning whose effective action was `escalate-to-error`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{emission}")]
pub struct EscalatedWarningError {
    /// The escalated emission.
    pub emission: Emission,
}

impl EscalatedWarningError {
    /// Category of the escalated warning.
    pub fn category(&self) -> &str {
        &self.emission.category
    }

    /// Warning text, without prefix.
    pub fn message(&self) -> &str {
        &self.emission.message
    }

    /// Where the warning was issued.
    pub fn location(&self) -> &Location {
        &self.emission.location
    }
}

/// Error returned by [`EmissionRouter::emit`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EmitError {
    /// Category was never registered.
    #[error(transparent)]
    UnknownCategory(#[from] UnknownCategoryError),

    /// Warning escalated to an error by policy.
    #[error("Warning escalated to error: {0}")]
    Escalated(#[from] EscalatedWarningError),
}

impl EmitError {
    /// The escalated warning, if this is an escalation.
    pub fn escalated(&self) -> Option<&EscalatedWarningError> {
        match self {
            Self::Escalated(e) => Some(e),
            Self::UnknownCategory(_) => None,
        }
    }
}

/// What happened to a successfully routed emission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmitOutcome {
    /// Written to the sink.
    Displayed,
    /// Dropped as a repeat under `display-once`.
    Suppressed,
    /// Dropped under `ignore`.
    Ignored,
}

impl EmitOutcome {
    /// Whether the warning reached the sink.
    pub fn is_displayed(&self) -> bool {
        matches!(self, Self::Displayed)
    }
}

/// Key of the display-once dedup set.
///
/// Computed from the exact (category, message, location) triple. Each field
/// is length-prefixed so adjacent fields cannot run together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct DedupKey(u64);

impl DedupKey {
    fn compute(emission: &Emission) -> Self {
        let mut hasher = Xxh64::new(0);

        write_field(&mut hasher, emission.category.as_bytes());
        write_field(&mut hasher, emission.full_message().as_bytes());
        write_field(&mut hasher, emission.location.file.as_bytes());
        hasher.write_u32(emission.location.line);
        hasher.write_u32(emission.location.column);

        Self(hasher.finish())
    }
}

fn write_field(hasher: &mut Xxh64, bytes: &[u8]) {
    hasher.write_u64(bytes.len() as u64);
    hasher.write(bytes);
}

/// Routes warnings through the filter policy to a sink.
///
/// Thread-safe; share it behind `Arc` or a `static`.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use mdao_warnings::{CaptureSink, CategoryRegistry, EmissionRouter, FilterAction, Location};
///
/// let sink = Arc::new(CaptureSink::new());
/// let router = EmissionRouter::with_sink(Arc::new(CategoryRegistry::builtin()), Arc::clone(&sink));
///
/// router.set_filter("units", FilterAction::Ignore).unwrap();
/// router.emit("units", "unitless connection", Location::caller()).unwrap();
/// assert!(sink.is_empty());
///
/// router.reset_to_defaults();
/// router.emit("units", "unitless connection", Location::caller()).unwrap();
/// assert_eq!(sink.len(), 1);
/// ```
pub struct EmissionRouter {
    registry: Arc<CategoryRegistry>,
    policy: RwLock<FilterPolicyStore>,
    seen: Mutex<HashSet<DedupKey>>,
    sink: Box<dyn DiagnosticSink>,
}

impl std::fmt::Debug for EmissionRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmissionRouter")
            .field("categories", &self.registry.len())
            .field("overrides", &self.policy.read().len())
            .field("seen", &self.seen.lock().len())
            .finish_non_exhaustive()
    }
}

impl EmissionRouter {
    /// Create a router writing to standard error.
    pub fn new(registry: Arc<CategoryRegistry>) -> Self {
        Self::with_sink(registry, StderrSink)
    }

    /// Create a router writing to the given sink.
    pub fn with_sink(registry: Arc<CategoryRegistry>, sink: impl DiagnosticSink + 'static) -> Self {
        Self::with_boxed_sink(registry, Box::new(sink))
    }

    /// Create a router from an already boxed sink.
    pub fn with_boxed_sink(registry: Arc<CategoryRegistry>, sink: Box<dyn DiagnosticSink>) -> Self {
        Self {
            policy: RwLock::new(FilterPolicyStore::new(Arc::clone(&registry))),
            registry,
            seen: Mutex::new(HashSet::new()),
            sink,
        }
    }

    /// Create a router from a configuration: its sink and its filters.
    pub fn from_config(
        registry: Arc<CategoryRegistry>,
        config: &WarningConfig,
    ) -> Result<Self, UnknownCategoryError> {
        let router = Self::with_boxed_sink(registry, config.output.into_sink());
        router.apply_config(config)?;
        Ok(router)
    }

    /// Registry this router resolves against.
    pub fn registry(&self) -> &Arc<CategoryRegistry> {
        &self.registry
    }

    /// Route a warning.
    ///
    /// # Errors
    /// - [`EmitError::UnknownCategory`] if `category` is not registered
    /// - [`EmitError::Escalated`] if the effective action is `escalate-to-error`
    pub fn emit(
        &self,
        category: &str,
        message: impl Into<String>,
        location: Location,
    ) -> Result<EmitOutcome, EmitError> {
        self.dispatch(Emission::new(category, message, location))
    }

    /// Route a fully built emission.
    pub fn dispatch(&self, emission: Emission) -> Result<EmitOutcome, EmitError> {
        let category = self.registry.resolve(&emission.category)?.id();
        let action = self.policy.read().effective_action(category);

        match action {
            FilterAction::DisplayAlways => {
                self.sink.write(&emission);
                Ok(EmitOutcome::Displayed)
            }
            FilterAction::DisplayOnce => {
                let first = self.seen.lock().insert(DedupKey::compute(&emission));
                if first {
                    self.sink.write(&emission);
                    Ok(EmitOutcome::Displayed)
                } else {
                    tracing::trace!(
                        category = %emission.category,
                        location = %emission.location,
                        "repeated warning suppressed"
                    );
                    Ok(EmitOutcome::Suppressed)
                }
            }
            FilterAction::Ignore => {
                tracing::trace!(category = %emission.category, "warning ignored by filter");
                Ok(EmitOutcome::Ignored)
            }
            FilterAction::EscalateToError => {
                tracing::debug!(
                    category = %emission.category,
                    location = %emission.location,
                    "warning escalated to error"
                );
                Err(EscalatedWarningError { emission }.into())
            }
        }
    }

    /// Override the action for a category and every descendant that has no
    /// override of its own.
    pub fn set_filter(&self, category: &str, action: FilterAction) -> Result<(), UnknownCategoryError> {
        self.set_filter_scoped(category, action, FilterScope::Subtree)
    }

    /// Override the action for exactly one category; descendants keep theirs.
    pub fn set_filter_exact(&self, category: &str, action: FilterAction) -> Result<(), UnknownCategoryError> {
        self.set_filter_scoped(category, action, FilterScope::Exact)
    }

    /// Override the action for a category with an explicit scope.
    pub fn set_filter_scoped(
        &self,
        category: &str,
        action: FilterAction,
        scope: FilterScope,
    ) -> Result<(), UnknownCategoryError> {
        let id = self.registry.resolve(category)?.id();
        self.policy.write().set_filter_scoped(id, action, scope)?;
        tracing::debug!(category, %action, ?scope, "warning filter set");
        Ok(())
    }

    /// Remove the override on one category. Returns whether one was set.
    pub fn clear_filter(&self, category: &str) -> Result<bool, UnknownCategoryError> {
        let id = self.registry.resolve(category)?.id();
        Ok(self.policy.write().clear(id).is_some())
    }

    /// Effective action for a category.
    pub fn effective_action(&self, category: &str) -> Result<FilterAction, UnknownCategoryError> {
        Ok(self.resolve_action(category)?.action)
    }

    /// Effective action for a category and where it comes from.
    pub fn resolve_action(&self, category: &str) -> Result<ResolvedAction, UnknownCategoryError> {
        let id = self.registry.resolve(category)?.id();
        Ok(self.policy.read().resolve_action(id))
    }

    /// Apply every filter of a configuration.
    ///
    /// All categories are resolved first; if any is unknown nothing is applied.
    /// The configured output target is not applied; it only matters when the
    /// router is built with [`EmissionRouter::from_config`].
    pub fn apply_config(&self, config: &WarningConfig) -> Result<(), UnknownCategoryError> {
        let resolved = config
            .filters
            .iter()
            .map(|d| Ok((self.registry.resolve(&d.category)?.id(), d.action, d.scope)))
            .collect::<Result<Vec<_>, UnknownCategoryError>>()?;

        let mut policy = self.policy.write();
        for (id, action, scope) in resolved {
            policy.set_filter_scoped(id, action, scope)?;
        }
        tracing::debug!(filters = config.filters.len(), "warning config applied");
        Ok(())
    }

    /// Copy of the current policy store.
    pub fn policy(&self) -> FilterPolicyStore {
        self.policy.read().clone()
    }

    /// Effective action of every category.
    pub fn snapshot(&self) -> PolicySnapshot {
        self.policy.read().snapshot()
    }

    /// Number of distinct triples recorded by `display-once`.
    pub fn seen_len(&self) -> usize {
        self.seen.lock().len()
    }

    /// Clear every filter override. The dedup set is kept.
    pub fn reset_filters(&self) {
        self.policy.write().reset();
    }

    /// Restore defaults: clear every override and forget every triple seen
    /// under `display-once`. Idempotent.
    pub fn reset_to_defaults(&self) {
        self.policy.write().reset();
        self.seen.lock().clear();
        tracing::debug!("warning filters reset to defaults");
    }
}
