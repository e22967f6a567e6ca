//! Process-wide warnings router.
//!
//! The router is built on first use from [`CategoryRegistry::builtin`] and
//! the `MDAO_WARNINGS` / `MDAO_WARNINGS_OUTPUT` environment variables, then
//! lives for the rest of the process. Everything here is a thin wrapper over
//! [`router()`]; code that wants its own taxonomy or sink should build an
//! [`EmissionRouter`] directly.
//!
//! ## Test Isolation
//!
//! Filters set by one test would leak into the next through this shared
//! router. Tests that touch it take an [`IsolationGuard`]:
//!
//! ```rust
//! use mdao_warnings::{isolate, set_filter, FilterAction};
//!
//! let _guard = isolate();
//! set_filter("units", FilterAction::Ignore).unwrap();
//! // defaults are restored when `_guard` drops
//! ```

use std::sync::{Arc, OnceLock};

use parking_lot::{Mutex, MutexGuard};

use crate::config::{WarningConfig, FILTER_ENV_VAR, OUTPUT_ENV_VAR};
use crate::registry::{CategoryRegistry, UnknownCategoryError, DEPRECATION_CATEGORY};
use crate::router::{EmitError, EmitOutcome, EmissionRouter};
use crate::types::{Emission, FilterAction, Location};

static ROUTER: OnceLock<EmissionRouter> = OnceLock::new();

static ISOLATION: Mutex<()> = parking_lot::const_mutex(());

/// The process-wide router.
pub fn router() -> &'static EmissionRouter {
    ROUTER.get_or_init(build_router)
}

fn build_router() -> EmissionRouter {
    let filters = std::env::var(FILTER_ENV_VAR).ok();
    let output = std::env::var(OUTPUT_ENV_VAR).ok();
    router_from_vars(
        Arc::new(CategoryRegistry::builtin()),
        filters.as_deref(),
        output.as_deref(),
    )
}

/// Build a router from raw variable values. Bad configuration is logged and
/// dropped so that startup never fails: an unparsable value discards the
/// whole configuration, an unknown category discards every filter.
pub(crate) fn router_from_vars(
    registry: Arc<CategoryRegistry>,
    filters: Option<&str>,
    output: Option<&str>,
) -> EmissionRouter {
    let config = WarningConfig::from_vars(filters, output).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "ignoring invalid warning configuration from environment");
        WarningConfig::default()
    });

    let router = EmissionRouter::with_boxed_sink(registry, config.output.into_sink());
    if let Err(e) = router.apply_config(&config) {
        tracing::warn!(error = %e, "ignoring warning filters from environment");
    }
    router
}

/// Issue a warning from the caller's location.
#[track_caller]
pub fn issue_warning(category: &str, message: impl Into<String>) -> Result<EmitOutcome, EmitError> {
    router().emit(category, message, Location::caller())
}

/// Issue a warning prefixed with the name of the object raising it,
/// typically a model pathname.
#[track_caller]
pub fn issue_warning_with_prefix(
    category: &str,
    prefix: impl Into<String>,
    message: impl Into<String>,
) -> Result<EmitOutcome, EmitError> {
    let emission = Emission::new(category, message, Location::caller()).with_prefix(prefix);
    router().dispatch(emission)
}

/// Issue a deprecation warning.
#[track_caller]
pub fn warn_deprecation(message: impl Into<String>) -> Result<EmitOutcome, EmitError> {
    router().emit(DEPRECATION_CATEGORY, message, Location::caller())
}

/// Override the action for a category and every descendant without an
/// override of its own.
pub fn set_filter(category: &str, action: FilterAction) -> Result<(), UnknownCategoryError> {
    router().set_filter(category, action)
}

/// Override the action for exactly one category.
pub fn set_filter_exact(category: &str, action: FilterAction) -> Result<(), UnknownCategoryError> {
    router().set_filter_exact(category, action)
}

/// Restore every filter to its default and forget display-once history.
pub fn reset_warnings() {
    router().reset_to_defaults();
}

/// Exclusive, reset access to the process-wide router for one test.
///
/// Resets on acquire and again on drop. Guards are serialized, so two tests
/// holding one never interleave.
#[must_use = "the router is only isolated while the guard is held"]
pub struct IsolationGuard {
    _lock: MutexGuard<'static, ()>,
}

impl Drop for IsolationGuard {
    fn drop(&mut self) {
        reset_warnings();
    }
}

/// Acquire an [`IsolationGuard`], blocking until no other test holds one.
pub fn isolate() -> IsolationGuard {
    let lock = ISOLATION.lock();
    reset_warnings();
    IsolationGuard { _lock: lock }
}
