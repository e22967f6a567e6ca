//! Scenario tests for warning filtering.
//!
//! These tests drive a router end to end: register a taxonomy, set filters,
//! emit, and check what reached the sink.

use std::sync::Arc;

use mdao_warnings::{
    ActionSource, CaptureSink, CategoryRegistry, EmissionRouter, EmitError, EmitOutcome,
    FilterAction, Location, WarningConfig,
};

// ─────────────────────────────────────────────────────────────────────────────
// Test Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn loc() -> Location {
    Location::new("problem.rs", 42, 9)
}

fn root_units_registry() -> Arc<CategoryRegistry> {
    let mut registry = CategoryRegistry::new();
    registry
        .register("root", None, "Base warning", Some(FilterAction::DisplayAlways))
        .unwrap();
    registry
        .register("units", Some("root"), "Unit problems", Some(FilterAction::DisplayAlways))
        .unwrap();
    Arc::new(registry)
}

fn builtin_router() -> (EmissionRouter, Arc<CaptureSink>) {
    let sink = Arc::new(CaptureSink::new());
    let router = EmissionRouter::with_sink(Arc::new(CategoryRegistry::builtin()), Arc::clone(&sink));
    (router, sink)
}

// ─────────────────────────────────────────────────────────────────────────────
// Documented Scenarios
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_ignore_then_reset_restores_output() {
    let sink = Arc::new(CaptureSink::new());
    let router = EmissionRouter::with_sink(root_units_registry(), Arc::clone(&sink));

    router.set_filter("units", FilterAction::Ignore).unwrap();
    router.emit("units", "mismatch", loc()).unwrap();
    assert!(sink.is_empty(), "ignored warning must produce no output");

    router.reset_to_defaults();
    router.emit("units", "mismatch", loc()).unwrap();
    assert_eq!(sink.lines(), vec!["problem.rs:42: units: mismatch".to_string()]);
}

#[test]
fn test_root_escalation_reaches_child() {
    let sink = Arc::new(CaptureSink::new());
    let router = EmissionRouter::with_sink(root_units_registry(), Arc::clone(&sink));

    router.set_filter("root", FilterAction::EscalateToError).unwrap();

    match router.emit("units", "x", loc()) {
        Err(EmitError::Escalated(e)) => {
            assert_eq!(e.category(), "units");
            assert_eq!(e.message(), "x");
            assert_eq!(e.location(), &loc());
        }
        other => panic!("expected escalation, got {other:?}"),
    }
    assert!(sink.is_empty());
}

// ─────────────────────────────────────────────────────────────────────────────
// Built-in Taxonomy
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_builtin_defaults_after_reset() {
    let (router, _sink) = builtin_router();
    let registry = Arc::clone(router.registry());

    router.set_filter("mdao", FilterAction::Ignore).unwrap();
    router.set_filter("cache", FilterAction::EscalateToError).unwrap();
    router.reset_to_defaults();

    for category in registry.iter() {
        assert_eq!(
            router.effective_action(category.name()).unwrap(),
            registry.default_action(category.id()),
            "category {} should be back to its default",
            category.name()
        );
    }
}

#[test]
fn test_setup_filter_with_specific_override() {
    let (router, sink) = builtin_router();

    router.set_filter("setup", FilterAction::EscalateToError).unwrap();
    router.set_filter("units", FilterAction::DisplayOnce).unwrap();

    assert!(router.emit("promotion", "'x' promoted from two inputs", loc()).is_err());
    assert!(router.emit("mpi", "MPI not available", loc()).is_err());

    assert_eq!(router.emit("units", "no units on 'y'", loc()).unwrap(), EmitOutcome::Displayed);
    assert_eq!(router.emit("units", "no units on 'y'", loc()).unwrap(), EmitOutcome::Suppressed);

    // Outside the subtree, defaults still apply.
    assert_eq!(router.emit("solver", "did not converge", loc()).unwrap(), EmitOutcome::Displayed);
    assert_eq!(sink.count_for("units"), 1);
    assert_eq!(sink.count_for("solver"), 1);

    let resolved = router.resolve_action("mpi").unwrap();
    let setup = router.registry().resolve("setup").unwrap().id();
    assert_eq!(resolved.source, ActionSource::Inherited(setup));
}

#[test]
fn test_later_child_override_beats_earlier_parent() {
    let (router, _sink) = builtin_router();
    router.set_filter("derivatives", FilterAction::Ignore).unwrap();
    assert_eq!(router.effective_action("coloring").unwrap(), FilterAction::Ignore);

    router.set_filter("coloring", FilterAction::DisplayAlways).unwrap();
    assert_eq!(router.effective_action("coloring").unwrap(), FilterAction::DisplayAlways);
    assert_eq!(router.effective_action("derivatives").unwrap(), FilterAction::Ignore);
}

#[test]
fn test_parent_override_beats_child_default() {
    let (router, _sink) = builtin_router();
    assert_eq!(router.effective_action("deprecation").unwrap(), FilterAction::DisplayOnce);

    router.set_filter("mdao", FilterAction::DisplayAlways).unwrap();
    assert_eq!(router.effective_action("deprecation").unwrap(), FilterAction::DisplayAlways);
}

#[test]
fn test_exact_root_filter_leaves_taxonomy_alone() {
    let (router, sink) = builtin_router();
    router.set_filter_exact("mdao", FilterAction::Ignore).unwrap();

    assert_eq!(router.emit("mdao", "generic", loc()).unwrap(), EmitOutcome::Ignored);
    assert_eq!(router.emit("units", "no units", loc()).unwrap(), EmitOutcome::Displayed);
    assert_eq!(router.effective_action("deprecation").unwrap(), FilterAction::DisplayOnce);
    assert_eq!(sink.len(), 1);
}

#[test]
fn test_deprecation_once_per_message() {
    let (router, sink) = builtin_router();
    for _ in 0..5 {
        router.emit("deprecation", "'method' option is deprecated", loc()).unwrap();
    }
    router.emit("deprecation", "'rtol' option is deprecated", loc()).unwrap();
    assert_eq!(sink.len(), 2);
}

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_directives_applied_in_order() {
    let (router, _sink) = builtin_router();
    let config =
        WarningConfig::from_directives("units=ignore,units=error,driver*=once,setup=ignore,!derivatives=error")
            .unwrap();
    router.apply_config(&config).unwrap();

    assert_eq!(router.effective_action("units").unwrap(), FilterAction::EscalateToError);
    assert_eq!(router.effective_action("driver").unwrap(), FilterAction::DisplayOnce);
    assert_eq!(router.effective_action("mpi").unwrap(), FilterAction::Ignore);
    assert_eq!(router.effective_action("derivatives").unwrap(), FilterAction::EscalateToError);
    assert_eq!(router.effective_action("coloring").unwrap(), FilterAction::DisplayAlways);
    assert_eq!(router.policy().len(), 4);
}

#[test]
fn test_unknown_category_in_config_rejected() {
    let (router, _sink) = builtin_router();
    let config = WarningConfig::from_directives("units=ignore,recorder=ignore").unwrap();
    let err = router.apply_config(&config).unwrap_err();
    assert_eq!(err.0, "recorder");
    assert!(router.policy().is_default());
}

#[test]
fn test_snapshot_json_round() {
    let (router, _sink) = builtin_router();
    router.set_filter("units", FilterAction::Ignore).unwrap();
    let json = serde_json::to_value(router.snapshot()).unwrap();
    assert_eq!(json["actions"]["units"], "ignore");
    assert_eq!(json["actions"]["deprecation"], "display-once");
    assert_eq!(json["actions"]["mdao"], "display-always");
}

// ─────────────────────────────────────────────────────────────────────────────
// Concurrency
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_display_once_across_threads() {
    let (router, sink) = builtin_router();
    let router = Arc::new(router);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let router = Arc::clone(&router);
            std::thread::spawn(move || {
                for _ in 0..50 {
                    router.emit("cache", "stale coloring file", loc()).unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(sink.len(), 1, "display-once must show a triple exactly once across threads");
}
