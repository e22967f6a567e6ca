//! Warning Report Binary
//!
//! Prints the built-in warning category tree with each category's effective
//! filter action and where that action comes from.
//!
//! ## Configuration
//!
//! Environment variables:
//! - `MDAO_WARNINGS`: filter directives, e.g. `units=ignore,setup*=error`
//! - `RUST_LOG`: Log level filter (default: warn)
//! - `LOG_FORMAT`: "json" for structured logs, "pretty" for development (default: pretty)
//!
//! ## Usage
//!
//! ```bash
//! MDAO_WARNINGS='setup*=error' cargo run --bin warning_report
//! cargo run --bin warning_report -- --config warnings.json --json
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use mdao_warnings::{
    ActionSource, CategoryId, CategoryRegistry, EmissionRouter, FilterPolicyStore, FilterScope,
    NoOpSink, WarningConfig,
};

/// Initialize the tracing subscriber with JSON or pretty format, on stderr.
fn init_tracing() {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into());

    if log_format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_writer(std::io::stderr)
                    .flatten_event(true),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}

/// Print the warning category tree and each category's effective filter action.
#[derive(Parser, Debug)]
#[command(name = "warning_report")]
#[command(version)]
#[command(about = "Show effective warning filter actions", long_about = None)]
struct Cli {
    /// Print a JSON snapshot of effective actions instead of the tree
    #[arg(long)]
    json: bool,

    /// Read filters from a JSON config file instead of MDAO_WARNINGS
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

fn load_config(path: Option<&Path>) -> Result<WarningConfig, Box<dyn std::error::Error>> {
    match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)?;
            info!(path = %path.display(), "loading warning config");
            Ok(WarningConfig::from_json(&text)?)
        }
        None => Ok(WarningConfig::from_env()?),
    }
}

fn describe(policy: &FilterPolicyStore, source: ActionSource) -> String {
    match source {
        ActionSource::Default => "default".to_string(),
        ActionSource::Override(FilterScope::Exact) => "override".to_string(),
        ActionSource::Override(FilterScope::Subtree) => "override, subtree".to_string(),
        ActionSource::Inherited(from) => match policy.registry().get(from) {
            Some(ancestor) => format!("inherited from {}", ancestor.name()),
            None => format!("inherited from {from}"),
        },
    }
}

fn print_tree(policy: &FilterPolicyStore, id: CategoryId, depth: usize) {
    let registry = policy.registry();
    let Some(category) = registry.get(id) else {
        return;
    };
    let resolved = policy.resolve_action(id);
    let label = format!("{}{}", "  ".repeat(depth), category.name());

    println!(
        "{:<40} {:<18} ({})",
        label,
        resolved.action.as_str(),
        describe(policy, resolved.source)
    );

    for child in registry.children(id) {
        print_tree(policy, child.id(), depth + 1);
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    let registry = Arc::new(CategoryRegistry::builtin());
    let router = EmissionRouter::with_sink(registry, NoOpSink);
    router.apply_config(&config)?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&router.snapshot())?);
        return Ok(());
    }

    let policy = router.policy();
    if let Some(root) = policy.registry().root() {
        print_tree(&policy, root.id(), 0);
    }

    Ok(())
}
