use anyhow::{Context, Result};
use clap::Parser;
use std::collections::HashMap;
use tracing_subscriber::EnvFilter;
use veredicto::cli::Cli;
use veredicto::config::EngineConfig;
use veredicto::ledger::EvidenceLedger;
use veredicto::pipeline::{compute_evidence, EvidenceOptions, Repositories};
use veredicto::store::InMemoryRepository;

/// Initialize tracing subscriber for debug output
fn init_tracing(debug: bool) {
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into()),
            )
            .with_writer(std::io::stderr)
            .init();
    }
}

fn main() -> Result<()> {
    let args = Cli::parse();

    // Initialize tracing if --debug flag is set
    init_tracing(args.debug);

    let config = match &args.config {
        Some(path) => EngineConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None if args.strict => EngineConfig::strict(),
        None => EngineConfig::default(),
    };

    let input = std::fs::read_to_string(&args.input)
        .with_context(|| format!("failed to read input {}", args.input.display()))?;
    let repository = InMemoryRepository::from_json(&input)
        .with_context(|| format!("failed to parse input {}", args.input.display()))?;

    let mut options = EvidenceOptions::new(args.as_of).with_config(config);
    if !args.metrics.is_empty() {
        options = options.with_metrics(args.metrics.clone());
    }

    let evidence = compute_evidence(
        &Repositories::single(&repository),
        &args.user,
        &args.protocol,
        &options,
    )?;

    if let Some(path) = &args.ledger {
        let (mut ledger, skipped) = EvidenceLedger::load(path)
            .with_context(|| format!("failed to load ledger {}", path.display()))?;
        if skipped > 0 {
            tracing::warn!(skipped, "ledger contained malformed entries");
        }

        let observed: HashMap<_, _> = evidence
            .metrics
            .iter()
            .map(|m| (m.metric, m.effect.direction))
            .collect();
        let resolved =
            ledger.resolve_due_predictions_for(&args.user, &args.protocol, args.as_of, &observed);
        let recorded = ledger.record_evidence(&evidence);
        tracing::debug!(
            resolved = resolved.len(),
            recorded = recorded.len(),
            "ledger updated"
        );

        ledger
            .save(path)
            .with_context(|| format!("failed to save ledger {}", path.display()))?;
    }

    let json = if args.pretty {
        serde_json::to_string_pretty(&evidence)?
    } else {
        serde_json::to_string(&evidence)?
    };
    println!("{}", json);

    Ok(())
}
