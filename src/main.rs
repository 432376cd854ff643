use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::time::Instant;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use recovery_pilot::cli::{
    Cli, Commands, ConfigAction, Display, OutputWriter, ScriptedProbe, SimulationOutput,
    SimulationPlan,
};
use recovery_pilot::config::PilotConfig;
use recovery_pilot::error::{RecoveryError, Result};
use recovery_pilot::recovery::{ErrorCategory, MessageClassifier, RecoveryOrchestrator};

/// Context for command output handling.
struct OutputContext<'a> {
    display: &'a Display,
    writer: &'a OutputWriter,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            Display::new().print_error(&e.to_string());
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("recovery_pilot=debug")
    } else {
        EnvFilter::new("recovery_pilot=info")
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let display = Display::new();
    let writer = OutputWriter::new(cli.output);
    let out = OutputContext {
        display: &display,
        writer: &writer,
    };

    match cli.command {
        Commands::Config { action } => cmd_config(&out, &cli.config, action).await,
        Commands::Simulate {
            category,
            status_code,
            retry_after_ms,
            offline,
            online_after_ms,
            calls,
        } => {
            let plan = SimulationPlan {
                category,
                status_code,
                retry_after_ms,
                calls,
            };
            let probe = ScriptedProbe::from_flags(offline, online_after_ms);
            cmd_simulate(&out, &cli.config, plan, probe).await
        }
        Commands::Classify { message } => {
            cmd_classify(&out, &message);
            Ok(())
        }
    }
}

async fn cmd_config(
    out: &OutputContext<'_>,
    path: &std::path::Path,
    action: ConfigAction,
) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = PilotConfig::load(path).await?;
            if out.writer.is_text() {
                println!("{}", config.to_toml()?);
            } else {
                out.writer.emit_json(&config);
            }
        }
        ConfigAction::Validate => {
            if !path.exists() {
                return Err(RecoveryError::Config(format!(
                    "Configuration file not found: {}",
                    path.display()
                )));
            }
            PilotConfig::load(path).await?;
            let message = format!("Configuration is valid: {}", path.display());
            if out.writer.is_text() {
                out.display.print_success(&message);
            } else {
                out.writer.emit_message(&message);
            }
        }
        ConfigAction::Init { force } => {
            if path.exists() && !force {
                if out.writer.is_text() {
                    out.display.print_warning(&format!(
                        "{} already exists. Use --force to overwrite.",
                        path.display()
                    ));
                }
                return Ok(());
            }
            PilotConfig::default().save(path).await?;
            let message = format!("Wrote default configuration to {}", path.display());
            if out.writer.is_text() {
                out.display.print_success(&message);
            } else {
                out.writer.emit_message(&message);
            }
        }
    }

    Ok(())
}

async fn cmd_simulate(
    out: &OutputContext<'_>,
    path: &std::path::Path,
    plan: SimulationPlan,
    probe: ScriptedProbe,
) -> Result<()> {
    let config = PilotConfig::load(path).await?;
    let orchestrator = RecoveryOrchestrator::from_config(&config)
        .probe(Arc::new(probe))
        .build();

    if out.writer.is_text() {
        out.display
            .print_header(&format!("Simulating {} recovery", plan.category));
        out.display
            .print_strategies(&orchestrator.describe_strategies(plan.category));
    }

    let spinner = out.writer.is_text().then(|| {
        out.display
            .create_spinner(&format!("Running {} recovery call(s)...", plan.calls.max(1)))
    });

    let started = Instant::now();
    let results = plan.run(&orchestrator).await;
    let elapsed = started.elapsed();

    if let Some(s) = spinner {
        s.finish_and_clear();
    }

    let stats = orchestrator.stats();
    if out.writer.is_text() {
        println!("{}", console::style("Results:").bold());
        for (i, result) in results.iter().enumerate() {
            out.display.print_result(i + 1, result);
        }
        out.display.print_stats(&stats);
        out.display
            .print_info(&format!("Finished in {}", format_elapsed(elapsed)));
        if plan.category == ErrorCategory::Network && results.iter().any(|r| !r.success) {
            out.display
                .print_info("Use --online-after-ms to bring the network back mid-run.");
        }
    } else {
        out.writer.emit_json(&SimulationOutput {
            results,
            stats,
            elapsed_ms: elapsed.as_millis() as u64,
        });
    }

    Ok(())
}

fn cmd_classify(out: &OutputContext<'_>, message: &str) {
    let record = MessageClassifier.classify_message(message);
    if out.writer.is_text() {
        out.display.print_record(&record);
    } else {
        out.writer.emit_json(&record);
    }
}

fn format_elapsed(elapsed: Duration) -> String {
    if elapsed.as_secs() >= 1 {
        format!("{:.1}s", elapsed.as_secs_f64())
    } else {
        format!("{}ms", elapsed.as_millis())
    }
}
