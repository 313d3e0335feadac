//! MediChain Triage - command-line entry point
//!
//! Runs diagnoses against the persisted model, records clinician feedback,
//! and manages the model lifecycle (train, retrain, rollback).

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing::{debug, Level};
use tracing_subscriber::{self, EnvFilter};
use triage_core::{
    learning::FeedbackInput, DiagnosisEngine, DiagnosisReport, RetrainOutcome, TriageConfig,
    TriageOutcome,
};

#[derive(Parser)]
#[command(name = "triage")]
#[command(about = "Free-text symptom triage with feedback-driven retraining", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Set log level
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Configuration file (TOML)
    #[arg(short, long, env = "TRIAGE_CONFIG")]
    config: Option<PathBuf>,

    /// Store events and model under this directory instead of the configured paths
    #[arg(long)]
    data_dir: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Diagnose a free-text symptom description
    Diagnose {
        /// Symptom description
        text: String,

        /// Explicit duration, e.g. "3 days" or "2"
        #[arg(short, long)]
        duration: Option<String>,

        /// Explicit intensity: mild, moderate, or severe
        #[arg(short, long)]
        intensity: Option<String>,

        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Record feedback for a previous diagnosis
    Feedback {
        /// Session id printed by `diagnose`
        #[arg(short, long)]
        session: String,

        /// Confirmed diagnosis label
        #[arg(short, long)]
        label: Option<String>,

        /// Clinician notes
        #[arg(short, long)]
        notes: Option<String>,

        /// Patient outcome
        #[arg(short, long)]
        outcome: Option<String>,
    },

    /// Retrain from the base corpus plus all labelled feedback
    Retrain,

    /// Train a fresh model from the base corpus only
    Train,

    /// Restore the most recent model backup
    Rollback,

    /// Show learning statistics
    Stats {
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Print the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };
    let filter = EnvFilter::new(format!(
        "triage_core={level},triage={level}",
        level = level.as_str().to_lowercase()
    ));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    debug!("Triage v{} starting...", env!("CARGO_PKG_VERSION"));

    let mut config = TriageConfig::load(cli.config.as_deref())?;
    if let Some(root) = &cli.data_dir {
        config = config.with_root(root);
    }

    match cli.command {
        Commands::Diagnose {
            text,
            duration,
            intensity,
            format,
        } => {
            let engine = DiagnosisEngine::open(&config).await?;
            let manual = engine.manual_input(duration.as_deref(), intensity.as_deref());
            let report = engine.diagnose(&text, manual).await?;
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
                OutputFormat::Text => print_report(&report),
            }
        }
        Commands::Feedback {
            session,
            label,
            notes,
            outcome,
        } => {
            let engine = DiagnosisEngine::open(&config).await?;
            let receipt = engine
                .record_feedback(FeedbackInput {
                    session_id: session,
                    actual_label: label,
                    notes,
                    outcome,
                })
                .await?;
            println!("Feedback recorded: {}", receipt.feedback_id);

            if receipt.retrain_triggered {
                println!("Feedback threshold reached, retraining...");
                if let Some(outcome) = engine.await_retrain().await {
                    print_retrain_outcome(&outcome);
                }
            }
        }
        Commands::Retrain => {
            let engine = DiagnosisEngine::open(&config).await?;
            let outcome = engine.retrain_now().await;
            print_retrain_outcome(&outcome);
        }
        Commands::Train => {
            let report = DiagnosisEngine::train_from_corpus(&config)
                .context("Failed to train from base corpus")?;
            println!(
                "Trained model {} on {} samples ({} classes), validation accuracy {:.1}%",
                report.version_id,
                report.sample_count,
                report.classes.len(),
                report.accuracy * 100.0
            );
        }
        Commands::Rollback => {
            let engine = DiagnosisEngine::open(&config).await?;
            let version = engine.rollback()?;
            println!("Rolled back to model {}", version);
        }
        Commands::Stats { format } => {
            let engine = DiagnosisEngine::open(&config).await?;
            let stats = engine.statistics().await?;
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&stats)?),
                OutputFormat::Text => {
                    println!("Model version:       {}", stats.model_version.as_deref().unwrap_or("none"));
                    println!("Total predictions:   {}", stats.total_predictions);
                    println!("Feedback received:   {}", stats.feedback_received);
                    println!("Unknown cases:       {}", stats.unknown_cases);
                    println!("Retraining sessions: {}", stats.retraining_sessions);
                    if let (Some(at), Some(accuracy)) = (stats.last_retrained_at, stats.last_accuracy) {
                        println!(
                            "Last retrained:      {} ({:.1}% accuracy)",
                            at.format("%Y-%m-%d %H:%M:%S UTC"),
                            accuracy * 100.0
                        );
                    }
                }
            }
        }
        Commands::Config => {
            print!("{}", config.to_toml()?);
        }
    }

    Ok(())
}

fn print_report(report: &DiagnosisReport) {
    println!("Session: {}", report.session_id);
    if !report.recorded {
        println!("Warning: this diagnosis was not logged, feedback for it will be rejected");
    }

    let symptoms: Vec<&str> = report.observation.symptoms.iter().map(|s| s.as_str()).collect();
    println!(
        "Parsed:  {} | {} day(s) | {}",
        if symptoms.is_empty() {
            "no recognized symptoms".to_string()
        } else {
            symptoms.join(", ")
        },
        report.observation.duration_days,
        report.observation.intensity
    );

    match &report.outcome {
        TriageOutcome::Known(prediction) => {
            println!(
                "\nDiagnosis: {} ({:.1}%, {} confidence)",
                prediction.label,
                prediction.confidence_percent(),
                prediction.confidence_level()
            );
            for factor in &prediction.boost_factors {
                println!("  + {}", factor);
            }
            if !prediction.alternatives.is_empty() {
                println!("Alternatives:");
                for alt in &prediction.alternatives {
                    println!("  - {} ({:.1}%)", alt.label, alt.confidence * 100.0);
                }
            }
            if let Some(bundle) = &report.recommendations {
                if !bundle.medications.is_empty() {
                    println!("Medications:");
                    for med in &bundle.medications {
                        println!("  - {} {}", med.name, med.dosage);
                    }
                }
                for treatment in &bundle.treatments {
                    println!("  * {}", treatment);
                }
                for warning in &bundle.warnings {
                    println!("  ! {}", warning);
                }
            }
        }
        TriageOutcome::Unknown(advisory) => {
            println!("\n{}", advisory.message);
            if advisory.is_urgent() {
                println!("Seek prompt care for: {}", advisory.urgent_indicators.join(", "));
            }
            for action in &advisory.suggested_actions {
                println!("  - {}", action);
            }
            println!("\n{}", advisory.disclaimer);
        }
    }
}

fn print_retrain_outcome(outcome: &RetrainOutcome) {
    match outcome {
        RetrainOutcome::Accepted(report) => println!(
            "Retraining accepted: model {} ({:.1}% accuracy, {} samples, {} from feedback)",
            report.version_id,
            report.accuracy * 100.0,
            report.sample_count,
            report.feedback_samples
        ),
        RetrainOutcome::Rejected { accuracy, floor } => println!(
            "Retraining rejected: {:.1}% accuracy below {:.1}% floor; active model unchanged",
            accuracy * 100.0,
            floor * 100.0
        ),
        RetrainOutcome::Failed { reason } => {
            println!("Retraining failed: {}; active model unchanged", reason)
        }
        RetrainOutcome::AlreadyRunning => println!("Retraining already in progress"),
    }
}
