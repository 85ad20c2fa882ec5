//! mailtriage: classify emails against the mailtriage service from the terminal.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mailtriage_client::{
    defaults, format_file_size, AnalysisController, AnalysisEvent, AnalysisResult, ApiStatus,
    ChannelPresenter, ClassificationBackend, ClientConfig, FileCandidate, HealthMonitor,
    HttpClassifier, TextUsage,
};

#[derive(Parser)]
#[command(name = "mailtriage")]
#[command(author, version, about = "Classify emails as productive or unproductive")]
#[command(propagate_version = true)]
struct Cli {
    /// Service base URL (overrides MAILTRIAGE_API_BASE)
    #[arg(long, global = true)]
    api_base: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify pasted text or a .txt/.pdf file
    Classify {
        /// Email text to classify
        #[arg(short, long, conflicts_with = "file", required_unless_present = "file")]
        text: Option<String>,

        /// Email file to upload
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Directory to write an email_analysis_<date>.json snapshot into
        #[arg(short, long)]
        export: Option<PathBuf>,
    },

    /// Probe the service once
    Health,

    /// Watch service availability until interrupted
    Monitor {
        /// Seconds between probes (overrides MAILTRIAGE_HEALTH_INTERVAL_SECS)
        #[arg(short, long)]
        interval: Option<u64>,
    },
}

/// Set up tracing from the environment.
///
/// Environment variables:
///   LOG_FORMAT  - "json" or "text" (default: "text")
///   LOG_FILE    - path to log file (optional, enables file logging)
///   LOG_ANSI    - "true"/"false" override ANSI colors (auto-detected by default)
///   RUST_LOG    - standard env filter (default: "mailtriage=info,mailtriage_client=info")
///
/// Console logs go to stderr so results on stdout stay pipeable.
fn init_tracing() -> Option<WorkerGuard> {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let log_file = std::env::var("LOG_FILE").ok();
    let log_ansi = std::env::var("LOG_ANSI")
        .ok()
        .map(|v| v == "true" || v == "1");

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "mailtriage=info,mailtriage_client=info".into());

    let registry = tracing_subscriber::registry().with(env_filter);

    let guard = if let Some(ref path) = log_file {
        let file_dir = Path::new(path).parent().unwrap_or(Path::new("."));
        let file_name = Path::new(path)
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or("mailtriage.log");
        let file_appender = tracing_appender::rolling::daily(file_dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        if log_format == "json" {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(non_blocking),
                )
                .init();
        } else {
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(log_ansi.unwrap_or(false));
            registry.with(layer).init();
        }
        Some(guard)
    } else {
        if log_format == "json" {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(std::io::stderr),
                )
                .init();
        } else {
            let mut layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
            if let Some(ansi) = log_ansi {
                layer = layer.with_ansi(ansi);
            }
            registry.with(layer).init();
        }
        None
    };

    info!(
        log_format = %log_format,
        log_file = log_file.as_deref().unwrap_or("(stderr)"),
        "Logging initialized"
    );
    guard
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    dotenvy::dotenv().ok();
    let _log_guard = init_tracing();

    let mut config = ClientConfig::from_env();
    if let Some(api_base) = cli.api_base {
        config = config.with_api_base(api_base);
    }

    match cli.command {
        Commands::Classify { text, file, export } => {
            classify(config, text, file, export).await
        }
        Commands::Health => health(config).await,
        Commands::Monitor { interval } => {
            if let Some(secs) = interval {
                config = config.with_health_interval_secs(secs);
            }
            monitor(config).await
        }
    }
}

async fn classify(
    config: ClientConfig,
    text: Option<String>,
    file: Option<PathBuf>,
    export: Option<PathBuf>,
) -> anyhow::Result<ExitCode> {
    let rules = config.file_rules();
    let backend = HttpClassifier::new(config).context("Invalid client configuration")?;
    let (presenter, mut events) = ChannelPresenter::new();
    let controller = AnalysisController::builder(Arc::new(backend))
        .presenter(Arc::new(presenter))
        .file_rules(rules)
        .build();

    if let Some(path) = file {
        let filename = path
            .file_name()
            .and_then(|f| f.to_str())
            .with_context(|| format!("Not a file path: {}", path.display()))?
            .to_string();
        let size = tokio::fs::metadata(&path)
            .await
            .with_context(|| format!("Cannot read {}", path.display()))?
            .len();

        // Reject before reading a possibly huge file into memory.
        if let Err(e) = controller
            .file_rules()
            .validate(&FileCandidate::new(filename.as_str(), size))
        {
            eprintln!("{}", e);
            return Ok(ExitCode::FAILURE);
        }

        let bytes = tokio::fs::read(&path)
            .await
            .with_context(|| format!("Cannot read {}", path.display()))?;
        eprintln!("Uploading {} ({})", filename, format_file_size(size));
        if let Err(e) = controller.submit_file(&filename, bytes) {
            eprintln!("{}", e);
            return Ok(ExitCode::FAILURE);
        }
    } else {
        let text = text.unwrap_or_default();
        let chars = text.chars().count();
        match TextUsage::for_text(&text) {
            TextUsage::Normal => {}
            TextUsage::Warning | TextUsage::Critical => eprintln!(
                "Warning: text is {} characters (recommended limit {})",
                chars,
                defaults::TEXT_SOFT_LIMIT
            ),
        }
        if let Err(e) = controller.submit_text(&text) {
            eprintln!("{}", e);
            return Ok(ExitCode::FAILURE);
        }
    }

    let mut interrupted = false;
    loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(AnalysisEvent::LoadingChanged(true)) => eprintln!("Analyzing..."),
                Some(AnalysisEvent::LoadingChanged(false)) => {}
                Some(AnalysisEvent::Result(result)) => {
                    print_result(&result);
                    if let Some(dir) = &export {
                        let path = controller.export_last_result()?.write_to_dir(dir)?;
                        eprintln!("Saved {}", path.display());
                    }
                    return Ok(ExitCode::SUCCESS);
                }
                Some(AnalysisEvent::Cancelled) => {
                    eprintln!("Analysis cancelled");
                    return Ok(ExitCode::from(130));
                }
                Some(AnalysisEvent::Error(message)) => {
                    eprintln!("Error: {}", message);
                    return Ok(ExitCode::FAILURE);
                }
                None => anyhow::bail!("Presenter channel closed unexpectedly"),
            },
            signal = tokio::signal::ctrl_c(), if !interrupted => {
                signal.context("Failed to listen for Ctrl-C")?;
                interrupted = true;
                controller.clear();
            }
        }
    }
}

fn print_result(result: &AnalysisResult) {
    println!("Classification: {}", result.label);
    println!(
        "Confidence:     {}% ({:?})",
        result.confidence_percent(),
        result.confidence_level()
    );
    if !result.keywords.is_empty() {
        println!("Keywords:       {}", result.keywords.join(", "));
    }
    println!();
    println!("Suggested response:");
    println!("{}", result.suggested_response);
}

async fn health(config: ClientConfig) -> anyhow::Result<ExitCode> {
    let backend = HttpClassifier::new(config).context("Invalid client configuration")?;
    let online = backend.health_check().await?;
    let status = if online {
        ApiStatus::Online
    } else {
        ApiStatus::Offline
    };
    println!("{} {}", backend.endpoint(), status);
    Ok(if online {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

async fn monitor(config: ClientConfig) -> anyhow::Result<ExitCode> {
    let interval = config.health_interval();
    let backend = HttpClassifier::new(config).context("Invalid client configuration")?;
    let handle = HealthMonitor::new(Arc::new(backend), interval).start();
    let mut status_rx = handle.subscribe();

    loop {
        tokio::select! {
            changed = status_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let status = *status_rx.borrow_and_update();
                println!("{} {}", chrono::Utc::now().format("%Y-%m-%d %H:%M:%S"), status);
            }
            signal = tokio::signal::ctrl_c() => {
                signal.context("Failed to listen for Ctrl-C")?;
                let _ = handle.shutdown().await;
                break;
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}
