//! halo-trace - find LinkedIn profiles from any image
//!
//! Uploads a poster, flyer or screenshot to the recognition backend, lists
//! the companies or people it identified and resolves each one to a
//! profile. Results go to stdout; logs and progress go to stderr.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use halo_common::config::ConfigResolver;
use halo_common::events::{EventBus, WorkflowEvent};
use serde::Serialize;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, reload, EnvFilter};

use halo_trace::models::{Category, ProfileMatch};
use halo_trace::workflow::{ExtractOutcome, ResolveOutcome, ResultSummary};
use halo_trace::{HaloApiClient, WorkflowController};

#[derive(Parser, Debug)]
#[command(name = "halo-trace", version, about = "Find LinkedIn profiles from any image")]
struct Args {
    /// Image to analyze
    #[arg(required_unless_present = "check")]
    image: Option<PathBuf>,

    /// What to look for: companies or people
    #[arg(short = 't', long, required_unless_present = "check")]
    category: Option<Category>,

    /// Backend base URL (overrides HALO_SERVICE_URL and the config file)
    #[arg(long)]
    service_url: Option<String>,

    /// Config file (overrides HALO_CONFIG)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Only check that the backend is reachable
    #[arg(long)]
    check: bool,

    /// Print results as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct ResultsReport<'a> {
    category: Category,
    status: &'a str,
    summary: ResultSummary,
    results: &'a [ProfileMatch],
}

const STARTUP_LOG_LEVEL: &str = "info";

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing before config so resolution warnings are visible.
    // RUST_LOG wins; otherwise the configured level replaces the startup one.
    let env_filter = EnvFilter::try_from_default_env().ok();
    let from_env = env_filter.is_some();
    let (filter, filter_handle) =
        reload::Layer::new(env_filter.unwrap_or_else(|| EnvFilter::new(STARTUP_LOG_LEVEL)));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = ConfigResolver::new()
        .with_config_path(args.config.clone())
        .with_service_url(args.service_url.clone())
        .resolve()
        .context("Invalid configuration")?;

    if !from_env {
        match EnvFilter::try_new(config.logging.level.as_str()) {
            Ok(level) => filter_handle.reload(level)?,
            Err(e) => warn!(
                "Ignoring logging.level '{}': {}. Using {}.",
                config.logging.level, e, STARTUP_LOG_LEVEL
            ),
        }
    }

    info!("Starting halo-trace {}", env!("CARGO_PKG_VERSION"));
    info!("Backend: {}", config.service.base_url);

    let client = Arc::new(HaloApiClient::new(&config.service)?);

    if args.check {
        let health = client
            .health_check()
            .await
            .with_context(|| format!("Backend not reachable at {}", client.base_url()))?;
        if !health.is_healthy() {
            bail!("Backend at {} reports status '{}'", client.base_url(), health.status);
        }
        println!("Backend at {} is {}", client.base_url(), health.status);
        return Ok(());
    }

    let (Some(image), Some(category)) = (args.image, args.category) else {
        bail!("An image and a category are required");
    };

    let event_bus = EventBus::new(100);
    let controller = WorkflowController::with_client(client, event_bus.clone());
    let status_printer = spawn_status_printer(&event_bus, std::io::stderr());

    controller.select_category(category).await?;
    let advisories = controller.stage_path(&image).await?;
    for advisory in &advisories {
        eprintln!("note: {}", advisory);
    }

    match controller.extract().await? {
        ExtractOutcome::Extracted { .. } => {}
        ExtractOutcome::Failed { reason } => {
            let session = controller.snapshot().await;
            bail!("{} ({})", session.status_message, reason);
        }
        ExtractOutcome::Discarded => bail!("Extraction result was discarded"),
    }

    let session = controller.snapshot().await;
    if !session.entities.is_empty() {
        eprintln!("{} ({}): {}", category.identified_heading(), session.entities.len(), session.entities.join(", "));
    }

    match controller.resolve().await? {
        ResolveOutcome::Resolved { .. } => {}
        ResolveOutcome::Skipped => {
            drop(controller);
            drop(event_bus);
            status_printer.await.ok();
            println!("No {} identified in {}", category.noun(0), image.display());
            println!("{}", category.upload_hint());
            return Ok(());
        }
        ResolveOutcome::Failed { reason } => {
            let session = controller.snapshot().await;
            bail!("{} ({})", session.status_message, reason);
        }
        ResolveOutcome::Discarded => bail!("Search result was discarded"),
    }

    let session = controller.snapshot().await;

    // Closing every sender lets the printer drain the final status line
    drop(controller);
    drop(event_bus);
    status_printer.await.ok();

    if args.json {
        let report = ResultsReport {
            category,
            status: &session.status_message,
            summary: session.summary(),
            results: &session.results,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_results(category, &session.results, &session.summary());
    }

    Ok(())
}

/// Echo status lines while the workflow runs
///
/// The task ends once every `EventBus` clone is dropped and the queued
/// events have been written.
fn spawn_status_printer<W>(event_bus: &EventBus, mut out: W) -> tokio::task::JoinHandle<()>
where
    W: Write + Send + 'static,
{
    let mut rx = event_bus.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(WorkflowEvent::StatusChanged { message, .. }) => {
                    let _ = writeln!(out, "{}", message);
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "Status printer lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}

fn print_results(category: Category, results: &[ProfileMatch], summary: &ResultSummary) {
    println!("{}", category.results_heading());
    println!("{}", summary.results_line());
    println!();

    for result in results {
        match (&result.profile_url, result.is_exact_match) {
            (Some(url), true) => {
                println!("[Exact Match]    {}", result.name);
                if let Some(title) = &result.profile_title {
                    println!("                 {}", title);
                }
                println!("                 {}", url);
            }
            (Some(url), false) => {
                println!("[No Match Found] {}", result.name);
                println!("                 {}", url);
            }
            (None, _) => println!("[No Match Found] {} (Not Available)", result.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::sync::Mutex;
    use uuid::Uuid;

    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn status(message: &str) -> WorkflowEvent {
        WorkflowEvent::StatusChanged {
            session_id: Uuid::new_v4(),
            message: message.to_string(),
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_status_printer_drains_final_status_before_exit() {
        let event_bus = EventBus::new(16);
        let buffer = SharedBuffer::default();
        let printer = spawn_status_printer(&event_bus, buffer.clone());

        event_bus.emit_lossy(status("Finding LinkedIn profiles..."));
        event_bus.emit_lossy(status("Found 1 exact match, 1 not found"));
        drop(event_bus);
        printer.await.unwrap();

        let written = String::from_utf8(buffer.0.lock().unwrap().clone()).unwrap();
        assert_eq!(
            written,
            "Finding LinkedIn profiles...\nFound 1 exact match, 1 not found\n"
        );
    }

    #[test]
    fn test_category_and_image_required_unless_checking() {
        assert!(Args::try_parse_from(["halo-trace", "--check"]).is_ok());
        assert!(Args::try_parse_from(["halo-trace", "poster.png"]).is_err());

        let args = Args::try_parse_from(["halo-trace", "-t", "people", "badge.png"]).unwrap();
        assert_eq!(args.category, Some(Category::People));
        assert_eq!(args.image, Some(PathBuf::from("badge.png")));
    }
}
