//! The `gauntlet run` command for executing test case catalogs.

use clap::{Args, ValueEnum};
use gauntlet_core::{
    load_catalog, ApiClient, CaseEvent, CaseStatus, Config, Engine, Modality, ResultStore,
    RunReport, RunStats, RunSummary, SummaryConfig, TestCase, TokenUsage,
};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

/// Arguments for the `run` command.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Directory containing the case catalogs (text_cases.json, image_cases.json)
    #[arg(short, long, default_value = "./cases")]
    pub cases: PathBuf,

    /// Output directory for results (overrides config)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Which catalog(s) to run
    #[arg(short, long, value_enum, default_value = "all")]
    pub modality: ModalityArg,

    /// Config file path (defaults to the platform config location)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Number of concurrent workers (overrides config, 1-30)
    #[arg(short, long)]
    pub workers: Option<usize>,
}

/// Catalog selection.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ModalityArg {
    /// Text cases only
    Text,
    /// Image cases only
    Image,
    /// Both catalogs, text first
    All,
}

impl ModalityArg {
    fn selected(&self) -> Vec<Modality> {
        match self {
            ModalityArg::Text => vec![Modality::Text],
            ModalityArg::Image => vec![Modality::Image],
            ModalityArg::All => vec![Modality::Text, Modality::Image],
        }
    }
}

/// Execute the run command.
pub async fn execute(args: RunArgs) -> anyhow::Result<()> {
    let config = load_run_config(&args)?;

    if !args.cases.exists() {
        anyhow::bail!(
            "Case directory does not exist: {:?}\n\n  Hint: Check the path or pass --cases.",
            args.cases
        );
    }

    let output_dir = args.output.clone().unwrap_or_else(|| config.output_dir());
    let store = Arc::new(ResultStore::new(&output_dir, config.output.pretty)?);

    let provider = Arc::new(ApiClient::from_config(&config)?);
    tracing::info!(
        "Running against {} with {} worker(s)",
        config.api.endpoint,
        config.engine.max_workers
    );

    let engine = Engine::new(provider, config.engine.clone());

    // Ctrl-C requests a cooperative stop: in-flight attempts finish, no new
    // attempts start, and everything completed so far is already on disk.
    let cancel = engine.cancel_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received; finishing in-flight attempts...");
            cancel.cancel();
        }
    });

    let run_start = std::time::Instant::now();
    let mut text_stats: Option<RunStats> = None;
    let mut image_stats: Option<RunStats> = None;

    for modality in args.modality.selected() {
        if engine.cancel_token().is_cancelled() {
            tracing::warn!("Skipping {modality} battery: run was cancelled");
            break;
        }
        let stats = run_battery(&engine, &store, &args.cases, modality).await?;
        match modality {
            Modality::Text => text_stats = stats,
            Modality::Image => image_stats = stats,
        }
    }

    let mut total_tokens = TokenUsage::default();
    for stats in [&text_stats, &image_stats].into_iter().flatten() {
        total_tokens.add(&stats.total_tokens);
    }

    let summary = RunSummary {
        timestamp: chrono::Utc::now(),
        total_time_seconds: run_start.elapsed().as_secs_f64(),
        text_stats,
        image_stats,
        total_tokens,
        config: SummaryConfig {
            endpoint: config.api.endpoint.clone(),
            text_model: config.api.text_model.clone(),
            image_model: config.api.image_model.clone(),
            max_workers: config.engine.max_workers,
        },
    };
    store.write_summary(&summary)?;

    tracing::info!("Results written to {:?}", store.root());
    Ok(())
}

/// Load config (honoring --config) and apply CLI overrides.
fn load_run_config(args: &RunArgs) -> anyhow::Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    if let Some(workers) = args.workers {
        if !(1..=30).contains(&workers) {
            anyhow::bail!("--workers must be between 1 and 30 (got {workers})");
        }
        config.engine.max_workers = workers;
    }

    Ok(config)
}

/// Run one catalog through the engine, persisting results as they finish.
///
/// Returns `None` when the catalog has no cases.
async fn run_battery(
    engine: &Engine,
    store: &Arc<ResultStore>,
    case_dir: &std::path::Path,
    modality: Modality,
) -> anyhow::Result<Option<RunStats>> {
    let cases = load_catalog(case_dir, modality)?;
    if cases.is_empty() {
        tracing::info!("No {modality} cases found, skipping");
        return Ok(None);
    }
    tracing::info!("Running {} {modality} case(s)", cases.len());

    // Finished events carry only the case id; index the catalog so the
    // persistence callback can recover the full case definition.
    let case_index: Arc<HashMap<String, TestCase>> = Arc::new(
        cases
            .iter()
            .map(|case| (case.id.clone(), case.clone()))
            .collect(),
    );

    let progress = create_progress_bar(cases.len() as u64);
    let report = {
        let store = store.clone();
        let case_index = case_index.clone();
        let progress = progress.clone();
        engine
            .run(&cases, move |event| match event {
                CaseEvent::Attempting { case_id, attempt } => {
                    if attempt > 0 {
                        progress.set_message(format!("{case_id} attempt {}", attempt + 1));
                    } else {
                        progress.set_message(case_id);
                    }
                }
                CaseEvent::Retrying {
                    case_id,
                    attempt,
                    delay,
                } => {
                    progress.set_message(format!(
                        "{case_id} retry {} in {:.1}s",
                        attempt + 1,
                        delay.as_secs_f64()
                    ));
                }
                CaseEvent::Finished { outcome } => {
                    match case_index.get(&outcome.case_id) {
                        Some(case) => {
                            if let Err(e) = store.persist(case, &outcome) {
                                tracing::error!("Failed to persist {}: {e}", outcome.case_id);
                            }
                        }
                        None => tracing::error!("Unknown case id in outcome: {}", outcome.case_id),
                    }
                    progress.inc(1);
                }
            })
            .await
    };
    progress.finish_and_clear();

    store.write_stats(modality, &report.stats)?;
    print_battery_summary(modality, &report);
    Ok(Some(report.stats))
}

/// Create a progress bar for battery execution.
fn create_progress_bar(total: u64) -> indicatif::ProgressBar {
    use indicatif::{ProgressBar, ProgressStyle};

    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}",
            )
            .unwrap()
            .progress_chars("##-"),
    );
    pb.set_message("starting...");
    pb
}

/// Print a formatted summary table after a battery completes.
fn print_battery_summary(modality: Modality, report: &RunReport) {
    let stats = &report.stats;

    eprintln!();
    eprintln!("  ====================================");
    eprintln!("         {modality} battery summary");
    eprintln!("  ====================================");
    eprintln!("    Succeeded:    {:>8}", stats.success_count);
    if stats.failed_count > 0 {
        eprintln!("    Failed:       {:>8}", stats.failed_count);
    }
    if stats.retry_count > 0 {
        eprintln!("    Retries:      {:>8}", stats.retry_count);
    }
    if stats.timeout_count > 0 {
        eprintln!("    Timeouts:     {:>8}", stats.timeout_count);
    }
    if stats.truncated_count > 0 {
        eprintln!("    Truncated:    {:>8}", stats.truncated_count);
    }
    eprintln!("  ------------------------------------");
    eprintln!("    Total:        {:>8}", stats.total_cases);
    eprintln!("    Duration:     {:>7.1}s", stats.total_time_seconds);
    eprintln!("    Tokens out:   {:>8}", stats.total_tokens.completion_tokens);
    if stats.avg_tokens_per_second > 0.0 {
        eprintln!("    Rate:         {:>7.1} tok/sec", stats.avg_tokens_per_second);
    }
    eprintln!("  ====================================");

    for outcome in &report.outcomes {
        if outcome.status == CaseStatus::Failed {
            eprintln!(
                "    FAILED {}: {}",
                outcome.case_id,
                outcome.last_error().unwrap_or("no error recorded")
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args_with(config: Option<PathBuf>, workers: Option<usize>) -> RunArgs {
        RunArgs {
            cases: PathBuf::from("./cases"),
            output: None,
            modality: ModalityArg::All,
            config,
            workers,
        }
    }

    #[test]
    fn test_modality_selection() {
        assert_eq!(ModalityArg::Text.selected(), vec![Modality::Text]);
        assert_eq!(ModalityArg::Image.selected(), vec![Modality::Image]);
        assert_eq!(
            ModalityArg::All.selected(),
            vec![Modality::Text, Modality::Image]
        );
    }

    #[test]
    fn test_workers_override_applied() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, Config::default().to_toml().unwrap()).unwrap();

        let config = load_run_config(&args_with(Some(path), Some(12))).unwrap();
        assert_eq!(config.engine.max_workers, 12);
    }

    #[test]
    fn test_workers_override_out_of_range() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, Config::default().to_toml().unwrap()).unwrap();

        assert!(load_run_config(&args_with(Some(path), Some(0))).is_err());
    }
}
