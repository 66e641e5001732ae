//! The test execution engine: concurrency-bounded dispatch with retries.
//!
//! One tokio task per test case, bounded by a semaphore. Each task drives a
//! retry loop against the provider; every case ends in exactly one terminal
//! outcome, and no case's failure (including a panic) can take down the
//! run. Events are delivered via a callback as work progresses, enabling a
//! live progress display.

pub mod retry;

use crate::api::Provider;
use crate::catalog::TestCase;
use crate::config::EngineSettings;
use crate::stats::RunStats;
use crate::types::{AttemptKind, AttemptResult, CaseOutcome, CaseStatus};
use chrono::Utc;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

/// Progress event emitted while a case is being processed.
///
/// Events for one case are strictly ordered (attempting, retrying*,
/// finished); no ordering holds across cases. Handlers must be cheap,
/// since they run on the worker that produced the event.
#[derive(Debug)]
pub enum CaseEvent {
    /// An attempt is about to start
    Attempting { case_id: String, attempt: u32 },

    /// The previous attempt failed transiently; waiting before the next one
    Retrying {
        case_id: String,
        attempt: u32,
        delay: Duration,
    },

    /// The case reached its terminal outcome
    Finished { outcome: Box<CaseOutcome> },
}

/// Everything a run produced: one outcome per case, plus aggregates.
#[derive(Debug)]
pub struct RunReport {
    pub outcomes: Vec<CaseOutcome>,
    pub stats: RunStats,
}

/// Concurrency coordinator for a battery of test cases.
pub struct Engine {
    provider: Arc<dyn Provider>,
    settings: EngineSettings,
    cancel: CancellationToken,
}

impl Engine {
    pub fn new(provider: Arc<dyn Provider>, settings: EngineSettings) -> Self {
        Self {
            provider,
            settings,
            cancel: CancellationToken::new(),
        }
    }

    /// Token callers can use to request a cooperative stop.
    ///
    /// A case waiting on backoff aborts the wait; a case mid-HTTP-call
    /// completes that call first. No new attempts start after cancellation.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Run every case under the configured worker bound.
    ///
    /// Returns exactly one outcome per case, in catalog order. A panicking
    /// case is converted into a failed outcome with a diagnostic attempt;
    /// all other cases are unaffected.
    pub async fn run<F>(&self, cases: &[TestCase], on_event: F) -> RunReport
    where
        F: Fn(CaseEvent) + Send + Sync + 'static,
    {
        let start = Instant::now();
        let semaphore = Arc::new(Semaphore::new(self.settings.max_workers));
        let on_event = Arc::new(on_event);
        let mut handles = Vec::with_capacity(cases.len());

        for case in cases {
            let Ok(permit) = semaphore.clone().acquire_owned().await else {
                tracing::warn!("Worker semaphore closed unexpectedly, stopping dispatch");
                break;
            };

            let provider = self.provider.clone();
            let settings = self.settings.clone();
            let cancel = self.cancel.clone();
            let on_event = on_event.clone();
            let case = case.clone();
            let case_id = case.id.clone();

            let handle = tokio::spawn(async move {
                let outcome = run_case(&*provider, &case, &settings, &cancel, &*on_event).await;
                drop(permit); // Release the worker slot before the callback
                on_event(CaseEvent::Finished {
                    outcome: Box::new(outcome.clone()),
                });
                outcome
            });

            handles.push((case_id, handle));
        }

        let mut outcomes = Vec::with_capacity(handles.len());
        for (case_id, handle) in handles {
            match handle.await {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => {
                    tracing::error!("Case {case_id} task failed: {e}");
                    let outcome = crash_outcome(case_id, &e.to_string());
                    on_event(CaseEvent::Finished {
                        outcome: Box::new(outcome.clone()),
                    });
                    outcomes.push(outcome);
                }
            }
        }

        let stats = RunStats::from_outcomes(&outcomes, start.elapsed().as_secs_f64());
        RunReport { outcomes, stats }
    }
}

/// Drive one case to its terminal outcome.
///
/// State machine: pending -> attempting -> (retrying <-> attempting) ->
/// succeeded | exhausted. A fatal classification ends the loop immediately
/// regardless of remaining budget; retryable failures consume budget until
/// `max_retries` retries have been spent.
async fn run_case<P: Provider + ?Sized>(
    provider: &P,
    case: &TestCase,
    settings: &EngineSettings,
    cancel: &CancellationToken,
    on_event: &(dyn Fn(CaseEvent) + Send + Sync),
) -> CaseOutcome {
    let run_start = Instant::now();
    let started_at = Utc::now();
    let max_attempts = settings.max_retries + 1;
    let mut attempts = Vec::new();

    for attempt in 0..max_attempts {
        if cancel.is_cancelled() {
            tracing::debug!("[{}] cancelled before attempt {attempt}", case.id);
            break;
        }

        on_event(CaseEvent::Attempting {
            case_id: case.id.clone(),
            attempt,
        });

        let attempt_started = Utc::now();
        let attempt_timer = Instant::now();
        match provider.generate(case).await {
            Ok(generation) => {
                let elapsed_ms = attempt_timer.elapsed().as_millis() as u64;
                tracing::debug!(
                    "[{}] succeeded on attempt {attempt} in {elapsed_ms}ms",
                    case.id
                );
                attempts.push(AttemptResult::success(attempt, attempt_started, elapsed_ms));
                return CaseOutcome {
                    case_id: case.id.clone(),
                    status: CaseStatus::Succeeded,
                    attempts,
                    payload: Some(generation),
                    started_at,
                    total_elapsed_ms: run_start.elapsed().as_millis() as u64,
                };
            }
            Err(e) => {
                let elapsed_ms = attempt_timer.elapsed().as_millis() as u64;
                let retryable = retry::is_retryable(&e);
                attempts.push(AttemptResult::failure(
                    attempt,
                    retryable,
                    &e,
                    attempt_started,
                    elapsed_ms,
                ));

                if !retryable {
                    tracing::warn!("[{}] fatal error on attempt {attempt}: {e}", case.id);
                    break;
                }
                tracing::debug!("[{}] retryable error on attempt {attempt}: {e}", case.id);

                if attempt + 1 < max_attempts {
                    let delay = retry::backoff_delay(
                        attempt,
                        settings.base_delay_ms,
                        settings.max_delay_ms,
                    );
                    on_event(CaseEvent::Retrying {
                        case_id: case.id.clone(),
                        attempt,
                        delay,
                    });
                    tokio::select! {
                        _ = tokio::time::sleep(delay) => {}
                        _ = cancel.cancelled() => {
                            tracing::debug!("[{}] cancelled during backoff", case.id);
                            break;
                        }
                    }
                }
            }
        }
    }

    // Cancelled before the first attempt: record a diagnostic attempt so the
    // outcome still carries its history.
    if attempts.is_empty() {
        attempts.push(AttemptResult {
            attempt: 0,
            kind: AttemptKind::FatalError,
            error: Some("cancelled before first attempt".to_string()),
            timestamp: Utc::now(),
            elapsed_ms: 0,
        });
    }

    CaseOutcome {
        case_id: case.id.clone(),
        status: CaseStatus::Failed,
        attempts,
        payload: None,
        started_at,
        total_elapsed_ms: run_start.elapsed().as_millis() as u64,
    }
}

/// Outcome substitute for a case whose task panicked.
fn crash_outcome(case_id: String, detail: &str) -> CaseOutcome {
    let now = Utc::now();
    CaseOutcome {
        case_id,
        status: CaseStatus::Failed,
        attempts: vec![AttemptResult {
            attempt: 0,
            kind: AttemptKind::FatalError,
            error: Some(format!("worker crashed: {detail}")),
            timestamp: now,
            elapsed_ms: 0,
        }],
        payload: None,
        started_at: now,
        total_elapsed_ms: 0,
    }
}
