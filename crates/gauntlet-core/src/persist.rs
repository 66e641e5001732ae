//! Durable per-case result persistence.
//!
//! One JSON record per case under a modality-specific directory, keyed by
//! case id so a re-run overwrites the prior record. Binary image payloads
//! and extracted HTML documents go to sibling files referenced by name;
//! the JSON record never embeds image bytes.

use crate::catalog::{Difficulty, Modality, TestCase};
use crate::error::GauntletError;
use crate::extract;
use crate::stats::RunStats;
use crate::types::{AttemptResult, CaseOutcome, CaseStatus, TokenUsage};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The persisted record for one case, consumed by the website generator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseRecord {
    pub id: String,
    pub name: String,
    pub category: String,
    pub difficulty: Difficulty,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    pub prompt: String,
    pub modality: Modality,
    pub status: CaseStatus,

    /// Full attempt history for post-mortem diagnosis
    pub attempts: Vec<AttemptResult>,

    /// Generated content, with any inline image data stripped
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_usage: Option<TokenUsage>,

    /// Last recorded error detail, present iff the case failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Sibling HTML file name (text modality, when extraction succeeded)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html_file: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub html_complete: Option<bool>,

    /// Sibling image file name (image modality, when decoding succeeded)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_file: Option<String>,

    /// Sibling raw-text file name, when no payload could be extracted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_file: Option<String>,

    pub timestamp: DateTime<Utc>,
    pub duration_seconds: f64,
    pub retry_count: u32,
}

/// Filesystem store for case records and payload files.
pub struct ResultStore {
    root: PathBuf,
    pretty: bool,
}

impl ResultStore {
    /// Create a store rooted at `root`, creating the modality directories.
    pub fn new(root: impl Into<PathBuf>, pretty: bool) -> Result<Self, GauntletError> {
        let root = root.into();
        for modality in [Modality::Text, Modality::Image] {
            std::fs::create_dir_all(root.join(modality.dir_name()))?;
        }
        Ok(Self { root, pretty })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Persist one finalized outcome. Returns the record path.
    ///
    /// Overwrites any prior record for the same case id; sibling payload
    /// files are likewise replaced.
    pub fn persist(
        &self,
        case: &TestCase,
        outcome: &CaseOutcome,
    ) -> Result<PathBuf, GauntletError> {
        let dir = self.root.join(case.modality.dir_name());
        let stem = format!("{}_{}", case.id, extract::sanitize_filename(&case.name));

        let mut record = CaseRecord {
            id: case.id.clone(),
            name: case.name.clone(),
            category: case.category.clone(),
            difficulty: case.difficulty,
            tags: case.tags.clone(),
            icon: case.icon.clone(),
            prompt: case.prompt.clone(),
            modality: case.modality,
            status: outcome.status,
            attempts: outcome.attempts.clone(),
            response: None,
            reasoning: None,
            model: None,
            finish_reason: None,
            token_usage: None,
            error: None,
            html_file: None,
            html_complete: None,
            image_file: None,
            raw_file: None,
            timestamp: outcome.started_at,
            duration_seconds: outcome.total_elapsed_ms as f64 / 1000.0,
            retry_count: outcome.retry_count(),
        };

        match (&outcome.status, &outcome.payload) {
            (CaseStatus::Succeeded, Some(payload)) => {
                record.reasoning = payload.reasoning.clone();
                record.model = Some(payload.model.clone());
                record.finish_reason = payload.finish_reason.clone();
                record.token_usage = Some(payload.token_usage);

                match case.modality {
                    Modality::Text => {
                        record.response = Some(payload.content.clone());
                        self.write_text_payload(&dir, &stem, &payload.content, &mut record)?;
                    }
                    Modality::Image => {
                        record.response = Some(extract::strip_image_data(&payload.content));
                        self.write_image_payload(&dir, &stem, &payload.content, &mut record)?;
                    }
                }
            }
            _ => {
                record.error = outcome.last_error().map(String::from);
            }
        }

        let record_path = dir.join(format!("{stem}.json"));
        let json = if self.pretty {
            serde_json::to_string_pretty(&record)?
        } else {
            serde_json::to_string(&record)?
        };
        std::fs::write(&record_path, json)?;
        tracing::debug!("Persisted {} -> {}", case.id, record_path.display());
        Ok(record_path)
    }

    fn write_text_payload(
        &self,
        dir: &Path,
        stem: &str,
        content: &str,
        record: &mut CaseRecord,
    ) -> Result<(), GauntletError> {
        if let Some((html, complete)) = extract::extract_html(content) {
            let file_name = format!("{stem}.html");
            std::fs::write(dir.join(&file_name), html)?;
            record.html_file = Some(file_name);
            record.html_complete = Some(complete);
            if !complete {
                tracing::warn!("[{}] extracted HTML is missing its closing tag", record.id);
            }
        } else {
            let file_name = format!("{stem}_raw.txt");
            std::fs::write(dir.join(&file_name), content)?;
            record.raw_file = Some(file_name);
            tracing::warn!("[{}] no HTML found in response, saved raw text", record.id);
        }
        Ok(())
    }

    fn write_image_payload(
        &self,
        dir: &Path,
        stem: &str,
        content: &str,
        record: &mut CaseRecord,
    ) -> Result<(), GauntletError> {
        if let Some(payload) = extract::extract_image(content) {
            let file_name = format!("{stem}.{}", payload.extension);
            std::fs::write(dir.join(&file_name), &payload.bytes)?;
            record.image_file = Some(file_name);
        } else {
            let file_name = format!("{stem}_raw.txt");
            std::fs::write(dir.join(&file_name), content)?;
            record.raw_file = Some(file_name);
            tracing::warn!("[{}] no image found in response, saved raw text", record.id);
        }
        Ok(())
    }

    /// Write per-modality aggregate statistics.
    pub fn write_stats(&self, modality: Modality, stats: &RunStats) -> Result<(), GauntletError> {
        let path = self.root.join(modality.dir_name()).join("_stats.json");
        std::fs::write(&path, serde_json::to_string_pretty(stats)?)?;
        Ok(())
    }

    /// Write the run-level summary.
    pub fn write_summary(&self, summary: &RunSummary) -> Result<(), GauntletError> {
        let path = self.root.join("_summary_stats.json");
        std::fs::write(&path, serde_json::to_string_pretty(summary)?)?;
        Ok(())
    }
}

/// Top-level summary written once per run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub timestamp: DateTime<Utc>,
    pub total_time_seconds: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_stats: Option<RunStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_stats: Option<RunStats>,
    pub total_tokens: TokenUsage,
    pub config: SummaryConfig,
}

/// Echo of the settings the run used, for the results website header.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryConfig {
    pub endpoint: String,
    pub text_model: String,
    pub image_model: String,
    pub max_workers: usize,
}
