use std::path::{Path, PathBuf};

use async_stream::try_stream;
use bill_client::domain::BillRecord;

use crate::extract::{extract_bill, ExtractRules, Extraction};
use crate::pipeline::{Envelope, EnvelopeStream, PipelineError, Source};

/// Saved bill pages (`*.html` / `*.htm`) in one directory.
///
/// Files are visited in file-name order. Pages without a usable date or
/// dated before the cutoff are skipped here and never reach the pipeline.
pub struct HtmlBillDirSource {
    dir: PathBuf,
    rules: ExtractRules,
}

impl HtmlBillDirSource {
    pub fn new<P: Into<PathBuf>>(dir: P, rules: ExtractRules) -> Self {
        Self { dir: dir.into(), rules }
    }
}

fn is_bill_page(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    lower.ends_with(".html") || lower.ends_with(".htm")
}

async fn list_bill_pages(dir: &Path) -> Result<Vec<String>, PipelineError> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| PipelineError::Source(format!("failed to read directory {}: {e}", dir.display())))?;

    let mut names = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| PipelineError::Source(format!("failed to list {}: {e}", dir.display())))?
    {
        let name = entry.file_name().to_string_lossy().into_owned();
        if is_bill_page(&name) && entry.path().is_file() {
            names.push(name);
        }
    }
    names.sort();
    Ok(names)
}

#[async_trait::async_trait]
impl Source<BillRecord> for HtmlBillDirSource {
    async fn stream(&self) -> EnvelopeStream<BillRecord> {
        let dir = self.dir.clone();
        let rules = self.rules;
        let s = try_stream! {
            let names = list_bill_pages(&dir).await?;
            tracing::info!(files = names.len(), dir = %dir.display(), "found bill pages");

            for name in names {
                let bytes = match tokio::fs::read(dir.join(&name)).await {
                    Ok(b) => b,
                    Err(e) => {
                        tracing::warn!(file = %name, error = %e, "failed to read bill page, skipping");
                        metrics::counter!("bill_pages_unreadable_total").increment(1);
                        continue;
                    }
                };
                let html = String::from_utf8_lossy(&bytes);

                match extract_bill(&html, &name, &rules) {
                    Extraction::Bill(bill) => {
                        yield Envelope::new(bill, name);
                    }
                    Extraction::BeforeCutoff(date) => {
                        tracing::debug!(file = %name, %date, "bill predates cutoff, skipping");
                        metrics::counter!("bill_pages_before_cutoff_total").increment(1);
                    }
                    Extraction::Undated => {
                        tracing::warn!(file = %name, "no valid date found, skipping");
                        metrics::counter!("bill_pages_undated_total").increment(1);
                    }
                }
            }
        };

        Box::pin(s)
    }
}
