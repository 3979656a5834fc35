//! The three batch stages, each one `Pipeline` run.

use std::sync::Arc;

use anyhow::Context;
use bill_client::domain::{BillRecord, EnrichedBillRecord};

use crate::config::AppConfig;
use crate::enrich::EnrichmentSettings;
use crate::extract::ExtractRules;
use crate::pipeline::Pipeline;
use crate::sinks::{BillFileSink, DashboardSink, WeatherEnrichmentSink};
use crate::sources::{HtmlBillDirSource, JsonArrayFileSource};
use crate::transform::BillValidation;
use crate::weather::OpenMeteoArchive;

/// Bill pages → `bills_json` + `bills_csv`.
pub async fn run_extract(cfg: &AppConfig) -> anyhow::Result<()> {
    let rules = ExtractRules::from(&cfg.extract);
    tracing::info!(dir = %cfg.extract.html_dir.display(), cutoff = %rules.cutoff, "extracting bills");

    let pipeline: Pipeline<_, BillRecord, _> = Pipeline {
        source: HtmlBillDirSource::new(&cfg.extract.html_dir, rules),
        transforms: vec![Arc::new(BillValidation::new(rules.cutoff))],
        sink: BillFileSink::new(&cfg.output.bills_json, &cfg.output.bills_csv),
    };
    pipeline.run().await.context("bill extraction failed")?;
    Ok(())
}

/// `bills_json` + weather archive → `enriched_json`.
pub async fn run_enrich(cfg: &AppConfig) -> anyhow::Result<()> {
    let archive = OpenMeteoArchive::new(&cfg.weather)?;
    let pipeline: Pipeline<_, BillRecord, _> = Pipeline {
        source: JsonArrayFileSource::new(&cfg.output.bills_json),
        transforms: vec![Arc::new(BillValidation::new(cfg.extract.cutoff_date))],
        sink: WeatherEnrichmentSink::new(
            archive,
            EnrichmentSettings::from(&cfg.weather),
            &cfg.output.enriched_json,
        ),
    };
    pipeline.run().await.context("weather enrichment failed")?;
    Ok(())
}

/// `enriched_json` → dashboard page and its chart script.
pub async fn run_dashboard(cfg: &AppConfig) -> anyhow::Result<()> {
    let mut sink = DashboardSink::new(&cfg.output.dashboard_html, &cfg.output.dashboard_script);
    if let Some(path) = &cfg.output.dashboard_template {
        let template = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read dashboard template {}", path.display()))?;
        sink = sink.with_template(template);
    }

    let pipeline: Pipeline<_, EnrichedBillRecord, _> = Pipeline {
        source: JsonArrayFileSource::new(&cfg.output.enriched_json),
        transforms: vec![Arc::new(BillValidation::new(cfg.extract.cutoff_date))],
        sink,
    };
    pipeline.run().await.context("dashboard build failed")?;
    Ok(())
}
