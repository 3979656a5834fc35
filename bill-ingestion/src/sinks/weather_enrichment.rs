use std::path::PathBuf;

use bill_client::domain::BillRecord;
use futures::Stream;

use crate::enrich::{enrich_bills, fetch_range, EnrichmentSettings};
use crate::pipeline::{Envelope, PipelineError, Sink};
use crate::sinks::{bill_files::sort_bills, collect_records, write_output};
use crate::weather::WeatherArchive;

/// Fetches one temperature series covering every bill and writes the
/// enriched records. A failed fetch aborts before anything is written.
pub struct WeatherEnrichmentSink<W> {
    archive: W,
    settings: EnrichmentSettings,
    output: PathBuf,
}

impl<W: WeatherArchive> WeatherEnrichmentSink<W> {
    pub fn new<P: Into<PathBuf>>(archive: W, settings: EnrichmentSettings, output: P) -> Self {
        Self { archive, settings, output: output.into() }
    }
}

#[async_trait::async_trait]
impl<W: WeatherArchive> Sink<BillRecord> for WeatherEnrichmentSink<W> {
    async fn run<S>(&self, input: S) -> Result<(), PipelineError>
    where
        S: Stream<Item = Result<Envelope<BillRecord>, PipelineError>> + Send + Unpin + 'static,
    {
        let mut bills: Vec<BillRecord> = collect_records(input, "weather_enrichment")
            .await?
            .into_iter()
            .map(|env| env.payload)
            .collect();
        sort_bills(&mut bills);

        let Some((start, end)) = fetch_range(&bills, &self.settings) else {
            tracing::warn!("no bills to enrich, nothing written");
            return Ok(());
        };

        metrics::counter!("weather_fetches_total").increment(1);
        let temps = match self.archive.daily_mean_temperatures(start, end).await {
            Ok(t) => t,
            Err(e) => {
                tracing::error!(error = %e, %start, %end, "weather fetch failed, aborting");
                metrics::counter!("weather_fetch_errors_total").increment(1);
                return Err(PipelineError::Sink(e.to_string()));
            }
        };
        tracing::info!(days = temps.len(), %start, %end, "received daily temperatures");

        let enriched = enrich_bills(&bills, &temps, &self.settings);
        let json = serde_json::to_string_pretty(&enriched)
            .map_err(|e| PipelineError::Sink(format!("json encoding failed: {e}")))?;
        write_output(&self.output, json).await?;

        let with_weather = enriched.iter().filter(|e| e.avg_temp.is_some()).count();
        tracing::info!(bills = enriched.len(), with_weather, "enrichment complete");
        Ok(())
    }
}
