use std::path::PathBuf;

use bill_client::domain::EnrichedBillRecord;
use bill_client::queries::{rolling_average, summarize, BillFilter};
use futures::Stream;

use crate::dashboard::{render_page, CHARTS_SCRIPT, DEFAULT_TEMPLATE};
use crate::pipeline::{Envelope, PipelineError, Sink};
use crate::sinks::{collect_records, write_output};

/// Bills per rolling-average point.
pub const ROLLING_WINDOW: usize = 12;

/// Renders the enriched records into the dashboard page and writes the chart
/// script next to it.
pub struct DashboardSink {
    html_path: PathBuf,
    script_path: PathBuf,
    template: Option<String>,
}

impl DashboardSink {
    pub fn new<P: Into<PathBuf>, Q: Into<PathBuf>>(html_path: P, script_path: Q) -> Self {
        Self { html_path: html_path.into(), script_path: script_path.into(), template: None }
    }

    /// Replace the built-in page template.
    pub fn with_template(mut self, template: String) -> Self {
        self.template = Some(template);
        self
    }

    fn script_src(&self) -> String {
        self.script_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "dashboard_charts.js".to_string())
    }
}

#[async_trait::async_trait]
impl Sink<EnrichedBillRecord> for DashboardSink {
    async fn run<S>(&self, input: S) -> Result<(), PipelineError>
    where
        S: Stream<Item = Result<Envelope<EnrichedBillRecord>, PipelineError>> + Send + Unpin + 'static,
    {
        let mut records: Vec<EnrichedBillRecord> = collect_records(input, "dashboard")
            .await?
            .into_iter()
            .map(|env| env.payload)
            .collect();
        records.sort_by(|a, b| a.bill.date.cmp(&b.bill.date).then_with(|| a.bill.filename.cmp(&b.bill.filename)));

        let rolling = rolling_average(&records, ROLLING_WINDOW);
        let everything: Vec<&EnrichedBillRecord> = records.iter().collect();
        if let Some(s) = summarize(&everything, &records, &BillFilter::default()) {
            tracing::info!(
                bills = s.bill_count,
                total_spent = s.total_spent,
                avg_per_bill = s.avg_per_bill,
                highest = %s.highest.date,
                lowest = %s.lowest.date,
                "dashboard summary"
            );
        } else {
            tracing::warn!("no enriched bills, dashboard will be empty");
        }

        let template = self.template.as_deref().unwrap_or(DEFAULT_TEMPLATE);
        let page = render_page(template, &records, &rolling, &self.script_src())
            .map_err(|e| PipelineError::Sink(format!("json encoding failed: {e}")))?;

        write_output(&self.html_path, &page).await?;
        write_output(&self.script_path, CHARTS_SCRIPT).await?;
        tracing::info!(size = page.len(), bills = records.len(), rolling_points = rolling.len(), "dashboard built");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bill_client::domain::BillRecord;
    use time::{Date, Duration};
    use time::macros::date;

    fn record(date: Date, cost: f64) -> EnrichedBillRecord {
        let mut b = BillRecord::empty(format!("ConEd-Bill-{date}.html"), date);
        b.electric_cost = cost;
        EnrichedBillRecord::without_weather(b)
    }

    #[tokio::test]
    async fn writes_page_and_script_side_by_side() {
        let dir = tempfile::tempdir().unwrap();
        let html = dir.path().join("usage_dashboard.html");
        let js = dir.path().join("charts.js");
        let sink = DashboardSink::new(&html, &js).with_template("<html><body>".to_string());

        let start = date!(2022 - 01 - 15);
        let items: Vec<_> = (0..13)
            .rev()
            .map(|i| Ok(Envelope::new(record(start + Duration::days(30 * i), 10.0 * (i + 1) as f64), "x")))
            .collect();
        sink.run(futures::stream::iter(items)).await.unwrap();

        let page = std::fs::read_to_string(&html).unwrap();
        assert!(page.contains("<script src=\"charts.js\"></script>"));
        // Records are re-sorted: the earliest bill comes first.
        let first = page.find("2022-01-15").unwrap();
        let second = page.find("2022-02-14").unwrap();
        assert!(first < second);
        // 13 bills give two 12-bill windows: mean of 10..=120 and 20..=130.
        assert!(page.contains("\"average\":65.0"));
        assert!(page.contains("\"average\":75.0"));

        assert_eq!(std::fs::read_to_string(&js).unwrap(), CHARTS_SCRIPT);
    }
}
