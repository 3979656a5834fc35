use std::path::PathBuf;

use bill_client::domain::{iso_date, BillRecord, Fuel};
use futures::Stream;

use crate::pipeline::{Envelope, PipelineError, Sink};
use crate::sinks::{collect_records, write_output};

pub const CSV_HEADER: [&str; 11] = [
    "Date",
    "Electric Usage (kWh)",
    "Electric Cost ($)",
    "Elec Supply ($)",
    "Elec Delivery ($)",
    "Gas Usage (therms)",
    "Gas Cost ($)",
    "Gas Supply ($)",
    "Gas Delivery ($)",
    "Total Due ($)",
    "Source File",
];

/// Writes the extracted bills as a JSON array plus a CSV mirror, both in
/// `(date, filename)` order.
pub struct BillFileSink {
    json_path: PathBuf,
    csv_path: PathBuf,
}

impl BillFileSink {
    pub fn new<P: Into<PathBuf>, Q: Into<PathBuf>>(json_path: P, csv_path: Q) -> Self {
        Self { json_path: json_path.into(), csv_path: csv_path.into() }
    }
}

fn opt_cell(v: Option<f64>) -> String {
    v.map(|x| x.to_string()).unwrap_or_default()
}

fn csv_fields(b: &BillRecord) -> [String; 11] {
    [
        iso_date::format(b.date),
        b.electric_usage.to_string(),
        b.electric_cost.to_string(),
        opt_cell(b.electric_supply),
        opt_cell(b.electric_delivery),
        b.gas_usage.to_string(),
        b.gas_cost.to_string(),
        opt_cell(b.gas_supply),
        opt_cell(b.gas_delivery),
        opt_cell(b.total_amount_due),
        b.filename.clone(),
    ]
}

pub fn bills_to_csv(bills: &[BillRecord]) -> Result<Vec<u8>, PipelineError> {
    let to_sink_err = |e: csv::Error| PipelineError::Sink(format!("csv encoding failed: {e}"));
    let mut w = csv::Writer::from_writer(Vec::new());
    w.write_record(CSV_HEADER).map_err(to_sink_err)?;
    for b in bills {
        w.write_record(csv_fields(b)).map_err(to_sink_err)?;
    }
    w.into_inner()
        .map_err(|e| PipelineError::Sink(format!("csv flush failed: {e}")))
}

pub fn sort_bills(bills: &mut [BillRecord]) {
    bills.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.filename.cmp(&b.filename)));
}

fn log_advisories(bills: &[BillRecord]) {
    for pair in bills.windows(2) {
        if pair[0].date == pair[1].date {
            tracing::warn!(
                date = %pair[1].date,
                first = %pair[0].filename,
                second = %pair[1].filename,
                "two bills share a date"
            );
        }
    }
    for b in bills {
        for fuel in [Fuel::Electric, Fuel::Gas] {
            if let Some(drift) = b.supply_delivery_drift(fuel).filter(|d| d.abs() >= 0.01) {
                tracing::debug!(file = %b.filename, ?fuel, drift, "cost differs from supply + delivery");
            }
        }
    }
}

#[async_trait::async_trait]
impl Sink<BillRecord> for BillFileSink {
    async fn run<S>(&self, input: S) -> Result<(), PipelineError>
    where
        S: Stream<Item = Result<Envelope<BillRecord>, PipelineError>> + Send + Unpin + 'static,
    {
        let mut bills: Vec<BillRecord> = collect_records(input, "bill_files")
            .await?
            .into_iter()
            .map(|env| env.payload)
            .collect();
        sort_bills(&mut bills);
        log_advisories(&bills);

        let json = serde_json::to_string_pretty(&bills)
            .map_err(|e| PipelineError::Sink(format!("json encoding failed: {e}")))?;
        write_output(&self.json_path, json).await?;
        write_output(&self.csv_path, bills_to_csv(&bills)?).await?;

        metrics::counter!("bills_extracted_total").increment(bills.len() as u64);
        tracing::info!(bills = bills.len(), "extraction complete");
        Ok(())
    }
}
