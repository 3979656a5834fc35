//! Console summary and CSV export over the enriched bills.

use std::path::PathBuf;

use anyhow::{bail, Context};
use bill_client::domain::EnrichedBillRecord;
use bill_client::queries::{
    filter_records, season_totals, sort_rows, summarize, table_rows, BillFilter, SortKey, TableRow, TABLE_HEADER,
};
use time::Month;

use crate::config::AppConfig;

pub const USAGE: &str =
    "usage: bill_report [--year Y] [--month 1-12] [--fuel electric|gas|both] [--sort COLUMN] [--desc] [--export PATH]";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportArgs {
    pub filter: BillFilter,
    pub sort: Option<SortKey>,
    pub descending: bool,
    pub export: Option<PathBuf>,
}

impl ReportArgs {
    /// Parse the arguments after the program name.
    pub fn parse<I: IntoIterator<Item = String>>(args: I) -> anyhow::Result<Self> {
        let mut out = Self::default();
        let mut args = args.into_iter();
        while let Some(flag) = args.next() {
            if flag == "--desc" {
                out.descending = true;
                continue;
            }
            let Some(value) = args.next() else {
                bail!("{flag} needs a value\n{USAGE}");
            };
            match flag.as_str() {
                "--year" => out.filter.year = Some(value.parse().with_context(|| format!("invalid year '{value}'"))?),
                "--month" => {
                    let n: u8 = value.parse().with_context(|| format!("invalid month '{value}'"))?;
                    out.filter.month = Some(Month::try_from(n).with_context(|| format!("invalid month '{value}'"))?);
                }
                "--fuel" => out.filter.fuel = value.parse()?,
                "--sort" => out.sort = Some(value.parse()?),
                "--export" => out.export = Some(PathBuf::from(value)),
                other => bail!("unknown argument '{other}'\n{USAGE}"),
            }
        }
        Ok(out)
    }
}

/// Table rows as CSV, same columns as the dashboard export.
pub fn table_csv(rows: &[TableRow]) -> anyhow::Result<Vec<u8>> {
    let mut w = csv::Writer::from_writer(Vec::new());
    w.write_record(TABLE_HEADER)?;
    for row in rows {
        w.write_record(row.to_fields())?;
    }
    Ok(w.into_inner()?)
}

/// Selected, sorted table rows. Unsorted rows keep date order.
pub fn report_rows(records: &[EnrichedBillRecord], args: &ReportArgs) -> Vec<TableRow> {
    let selection = filter_records(records, &args.filter);
    let mut rows = table_rows(&selection, args.filter.fuel);
    if let Some(key) = args.sort {
        sort_rows(&mut rows, key, !args.descending);
    }
    rows
}

pub async fn run_report(cfg: &AppConfig, args: &ReportArgs) -> anyhow::Result<()> {
    let path = &cfg.output.enriched_json;
    let contents = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    let mut records: Vec<EnrichedBillRecord> =
        serde_json::from_str(&contents).with_context(|| format!("failed to parse {}", path.display()))?;
    records.sort_by(|a, b| a.bill.date.cmp(&b.bill.date));

    let selection = filter_records(&records, &args.filter);
    match summarize(&selection, &records, &args.filter) {
        Some(s) => {
            tracing::info!(
                bills = s.bill_count,
                total_spent = %format!("{:.2}", s.total_spent),
                avg_per_bill = %format!("{:.2}", s.avg_per_bill),
                avg_per_day = ?s.avg_per_day.map(|v| format!("{v:.2}")),
                electric_share = ?s.electric_share.map(|v| format!("{:.1}%", v * 100.0)),
                highest = %s.highest.date,
                lowest = %s.lowest.date,
                "selection summary"
            );
            if let Some(share) = &s.supply_share {
                tracing::info!(supply = %format!("{:.1}%", share.supply * 100.0), bills = share.bills_with_data, "supply share");
            }
            if let Some(change) = s.year_over_year {
                tracing::info!(change = %format!("{:+.1}%", change * 100.0), "year over year");
            }
        }
        None => tracing::warn!("no bills match the selection"),
    }
    for (season, total) in season_totals(&selection, args.filter.fuel) {
        tracing::info!(?season, total = %format!("{total:.2}"), "season total");
    }

    if let Some(out) = &args.export {
        let rows = report_rows(&records, args);
        tokio::fs::write(out, table_csv(&rows)?)
            .await
            .with_context(|| format!("failed to write {}", out.display()))?;
        tracing::info!(file = %out.display(), rows = rows.len(), "exported table");
    }
    Ok(())
}
