// tests/extract_pipeline.rs
//
// Bill pages on disk through extraction, enrichment against a canned
// temperature series, and the dashboard build.
use std::fs;
use std::path::Path;
use std::sync::Arc;

use bill_client::domain::{BillRecord, EnrichedBillRecord};
use bill_ingestion::config::AppConfig;
use bill_ingestion::enrich::EnrichmentSettings;
use bill_ingestion::pipeline::Pipeline;
use bill_ingestion::sinks::WeatherEnrichmentSink;
use bill_ingestion::sources::JsonArrayFileSource;
use bill_ingestion::stages;
use bill_ingestion::transform::BillValidation;
use bill_ingestion::weather::{DailyTemperatures, WeatherArchive, WeatherError};
use time::Date;

const JANUARY: &str = r#"<html><head><style>td { color: red }</style></head><body>
    <p>Billing period: Dec&nbsp;14, 2022 to Jan 15, 2023</p>
    <table>
      <tr><td>Electricity charges - for 32 days</td><td>$1,061.17</td></tr>
      <tr><td>Gas charges - for 32 days</td><td>$120.40</td></tr>
      <tr><td>Your electricity use</td><td>2,312 kWh</td></tr>
      <tr><td>Your gas use</td><td>88 therms</td></tr>
      <tr><td>Total electricity supply charges</td><td>$400.07</td></tr>
      <tr><td>Total electricity delivery charges</td><td>$661.10</td></tr>
    </table>
    <p>Total amount due by Feb 5, 2023 $1,181.57</p>
</body></html>"#;

const FEBRUARY: &str = r#"<html><body>
    <p>Billing period ending February 14, 2023</p>
    <p>Your electricity total $98.10</p><p>Your gas total $140.00</p>
    <p>Total electricity use 1,020 kWh</p><p>Total Gas Use 101 therms</p>
</body></html>"#;

fn write_pages(dir: &Path) {
    fs::write(dir.join("ConEd-Bill-2023-02.html"), FEBRUARY).unwrap();
    fs::write(dir.join("ConEd-Bill-2023-01.html"), JANUARY).unwrap();
    // Stated date is the sentinel; the file name places it in March 2019.
    fs::write(
        dir.join("ConEd-Bill-2019-03.html"),
        "<p>Billing period ending March 1, 2014</p><p>Your gas total $55.00</p>",
    )
    .unwrap();
    fs::write(dir.join("ConEd-Bill-2016-11.html"), "<p>Your gas total $70.00</p>").unwrap();
    fs::write(dir.join("scan.html"), "<p>illegible</p>").unwrap();
}

fn config_in(dir: &Path) -> AppConfig {
    let mut cfg = AppConfig::default();
    cfg.extract.html_dir = dir.to_path_buf();
    cfg.output.bills_json = dir.join("bills_data.json");
    cfg.output.bills_csv = dir.join("bills_data.csv");
    cfg.output.enriched_json = dir.join("bills_weather_data.json");
    cfg.output.dashboard_html = dir.join("usage_dashboard.html");
    cfg.output.dashboard_script = dir.join("dashboard_charts.js");
    cfg
}

struct ConstantArchive(f64);

#[async_trait::async_trait]
impl WeatherArchive for ConstantArchive {
    async fn daily_mean_temperatures(&self, start: Date, end: Date) -> Result<DailyTemperatures, WeatherError> {
        let mut temps = DailyTemperatures::new();
        let mut day = start;
        while day <= end {
            temps.insert(day, self.0);
            day = day.next_day().unwrap();
        }
        Ok(temps)
    }
}

#[tokio::test]
async fn extraction_keeps_one_record_per_dated_page() {
    let dir = tempfile::tempdir().unwrap();
    write_pages(dir.path());
    let cfg = config_in(dir.path());

    stages::run_extract(&cfg).await.unwrap();

    let json = fs::read_to_string(&cfg.output.bills_json).unwrap();
    let bills: Vec<BillRecord> = serde_json::from_str(&json).unwrap();
    let files: Vec<_> = bills.iter().map(|b| b.filename.as_str()).collect();
    assert_eq!(files, ["ConEd-Bill-2019-03.html", "ConEd-Bill-2023-01.html", "ConEd-Bill-2023-02.html"]);

    for b in &bills {
        assert!(b.electric_usage >= 0.0 && b.electric_cost >= 0.0);
        assert!(b.gas_usage >= 0.0 && b.gas_cost >= 0.0);
    }
    assert_eq!(bills[0].date.to_string(), "2019-03-01");
    assert_eq!(bills[1].electric_cost, 1061.17);
    assert_eq!(bills[1].electric_supply, Some(400.07));
    assert_eq!(bills[1].gas_supply, None);
    assert_eq!(bills[2].gas_usage, 101.0);

    let csv = fs::read_to_string(&cfg.output.bills_csv).unwrap();
    assert_eq!(csv.lines().count(), 4);
    assert!(csv.lines().nth(2).unwrap().starts_with("2023-01-15,2312,1061.17,400.07,661.1,88,120.4,,,1181.57,"));
}

#[tokio::test]
async fn rerunning_extraction_is_byte_identical() {
    let dir = tempfile::tempdir().unwrap();
    write_pages(dir.path());
    let cfg = config_in(dir.path());

    stages::run_extract(&cfg).await.unwrap();
    let first_json = fs::read(&cfg.output.bills_json).unwrap();
    let first_csv = fs::read(&cfg.output.bills_csv).unwrap();

    stages::run_extract(&cfg).await.unwrap();
    assert_eq!(fs::read(&cfg.output.bills_json).unwrap(), first_json);
    assert_eq!(fs::read(&cfg.output.bills_csv).unwrap(), first_csv);
}

#[tokio::test]
async fn extracted_bills_flow_into_the_dashboard() {
    let dir = tempfile::tempdir().unwrap();
    write_pages(dir.path());
    let cfg = config_in(dir.path());
    stages::run_extract(&cfg).await.unwrap();

    let pipeline: Pipeline<_, BillRecord, _> = Pipeline {
        source: JsonArrayFileSource::new(&cfg.output.bills_json),
        transforms: vec![Arc::new(BillValidation::new(cfg.extract.cutoff_date))],
        sink: WeatherEnrichmentSink::new(
            ConstantArchive(40.0),
            EnrichmentSettings::from(&cfg.weather),
            &cfg.output.enriched_json,
        ),
    };
    pipeline.run().await.unwrap();

    let enriched: Vec<EnrichedBillRecord> =
        serde_json::from_str(&fs::read_to_string(&cfg.output.enriched_json).unwrap()).unwrap();
    assert_eq!(enriched.len(), 3);
    for e in &enriched {
        let (hdd, cdd, total) = (e.hdd.unwrap(), e.cdd.unwrap(), e.total_degree_days.unwrap());
        assert!(hdd >= 0.0 && cdd >= 0.0);
        assert!((hdd + cdd - total).abs() <= 0.1);
    }
    // 2023-01-15 to 2023-02-14 is a regular cycle: 31 days at 25 degrees below base.
    assert_eq!(enriched[2].days_covered, 31);
    assert_eq!(enriched[2].hdd, Some(775.0));

    stages::run_dashboard(&cfg).await.unwrap();
    let page = fs::read_to_string(&cfg.output.dashboard_html).unwrap();
    assert!(page.contains("const allData = [{\"filename\":\"ConEd-Bill-2019-03.html\""));
    assert!(page.contains("<script src=\"dashboard_charts.js\"></script>"));
    assert!(fs::read_to_string(&cfg.output.dashboard_script).unwrap().contains("rollingAverage"));
}
