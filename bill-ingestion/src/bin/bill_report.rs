use anyhow::Result;
use bill_ingestion::{
    config::AppConfig,
    observability,
    report::{self, ReportArgs},
};
use std::env;

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    let args = ReportArgs::parse(env::args().skip(1))?;
    let cfg = AppConfig::load()?;

    report::run_report(&cfg, &args).await
}
