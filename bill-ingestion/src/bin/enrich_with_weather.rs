use anyhow::Result;
use bill_ingestion::{config::AppConfig, observability, stages};

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    let cfg = AppConfig::load()?;
    stages::run_enrich(&cfg).await
}
