use anyhow::Result;
use bill_ingestion::{config::AppConfig, observability, stages};

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    let cfg = AppConfig::load()?;

    // Each stage reads the previous stage's output file.
    stages::run_extract(&cfg).await?;
    stages::run_enrich(&cfg).await?;
    stages::run_dashboard(&cfg).await?;

    tracing::info!(dashboard = %cfg.output.dashboard_html.display(), "all stages complete");
    Ok(())
}
