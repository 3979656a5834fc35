use anyhow::Result;
use bill_ingestion::{config::AppConfig, observability, stages};
use std::{env, path::PathBuf};

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    let mut cfg = AppConfig::load()?;

    // Optional positional argument overrides the configured bill directory.
    if let Some(dir) = env::args().nth(1) {
        cfg.extract.html_dir = PathBuf::from(dir);
    }

    stages::run_extract(&cfg).await
}
