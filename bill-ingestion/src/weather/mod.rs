//! Historical daily temperatures.

pub mod open_meteo;

use std::collections::BTreeMap;

use time::Date;

pub use open_meteo::OpenMeteoArchive;

/// Daily mean temperature (°F) by calendar day; days without a sample are absent.
pub type DailyTemperatures = BTreeMap<Date, f64>;

#[derive(thiserror::Error, Debug)]
pub enum WeatherError {
    #[error("weather request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("weather response is not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("weather archive rejected the request: {0}")]
    Archive(String),
    #[error("malformed weather response: {0}")]
    Malformed(String),
}

#[async_trait::async_trait]
pub trait WeatherArchive: Send + Sync {
    /// Daily means for every day in `[start, end]` the archive has data for.
    async fn daily_mean_temperatures(&self, start: Date, end: Date) -> Result<DailyTemperatures, WeatherError>;
}
