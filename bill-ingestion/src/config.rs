use serde::Deserialize;
use std::{fs, path::PathBuf};
use time::{macros::date, Date};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    pub html_dir: PathBuf,
    /// Bills dated before this are dropped.
    #[serde(with = "bill_client::domain::iso_date")]
    pub cutoff_date: Date,
    /// Parsed dates older than this are treated as misreads.
    #[serde(with = "bill_client::domain::iso_date")]
    pub sanity_floor: Date,
    /// A date some statement templates print in place of the period end.
    #[serde(with = "bill_client::domain::iso_date")]
    pub sentinel_date: Date,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            html_dir: PathBuf::from("."),
            cutoff_date: date!(2017 - 06 - 01),
            sanity_floor: date!(2017 - 01 - 01),
            sentinel_date: date!(2014 - 03 - 01),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    pub endpoint: String,
    pub latitude: f64,
    pub longitude: f64,
    pub timezone: String,
    pub degree_day_base: f64,
    pub fetch_padding_days: i64,
    pub fallback_window_days: i64,
    pub min_cycle_days: i64,
    pub max_cycle_days: i64,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://archive-api.open-meteo.com/v1/archive".to_string(),
            // Long Island City, NY 11101
            latitude: 40.7536,
            longitude: -73.9432,
            timezone: "America/New_York".to_string(),
            degree_day_base: 65.0,
            fetch_padding_days: 35,
            fallback_window_days: 30,
            min_cycle_days: 20,
            max_cycle_days: 45,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub bills_json: PathBuf,
    pub bills_csv: PathBuf,
    pub enriched_json: PathBuf,
    pub dashboard_html: PathBuf,
    pub dashboard_script: PathBuf,
    pub dashboard_template: Option<PathBuf>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            bills_json: PathBuf::from("bills_data.json"),
            bills_csv: PathBuf::from("bills_data.csv"),
            enriched_json: PathBuf::from("bills_weather_data.json"),
            dashboard_html: PathBuf::from("usage_dashboard.html"),
            dashboard_script: PathBuf::from("dashboard_charts.js"),
            dashboard_template: None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub extract: ExtractConfig,
    pub weather: WeatherConfig,
    pub output: OutputConfig,
}

const DEFAULT_CONFIG_PATH: &str = "bills-config.toml";

impl AppConfig {
    /// Load from `BILLS_CONFIG`, else `bills-config.toml`.
    ///
    /// A missing default file yields the built-in settings; a missing file
    /// named through the environment is an error.
    pub fn load() -> anyhow::Result<Self> {
        use std::env;

        match env::var("BILLS_CONFIG") {
            Ok(path) => Self::from_file(&path),
            Err(_) if PathBuf::from(DEFAULT_CONFIG_PATH).exists() => Self::from_file(DEFAULT_CONFIG_PATH),
            Err(_) => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config '{path}': {e}"))?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> anyhow::Result<Self> {
        let cfg: AppConfig = toml::from_str(contents)?;
        Ok(cfg)
    }
}
