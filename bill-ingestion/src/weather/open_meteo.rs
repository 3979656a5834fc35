use bill_client::domain::iso_date;
use serde::Deserialize;
use time::Date;

use crate::config::WeatherConfig;
use crate::weather::{DailyTemperatures, WeatherArchive, WeatherError};

const DAILY_FIELDS: &str = "temperature_2m_mean,temperature_2m_max,temperature_2m_min";

/// Open-Meteo historical archive, queried for one fixed location.
pub struct OpenMeteoArchive {
    client: reqwest::Client,
    endpoint: String,
    latitude: f64,
    longitude: f64,
    timezone: String,
}

#[derive(Deserialize)]
struct ArchiveResponse {
    #[serde(default)]
    error: bool,
    reason: Option<String>,
    daily: Option<DailySeries>,
}

#[derive(Deserialize)]
struct DailySeries {
    time: Vec<String>,
    temperature_2m_mean: Vec<Option<f64>>,
}

impl OpenMeteoArchive {
    pub fn new(cfg: &WeatherConfig) -> Result<Self, WeatherError> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self {
            client,
            endpoint: cfg.endpoint.clone(),
            latitude: cfg.latitude,
            longitude: cfg.longitude,
            timezone: cfg.timezone.clone(),
        })
    }

    fn query(&self, start: Date, end: Date) -> Vec<(&'static str, String)> {
        vec![
            ("latitude", self.latitude.to_string()),
            ("longitude", self.longitude.to_string()),
            ("start_date", iso_date::format(start)),
            ("end_date", iso_date::format(end)),
            ("daily", DAILY_FIELDS.to_string()),
            ("temperature_unit", "fahrenheit".to_string()),
            ("timezone", self.timezone.clone()),
        ]
    }
}

/// Decode an archive body into daily means. Null samples are dropped.
pub fn parse_archive_response(body: &str) -> Result<DailyTemperatures, WeatherError> {
    let parsed: ArchiveResponse = serde_json::from_str(body)?;
    if parsed.error {
        return Err(WeatherError::Archive(
            parsed.reason.unwrap_or_else(|| "no reason given".to_string()),
        ));
    }
    let daily = parsed
        .daily
        .ok_or_else(|| WeatherError::Malformed("missing 'daily' block".to_string()))?;
    if daily.time.len() != daily.temperature_2m_mean.len() {
        return Err(WeatherError::Malformed(format!(
            "{} dates but {} mean temperatures",
            daily.time.len(),
            daily.temperature_2m_mean.len()
        )));
    }

    let mut temps = DailyTemperatures::new();
    for (day, mean) in daily.time.iter().zip(daily.temperature_2m_mean) {
        let date = iso_date::parse(day)
            .map_err(|e| WeatherError::Malformed(format!("invalid date '{day}': {e}")))?;
        if let Some(mean) = mean {
            temps.insert(date, mean);
        }
    }
    Ok(temps)
}

#[async_trait::async_trait]
impl WeatherArchive for OpenMeteoArchive {
    async fn daily_mean_temperatures(&self, start: Date, end: Date) -> Result<DailyTemperatures, WeatherError> {
        tracing::info!(%start, %end, endpoint = %self.endpoint, "fetching daily temperatures");

        let response = self
            .client
            .get(&self.endpoint)
            .query(&self.query(start, end))
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;

        match parse_archive_response(&body) {
            Err(WeatherError::Decode(e)) if !status.is_success() => {
                Err(WeatherError::Archive(format!("HTTP {status}: {e}")))
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn parses_parallel_daily_arrays() {
        let body = r#"{
            "latitude": 40.75, "longitude": -73.94,
            "daily_units": {"time": "iso8601", "temperature_2m_mean": "°F"},
            "daily": {
                "time": ["2023-01-01", "2023-01-02", "2023-01-03"],
                "temperature_2m_mean": [41.2, null, 38.0],
                "temperature_2m_max": [45.0, null, 42.1],
                "temperature_2m_min": [36.5, null, 33.3]
            }
        }"#;
        let temps = parse_archive_response(body).unwrap();
        assert_eq!(temps.len(), 2);
        assert_eq!(temps.get(&date!(2023 - 01 - 01)), Some(&41.2));
        assert!(!temps.contains_key(&date!(2023 - 01 - 02)));
    }

    #[test]
    fn error_flag_is_reported_with_reason() {
        let body = r#"{"error": true, "reason": "Parameter 'start_date' is out of allowed range"}"#;
        match parse_archive_response(body) {
            Err(WeatherError::Archive(reason)) => assert!(reason.contains("start_date")),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn mismatched_arrays_are_malformed() {
        let body = r#"{"daily": {"time": ["2023-01-01"], "temperature_2m_mean": []}}"#;
        assert!(matches!(parse_archive_response(body), Err(WeatherError::Malformed(_))));
        assert!(matches!(parse_archive_response("{}"), Err(WeatherError::Malformed(_))));
        assert!(matches!(parse_archive_response("<html>"), Err(WeatherError::Decode(_))));
    }

    #[test]
    fn query_carries_location_and_range() {
        let archive = OpenMeteoArchive::new(&WeatherConfig::default()).unwrap();
        let q = archive.query(date!(2022 - 12 - 11), date!(2023 - 01 - 15));
        assert!(q.contains(&("start_date", "2022-12-11".to_string())));
        assert!(q.contains(&("end_date", "2023-01-15".to_string())));
        assert!(q.contains(&("latitude", "40.7536".to_string())));
        assert!(q.contains(&("temperature_unit", "fahrenheit".to_string())));
    }
}
