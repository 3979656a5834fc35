//! Service-window inference and per-bill weather figures.

use bill_client::domain::{BillRecord, EnrichedBillRecord, WindowMean};
use time::{Date, Duration};

use crate::config::WeatherConfig;
use crate::weather::DailyTemperatures;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnrichmentSettings {
    pub degree_day_base: f64,
    /// Days fetched before the earliest bill, to cover its unknown start.
    pub fetch_padding_days: i64,
    /// Lookback used when the previous bill is missing or off-cycle.
    pub fallback_window_days: i64,
    pub min_cycle_days: i64,
    pub max_cycle_days: i64,
}

impl From<&WeatherConfig> for EnrichmentSettings {
    fn from(cfg: &WeatherConfig) -> Self {
        Self {
            degree_day_base: cfg.degree_day_base,
            fetch_padding_days: cfg.fetch_padding_days,
            fallback_window_days: cfg.fallback_window_days,
            min_cycle_days: cfg.min_cycle_days,
            max_cycle_days: cfg.max_cycle_days,
        }
    }
}

impl Default for EnrichmentSettings {
    fn default() -> Self {
        Self::from(&WeatherConfig::default())
    }
}

fn days_before(date: Date, days: i64) -> Date {
    date.checked_sub(Duration::days(days)).unwrap_or(Date::MIN)
}

/// Range to fetch for a set of bills: padded earliest date through latest date.
pub fn fetch_range(bills: &[BillRecord], settings: &EnrichmentSettings) -> Option<(Date, Date)> {
    let first = bills.iter().map(|b| b.date).min()?;
    let last = bills.iter().map(|b| b.date).max()?;
    Some((days_before(first, settings.fetch_padding_days), last))
}

/// Start of a bill's service window.
///
/// The previous bill's date when it sits one regular billing cycle back,
/// otherwise a fixed lookback from `end`.
pub fn service_window_start(prev: Option<Date>, end: Date, settings: &EnrichmentSettings) -> Date {
    match prev {
        Some(prev) => {
            let gap = (end - prev).whole_days().abs();
            if (settings.min_cycle_days..=settings.max_cycle_days).contains(&gap) {
                prev
            } else {
                days_before(end, settings.fallback_window_days)
            }
        }
        None => days_before(end, settings.fallback_window_days),
    }
}

/// Mean of the samples inside `[start, end]`; `None` when no day has one.
pub fn window_mean(temps: &DailyTemperatures, start: Date, end: Date) -> Option<WindowMean> {
    if start > end {
        return None;
    }
    let (sum, days) = temps
        .range(start..=end)
        .fold((0.0, 0u32), |(sum, n), (_, t)| (sum + t, n + 1));
    (days > 0).then(|| WindowMean { mean_f: sum / f64::from(days), days })
}

/// Enrich bills already sorted by date.
pub fn enrich_bills(
    bills: &[BillRecord],
    temps: &DailyTemperatures,
    settings: &EnrichmentSettings,
) -> Vec<EnrichedBillRecord> {
    let mut prev: Option<Date> = None;
    bills
        .iter()
        .map(|bill| {
            let start = service_window_start(prev, bill.date, settings);
            prev = Some(bill.date);
            let window = window_mean(temps, start, bill.date);
            if window.is_none() {
                tracing::warn!(date = %bill.date, %start, "no weather samples in service window");
            }
            EnrichedBillRecord::derive(bill.clone(), window, settings.degree_day_base)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    fn bill(date: Date, electric_usage: f64, gas_usage: f64) -> BillRecord {
        let mut b = BillRecord::empty(format!("ConEd-Bill-{}.html", date), date);
        b.electric_usage = electric_usage;
        b.gas_usage = gas_usage;
        b
    }

    fn constant_temps(start: Date, end: Date, value: f64) -> DailyTemperatures {
        let mut temps = DailyTemperatures::new();
        let mut d = start;
        while d <= end {
            temps.insert(d, value);
            d = d.next_day().unwrap();
        }
        temps
    }

    #[test]
    fn regular_cycle_starts_at_previous_bill() {
        let s = EnrichmentSettings::default();
        let start = service_window_start(Some(date!(2023 - 01 - 15)), date!(2023 - 02 - 14), &s);
        assert_eq!(start, date!(2023 - 01 - 15));
    }

    #[test]
    fn long_gap_uses_thirty_day_lookback() {
        let s = EnrichmentSettings::default();
        let start = service_window_start(Some(date!(2023 - 01 - 01)), date!(2023 - 03 - 01), &s);
        assert_eq!(start, date!(2023 - 01 - 30));
    }

    #[test]
    fn short_gap_and_first_bill_use_lookback() {
        let s = EnrichmentSettings::default();
        assert_eq!(
            service_window_start(Some(date!(2023 - 02 - 01)), date!(2023 - 02 - 14), &s),
            date!(2023 - 01 - 15)
        );
        assert_eq!(service_window_start(None, date!(2023 - 02 - 14), &s), date!(2023 - 01 - 15));
        // Cycle bounds are inclusive.
        assert_eq!(
            service_window_start(Some(date!(2023 - 01 - 25)), date!(2023 - 02 - 14), &s),
            date!(2023 - 01 - 25)
        );
        assert_eq!(
            service_window_start(Some(date!(2022 - 12 - 31)), date!(2023 - 02 - 14), &s),
            date!(2022 - 12 - 31)
        );
    }

    #[test]
    fn fetch_range_pads_the_earliest_bill() {
        let s = EnrichmentSettings::default();
        let bills = vec![bill(date!(2023 - 01 - 15), 0.0, 0.0), bill(date!(2023 - 03 - 14), 0.0, 0.0)];
        assert_eq!(fetch_range(&bills, &s), Some((date!(2022 - 12 - 11), date!(2023 - 03 - 14))));
        assert_eq!(fetch_range(&[], &s), None);
    }

    #[test]
    fn window_mean_skips_missing_days() {
        let mut temps = DailyTemperatures::new();
        temps.insert(date!(2023 - 01 - 01), 30.0);
        temps.insert(date!(2023 - 01 - 03), 40.0);
        temps.insert(date!(2023 - 01 - 10), 90.0);

        let w = window_mean(&temps, date!(2023 - 01 - 01), date!(2023 - 01 - 05)).unwrap();
        assert_eq!(w.days, 2);
        assert_eq!(w.mean_f, 35.0);
        assert!(window_mean(&temps, date!(2023 - 01 - 04), date!(2023 - 01 - 09)).is_none());
    }

    #[test]
    fn enriches_each_bill_against_its_own_window() {
        let s = EnrichmentSettings::default();
        let mut temps = constant_temps(date!(2022 - 12 - 11), date!(2023 - 01 - 15), 35.0);
        temps.extend(constant_temps(date!(2023 - 01 - 16), date!(2023 - 02 - 14), 45.0));
        let bills = vec![bill(date!(2023 - 01 - 15), 300.0, 90.0), bill(date!(2023 - 02 - 14), 280.0, 80.0)];

        let out = enrich_bills(&bills, &temps, &s);
        assert_eq!(out.len(), 2);

        // 2022-12-16..=2023-01-15
        assert_eq!(out[0].days_covered, 31);
        assert_eq!(out[0].avg_temp, Some(35.0));
        assert_eq!(out[0].hdd, Some(930.0));

        // 2023-01-15..=2023-02-14, shares the boundary day with the first bill.
        assert_eq!(out[1].days_covered, 31);
        let expected = (35.0 + 30.0 * 45.0) / 31.0;
        assert_eq!(out[1].avg_temp, Some((expected * 10.0_f64).round() / 10.0));

        for e in &out {
            let (hdd, cdd, total) = (e.hdd.unwrap(), e.cdd.unwrap(), e.total_degree_days.unwrap());
            assert!(hdd >= 0.0 && cdd >= 0.0);
            assert!((hdd + cdd - total).abs() <= 0.1);
        }
    }

    #[test]
    fn bill_without_samples_keeps_null_weather() {
        let s = EnrichmentSettings::default();
        let temps = constant_temps(date!(2023 - 01 - 01), date!(2023 - 01 - 31), 30.0);
        let bills = vec![bill(date!(2023 - 01 - 20), 1.0, 1.0), bill(date!(2023 - 06 - 20), 1.0, 1.0)];

        let out = enrich_bills(&bills, &temps, &s);
        assert_eq!(out.len(), 2);
        let late = &out[1];
        assert_eq!(late.days_covered, 0);
        assert!(late.avg_temp.is_none() && late.hdd.is_none() && late.cdd.is_none());
        assert!(late.electric_intensity.is_none() && late.gas_intensity.is_none());
    }
}
