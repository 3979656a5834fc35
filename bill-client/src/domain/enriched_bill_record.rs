use serde::{Deserialize, Serialize};

use crate::domain::BillRecord;

/// Mean of the daily temperature samples that fell inside a bill's service window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowMean {
    pub mean_f: f64,
    pub days: u32,
}

/// A [`BillRecord`] plus the weather figures derived for its service window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedBillRecord {
    #[serde(flatten)]
    pub bill: BillRecord,
    pub avg_temp: Option<f64>,
    pub days_covered: u32,
    pub hdd: Option<f64>,
    pub cdd: Option<f64>,
    pub total_degree_days: Option<f64>,
    pub electric_intensity: Option<f64>,
    pub gas_intensity: Option<f64>,
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

impl EnrichedBillRecord {
    /// Derive degree days and intensities from a window mean.
    ///
    /// Degree days use the rounded average temperature, so `hdd + cdd`
    /// always equals `total_degree_days` to one decimal.
    pub fn derive(bill: BillRecord, window: Option<WindowMean>, base_f: f64) -> Self {
        let Some(window) = window.filter(|w| w.days > 0) else {
            return Self::without_weather(bill);
        };

        let avg = round_to(window.mean_f, 1);
        let days = f64::from(window.days);
        let hdd = (base_f - avg).max(0.0) * days;
        let cdd = (avg - base_f).max(0.0) * days;
        let total = hdd + cdd;

        let electric_intensity = (total > 0.0).then(|| round_to(bill.electric_usage / total, 3));
        let gas_intensity = (hdd > 0.0).then(|| round_to(bill.gas_usage / hdd, 3));

        Self {
            bill,
            avg_temp: Some(avg),
            days_covered: window.days,
            hdd: Some(round_to(hdd, 1)),
            cdd: Some(round_to(cdd, 1)),
            total_degree_days: Some(round_to(total, 1)),
            electric_intensity,
            gas_intensity,
        }
    }

    pub fn without_weather(bill: BillRecord) -> Self {
        Self {
            bill,
            avg_temp: None,
            days_covered: 0,
            hdd: None,
            cdd: None,
            total_degree_days: None,
            electric_intensity: None,
            gas_intensity: None,
        }
    }
}

impl AsRef<BillRecord> for EnrichedBillRecord {
    fn as_ref(&self) -> &BillRecord {
        &self.bill
    }
}
