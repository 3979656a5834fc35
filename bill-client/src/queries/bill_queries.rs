use std::{cmp::Ordering, str::FromStr};

use serde::Serialize;
use time::{Date, Month};

use crate::domain::{enriched_bill_record::round_to, BillRecord, EnrichedBillRecord};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("unknown fuel '{0}', expected electric, gas or both")]
    UnknownFuel(String),
    #[error("unknown sort column '{0}'")]
    UnknownSortKey(String),
}

/// Which fuel's cost counts toward totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FuelFilter {
    Electric,
    Gas,
    #[default]
    Both,
}

impl FuelFilter {
    pub fn cost(&self, bill: &BillRecord) -> f64 {
        match self {
            Self::Electric => bill.electric_cost,
            Self::Gas => bill.gas_cost,
            Self::Both => bill.total_cost(),
        }
    }
}

impl FromStr for FuelFilter {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "electric" | "electricity" => Ok(Self::Electric),
            "gas" => Ok(Self::Gas),
            "both" | "all" => Ok(Self::Both),
            other => Err(QueryError::UnknownFuel(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BillFilter {
    pub year: Option<i32>,
    pub month: Option<Month>,
    pub fuel: FuelFilter,
}

impl BillFilter {
    pub fn matches(&self, bill: &BillRecord) -> bool {
        self.year.map_or(true, |y| bill.date.year() == y)
            && self.month.map_or(true, |m| bill.date.month() == m)
    }
}

/// Records matching the year/month selection, in input order.
pub fn filter_records<'a, R: AsRef<BillRecord>>(records: &'a [R], filter: &BillFilter) -> Vec<&'a R> {
    records.iter().filter(|r| filter.matches(r.as_ref())).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BillExtreme {
    #[serde(with = "crate::domain::iso_date")]
    pub date: Date,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SupplyShare {
    /// Supply as a fraction of supply + delivery.
    pub supply: f64,
    pub bills_with_data: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BillSummary {
    pub total_spent: f64,
    pub avg_per_bill: f64,
    pub avg_per_day: Option<f64>,
    pub bill_count: usize,
    pub electric_share: Option<f64>,
    pub highest: BillExtreme,
    pub lowest: BillExtreme,
    pub supply_share: Option<SupplyShare>,
    /// Fractional change against the previous calendar year, when a year is
    /// selected and the previous year has records.
    pub year_over_year: Option<f64>,
}

/// KPI summary of a selection. `all` is the unfiltered record set, used for
/// the year-over-year comparison.
pub fn summarize(
    selection: &[&EnrichedBillRecord],
    all: &[EnrichedBillRecord],
    filter: &BillFilter,
) -> Option<BillSummary> {
    let first = selection.first()?;
    let fuel = filter.fuel;

    let total_spent: f64 = selection.iter().map(|r| fuel.cost(&r.bill)).sum();
    let days: u32 = selection.iter().map(|r| r.days_covered).sum();
    let electric: f64 = selection.iter().map(|r| r.bill.electric_cost).sum();
    let gas: f64 = selection.iter().map(|r| r.bill.gas_cost).sum();

    let mut highest = BillExtreme { date: first.bill.date, total: fuel.cost(&first.bill) };
    let mut lowest = highest.clone();
    for r in selection.iter().skip(1) {
        let total = fuel.cost(&r.bill);
        if total > highest.total {
            highest = BillExtreme { date: r.bill.date, total };
        }
        if total < lowest.total {
            lowest = BillExtreme { date: r.bill.date, total };
        }
    }

    let split: Vec<&BillRecord> = selection
        .iter()
        .map(|r| &r.bill)
        .filter(|b| b.has_supply_split())
        .collect();
    let supply: f64 = split.iter().map(|b| b.supply_total()).sum();
    let delivery: f64 = split.iter().map(|b| b.delivery_total()).sum();
    let supply_share = (supply + delivery > 0.0).then(|| SupplyShare {
        supply: supply / (supply + delivery),
        bills_with_data: split.len(),
    });

    let year_over_year = filter.year.and_then(|year| {
        let prev: Vec<&EnrichedBillRecord> = all.iter().filter(|r| r.bill.date.year() == year - 1).collect();
        let prev_total: f64 = prev.iter().map(|r| fuel.cost(&r.bill)).sum();
        (!prev.is_empty() && prev_total > 0.0).then(|| (total_spent - prev_total) / prev_total)
    });

    Some(BillSummary {
        total_spent,
        avg_per_bill: total_spent / selection.len() as f64,
        avg_per_day: (days > 0).then(|| total_spent / f64::from(days)),
        bill_count: selection.len(),
        electric_share: (electric + gas > 0.0).then(|| electric / (electric + gas)),
        highest,
        lowest,
        supply_share,
        year_over_year,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Season {
    Winter,
    Spring,
    Summer,
    Fall,
}

impl Season {
    pub const ALL: [Season; 4] = [Season::Winter, Season::Spring, Season::Summer, Season::Fall];

    pub fn of(month: Month) -> Self {
        use Month::*;
        match month {
            December | January | February => Self::Winter,
            March | April | May => Self::Spring,
            June | July | August => Self::Summer,
            September | October | November => Self::Fall,
        }
    }
}

/// Spend per season, in [`Season::ALL`] order.
pub fn season_totals<R: AsRef<BillRecord>>(records: &[R], fuel: FuelFilter) -> [(Season, f64); 4] {
    let mut totals = Season::ALL.map(|s| (s, 0.0));
    for r in records {
        let bill = r.as_ref();
        let idx = Season::ALL
            .iter()
            .position(|s| *s == Season::of(bill.date.month()))
            .unwrap_or(0);
        totals[idx].1 += fuel.cost(bill);
    }
    totals
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RollingPoint {
    #[serde(with = "crate::domain::iso_date")]
    pub date: Date,
    pub average: f64,
}

/// Trailing mean of total cost over `window` consecutive bills, labelled with
/// the last bill of each window and rounded to cents.
pub fn rolling_average<R: AsRef<BillRecord>>(records: &[R], window: usize) -> Vec<RollingPoint> {
    if window == 0 {
        return Vec::new();
    }
    records
        .windows(window)
        .map(|w| {
            let sum: f64 = w.iter().map(|r| r.as_ref().total_cost()).sum();
            RollingPoint {
                date: w[window - 1].as_ref().date,
                average: round_to(sum / window as f64, 2),
            }
        })
        .collect()
}

pub const TABLE_HEADER: [&str; 12] = [
    "Date", "Avg Temp", "kWh", "Electric $", "Therms", "Gas $", "Total $", "Supply $", "Delivery $", "Days",
    "kWh/Day", "$/Day",
];

/// One row of the dashboard table.
#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    pub date: Date,
    pub avg_temp: Option<f64>,
    pub electric_usage: f64,
    pub electric_cost: f64,
    pub gas_usage: f64,
    pub gas_cost: f64,
    pub total_cost: f64,
    pub supply: Option<f64>,
    pub delivery: Option<f64>,
    pub days_covered: u32,
    pub kwh_per_day: Option<f64>,
    pub cost_per_day: Option<f64>,
}

impl TableRow {
    pub fn from_record(r: &EnrichedBillRecord, fuel: FuelFilter) -> Self {
        let b = &r.bill;
        let total_cost = fuel.cost(b);
        let days = f64::from(r.days_covered);
        Self {
            date: b.date,
            avg_temp: r.avg_temp,
            electric_usage: b.electric_usage,
            electric_cost: b.electric_cost,
            gas_usage: b.gas_usage,
            gas_cost: b.gas_cost,
            total_cost,
            supply: b.has_supply_split().then(|| b.supply_total()),
            delivery: b.has_delivery_split().then(|| b.delivery_total()),
            days_covered: r.days_covered,
            kwh_per_day: (r.days_covered > 0).then(|| b.electric_usage / days),
            cost_per_day: (r.days_covered > 0).then(|| total_cost / days),
        }
    }

    /// Cells in [`TABLE_HEADER`] order; missing values are empty.
    pub fn to_fields(&self) -> [String; 12] {
        let opt = |v: Option<f64>, decimals: usize| v.map(|x| format!("{x:.decimals$}")).unwrap_or_default();
        [
            crate::domain::iso_date::format(self.date),
            opt(self.avg_temp, 1),
            self.electric_usage.to_string(),
            format!("{:.2}", self.electric_cost),
            self.gas_usage.to_string(),
            format!("{:.2}", self.gas_cost),
            format!("{:.2}", self.total_cost),
            opt(self.supply, 2),
            opt(self.delivery, 2),
            self.days_covered.to_string(),
            opt(self.kwh_per_day, 1),
            opt(self.cost_per_day, 2),
        ]
    }
}

pub fn table_rows(records: &[&EnrichedBillRecord], fuel: FuelFilter) -> Vec<TableRow> {
    records.iter().map(|r| TableRow::from_record(r, fuel)).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Date,
    AvgTemp,
    ElectricUsage,
    ElectricCost,
    GasUsage,
    GasCost,
    TotalCost,
    SupplyTotal,
    DeliveryTotal,
    DaysCovered,
    KwhPerDay,
    CostPerDay,
}

impl FromStr for SortKey {
    type Err = QueryError;

    /// Accepts the dashboard's column ids (`totalCost`, `kwhPerDay`, ...).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = match s.trim() {
            "date" => Self::Date,
            "avgTemp" => Self::AvgTemp,
            "electricUsage" => Self::ElectricUsage,
            "electricCost" => Self::ElectricCost,
            "gasUsage" => Self::GasUsage,
            "gasCost" => Self::GasCost,
            "totalCost" => Self::TotalCost,
            "supplyTotal" => Self::SupplyTotal,
            "deliveryTotal" => Self::DeliveryTotal,
            "daysCovered" => Self::DaysCovered,
            "kwhPerDay" => Self::KwhPerDay,
            "costPerDay" => Self::CostPerDay,
            other => return Err(QueryError::UnknownSortKey(other.to_string())),
        };
        Ok(key)
    }
}

fn cmp_opt(a: Option<f64>, b: Option<f64>) -> Ordering {
    a.unwrap_or(f64::NEG_INFINITY).total_cmp(&b.unwrap_or(f64::NEG_INFINITY))
}

/// Stable sort; missing values order before any number.
pub fn sort_rows(rows: &mut [TableRow], key: SortKey, ascending: bool) {
    rows.sort_by(|a, b| {
        let ord = match key {
            SortKey::Date => a.date.cmp(&b.date),
            SortKey::AvgTemp => cmp_opt(a.avg_temp, b.avg_temp),
            SortKey::ElectricUsage => a.electric_usage.total_cmp(&b.electric_usage),
            SortKey::ElectricCost => a.electric_cost.total_cmp(&b.electric_cost),
            SortKey::GasUsage => a.gas_usage.total_cmp(&b.gas_usage),
            SortKey::GasCost => a.gas_cost.total_cmp(&b.gas_cost),
            SortKey::TotalCost => a.total_cost.total_cmp(&b.total_cost),
            SortKey::SupplyTotal => cmp_opt(a.supply, b.supply),
            SortKey::DeliveryTotal => cmp_opt(a.delivery, b.delivery),
            SortKey::DaysCovered => a.days_covered.cmp(&b.days_covered),
            SortKey::KwhPerDay => cmp_opt(a.kwh_per_day, b.kwh_per_day),
            SortKey::CostPerDay => cmp_opt(a.cost_per_day, b.cost_per_day),
        };
        if ascending {
            ord
        } else {
            ord.reverse()
        }
    });
}
