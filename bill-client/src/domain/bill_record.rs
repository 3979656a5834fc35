use serde::{Deserialize, Serialize};
use time::Date;

/// One billing statement as extracted from a saved bill document.
///
/// Usage and cost default to zero when a statement does not state them;
/// the supply/delivery split is `None` when the statement does not separate it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillRecord {
    pub filename: String,
    #[serde(with = "crate::domain::iso_date")]
    pub date: Date,
    pub electric_usage: f64,
    pub electric_cost: f64,
    pub gas_usage: f64,
    pub gas_cost: f64,
    pub electric_supply: Option<f64>,
    pub electric_delivery: Option<f64>,
    pub gas_supply: Option<f64>,
    pub gas_delivery: Option<f64>,
    pub total_amount_due: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fuel {
    Electric,
    Gas,
}

impl BillRecord {
    /// A record with every figure at its unparsed default.
    pub fn empty(filename: impl Into<String>, date: Date) -> Self {
        Self {
            filename: filename.into(),
            date,
            electric_usage: 0.0,
            electric_cost: 0.0,
            gas_usage: 0.0,
            gas_cost: 0.0,
            electric_supply: None,
            electric_delivery: None,
            gas_supply: None,
            gas_delivery: None,
            total_amount_due: None,
        }
    }

    pub fn total_cost(&self) -> f64 {
        self.electric_cost + self.gas_cost
    }

    pub fn has_supply_split(&self) -> bool {
        self.electric_supply.is_some() || self.gas_supply.is_some()
    }

    pub fn has_delivery_split(&self) -> bool {
        self.electric_delivery.is_some() || self.gas_delivery.is_some()
    }

    pub fn supply_total(&self) -> f64 {
        self.electric_supply.unwrap_or(0.0) + self.gas_supply.unwrap_or(0.0)
    }

    pub fn delivery_total(&self) -> f64 {
        self.electric_delivery.unwrap_or(0.0) + self.gas_delivery.unwrap_or(0.0)
    }

    /// `cost - (supply + delivery)` for one fuel, when both subtotals are known.
    ///
    /// Advisory only: statements round line items independently, so small
    /// drifts are expected.
    pub fn supply_delivery_drift(&self, fuel: Fuel) -> Option<f64> {
        let (cost, supply, delivery) = match fuel {
            Fuel::Electric => (self.electric_cost, self.electric_supply, self.electric_delivery),
            Fuel::Gas => (self.gas_cost, self.gas_supply, self.gas_delivery),
        };
        Some(cost - (supply? + delivery?))
    }
}

impl AsRef<BillRecord> for BillRecord {
    fn as_ref(&self) -> &BillRecord {
        self
    }
}
