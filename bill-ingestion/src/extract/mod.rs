//! Bill field extraction from saved statement pages.

pub mod patterns;
pub mod text;

use bill_client::domain::BillRecord;
use time::Date;

use crate::config::ExtractConfig;
use patterns::{all_amounts, date_from_filename, first_amount, parse_statement_date, PATTERNS};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractRules {
    pub cutoff: Date,
    pub sanity_floor: Date,
    pub sentinel: Date,
}

impl From<&ExtractConfig> for ExtractRules {
    fn from(cfg: &ExtractConfig) -> Self {
        Self {
            cutoff: cfg.cutoff_date,
            sanity_floor: cfg.sanity_floor,
            sentinel: cfg.sentinel_date,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    Bill(BillRecord),
    BeforeCutoff(Date),
    Undated,
}

/// Period-end date stated in the text, without any fallback.
pub fn stated_date(text: &str) -> Option<Date> {
    let p = &*PATTERNS;
    [&p.date_range, &p.date_end, &p.date_payment]
        .iter()
        .find_map(|re| re.captures(text))
        .and_then(|c| parse_statement_date(&c[1]))
}

/// Stated date, replaced by the file name's year-month when it is missing,
/// the sentinel, or older than the sanity floor.
pub fn statement_date(text: &str, filename: &str, rules: &ExtractRules) -> Option<Date> {
    match stated_date(text) {
        Some(d) if d != rules.sentinel && d >= rules.sanity_floor => Some(d),
        _ => date_from_filename(filename),
    }
}

fn electric_cost(text: &str) -> f64 {
    let p = &*PATTERNS;
    if let Some(cost) = first_amount(text, &[&p.electric_cost_combined, &p.electric_cost_total]) {
        return cost;
    }
    // Older statements list the supplier and utility portions separately.
    let supply = first_amount(text, &[&p.esco_supply]).unwrap_or(0.0);
    let delivery = first_amount(text, &[&p.coned_delivery]).unwrap_or(0.0);
    supply + delivery
}

fn electric_usage(text: &str) -> f64 {
    let p = &*PATTERNS;
    first_amount(
        text,
        &[&p.electric_usage, &p.electric_usage_total, &p.electric_usage_supply],
    )
    .or_else(|| {
        // Meter table: previous read, then the difference.
        p.electric_usage_meter_table
            .captures(text)
            .and_then(|c| patterns::parse_amount(&c[2]))
    })
    .unwrap_or(0.0)
}

/// Fill still-missing subtotals from the fuel-agnostic "Total supply/delivery
/// charges" lines.
///
/// Relies on statements listing electricity before gas: the first generic
/// delivery line is electric, the second gas. A lone generic supply line is
/// gas, because electric supply then appears under its specific phrase.
/// Unverified against every template.
pub fn reconcile_generic_subtotals(text: &str, bill: &mut BillRecord) {
    if bill.electric_delivery.is_some() && bill.gas_delivery.is_some() {
        return;
    }
    let p = &*PATTERNS;
    let supply = all_amounts(text, &p.generic_supply_total);
    let delivery = all_amounts(text, &p.generic_delivery_total);

    if bill.electric_delivery.is_none() {
        bill.electric_delivery = delivery.first().copied();
    }
    if bill.gas_delivery.is_none() {
        bill.gas_delivery = delivery.get(1).copied();
    }

    match (bill.electric_supply.is_none(), supply.as_slice()) {
        (true, [electric, gas, ..]) => {
            bill.electric_supply = Some(*electric);
            bill.gas_supply.get_or_insert(*gas);
        }
        (_, [only, ..]) => {
            bill.gas_supply.get_or_insert(*only);
        }
        _ => {}
    }
}

/// Every figure of one statement; missing usage/cost stay 0, missing
/// subtotals stay `None`.
pub fn extract_fields(text: &str, filename: &str, date: Date) -> BillRecord {
    let p = &*PATTERNS;
    let mut bill = BillRecord::empty(filename, date);

    bill.electric_cost = electric_cost(text);
    bill.gas_cost = first_amount(text, &[&p.gas_cost_combined, &p.gas_cost_total]).unwrap_or(0.0);
    bill.electric_usage = electric_usage(text);
    bill.gas_usage = first_amount(text, &[&p.gas_usage, &p.gas_usage_total]).unwrap_or(0.0);

    bill.electric_supply = first_amount(text, &[&p.electric_supply_total]);
    bill.electric_delivery = first_amount(text, &[&p.electric_delivery_total]);
    bill.gas_supply = first_amount(text, &[&p.gas_supply_total]);
    bill.gas_delivery = first_amount(text, &[&p.gas_delivery_total]);
    reconcile_generic_subtotals(text, &mut bill);

    bill.total_amount_due = first_amount(text, &[&p.total_amount_due]);
    bill
}

/// Extract one bill page. Pages without a usable date, or dated before the
/// cutoff, produce no record.
pub fn extract_bill(html: &str, filename: &str, rules: &ExtractRules) -> Extraction {
    let text = text::flatten_html(html);
    match statement_date(&text, filename, rules) {
        None => Extraction::Undated,
        Some(date) if date < rules.cutoff => Extraction::BeforeCutoff(date),
        Some(date) => Extraction::Bill(extract_fields(&text, filename, date)),
    }
}
