//! Statement phrases, in priority order per field.
//!
//! Templates changed several times over the years, so most fields have more
//! than one phrasing; the first pattern that matches wins.

use once_cell::sync::Lazy;
use regex::Regex;
use time::{Date, Month};

/// `Month D, YYYY`, full or abbreviated month name.
const STATEMENT_DATE: &str = r"([A-Za-z]{3,9}\.?\s+\d{1,2},?\s+\d{4})";
/// Currency amount with optional thousands separators.
const AMOUNT: &str = r"([\d,]+(?:\.\d+)?)";

fn ci(pattern: &str) -> Regex {
    Regex::new(&format!("(?i){pattern}")).unwrap()
}

pub struct Patterns {
    pub date_range: Regex,
    pub date_end: Regex,
    pub date_payment: Regex,

    pub electric_cost_combined: Regex,
    pub electric_cost_total: Regex,
    pub esco_supply: Regex,
    pub coned_delivery: Regex,

    pub gas_cost_combined: Regex,
    pub gas_cost_total: Regex,

    pub electric_usage: Regex,
    pub electric_usage_total: Regex,
    pub electric_usage_supply: Regex,
    pub electric_usage_meter_table: Regex,

    pub gas_usage: Regex,
    pub gas_usage_total: Regex,

    pub electric_supply_total: Regex,
    pub electric_delivery_total: Regex,
    pub gas_supply_total: Regex,
    pub gas_delivery_total: Regex,
    pub generic_supply_total: Regex,
    pub generic_delivery_total: Regex,

    pub total_amount_due: Regex,

    pub filename_year_month: Regex,
    statement_date: Regex,
}

pub static PATTERNS: Lazy<Patterns> = Lazy::new(|| Patterns {
    date_range: ci(&format!(r"Billing period:?.*?to\s+{STATEMENT_DATE}")),
    date_end: ci(&format!(r"Billing period ending:?\s+{STATEMENT_DATE}")),
    date_payment: ci(&format!(r"Total amount due by\s+{STATEMENT_DATE}")),

    electric_cost_combined: ci(&format!(r"Electricity charges\s*-\s*for\s*\d+\s*days\s*\${AMOUNT}")),
    electric_cost_total: ci(&format!(r"Your electricity total\s*\${AMOUNT}")),
    esco_supply: ci(&format!(r"Esco electricity supply charges\s*-\s*for\s*\d+\s*days\s*\${AMOUNT}")),
    coned_delivery: ci(&format!(r"Con Edison electricity charges\s*\${AMOUNT}")),

    gas_cost_combined: ci(&format!(r"Gas charges\s*-\s*for\s*\d+\s*days\s*\${AMOUNT}")),
    gas_cost_total: ci(&format!(r"Your gas total\s*\${AMOUNT}")),

    electric_usage: ci(&format!(r"Your electricity use\s*{AMOUNT}\s*kWh")),
    electric_usage_total: ci(&format!(r"Total electricity use\s*{AMOUNT}\s*kWh")),
    electric_usage_supply: ci(&format!(r"Supply\s+{AMOUNT}\s*kWh")),
    electric_usage_meter_table: ci(r"Read Diff\s*kWh.*?(\d+)\s+(\d+)"),

    gas_usage: ci(&format!(r"Your gas use\s*{AMOUNT}\s*therms")),
    gas_usage_total: ci(&format!(r"Total Gas Use\s*{AMOUNT}\s*therms")),

    electric_supply_total: ci(&format!(r"Total electricity supply charges\s*\$?{AMOUNT}")),
    electric_delivery_total: ci(&format!(r"Total electricity delivery charges\s*\$?{AMOUNT}")),
    gas_supply_total: ci(&format!(r"Total gas supply charges\s*\$?{AMOUNT}")),
    gas_delivery_total: ci(&format!(r"Total gas delivery charges\s*\$?{AMOUNT}")),
    generic_supply_total: ci(&format!(r"Total supply charges\s*\$?{AMOUNT}")),
    generic_delivery_total: ci(&format!(r"Total delivery charges\s*\$?{AMOUNT}")),

    total_amount_due: ci(&format!(r"Total amount due.*?\${AMOUNT}")),

    filename_year_month: Regex::new(r"-(\d{4})-(\d{2})").unwrap(),
    statement_date: ci(r"^([a-z]{3,9})\.?\s+(\d{1,2}),?\s+(\d{4})$"),
});

/// Parse a captured amount, dropping thousands separators.
pub fn parse_amount(s: &str) -> Option<f64> {
    s.replace(',', "").parse::<f64>().ok().filter(|v| v.is_finite())
}

/// First capture of the first pattern that matches and parses.
pub fn first_amount(text: &str, patterns: &[&Regex]) -> Option<f64> {
    patterns
        .iter()
        .find_map(|re| re.captures(text).and_then(|c| parse_amount(&c[1])))
}

/// Every capture of `pattern`, in document order.
pub fn all_amounts(text: &str, pattern: &Regex) -> Vec<f64> {
    pattern
        .captures_iter(text)
        .filter_map(|c| parse_amount(&c[1]))
        .collect()
}

const MONTH_NAMES: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

fn month_from_name(name: &str) -> Option<Month> {
    let lower = name.to_ascii_lowercase();
    let idx = MONTH_NAMES.iter().position(|full| full.starts_with(&lower))?;
    Month::try_from(idx as u8 + 1).ok()
}

/// `January 15, 2023`, `Jan. 15 2023`, `Sept 3, 2019`.
pub fn parse_statement_date(s: &str) -> Option<Date> {
    let caps = PATTERNS.statement_date.captures(s.trim())?;
    let month = month_from_name(&caps[1])?;
    let day: u8 = caps[2].parse().ok()?;
    let year: i32 = caps[3].parse().ok()?;
    Date::from_calendar_date(year, month, day).ok()
}

/// `YYYY-MM-01` from a `...-YYYY-MM...` file name.
pub fn date_from_filename(filename: &str) -> Option<Date> {
    let caps = PATTERNS.filename_year_month.captures(filename)?;
    let year: i32 = caps[1].parse().ok()?;
    let month = Month::try_from(caps[2].parse::<u8>().ok()?).ok()?;
    Date::from_calendar_date(year, month, 1).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn amounts_drop_thousands_separators() {
        assert_eq!(parse_amount("1,234.56"), Some(1234.56));
        assert_eq!(parse_amount("87"), Some(87.0));
        assert_eq!(parse_amount(","), None);
    }

    #[test]
    fn first_matching_pattern_wins() {
        let p = &*PATTERNS;
        let text = "Your electricity total $80.10 Electricity charges - for 30 days $75.25";
        let got = first_amount(text, &[&p.electric_cost_combined, &p.electric_cost_total]);
        assert_eq!(got, Some(75.25));
    }

    #[test]
    fn all_amounts_keep_document_order() {
        let text = "Total supply charges $12.00 ... Total supply charges 8.50";
        assert_eq!(all_amounts(text, &PATTERNS.generic_supply_total), vec![12.0, 8.5]);
    }

    #[test]
    fn statement_dates_accept_common_spellings() {
        assert_eq!(parse_statement_date("January 15, 2023"), Some(date!(2023 - 01 - 15)));
        assert_eq!(parse_statement_date("Feb 3 2021"), Some(date!(2021 - 02 - 03)));
        assert_eq!(parse_statement_date("Sept. 30, 2019"), Some(date!(2019 - 09 - 30)));
        assert_eq!(parse_statement_date("Smarch 3, 2019"), None);
        assert_eq!(parse_statement_date("February 30, 2020"), None);
    }

    #[test]
    fn filename_token_gives_first_of_month() {
        assert_eq!(date_from_filename("ConEd-Bill-2019-07.html"), Some(date!(2019 - 07 - 01)));
        assert_eq!(date_from_filename("statement-2020-12-final.html"), Some(date!(2020 - 12 - 01)));
        assert_eq!(date_from_filename("bill-2020-13.html"), None);
        assert_eq!(date_from_filename("bill.html"), None);
    }

    #[test]
    fn billing_period_range_takes_the_end_date() {
        let text = "Billing period: Dec 14, 2022 to Jan 15, 2023 Total amount due by Feb 5, 2023";
        let caps = PATTERNS.date_range.captures(text).unwrap();
        assert_eq!(&caps[1], "Jan 15, 2023");
    }
}
