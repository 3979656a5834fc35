//! `YYYY-MM-DD` serde adapter for [`time::Date`].

use serde::{Deserialize, Deserializer, Serializer};
use time::{format_description::BorrowedFormatItem, macros::format_description, Date};

pub const FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

pub fn format(date: Date) -> String {
    // Infallible for the four-digit years bills carry.
    date.format(FORMAT).unwrap_or_else(|_| date.to_string())
}

pub fn parse(s: &str) -> Result<Date, time::error::Parse> {
    Date::parse(s.trim(), FORMAT)
}

pub fn serialize<S>(date: &Date, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format(*date))
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<Date, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    parse(&s).map_err(|e| serde::de::Error::custom(format!("invalid date '{s}': {e}")))
}
