//! Date helper functions
//!
//! Dates are displayed in Brazilian Portuguese with lowercase month
//! abbreviations, e.g. `05 mar 2021`.

use chrono::{DateTime, Datelike, TimeZone, Timelike};

/// Abbreviated month names, January first
const PT_BR_MONTHS: [&str; 12] = [
    "jan", "fev", "mar", "abr", "mai", "jun", "jul", "ago", "set", "out", "nov", "dez",
];

/// Abbreviated pt-BR name of a month (1-12)
pub fn month_abbrev(month: u32) -> &'static str {
    PT_BR_MONTHS[(month as usize).saturating_sub(1) % 12]
}

/// Format a date as `dd mmm yyyy`
///
/// # Examples
/// ```ignore
/// format_date(&date) // -> "05 mar 2021"
/// ```
pub fn format_date<Tz: TimeZone>(date: &DateTime<Tz>) -> String {
    format!(
        "{:02} {} {}",
        date.day(),
        month_abbrev(date.month()),
        date.year()
    )
}

/// Format the edit notice, e.g. `* editado em 05 mar 2021, às 10:5`
///
/// Hour and minute are not zero-padded.
pub fn format_edit_timestamp<Tz: TimeZone>(date: &DateTime<Tz>) -> String {
    format!(
        "* editado em {}, às {}:{}",
        format_date(date),
        date.hour(),
        date.minute()
    )
}

/// Format a date in ISO 8601 / XML format
pub fn date_xml<Tz: TimeZone>(date: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    date.format("%Y-%m-%dT%H:%M:%S%:z").to_string()
}
