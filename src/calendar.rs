use chrono::{Datelike, NaiveDateTime, Timelike};
use serde::Serialize;

// Calendar dimension domains, in canonical order. Grouping output for these
// dimensions always covers the full domain, including keys absent from the data.
pub const DAY_NAMES: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

pub const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimeDimensions {
    pub hour: u32,
    pub day_of_week: &'static str,
    pub month: &'static str,
    pub iso_week: String,
}

pub fn day_name(timestamp: NaiveDateTime) -> &'static str {
    DAY_NAMES[timestamp.weekday().num_days_from_monday() as usize]
}

pub fn month_name(timestamp: NaiveDateTime) -> &'static str {
    MONTH_NAMES[timestamp.month0() as usize]
}

// ISO week identifier, e.g. "2019-W10". The ISO year can differ from the
// calendar year in the first and last days of a year.
pub fn iso_week_id(timestamp: NaiveDateTime) -> String {
    let week = timestamp.iso_week();
    format!("{}-W{:02}", week.year(), week.week())
}

// Derives every calendar attribute at once. Total over any valid timestamp;
// records whose timestamp failed to parse never reach this function.
pub fn derive(timestamp: NaiveDateTime) -> TimeDimensions {
    TimeDimensions {
        hour: timestamp.hour(),
        day_of_week: day_name(timestamp),
        month: month_name(timestamp),
        iso_week: iso_week_id(timestamp),
    }
}
