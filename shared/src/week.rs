use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

const CODE_FORMAT: &str = "%Y%m%d";
const DISPLAY_FORMAT: &str = "%b %d, %Y";

/// Week identifier: the calendar date the weekly snapshot ends on, written as `YYYYMMDD`.
///
/// Ordering follows the calendar, so a sorted list of codes is chronological.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WeekCode(NaiveDate);

impl WeekCode {
    pub fn from_date(date: NaiveDate) -> Self {
        Self(date)
    }

    pub fn date(self) -> NaiveDate {
        self.0
    }

    /// Human label used by the week selector, e.g. `Sep 03, 2025`.
    pub fn display_label(self) -> String {
        self.0.format(DISPLAY_FORMAT).to_string()
    }
}

impl fmt::Display for WeekCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(CODE_FORMAT))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidWeekCode(pub String);

impl fmt::Display for InvalidWeekCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' is not a YYYYMMDD week code", self.0)
    }
}

impl std::error::Error for InvalidWeekCode {}

impl FromStr for WeekCode {
    type Err = InvalidWeekCode;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        if trimmed.len() != 8 || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(InvalidWeekCode(raw.to_owned()));
        }
        NaiveDate::parse_from_str(trimmed, CODE_FORMAT)
            .map(Self)
            .map_err(|_| InvalidWeekCode(raw.to_owned()))
    }
}

impl TryFrom<String> for WeekCode {
    type Error = InvalidWeekCode;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<WeekCode> for String {
    fn from(value: WeekCode) -> Self {
        value.to_string()
    }
}

/// Week entry as listed by the week selector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekInfo {
    pub code: WeekCode,
    pub display: String,
}

impl From<WeekCode> for WeekInfo {
    fn from(code: WeekCode) -> Self {
        Self {
            code,
            display: code.display_label(),
        }
    }
}
