use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A possibly partial air date as supplied by the metadata provider.
///
/// `month == 0` means only the year is known, `day == 0` means only year and
/// month are known, and the all-zero value is the "date entirely unknown"
/// sentinel. Rendered and parsed in the provider's zero-padded `YYYY-MM-DD`
/// form (`0000-00-00` for unknown).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct AirDate {
    year: u16,
    month: u8,
    day: u8,
}

impl AirDate {
    pub const UNKNOWN: AirDate = AirDate { year: 0, month: 0, day: 0 };

    pub fn new(year: u16, month: u8, day: u8) -> Self {
        Self { year, month, day }
    }

    pub fn from_naive(date: NaiveDate) -> Self {
        use chrono::Datelike;
        Self {
            year: date.year().clamp(0, u16::MAX as i32) as u16,
            month: date.month() as u8,
            day: date.day() as u8,
        }
    }

    pub fn year(&self) -> u16 {
        self.year
    }

    pub fn is_unknown(&self) -> bool {
        self.year == 0
    }

    /// Comparable `YYYY-MM-DD` key resolving partial dates to the end of the
    /// period they name: a year-only date compares as December 31 of that
    /// year, a year-month date as the last calendar day of that month.
    /// The unknown sentinel maps to the minimum key (`0000-00-00`); callers
    /// exclude it from aired/upcoming bucketing rather than order by it.
    pub fn sort_key(&self) -> String {
        if self.is_unknown() {
            return "0000-00-00".to_string();
        }

        if self.month == 0 {
            return format!("{:04}-12-31", self.year);
        }

        if self.day == 0 {
            return format!(
                "{:04}-{:02}-{:02}",
                self.year,
                self.month,
                last_day_of_month(self.year, self.month)
            );
        }

        self.to_string()
    }
}

fn last_day_of_month(year: u16, month: u8) -> u8 {
    let (next_year, next_month) = if month == 12 { (year as i32 + 1, 1) } else { (year as i32, month as u32 + 1) };

    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|d| d.pred_opt())
        .map(|d| chrono::Datelike::day(&d) as u8)
        .unwrap_or(31)
}

impl fmt::Display for AirDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("malformed air date {0:?}: expected YYYY-MM-DD")]
pub struct ParseAirDateError(pub String);

impl FromStr for AirDate {
    type Err = ParseAirDateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(3, '-');
        let (year, month, day) = match (parts.next(), parts.next(), parts.next()) {
            (Some(y), Some(m), Some(d)) => (y, m, d),
            _ => return Err(ParseAirDateError(s.to_string())),
        };

        let year: u16 = year.parse().map_err(|_| ParseAirDateError(s.to_string()))?;
        let month: u8 = month.parse().map_err(|_| ParseAirDateError(s.to_string()))?;
        let day: u8 = day.parse().map_err(|_| ParseAirDateError(s.to_string()))?;

        if month > 12 || day > 31 {
            return Err(ParseAirDateError(s.to_string()));
        }

        Ok(Self { year, month, day })
    }
}

impl From<AirDate> for String {
    fn from(date: AirDate) -> Self {
        date.to_string()
    }
}

impl TryFrom<String> for AirDate {
    type Error = ParseAirDateError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_dates_compare_naturally() {
        let earlier: AirDate = "2023-01-08".parse().unwrap();
        let later: AirDate = "2023-01-15".parse().unwrap();
        assert!(earlier.sort_key() < later.sort_key());
        assert_eq!(earlier.sort_key(), "2023-01-08");
    }

    #[test]
    fn year_only_resolves_to_december_31() {
        let year_only: AirDate = "2024-00-00".parse().unwrap();
        assert_eq!(year_only.sort_key(), "2024-12-31");

        // After every full date in the year except the very last day.
        assert!(year_only.sort_key() >= "2024-12-30".to_string());
        assert!(year_only.sort_key() < "2025-01-01".to_string());
    }

    #[test]
    fn year_month_resolves_to_last_day_of_month() {
        let feb_leap: AirDate = "2024-02-00".parse().unwrap();
        assert_eq!(feb_leap.sort_key(), "2024-02-29");

        let feb: AirDate = "2023-02-00".parse().unwrap();
        assert_eq!(feb.sort_key(), "2023-02-28");

        let april: AirDate = "2023-04-00".parse().unwrap();
        assert_eq!(april.sort_key(), "2023-04-30");

        let dec: AirDate = "2023-12-00".parse().unwrap();
        assert_eq!(dec.sort_key(), "2023-12-31");
    }

    #[test]
    fn partial_dates_never_sort_before_earlier_full_dates() {
        let partial: AirDate = "2023-06-00".parse().unwrap();
        let earlier_full: AirDate = "2023-06-15".parse().unwrap();
        assert!(partial.sort_key() >= earlier_full.sort_key());
    }

    #[test]
    fn unknown_sentinel() {
        let unknown: AirDate = "0000-00-00".parse().unwrap();
        assert!(unknown.is_unknown());
        assert_eq!(unknown, AirDate::UNKNOWN);
        assert_eq!(unknown.sort_key(), "0000-00-00");

        let known: AirDate = "1999-01-01".parse().unwrap();
        assert!(!known.is_unknown());
    }

    #[test]
    fn round_trips_through_display() {
        for s in ["0000-00-00", "2024-00-00", "2024-02-00", "2024-02-29"] {
            let date: AirDate = s.parse().unwrap();
            assert_eq!(date.to_string(), s);
        }
    }

    #[test]
    fn rejects_malformed_input() {
        assert!("2024".parse::<AirDate>().is_err());
        assert!("2024-13-01".parse::<AirDate>().is_err());
        assert!("2024-01-32".parse::<AirDate>().is_err());
        assert!("not-a-date".parse::<AirDate>().is_err());
    }
}
