use std::fmt::Display;

use chrono::{Datelike, Duration, Local, NaiveDate};
use serde::{Deserialize, Serialize};

/// Decoded body of the reservations endpoint. Its shape is owned by the portal.
pub type Reservations = serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Calendar {
    pub id: String,
    pub name: String,
}

impl Calendar {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

impl Display for Calendar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (id: {})", self.name, self.id)
    }
}

/// Inclusive range of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn single_day(date: NaiveDate) -> Self {
        Self::new(date, date)
    }

    /// Monday through Sunday of the week containing `date`.
    pub fn week_of(date: NaiveDate) -> Self {
        let offset = date.weekday().num_days_from_monday();
        let start = date - Duration::days(offset.into());
        Self::new(start, start + Duration::days(6))
    }

    pub fn today() -> Self {
        Self::single_day(Local::now().date_naive())
    }

    pub fn this_week() -> Self {
        Self::week_of(Local::now().date_naive())
    }

    pub fn start_iso(&self) -> String {
        self.start.format("%Y-%m-%d").to_string()
    }

    pub fn end_iso(&self) -> String {
        self.end.format("%Y-%m-%d").to_string()
    }

    pub fn validate(self) -> Result<Self, String> {
        if self.start > self.end {
            return Err(format!(
                "Start date ({}) cannot be after end date ({})",
                self.start, self.end
            ));
        }
        Ok(self)
    }
}

impl Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{} to {}", self.start, self.end)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_week_of_wednesday() {
        let wednesday = date(2024, 5, 15);
        assert_eq!(wednesday.weekday(), Weekday::Wed);

        let week = DateRange::week_of(wednesday);

        assert_eq!(week.start_iso(), "2024-05-13");
        assert_eq!(week.end_iso(), "2024-05-19");
        assert_eq!(week.start.weekday(), Weekday::Mon);
        assert_eq!(week.end.weekday(), Weekday::Sun);
    }

    #[test]
    fn test_week_of_edges() {
        let monday = date(2024, 5, 13);
        assert_eq!(DateRange::week_of(monday).start, monday);

        let sunday = date(2024, 5, 19);
        let week = DateRange::week_of(sunday);
        assert_eq!(week.start, monday);
        assert_eq!(week.end, sunday);
    }

    #[test]
    fn test_week_spanning_year_boundary() {
        let week = DateRange::week_of(date(2025, 1, 1));

        assert_eq!(week.start_iso(), "2024-12-30");
        assert_eq!(week.end_iso(), "2025-01-05");
        assert!(week.start < date(2024, 12, 31) && date(2024, 12, 31) < week.end);
        assert!(date(2025, 1, 6) > week.end);
    }

    #[test]
    fn test_today_is_single_day() {
        let today = DateRange::today();
        assert_eq!(today.start, today.end);
        assert_eq!(today.start, Local::now().date_naive());
    }

    #[test]
    fn test_this_week_contains_today() {
        let week = DateRange::this_week();
        let today = Local::now().date_naive();
        assert!(week.start <= today && today <= week.end);
        assert_eq!(week.end - week.start, Duration::days(6));
    }

    #[test]
    fn test_validate_rejects_reversed_range() {
        let reversed = DateRange::new(date(2024, 5, 20), date(2024, 5, 13));
        assert!(reversed.validate().is_err());

        let single = DateRange::single_day(date(2024, 5, 13));
        assert_eq!(single.validate(), Ok(single));
    }

    #[test]
    fn test_display() {
        assert_eq!(
            DateRange::single_day(date(2024, 5, 13)).to_string(),
            "2024-05-13"
        );
        assert_eq!(
            DateRange::week_of(date(2024, 5, 15)).to_string(),
            "2024-05-13 to 2024-05-19"
        );
        assert_eq!(
            Calendar::new("2", "Sauna").to_string(),
            "Sauna (id: 2)"
        );
    }
}
