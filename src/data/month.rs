use std::fmt;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// Month – a calendar period
// ---------------------------------------------------------------------------

const MONTH_NAMES: [&str; 12] = [
    "January", "February", "March", "April", "May", "June", "July", "August",
    "September", "October", "November", "December",
];

/// A calendar month. Ordered by year, then month.
///
/// Yearless months (parsed from bare names such as `Mar`) carry `year == 0`
/// so they sort before any dated month and among themselves by calendar
/// position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Month {
    year: i32,
    month: u8,
}

impl Month {
    /// Build a dated month. Returns `None` unless `1 <= month <= 12`.
    pub fn new(year: i32, month: u8) -> Option<Self> {
        (1..=12).contains(&month).then_some(Month { year, month })
    }

    /// A month without a year, e.g. from a `month` column holding `"Jan"`.
    pub fn yearless(month: u8) -> Option<Self> {
        Self::new(0, month)
    }

    pub fn year(&self) -> Option<i32> {
        (self.year != 0).then_some(self.year)
    }

    /// 1-based month of the year.
    pub fn month(&self) -> u8 {
        self.month
    }

    /// Abbreviated English month name (`Jan`, `Feb`, ...).
    pub fn short_name(&self) -> &'static str {
        &MONTH_NAMES[usize::from(self.month - 1)][..3]
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.year() {
            Some(year) => write!(f, "{year:04}-{:02}", self.month),
            None => f.write_str(self.short_name()),
        }
    }
}

/// Error returned when a string is not a recognised month.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseMonthError(String);

impl fmt::Display for ParseMonthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "'{}' is not a month (expected YYYY-MM, YYYY-MM-DD, YYYY/MM or a month name)",
            self.0
        )
    }
}

impl std::error::Error for ParseMonthError {}

impl FromStr for Month {
    type Err = ParseMonthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        let err = || ParseMonthError(text.to_string());

        if let Some(month) = month_from_name(text) {
            return Ok(month);
        }

        // YYYY-MM, YYYY-MM-DD, YYYY/MM
        let mut parts = text.split(['-', '/']);
        let year = parts.next().ok_or_else(err)?;
        let month = parts.next().ok_or_else(err)?;
        if let Some(day) = parts.next() {
            let day: u8 = day.parse().map_err(|_| err())?;
            if !(1..=31).contains(&day) || parts.next().is_some() {
                return Err(err());
            }
        }
        if year.len() != 4 {
            return Err(err());
        }
        let year: i32 = year.parse().map_err(|_| err())?;
        let month: u8 = month.parse().map_err(|_| err())?;
        if year == 0 {
            return Err(err());
        }
        Month::new(year, month).ok_or_else(err)
    }
}

fn month_from_name(text: &str) -> Option<Month> {
    if text.len() < 3 {
        return None;
    }
    let lower = text.to_ascii_lowercase();
    MONTH_NAMES
        .iter()
        .position(|name| {
            let name = name.to_ascii_lowercase();
            lower == name || lower == name[..3]
        })
        .and_then(|i| Month::yearless(i as u8 + 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_supported_layouts() {
        let expected = Month::new(2024, 3).unwrap();
        assert_eq!("2024-03".parse::<Month>().unwrap(), expected);
        assert_eq!("2024-03-15".parse::<Month>().unwrap(), expected);
        assert_eq!("2024/3".parse::<Month>().unwrap(), expected);
        assert_eq!(" 2024-03 ".parse::<Month>().unwrap(), expected);
    }

    #[test]
    fn parses_month_names_without_year() {
        let march = "Mar".parse::<Month>().unwrap();
        assert_eq!(march, "march".parse::<Month>().unwrap());
        assert_eq!(march.year(), None);
        assert_eq!(march.month(), 3);
        assert_eq!(march.to_string(), "Mar");
    }

    #[test]
    fn rejects_garbage() {
        for bad in ["", "2024", "2024-13", "24-01", "2024-01-40", "Ma", "yesterday"] {
            assert!(bad.parse::<Month>().is_err(), "{bad:?} should not parse");
        }
    }

    #[test]
    fn ordering_is_chronological() {
        let mut months: Vec<Month> = ["2024-02", "2023-12", "2024-01"]
            .iter()
            .map(|s| s.parse().unwrap())
            .collect();
        months.sort();
        let shown: Vec<String> = months.iter().map(ToString::to_string).collect();
        assert_eq!(shown, ["2023-12", "2024-01", "2024-02"]);

        let jan = "Jan".parse::<Month>().unwrap();
        let dec = "December".parse::<Month>().unwrap();
        assert!(jan < dec);
    }
}
