use chrono::{Datelike, NaiveDate};

const ONGOING_KEYWORDS: [&str; 6] = ["présent", "present", "actuel", "actuellement", "now", "current"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Period {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub ongoing: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PeriodError {
    #[error("'{0}' is not a year")]
    InvalidYear(String),
}

/// Renders a period as `"2020 - 2022"` or `"2020 - Present"`.
pub fn format_period(start: Option<NaiveDate>, end: Option<NaiveDate>, ongoing: bool) -> String {
    let Some(start) = start else {
        return String::new();
    };

    match (ongoing, end) {
        (false, Some(end)) => format!("{} - {}", start.year(), end.year()),
        (true, _) | (false, None) => format!("{} - Present", start.year()),
    }
}

fn parse_year(text: &str) -> Result<i32, PeriodError> {
    text.trim()
        .parse::<i32>()
        .map_err(|_| PeriodError::InvalidYear(text.trim().to_string()))
}

fn first_day(year: i32) -> Result<NaiveDate, PeriodError> {
    NaiveDate::from_ymd_opt(year, 1, 1).ok_or_else(|| PeriodError::InvalidYear(year.to_string()))
}

fn last_day(year: i32) -> Result<NaiveDate, PeriodError> {
    NaiveDate::from_ymd_opt(year, 12, 31).ok_or_else(|| PeriodError::InvalidYear(year.to_string()))
}

/// Parses free text such as `"2020 - 2022"` or `"2019 - présent"`.
///
/// Text without a `-` separator is read as "since the start of this year".
pub fn parse_period(text: &str, today: NaiveDate) -> Result<Period, PeriodError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(Period::default());
    }

    let Some((start, end)) = text.split_once('-') else {
        return Ok(Period {
            start_date: Some(first_day(today.year())?),
            end_date: None,
            ongoing: true,
        });
    };

    let start_date = Some(first_day(parse_year(start)?)?);
    let end = end.trim().to_lowercase();

    if ONGOING_KEYWORDS.iter().any(|keyword| end.contains(keyword)) {
        return Ok(Period {
            start_date,
            end_date: None,
            ongoing: true,
        });
    }

    Ok(Period {
        start_date,
        end_date: Some(last_day(parse_year(&end)?)?),
        ongoing: false,
    })
}

pub fn format_location(city: &str, country: &str) -> String {
    match (city.trim(), country.trim()) {
        ("", "") => String::new(),
        (city, "") => city.to_string(),
        ("", country) => country.to_string(),
        (city, country) => format!("{city}, {country}"),
    }
}

/// Splits `"City, Country"` on the first comma. Returns `(city, country)`.
pub fn parse_location(text: &str) -> (String, String) {
    match text.split_once(',') {
        Some((city, country)) => (city.trim().to_string(), country.trim().to_string()),
        None => (text.trim().to_string(), String::new()),
    }
}
