use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

/// Display/key format for a ledger date: `DD.MM.YYYY`.
pub const DATE_FORMAT: &str = "%d.%m.%Y";

// ASCII digits only; `\d` in the regex crate would also accept other Unicode digits.
static DATE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{2}\.[0-9]{2}\.[0-9]{4}$").unwrap());

static DISTANCE_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([+-]?)(Infinity|(?:[0-9]+(?:\.[0-9]*)?|\.[0-9]+)(?:[eE][+-]?[0-9]+)?)").unwrap()
});

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Введите дату в формате ДД.ММ.ГГГГ, используя точки.")]
    Format,
    #[error("Такой даты не существует. Пожалуйста, проверьте правильность.")]
    Calendar,
    #[error("distance is not a number")]
    Distance,
}

impl ValidationError {
    /// Silent errors abort the submission without alerting the user.
    pub fn is_silent(&self) -> bool {
        matches!(self, ValidationError::Distance)
    }
}

/// A date/distance pair that passed every check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Submission {
    pub date: NaiveDate,
    pub distance: f64,
}

pub fn check_date_format(input: &str) -> Result<(), ValidationError> {
    if DATE_PATTERN.is_match(input) {
        Ok(())
    } else {
        Err(ValidationError::Format)
    }
}

/// Parses a `DD.MM.YYYY` string into a real calendar date.
///
/// Any zero component is rejected. Years below 100 are rejected as well,
/// since they are read as 19xx and fail the day/month/year round-trip.
pub fn parse_calendar_date(input: &str) -> Result<NaiveDate, ValidationError> {
    let mut parts = input.split('.').map(|p| p.parse::<u32>().unwrap_or(0));
    let day = parts.next().unwrap_or(0);
    let month = parts.next().unwrap_or(0);
    let year = parts.next().unwrap_or(0);

    if day == 0 || month == 0 || year == 0 {
        return Err(ValidationError::Calendar);
    }
    if year < 100 {
        return Err(ValidationError::Calendar);
    }

    NaiveDate::from_ymd_opt(year as i32, month, day).ok_or(ValidationError::Calendar)
}

/// Reads the longest numeric prefix of `input`, after leading whitespace.
pub fn parse_distance(input: &str) -> Result<f64, ValidationError> {
    let trimmed = input.trim_start();
    let caps = DISTANCE_PREFIX
        .captures(trimmed)
        .ok_or(ValidationError::Distance)?;
    let negative = &caps[1] == "-";
    let body = &caps[2];

    let value = if body == "Infinity" {
        f64::INFINITY
    } else {
        body.parse::<f64>().map_err(|_| ValidationError::Distance)?
    };

    Ok(if negative { -value } else { value })
}

/// Runs the full check sequence: format, calendar, then distance.
pub fn validate(date: &str, distance: &str) -> Result<Submission, ValidationError> {
    check_date_format(date)?;
    let date = parse_calendar_date(date)?;
    let distance = parse_distance(distance)?;
    Ok(Submission { date, distance })
}
