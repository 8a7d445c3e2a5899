use logos::Logos;
use miette::Diagnostic;
use serde::Deserialize;
use thiserror::Error;
use time::{Date, Month};

#[derive(Logos, Debug, PartialEq)]
#[logos(skip r"[ \t]+")] // Ignore this regex pattern between tokens
enum DateToken {
    #[regex("[0-9]+")]
    Number,
    #[token("-")]
    Dash,
    #[token("T")]
    TimeSeparator,
    #[regex(r"[0-9]{2}:[0-9]{2}(:[0-9]{2}(\.[0-9]+)?)?")]
    Time,
    #[token("Z")]
    Utc,
}

#[derive(Logos, Debug, PartialEq)]
#[logos(skip r"[ \t]+")]
enum TemperatureToken {
    #[regex(r"-?[0-9]+(\.[0-9]+)?")]
    Number,
}

/// One row of the daily temperature CSV, exactly as the CSV reader hands it
/// over. Nothing is validated yet.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RawRow {
    pub date: String,
    pub min_temperature: String,
    pub max_temperature: String,
}

impl RawRow {
    pub fn new(
        date: impl Into<String>,
        min_temperature: impl Into<String>,
        max_temperature: impl Into<String>,
    ) -> Self {
        Self {
            date: date.into(),
            min_temperature: min_temperature.into(),
            max_temperature: max_temperature.into(),
        }
    }
}

#[derive(Debug, Error, Diagnostic)]
pub enum RecordError {
    #[error("Bad date: `{0}`")]
    #[diagnostic(
        code(heatmap::record::bad_date),
        help("dates are expected as YYYY-MM-DD, optionally followed by a time")
    )]
    BadDate(String),
    #[error("Invalid date: {0}")]
    #[diagnostic(code(heatmap::record::invalid_date))]
    InvalidDate(#[from] time::error::ComponentRange),
    #[error("Bad {field}: `{value}`")]
    #[diagnostic(code(heatmap::record::bad_temperature))]
    BadTemperature { field: &'static str, value: String },
    #[error("Minimum temperature {min} is above maximum temperature {max}")]
    #[diagnostic(code(heatmap::record::inverted_range))]
    InvertedRange { min: f64, max: f64 },
}

/// A validated daily reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailyRecord {
    pub date: Date,
    pub min_temperature: f64,
    pub max_temperature: f64,
}

impl DailyRecord {
    pub fn new(
        date: Date,
        min_temperature: f64,
        max_temperature: f64,
    ) -> Result<Self, RecordError> {
        if !min_temperature.is_finite() {
            return Err(RecordError::BadTemperature {
                field: "min_temperature",
                value: min_temperature.to_string(),
            });
        }
        if !max_temperature.is_finite() {
            return Err(RecordError::BadTemperature {
                field: "max_temperature",
                value: max_temperature.to_string(),
            });
        }
        if min_temperature > max_temperature {
            return Err(RecordError::InvertedRange {
                min: min_temperature,
                max: max_temperature,
            });
        }

        Ok(Self {
            date,
            min_temperature,
            max_temperature,
        })
    }

    pub fn parse(row: &RawRow) -> Result<Self, RecordError> {
        let date = parse_date(&row.date)?;
        let min_temperature = parse_temperature("min_temperature", &row.min_temperature)?;
        let max_temperature = parse_temperature("max_temperature", &row.max_temperature)?;
        Self::new(date, min_temperature, max_temperature)
    }

    pub fn year(&self) -> i32 {
        self.date.year()
    }

    pub fn month(&self) -> Month {
        self.date.month()
    }

    pub fn day(&self) -> u8 {
        self.date.day()
    }
}

impl TryFrom<&RawRow> for DailyRecord {
    type Error = RecordError;

    fn try_from(row: &RawRow) -> Result<Self, Self::Error> {
        Self::parse(row)
    }
}

/// Accepts `YYYY-MM-DD`, optionally followed by a time of day which is
/// ignored. The calendar date is taken as written, there is no timezone
/// conversion.
pub fn parse_date(s: &str) -> Result<Date, RecordError> {
    let bad_date = || RecordError::BadDate(s.to_string());
    let mut date = DateToken::lexer(s);

    let year: i32 = match date.next() {
        Some(Ok(DateToken::Number)) if date.slice().len() == 4 => {
            date.slice().parse().map_err(|_| bad_date())?
        }
        _ => return Err(bad_date()),
    };
    match date.next() {
        Some(Ok(DateToken::Dash)) => (),
        _ => return Err(bad_date()),
    };
    let month: u8 = match date.next() {
        Some(Ok(DateToken::Number)) if date.slice().len() <= 2 => {
            date.slice().parse().map_err(|_| bad_date())?
        }
        _ => return Err(bad_date()),
    };
    match date.next() {
        Some(Ok(DateToken::Dash)) => (),
        _ => return Err(bad_date()),
    };
    let day: u8 = match date.next() {
        Some(Ok(DateToken::Number)) if date.slice().len() <= 2 => {
            date.slice().parse().map_err(|_| bad_date())?
        }
        _ => return Err(bad_date()),
    };

    // The time of day only has to be well formed
    let has_time = match date.next() {
        None => false,
        Some(Ok(DateToken::TimeSeparator)) => match date.next() {
            Some(Ok(DateToken::Time)) => true,
            _ => return Err(bad_date()),
        },
        Some(Ok(DateToken::Time)) => true,
        _ => return Err(bad_date()),
    };
    if has_time {
        match date.next() {
            None => (),
            Some(Ok(DateToken::Utc)) if date.next().is_none() => (),
            _ => return Err(bad_date()),
        }
    }

    let month = Month::try_from(month)?;
    Ok(Date::from_calendar_date(year, month, day)?)
}

/// Plain decimal numbers only: `NaN`, `inf`, exponents, units and empty
/// fields are rejected.
pub fn parse_temperature(field: &'static str, s: &str) -> Result<f64, RecordError> {
    let bad_temperature = || RecordError::BadTemperature {
        field,
        value: s.to_string(),
    };
    let mut temperature = TemperatureToken::lexer(s);

    let value: f64 = match temperature.next() {
        Some(Ok(TemperatureToken::Number)) => {
            temperature.slice().parse().map_err(|_| bad_temperature())?
        }
        _ => return Err(bad_temperature()),
    };
    if temperature.next().is_some() || !value.is_finite() {
        return Err(bad_temperature());
    }

    Ok(value)
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use super::*;

    #[test]
    fn parses_plain_dates() {
        assert_eq!(parse_date("2009-01-05").unwrap(), date!(2009 - 01 - 05));
        assert_eq!(parse_date(" 1997-12-31 ").unwrap(), date!(1997 - 12 - 31));
        assert_eq!(parse_date("2012-2-9").unwrap(), date!(2012 - 02 - 09));
    }

    #[test]
    fn ignores_time_of_day() {
        assert_eq!(
            parse_date("2009-01-05T23:30:00Z").unwrap(),
            date!(2009 - 01 - 05)
        );
        assert_eq!(
            parse_date("2009-01-05 00:00:00").unwrap(),
            date!(2009 - 01 - 05)
        );
        assert_eq!(parse_date("2009-01-05T08:15").unwrap(), date!(2009 - 01 - 05));
    }

    #[test]
    fn rejects_bad_dates() {
        for s in [
            "",
            "not a date",
            "09-01-05",
            "2009/01/05",
            "2009-01",
            "2009-01-05T",
            "2009-01-05T10",
            "2009-01-05 junk",
            "2009-01-05T10:00Z Z",
        ] {
            assert!(
                matches!(parse_date(s), Err(RecordError::BadDate(_))),
                "{s:?} should be rejected"
            );
        }
    }

    #[test]
    fn rejects_impossible_calendar_dates() {
        assert!(matches!(
            parse_date("2009-02-30"),
            Err(RecordError::InvalidDate(_))
        ));
        assert!(matches!(
            parse_date("2009-13-01"),
            Err(RecordError::InvalidDate(_))
        ));
        assert!(matches!(
            parse_date("2009-00-10"),
            Err(RecordError::InvalidDate(_))
        ));
        assert!(parse_date("2008-02-29").is_ok());
    }

    #[test]
    fn parses_temperatures() {
        assert_eq!(parse_temperature("min_temperature", "12").unwrap(), 12.0);
        assert_eq!(parse_temperature("min_temperature", "-3.5").unwrap(), -3.5);
        assert_eq!(parse_temperature("min_temperature", " 0.25 ").unwrap(), 0.25);
    }

    #[test]
    fn rejects_non_numeric_temperatures() {
        for s in ["", " ", "NaN", "inf", "-inf", "abc", "12°C", "1.5.3", "1e3", "--4"] {
            match parse_temperature("max_temperature", s) {
                Err(RecordError::BadTemperature { field, value }) => {
                    assert_eq!(field, "max_temperature");
                    assert_eq!(value, s);
                }
                other => panic!("{s:?} should be rejected, got {other:?}"),
            }
        }
    }

    #[test]
    fn parses_a_full_row() {
        let record = DailyRecord::parse(&RawRow::new("2009-01-05", "2", "12.5")).unwrap();
        assert_eq!(record.year(), 2009);
        assert_eq!(record.month(), Month::January);
        assert_eq!(record.day(), 5);
        assert_eq!(record.min_temperature, 2.0);
        assert_eq!(record.max_temperature, 12.5);
    }

    #[test]
    fn rejects_inverted_rows() {
        let row = RawRow::new("2009-01-05", "15", "3");
        assert!(matches!(
            DailyRecord::try_from(&row),
            Err(RecordError::InvertedRange { .. })
        ));
    }

    #[test]
    fn rejects_non_finite_values() {
        assert!(DailyRecord::new(date!(2009 - 01 - 05), f64::NAN, 3.0).is_err());
        assert!(DailyRecord::new(date!(2009 - 01 - 05), 1.0, f64::INFINITY).is_err());
    }
}
