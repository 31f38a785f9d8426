use crate::spreadsheet::reference::index_to_reference;
use chrono::Duration;
use chrono::NaiveDate;
use chrono::NaiveDateTime;
use chrono::Timelike;
use std::fmt::Display;
use tracing::debug;

/// Epoch used by workbooks in the 1900 or 1904 date system.
#[derive(Copy, Clone, Debug, PartialEq)]
pub(crate) enum DateSystem {
    V1900,
    V1904,
}

impl DateSystem {
    pub(crate) fn from_flag(is_1904: bool) -> Self {
        if is_1904 {
            Self::V1904
        } else {
            Self::V1900
        }
    }
}

/// Types of cell data as stored in worksheet XML.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub(crate) enum CellType {
    #[default]
    Empty,
    /// Boolean values (0/1)
    Boolean,
    /// Plain numeric values
    Number,
    /// Numbers formatted as a date
    Date(DateSystem),
    /// Numbers formatted as a date and time
    DateTime(DateSystem),
    /// Numbers formatted as a time of day
    Time(DateSystem),
    /// ISO 8601 date/time strings (`t="d"`)
    IsoDateTime,
    /// Inline or formula string values
    InlineString,
    /// Shared string table references
    SharedString,
    /// Error values (`#N/A`, `#DIV/0!`, ...)
    Error,
}

impl CellType {
    /// Maps built-in number format ids to date/time cell types.
    pub(crate) fn parse_builtin_number_format_id(id: &str, system: DateSystem) -> Option<Self> {
        match id {
            "22" => Some(Self::DateTime(system)),
            "14" | "15" | "16" | "17" => Some(Self::Date(system)),
            "18" | "19" | "20" | "21" | "45" | "46" | "47" => Some(Self::Time(system)),
            _ => None,
        }
    }

    /// Classifies a custom number format code by its date and time tokens.
    /// Quoted literals, escaped characters and bracketed sections are ignored.
    pub(crate) fn parse_custom_number_format(format: &str, system: DateSystem) -> Self {
        let mut is_escaped = false;
        let mut is_literal = false;
        let mut is_bracket = false;
        let mut is_date = false;
        let mut is_time = false;
        for character in format.chars() {
            match character {
                _ if is_escaped => is_escaped = false,
                '_' | '\\' => is_escaped = true,

                '"' if is_literal => is_literal = false,
                '"' if !is_bracket => is_literal = true,

                ']' if is_bracket => is_bracket = false,
                '[' if !is_literal => is_bracket = true,
                _ if is_literal || is_bracket => (),

                'Y' | 'y' | 'D' | 'd' => is_date = true,
                'H' | 'h' | 'S' | 's' => is_time = true,
                _ => (),
            }
        }

        match (is_date, is_time) {
            (true, true) => Self::DateTime(system),
            (true, false) => Self::Date(system),
            (false, true) => Self::Time(system),
            (false, false) => Self::Number,
        }
    }

    fn date_system(&self) -> Option<DateSystem> {
        match self {
            Self::Date(system) | Self::DateTime(system) | Self::Time(system) => Some(*system),
            _ => None,
        }
    }
}

/// A loosely typed cell value as the pipeline sees it.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
    #[default]
    Empty,
    Bool(bool),
    Number(f64),
    Text(String),
    DateTime(NaiveDateTime),
}

impl Value {
    /// Builds a text value, mapping the empty string to `Empty`.
    pub fn text(value: impl Into<String>) -> Self {
        let value = value.into();
        if value.is_empty() {
            Self::Empty
        } else {
            Self::Text(value)
        }
    }

    /// True for unset cells and for text that is empty after trimming.
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(text) => text.trim().is_empty(),
            _ => false,
        }
    }

    /// Numeric reading of the value: numbers as-is, booleans as 1/0,
    /// text parsed after trimming. Non-finite results are rejected.
    pub fn to_number(&self) -> Option<f64> {
        let number = match self {
            Self::Number(number) => *number,
            Self::Bool(value) => f64::from(u8::from(*value)),
            Self::Text(text) => text.trim().parse::<f64>().ok()?,
            Self::Empty | Self::DateTime(_) => return None,
        };
        number.is_finite().then_some(number)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

impl Display for Value {
    /// Whole numbers print without a fractional part, so a year cell reads "2023".
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => Ok(()),
            Self::Bool(value) => write!(f, "{}", if *value { "TRUE" } else { "FALSE" }),
            Self::Number(number) if number.fract() == 0.0 && number.abs() < 1e15 => {
                write!(f, "{}", *number as i64)
            }
            Self::Number(number) => write!(f, "{}", number),
            Self::Text(text) => write!(f, "{}", text),
            Self::DateTime(datetime) if is_date_only(datetime) => {
                write!(f, "{}", datetime.format("%Y-%m-%d"))
            }
            Self::DateTime(datetime) => write!(f, "{}", datetime.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

/// Represents a single cell read from a worksheet.
#[derive(Clone, Debug)]
pub(crate) struct Cell {
    /// Row index (0-based)
    pub(crate) row: usize,
    /// Column index (0-based)
    pub(crate) col: usize,
    /// Cell data type
    pub(crate) kind: CellType,
    /// Raw cell content (shared string index for `SharedString`)
    pub(crate) value: String,
}

impl Cell {
    /// Returns the A1-style reference of the cell.
    pub(crate) fn reference(&self) -> String {
        index_to_reference(self.row, self.col)
    }

    /// Resolves the raw content to a [`Value`].
    ///
    /// Error cells and dangling shared string indexes read as `Empty`; a date
    /// serial that falls outside the calendar keeps its numeric value.
    pub(crate) fn to_value(&self, shared_strings: &[String]) -> Value {
        match self.kind {
            CellType::Empty | CellType::Error => Value::Empty,
            CellType::Boolean => Value::Bool(self.value.trim() == "1"),
            CellType::InlineString => Value::text(self.value.as_str()),
            CellType::SharedString => {
                let text = self.value
                    .trim()
                    .parse::<usize>()
                    .ok()
                    .and_then(|index| shared_strings.get(index));
                match text {
                    Some(text) => Value::text(text.as_str()),
                    None => {
                        debug!(cell = %self.reference(), index = %self.value, "dangling shared string index");
                        Value::Empty
                    }
                }
            }
            CellType::IsoDateTime => parse_iso_datetime(&self.value)
                .map(Value::DateTime)
                .unwrap_or_else(|| Value::text(self.value.as_str())),
            CellType::Number | CellType::Date(_) | CellType::DateTime(_) | CellType::Time(_) => {
                match self.value.trim().parse::<f64>() {
                    Ok(number) => self.kind
                        .date_system()
                        .and_then(|system| serial_to_datetime(number, system))
                        .map(Value::DateTime)
                        .unwrap_or(Value::Number(number)),
                    Err(_) => Value::text(self.value.as_str()),
                }
            }
        }
    }
}

fn parse_iso_datetime(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .map(|date| date.and_time(chrono::NaiveTime::MIN))
        })
}

fn epoch(system: DateSystem) -> NaiveDate {
    match system {
        DateSystem::V1900 => NaiveDate::from_ymd_opt(1899, 12, 30).expect("NaiveDate Literal"),
        DateSystem::V1904 => NaiveDate::from_ymd_opt(1904, 1, 1).expect("NaiveDate Literal"),
    }
}

/// Converts a serial day number to a timestamp.
/// Serials below 60 in the 1900 system are shifted by one day for the Lotus 1-2-3 leap year bug.
pub(crate) fn serial_to_datetime(serial: f64, system: DateSystem) -> Option<NaiveDateTime> {
    if !serial.is_finite() || serial < 0.0 {
        return None;
    }
    let mut days = serial.trunc() as i64;
    if system == DateSystem::V1900 && days < 60 {
        days += 1;
    }
    let milliseconds = (serial.fract() * 86_400_000f64).round() as i64;
    let date = epoch(system).checked_add_signed(Duration::try_days(days)?)?;
    date.and_time(chrono::NaiveTime::MIN)
        .checked_add_signed(Duration::try_milliseconds(milliseconds)?)
}

/// Converts a timestamp to a serial day number in the 1900 date system.
pub(crate) fn datetime_to_serial(datetime: &NaiveDateTime) -> f64 {
    let mut days = datetime.date().signed_duration_since(epoch(DateSystem::V1900)).num_days();
    if days < 61 {
        days -= 1;
    }
    let seconds = datetime.num_seconds_from_midnight() as f64
        + datetime.nanosecond() as f64 / 1_000_000_000f64;
    days as f64 + seconds / 86_400f64
}

/// True when the timestamp sits exactly at midnight.
pub(crate) fn is_date_only(datetime: &NaiveDateTime) -> bool {
    datetime.time() == chrono::NaiveTime::MIN
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(year: i32, month: u32, day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(year, month, day)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn cell(kind: CellType, value: &str) -> Cell {
        Cell { row: 0, col: 0, kind, value: value.to_owned() }
    }

    #[test]
    fn classifies_custom_formats() {
        let system = DateSystem::V1900;
        assert_eq!(CellType::parse_custom_number_format("yyyy-mm-dd", system), CellType::Date(system));
        assert_eq!(CellType::parse_custom_number_format("yyyy-mm-dd hh:mm", system), CellType::DateTime(system));
        assert_eq!(CellType::parse_custom_number_format("hh:mm:ss", system), CellType::Time(system));
        assert_eq!(CellType::parse_custom_number_format("0.00", system), CellType::Number);
        assert_eq!(CellType::parse_custom_number_format("\"days\" 0", system), CellType::Number);
        assert_eq!(CellType::parse_custom_number_format("[Red]0.0", system), CellType::Number);
    }

    #[test]
    fn converts_serials_in_both_systems() {
        assert_eq!(serial_to_datetime(44927.0, DateSystem::V1900), Some(date(2023, 1, 1)));
        assert_eq!(serial_to_datetime(59.0, DateSystem::V1900), Some(date(1900, 2, 28)));
        assert_eq!(serial_to_datetime(61.0, DateSystem::V1900), Some(date(1900, 3, 1)));
        assert_eq!(serial_to_datetime(0.0, DateSystem::V1904), Some(date(1904, 1, 1)));
        assert_eq!(
            serial_to_datetime(44927.5, DateSystem::V1900),
            Some(date(2023, 1, 1) + Duration::hours(12))
        );
        assert_eq!(serial_to_datetime(-1.0, DateSystem::V1900), None);
    }

    #[test]
    fn serial_conversion_is_symmetric_for_dates() {
        for value in [date(1900, 2, 28), date(1900, 3, 1), date(2023, 2, 28), date(2024, 12, 31)] {
            let serial = datetime_to_serial(&value);
            assert_eq!(serial_to_datetime(serial, DateSystem::V1900), Some(value));
        }
    }

    #[test]
    fn resolves_cell_values() {
        let strings = vec!["학교".to_owned(), "".to_owned()];
        assert_eq!(cell(CellType::SharedString, "0").to_value(&strings), Value::Text("학교".to_owned()));
        assert_eq!(cell(CellType::SharedString, "1").to_value(&strings), Value::Empty);
        assert_eq!(cell(CellType::SharedString, "7").to_value(&strings), Value::Empty);
        assert_eq!(cell(CellType::Number, "2023").to_value(&strings), Value::Number(2023.0));
        assert_eq!(cell(CellType::Boolean, "1").to_value(&strings), Value::Bool(true));
        assert_eq!(cell(CellType::Error, "#N/A").to_value(&strings), Value::Empty);
        assert_eq!(
            cell(CellType::Date(DateSystem::V1900), "44927").to_value(&strings),
            Value::DateTime(date(2023, 1, 1))
        );
        assert_eq!(
            cell(CellType::IsoDateTime, "2023-03-04").to_value(&strings),
            Value::DateTime(date(2023, 3, 4))
        );
    }

    #[test]
    fn displays_values_like_cell_text() {
        assert_eq!(Value::Number(2023.0).to_string(), "2023");
        assert_eq!(Value::Number(3.5).to_string(), "3.5");
        assert_eq!(Value::Empty.to_string(), "");
        assert_eq!(Value::DateTime(date(2023, 1, 5)).to_string(), "2023-01-05");
    }

    #[test]
    fn reads_numbers_from_mixed_values() {
        assert_eq!(Value::text(" 12 ").to_number(), Some(12.0));
        assert_eq!(Value::text("abc").to_number(), None);
        assert_eq!(Value::text("NaN").to_number(), None);
        assert_eq!(Value::Bool(true).to_number(), Some(1.0));
        assert_eq!(Value::Empty.to_number(), None);
        assert!(Value::text("   ").is_blank());
    }
}
