//! Date-format checks with real calendar semantics.

use chrono::NaiveDate;

const MIN_YEAR: i32 = 1900;
const MAX_YEAR: i32 = 2100;

fn valid_ymd(year: i32, month: u32, day: u32) -> bool {
    (MIN_YEAR..=MAX_YEAR).contains(&year) && NaiveDate::from_ymd_opt(year, month, day).is_some()
}

fn all_digits(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit())
}

/// Whether `value` satisfies the named date format.
///
/// Digit-shape alone is not enough: `19991301` fails `YYYYMMDD` because
/// month 13 does not exist. Formats this module does not know pass
/// unconditionally, leaving them to regex or custom rules.
pub fn matches_date_format(value: &str, format: &str) -> bool {
    let value = value.trim();
    match format.to_uppercase().as_str() {
        "YYYYMMDD" => {
            if value.len() != 8 || !all_digits(value) {
                return false;
            }
            let (Ok(year), Ok(month), Ok(day)) = (
                value[..4].parse::<i32>(),
                value[4..6].parse::<u32>(),
                value[6..].parse::<u32>(),
            ) else {
                return false;
            };
            valid_ymd(year, month, day)
        }
        "YYYYMM" => {
            if value.len() != 6 || !all_digits(value) {
                return false;
            }
            let (Ok(year), Ok(month)) = (value[..4].parse::<i32>(), value[4..].parse::<u32>())
            else {
                return false;
            };
            (MIN_YEAR..=MAX_YEAR).contains(&year) && (1..=12).contains(&month)
        }
        "YYYY-MM-DD" => parse_separated(value, '-'),
        "YYYY/MM/DD" => parse_separated(value, '/'),
        _ => true,
    }
}

fn parse_separated(value: &str, sep: char) -> bool {
    let parts: Vec<&str> = value.split(sep).collect();
    if parts.len() != 3 {
        return false;
    }
    let (Ok(year), Ok(month), Ok(day)) = (
        parts[0].parse::<i32>(),
        parts[1].parse::<u32>(),
        parts[2].parse::<u32>(),
    ) else {
        return false;
    };
    valid_ymd(year, month, day)
}

/// First eight characters of a trimmed value when they form a plausible
/// `YYYYMMDD` key, used for chronological comparisons between date columns.
pub fn date_key(value: &str) -> Option<&str> {
    let value = value.trim();
    // Byte-check before slicing: eight ASCII digits guarantee a char
    // boundary at index 8, so multi-byte text is rejected, not sliced.
    let bytes = value.as_bytes();
    if bytes.len() < 8 || !bytes[..8].iter().all(u8::is_ascii_digit) {
        return None;
    }
    Some(&value[..8])
}
