//! Spreadsheet loading and cell conversion shared by the bank formats.

use std::io::{Read, Seek};
use std::path::Path;
use std::str::FromStr;

use calamine::{open_workbook, Data, Range, Reader, Xls, Xlsx};
use chrono::{DateTime, LocalResult, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use rust_decimal::Decimal;

use crate::error::{EkstreError, Result};

/// Both supported banks export wall-clock times in Turkey.
pub const STATEMENT_TZ: Tz = chrono_tz::Europe::Istanbul;

pub fn first_sheet_xlsx(path: &Path) -> Result<Range<Data>> {
    let mut workbook: Xlsx<_> = open_workbook(path).map_err(calamine::Error::Xlsx)?;
    first_sheet(&mut workbook)
}

pub fn first_sheet_xls<RS: Read + Seek>(reader: RS) -> Result<Range<Data>> {
    let mut workbook = Xls::new(reader).map_err(calamine::Error::Xls)?;
    first_sheet(&mut workbook)
}

fn first_sheet<RS, W>(workbook: &mut W) -> Result<Range<Data>>
where
    RS: Read + Seek,
    W: Reader<RS>,
    W::Error: Into<calamine::Error>,
{
    match workbook.worksheet_range_at(0) {
        Some(range) => range.map_err(|e| EkstreError::Spreadsheet(e.into())),
        None => Err(EkstreError::EmptyWorkbook),
    }
}

/// Interpret a wall-clock time in [`STATEMENT_TZ`] as UTC.
///
/// Times repeated by a clock change resolve to the standard-time instant;
/// times skipped by one do not exist and yield `None`.
pub fn statement_time_to_utc(local: NaiveDateTime) -> Option<DateTime<Utc>> {
    match STATEMENT_TZ.from_local_datetime(&local) {
        LocalResult::Single(t) => Some(t.with_timezone(&Utc)),
        LocalResult::Ambiguous(_, standard) => Some(standard.with_timezone(&Utc)),
        LocalResult::None => None,
    }
}

/// Parse a number written with Turkish conventions: `.` groups thousands,
/// `,` separates decimals, and the sign may lead or trail.
pub fn parse_tr_decimal(raw: &str) -> Option<Decimal> {
    let s = raw.trim();
    let (negative, unsigned) = if let Some(rest) = s.strip_prefix('-') {
        (true, rest)
    } else if let Some(rest) = s.strip_suffix('-') {
        (true, rest)
    } else if let Some(rest) = s.strip_prefix('+').or_else(|| s.strip_suffix('+')) {
        (false, rest)
    } else {
        (false, s)
    };

    let (int_part, frac_part) = match unsigned.split_once(',') {
        Some((int_part, frac_part)) => (int_part, frac_part),
        None => (unsigned, ""),
    };
    if !int_part.chars().all(|c| c.is_ascii_digit() || c == '.')
        || !frac_part.chars().all(|c| c.is_ascii_digit())
    {
        return None;
    }

    let int_digits = int_part.replace('.', "");
    if int_digits.is_empty() && frac_part.is_empty() {
        return None;
    }

    let mut normalized = String::with_capacity(unsigned.len() + 2);
    if negative {
        normalized.push('-');
    }
    normalized.push_str(if int_digits.is_empty() { "0" } else { &int_digits });
    if !frac_part.is_empty() {
        normalized.push('.');
        normalized.push_str(frac_part);
    }
    Decimal::from_str(&normalized).ok()
}

/// Numeric cells are taken as stored, text cells go through [`parse_tr_decimal`].
pub fn cell_decimal(cell: &Data) -> Option<Decimal> {
    match cell {
        Data::Int(i) => Some(Decimal::from(*i)),
        Data::Float(f) if f.is_finite() => Decimal::from_str(&f.to_string()).ok(),
        Data::String(s) => parse_tr_decimal(s),
        _ => None,
    }
}
