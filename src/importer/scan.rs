//! The row scan shared by every statement layout.
//!
//! A scan looks for the layout's marker row, then reads one transaction per
//! row until the layout's end-of-table condition. Rows whose timestamp falls
//! inside the account's already-imported range are dropped without touching
//! the same-timestamp order counter.

use calamine::{Data, Range};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use super::sheet::{cell_decimal, statement_time_to_utc};
use crate::error::{EkstreError, Result};
use crate::models::{DateRange, ParsedRecord};

#[derive(Debug, Clone, Copy)]
pub enum Marker {
    /// Column 1 contains the text anywhere.
    Contains(&'static str),
    /// Column 1 is exactly the text.
    Equals(&'static str),
}

impl Marker {
    fn matches(&self, cell: &str) -> bool {
        match self {
            Self::Contains(text) => cell.contains(text),
            Self::Equals(text) => cell == *text,
        }
    }

    fn text(&self) -> &'static str {
        match self {
            Self::Contains(text) | Self::Equals(text) => text,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum TableEnd {
    /// Stop at a missing date cell or one holding empty text.
    BlankDateCell,
    /// Stop only where the date cell does not exist at all.
    MissingDateCell,
}

/// A fixed-width date format as the bank documents it, plus its chrono
/// equivalent.
#[derive(Debug, Clone, Copy)]
pub struct DatePattern {
    pub display: &'static str,
    pub chrono: &'static str,
    pub has_time: bool,
}

impl DatePattern {
    /// Every letter in `display` stands for one digit; every other
    /// character must appear verbatim.
    fn fits_shape(&self, raw: &str) -> bool {
        raw.len() == self.display.len()
            && raw.bytes().zip(self.display.bytes()).all(|(r, d)| {
                if d.is_ascii_alphabetic() {
                    r.is_ascii_digit()
                } else {
                    r == d
                }
            })
    }

    pub fn parse(&self, raw: &str) -> Option<NaiveDateTime> {
        if !self.fits_shape(raw) {
            return None;
        }
        if self.has_time {
            NaiveDateTime::parse_from_str(raw, self.chrono).ok()
        } else {
            NaiveDate::parse_from_str(raw, self.chrono)
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        }
    }
}

/// Where a bank puts things. Columns are 1-based, as in the bank's own
/// documentation.
#[derive(Debug, Clone, Copy)]
pub struct Layout {
    pub marker: Marker,
    /// Rows between the marker row and the first transaction row, inclusive
    /// of the first transaction row.
    pub header_offset: u32,
    pub date: DatePattern,
    pub date_column: u32,
    pub description_column: u32,
    pub amount_column: u32,
    pub balance_column: u32,
    pub table_end: TableEnd,
}

impl Layout {
    fn cell<'a>(&self, sheet: &'a Range<Data>, row: u32, column: u32) -> Option<&'a Data> {
        sheet.get_value((row, column - 1))
    }

    /// The date cell of `row`, or `None` once the table has ended.
    fn date_cell<'a>(&self, sheet: &'a Range<Data>, row: u32) -> Option<&'a Data> {
        match (self.cell(sheet, row, self.date_column), self.table_end) {
            (None | Some(Data::Empty), _) => None,
            (Some(Data::String(s)), TableEnd::BlankDateCell) if s.is_empty() => None,
            (cell, _) => cell,
        }
    }

    fn decimal(&self, sheet: &Range<Data>, row: u32, column: u32) -> Result<rust_decimal::Decimal> {
        let cell = self.cell(sheet, row, column).unwrap_or(&Data::Empty);
        cell_decimal(cell).ok_or_else(|| EkstreError::InvalidAmount {
            row: row + 1,
            column,
            value: cell.to_string(),
        })
    }

    fn text(&self, sheet: &Range<Data>, row: u32, column: u32) -> String {
        self.cell(sheet, row, column)
            .map(|cell| cell.to_string())
            .unwrap_or_default()
    }

    fn table_start(&self, sheet: &Range<Data>) -> Result<u32> {
        let not_found = || EkstreError::MarkerNotFound {
            marker: self.marker.text().to_string(),
        };
        let (first_row, _) = sheet.start().ok_or_else(not_found)?;
        let (last_row, _) = sheet.end().ok_or_else(not_found)?;
        (first_row..=last_row)
            .find(|&row| self.marker.matches(&self.text(sheet, row, 1)))
            .map(|row| row + self.header_offset)
            .ok_or_else(not_found)
    }
}

/// Same-timestamp sequencing, threaded through the scan as a value.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct OrderCounter {
    previous: Option<DateTime<Utc>>,
    pub order: u32,
}

impl OrderCounter {
    pub fn advance(self, timestamp: DateTime<Utc>) -> Self {
        match self.previous {
            Some(previous) if previous == timestamp => Self {
                previous: self.previous,
                order: self.order + 1,
            },
            _ => Self {
                previous: Some(timestamp),
                order: 0,
            },
        }
    }
}

/// Read every transaction row of `sheet` that is not inside `known`.
///
/// Fails on the first row whose date or amounts cannot be read; no partial
/// result is returned.
pub fn scan(
    sheet: &Range<Data>,
    layout: &Layout,
    known: Option<DateRange>,
) -> Result<Vec<ParsedRecord>> {
    let first_row = layout.table_start(sheet)?;
    tracing::debug!(first_row = first_row + 1, "found statement table");

    let mut records = Vec::new();
    let mut counter = OrderCounter::default();
    let mut skipped = 0usize;
    let mut row = first_row;

    while let Some(date_cell) = layout.date_cell(sheet, row) {
        let raw = date_cell.to_string();
        let timestamp = layout
            .date
            .parse(&raw)
            .and_then(statement_time_to_utc)
            .ok_or_else(|| EkstreError::InvalidDate {
                row: row + 1,
                value: raw.clone(),
                format: layout.date.display.to_string(),
            })?;

        if known.is_some_and(|range| range.contains(timestamp)) {
            tracing::debug!(row = row + 1, %timestamp, "skipping already imported row");
            skipped += 1;
            row += 1;
            continue;
        }

        counter = counter.advance(timestamp);
        let amount = layout.decimal(sheet, row, layout.amount_column)?;
        let balance = layout.decimal(sheet, row, layout.balance_column)?;
        let description = layout.text(sheet, row, layout.description_column);

        records.push(ParsedRecord::new(
            timestamp,
            amount,
            balance,
            description,
            counter.order,
        ));
        row += 1;
    }

    tracing::info!(kept = records.len(), skipped, "scanned statement");
    Ok(records)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal::Decimal;

    pub(crate) fn text(value: &str) -> Data {
        Data::String(value.to_string())
    }

    /// Build a sheet anchored at A1 from rows of cells.
    pub(crate) fn sheet(rows: &[Vec<Data>]) -> Range<Data> {
        let width = rows.iter().map(Vec::len).max().unwrap_or(1).max(1) as u32;
        let height = rows.len().max(1) as u32;
        let mut range = Range::new((0, 0), (height - 1, width - 1));
        for (r, cells) in rows.iter().enumerate() {
            for (c, cell) in cells.iter().enumerate() {
                range.set_value((r as u32, c as u32), cell.clone());
            }
        }
        range
    }

    const TEST_LAYOUT: Layout = Layout {
        marker: Marker::Equals("Date"),
        header_offset: 1,
        date: DatePattern {
            display: "dd.MM.yyyy",
            chrono: "%d.%m.%Y",
            has_time: false,
        },
        date_column: 1,
        description_column: 2,
        amount_column: 3,
        balance_column: 4,
        table_end: TableEnd::BlankDateCell,
    };

    fn row(date: &str, description: &str, amount: f64, balance: f64) -> Vec<Data> {
        vec![text(date), text(description), Data::Float(amount), Data::Float(balance)]
    }

    fn header() -> Vec<Data> {
        vec![text("Date"), text("Description"), text("Amount"), text("Balance")]
    }

    /// Midnight in Istanbul is 21:00 UTC on the previous day.
    fn utc_midnight(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap() - chrono::Duration::hours(3)
    }

    #[test]
    fn test_order_counter() {
        let a = utc_midnight(1);
        let b = utc_midnight(2);
        let c = OrderCounter::default().advance(a);
        assert_eq!(c.order, 0);
        let c = c.advance(a);
        assert_eq!(c.order, 1);
        let c = c.advance(a);
        assert_eq!(c.order, 2);
        let c = c.advance(b);
        assert_eq!(c.order, 0);
        let c = c.advance(a);
        assert_eq!(c.order, 0);
    }

    #[test]
    fn test_date_pattern_requires_exact_width() {
        let pattern = TEST_LAYOUT.date;
        assert!(pattern.parse("05.01.2024").is_some());
        assert!(pattern.parse("5.1.2024").is_none());
        assert!(pattern.parse("05.01.2024 ").is_none());
        assert!(pattern.parse("2024-01-05").is_none());
        assert!(pattern.parse("31.02.2024").is_none());
    }

    #[test]
    fn test_date_pattern_rejects_space_padded_fields() {
        let date_only = TEST_LAYOUT.date;
        assert!(date_only.parse("01. 1.2024").is_none());
        assert!(date_only.parse(" 1.01.2024").is_none());
        assert!(date_only.parse("01-01-2024").is_none());

        let with_time = DatePattern {
            display: "dd/MM/yyyy-HH:mm:ss",
            chrono: "%d/%m/%Y-%H:%M:%S",
            has_time: true,
        };
        assert!(with_time.parse("01/01/2024-09:00:00").is_some());
        assert!(with_time.parse("01/01/2024- 9:00:00").is_none());
        assert!(with_time.parse("01/01/2024-09:00: 0").is_none());
        assert!(with_time.parse("01/01/2024 09:00:00").is_none());
    }

    #[test]
    fn test_scan_keeps_rows_in_file_order() {
        let s = sheet(&[
            vec![text("Statement")],
            header(),
            row("02.01.2024", "B", -2.0, 98.0),
            row("01.01.2024", "A", -1.0, 100.0),
            row("03.01.2024", "C", 5.5, 103.5),
        ]);
        let records = scan(&s, &TEST_LAYOUT, None).unwrap();
        let descriptions: Vec<_> = records.iter().map(|r| r.description.as_str()).collect();
        assert_eq!(descriptions, ["B", "A", "C"]);
        assert_eq!(records[0].timestamp, utc_midnight(2));
        assert_eq!(records[2].amount, Decimal::new(55, 1));
        assert_eq!(records[2].balance, Decimal::new(1035, 1));
        assert!(records.iter().all(|r| r.order == 0));
    }

    #[test]
    fn test_scan_assigns_same_day_order() {
        let s = sheet(&[
            header(),
            row("01.01.2024", "A", 1.0, 1.0),
            row("01.01.2024", "B", 1.0, 2.0),
            row("01.01.2024", "C", 1.0, 3.0),
            row("02.01.2024", "D", 1.0, 4.0),
            row("02.01.2024", "E", 1.0, 5.0),
        ]);
        let orders: Vec<_> = scan(&s, &TEST_LAYOUT, None)
            .unwrap()
            .iter()
            .map(|r| r.order)
            .collect();
        assert_eq!(orders, [0, 1, 2, 0, 1]);
    }

    #[test]
    fn test_scan_skips_known_range_inclusive() {
        let s = sheet(&[
            header(),
            row("01.01.2024", "before", 1.0, 1.0),
            row("02.01.2024", "oldest", 1.0, 2.0),
            row("03.01.2024", "middle", 1.0, 3.0),
            row("04.01.2024", "newest", 1.0, 4.0),
            row("05.01.2024", "after", 1.0, 5.0),
        ]);
        let known = DateRange {
            oldest: utc_midnight(2),
            newest: utc_midnight(4),
        };
        let records = scan(&s, &TEST_LAYOUT, Some(known)).unwrap();
        let descriptions: Vec<_> = records.iter().map(|r| r.description.as_str()).collect();
        assert_eq!(descriptions, ["before", "after"]);
    }

    #[test]
    fn test_skipped_rows_do_not_perturb_order() {
        let s = sheet(&[
            header(),
            row("10.01.2024", "A", 1.0, 1.0),
            row("02.01.2024", "known", 1.0, 2.0),
            row("10.01.2024", "B", 1.0, 3.0),
        ]);
        let known = DateRange {
            oldest: utc_midnight(2),
            newest: utc_midnight(3),
        };
        let records = scan(&s, &TEST_LAYOUT, Some(known)).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].order, 0);
        assert_eq!(records[1].order, 1);
    }

    #[test]
    fn test_scan_stops_at_blank_date_cell() {
        let s = sheet(&[
            header(),
            row("01.01.2024", "A", 1.0, 1.0),
            vec![text(""), text("Toplam"), Data::Float(1.0)],
            row("02.01.2024", "after total", 1.0, 2.0),
        ]);
        let records = scan(&s, &TEST_LAYOUT, None).unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_scan_fails_on_bad_date_without_partial_result() {
        let s = sheet(&[
            header(),
            row("01.01.2024", "A", 1.0, 1.0),
            row("not-a-date", "B", 1.0, 2.0),
        ]);
        let err = scan(&s, &TEST_LAYOUT, None).unwrap_err();
        match err {
            EkstreError::InvalidDate { row, value, format } => {
                assert_eq!(row, 3);
                assert_eq!(value, "not-a-date");
                assert_eq!(format, "dd.MM.yyyy");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_bad_date_inside_known_range_still_fails() {
        let s = sheet(&[header(), row("99.99.9999", "A", 1.0, 1.0)]);
        let known = DateRange {
            oldest: utc_midnight(1),
            newest: utc_midnight(31),
        };
        assert!(scan(&s, &TEST_LAYOUT, Some(known)).is_err());
    }

    #[test]
    fn test_scan_reports_bad_amount_cell() {
        let s = sheet(&[
            header(),
            vec![text("01.01.2024"), text("A"), text("on bes"), Data::Float(1.0)],
        ]);
        let err = scan(&s, &TEST_LAYOUT, None).unwrap_err();
        match err {
            EkstreError::InvalidAmount { row, column, value } => {
                assert_eq!(row, 2);
                assert_eq!(column, 3);
                assert_eq!(value, "on bes");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_scan_missing_balance_cell_is_an_error() {
        let s = sheet(&[
            header(),
            vec![text("01.01.2024"), text("A"), Data::Float(1.0)],
        ]);
        let err = scan(&s, &TEST_LAYOUT, None).unwrap_err();
        assert!(matches!(err, EkstreError::InvalidAmount { column: 4, .. }));
    }

    #[test]
    fn test_scan_without_marker_fails() {
        let s = sheet(&[row("01.01.2024", "A", 1.0, 1.0)]);
        let err = scan(&s, &TEST_LAYOUT, None).unwrap_err();
        assert!(matches!(err, EkstreError::MarkerNotFound { .. }));
    }

    #[test]
    fn test_scan_empty_table_is_empty_success() {
        let s = sheet(&[vec![text("Intro")], header()]);
        assert!(scan(&s, &TEST_LAYOUT, None).unwrap().is_empty());
    }

    #[test]
    fn test_scan_handles_sheet_not_anchored_at_a1() {
        let mut s: Range<Data> = Range::new((3, 0), (5, 3));
        for (c, cell) in header().into_iter().enumerate() {
            s.set_value((3, c as u32), cell);
        }
        for (c, cell) in row("07.01.2024", "A", -3.0, 10.0).into_iter().enumerate() {
            s.set_value((4, c as u32), cell);
        }
        let records = scan(&s, &TEST_LAYOUT, None).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].amount, Decimal::from(-3));
    }
}
