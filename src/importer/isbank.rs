//! İş Bankası account activity export (legacy `.xls`).
//!
//! The column header row starts with "Tarih/Saat" and transactions follow
//! directly beneath it, each stamped to the second.

use std::io::{Read, Seek};

use super::scan::{scan, DatePattern, Layout, Marker, TableEnd};
use super::sheet::first_sheet_xls;
use crate::error::Result;
use crate::models::{DateRange, ParsedRecord};

pub const LAYOUT: Layout = Layout {
    marker: Marker::Equals("Tarih/Saat"),
    header_offset: 1,
    date: DatePattern {
        display: "dd/MM/yyyy-HH:mm:ss",
        chrono: "%d/%m/%Y-%H:%M:%S",
        has_time: true,
    },
    date_column: 1,
    description_column: 9,
    amount_column: 4,
    balance_column: 5,
    table_end: TableEnd::MissingDateCell,
};

pub fn parse<RS: Read + Seek>(reader: RS, known: Option<DateRange>) -> Result<Vec<ParsedRecord>> {
    let sheet = first_sheet_xls(reader)?;
    scan(&sheet, &LAYOUT, known)
}
