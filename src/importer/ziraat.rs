//! Ziraat Bankası account activity export (`.xlsx`).
//!
//! The sheet starts with a free-form summary block. The transaction table
//! follows a title row containing "Hesap Hareketleri" and a column header
//! row; each transaction carries only a calendar date.

use std::path::Path;

use super::scan::{scan, DatePattern, Layout, Marker, TableEnd};
use super::sheet::first_sheet_xlsx;
use crate::error::Result;
use crate::models::{DateRange, ParsedRecord};

pub const LAYOUT: Layout = Layout {
    marker: Marker::Contains("Hesap Hareketleri"),
    header_offset: 2,
    date: DatePattern {
        display: "dd.MM.yyyy",
        chrono: "%d.%m.%Y",
        has_time: false,
    },
    date_column: 1,
    description_column: 3,
    amount_column: 4,
    balance_column: 5,
    table_end: TableEnd::BlankDateCell,
};

pub fn parse(path: &Path, known: Option<DateRange>) -> Result<Vec<ParsedRecord>> {
    let sheet = first_sheet_xlsx(path)?;
    scan(&sheet, &LAYOUT, known)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::EkstreError;
    use crate::importer::scan::tests::{sheet, text};
    use calamine::Data;
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;
    use rust_xlsxwriter::Workbook;

    /// Write an `.xlsx` export the way the bank lays it out. Each row is
    /// date, description, amount, balance.
    pub(crate) fn write_statement(path: &Path, rows: &[(&str, &str, f64, f64)]) {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "T.C. ZİRAAT BANKASI A.Ş.").unwrap();
        sheet.write_string(1, 0, "Müşteri No").unwrap();
        sheet.write_string(1, 1, "123456").unwrap();
        sheet
            .write_string(3, 0, "Hesap Hareketleri (01.01.2024 - 31.01.2024)")
            .unwrap();
        for (col, title) in ["Tarih", "Fiş No", "Açıklama", "Tutar", "Bakiye"]
            .into_iter()
            .enumerate()
        {
            sheet.write_string(4, col as u16, title).unwrap();
        }
        for (i, (date, description, amount, balance)) in rows.iter().enumerate() {
            let row = 5 + i as u32;
            sheet.write_string(row, 0, *date).unwrap();
            sheet.write_string(row, 1, format!("{:04}", i + 1)).unwrap();
            sheet.write_string(row, 2, *description).unwrap();
            sheet.write_number(row, 3, *amount).unwrap();
            sheet.write_number(row, 4, *balance).unwrap();
        }
        workbook.save(path).unwrap();
    }

    fn statement(rows: Vec<Vec<Data>>) -> calamine::Range<Data> {
        let mut all = vec![
            vec![text("T.C. ZİRAAT BANKASI A.Ş.")],
            vec![text("Müşteri No"), text("123456")],
            vec![],
            vec![text("Hesap Hareketleri (01.01.2024 - 31.01.2024)")],
            vec![
                text("Tarih"),
                text("Fiş No"),
                text("Açıklama"),
                text("Tutar"),
                text("Bakiye"),
            ],
        ];
        all.extend(rows);
        sheet(&all)
    }

    fn row(date: &str, description: &str, amount: Data, balance: Data) -> Vec<Data> {
        vec![text(date), text("0001"), text(description), amount, balance]
    }

    #[test]
    fn test_reads_rows_after_column_header() {
        let s = statement(vec![
            row("15.01.2024", "MARKET ALIŞVERİŞİ", Data::Float(-245.9), Data::Float(1754.1)),
            row("16.01.2024", "MAAŞ", text("25.000,00"), text("26.754,10")),
        ]);
        let records = scan(&s, &LAYOUT, None).unwrap();
        assert_eq!(records.len(), 2);

        assert_eq!(records[0].description, "MARKET ALIŞVERİŞİ");
        assert_eq!(records[0].amount, Decimal::new(-2459, 1));
        assert_eq!(records[0].balance, Decimal::new(17541, 1));
        assert_eq!(
            records[0].timestamp,
            Utc.with_ymd_and_hms(2024, 1, 14, 21, 0, 0).unwrap()
        );

        assert_eq!(records[1].amount, Decimal::new(2_500_000, 2));
        assert_eq!(records[1].balance, Decimal::new(2_675_410, 2));
    }

    #[test]
    fn test_same_day_rows_are_ordered() {
        let s = statement(vec![
            row("15.01.2024", "A", Data::Float(-1.0), Data::Float(9.0)),
            row("15.01.2024", "B", Data::Float(-1.0), Data::Float(8.0)),
            row("16.01.2024", "C", Data::Float(-1.0), Data::Float(7.0)),
        ]);
        let orders: Vec<_> = scan(&s, &LAYOUT, None)
            .unwrap()
            .iter()
            .map(|r| r.order)
            .collect();
        assert_eq!(orders, [0, 1, 0]);
    }

    #[test]
    fn test_rejects_date_with_time() {
        let s = statement(vec![row(
            "15/01/2024-10:00:00",
            "A",
            Data::Float(1.0),
            Data::Float(1.0),
        )]);
        assert!(matches!(
            scan(&s, &LAYOUT, None).unwrap_err(),
            EkstreError::InvalidDate { row: 6, .. }
        ));
    }

    #[test]
    fn test_missing_title_row() {
        let s = sheet(&[row("15.01.2024", "A", Data::Float(1.0), Data::Float(1.0))]);
        assert!(matches!(
            scan(&s, &LAYOUT, None).unwrap_err(),
            EkstreError::MarkerNotFound { .. }
        ));
    }

    #[test]
    fn test_parse_reads_saved_workbook() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hesap.xlsx");
        write_statement(
            &path,
            &[
                ("15.01.2024", "MARKET", -245.9, 1754.1),
                ("15.01.2024", "ECZANE", -54.1, 1700.0),
                ("16.01.2024", "MAAŞ", 25000.0, 26700.0),
            ],
        );

        let records = parse(&path, None).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].description, "MARKET");
        assert_eq!(records[0].amount, Decimal::new(-2459, 1));
        assert_eq!(
            records[0].timestamp,
            Utc.with_ymd_and_hms(2024, 1, 14, 21, 0, 0).unwrap()
        );
        assert_eq!(records[1].order, 1);
        assert_eq!(records[2].description, "MAAŞ");
        assert_eq!(records[2].balance, Decimal::from(26700));
        assert_eq!(records[2].order, 0);
    }

    #[test]
    fn test_parse_saved_workbook_skips_known_range() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hesap.xlsx");
        write_statement(
            &path,
            &[
                ("15.01.2024", "old", -1.0, 99.0),
                ("16.01.2024", "new", -1.0, 98.0),
            ],
        );
        let midnight_15th = Utc.with_ymd_and_hms(2024, 1, 14, 21, 0, 0).unwrap();
        let known = DateRange {
            oldest: midnight_15th,
            newest: midnight_15th,
        };
        let records = parse(&path, Some(known)).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].description, "new");
    }

    #[test]
    fn test_parse_reports_unreadable_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.xlsx");
        assert!(parse(&path, None).is_err());
    }
}
