//! Workbook access and cell conversion.

use super::ImportError;
use calamine::{open_workbook_auto, Data, DataType, Range, Reader};
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;

pub const PICKUP_POINT_SHEET: &str = "Pickup point";
pub const PRODUCT_SHEET: &str = "Product";
pub const USER_SHEET: &str = "User";
pub const ORDER_SHEET: &str = "Order";

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%d.%m.%Y %H:%M",
];
const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%d.%m.%Y"];

/// Every worksheet of a workbook, read up front.
#[derive(Debug, Default, Clone)]
pub struct Workbook {
    sheets: HashMap<String, Range<Data>>,
}

impl Workbook {
    pub fn open(path: &Path) -> Result<Self, ImportError> {
        let workbook_error = |source| ImportError::Workbook {
            path: path.to_path_buf(),
            source,
        };
        let mut workbook = open_workbook_auto(path).map_err(workbook_error)?;
        let mut sheets = HashMap::new();
        for name in workbook.sheet_names() {
            let range = workbook.worksheet_range(&name).map_err(workbook_error)?;
            sheets.insert(name, range);
        }
        Ok(Self { sheets })
    }

    pub fn from_sheets(sheets: impl IntoIterator<Item = (String, Range<Data>)>) -> Self {
        Self {
            sheets: sheets.into_iter().collect(),
        }
    }

    /// Rows after the header row of `sheet`.
    pub fn data_rows(&self, sheet: &'static str) -> Result<Vec<SheetRow<'_>>, ImportError> {
        let range = self
            .sheets
            .get(sheet)
            .ok_or_else(|| ImportError::MissingSheet(sheet.to_owned()))?;
        let (first_row, first_column) = range
            .start()
            .map(|(row, column)| (row as usize, column as usize))
            .unwrap_or_default();
        Ok(range
            .rows()
            .enumerate()
            .filter(|(offset, _)| first_row + offset > 0)
            .map(|(offset, cells)| SheetRow {
                sheet,
                line: first_row + offset + 1,
                first_column,
                cells,
            })
            .collect())
    }
}

/// One worksheet row addressed by absolute, zero-based column.
#[derive(Debug, Clone, Copy)]
pub struct SheetRow<'a> {
    pub sheet: &'static str,
    /// 1-based row number as shown by spreadsheet software.
    pub line: usize,
    first_column: usize,
    cells: &'a [Data],
}

impl<'a> SheetRow<'a> {
    pub fn new(sheet: &'static str, line: usize, cells: &'a [Data]) -> Self {
        Self {
            sheet,
            line,
            first_column: 0,
            cells,
        }
    }

    pub fn cell(&self, column: usize) -> &'a Data {
        column
            .checked_sub(self.first_column)
            .and_then(|index| self.cells.get(index))
            .unwrap_or(&Data::Empty)
    }

    pub fn text(&self, column: usize) -> String {
        cell_text(self.cell(column))
    }

    /// Text of `column`, rejected when it would not fit a column of `max_chars`.
    pub fn bounded_text(
        &self,
        column: usize,
        name: &'static str,
        max_chars: usize,
    ) -> Result<String, ImportError> {
        let value = self.text(column);
        let length = value.chars().count();
        if length > max_chars {
            return Err(self.invalid(
                name,
                format!("{length} characters, at most {max_chars} allowed"),
            ));
        }
        Ok(value)
    }

    pub fn invalid(&self, column: &'static str, reason: impl Into<String>) -> ImportError {
        ImportError::Cell {
            sheet: self.sheet,
            line: self.line,
            column,
            reason: reason.into(),
        }
    }
}

/// Trimmed text of a cell; whole floats lose their `.0`.
pub fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => s.trim().to_owned(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => b.to_string(),
        other => other
            .as_datetime()
            .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_default(),
    }
}

fn is_blank(cell: &Data) -> bool {
    match cell {
        Data::Empty => true,
        Data::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// Exact decimal. Floats go through their shortest text form so `499.9`
/// stays `499.9` rather than its binary approximation.
pub fn cell_decimal(cell: &Data) -> Result<Option<Decimal>, String> {
    if is_blank(cell) {
        return Ok(None);
    }
    match cell {
        Data::Int(i) => Ok(Some(Decimal::from(*i))),
        Data::Float(f) if f.is_finite() => Decimal::from_str(&f.to_string())
            .map(Some)
            .map_err(|err| format!("{f} is not a decimal: {err}")),
        Data::String(s) => {
            let normalized = s.trim().replace(' ', "").replace(',', ".");
            Decimal::from_str(&normalized)
                .map(Some)
                .map_err(|_| format!("`{}` is not a decimal", s.trim()))
        }
        other => Err(format!("`{}` is not a decimal", cell_text(other))),
    }
}

pub fn cell_integer(cell: &Data) -> Result<Option<i64>, String> {
    if is_blank(cell) {
        return Ok(None);
    }
    match cell {
        Data::Int(i) => Ok(Some(*i)),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => Ok(Some(*f as i64)),
        Data::String(s) => s
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|_| format!("`{}` is not a whole number", s.trim())),
        other => Err(format!("`{}` is not a whole number", cell_text(other))),
    }
}

pub fn cell_datetime(cell: &Data) -> Result<Option<NaiveDateTime>, String> {
    if is_blank(cell) {
        return Ok(None);
    }
    match cell {
        Data::String(s) => parse_datetime(s.trim())
            .map(Some)
            .ok_or_else(|| format!("`{}` is not a date", s.trim())),
        other => other
            .as_datetime()
            .map(Some)
            .ok_or_else(|| format!("`{}` is not a date", cell_text(other))),
    }
}

pub fn parse_datetime(text: &str) -> Option<NaiveDateTime> {
    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn text_drops_integral_fraction() {
        assert_eq!(cell_text(&Data::Float(901.0)), "901");
        assert_eq!(cell_text(&Data::Float(1.5)), "1.5");
        assert_eq!(cell_text(&Data::String("  Lenina 1 ".into())), "Lenina 1");
        assert_eq!(cell_text(&Data::Empty), "");
    }

    #[test]
    fn decimals_are_exact() {
        assert_eq!(cell_decimal(&Data::Float(499.9)).unwrap(), Some(dec!(499.9)));
        assert_eq!(cell_decimal(&Data::Int(150)).unwrap(), Some(dec!(150)));
        assert_eq!(
            cell_decimal(&Data::String("1 299,50".into())).unwrap(),
            Some(dec!(1299.50))
        );
        assert_eq!(cell_decimal(&Data::String(" ".into())).unwrap(), None);
        assert!(cell_decimal(&Data::String("cheap".into())).is_err());
    }

    #[test]
    fn integers_reject_fractions() {
        assert_eq!(cell_integer(&Data::Float(3.0)).unwrap(), Some(3));
        assert_eq!(cell_integer(&Data::String("12".into())).unwrap(), Some(12));
        assert!(cell_integer(&Data::Float(2.5)).is_err());
        assert_eq!(cell_integer(&Data::Empty).unwrap(), None);
    }

    #[test]
    fn text_dates_accept_both_layouts() {
        let expected = NaiveDate::from_ymd_opt(2022, 2, 27)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(parse_datetime("2022-02-27"), Some(expected));
        assert_eq!(parse_datetime("27.02.2022"), Some(expected));
        assert_eq!(
            cell_datetime(&Data::String("2022-02-27 00:00:00".into())).unwrap(),
            Some(expected)
        );
        assert!(cell_datetime(&Data::String("soon".into())).is_err());
    }

    #[test]
    fn header_row_is_skipped_and_lines_are_one_based() {
        let mut range = Range::new((0, 0), (2, 0));
        range.set_value((0, 0), Data::String("Address".into()));
        range.set_value((1, 0), Data::String("Lenina 1".into()));
        range.set_value((2, 0), Data::String("Mira 7".into()));
        let workbook = Workbook::from_sheets([(PICKUP_POINT_SHEET.to_string(), range)]);
        let rows = workbook.data_rows(PICKUP_POINT_SHEET).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].line, 2);
        assert_eq!(rows[1].text(0), "Mira 7");
        assert_eq!(rows[1].text(5), "");
        assert!(matches!(
            workbook.data_rows(ORDER_SHEET),
            Err(ImportError::MissingSheet(_))
        ));
    }

    #[test]
    fn bounded_text_counts_characters() {
        let cells = vec![Data::String("Ёлка".into())];
        let row = SheetRow::new(PRODUCT_SHEET, 7, &cells);
        assert_eq!(row.bounded_text(0, "name", 4).unwrap(), "Ёлка");
        assert!(matches!(
            row.bounded_text(0, "name", 3),
            Err(ImportError::Cell {
                column: "name",
                line: 7,
                ..
            })
        ));
    }
}
