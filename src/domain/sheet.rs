use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::directive::FormatDirective;

/// Number of blank rows between the last data row and the timestamp footer.
pub const FOOTER_GAP: usize = 2;

/// One cell value handed to the sink. Prices stay plain numbers; the
/// currency symbol is a number-format directive, not part of the value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Text(String),
    Number(#[serde(with = "rust_decimal::serde::float")] Decimal),
    Empty,
}

impl CellValue {
    pub fn text(s: impl Into<String>) -> Self {
        CellValue::Text(s.into())
    }

    /// Text as it would appear in the cell, ignoring number formats.
    pub fn display(&self) -> String {
        match self {
            CellValue::Text(s) => s.clone(),
            CellValue::Number(n) => n.to_string(),
            CellValue::Empty => String::new(),
        }
    }
}

/// Everything the tabular sink needs for one source: values and the ordered
/// directive list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SheetDocument {
    pub header: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
    /// `Updated: HH:MM DD/MM/YYYY`
    pub footer: String,
    pub directives: Vec<FormatDirective>,
}

impl SheetDocument {
    /// Zero-based row index of the footer, counting the header as row 0.
    pub fn footer_row(&self) -> usize {
        1 + self.rows.len() + FOOTER_GAP
    }

    /// Every row in write order: header, data, blank spacers, footer.
    pub fn values(&self) -> Vec<Vec<CellValue>> {
        let mut out = Vec::with_capacity(self.footer_row() + 1);
        out.push(self.header.iter().map(|h| CellValue::text(h.as_str())).collect());
        out.extend(self.rows.iter().cloned());
        out.extend(std::iter::repeat_with(Vec::new).take(FOOTER_GAP));
        out.push(vec![CellValue::text(self.footer.as_str())]);
        out
    }

    pub fn column_count(&self) -> usize {
        self.header.len()
    }
}
