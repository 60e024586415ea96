use anyhow::Result;
use serde::Serialize;

use crate::domain::{
    directive::FormatDirective,
    ports::SheetWriter,
    sheet::{CellValue, SheetDocument},
    value_objects::SourceName,
};

// ─── Serialisation view ───────────────────────────────────────────────────────
//
// What a spreadsheet backend consumes: every row in write order starting at
// A1, then the directives to apply in order.

#[derive(Serialize)]
struct JsonSheet<'a> {
    source: &'a str,
    header: &'a [String],
    values: Vec<Vec<CellValue>>,
    footer_row: usize,
    directives: &'a [FormatDirective],
}

pub struct JsonWriter;

impl SheetWriter for JsonWriter {
    fn format(&self, source: &SourceName, sheet: &SheetDocument) -> Result<String> {
        let view = JsonSheet {
            source: &source.0,
            header: &sheet.header,
            values: sheet.values(),
            footer_row: sheet.footer_row(),
            directives: &sheet.directives,
        };
        Ok(serde_json::to_string_pretty(&view)?)
    }

    fn extension(&self) -> &'static str {
        "json"
    }
}
