use anyhow::Result;
use sailfish::TemplateOnce;

use crate::domain::{ports::SheetWriter, sheet::SheetDocument, value_objects::SourceName};
use crate::presentation::grid::{resolve, StyledCell};

#[derive(TemplateOnce)]
#[template(path = "html/sheet.stpl")] // base dir declared inside sailfish.toml
struct SheetTemplate<'a> {
    source: &'a str,
    widths: &'a [Option<u32>],
    head: &'a [Vec<StyledCell>],
    body: &'a [Vec<StyledCell>],
}

/// Static preview of the sheet with every directive already applied.
pub struct HtmlWriter;

impl SheetWriter for HtmlWriter {
    fn format(&self, source: &SourceName, sheet: &SheetDocument) -> Result<String> {
        let grid = resolve(sheet);
        let (head, body) = grid.rows.split_at(grid.frozen_rows.min(grid.rows.len()));
        Ok(SheetTemplate {
            source: &source.0,
            widths: &grid.column_widths,
            head,
            body,
        }
        .render_once()?)
    }

    fn extension(&self) -> &'static str {
        "html"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::annotation::{AnnotatedRow, RowAnnotation};
    use crate::domain::layout::{ColumnSchema, Palette};
    use crate::presentation::compiler::compile;
    use crate::test_support::stocked;
    use chrono::NaiveDate;

    #[test]
    fn renders_styled_table() {
        let p = stocked("Z <Flower>", "12.5", false);
        let rows = vec![AnnotatedRow {
            annotation: RowAnnotation::classify(None, p.price),
            product: p,
        }];
        let sheet = compile(
            &rows,
            &ColumnSchema::from_columns(&ColumnSchema::product_feed_columns()).unwrap(),
            &Palette::default(),
            "£",
            NaiveDate::from_ymd_opt(2026, 1, 2)
                .unwrap()
                .and_hms_opt(3, 4, 0)
                .unwrap(),
        );
        let html = HtmlWriter.format(&SourceName("Montu".into()), &sheet).unwrap();

        assert!(html.contains("<thead>"), "got: {html}");
        assert!(html.contains("Z &lt;Flower&gt;"));
        assert!(html.contains("£12.50"));
        assert!(html.contains("Not Available"));
        assert!(html.contains("Updated: 03:04 02/01/2026"));
        assert!(html.contains("width:280px"));
        assert!(html.contains(&Palette::default().unavailable.even.background.to_hex()));
    }
}
