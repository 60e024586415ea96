use chrono::NaiveDateTime;
use rust_decimal::Decimal;

use crate::application::canonical::round_price;
use crate::domain::{
    annotation::{AnnotatedRow, ChangeKind},
    directive::{
        BorderLine, Borders, CellRange, CellStyle, DirectiveKind, FormatDirective, Parity,
        RowCondition,
    },
    layout::{ColumnField, ColumnSchema, HorizontalAlign, Palette, Shade, WrapStrategy},
    product::{Availability, Product},
    sheet::{CellValue, SheetDocument},
};

/// Fixed footer pattern, prefixed with the literal `Updated:` label.
pub const TIMESTAMP_FORMAT: &str = "%H:%M %d/%m/%Y";

const HEADER_FONT_SIZE: u8 = 12;
const FOOTER_FONT_SIZE: u8 = 10;

/// Turns annotated rows into sheet values plus the ordered directive list.
///
/// Pure: the timestamp is passed in, nothing is read from the clock.
///
/// Directive order is part of the output contract, since later directives
/// override earlier ones on overlapping ranges:
///
/// 1. header style and frozen header row
/// 2. column widths, then per-column alignment and wrapping
/// 3. currency number format
/// 4. zebra striping (only without an availability column)
/// 5. availability highlighting, two shades per class by row parity
/// 6. price-delta highlighting on the price cell
/// 7. outer border and header bottom border
/// 8. footer timestamp style
pub fn compile(
    rows: &[AnnotatedRow],
    schema: &ColumnSchema,
    palette: &Palette,
    currency_symbol: &str,
    updated_at: NaiveDateTime,
) -> SheetDocument {
    let mut doc = SheetDocument {
        header: schema.headers.clone(),
        rows: rows
            .iter()
            .map(|row| render_row(row, schema, currency_symbol))
            .collect(),
        footer: format!("Updated: {}", updated_at.format(TIMESTAMP_FORMAT)),
        directives: Vec::new(),
    };
    doc.directives = Rules::new(&doc, schema, palette, currency_symbol).compile(rows);
    doc
}

// ─── Cell values ─────────────────────────────────────────────────────────────

fn render_row(row: &AnnotatedRow, schema: &ColumnSchema, currency_symbol: &str) -> Vec<CellValue> {
    schema
        .fields
        .iter()
        .map(|field| render_cell(field, row, currency_symbol))
        .collect()
}

fn render_cell(field: &ColumnField, row: &AnnotatedRow, currency_symbol: &str) -> CellValue {
    let product: &Product = &row.product;
    match field {
        ColumnField::Name => CellValue::text(product.name.as_str()),
        ColumnField::Price => match (row.annotation.change, row.annotation.previous_price) {
            (kind, Some(previous)) if kind.is_price_change() => CellValue::Text(format!(
                "{} → {}",
                format_currency(currency_symbol, previous),
                format_currency(currency_symbol, product.price)
            )),
            _ => CellValue::Number(product.price),
        },
        ColumnField::Potency(label) => CellValue::text(product.potency(label)),
        ColumnField::Availability => product
            .availability
            .map(|a| CellValue::text(a.label()))
            .unwrap_or(CellValue::Empty),
    }
}

/// `£#,##0.00` rendering: symbol prefix, thousands grouping, two decimals.
pub fn format_currency(symbol: &str, amount: Decimal) -> String {
    let fixed = round_price(amount.abs()).to_string();
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, digit) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if amount.is_sign_negative() && !amount.is_zero() { "-" } else { "" };
    format!("{sign}{symbol}{grouped}.{frac_part}")
}

// ─── Directives ──────────────────────────────────────────────────────────────

struct Rules<'a> {
    schema: &'a ColumnSchema,
    palette: &'a Palette,
    currency_symbol: &'a str,
    columns: usize,
    data_rows: std::ops::Range<usize>,
    footer_row: usize,
    out: Vec<FormatDirective>,
}

impl<'a> Rules<'a> {
    fn new(
        doc: &SheetDocument,
        schema: &'a ColumnSchema,
        palette: &'a Palette,
        currency_symbol: &'a str,
    ) -> Self {
        Self {
            schema,
            palette,
            currency_symbol,
            columns: schema.column_count(),
            data_rows: 1..1 + doc.rows.len(),
            footer_row: doc.footer_row(),
            out: Vec::new(),
        }
    }

    fn compile(mut self, rows: &[AnnotatedRow]) -> Vec<FormatDirective> {
        self.header();
        self.column_widths();
        self.alignments();
        self.currency();
        if self.schema.availability_column.is_none() {
            self.zebra();
        } else {
            self.availability();
        }
        self.price_deltas(rows);
        self.borders();
        self.footer();
        self.out
    }

    /// Data-row directives over an empty catalog target nothing; skip them.
    fn push_data(&mut self, directive: FormatDirective) {
        if !directive.range.is_empty() {
            self.out.push(directive);
        }
    }

    fn data_range(&self, cols: std::ops::Range<usize>) -> CellRange {
        CellRange::new(self.data_rows.clone(), cols)
    }

    fn header(&mut self) {
        let header = CellRange::new(0..1, 0..self.columns);
        self.out.push(FormatDirective::style(
            header,
            CellStyle {
                background: Some(self.palette.header_background),
                foreground: Some(self.palette.header_text),
                bold: Some(true),
                font_size: Some(HEADER_FONT_SIZE),
                horizontal_align: Some(HorizontalAlign::Center),
                wrap: Some(WrapStrategy::Wrap),
                ..Default::default()
            },
        ));
        self.out.push(FormatDirective {
            range: header,
            kind: DirectiveKind::FreezeRows { count: 1 },
        });
    }

    fn column_widths(&mut self) {
        let whole_sheet = 0..self.footer_row + 1;
        for (&col, &pixels) in &self.schema.widths {
            self.out.push(FormatDirective {
                range: CellRange::new(whole_sheet.clone(), col..col + 1),
                kind: DirectiveKind::ColumnWidth { pixels },
            });
        }
    }

    fn alignments(&mut self) {
        for (&col, alignment) in &self.schema.alignments {
            let directive = FormatDirective::style(
                self.data_range(col..col + 1),
                CellStyle {
                    horizontal_align: Some(alignment.horizontal),
                    wrap: Some(alignment.wrap),
                    ..Default::default()
                },
            );
            self.push_data(directive);
        }
    }

    fn currency(&mut self) {
        let pattern = format!("{}#,##0.00", self.currency_symbol);
        for &col in &self.schema.currency_columns {
            let directive = FormatDirective::style(
                self.data_range(col..col + 1),
                CellStyle {
                    number_format: Some(pattern.clone()),
                    ..Default::default()
                },
            );
            self.push_data(directive);
        }
    }

    fn zebra(&mut self) {
        let directive = FormatDirective::conditional(
            self.data_range(0..self.columns),
            RowCondition::RowParity {
                parity: Parity::Even,
            },
            shade_style(self.palette.zebra, false),
        );
        self.push_data(directive);
    }

    fn availability(&mut self) {
        let Some(column) = self.schema.availability_column else {
            return;
        };
        let classes = [
            (Availability::Available, self.palette.available),
            (Availability::NotAvailable, self.palette.unavailable),
        ];
        for (status, shades) in classes {
            for (parity, shade) in [(Parity::Even, shades.even), (Parity::Odd, shades.odd)] {
                let directive = FormatDirective::conditional(
                    self.data_range(0..self.columns),
                    RowCondition::ColumnEquals {
                        column,
                        value: status.label().to_string(),
                        parity,
                    },
                    shade_style(shade, true),
                );
                self.push_data(directive);
            }
        }
    }

    fn price_deltas(&mut self, rows: &[AnnotatedRow]) {
        let col = self.schema.price_column;
        for (i, row) in rows.iter().enumerate() {
            let shade = match row.annotation.change {
                ChangeKind::PriceDecreased => self.palette.price_decrease,
                ChangeKind::PriceIncreased => self.palette.price_increase,
                ChangeKind::None | ChangeKind::New => continue,
            };
            self.out.push(FormatDirective::style(
                CellRange::cell(self.data_rows.start + i, col),
                shade_style(shade, true),
            ));
        }
    }

    fn borders(&mut self) {
        let solid = Some(BorderLine::solid(1));
        let none = Some(BorderLine::none());
        self.out.push(FormatDirective {
            range: CellRange::new(0..self.data_rows.end, 0..self.columns),
            kind: DirectiveKind::Borders {
                borders: Borders {
                    top: solid,
                    bottom: solid,
                    left: solid,
                    right: solid,
                    inner_horizontal: none,
                    inner_vertical: none,
                },
            },
        });
        self.out.push(FormatDirective {
            range: CellRange::new(0..1, 0..self.columns),
            kind: DirectiveKind::Borders {
                borders: Borders {
                    bottom: Some(BorderLine::solid(2)),
                    ..Default::default()
                },
            },
        });
    }

    fn footer(&mut self) {
        self.out.push(FormatDirective::style(
            CellRange::cell(self.footer_row, 0),
            CellStyle {
                background: Some(self.palette.footer_background),
                foreground: Some(self.palette.timestamp_text),
                italic: Some(true),
                font_size: Some(FOOTER_FONT_SIZE),
                ..Default::default()
            },
        ));
    }
}

fn shade_style(shade: Shade, bold: bool) -> CellStyle {
    CellStyle {
        background: Some(shade.background),
        foreground: Some(shade.text),
        bold: bold.then_some(true),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::annotation::RowAnnotation;
    use crate::test_support::{dec, product, stocked};
    use chrono::NaiveDate;

    fn at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 2, 1)
            .unwrap()
            .and_hms_opt(9, 5, 0)
            .unwrap()
    }

    fn row(p: Product, previous: Option<&str>) -> AnnotatedRow {
        let annotation = RowAnnotation::classify(previous.map(dec), p.price);
        AnnotatedRow {
            product: p,
            annotation,
        }
    }

    fn option_schema() -> ColumnSchema {
        ColumnSchema::from_columns(&ColumnSchema::option_list_columns()).unwrap()
    }

    fn feed_schema() -> ColumnSchema {
        ColumnSchema::from_columns(&ColumnSchema::product_feed_columns()).unwrap()
    }

    fn kinds(doc: &SheetDocument) -> Vec<&'static str> {
        doc.directives
            .iter()
            .map(|d| match &d.kind {
                DirectiveKind::Style { .. } => "style",
                DirectiveKind::ConditionalStyle { .. } => "conditional",
                DirectiveKind::ColumnWidth { .. } => "width",
                DirectiveKind::Borders { .. } => "borders",
                DirectiveKind::FreezeRows { .. } => "freeze",
            })
            .collect()
    }

    #[test]
    fn currency_formatting_groups_thousands() {
        assert_eq!(format_currency("£", dec("12.5")), "£12.50");
        assert_eq!(format_currency("£", dec("1234567.891")), "£1,234,567.89");
        assert_eq!(format_currency("$", dec("0")), "$0.00");
        assert_eq!(format_currency("£", dec("999.999")), "£1,000.00");
    }

    #[test]
    fn price_decrease_renders_old_and_new() {
        let doc = compile(
            &[row(product("Widget A", "10.00"), Some("12.50"))],
            &option_schema(),
            &Palette::default(),
            "£",
            at(),
        );
        assert_eq!(doc.rows[0][1], CellValue::text("£12.50 → £10.00"));

        let palette = Palette::default();
        // alignment and currency also cover this single cell; the delta comes last
        let highlight = doc
            .directives
            .iter()
            .rev()
            .find(|d| d.range == CellRange::cell(1, 1))
            .expect("price delta directive");
        let DirectiveKind::Style { style } = &highlight.kind else {
            unreachable!()
        };
        assert_eq!(style.background, Some(palette.price_decrease.background));
        assert_eq!(style.bold, Some(true));
    }

    #[test]
    fn unchanged_and_new_prices_stay_numeric() {
        let doc = compile(
            &[
                row(product("A", "1.00"), Some("1.00")),
                row(product("B", "2.00"), None),
            ],
            &option_schema(),
            &Palette::default(),
            "£",
            at(),
        );
        assert_eq!(doc.rows[0][1], CellValue::Number(dec("1.00")));
        assert_eq!(doc.rows[1][1], CellValue::Number(dec("2.00")));
    }

    #[test]
    fn footer_text_and_position() {
        let doc = compile(
            &[row(product("A", "1.00"), None)],
            &option_schema(),
            &Palette::default(),
            "£",
            at(),
        );
        assert_eq!(doc.footer, "Updated: 09:05 01/02/2026");
        let last = doc.directives.last().unwrap();
        assert_eq!(last.range, CellRange::cell(4, 0));
    }

    #[test]
    fn option_list_gets_zebra_not_availability() {
        let doc = compile(
            &[row(product("A", "1.00"), None), row(product("B", "1.00"), None)],
            &option_schema(),
            &Palette::default(),
            "£",
            at(),
        );
        assert_eq!(
            kinds(&doc),
            vec![
                "style", "freeze", "width", "width", "style", "style", "style", "conditional",
                "borders", "borders", "style"
            ]
        );
        let zebra = doc
            .directives
            .iter()
            .find_map(|d| match &d.kind {
                DirectiveKind::ConditionalStyle { condition, .. } => Some(condition.clone()),
                _ => None,
            })
            .unwrap();
        assert_eq!(zebra, RowCondition::RowParity { parity: Parity::Even });
    }

    #[test]
    fn feed_gets_four_availability_rules_in_order() {
        let doc = compile(
            &[
                row(stocked("Z", "1.00", true), None),
                row(stocked("A", "1.00", false), None),
            ],
            &feed_schema(),
            &Palette::default(),
            "£",
            at(),
        );
        let conditions: Vec<_> = doc
            .directives
            .iter()
            .filter_map(|d| match &d.kind {
                DirectiveKind::ConditionalStyle { condition, .. } => Some(condition.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(conditions.len(), 4);
        assert_eq!(
            conditions[0],
            RowCondition::ColumnEquals {
                column: 4,
                value: "Available".into(),
                parity: Parity::Even
            }
        );
        assert_eq!(
            conditions[3],
            RowCondition::ColumnEquals {
                column: 4,
                value: "Not Available".into(),
                parity: Parity::Odd
            }
        );
        assert_eq!(doc.rows[1][4], CellValue::text("Not Available"));
        assert_eq!(doc.rows[0][2], CellValue::text("N/A"));
    }

    #[test]
    fn currency_pattern_uses_configured_symbol() {
        let doc = compile(
            &[row(product("A", "1.00"), None)],
            &option_schema(),
            &Palette::default(),
            "€",
            at(),
        );
        let formats: Vec<_> = doc
            .directives
            .iter()
            .filter_map(|d| match &d.kind {
                DirectiveKind::Style { style } => style.number_format.clone(),
                _ => None,
            })
            .collect();
        assert_eq!(formats, vec!["€#,##0.00".to_string()]);
    }

    #[test]
    fn empty_catalog_still_has_header_borders_and_footer() {
        let doc = compile(&[], &feed_schema(), &Palette::default(), "£", at());
        assert!(doc.rows.is_empty());
        assert_eq!(doc.footer_row(), 3);
        assert!(doc
            .directives
            .iter()
            .all(|d| !d.range.is_empty()));
        assert_eq!(kinds(&doc)[..2], ["style", "freeze"]);
        assert_eq!(kinds(&doc).last(), Some(&"style"));
    }

    #[test]
    fn delta_directive_comes_after_availability_rules() {
        let doc = compile(
            &[row(stocked("Z", "10.00", true), Some("9.00"))],
            &feed_schema(),
            &Palette::default(),
            "£",
            at(),
        );
        let last_conditional = doc
            .directives
            .iter()
            .rposition(|d| matches!(d.kind, DirectiveKind::ConditionalStyle { .. }))
            .unwrap();
        let delta = doc
            .directives
            .iter()
            .rposition(|d| d.range == CellRange::cell(1, 1))
            .unwrap();
        assert!(delta > last_conditional);
        assert_eq!(doc.rows[0][1], CellValue::text("£9.00 → £10.00"));
    }
}
