use serde::Serialize;

use crate::domain::layout::{Color, HorizontalAlign, WrapStrategy};

/// Half-open, zero-based cell range: rows `start_row..end_row`, columns
/// `start_col..end_col`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CellRange {
    pub start_row: usize,
    pub end_row: usize,
    pub start_col: usize,
    pub end_col: usize,
}

impl CellRange {
    pub fn new(rows: std::ops::Range<usize>, cols: std::ops::Range<usize>) -> Self {
        Self {
            start_row: rows.start,
            end_row: rows.end,
            start_col: cols.start,
            end_col: cols.end,
        }
    }

    pub fn cell(row: usize, col: usize) -> Self {
        Self::new(row..row + 1, col..col + 1)
    }

    pub fn contains(&self, row: usize, col: usize) -> bool {
        (self.start_row..self.end_row).contains(&row) && (self.start_col..self.end_col).contains(&col)
    }

    pub fn is_empty(&self) -> bool {
        self.start_row >= self.end_row || self.start_col >= self.end_col
    }
}

/// Sparse cell style. Unset properties leave whatever an earlier directive
/// applied.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CellStyle {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background: Option<Color>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub foreground: Option<Color>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bold: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub italic: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub horizontal_align: Option<HorizontalAlign>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wrap: Option<WrapStrategy>,
    /// Spreadsheet number-format pattern, e.g. `£#,##0.00`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number_format: Option<String>,
}

impl CellStyle {
    /// Overlay `other` on top of `self`: every property set in `other` wins.
    pub fn merge(&mut self, other: &CellStyle) {
        macro_rules! overlay {
            ($($field:ident),*) => {
                $(if other.$field.is_some() { self.$field = other.$field.clone(); })*
            };
        }
        overlay!(
            background,
            foreground,
            bold,
            italic,
            font_size,
            horizontal_align,
            wrap,
            number_format
        );
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Parity {
    Even,
    Odd,
}

impl Parity {
    /// Parity of the 1-based sheet row number of the zero-based `row_index`,
    /// i.e. what `ISEVEN(ROW())` sees.
    pub fn of_row(row_index: usize) -> Self {
        if (row_index + 1) % 2 == 0 {
            Parity::Even
        } else {
            Parity::Odd
        }
    }
}

/// Per-row predicate evaluated by the sink for conditional styles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "when", rename_all = "snake_case")]
pub enum RowCondition {
    /// Sheet row number has the given parity.
    RowParity { parity: Parity },
    /// Cell in `column` reads exactly `value` and the row has `parity`.
    ColumnEquals {
        column: usize,
        value: String,
        parity: Parity,
    },
}

impl RowCondition {
    /// `row_text` is the displayed text of every cell in the row.
    pub fn holds(&self, row_index: usize, row_text: &[String]) -> bool {
        match self {
            RowCondition::RowParity { parity } => Parity::of_row(row_index) == *parity,
            RowCondition::ColumnEquals {
                column,
                value,
                parity,
            } => {
                Parity::of_row(row_index) == *parity
                    && row_text.get(*column).map(String::as_str) == Some(value.as_str())
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LineStyle {
    Solid,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BorderLine {
    pub style: LineStyle,
    pub width: u8,
}

impl BorderLine {
    pub const fn solid(width: u8) -> Self {
        Self {
            style: LineStyle::Solid,
            width,
        }
    }

    pub const fn none() -> Self {
        Self {
            style: LineStyle::None,
            width: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Borders {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top: Option<BorderLine>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bottom: Option<BorderLine>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub left: Option<BorderLine>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub right: Option<BorderLine>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inner_horizontal: Option<BorderLine>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inner_vertical: Option<BorderLine>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DirectiveKind {
    /// Unconditional style over the whole range.
    Style { style: CellStyle },
    /// Style applied to each row of the range whose condition holds.
    ConditionalStyle {
        condition: RowCondition,
        style: CellStyle,
    },
    /// Pixel width for every column of the range.
    ColumnWidth { pixels: u32 },
    Borders { borders: Borders },
    /// Keep the first `count` rows visible while scrolling.
    FreezeRows { count: usize },
}

/// Declarative, backend-agnostic styling instruction. Sinks apply a list of
/// these in order; later directives win where ranges overlap.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormatDirective {
    pub range: CellRange,
    #[serde(flatten)]
    pub kind: DirectiveKind,
}

impl FormatDirective {
    pub fn style(range: CellRange, style: CellStyle) -> Self {
        Self {
            range,
            kind: DirectiveKind::Style { style },
        }
    }

    pub fn conditional(range: CellRange, condition: RowCondition, style: CellStyle) -> Self {
        Self {
            range,
            kind: DirectiveKind::ConditionalStyle { condition, style },
        }
    }
}
