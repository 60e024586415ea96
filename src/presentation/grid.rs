use crate::domain::{
    directive::{BorderLine, CellRange, CellStyle, DirectiveKind, LineStyle},
    layout::WrapStrategy,
    sheet::{CellValue, SheetDocument},
};
use crate::presentation::compiler::format_currency;

/// Borders resolved onto one cell. `None` means never touched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CellBorders {
    pub top: Option<BorderLine>,
    pub bottom: Option<BorderLine>,
    pub left: Option<BorderLine>,
    pub right: Option<BorderLine>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StyledCell {
    pub value: CellValue,
    pub style: CellStyle,
    pub borders: CellBorders,
}

impl StyledCell {
    /// Displayed text, honouring a currency number format when one applies.
    pub fn text(&self) -> String {
        match (&self.value, &self.style.number_format) {
            (CellValue::Number(n), Some(pattern)) => match pattern.split_once("#,##0.00") {
                Some((symbol, _)) => format_currency(symbol, *n),
                None => n.to_string(),
            },
            (value, _) => value.display(),
        }
    }

    /// Inline CSS for the HTML preview.
    pub fn css(&self) -> String {
        let mut css = Vec::new();
        let s = &self.style;
        if let Some(bg) = s.background {
            css.push(format!("background-color:{}", bg.to_hex()));
        }
        if let Some(fg) = s.foreground {
            css.push(format!("color:{}", fg.to_hex()));
        }
        if s.bold == Some(true) {
            css.push("font-weight:bold".to_string());
        }
        if s.italic == Some(true) {
            css.push("font-style:italic".to_string());
        }
        if let Some(size) = s.font_size {
            css.push(format!("font-size:{size}pt"));
        }
        if let Some(align) = s.horizontal_align {
            css.push(format!("text-align:{}", format!("{align:?}").to_lowercase()));
        }
        match s.wrap {
            Some(WrapStrategy::Wrap) => css.push("white-space:normal".to_string()),
            Some(WrapStrategy::Clip) => css.push("white-space:nowrap;overflow:hidden".to_string()),
            Some(WrapStrategy::OverflowCell) => css.push("white-space:nowrap".to_string()),
            None => {}
        }
        let sides = [
            ("top", self.borders.top),
            ("bottom", self.borders.bottom),
            ("left", self.borders.left),
            ("right", self.borders.right),
        ];
        for (side, line) in sides {
            if let Some(line) = line {
                css.push(format!("border-{side}:{}", border_css(line)));
            }
        }
        css.join(";")
    }
}

fn border_css(line: BorderLine) -> String {
    match line.style {
        LineStyle::Solid => format!("{}px solid #000000", line.width),
        LineStyle::None => "none".to_string(),
    }
}

/// The sheet as it looks once every directive has been applied in order.
#[derive(Debug, Clone, PartialEq)]
pub struct StyledGrid {
    pub rows: Vec<Vec<StyledCell>>,
    pub column_widths: Vec<Option<u32>>,
    pub frozen_rows: usize,
}

impl StyledGrid {
    pub fn cell(&self, row: usize, col: usize) -> Option<&StyledCell> {
        self.rows.get(row)?.get(col)
    }
}

/// Apply `sheet.directives` in order onto its values. Ranges are clipped to
/// the grid; conditional styles are evaluated per row against the displayed
/// text, as a spreadsheet would.
pub fn resolve(sheet: &SheetDocument) -> StyledGrid {
    let columns = sheet.column_count().max(1);
    let mut grid = StyledGrid {
        rows: sheet
            .values()
            .into_iter()
            .map(|mut row| {
                row.resize(columns, CellValue::Empty);
                row.into_iter()
                    .map(|value| StyledCell {
                        value,
                        style: CellStyle::default(),
                        borders: CellBorders::default(),
                    })
                    .collect()
            })
            .collect(),
        column_widths: vec![None; columns],
        frozen_rows: 0,
    };

    for directive in &sheet.directives {
        let range = clip(directive.range, grid.rows.len(), columns);
        match &directive.kind {
            DirectiveKind::Style { style } => {
                for_each_cell(&mut grid, range, |cell| cell.style.merge(style));
            }
            DirectiveKind::ConditionalStyle { condition, style } => {
                for row in range.start_row..range.end_row {
                    let text: Vec<String> = grid.rows[row].iter().map(StyledCell::text).collect();
                    if condition.holds(row, &text) {
                        for cell in &mut grid.rows[row][range.start_col..range.end_col] {
                            cell.style.merge(style);
                        }
                    }
                }
            }
            DirectiveKind::ColumnWidth { pixels } => {
                for width in &mut grid.column_widths[range.start_col..range.end_col] {
                    *width = Some(*pixels);
                }
            }
            DirectiveKind::Borders { borders } => {
                if range.is_empty() {
                    continue;
                }
                let last_row = range.end_row - 1;
                let last_col = range.end_col - 1;
                for row in range.start_row..range.end_row {
                    for col in range.start_col..range.end_col {
                        let b = &mut grid.rows[row][col].borders;
                        let horizontal_inner = borders.inner_horizontal;
                        let vertical_inner = borders.inner_vertical;
                        set(&mut b.top, if row == range.start_row { borders.top } else { horizontal_inner });
                        set(&mut b.bottom, if row == last_row { borders.bottom } else { horizontal_inner });
                        set(&mut b.left, if col == range.start_col { borders.left } else { vertical_inner });
                        set(&mut b.right, if col == last_col { borders.right } else { vertical_inner });
                    }
                }
            }
            DirectiveKind::FreezeRows { count } => grid.frozen_rows = *count,
        }
    }
    grid
}

fn set(slot: &mut Option<BorderLine>, line: Option<BorderLine>) {
    if line.is_some() {
        *slot = line;
    }
}

fn clip(range: CellRange, rows: usize, cols: usize) -> CellRange {
    let end_row = range.end_row.min(rows);
    let end_col = range.end_col.min(cols);
    CellRange {
        start_row: range.start_row.min(end_row),
        end_row,
        start_col: range.start_col.min(end_col),
        end_col,
    }
}

fn for_each_cell(grid: &mut StyledGrid, range: CellRange, mut f: impl FnMut(&mut StyledCell)) {
    for row in &mut grid.rows[range.start_row..range.end_row] {
        for cell in &mut row[range.start_col..range.end_col] {
            f(cell);
        }
    }
}
