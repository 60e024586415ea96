use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

// ─── Colours ─────────────────────────────────────────────────────────────────

/// RGB colour with channels in `0.0..=1.0`, the way spreadsheet APIs take them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub red: f32,
    pub green: f32,
    pub blue: f32,
}

impl Color {
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);

    pub const fn rgb(red: f32, green: f32, blue: f32) -> Self {
        Self { red, green, blue }
    }

    /// `#rrggbb`, channels clamped.
    pub fn to_hex(self) -> String {
        let channel = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        format!(
            "#{:02x}{:02x}{:02x}",
            channel(self.red),
            channel(self.green),
            channel(self.blue)
        )
    }
}

/// Background and text colour applied together.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Shade {
    pub background: Color,
    pub text: Color,
}

impl Shade {
    pub const fn new(background: Color, text: Color) -> Self {
        Self { background, text }
    }
}

/// One shade per row parity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParityShades {
    pub even: Shade,
    pub odd: Shade,
}

/// Every colour the rule compiler uses. Immutable configuration, passed in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Palette {
    pub header_background: Color,
    pub header_text: Color,
    pub zebra: Shade,
    pub available: ParityShades,
    pub unavailable: ParityShades,
    pub price_decrease: Shade,
    pub price_increase: Shade,
    pub timestamp_text: Color,
    pub footer_background: Color,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            header_background: Color::rgb(0.12, 0.24, 0.35),
            header_text: Color::WHITE,
            zebra: Shade::new(Color::rgb(0.97, 0.97, 0.97), Color::rgb(0.2, 0.2, 0.2)),
            available: ParityShades {
                even: Shade::new(Color::rgb(0.7, 0.9, 0.7), Color::rgb(0.0, 0.4, 0.0)),
                odd: Shade::new(Color::rgb(0.85, 0.95, 0.85), Color::rgb(0.0, 0.55, 0.0)),
            },
            unavailable: ParityShades {
                even: Shade::new(Color::rgb(1.0, 0.7, 0.7), Color::rgb(0.6, 0.0, 0.0)),
                odd: Shade::new(Color::rgb(1.0, 0.9, 0.9), Color::rgb(0.65, 0.0, 0.0)),
            },
            price_decrease: Shade::new(Color::rgb(0.8, 0.94, 0.8), Color::rgb(0.0, 0.45, 0.0)),
            price_increase: Shade::new(Color::rgb(1.0, 0.88, 0.7), Color::rgb(0.75, 0.35, 0.0)),
            timestamp_text: Color::rgb(0.5, 0.5, 0.5),
            footer_background: Color::rgb(0.95, 0.95, 0.95),
        }
    }
}

// ─── Columns ─────────────────────────────────────────────────────────────────

/// Which product field a column shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnField {
    Name,
    Price,
    /// Potency attribute by label, e.g. `{ potency = "thc" }`.
    Potency(String),
    Availability,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HorizontalAlign {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WrapStrategy {
    Wrap,
    OverflowCell,
    Clip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnAlignment {
    pub horizontal: HorizontalAlign,
    pub wrap: WrapStrategy,
}

/// One configured column, as written in the config file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ColumnSpec {
    pub header: String,
    pub field: ColumnField,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default, deserialize_with = "lowercase_align::deserialize")]
    pub align: Option<HorizontalAlign>,
    #[serde(default, deserialize_with = "lowercase_wrap::deserialize")]
    pub wrap: Option<WrapStrategy>,
    #[serde(default)]
    pub currency: bool,
}

impl ColumnSpec {
    pub fn new(header: &str, field: ColumnField) -> Self {
        Self {
            header: header.to_string(),
            field,
            width: None,
            align: None,
            wrap: None,
            currency: false,
        }
    }

    pub fn width(mut self, px: u32) -> Self {
        self.width = Some(px);
        self
    }

    pub fn aligned(mut self, align: HorizontalAlign, wrap: WrapStrategy) -> Self {
        self.align = Some(align);
        self.wrap = Some(wrap);
        self
    }

    pub fn currency(mut self) -> Self {
        self.currency = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("column schema has no columns")]
    Empty,
    #[error("column schema has no `name` column")]
    MissingName,
    #[error("column schema has no `price` column")]
    MissingPrice,
    #[error("column schema has more than one `availability` column")]
    DuplicateAvailability,
}

/// Presentation column layout for one source.
///
/// Carries the `headers / widths / currencyColumns / availabilityColumn`
/// shape plus the field bound to each column and per-column alignment.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSchema {
    pub headers: Vec<String>,
    pub fields: Vec<ColumnField>,
    pub widths: BTreeMap<usize, u32>,
    pub currency_columns: BTreeSet<usize>,
    pub availability_column: Option<usize>,
    pub price_column: usize,
    pub alignments: BTreeMap<usize, ColumnAlignment>,
}

impl ColumnSchema {
    pub fn from_columns(columns: &[ColumnSpec]) -> Result<Self, SchemaError> {
        if columns.is_empty() {
            return Err(SchemaError::Empty);
        }
        if !columns.iter().any(|c| c.field == ColumnField::Name) {
            return Err(SchemaError::MissingName);
        }
        let price_column = columns
            .iter()
            .position(|c| c.field == ColumnField::Price)
            .ok_or(SchemaError::MissingPrice)?;

        let mut availability = columns
            .iter()
            .enumerate()
            .filter(|(_, c)| c.field == ColumnField::Availability)
            .map(|(i, _)| i);
        let availability_column = availability.next();
        if availability.next().is_some() {
            return Err(SchemaError::DuplicateAvailability);
        }

        let widths = columns
            .iter()
            .enumerate()
            .filter_map(|(i, c)| c.width.map(|w| (i, w)))
            .collect();
        let currency_columns = columns
            .iter()
            .enumerate()
            .filter(|(_, c)| c.currency)
            .map(|(i, _)| i)
            .collect();
        let alignments = columns
            .iter()
            .enumerate()
            .filter_map(|(i, c)| match (c.align, c.wrap) {
                (None, None) => None,
                (align, wrap) => Some((
                    i,
                    ColumnAlignment {
                        horizontal: align.unwrap_or(HorizontalAlign::Left),
                        wrap: wrap.unwrap_or(WrapStrategy::OverflowCell),
                    },
                )),
            })
            .collect();

        Ok(Self {
            headers: columns.iter().map(|c| c.header.clone()).collect(),
            fields: columns.iter().map(|c| c.field.clone()).collect(),
            widths,
            currency_columns,
            availability_column,
            price_column,
            alignments,
        })
    }

    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    /// Columns for a source that only publishes name and price.
    pub fn option_list_columns() -> Vec<ColumnSpec> {
        use HorizontalAlign::*;
        use WrapStrategy::*;
        vec![
            ColumnSpec::new("Product", ColumnField::Name)
                .width(380)
                .aligned(Left, Wrap),
            ColumnSpec::new("Price", ColumnField::Price)
                .width(60)
                .aligned(Right, OverflowCell)
                .currency(),
        ]
    }

    /// Columns for a feed source with potency and availability.
    pub fn product_feed_columns() -> Vec<ColumnSpec> {
        use HorizontalAlign::*;
        use WrapStrategy::*;
        vec![
            ColumnSpec::new("Product", ColumnField::Name)
                .width(280)
                .aligned(Left, Wrap),
            ColumnSpec::new("Price", ColumnField::Price)
                .width(100)
                .aligned(Right, OverflowCell)
                .currency(),
            ColumnSpec::new("THC %", ColumnField::Potency("thc".into()))
                .width(80)
                .aligned(Center, OverflowCell),
            ColumnSpec::new("CBD %", ColumnField::Potency("cbd".into()))
                .width(80)
                .aligned(Center, OverflowCell),
            ColumnSpec::new("Availability", ColumnField::Availability)
                .width(120)
                .aligned(Center, OverflowCell),
        ]
    }
}

// Config files spell alignment in lowercase ("left", "overflow_cell"); the
// serialised directive form stays upper-case like the spreadsheet API.
mod lowercase_align {
    use super::HorizontalAlign;
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(d: D) -> Result<Option<HorizontalAlign>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(d)?;
        raw.map(|s| match s.to_ascii_lowercase().as_str() {
            "left" => Ok(HorizontalAlign::Left),
            "center" | "centre" => Ok(HorizontalAlign::Center),
            "right" => Ok(HorizontalAlign::Right),
            other => Err(serde::de::Error::custom(format!(
                "unknown alignment {other:?}"
            ))),
        })
        .transpose()
    }
}

mod lowercase_wrap {
    use super::WrapStrategy;
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(d: D) -> Result<Option<WrapStrategy>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(d)?;
        raw.map(|s| match s.to_ascii_lowercase().as_str() {
            "wrap" => Ok(WrapStrategy::Wrap),
            "overflow_cell" | "overflow" => Ok(WrapStrategy::OverflowCell),
            "clip" => Ok(WrapStrategy::Clip),
            other => Err(serde::de::Error::custom(format!(
                "unknown wrap strategy {other:?}"
            ))),
        })
        .transpose()
    }
}
