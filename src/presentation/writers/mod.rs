use crate::domain::{ports::SheetWriter, value_objects::SourceName};
use anyhow::{anyhow, Result};
use std::path::{Path, PathBuf};

use self::{html::HtmlWriter, json::JsonWriter};

pub mod html;
pub mod json;

/// Register available writers - add new ones without touching main.rs
pub fn all_writers() -> Vec<Box<dyn SheetWriter>> {
    vec![Box::new(JsonWriter), Box::new(HtmlWriter)]
}

pub fn writer_for(format: &str) -> Option<Box<dyn SheetWriter>> {
    match format {
        "json" => Some(Box::new(JsonWriter)),
        "html" => Some(Box::new(HtmlWriter)),
        _ => None,
    }
}

/// `"all"` or a single writer name.
pub fn writers_for_format(format: &str) -> Result<Vec<Box<dyn SheetWriter>>> {
    match format {
        "all" => Ok(all_writers()),
        fmt => writer_for(fmt)
            .map(|w| vec![w])
            .ok_or_else(|| anyhow!("Unknown format: {}", fmt)),
    }
}

/// Where `writer` puts the sheet of `source` inside `dir`.
pub fn output_path(dir: &Path, source: &SourceName, writer: &dyn SheetWriter) -> PathBuf {
    dir.join(format!("{}.{}", source.slug(), writer.extension()))
}
