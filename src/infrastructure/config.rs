use anyhow::{bail, Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::application::parsers::{product_feed::DEFAULT_POTENCY_LABELS, OptionListParser, ProductFeedParser};
use crate::application::pipeline::SourceJob;
use crate::domain::layout::{ColumnSchema, ColumnSpec, Palette};
use crate::domain::ports::SourceParser;
use crate::domain::value_objects::SourceName;

/// Environment variables override file values, e.g.
/// `PRICEWATCH__OUTPUT__DIR=/tmp/out`.
pub const ENV_PREFIX: &str = "PRICEWATCH";

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub output: OutputConfig,
    #[serde(default)]
    pub state: StateConfig,
    pub sources: Vec<SourceConfig>,
    /// Directory relative payload, output and state paths resolve against.
    /// Set by [`AppConfig::load`].
    #[serde(skip)]
    pub base_dir: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct OutputConfig {
    pub dir: String,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct StateConfig {
    /// Where snapshots live. Defaults to the platform data dir.
    #[serde(default)]
    pub dir: Option<String>,
}

impl StateConfig {
    pub fn resolved_dir(&self) -> PathBuf {
        match &self.dir {
            Some(dir) => PathBuf::from(dir),
            None => dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("pricewatch"),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// HTML page with `<option value="name|price">` entries.
    OptionList,
    /// JSON `{"products": [...]}` feed.
    ProductFeed,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SourceConfig {
    pub name: String,
    pub kind: SourceKind,
    /// Path of the raw page or feed.
    pub payload: String,
    /// Text an option-list page must contain to be trusted.
    #[serde(default)]
    pub page_marker: Option<String>,
    #[serde(default = "default_potency_labels")]
    pub potency_labels: Vec<String>,
    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: String,
    /// Empty means the default layout for `kind`.
    #[serde(default)]
    pub columns: Vec<ColumnSpec>,
    #[serde(default)]
    pub palette: Palette,
}

fn default_potency_labels() -> Vec<String> {
    DEFAULT_POTENCY_LABELS.iter().map(|s| s.to_string()).collect()
}

fn default_currency_symbol() -> String {
    "£".to_string()
}

impl SourceConfig {
    pub fn source_name(&self) -> SourceName {
        SourceName(self.name.clone())
    }

    pub fn parser(&self) -> Result<Arc<dyn SourceParser>> {
        Ok(match self.kind {
            SourceKind::OptionList => match &self.page_marker {
                Some(marker) => Arc::new(OptionListParser::with_page_marker(marker.clone())),
                None => Arc::new(OptionListParser::new()),
            },
            SourceKind::ProductFeed => Arc::new(
                ProductFeedParser::new(&self.potency_labels)
                    .with_context(|| format!("source {:?}: invalid potency label", self.name))?,
            ),
        })
    }

    pub fn schema(&self) -> Result<ColumnSchema> {
        let columns = if self.columns.is_empty() {
            match self.kind {
                SourceKind::OptionList => ColumnSchema::option_list_columns(),
                SourceKind::ProductFeed => ColumnSchema::product_feed_columns(),
            }
        } else {
            self.columns.clone()
        };
        ColumnSchema::from_columns(&columns)
            .with_context(|| format!("source {:?}: invalid column layout", self.name))
    }

    /// Resolve the payload path against `base_dir` and bundle the layout.
    pub fn job(&self, base_dir: &Path) -> Result<SourceJob> {
        let location = resolve_against(base_dir, Path::new(&self.payload));
        Ok(SourceJob {
            name: self.source_name(),
            location: location.to_string_lossy().into_owned(),
            schema: self.schema()?,
            palette: self.palette.clone(),
            currency_symbol: self.currency_symbol.clone(),
        })
    }
}

fn resolve_against(base_dir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}

impl AppConfig {
    /// Load `path` (TOML) with `PRICEWATCH__*` environment overrides on top.
    pub fn load(path: &str) -> Result<Self> {
        let settings = Config::builder()
            .add_source(File::new(path, FileFormat::Toml))
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()
            .with_context(|| format!("Failed to read config file: {}", path))?;
        let mut cfg: AppConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to parse config TOML")?;
        cfg.base_dir = Path::new(path)
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        cfg.validate()?;
        Ok(cfg)
    }

    /// Parse an in-memory TOML document. Relative paths resolve against the
    /// working directory.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let mut cfg: AppConfig = Config::builder()
            .add_source(File::from_str(content, FileFormat::Toml))
            .build()?
            .try_deserialize()
            .with_context(|| "Failed to parse config TOML")?;
        cfg.base_dir = PathBuf::new();
        cfg.validate()?;
        Ok(cfg)
    }

    /// Sheet output directory; relative paths resolve against the config file.
    pub fn output_dir(&self) -> PathBuf {
        resolve_against(&self.base_dir, Path::new(&self.output.dir))
    }

    /// Snapshot directory; relative paths resolve against the config file.
    pub fn state_dir(&self) -> PathBuf {
        resolve_against(&self.base_dir, &self.state.resolved_dir())
    }

    pub fn source(&self, name: &str) -> Option<&SourceConfig> {
        self.sources.iter().find(|s| s.name == name)
    }

    /// Build every parser and schema once so layout mistakes surface at load
    /// time, not halfway through a run.
    fn validate(&self) -> Result<()> {
        if self.sources.is_empty() {
            bail!("config has no [[sources]]");
        }
        let mut slugs = BTreeSet::new();
        for source in &self.sources {
            if source.name.trim().is_empty() {
                bail!("source with an empty name");
            }
            // snapshot and output files are keyed by slug
            let slug = source.source_name().slug();
            if !slugs.insert(slug.clone()) {
                bail!("sources {:?} collide on file name {:?}", source.name, slug);
            }
            source.parser()?;
            source.schema()?;
        }
        Ok(())
    }
}
