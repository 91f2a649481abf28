use std::path::PathBuf;

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;

use crate::error::Result;
use crate::export::{ExportOptions, Targets};
use crate::parser::Backend;

pub const DEFAULT_URL: &str =
    "https://editorial.rottentomatoes.com/guide/140-essential-action-movies-to-watch-now";
pub const DEFAULT_CSV: &str = "movies_info.csv";
pub const DEFAULT_XLSX: &str = "movies_info.xlsx";

/// Optional file in the working directory.
const CONFIG_FILE: &str = "movies_scraper.toml";
const ENV_PREFIX: &str = "MOVIES";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub url: String,
    pub backend: String,
    pub csv_path: PathBuf,
    pub xlsx_path: PathBuf,
    pub include_index: bool,
    pub include_header: bool,
    #[serde(default)]
    pub snapshot: Option<PathBuf>,
}

impl Settings {
    /// Defaults, then `movies_scraper.toml`, then `MOVIES_*` variables.
    pub fn load() -> std::result::Result<Self, ConfigError> {
        defaults()?
            .add_source(File::new(CONFIG_FILE, FileFormat::Toml).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()?
            .try_deserialize()
    }

    pub fn backend(&self) -> Result<Backend> {
        self.backend.parse()
    }

    pub fn export_options(&self) -> ExportOptions {
        ExportOptions {
            index: self.include_index,
            header: self.include_header,
        }
    }

    pub fn targets(&self) -> Targets {
        Targets {
            csv: self.csv_path.clone(),
            xlsx: self.xlsx_path.clone(),
        }
    }
}

fn defaults() -> std::result::Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("url", DEFAULT_URL)?
        .set_default("backend", "html5ever")?
        .set_default("csv_path", DEFAULT_CSV)?
        .set_default("xlsx_path", DEFAULT_XLSX)?
        .set_default("include_index", false)?
        .set_default("include_header", true)
}
