pub mod dom;
pub mod extract;
pub mod rules;

use std::fmt;
use std::str::FromStr;

use scraper::Html;
use tracing::debug;

use crate::error::{Result, ScrapeError};
use crate::fetch::RawPage;
use crate::table::Table;

/// HTML tree builder. Chosen explicitly so extraction never depends on
/// whatever the runtime happens to have available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backend {
    #[default]
    Html5ever,
}

impl FromStr for Backend {
    type Err = ScrapeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "html5ever" => Ok(Backend::Html5ever),
            other => Err(ScrapeError::UnknownBackend(other.to_string())),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Html5ever => f.write_str("html5ever"),
        }
    }
}

/// Parsed page. Read-only once built.
pub struct Document {
    html: Html,
}

impl Document {
    /// Bodies are read as UTF-8. Fetched pages are already decoded from
    /// their declared charset; saved pages are expected to be UTF-8.
    pub fn parse(page: &RawPage, backend: Backend) -> Self {
        let source = String::from_utf8_lossy(&page.body);
        let html = match backend {
            Backend::Html5ever => Html::parse_document(&source),
        };
        debug!(%backend, bytes = page.body.len(), "parsed document");
        Document { html }
    }

    pub fn html(&self) -> &Html {
        &self.html
    }
}

/// Parse → extract → assemble.
pub fn process_page(page: &RawPage, backend: Backend) -> Result<Table> {
    let doc = Document::parse(page, backend);
    let columns = extract::extract_columns(&doc)?;
    Table::assemble(columns)
}
