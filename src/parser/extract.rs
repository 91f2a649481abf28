use scraper::ElementRef;
use tracing::{debug, info};

use super::dom::{self, Matcher};
use super::rules::{Coercion, Field, FieldRule, Locator, Scope, TextRule, CONTAINER, HEADING, RULES};
use super::Document;
use crate::error::{Result, ScrapeError};

const LINK: Locator = Locator::new("a", None);

/// One extracted cell before assembly.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    Int(i64),
    Float(f64),
    List(Vec<String>),
    Null,
}

/// Column-major extraction result: one sequence per field, each meant to
/// hold exactly one value per located container.
#[derive(Debug, Clone, Default)]
pub struct Columns {
    pub containers: usize,
    pub columns: Vec<(Field, Vec<Value>)>,
}

impl Columns {
    #[cfg(test)]
    pub fn get(&self, field: Field) -> Option<&[Value]> {
        self.columns
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, v)| v.as_slice())
    }
}

struct CompiledRule {
    rule: &'static FieldRule,
    matcher: Matcher,
}

/// Field rules with their locators compiled once per run.
pub struct Extractor {
    container: Matcher,
    heading: Matcher,
    link: Matcher,
    rules: Vec<CompiledRule>,
}

impl Extractor {
    pub fn new() -> Result<Self> {
        let rules = RULES
            .iter()
            .map(|rule| -> Result<CompiledRule> {
                Ok(CompiledRule {
                    rule,
                    matcher: dom::matcher(&rule.locator)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        debug!(rules = rules.len(), "compiled field rules");
        Ok(Extractor {
            container: dom::matcher(&CONTAINER)?,
            heading: dom::matcher(&HEADING)?,
            link: dom::matcher(&LINK)?,
            rules,
        })
    }

    /// Entry containers in document order.
    pub fn containers<'a>(&self, doc: &'a Document) -> Vec<ElementRef<'a>> {
        dom::find_all(doc.html().root_element(), &self.container)
    }

    pub fn extract(&self, doc: &Document) -> Result<Columns> {
        let containers = self.containers(doc);
        info!(containers = containers.len(), "located countdown entries");

        let mut columns = Vec::with_capacity(self.rules.len());
        for compiled in &self.rules {
            let values = containers
                .iter()
                .enumerate()
                .map(|(row, container)| self.apply(compiled, *container, row))
                .collect::<Result<Vec<_>>>()?;
            debug!(field = %compiled.rule.field, values = values.len(), "extracted column");
            columns.push((compiled.rule.field, values));
        }

        Ok(Columns {
            containers: containers.len(),
            columns,
        })
    }

    fn apply(&self, compiled: &CompiledRule, container: ElementRef<'_>, row: usize) -> Result<Value> {
        let rule = compiled.rule;
        let scope = match rule.scope {
            Scope::Container => container,
            Scope::Heading => dom::find_first(container, &self.heading)
                .ok_or_else(|| missing(rule.field, row, HEADING.to_string()))?,
        };
        let node = dom::find_first(scope, &compiled.matcher)
            .ok_or_else(|| missing(rule.field, row, rule.locator.to_string()))?;

        let raw = match rule.text {
            TextRule::Own => dom::text(node),
            TextRule::Child(n) => dom::nth_child_text(node, n).ok_or_else(|| {
                missing(rule.field, row, format!("child #{} of {}", n, rule.locator))
            })?,
            TextRule::OptionalLink => match dom::find_first(node, &self.link) {
                Some(link) => dom::text(link),
                None => return Ok(Value::Null),
            },
            TextRule::AllLinks => {
                let names = dom::find_all(node, &self.link)
                    .into_iter()
                    .map(|link| rule.strip.apply(&dom::text(link)).to_string())
                    .collect();
                return Ok(Value::List(names));
            }
        };

        coerce(rule, row, rule.strip.apply(&raw))
    }
}

/// Run every field rule over the document.
pub fn extract_columns(doc: &Document) -> Result<Columns> {
    Extractor::new()?.extract(doc)
}

fn coerce(rule: &FieldRule, row: usize, text: &str) -> Result<Value> {
    let bad = || ScrapeError::Coerce {
        field: rule.field,
        row,
        text: text.to_string(),
    };
    match rule.coercion {
        Coercion::Text => Ok(Value::Text(text.to_string())),
        Coercion::Int => text.trim().parse().map(Value::Int).map_err(|_| bad()),
        Coercion::Float => text.trim().parse().map(Value::Float).map_err(|_| bad()),
    }
}

fn missing(field: Field, row: usize, what: String) -> ScrapeError {
    ScrapeError::MissingNode { field, row, what }
}
