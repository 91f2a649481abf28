use scraper::{ElementRef, Node, Selector};

use super::rules::Locator;
use crate::error::{Result, ScrapeError};

/// Compiled locator.
///
/// The CSS selector requires every class token; a multi-token locator then
/// also requires the element's whole class list, whitespace-normalised, to
/// equal the locator's tokens in order.
pub struct Matcher {
    selector: Selector,
    exact_class: Option<String>,
}

impl Matcher {
    fn accepts(&self, el: &ElementRef<'_>) -> bool {
        match &self.exact_class {
            Some(class) => class_list(el) == *class,
            None => true,
        }
    }
}

fn class_list(el: &ElementRef<'_>) -> String {
    el.value()
        .attr("class")
        .unwrap_or_default()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn matcher(locator: &Locator) -> Result<Matcher> {
    let tokens: Vec<&str> = locator
        .class
        .map(|class| class.split_whitespace().collect())
        .unwrap_or_default();

    let mut css = locator.tag.to_string();
    for token in &tokens {
        css.push('.');
        css.push_str(token);
    }
    let selector = Selector::parse(&css).map_err(|e| ScrapeError::Selector {
        selector: css.clone(),
        reason: e.to_string(),
    })?;

    Ok(Matcher {
        selector,
        exact_class: (tokens.len() > 1).then(|| tokens.join(" ")),
    })
}

pub fn find_first<'a>(scope: ElementRef<'a>, matcher: &Matcher) -> Option<ElementRef<'a>> {
    scope.select(&matcher.selector).find(|el| matcher.accepts(el))
}

pub fn find_all<'a>(scope: ElementRef<'a>, matcher: &Matcher) -> Vec<ElementRef<'a>> {
    scope
        .select(&matcher.selector)
        .filter(|el| matcher.accepts(el))
        .collect()
}

/// Concatenated text of the element and all its descendants.
pub fn text(el: ElementRef<'_>) -> String {
    el.text().collect()
}

/// Text of the n-th immediate child node, counting text and comment nodes
/// as children. A comment yields its content.
pub fn nth_child_text(el: ElementRef<'_>, n: usize) -> Option<String> {
    let child = el.children().nth(n)?;
    match child.value() {
        Node::Text(t) => Some(String::from(&**t)),
        Node::Comment(c) => Some(String::from(&**c)),
        Node::Element(_) => ElementRef::wrap(child).map(text),
        _ => None,
    }
}
