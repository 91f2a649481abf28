//! Field rules for one countdown entry.
//!
//! Every output column is described by a single `FieldRule`: where to look
//! (the entry's heading or the entry itself, then a tag/class locator),
//! which text to take from the located node, what to strip from it and how
//! to coerce it. The markup offers no dedicated hook for several fields, so
//! those rules pick a child node by position.

use std::fmt;

/// Entry container: `div` whose class list is exactly these tokens.
pub const CONTAINER: Locator = Locator::new(
    "div",
    Some("col-sm-18 col-full-xs countdown-item-content"),
);

/// Heading inside an entry holding the title, year and score.
pub const HEADING: Locator = Locator::new("h2", None);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    Title,
    Year,
    Score,
    AdjustedScore,
    Director,
    Synopsis,
    Cast,
    Consensus,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Title => "title",
            Field::Year => "year",
            Field::Score => "score",
            Field::AdjustedScore => "adjusted_score",
            Field::Director => "director",
            Field::Synopsis => "synopsis",
            Field::Cast => "cast",
            Field::Consensus => "consensus",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tag name plus optional class match.
///
/// A class containing whitespace must equal the element's whole class list
/// (whitespace-normalised); a single token only has to be one of its classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Locator {
    pub tag: &'static str,
    pub class: Option<&'static str>,
}

impl Locator {
    pub const fn new(tag: &'static str, class: Option<&'static str>) -> Self {
        Locator { tag, class }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.class {
            Some(class) => write!(f, "{} \"{}\"", self.tag, class),
            None => f.write_str(self.tag),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Search under the entry's heading.
    Heading,
    /// Search anywhere under the entry container.
    Container,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextRule {
    /// Text of the located node.
    Own,
    /// Text of the n-th child node (text nodes included).
    Child(usize),
    /// Text of the first link under the node, null if there is none.
    OptionalLink,
    /// Text of every link under the node, in document order.
    AllLinks,
}

/// Characters removed from both ends of the text before coercion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Strip {
    pub chars: &'static [char],
    pub whitespace: bool,
}

impl Strip {
    pub const NONE: Strip = Strip::chars(&[]);
    pub const WHITESPACE: Strip = Strip {
        chars: &[],
        whitespace: true,
    };

    pub const fn chars(chars: &'static [char]) -> Self {
        Strip {
            chars,
            whitespace: false,
        }
    }

    pub const fn with_whitespace(self) -> Self {
        Strip {
            chars: self.chars,
            whitespace: true,
        }
    }

    pub fn apply<'a>(&self, text: &'a str) -> &'a str {
        text.trim_matches(|c: char| {
            self.chars.contains(&c) || (self.whitespace && c.is_whitespace())
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coercion {
    Text,
    Int,
    Float,
}

#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub field: Field,
    pub scope: Scope,
    pub locator: Locator,
    pub text: TextRule,
    pub strip: Strip,
    pub coercion: Coercion,
}

pub const RULES: &[FieldRule] = &[
    FieldRule {
        field: Field::Title,
        scope: Scope::Heading,
        locator: Locator::new("a", None),
        text: TextRule::Own,
        strip: Strip::NONE,
        coercion: Coercion::Text,
    },
    FieldRule {
        field: Field::Year,
        scope: Scope::Heading,
        locator: Locator::new("span", Some("start-year")),
        text: TextRule::Own,
        strip: Strip::chars(&['(', ')']),
        coercion: Coercion::Int,
    },
    FieldRule {
        field: Field::Score,
        scope: Scope::Heading,
        locator: Locator::new("span", Some("tMeterScore")),
        text: TextRule::Own,
        strip: Strip::chars(&['%']),
        coercion: Coercion::Int,
    },
    FieldRule {
        field: Field::Consensus,
        scope: Scope::Container,
        locator: Locator::new("div", Some("info critics-consensus")),
        text: TextRule::Child(1),
        strip: Strip::WHITESPACE,
        coercion: Coercion::Text,
    },
    FieldRule {
        field: Field::Director,
        scope: Scope::Container,
        locator: Locator::new("div", Some("director")),
        text: TextRule::OptionalLink,
        strip: Strip::NONE,
        coercion: Coercion::Text,
    },
    FieldRule {
        field: Field::Cast,
        scope: Scope::Container,
        locator: Locator::new("div", Some("cast")),
        text: TextRule::AllLinks,
        strip: Strip::NONE,
        coercion: Coercion::Text,
    },
    FieldRule {
        field: Field::AdjustedScore,
        scope: Scope::Container,
        locator: Locator::new("div", Some("info countdown-adjusted-score")),
        text: TextRule::Child(1),
        strip: Strip::chars(&['%']).with_whitespace(),
        coercion: Coercion::Float,
    },
    FieldRule {
        field: Field::Synopsis,
        scope: Scope::Container,
        locator: Locator::new("div", Some("synopsis")),
        text: TextRule::Child(1),
        strip: Strip::NONE,
        coercion: Coercion::Text,
    },
];

#[cfg(test)]
pub fn rule_for(field: Field) -> Option<&'static FieldRule> {
    RULES.iter().find(|r| r.field == field)
}
