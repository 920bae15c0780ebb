//! Typed restraint lines.
//!
//! # Responsibility
//! - Parse a restraint text line once into card, suffix and terms.
//! - Render the parsed line back into the stored `(card, atom_spec)` pair.
//!
//! # Invariants
//! - A parsed line always carries a known [`RestraintCard`].
//! - Terms keep their input order; range operators stay unresolved until
//!   [`RestraintLine::resolve_ranges`] is called with an atom order.

use crate::model::fragment::RestraintRecord;
use crate::restraints::cards::RestraintCard;
use crate::restraints::range::{resolve_ranges, RangeError};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Direction of a range shorthand operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// `>`: count up in atom order.
    Forward,
    /// `<`: count down in atom order.
    Backward,
}

impl Direction {
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Forward => ">",
            Self::Backward => "<",
        }
    }

    pub fn from_symbol(token: &str) -> Option<Self> {
        match token {
            ">" => Some(Self::Forward),
            "<" => Some(Self::Backward),
            _ => None,
        }
    }
}

/// One whitespace-separated token after the card keyword.
#[derive(Debug, Clone, PartialEq)]
pub enum Term {
    Atom(String),
    /// Numeric parameter; `text` keeps the spelling it was written with.
    Number { value: f64, text: String },
    Range(Direction),
}

impl Term {
    fn parse(token: &str) -> Self {
        if let Some(direction) = Direction::from_symbol(token) {
            return Self::Range(direction);
        }
        match token.parse::<f64>() {
            Ok(value) if value.is_finite() => Self::Number {
                value,
                text: token.to_string(),
            },
            _ => Self::Atom(token.to_string()),
        }
    }
}

impl Display for Term {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Atom(name) => f.write_str(name),
            Self::Number { text, .. } => f.write_str(text),
            Self::Range(direction) => f.write_str(direction.symbol()),
        }
    }
}

/// Error for a line that cannot become a [`RestraintLine`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestraintParseError {
    Empty,
    UnknownCard(String),
}

impl Display for RestraintParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "restraint line is empty"),
            Self::UnknownCard(token) => write!(f, "unknown restraint card `{token}`"),
        }
    }
}

impl Error for RestraintParseError {}

/// A parsed restraint line such as `SADI_CF3 0.02 C1 F1 C1 F2`.
#[derive(Debug, Clone, PartialEq)]
pub struct RestraintLine {
    pub card: RestraintCard,
    /// Text glued to the keyword, e.g. `_CF3`. Stored upper-cased.
    pub suffix: Option<String>,
    pub terms: Vec<Term>,
}

impl RestraintLine {
    pub fn new(card: RestraintCard, terms: Vec<Term>) -> Self {
        Self {
            card,
            suffix: None,
            terms,
        }
    }

    /// Parses one line. The keyword is the first four characters of the
    /// first token.
    pub fn parse(line: &str) -> Result<Self, RestraintParseError> {
        let mut tokens = line.split_whitespace();
        let head = tokens.next().ok_or(RestraintParseError::Empty)?;
        let card = RestraintCard::parse(head)
            .ok_or_else(|| RestraintParseError::UnknownCard(head.to_string()))?;

        let keyword_len = head
            .char_indices()
            .nth(4)
            .map(|(index, _)| index)
            .unwrap_or(head.len());
        let rest = &head[keyword_len..];
        let suffix = (!rest.is_empty()).then(|| rest.to_uppercase());

        Ok(Self {
            card,
            suffix,
            terms: tokens.map(Term::parse).collect(),
        })
    }

    /// Builds a line from a stored `(card, atom_spec)` pair.
    pub fn from_record(record: &RestraintRecord) -> Result<Self, RestraintParseError> {
        Self::parse(&record.to_line())
    }

    /// Keyword with its suffix, as written to storage.
    pub fn card_text(&self) -> String {
        match &self.suffix {
            Some(suffix) => format!("{}{}", self.card.as_str(), suffix),
            None => self.card.as_str().to_string(),
        }
    }

    pub fn atom_spec(&self) -> String {
        self.terms
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn to_record(&self) -> RestraintRecord {
        RestraintRecord::new(self.card_text(), self.atom_spec())
    }

    /// Atom terms in order, range endpoints included.
    pub fn atom_names(&self) -> impl Iterator<Item = &str> {
        self.terms.iter().filter_map(|term| match term {
            Term::Atom(name) => Some(name.as_str()),
            _ => None,
        })
    }

    /// First numeric term, e.g. the standard uncertainty of a SADI line.
    pub fn first_number(&self) -> Option<f64> {
        self.terms.iter().find_map(|term| match term {
            Term::Number { value, .. } => Some(*value),
            _ => None,
        })
    }

    pub fn has_ranges(&self) -> bool {
        self.terms
            .iter()
            .any(|term| matches!(term, Term::Range(_)))
    }

    /// Returns a copy with every range operator replaced by the atoms it
    /// spans in `atom_order`.
    pub fn resolve_ranges(&self, atom_order: &[String]) -> Result<Self, RangeError> {
        if !self.has_ranges() {
            return Ok(self.clone());
        }

        let tokens = self.terms.iter().map(ToString::to_string).collect::<Vec<_>>();
        let resolved = resolve_ranges(&tokens, atom_order)?;
        Ok(Self {
            card: self.card,
            suffix: self.suffix.clone(),
            terms: resolved.iter().map(|token| Term::parse(token)).collect(),
        })
    }
}

impl Display for RestraintLine {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let spec = self.atom_spec();
        if spec.is_empty() {
            f.write_str(&self.card_text())
        } else {
            write!(f, "{} {}", self.card_text(), spec)
        }
    }
}
