//! CSS selector subset for widget discovery
//!
//! Supported syntax:
//!
//! - type selectors: `video`, `source`
//! - ID selectors: `#videos`
//! - class selectors: `.compare`, compound `.slider-arrow.prev`
//! - the descendant combinator: `.carousel-indicators .dot`
//!
//! Parsing uses nom with `VerboseError` so a bad selector in configuration
//! reports where it went wrong.
//!
//! # Example
//!
//! ```rust
//! use vitrine_core::selector::Selector;
//!
//! let selector: Selector = ".carousel-indicators .dot".parse().unwrap();
//! assert_eq!(selector.to_string(), ".carousel-indicators .dot");
//! assert!("#".parse::<Selector>().is_err());
//! ```

use std::fmt;
use std::str::FromStr;

use nom::{
    branch::alt,
    bytes::complete::take_while1,
    character::complete::{char, multispace0, multispace1},
    combinator::{cut, opt},
    error::{context, ErrorKind, ParseError as NomParseError, VerboseError, VerboseErrorKind},
    multi::{many0, separated_list1},
    Finish, IResult,
};
use thiserror::Error;

use crate::dom::{Document, Node, NodeId};

/// Custom parser result type using VerboseError for better diagnostics
type ParseResult<'a, O> = IResult<&'a str, O, VerboseError<&'a str>>;

/// Errors from selector parsing
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectorError {
    /// Nothing but whitespace
    #[error("empty selector")]
    Empty,

    /// Parsing stopped before the end of the input
    #[error("invalid selector {selector:?} at column {column}: {message}")]
    Invalid {
        /// The full selector text
        selector: String,
        /// 1-indexed column where parsing failed
        column: usize,
        /// What the parser expected
        message: String,
    },
}

/// One simple selector inside a compound
#[derive(Clone, Debug, PartialEq, Eq)]
enum SimpleSelector {
    Id(String),
    Class(String),
}

/// A compound selector: optional type plus any number of ids/classes
#[derive(Clone, Debug, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    parts: Vec<SimpleSelector>,
}

impl Compound {
    fn matches(&self, node: &Node) -> bool {
        if let Some(ref tag) = self.tag {
            if node.tag() != tag {
                return false;
            }
        }
        self.parts.iter().all(|part| match part {
            SimpleSelector::Id(id) => node.id() == Some(id.as_str()),
            SimpleSelector::Class(class) => node.has_class(class),
        })
    }
}

impl fmt::Display for Compound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref tag) = self.tag {
            write!(f, "{}", tag)?;
        }
        for part in &self.parts {
            match part {
                SimpleSelector::Id(id) => write!(f, "#{}", id)?,
                SimpleSelector::Class(class) => write!(f, ".{}", class)?,
            }
        }
        Ok(())
    }
}

/// A parsed selector: compounds joined by descendant combinators
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Selector {
    compounds: Vec<Compound>,
}

impl Selector {
    /// Parse a selector string
    pub fn parse(input: &str) -> Result<Self, SelectorError> {
        if input.trim().is_empty() {
            return Err(SelectorError::Empty);
        }

        match selector(input).finish() {
            Ok(("", compounds)) => Ok(Self { compounds }),
            Ok((rest, _)) => Err(invalid(input, rest, "unexpected trailing input")),
            Err(err) => {
                let (fragment, message) = err
                    .errors
                    .iter()
                    .find_map(|(frag, kind)| match kind {
                        VerboseErrorKind::Context(ctx) => Some((*frag, format!("expected {}", ctx))),
                        _ => None,
                    })
                    .or_else(|| {
                        err.errors
                            .first()
                            .map(|(frag, kind)| (*frag, format!("{:?}", kind)))
                    })
                    .unwrap_or((input, "parse error".to_string()));
                Err(invalid(input, fragment, &message))
            }
        }
    }

    /// Build a selector matching a single class
    pub fn class(class: &str) -> Self {
        Self {
            compounds: vec![Compound {
                tag: None,
                parts: vec![SimpleSelector::Class(class.to_string())],
            }],
        }
    }

    /// Whether `node` matches this selector
    pub fn matches(&self, doc: &Document, node: NodeId) -> bool {
        let Some((last, rest)) = self.compounds.split_last() else {
            return false;
        };
        if !doc.get(node).is_some_and(|n| last.matches(n)) {
            return false;
        }

        // Descendant combinators only: nearest matching ancestor is always
        // the best choice, so one pass up the chain suffices.
        let mut ancestors = doc.ancestors(node);
        'compounds: for compound in rest.iter().rev() {
            for ancestor in ancestors.by_ref() {
                if doc.get(ancestor).is_some_and(|n| compound.matches(n)) {
                    continue 'compounds;
                }
            }
            return false;
        }
        true
    }
}

impl FromStr for Selector {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Selector::parse(s)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, compound) in self.compounds.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}", compound)?;
        }
        Ok(())
    }
}

fn invalid(input: &str, fragment: &str, message: &str) -> SelectorError {
    let column = input.len().saturating_sub(fragment.len()) + 1;
    SelectorError::Invalid {
        selector: input.to_string(),
        column,
        message: message.to_string(),
    }
}

// ============================================================================
// Parsers
// ============================================================================

/// Parse an identifier (alphanumeric, hyphen, underscore)
fn identifier<'a, E: NomParseError<&'a str>>(input: &'a str) -> IResult<&'a str, &'a str, E> {
    take_while1(|c: char| c.is_alphanumeric() || c == '-' || c == '_')(input)
}

/// Parse an ID selector: #identifier
fn id_selector(input: &str) -> ParseResult<SimpleSelector> {
    context("identifier after '#'", |input| {
        let (input, _) = char('#')(input)?;
        let (input, id) = cut(identifier)(input)?;
        Ok((input, SimpleSelector::Id(id.to_string())))
    })(input)
}

/// Parse a class selector: .identifier
fn class_selector(input: &str) -> ParseResult<SimpleSelector> {
    context("identifier after '.'", |input| {
        let (input, _) = char('.')(input)?;
        let (input, class) = cut(identifier)(input)?;
        Ok((input, SimpleSelector::Class(class.to_string())))
    })(input)
}

/// Parse `#id` or `.class`
fn simple_selector(input: &str) -> ParseResult<SimpleSelector> {
    alt((id_selector, class_selector))(input)
}

/// Parse a compound selector such as `video`, `.a.b` or `button#go.primary`
fn compound(input: &str) -> ParseResult<Compound> {
    context("selector", |input| {
        let (input, tag) = opt(identifier)(input)?;
        let (input, parts) = many0(simple_selector)(input)?;
        if tag.is_none() && parts.is_empty() {
            return Err(nom::Err::Error(VerboseError::from_error_kind(
                input,
                ErrorKind::Many1,
            )));
        }
        Ok((
            input,
            Compound {
                tag: tag.map(str::to_ascii_lowercase),
                parts,
            },
        ))
    })(input)
}

/// Parse a full selector: compounds separated by whitespace
fn selector(input: &str) -> ParseResult<Vec<Compound>> {
    let (input, _) = multispace0(input)?;
    let (input, compounds) = separated_list1(multispace1, compound)(input)?;
    let (input, _) = multispace0(input)?;
    Ok((input, compounds))
}

// ============================================================================
// Document queries
// ============================================================================

impl Document {
    /// Descendants of `scope` matching `selector`, in document order
    pub fn select_all(&self, scope: NodeId, selector: &Selector) -> Vec<NodeId> {
        self.descendants(scope)
            .into_iter()
            .filter(|node| selector.matches(self, *node))
            .collect()
    }

    /// First descendant of `scope` matching `selector`
    pub fn select_first(&self, scope: NodeId, selector: &Selector) -> Option<NodeId> {
        self.descendants(scope)
            .into_iter()
            .find(|node| selector.matches(self, *node))
    }

    /// Nearest inclusive ancestor of `node` matching `selector`
    pub fn closest(&self, node: NodeId, selector: &Selector) -> Option<NodeId> {
        std::iter::once(node)
            .chain(self.ancestors(node))
            .find(|n| selector.matches(self, *n))
    }

    /// `querySelector` with a selector string
    pub fn query_selector(
        &self,
        scope: NodeId,
        selector: &str,
    ) -> Result<Option<NodeId>, SelectorError> {
        let selector = Selector::parse(selector)?;
        Ok(self.select_first(scope, &selector))
    }

    /// `querySelectorAll` with a selector string
    pub fn query_selector_all(
        &self,
        scope: NodeId,
        selector: &str,
    ) -> Result<Vec<NodeId>, SelectorError> {
        let selector = Selector::parse(selector)?;
        Ok(self.select_all(scope, &selector))
    }
}
