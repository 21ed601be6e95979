//! Selector engine: logos tokenizer, recursive descent parser, matcher.
//!
//! Supports the subset component markup needs: type, universal, `.class`,
//! `#id`, `[attr]` and `[attr=value]` simple selectors, descendant and child
//! combinators, and comma-separated lists.
//!
//! Token priority in logos is determined by:
//! 1. Longest match wins
//! 2. For equal length matches, earlier-defined variants win

use logos::Logos;

use super::node::{NodeData, NodeId};
use super::tree::Dom;

// ---------------------------------------------------------------------------
// Tokens
// ---------------------------------------------------------------------------

/// Selector token produced by the lexer.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\n\r\f]+")]
pub enum Token {
    /// Double-quoted string literal.
    #[regex(r#""[^"]*""#)]
    StringLiteral,

    /// Single-quoted string literal.
    #[regex(r"'[^']*'")]
    StringLiteralSingle,

    /// Identifier: tag names, class names, ids, attribute names.
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_-]*")]
    Ident,

    /// Bare number, accepted as an unquoted attribute value.
    #[regex(r"-?[0-9]+(\.[0-9]+)?")]
    Number,

    #[token("[")]
    BracketOpen,

    #[token("]")]
    BracketClose,

    #[token("=")]
    Equals,

    #[token(",")]
    Comma,

    #[token(".")]
    Dot,

    #[token("#")]
    Hash,

    #[token("*")]
    Star,

    #[token(">")]
    GreaterThan,
}

/// Errors from selector parsing.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SelectorError {
    #[error("invalid selector '{selector}': unexpected token at position {position}: {message}")]
    UnexpectedToken {
        selector: String,
        position: usize,
        message: String,
    },
    #[error("invalid selector '{selector}': unexpected end of input: {message}")]
    UnexpectedEof { selector: String, message: String },
    #[error("invalid selector '{selector}': unrecognized input at byte {offset}")]
    Unrecognized { selector: String, offset: usize },
    #[error("empty selector")]
    Empty,
}

// ---------------------------------------------------------------------------
// Model
// ---------------------------------------------------------------------------

/// A single simple selector.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectorComponent {
    /// Type selector: matches the lowercase tag name.
    Type(String),
    /// Universal selector: `*`.
    Universal,
    /// Class selector: `.classname`.
    Class(String),
    /// ID selector: `#id`.
    Id(String),
    /// Attribute selector: `[name]` or `[name=value]`.
    Attribute { name: String, value: Option<String> },
}

/// A combinator between compound selectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    /// Descendant combinator (whitespace): `A B`.
    Descendant,
    /// Child combinator: `A > B`.
    Child,
}

/// A compound selector: simple selectors without whitespace between them,
/// e.g. `button.primary[disabled]`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CompoundSelector {
    pub components: Vec<SelectorComponent>,
}

/// One element in a selector chain: either a compound selector or a combinator.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectorPart {
    Compound(CompoundSelector),
    Combinator(Combinator),
}

/// A full selector: compound selectors joined by combinators.
/// Always starts and ends with a `SelectorPart::Compound`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Selector {
    pub parts: Vec<SelectorPart>,
}

/// A comma-separated selector list. Matches when any member matches.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SelectorList {
    pub selectors: Vec<Selector>,
}

impl SelectorList {
    /// Whether the node matches any selector in the list.
    pub fn matches(&self, node: NodeId, dom: &Dom) -> bool {
        self.selectors
            .iter()
            .any(|selector| matches_selector(selector, node, dom))
    }
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

/// A positioned token with byte-level span information for whitespace detection.
#[derive(Debug, Clone)]
struct PToken {
    token: Token,
    text: String,
    pos: usize,
    byte_start: usize,
    byte_end: usize,
}

/// Parse a comma-separated selector list.
pub fn parse_selector_list(input: &str) -> Result<SelectorList, SelectorError> {
    let mut tokens = Vec::new();
    for (index, (result, span)) in Token::lexer(input).spanned().enumerate() {
        match result {
            Ok(token) => tokens.push(PToken {
                text: input[span.clone()].to_string(),
                token,
                pos: index,
                byte_start: span.start,
                byte_end: span.end,
            }),
            Err(()) => {
                return Err(SelectorError::Unrecognized {
                    selector: input.to_owned(),
                    offset: span.start,
                })
            }
        }
    }
    if tokens.is_empty() {
        return Err(SelectorError::Empty);
    }

    let mut parser = Parser {
        source: input,
        tokens,
        cursor: 0,
    };
    let mut selectors = vec![parser.parse_selector()?];
    while parser.peek().is_some_and(|t| t.token == Token::Comma) {
        parser.advance();
        selectors.push(parser.parse_selector()?);
    }
    if let Some(tok) = parser.peek() {
        return Err(parser.unexpected(tok.pos, format!("unexpected '{}'", tok.text)));
    }
    Ok(SelectorList { selectors })
}

struct Parser<'a> {
    source: &'a str,
    tokens: Vec<PToken>,
    cursor: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&PToken> {
        self.tokens.get(self.cursor)
    }

    fn advance(&mut self) -> Option<PToken> {
        let tok = self.tokens.get(self.cursor).cloned();
        if tok.is_some() {
            self.cursor += 1;
        }
        tok
    }

    fn current_pos(&self) -> usize {
        self.peek().map(|t| t.pos).unwrap_or(self.tokens.len())
    }

    fn unexpected(&self, position: usize, message: String) -> SelectorError {
        SelectorError::UnexpectedToken {
            selector: self.source.to_owned(),
            position,
            message,
        }
    }

    fn eof(&self, message: &str) -> SelectorError {
        SelectorError::UnexpectedEof {
            selector: self.source.to_owned(),
            message: message.to_owned(),
        }
    }

    /// Returns `true` if the current token is immediately adjacent (no whitespace)
    /// to the previous token.
    fn is_adjacent(&self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        let prev = &self.tokens[self.cursor - 1];
        match self.peek() {
            Some(curr) => curr.byte_start == prev.byte_end,
            None => false,
        }
    }

    fn parse_selector(&mut self) -> Result<Selector, SelectorError> {
        let mut parts = vec![SelectorPart::Compound(self.parse_compound_selector()?)];

        loop {
            match self.peek() {
                Some(t) if t.token == Token::GreaterThan => {
                    self.advance();
                    parts.push(SelectorPart::Combinator(Combinator::Child));
                    parts.push(SelectorPart::Compound(self.parse_compound_selector()?));
                }
                // A selector-starting token separated by whitespace is a
                // descendant combinator; adjacent ones were consumed already.
                Some(t)
                    if matches!(
                        t.token,
                        Token::Ident | Token::Hash | Token::Dot | Token::Star | Token::BracketOpen
                    ) =>
                {
                    parts.push(SelectorPart::Combinator(Combinator::Descendant));
                    parts.push(SelectorPart::Compound(self.parse_compound_selector()?));
                }
                _ => break,
            }
        }

        Ok(Selector { parts })
    }

    fn parse_compound_selector(&mut self) -> Result<CompoundSelector, SelectorError> {
        let mut components = Vec::new();

        match self.peek().map(|t| t.token.clone()) {
            Some(Token::Ident) => {
                if let Some(tok) = self.advance() {
                    components.push(SelectorComponent::Type(tok.text.to_ascii_lowercase()));
                }
            }
            Some(Token::Star) => {
                self.advance();
                components.push(SelectorComponent::Universal);
            }
            Some(Token::Dot | Token::Hash | Token::BracketOpen) => {
                components.push(self.parse_qualifier()?);
            }
            Some(_) => {
                return Err(self.unexpected(self.current_pos(), "expected selector part".into()));
            }
            None => return Err(self.eof("expected selector part")),
        }

        // Continue appending only while the next token is adjacent.
        while self.is_adjacent()
            && self
                .peek()
                .is_some_and(|t| matches!(t.token, Token::Dot | Token::Hash | Token::BracketOpen))
        {
            components.push(self.parse_qualifier()?);
        }

        Ok(CompoundSelector { components })
    }

    /// Parse `.class`, `#id` or `[attr]` / `[attr=value]`.
    fn parse_qualifier(&mut self) -> Result<SelectorComponent, SelectorError> {
        let Some(lead) = self.advance() else {
            return Err(self.eof("expected selector part"));
        };
        match lead.token {
            Token::Dot => Ok(SelectorComponent::Class(self.expect_ident("class name")?)),
            Token::Hash => Ok(SelectorComponent::Id(self.expect_ident("id")?)),
            Token::BracketOpen => {
                let name = self.expect_ident("attribute name")?;
                let value = match self.peek().map(|t| t.token.clone()) {
                    Some(Token::Equals) => {
                        self.advance();
                        let Some(tok) = self.advance() else {
                            return Err(self.eof("expected attribute value"));
                        };
                        match tok.token {
                            Token::StringLiteral | Token::StringLiteralSingle => {
                                Some(tok.text[1..tok.text.len() - 1].to_owned())
                            }
                            Token::Ident | Token::Number => Some(tok.text),
                            _ => {
                                return Err(self.unexpected(
                                    tok.pos,
                                    format!("expected attribute value, got '{}'", tok.text),
                                ))
                            }
                        }
                    }
                    _ => None,
                };
                match self.advance() {
                    Some(tok) if tok.token == Token::BracketClose => {}
                    Some(tok) => {
                        return Err(self.unexpected(tok.pos, format!("expected ']', got '{}'", tok.text)))
                    }
                    None => return Err(self.eof("expected ']'")),
                }
                Ok(SelectorComponent::Attribute {
                    name: name.to_ascii_lowercase(),
                    value,
                })
            }
            _ => Err(self.unexpected(lead.pos, format!("unexpected '{}'", lead.text))),
        }
    }

    fn expect_ident(&mut self, what: &str) -> Result<String, SelectorError> {
        match self.advance() {
            Some(tok) if tok.token == Token::Ident => Ok(tok.text),
            Some(tok) => Err(self.unexpected(tok.pos, format!("expected {what}, got '{}'", tok.text))),
            None => Err(self.eof(&format!("expected {what}"))),
        }
    }
}

// ---------------------------------------------------------------------------
// Matching
// ---------------------------------------------------------------------------

/// Check whether `node_id` matches a selector, walking combinators right to left.
pub fn matches_selector(selector: &Selector, node_id: NodeId, dom: &Dom) -> bool {
    let parts = &selector.parts;
    let Some(SelectorPart::Compound(last)) = parts.last() else {
        return false;
    };
    if !dom.get(node_id).is_some_and(|node| matches_compound(last, node)) {
        return false;
    }

    let mut part_idx = parts.len() - 1;
    let mut current_node = node_id;

    while part_idx > 0 {
        let SelectorPart::Combinator(combinator) = &parts[part_idx - 1] else {
            return false;
        };
        if part_idx < 2 {
            return false;
        }
        let SelectorPart::Compound(compound) = &parts[part_idx - 2] else {
            return false;
        };
        part_idx -= 2;

        match combinator {
            Combinator::Child => {
                let Some(parent_id) = dom.parent(current_node) else {
                    return false;
                };
                if !dom.get(parent_id).is_some_and(|p| matches_compound(compound, p)) {
                    return false;
                }
                current_node = parent_id;
            }
            Combinator::Descendant => {
                let found = dom.ancestors(current_node).into_iter().find(|&ancestor| {
                    dom.get(ancestor)
                        .is_some_and(|data| matches_compound(compound, data))
                });
                match found {
                    Some(ancestor) => current_node = ancestor,
                    None => return false,
                }
            }
        }
    }

    true
}

/// Check whether a compound selector matches a single node's data.
fn matches_compound(compound: &CompoundSelector, node: &NodeData) -> bool {
    node.is_element()
        && compound.components.iter().all(|component| match component {
            SelectorComponent::Type(name) => node.tag == *name,
            SelectorComponent::Class(name) => node.has_class(name),
            SelectorComponent::Id(name) => node.id() == Some(name.as_str()),
            SelectorComponent::Universal => true,
            SelectorComponent::Attribute { name, value } => match (node.attribute(name), value) {
                (Some(actual), Some(expected)) => actual == expected,
                (Some(_), None) => true,
                (None, _) => false,
            },
        })
}
