// regular expressions over single-character terminals, grammar (EBNF)
// <union> ::= <concat> { '|' <concat> }

// <concat> ::= <repeat> { <repeat> }

// <repeat> ::= <atom> { '*' | '+' | '?' }

// <atom> ::= <char>
// |  '\' <char>                    (escape sequences)
// |  'ε'                           (empty string)
// |  '∅'                           (empty language)
// |  '(' <union> ')'

use std::collections::BTreeSet;
use std::fmt;
use std::iter::{Enumerate, Peekable};
use std::str::Chars;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Regex {
    Empty,
    EmptyString,
    Literal(String),
    Concat(Box<Regex>, Box<Regex>),
    Union(Box<Regex>, Box<Regex>),
    Star(Box<Regex>),
    Plus(Box<Regex>),
    Optional(Box<Regex>),
    Group(Box<Regex>),
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum RegexErrorKind {
    #[error("unmatched parenthesis")]
    UnmatchedParen,
    #[error("unexpected end of input")]
    UnexpectedEnd,
    #[error("unexpected character '{0}'")]
    UnexpectedChar(char),
    #[error("character classes are not supported ('{0}')")]
    UnsupportedClass(char),
}

/// A regex syntax error; `position` counts chars, not bytes.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{kind} at position {position}")]
pub struct RegexError {
    pub kind: RegexErrorKind,
    pub position: usize,
}

impl RegexError {
    fn new(kind: RegexErrorKind, position: usize) -> RegexError {
        RegexError { kind, position }
    }
}

struct Tokens<'a> {
    chars: Peekable<Enumerate<Chars<'a>>>,
    len: usize,
}

impl Tokens<'_> {
    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, c)| *c)
    }

    fn next(&mut self) -> Option<(usize, char)> {
        self.chars.next()
    }

    fn end_of_input(&self) -> RegexError {
        RegexError::new(RegexErrorKind::UnexpectedEnd, self.len)
    }
}

// basic recursive descent parsing
impl Regex {
    fn parse_union(tokens: &mut Tokens) -> Result<Regex, RegexError> {
        let mut regex = Self::parse_concat(tokens)?;
        while tokens.peek() == Some('|') {
            _ = tokens.next();
            let alternate = Self::parse_concat(tokens)?;
            regex = Regex::Union(Box::new(regex), Box::new(alternate));
        }

        Ok(regex)
    }

    fn parse_concat(tokens: &mut Tokens) -> Result<Regex, RegexError> {
        let mut regex = Self::parse_repeat(tokens)?;
        while tokens.peek().is_some_and(|x| x != '|' && x != ')') {
            let factor = Self::parse_repeat(tokens)?;
            regex = Regex::Concat(Box::new(regex), Box::new(factor));
        }

        Ok(regex)
    }

    fn parse_repeat(tokens: &mut Tokens) -> Result<Regex, RegexError> {
        let mut regex = Self::parse_atom(tokens)?;
        while let Some(op) = tokens.peek() {
            regex = match op {
                '*' => Regex::Star(Box::new(regex)),
                '+' => Regex::Plus(Box::new(regex)),
                '?' => Regex::Optional(Box::new(regex)),
                _ => break,
            };
            _ = tokens.next();
        }

        Ok(regex)
    }

    fn escape_codes(code: char) -> char {
        match code {
            'n' => '\n',
            't' => '\t',
            'r' => '\r',
            x => x,
        }
    }

    fn parse_atom(tokens: &mut Tokens) -> Result<Regex, RegexError> {
        let (position, front) = tokens.next().ok_or_else(|| tokens.end_of_input())?;
        match front {
            '\\' => {
                let (at, code) = tokens.next().ok_or_else(|| tokens.end_of_input())?;
                // ε can never be an alphabet symbol
                if code == 'ε' {
                    return Err(RegexError::new(RegexErrorKind::UnexpectedChar(code), at));
                }
                Ok(Regex::Literal(Self::escape_codes(code).to_string()))
            }
            '(' => {
                let inner = Self::parse_union(tokens)?;
                match tokens.next() {
                    Some((_, ')')) => Ok(Regex::Group(Box::new(inner))),
                    // union only stops at ')' or the end of input
                    _ => Err(RegexError::new(RegexErrorKind::UnmatchedParen, position)),
                }
            }
            '[' | ']' | '{' | '}' | '.' => Err(RegexError::new(
                RegexErrorKind::UnsupportedClass(front),
                position,
            )),
            '|' | ')' | '*' | '+' | '?' => Err(RegexError::new(
                RegexErrorKind::UnexpectedChar(front),
                position,
            )),
            'ε' => Ok(Regex::EmptyString),
            '∅' => Ok(Regex::Empty),
            c => Ok(Regex::Literal(c.to_string())),
        }
    }

    pub fn from_str(re_str: &str) -> Result<Regex, RegexError> {
        let mut tokens = Tokens {
            chars: re_str.chars().enumerate().peekable(),
            len: re_str.chars().count(),
        };
        let re = Self::parse_union(&mut tokens)?;
        match tokens.next() {
            None => Ok(re),
            Some((position, ')')) => Err(RegexError::new(RegexErrorKind::UnmatchedParen, position)),
            Some((position, c)) => Err(RegexError::new(RegexErrorKind::UnexpectedChar(c), position)),
        }
    }
}

impl std::str::FromStr for Regex {
    type Err = RegexError;

    fn from_str(s: &str) -> Result<Regex, RegexError> {
        Regex::from_str(s)
    }
}

// simplifying constructors, used when regexes are synthesized from automata
impl Regex {
    pub fn literal(symbol: impl Into<String>) -> Regex {
        Regex::Literal(symbol.into())
    }

    pub fn union(left: Regex, right: Regex) -> Regex {
        match (left, right) {
            (Regex::Empty, x) | (x, Regex::Empty) => x,
            (left, right) if left == right => left,
            (Regex::EmptyString, x) | (x, Regex::EmptyString) => {
                if x.is_nullable() {
                    x
                } else {
                    Regex::Optional(Box::new(x))
                }
            }
            (left, right) => Regex::Union(Box::new(left), Box::new(right)),
        }
    }

    pub fn concat(left: Regex, right: Regex) -> Regex {
        match (left, right) {
            (Regex::Empty, _) | (_, Regex::Empty) => Regex::Empty,
            (Regex::EmptyString, x) | (x, Regex::EmptyString) => x,
            (left, right) => Regex::Concat(Box::new(left), Box::new(right)),
        }
    }

    pub fn star(inner: Regex) -> Regex {
        match inner {
            Regex::Empty | Regex::EmptyString => Regex::EmptyString,
            Regex::Star(_) => inner,
            Regex::Plus(x) | Regex::Optional(x) => Regex::Star(x),
            x => Regex::Star(Box::new(x)),
        }
    }

    /// Whether the empty string is in the language.
    pub fn is_nullable(&self) -> bool {
        match self {
            Regex::Empty | Regex::Literal(_) => false,
            Regex::EmptyString | Regex::Star(_) | Regex::Optional(_) => true,
            Regex::Concat(l, r) => l.is_nullable() && r.is_nullable(),
            Regex::Union(l, r) => l.is_nullable() || r.is_nullable(),
            Regex::Plus(x) | Regex::Group(x) => x.is_nullable(),
        }
    }

    /// Terminals occurring in the expression.
    pub fn alphabet(&self) -> BTreeSet<String> {
        let mut symbols = BTreeSet::new();
        let mut stack = vec![self];
        while let Some(re) = stack.pop() {
            match re {
                Regex::Empty | Regex::EmptyString => {}
                Regex::Literal(symbol) => {
                    symbols.insert(symbol.clone());
                }
                Regex::Concat(l, r) | Regex::Union(l, r) => {
                    stack.push(l);
                    stack.push(r);
                }
                Regex::Star(x) | Regex::Plus(x) | Regex::Optional(x) | Regex::Group(x) => {
                    stack.push(x)
                }
            }
        }
        symbols
    }

    // 0 = union, 1 = concatenation, 2 = postfix operand
    fn fmt_prec(&self, f: &mut fmt::Formatter<'_>, prec: u8) -> fmt::Result {
        let (own, wrap) = match self {
            Regex::Union(..) => (0, prec > 0),
            Regex::Concat(..) => (1, prec > 1),
            Regex::Literal(symbol) if symbol.chars().count() > 1 => (1, prec > 1),
            _ => (2, false),
        };
        if wrap {
            f.write_str("(")?;
        }
        match self {
            Regex::Empty => f.write_str("∅")?,
            Regex::EmptyString => f.write_str("ε")?,
            Regex::Literal(symbol) => {
                if symbol.chars().count() == 1 && "|*+?()[]{}.\\∅".contains(symbol.as_str()) {
                    f.write_str("\\")?;
                }
                f.write_str(symbol)?;
            }
            Regex::Union(l, r) => {
                l.fmt_prec(f, own)?;
                f.write_str("|")?;
                r.fmt_prec(f, own)?;
            }
            Regex::Concat(l, r) => {
                l.fmt_prec(f, own)?;
                r.fmt_prec(f, own)?;
            }
            Regex::Star(x) => {
                x.fmt_prec(f, 2)?;
                f.write_str("*")?;
            }
            Regex::Plus(x) => {
                x.fmt_prec(f, 2)?;
                f.write_str("+")?;
            }
            Regex::Optional(x) => {
                x.fmt_prec(f, 2)?;
                f.write_str("?")?;
            }
            Regex::Group(x) => {
                f.write_str("(")?;
                x.fmt_prec(f, 0)?;
                f.write_str(")")?;
            }
        }
        if wrap {
            f.write_str(")")?;
        }
        Ok(())
    }
}

/// Prints a pattern that parses back to an equivalent regex as long as every
/// literal is a single character. Multi-character literals, as produced by
/// [`crate::to_regex`] over such alphabets, print as plain concatenations and
/// do not round-trip.
impl fmt::Display for Regex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_prec(f, 0)
    }
}
