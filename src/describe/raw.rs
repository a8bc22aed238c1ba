//! Raw backend type expressions.
//!
//! A raw type is the unresolved type reference as the backend declares it:
//! `Shop.Item`, `List<Shop.Item>`, `Dictionary<int, string[]>`, `int?`.
//! Its `Display` form is the type's identity in the discovery table.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CompileError;

/// An unresolved backend type reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum RawType {
    /// No value (`void`), also used for absent response or parameter types.
    #[default]
    Void,
    /// A named type with optional generic arguments.
    Named { name: String, args: Vec<RawType> },
    /// A native array (`T[]`).
    Array(Box<RawType>),
}

impl RawType {
    /// A non-generic named type.
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named {
            name: name.into(),
            args: Vec::new(),
        }
    }

    /// A generic named type.
    pub fn generic(name: impl Into<String>, args: Vec<RawType>) -> Self {
        Self::Named {
            name: name.into(),
            args,
        }
    }

    /// `Nullable<T>`, which is what `T?` parses to.
    pub fn nullable(inner: RawType) -> Self {
        Self::generic("Nullable", vec![inner])
    }

    pub fn is_void(&self) -> bool {
        matches!(self, Self::Void)
    }

    /// Replace generic parameter references with concrete arguments.
    ///
    /// `params` and `args` are matched by position; references to unknown
    /// parameters are left untouched.
    pub fn substitute(&self, params: &[String], args: &[RawType]) -> RawType {
        match self {
            Self::Void => Self::Void,
            Self::Array(inner) => Self::Array(Box::new(inner.substitute(params, args))),
            Self::Named { name, args: own } if own.is_empty() => params
                .iter()
                .position(|p| p == name)
                .and_then(|i| args.get(i))
                .cloned()
                .unwrap_or_else(|| self.clone()),
            Self::Named { name, args: own } => Self::Named {
                name: name.clone(),
                args: own.iter().map(|a| a.substitute(params, args)).collect(),
            },
        }
    }
}

impl fmt::Display for RawType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Void => f.write_str("void"),
            Self::Array(inner) => write!(f, "{inner}[]"),
            Self::Named { name, args } if args.is_empty() => f.write_str(name),
            Self::Named { name, args } => {
                write!(f, "{name}<")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str(">")
            }
        }
    }
}

impl FromStr for RawType {
    type Err = CompileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Ok(Self::Void);
        }
        let mut parser = TypeParser {
            input: s,
            chars: s.chars().collect(),
            pos: 0,
        };
        let ty = parser.parse_type()?;
        parser.skip_ws();
        if parser.pos != parser.chars.len() {
            return Err(parser.error("unexpected trailing input"));
        }
        Ok(ty)
    }
}

impl TryFrom<String> for RawType {
    type Error = CompileError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RawType> for String {
    fn from(value: RawType) -> Self {
        value.to_string()
    }
}

/// Recursive-descent parser for
/// `type := path ('<' type (',' type)* '>')? ('[]' | '?')*`.
struct TypeParser<'a> {
    input: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl TypeParser<'_> {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn error(&self, reason: &str) -> CompileError {
        CompileError::type_syntax(self.input, format!("{reason} at offset {}", self.pos))
    }

    fn parse_type(&mut self) -> Result<RawType, CompileError> {
        self.skip_ws();
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_alphanumeric() || matches!(c, '_' | '.' | '`'))
        {
            self.pos += 1;
        }
        if start == self.pos {
            return Err(self.error("expected a type name"));
        }
        let name: String = self.chars[start..self.pos].iter().collect();

        self.skip_ws();
        let mut args = Vec::new();
        if self.peek() == Some('<') {
            self.pos += 1;
            loop {
                args.push(self.parse_type()?);
                self.skip_ws();
                match self.peek() {
                    Some(',') => self.pos += 1,
                    Some('>') => {
                        self.pos += 1;
                        break;
                    }
                    _ => return Err(self.error("expected ',' or '>'")),
                }
            }
        }

        let mut ty = if name == "void" && args.is_empty() {
            RawType::Void
        } else {
            RawType::Named { name, args }
        };

        loop {
            self.skip_ws();
            match self.peek() {
                Some('[') => {
                    self.pos += 1;
                    self.skip_ws();
                    if self.peek() != Some(']') {
                        return Err(self.error("expected ']'"));
                    }
                    self.pos += 1;
                    ty = RawType::Array(Box::new(ty));
                }
                Some('?') => {
                    self.pos += 1;
                    ty = RawType::nullable(ty);
                }
                _ => break,
            }
        }
        Ok(ty)
    }
}
