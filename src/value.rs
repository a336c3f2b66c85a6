//! Value Model for the Lycoris Language
//!
//! Lycoris values are a closed tagged union: rationals, strings, booleans,
//! nil, and vectors. Vectors are homoiconic, so a vector element may also be
//! a word reference; word references only ever live inside token streams and
//! vectors, never as a top-level stack value.
//!
//! `Display` renders the canonical textual form, which round-trips through
//! the tokenizer and is the format stored for user-word bodies.

use std::fmt;

use crate::rational::Rational;

/// How a word reference is applied to the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Plain application at the stack top.
    Local,
    /// `@word`: apply once per element of a vector, collecting results.
    Map,
    /// `*word`: fold a vector left-to-right with a binary word.
    Reduce,
    /// `#word`: apply to the entire stack gathered into one vector.
    Global,
}

impl Scope {
    /// The prefix character in source form, empty for local application.
    pub fn symbol(&self) -> &'static str {
        match self {
            Scope::Local => "",
            Scope::Map => "@",
            Scope::Reduce => "*",
            Scope::Global => "#",
        }
    }
}

/// A Lycoris value.
///
/// The first five variants are the public value model and the only things
/// that may rest on the stack. `Word` is the homoiconic code kind: it
/// appears in token streams and inside vectors, and is executed rather than
/// pushed whenever the evaluator encounters it bare.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Rational(Rational),
    String(String),
    Boolean(bool),
    Nil,
    Vector(Vec<Value>),
    Word(Scope, String),
}

impl Value {
    /// The type name used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Rational(_) => "rational",
            Value::String(_) => "string",
            Value::Boolean(_) => "boolean",
            Value::Nil => "nil",
            Value::Vector(_) => "vector",
            Value::Word(_, _) => "word",
        }
    }

    /// Whether this value may be pushed onto the stack as data.
    ///
    /// Everything except a bare word reference qualifies.
    pub fn is_data(&self) -> bool {
        !matches!(self, Value::Word(_, _))
    }
}

impl fmt::Display for Value {
    /// Canonical textual form.
    ///
    /// - integers as decimal digits, other rationals as `num/den`
    /// - strings single-quoted, content verbatim
    /// - `true` / `false` / `nil`
    /// - vectors as `[` + space-joined elements + `]`
    /// - word references as the scope symbol followed by the name
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Rational(r) => write!(f, "{}", r),
            Value::String(s) => write!(f, "'{}'", s),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Nil => write!(f, "nil"),
            Value::Vector(elements) => {
                write!(f, "[")?;
                for (i, element) in elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", element)?;
                }
                write!(f, "]")
            }
            Value::Word(scope, name) => write!(f, "{}{}", scope.symbol(), name),
        }
    }
}
