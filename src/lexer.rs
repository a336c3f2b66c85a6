//! Lexical Analyzer for the Lycoris Language
//!
//! This module converts Lycoris source text into a stream of tokens. There
//! is no separate parse phase: every token the lexer emits is already a
//! finished [`Value`] (or the guard separator), so the evaluator consumes
//! tokens directly.
//!
//! ## Dictionary-Driven Tokenization
//!
//! Word boundaries come from the dictionary, not from whitespace: at each
//! position the lexer asks the dictionary's trie for the longest word
//! starting there. `2add3mul` therefore tokenizes to `2`, `add`, `3`, `mul`.
//! Because `def` can install new words mid-program, the lexer is pulled one
//! token at a time by the evaluator, with the current dictionary passed to
//! every call; a word defined earlier in the same source is visible to every
//! later token scan.
//!
//! ## Recognition Order
//!
//! At every position, in strict priority:
//! 1. Whitespace and `#` line comments are skipped (a `#` immediately
//!    followed by a dictionary word is the global scope prefix instead)
//! 2. String literal `'...'` (verbatim, no escapes)
//! 3. Vector literal `[` ... `]` (recursive)
//! 4. Number: integer, fraction `a/b`, decimal, or scientific; converted
//!    exactly to a rational
//! 5. Reserved literals `true`, `false`, `nil`
//! 6. Guard separator `:`
//! 7. Longest dictionary match, with an optional scope prefix `@` `*` `#`
//!
//! Anything else is a `SyntaxError` carrying the byte offset.

use num_bigint::BigInt;
use num_traits::Zero;

use crate::dictionary::Dictionary;
use crate::error::{LycorisError, Result};
use crate::rational::{Rational, DEFAULT_MAX_EXPONENT};
use crate::value::{Scope, Value};

/// Names that always denote literal values and can never be word names.
pub(crate) const RESERVED_LITERALS: &[&str] = &["true", "false", "nil"];

/// One unit of the token stream.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// A finished value: literals push themselves, word references execute.
    Literal(Value),
    /// The `:` guard-clause separator, handled by the evaluator.
    Guard,
}

/// Incremental tokenizer over a borrowed source string.
///
/// The lexer holds only the source and a byte position; the dictionary is
/// passed to [`Lexer::next_token`] on every call so that definitions made
/// between tokens take effect immediately.
#[derive(Debug, Clone)]
pub struct Lexer<'a> {
    source: &'a str,
    bytes: &'a [u8],
    position: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            bytes: source.as_bytes(),
            position: 0,
        }
    }

    /// Current byte offset into the source.
    pub fn offset(&self) -> usize {
        self.position
    }

    /// Scans and returns the next token, or `None` at end of input.
    ///
    /// # Errors
    /// `SyntaxError` for unterminated strings, unmatched brackets, malformed
    /// numbers, and positions where nothing matches.
    pub fn next_token(&mut self, dictionary: &Dictionary) -> Result<Option<Token>> {
        self.skip_trivia(dictionary);
        let byte = match self.bytes.get(self.position) {
            Some(&b) => b,
            None => return Ok(None),
        };
        if byte == b']' {
            return Err(LycorisError::SyntaxError(format!(
                "unmatched ']' at offset {}",
                self.position
            )));
        }
        if byte == b':' {
            self.position += 1;
            return Ok(Some(Token::Guard));
        }
        let value = self.next_value(dictionary)?;
        Ok(Some(Token::Literal(value)))
    }

    /// Scans one value at the current position (trivia already skipped).
    fn next_value(&mut self, dictionary: &Dictionary) -> Result<Value> {
        match self.bytes[self.position] {
            b'\'' => self.string_literal(),
            b'[' => self.vector_literal(dictionary),
            _ => {
                if let Some(value) = self.number()? {
                    return Ok(value);
                }
                if let Some(value) = self.reserved_literal() {
                    return Ok(value);
                }
                if let Some(value) = self.word_reference(dictionary) {
                    return Ok(value);
                }
                Err(LycorisError::SyntaxError(format!(
                    "unknown token at offset {}",
                    self.position
                )))
            }
        }
    }

    /// Skips whitespace and `#` line comments.
    ///
    /// A `#` is a comment start only when no dictionary word begins right
    /// after it; `#add` is the global-scoped word `add`, while `# note` and
    /// `#!` are comments. The dictionary decides, as it does for all
    /// lexical boundaries.
    fn skip_trivia(&mut self, dictionary: &Dictionary) {
        loop {
            match self.bytes.get(self.position) {
                Some(&(b' ' | b'\t' | b'\n' | b'\r')) => self.position += 1,
                Some(&b'#')
                    if dictionary
                        .longest_prefix(self.bytes, self.position + 1)
                        .is_none() =>
                {
                    while self.bytes.get(self.position).is_some_and(|&b| b != b'\n') {
                        self.position += 1;
                    }
                }
                _ => break,
            }
        }
    }

    /// Scans a `'...'` string literal. The content is taken verbatim; no
    /// escape sequences exist, so a string cannot contain a single quote.
    fn string_literal(&mut self) -> Result<Value> {
        let open = self.position;
        let content_start = open + 1;
        match self.bytes[content_start..].iter().position(|&b| b == b'\'') {
            Some(length) => {
                let content = self.source[content_start..content_start + length].to_string();
                self.position = content_start + length + 1;
                Ok(Value::String(content))
            }
            None => Err(LycorisError::SyntaxError(format!(
                "unterminated string starting at offset {}",
                open
            ))),
        }
    }

    /// Scans a `[` ... `]` vector literal, recursing for nested values.
    fn vector_literal(&mut self, dictionary: &Dictionary) -> Result<Value> {
        let open = self.position;
        self.position += 1;
        let mut elements = Vec::new();
        loop {
            self.skip_trivia(dictionary);
            match self.bytes.get(self.position) {
                None => {
                    return Err(LycorisError::SyntaxError(format!(
                        "unmatched '[' at offset {}",
                        open
                    )))
                }
                Some(&b']') => {
                    self.position += 1;
                    return Ok(Value::Vector(elements));
                }
                Some(&b':') => {
                    return Err(LycorisError::SyntaxError(format!(
                        "guard separator inside vector at offset {}",
                        self.position
                    )))
                }
                Some(_) => {
                    let value = self.next_value(dictionary)?;
                    elements.try_reserve(1)?;
                    elements.push(value);
                }
            }
        }
    }

    /// Attempts to scan a number. Returns `Ok(None)`, with the position
    /// untouched, when the current position does not start a number.
    ///
    /// Forms: `[-+]?digits`, `[-+]?digits/digits` (fraction), and
    /// `[-+]?digits(.digits)?([eE][-+]?digits)?`. A `/`, `.`, or `e` not
    /// followed by the digits its form requires simply ends the number
    /// before it.
    fn number(&mut self) -> Result<Option<Value>> {
        let bytes = self.bytes;
        let mut p = self.position;
        let negative = match bytes.get(p) {
            Some(&b'-') => {
                p += 1;
                true
            }
            Some(&b'+') => {
                p += 1;
                false
            }
            _ => false,
        };
        let int_start = p;
        while bytes.get(p).is_some_and(u8::is_ascii_digit) {
            p += 1;
        }
        if p == int_start {
            return Ok(None);
        }
        let int_digits = &self.source[int_start..p];

        // Fraction literal: digits '/' digits.
        if bytes.get(p) == Some(&b'/') && bytes.get(p + 1).is_some_and(u8::is_ascii_digit) {
            let den_start = p + 1;
            let mut q = den_start;
            while bytes.get(q).is_some_and(u8::is_ascii_digit) {
                q += 1;
            }
            let num = parse_digits(int_digits)?;
            let den = parse_digits(&self.source[den_start..q])?;
            if den.is_zero() {
                return Err(LycorisError::SyntaxError(format!(
                    "zero denominator in fraction at offset {}",
                    self.position
                )));
            }
            let num = if negative { -num } else { num };
            let value = Rational::new(num, den)?;
            self.position = q;
            return Ok(Some(Value::Rational(value)));
        }

        // Decimal part.
        let mut frac_digits = "";
        if bytes.get(p) == Some(&b'.') && bytes.get(p + 1).is_some_and(u8::is_ascii_digit) {
            let frac_start = p + 1;
            let mut q = frac_start;
            while bytes.get(q).is_some_and(u8::is_ascii_digit) {
                q += 1;
            }
            frac_digits = &self.source[frac_start..q];
            p = q;
        }

        // Scientific exponent.
        let mut exponent = 0i32;
        if matches!(bytes.get(p), Some(&(b'e' | b'E'))) {
            let mut q = p + 1;
            let exp_negative = match bytes.get(q) {
                Some(&b'-') => {
                    q += 1;
                    true
                }
                Some(&b'+') => {
                    q += 1;
                    false
                }
                _ => false,
            };
            let exp_start = q;
            while bytes.get(q).is_some_and(u8::is_ascii_digit) {
                q += 1;
            }
            if q > exp_start {
                let digits = &self.source[exp_start..q];
                let magnitude: i32 = digits.parse().map_err(|_| {
                    LycorisError::LimitExceeded(format!(
                        "literal exponent {} exceeds the limit of {}",
                        digits, DEFAULT_MAX_EXPONENT
                    ))
                })?;
                exponent = if exp_negative { -magnitude } else { magnitude };
                p = q;
            }
        }

        let value = Rational::from_decimal_parts(negative, int_digits, frac_digits, exponent)?;
        self.position = p;
        Ok(Some(Value::Rational(value)))
    }

    /// Attempts to scan `true`, `false`, or `nil`.
    fn reserved_literal(&mut self) -> Option<Value> {
        let rest = &self.source[self.position..];
        for &text in RESERVED_LITERALS {
            if rest.starts_with(text) {
                self.position += text.len();
                return Some(match text {
                    "true" => Value::Boolean(true),
                    "false" => Value::Boolean(false),
                    _ => Value::Nil,
                });
            }
        }
        None
    }

    /// Attempts to scan a word reference: an optional scope prefix followed
    /// by the longest dictionary word starting there.
    fn word_reference(&mut self, dictionary: &Dictionary) -> Option<Value> {
        let (scope, start) = match self.bytes.get(self.position) {
            Some(&b'@') => (Scope::Map, self.position + 1),
            Some(&b'*') => (Scope::Reduce, self.position + 1),
            Some(&b'#') => (Scope::Global, self.position + 1),
            _ => (Scope::Local, self.position),
        };
        let length = dictionary.longest_prefix(self.bytes, start)?;
        let name = self.source[start..start + length].to_string();
        self.position = start + length;
        Some(Value::Word(scope, name))
    }
}

fn parse_digits(digits: &str) -> Result<BigInt> {
    BigInt::parse_bytes(digits.as_bytes(), 10).ok_or_else(|| {
        LycorisError::SyntaxError(format!("malformed number literal '{}'", digits))
    })
}

/// Tokenizes a complete source string against a fixed dictionary.
///
/// Used for user-word bodies and tests; interactive evaluation pulls tokens
/// one at a time instead so definitions take effect mid-source.
pub fn tokenize(source: &str, dictionary: &Dictionary) -> Result<Vec<Token>> {
    let mut lexer = Lexer::new(source);
    let mut tokens = Vec::new();
    while let Some(token) = lexer.next_token(dictionary)? {
        tokens.try_reserve(1)?;
        tokens.push(token);
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin;

    fn dict() -> Dictionary {
        let mut dictionary = Dictionary::new();
        builtin::install(&mut dictionary);
        dictionary
    }

    fn values(source: &str) -> Vec<Value> {
        tokenize(source, &dict())
            .unwrap()
            .into_iter()
            .map(|token| match token {
                Token::Literal(value) => value,
                Token::Guard => panic!("unexpected guard token"),
            })
            .collect()
    }

    fn rat(num: i64, den: i64) -> Value {
        Value::Rational(Rational::new(BigInt::from(num), BigInt::from(den)).unwrap())
    }

    #[test]
    fn test_basic_tokens() {
        let tokens = values("5 3 add");
        assert_eq!(
            tokens,
            vec![
                rat(5, 1),
                rat(3, 1),
                Value::Word(Scope::Local, "add".to_string()),
            ]
        );
    }

    #[test]
    fn test_whitespace_is_optional() {
        assert_eq!(
            values("2add3mul"),
            vec![
                rat(2, 1),
                Value::Word(Scope::Local, "add".to_string()),
                rat(3, 1),
                Value::Word(Scope::Local, "mul".to_string()),
            ]
        );
    }

    #[test]
    fn test_number_forms() {
        assert_eq!(values("7"), vec![rat(7, 1)]);
        assert_eq!(values("-7"), vec![rat(-7, 1)]);
        assert_eq!(values("+7"), vec![rat(7, 1)]);
        assert_eq!(values("3/4"), vec![rat(3, 4)]);
        assert_eq!(values("-6/8"), vec![rat(-3, 4)]);
        assert_eq!(values("3.14"), vec![rat(157, 50)]);
        assert_eq!(values("-0.5"), vec![rat(-1, 2)]);
        assert_eq!(values("2.5e-1"), vec![rat(1, 4)]);
        assert_eq!(values("12e2"), vec![rat(1200, 1)]);
    }

    #[test]
    fn test_exact_large_scientific() {
        let tokens = values("1e61");
        match &tokens[0] {
            Value::Rational(r) => {
                let mut expected = String::from("1");
                expected.push_str(&"0".repeat(61));
                assert_eq!(r.to_string(), expected);
            }
            other => panic!("expected rational, got {}", other),
        }
    }

    #[test]
    fn test_zero_denominator_fraction() {
        assert!(matches!(
            tokenize("1/0", &dict()),
            Err(LycorisError::SyntaxError(_))
        ));
    }

    #[test]
    fn test_string_literal() {
        assert_eq!(
            values("'hello world'"),
            vec![Value::String("hello world".to_string())]
        );
        assert_eq!(values("''"), vec![Value::String(String::new())]);
        assert!(matches!(
            tokenize("'oops", &dict()),
            Err(LycorisError::SyntaxError(_))
        ));
    }

    #[test]
    fn test_reserved_literals() {
        assert_eq!(
            values("true false nil"),
            vec![Value::Boolean(true), Value::Boolean(false), Value::Nil]
        );
    }

    #[test]
    fn test_vector_literals() {
        assert_eq!(
            values("[1 2 3]"),
            vec![Value::Vector(vec![rat(1, 1), rat(2, 1), rat(3, 1)])]
        );
        assert_eq!(
            values("[1[2]]"),
            vec![Value::Vector(vec![
                rat(1, 1),
                Value::Vector(vec![rat(2, 1)])
            ])]
        );
        assert_eq!(
            values("[dup mul]"),
            vec![Value::Vector(vec![
                Value::Word(Scope::Local, "dup".to_string()),
                Value::Word(Scope::Local, "mul".to_string()),
            ])]
        );
        assert!(matches!(
            tokenize("[1 2", &dict()),
            Err(LycorisError::SyntaxError(_))
        ));
        assert!(matches!(
            tokenize("1 2]", &dict()),
            Err(LycorisError::SyntaxError(_))
        ));
        assert!(matches!(
            tokenize("[1 : 2]", &dict()),
            Err(LycorisError::SyntaxError(_))
        ));
    }

    #[test]
    fn test_scope_prefixes() {
        assert_eq!(
            values("@mul *add #length"),
            vec![
                Value::Word(Scope::Map, "mul".to_string()),
                Value::Word(Scope::Reduce, "add".to_string()),
                Value::Word(Scope::Global, "length".to_string()),
            ]
        );
    }

    #[test]
    fn test_comments() {
        assert_eq!(values("1 # one : and [some] 'junk'\n2"), vec![rat(1, 1), rat(2, 1)]);
        assert_eq!(values("# only a comment"), vec![]);
        // '#' directly followed by a word is the global scope prefix.
        assert_eq!(
            values("#add"),
            vec![Value::Word(Scope::Global, "add".to_string())]
        );
    }

    #[test]
    fn test_guard_token() {
        let tokens = tokenize("1 : 2 : 3", &dict()).unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Literal(rat(1, 1)),
                Token::Guard,
                Token::Literal(rat(2, 1)),
                Token::Guard,
                Token::Literal(rat(3, 1)),
            ]
        );
    }

    #[test]
    fn test_unknown_token_offset() {
        match tokenize("1 %%", &dict()) {
            Err(LycorisError::SyntaxError(msg)) => {
                assert_eq!(msg, "unknown token at offset 2");
            }
            other => panic!("expected syntax error, got {:?}", other),
        }
    }

    #[test]
    fn test_canonical_round_trip() {
        let dictionary = dict();
        for source in ["42", "-42", "22/7", "'text'", "true", "nil", "[1 [2 nil] 'x']"] {
            let mut first = tokenize(source, &dictionary).unwrap();
            assert_eq!(first.len(), 1, "{:?}", source);
            let value = match first.remove(0) {
                Token::Literal(value) => value,
                Token::Guard => panic!("unexpected guard"),
            };
            let reparsed = tokenize(&value.to_string(), &dictionary).unwrap();
            assert_eq!(reparsed, vec![Token::Literal(value)]);
        }
    }
}
