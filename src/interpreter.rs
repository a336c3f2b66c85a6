//! Evaluation Engine for the Lycoris Language
//!
//! This module implements the stack machine that executes Lycoris token
//! streams. The interpreter owns all the runtime state: the value stack, the
//! word dictionary, and the captured output buffer.
//!
//! ## Execution Model
//!
//! Tokens are pulled from the lexer one at a time and applied in order:
//! literals push themselves, word references execute through the dictionary.
//! Vectors push whole; only `run` (or a scope modifier) turns a vector back
//! into code.
//!
//! ## Scope Dispatch
//!
//! A word reference carries how it is applied:
//! - **local** (no prefix): execute once against the stack top
//! - **map** (`@`): take the topmost vector; for each element, run the word
//!   on a private stack seeded with the element and copies of the values
//!   that were above the vector; collect the single results into a new
//!   vector
//! - **reduce** (`*`): fold a non-empty vector left-to-right with a binary
//!   word
//! - **global** (`#`): gather the entire stack into one vector and run the
//!   word on it
//!
//! ## Guard Clauses
//!
//! A top-level source of the form `cond : body : ... : default` is a
//! conditional. Each condition is evaluated speculatively; the evaluator
//! runs it, inspects the top of the stack, and rolls the whole state back
//! before deciding. The first condition that left `true` on top has its body
//! executed for real and everything after that body is skipped unread.
//!
//! ## Error Recovery
//!
//! Every token either succeeds or fails with a typed error. On failure the
//! stack and dictionary are rolled back to their state just before the
//! failing token, the error description is appended to the output buffer,
//! and the error is returned. Effects of earlier tokens in the same call are
//! kept.

use std::mem;

use log::{debug, trace};

use crate::builtin;
use crate::dictionary::{Binding, Dictionary};
use crate::error::{LycorisError, Result};
use crate::lexer::{Lexer, Token};
use crate::rational::{Rational, DEFAULT_MAX_EXPONENT};
use crate::state::{self, SavedWord};
use crate::value::{Scope, Value};

/// Resource bounds the evaluator enforces on itself.
#[derive(Debug, Clone, Copy)]
pub struct Limits {
    /// Upper bound on the absolute value of a power exponent.
    pub max_exponent: u32,
    /// Upper bound on evaluation nesting (`run` inside `run`, user words
    /// invoking user words, scope modifiers).
    pub max_depth: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_exponent: DEFAULT_MAX_EXPONENT,
            max_depth: 1024,
        }
    }
}

/// Display colors assigned to user words, cycled in definition order.
const WORD_COLORS: &[&str] = &[
    "#e06c75", "#61afef", "#98c379", "#e5c07b", "#c678dd", "#56b6c2", "#d19a66", "#abb2bf",
];

/// The Lycoris evaluator: stack, dictionary, and output buffer.
///
/// Strictly single-threaded and synchronous. One `execute` call runs to
/// completion or to a typed error; there is no cancellation. Hosts that need
/// timeouts run the interpreter in a disposable context and replace it.
pub struct Interpreter {
    stack: Vec<Value>,
    dictionary: Dictionary,
    output: String,
    limits: Limits,
    depth: usize,
    color_cursor: usize,
}

impl Interpreter {
    /// Creates an evaluator with a fresh stack, the built-in words seeded,
    /// and an empty output buffer.
    pub fn new() -> Self {
        Self::with_limits(Limits::default())
    }

    /// Creates an evaluator with explicit resource bounds.
    pub fn with_limits(limits: Limits) -> Self {
        let mut dictionary = Dictionary::new();
        builtin::install(&mut dictionary);
        Self {
            stack: Vec::new(),
            dictionary,
            output: String::new(),
            limits,
            depth: 0,
            color_cursor: 0,
        }
    }

    /// Executes a source string against the current state.
    ///
    /// Returns the text appended to the output buffer during this call. On
    /// failure the error description is appended to the output buffer, the
    /// stack and dictionary are rolled back to their state before the
    /// failing token, and the error is returned.
    pub fn execute(&mut self, source: &str) -> Result<String> {
        debug!("executing {} bytes of source", source.len());
        let mark = self.output.len();
        match self.execute_source(source) {
            Ok(()) => Ok(self.output[mark..].to_string()),
            Err(error) => {
                self.output.push_str(&error.to_string());
                self.output.push('\n');
                Err(error)
            }
        }
    }

    /// The stack as canonical value strings, bottom to top.
    pub fn stack_snapshot(&self) -> Vec<String> {
        self.stack.iter().map(|value| value.to_string()).collect()
    }

    /// The user dictionary as (name, body source, color) entries in
    /// insertion order.
    pub fn dictionary_snapshot(&self) -> Vec<SavedWord> {
        self.dictionary
            .user_entries()
            .map(|(name, word)| SavedWord {
                name: name.to_string(),
                body: word.source.clone(),
                color: word.color.clone(),
            })
            .collect()
    }

    /// The accumulated output text. Reading does not clear it.
    pub fn output_buffer(&self) -> &str {
        &self.output
    }

    /// Serializes the user dictionary to a JSON blob.
    pub fn save_state(&self) -> Result<String> {
        state::save(self)
    }

    /// Restores user words from a blob produced by [`Interpreter::save_state`].
    ///
    /// Returns one message per entry that could not be restored; entries
    /// after a corrupt one still install.
    pub fn load_state(&mut self, blob: &str) -> Result<Vec<String>> {
        state::load(self, blob)
    }

    /// Drops the stack, the user words, and the output buffer. Built-ins
    /// stay seeded.
    pub fn reset(&mut self) {
        self.stack.clear();
        self.dictionary.clear_user_entries();
        self.output.clear();
        self.depth = 0;
        self.color_cursor = 0;
    }

    // === EXECUTION CORE ===

    /// Runs a full source string, handling the guard-clause form.
    fn execute_source(&mut self, source: &str) -> Result<()> {
        self.depth = 0;
        let mut lexer = Lexer::new(source);
        // A guard condition is evaluated speculatively: it runs against the
        // real state, and these snapshots undo it once its verdict is read.
        let origin_stack = self.stack.clone();
        let origin_dictionary = self.dictionary.clone();
        let origin_output = self.output.len();
        loop {
            let token = match lexer.next_token(&self.dictionary)? {
                Some(token) => token,
                // Plain program, or the default clause, ran to completion.
                None => return Ok(()),
            };
            match token {
                Token::Literal(value) => self.apply_checked(&value)?,
                Token::Guard => {
                    let matched = self.stack.last() == Some(&Value::Boolean(true));
                    self.stack = origin_stack.clone();
                    self.dictionary = origin_dictionary.clone();
                    self.output.truncate(origin_output);
                    if matched {
                        return self.run_guard_body(&mut lexer);
                    }
                    self.skip_guard_body(&mut lexer)?;
                }
            }
        }
    }

    /// Executes a matched guard body up to its closing `:`. Everything
    /// after that separator is skipped without being tokenized.
    fn run_guard_body(&mut self, lexer: &mut Lexer) -> Result<()> {
        loop {
            match lexer.next_token(&self.dictionary)? {
                Some(Token::Literal(value)) => self.apply_checked(&value)?,
                Some(Token::Guard) => return Ok(()),
                None => {
                    return Err(LycorisError::SyntaxError(
                        "guard clause missing ':' terminator".to_string(),
                    ))
                }
            }
        }
    }

    /// Tokenizes past an unmatched guard body without executing it.
    fn skip_guard_body(&mut self, lexer: &mut Lexer) -> Result<()> {
        loop {
            match lexer.next_token(&self.dictionary)? {
                Some(Token::Literal(_)) => {}
                Some(Token::Guard) => return Ok(()),
                None => {
                    return Err(LycorisError::SyntaxError(
                        "guard clause missing ':' terminator".to_string(),
                    ))
                }
            }
        }
    }

    /// Applies one top-level token with rollback: if it fails, the stack
    /// and dictionary return to their state before the token.
    fn apply_checked(&mut self, value: &Value) -> Result<()> {
        trace!("token {}", value);
        let saved_stack = self.stack.clone();
        let saved_dictionary = match value {
            Value::Word(_, _) => Some(self.dictionary.clone()),
            _ => None,
        };
        match self.apply(value) {
            Ok(()) => Ok(()),
            Err(error) => {
                self.stack = saved_stack;
                if let Some(dictionary) = saved_dictionary {
                    self.dictionary = dictionary;
                }
                Err(error)
            }
        }
    }

    /// Applies one token: data pushes, word references execute.
    fn apply(&mut self, value: &Value) -> Result<()> {
        match value {
            Value::Word(scope, name) => self.execute_word(*scope, name),
            data => self.push(data.clone()),
        }
    }

    /// Dispatches a word reference by its scope.
    fn execute_word(&mut self, scope: Scope, name: &str) -> Result<()> {
        if self.dictionary.lookup(name).is_none() {
            return Err(LycorisError::UnknownWord(name.to_string()));
        }
        match scope {
            Scope::Local => self.run_local(name),
            Scope::Map => self.map_word(name),
            Scope::Reduce => self.reduce_word(name),
            Scope::Global => self.global_word(name),
        }
    }

    /// Executes a word once against the current stack.
    fn run_local(&mut self, name: &str) -> Result<()> {
        let binding = match self.dictionary.lookup(name) {
            Some(binding) => binding,
            None => return Err(LycorisError::UnknownWord(name.to_string())),
        };
        match binding {
            Binding::Builtin(operation) => {
                let operation = *operation;
                operation(self)
            }
            Binding::User(word) => {
                let body = word.body.clone();
                self.run_body(&body)
            }
        }
    }

    /// Executes a vector body element by element, one nesting level deeper.
    /// Used by user words, the `run` word, and nothing else.
    pub(crate) fn run_body(&mut self, body: &[Value]) -> Result<()> {
        self.descend()?;
        let result = self.run_elements(body);
        self.depth -= 1;
        result
    }

    fn run_elements(&mut self, body: &[Value]) -> Result<()> {
        for value in body {
            self.apply(value)?;
        }
        Ok(())
    }

    /// Maps a word over the topmost vector.
    ///
    /// Values sitting above the vector are held and copied into each
    /// element's private stack, so `[1 2 3] 2 @mul` runs `1 2 mul`,
    /// `2 2 mul`, `3 2 mul` and pushes `[2 4 6]`. Each run must leave
    /// exactly one value.
    fn map_word(&mut self, name: &str) -> Result<()> {
        let vector_position = match self
            .stack
            .iter()
            .rposition(|value| matches!(value, Value::Vector(_)))
        {
            Some(position) => position,
            None => {
                return Err(LycorisError::TypeError(format!(
                    "@{} requires a vector on the stack",
                    name
                )))
            }
        };
        let Value::Vector(elements) = self.stack.remove(vector_position) else {
            return Err(LycorisError::TypeError(format!(
                "@{} requires a vector on the stack",
                name
            )));
        };
        let held = self.stack.split_off(vector_position);
        let mut results = Vec::new();
        results.try_reserve(elements.len())?;
        self.descend()?;
        let outcome = self.map_elements(name, &elements, &held, &mut results);
        self.depth -= 1;
        outcome?;
        self.push(Value::Vector(results))
    }

    fn map_elements(
        &mut self,
        name: &str,
        elements: &[Value],
        held: &[Value],
        results: &mut Vec<Value>,
    ) -> Result<()> {
        for element in elements {
            if !element.is_data() {
                return Err(LycorisError::TypeError(format!(
                    "@{} cannot map over the word reference {}",
                    name, element
                )));
            }
            let mut local = Vec::new();
            local.try_reserve(held.len() + 1)?;
            local.push(element.clone());
            local.extend(held.iter().cloned());
            let saved = mem::replace(&mut self.stack, local);
            let result = self.run_local(name);
            let local = mem::replace(&mut self.stack, saved);
            result?;
            let value = single_result(local).ok_or_else(|| {
                LycorisError::ArityError(format!(
                    "@{} must leave exactly one value per element",
                    name
                ))
            })?;
            results.push(value);
        }
        Ok(())
    }

    /// Folds a non-empty vector left-to-right with a binary word.
    fn reduce_word(&mut self, name: &str) -> Result<()> {
        let elements = self.pop_vector(&format!("*{}", name))?;
        let mut iterator = elements.into_iter();
        let Some(mut seed) = iterator.next() else {
            return Err(LycorisError::DomainError(format!(
                "*{} cannot reduce an empty vector",
                name
            )));
        };
        if !seed.is_data() {
            return Err(LycorisError::TypeError(format!(
                "*{} cannot fold the word reference {}",
                name, seed
            )));
        }
        self.descend()?;
        let outcome = self.reduce_elements(name, &mut seed, iterator);
        self.depth -= 1;
        outcome?;
        self.push(seed)
    }

    fn reduce_elements(
        &mut self,
        name: &str,
        seed: &mut Value,
        elements: std::vec::IntoIter<Value>,
    ) -> Result<()> {
        for element in elements {
            if !element.is_data() {
                return Err(LycorisError::TypeError(format!(
                    "*{} cannot fold the word reference {}",
                    name, element
                )));
            }
            let mut local = Vec::new();
            local.try_reserve(2)?;
            local.push(mem::replace(seed, Value::Nil));
            local.push(element);
            let saved = mem::replace(&mut self.stack, local);
            let result = self.run_local(name);
            let local = mem::replace(&mut self.stack, saved);
            result?;
            *seed = single_result(local).ok_or_else(|| {
                LycorisError::ArityError(format!(
                    "*{} must be a binary word leaving exactly one value",
                    name
                ))
            })?;
        }
        Ok(())
    }

    /// Gathers the entire stack into one vector and runs the word on it.
    fn global_word(&mut self, name: &str) -> Result<()> {
        let whole = mem::take(&mut self.stack);
        self.push(Value::Vector(whole))?;
        self.descend()?;
        let result = self.run_local(name);
        self.depth -= 1;
        result
    }

    fn descend(&mut self) -> Result<()> {
        if self.depth >= self.limits.max_depth {
            return Err(LycorisError::LimitExceeded(format!(
                "evaluation nesting exceeds the depth limit of {}",
                self.limits.max_depth
            )));
        }
        self.depth += 1;
        Ok(())
    }

    // === HELPERS FOR BUILT-IN WORDS ===

    pub(crate) fn push(&mut self, value: Value) -> Result<()> {
        self.stack.try_reserve(1)?;
        self.stack.push(value);
        Ok(())
    }

    pub(crate) fn pop(&mut self, word: &str) -> Result<Value> {
        self.stack.pop().ok_or_else(|| {
            LycorisError::ArityError(format!("{} needs a value but the stack is empty", word))
        })
    }

    pub(crate) fn pop_rational(&mut self, word: &str) -> Result<Rational> {
        match self.pop(word)? {
            Value::Rational(value) => Ok(value),
            other => Err(LycorisError::TypeError(format!(
                "{} expects a rational, got {}",
                word,
                other.type_name()
            ))),
        }
    }

    pub(crate) fn pop_vector(&mut self, word: &str) -> Result<Vec<Value>> {
        match self.pop(word)? {
            Value::Vector(elements) => Ok(elements),
            other => Err(LycorisError::TypeError(format!(
                "{} expects a vector, got {}",
                word,
                other.type_name()
            ))),
        }
    }

    pub(crate) fn pop_string(&mut self, word: &str) -> Result<String> {
        match self.pop(word)? {
            Value::String(text) => Ok(text),
            other => Err(LycorisError::TypeError(format!(
                "{} expects a string, got {}",
                word,
                other.type_name()
            ))),
        }
    }

    pub(crate) fn pop_boolean(&mut self, word: &str) -> Result<bool> {
        match self.pop(word)? {
            Value::Boolean(value) => Ok(value),
            other => Err(LycorisError::TypeError(format!(
                "{} expects a boolean, got {}",
                word,
                other.type_name()
            ))),
        }
    }

    /// Pops an integer that fits a machine word, for indices and counts.
    pub(crate) fn pop_integer(&mut self, word: &str) -> Result<i64> {
        let value = self.pop_rational(word)?;
        value.to_i64().ok_or_else(|| {
            LycorisError::DomainError(format!("{} expects an integer, got {}", word, value))
        })
    }

    pub(crate) fn stack_len(&self) -> usize {
        self.stack.len()
    }

    /// Removes the top `count` values, returning them in their original
    /// order.
    pub(crate) fn take_top(&mut self, count: usize) -> Result<Vec<Value>> {
        let mut values = Vec::new();
        values.try_reserve(count)?;
        let start = self.stack.len() - count;
        values.extend(self.stack.drain(start..));
        Ok(values)
    }

    pub(crate) fn append_output(&mut self, text: &str) {
        self.output.push_str(text);
    }

    pub(crate) fn clear_output(&mut self) {
        self.output.clear();
    }

    pub(crate) fn max_exponent(&self) -> u32 {
        self.limits.max_exponent
    }

    pub(crate) fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    /// Installs a user word, assigning the next display color.
    pub(crate) fn define_word(&mut self, name: &str, body: Vec<Value>) -> Result<()> {
        let source = canonical_body(&body);
        let color = WORD_COLORS[self.color_cursor % WORD_COLORS.len()];
        self.dictionary.define(name, body, &source, color)?;
        self.color_cursor += 1;
        debug!("defined word '{}'", name);
        Ok(())
    }

    /// Installs a user word with an explicit color, for state restoration.
    pub(crate) fn restore_word(
        &mut self,
        name: &str,
        body: Vec<Value>,
        source: &str,
        color: &str,
    ) -> Result<()> {
        self.dictionary.define(name, body, source, color)
    }

    pub(crate) fn undefine_word(&mut self, name: &str) -> Result<()> {
        self.dictionary.undefine(name)
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

/// The single value of a one-value stack, or `None`.
fn single_result(mut local: Vec<Value>) -> Option<Value> {
    if local.len() == 1 {
        local.pop()
    } else {
        None
    }
}

/// Canonical source text of a word body: space-joined element forms.
pub(crate) fn canonical_body(body: &[Value]) -> String {
    body.iter()
        .map(|value| value.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}
