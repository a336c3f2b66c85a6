//! Error Handling for the Lycoris Language Runtime
//!
//! This module defines the error system used throughout the Lycoris tokenizer,
//! dictionary, and evaluator. Every fallible operation in the runtime returns
//! a typed error from this module; nothing is retried internally and nothing
//! panics.
//!
//! ## Error Categories
//!
//! ### Lexical Errors
//! - **`SyntaxError`**: malformed tokens, unterminated strings, unmatched
//!   brackets, ill-formed guard clauses. Carries the byte offset where known.
//!
//! ### Evaluation Errors
//! - **`UnknownWord`**: a word reference that is not in the dictionary
//! - **`TypeError`**: operand type mismatches
//! - **`ArityError`**: stack underflow, or the wrong number of results under
//!   a scope modifier
//! - **`IndexError`**: vector index out of range
//! - **`DomainError`**: operations outside their mathematical domain
//! - **`DivisionByZero`**: division or modulus by zero
//! - **`LimitExceeded`**: exponent magnitude or recursion depth bounds
//!
//! ### Dictionary Errors
//! - **`NameConflict`**, **`ProtectedBuiltin`**, **`InvalidName`**,
//!   **`NotFound`**: definition and removal of user words
//!
//! ### State Errors
//! - **`CorruptState`**: a persisted dictionary entry that no longer parses
//! - **`OutOfMemory`**: the host refused an allocation
//!
//! ## Error Flow
//!
//! Errors propagate through the runtime using Rust's `Result` type:
//! ```text
//! Source Code → Tokenizer → Evaluator → Output
//!      |            |           |
//!  SyntaxError  SyntaxError  runtime errors
//! ```
//!
//! The evaluator rolls the stack and dictionary back to the state they held
//! before the failing token, appends the error description to the output
//! buffer, and returns the error to the caller.

use std::collections::TryReserveError;
use std::error::Error;
use std::fmt;

/// Comprehensive error type for all Lycoris runtime operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LycorisError {
    /// Tokenization failure: unknown token, unterminated string, unmatched
    /// bracket, or an ill-formed guard clause.
    SyntaxError(String),

    /// A word reference whose name is not bound in the dictionary.
    UnknownWord(String),

    /// Operand type mismatch.
    ///
    /// # Examples
    /// - `add expects a rational, got string`
    /// - `run expects a vector, got nil`
    TypeError(String),

    /// Stack underflow, or a scope-modified word that did not reduce its
    /// per-element stack to exactly one value.
    ArityError(String),

    /// Vector index out of range (after negative-index adjustment).
    IndexError(String),

    /// Domain violation: modulus of non-integers, fractional exponent,
    /// reduce over an empty vector, and similar.
    DomainError(String),

    /// Division or modulus with a zero divisor.
    DivisionByZero,

    /// A configured resource bound was hit: power exponent magnitude or
    /// evaluation nesting depth.
    LimitExceeded(String),

    /// Attempt to define a word whose name is already taken by a built-in.
    NameConflict(String),

    /// Attempt to remove a built-in word.
    ProtectedBuiltin(String),

    /// A user word name that collides with number, literal, or delimiter
    /// syntax, or is empty.
    InvalidName(String),

    /// A dictionary name that is not present.
    NotFound(String),

    /// A persisted dictionary entry whose body no longer tokenizes, or a
    /// state blob that is not valid JSON.
    CorruptState(String),

    /// The host refused an allocation.
    OutOfMemory,
}

impl fmt::Display for LycorisError {
    /// Formats the error for user display.
    ///
    /// These strings are what the evaluator appends to the output buffer on
    /// failure, so they are phrased for the person typing Lycoris source.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LycorisError::SyntaxError(msg) => write!(f, "SyntaxError: {}", msg),
            LycorisError::UnknownWord(name) => write!(f, "UnknownWord: {}", name),
            LycorisError::TypeError(msg) => write!(f, "TypeError: {}", msg),
            LycorisError::ArityError(msg) => write!(f, "ArityError: {}", msg),
            LycorisError::IndexError(msg) => write!(f, "IndexError: {}", msg),
            LycorisError::DomainError(msg) => write!(f, "DomainError: {}", msg),
            LycorisError::DivisionByZero => write!(f, "DomainError: division by zero"),
            LycorisError::LimitExceeded(msg) => write!(f, "LimitExceeded: {}", msg),
            LycorisError::NameConflict(name) => {
                write!(f, "NameConflict: '{}' is a built-in word", name)
            }
            LycorisError::ProtectedBuiltin(name) => {
                write!(f, "ProtectedBuiltin: '{}' cannot be removed", name)
            }
            LycorisError::InvalidName(msg) => write!(f, "InvalidName: {}", msg),
            LycorisError::NotFound(name) => write!(f, "NotFound: {}", name),
            LycorisError::CorruptState(msg) => write!(f, "CorruptState: {}", msg),
            LycorisError::OutOfMemory => write!(f, "OutOfMemory: allocation failed"),
        }
    }
}

impl Error for LycorisError {}

/// Automatic conversion from a refused reservation to `OutOfMemory`.
///
/// Bulk growth points in the evaluator reserve through `try_reserve`, so a
/// host that rejects the allocation surfaces here instead of aborting.
impl From<TryReserveError> for LycorisError {
    fn from(_err: TryReserveError) -> Self {
        LycorisError::OutOfMemory
    }
}

/// Convenience type alias for Results that can contain LycorisErrors.
///
/// Most runtime functions return `Result<T>` instead of the more verbose
/// `std::result::Result<T, LycorisError>`.
pub type Result<T> = std::result::Result<T, LycorisError>;
