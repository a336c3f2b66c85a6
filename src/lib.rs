//! Lycoris - A Concatenative Language with Exact Rational Arithmetic
//!
//! Lycoris is a small stack-based, postfix language with a homoiconic vector
//! data model: vectors are both data and suspended code, and only the `run`
//! word (or a scope modifier) executes them. All arithmetic is exact, backed
//! by arbitrary-precision rationals; the runtime never touches a float.
//!
//! This crate is the complete language runtime. Hosts embed it through the
//! [`Interpreter`] type:
//!
//! ```
//! use lycoris::Interpreter;
//!
//! let mut interp = Interpreter::new();
//! interp.execute("[dup mul] 'square' def").unwrap();
//! interp.execute("7 square print").unwrap();
//! assert_eq!(interp.output_buffer(), "49\n");
//! ```
//!
//! ## Architecture Overview
//!
//! - **lexer**: dictionary-driven longest-match tokenizer; tokens are
//!   finished values
//! - **rational**: exact arithmetic over arbitrary-precision integers
//! - **value**: the five-variant value model and its canonical text form
//! - **dictionary**: trie-backed word storage with longest-prefix lookup
//! - **builtin**: the seeded standard vocabulary
//! - **interpreter**: the stack machine, scope dispatch, and guard clauses
//! - **state**: save/restore of the user dictionary as source-form JSON
//! - **error**: the typed error surface shared by all of the above
//!
//! The evaluator is synchronous and single-threaded; hosts that need
//! timeouts or background execution run one interpreter per worker and
//! replace it on timeout.

pub mod builtin;
pub mod dictionary;
pub mod error;
pub mod interpreter;
pub mod lexer;
pub mod rational;
pub mod state;
pub mod value;

pub use error::{LycorisError, Result};
pub use interpreter::{Interpreter, Limits};
pub use rational::Rational;
pub use state::SavedWord;
pub use value::{Scope, Value};
