//! Persisted Interpreter State
//!
//! Only the user dictionary is persisted: built-ins are reseeded by
//! construction and the stack is deliberately transient. Each entry is
//! stored as its *source form* (the body's canonical text) rather than any
//! internal structure, so saved state survives evaluator changes.
//!
//! The blob is a JSON array of `{name, body, color}` objects, in dictionary
//! insertion order; bodies may therefore reference words restored earlier in
//! the same blob. Where the blob is stored is the host's business.
//!
//! Restoration is per-entry: a corrupt entry is skipped and reported while
//! the remaining entries still install.

use serde::{Deserialize, Serialize};

use crate::error::{LycorisError, Result};
use crate::interpreter::Interpreter;
use crate::lexer::{self, Token};
use crate::value::Value;

/// One persisted dictionary entry.
///
/// Also the shape returned by [`Interpreter::dictionary_snapshot`], since a
/// snapshot and a saved entry carry exactly the same information.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedWord {
    pub name: String,
    /// Canonical source text of the body, without the enclosing brackets.
    pub body: String,
    /// Display color as a `#rrggbb` string.
    pub color: String,
}

/// Serializes the user dictionary to a JSON blob.
pub(crate) fn save(interp: &Interpreter) -> Result<String> {
    let words = interp.dictionary_snapshot();
    serde_json::to_string_pretty(&words)
        .map_err(|error| LycorisError::CorruptState(format!("serialization failed: {}", error)))
}

/// Restores user words from a blob produced by [`save`].
///
/// Returns one message per entry that failed; later entries still install.
///
/// # Errors
/// `CorruptState` if the blob as a whole is not valid JSON.
pub(crate) fn load(interp: &mut Interpreter, blob: &str) -> Result<Vec<String>> {
    let words: Vec<SavedWord> = serde_json::from_str(blob).map_err(|error| {
        LycorisError::CorruptState(format!("state blob is not valid JSON: {}", error))
    })?;
    let mut failures = Vec::new();
    for word in words {
        if let Err(error) = restore(interp, &word) {
            failures.push(format!("{}: {}", word.name, error));
        }
    }
    Ok(failures)
}

/// Re-tokenizes one entry's body and installs it with its saved color.
fn restore(interp: &mut Interpreter, word: &SavedWord) -> Result<()> {
    let tokens = lexer::tokenize(&word.body, interp.dictionary())
        .map_err(|error| LycorisError::CorruptState(format!("body does not tokenize: {}", error)))?;
    let mut body: Vec<Value> = Vec::new();
    body.try_reserve(tokens.len())?;
    for token in tokens {
        match token {
            Token::Literal(value) => body.push(value),
            Token::Guard => {
                return Err(LycorisError::CorruptState(
                    "guard separator in word body".to_string(),
                ))
            }
        }
    }
    interp
        .restore_word(&word.name, body, &word.body, &word.color)
        .map_err(|error| LycorisError::CorruptState(format!("failed to install: {}", error)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let mut source = Interpreter::new();
        source
            .execute("[dup mul] 'square' def [square square] 'fourth' def")
            .unwrap();
        let blob = source.save_state().unwrap();

        let mut target = Interpreter::new();
        let failures = target.load_state(&blob).unwrap();
        assert!(failures.is_empty());
        assert_eq!(target.dictionary_snapshot(), source.dictionary_snapshot());

        target.execute("3 fourth").unwrap();
        assert_eq!(target.stack_snapshot(), vec!["81"]);
    }

    #[test]
    fn test_stack_and_output_are_not_persisted() {
        let mut source = Interpreter::new();
        source.execute("1 2 3 'hello' print").unwrap();
        let blob = source.save_state().unwrap();
        assert_eq!(blob, "[]");
    }

    #[test]
    fn test_corrupt_entry_is_skipped() {
        let blob = r##"[
            {"name": "good", "body": "1 add", "color": "#e06c75"},
            {"name": "broken", "body": "[1 2", "color": "#61afef"},
            {"name": "also-good", "body": "good good", "color": "#98c379"}
        ]"##;
        let mut interp = Interpreter::new();
        let failures = interp.load_state(blob).unwrap();
        assert_eq!(failures.len(), 1);
        assert!(failures[0].starts_with("broken:"));
        let names: Vec<String> = interp
            .dictionary_snapshot()
            .into_iter()
            .map(|word| word.name)
            .collect();
        assert_eq!(names, vec!["good", "also-good"]);
    }

    #[test]
    fn test_colliding_entry_is_reported_as_corrupt() {
        // An entry whose name now clashes with a built-in cannot install;
        // it is reported as corrupt state, not as a definition error.
        let blob = r##"[{"name": "add", "body": "1 2", "color": "#e06c75"}]"##;
        let mut interp = Interpreter::new();
        let failures = interp.load_state(blob).unwrap();
        assert_eq!(failures.len(), 1);
        assert!(failures[0].starts_with("add:"));
        assert!(failures[0].contains("CorruptState"));
        assert!(interp.dictionary_snapshot().is_empty());
    }

    #[test]
    fn test_invalid_json_fails_whole_load() {
        let mut interp = Interpreter::new();
        assert!(matches!(
            interp.load_state("not json"),
            Err(LycorisError::CorruptState(_))
        ));
    }

    #[test]
    fn test_saved_colors_survive() {
        let mut source = Interpreter::new();
        source.execute("[1] 'one' def [2] 'two' def").unwrap();
        let colors: Vec<String> = source
            .dictionary_snapshot()
            .into_iter()
            .map(|word| word.color)
            .collect();

        let blob = source.save_state().unwrap();
        let mut target = Interpreter::new();
        target.load_state(&blob).unwrap();
        let restored: Vec<String> = target
            .dictionary_snapshot()
            .into_iter()
            .map(|word| word.color)
            .collect();
        assert_eq!(restored, colors);
    }
}
