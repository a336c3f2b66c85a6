//! Word Dictionary for the Lycoris Language
//!
//! The dictionary maps word names to their bindings: built-in operations
//! seeded once at startup, and user words defined with `def`. It is backed
//! by a byte-indexed trie so the tokenizer can find the longest dictionary
//! word starting at any source position in time linear in the word length.
//! That longest-match scan is what lets Lycoris source omit whitespace
//! between tokens: the dictionary itself is authoritative for lexical
//! boundaries.
//!
//! ## Structure
//!
//! Trie nodes live in an arena (`Vec`), with children stored per node as a
//! small byte map. A terminal node carries an index into the entry table,
//! which preserves insertion order for serialization and display.
//!
//! ## Protection Rules
//!
//! Built-ins cannot be removed or shadowed. User word names must not collide
//! with number, string, vector, or reserved literal syntax; the tokenizer
//! would otherwise never reach them.

use std::collections::HashMap;

use crate::error::{LycorisError, Result};
use crate::interpreter::Interpreter;
use crate::lexer::RESERVED_LITERALS;
use crate::value::Value;

/// An engine-provided word implementation.
///
/// Built-ins operate directly on the interpreter: its stack, its dictionary
/// (for `def` / `undef`), and its output buffer (for `print` / `clear`).
pub type BuiltinFn = fn(&mut Interpreter) -> Result<()>;

/// A user-defined word: its body, the source text shown when the word is
/// displayed, and a display color.
#[derive(Debug, Clone)]
pub struct UserWord {
    /// The body as tokenized values; executed like an inline vector.
    pub body: Vec<Value>,
    /// Canonical source text of the body, kept for display and persistence.
    pub source: String,
    /// Display color as a `#rrggbb` string.
    pub color: String,
}

/// What a dictionary name is bound to.
#[derive(Debug, Clone)]
pub enum Binding {
    Builtin(BuiltinFn),
    User(UserWord),
}

#[derive(Debug, Clone)]
struct TrieNode {
    children: HashMap<u8, usize>,
    /// Index into the entry table when a word terminates at this node.
    entry: Option<usize>,
}

impl TrieNode {
    fn new() -> Self {
        Self {
            children: HashMap::new(),
            entry: None,
        }
    }
}

#[derive(Debug, Clone)]
struct Entry {
    name: String,
    binding: Binding,
    /// Cleared when the entry is undefined; dead slots keep later entry
    /// indices stable.
    alive: bool,
}

/// The word dictionary: a byte trie over names plus an insertion-ordered
/// entry table.
#[derive(Debug, Clone)]
pub struct Dictionary {
    nodes: Vec<TrieNode>,
    entries: Vec<Entry>,
}

impl Dictionary {
    /// Creates an empty dictionary. Built-ins are seeded separately by the
    /// interpreter so the dictionary itself stays policy-free.
    pub fn new() -> Self {
        Self {
            nodes: vec![TrieNode::new()],
            entries: Vec::new(),
        }
    }

    /// Seeds a built-in word. Only called while the interpreter is being
    /// constructed; names are trusted and never replace existing entries.
    pub(crate) fn insert_builtin(&mut self, name: &str, operation: BuiltinFn) {
        debug_assert!(self.terminal_index(name).is_none());
        let index = self.entries.len();
        self.entries.push(Entry {
            name: name.to_string(),
            binding: Binding::Builtin(operation),
            alive: true,
        });
        self.attach(name, index);
    }

    /// Installs or replaces a user word.
    ///
    /// Replacing a live user word reuses its entry slot, so the word keeps
    /// its position in [`Dictionary::user_entries`] order.
    ///
    /// # Errors
    /// - `NameConflict` if the name is bound to a built-in
    /// - `InvalidName` if the name is empty or collides with literal,
    ///   number, or delimiter syntax
    pub fn define(&mut self, name: &str, body: Vec<Value>, source: &str, color: &str) -> Result<()> {
        validate_name(name)?;
        let word = UserWord {
            body,
            source: source.to_string(),
            color: color.to_string(),
        };
        match self.terminal_index(name) {
            Some(index) => match self.entries[index].binding {
                Binding::Builtin(_) => Err(LycorisError::NameConflict(name.to_string())),
                Binding::User(_) => {
                    self.entries[index].binding = Binding::User(word);
                    Ok(())
                }
            },
            None => {
                let index = self.entries.len();
                self.entries.push(Entry {
                    name: name.to_string(),
                    binding: Binding::User(word),
                    alive: true,
                });
                self.attach(name, index);
                Ok(())
            }
        }
    }

    /// Removes a user word.
    ///
    /// # Errors
    /// - `NotFound` if the name is not bound
    /// - `ProtectedBuiltin` if the name is bound to a built-in
    pub fn undefine(&mut self, name: &str) -> Result<()> {
        let index = self
            .terminal_index(name)
            .ok_or_else(|| LycorisError::NotFound(name.to_string()))?;
        if matches!(self.entries[index].binding, Binding::Builtin(_)) {
            return Err(LycorisError::ProtectedBuiltin(name.to_string()));
        }
        self.entries[index].alive = false;
        self.detach(name);
        Ok(())
    }

    /// Returns the binding for an exact name, if present.
    pub fn lookup(&self, name: &str) -> Option<&Binding> {
        self.terminal_index(name)
            .map(|index| &self.entries[index].binding)
    }

    /// Whether the name is bound to a built-in.
    pub fn is_builtin(&self, name: &str) -> bool {
        matches!(self.lookup(name), Some(Binding::Builtin(_)))
    }

    /// Length of the longest dictionary word starting at `offset` in
    /// `bytes`, or `None` if no word matches there.
    ///
    /// Walks the trie along the input, remembering the last position where
    /// a complete word terminated.
    pub fn longest_prefix(&self, bytes: &[u8], offset: usize) -> Option<usize> {
        let mut node = 0;
        let mut length = 0;
        let mut best = None;
        for &byte in bytes.get(offset..)? {
            match self.nodes[node].children.get(&byte) {
                Some(&next) => {
                    node = next;
                    length += 1;
                    if self.nodes[node].entry.is_some() {
                        best = Some(length);
                    }
                }
                None => break,
            }
        }
        best
    }

    /// User entries in insertion order, for serialization and display.
    pub fn user_entries(&self) -> impl Iterator<Item = (&str, &UserWord)> {
        self.entries.iter().filter_map(|entry| {
            if !entry.alive {
                return None;
            }
            match &entry.binding {
                Binding::User(word) => Some((entry.name.as_str(), word)),
                Binding::Builtin(_) => None,
            }
        })
    }

    /// Removes every user word, keeping the built-ins.
    pub fn clear_user_entries(&mut self) {
        let names: Vec<String> = self
            .user_entries()
            .map(|(name, _)| name.to_string())
            .collect();
        for name in names {
            self.remove_user(&name);
        }
    }

    fn remove_user(&mut self, name: &str) {
        if let Some(index) = self.terminal_index(name) {
            self.entries[index].alive = false;
            self.detach(name);
        }
    }

    /// Walks the trie for an exact name and returns its live entry index.
    fn terminal_index(&self, name: &str) -> Option<usize> {
        let mut node = 0;
        for &byte in name.as_bytes() {
            node = *self.nodes[node].children.get(&byte)?;
        }
        let index = self.nodes[node].entry?;
        if self.entries[index].alive {
            Some(index)
        } else {
            None
        }
    }

    /// Inserts a name into the trie, pointing its terminal at `index`.
    fn attach(&mut self, name: &str, index: usize) {
        let mut node = 0;
        for &byte in name.as_bytes() {
            node = match self.nodes[node].children.get(&byte) {
                Some(&next) => next,
                None => {
                    let next = self.nodes.len();
                    self.nodes.push(TrieNode::new());
                    self.nodes[node].children.insert(byte, next);
                    next
                }
            };
        }
        self.nodes[node].entry = Some(index);
    }

    /// Clears the terminal marker for a name. Nodes are not pruned; the
    /// trie only ever grows by the set of names that have existed.
    fn detach(&mut self, name: &str) {
        let mut node = 0;
        for &byte in name.as_bytes() {
            match self.nodes[node].children.get(&byte) {
                Some(&next) => node = next,
                None => return,
            }
        }
        self.nodes[node].entry = None;
    }
}

impl Default for Dictionary {
    fn default() -> Self {
        Self::new()
    }
}

/// Characters that delimit other token forms and therefore cannot appear in
/// a word name.
const FORBIDDEN_CHARS: &[char] = &['\'', '[', ']', ':', '#', '@', '*'];

/// Checks that a name cannot be mistaken for a number, string, vector, or
/// reserved literal by the tokenizer.
fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(LycorisError::InvalidName("word name is empty".to_string()));
    }
    // Reserved literals take lexical priority over dictionary words, so a
    // name that merely starts with one could never be tokenized.
    if let Some(literal) = RESERVED_LITERALS
        .iter()
        .find(|literal| name.starts_with(*literal))
    {
        return Err(LycorisError::InvalidName(format!(
            "'{}' collides with the reserved literal '{}'",
            name, literal
        )));
    }
    let mut chars = name.chars();
    let first = match chars.next() {
        Some(c) => c,
        None => return Err(LycorisError::InvalidName("word name is empty".to_string())),
    };
    let second_is_digit = chars.next().is_some_and(|c| c.is_ascii_digit());
    if first.is_ascii_digit() || ((first == '+' || first == '-') && second_is_digit) {
        return Err(LycorisError::InvalidName(format!(
            "'{}' would parse as a number",
            name
        )));
    }
    for c in name.chars() {
        if c.is_whitespace() || FORBIDDEN_CHARS.contains(&c) {
            return Err(LycorisError::InvalidName(format!(
                "'{}' contains the delimiter character '{}'",
                name, c
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(_interp: &mut Interpreter) -> Result<()> {
        Ok(())
    }

    fn user(name: &str, dict: &mut Dictionary) {
        dict.define(name, vec![], name, "#ffffff").unwrap();
    }

    #[test]
    fn test_longest_prefix() {
        let mut dict = Dictionary::new();
        dict.insert_builtin("add", noop);
        dict.insert_builtin("addall", noop);
        dict.insert_builtin("mul", noop);

        let input = b"addall5";
        assert_eq!(dict.longest_prefix(input, 0), Some(6));
        assert_eq!(dict.longest_prefix(b"add3", 0), Some(3));
        assert_eq!(dict.longest_prefix(b"xadd", 0), None);
        assert_eq!(dict.longest_prefix(b"xadd", 1), Some(3));
        assert_eq!(dict.longest_prefix(b"ad", 0), None);
    }

    #[test]
    fn test_define_and_lookup() {
        let mut dict = Dictionary::new();
        dict.insert_builtin("add", noop);
        user("square", &mut dict);

        assert!(matches!(dict.lookup("add"), Some(Binding::Builtin(_))));
        assert!(matches!(dict.lookup("square"), Some(Binding::User(_))));
        assert!(dict.lookup("cube").is_none());
    }

    #[test]
    fn test_builtin_protection() {
        let mut dict = Dictionary::new();
        dict.insert_builtin("add", noop);

        let err = dict.define("add", vec![], "", "#ffffff").unwrap_err();
        assert_eq!(err, LycorisError::NameConflict("add".to_string()));
        let err = dict.undefine("add").unwrap_err();
        assert_eq!(err, LycorisError::ProtectedBuiltin("add".to_string()));
    }

    #[test]
    fn test_undefine() {
        let mut dict = Dictionary::new();
        user("square", &mut dict);
        dict.undefine("square").unwrap();
        assert!(dict.lookup("square").is_none());
        assert_eq!(dict.longest_prefix(b"square", 0), None);
        assert_eq!(
            dict.undefine("square").unwrap_err(),
            LycorisError::NotFound("square".to_string())
        );
    }

    #[test]
    fn test_insertion_order_and_redefine() {
        let mut dict = Dictionary::new();
        user("a", &mut dict);
        user("b", &mut dict);
        user("c", &mut dict);
        // Redefining keeps position; undefine + define appends.
        dict.define("b", vec![Value::Nil], "nil", "#000000").unwrap();
        let names: Vec<&str> = dict.user_entries().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["a", "b", "c"]);

        dict.undefine("a").unwrap();
        user("a", &mut dict);
        let names: Vec<&str> = dict.user_entries().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["b", "c", "a"]);
    }

    #[test]
    fn test_name_validation() {
        let mut dict = Dictionary::new();
        for bad in ["", "true", "truthy", "nil", "3x", "-5", "+9y", "a b", "x[y", "he'llo", "a:b", "@x"] {
            assert!(
                matches!(
                    dict.define(bad, vec![], "", "#ffffff"),
                    Err(LycorisError::InvalidName(_))
                ),
                "expected InvalidName for {:?}",
                bad
            );
        }
        for good in ["square", "x", "-", "+plus", "a.b", "UPPER", "x2"] {
            assert!(dict.define(good, vec![], "", "#ffffff").is_ok(), "{:?}", good);
        }
    }
}
