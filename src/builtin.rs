//! Built-in Words for the Lycoris Language
//!
//! This module implements the standard vocabulary seeded into every
//! dictionary. Built-ins operate directly on the interpreter: they pop their
//! operands from the stack, validate types and counts, and push results.
//!
//! ## Word Categories
//!
//! ### Arithmetic
//! Exact rational operations: `add`, `sub`, `mul`, `div`, `pow`, `mod`.
//! The scope-modified forms (`@add`, `*mul`, ...) are not separate entries;
//! they fall out of the evaluator's scope dispatch.
//!
//! ### Comparison and Predicates
//! `eq` / `ne` compare any two values structurally; `lt`, `gt`, `le`, `ge`
//! order rationals; `not` inverts a boolean; `sign` projects a rational to
//! -1, 0, or 1. These are the vocabulary of guard-clause conditions.
//!
//! ### Stack Manipulation
//! The classic shuffles: `dup`, `drop`, `swap`, `over`, `rot`.
//!
//! ### Vectors
//! `vec`, `unpack`, `nth`, `length`, `concat`, `append`, `get`, `set`.
//! Indices may be negative to count from the end.
//!
//! ### Execution Control and Definitions
//! `run` executes a vector as code; `quote` wraps a value in a one-element
//! vector; `def` / `undef` manage user words.
//!
//! ### Output
//! `print` appends a value's canonical form to the output buffer; `clear`
//! empties the buffer.
//!
//! ## Design Notes
//!
//! Words are plain function pointers registered by name; the dictionary's
//! trie makes them simultaneously the lexicon of the tokenizer. Every word
//! validates before it mutates, and reports errors in terms of the word the
//! user wrote.

use crate::dictionary::{BuiltinFn, Dictionary};
use crate::error::{LycorisError, Result};
use crate::interpreter::Interpreter;
use crate::rational::Rational;
use crate::value::Value;

/// Seeds the complete built-in vocabulary into a dictionary.
///
/// Called once while an interpreter is constructed; built-ins can never be
/// removed or shadowed afterwards.
pub fn install(dictionary: &mut Dictionary) {
    let words: &[(&str, BuiltinFn)] = &[
        // Arithmetic
        ("add", math_add),
        ("sub", math_sub),
        ("mul", math_mul),
        ("div", math_div),
        ("pow", math_pow),
        ("mod", math_mod),
        ("sign", math_sign),
        // Comparison
        ("eq", compare_eq),
        ("ne", compare_ne),
        ("lt", compare_lt),
        ("gt", compare_gt),
        ("le", compare_le),
        ("ge", compare_ge),
        ("not", logic_not),
        // Stack manipulation
        ("dup", stack_dup),
        ("drop", stack_drop),
        ("swap", stack_swap),
        ("over", stack_over),
        ("rot", stack_rot),
        // Vectors
        ("vec", vector_vec),
        ("unpack", vector_unpack),
        ("nth", vector_nth),
        ("length", vector_length),
        ("concat", vector_concat),
        ("append", vector_append),
        ("get", vector_get),
        ("set", vector_set),
        // Execution control
        ("run", control_run),
        ("quote", control_quote),
        // Definitions
        ("def", word_def),
        ("undef", word_undef),
        // Output
        ("print", io_print),
        ("clear", io_clear),
    ];
    for (name, operation) in words {
        dictionary.insert_builtin(name, *operation);
    }
}

// === ARITHMETIC ===

fn math_add(interp: &mut Interpreter) -> Result<()> {
    let b = interp.pop_rational("add")?;
    let a = interp.pop_rational("add")?;
    interp.push(Value::Rational(a.add(&b)))
}

fn math_sub(interp: &mut Interpreter) -> Result<()> {
    let b = interp.pop_rational("sub")?;
    let a = interp.pop_rational("sub")?;
    interp.push(Value::Rational(a.sub(&b)))
}

fn math_mul(interp: &mut Interpreter) -> Result<()> {
    let b = interp.pop_rational("mul")?;
    let a = interp.pop_rational("mul")?;
    interp.push(Value::Rational(a.mul(&b)))
}

fn math_div(interp: &mut Interpreter) -> Result<()> {
    let b = interp.pop_rational("div")?;
    let a = interp.pop_rational("div")?;
    interp.push(Value::Rational(a.div(&b)?))
}

fn math_pow(interp: &mut Interpreter) -> Result<()> {
    let exponent = interp.pop_rational("pow")?;
    let base = interp.pop_rational("pow")?;
    let result = base.pow(&exponent, interp.max_exponent())?;
    interp.push(Value::Rational(result))
}

fn math_mod(interp: &mut Interpreter) -> Result<()> {
    let b = interp.pop_rational("mod")?;
    let a = interp.pop_rational("mod")?;
    interp.push(Value::Rational(a.rem(&b)?))
}

fn math_sign(interp: &mut Interpreter) -> Result<()> {
    let value = interp.pop_rational("sign")?;
    interp.push(Value::Rational(value.sign()))
}

// === COMPARISON ===

fn compare_eq(interp: &mut Interpreter) -> Result<()> {
    let b = interp.pop("eq")?;
    let a = interp.pop("eq")?;
    interp.push(Value::Boolean(a == b))
}

fn compare_ne(interp: &mut Interpreter) -> Result<()> {
    let b = interp.pop("ne")?;
    let a = interp.pop("ne")?;
    interp.push(Value::Boolean(a != b))
}

fn compare_lt(interp: &mut Interpreter) -> Result<()> {
    let b = interp.pop_rational("lt")?;
    let a = interp.pop_rational("lt")?;
    interp.push(Value::Boolean(a < b))
}

fn compare_gt(interp: &mut Interpreter) -> Result<()> {
    let b = interp.pop_rational("gt")?;
    let a = interp.pop_rational("gt")?;
    interp.push(Value::Boolean(a > b))
}

fn compare_le(interp: &mut Interpreter) -> Result<()> {
    let b = interp.pop_rational("le")?;
    let a = interp.pop_rational("le")?;
    interp.push(Value::Boolean(a <= b))
}

fn compare_ge(interp: &mut Interpreter) -> Result<()> {
    let b = interp.pop_rational("ge")?;
    let a = interp.pop_rational("ge")?;
    interp.push(Value::Boolean(a >= b))
}

fn logic_not(interp: &mut Interpreter) -> Result<()> {
    let value = interp.pop_boolean("not")?;
    interp.push(Value::Boolean(!value))
}

// === STACK MANIPULATION ===

fn stack_dup(interp: &mut Interpreter) -> Result<()> {
    let top = interp.pop("dup")?;
    interp.push(top.clone())?;
    interp.push(top)
}

fn stack_drop(interp: &mut Interpreter) -> Result<()> {
    interp.pop("drop")?;
    Ok(())
}

fn stack_swap(interp: &mut Interpreter) -> Result<()> {
    let b = interp.pop("swap")?;
    let a = interp.pop("swap")?;
    interp.push(b)?;
    interp.push(a)
}

fn stack_over(interp: &mut Interpreter) -> Result<()> {
    let b = interp.pop("over")?;
    let a = interp.pop("over")?;
    interp.push(a.clone())?;
    interp.push(b)?;
    interp.push(a)
}

/// `a b c` becomes `b c a`.
fn stack_rot(interp: &mut Interpreter) -> Result<()> {
    let c = interp.pop("rot")?;
    let b = interp.pop("rot")?;
    let a = interp.pop("rot")?;
    interp.push(b)?;
    interp.push(c)?;
    interp.push(a)
}

// === VECTORS ===

/// Resolves a possibly-negative index against a vector length.
fn resolve_index(word: &str, length: usize, index: i64) -> Result<usize> {
    let signed_length = length as i64;
    let resolved = if index < 0 { index + signed_length } else { index };
    if resolved < 0 || resolved >= signed_length {
        return Err(LycorisError::IndexError(format!(
            "{} index {} is out of range for length {}",
            word, index, length
        )));
    }
    Ok(resolved as usize)
}

fn vector_vec(interp: &mut Interpreter) -> Result<()> {
    let count = interp.pop_integer("vec")?;
    if count < 0 {
        return Err(LycorisError::DomainError(format!(
            "vec count must be non-negative, got {}",
            count
        )));
    }
    let count = count as usize;
    if interp.stack_len() < count {
        return Err(LycorisError::ArityError(format!(
            "vec needs {} values but the stack has {}",
            count,
            interp.stack_len()
        )));
    }
    let elements = interp.take_top(count)?;
    interp.push(Value::Vector(elements))
}

fn vector_unpack(interp: &mut Interpreter) -> Result<()> {
    let elements = interp.pop_vector("unpack")?;
    for element in elements {
        if !element.is_data() {
            return Err(LycorisError::TypeError(format!(
                "unpack cannot push the word reference {}",
                element
            )));
        }
        interp.push(element)?;
    }
    Ok(())
}

/// Shared body of `nth` and `get`: vector and index in, element out.
fn vector_pick(interp: &mut Interpreter, word: &str) -> Result<()> {
    let index = interp.pop_integer(word)?;
    let elements = interp.pop_vector(word)?;
    let position = resolve_index(word, elements.len(), index)?;
    let element = elements[position].clone();
    if !element.is_data() {
        return Err(LycorisError::TypeError(format!(
            "{} cannot push the word reference {}",
            word, element
        )));
    }
    interp.push(element)
}

fn vector_nth(interp: &mut Interpreter) -> Result<()> {
    vector_pick(interp, "nth")
}

fn vector_get(interp: &mut Interpreter) -> Result<()> {
    vector_pick(interp, "get")
}

fn vector_set(interp: &mut Interpreter) -> Result<()> {
    let value = interp.pop("set")?;
    let index = interp.pop_integer("set")?;
    let mut elements = interp.pop_vector("set")?;
    let position = resolve_index("set", elements.len(), index)?;
    elements[position] = value;
    interp.push(Value::Vector(elements))
}

fn vector_length(interp: &mut Interpreter) -> Result<()> {
    let elements = interp.pop_vector("length")?;
    interp.push(Value::Rational(Rational::from_i64(elements.len() as i64)))
}

fn vector_concat(interp: &mut Interpreter) -> Result<()> {
    let second = interp.pop_vector("concat")?;
    let mut first = interp.pop_vector("concat")?;
    first.try_reserve(second.len())?;
    first.extend(second);
    interp.push(Value::Vector(first))
}

fn vector_append(interp: &mut Interpreter) -> Result<()> {
    let value = interp.pop("append")?;
    let mut elements = interp.pop_vector("append")?;
    elements.try_reserve(1)?;
    elements.push(value);
    interp.push(Value::Vector(elements))
}

// === EXECUTION CONTROL ===

fn control_run(interp: &mut Interpreter) -> Result<()> {
    match interp.pop("run")? {
        Value::Vector(body) => interp.run_body(&body),
        other => Err(LycorisError::TypeError(format!(
            "run expects a vector, got {}",
            other.type_name()
        ))),
    }
}

fn control_quote(interp: &mut Interpreter) -> Result<()> {
    let value = interp.pop("quote")?;
    interp.push(Value::Vector(vec![value]))
}

// === DEFINITIONS ===

fn word_def(interp: &mut Interpreter) -> Result<()> {
    let name = interp.pop_string("def")?;
    let body = interp.pop_vector("def")?;
    interp.define_word(&name, body)
}

fn word_undef(interp: &mut Interpreter) -> Result<()> {
    let name = interp.pop_string("undef")?;
    interp.undefine_word(&name)
}

// === OUTPUT ===

fn io_print(interp: &mut Interpreter) -> Result<()> {
    let value = interp.pop("print")?;
    interp.append_output(&format!("{}\n", value));
    Ok(())
}

fn io_clear(interp: &mut Interpreter) -> Result<()> {
    interp.clear_output();
    Ok(())
}
