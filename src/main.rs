//! Lycoris - Command-Line Host for the Lycoris Language Runtime
//!
//! This is a thin host over the `lycoris` library: it executes `.lyc` source
//! files and offers an interactive REPL. All language behavior lives in the
//! library; this binary only moves text in and out of it.
//!
//! ## Commands
//!
//! - `lycoris run <file>`: execute a source file, print its output and the
//!   final stack
//! - `lycoris repl` (or no arguments): interactive session
//!
//! ## REPL Meta-Commands
//!
//! Lines starting with a known meta-command are intercepted before they
//! reach the evaluator:
//! - `:stack` - show the stack, bottom to top
//! - `:words` - list user-defined words
//! - `:save` / `:load` - persist or restore the user dictionary to the
//!   default state file under the user's config directory
//! - `:reset` - drop stack, user words, and output
//! - `:quit` - leave the REPL
//!
//! Anything else, including guard-clause sources containing `:`, is handed
//! to the evaluator unchanged.

use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::{env, fs, process};

use lycoris::Interpreter;

fn main() {
    let args: Vec<String> = env::args().collect();
    let verbose = args.iter().any(|arg| arg == "-v" || arg == "--verbose");
    let args: Vec<&String> = args
        .iter()
        .filter(|arg| *arg != "-v" && *arg != "--verbose")
        .collect();

    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    let _ = simple_logger::SimpleLogger::new().with_level(level).init();

    match args.get(1).map(|arg| arg.as_str()) {
        Some("run") => {
            let Some(file) = args.get(2) else {
                eprintln!("Usage: lycoris run <path-to-lyc-file>");
                process::exit(1);
            };
            if let Err(error) = run_file(file.as_str()) {
                eprintln!("Error: {}", error);
                process::exit(1);
            }
        }
        Some("repl") | None => {
            if let Err(error) = run_repl() {
                eprintln!("Error: {}", error);
                process::exit(1);
            }
        }
        _ => {
            print_usage();
            process::exit(1);
        }
    }
}

/// Prints usage information for the Lycoris CLI.
fn print_usage() {
    println!("Lycoris - a concatenative language with exact rational arithmetic");
    println!();
    println!("Usage:");
    println!("  lycoris run <path-to-lyc-file>   Execute a Lycoris source file");
    println!("  lycoris repl                     Start an interactive session");
    println!("  lycoris -v ...                   Enable debug logging");
}

/// Executes a source file and prints its output and final stack.
fn run_file(path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let source = fs::read_to_string(path)?;
    let mut interp = Interpreter::new();
    match interp.execute(&source) {
        Ok(output) => {
            print!("{}", output);
            let stack = interp.stack_snapshot();
            if !stack.is_empty() {
                println!("stack: {}", stack.join(" "));
            }
            Ok(())
        }
        Err(error) => {
            print!("{}", interp.output_buffer());
            Err(Box::new(error))
        }
    }
}

/// Runs the interactive session until `:quit` or end of input.
fn run_repl() -> Result<(), Box<dyn std::error::Error>> {
    println!("Lycoris REPL. :quit to leave, :stack :words :save :load :reset.");
    let mut interp = Interpreter::new();
    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();

    loop {
        print!("> ");
        stdout.flush()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            return Ok(());
        }
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        match trimmed {
            ":quit" | ":q" => return Ok(()),
            ":stack" => {
                println!("[{}]", interp.stack_snapshot().join(" "));
            }
            ":words" => {
                for word in interp.dictionary_snapshot() {
                    println!("{}: {}", word.name, word.body);
                }
            }
            ":reset" => {
                interp.reset();
                println!("reset");
            }
            ":save" => match save_to_state_file(&interp) {
                Ok(path) => println!("saved to {}", path.display()),
                Err(error) => eprintln!("save failed: {}", error),
            },
            ":load" => match load_from_state_file(&mut interp) {
                Ok(failures) => {
                    for failure in failures {
                        eprintln!("skipped entry {}", failure);
                    }
                    println!("loaded");
                }
                Err(error) => eprintln!("load failed: {}", error),
            },
            source => match interp.execute(source) {
                Ok(output) => {
                    print!("{}", output);
                    println!("[{}]", interp.stack_snapshot().join(" "));
                }
                Err(error) => {
                    eprintln!("{}", error);
                }
            },
        }
    }
}

/// The default state file, under the user's config directory.
fn state_file() -> Result<PathBuf, Box<dyn std::error::Error>> {
    let mut path = dirs::config_dir().ok_or("could not find the config directory")?;
    path.push("lycoris");
    if !path.exists() {
        fs::create_dir_all(&path)?;
    }
    path.push("state.json");
    Ok(path)
}

fn save_to_state_file(interp: &Interpreter) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let path = state_file()?;
    fs::write(&path, interp.save_state()?)?;
    Ok(path)
}

fn load_from_state_file(
    interp: &mut Interpreter,
) -> Result<Vec<String>, Box<dyn std::error::Error>> {
    let path = state_file()?;
    let blob = fs::read_to_string(&path)?;
    Ok(interp.load_state(&blob)?)
}
