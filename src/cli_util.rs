use std::fs;
use std::io::{self, IsTerminal, Write};
use nu_ansi_term::Color;
use crate::{CompileError, ExecError};

/// Load program source from `--file` or the concatenated positional parts.
/// Prints a message and returns `Err(exit_code)` on failure.
pub fn load_source(program: &str, file: Option<String>, code: Vec<String>) -> Result<String, i32> {
    match file {
        Some(path) => fs::read_to_string(&path).map_err(|e| {
            eprintln!("{program}: failed to read code file as UTF-8: {e}");
            let _ = io::stderr().flush();
            1
        }),
        None => Ok(code.join("")),
    }
}

/// Pretty-print a CompileError with caret positioning.
/// If `program` is `Some("bf")`, prefix messages with "bf: ..." for CLI mode
pub fn print_compile_error(program: Option<&str>, code: &str, err: &CompileError) {
    match err {
        CompileError::UnmatchedBracket { ip, kind } => {
            let msg = prefix_program(program, &format!("Parse error: unmatched bracket {kind}"));
            print_error_with_context(&msg, code, *ip);
        }
        CompileError::Build(source) => {
            eprintln!("{}", header(&prefix_program(program, &format!("Internal compiler error: {source}"))));
            let _ = io::stderr().flush();
        }
    }
}

/// Print an ExecError on one line.
pub fn print_exec_error(program: Option<&str>, err: &ExecError) {
    let msg = match err {
        ExecError::CursorOutOfBounds { cursor, block } => prefix_program(
            program,
            &format!("Runtime error: cursor out of bounds (cursor={cursor}, block={block})"),
        ),
        // Abort messages are printed bare so they read the same with or without a program name
        ExecError::StepLimitExceeded { .. } | ExecError::Canceled => err.to_string(),
        ExecError::MalformedProgram { .. } => prefix_program(program, &format!("Internal error: {err}")),
    };
    eprintln!("{}", header(&msg));
    let _ = io::stderr().flush();
}

fn prefix_program(program: Option<&str>, msg: &str) -> String {
    if let Some(p) = program {
        format!("{p}: {msg}")
    } else {
        msg.to_string()
    }
}

// Styled error header for TTY stderr; keep pipelines clean otherwise
fn header(msg: &str) -> String {
    if io::stderr().is_terminal() {
        Color::Red.bold().paint(msg).to_string()
    } else {
        msg.to_string()
    }
}

/// Print a concise error with instruction index and a caret context window,
/// working with UTF-8 by slicing using char indices.
pub fn print_error_with_context(prefix: &str, code: &str, pos: usize) {
    eprintln!("{} at instruction {pos}", header(prefix));

    // Show a short window around the position for context
    const WINDOW_CHARS: usize = 32;

    let total_chars = code.chars().count();
    let start_char = pos.saturating_sub(WINDOW_CHARS);
    let end_char = (pos + WINDOW_CHARS + 1).min(total_chars);

    let start_byte = char_to_byte_index(code, start_char);
    let end_byte = char_to_byte_index(code, end_char);
    // Newlines in the window would break the caret alignment
    let slice: String = code[start_byte..end_byte]
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();

    eprintln!("  {}", slice);

    // Caret under the exact position
    let caret_offset_chars = pos.saturating_sub(start_char);
    eprintln!("  {}^", " ".repeat(caret_offset_chars));
    let _ = io::stderr().flush();
}

/// Convert a char index into a byte index in the given UTF-8 string.
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices().nth(char_idx).map(|(i, _)| i).unwrap_or(s.len())
}
