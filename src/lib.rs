//! A Brainfuck compiler that lowers source to a basic-block graph.
//!
//! Compilation is a single left-to-right pass. Each instruction is lowered at
//! an explicit insertion point into an arena of blocks, and loops are wired up
//! with a stack of pending `]` obligations, so no parse tree is ever built.
//! The result is an immutable [`Program`] that any [`Executor`] can run.
//!
//! Features and behaviors:
//! - Memory tape of 30,000 cells initialized to 0, cursor starting at 0.
//! - Cell arithmetic wraps at 8 bits, cursor arithmetic at 64 bits.
//! - Output `.` calls the program's single output primitive with the current
//!   cell sign-extended to 32 bits.
//! - Unmatched `[` or `]` is a compile error; no program is produced.
//! - Every other character (including `,`) is a comment.
//! - The bundled [`Interpreter`] traps when a cell is addressed with the cursor
//!   off the tape.
//!
//! Quick start:
//!
//! ```no_run
//! use bf_blocks::{compile, Executor, Interpreter, StdoutOutput};
//!
//! // Classic "Hello World!" in Brainfuck
//! let code = "++++++++++[>+++++++>++++++++++>+++>+<<<<-]>++.>+.+++++++..+++.>++.<<+++++++++++++++.>.+++.------.--------.>+.>.";
//! let program = compile(code).expect("program should compile");
//! let mut out = StdoutOutput::stdout();
//! Interpreter::new().invoke(&program, &mut out).expect("program should run");
//! out.finish().expect("stdout should accept output");
//! ```

pub mod assemble;
pub mod builder;
pub mod cli_util;
pub mod commands;
pub mod config;
pub mod error;
pub mod exec;
pub mod ir;
pub mod logging;
pub mod loops;
pub mod output;
pub mod tape;
pub mod translate;

pub use assemble::compile;
pub use builder::{BlockGraphBuilder, InsertPoint};
pub use error::{BuildError, CompileError, UnmatchedBracketKind};
pub use exec::{ExecError, Executor, Interpreter, StepControl};
pub use ir::Program;
pub use output::{Output, StdoutOutput, WriteOutput};
pub use tape::TAPE_LEN;
