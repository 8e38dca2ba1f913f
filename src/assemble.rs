//! Whole-program compilation: preamble, body, and the closing return.

use tracing::debug;

use crate::builder::BlockGraphBuilder;
use crate::error::{CompileError, UnmatchedBracketKind};
use crate::ir::{OutputDecl, Program, Slot, Terminator};
use crate::loops::LoopStack;
use crate::tape::{self, CELL_TY, CURSOR_TY, TAPE_LEN};
use crate::translate::translate_char;

/// Compile Brainfuck `source` into a finalized [`Program`].
///
/// The entry block allocates the cursor (initialized to 0) and a zeroed
/// [`TAPE_LEN`]-cell tape; the source is then lowered character by character
/// and the last open block returns. Unbalanced brackets fail with
/// [`CompileError::UnmatchedBracket`] and no program is produced.
pub fn compile(source: &str) -> Result<Program, CompileError> {
    debug!(chars = source.chars().count(), "compiling program");

    let output = OutputDecl::default();
    let mut b = BlockGraphBuilder::new("main");
    let entry = b.create_block("entry");
    b.set_insertion_point(entry)?;

    b.alloca(Slot::Cursor)?;
    let origin = b.iconst(CURSOR_TY, 0)?;
    b.store_cursor(origin)?;

    b.alloca(Slot::Tape)?;
    let first_cell = tape::cell_address(&mut b)?;
    let zero = b.iconst(CELL_TY, 0)?;
    b.fill(first_cell, zero, TAPE_LEN)?;

    let mut loops = LoopStack::new();
    for (ip, ch) in source.chars().enumerate() {
        translate_char(&mut b, &mut loops, ip, ch, output.param)?;
    }

    if let Some(unmatched) = loops.innermost() {
        return Err(CompileError::UnmatchedBracket {
            ip: unmatched.open_ip,
            kind: UnmatchedBracketKind::Open,
        });
    }

    b.terminate(Terminator::Ret)?;
    let function = b.finish()?;
    debug!(
        blocks = function.block_count(),
        values = function.value_count(),
        "program compiled"
    );

    Ok(Program::new(function, output, TAPE_LEN))
}
