//! Bracket matching for single-pass loop lowering.
//!
//! Each `[` leaves a [`LoopFrame`] on the [`LoopStack`] recording the block
//! that re-tests the loop condition and the block control falls into once the
//! cell is zero. The matching `]` pops that frame and wires the back edge.
//!
//! ```text
//!   current ──br──▶ check ──condbr──▶ body ... ──br──▶ check
//!                        └──────────▶ after
//! ```

use tracing::trace;

use crate::builder::BlockGraphBuilder;
use crate::error::{CompileError, UnmatchedBracketKind};
use crate::ir::{BlockId, Terminator};
use crate::tape::{self, CELL_TY};

/// A pending `]` obligation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopFrame {
    pub check: BlockId,
    pub after: BlockId,
    /// Instruction index of the `[` that opened the loop.
    pub open_ip: usize,
}

/// Open loops, innermost last. Depth equals the number of unmatched `[`.
#[derive(Debug, Default)]
pub struct LoopStack {
    frames: Vec<LoopFrame>,
}

impl LoopStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn push(&mut self, frame: LoopFrame) {
        self.frames.push(frame);
    }

    pub fn pop(&mut self) -> Option<LoopFrame> {
        self.frames.pop()
    }

    pub fn innermost(&self) -> Option<&LoopFrame> {
        self.frames.last()
    }
}

/// Lower `[`: branch into a fresh condition block that tests the current
/// cell and continues in the loop body.
pub fn open_loop(
    b: &mut BlockGraphBuilder,
    loops: &mut LoopStack,
    ip: usize,
) -> Result<(), CompileError> {
    let check = b.create_block("loop.check");
    b.terminate(Terminator::Br { target: check })?;
    b.set_insertion_point(check)?;

    let addr = tape::cell_address(b)?;
    let value = b.load(addr)?;
    let zero = b.iconst(CELL_TY, 0)?;
    let test = b.cmp_ne(value, zero)?;

    let body = b.create_block("loop.body");
    let after = b.create_block("loop.after");
    b.terminate(Terminator::CondBr { cond: test, then_block: body, else_block: after })?;

    loops.push(LoopFrame { check, after, open_ip: ip });
    trace!(ip, depth = loops.depth(), "loop opened");

    b.set_insertion_point(body)?;
    Ok(())
}

/// Lower `]`: jump back to the innermost loop's condition block and continue
/// after the loop.
pub fn close_loop(
    b: &mut BlockGraphBuilder,
    loops: &mut LoopStack,
    ip: usize,
) -> Result<(), CompileError> {
    let Some(frame) = loops.pop() else {
        return Err(CompileError::UnmatchedBracket { ip, kind: UnmatchedBracketKind::Close });
    };
    trace!(ip, open_ip = frame.open_ip, depth = loops.depth(), "loop closed");

    b.terminate(Terminator::Br { target: frame.check })?;
    b.set_insertion_point(frame.after)?;
    Ok(())
}
