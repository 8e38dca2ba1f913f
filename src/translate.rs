//! Per-character lowering of Brainfuck source into the block graph.

use crate::builder::BlockGraphBuilder;
use crate::error::CompileError;
use crate::ir::Ty;
use crate::loops::{self, LoopStack};
use crate::tape;

/// The instruction set. Every other character is a comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    Inc,
    Dec,
    Right,
    Left,
    Open,
    Close,
    Output,
}

impl Instruction {
    pub fn from_char(ch: char) -> Option<Self> {
        match ch {
            '+' => Some(Instruction::Inc),
            '-' => Some(Instruction::Dec),
            '>' => Some(Instruction::Right),
            '<' => Some(Instruction::Left),
            '[' => Some(Instruction::Open),
            ']' => Some(Instruction::Close),
            '.' => Some(Instruction::Output),
            _ => None,
        }
    }
}

/// Lower the character at instruction index `ip` at the builder's insertion
/// point. `output_param` is the output primitive's parameter type.
pub fn translate_char(
    b: &mut BlockGraphBuilder,
    loops: &mut LoopStack,
    ip: usize,
    ch: char,
    output_param: Ty,
) -> Result<(), CompileError> {
    let Some(instr) = Instruction::from_char(ch) else {
        return Ok(());
    };

    match instr {
        Instruction::Inc => {
            let addr = tape::cell_address(b)?;
            let value = b.load(addr)?;
            let next = tape::increment(b, value)?;
            b.store(addr, next)?;
        }
        Instruction::Dec => {
            let addr = tape::cell_address(b)?;
            let value = b.load(addr)?;
            let next = tape::decrement(b, value)?;
            b.store(addr, next)?;
        }
        Instruction::Right => {
            let cursor = b.load_cursor()?;
            let next = tape::increment(b, cursor)?;
            b.store_cursor(next)?;
        }
        Instruction::Left => {
            let cursor = b.load_cursor()?;
            let next = tape::decrement(b, cursor)?;
            b.store_cursor(next)?;
        }
        Instruction::Open => loops::open_loop(b, loops, ip)?,
        Instruction::Close => loops::close_loop(b, loops, ip)?,
        Instruction::Output => {
            let addr = tape::cell_address(b)?;
            let value = b.load(addr)?;
            let extended = b.sext(value, output_param)?;
            b.call_output(extended, output_param)?;
        }
    }
    Ok(())
}
