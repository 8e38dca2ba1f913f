//! The tape: 30,000 byte cells and a signed 64-bit cursor.
//!
//! The emit helpers lower the tape operations the translator needs into
//! builder instructions. [`Tape`] is the runtime storage an executor backs
//! them with.

use crate::builder::BlockGraphBuilder;
use crate::error::BuildError;
use crate::ir::{Ty, ValueId};

/// Number of cells on the tape.
pub const TAPE_LEN: usize = 30_000;

/// Type of a tape cell.
pub const CELL_TY: Ty = Ty::I8;

/// Type of the cursor.
pub const CURSOR_TY: Ty = Ty::I64;

/// Emit `&tape[cursor]` for the current cursor value.
pub fn cell_address(b: &mut BlockGraphBuilder) -> Result<ValueId, BuildError> {
    let cursor = b.load_cursor()?;
    b.cell_addr(cursor)
}

/// Emit `value + 1` in the value's own width.
pub fn increment(b: &mut BlockGraphBuilder, value: ValueId) -> Result<ValueId, BuildError> {
    let ty = b.value_type(value)?;
    let one = b.iconst(ty, 1)?;
    b.add(value, one)
}

/// Emit `value - 1` in the value's own width.
pub fn decrement(b: &mut BlockGraphBuilder, value: ValueId) -> Result<ValueId, BuildError> {
    let ty = b.value_type(value)?;
    let one = b.iconst(ty, 1)?;
    b.sub(value, one)
}

/// Runtime tape storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tape {
    cells: Box<[u8]>,
    cursor: i64,
}

impl Tape {
    pub fn new(len: usize) -> Self {
        Self { cells: vec![0; len].into_boxed_slice(), cursor: 0 }
    }

    pub fn cells(&self) -> &[u8] {
        &self.cells
    }

    pub fn cursor(&self) -> i64 {
        self.cursor
    }

    pub fn set_cursor(&mut self, cursor: i64) {
        self.cursor = cursor;
    }

    /// Cell index for `cursor`, or `None` when it lies outside the tape.
    pub fn address(&self, cursor: i64) -> Option<usize> {
        usize::try_from(cursor).ok().filter(|&i| i < self.cells.len())
    }

    /// The cell under the cursor, if the cursor is on the tape.
    pub fn current(&self) -> Option<u8> {
        self.address(self.cursor).map(|i| self.cells[i])
    }

    pub fn get(&self, addr: usize) -> Option<u8> {
        self.cells.get(addr).copied()
    }

    pub fn set(&mut self, addr: usize, value: u8) -> Option<()> {
        self.cells.get_mut(addr).map(|cell| *cell = value)
    }

    /// Set `len` cells from `start` to `byte`. Fails if the range leaves the tape.
    pub fn fill(&mut self, start: usize, len: usize, byte: u8) -> Option<()> {
        let end = start.checked_add(len)?;
        self.cells.get_mut(start..end)?.fill(byte);
        Some(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Inst;

    #[test]
    fn address_rejects_off_tape_cursors() {
        let tape = Tape::new(3);
        assert_eq!(tape.address(0), Some(0));
        assert_eq!(tape.address(2), Some(2));
        assert_eq!(tape.address(3), None);
        assert_eq!(tape.address(-1), None);
        assert_eq!(tape.address(i64::MIN), None);
    }

    #[test]
    fn fill_stays_on_tape() {
        let mut tape = Tape::new(4);
        assert_eq!(tape.fill(1, 3, 9), Some(()));
        assert_eq!(tape.cells(), &[0, 9, 9, 9]);
        assert_eq!(tape.fill(2, 3, 1), None);
        assert_eq!(tape.fill(usize::MAX, 2, 1), None);
    }

    #[test]
    fn increment_uses_the_operand_width() {
        let mut b = BlockGraphBuilder::new("t");
        let entry = b.create_block("entry");
        b.set_insertion_point(entry).unwrap();

        let addr = cell_address(&mut b).unwrap();
        let cell = b.load(addr).unwrap();
        let bumped = increment(&mut b, cell).unwrap();
        assert_eq!(b.value_type(bumped), Ok(CELL_TY));

        let cursor = b.load_cursor().unwrap();
        let moved = decrement(&mut b, cursor).unwrap();
        assert_eq!(b.value_type(moved), Ok(CURSOR_TY));

        let consts: Vec<_> = b.function().block(entry).unwrap().insts().iter()
            .filter_map(|inst| match inst {
                Inst::Const { ty, bits, .. } => Some((*ty, *bits)),
                _ => None,
            })
            .collect();
        assert_eq!(consts, vec![(Ty::I8, 1), (Ty::I64, 1)]);
    }
}
