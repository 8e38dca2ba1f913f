//! Block graph construction.
//!
//! [`BlockGraphBuilder`] owns the function under construction and one explicit
//! [`InsertPoint`]. Non-terminating instructions are appended to the block at
//! the insertion point; terminating a block clears the insertion point, so it
//! must be set again before anything else is appended.

use std::collections::HashMap;

use tracing::trace;

use crate::error::BuildError;
use crate::ir::{BinOp, Block, BlockId, Function, Inst, Slot, Terminator, Ty, ValueId};

/// The block currently being appended to, if any.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InsertPoint {
    current: Option<BlockId>,
}

impl InsertPoint {
    pub fn block(&self) -> Option<BlockId> {
        self.current
    }
}

pub struct BlockGraphBuilder {
    function: Function,
    insert: InsertPoint,
    label_uses: HashMap<String, usize>,
}

impl BlockGraphBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            function: Function::new(name),
            insert: InsertPoint::default(),
            label_uses: HashMap::new(),
        }
    }

    /// Create an empty, unterminated block. Repeated labels get a `.N` suffix.
    pub fn create_block(&mut self, label: &str) -> BlockId {
        let uses = self.label_uses.entry(label.to_string()).or_insert(0);
        let unique = if *uses == 0 { label.to_string() } else { format!("{label}.{uses}") };
        *uses += 1;

        let id = BlockId(self.function.blocks.len());
        trace!(block = %id, label = %unique, "block created");
        self.function.blocks.push(Block::new(unique));
        id
    }

    pub fn set_insertion_point(&mut self, block: BlockId) -> Result<(), BuildError> {
        if self.function.block(block).is_none() {
            return Err(BuildError::UnknownBlock(block));
        }
        self.insert.current = Some(block);
        Ok(())
    }

    pub fn insertion_point(&self) -> InsertPoint {
        self.insert
    }

    pub fn function(&self) -> &Function {
        &self.function
    }

    pub fn value_type(&self, value: ValueId) -> Result<Ty, BuildError> {
        self.function.value_type(value).ok_or(BuildError::UnknownValue(value))
    }

    /// Append one non-terminating instruction at the insertion point.
    pub fn append(&mut self, inst: Inst) -> Result<(), BuildError> {
        let block = self.open_block()?;
        self.function.blocks[block.0].insts.push(inst);
        Ok(())
    }

    /// Close the insertion-point block and clear the insertion point.
    pub fn terminate(&mut self, terminator: Terminator) -> Result<(), BuildError> {
        let block = self.open_block()?;
        for target in terminator.successors() {
            if self.function.block(target).is_none() {
                return Err(BuildError::UnknownBlock(target));
            }
        }
        if let Terminator::CondBr { cond, .. } = terminator {
            self.expect_ty(cond, Ty::I1)?;
        }

        self.function.blocks[block.0].terminator = Some(terminator);
        self.insert.current = None;
        Ok(())
    }

    /// Hand over the finished function. Every block must be terminated.
    pub fn finish(self) -> Result<Function, BuildError> {
        if let Some(block) = self.function.blocks.iter().find(|b| !b.is_terminated()) {
            return Err(BuildError::Unterminated { label: block.label.clone() });
        }
        Ok(self.function)
    }

    pub fn alloca(&mut self, slot: Slot) -> Result<(), BuildError> {
        self.append(Inst::Alloca { slot })
    }

    pub fn iconst(&mut self, ty: Ty, bits: u64) -> Result<ValueId, BuildError> {
        if !ty.is_integer() {
            return Err(BuildError::TypeMismatch { expected: Ty::I64, found: ty });
        }
        self.emit(ty, |dst| Inst::Const { dst, ty, bits: bits & ty.mask() })
    }

    pub fn load_cursor(&mut self) -> Result<ValueId, BuildError> {
        self.emit(Ty::I64, |dst| Inst::LoadCursor { dst })
    }

    pub fn store_cursor(&mut self, value: ValueId) -> Result<(), BuildError> {
        self.expect_ty(value, Ty::I64)?;
        self.append(Inst::StoreCursor { value })
    }

    pub fn cell_addr(&mut self, cursor: ValueId) -> Result<ValueId, BuildError> {
        self.expect_ty(cursor, Ty::I64)?;
        self.emit(Ty::Ptr, |dst| Inst::CellAddr { dst, cursor })
    }

    pub fn load(&mut self, addr: ValueId) -> Result<ValueId, BuildError> {
        self.expect_ty(addr, Ty::Ptr)?;
        self.emit(Ty::I8, |dst| Inst::Load { dst, addr })
    }

    pub fn store(&mut self, addr: ValueId, value: ValueId) -> Result<(), BuildError> {
        self.expect_ty(addr, Ty::Ptr)?;
        self.expect_ty(value, Ty::I8)?;
        self.append(Inst::Store { addr, value })
    }

    pub fn add(&mut self, lhs: ValueId, rhs: ValueId) -> Result<ValueId, BuildError> {
        self.binary(BinOp::Add, lhs, rhs)
    }

    pub fn sub(&mut self, lhs: ValueId, rhs: ValueId) -> Result<ValueId, BuildError> {
        self.binary(BinOp::Sub, lhs, rhs)
    }

    pub fn cmp_ne(&mut self, lhs: ValueId, rhs: ValueId) -> Result<ValueId, BuildError> {
        let ty = self.value_type(lhs)?;
        self.expect_ty(rhs, ty)?;
        self.emit(Ty::I1, |dst| Inst::CmpNe { dst, lhs, rhs })
    }

    pub fn sext(&mut self, value: ValueId, to: Ty) -> Result<ValueId, BuildError> {
        let from = self.value_type(value)?;
        if !from.is_integer() || !to.is_integer() || from.bits() >= to.bits() {
            return Err(BuildError::InvalidExtension { from, to });
        }
        self.emit(to, |dst| Inst::SExt { dst, value, to })
    }

    pub fn fill(&mut self, addr: ValueId, byte: ValueId, len: usize) -> Result<(), BuildError> {
        self.expect_ty(addr, Ty::Ptr)?;
        self.expect_ty(byte, Ty::I8)?;
        self.append(Inst::Fill { addr, byte, len })
    }

    /// Call the output primitive; `param` is its declared parameter type.
    pub fn call_output(&mut self, arg: ValueId, param: Ty) -> Result<(), BuildError> {
        self.expect_ty(arg, param)?;
        self.append(Inst::CallOutput { arg })
    }

    fn binary(&mut self, op: BinOp, lhs: ValueId, rhs: ValueId) -> Result<ValueId, BuildError> {
        let ty = self.value_type(lhs)?;
        if !ty.is_integer() {
            return Err(BuildError::TypeMismatch { expected: Ty::I64, found: ty });
        }
        self.expect_ty(rhs, ty)?;
        self.emit(ty, |dst| Inst::Binary { op, dst, lhs, rhs })
    }

    fn expect_ty(&self, value: ValueId, expected: Ty) -> Result<(), BuildError> {
        let found = self.value_type(value)?;
        if found != expected {
            return Err(BuildError::TypeMismatch { expected, found });
        }
        Ok(())
    }

    // Allocates the result value only once the insertion point is known to be open.
    fn emit(&mut self, ty: Ty, make: impl FnOnce(ValueId) -> Inst) -> Result<ValueId, BuildError> {
        let block = self.open_block()?;
        let dst = ValueId(self.function.value_types.len());
        self.function.value_types.push(ty);
        self.function.blocks[block.0].insts.push(make(dst));
        Ok(dst)
    }

    fn open_block(&self) -> Result<BlockId, BuildError> {
        let block = self.insert.current.ok_or(BuildError::NoInsertionPoint)?;
        let data = self.function.block(block).ok_or(BuildError::UnknownBlock(block))?;
        if data.is_terminated() {
            return Err(BuildError::BlockTerminated { label: data.label.clone() });
        }
        Ok(block)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder_at_entry() -> (BlockGraphBuilder, BlockId) {
        let mut b = BlockGraphBuilder::new("test");
        let entry = b.create_block("entry");
        b.set_insertion_point(entry).unwrap();
        (b, entry)
    }

    #[test]
    fn append_without_insertion_point_fails() {
        let mut b = BlockGraphBuilder::new("test");
        b.create_block("entry");
        assert_eq!(b.load_cursor(), Err(BuildError::NoInsertionPoint));
        assert_eq!(b.function().value_count(), 0);
    }

    #[test]
    fn terminate_clears_insertion_point() {
        let (mut b, entry) = builder_at_entry();
        assert_eq!(b.insertion_point().block(), Some(entry));
        b.terminate(Terminator::Ret).unwrap();
        assert_eq!(b.insertion_point().block(), None);
        assert_eq!(b.alloca(Slot::Cursor), Err(BuildError::NoInsertionPoint));
    }

    #[test]
    fn append_to_terminated_block_fails() {
        let (mut b, entry) = builder_at_entry();
        b.terminate(Terminator::Ret).unwrap();
        b.set_insertion_point(entry).unwrap();
        assert!(matches!(
            b.alloca(Slot::Tape),
            Err(BuildError::BlockTerminated { label }) if label == "entry"
        ));
    }

    #[test]
    fn duplicate_labels_are_suffixed() {
        let mut b = BlockGraphBuilder::new("test");
        let first = b.create_block("loop.check");
        let second = b.create_block("loop.check");
        let f = b.function();
        assert_eq!(f.block(first).unwrap().label(), "loop.check");
        assert_eq!(f.block(second).unwrap().label(), "loop.check.1");
    }

    #[test]
    fn operand_types_are_checked() {
        let (mut b, _) = builder_at_entry();
        let cursor = b.load_cursor().unwrap();
        assert_eq!(
            b.load(cursor),
            Err(BuildError::TypeMismatch { expected: Ty::Ptr, found: Ty::I64 })
        );

        let addr = b.cell_addr(cursor).unwrap();
        let cell = b.load(addr).unwrap();
        let one64 = b.iconst(Ty::I64, 1).unwrap();
        assert_eq!(
            b.add(cell, one64),
            Err(BuildError::TypeMismatch { expected: Ty::I8, found: Ty::I64 })
        );
        assert_eq!(
            b.call_output(cell, Ty::I32),
            Err(BuildError::TypeMismatch { expected: Ty::I32, found: Ty::I8 })
        );
    }

    #[test]
    fn sext_only_widens() {
        let (mut b, _) = builder_at_entry();
        let wide = b.iconst(Ty::I32, 7).unwrap();
        assert_eq!(
            b.sext(wide, Ty::I8),
            Err(BuildError::InvalidExtension { from: Ty::I32, to: Ty::I8 })
        );
        let narrow = b.iconst(Ty::I8, 7).unwrap();
        let extended = b.sext(narrow, Ty::I32).unwrap();
        assert_eq!(b.value_type(extended), Ok(Ty::I32));
    }

    #[test]
    fn condbr_requires_i1_condition() {
        let (mut b, _) = builder_at_entry();
        let yes = b.create_block("yes");
        let no = b.create_block("no");
        let not_bool = b.iconst(Ty::I8, 1).unwrap();
        assert_eq!(
            b.terminate(Terminator::CondBr { cond: not_bool, then_block: yes, else_block: no }),
            Err(BuildError::TypeMismatch { expected: Ty::I1, found: Ty::I8 })
        );
    }

    #[test]
    fn branch_to_unknown_block_fails() {
        let (mut b, _) = builder_at_entry();
        let missing = BlockId(42);
        assert_eq!(
            b.terminate(Terminator::Br { target: missing }),
            Err(BuildError::UnknownBlock(missing))
        );
    }

    #[test]
    fn finish_rejects_unterminated_blocks() {
        let (mut b, _) = builder_at_entry();
        b.create_block("dangling");
        b.terminate(Terminator::Ret).unwrap();
        assert_eq!(
            b.finish().err(),
            Some(BuildError::Unterminated { label: "dangling".to_string() })
        );
    }
}
