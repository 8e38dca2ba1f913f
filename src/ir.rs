//! Block-graph intermediate representation.
//!
//! A [`Program`] owns a single [`Function`] whose body is an arena of
//! [`Block`]s. Every block is a straight-line list of [`Inst`]s closed by one
//! [`Terminator`]. Instructions produce numbered, typed SSA values
//! ([`ValueId`]); the type of every value is recorded on the function.
//!
//! The `Display` impls render the graph in a small LLVM-like text form, which
//! is what `bf ir` prints.

use std::fmt;

/// Index of a block inside its function's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(pub(crate) usize);

impl BlockId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bb{}", self.0)
    }
}

/// An SSA value produced by exactly one instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ValueId(pub(crate) usize);

impl ValueId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ValueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{}", self.0)
    }
}

/// Value types. `Ptr` values address a tape cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ty {
    I1,
    I8,
    I32,
    I64,
    Ptr,
}

impl Ty {
    /// Width in bits.
    pub fn bits(self) -> u32 {
        match self {
            Ty::I1 => 1,
            Ty::I8 => 8,
            Ty::I32 => 32,
            Ty::I64 | Ty::Ptr => 64,
        }
    }

    /// Bit mask selecting the low `bits()` bits of a `u64`.
    pub fn mask(self) -> u64 {
        match self.bits() {
            64 => u64::MAX,
            n => (1u64 << n) - 1,
        }
    }

    pub fn is_integer(self) -> bool {
        !matches!(self, Ty::Ptr)
    }
}

impl fmt::Display for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Ty::I1 => "i1",
            Ty::I8 => "i8",
            Ty::I32 => "i32",
            Ty::I64 => "i64",
            Ty::Ptr => "ptr",
        };
        f.write_str(name)
    }
}

/// Storage owned by the program's single function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    /// The signed 64-bit cursor.
    Cursor,
    /// The byte tape.
    Tape,
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Slot::Cursor => f.write_str("@cursor"),
            Slot::Tape => f.write_str("@tape"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BinOp::Add => f.write_str("add"),
            BinOp::Sub => f.write_str("sub"),
        }
    }
}

/// A non-terminating operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inst {
    Alloca { slot: Slot },
    Const { dst: ValueId, ty: Ty, bits: u64 },
    LoadCursor { dst: ValueId },
    StoreCursor { value: ValueId },
    /// `&tape[cursor]`
    CellAddr { dst: ValueId, cursor: ValueId },
    Load { dst: ValueId, addr: ValueId },
    Store { addr: ValueId, value: ValueId },
    Binary { op: BinOp, dst: ValueId, lhs: ValueId, rhs: ValueId },
    CmpNe { dst: ValueId, lhs: ValueId, rhs: ValueId },
    SExt { dst: ValueId, value: ValueId, to: Ty },
    /// Set `len` cells starting at `addr` to `byte`.
    Fill { addr: ValueId, byte: ValueId, len: usize },
    CallOutput { arg: ValueId },
}

impl Inst {
    /// The value this instruction defines, if any.
    pub fn result(&self) -> Option<ValueId> {
        match *self {
            Inst::Const { dst, .. }
            | Inst::LoadCursor { dst }
            | Inst::CellAddr { dst, .. }
            | Inst::Load { dst, .. }
            | Inst::Binary { dst, .. }
            | Inst::CmpNe { dst, .. }
            | Inst::SExt { dst, .. } => Some(dst),
            Inst::Alloca { .. }
            | Inst::StoreCursor { .. }
            | Inst::Store { .. }
            | Inst::Fill { .. }
            | Inst::CallOutput { .. } => None,
        }
    }
}

impl fmt::Display for Inst {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Inst::Alloca { slot } => write!(f, "alloca {slot}"),
            Inst::Const { dst, ty, bits } => write!(f, "{dst} = const {ty} {bits}"),
            Inst::LoadCursor { dst } => write!(f, "{dst} = load i64, {}", Slot::Cursor),
            Inst::StoreCursor { value } => write!(f, "store i64 {value}, {}", Slot::Cursor),
            Inst::CellAddr { dst, cursor } => {
                write!(f, "{dst} = cell_addr {}, i64 {cursor}", Slot::Tape)
            }
            Inst::Load { dst, addr } => write!(f, "{dst} = load i8, ptr {addr}"),
            Inst::Store { addr, value } => write!(f, "store i8 {value}, ptr {addr}"),
            Inst::Binary { op, dst, lhs, rhs } => write!(f, "{dst} = {op} {lhs}, {rhs}"),
            Inst::CmpNe { dst, lhs, rhs } => write!(f, "{dst} = icmp ne {lhs}, {rhs}"),
            Inst::SExt { dst, value, to } => write!(f, "{dst} = sext {value} to {to}"),
            Inst::Fill { addr, byte, len } => write!(f, "fill ptr {addr}, i8 {byte}, {len}"),
            Inst::CallOutput { arg } => write!(f, "call @output(i32 {arg})"),
        }
    }
}

/// How a block hands off control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Terminator {
    Br { target: BlockId },
    /// Branch to `then_block` when `cond` is non-zero, else to `else_block`.
    CondBr { cond: ValueId, then_block: BlockId, else_block: BlockId },
    Ret,
}

impl Terminator {
    pub fn successors(&self) -> Vec<BlockId> {
        match *self {
            Terminator::Br { target } => vec![target],
            Terminator::CondBr { then_block, else_block, .. } => vec![then_block, else_block],
            Terminator::Ret => Vec::new(),
        }
    }
}

/// A labelled straight-line run of instructions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub(crate) label: String,
    pub(crate) insts: Vec<Inst>,
    pub(crate) terminator: Option<Terminator>,
}

impl Block {
    pub(crate) fn new(label: String) -> Self {
        Self { label, insts: Vec::new(), terminator: None }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn insts(&self) -> &[Inst] {
        &self.insts
    }

    pub fn terminator(&self) -> Option<&Terminator> {
        self.terminator.as_ref()
    }

    pub fn is_terminated(&self) -> bool {
        self.terminator.is_some()
    }
}

/// A function body: block arena plus the type of every SSA value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Function {
    pub(crate) name: String,
    pub(crate) blocks: Vec<Block>,
    pub(crate) value_types: Vec<Ty>,
}

impl Function {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), blocks: Vec::new(), value_types: Vec::new() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The entry block is always the first block created.
    pub fn entry(&self) -> BlockId {
        BlockId(0)
    }

    pub fn block(&self, id: BlockId) -> Option<&Block> {
        self.blocks.get(id.0)
    }

    pub fn blocks(&self) -> impl Iterator<Item = (BlockId, &Block)> {
        self.blocks.iter().enumerate().map(|(i, b)| (BlockId(i), b))
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    pub fn value_type(&self, value: ValueId) -> Option<Ty> {
        self.value_types.get(value.0).copied()
    }

    pub fn value_count(&self) -> usize {
        self.value_types.len()
    }

    /// First block carrying `label`, if any.
    pub fn find_block(&self, label: &str) -> Option<BlockId> {
        self.blocks.iter().position(|b| b.label == label).map(BlockId)
    }
}

/// Declaration of the single side-effecting primitive a program may call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputDecl {
    pub name: &'static str,
    pub param: Ty,
}

impl Default for OutputDecl {
    fn default() -> Self {
        Self { name: "output", param: Ty::I32 }
    }
}

/// A finalized, immutable program ready to hand to an executor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    function: Function,
    output: OutputDecl,
    tape_len: usize,
}

impl Program {
    pub(crate) fn new(function: Function, output: OutputDecl, tape_len: usize) -> Self {
        Self { function, output, tape_len }
    }

    pub fn function(&self) -> &Function {
        &self.function
    }

    pub fn entry(&self) -> BlockId {
        self.function.entry()
    }

    pub fn output(&self) -> OutputDecl {
        self.output
    }

    pub fn tape_len(&self) -> usize {
        self.tape_len
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "declare void @{}({})", self.output.name, self.output.param)?;
        writeln!(f, "global {} = [{} x i8]", Slot::Tape, self.tape_len)?;
        writeln!(f, "global {} = i64", Slot::Cursor)?;
        writeln!(f)?;
        writeln!(f, "define void @{}() {{", self.function.name)?;
        for (i, (_, block)) in self.function.blocks().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            writeln!(f, "{}:", block.label)?;
            for inst in &block.insts {
                writeln!(f, "  {inst}")?;
            }
            let label_of = |id: BlockId| {
                self.function.block(id).map(|b| b.label.as_str()).unwrap_or("<unknown>")
            };
            match block.terminator {
                Some(Terminator::Br { target }) => writeln!(f, "  br label %{}", label_of(target))?,
                Some(Terminator::CondBr { cond, then_block, else_block }) => writeln!(
                    f,
                    "  br i1 {cond}, label %{}, label %{}",
                    label_of(then_block),
                    label_of(else_block)
                )?,
                Some(Terminator::Ret) => writeln!(f, "  ret void")?,
                None => writeln!(f, "  ; <unterminated>")?,
            }
        }
        writeln!(f, "}}")
    }
}
