//! Reference executor: walks the block graph directly.
//!
//! Any backend that can run a [`Program`] implements [`Executor`]. The
//! [`Interpreter`] here keeps one `u64` register per SSA value (masked to the
//! value's width), backs the cursor and tape slots with a runtime [`Tape`],
//! and supports cooperative cancellation and a step limit.
//!
//! Cursor bounds policy: moving the cursor never fails, but forming a cell
//! address from a cursor outside the tape traps with
//! [`ExecError::CursorOutOfBounds`].

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, warn};

use crate::ir::{BinOp, BlockId, Function, Inst, Program, Slot, Terminator, Ty, ValueId};
use crate::output::Output;
use crate::tape::Tape;

/// Errors raised while running a compiled program.
#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    /// A cell address was formed from a cursor outside the tape.
    #[error("Cursor out of bounds in block '{block}' (cursor={cursor})")]
    CursorOutOfBounds { cursor: i64, block: String },

    /// Execution aborted due to step limit.
    #[error("Execution aborted: step limit exceeded ({limit})")]
    StepLimitExceeded { limit: usize },

    /// Execution aborted due to cooperative cancellation (e.g., timeout)
    #[error("Execution aborted: cancelled")]
    Canceled,

    /// The block graph violates an invariant the compiler guarantees.
    #[error("Malformed program: {reason}")]
    MalformedProgram { reason: String },
}

fn malformed(reason: impl Into<String>) -> ExecError {
    ExecError::MalformedProgram { reason: reason.into() }
}

/// Runs a finalized program from its entry block until `ret`.
pub trait Executor {
    type Error;

    fn invoke(&mut self, program: &Program, output: &mut dyn Output) -> Result<(), Self::Error>;
}

/// Controls for cooperative cancellation and step limiting.
#[derive(Clone)]
pub struct StepControl {
    pub max_steps: Option<usize>,
    pub cancel_flag: Arc<AtomicBool>,
}

impl StepControl {
    pub fn new(max_steps: Option<usize>, cancel_flag: Arc<AtomicBool>) -> Self {
        Self { max_steps, cancel_flag }
    }
}

#[derive(Default)]
pub struct Interpreter {
    control: Option<StepControl>,
    trace: bool,
    tape: Option<Tape>,
    visits: Vec<usize>,
}

#[derive(Default)]
struct Allocated {
    cursor: bool,
    tape: bool,
}

impl Interpreter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_control(mut self, control: StepControl) -> Self {
        self.control = Some(control);
        self
    }

    /// Print a `STEP | BLOCK | CURSOR | CELL | ACTION` row to stdout for every
    /// block executed.
    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }

    /// Tape left behind by the last invocation, successful or not.
    pub fn tape(&self) -> Option<&Tape> {
        self.tape.as_ref()
    }

    /// How many times each block was entered during the last invocation,
    /// indexed by [`BlockId::index`].
    pub fn visits(&self) -> &[usize] {
        &self.visits
    }

    fn tick(&self, steps: &mut usize) -> Result<(), ExecError> {
        if let Some(ctrl) = self.control.as_ref() {
            if ctrl.cancel_flag.load(Ordering::Relaxed) {
                return Err(ExecError::Canceled);
            }
            if let Some(max) = ctrl.max_steps {
                if *steps >= max {
                    return Err(ExecError::StepLimitExceeded { limit: max });
                }
            }
        }
        *steps += 1;
        Ok(())
    }

    fn execute(
        &mut self,
        program: &Program,
        output: &mut dyn Output,
        tape: &mut Tape,
    ) -> Result<usize, ExecError> {
        let function = program.function();
        let mut regs = Registers { values: vec![0; function.value_count()], function };
        let mut allocated = Allocated::default();
        let mut current = function.entry();
        let mut steps = 0usize;
        let mut blocks_run = 0usize;

        if self.trace {
            println!("STEP | BLOCK              | CURSOR | CELL | ACTION");
            println!("-----+--------------------+--------+------+------------------------------------");
        }

        loop {
            let block = function
                .block(current)
                .ok_or_else(|| malformed(format!("branch to unknown block {current}")))?;
            if let Some(count) = self.visits.get_mut(current.index()) {
                *count += 1;
            }

            for inst in block.insts() {
                self.tick(&mut steps)?;
                match *inst {
                    Inst::Alloca { slot: Slot::Cursor } => allocated.cursor = true,
                    Inst::Alloca { slot: Slot::Tape } => allocated.tape = true,
                    Inst::Const { dst, bits, .. } => regs.set(dst, bits)?,
                    Inst::LoadCursor { dst } => {
                        require(allocated.cursor, Slot::Cursor)?;
                        regs.set(dst, tape.cursor() as u64)?;
                    }
                    Inst::StoreCursor { value } => {
                        require(allocated.cursor, Slot::Cursor)?;
                        tape.set_cursor(regs.get(value)? as i64);
                    }
                    Inst::CellAddr { dst, cursor } => {
                        require(allocated.tape, Slot::Tape)?;
                        let cursor = regs.get(cursor)? as i64;
                        let addr = tape.address(cursor).ok_or_else(|| {
                            ExecError::CursorOutOfBounds { cursor, block: block.label().to_string() }
                        })?;
                        regs.set(dst, addr as u64)?;
                    }
                    Inst::Load { dst, addr } => {
                        let cell = tape
                            .get(regs.get(addr)? as usize)
                            .ok_or_else(|| malformed("load from an address off the tape"))?;
                        regs.set(dst, u64::from(cell))?;
                    }
                    Inst::Store { addr, value } => {
                        let value = regs.get(value)? as u8;
                        tape.set(regs.get(addr)? as usize, value)
                            .ok_or_else(|| malformed("store to an address off the tape"))?;
                    }
                    Inst::Binary { op, dst, lhs, rhs } => {
                        let (lhs, rhs) = (regs.get(lhs)?, regs.get(rhs)?);
                        let raw = match op {
                            BinOp::Add => lhs.wrapping_add(rhs),
                            BinOp::Sub => lhs.wrapping_sub(rhs),
                        };
                        regs.set(dst, raw)?;
                    }
                    Inst::CmpNe { dst, lhs, rhs } => {
                        let ne = regs.get(lhs)? != regs.get(rhs)?;
                        regs.set(dst, u64::from(ne))?;
                    }
                    Inst::SExt { dst, value, to } => {
                        let from = regs.ty(value)?;
                        regs.set(dst, sign_extend(regs.get(value)?, from, to))?;
                    }
                    Inst::Fill { addr, byte, len } => {
                        let byte = regs.get(byte)? as u8;
                        tape.fill(regs.get(addr)? as usize, len, byte)
                            .ok_or_else(|| malformed("fill runs off the tape"))?;
                    }
                    Inst::CallOutput { arg } => {
                        output.put(regs.get(arg)? as u32 as i32);
                    }
                }
            }

            self.tick(&mut steps)?;
            let terminator = block
                .terminator()
                .ok_or_else(|| malformed(format!("block '{}' has no terminator", block.label())))?;
            let next = match *terminator {
                Terminator::Br { target } => Some(target),
                Terminator::CondBr { cond, then_block, else_block } => {
                    Some(if regs.get(cond)? != 0 { then_block } else { else_block })
                }
                Terminator::Ret => None,
            };

            if self.trace {
                let cell = tape.current().map(|c| c.to_string()).unwrap_or_else(|| "-".to_string());
                let action = match next {
                    Some(target) => format!("Branch to {}", label_of(function, target)),
                    None => "Return".to_string(),
                };
                println!(
                    "{:<4} | {:<18} | {:<6} | {:<4} | {}",
                    blocks_run,
                    block.label(),
                    tape.cursor(),
                    cell,
                    action
                );
            }
            blocks_run += 1;

            match next {
                Some(target) => current = target,
                None => return Ok(steps),
            }
        }
    }
}

impl Executor for Interpreter {
    type Error = ExecError;

    fn invoke(&mut self, program: &Program, output: &mut dyn Output) -> Result<(), ExecError> {
        debug!(blocks = program.function().block_count(), "executing program");
        let mut tape = Tape::new(program.tape_len());
        self.visits = vec![0; program.function().block_count()];

        let result = self.execute(program, output, &mut tape);
        self.tape = Some(tape);

        match result {
            Ok(steps) => {
                debug!(steps, "program returned");
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "execution aborted");
                Err(err)
            }
        }
    }
}

/// SSA register file; every write is masked to the value's declared width.
struct Registers<'p> {
    values: Vec<u64>,
    function: &'p Function,
}

impl Registers<'_> {
    fn get(&self, value: ValueId) -> Result<u64, ExecError> {
        self.values
            .get(value.index())
            .copied()
            .ok_or_else(|| malformed(format!("use of undefined value {value}")))
    }

    fn ty(&self, value: ValueId) -> Result<Ty, ExecError> {
        self.function
            .value_type(value)
            .ok_or_else(|| malformed(format!("value {value} has no type")))
    }

    fn set(&mut self, value: ValueId, raw: u64) -> Result<(), ExecError> {
        let mask = self.ty(value)?.mask();
        let slot = self
            .values
            .get_mut(value.index())
            .ok_or_else(|| malformed(format!("definition of unknown value {value}")))?;
        *slot = raw & mask;
        Ok(())
    }
}

fn require(allocated: bool, slot: Slot) -> Result<(), ExecError> {
    if allocated {
        Ok(())
    } else {
        Err(malformed(format!("{slot} used before alloca")))
    }
}

fn sign_extend(raw: u64, from: Ty, to: Ty) -> u64 {
    let value = raw & from.mask();
    let sign = 1u64 << (from.bits() - 1);
    let extended = if value & sign != 0 { value | !from.mask() } else { value };
    extended & to.mask()
}

fn label_of(function: &Function, id: BlockId) -> &str {
    function.block(id).map(|b| b.label()).unwrap_or("<unknown>")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assemble::compile;

    fn run(source: &str) -> (Interpreter, Vec<i32>) {
        let program = compile(source).expect("program should compile");
        let mut interp = Interpreter::new();
        let mut out = Vec::new();
        interp.invoke(&program, &mut out).expect("program should run");
        (interp, out)
    }

    fn cells(interp: &Interpreter, n: usize) -> Vec<u8> {
        interp.tape().unwrap().cells()[..n].to_vec()
    }

    #[test]
    fn plus_plus_dot_outputs_two_once() {
        let (_, out) = run("++.");
        assert_eq!(out, vec![2]);
    }

    #[test]
    fn empty_program_outputs_nothing() {
        let (interp, out) = run("");
        assert!(out.is_empty());
        assert_eq!(interp.visits(), &[1]);
        assert!(interp.tape().unwrap().cells().iter().all(|&c| c == 0));
    }

    #[test]
    fn cell_increment_wraps_to_zero() {
        let (interp, _) = run(&"+".repeat(256));
        assert_eq!(cells(&interp, 1), vec![0]);
    }

    #[test]
    fn cell_decrement_wraps_to_255() {
        let (interp, out) = run("-.");
        assert_eq!(cells(&interp, 1), vec![255]);
        // sign-extended on the way out
        assert_eq!(out, vec![-1]);
    }

    #[test]
    fn cursor_wraps_in_64_bits_without_trapping() {
        let (interp, _) = run("<");
        assert_eq!(interp.tape().unwrap().cursor(), -1);
        let (interp, _) = run("<>");
        assert_eq!(interp.tape().unwrap().cursor(), 0);
    }

    #[test]
    fn dereferencing_off_tape_traps() {
        let program = compile("<+").unwrap();
        let mut out = Vec::new();
        let err = Interpreter::new().invoke(&program, &mut out).unwrap_err();
        assert!(matches!(err, ExecError::CursorOutOfBounds { cursor: -1, .. }));
    }

    #[test]
    fn clear_loop_runs_body_once_per_unit() {
        for v in [1usize, 2, 17, 255] {
            let source = format!("{}[-]", "+".repeat(v));
            let program = compile(&source).unwrap();
            let body = program.function().find_block("loop.body").unwrap();
            let mut interp = Interpreter::new();
            interp.invoke(&program, &mut Vec::new()).unwrap();
            assert_eq!(interp.tape().unwrap().cells()[0], 0);
            assert_eq!(interp.visits()[body.index()], v);
        }
    }

    #[test]
    fn copy_loop_moves_cell_zero_into_cell_one() {
        for v in [1usize, 5, 200, 255] {
            let source = format!("{}[>+<-]", "+".repeat(v));
            let (interp, _) = run(&source);
            assert_eq!(cells(&interp, 2), vec![0, v as u8]);
        }
    }

    #[test]
    fn empty_loop_on_zero_cell_is_a_no_op() {
        let (interp, out) = run("[]");
        assert!(out.is_empty());
        assert_eq!(cells(&interp, 1), vec![0]);
    }

    #[test]
    fn nested_loops_multiply() {
        // 3 * 4 into cell 2
        let (interp, _) = run("+++[>++++[>+<-]<-]");
        assert_eq!(cells(&interp, 3), vec![0, 0, 12]);
    }

    #[test]
    fn hello_world() {
        let code = "++++++++++[>+++++++>++++++++++>+++>+<<<<-]>++.>+.+++++++..+++.>++.<<+++++++++++++++.>.+++.------.--------.>+.>.";
        let (_, out) = run(code);
        let text: String = out.iter().map(|&v| v as u8 as char).collect();
        assert_eq!(text, "Hello World!\n");
    }

    #[test]
    fn step_limit_aborts_infinite_loop() {
        let program = compile("+[]").unwrap();
        let ctrl = StepControl::new(Some(1_000), Arc::new(AtomicBool::new(false)));
        let err = Interpreter::new().with_control(ctrl).invoke(&program, &mut Vec::new()).unwrap_err();
        assert!(matches!(err, ExecError::StepLimitExceeded { limit: 1_000 }));
    }

    #[test]
    fn cancel_flag_aborts_before_running() {
        let program = compile("+").unwrap();
        let ctrl = StepControl::new(None, Arc::new(AtomicBool::new(true)));
        let err = Interpreter::new().with_control(ctrl).invoke(&program, &mut Vec::new()).unwrap_err();
        assert!(matches!(err, ExecError::Canceled));
    }

    #[test]
    fn sign_extension() {
        assert_eq!(sign_extend(0x7f, Ty::I8, Ty::I32), 0x7f);
        assert_eq!(sign_extend(0x80, Ty::I8, Ty::I32), 0xffff_ff80);
        assert_eq!(sign_extend(0xff, Ty::I8, Ty::I64), u64::MAX);
    }
}
