//! Fetch-execute loop over a loaded IPPcode19 program.

mod debug;
mod ops;

use std::rc::Rc;

use ippcode_core::error_codes;
use ippcode_core::strings::decode_escapes;
use ippcode_core::{FrameKind, Instruction, OpCode, Program};
use thiserror::Error;
use tracing::{debug, trace, warn};

use crate::frames::FrameStore;
use crate::io::{convert_input, LineSource, ScriptedLines, Sink};
use crate::labels::LabelTable;
use crate::stacks::{CallStack, DataStack};
use crate::stats::RunStats;

/// Type alias for the debug callback to simplify signatures.
pub type DebugCallback = Option<Box<dyn FnMut(&DebugEvent)>>;

/// Events emitted during execution, for step tracing and tests.
#[derive(Debug, Clone, PartialEq)]
pub enum DebugEvent {
    /// About to execute the instruction at `index`.
    Step {
        index: usize,
        order: u32,
        opcode: OpCode,
    },
    /// Control moved from the instruction at `from` to the one at `to`.
    Jump { from: usize, to: usize },
}

#[derive(Debug, Error)]
pub enum VmError {
    #[error("instruction order {found} out of sequence, expected {expected}")]
    OutOfSequence { expected: u32, found: u32 },
    #[error("no program loaded")]
    NoProgram,
    #[error("duplicate label '{0}'")]
    DuplicateLabel(String),
    #[error("undefined label '{0}'")]
    UndefinedLabel(String),
    #[error("{opcode} expects operands ({expected}), got ({found})")]
    BadOperands {
        opcode: OpCode,
        expected: String,
        found: String,
    },
    #[error("variable {0} is already declared")]
    Redeclared(String),
    #[error("type error: {0}")]
    TypeMismatch(String),
    #[error("undefined variable {0}")]
    UndefinedVariable(String),
    #[error("frame {0} is not defined")]
    NoFrame(FrameKind),
    #[error("variable {0} has no value")]
    UninitializedVariable(String),
    #[error("data stack is empty")]
    DataStackEmpty,
    #[error("call stack is empty")]
    CallStackEmpty,
    #[error("division by zero")]
    DivisionByZero,
    #[error("exit value {0} is outside 0..=49")]
    BadExitValue(i64),
    #[error("index {index} out of range for string of length {len}")]
    IndexOutOfRange { index: i64, len: usize },
    #[error("invalid value: {0}")]
    BadValue(String),
    #[error("cannot read input: {0}")]
    Input(std::io::Error),
    #[error("cannot write output: {0}")]
    Output(std::io::Error),
    #[error("{inner}\n  at instruction {order} ({opcode}, index {index})")]
    Located {
        inner: Box<VmError>,
        order: u32,
        opcode: OpCode,
        index: usize,
    },
}

impl VmError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            VmError::OutOfSequence { .. } => error_codes::MALFORMED_PROGRAM,
            VmError::NoProgram => error_codes::MALFORMED_PROGRAM,
            VmError::DuplicateLabel(_)
            | VmError::UndefinedLabel(_)
            | VmError::BadOperands { .. }
            | VmError::Redeclared(_) => error_codes::SEMANTIC,
            VmError::TypeMismatch(_) => error_codes::OPERAND_TYPE,
            VmError::UndefinedVariable(_) => error_codes::UNDEFINED_VARIABLE,
            VmError::NoFrame(_) => error_codes::UNDEFINED_FRAME,
            VmError::UninitializedVariable(_)
            | VmError::DataStackEmpty
            | VmError::CallStackEmpty => error_codes::MISSING_VALUE,
            VmError::DivisionByZero | VmError::BadExitValue(_) => error_codes::BAD_OPERAND_VALUE,
            VmError::IndexOutOfRange { .. } | VmError::BadValue(_) => {
                error_codes::STRING_OPERATION
            }
            VmError::Input(_) => error_codes::INPUT_FILE,
            VmError::Output(_) => error_codes::OUTPUT_FILE,
            VmError::Located { inner, .. } => inner.exit_code(),
        }
    }

    /// Attach the failing instruction. Never wraps twice.
    pub fn with_location(self, instr: &Instruction, index: usize) -> Self {
        if matches!(self, VmError::Located { .. }) {
            return self;
        }
        VmError::Located {
            inner: Box::new(self),
            order: instr.order,
            opcode: instr.opcode,
            index,
        }
    }

    /// The underlying error, looking through `Located`.
    pub fn root(&self) -> &VmError {
        match self {
            VmError::Located { inner, .. } => inner.root(),
            other => other,
        }
    }

    /// Check if the error message contains a specific string (works through the `Located` wrapper).
    pub fn message_contains(&self, needle: &str) -> bool {
        self.root().to_string().contains(needle)
    }

    pub(crate) fn bad_operands(instr: &Instruction) -> Self {
        let expected = instr
            .opcode
            .signature()
            .iter()
            .map(|k| k.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        let found = instr
            .args
            .iter()
            .map(|a| a.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        VmError::BadOperands {
            opcode: instr.opcode,
            expected,
            found,
        }
    }

    pub(crate) fn type_error(opcode: OpCode, expected: &str, actual: &ippcode_core::Value) -> Self {
        VmError::TypeMismatch(format!(
            "{} expects {}, got {}",
            opcode,
            expected,
            actual.data_type()
        ))
    }
}

/// What the dispatch loop does after a handler returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    /// Advance to the next instruction (or the pending jump).
    Next,
    /// Stop with this exit code.
    Exit(i32),
}

/// The IPPcode19 interpreter. One instance runs one program at a time.
pub struct VM {
    pub(crate) program: Option<Rc<Program>>,
    pub(crate) labels: LabelTable,
    pub(crate) frames: FrameStore,
    pub(crate) data_stack: DataStack,
    pub(crate) call_stack: CallStack,
    /// Index of the instruction being executed.
    pub(crate) ip: usize,
    pub(crate) pending_jump: Option<usize>,
    /// Order number the next fetched instruction must carry.
    pub(crate) expected_order: u32,
    pub(crate) stats: RunStats,
    input: Box<dyn LineSource>,
    /// Program output (`WRITE`).
    pub output: Sink,
    /// Diagnostics (`DPRINT`, `BREAK`).
    pub diagnostics: Sink,
    /// Optional debug callback for step tracing
    pub debug_callback: DebugCallback,
}

impl VM {
    pub fn new() -> Self {
        Self {
            program: None,
            labels: LabelTable::new(),
            frames: FrameStore::new(),
            data_stack: DataStack::new(),
            call_stack: CallStack::new(),
            ip: 0,
            pending_jump: None,
            expected_order: 1,
            stats: RunStats::new(),
            input: Box::new(ScriptedLines::default()),
            output: Sink::captured(),
            diagnostics: Sink::captured(),
            debug_callback: None,
        }
    }

    /// Load a program, discarding all state from a previous run.
    pub fn load(&mut self, program: Program) {
        self.program = Some(Rc::new(program));
        self.labels = LabelTable::new();
        self.frames = FrameStore::new();
        self.data_stack = DataStack::new();
        self.call_stack = CallStack::new();
        self.ip = 0;
        self.pending_jump = None;
        self.expected_order = 1;
        self.stats = RunStats::new();
    }

    pub fn set_input(&mut self, input: Box<dyn LineSource>) {
        self.input = input;
    }

    pub fn set_output(&mut self, sink: Sink) {
        self.output = sink;
    }

    pub fn set_diagnostics(&mut self, sink: Sink) {
        self.diagnostics = sink;
    }

    pub fn stats(&self) -> RunStats {
        self.stats
    }

    pub fn frames(&self) -> &FrameStore {
        &self.frames
    }

    pub fn data_stack(&self) -> &DataStack {
        &self.data_stack
    }

    pub fn call_stack(&self) -> &CallStack {
        &self.call_stack
    }

    fn emit_debug_event(&mut self, event: DebugEvent) {
        if let Some(ref mut cb) = self.debug_callback {
            cb(&event);
        }
    }

    /// Run the loaded program to completion.
    ///
    /// Returns the exit code: 0 when execution runs past the last
    /// instruction, or the value given to `EXIT`.
    pub fn execute(&mut self) -> Result<i32, VmError> {
        let program = self.program.clone().ok_or(VmError::NoProgram)?;
        self.labels = LabelTable::build(&program.instructions)?;

        let result = self.run(&program);
        let flushed = self
            .output
            .flush()
            .and_then(|_| self.diagnostics.flush())
            .map_err(VmError::Output);
        match result {
            Ok(code) => {
                flushed?;
                debug!(code, instructions = self.stats.instructions, "program finished");
                Ok(code)
            }
            Err(err) => {
                debug!(code = err.exit_code(), "program aborted: {}", err);
                Err(err)
            }
        }
    }

    fn run(&mut self, program: &Program) -> Result<i32, VmError> {
        self.ip = 0;
        self.expected_order = 1;
        self.pending_jump = None;
        loop {
            let Some(instr) = program.instructions.get(self.ip) else {
                return Ok(error_codes::SUCCESS);
            };
            if instr.order != self.expected_order {
                return Err(VmError::OutOfSequence {
                    expected: self.expected_order,
                    found: instr.order,
                });
            }

            trace!(index = self.ip, order = instr.order, "{}", instr);
            self.emit_debug_event(DebugEvent::Step {
                index: self.ip,
                order: instr.order,
                opcode: instr.opcode,
            });

            let flow = self
                .dispatch(instr)
                .map_err(|err| err.with_location(instr, self.ip))?;
            self.stats.record(self.frames.initialized_count());
            if let Flow::Exit(code) = flow {
                return Ok(code);
            }
            match self.pending_jump.take() {
                Some(target) => {
                    self.emit_debug_event(DebugEvent::Jump {
                        from: self.ip,
                        to: target,
                    });
                    self.ip = target;
                    self.expected_order = target as u32 + 1;
                }
                None => {
                    self.ip += 1;
                    self.expected_order += 1;
                }
            }
        }
    }

    fn dispatch(&mut self, instr: &Instruction) -> Result<Flow, VmError> {
        ops::check_operands(instr)?;
        match instr.opcode {
            // Frames and variables
            OpCode::Move => {
                let value = self.symbol(instr, 1)?;
                self.store(instr, value)?;
            }
            OpCode::CreateFrame => self.frames.create_temporary(),
            OpCode::PushFrame => self.frames.push_temporary()?,
            OpCode::DefVar => {
                let var = ops::var_arg(instr, 0)?;
                self.frames.declare(var)?;
            }

            // Calls
            OpCode::Call => {
                let target = self.label_target(instr, 0)?;
                self.call_stack.push(self.ip + 1);
                self.pending_jump = Some(target);
            }
            OpCode::Return => {
                let target = self.call_stack.pop()?;
                self.pending_jump = Some(target);
            }

            // Data stack
            OpCode::PushS => {
                let value = self.symbol(instr, 0)?;
                self.data_stack.push(value);
            }
            OpCode::PopS => {
                let var = ops::var_arg(instr, 0)?;
                let value = self.data_stack.pop()?;
                self.frames.write(var, value)?;
            }

            // Arithmetic
            OpCode::Add | OpCode::Sub | OpCode::Mul | OpCode::IDiv => self.exec_arithmetic(instr)?,

            // Relational and boolean
            OpCode::Lt | OpCode::Gt | OpCode::Eq => self.exec_relational(instr)?,
            OpCode::And | OpCode::Or | OpCode::Not => self.exec_boolean(instr)?,

            // Conversions
            OpCode::Int2Char => self.exec_int2char(instr)?,
            OpCode::Stri2Int => self.exec_stri2int(instr)?,
            OpCode::Int2Float => self.exec_int2float(instr)?,
            OpCode::Float2Int => self.exec_float2int(instr)?,

            // I/O
            OpCode::Read => self.exec_read(instr)?,
            OpCode::Write => {
                let value = self.symbol(instr, 0)?;
                let text = decode_escapes(&value.output_text());
                self.output.write_text(&text).map_err(VmError::Output)?;
            }

            // Strings
            OpCode::Concat => self.exec_concat(instr)?,
            OpCode::Strlen => self.exec_strlen(instr)?,
            OpCode::GetChar => self.exec_getchar(instr)?,
            OpCode::SetChar => self.exec_setchar(instr)?,

            // Types
            OpCode::Type => self.exec_type(instr)?,

            // Control flow
            OpCode::Label => {}
            OpCode::Jump => {
                let target = self.label_target(instr, 0)?;
                self.pending_jump = Some(target);
            }
            OpCode::JumpIfEq | OpCode::JumpIfNeq => {
                let target = self.label_target(instr, 0)?;
                let equal = self.operands_equal(instr)?;
                if equal == (instr.opcode == OpCode::JumpIfEq) {
                    self.pending_jump = Some(target);
                }
            }
            OpCode::Exit => return self.exec_exit(instr),

            // Debugging
            OpCode::DPrint => {
                let value = self.symbol(instr, 0)?;
                let text = decode_escapes(&value.output_text());
                self.diagnostics.write_line(&text).map_err(VmError::Output)?;
            }
            OpCode::Break => self.exec_break(instr),
        }
        Ok(Flow::Next)
    }

    fn exec_read(&mut self, instr: &Instruction) -> Result<(), VmError> {
        let ty = ops::type_arg(instr, 1)?;
        let line = self.input.next_line().map_err(VmError::Input)?;
        let outcome = convert_input(line.as_deref(), ty);
        if outcome.is_defaulted() {
            warn!(order = instr.order, "READ {}: missing or malformed input, using default", ty);
        }
        self.store(instr, outcome.into_value())
    }

    fn exec_exit(&mut self, instr: &Instruction) -> Result<Flow, VmError> {
        let value = self.symbol(instr, 0)?;
        let code = value
            .as_int()
            .ok_or_else(|| VmError::type_error(instr.opcode, "int", &value))?;
        if !(0..=error_codes::MAX_EXIT_VALUE).contains(&code) {
            return Err(VmError::BadExitValue(code));
        }
        debug!(code, "EXIT");
        Ok(Flow::Exit(code as i32))
    }
}

impl Default for VM {
    fn default() -> Self {
        Self::new()
    }
}
