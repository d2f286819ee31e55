//! Program representation consumed by the interpreter.
//! One `Instruction` per source line, operands already typed by the loader.

use serde::{Deserialize, Serialize};
use std::fmt;
use strum::{Display, EnumCount, EnumIter, EnumString};

use crate::values::{DataType, Value};

/// The fixed IPPcode19 instruction set.
///
/// Names parse case-insensitively (`"pushs"`, `"PushS"` and `"PUSHS"` are the
/// same opcode) and display in upper case.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    EnumCount,
)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
#[serde(rename_all = "UPPERCASE")]
pub enum OpCode {
    // Frames and variables
    Move,
    CreateFrame,
    PushFrame,
    DefVar,

    // Calls
    Call,
    Return,

    // Data stack
    PushS,
    PopS,

    // Arithmetic
    Add,
    Sub,
    Mul,
    IDiv,

    // Relational and boolean
    Lt,
    Gt,
    Eq,
    And,
    Or,
    Not,

    // Conversions
    Int2Char,
    Stri2Int,
    Int2Float,
    Float2Int,

    // I/O
    Read,
    Write,

    // Strings
    Concat,
    Strlen,
    GetChar,
    SetChar,

    // Types
    Type,

    // Control flow
    Label,
    Jump,
    JumpIfEq,
    JumpIfNeq,
    Exit,

    // Debugging
    DPrint,
    Break,
}

/// Kind of operand an opcode expects in a given position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandKind {
    /// Variable reference (`GF@x`).
    Var,
    /// Variable reference or constant.
    Symb,
    /// Label name.
    Label,
    /// Type name (`int`, `string`, ...).
    Type,
}

impl fmt::Display for OperandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OperandKind::Var => "var",
            OperandKind::Symb => "symb",
            OperandKind::Label => "label",
            OperandKind::Type => "type",
        };
        f.write_str(s)
    }
}

impl OpCode {
    /// Operand signature of the opcode, in order.
    pub fn signature(self) -> &'static [OperandKind] {
        use OperandKind::*;
        match self {
            OpCode::CreateFrame | OpCode::PushFrame | OpCode::Return | OpCode::Break => &[],
            OpCode::DefVar | OpCode::PopS => &[Var],
            OpCode::Call | OpCode::Label | OpCode::Jump => &[Label],
            OpCode::PushS | OpCode::Write | OpCode::Exit | OpCode::DPrint => &[Symb],
            OpCode::Move
            | OpCode::Not
            | OpCode::Int2Char
            | OpCode::Int2Float
            | OpCode::Float2Int
            | OpCode::Strlen
            | OpCode::Type => &[Var, Symb],
            OpCode::Read => &[Var, Type],
            OpCode::Add
            | OpCode::Sub
            | OpCode::Mul
            | OpCode::IDiv
            | OpCode::Lt
            | OpCode::Gt
            | OpCode::Eq
            | OpCode::And
            | OpCode::Or
            | OpCode::Stri2Int
            | OpCode::Concat
            | OpCode::GetChar
            | OpCode::SetChar => &[Var, Symb, Symb],
            OpCode::JumpIfEq | OpCode::JumpIfNeq => &[Label, Symb, Symb],
        }
    }
}

/// Which frame a variable reference addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FrameKind {
    /// `GF`: exists for the whole run.
    Global,
    /// `LF`: top of the local frame stack.
    Local,
    /// `TF`: the temporary frame, if defined.
    Temporary,
}

impl FrameKind {
    pub fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            "GF" => Some(FrameKind::Global),
            "LF" => Some(FrameKind::Local),
            "TF" => Some(FrameKind::Temporary),
            _ => None,
        }
    }

    pub fn prefix(self) -> &'static str {
        match self {
            FrameKind::Global => "GF",
            FrameKind::Local => "LF",
            FrameKind::Temporary => "TF",
        }
    }
}

impl fmt::Display for FrameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

/// A variable reference such as `LF@counter`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VarRef {
    pub frame: FrameKind,
    pub name: String,
}

impl VarRef {
    pub fn new(frame: FrameKind, name: impl Into<String>) -> Self {
        Self {
            frame,
            name: name.into(),
        }
    }
}

impl fmt::Display for VarRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.frame, self.name)
    }
}

/// A typed instruction operand.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Var(VarRef),
    /// Constant; strings keep their escaped source text.
    Const(Value),
    Label(String),
    Type(DataType),
}

impl Operand {
    /// Does this operand satisfy `kind`?
    pub fn fits(&self, kind: OperandKind) -> bool {
        matches!(
            (self, kind),
            (Operand::Var(_), OperandKind::Var | OperandKind::Symb)
                | (Operand::Const(_), OperandKind::Symb)
                | (Operand::Label(_), OperandKind::Label)
                | (Operand::Type(_), OperandKind::Type)
        )
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Var(v) => write!(f, "{}", v),
            Operand::Const(v) => write!(f, "{}@{}", v.data_type(), v.source_text()),
            Operand::Label(l) => f.write_str(l),
            Operand::Type(t) => write!(f, "{}", t),
        }
    }
}

/// One instruction of a loaded program.
#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    /// Sequence number declared by the document (1-based).
    pub order: u32,
    pub opcode: OpCode,
    pub args: Vec<Operand>,
}

impl Instruction {
    pub fn new(order: u32, opcode: OpCode, args: Vec<Operand>) -> Self {
        Self {
            order,
            opcode,
            args,
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.opcode)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// A loaded, structurally valid program.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Program {
    pub name: Option<String>,
    pub description: Option<String>,
    pub instructions: Vec<Instruction>,
}

impl Program {
    /// Build a program from instructions, numbering them 1..=n.
    pub fn from_instructions(body: Vec<(OpCode, Vec<Operand>)>) -> Self {
        let instructions = body
            .into_iter()
            .enumerate()
            .map(|(i, (opcode, args))| Instruction::new(i as u32 + 1, opcode, args))
            .collect();
        Self {
            name: None,
            description: None,
            instructions,
        }
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }
}
