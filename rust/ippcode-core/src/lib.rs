//! IPPcode Core
//!
//! Shared program model, values, and the program loader used by the VM and CLI.

pub mod error_codes;
pub mod lir;
pub mod loader;
pub mod strings;
pub mod values;

pub use lir::{FrameKind, Instruction, OpCode, Operand, OperandKind, Program, VarRef};
pub use loader::{load_program, LoadError};
pub use values::{DataType, Value};

/// Language identifier every program document must declare.
pub const LANGUAGE: &str = "IPPcode19";
