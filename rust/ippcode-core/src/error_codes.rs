//! Stable process exit codes.
//!
//! Code ranges:
//!   0          normal termination (or the value passed to `EXIT`, 0–49)
//!   10–19      invocation and auxiliary file errors
//!   31–32      malformed program document
//!   52–58      runtime faults raised by the interpreter

/// Normal completion.
pub const SUCCESS: i32 = 0;
/// Bad option or option combination.
pub const BAD_INVOCATION: i32 = 10;
/// Source or input file could not be opened or read.
pub const INPUT_FILE: i32 = 11;
/// Statistics file could not be written.
pub const OUTPUT_FILE: i32 = 12;
/// Program document is not well formed (syntax, header, numbering).
pub const MALFORMED_PROGRAM: i32 = 31;
/// Unknown opcode or lexically invalid operand.
pub const UNEXPECTED_STRUCTURE: i32 = 32;
/// Semantic error: undefined or duplicate label, wrong operands.
pub const SEMANTIC: i32 = 52;
/// Operand of the wrong type.
pub const OPERAND_TYPE: i32 = 53;
/// Access to a variable that was never declared.
pub const UNDEFINED_VARIABLE: i32 = 54;
/// Access to a frame that does not exist.
pub const UNDEFINED_FRAME: i32 = 55;
/// Missing value: unset variable, empty data stack, empty call stack.
pub const MISSING_VALUE: i32 = 56;
/// Bad operand value: division by zero, `EXIT` outside 0–49.
pub const BAD_OPERAND_VALUE: i32 = 57;
/// String or conversion error.
pub const STRING_OPERATION: i32 = 58;

/// Largest value `EXIT` accepts.
pub const MAX_EXIT_VALUE: i64 = 49;

/// Short human name for an exit code, used in diagnostics.
pub fn describe(code: i32) -> &'static str {
    match code {
        SUCCESS => "success",
        BAD_INVOCATION => "bad invocation",
        INPUT_FILE => "input file error",
        OUTPUT_FILE => "output file error",
        MALFORMED_PROGRAM => "malformed program",
        UNEXPECTED_STRUCTURE => "unexpected program structure",
        SEMANTIC => "semantic error",
        OPERAND_TYPE => "operand type error",
        UNDEFINED_VARIABLE => "undefined variable",
        UNDEFINED_FRAME => "undefined frame",
        MISSING_VALUE => "missing value",
        BAD_OPERAND_VALUE => "bad operand value",
        STRING_OPERATION => "string operation error",
        _ => "unknown error",
    }
}
