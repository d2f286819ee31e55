//! Program document loading and structural validation.
//!
//! A program arrives as a JSON document mirroring the XML interchange form:
//! a header (`language`, optional `name`/`description`) and an ordered list
//! of instructions, each with an `order`, an `opcode` and typed arguments.
//! The loader checks structure and operand lexis only; arity and operand
//! kinds are checked by the interpreter when an instruction executes.

use serde::Deserialize;
use std::io::Read;
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

use crate::error_codes;
use crate::lir::{FrameKind, Instruction, OpCode, Operand, Program, VarRef};
use crate::values::{DataType, Value};
use crate::LANGUAGE;

/// Upper bound on operands per instruction in the interchange form.
pub const MAX_OPERANDS: usize = 3;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("program document is not valid JSON")]
    Syntax(#[from] serde_json::Error),
    #[error("cannot read program")]
    Io(#[from] std::io::Error),
    #[error("unsupported language '{0}', expected IPPcode19")]
    Language(String),
    #[error("malformed program: {0}")]
    Structure(String),
    #[error("unknown opcode '{opcode}' (instruction {order})")]
    UnknownOpcode { order: u32, opcode: String },
    #[error("invalid {kind} operand '{text}' (instruction {order}): {reason}")]
    InvalidOperand {
        order: u32,
        kind: String,
        text: String,
        reason: String,
    },
}

impl LoadError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            LoadError::Io(_) => error_codes::INPUT_FILE,
            LoadError::Syntax(_) | LoadError::Language(_) | LoadError::Structure(_) => {
                error_codes::MALFORMED_PROGRAM
            }
            LoadError::UnknownOpcode { .. } | LoadError::InvalidOperand { .. } => {
                error_codes::UNEXPECTED_STRUCTURE
            }
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawProgram {
    language: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    instructions: Vec<RawInstruction>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawInstruction {
    order: i64,
    opcode: String,
    #[serde(default)]
    args: Vec<RawOperand>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawOperand {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

/// Load a program from its JSON text.
pub fn load_program(source: &str) -> Result<Program, LoadError> {
    let raw: RawProgram = serde_json::from_str(source)?;
    lower(raw)
}

/// Load a program from any reader (file, stdin).
pub fn load_program_from_reader<R: Read>(mut reader: R) -> Result<Program, LoadError> {
    let mut source = String::new();
    reader.read_to_string(&mut source)?;
    load_program(&source)
}

fn lower(raw: RawProgram) -> Result<Program, LoadError> {
    if !raw.language.eq_ignore_ascii_case(LANGUAGE) {
        return Err(LoadError::Language(raw.language));
    }

    let mut instructions = Vec::with_capacity(raw.instructions.len());
    for instr in raw.instructions {
        let order = u32::try_from(instr.order)
            .ok()
            .filter(|o| *o > 0)
            .ok_or_else(|| {
                LoadError::Structure(format!("instruction order {} is not positive", instr.order))
            })?;
        if instr.args.len() > MAX_OPERANDS {
            return Err(LoadError::Structure(format!(
                "instruction {} has {} operands, at most {} allowed",
                order,
                instr.args.len(),
                MAX_OPERANDS
            )));
        }
        let opcode = OpCode::from_str(&instr.opcode).map_err(|_| LoadError::UnknownOpcode {
            order,
            opcode: instr.opcode.clone(),
        })?;
        let args = instr
            .args
            .iter()
            .map(|arg| {
                let text = arg.text.as_deref().unwrap_or("");
                parse_operand(&arg.kind, text).map_err(|reason| LoadError::InvalidOperand {
                    order,
                    kind: arg.kind.clone(),
                    text: text.to_string(),
                    reason,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        instructions.push(Instruction::new(order, opcode, args));
    }

    debug!(
        instructions = instructions.len(),
        name = raw.name.as_deref().unwrap_or(""),
        "program loaded"
    );

    Ok(Program {
        name: raw.name,
        description: raw.description,
        instructions,
    })
}

/// Parse one operand given its interchange type tag and text.
pub fn parse_operand(kind: &str, text: &str) -> Result<Operand, String> {
    match kind {
        "var" => parse_var(text).map(Operand::Var),
        "label" => {
            if is_identifier(text) {
                Ok(Operand::Label(text.to_string()))
            } else {
                Err("not a valid label name".into())
            }
        }
        "type" => {
            let ty = DataType::from_str(text)?;
            Ok(Operand::Type(ty))
        }
        other => {
            let ty = DataType::from_str(other).map_err(|_| format!("unknown operand type '{}'", other))?;
            Value::parse_literal(ty, text)
                .map(Operand::Const)
                .ok_or_else(|| format!("not a valid {} literal", ty))
        }
    }
}

fn parse_var(text: &str) -> Result<VarRef, String> {
    let (prefix, name) = text
        .split_once('@')
        .ok_or_else(|| "expected FRAME@name".to_string())?;
    let frame = FrameKind::from_prefix(prefix).ok_or_else(|| format!("unknown frame '{}'", prefix))?;
    if !is_identifier(name) {
        return Err(format!("'{}' is not a valid variable name", name));
    }
    Ok(VarRef::new(frame, name))
}

fn is_special(c: char) -> bool {
    matches!(c, '_' | '-' | '$' | '&' | '%' | '*' | '!' | '?')
}

/// Letters, digits and `_-$&%*!?`, not starting with a digit.
fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || is_special(c) => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || is_special(c))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_var_operand() {
        let op = parse_operand("var", "LF@counter_1").unwrap();
        assert_eq!(op, Operand::Var(VarRef::new(FrameKind::Local, "counter_1")));
        assert!(parse_operand("var", "XF@a").is_err());
        assert!(parse_operand("var", "GF@1a").is_err());
        assert!(parse_operand("var", "GFa").is_err());
        assert!(parse_operand("var", "GF@").is_err());
    }

    #[test]
    fn parse_constant_operands() {
        assert_eq!(parse_operand("int", "-12").unwrap(), Operand::Const(Value::Int(-12)));
        assert_eq!(parse_operand("nil", "nil").unwrap(), Operand::Const(Value::Nil));
        assert!(parse_operand("int", "x").is_err());
        assert!(parse_operand("bool", "yes").is_err());
        assert!(parse_operand("pointer", "0").is_err());
    }

    #[test]
    fn non_ascii_and_overflowing_literals_are_rejected() {
        assert!(parse_operand("int", "1ž").is_err());
        assert!(parse_operand("int", "0€").is_err());
        assert!(parse_operand("float", "€").is_err());
        assert!(parse_operand("float", "1e999").is_err());
        let err = load_program(
            r#"{"language":"IPPcode19","instructions":[
                {"order":1,"opcode":"PUSHS","args":[{"type":"int","text":"1ž"}]}
            ]}"#,
        )
        .unwrap_err();
        assert_eq!(err.exit_code(), 32);
    }

    #[test]
    fn parse_label_and_type_operands() {
        assert_eq!(parse_operand("label", "$loop-1").unwrap(), Operand::Label("$loop-1".into()));
        assert!(parse_operand("label", "").is_err());
        assert_eq!(parse_operand("type", "float").unwrap(), Operand::Type(DataType::Float));
        assert!(parse_operand("type", "var").is_err());
    }

    #[test]
    fn missing_text_is_empty_string() {
        let program = load_program(
            r#"{"language":"IPPcode19","instructions":[
                {"order":1,"opcode":"WRITE","args":[{"type":"string"}]}
            ]}"#,
        )
        .unwrap();
        assert_eq!(
            program.instructions[0].args,
            vec![Operand::Const(Value::String(String::new()))]
        );
    }

    #[test]
    fn error_exit_codes() {
        let err = load_program("{").unwrap_err();
        assert_eq!(err.exit_code(), 31);
        let err = load_program(r#"{"language":"IPPcode18"}"#).unwrap_err();
        assert!(matches!(err, LoadError::Language(_)));
        assert_eq!(err.exit_code(), 31);
        let err = load_program(
            r#"{"language":"IPPcode19","instructions":[{"order":1,"opcode":"POPFRAME"}]}"#,
        )
        .unwrap_err();
        assert_eq!(err.exit_code(), 32);
    }
}
