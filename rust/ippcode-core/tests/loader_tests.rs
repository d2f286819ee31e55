//! Integration tests for loading program documents.

use ippcode_core::loader::{load_program, load_program_from_reader, LoadError};
use ippcode_core::{DataType, FrameKind, OpCode, Operand, Value, VarRef};

const HELLO: &str = r#"{
  "language": "IPPcode19",
  "name": "hello",
  "instructions": [
    { "order": 1, "opcode": "defvar", "args": [ { "type": "var", "text": "GF@x" } ] },
    { "order": 2, "opcode": "MOVE", "args": [
        { "type": "var", "text": "GF@x" },
        { "type": "string", "text": "ab\\032cd" } ] },
    { "order": 3, "opcode": "Write", "args": [ { "type": "var", "text": "GF@x" } ] }
  ]
}"#;

#[test]
fn loads_header_and_instructions() {
    let program = load_program(HELLO).expect("program should load");
    assert_eq!(program.name.as_deref(), Some("hello"));
    assert_eq!(program.len(), 3);
    let ops: Vec<OpCode> = program.instructions.iter().map(|i| i.opcode).collect();
    assert_eq!(ops, vec![OpCode::DefVar, OpCode::Move, OpCode::Write]);
    assert_eq!(program.instructions[2].order, 3);
}

#[test]
fn keeps_string_escapes_raw() {
    let program = load_program(HELLO).unwrap();
    assert_eq!(
        program.instructions[1].args[1],
        Operand::Const(Value::String("ab\\032cd".into()))
    );
}

#[test]
fn loads_from_reader() {
    let program = load_program_from_reader(HELLO.as_bytes()).unwrap();
    assert_eq!(
        program.instructions[0].args[0],
        Operand::Var(VarRef::new(FrameKind::Global, "x"))
    );
}

#[test]
fn language_is_case_insensitive() {
    let program = load_program(r#"{"language":"ippcode19"}"#).unwrap();
    assert!(program.is_empty());
}

#[test]
fn rejects_unknown_fields() {
    let err = load_program(r#"{"language":"IPPcode19","author":"x"}"#).unwrap_err();
    assert!(matches!(err, LoadError::Syntax(_)));
    assert_eq!(err.exit_code(), 31);
}

#[test]
fn rejects_non_positive_order() {
    let err = load_program(
        r#"{"language":"IPPcode19","instructions":[{"order":0,"opcode":"BREAK"}]}"#,
    )
    .unwrap_err();
    assert!(matches!(err, LoadError::Structure(_)));
    assert_eq!(err.exit_code(), 31);
}

#[test]
fn rejects_too_many_operands() {
    let err = load_program(
        r#"{"language":"IPPcode19","instructions":[{"order":1,"opcode":"ADD","args":[
            {"type":"var","text":"GF@a"},{"type":"int","text":"1"},
            {"type":"int","text":"2"},{"type":"int","text":"3"}]}]}"#,
    )
    .unwrap_err();
    assert_eq!(err.exit_code(), 31);
}

#[test]
fn unknown_opcode_reports_order() {
    let err = load_program(
        r#"{"language":"IPPcode19","instructions":[
            {"order":1,"opcode":"BREAK"},
            {"order":2,"opcode":"NOPE"}]}"#,
    )
    .unwrap_err();
    match &err {
        LoadError::UnknownOpcode { order, opcode } => {
            assert_eq!(*order, 2);
            assert_eq!(opcode, "NOPE");
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(err.exit_code(), 32);
}

#[test]
fn invalid_literal_is_structure_error() {
    let err = load_program(
        r#"{"language":"IPPcode19","instructions":[
            {"order":1,"opcode":"PUSHS","args":[{"type":"int","text":"1.5"}]}]}"#,
    )
    .unwrap_err();
    assert!(matches!(err, LoadError::InvalidOperand { .. }));
    assert_eq!(err.exit_code(), 32);
}

#[test]
fn arity_is_not_checked_at_load_time() {
    let program = load_program(
        r#"{"language":"IPPcode19","instructions":[
            {"order":1,"opcode":"ADD","args":[{"type":"type","text":"int"}]}]}"#,
    )
    .unwrap();
    assert_eq!(program.instructions[0].args, vec![Operand::Type(DataType::Int)]);
}
