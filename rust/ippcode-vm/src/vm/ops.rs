//! Operand resolution and the value-level instruction handlers.

use std::cmp::Ordering;

use ippcode_core::strings::{char_at, char_len, replace_char};
use ippcode_core::{DataType, Instruction, OpCode, Operand, Value, VarRef};

use super::{VmError, VM};

/// Lazy shape check: operand count and kinds against the opcode signature.
pub(super) fn check_operands(instr: &Instruction) -> Result<(), VmError> {
    let signature = instr.opcode.signature();
    if instr.args.len() != signature.len()
        || !instr.args.iter().zip(signature).all(|(arg, kind)| arg.fits(*kind))
    {
        return Err(VmError::bad_operands(instr));
    }
    Ok(())
}

pub(super) fn var_arg(instr: &Instruction, pos: usize) -> Result<&VarRef, VmError> {
    match instr.args.get(pos) {
        Some(Operand::Var(var)) => Ok(var),
        _ => Err(VmError::bad_operands(instr)),
    }
}

pub(super) fn type_arg(instr: &Instruction, pos: usize) -> Result<DataType, VmError> {
    match instr.args.get(pos) {
        Some(Operand::Type(ty)) => Ok(*ty),
        _ => Err(VmError::bad_operands(instr)),
    }
}

fn int_of(opcode: OpCode, value: &Value) -> Result<i64, VmError> {
    value
        .as_int()
        .ok_or_else(|| VmError::type_error(opcode, "int", value))
}

fn str_of(opcode: OpCode, value: &Value) -> Result<&str, VmError> {
    value
        .as_str()
        .ok_or_else(|| VmError::type_error(opcode, "string", value))
}

fn bool_of(opcode: OpCode, value: &Value) -> Result<bool, VmError> {
    value
        .as_bool()
        .ok_or_else(|| VmError::type_error(opcode, "bool", value))
}

fn index_error(index: i64, s: &str) -> VmError {
    VmError::IndexOutOfRange {
        index,
        len: char_len(s),
    }
}

/// Order two values of the same type. Nil is rejected by the caller.
fn compare(opcode: OpCode, a: &Value, b: &Value) -> Result<Ordering, VmError> {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => Ok(x.cmp(y)),
        (Value::Float(x), Value::Float(y)) => Ok(x.partial_cmp(y).unwrap_or(Ordering::Equal)),
        (Value::Bool(x), Value::Bool(y)) => Ok(x.cmp(y)),
        (Value::String(x), Value::String(y)) => Ok(x.cmp(y)),
        (Value::Nil, Value::Nil) => Ok(Ordering::Equal),
        _ => Err(VmError::TypeMismatch(format!(
            "{} cannot compare {} with {}",
            opcode,
            a.data_type(),
            b.data_type()
        ))),
    }
}

impl VM {
    /// Resolve the symbol operand at `pos` to a value.
    pub(super) fn symbol(&self, instr: &Instruction, pos: usize) -> Result<Value, VmError> {
        match instr.args.get(pos) {
            Some(Operand::Const(value)) => Ok(value.clone()),
            Some(Operand::Var(var)) => self.frames.read(var).cloned(),
            _ => Err(VmError::bad_operands(instr)),
        }
    }

    /// Write `value` into the destination variable (operand 0).
    pub(super) fn store(&mut self, instr: &Instruction, value: Value) -> Result<(), VmError> {
        let var = var_arg(instr, 0)?;
        self.frames.write(var, value)
    }

    pub(super) fn label_target(&self, instr: &Instruction, pos: usize) -> Result<usize, VmError> {
        match instr.args.get(pos) {
            Some(Operand::Label(name)) => self.labels.resolve(name),
            _ => Err(VmError::bad_operands(instr)),
        }
    }

    /// Compare operands 1 and 2 for equality; both must share a type.
    pub(super) fn operands_equal(&self, instr: &Instruction) -> Result<bool, VmError> {
        let a = self.symbol(instr, 1)?;
        let b = self.symbol(instr, 2)?;
        Ok(compare(instr.opcode, &a, &b)? == Ordering::Equal)
    }

    pub(super) fn exec_arithmetic(&mut self, instr: &Instruction) -> Result<(), VmError> {
        let a = int_of(instr.opcode, &self.symbol(instr, 1)?)?;
        let b = int_of(instr.opcode, &self.symbol(instr, 2)?)?;
        let result = match instr.opcode {
            OpCode::Add => a.wrapping_add(b),
            OpCode::Sub => a.wrapping_sub(b),
            OpCode::Mul => a.wrapping_mul(b),
            OpCode::IDiv => {
                if b == 0 {
                    return Err(VmError::DivisionByZero);
                }
                a.wrapping_div(b)
            }
            other => unreachable!("{} is not arithmetic", other),
        };
        self.store(instr, Value::Int(result))
    }

    pub(super) fn exec_relational(&mut self, instr: &Instruction) -> Result<(), VmError> {
        let a = self.symbol(instr, 1)?;
        let b = self.symbol(instr, 2)?;
        if instr.opcode != OpCode::Eq && (a == Value::Nil || b == Value::Nil) {
            return Err(VmError::TypeMismatch(format!(
                "{} does not accept nil",
                instr.opcode
            )));
        }
        let ordering = compare(instr.opcode, &a, &b)?;
        let result = match instr.opcode {
            OpCode::Lt => ordering == Ordering::Less,
            OpCode::Gt => ordering == Ordering::Greater,
            _ => ordering == Ordering::Equal,
        };
        self.store(instr, Value::Bool(result))
    }

    pub(super) fn exec_boolean(&mut self, instr: &Instruction) -> Result<(), VmError> {
        let a = bool_of(instr.opcode, &self.symbol(instr, 1)?)?;
        if instr.opcode == OpCode::Not {
            return self.store(instr, Value::Bool(!a));
        }
        // Both sides are checked even when the first decides the result.
        let b = bool_of(instr.opcode, &self.symbol(instr, 2)?)?;
        let result = match instr.opcode {
            OpCode::And => a & b,
            _ => a | b,
        };
        self.store(instr, Value::Bool(result))
    }

    pub(super) fn exec_int2char(&mut self, instr: &Instruction) -> Result<(), VmError> {
        let code = int_of(instr.opcode, &self.symbol(instr, 1)?)?;
        let ch = u32::try_from(code)
            .ok()
            .and_then(char::from_u32)
            .ok_or_else(|| VmError::BadValue(format!("{} is not a valid code point", code)))?;
        self.store(instr, Value::String(ch.to_string()))
    }

    pub(super) fn exec_stri2int(&mut self, instr: &Instruction) -> Result<(), VmError> {
        let s = self.symbol(instr, 1)?;
        let s = str_of(instr.opcode, &s)?;
        let index = int_of(instr.opcode, &self.symbol(instr, 2)?)?;
        let ch = char_at(s, index).ok_or_else(|| index_error(index, s))?;
        self.store(instr, Value::Int(ch as i64))
    }

    pub(super) fn exec_int2float(&mut self, instr: &Instruction) -> Result<(), VmError> {
        let n = int_of(instr.opcode, &self.symbol(instr, 1)?)?;
        self.store(instr, Value::Float(n as f64))
    }

    pub(super) fn exec_float2int(&mut self, instr: &Instruction) -> Result<(), VmError> {
        let value = self.symbol(instr, 1)?;
        let f = value
            .as_float()
            .ok_or_else(|| VmError::type_error(instr.opcode, "float", &value))?;
        let truncated = f.trunc();
        // i64::MAX as f64 rounds up to 2^63, which is already out of range.
        if !truncated.is_finite() || truncated < i64::MIN as f64 || truncated >= i64::MAX as f64 {
            return Err(VmError::BadValue(format!("{} does not fit in int", f)));
        }
        self.store(instr, Value::Int(truncated as i64))
    }

    pub(super) fn exec_concat(&mut self, instr: &Instruction) -> Result<(), VmError> {
        let a = self.symbol(instr, 1)?;
        let b = self.symbol(instr, 2)?;
        let joined = format!(
            "{}{}",
            str_of(instr.opcode, &a)?,
            str_of(instr.opcode, &b)?
        );
        self.store(instr, Value::String(joined))
    }

    pub(super) fn exec_strlen(&mut self, instr: &Instruction) -> Result<(), VmError> {
        let s = self.symbol(instr, 1)?;
        let len = char_len(str_of(instr.opcode, &s)?);
        self.store(instr, Value::Int(len as i64))
    }

    pub(super) fn exec_getchar(&mut self, instr: &Instruction) -> Result<(), VmError> {
        let s = self.symbol(instr, 1)?;
        let s = str_of(instr.opcode, &s)?;
        let index = int_of(instr.opcode, &self.symbol(instr, 2)?)?;
        let ch = char_at(s, index).ok_or_else(|| index_error(index, s))?;
        self.store(instr, Value::String(ch.to_string()))
    }

    pub(super) fn exec_setchar(&mut self, instr: &Instruction) -> Result<(), VmError> {
        let var = var_arg(instr, 0)?;
        let target = self.frames.read(var)?.clone();
        let target = str_of(instr.opcode, &target)?;
        let index = int_of(instr.opcode, &self.symbol(instr, 1)?)?;
        let replacement = self.symbol(instr, 2)?;
        let ch = str_of(instr.opcode, &replacement)?
            .chars()
            .next()
            .ok_or_else(|| VmError::BadValue("SETCHAR replacement is empty".to_string()))?;
        let updated = replace_char(target, index, ch).ok_or_else(|| index_error(index, target))?;
        self.store(instr, Value::String(updated))
    }

    /// `TYPE` is the one reader that tolerates a declared-but-unset variable.
    pub(super) fn exec_type(&mut self, instr: &Instruction) -> Result<(), VmError> {
        let name = match instr.args.get(1) {
            Some(Operand::Var(var)) => self
                .frames
                .lookup(var)?
                .value()
                .map(|v| v.data_type().name())
                .unwrap_or(""),
            _ => self.symbol(instr, 1)?.data_type().name(),
        };
        self.store(instr, Value::String(name.to_string()))
    }
}
