//! The data stack (`PUSHS`/`POPS`) and the call stack (`CALL`/`RETURN`).

use ippcode_core::Value;

use crate::vm::VmError;

/// LIFO of values; each value carries its own type tag.
#[derive(Debug, Default)]
pub struct DataStack {
    values: Vec<Value>,
}

impl DataStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, value: Value) {
        self.values.push(value);
    }

    pub fn pop(&mut self) -> Result<Value, VmError> {
        self.values.pop().ok_or(VmError::DataStackEmpty)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Values bottom first.
    pub fn as_slice(&self) -> &[Value] {
        &self.values
    }
}

/// LIFO of return instruction indices.
#[derive(Debug, Default)]
pub struct CallStack {
    returns: Vec<usize>,
}

impl CallStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, return_index: usize) {
        self.returns.push(return_index);
    }

    pub fn pop(&mut self) -> Result<usize, VmError> {
        self.returns.pop().ok_or(VmError::CallStackEmpty)
    }

    pub fn depth(&self) -> usize {
        self.returns.len()
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.returns
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_stack_is_lifo() {
        let mut stack = DataStack::new();
        stack.push(Value::Int(1));
        stack.push(Value::String("two".into()));
        stack.push(Value::Nil);
        assert_eq!(stack.pop().unwrap(), Value::Nil);
        assert_eq!(stack.pop().unwrap(), Value::String("two".into()));
        assert_eq!(stack.pop().unwrap(), Value::Int(1));
        assert!(matches!(stack.pop(), Err(VmError::DataStackEmpty)));
    }

    #[test]
    fn call_stack_underflow() {
        let mut calls = CallStack::new();
        calls.push(4);
        assert_eq!(calls.depth(), 1);
        assert_eq!(calls.pop().unwrap(), 4);
        assert!(matches!(calls.pop(), Err(VmError::CallStackEmpty)));
    }
}
