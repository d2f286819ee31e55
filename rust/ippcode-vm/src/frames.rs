//! Variable frames: the global frame, the local frame stack and the
//! temporary frame.

use std::collections::BTreeMap;
use std::fmt;

use ippcode_core::{FrameKind, Value, VarRef};

use crate::vm::VmError;

/// State of a declared variable.
#[derive(Debug, Clone, PartialEq)]
pub enum Variable {
    /// Declared by `DEFVAR`, never written.
    Unset,
    Set(Value),
}

impl Variable {
    pub fn value(&self) -> Option<&Value> {
        match self {
            Variable::Unset => None,
            Variable::Set(v) => Some(v),
        }
    }

    pub fn is_set(&self) -> bool {
        matches!(self, Variable::Set(_))
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variable::Unset => f.write_str("<unset>"),
            Variable::Set(v) => write!(f, "{}", v),
        }
    }
}

/// A single frame: variable name → variable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    vars: BTreeMap<String, Variable>,
}

impl Frame {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Variable> {
        self.vars.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn initialized_count(&self) -> usize {
        self.vars.values().filter(|v| v.is_set()).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Variable)> {
        self.vars.iter()
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (name, var)) in self.vars.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}: {}", name, var)?;
        }
        f.write_str("}")
    }
}

/// Owns every frame of a run.
///
/// GF always exists. Only the top of the LF stack is addressable. TF is
/// either a single frame or undefined.
#[derive(Debug, Default)]
pub struct FrameStore {
    global: Frame,
    locals: Vec<Frame>,
    temporary: Option<Frame>,
    initialized: usize,
}

impl FrameStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn frame(&self, kind: FrameKind) -> Result<&Frame, VmError> {
        match kind {
            FrameKind::Global => Ok(&self.global),
            FrameKind::Local => self.locals.last().ok_or(VmError::NoFrame(kind)),
            FrameKind::Temporary => self.temporary.as_ref().ok_or(VmError::NoFrame(kind)),
        }
    }

    fn frame_mut(&mut self, kind: FrameKind) -> Result<&mut Frame, VmError> {
        match kind {
            FrameKind::Global => Ok(&mut self.global),
            FrameKind::Local => self.locals.last_mut().ok_or(VmError::NoFrame(kind)),
            FrameKind::Temporary => self.temporary.as_mut().ok_or(VmError::NoFrame(kind)),
        }
    }

    /// Create `var` without a value. Fails if the frame is missing or the
    /// name already exists there.
    pub fn declare(&mut self, var: &VarRef) -> Result<(), VmError> {
        let frame = self.frame_mut(var.frame)?;
        if frame.contains(&var.name) {
            return Err(VmError::Redeclared(var.to_string()));
        }
        frame.vars.insert(var.name.clone(), Variable::Unset);
        Ok(())
    }

    /// The variable itself, set or not.
    pub fn lookup(&self, var: &VarRef) -> Result<&Variable, VmError> {
        self.frame(var.frame)?
            .get(&var.name)
            .ok_or_else(|| VmError::UndefinedVariable(var.to_string()))
    }

    /// The value of a declared-and-set variable.
    pub fn read(&self, var: &VarRef) -> Result<&Value, VmError> {
        self.lookup(var)?
            .value()
            .ok_or_else(|| VmError::UninitializedVariable(var.to_string()))
    }

    /// Overwrite the value (and with it the type) of a declared variable.
    pub fn write(&mut self, var: &VarRef, value: Value) -> Result<(), VmError> {
        let newly_set = {
            let frame = self.frame_mut(var.frame)?;
            let slot = frame
                .vars
                .get_mut(&var.name)
                .ok_or_else(|| VmError::UndefinedVariable(var.to_string()))?;
            let was_unset = !slot.is_set();
            *slot = Variable::Set(value);
            was_unset
        };
        if newly_set {
            self.initialized += 1;
        }
        Ok(())
    }

    /// `CREATEFRAME`: replace TF with an empty frame, dropping the old one.
    pub fn create_temporary(&mut self) {
        if let Some(old) = self.temporary.replace(Frame::new()) {
            self.initialized = self.initialized.saturating_sub(old.initialized_count());
        }
    }

    /// `PUSHFRAME`: move TF onto the LF stack; TF becomes undefined.
    pub fn push_temporary(&mut self) -> Result<(), VmError> {
        let frame = self
            .temporary
            .take()
            .ok_or(VmError::NoFrame(FrameKind::Temporary))?;
        self.locals.push(frame);
        Ok(())
    }

    pub fn global(&self) -> &Frame {
        &self.global
    }

    /// Local frames, bottom first.
    pub fn locals(&self) -> &[Frame] {
        &self.locals
    }

    pub fn temporary(&self) -> Option<&Frame> {
        self.temporary.as_ref()
    }

    /// Initialized variables across GF, every LF and TF.
    pub fn initialized_count(&self) -> usize {
        self.initialized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gf(name: &str) -> VarRef {
        VarRef::new(FrameKind::Global, name)
    }

    fn tf(name: &str) -> VarRef {
        VarRef::new(FrameKind::Temporary, name)
    }

    fn lf(name: &str) -> VarRef {
        VarRef::new(FrameKind::Local, name)
    }

    #[test]
    fn declare_then_write_then_read() {
        let mut store = FrameStore::new();
        store.declare(&gf("x")).unwrap();
        assert!(matches!(store.read(&gf("x")), Err(VmError::UninitializedVariable(_))));
        store.write(&gf("x"), Value::Int(3)).unwrap();
        assert_eq!(store.read(&gf("x")).unwrap(), &Value::Int(3));
        store.write(&gf("x"), Value::String("s".into())).unwrap();
        assert_eq!(store.read(&gf("x")).unwrap(), &Value::String("s".into()));
    }

    #[test]
    fn redeclare_is_rejected() {
        let mut store = FrameStore::new();
        store.declare(&gf("x")).unwrap();
        assert!(matches!(store.declare(&gf("x")), Err(VmError::Redeclared(_))));
    }

    #[test]
    fn undeclared_access() {
        let mut store = FrameStore::new();
        assert!(matches!(store.read(&gf("nope")), Err(VmError::UndefinedVariable(_))));
        assert!(matches!(
            store.write(&gf("nope"), Value::Nil),
            Err(VmError::UndefinedVariable(_))
        ));
    }

    #[test]
    fn missing_frames() {
        let mut store = FrameStore::new();
        assert!(matches!(store.declare(&lf("a")), Err(VmError::NoFrame(FrameKind::Local))));
        assert!(matches!(store.read(&tf("a")), Err(VmError::NoFrame(FrameKind::Temporary))));
        assert!(matches!(store.push_temporary(), Err(VmError::NoFrame(FrameKind::Temporary))));
    }

    #[test]
    fn push_temporary_makes_it_local() {
        let mut store = FrameStore::new();
        store.create_temporary();
        store.declare(&tf("a")).unwrap();
        store.write(&tf("a"), Value::Int(5)).unwrap();
        store.push_temporary().unwrap();
        assert!(store.temporary().is_none());
        assert_eq!(store.read(&lf("a")).unwrap(), &Value::Int(5));
        assert_eq!(store.locals().len(), 1);
    }

    #[test]
    fn create_temporary_discards_previous() {
        let mut store = FrameStore::new();
        store.create_temporary();
        store.declare(&tf("a")).unwrap();
        store.write(&tf("a"), Value::Bool(true)).unwrap();
        assert_eq!(store.initialized_count(), 1);
        store.create_temporary();
        assert!(matches!(store.lookup(&tf("a")), Err(VmError::UndefinedVariable(_))));
        assert_eq!(store.initialized_count(), 0);
    }

    #[test]
    fn initialized_count_spans_frames() {
        let mut store = FrameStore::new();
        store.declare(&gf("g")).unwrap();
        store.write(&gf("g"), Value::Int(1)).unwrap();
        store.write(&gf("g"), Value::Int(2)).unwrap();
        store.create_temporary();
        store.declare(&tf("t")).unwrap();
        store.write(&tf("t"), Value::Nil).unwrap();
        store.declare(&tf("u")).unwrap();
        store.push_temporary().unwrap();
        assert_eq!(store.initialized_count(), 2);
    }

    #[test]
    fn frame_display_is_sorted() {
        let mut store = FrameStore::new();
        store.declare(&gf("b")).unwrap();
        store.declare(&gf("a")).unwrap();
        store.write(&gf("a"), Value::Int(1)).unwrap();
        assert_eq!(store.global().to_string(), "{a: int@1, b: <unset>}");
    }
}
