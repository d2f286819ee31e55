//! `BREAK`: a read-only dump of the interpreter state to the diagnostics sink.

use ippcode_core::Instruction;
use tracing::warn;

use super::VM;

impl VM {
    /// Multi-line description of frames, stacks and counters.
    pub fn state_dump(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "position: index {}, order {}\n",
            self.ip, self.expected_order
        ));
        out.push_str(&format!(
            "executed: {} instructions, max initialized variables {}\n",
            self.stats.instructions, self.stats.max_initialized_vars
        ));
        out.push_str(&format!("GF: {}\n", self.frames.global()));

        let locals = self.frames.locals();
        if locals.is_empty() {
            out.push_str("LF: <undefined>\n");
        } else {
            for (depth, frame) in locals.iter().enumerate().rev() {
                out.push_str(&format!("LF[{}]: {}\n", depth, frame));
            }
        }
        match self.frames.temporary() {
            Some(frame) => out.push_str(&format!("TF: {}\n", frame)),
            None => out.push_str("TF: <undefined>\n"),
        }

        let values: Vec<String> = self
            .data_stack
            .as_slice()
            .iter()
            .map(|v| v.to_string())
            .collect();
        out.push_str(&format!("data stack: [{}]\n", values.join(", ")));
        let returns: Vec<String> = self
            .call_stack
            .as_slice()
            .iter()
            .map(|r| r.to_string())
            .collect();
        out.push_str(&format!("call stack: [{}]\n", returns.join(", ")));
        out
    }

    /// Never fails; a diagnostics write error is only logged.
    pub(super) fn exec_break(&mut self, instr: &Instruction) {
        let dump = self.state_dump();
        if let Err(err) = self.diagnostics.write_text(&dump) {
            warn!(order = instr.order, "BREAK could not write diagnostics: {}", err);
        }
    }
}
