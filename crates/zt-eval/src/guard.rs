//! Recursion guard shared by the parser and the evaluator.
//!
//! Depth lives in a thread-local so that user callbacks invoked by the
//! library during parsing, which start a new [`Evaluator`], keep counting
//! from the evaluation that triggered them.
//!
//! [`Evaluator`]: crate::interp::Evaluator

use std::cell::Cell;

use crate::error::{CompileError, ErrorKind, Result};

/// Deepest nesting before a `RangeError`.
pub const MAX_DEPTH: usize = 128;

/// Stack the outermost guarded frame may grow by, in bytes.
///
/// Sized to stay well inside a 2 MiB thread stack in debug builds.
pub const STACK_BUDGET: usize = 512 * 1024;

thread_local! {
    static DEPTH: Cell<usize> = const { Cell::new(0) };
    static BASE: Cell<usize> = const { Cell::new(0) };
}

/// One level of nesting; released on drop.
#[derive(Debug)]
pub struct DepthGuard {
    _private: (),
}

impl DepthGuard {
    /// Enter one level, failing once either limit is reached.
    pub fn enter() -> Result<Self> {
        let marker = 0u8;
        let here = std::ptr::addr_of!(marker).addr();
        let depth = DEPTH.get();
        if depth == 0 {
            BASE.set(here);
        }
        if depth >= MAX_DEPTH || BASE.get().abs_diff(here) > STACK_BUDGET {
            return Err(CompileError::new(
                ErrorKind::Range,
                "Maximum call stack size exceeded",
            ));
        }
        DEPTH.set(depth + 1);
        Ok(Self { _private: () })
    }

    /// Current nesting on this thread.
    pub fn depth() -> usize {
        DEPTH.get()
    }
}

impl Drop for DepthGuard {
    fn drop(&mut self) {
        DEPTH.set(DEPTH.get().saturating_sub(1));
    }
}
