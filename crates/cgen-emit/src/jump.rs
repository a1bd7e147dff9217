//! Jump target allocation.
//!
//! Loops get dense label numbers on first use (`label_N_break`,
//! `label_N_continue`); suspension sites get resume points 1, 2, 3, ...
//! Both sequences restart for every function and each is capped on its own.

use cgen_ast::LoopId;

use crate::error::{GenError, Result};

/// Per-function label and resume point allocator.
#[derive(Debug)]
pub struct JumpTargets {
    /// Label number per loop, indexed by `LoopId`.
    labels: Vec<Option<u32>>,
    next_label: u32,
    next_resume: u32,
    max: u32,
}

impl JumpTargets {
    #[must_use]
    pub const fn new(max: u32) -> Self {
        Self {
            labels: Vec::new(),
            next_label: 0,
            next_resume: 0,
            max,
        }
    }

    /// Label number for a loop; stable within one function.
    pub fn label_for(&mut self, id: LoopId) -> Result<u32> {
        if let Some(Some(n)) = self.labels.get(id.index()) {
            return Ok(*n);
        }
        if self.next_label >= self.max {
            return Err(GenError::TooManyJumpTargets { max: self.max });
        }
        let n = self.next_label;
        self.next_label += 1;
        if self.labels.len() <= id.index() {
            self.labels.resize(id.index() + 1, None);
        }
        self.labels[id.index()] = Some(n);
        Ok(n)
    }

    /// Fresh resume point, numbered from 1.
    pub fn next_resume_point(&mut self) -> Result<u32> {
        if self.next_resume >= self.max {
            return Err(GenError::TooManyJumpTargets { max: self.max });
        }
        self.next_resume += 1;
        Ok(self.next_resume)
    }

    /// Resume points handed out so far.
    #[must_use]
    pub const fn resume_points(&self) -> u32 {
        self.next_resume
    }

    /// Forget everything; called at the start of each function.
    pub fn reset(&mut self) {
        self.labels.clear();
        self.next_label = 0;
        self.next_resume = 0;
    }
}
