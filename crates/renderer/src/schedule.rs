//! Ping-pong routing for the global pass sequence of a filter chain.
//!
//! Routing depends only on the global pass index and the chain's total pass
//! count, never on which filter owns the pass. That lets any mix of filters
//! share two off-screen slots without bookkeeping at filter boundaries.

use std::fmt;

use crate::error::PipelineError;
use crate::types::FilterSpec;

/// Texture a pass samples from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassInput {
    /// The uploaded source image.
    Source,
    /// A ping-pong slot written by the previous pass.
    Slot(usize),
}

/// Target a pass renders into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassOutput {
    /// The visible surface (only ever the last pass of the chain).
    Surface,
    /// A ping-pong slot read by the next pass.
    Slot(usize),
}

/// Input and output selection for one global pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassRoute {
    pub index: usize,
    pub input: PassInput,
    pub output: PassOutput,
}

impl PassRoute {
    /// Routes pass `index` of a chain with `total` passes.
    ///
    /// Pass 0 reads the source; every other pass reads slot `(index - 1) % 2`,
    /// the one written just before it. The last pass writes the surface;
    /// every other pass writes slot `index % 2`.
    pub fn plan(index: usize, total: usize) -> Self {
        let input = if index == 0 {
            PassInput::Source
        } else {
            PassInput::Slot((index - 1) % 2)
        };
        let output = if index + 1 == total {
            PassOutput::Surface
        } else {
            PassOutput::Slot(index % 2)
        };
        Self {
            index,
            input,
            output,
        }
    }
}

impl fmt::Display for PassRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let input = match self.input {
            PassInput::Source => "source".to_string(),
            PassInput::Slot(slot) => format!("slot {slot}"),
        };
        let output = match self.output {
            PassOutput::Surface => "surface".to_string(),
            PassOutput::Slot(slot) => format!("slot {slot}"),
        };
        write!(f, "pass {}: {input} -> {output}", self.index)
    }
}

/// Cursor over the passes of one pipeline run.
///
/// A fresh schedule is created for every run, so the pass index always
/// starts at zero and cannot leak between runs.
#[derive(Debug, Clone)]
pub struct PassSchedule {
    total: usize,
    next: usize,
}

impl PassSchedule {
    pub fn new(total: usize) -> Self {
        Self { total, next: 0 }
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// Number of passes handed out so far.
    pub fn issued(&self) -> usize {
        self.next
    }

    pub fn is_complete(&self) -> bool {
        self.next == self.total
    }

    /// Routes the next pass, or fails once every pass has been issued.
    pub fn advance(&mut self) -> Result<PassRoute, PipelineError> {
        self.next()
            .ok_or(PipelineError::ScheduleExhausted { total: self.total })
    }

    /// Confirms every pass was issued.
    pub fn finish(&self) -> Result<(), PipelineError> {
        if self.is_complete() {
            Ok(())
        } else {
            Err(PipelineError::IncompleteSchedule {
                issued: self.next,
                total: self.total,
            })
        }
    }
}

impl Iterator for PassSchedule {
    type Item = PassRoute;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.total {
            return None;
        }
        let route = PassRoute::plan(self.next, self.total);
        self.next += 1;
        Some(route)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.total - self.next;
        (remaining, Some(remaining))
    }
}

/// One row of a chain plan: the filter stage and the route of one of its passes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedPass {
    pub filter_index: usize,
    pub filter: FilterSpec,
    pub local_pass: usize,
    pub route: PassRoute,
}

/// Routes every pass of a chain without touching the GPU.
pub fn plan_chain(specs: &[FilterSpec]) -> Vec<PlannedPass> {
    let total = specs.iter().map(FilterSpec::pass_count).sum();
    let mut schedule = PassSchedule::new(total);
    let mut planned = Vec::with_capacity(total);
    for (filter_index, spec) in specs.iter().enumerate() {
        for local_pass in 0..spec.pass_count() {
            if let Some(route) = schedule.next() {
                planned.push(PlannedPass {
                    filter_index,
                    filter: *spec,
                    local_pass,
                    route,
                });
            }
        }
    }
    planned
}
