// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Operator-facing progress callbacks.

use std::time::Duration;

use crate::error::Error;

/// Receives everything the operator should see while a queue runs.
///
/// All methods default to doing nothing so implementations only pick the
/// events they care about.
pub trait Reporter {
    /// A described step is about to start.
    fn step_started(&mut self, _description: &str) {}

    /// The current described step completed.
    fn step_succeeded(&mut self, _elapsed: Duration) {}

    /// The current step failed; the queue stops after this call.
    fn step_failed(&mut self, _error: &Error) {}

    /// An `INFO` frame from the device, in arrival order.
    fn info(&mut self, _message: &str) {}

    /// A variable value requested for display.
    fn value(&mut self, _label: &str, _value: &str) {}

    /// A queued notice line.
    fn notice(&mut self, _text: &str) {}

    /// Bytes moved so far in the current data phase.
    fn transfer_progress(&mut self, _done: usize, _total: usize) {}

    /// The whole queue completed.
    fn finished(&mut self, _elapsed: Duration) {}
}

/// Reporter that discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullReporter;

impl Reporter for NullReporter {}
