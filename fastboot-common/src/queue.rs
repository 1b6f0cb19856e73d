// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Command queue engine.
//!
//! Actions are collected while the engine is [`State::Building`], then run
//! strictly in insertion order against one transport. The first failing
//! action stops the run; later actions are never started.
//!
//! ```text
//! Building --execute--> Executing --all ok--> Completed
//!                                 \--error--> Aborted
//! ```

use std::time::{Duration, Instant};

use crate::error::{Error, Result};
use crate::protocol::{encode_command, Command};
use crate::report::Reporter;
use crate::require::Requirement;
use crate::session;
use crate::transport::Transport;

/// Engine lifecycle. `Completed` and `Aborted` are final.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Building,
    Executing,
    Completed,
    Aborted,
}

/// What an action does when its turn comes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionKind {
    /// Send the opcode, wait for OKAY.
    Command,
    /// Announce and stream the owned payload.
    SendPayload(Vec<u8>),
    /// Read back the device's staged data.
    FetchPayload,
    /// Query a variable and check it against a constraint.
    Require(Requirement),
    /// Query a variable and report it under a label.
    Display { label: String },
    /// Send the opcode; losing the device afterwards is fine.
    Reboot,
    /// Print a line, no I/O.
    Notice,
}

/// Recorded result of an executed action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// OKAY, with the device's optional message.
    Okay(String),
    /// Variable value from a display or requirement query.
    Value(String),
    /// Bytes read back by a fetch.
    Payload(Vec<u8>),
    Failed(String),
}

/// One queued unit of work.
#[derive(Debug, Clone)]
pub struct Action {
    kind: ActionKind,
    opcode: String,
    description: Option<String>,
    outcome: Option<Outcome>,
}

impl Action {
    pub fn new(kind: ActionKind, opcode: impl Into<String>) -> Self {
        Self {
            kind,
            opcode: opcode.into(),
            description: None,
            outcome: None,
        }
    }

    pub fn command(command: Command) -> Self {
        Self::new(ActionKind::Command, command.to_string())
    }

    /// Text shown to the operator while the action runs.
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn kind(&self) -> &ActionKind {
        &self.kind
    }

    pub fn opcode(&self) -> &str {
        &self.opcode
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// `None` until the engine has run this action.
    pub fn outcome(&self) -> Option<&Outcome> {
        self.outcome.as_ref()
    }

    /// Check everything that can be checked before touching the device.
    fn validate(&self) -> Result<()> {
        match &self.kind {
            ActionKind::Notice => Ok(()),
            ActionKind::SendPayload(data) => {
                u32::try_from(data.len()).map_err(|_| Error::PayloadTooLarge(data.len()))?;
                encode_command(&Command::Download(0).to_string()).map(drop)
            }
            _ => encode_command(&self.opcode).map(drop),
        }
    }

    fn run(&self, transport: &mut dyn Transport, reporter: &mut dyn Reporter) -> Result<Outcome> {
        match &self.kind {
            ActionKind::Command => {
                session::command(transport, &self.opcode, reporter).map(Outcome::Okay)
            }
            ActionKind::SendPayload(data) => {
                session::send_payload(transport, data, reporter).map(Outcome::Okay)
            }
            ActionKind::FetchPayload => {
                session::fetch_payload(transport, reporter).map(Outcome::Payload)
            }
            ActionKind::Require(requirement) => {
                let actual = session::command(transport, &self.opcode, reporter)?;
                requirement.check(&actual)?;
                Ok(Outcome::Value(actual))
            }
            ActionKind::Display { label } => {
                let value = session::command(transport, &self.opcode, reporter)?;
                reporter.value(label, &value);
                Ok(Outcome::Value(value))
            }
            ActionKind::Reboot => {
                session::send_and_detach(transport, &self.opcode)?;
                Ok(Outcome::Okay(String::new()))
            }
            ActionKind::Notice => {
                reporter.notice(&self.opcode);
                Ok(Outcome::Okay(String::new()))
            }
        }
    }
}

/// Summary of a completed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub executed: usize,
    pub elapsed: Duration,
}

/// Ordered action queue plus its lifecycle state.
#[derive(Debug)]
pub struct Engine {
    actions: Vec<Action>,
    state: State,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    pub fn new() -> Self {
        Self {
            actions: Vec::new(),
            state: State::Building,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Append an action. Oversized commands are rejected here, before any I/O.
    pub fn push(&mut self, action: Action) -> Result<()> {
        if self.state != State::Building {
            return Err(Error::InvalidState(self.state));
        }
        action.validate()?;
        self.actions.push(action);
        Ok(())
    }

    // --- Convenience builders ---

    pub fn queue_command(&mut self, command: Command, description: &str) -> Result<()> {
        let action = Action::command(command);
        if description.is_empty() {
            self.push(action)
        } else {
            self.push(action.describe(description))
        }
    }

    /// Stage `data` in device memory under a display `name`.
    pub fn queue_download(&mut self, name: &str, data: Vec<u8>) -> Result<()> {
        let description = format!("sending '{}' ({} KB)", name, data.len() / 1024);
        let opcode = match u32::try_from(data.len()) {
            Ok(size) => Command::Download(size).to_string(),
            Err(_) => return Err(Error::PayloadTooLarge(data.len())),
        };
        self.push(Action::new(ActionKind::SendPayload(data), opcode).describe(description))
    }

    pub fn queue_flash(&mut self, partition: &str, size: Option<usize>) -> Result<()> {
        let description = match size {
            Some(size) => format!("writing '{}' ({} KB)", partition, size / 1024),
            None => format!("writing '{partition}'"),
        };
        self.queue_command(Command::Flash(partition.to_string()), &description)
    }

    pub fn queue_verify(&mut self, partition: &str, size: Option<usize>) -> Result<()> {
        let description = match size {
            Some(size) => format!("verifying '{}' ({} KB)", partition, size / 1024),
            None => format!("verifying '{partition}'"),
        };
        self.queue_command(Command::Verify(partition.to_string()), &description)
    }

    pub fn queue_erase(&mut self, partition: &str) -> Result<()> {
        self.queue_command(
            Command::Erase(partition.to_string()),
            &format!("erasing '{partition}'"),
        )
    }

    pub fn queue_check(&mut self, partition: &str) -> Result<()> {
        self.queue_command(
            Command::Check(partition.to_string()),
            &format!("checking '{partition}'"),
        )
    }

    pub fn queue_set(&mut self, name: &str, value: &str) -> Result<()> {
        self.queue_command(
            Command::SetVar {
                name: name.to_string(),
                value: value.to_string(),
            },
            &format!("setting '{name}' to '{value}'"),
        )
    }

    pub fn queue_require(&mut self, requirement: Requirement) -> Result<()> {
        let opcode = Command::GetVar(requirement.name.clone()).to_string();
        let description = format!("checking {}", requirement.name);
        self.push(Action::new(ActionKind::Require(requirement), opcode).describe(description))
    }

    pub fn queue_display(&mut self, name: &str, label: &str) -> Result<()> {
        self.push(Action::new(
            ActionKind::Display {
                label: label.to_string(),
            },
            Command::GetVar(name.to_string()).to_string(),
        ))
    }

    pub fn queue_fetch(&mut self) -> Result<()> {
        self.push(
            Action::new(ActionKind::FetchPayload, Command::Upload.to_string())
                .describe("uploading staged data"),
        )
    }

    pub fn queue_reboot(&mut self) -> Result<()> {
        self.push(Action::new(ActionKind::Reboot, Command::Reboot.to_string()).describe("rebooting"))
    }

    pub fn queue_reboot_bootloader(&mut self) -> Result<()> {
        self.push(
            Action::new(ActionKind::Reboot, Command::RebootBootloader.to_string())
                .describe("rebooting into bootloader"),
        )
    }

    pub fn queue_notice(&mut self, text: &str) -> Result<()> {
        self.push(Action::new(ActionKind::Notice, text))
    }

    /// Run every queued action in order.
    ///
    /// Stops at the first failure, records it on the failing action and
    /// returns it. Actions after the failure keep no outcome.
    pub fn execute(
        &mut self,
        transport: &mut dyn Transport,
        reporter: &mut dyn Reporter,
    ) -> Result<Summary> {
        if self.state != State::Building {
            return Err(Error::InvalidState(self.state));
        }
        self.state = State::Executing;
        let start = Instant::now();

        for (index, action) in self.actions.iter_mut().enumerate() {
            if let Some(description) = &action.description {
                reporter.step_started(description);
            }
            let step_start = Instant::now();
            log::debug!("step {}: {}", index + 1, action.opcode);

            match action.run(transport, reporter) {
                Ok(outcome) => {
                    action.outcome = Some(outcome);
                    if action.description.is_some() {
                        reporter.step_succeeded(step_start.elapsed());
                    }
                }
                Err(e) => {
                    action.outcome = Some(Outcome::Failed(e.to_string()));
                    reporter.step_failed(&e);
                    self.state = State::Aborted;
                    return Err(e);
                }
            }
        }

        self.state = State::Completed;
        let elapsed = start.elapsed();
        reporter.finished(elapsed);
        Ok(Summary {
            executed: self.actions.len(),
            elapsed,
        })
    }
}
