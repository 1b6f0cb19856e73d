// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Command words and the queue they build.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};

use fastboot_common::queue::Outcome;
use fastboot_common::transport::{list_devices, Backend, Matcher};
use fastboot_common::{parse_requirements, Command, Engine};

/// Every word that starts a command.
const KEYWORDS: &[&str] = &[
    "devices",
    "getvar",
    "setvar",
    "download",
    "verify",
    "flash",
    "eraseall",
    "erase",
    "check",
    "boot",
    "continue",
    "reboot",
    "reboot-bootloader",
    "powerdown",
    "pass",
    "fail",
    "oem",
    "require",
    "get-staged",
];

/// One parsed command word with its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    GetVar(String),
    SetVar { name: String, value: String },
    Download(PathBuf),
    Verify { partition: String, file: Option<PathBuf> },
    Flash { partition: String, file: Option<PathBuf> },
    EraseAll,
    Erase(String),
    Check(String),
    Boot(Option<PathBuf>),
    Continue,
    Reboot,
    RebootBootloader,
    Powerdown,
    Pass,
    Fail,
    Oem(Vec<String>),
    Require(PathBuf),
    GetStaged(PathBuf),
}

fn is_keyword(word: &str) -> bool {
    KEYWORDS.contains(&word)
}

/// Cursor over the remaining words.
struct Words<'a> {
    words: &'a [String],
    pos: usize,
}

impl<'a> Words<'a> {
    fn next(&mut self) -> Option<&'a str> {
        let word = self.words.get(self.pos)?;
        self.pos += 1;
        Some(word)
    }

    fn required(&mut self, command: &str, what: &str) -> Result<&'a str> {
        self.next()
            .ok_or_else(|| anyhow!("'{command}' needs a {what} argument"))
    }

    /// Consume the next word only when it is not itself a command.
    fn optional(&mut self) -> Option<&'a str> {
        match self.words.get(self.pos) {
            Some(word) if !is_keyword(word) => self.next(),
            _ => None,
        }
    }

    fn rest(&mut self) -> Vec<String> {
        let rest = self.words[self.pos..].to_vec();
        self.pos = self.words.len();
        rest
    }
}

/// Parse the trailing command words into steps.
///
/// `devices` is handled by the caller and is rejected here.
pub fn parse_steps(words: &[String]) -> Result<Vec<Step>> {
    let mut words = Words { words, pos: 0 };
    let mut steps = Vec::new();

    while let Some(word) = words.next() {
        let step = match word {
            "getvar" => Step::GetVar(words.required(word, "variable")?.to_string()),
            "setvar" => Step::SetVar {
                name: words.required(word, "variable")?.to_string(),
                value: words.required(word, "value")?.to_string(),
            },
            "download" => Step::Download(words.required(word, "file")?.into()),
            "verify" | "flash" => {
                let partition = words.required(word, "partition")?.to_string();
                let file = words.optional().map(PathBuf::from);
                if word == "verify" {
                    Step::Verify { partition, file }
                } else {
                    Step::Flash { partition, file }
                }
            }
            "eraseall" => Step::EraseAll,
            "erase" => Step::Erase(words.required(word, "partition")?.to_string()),
            "check" => Step::Check(words.required(word, "partition")?.to_string()),
            "boot" => Step::Boot(words.optional().map(PathBuf::from)),
            "continue" => Step::Continue,
            "reboot" => Step::Reboot,
            "reboot-bootloader" => Step::RebootBootloader,
            "powerdown" => Step::Powerdown,
            "pass" => Step::Pass,
            "fail" => Step::Fail,
            "oem" => {
                let args = words.rest();
                if args.is_empty() {
                    bail!("'oem' needs at least one argument");
                }
                Step::Oem(args)
            }
            "require" => Step::Require(words.required(word, "file")?.into()),
            "get-staged" => Step::GetStaged(words.required(word, "file")?.into()),
            "devices" => bail!("'devices' must be the first and only command"),
            option if option.starts_with('-') => {
                bail!("option '{option}' must come before the first command")
            }
            other => bail!("unknown command '{other}'"),
        };
        steps.push(step);
    }

    Ok(steps)
}

fn load_file(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("cannot load '{}'", path.display()))
}

/// A built queue plus where to store fetched payloads afterwards.
pub struct Plan {
    pub engine: Engine,
    /// Action index of each fetch, with its output file.
    staged: Vec<(usize, PathBuf)>,
}

/// Turn steps into a ready-to-run queue. Files are read here, before any
/// device is touched.
pub fn build_plan(steps: &[Step]) -> Result<Plan> {
    let mut engine = Engine::new();
    let mut staged = Vec::new();

    for step in steps {
        match step {
            Step::GetVar(name) => engine.queue_display(name, name)?,
            Step::SetVar { name, value } => engine.queue_set(name, value)?,
            Step::Download(path) => engine.queue_download("data", load_file(path)?)?,
            Step::Verify { partition, file } => {
                let size = queue_image(&mut engine, partition, file.as_deref())?;
                engine.queue_verify(partition, size)?;
            }
            Step::Flash { partition, file } => {
                let size = queue_image(&mut engine, partition, file.as_deref())?;
                engine.queue_flash(partition, size)?;
            }
            Step::EraseAll => engine.queue_command(Command::EraseAll, "wiping the flash memory")?,
            Step::Erase(partition) => engine.queue_erase(partition)?,
            Step::Check(partition) => engine.queue_check(partition)?,
            Step::Boot(file) => {
                queue_image(&mut engine, "boot", file.as_deref())?;
                engine.queue_command(Command::Boot, "booting")?;
            }
            Step::Continue => engine.queue_command(Command::Continue, "resuming boot")?,
            Step::Reboot => engine.queue_reboot()?,
            Step::RebootBootloader => engine.queue_reboot_bootloader()?,
            Step::Powerdown => engine.queue_command(Command::Powerdown, "shutting down")?,
            Step::Pass => engine.queue_command(Command::Pass, "turning on led")?,
            Step::Fail => engine.queue_command(Command::Fail, "turning on led")?,
            Step::Oem(args) => engine.queue_command(Command::Oem(args.clone()), "")?,
            Step::Require(path) => {
                let text = fs::read_to_string(path)
                    .with_context(|| format!("cannot load '{}'", path.display()))?;
                let requirements = parse_requirements(&text)
                    .with_context(|| format!("in requirement file '{}'", path.display()))?;
                for requirement in requirements {
                    engine.queue_require(requirement)?;
                }
            }
            Step::GetStaged(path) => {
                staged.push((engine.len(), path.clone()));
                engine.queue_fetch()?;
            }
        }
    }

    Ok(Plan { engine, staged })
}

/// Queue the download of `file` if given; returns its size.
fn queue_image(engine: &mut Engine, name: &str, file: Option<&Path>) -> Result<Option<usize>> {
    let Some(path) = file else {
        return Ok(None);
    };
    let data = load_file(path)?;
    let size = data.len();
    engine.queue_download(name, data)?;
    Ok(Some(size))
}

impl Plan {
    /// Write every fetched payload to its requested file.
    pub fn write_staged(&self) -> Result<()> {
        for (index, path) in &self.staged {
            match self.engine.actions().get(*index).and_then(|a| a.outcome()) {
                Some(Outcome::Payload(data)) => {
                    fs::write(path, data)
                        .with_context(|| format!("cannot write '{}'", path.display()))?;
                    println!("wrote {} bytes to '{}'", data.len(), path.display());
                }
                other => bail!("no staged data for '{}': {:?}", path.display(), other),
            }
        }
        Ok(())
    }
}

/// Print every matching device, one per line.
pub fn devices<B: Backend>(backend: &mut B, matcher: &Matcher) -> Result<()> {
    let found = list_devices(backend, matcher).context("cannot enumerate USB devices")?;
    for desc in &found {
        println!("{}\tfastboot", desc.display_serial());
    }
    Ok(())
}
