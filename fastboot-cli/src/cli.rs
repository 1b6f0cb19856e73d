// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Command-line interface definitions.

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};

use fastboot_common::transport::{acquire, Matcher, Transport};

use crate::commands;
use crate::report::ConsoleReporter;
use crate::transport::UsbBackend;

/// Command-line arguments.
#[derive(Parser)]
#[command(name = "fastboot", version)]
#[command(about = "Flash and control devices in fastboot mode over USB")]
#[command(after_help = "\
commands:
  devices                            list all connected devices
  getvar <variable>                  display a bootloader variable
  setvar <variable> <value>          set a bootloader variable
  download <filename>                stage a file in device memory
  verify <partition> [ <filename> ]  verify a partition, optionally staging a file first
  flash <partition> [ <filename> ]   write a partition, optionally staging a file first
  eraseall                           erase the whole flash memory
  erase <partition>                  erase a partition
  check <partition>                  check a partition
  boot [ <filename> ]                boot the staged (or given) image
  continue                           continue with autoboot
  reboot                             reboot the device normally
  reboot-bootloader                  reboot the device into the bootloader
  powerdown                          power the device off
  pass | fail                        report a test result
  oem <args...>                      send a vendor command (uses the rest of the line)
  require <filename>                 check device variables against a requirement file
  get-staged <filename>              save the device's staged data to a file

options must come before the first command; everything after it is a command word")]
pub struct Cli {
    /// Only talk to the device with this serial number (falls back to KINDLE_SERIAL)
    #[arg(short, long, env = "FASTBOOT_SERIAL")]
    pub serial: Option<String>,

    /// Also accept devices with this USB vendor id (decimal, 0x hex or 0 octal)
    #[arg(short = 'i', long, value_name = "ID", value_parser = parse_vendor_id)]
    pub vendor_id: Option<u16>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Commands to run, in order
    #[arg(value_name = "COMMAND", required = true, trailing_var_arg = true)]
    pub commands: Vec<String>,
}

/// Serial filter variable honoured when neither `-s` nor `FASTBOOT_SERIAL` is set.
pub const LEGACY_SERIAL_ENV: &str = "KINDLE_SERIAL";

impl Cli {
    /// Matcher for `devices`: every fastboot interface, whatever serial was asked for.
    fn listing_matcher(&self) -> Matcher {
        match self.vendor_id {
            Some(vendor_id) => Matcher::new().with_vendor_id(vendor_id),
            None => Matcher::new(),
        }
    }

    /// Matcher for the device the queue runs against.
    fn target_matcher(&self, legacy_serial: Option<String>) -> Matcher {
        match resolve_serial(self.serial.as_deref(), legacy_serial) {
            Some(serial) => self.listing_matcher().with_serial(serial),
            None => self.listing_matcher(),
        }
    }
}

/// `-s` or `FASTBOOT_SERIAL` first, then the legacy variable. Empty means unset.
fn resolve_serial(explicit: Option<&str>, legacy: Option<String>) -> Option<String> {
    explicit
        .filter(|serial| !serial.is_empty())
        .map(str::to_string)
        .or_else(|| legacy.filter(|serial| !serial.is_empty()))
}

/// Parse a vendor id the way `strtoul(.., 0)` does, limited to 16 bits.
pub fn parse_vendor_id(s: &str) -> std::result::Result<u16, String> {
    let invalid = || format!("invalid vendor id '{s}'");
    let (digits, radix) = if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        (hex, 16)
    } else if s.len() > 1 && s.starts_with('0') {
        (&s[1..], 8)
    } else {
        (s, 10)
    };
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return Err(invalid());
    }
    u16::from_str_radix(digits, radix).map_err(|_| invalid())
}

/// Execute the parsed CLI command.
pub fn run(cli: Cli) -> Result<()> {
    if cli.commands.first().map(String::as_str) == Some("devices") {
        if cli.commands.len() > 1 {
            anyhow::bail!("'devices' must be the first and only command");
        }
        let mut backend = UsbBackend::new().context("cannot initialise libusb")?;
        return commands::devices(&mut backend, &cli.listing_matcher());
    }

    let matcher = cli.target_matcher(std::env::var(LEGACY_SERIAL_ENV).ok());

    // Everything the device will be asked to do is known before waiting for it
    let steps = commands::parse_steps(&cli.commands)?;
    let mut plan = commands::build_plan(&steps)?;

    let mut backend = UsbBackend::new().context("cannot initialise libusb")?;
    let mut channel = acquire(&mut backend, &matcher);

    let mut reporter = ConsoleReporter::new();
    let result = plan.engine.execute(&mut channel, &mut reporter);
    channel.close();

    let summary = result?;
    log::debug!("{} actions in {:?}", summary.executed, summary.elapsed);
    plan.write_staged()
}
