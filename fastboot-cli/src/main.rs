// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Fastboot host client over USB.
//!
//! Usage:
//!   fastboot devices
//!   fastboot -s B0F1 flash kernel zImage flash system system.img reboot
//!   fastboot -i 0x18d1 getvar version-bootloader

mod cli;
mod commands;
mod report;
mod transport;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let args = cli::Cli::parse();

    let default_level = match args.verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    cli::run(args)
}
