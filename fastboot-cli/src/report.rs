// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Terminal progress output.

use std::io::{self, Write};
use std::time::Duration;

use fastboot_common::{Error, Reporter};
use indicatif::{ProgressBar, ProgressStyle};

/// Only payloads at least this large get a progress bar.
const PROGRESS_THRESHOLD: usize = 64 * 1024;

/// Writes step lines to stderr the way operators expect from fastboot.
#[derive(Default)]
pub struct ConsoleReporter {
    bar: Option<ProgressBar>,
    /// A step line is open and waits for its OKAY/FAILED suffix.
    pending: bool,
}

impl ConsoleReporter {
    pub fn new() -> Self {
        Self::default()
    }

    fn new_bar(total: usize) -> ProgressBar {
        let pb = ProgressBar::new(total as u64);
        match ProgressStyle::default_bar().template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})",
        ) {
            Ok(style) => pb.set_style(style.progress_chars("#>-")),
            Err(e) => log::debug!("progress template rejected: {e}"),
        }
        pb
    }

    fn clear_bar(&mut self) {
        if let Some(pb) = self.bar.take() {
            pb.finish_and_clear();
        }
    }

    /// Break an open step line before printing something else.
    fn break_line(&mut self) {
        if self.pending {
            eprintln!();
            self.pending = false;
        }
    }
}

impl Reporter for ConsoleReporter {
    fn step_started(&mut self, description: &str) {
        self.break_line();
        eprint!("{description}... ");
        let _ = io::stderr().flush();
        self.pending = true;
    }

    fn step_succeeded(&mut self, elapsed: Duration) {
        self.clear_bar();
        if !self.pending {
            eprint!("    ");
        }
        eprintln!("OKAY [{:7.3}s]", elapsed.as_secs_f64());
        self.pending = false;
    }

    fn step_failed(&mut self, error: &Error) {
        self.clear_bar();
        if !self.pending {
            eprint!("    ");
        }
        eprintln!("FAILED ({error})");
        self.pending = false;
    }

    fn info(&mut self, message: &str) {
        self.break_line();
        eprintln!("(bootloader) {message}");
    }

    fn value(&mut self, label: &str, value: &str) {
        self.break_line();
        eprintln!("{label}: {value}");
    }

    fn notice(&mut self, text: &str) {
        self.break_line();
        eprintln!("{text}");
    }

    fn transfer_progress(&mut self, done: usize, total: usize) {
        if total < PROGRESS_THRESHOLD {
            return;
        }
        if self.bar.is_none() {
            self.break_line();
            self.bar = Some(Self::new_bar(total));
        }
        if let Some(pb) = &self.bar {
            pb.set_position(done as u64);
        }
    }

    fn finished(&mut self, elapsed: Duration) {
        self.clear_bar();
        self.break_line();
        eprintln!("finished. total time: {:.3}s", elapsed.as_secs_f64());
    }
}
