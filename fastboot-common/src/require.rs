// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Device requirement lines.
//!
//! A requirement file holds one constraint per line:
//!
//! ```text
//! require product=tequila|whisky
//! reject bootmode=factory
//! board=tequila
//! ```
//!
//! The keyword is optional and defaults to `require`. Alternatives are
//! separated by `|` and compared case-sensitively against the live value of
//! the variable.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Old requirement files say `board` where the bootloader says `product`.
const NAME_ALIASES: &[(&str, &str)] = &[("board", "product")];

/// One parsed constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    pub name: String,
    /// `reject`: satisfied when no alternative matches.
    pub invert: bool,
    pub values: Vec<String>,
}

impl Requirement {
    /// Parse a single line.
    pub fn parse(line: &str) -> Result<Self> {
        let malformed = |reason| Error::MalformedRequirement {
            line: line.to_string(),
            reason,
        };

        let rest = line.trim_start();
        let (invert, rest) = if let Some(rest) = strip_keyword(rest, "reject") {
            (true, rest)
        } else if let Some(rest) = strip_keyword(rest, "require") {
            (false, rest)
        } else {
            (false, rest)
        };

        let (name, values) = rest.split_once('=').ok_or_else(|| malformed("missing '='"))?;
        let name = name.trim();
        if name.is_empty() {
            return Err(malformed("empty variable name"));
        }
        let name = NAME_ALIASES
            .iter()
            .find(|(alias, _)| *alias == name)
            .map_or(name, |(_, real)| *real);

        Ok(Self {
            name: name.to_string(),
            invert,
            values: values.split('|').map(|v| v.trim().to_string()).collect(),
        })
    }

    /// Whether the live value satisfies this constraint.
    pub fn is_satisfied_by(&self, actual: &str) -> bool {
        let listed = self.values.iter().any(|v| v == actual);
        listed != self.invert
    }

    /// Check the live value, producing a mismatch error when unsatisfied.
    pub fn check(&self, actual: &str) -> Result<()> {
        if self.is_satisfied_by(actual) {
            return Ok(());
        }
        Err(Error::RequirementMismatch {
            name: self.name.clone(),
            expected: self.values.join("|"),
            actual: actual.to_string(),
            invert: self.invert,
        })
    }
}

impl FromStr for Requirement {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keyword = if self.invert { "reject" } else { "require" };
        write!(f, "{keyword} {}={}", self.name, self.values.join("|"))
    }
}

/// `line` minus a leading `keyword` that is followed by whitespace.
fn strip_keyword<'a>(line: &'a str, keyword: &str) -> Option<&'a str> {
    let rest = line.strip_prefix(keyword)?;
    rest.starts_with(char::is_whitespace).then_some(rest)
}

/// Parse a whole requirement file.
///
/// Blank lines and lines without `=` are skipped with a warning. Any other
/// malformed line fails the whole file.
pub fn parse_requirements(text: &str) -> Result<Vec<Requirement>> {
    let mut requirements = Vec::new();

    for (number, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        if !line.contains('=') {
            log::warn!("skipping requirement line {}: {line:?}", number + 1);
            continue;
        }
        requirements.push(Requirement::parse(line)?);
    }

    Ok(requirements)
}
