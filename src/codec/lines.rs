//! Command sets, quoting and output framing.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::ParseError;

/// Prefix of a configuration statement that adds configuration.
pub const SET_PREFIX: &str = "set ";

/// Prefix of a configuration statement that removes configuration.
pub const DELETE_PREFIX: &str = "delete ";

/// Marker opening the configuration section of a command reply.
pub const OUTPUT_START: &str = "<configuration-output>";

/// Marker closing the configuration section of a command reply.
pub const OUTPUT_END: &str = "</configuration-output>";

/// An ordered sequence of configuration lines.
///
/// Lines keep their insertion order; later lines may depend on earlier
/// ones having been applied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CommandSet {
    lines: Vec<String>,
}

impl CommandSet {
    /// Creates an empty command set.
    #[must_use]
    pub const fn new() -> Self {
        Self { lines: Vec::new() }
    }

    /// Appends a `set` line.
    pub fn set(&mut self, statement: impl AsRef<str>) {
        self.lines.push(format!("{SET_PREFIX}{}", statement.as_ref()));
    }

    /// Appends a `delete` line.
    pub fn delete(&mut self, statement: impl AsRef<str>) {
        self.lines.push(format!("{DELETE_PREFIX}{}", statement.as_ref()));
    }

    /// Appends every line of `other`, keeping its order.
    pub fn extend(&mut self, other: Self) {
        self.lines.extend(other.lines);
    }

    /// Returns the lines in order.
    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Iterates over the lines in order.
    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.lines.iter()
    }

    /// Returns the number of lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Returns true if there are no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Consumes the set and returns its lines.
    #[must_use]
    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }
}

impl<'a> IntoIterator for &'a CommandSet {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.lines.iter()
    }
}

impl fmt::Display for CommandSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.lines {
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

/// Builds the command that shows a configuration subtree as relative set lines.
#[must_use]
pub fn show_command(path: &str) -> String {
    format!("show configuration {path} | display set relative")
}

/// Extracts configuration statements from a command reply.
///
/// When the reply carries an [`OUTPUT_START`] marker, only the lines between
/// it and [`OUTPUT_END`] are kept. A leading `set ` token is stripped and
/// blank lines are dropped.
#[must_use]
pub fn configuration_lines(raw: &str) -> Vec<&str> {
    let framed = raw.contains(OUTPUT_START);
    let mut inside = !framed;
    let mut lines = Vec::new();

    for line in raw.lines() {
        let line = line.trim_end();
        if line.contains(OUTPUT_START) {
            inside = true;
            continue;
        }
        if line.contains(OUTPUT_END) {
            break;
        }
        if !inside {
            continue;
        }
        let statement = line.strip_prefix(SET_PREFIX).unwrap_or(line).trim_start();
        if !statement.is_empty() {
            lines.push(statement);
        }
    }

    lines
}

/// Wraps a value in double quotes, escaping backslashes and quotes.
#[must_use]
pub fn quote(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        if c == '"' || c == '\\' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}

/// Quotes a value only when it cannot stand as a bare token.
#[must_use]
pub fn quote_if_needed(value: &str) -> String {
    if value.is_empty() || value.chars().any(|c| c.is_whitespace() || c == '"' || c == '\\') {
        quote(value)
    } else {
        value.to_string()
    }
}

/// Strips matching surrounding quotes and unescapes the content.
///
/// Values that are not quoted are returned unchanged.
#[must_use]
pub fn unquote(value: &str) -> String {
    let value = value.trim();
    let Some(inner) = value
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
    else {
        return value.to_string();
    };

    let mut unquoted = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(escaped) = chars.next() {
                unquoted.push(escaped);
                continue;
            }
        }
        unquoted.push(c);
    }
    unquoted
}

/// Parses a numeric value, reporting the field and line on failure.
///
/// # Errors
///
/// Returns [`ParseError::InvalidNumber`] if `value` is not a valid `T`.
pub fn parse_number<T>(value: &str, field: &str, line: &str) -> Result<T, ParseError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e: T::Err| ParseError::invalid_number(field, line, e.to_string()))
}
