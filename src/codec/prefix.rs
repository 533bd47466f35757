//! Prefix-driven statement dispatch.
//!
//! Junos flattens nested configuration into independent lines that are not
//! self-delimiting: `ike traceoptions file files 5` sets the rotation count,
//! while `ike traceoptions file ike.log` names the file. A [`PrefixTable`]
//! resolves this by trying the longest matching prefix first.

use crate::error::ParseError;

use super::lines::configuration_lines;

/// Populates `T` from one statement.
///
/// Receives the value after the prefix (empty for bare flags) and the whole
/// statement for error context.
pub type Handler<T> = fn(&mut T, &str, &str) -> Result<(), ParseError>;

/// Ordered table of `(prefix, handler)` pairs.
pub struct PrefixTable<T> {
    entries: Vec<(&'static str, Handler<T>)>,
}

impl<T> Default for PrefixTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> PrefixTable<T> {
    /// Creates an empty table.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Registers a handler, keeping entries ordered most-specific-first.
    ///
    /// Entries with the same prefix length keep their registration order.
    #[must_use]
    pub fn on(mut self, prefix: &'static str, handler: Handler<T>) -> Self {
        let position = self
            .entries
            .iter()
            .position(|(existing, _)| existing.len() < prefix.len())
            .unwrap_or(self.entries.len());
        self.entries.insert(position, (prefix, handler));
        self
    }

    /// Returns the prefixes in evaluation order.
    pub fn prefixes(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|(prefix, _)| *prefix)
    }

    /// Dispatches one statement to the first matching handler.
    ///
    /// Returns `Ok(false)` when no prefix matches.
    ///
    /// # Errors
    ///
    /// Propagates the handler's error.
    pub fn dispatch(&self, target: &mut T, statement: &str) -> Result<bool, ParseError> {
        for (prefix, handler) in &self.entries {
            if let Some(rest) = match_prefix(statement, prefix) {
                handler(target, rest, statement)?;
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Parses a whole command reply into `target`.
    ///
    /// Statements no prefix matches are skipped. Returns the number of
    /// statements that were consumed.
    ///
    /// # Errors
    ///
    /// Returns the first handler error.
    pub fn parse_into(&self, target: &mut T, raw: &str) -> Result<usize, ParseError> {
        let mut consumed = 0;
        for statement in configuration_lines(raw) {
            if self.dispatch(target, statement)? {
                consumed += 1;
            }
        }
        Ok(consumed)
    }
}

impl<T> std::fmt::Debug for PrefixTable<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.prefixes()).finish()
    }
}

/// Matches `prefix` at a token boundary and returns the remainder.
fn match_prefix<'a>(statement: &'a str, prefix: &str) -> Option<&'a str> {
    let rest = statement.strip_prefix(prefix)?;
    if rest.is_empty() {
        return Some(rest);
    }
    rest.strip_prefix(' ').map(str::trim_start)
}
