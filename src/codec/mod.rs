//! Line protocol codec.
//!
//! This module converts between structured resource options and the flat,
//! line-oriented Junos configuration language:
//! - Ordered `set` / `delete` command sets
//! - Quoting rules for string values
//! - Prefix-driven parsing of `display set relative` output
//! - SSH public key dispatch by algorithm

mod lines;
mod prefix;
mod ssh_key;

pub use lines::{
    configuration_lines, parse_number, quote, quote_if_needed, show_command, unquote, CommandSet,
    DELETE_PREFIX, OUTPUT_END, OUTPUT_START, SET_PREFIX,
};
pub use prefix::{Handler, PrefixTable};
pub use ssh_key::{KeyFormat, SshPublicKey};
