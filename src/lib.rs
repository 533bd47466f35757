// ============================================================================
// Strict linting - Dangerous or non-idiomatic practices are forbidden
// ============================================================================

#![deny(unsafe_code)]                 // Unsafe code is forbidden
#![warn(missing_docs)]                // All public items should be documented
#![warn(dead_code)]                   // Unused code should be removed
#![deny(non_camel_case_types)]        // Types must follow CamelCase convention

// Additional strictness
#![warn(unused_imports)]              // Unused imports should be removed
#![warn(unused_variables)]            // Unused variables should be removed
#![deny(unused_must_use)]             // Must handle Result and Option explicitly
#![deny(non_snake_case)]              // Variables and functions must be snake_case
#![deny(non_upper_case_globals)]      // Constants must be UPPER_CASE
#![deny(nonstandard_style)]           // Non-standard code style is forbidden
#![forbid(unsafe_op_in_unsafe_fn)]    // Unsafe ops in unsafe fns are forbidden

// Clippy lints (warnings only)
#![warn(clippy::all)]                 // All standard Clippy lints
#![warn(clippy::pedantic)]            // Very strict Clippy lints
#![warn(clippy::nursery)]             // Experimental lints
#![warn(clippy::unwrap_used)]         // unwrap() warning
#![warn(clippy::expect_used)]         // expect() warning
#![warn(clippy::panic)]               // panic!() warning
#![warn(clippy::print_stdout)]        // println!() warning
#![warn(clippy::todo)]                // TODO warning
#![warn(clippy::unimplemented)]       // unimplemented!() warning
#![warn(clippy::missing_const_for_fn)] // Force const when possible
#![warn(clippy::unwrap_in_result)]    // unwrap() in Result warning
#![warn(clippy::module_inception)]    // Module with same name as crate warning
#![warn(clippy::redundant_clone)]     // Useless clones warning
#![warn(clippy::shadow_unrelated)]    // Shadowing unrelated variables warning
#![warn(clippy::too_many_arguments)]  // Limit function arguments
#![warn(clippy::cognitive_complexity)] // Limit cognitive complexity

// Safety and robustness lints
#![deny(overflowing_literals)]        // Overflowing literals are forbidden
#![deny(arithmetic_overflow)]         // Arithmetic overflow is forbidden

// ============================================================================
// Crate Documentation
// ============================================================================

//! # Junos Provider
//!
//! Declarative, transactional configuration of Junos devices.
//!
//! ## Overview
//!
//! Each managed resource maps typed options to Junos `set` lines and back:
//!
//! - Render options to an ordered set of configuration lines
//! - Apply them in one locked write cycle: lock, set, commit, unlock
//! - Roll the candidate configuration back when any step fails
//! - Read the managed subtree back and parse it into options
//!
//! ## Architecture
//!
//! 1. **Desired State**: Declared in `junos.resources.yaml`
//! 2. **Observed State**: Read back from the device with `show configuration`
//! 3. **Reconciler**: Runs create, read, update, delete, import and drift
//!    checks against a [`session::Session`]
//!
//! ## Modules
//!
//! - [`codec`]: Command sets, quoting, prefix dispatch and SSH keys
//! - [`resource`]: Managed resources and their line mappings
//! - [`config`]: Resources file parsing and validation
//! - [`compat`]: Platform compatibility gate
//! - [`session`]: Device sessions, in-memory device and set file output
//! - [`guard`]: Process-wide read serialization
//! - [`planner`]: Change plans, diffs and the write cycle
//! - [`reconciler`]: Resource operations
//! - [`cli`]: Command-line interface
//!
//! ## Example
//!
//! ```yaml
//! provider:
//!   platform_model: vsrx
//!
//! resources:
//!   security:
//!     ike_traceoptions:
//!       file:
//!         name: ike.log
//!         files: 5
//!       flag: [all]
//!   login_users:
//!     - name: ops
//!       class: operator
//!       authentication:
//!         ssh_public_keys: ["ssh-ed25519 AAAAC3NzaC1lZDI1NTE5"]
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod cli;
pub mod codec;
pub mod compat;
pub mod config;
pub mod error;
pub mod guard;
pub mod planner;
pub mod reconciler;
pub mod resource;
pub mod session;

// ============================================================================
// Re-exports
// ============================================================================

pub use cli::{Cli, Commands, OutputFormatter};
pub use codec::CommandSet;
pub use compat::{CompatibilityGate, PlatformFamily};
pub use config::{ConfigHasher, ConfigParser, ConfigValidator, ProviderFile};
pub use error::{ProviderError, Result};
pub use guard::ReadGuard;
pub use planner::{ChangePlan, DiffEngine, PlanExecutor};
pub use reconciler::{DriftReport, FakeMode, OperationOutcome, Reconciler};
pub use resource::{Resource, ResourceKind, Security, SystemLoginUser, SystemRootAuthentication};
pub use session::{MemoryDevice, Session, SessionFactory};
