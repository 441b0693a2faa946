//! CLI commands
//!
//! Implements init, check and plan; `order` and `deps` are thin enough to
//! live in the binary.

pub mod check;
pub mod init;
pub mod plan;

pub use check::{check_registry, CheckReport};
pub use init::{init_module, InitError};
pub use plan::{stale_against_plan, write_plan};
