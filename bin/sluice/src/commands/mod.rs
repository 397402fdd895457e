//! Subcommand implementations.

pub mod cat;
pub mod confirm;
pub mod describe;
pub mod list;
pub mod put;
