//! Late arrival tracker CLI library.
//!
//! This crate provides the CLI interface for the late arrival tracker.

mod cli;
pub mod commands;
mod config;

pub use cli::{Cli, Commands, StudentsAction};
pub use config::Config;
