//! CLI subcommand implementations.

pub mod lifecycle;
pub mod record;
pub mod report;
pub mod students;
