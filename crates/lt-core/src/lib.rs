//! Core domain logic for the late arrival tracker.
//!
//! This crate contains the fundamental types and logic for:
//! - Time rules: lateness relative to the school cutoff, duration formatting
//! - Tally: per-student occurrence counts and threshold classification
//! - Roster: parsing the delimited roster feed used for bulk import

pub mod class;
mod config;
pub mod roster;
pub mod tally;
pub mod time_rule;
pub mod types;

pub use config::EngineConfig;
pub use roster::{RosterRow, parse_roster};
pub use tally::{OffenderEntry, OffenseTally, TalliedEvent};
pub use time_rule::{format_duration, late_minutes, time_to_minutes};
pub use types::{StudentStatus, ValidationError};
