//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Late arrival tracker for the school attendance office.
///
/// Records late arrivals against the student roster, tallies repeat
/// offenders, and handles year-end class promotion and graduation.
#[derive(Debug, Parser)]
#[command(name = "lt", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Record one late arrival.
    Record {
        /// Class of the student (e.g. XII-TP-1).
        #[arg(long)]
        class: String,

        /// Enrollment number (NIS) of the student.
        #[arg(long)]
        nis: String,

        /// Arrival clock time as HH:MM. Defaults to now.
        #[arg(long)]
        time: Option<String>,

        /// Calendar date as YYYY-MM-DD. Defaults to today.
        #[arg(long)]
        date: Option<String>,

        /// Stated reason for being late.
        #[arg(long)]
        reason: Option<String>,

        /// Free-form note from the attendance office.
        #[arg(long)]
        note: Option<String>,

        /// Name of the staff member recording the entry.
        #[arg(long)]
        by: Option<String>,
    },

    /// Show late arrivals for a period, newest first.
    Report {
        /// Start date (YYYY-MM-DD, inclusive).
        #[arg(long, conflicts_with = "month")]
        from: Option<String>,

        /// End date (YYYY-MM-DD, inclusive).
        #[arg(long, conflicts_with = "month")]
        to: Option<String>,

        /// Calendar month as YYYY-MM. Defaults to the current month
        /// when no range is given.
        #[arg(long)]
        month: Option<String>,

        /// Restrict to one class.
        #[arg(long)]
        class: Option<String>,

        /// Output JSON instead of human-readable text.
        #[arg(long)]
        json: bool,
    },

    /// Manage the student roster.
    Students {
        #[command(subcommand)]
        action: StudentsAction,
    },

    /// Set one student's lifecycle status.
    SetStatus {
        /// Enrollment number (NIS) of the student.
        #[arg(long)]
        nis: String,

        /// New status: active, inactive, or graduated.
        #[arg(long)]
        status: String,
    },

    /// Move every active student from one class to another.
    Promote {
        /// Source class label.
        #[arg(long)]
        from: String,

        /// Destination class label.
        #[arg(long)]
        to: String,
    },

    /// Graduate every active student in one class.
    Graduate {
        /// Class label.
        #[arg(long)]
        class: String,
    },

    /// Graduate every active student in all classes matching a prefix.
    GraduateSeniors {
        /// Class label prefix, matched case-insensitively.
        #[arg(long, default_value = "XII")]
        prefix: String,
    },
}

/// Roster management subcommands.
#[derive(Debug, Subcommand)]
pub enum StudentsAction {
    /// Add one student by hand.
    Add {
        /// Enrollment number (NIS), must be unique.
        #[arg(long)]
        nis: String,

        /// Full name.
        #[arg(long)]
        name: String,

        /// Class label.
        #[arg(long)]
        class: String,
    },

    /// Import a roster file (comma-delimited with a header row).
    Import {
        /// Path to the roster file.
        file: PathBuf,
    },

    /// List all students.
    List {
        /// Output JSON instead of human-readable text.
        #[arg(long)]
        json: bool,
    },
}
