//! Core type definitions with validation.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation errors for core types and engine inputs.
///
/// Every variant is raised before any store call, so a validation failure
/// never leaves a partial effect behind.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The provided value was empty.
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    /// Invalid student status value.
    #[error("invalid student status: {value}")]
    InvalidStatus { value: String },

    /// The roster header is missing one of the required columns.
    #[error("roster header must include the {column} column")]
    MissingColumn { column: &'static str },

    /// The roster input has no header row at all.
    #[error("roster input is empty")]
    EmptyRoster,

    /// A class promotion was asked to move students onto themselves.
    #[error("source and destination class are both {class}")]
    SameClass { class: String },

    /// A student with this enrollment number already exists.
    #[error("a student with NIS {nis} already exists")]
    DuplicateNis { nis: String },

    /// No student matched the given enrollment number.
    #[error("no student found with NIS {nis}")]
    StudentNotFound { nis: String },
}

/// Lifecycle status of a student.
///
/// Transitions are deliberately unrestricted: office staff may set any
/// status at any time, including moving a graduated student back to
/// active as an administrative correction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StudentStatus {
    Active,
    Inactive,
    Graduated,
}

impl StudentStatus {
    /// String representation for database storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Inactive => "INACTIVE",
            Self::Graduated => "GRADUATED",
        }
    }

    /// Maps a raw roster status cell to a status.
    ///
    /// The feed uses the school's own labels: exactly `LULUS` (after
    /// upper-casing) means graduated, exactly `NONAKTIF` means inactive,
    /// and everything else, including an empty cell, defaults to active.
    #[must_use]
    pub fn from_roster_cell(raw: &str) -> Self {
        match raw.trim().to_uppercase().as_str() {
            "LULUS" => Self::Graduated,
            "NONAKTIF" => Self::Inactive,
            _ => Self::Active,
        }
    }
}

impl fmt::Display for StudentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for StudentStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "ACTIVE" => Ok(Self::Active),
            "INACTIVE" => Ok(Self::Inactive),
            "GRADUATED" => Ok(Self::Graduated),
            _ => Err(ValidationError::InvalidStatus {
                value: s.to_string(),
            }),
        }
    }
}
