//! Roster feed parsing.
//!
//! The roster arrives as comma-delimited UTF-8 text with a header row.
//! There is no quoting or escaping support: a field containing the
//! delimiter will misalign its row. That is a documented limitation of
//! the feed format, not something to fix here; producers pre-sanitize.

use crate::types::{StudentStatus, ValidationError};

const DELIMITER: char = ',';

/// One accepted roster row, ready for upsert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterRow {
    pub nis: String,
    pub nama: String,
    pub kelas: String,
    pub status: StudentStatus,
}

/// Parses the roster feed.
///
/// The header is matched case-insensitively for `nis`, `nama`, `kelas`
/// and the optional `status`; a missing required column rejects the
/// whole input. Data rows with any required field blank after trimming
/// are silently dropped rather than reported individually.
pub fn parse_roster(text: &str) -> Result<Vec<RosterRow>, ValidationError> {
    let mut lines = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty());

    let header = lines.next().ok_or(ValidationError::EmptyRoster)?;
    let columns: Vec<String> = header
        .split(DELIMITER)
        .map(|cell| cell.trim().to_lowercase())
        .collect();

    let idx_nis = required_column(&columns, "nis")?;
    let idx_nama = required_column(&columns, "nama")?;
    let idx_kelas = required_column(&columns, "kelas")?;
    let idx_status = columns.iter().position(|cell| cell == "status");

    let mut rows = Vec::new();
    for line in lines {
        let cells: Vec<&str> = line.split(DELIMITER).map(str::trim).collect();
        let nis = cell_at(&cells, idx_nis);
        let nama = cell_at(&cells, idx_nama);
        let kelas = cell_at(&cells, idx_kelas);
        if nis.is_empty() || nama.is_empty() || kelas.is_empty() {
            continue;
        }
        let status = idx_status
            .map(|idx| StudentStatus::from_roster_cell(cell_at(&cells, idx)))
            .unwrap_or(StudentStatus::Active);
        rows.push(RosterRow {
            nis: nis.to_string(),
            nama: nama.to_string(),
            kelas: kelas.to_string(),
            status,
        });
    }

    Ok(rows)
}

fn required_column(
    columns: &[String],
    name: &'static str,
) -> Result<usize, ValidationError> {
    columns
        .iter()
        .position(|cell| cell == name)
        .ok_or(ValidationError::MissingColumn { column: name })
}

fn cell_at<'a>(cells: &[&'a str], idx: usize) -> &'a str {
    cells.get(idx).copied().unwrap_or_default()
}
