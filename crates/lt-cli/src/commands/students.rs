//! Roster management commands.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result, bail};
use lt_core::{EngineConfig, StudentStatus, parse_roster};
use lt_db::Database;

pub fn add<W: Write>(
    writer: &mut W,
    db: &Database,
    nis: &str,
    name: &str,
    class: &str,
) -> Result<()> {
    let student = db.add_student(nis, name, class, StudentStatus::Active)?;
    writeln!(
        writer,
        "Added {} (NIS {}) to {}",
        student.nama, student.nis, student.kelas
    )?;
    Ok(())
}

/// Imports a roster file with batched upserts keyed on NIS.
///
/// Batches that committed before a failure stay committed; the command
/// reports what was applied and then fails so scripts see the stop.
pub fn import<W: Write>(
    writer: &mut W,
    db: &mut Database,
    engine: &EngineConfig,
    path: &Path,
) -> Result<()> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let rows = parse_roster(&text)?;
    if rows.is_empty() {
        writeln!(writer, "No rows to import.")?;
        return Ok(());
    }

    let outcome = db.upsert_roster(&rows, engine.import_batch_size)?;
    writeln!(
        writer,
        "Imported {} of {} rows in {} batches",
        outcome.rows_applied,
        rows.len(),
        outcome.batches_applied
    )?;

    if let Some(failure) = outcome.failure {
        bail!(
            "import stopped at batch {}: {}",
            failure.batch_index,
            failure.message
        );
    }
    Ok(())
}

pub fn list<W: Write>(writer: &mut W, db: &Database, json: bool) -> Result<()> {
    let students = db.list_students()?;

    if json {
        serde_json::to_writer_pretty(&mut *writer, &students)?;
        writeln!(writer)?;
        return Ok(());
    }

    if students.is_empty() {
        writeln!(writer, "No students.")?;
        return Ok(());
    }
    for student in students {
        writeln!(
            writer,
            "{}  {} ({})  {}",
            student.nis, student.nama, student.kelas, student.status
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_then_list_shows_student() {
        let db = Database::open_in_memory().unwrap();

        let mut output = Vec::new();
        add(&mut output, &db, "001", "Ana", "X-1").unwrap();
        list(&mut output, &db, false).unwrap();

        let output = String::from_utf8(output).unwrap();
        assert!(output.contains("Added Ana (NIS 001) to X-1"));
        assert!(output.contains("001  Ana (X-1)  ACTIVE"));
    }

    #[test]
    fn add_duplicate_nis_fails() {
        let db = Database::open_in_memory().unwrap();

        let mut output = Vec::new();
        add(&mut output, &db, "001", "Ana", "X-1").unwrap();
        let err = add(&mut output, &db, "001", "Budi", "XI-1").unwrap_err();
        assert!(err.to_string().contains("001"));
    }

    #[test]
    fn import_applies_roster_file() {
        let temp = tempfile::tempdir().unwrap();
        let roster = temp.path().join("roster.csv");
        std::fs::write(
            &roster,
            "nis,nama,kelas,status\n001,Ana,X-1,\n002,Budi,XII-1,LULUS\n",
        )
        .unwrap();

        let mut db = Database::open_in_memory().unwrap();
        let engine = EngineConfig::default();

        let mut output = Vec::new();
        import(&mut output, &mut db, &engine, &roster).unwrap();

        let output = String::from_utf8(output).unwrap();
        assert!(output.contains("Imported 2 of 2 rows in 1 batches"));

        let budi = db.find_student_by_nis("002").unwrap().unwrap();
        assert_eq!(budi.status, StudentStatus::Graduated);
    }

    #[test]
    fn import_fails_on_missing_column() {
        let temp = tempfile::tempdir().unwrap();
        let roster = temp.path().join("roster.csv");
        std::fs::write(&roster, "nis,nama\n001,Ana\n").unwrap();

        let mut db = Database::open_in_memory().unwrap();
        let engine = EngineConfig::default();

        let mut output = Vec::new();
        let err = import(&mut output, &mut db, &engine, &roster).unwrap_err();
        assert!(err.to_string().contains("kelas"));
        assert!(db.list_students().unwrap().is_empty());
    }

    #[test]
    fn import_header_only_is_a_noop() {
        let temp = tempfile::tempdir().unwrap();
        let roster = temp.path().join("roster.csv");
        std::fs::write(&roster, "nis,nama,kelas\n").unwrap();

        let mut db = Database::open_in_memory().unwrap();
        let engine = EngineConfig::default();

        let mut output = Vec::new();
        import(&mut output, &mut db, &engine, &roster).unwrap();
        assert!(String::from_utf8(output).unwrap().contains("No rows to import."));
    }

    #[test]
    fn list_json_round_trips() {
        let db = Database::open_in_memory().unwrap();
        db.add_student("001", "Ana", "X-1", StudentStatus::Active)
            .unwrap();

        let mut output = Vec::new();
        list(&mut output, &db, true).unwrap();

        let parsed: serde_json::Value = serde_json::from_slice(&output).unwrap();
        assert_eq!(parsed[0]["nis"], "001");
        assert_eq!(parsed[0]["status"], "ACTIVE");
    }
}
