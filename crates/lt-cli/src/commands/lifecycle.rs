//! Lifecycle commands: status changes, promotion, graduation.

use std::io::Write;

use anyhow::{Context, Result, anyhow};
use lt_core::StudentStatus;
use lt_db::Database;

pub fn set_status<W: Write>(
    writer: &mut W,
    db: &Database,
    nis: &str,
    status: &str,
) -> Result<()> {
    let status: StudentStatus = status
        .parse()
        .context("expected active, inactive, or graduated")?;
    let student = db
        .find_student_by_nis(nis)?
        .ok_or_else(|| anyhow!("no student found with NIS {nis}"))?;
    db.set_status(&student.id, status)?;
    writeln!(
        writer,
        "Status of {} (NIS {}) set to {}",
        student.nama, student.nis, status
    )?;
    Ok(())
}

pub fn promote<W: Write>(writer: &mut W, db: &Database, from: &str, to: &str) -> Result<()> {
    let moved = db.promote_class(from, to)?;
    writeln!(writer, "Promoted {moved} students from {from} to {to}")?;
    Ok(())
}

pub fn graduate<W: Write>(writer: &mut W, db: &Database, class: &str) -> Result<()> {
    let graduated = db.graduate_class(class)?;
    writeln!(writer, "Graduated {graduated} students in {class}")?;
    Ok(())
}

pub fn graduate_seniors<W: Write>(writer: &mut W, db: &Database, prefix: &str) -> Result<()> {
    let sweep = db.graduate_senior_classes(prefix)?;
    if sweep.classes.is_empty() {
        writeln!(writer, "No active classes match prefix {prefix}")?;
        return Ok(());
    }
    writeln!(
        writer,
        "Graduated {} students across {} classes: {}",
        sweep.students_graduated,
        sweep.classes.len(),
        sweep.classes.join(", ")
    )?;
    Ok(())
}
