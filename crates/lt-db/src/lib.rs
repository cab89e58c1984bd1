//! Storage layer for the late arrival tracker.
//!
//! Provides persistence for the student roster and late arrival events
//! using `rusqlite`, plus the operations that are inseparable from the
//! store: recording an arrival, the bulk lifecycle updates, and the
//! batched roster upsert.
//!
//! # Thread Safety
//!
//! The [`Database`] type wraps a `rusqlite::Connection`, which is `Send`
//! but not `Sync`. For multi-threaded access use a `Mutex<Database>` or
//! separate instances per thread.
//!
//! # Schema
//!
//! Dates are stored as TEXT in `YYYY-MM-DD` form, so lexicographic
//! ordering matches calendar ordering. Arrival times are stored as the
//! raw `HH:MM` strings the office enters; lateness is derived on read
//! and never persisted. Events carry a snapshot of the student's
//! `nis`/`nama`/`kelas` taken at insert time so historic report rows
//! stay readable even after the roster changes.

use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, params, params_from_iter};
use serde::Serialize;
use std::path::Path;
use thiserror::Error;
use uuid::Uuid;

use lt_core::{EngineConfig, RosterRow, StudentStatus, TalliedEvent, ValidationError, class, late_minutes};

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// Input was rejected before any store call.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// A stored status string could not be interpreted.
    #[error("corrupt status for student {student_id}: {value}")]
    CorruptStatus { student_id: String, value: String },
}

/// A student roster row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudentRecord {
    pub id: String,
    pub nis: String,
    pub nama: String,
    pub kelas: String,
    pub status: StudentStatus,
}

/// A stored late arrival event. Append-only: nothing in this engine
/// ever mutates or deletes one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArrivalRecord {
    pub id: String,
    /// Calendar date, local ("YYYY-MM-DD").
    pub tanggal: String,
    /// Arrival clock time as entered ("HH:MM").
    pub jam_datang: String,
    pub student_id: Option<String>,
    pub nis: Option<String>,
    pub nama: String,
    pub kelas: String,
    pub alasan: Option<String>,
    pub catatan: Option<String>,
    pub recorded_by: Option<String>,
}

impl TalliedEvent for ArrivalRecord {
    fn student_id(&self) -> Option<&str> {
        self.student_id.as_deref()
    }

    fn nis(&self) -> Option<&str> {
        self.nis.as_deref()
    }

    fn nama(&self) -> &str {
        &self.nama
    }

    fn kelas(&self) -> &str {
        &self.kelas
    }
}

/// Input for recording one late arrival.
#[derive(Debug, Clone)]
pub struct NewArrival {
    pub tanggal: NaiveDate,
    pub jam_datang: String,
    pub kelas: String,
    pub nis: String,
    pub alasan: Option<String>,
    pub catatan: Option<String>,
    pub recorded_by: Option<String>,
}

/// Outcome of recording an arrival. The warning is advisory: by the
/// time it is raised the event is already durably saved.
#[derive(Debug, Clone)]
pub struct RecordedArrival {
    pub event: ArrivalRecord,
    pub late_minutes: u32,
    /// All-time event count for this student, including the new event.
    pub total_count: usize,
    /// True once the count reaches the hard warning threshold.
    pub warning: bool,
}

/// Result of a senior graduation sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraduationSweep {
    /// Class labels that matched the prefix. Empty means the sweep was
    /// a no-op, which is a valid zero result, not an error.
    pub classes: Vec<String>,
    pub students_graduated: usize,
}

/// Structured result of a batched roster upsert.
///
/// A mid-sequence batch failure stops processing but does not roll
/// back earlier batches; re-running the import is safe because the
/// upsert key is idempotent per row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportOutcome {
    /// Rows applied across the batches that committed.
    pub rows_applied: usize,
    pub batches_applied: usize,
    pub failure: Option<ImportFailure>,
}

/// The batch that stopped an import, 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportFailure {
    pub batch_index: usize,
    pub message: String,
}

/// Database connection wrapper.
///
/// See the [module documentation](self) for thread safety notes.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Opens an in-memory database. Useful for testing.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initializes the schema. Idempotent.
    fn init(&self) -> Result<(), DbError> {
        self.conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS students (
                id TEXT PRIMARY KEY,
                nis TEXT NOT NULL UNIQUE,
                nama TEXT NOT NULL,
                kelas TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'ACTIVE'
            );

            CREATE INDEX IF NOT EXISTS idx_students_kelas ON students(kelas);

            -- Late arrival events: append-only.
            -- tanggal: local calendar date ('YYYY-MM-DD')
            -- jam_datang: arrival clock time as entered ('HH:MM')
            -- nis/nama/kelas: snapshot of the student at insert time
            CREATE TABLE IF NOT EXISTS late_attendance (
                id TEXT PRIMARY KEY,
                tanggal TEXT NOT NULL,
                jam_datang TEXT NOT NULL,
                student_id TEXT REFERENCES students(id),
                nis TEXT,
                nama TEXT NOT NULL,
                kelas TEXT NOT NULL,
                alasan TEXT,
                catatan TEXT,
                recorded_by TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_late_tanggal ON late_attendance(tanggal);
            CREATE INDEX IF NOT EXISTS idx_late_student ON late_attendance(student_id);
            ",
        )?;
        Ok(())
    }

    // ========== Roster ==========

    /// Adds one student by manual entry.
    ///
    /// `nis` must be globally unique; the check is a read-before-insert
    /// rather than a transactional constraint, matching the interactive
    /// flow this backs.
    pub fn add_student(
        &self,
        nis: &str,
        nama: &str,
        kelas: &str,
        status: StudentStatus,
    ) -> Result<StudentRecord, DbError> {
        let nis = nis.trim();
        let nama = nama.trim();
        let kelas = class::normalize(kelas);
        if nis.is_empty() {
            return Err(ValidationError::Empty { field: "NIS" }.into());
        }
        if nama.is_empty() {
            return Err(ValidationError::Empty { field: "name" }.into());
        }
        if kelas.is_empty() {
            return Err(ValidationError::Empty { field: "class" }.into());
        }
        if self.find_student_by_nis(nis)?.is_some() {
            return Err(ValidationError::DuplicateNis {
                nis: nis.to_string(),
            }
            .into());
        }

        let record = StudentRecord {
            id: Uuid::new_v4().to_string(),
            nis: nis.to_string(),
            nama: nama.to_string(),
            kelas: kelas.to_string(),
            status,
        };
        self.conn.execute(
            "INSERT INTO students (id, nis, nama, kelas, status) VALUES (?, ?, ?, ?, ?)",
            params![record.id, record.nis, record.nama, record.kelas, record.status.as_str()],
        )?;
        Ok(record)
    }

    /// Looks up a student by enrollment number.
    pub fn find_student_by_nis(&self, nis: &str) -> Result<Option<StudentRecord>, DbError> {
        let row = self
            .conn
            .query_row(
                "SELECT id, nis, nama, kelas, status FROM students WHERE nis = ?",
                [nis.trim()],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                    ))
                },
            )
            .optional()?;
        row.map(Self::into_student).transpose()
    }

    /// Lists all students ordered by class then name.
    pub fn list_students(&self) -> Result<Vec<StudentRecord>, DbError> {
        self.query_students(
            "SELECT id, nis, nama, kelas, status FROM students ORDER BY kelas ASC, nama ASC",
            &[],
        )
    }

    /// Lists ACTIVE students in one class, ordered by name.
    pub fn students_in_class(&self, kelas: &str) -> Result<Vec<StudentRecord>, DbError> {
        self.query_students(
            "
            SELECT id, nis, nama, kelas, status FROM students
            WHERE kelas = ? AND status = 'ACTIVE'
            ORDER BY nama ASC
            ",
            &[class::normalize(kelas)],
        )
    }

    /// Distinct class labels present among ACTIVE students, sorted.
    pub fn class_labels(&self) -> Result<Vec<String>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT kelas FROM students WHERE status = 'ACTIVE' ORDER BY kelas ASC",
        )?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let mut labels = Vec::new();
        for row in rows {
            labels.push(row?);
        }
        Ok(labels)
    }

    /// Whether a class label is known to the store, either on a student
    /// of any status or on a historic event snapshot. Used to validate
    /// report filters without excluding graduated classes.
    pub fn class_exists(&self, kelas: &str) -> Result<bool, DbError> {
        let found: bool = self.conn.query_row(
            "
            SELECT EXISTS (
                SELECT 1 FROM students WHERE kelas = ?1
                UNION
                SELECT 1 FROM late_attendance WHERE kelas = ?1
            )
            ",
            [class::normalize(kelas)],
            |row| row.get(0),
        )?;
        Ok(found)
    }

    fn query_students(
        &self,
        sql: &str,
        args: &[&str],
    ) -> Result<Vec<StudentRecord>, DbError> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params_from_iter(args), |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
            ))
        })?;
        let mut students = Vec::new();
        for row in rows {
            students.push(Self::into_student(row?)?);
        }
        Ok(students)
    }

    fn into_student(
        (id, nis, nama, kelas, status): (String, String, String, String, String),
    ) -> Result<StudentRecord, DbError> {
        let parsed = status
            .parse::<StudentStatus>()
            .map_err(|_| DbError::CorruptStatus {
                student_id: id.clone(),
                value: status,
            })?;
        Ok(StudentRecord {
            id,
            nis,
            nama,
            kelas,
            status: parsed,
        })
    }

    // ========== Lifecycle ==========

    /// Sets a single student's status unconditionally.
    ///
    /// Any transition is allowed, including moving a graduated student
    /// back to active. Returns the number of rows touched (0 or 1).
    pub fn set_status(
        &self,
        student_id: &str,
        status: StudentStatus,
    ) -> Result<usize, DbError> {
        let affected = self.conn.execute(
            "UPDATE students SET status = ? WHERE id = ?",
            params![status.as_str(), student_id],
        )?;
        Ok(affected)
    }

    /// Moves every ACTIVE student in `from` to `to`.
    ///
    /// Students who are not ACTIVE keep their historic class label.
    /// Idempotent only in the sense that a second identical run finds
    /// no ACTIVE students left in `from` and reports 0.
    pub fn promote_class(&self, from: &str, to: &str) -> Result<usize, DbError> {
        let from = class::normalize(from);
        let to = class::normalize(to);
        if from.is_empty() {
            return Err(ValidationError::Empty { field: "source class" }.into());
        }
        if to.is_empty() {
            return Err(ValidationError::Empty { field: "destination class" }.into());
        }
        if class::matches(from, to) {
            return Err(ValidationError::SameClass {
                class: from.to_string(),
            }
            .into());
        }

        let affected = self.conn.execute(
            "UPDATE students SET kelas = ?2 WHERE kelas = ?1 AND status = 'ACTIVE'",
            params![from, to],
        )?;
        tracing::debug!(from, to, affected, "promoted class");
        Ok(affected)
    }

    /// Graduates every ACTIVE student in one class.
    pub fn graduate_class(&self, target: &str) -> Result<usize, DbError> {
        let target = class::normalize(target);
        if target.is_empty() {
            return Err(ValidationError::Empty { field: "class" }.into());
        }
        let affected = self.conn.execute(
            "UPDATE students SET status = 'GRADUATED' WHERE kelas = ? AND status = 'ACTIVE'",
            [target],
        )?;
        tracing::debug!(kelas = target, affected, "graduated class");
        Ok(affected)
    }

    /// Graduates every ACTIVE student in every class whose label starts
    /// with `prefix` (case-insensitive), in one batched update.
    ///
    /// No matching class is a valid zero result, not an error.
    pub fn graduate_senior_classes(&self, prefix: &str) -> Result<GraduationSweep, DbError> {
        let prefix = class::normalize(prefix);
        if prefix.is_empty() {
            return Err(ValidationError::Empty { field: "class prefix" }.into());
        }

        let classes: Vec<String> = self
            .class_labels()?
            .into_iter()
            .filter(|label| class::has_prefix(label, prefix))
            .collect();
        if classes.is_empty() {
            return Ok(GraduationSweep {
                classes,
                students_graduated: 0,
            });
        }

        let placeholders = vec!["?"; classes.len()].join(", ");
        let sql = format!(
            "UPDATE students SET status = 'GRADUATED' WHERE kelas IN ({placeholders}) AND status = 'ACTIVE'"
        );
        let affected = self.conn.execute(&sql, params_from_iter(classes.iter()))?;
        tracing::debug!(?classes, affected, "graduated senior classes");
        Ok(GraduationSweep {
            classes,
            students_graduated: affected,
        })
    }

    // ========== Events ==========

    /// Records one late arrival.
    ///
    /// The student reference is resolved to the canonical current
    /// `nis`/`nama`/`kelas` and those values are copied onto the event,
    /// never re-synced afterwards. After the insert the student's
    /// all-time count is re-queried for the hard warning check.
    pub fn record_arrival(
        &self,
        input: &NewArrival,
        config: &EngineConfig,
    ) -> Result<RecordedArrival, DbError> {
        if class::normalize(&input.kelas).is_empty() {
            return Err(ValidationError::Empty { field: "class" }.into());
        }
        if input.nis.trim().is_empty() {
            return Err(ValidationError::Empty { field: "student" }.into());
        }
        if input.jam_datang.trim().is_empty() {
            return Err(ValidationError::Empty { field: "arrival time" }.into());
        }

        let student = self
            .find_student_by_nis(&input.nis)?
            .ok_or_else(|| ValidationError::StudentNotFound {
                nis: input.nis.trim().to_string(),
            })?;

        let event = ArrivalRecord {
            id: Uuid::new_v4().to_string(),
            tanggal: input.tanggal.format("%Y-%m-%d").to_string(),
            jam_datang: input.jam_datang.trim().to_string(),
            student_id: Some(student.id.clone()),
            nis: Some(student.nis.clone()),
            nama: student.nama.clone(),
            kelas: student.kelas.clone(),
            alasan: none_if_blank(input.alasan.as_deref()),
            catatan: none_if_blank(input.catatan.as_deref()),
            recorded_by: none_if_blank(input.recorded_by.as_deref()),
        };
        self.conn.execute(
            "
            INSERT INTO late_attendance
            (id, tanggal, jam_datang, student_id, nis, nama, kelas, alasan, catatan, recorded_by)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ",
            params![
                event.id,
                event.tanggal,
                event.jam_datang,
                event.student_id,
                event.nis,
                event.nama,
                event.kelas,
                event.alasan,
                event.catatan,
                event.recorded_by,
            ],
        )?;

        let total_count = self.count_events_for_student(&student.id)?;
        let warning = total_count >= config.hard_warning_threshold;
        if warning {
            tracing::info!(
                nama = %student.nama,
                total_count,
                threshold = config.hard_warning_threshold,
                "hard warning threshold reached"
            );
        }

        Ok(RecordedArrival {
            late_minutes: late_minutes(&event.jam_datang, &config.cutoff),
            event,
            total_count,
            warning,
        })
    }

    /// All-time event count for one student.
    pub fn count_events_for_student(&self, student_id: &str) -> Result<usize, DbError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM late_attendance WHERE student_id = ?",
            [student_id],
            |row| row.get(0),
        )?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    /// Events between two dates inclusive, optionally filtered to one
    /// class, newest first.
    pub fn events_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        kelas: Option<&str>,
    ) -> Result<Vec<ArrivalRecord>, DbError> {
        let start = start.format("%Y-%m-%d").to_string();
        let end = end.format("%Y-%m-%d").to_string();
        let mut sql = String::from(
            "
            SELECT id, tanggal, jam_datang, student_id, nis, nama, kelas, alasan, catatan, recorded_by
            FROM late_attendance
            WHERE tanggal >= ? AND tanggal <= ?
            ",
        );
        let mut args = vec![start, end];
        if let Some(kelas) = kelas {
            sql.push_str(" AND kelas = ?");
            args.push(class::normalize(kelas).to_string());
        }
        sql.push_str(" ORDER BY tanggal DESC, jam_datang DESC, id ASC");

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(args.iter()), |row| {
            Ok(ArrivalRecord {
                id: row.get(0)?,
                tanggal: row.get(1)?,
                jam_datang: row.get(2)?,
                student_id: row.get(3)?,
                nis: row.get(4)?,
                nama: row.get(5)?,
                kelas: row.get(6)?,
                alasan: row.get(7)?,
                catatan: row.get(8)?,
                recorded_by: row.get(9)?,
            })
        })?;
        let mut events = Vec::new();
        for row in rows {
            events.push(row?);
        }
        Ok(events)
    }

    // ========== Import ==========

    /// Applies parsed roster rows as a batched idempotent upsert keyed
    /// on `nis`.
    ///
    /// Batches commit strictly in order. A failing batch stops the
    /// sequence; committed batches stay committed and the outcome
    /// carries the 1-based index of the batch that failed.
    pub fn upsert_roster(
        &mut self,
        rows: &[RosterRow],
        batch_size: usize,
    ) -> Result<ImportOutcome, DbError> {
        if batch_size == 0 {
            return Err(ValidationError::Empty { field: "batch size" }.into());
        }

        let mut outcome = ImportOutcome {
            rows_applied: 0,
            batches_applied: 0,
            failure: None,
        };

        for (index, batch) in rows.chunks(batch_size).enumerate() {
            match self.upsert_batch(batch) {
                Ok(()) => {
                    outcome.rows_applied += batch.len();
                    outcome.batches_applied += 1;
                    tracing::debug!(batch = index + 1, rows = batch.len(), "roster batch applied");
                }
                Err(err) => {
                    outcome.failure = Some(ImportFailure {
                        batch_index: index + 1,
                        message: err.to_string(),
                    });
                    break;
                }
            }
        }

        Ok(outcome)
    }

    fn upsert_batch(&mut self, batch: &[RosterRow]) -> Result<(), DbError> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "
                INSERT INTO students (id, nis, nama, kelas, status)
                VALUES (?, ?, ?, ?, ?)
                ON CONFLICT(nis) DO UPDATE SET
                    nama = excluded.nama,
                    kelas = excluded.kelas,
                    status = excluded.status
                ",
            )?;
            for row in batch {
                stmt.execute(params![
                    Uuid::new_v4().to_string(),
                    row.nis,
                    row.nama,
                    row.kelas,
                    row.status.as_str(),
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }
}

fn none_if_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|trimmed| !trimmed.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    use lt_core::OffenseTally;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn arrival(nis: &str, tanggal: &str, jam: &str) -> NewArrival {
        NewArrival {
            tanggal: date(tanggal),
            jam_datang: jam.to_string(),
            kelas: "X-1".to_string(),
            nis: nis.to_string(),
            alasan: None,
            catatan: None,
            recorded_by: None,
        }
    }

    fn seed(db: &Database) {
        db.add_student("001", "Ana", "X-1", StudentStatus::Active)
            .unwrap();
        db.add_student("002", "Budi", "X-1", StudentStatus::Active)
            .unwrap();
        db.add_student("003", "Citra", "XI-1", StudentStatus::Active)
            .unwrap();
    }

    #[test]
    fn open_in_memory_database() {
        assert!(Database::open_in_memory().is_ok());
    }

    #[test]
    fn schema_init_is_idempotent_on_reopen() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("lt.db");
        {
            let db = Database::open(&path).unwrap();
            db.add_student("001", "Ana", "X-1", StudentStatus::Active)
                .unwrap();
        }
        let db = Database::open(&path).unwrap();
        assert_eq!(db.list_students().unwrap().len(), 1);
    }

    // ========== Roster ==========

    #[test]
    fn add_student_trims_fields() {
        let db = Database::open_in_memory().unwrap();
        let student = db
            .add_student(" 001 ", " Ana ", " X-1 ", StudentStatus::Active)
            .unwrap();
        assert_eq!(student.nis, "001");
        assert_eq!(student.nama, "Ana");
        assert_eq!(student.kelas, "X-1");
    }

    #[test]
    fn add_student_rejects_duplicate_nis() {
        let db = Database::open_in_memory().unwrap();
        db.add_student("001", "Ana", "X-1", StudentStatus::Active)
            .unwrap();
        let err = db
            .add_student("001", "Other", "XI-1", StudentStatus::Active)
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Validation(ValidationError::DuplicateNis { .. })
        ));
        // Graduated students keep their NIS reserved too.
        db.add_student("002", "Budi", "XII-1", StudentStatus::Graduated)
            .unwrap();
        assert!(
            db.add_student("002", "Again", "X-1", StudentStatus::Active)
                .is_err()
        );
    }

    #[test]
    fn add_student_rejects_blank_fields() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.add_student("", "Ana", "X-1", StudentStatus::Active).is_err());
        assert!(db.add_student("001", "  ", "X-1", StudentStatus::Active).is_err());
        assert!(db.add_student("001", "Ana", "", StudentStatus::Active).is_err());
    }

    #[test]
    fn students_in_class_lists_active_only_ordered_by_name() {
        let db = Database::open_in_memory().unwrap();
        db.add_student("002", "Budi", "X-1", StudentStatus::Active)
            .unwrap();
        db.add_student("001", "Ana", "X-1", StudentStatus::Active)
            .unwrap();
        db.add_student("003", "Citra", "X-1", StudentStatus::Inactive)
            .unwrap();
        db.add_student("004", "Dewi", "XI-1", StudentStatus::Active)
            .unwrap();

        let students = db.students_in_class("X-1").unwrap();
        let names: Vec<&str> = students.iter().map(|s| s.nama.as_str()).collect();
        assert_eq!(names, vec!["Ana", "Budi"]);
    }

    #[test]
    fn class_labels_are_distinct_active_and_sorted() {
        let db = Database::open_in_memory().unwrap();
        seed(&db);
        db.add_student("004", "Dewi", "XII-1", StudentStatus::Graduated)
            .unwrap();

        assert_eq!(db.class_labels().unwrap(), vec!["X-1", "XI-1"]);
    }

    #[test]
    fn class_exists_covers_inactive_students_and_historic_events() {
        let db = Database::open_in_memory().unwrap();
        seed(&db);
        let config = EngineConfig::default();
        db.record_arrival(&arrival("001", "2025-03-10", "06:45"), &config)
            .unwrap();

        assert!(db.class_exists("X-1").unwrap());
        assert!(db.class_exists(" X-1 ").unwrap());
        assert!(!db.class_exists("XII-9").unwrap());

        // Graduating empties the ACTIVE label list but the class is
        // still known through the roster rows and event snapshots.
        db.graduate_class("X-1").unwrap();
        assert_eq!(db.class_labels().unwrap(), vec!["XI-1"]);
        assert!(db.class_exists("X-1").unwrap());
    }

    // ========== Lifecycle ==========

    #[test]
    fn set_status_allows_any_transition() {
        let db = Database::open_in_memory().unwrap();
        let student = db
            .add_student("001", "Ana", "XII-1", StudentStatus::Graduated)
            .unwrap();

        // Administrative correction: un-graduating is allowed.
        assert_eq!(db.set_status(&student.id, StudentStatus::Active).unwrap(), 1);
        let reloaded = db.find_student_by_nis("001").unwrap().unwrap();
        assert_eq!(reloaded.status, StudentStatus::Active);

        assert_eq!(db.set_status("missing", StudentStatus::Active).unwrap(), 0);
    }

    #[test]
    fn promote_class_moves_only_active_students() {
        let db = Database::open_in_memory().unwrap();
        db.add_student("001", "Ana", "X-1", StudentStatus::Active)
            .unwrap();
        db.add_student("002", "Budi", "X-1", StudentStatus::Inactive)
            .unwrap();
        db.add_student("003", "Citra", "XI-1", StudentStatus::Active)
            .unwrap();

        assert_eq!(db.promote_class("X-1", "XI-1").unwrap(), 1);

        let ana = db.find_student_by_nis("001").unwrap().unwrap();
        assert_eq!(ana.kelas, "XI-1");
        let budi = db.find_student_by_nis("002").unwrap().unwrap();
        assert_eq!(budi.kelas, "X-1");
    }

    #[test]
    fn promote_class_is_idempotent() {
        let db = Database::open_in_memory().unwrap();
        seed(&db);
        assert_eq!(db.promote_class("X-1", "XI-2").unwrap(), 2);
        assert_eq!(db.promote_class("X-1", "XI-2").unwrap(), 0);
    }

    #[test]
    fn promote_class_validates_input() {
        let db = Database::open_in_memory().unwrap();
        assert!(matches!(
            db.promote_class("X-1", "X-1").unwrap_err(),
            DbError::Validation(ValidationError::SameClass { .. })
        ));
        assert!(matches!(
            db.promote_class("X-1", " X-1 ").unwrap_err(),
            DbError::Validation(ValidationError::SameClass { .. })
        ));
        assert!(db.promote_class("", "XI-1").is_err());
        assert!(db.promote_class("X-1", "  ").is_err());
    }

    #[test]
    fn graduate_class_is_idempotent() {
        let db = Database::open_in_memory().unwrap();
        seed(&db);
        assert_eq!(db.graduate_class("X-1").unwrap(), 2);
        assert_eq!(db.graduate_class("X-1").unwrap(), 0);

        let ana = db.find_student_by_nis("001").unwrap().unwrap();
        assert_eq!(ana.status, StudentStatus::Graduated);
        // Historic class label is kept on graduation.
        assert_eq!(ana.kelas, "X-1");
    }

    #[test]
    fn graduate_senior_classes_sweeps_matching_prefix() {
        let db = Database::open_in_memory().unwrap();
        db.add_student("001", "Ana", "XII-1", StudentStatus::Active)
            .unwrap();
        db.add_student("002", "Budi", "XII-2", StudentStatus::Active)
            .unwrap();
        db.add_student("003", "Citra", "XI-1", StudentStatus::Active)
            .unwrap();
        db.add_student("004", "Dewi", "xii IPA 1", StudentStatus::Active)
            .unwrap();

        let sweep = db.graduate_senior_classes("XII").unwrap();
        assert_eq!(sweep.classes.len(), 3);
        assert_eq!(sweep.students_graduated, 3);

        let citra = db.find_student_by_nis("003").unwrap().unwrap();
        assert_eq!(citra.status, StudentStatus::Active);

        // Second sweep finds no ACTIVE seniors left.
        let again = db.graduate_senior_classes("XII").unwrap();
        assert!(again.classes.is_empty());
        assert_eq!(again.students_graduated, 0);
    }

    #[test]
    fn graduate_senior_classes_without_match_is_a_noop() {
        let db = Database::open_in_memory().unwrap();
        seed(&db);
        let sweep = db.graduate_senior_classes("XII").unwrap();
        assert_eq!(
            sweep,
            GraduationSweep {
                classes: vec![],
                students_graduated: 0
            }
        );
    }

    // ========== Events ==========

    #[test]
    fn record_arrival_derives_lateness_from_cutoff() {
        let db = Database::open_in_memory().unwrap();
        seed(&db);
        let config = EngineConfig::default();

        let recorded = db
            .record_arrival(&arrival("001", "2025-03-10", "06:45"), &config)
            .unwrap();
        assert_eq!(recorded.late_minutes, 15);
        assert_eq!(recorded.total_count, 1);
        assert!(!recorded.warning);

        let on_time = db
            .record_arrival(&arrival("001", "2025-03-11", "06:30"), &config)
            .unwrap();
        assert_eq!(on_time.late_minutes, 0);
    }

    #[test]
    fn record_arrival_validates_required_fields() {
        let db = Database::open_in_memory().unwrap();
        seed(&db);
        let config = EngineConfig::default();

        let mut input = arrival("001", "2025-03-10", "06:45");
        input.kelas = String::new();
        assert!(db.record_arrival(&input, &config).is_err());

        let mut input = arrival("", "2025-03-10", "06:45");
        input.nis = String::new();
        assert!(db.record_arrival(&input, &config).is_err());

        let mut input = arrival("001", "2025-03-10", "");
        input.jam_datang = "  ".to_string();
        assert!(db.record_arrival(&input, &config).is_err());

        let unknown = arrival("999", "2025-03-10", "06:45");
        assert!(matches!(
            db.record_arrival(&unknown, &config).unwrap_err(),
            DbError::Validation(ValidationError::StudentNotFound { .. })
        ));
    }

    #[test]
    fn record_arrival_snapshots_student_fields() {
        let db = Database::open_in_memory().unwrap();
        seed(&db);
        let config = EngineConfig::default();

        db.record_arrival(&arrival("001", "2025-03-10", "06:45"), &config)
            .unwrap();
        db.promote_class("X-1", "XI-9").unwrap();

        // The event keeps the class the student was in at insert time.
        let events = db
            .events_between(date("2025-03-01"), date("2025-03-31"), None)
            .unwrap();
        assert_eq!(events[0].kelas, "X-1");
        assert_eq!(events[0].nama, "Ana");
        assert_eq!(events[0].nis.as_deref(), Some("001"));
    }

    #[test]
    fn record_arrival_warns_at_hard_threshold() {
        let db = Database::open_in_memory().unwrap();
        seed(&db);
        let config = EngineConfig::default();

        for day in 1..=9 {
            let input = arrival("001", &format!("2025-03-{day:02}"), "06:45");
            let recorded = db.record_arrival(&input, &config).unwrap();
            assert!(!recorded.warning, "no warning before the threshold");
        }
        let tenth = db
            .record_arrival(&arrival("001", "2025-03-10", "06:45"), &config)
            .unwrap();
        assert_eq!(tenth.total_count, 10);
        assert!(tenth.warning);

        // A different student's count is unaffected.
        let other = db
            .record_arrival(&arrival("002", "2025-03-10", "07:00"), &config)
            .unwrap();
        assert_eq!(other.total_count, 1);
        assert!(!other.warning);
    }

    #[test]
    fn events_between_filters_and_orders_newest_first() {
        let db = Database::open_in_memory().unwrap();
        seed(&db);
        let config = EngineConfig::default();

        db.record_arrival(&arrival("001", "2025-03-10", "06:45"), &config)
            .unwrap();
        db.record_arrival(&arrival("001", "2025-03-12", "06:40"), &config)
            .unwrap();
        db.record_arrival(&arrival("001", "2025-03-12", "07:10"), &config)
            .unwrap();
        db.record_arrival(&arrival("003", "2025-03-11", "06:50"), &config)
            .unwrap();
        db.record_arrival(&arrival("001", "2025-04-01", "06:45"), &config)
            .unwrap();

        let march = db
            .events_between(date("2025-03-01"), date("2025-03-31"), None)
            .unwrap();
        assert_eq!(march.len(), 4);
        assert_eq!(march[0].tanggal, "2025-03-12");
        assert_eq!(march[0].jam_datang, "07:10");
        assert_eq!(march[1].jam_datang, "06:40");
        assert_eq!(march[3].tanggal, "2025-03-10");

        let x1_only = db
            .events_between(date("2025-03-01"), date("2025-03-31"), Some("X-1"))
            .unwrap();
        assert_eq!(x1_only.len(), 3);
        assert!(x1_only.iter().all(|event| event.kelas == "X-1"));
    }

    #[test]
    fn tally_over_report_subset_flags_candidates() {
        let db = Database::open_in_memory().unwrap();
        seed(&db);
        let config = EngineConfig::default();

        for day in 1..=5 {
            db.record_arrival(&arrival("001", &format!("2025-03-{day:02}"), "06:45"), &config)
                .unwrap();
        }
        for day in 1..=2 {
            db.record_arrival(&arrival("002", &format!("2025-03-{day:02}"), "06:45"), &config)
                .unwrap();
        }

        let events = db
            .events_between(date("2025-03-01"), date("2025-03-31"), None)
            .unwrap();
        let tally = OffenseTally::from_events(&events);
        let flagged = tally.classify(config.candidate_threshold);
        assert_eq!(flagged.len(), 1);
        assert_eq!(flagged[0].nama, "Ana");
        assert_eq!(flagged[0].count, 5);
    }

    // ========== Import ==========

    fn roster_row(nis: &str, nama: &str, kelas: &str) -> RosterRow {
        RosterRow {
            nis: nis.to_string(),
            nama: nama.to_string(),
            kelas: kelas.to_string(),
            status: StudentStatus::Active,
        }
    }

    #[test]
    fn upsert_roster_inserts_then_updates_on_reimport() {
        let mut db = Database::open_in_memory().unwrap();

        let outcome = db
            .upsert_roster(&[roster_row("001", "Ana", "X-1")], 300)
            .unwrap();
        assert_eq!(outcome.rows_applied, 1);
        assert!(outcome.failure.is_none());

        let first = db.find_student_by_nis("001").unwrap().unwrap();
        assert_eq!(first.nama, "Ana");
        assert_eq!(first.status, StudentStatus::Active);

        // Re-import with an edited name updates in place.
        let outcome = db
            .upsert_roster(&[roster_row("001", "Ana B", "X-1")], 300)
            .unwrap();
        assert_eq!(outcome.rows_applied, 1);

        let students = db.list_students().unwrap();
        assert_eq!(students.len(), 1);
        assert_eq!(students[0].nama, "Ana B");
        // The store-owned id is stable across upserts.
        assert_eq!(students[0].id, first.id);
    }

    #[test]
    fn upsert_roster_overwrites_status() {
        let mut db = Database::open_in_memory().unwrap();
        db.add_student("001", "Ana", "XII-1", StudentStatus::Active)
            .unwrap();

        let mut row = roster_row("001", "Ana", "XII-1");
        row.status = StudentStatus::Graduated;
        db.upsert_roster(&[row], 300).unwrap();

        let ana = db.find_student_by_nis("001").unwrap().unwrap();
        assert_eq!(ana.status, StudentStatus::Graduated);
    }

    #[test]
    fn upsert_roster_splits_into_ordered_batches() {
        let mut db = Database::open_in_memory().unwrap();
        let rows: Vec<RosterRow> = (1..=7)
            .map(|n| roster_row(&format!("{n:03}"), &format!("Student {n}"), "X-1"))
            .collect();

        let outcome = db.upsert_roster(&rows, 3).unwrap();
        assert_eq!(outcome.rows_applied, 7);
        assert_eq!(outcome.batches_applied, 3);
        assert!(outcome.failure.is_none());
        assert_eq!(db.list_students().unwrap().len(), 7);
    }

    #[test]
    fn upsert_roster_stops_at_failing_batch_and_keeps_prior_batches() {
        let mut db = Database::open_in_memory().unwrap();
        // Abort any write for a poisoned NIS to simulate a store-side
        // failure mid-sequence.
        db.conn
            .execute_batch(
                "
                CREATE TRIGGER reject_poisoned BEFORE INSERT ON students
                WHEN NEW.nis = 'boom'
                BEGIN
                    SELECT RAISE(ABORT, 'payload rejected');
                END;
                ",
            )
            .unwrap();

        let rows = vec![
            roster_row("001", "Ana", "X-1"),
            roster_row("002", "Budi", "X-1"),
            roster_row("boom", "Broken", "X-1"),
            roster_row("004", "Dewi", "X-1"),
        ];
        let outcome = db.upsert_roster(&rows, 2).unwrap();

        assert_eq!(outcome.rows_applied, 2);
        assert_eq!(outcome.batches_applied, 1);
        let failure = outcome.failure.unwrap();
        assert_eq!(failure.batch_index, 2);
        assert!(failure.message.contains("payload rejected"));

        // Batch 1 stays committed; batch 2 rolled back whole.
        let students = db.list_students().unwrap();
        let nis: Vec<&str> = students.iter().map(|s| s.nis.as_str()).collect();
        assert_eq!(nis, vec!["001", "002"]);
    }

    #[test]
    fn upsert_roster_rejects_zero_batch_size() {
        let mut db = Database::open_in_memory().unwrap();
        assert!(db.upsert_roster(&[roster_row("001", "Ana", "X-1")], 0).is_err());
    }
}
