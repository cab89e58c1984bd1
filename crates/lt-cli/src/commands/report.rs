//! Report command for listing late arrivals over a period.
//!
//! The period is either an explicit `--from`/`--to` range or a calendar
//! `--month`; with neither, the current month is used. Rows come back
//! newest first, and students whose count within the shown period
//! reaches the candidate threshold are listed for disciplinary review.

use std::io::Write;

use anyhow::{Context, Result, bail};
use chrono::{Datelike, NaiveDate};
use lt_core::{EngineConfig, OffenderEntry, OffenseTally, format_duration, late_minutes};
use lt_db::{ArrivalRecord, Database};
use serde::Serialize;

/// Resolved report options.
#[derive(Debug, Clone, Default)]
pub struct ReportArgs {
    pub from: Option<String>,
    pub to: Option<String>,
    pub month: Option<String>,
    pub class: Option<String>,
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct ReportData {
    from: String,
    to: String,
    class: Option<String>,
    total_events: usize,
    distinct_students: usize,
    events: Vec<ReportRow>,
    candidates: Vec<OffenderEntry>,
}

#[derive(Debug, Serialize)]
struct ReportRow {
    tanggal: String,
    jam_datang: String,
    nama: String,
    nis: Option<String>,
    kelas: String,
    late_minutes: u32,
    late: String,
    alasan: Option<String>,
}

impl ReportRow {
    fn from_event(event: ArrivalRecord, cutoff: &str) -> Self {
        let minutes = late_minutes(&event.jam_datang, cutoff);
        Self {
            tanggal: event.tanggal,
            jam_datang: event.jam_datang,
            nama: event.nama,
            nis: event.nis,
            kelas: event.kelas,
            late_minutes: minutes,
            late: format_duration(i64::from(minutes)),
            alasan: event.alasan,
        }
    }
}

pub fn run<W: Write>(
    writer: &mut W,
    db: &Database,
    engine: &EngineConfig,
    args: &ReportArgs,
) -> Result<()> {
    let today = chrono::Local::now().date_naive();
    let (start, end) = resolve_period(args, today)?;
    if start > end {
        bail!("period start {start} is after end {end}");
    }

    // A typo in --class would otherwise look like a clean month.
    if let Some(class) = &args.class {
        if !db.class_exists(class)? {
            bail!("unknown class {class}");
        }
    }

    let events = db.events_between(start, end, args.class.as_deref())?;
    let tally = OffenseTally::from_events(&events);
    let candidates = tally.classify(engine.candidate_threshold);

    let data = ReportData {
        from: start.format("%Y-%m-%d").to_string(),
        to: end.format("%Y-%m-%d").to_string(),
        class: args.class.clone(),
        total_events: events.len(),
        distinct_students: tally.distinct_students(),
        events: events
            .into_iter()
            .map(|event| ReportRow::from_event(event, &engine.cutoff))
            .collect(),
        candidates,
    };

    if args.json {
        serde_json::to_writer_pretty(&mut *writer, &data)?;
        writeln!(writer)?;
    } else {
        render_human(writer, &data, engine)?;
    }

    Ok(())
}

fn render_human<W: Write>(writer: &mut W, data: &ReportData, engine: &EngineConfig) -> Result<()> {
    match &data.class {
        Some(class) => writeln!(
            writer,
            "Late arrivals {} to {} (class {class})",
            data.from, data.to
        )?,
        None => writeln!(writer, "Late arrivals {} to {}", data.from, data.to)?,
    }

    if data.events.is_empty() {
        writeln!(writer, "No late arrivals in this period.")?;
        return Ok(());
    }

    writeln!(
        writer,
        "{} events, {} students",
        data.total_events, data.distinct_students
    )?;
    writeln!(writer)?;

    for row in &data.events {
        let nis = row.nis.as_deref().unwrap_or("-");
        write!(
            writer,
            "{} {}  {} ({}, NIS {})  {}",
            row.tanggal, row.jam_datang, row.nama, row.kelas, nis, row.late
        )?;
        if let Some(alasan) = &row.alasan {
            write!(writer, "  {alasan}")?;
        }
        writeln!(writer)?;
    }

    if !data.candidates.is_empty() {
        writeln!(writer)?;
        writeln!(
            writer,
            "Disciplinary review candidates ({} or more in this period):",
            engine.candidate_threshold
        )?;
        for entry in &data.candidates {
            writeln!(
                writer,
                "- {} ({}): {}",
                entry.nama, entry.kelas, entry.count
            )?;
        }
    }

    Ok(())
}

/// Resolves the requested period to an inclusive date range.
fn resolve_period(args: &ReportArgs, today: NaiveDate) -> Result<(NaiveDate, NaiveDate)> {
    if let Some(month) = &args.month {
        return month_bounds(month);
    }

    let (default_start, default_end) = month_bounds_of(today.year(), today.month())?;
    let start = match &args.from {
        Some(raw) => parse_date(raw)?,
        None => default_start,
    };
    let end = match &args.to {
        Some(raw) => parse_date(raw)?,
        None => default_end,
    };
    Ok((start, end))
}

fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .with_context(|| format!("invalid date {raw}, expected YYYY-MM-DD"))
}

fn month_bounds(raw: &str) -> Result<(NaiveDate, NaiveDate)> {
    let (year, month) = raw
        .trim()
        .split_once('-')
        .with_context(|| format!("invalid month {raw}, expected YYYY-MM"))?;
    let year: i32 = year
        .parse()
        .with_context(|| format!("invalid month {raw}, expected YYYY-MM"))?;
    let month: u32 = month
        .parse()
        .with_context(|| format!("invalid month {raw}, expected YYYY-MM"))?;
    month_bounds_of(year, month)
}

fn month_bounds_of(year: i32, month: u32) -> Result<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .with_context(|| format!("invalid month {year}-{month:02}"))?;
    let next_first = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .with_context(|| format!("invalid month {year}-{month:02}"))?;
    let last = next_first
        .pred_opt()
        .context("date arithmetic out of range")?;
    Ok((first, last))
}
