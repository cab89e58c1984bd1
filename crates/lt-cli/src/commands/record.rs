//! Record command for logging one late arrival.

use std::io::Write;

use anyhow::Result;
use lt_core::{EngineConfig, format_duration};
use lt_db::{Database, NewArrival};

pub fn run<W: Write>(
    writer: &mut W,
    db: &Database,
    engine: &EngineConfig,
    input: &NewArrival,
) -> Result<()> {
    let recorded = db.record_arrival(input, engine)?;

    writeln!(
        writer,
        "Recorded: {} ({}) at {} on {}",
        recorded.event.nama, recorded.event.kelas, recorded.event.jam_datang, recorded.event.tanggal
    )?;
    if recorded.late_minutes > 0 {
        writeln!(
            writer,
            "Late by {}",
            format_duration(i64::from(recorded.late_minutes))
        )?;
    } else {
        writeln!(writer, "Arrived before the {} cutoff", engine.cutoff)?;
    }
    writeln!(writer, "Total late arrivals: {}", recorded.total_count)?;

    if recorded.warning {
        writeln!(
            writer,
            "WARNING: {} has reached {} late arrivals",
            recorded.event.nama, recorded.total_count
        )?;
    }

    Ok(())
}
