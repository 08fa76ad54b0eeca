//! Host line protocol.
//!
//! Charts are announced once with `CHART`/`DIMENSION` lines, then each update
//! is a `BEGIN` ... `SET` ... `END` block per chart:
//!
//! ```text
//! CHART df.hdd_used '' 'HDD space used in GB' 'GB' 'diskspace' 'df' line 60001 60
//! DIMENSION 'hdd_used__dev_md3' '/dev/md3' absolute 1 1
//! BEGIN df.hdd_used 60000000
//! SET 'hdd_used__dev_md3' = 1
//! END
//! ```

use std::io::{self, Write};
use std::time::Duration;

use crate::charts::{ChartDefinition, ChartLine, Sample};
use crate::service::CHART_NAME;

/// Writes one `CHART` line followed by its `DIMENSION` lines.
pub fn write_chart<W: Write>(
    w: &mut W,
    chart: &ChartDefinition,
    priority: u64,
    update_every: u64,
) -> io::Result<()> {
    writeln!(
        w,
        "CHART {}.{} '' '{}' '{}' '{}' '{}' {} {} {}",
        CHART_NAME,
        chart.id,
        chart.title,
        chart.unit,
        chart.family,
        chart.context,
        chart.chart_type,
        priority,
        update_every
    )?;
    for line in &chart.lines {
        write_dimension(w, line)?;
    }
    Ok(())
}

fn write_dimension<W: Write>(w: &mut W, line: &ChartLine) -> io::Result<()> {
    writeln!(w, "DIMENSION '{}' '{}' {} 1 1", line.id, line.name, line.algorithm)
}

/// Announces all charts; priorities increase from `base_priority` in chart order.
pub fn write_definitions<W: Write>(
    w: &mut W,
    charts: &[ChartDefinition],
    base_priority: u64,
    update_every: u64,
) -> io::Result<()> {
    for (idx, chart) in charts.iter().enumerate() {
        write_chart(w, chart, base_priority + idx as u64, update_every)?;
    }
    w.flush()
}

/// Writes one update block per chart that has at least one value.
///
/// Only lines registered in `charts` are reported; devices that show up in
/// `sample` after registration are ignored. `since_last` is omitted from
/// `BEGIN` on the first update. Returns the number of charts written.
pub fn write_update<W: Write>(
    w: &mut W,
    charts: &[ChartDefinition],
    sample: &Sample,
    since_last: Option<Duration>,
) -> io::Result<usize> {
    let mut written = 0;

    for chart in charts {
        let values: Vec<(&str, i64)> = chart
            .lines
            .iter()
            .filter_map(|line| sample.get(&line.id).map(|v| (line.id.as_str(), v)))
            .collect();
        if values.is_empty() {
            continue;
        }

        match since_last {
            Some(elapsed) => writeln!(
                w,
                "BEGIN {}.{} {}",
                CHART_NAME,
                chart.id,
                elapsed.as_micros()
            )?,
            None => writeln!(w, "BEGIN {}.{}", CHART_NAME, chart.id)?,
        }
        for (id, value) in values {
            writeln!(w, "SET '{}' = {}", id, value)?;
        }
        writeln!(w, "END")?;
        written += 1;
    }

    w.flush()?;
    Ok(written)
}

/// Tells the host to stop scheduling this plugin.
pub fn write_disable<W: Write>(w: &mut W) -> io::Result<()> {
    writeln!(w, "DISABLE")?;
    w.flush()
}
