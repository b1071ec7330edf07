use std::io::Write;

use crate::runner::Measurement;

/// Writes `measurement` as its label followed by an indented timing line.
pub fn report(out: &mut impl Write, measurement: &Measurement) -> std::io::Result<()> {
    writeln!(out, "{}", measurement.label)?;
    writeln!(
        out,
        "  {:.2?} total over {} runs ({:.2?} mean, {:.2?} min, {:.2?} max)",
        measurement.total(),
        measurement.runs(),
        measurement.mean(),
        measurement.min(),
        measurement.max(),
    )
}
