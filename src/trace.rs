//! Tab-separated trace output (spec §6), grounded on `Main.c`'s
//! `PrintHeader`/`PrintState` column layout: time, reactions-since-last-row,
//! reactions-per-queue average, every species count, the volume ratio
//! `V/V0`, then every operator's current configuration index.

use std::io::{self, Write};

pub struct TraceWriter<W: Write> {
    out: W,
    header_written: bool,
}

impl<W: Write> TraceWriter<W> {
    pub fn new(out: W) -> Self {
        TraceWriter { out, header_written: false }
    }

    /// Suppresses the header row entirely (CLI `--no-header`).
    pub fn suppress_header(mut self) -> Self {
        self.header_written = true;
        self
    }

    fn write_header(&mut self, species_names: &[String], n_operators: usize) -> io::Result<()> {
        write!(self.out, "Time\tNR\tRPQ")?;
        for name in species_names {
            write!(self.out, "\t{name}")?;
        }
        write!(self.out, "\tV/V0")?;
        for i in 0..n_operators {
            write!(self.out, "\tOp{i}")?;
        }
        writeln!(self.out)
    }

    /// Writes one row, emitting the header first if this is the first call.
    pub fn write_row(
        &mut self,
        species_names: &[String],
        time: f64,
        reaction_count: u64,
        reactions_per_queue: f64,
        species: &[i64],
        v0_ratio: f64,
        operator_states: &[usize],
    ) -> io::Result<()> {
        if !self.header_written {
            self.write_header(species_names, operator_states.len())?;
            self.header_written = true;
        }

        write!(self.out, "{time:.6}\t{reaction_count}\t{reactions_per_queue:.3}")?;
        for &n in species {
            write!(self.out, "\t{n}")?;
        }
        write!(self.out, "\t{v0_ratio:.6}")?;
        for &state in operator_states {
            write!(self.out, "\t{state}")?;
        }
        writeln!(self.out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_header_once_then_rows() {
        let mut buf = Vec::new();
        {
            let mut trace = TraceWriter::new(&mut buf);
            let names = vec!["RNAP".to_string(), "Ribosome".to_string()];
            trace.write_row(&names, 0.0, 0, 0.0, &[10, 20], 1.0, &[0]).unwrap();
            trace.write_row(&names, 1.0, 3, 2.5, &[9, 21], 1.02, &[1]).unwrap();
        }
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("Time\tNR\tRPQ\tRNAP\tRibosome\tV/V0\tOp0"));
        assert!(lines[1].starts_with("0.000000\t0\t0.000"));
    }

    #[test]
    fn suppress_header_skips_the_header_row() {
        let mut buf = Vec::new();
        {
            let mut trace = TraceWriter::new(&mut buf).suppress_header();
            let names = vec!["RNAP".to_string()];
            trace.write_row(&names, 0.0, 0, 0.0, &[10], 1.0, &[0]).unwrap();
        }
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("0.000000\t0\t0.000"));
    }
}
