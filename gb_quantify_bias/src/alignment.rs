use std::{io::BufRead, path::Path};

use anyhow::Context;
use compress_io::compress::CompressIo;
use utils::{get_next_line, parse_field, BiasError};

use crate::coverage::Interval;

// Columns used from tabular (BLAST outfmt 6 / m8) alignment output
const PIDENT_COL: usize = 2;
const QSTART_COL: usize = 6;
const QEND_COL: usize = 7;
const MIN_COLUMNS: usize = 8;

/// One alignment hit: percent identity and the aligned query span (start <= end)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlignmentHit {
    identity: f64,
    start: usize,
    end: usize,
}

impl AlignmentHit {
    pub fn new(identity: f64, qstart: usize, qend: usize) -> Self {
        Self {
            identity,
            start: qstart.min(qend),
            end: qstart.max(qend),
        }
    }

    /// Build from the tab separated fields of an alignment line
    pub fn from_fields(fields: &[&str]) -> anyhow::Result<Self> {
        if fields.len() < MIN_COLUMNS {
            return Err(anyhow!(
                "Too few columns ({}) in alignment line; expected at least {}",
                fields.len(),
                MIN_COLUMNS
            ));
        }
        let identity: f64 = parse_field(fields, PIDENT_COL, "percent identity")?;
        if !(0.0..=100.0).contains(&identity) {
            return Err(anyhow!("Percent identity {} out of range", identity));
        }
        let qstart: usize = parse_field(fields, QSTART_COL, "query start")?;
        let qend: usize = parse_field(fields, QEND_COL, "query end")?;
        Ok(Self::new(identity, qstart, qend))
    }

    pub fn identity(&self) -> f64 {
        self.identity
    }

    pub fn interval(&self) -> Interval {
        Interval::new(self.start, self.end)
    }
}

/// Read all hits from a tabular alignment stream.
///
/// Blank lines and '#' comment lines are skipped; any other line that can
/// not be parsed is an error giving `name` and the line number
pub fn read_alignment_hits<R: BufRead>(
    rdr: &mut R,
    name: &str,
) -> anyhow::Result<Vec<AlignmentHit>> {
    let mut buf = String::new();
    let mut line = 0;
    let mut hits = Vec::new();

    while let Some(fields) = get_next_line(rdr, &mut buf, '\t')
        .with_context(|| format!("Error after reading {} lines from {}", line, name))?
    {
        line += 1;
        if fields.is_empty() || fields[0].starts_with('#') {
            continue;
        }
        let hit = AlignmentHit::from_fields(&fields)
            .map_err(|e| BiasError::parse(name, line, format!("{:#}", e)))?;
        hits.push(hit)
    }

    debug!(
        "Finished reading {} lines from {}; found {} alignment hits",
        line,
        name,
        hits.len()
    );
    Ok(hits)
}

pub fn read_alignment_file<P: AsRef<Path>>(fname: P) -> anyhow::Result<Vec<AlignmentHit>> {
    let fname = fname.as_ref();
    trace!("Opening alignment file {} for reading", fname.display());
    let mut rdr = CompressIo::new()
        .path(fname)
        .bufreader()
        .with_context(|| format!("Error opening alignment file {}", fname.display()))?;
    read_alignment_hits(&mut rdr, &fname.display().to_string())
}
