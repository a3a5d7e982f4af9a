//! Streaming length extraction for FASTA files
//!
//! Sequence is never stored: we only need the number of bases, the contig
//! names and (for the size limiting filter) the lines themselves which are
//! handed to a caller supplied closure as they are read.

use std::{io::BufRead, path::Path};

use anyhow::Context;
use compress_io::compress::CompressIo;

use crate::BiasError;

/// Classification of a single input line.  The wrapped slices have had
/// surrounding whitespace removed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FastaLine<'a> {
    Header(&'a str),
    Sequence(&'a str),
    Blank,
}

impl<'a> FastaLine<'a> {
    pub fn classify(line: &'a str) -> Self {
        let s = line.trim();
        if s.is_empty() {
            Self::Blank
        } else if s.starts_with('>') {
            Self::Header(s)
        } else {
            Self::Sequence(s)
        }
    }

    /// First whitespace delimited word after the '>' of a header line
    pub fn contig_name(&self) -> Option<&'a str> {
        match self {
            Self::Header(s) => s[1..].split_ascii_whitespace().next(),
            _ => None,
        }
    }
}

/// Whether a header line must carry a contig name
///
/// Required - a header with nothing after the '>' is a parse error
/// Optional - such headers are passed through but add no contig
///
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContigNames {
    Required,
    Optional,
}

/// Running count of bases with an optional upper limit.
///
/// The limit is checked before a line is consumed, so the line that takes
/// the count over the limit is still counted.  The count can therefore
/// overshoot the limit by at most one line length
#[derive(Debug, Default, Clone, Copy)]
pub struct BaseBudget {
    limit: Option<usize>,
    bases: usize,
}

impl BaseBudget {
    pub fn new(limit: Option<usize>) -> Self {
        Self { limit, bases: 0 }
    }

    pub fn exhausted(&self) -> bool {
        self.limit.map(|l| self.bases > l).unwrap_or(false)
    }

    fn add(&mut self, n: usize) {
        self.bases += n
    }

    pub fn bases(&self) -> usize {
        self.bases
    }
}

/// Result of scanning a FASTA file
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FastaLength {
    bases: usize,
    contigs: Vec<String>,
    truncated: bool,
}

impl FastaLength {
    /// Total bases counted (bounded length if a base limit was used)
    pub fn bases(&self) -> usize {
        self.bases
    }

    /// Contig names in order of appearance
    pub fn contigs(&self) -> &[String] {
        &self.contigs
    }

    /// True if reading stopped at the base limit with input remaining
    pub fn truncated(&self) -> bool {
        self.truncated
    }

    pub fn into_contigs(self) -> Vec<String> {
        self.contigs
    }

    pub fn from_reader<R: BufRead>(
        rdr: &mut R,
        name: &str,
        limit: Option<usize>,
    ) -> anyhow::Result<Self> {
        scan_fasta(rdr, name, limit, ContigNames::Required, |_| Ok(()))
    }

    pub fn from_path<P: AsRef<Path>>(fname: P, limit: Option<usize>) -> anyhow::Result<Self> {
        let fname = fname.as_ref();
        trace!("Opening FASTA file {} for reading", fname.display());
        let mut rdr = CompressIo::new()
            .path(fname)
            .bufreader()
            .with_context(|| format!("Error opening FASTA file {}", fname.display()))?;
        Self::from_reader(&mut rdr, &fname.display().to_string(), limit)
    }
}

/// Read FASTA lines from rdr, counting sequence bases and collecting contig names.
///
/// Blank lines are skipped.  Every other line is passed (trimmed) to `emit`
/// in input order.  If `limit` is set, reading stops before the first line
/// that would be consumed after the base count has gone over the limit.
/// `name` is used for error messages
pub fn scan_fasta<R, F>(
    rdr: &mut R,
    name: &str,
    limit: Option<usize>,
    names: ContigNames,
    mut emit: F,
) -> anyhow::Result<FastaLength>
where
    R: BufRead,
    F: FnMut(&str) -> anyhow::Result<()>,
{
    let mut budget = BaseBudget::new(limit);
    let mut contigs = Vec::new();
    let mut truncated = false;
    let mut buf = String::new();
    let mut line = 0;

    loop {
        buf.clear();
        if rdr
            .read_line(&mut buf)
            .with_context(|| format!("Error after reading {} lines from {}", line, name))?
            == 0
        {
            break;
        }
        line += 1;
        let fl = FastaLine::classify(&buf);
        if matches!(fl, FastaLine::Blank) {
            continue;
        }
        if budget.exhausted() {
            truncated = true;
            break;
        }
        match fl {
            FastaLine::Header(s) => {
                match (fl.contig_name(), names) {
                    (Some(ctg), _) => {
                        trace!("{}: found contig {}", name, ctg);
                        contigs.push(ctg.to_owned())
                    }
                    (None, ContigNames::Optional) => {
                        trace!("{}:{} header without contig name", name, line)
                    }
                    (None, ContigNames::Required) => {
                        return Err(BiasError::parse(name, line, "Missing contig name").into())
                    }
                }
                emit(s)?
            }
            FastaLine::Sequence(s) => {
                budget.add(s.len());
                emit(s)?
            }
            FastaLine::Blank => (),
        }
    }

    debug!(
        "Finished reading {} lines from {}: {} contigs, {} bases{}",
        line,
        name,
        contigs.len(),
        budget.bases(),
        if truncated { " (truncated)" } else { "" }
    );

    Ok(FastaLength {
        bases: budget.bases(),
        contigs,
        truncated,
    })
}
