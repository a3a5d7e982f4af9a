use std::{collections::BTreeMap, fmt, io::Write, str::FromStr};

use anyhow::Context;
use serde::Serialize;
use utils::BiasError;

use crate::names::NameTable;

/// How the coverage of the retained alignment hits is reported
///
/// SubtractCoverage - coverage is the similar part of the genome, report
///                    raw length - coverage as `effective_length`
/// CoverageAsIs     - report the coverage itself as `similar_length`
///
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportMode {
    SubtractCoverage,
    CoverageAsIs,
}

impl FromStr for ReportMode {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "subtract-coverage" => Ok(Self::SubtractCoverage),
            "coverage-as-is" => Ok(Self::CoverageAsIs),
            _ => Err("expected subtract-coverage or coverage-as-is"),
        }
    }
}

impl fmt::Display for ReportMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::SubtractCoverage => write!(f, "subtract-coverage"),
            Self::CoverageAsIs => write!(f, "coverage-as-is"),
        }
    }
}

/// Lengths gathered for one genome before names are attached
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenomeSummary {
    pub id: String,
    pub raw_length: usize,
    pub similar_length: usize,
    pub contigs: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ReportedLength {
    #[serde(rename = "effective_length")]
    Effective(usize),
    #[serde(rename = "similar_length")]
    Similar(usize),
}

impl ReportMode {
    fn reported_length(&self, s: &GenomeSummary) -> ReportedLength {
        match self {
            Self::CoverageAsIs => ReportedLength::Similar(s.similar_length),
            Self::SubtractCoverage => {
                if s.similar_length > s.raw_length {
                    warn!(
                        "Genome {}: similar length {} exceeds raw length {}; effective length set to 0",
                        s.id, s.similar_length, s.raw_length
                    )
                }
                ReportedLength::Effective(s.raw_length.saturating_sub(s.similar_length))
            }
        }
    }
}

/// Output record for a genome
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenomeRecord {
    pub common_name: String,
    pub raw_length: usize,
    #[serde(flatten)]
    pub length: ReportedLength,
    pub chrs: Vec<String>,
}

/// Collection of genome records keyed (and sorted) on genome id.
/// Serializes as a single JSON object
#[derive(Debug, Serialize)]
#[serde(transparent)]
pub struct BiasReport {
    #[serde(skip)]
    mode: ReportMode,
    records: BTreeMap<String, GenomeRecord>,
}

impl BiasReport {
    pub fn new(mode: ReportMode) -> Self {
        Self {
            mode,
            records: BTreeMap::new(),
        }
    }

    /// Join a genome summary with its display name and add it to the report
    pub fn add(&mut self, s: GenomeSummary, names: &NameTable) -> Result<(), BiasError> {
        let common_name = names.lookup(&s.id)?.to_owned();
        let length = self.mode.reported_length(&s);
        trace!("Adding genome {} ({}) {:?}", s.id, common_name, length);
        let rec = GenomeRecord {
            common_name,
            raw_length: s.raw_length,
            length,
            chrs: s.contigs,
        };
        self.records.insert(s.id, rec);
        Ok(())
    }

    /// Build a report from all summaries, failing on the first missing name
    #[cfg(test)]
    pub fn assemble<I>(summaries: I, names: &NameTable, mode: ReportMode) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = GenomeSummary>,
    {
        let mut report = Self::new(mode);
        for s in summaries {
            report.add(s, names)?
        }
        Ok(report)
    }

    #[cfg(test)]
    pub fn get(&self, id: &str) -> Option<&GenomeRecord> {
        self.records.get(id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn write<W: Write>(&self, mut wrt: W, pretty: bool) -> anyhow::Result<()> {
        let res = if pretty {
            serde_json::to_writer_pretty(&mut wrt, self)
        } else {
            serde_json::to_writer(&mut wrt, self)
        };
        res.with_context(|| "Error serializing report")?;
        writeln!(wrt).with_context(|| "Error writing report")?;
        wrt.flush().with_context(|| "Error writing report")
    }
}
