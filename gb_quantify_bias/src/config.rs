use std::path::{Path, PathBuf};

use crate::{coverage::IdentityCutoff, genome::Genome, report::ReportMode};

/// Config
///
/// Configuration info for the program
/// This is generated from the command line arguments
/// Once set it is read only
///
/// genomes - list of input genomes (FASTA + alignment file)
/// name_file - metadata table with display names for genomes
/// cutoff - minimum identity for alignment hits to count as similar
/// report_mode - how coverage is reported
/// base_limit - optional limit on bases read from each FASTA file
/// output - output file [default: stdout]
/// pretty - indent JSON output
/// keep_going - carry on after a genome fails
/// threads - number of worker threads
///
pub struct Config {
    genomes: Vec<Genome>,
    name_file: PathBuf,
    cutoff: IdentityCutoff,
    report_mode: ReportMode,
    base_limit: Option<usize>,
    output: Option<PathBuf>,
    pretty: bool,
    keep_going: bool,
    threads: usize,
}

impl Config {
    pub fn new(
        genomes: Vec<Genome>,
        name_file: PathBuf,
        cutoff: IdentityCutoff,
        report_mode: ReportMode,
    ) -> Self {
        Self {
            genomes,
            name_file,
            cutoff,
            report_mode,
            base_limit: None,
            output: None,
            pretty: false,
            keep_going: false,
            threads: 1,
        }
    }

    pub fn set_base_limit(&mut self, x: usize) {
        self.base_limit = Some(x)
    }

    pub fn set_output<P: AsRef<Path>>(&mut self, p: P) {
        self.output = Some(p.as_ref().to_owned())
    }

    pub fn set_pretty(&mut self) {
        self.pretty = true
    }

    pub fn set_keep_going(&mut self) {
        self.keep_going = true
    }

    /// Never more threads than genomes
    pub fn set_threads(&mut self, nt: usize) {
        self.threads = nt.min(self.genomes.len()).max(1)
    }

    pub fn genomes(&self) -> &[Genome] {
        &self.genomes
    }

    pub fn name_file(&self) -> &Path {
        &self.name_file
    }

    pub fn cutoff(&self) -> &IdentityCutoff {
        &self.cutoff
    }

    pub fn report_mode(&self) -> ReportMode {
        self.report_mode
    }

    pub fn base_limit(&self) -> Option<usize> {
        self.base_limit
    }

    pub fn output(&self) -> Option<&Path> {
        self.output.as_deref()
    }

    pub fn pretty(&self) -> bool {
        self.pretty
    }

    pub fn keep_going(&self) -> bool {
        self.keep_going
    }

    pub fn threads(&self) -> usize {
        self.threads
    }
}
