use std::path::{Path, PathBuf};

/// Config
///
/// base_limit - stop output after the line that takes the base count over this value
/// input - input FASTA file [default: stdin]
/// output - output file [default: stdout]
///
pub struct Config {
    base_limit: usize,
    input: Option<PathBuf>,
    output: Option<PathBuf>,
}

impl Config {
    pub fn new(base_limit: usize, input: Option<PathBuf>, output: Option<PathBuf>) -> Self {
        Self {
            base_limit,
            input,
            output,
        }
    }

    pub fn base_limit(&self) -> usize {
        self.base_limit
    }

    pub fn input(&self) -> Option<&Path> {
        self.input.as_deref()
    }

    pub fn output(&self) -> Option<&Path> {
        self.output.as_deref()
    }
}
