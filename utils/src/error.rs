use std::fmt;

use thiserror::Error;

/// Failures that abort the computation for a genome (or the whole run)
///
/// These are raised as anyhow errors and can be recovered with
/// `downcast_ref::<BiasError>()` where the kind matters
#[derive(Debug, Error)]
pub enum BiasError {
    /// Malformed alignment row, metadata row or FASTA structure
    #[error("{file}:{line} {msg}")]
    Parse {
        file: String,
        line: usize,
        msg: String,
    },
    /// Genome identifier without an entry in the name table
    #[error("No display name found for genome {0}")]
    Lookup(String),
    /// Invalid or out of range setting
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl BiasError {
    pub fn parse<F: fmt::Display, M: fmt::Display>(file: F, line: usize, msg: M) -> Self {
        Self::Parse {
            file: file.to_string(),
            line,
            msg: msg.to_string(),
        }
    }

    pub fn config<M: fmt::Display>(msg: M) -> Self {
        Self::Config(msg.to_string())
    }

    pub fn is_parse(&self) -> bool {
        matches!(self, Self::Parse { .. })
    }
    pub fn is_lookup(&self) -> bool {
        matches!(self, Self::Lookup(_))
    }
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}
