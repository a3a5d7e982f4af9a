use std::io::Write;

use anyhow::Context;
use compress_io::compress::CompressIo;
use utils::fasta::{scan_fasta, ContigNames};

use crate::config::Config;

/// Copy FASTA lines from input to output until the base limit has been passed.
///
/// Blank lines are dropped and the remaining lines are written trimmed.
/// Headers are copied whether or not they carry a contig name
pub fn limit_size(cfg: &Config) -> anyhow::Result<()> {
    let name = cfg
        .input()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| String::from("<stdin>"));
    debug!(
        "Reading FASTA from {} with a limit of {} bases",
        name,
        cfg.base_limit()
    );

    let mut rdr = CompressIo::new()
        .opt_path(cfg.input())
        .bufreader()
        .with_context(|| format!("Failed to open input {}", name))?;
    let mut wrt = CompressIo::new()
        .opt_path(cfg.output())
        .bufwriter()
        .with_context(|| "Failed to open output file")?;

    let fl = scan_fasta(
        &mut rdr,
        &name,
        Some(cfg.base_limit()),
        ContigNames::Optional,
        |s| writeln!(wrt, "{}", s).with_context(|| "Error writing output"),
    )?;
    wrt.flush().with_context(|| "Error writing output")?;

    if fl.truncated() {
        info!(
            "Output truncated after {} bases from {} contigs",
            fl.bases(),
            fl.contigs().len()
        )
    } else {
        info!(
            "Input exhausted at {} bases from {} contigs",
            fl.bases(),
            fl.contigs().len()
        )
    }
    Ok(())
}
