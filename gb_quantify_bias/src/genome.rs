use std::{
    collections::{btree_map::Entry, BTreeMap},
    io::BufRead,
    path::{Path, PathBuf},
};

use anyhow::Context;
use compress_io::compress::CompressIo;
use regex::Regex;
use utils::{get_next_line, BiasError};

/// Input genome
///
/// id - genome identifier used to join lengths, alignments and names
/// fasta - path to the genome FASTA file
/// alignments - path to the tabular alignment hits for this genome
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Genome {
    id: String,
    fasta: PathBuf,
    alignments: PathBuf,
}

impl Genome {
    pub fn new<S: Into<String>, P: Into<PathBuf>, Q: Into<PathBuf>>(
        id: S,
        fasta: P,
        alignments: Q,
    ) -> Self {
        Self {
            id: id.into(),
            fasta: fasta.into(),
            alignments: alignments.into(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn fasta(&self) -> &Path {
        &self.fasta
    }

    pub fn alignments(&self) -> &Path {
        &self.alignments
    }
}

fn check_unique(genomes: &[Genome]) -> Result<(), BiasError> {
    let mut v: Vec<_> = genomes.iter().map(|g| g.id()).collect();
    v.sort_unstable();
    match v.windows(2).find(|w| w[0] == w[1]) {
        Some(w) => Err(BiasError::config(format!("Genome {} listed twice", w[0]))),
        None => Ok(()),
    }
}

/// Read genome list
/// Expects three tab separated columns.
/// The first column has the genome identifier
/// The second column has the path to the FASTA file for this genome
/// The third column has the path to the tabular alignment file for this genome
///
pub fn read_genome_list<R: BufRead>(rdr: &mut R, name: &str) -> anyhow::Result<Vec<Genome>> {
    let mut buf = String::new();
    let mut line = 0;
    let mut genomes = Vec::new();

    while let Some(fields) = get_next_line(rdr, &mut buf, '\t')
        .with_context(|| format!("Error after reading {} lines from {}", line, name))?
    {
        line += 1;
        // Skip blank lines
        if fields.is_empty() {
            continue;
        }
        if fields.len() < 3 {
            return Err(BiasError::parse(
                name,
                line,
                "Expected genome id, FASTA path and alignment path",
            )
            .into());
        }
        let g = Genome::new(fields[0].trim(), fields[1].trim(), fields[2].trim());
        trace!(
            "Read in genome {} FASTA {} alignments {}",
            g.id,
            g.fasta.display(),
            g.alignments.display()
        );
        genomes.push(g)
    }
    check_unique(&genomes)?;

    debug!(
        "Finished reading in {} lines; found {} genomes",
        line,
        genomes.len()
    );
    Ok(genomes)
}

pub fn genome_vec_from_file<P: AsRef<Path>>(fname: P) -> anyhow::Result<Vec<Genome>> {
    let fname = fname.as_ref();
    debug!("Reading in genome list from {}", fname.display());
    let mut rdr = CompressIo::new()
        .path(fname)
        .bufreader()
        .with_context(|| format!("Error opening genome list {}", fname.display()))?;
    read_genome_list(&mut rdr, &fname.display().to_string())
}

/// Matches file names ending in suffix; the genome id is everything before the first '.'
fn stem_regex(suffix: &str) -> anyhow::Result<Regex> {
    Regex::new(format!("^([^.]+)(?:[.].*)?{}$", regex::escape(suffix)).as_str())
        .with_context(|| format!("Invalid file suffix {}", suffix))
}

/// Collect the files in dir matching reg, keyed on genome id
fn files_by_genome(dir: &Path, reg: &Regex) -> anyhow::Result<BTreeMap<String, PathBuf>> {
    let mut files = BTreeMap::new();
    for f in dir
        .read_dir()
        .with_context(|| format!("Error checking input directory {}", dir.display()))?
    {
        let entry =
            f.with_context(|| format!("Could not get directory entry from {}", dir.display()))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            warn!("Skipping file with non UTF-8 name in {}", dir.display());
            continue;
        };
        if let Some(id) = reg.captures(name).and_then(|c| c.get(1)) {
            let id = id.as_str().to_owned();
            trace!("Adding file {} for genome {}", path.display(), id);
            match files.entry(id) {
                Entry::Vacant(e) => {
                    e.insert(path);
                }
                Entry::Occupied(e) => {
                    return Err(BiasError::config(format!(
                        "Files {} and {} in {} both map to genome {}",
                        e.get().display(),
                        path.display(),
                        dir.display(),
                        e.key()
                    ))
                    .into())
                }
            }
        }
    }
    Ok(files)
}

/// Build the genome list from a directory of FASTA files and a directory of
/// alignment files.  Every FASTA file must have an alignment file with the
/// same genome id; alignment files without a FASTA file are ignored
pub fn discover_genomes(
    fasta_dir: &Path,
    fasta_suffix: &str,
    aln_dir: &Path,
    aln_suffix: &str,
) -> anyhow::Result<Vec<Genome>> {
    let fasta = files_by_genome(fasta_dir, &stem_regex(fasta_suffix)?)?;
    let mut aln = files_by_genome(aln_dir, &stem_regex(aln_suffix)?)?;

    let mut genomes = Vec::with_capacity(fasta.len());
    for (id, fpath) in fasta {
        let apath = aln.remove(&id).ok_or_else(|| {
            BiasError::config(format!(
                "No alignment file (*{}) found for genome {} in {}",
                aln_suffix,
                id,
                aln_dir.display()
            ))
        })?;
        genomes.push(Genome::new(id, fpath, apath))
    }
    for (id, p) in aln {
        warn!(
            "Alignment file {} has no matching FASTA file for genome {}; ignoring",
            p.display(),
            id
        )
    }
    if genomes.is_empty() {
        Err(BiasError::config(format!(
            "No FASTA files (*{}) found in {}",
            fasta_suffix,
            fasta_dir.display()
        ))
        .into())
    } else {
        debug!(
            "{} genomes found in {}",
            genomes.len(),
            fasta_dir.display()
        );
        Ok(genomes)
    }
}
