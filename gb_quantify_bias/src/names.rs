use std::{
    collections::{hash_map::Entry, HashMap},
    io::BufRead,
    path::Path,
};

use anyhow::Context;
use compress_io::compress::CompressIo;
use utils::{get_next_line, BiasError};

/// Look up table from genome identifier to display (common) name
///
/// Read from a comma separated metadata table without header.  Column 1 has
/// the display name and column 3 the genome file name; the identifier is the
/// part of the file name before the first '.'
#[derive(Debug, Default)]
pub struct NameTable {
    names: HashMap<String, String>,
}

/// "GCF_000001405.39_GRCh38.fa.gz" -> "GCF_000001405"
fn genome_key(s: &str) -> &str {
    s.split('.').next().unwrap_or(s).trim()
}

impl NameTable {
    pub fn from_reader<R: BufRead>(rdr: &mut R, name: &str) -> anyhow::Result<Self> {
        let mut buf = String::new();
        let mut line = 0;
        let mut names = HashMap::new();

        while let Some(fields) = get_next_line(rdr, &mut buf, ',')
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
                    format!("Too few columns ({}); expected at least 3", fields.len()),
                )
                .into());
            }
            let key = genome_key(fields[2]);
            if key.is_empty() {
                return Err(BiasError::parse(name, line, "Empty genome file name").into());
            }
            let common_name = fields[0].trim().to_owned();
            match names.entry(key.to_owned()) {
                Entry::Occupied(mut e) => {
                    warn!(
                        "{}:{} Genome {} listed again; display name '{}' replaces '{}'",
                        name,
                        line,
                        key,
                        common_name,
                        e.get()
                    );
                    e.insert(common_name);
                }
                Entry::Vacant(e) => {
                    e.insert(common_name);
                }
            }
        }

        debug!(
            "Finished reading in {} lines from {}; found {} genome names",
            line,
            name,
            names.len()
        );
        Ok(Self { names })
    }

    pub fn from_path<P: AsRef<Path>>(fname: P) -> anyhow::Result<Self> {
        let fname = fname.as_ref();
        debug!("Reading in genome names from {}", fname.display());
        let mut rdr = CompressIo::new()
            .path(fname)
            .bufreader()
            .with_context(|| format!("Error opening name table {}", fname.display()))?;
        Self::from_reader(&mut rdr, &fname.display().to_string())
    }

    pub fn lookup(&self, genome: &str) -> Result<&str, BiasError> {
        self.names
            .get(genome)
            .map(|s| s.as_str())
            .ok_or_else(|| BiasError::Lookup(genome.to_owned()))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};

    #[fixture]
    fn table() -> NameTable {
        let csv = "\
Norway rat,Rattus norvegicus,GCF_000001895.5_Rnor_6.0_genomic.fna.gz,rodent
House mouse,Mus musculus, GCF_000001635 .fna,rodent

Zebrafish,Danio rerio,GCF_000002035.6.fna
";
        NameTable::from_reader(&mut csv.as_bytes(), "genomes.csv").unwrap()
    }

    #[rstest]
    fn test_lookup(table: NameTable) {
        assert_eq!(table.len(), 3);
        assert_eq!(table.lookup("GCF_000001895").unwrap(), "Norway rat");
        assert_eq!(table.lookup("GCF_000001635").unwrap(), "House mouse");
        assert_eq!(table.lookup("GCF_000002035").unwrap(), "Zebrafish");
    }

    #[rstest]
    fn test_missing_genome_is_lookup_error(table: NameTable) {
        let e = table.lookup("GCF_999999999").unwrap_err();
        assert!(e.is_lookup());
        assert_eq!(e.to_string(), "No display name found for genome GCF_999999999");
    }

    #[rstest]
    fn test_later_row_replaces_earlier() {
        let csv = "Old name,x,G1.fa\nNew name,y,G1.fa.gz\n";
        let t = NameTable::from_reader(&mut csv.as_bytes(), "dup.csv").unwrap();
        assert_eq!(t.len(), 1);
        assert_eq!(t.lookup("G1").unwrap(), "New name");
    }

    #[rstest]
    #[case("Name only,x\n")]
    #[case("Name,x,.fa\n")]
    fn test_malformed_row(#[case] csv: &str) {
        let e = NameTable::from_reader(&mut csv.as_bytes(), "bad.csv").unwrap_err();
        assert!(e.downcast_ref::<BiasError>().unwrap().is_parse());
    }
}
