use std::{num::NonZeroUsize, path::PathBuf};

use clap::{
    crate_authors, crate_description, crate_name, crate_version, value_parser, Arg, ArgAction,
    ArgMatches, Command,
};

use anyhow::Context;

use utils::{init_log, LogLevel};

use crate::{
    config::Config,
    coverage::{IdentityCutoff, SimilarityUnit},
    genome::{discover_genomes, genome_vec_from_file, Genome},
    report::ReportMode,
};

/// Set up definition of command options for clap
fn cli_model() -> Command {
    Command::new(crate_name!())
        .about(crate_description!())
        .version(crate_version!())
        .author(crate_authors!())
        .arg(
            Arg::new("timestamp")
                .short('X')
                .long("timestamp")
                .value_parser(value_parser!(stderrlog::Timestamp))
                .value_name("GRANULARITY")
                .default_value("none")
                .help("Prepend log entries with a timestamp"),
        )
        .arg(
            Arg::new("loglevel")
                .short('l')
                .long("loglevel")
                .value_name("LOGLEVEL")
                .value_parser(value_parser!(LogLevel))
                .ignore_case(true)
                .default_value("warn")
                .help("Set log level"),
        )
        .arg(
            Arg::new("quiet")
                .action(ArgAction::SetTrue)
                .long("quiet")
                .conflicts_with("loglevel")
                .help("Silence all output"),
        )
        .arg(
            Arg::new("threads")
                .short('t')
                .long("threads")
                .value_parser(value_parser!(NonZeroUsize))
                .value_name("INT")
                .help("Set number of genomes processed in parallel [default: available cores]"),
        )
        .arg(
            Arg::new("similarity")
                .short('s')
                .long("similarity")
                .value_parser(value_parser!(f64))
                .value_name("FLOAT")
                .default_value("0.9")
                .help("Minimum identity for an alignment hit to count as similar sequence"),
        )
        .arg(
            Arg::new("similarity_unit")
                .long("similarity-unit")
                .value_parser(value_parser!(SimilarityUnit))
                .value_name("UNIT")
                .ignore_case(true)
                .default_value("fraction")
                .help("Unit of the similarity cutoff: fraction (0-1) or percent (0-100)"),
        )
        .arg(
            Arg::new("report_mode")
                .short('m')
                .long("report-mode")
                .value_parser(value_parser!(ReportMode))
                .value_name("MODE")
                .ignore_case(true)
                .default_value("subtract-coverage")
                .help("Report raw - similar length (subtract-coverage) or the similar length (coverage-as-is)"),
        )
        .arg(
            Arg::new("names")
                .short('n')
                .long("names")
                .value_parser(value_parser!(PathBuf))
                .value_name("PATH")
                .required(true)
                .help("CSV file with genome display names (name,<ignored>,<genome file>,...)"),
        )
        .arg(
            Arg::new("base_limit")
                .short('b')
                .long("base-limit")
                .value_parser(value_parser!(usize))
                .value_name("INT")
                .help("Stop reading each FASTA file after the line that takes the base count over this limit"),
        )
        .arg(
            Arg::new("fasta_dir")
                .short('F')
                .long("fasta-dir")
                .value_parser(value_parser!(PathBuf))
                .value_name("PATH")
                .requires("alignment_dir")
                .help("Directory with genome FASTA files"),
        )
        .arg(
            Arg::new("alignment_dir")
                .short('A')
                .long("alignment-dir")
                .value_parser(value_parser!(PathBuf))
                .value_name("PATH")
                .requires("fasta_dir")
                .help("Directory with tabular alignment files"),
        )
        .arg(
            Arg::new("fasta_suffix")
                .long("fasta-suffix")
                .value_parser(value_parser!(String))
                .value_name("STRING")
                .default_value(".fa")
                .help("Suffix of FASTA file names in the FASTA directory"),
        )
        .arg(
            Arg::new("alignment_suffix")
                .long("alignment-suffix")
                .value_parser(value_parser!(String))
                .value_name("STRING")
                .default_value(".m8")
                .help("Suffix of alignment file names in the alignment directory"),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_parser(value_parser!(PathBuf))
                .value_name("PATH")
                .help("Set output file [default: <stdout>]"),
        )
        .arg(
            Arg::new("pretty")
                .short('p')
                .long("pretty")
                .action(ArgAction::SetTrue)
                .help("Indent JSON output"),
        )
        .arg(
            Arg::new("keep_going")
                .short('k')
                .long("keep-going")
                .action(ArgAction::SetTrue)
                .help("Report remaining genomes if a genome fails (exit status still signals failure)"),
        )
        .arg(
            Arg::new("genome_list")
                .value_parser(value_parser!(PathBuf))
                .value_name("GENOME_LIST")
                .conflicts_with("fasta_dir")
                .required_unless_present("fasta_dir")
                .help("File with genome id, FASTA path and alignment path (tab separated) per line"),
        )
}

fn get_genomes(m: &ArgMatches) -> anyhow::Result<Vec<Genome>> {
    if let Some(p) = m.get_one::<PathBuf>("genome_list") {
        genome_vec_from_file(p).with_context(|| "Could not read genome list")
    } else {
        let fasta_dir = m
            .get_one::<PathBuf>("fasta_dir")
            .expect("Missing FASTA directory");
        let aln_dir = m
            .get_one::<PathBuf>("alignment_dir")
            .expect("Missing alignment directory");
        let fasta_suffix = m
            .get_one::<String>("fasta_suffix")
            .expect("Missing default FASTA suffix");
        let aln_suffix = m
            .get_one::<String>("alignment_suffix")
            .expect("Missing default alignment suffix");
        discover_genomes(fasta_dir, fasta_suffix, aln_dir, aln_suffix)
            .with_context(|| "Error collecting input files")
    }
}

/// Handle command line options.  Set up Config structure
pub fn handle_cli() -> anyhow::Result<Config> {
    // Get matches from command line
    let m = cli_model().get_matches();

    // Setup logging
    init_log(&m)?;

    debug!("Processing command line options");

    let similarity = *m
        .get_one::<f64>("similarity")
        .expect("Missing default similarity");
    let unit = *m
        .get_one::<SimilarityUnit>("similarity_unit")
        .expect("Missing default similarity unit");
    let cutoff = IdentityCutoff::new(similarity, unit)?;
    debug!("Identity cutoff: {}%", cutoff.percent());

    let report_mode = *m
        .get_one::<ReportMode>("report_mode")
        .expect("Missing default report mode");

    let name_file = m
        .get_one::<PathBuf>("names")
        .expect("Missing name table")
        .clone();

    let genomes = get_genomes(&m)?;
    debug!("Number of genomes: {}", genomes.len());

    let nt = m
        .get_one::<NonZeroUsize>("threads")
        .map(|x| usize::from(*x))
        .unwrap_or_else(num_cpus::get);

    let mut cfg = Config::new(genomes, name_file, cutoff, report_mode);

    if let Some(x) = m.get_one::<usize>("base_limit") {
        cfg.set_base_limit(*x)
    }
    if let Some(p) = m.get_one::<PathBuf>("output") {
        cfg.set_output(p)
    }
    if m.get_flag("pretty") {
        cfg.set_pretty()
    }
    if m.get_flag("keep_going") {
        cfg.set_keep_going()
    }
    cfg.set_threads(nt);

    Ok(cfg)
}
