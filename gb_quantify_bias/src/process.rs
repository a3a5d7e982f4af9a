use std::thread;

use anyhow::Context;
use compress_io::compress::CompressIo;
use crossbeam_channel::{unbounded, Receiver, Sender};
use utils::fasta::FastaLength;

use crate::{
    alignment::read_alignment_file,
    config::Config,
    coverage::similar_length,
    genome::Genome,
    names::NameTable,
    report::{BiasReport, GenomeSummary},
};

type GenomeResult = anyhow::Result<GenomeSummary>;

/// Get raw length, contigs and similar length for a single genome
pub fn process_genome(g: &Genome, cfg: &Config) -> GenomeResult {
    debug!("Processing genome {}", g.id());

    let fl = FastaLength::from_path(g.fasta(), cfg.base_limit())?;
    if fl.truncated() {
        debug!(
            "Genome {}: FASTA input truncated at {} bases",
            g.id(),
            fl.bases()
        )
    }

    let hits = read_alignment_file(g.alignments())?;
    let cov = similar_length(&hits, cfg.cutoff());
    if cov.retained == 0 {
        warn!(
            "Genome {}: none of {} alignment hits pass the identity cutoff of {}%; similar length set to 0",
            g.id(),
            cov.hits,
            cfg.cutoff().percent()
        )
    }
    debug!(
        "Genome {}: raw length {}, {} of {} hits retained, similar length {}",
        g.id(),
        fl.bases(),
        cov.retained,
        cov.hits,
        cov.bases
    );

    Ok(GenomeSummary {
        id: g.id().to_owned(),
        raw_length: fl.bases(),
        similar_length: cov.bases,
        contigs: fl.into_contigs(),
    })
}

fn worker(cfg: &Config, ix: usize, r: Receiver<(usize, &Genome)>, s: Sender<(usize, GenomeResult)>) {
    trace!("Worker {} starting up", ix);
    while let Ok((i, g)) = r.recv() {
        trace!("Worker {} processing genome {}", ix, g.id());
        if s.send((i, process_genome(g, cfg))).is_err() {
            error!("Worker {}: error sending results", ix);
            break;
        }
    }
    trace!("Worker {} closing down", ix);
}

/// Process genomes using cfg.threads() worker threads.
/// Results are returned in the same order as cfg.genomes()
fn process_parallel(cfg: &Config) -> Vec<GenomeResult> {
    let genomes = cfg.genomes();
    let nt = cfg.threads();
    let mut res: Vec<Option<GenomeResult>> = genomes.iter().map(|_| None).collect();

    // Everything runs within a scope so that we can pass references to the threads
    thread::scope(|sc| {
        trace!("Spawning {} workers", nt);
        let (snd, rcv) = unbounded();
        let (res_snd, res_rcv) = unbounded();
        let jobs: Vec<_> = (0..nt)
            .map(|i| {
                let r = rcv.clone();
                let s = res_snd.clone();
                sc.spawn(move || worker(cfg, i + 1, r, s))
            })
            .collect();
        drop(rcv);
        drop(res_snd);

        for job in genomes.iter().enumerate() {
            if snd.send(job).is_err() {
                error!("Error sending genome to workers");
                break;
            }
        }
        drop(snd);

        // Finishes when all workers have exited
        while let Ok((i, r)) = res_rcv.recv() {
            res[i] = Some(r)
        }
        for (ix, jh) in jobs.into_iter().enumerate() {
            if jh.join().is_err() {
                error!("Error joining worker thread {}", ix + 1)
            }
        }
    });

    res.into_iter()
        .zip(genomes)
        .map(|(r, g)| r.unwrap_or_else(|| Err(anyhow!("No result returned for genome {}", g.id()))))
        .collect()
}

/// Strategy
///
/// Read in the name table first so that problems there show up before any
/// genome is read.  Each genome is then processed independently (in parallel
/// if more than one thread is used) to get the raw length from the FASTA file
/// and the similar length from the alignment hits.  Results are joined with
/// the display names and written as a single JSON object.
///
/// Unless keep_going is set, the first failure stops the run and no report is
/// written.  With keep_going, failed genomes are left out of the report and an
/// error is returned after the report is written
pub fn process_genomes(cfg: &Config) -> anyhow::Result<()> {
    debug!("Starting processing");
    let names = NameTable::from_path(cfg.name_file()).with_context(|| "Could not read name table")?;
    debug!("{} genome names read in", names.len());

    if cfg.genomes().is_empty() {
        warn!("No genomes to process")
    }

    let results = if cfg.threads() > 1 {
        process_parallel(cfg)
    } else {
        let mut v = Vec::with_capacity(cfg.genomes().len());
        for g in cfg.genomes() {
            let r = process_genome(g, cfg);
            let failed = r.is_err();
            v.push(r);
            if failed && !cfg.keep_going() {
                break;
            }
        }
        v
    };

    let mut report = BiasReport::new(cfg.report_mode());
    let mut n_failed = 0;
    for (g, r) in cfg.genomes().iter().zip(results) {
        let r = r.and_then(|s| report.add(s, &names).map_err(anyhow::Error::from));
        if let Err(e) = r {
            let e = e.context(format!("Error processing genome {}", g.id()));
            if cfg.keep_going() {
                error!("{:#}", e);
                n_failed += 1
            } else {
                return Err(e);
            }
        }
    }

    debug!("Writing report for {} genomes", report.len());
    let wrt = CompressIo::new()
        .opt_path(cfg.output())
        .bufwriter()
        .with_context(|| "Failed to open output file")?;
    report.write(wrt, cfg.pretty())?;

    if n_failed > 0 {
        Err(anyhow!(
            "{} of {} genomes failed; report written for the remaining {}",
            n_failed,
            cfg.genomes().len(),
            report.len()
        ))
    } else {
        debug!("Finished processing");
        Ok(())
    }
}
