#![deny(unsafe_code)]

use anyhow::{bail, Result};
use clap::Parser;
use env_logger::Env;
use log::info;
use readsim_lib::simulate::{ReadSimulator, SimulationParams};
use std::path::{Path, PathBuf};

/// Simulate paired-end sequencing reads from an annotated reference
/// transcriptome.
#[derive(Parser, Debug)]
#[command(
    name = "readsim",
    version,
    about = "Simulate paired-end reads from a reference transcriptome",
    long_about = r"
Simulate paired-end sequencing reads from a reference transcriptome.

Per-transcript read counts, a GTF annotation and an FAI-indexed reference
FASTA go in; fw.fastq, rw.fastq and read.mappinginfo come out. Each simulated
pair records its transcript- and genome-relative coordinates together with
the positions of any injected point mutations.
"
)]
struct Args {
    /// Read-count table (gene\ttranscript\tcount)
    #[arg(long = "readcounts", required = true)]
    readcounts: PathBuf,

    /// Reference FASTA file
    #[arg(long = "fasta", required = true)]
    fasta: PathBuf,

    /// FASTA index (.fai) file
    #[arg(long = "fai", required = true)]
    fai: PathBuf,

    /// GTF annotation file
    #[arg(long = "gtf", required = true)]
    gtf: PathBuf,

    /// Read length in bases
    #[arg(short = 'l', long = "read-length", default_value = "75")]
    read_length: usize,

    /// Mean fragment length
    #[arg(long = "fragment-length", default_value = "200")]
    fragment_length: f64,

    /// Standard deviation of the fragment length
    #[arg(long = "fragment-stddev", default_value = "60")]
    fragment_stddev: f64,

    /// Per-base mutation rate as a percentage in [0, 100]
    #[arg(long = "mutation-rate", default_value = "1.0")]
    mutation_rate: f64,

    /// Output directory (created if missing)
    #[arg(short = 'o', long = "output-dir", required = true)]
    output_dir: PathBuf,

    /// Random seed for reproducible runs
    #[arg(long = "seed")]
    seed: Option<u64>,

    /// Events per chunk handed to the writer thread
    #[arg(long = "chunk-size", default_value = "30000")]
    chunk_size: usize,

    /// Bounded queue capacity, in chunks
    #[arg(long = "queue-capacity", default_value = "500")]
    queue_capacity: usize,

    /// Producer threads for the generation phase
    #[arg(short = 't', long = "threads", default_value = "1")]
    threads: usize,
}

fn validate_file_exists(path: &Path, description: &str) -> Result<()> {
    if !path.is_file() {
        bail!("{description} '{}' does not exist", path.display());
    }
    Ok(())
}

fn run(args: &Args) -> Result<()> {
    validate_file_exists(&args.readcounts, "Read-count table")?;
    validate_file_exists(&args.fasta, "Reference FASTA")?;
    validate_file_exists(&args.fai, "FASTA index")?;
    validate_file_exists(&args.gtf, "GTF annotation")?;

    info!("Starting readsim");
    info!("  Read counts: {}", args.readcounts.display());
    info!("  Reference: {}", args.fasta.display());
    info!("  Annotation: {}", args.gtf.display());
    info!("  Read length: {}", args.read_length);
    info!("  Fragment length (mean): {}", args.fragment_length);
    info!("  Fragment stddev: {:.2}", args.fragment_stddev);
    info!("  Mutation rate: {:.2}%", args.mutation_rate);
    info!("  Threads: {}", args.threads);
    info!("  Output directory: {}", args.output_dir.display());

    let params = SimulationParams {
        read_length: args.read_length,
        fragment_mean: args.fragment_length,
        fragment_stddev: args.fragment_stddev,
        mutation_rate: args.mutation_rate,
        chunk_size: args.chunk_size,
        queue_capacity: args.queue_capacity,
        threads: args.threads,
        seed: args.seed,
    };

    let simulator = ReadSimulator::new(
        &args.readcounts,
        &args.fasta,
        &args.fai,
        &args.gtf,
        &args.output_dir,
        params,
    )?;
    let pairs = simulator.run()?;
    info!("Done: {pairs} read pairs");
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    if let Err(error) = run(&args) {
        eprintln!("Error: {error:#}");
        std::process::exit(1);
    }
}
