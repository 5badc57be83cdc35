//! Simulation orchestration.
//!
//! Wires the loaders, the assembly phase, the sampling producers and the
//! writer pipeline together. Assembly runs single-threaded against the one
//! FASTA handle; generation then runs with per-gene producers on a rayon
//! pool feeding the bounded channel, with one writer thread draining it.

use crate::annotation;
use crate::counts::ReadCounts;
use crate::engine::{generate_events, ReadGenerationEventChunk};
use crate::errors::{ReadsimError, Result as LibResult};
use crate::pipeline::{spawn_writer, OutputWriter, PipelineMessage};
use crate::reference::IndexedFastaReader;
use crate::sampler::FragmentSampler;
use crate::transcript::Gene;
use anyhow::{anyhow, Context, Result};
use crossbeam_channel::{bounded, Sender};
use log::{info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Create the random number generator driving a simulation, optionally
/// seeded for reproducibility.
#[must_use]
pub fn create_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

/// Tuning and model parameters for one simulation run.
#[derive(Debug, Clone)]
pub struct SimulationParams {
    /// Read length in bases
    pub read_length: usize,
    /// Mean fragment length
    pub fragment_mean: f64,
    /// Fragment length standard deviation
    pub fragment_stddev: f64,
    /// Per-base mutation rate in percent, `[0, 100]`
    pub mutation_rate: f64,
    /// Events per chunk handed to the writer
    pub chunk_size: usize,
    /// Bounded channel capacity in chunks
    pub queue_capacity: usize,
    /// Producer threads for the generation phase
    pub threads: usize,
    /// Master seed; `None` draws from OS entropy
    pub seed: Option<u64>,
}

impl SimulationParams {
    /// Checks parameter bounds that would otherwise surface deep inside the
    /// run as sampling or pipeline failures.
    ///
    /// # Errors
    ///
    /// Returns [`ReadsimError::InvalidParameter`] for out-of-range values.
    pub fn validate(&self) -> LibResult<()> {
        let invalid = |parameter: &str, reason: String| ReadsimError::InvalidParameter {
            parameter: parameter.to_string(),
            reason,
        };
        if self.read_length == 0 {
            return Err(invalid("read-length", "must be positive".to_string()));
        }
        if !(0.0..=100.0).contains(&self.mutation_rate) {
            return Err(invalid(
                "mutation-rate",
                format!("must be a percentage in [0, 100], got {}", self.mutation_rate),
            ));
        }
        if self.read_length as f64 >= self.fragment_mean {
            return Err(invalid(
                "read-length",
                format!(
                    "read length {} must be below the mean fragment length {}",
                    self.read_length, self.fragment_mean
                ),
            ));
        }
        if self.chunk_size == 0 {
            return Err(invalid("chunk-size", "must be positive".to_string()));
        }
        if self.queue_capacity == 0 {
            return Err(invalid("queue-capacity", "must be positive".to_string()));
        }
        if self.threads == 0 {
            return Err(invalid("threads", "must be positive".to_string()));
        }
        Ok(())
    }
}

/// Owns all loaded inputs and drives a simulation run.
pub struct ReadSimulator {
    counts: ReadCounts,
    genes: Vec<Gene>,
    reader: IndexedFastaReader,
    params: SimulationParams,
    output_dir: PathBuf,
}

impl ReadSimulator {
    /// Loads the count table, FASTA index and annotation, and creates the
    /// output directory if missing.
    ///
    /// # Errors
    ///
    /// Returns an error if any input cannot be loaded or the output
    /// directory cannot be created.
    pub fn new<P: AsRef<Path>>(
        read_counts_path: P,
        fasta_path: P,
        fai_path: P,
        gtf_path: P,
        output_dir: P,
        params: SimulationParams,
    ) -> Result<Self> {
        params.validate()?;

        let counts = ReadCounts::from_path(&read_counts_path)
            .with_context(|| format!("Failed to load read counts from {}", read_counts_path.as_ref().display()))?;
        let reader = IndexedFastaReader::new(&fai_path, &fasta_path)
            .with_context(|| format!("Failed to load FASTA index from {}", fai_path.as_ref().display()))?;
        let requested = counts.transcript_ids();
        let genes = annotation::load_genes(&gtf_path, &requested)
            .with_context(|| format!("Failed to load annotation from {}", gtf_path.as_ref().display()))?;

        let annotated: usize = genes.iter().map(Gene::transcript_count).sum();
        if annotated < requested.len() {
            warn!(
                "{} of {} requested transcripts have no exon records in the annotation",
                requested.len() - annotated,
                requested.len()
            );
        }

        let output_dir = output_dir.as_ref().to_path_buf();
        if !output_dir.exists() {
            fs::create_dir_all(&output_dir)
                .with_context(|| format!("Failed to create {}", output_dir.display()))?;
        }

        Ok(Self { counts, genes, reader, params, output_dir })
    }

    /// Runs the simulation end to end and returns the number of read pairs
    /// written.
    ///
    /// # Errors
    ///
    /// Returns the first assembly, sampling or write failure. The writer
    /// flushes and closes its streams on every exit path, and producers stop
    /// enqueuing once the writer is gone.
    pub fn run(mut self) -> Result<u64> {
        let started = Instant::now();
        info!(
            "Starting simulation: {} genes, {} read pairs requested",
            self.genes.len(),
            self.counts.total_requested()
        );

        // Phase 1: single-threaded sequence assembly over the one handle.
        // No reads happen after this point.
        self.reader.open().context("Failed to open reference FASTA")?;
        for gene in &mut self.genes {
            gene.assemble_transcripts(&mut self.reader)
                .with_context(|| format!("Failed to assemble transcripts of gene {}", gene.id))?;
        }
        self.reader.close();
        info!("Assembled {} transcripts", self.genes.iter().map(Gene::transcript_count).sum::<usize>());

        // Phase 2: parallel producers, one writer thread.
        let sampler = FragmentSampler::new(self.params.fragment_mean, self.params.fragment_stddev)?;

        let writer = OutputWriter::create(
            &self.output_dir.join("fw.fastq"),
            &self.output_dir.join("rw.fastq"),
            &self.output_dir.join("read.mappinginfo"),
        )
        .context("Failed to create output files")?;
        let (sender, receiver) = bounded::<PipelineMessage>(self.params.queue_capacity);
        let writer_handle = spawn_writer(writer, receiver);

        // Per-gene seeds from a master stream keep parallel runs
        // reproducible under a fixed seed.
        let mut seed_rng = create_rng(self.params.seed);
        let seeds: Vec<u64> = self.genes.iter().map(|_| seed_rng.random()).collect();

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.params.threads)
            .build()
            .context("Failed to create producer thread pool")?;

        let params = &self.params;
        let counts = &self.counts;
        let sampler = &sampler;
        let produced: Result<()> = pool.install(|| {
            use rayon::prelude::*;
            self.genes
                .par_iter()
                .zip(seeds.par_iter())
                .try_for_each(|(gene, &seed)| produce_gene(gene, counts, sampler, params, seed, &sender))
        });

        // One shutdown message after all producers are done. If the writer
        // already died the channel is disconnected; its own error surfaces
        // at join below.
        let _ = sender.send(PipelineMessage::Shutdown);
        drop(sender);

        let written = writer_handle
            .join()
            .map_err(|_| anyhow!("Writer thread panicked"))?
            .context("Failed to write simulation output")?;
        produced?;

        info!(
            "Wrote {written} read pairs to {} in {:.1}s",
            self.output_dir.display(),
            started.elapsed().as_secs_f64()
        );
        Ok(written)
    }
}

/// Producer for one gene: samples fragments, builds events and enqueues
/// chunks, blocking when the channel is full.
fn produce_gene(
    gene: &Gene,
    counts: &ReadCounts,
    sampler: &FragmentSampler,
    params: &SimulationParams,
    seed: u64,
    sender: &Sender<PipelineMessage>,
) -> Result<()> {
    let Some(gene_counts) = counts.counts_for_gene(&gene.id) else {
        return Ok(());
    };
    let mut rng = create_rng(Some(seed));

    // Deterministic transcript order so a fixed seed reproduces a run
    let mut requested: Vec<(&String, &u64)> = gene_counts.iter().collect();
    requested.sort_by(|a, b| a.0.cmp(b.0));

    for (transcript_id, &count) in requested {
        if count == 0 {
            continue;
        }
        let Some(transcript) = gene.transcript(transcript_id) else {
            warn!("No annotation for transcript {transcript_id} of gene {}; skipping", gene.id);
            continue;
        };
        if transcript.is_empty() {
            warn!("Transcript {transcript_id} has no assembled sequence; skipping");
            continue;
        }

        let samples = sampler.sample(
            count,
            transcript_id,
            transcript.len(),
            params.read_length,
            &mut rng,
        )?;
        let events = generate_events(
            &gene.chromosome,
            &gene.id,
            transcript,
            &samples,
            params.read_length,
            params.mutation_rate,
            &mut rng,
        );
        for chunk in ReadGenerationEventChunk::split(events, params.chunk_size) {
            sender
                .send(PipelineMessage::Data(chunk))
                .map_err(|_| anyhow!("Writer stopped accepting chunks"))?;
        }
    }
    Ok(())
}
