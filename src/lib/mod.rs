#![deny(unsafe_code)]
#![allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::missing_errors_doc,
    clippy::module_name_repetitions,
    clippy::uninlined_format_args
)]

//! # readsim - transcriptome read simulator library
//!
//! Simulates paired-end sequencing reads from a reference transcriptome:
//! per-transcript read counts plus a GTF annotation and an FAI-indexed
//! reference FASTA go in; forward/reverse FASTQ files and a mapping-info
//! table with transcript- and genome-relative coordinates come out.
//!
//! ## Overview
//!
//! - **[`fai`]** / **[`reference`]** - positional index parsing and random
//!   access into the line-wrapped reference
//! - **[`annotation`]** / **[`counts`]** - GTF exon loading and the
//!   requested read-count table
//! - **[`transcript`]** - exon stitching, strand handling and the
//!   transcript-to-genome coordinate map
//! - **[`sampler`]** - fragment length/start sampling and mutation injection
//! - **[`engine`]** - read-pair event construction and chunking
//! - **[`pipeline`]** - the bounded-channel writer pipeline
//! - **[`simulate`]** - orchestration of a full run
//!
//! ## Quick start
//!
//! ```no_run
//! use readsim_lib::simulate::{ReadSimulator, SimulationParams};
//!
//! # fn main() -> anyhow::Result<()> {
//! let params = SimulationParams {
//!     read_length: 75,
//!     fragment_mean: 200.0,
//!     fragment_stddev: 60.0,
//!     mutation_rate: 1.0,
//!     chunk_size: 30_000,
//!     queue_capacity: 500,
//!     threads: 1,
//!     seed: Some(42),
//! };
//! let simulator = ReadSimulator::new(
//!     "readcounts.tsv",
//!     "genome.fa",
//!     "genome.fa.fai",
//!     "annotation.gtf",
//!     "output",
//!     params,
//! )?;
//! let pairs = simulator.run()?;
//! println!("wrote {pairs} read pairs");
//! # Ok(())
//! # }
//! ```

pub mod annotation;
pub mod counts;
pub mod dna;
pub mod engine;
pub mod errors;
pub mod fai;
pub mod pipeline;
pub mod progress;
pub mod reference;
pub mod sampler;
pub mod simulate;
pub mod transcript;

pub use errors::ReadsimError;
