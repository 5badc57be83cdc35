//! Read generation: turns sampled fragments and an assembled transcript
//! into read-pair events, batched into chunks for the writer pipeline.

use crate::dna::reverse_complement_in_place;
use crate::sampler::{mutate_in_place, FragmentSample};
use crate::transcript::Transcript;
use rand::Rng;

/// One simulated read pair with its coordinates and injected mutations.
///
/// Transcript ranges are half-open 0-based (`"start-end"`); genomic ranges
/// are the inclusive genomic coordinates of the read's first and last base,
/// ascending on both strands. Mutation positions are 0-based within each
/// read. Immutable once produced; ownership moves into a chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadGenerationEvent {
    /// Reference sequence the gene lies on
    pub chromosome: String,
    /// Gene the transcript belongs to
    pub gene_id: String,
    /// Transcript the fragment was drawn from
    pub transcript_id: String,
    /// Forward read bases
    pub forward_seq: Vec<u8>,
    /// Reverse read bases (already reverse-complemented)
    pub reverse_seq: Vec<u8>,
    /// Transcript-space range of the forward read, half-open
    pub transcript_fw_range: String,
    /// Transcript-space range of the reverse read window, half-open
    pub transcript_rv_range: String,
    /// Genomic range of the forward read, inclusive
    pub genomic_fw_range: String,
    /// Genomic range of the reverse read, inclusive
    pub genomic_rv_range: String,
    /// Mutated positions within the forward read, ascending
    pub fw_mutations: Vec<usize>,
    /// Mutated positions within the reverse read, ascending
    pub rv_mutations: Vec<usize>,
}

/// An ordered batch of events, the unit of transfer to the writer thread.
#[derive(Debug, Default)]
pub struct ReadGenerationEventChunk {
    /// Events in generation order
    pub events: Vec<ReadGenerationEvent>,
}

impl ReadGenerationEventChunk {
    /// Splits events into chunks of at most `chunk_size` events.
    ///
    /// A request larger than `chunk_size` yields multiple chunks; the final
    /// chunk may be short. No empty chunks are produced.
    ///
    /// # Panics
    ///
    /// Panics if `chunk_size` is zero.
    #[must_use]
    pub fn split(events: Vec<ReadGenerationEvent>, chunk_size: usize) -> Vec<Self> {
        assert!(chunk_size > 0, "chunk size must be positive");
        let mut chunks = Vec::with_capacity(events.len().div_ceil(chunk_size));
        let mut events = events;
        while events.len() > chunk_size {
            let rest = events.split_off(chunk_size);
            chunks.push(Self { events });
            events = rest;
        }
        if !events.is_empty() {
            chunks.push(Self { events });
        }
        chunks
    }

    /// Number of events in the chunk.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the chunk holds no events.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Formats the inclusive genomic range covering transcript indices
/// `[from, to]`, ascending regardless of strand.
fn genomic_range(transcript: &Transcript, from: usize, to: usize) -> String {
    let a = transcript.genomic_position(from);
    let b = transcript.genomic_position(to);
    format!("{}-{}", a.min(b), a.max(b))
}

/// Builds one event per sampled fragment.
///
/// The forward read is `sequence[start..start + read_len]`; the reverse read
/// is `sequence[start + length - read_len..start + length]`
/// reverse-complemented in place. Mutations are injected independently into
/// both read buffers after extraction.
///
/// # Panics
///
/// Panics if a sample violates the sampler invariants
/// (`read_len < length` and `start + length <= transcript.len()`).
pub fn generate_events(
    chromosome: &str,
    gene_id: &str,
    transcript: &Transcript,
    samples: &[FragmentSample],
    read_len: usize,
    mutation_rate: f64,
    rng: &mut impl Rng,
) -> Vec<ReadGenerationEvent> {
    let sequence = transcript.sequence();
    let mut events = Vec::with_capacity(samples.len());

    for sample in samples {
        let fw_start = sample.start;
        let fw_end = fw_start + read_len;
        let rv_start = sample.start + sample.length - read_len;
        let rv_end = sample.start + sample.length;

        let mut forward_seq = sequence[fw_start..fw_end].to_vec();
        let mut reverse_seq = sequence[rv_start..rv_end].to_vec();
        reverse_complement_in_place(&mut reverse_seq);

        let fw_mutations = mutate_in_place(&mut forward_seq, mutation_rate, rng);
        let rv_mutations = mutate_in_place(&mut reverse_seq, mutation_rate, rng);

        events.push(ReadGenerationEvent {
            chromosome: chromosome.to_string(),
            gene_id: gene_id.to_string(),
            transcript_id: transcript.id.clone(),
            forward_seq,
            reverse_seq,
            transcript_fw_range: format!("{fw_start}-{fw_end}"),
            transcript_rv_range: format!("{rv_start}-{rv_end}"),
            genomic_fw_range: genomic_range(transcript, fw_start, fw_end - 1),
            genomic_rv_range: genomic_range(transcript, rv_start, rv_end - 1),
            fw_mutations,
            rv_mutations,
        });
    }
    events
}
