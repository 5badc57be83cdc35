//! Transcript assembly: exon stitching, strand handling and the
//! transcript-to-genome coordinate map.
//!
//! Genes own their transcripts outright; the arena is built during
//! annotation loading, populated with sequence data in a single
//! single-threaded pass, and read-only from then on.

use crate::dna::reverse_complement_in_place;
use crate::errors::{ReadsimError, Result};
use crate::reference::IndexedFastaReader;
use log::warn;
use std::collections::HashMap;
use std::fmt;

/// Orientation of a transcript relative to the genomic reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strand {
    /// Plus strand; the mature sequence reads left to right genomically.
    Forward,
    /// Minus strand; the mature sequence is the reverse complement.
    Reverse,
}

impl Strand {
    /// Parses a GTF strand character.
    ///
    /// # Errors
    ///
    /// Returns an error for anything other than `+` or `-`.
    pub fn from_symbol(symbol: &str) -> Result<Self> {
        match symbol {
            "+" => Ok(Self::Forward),
            "-" => Ok(Self::Reverse),
            other => Err(ReadsimError::InvalidParameter {
                parameter: "strand".to_string(),
                reason: format!("expected '+' or '-', found '{other}'"),
            }),
        }
    }
}

impl fmt::Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Forward => write!(f, "+"),
            Self::Reverse => write!(f, "-"),
        }
    }
}

/// A genomic exon interval, 1-based inclusive, `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Exon {
    /// First base of the exon (1-based)
    pub start: u64,
    /// Last base of the exon (inclusive)
    pub end: u64,
}

impl Exon {
    /// Number of bases covered by the exon.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    /// Always false for a valid exon; present for API symmetry.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }
}

/// A transcript: ordered exons plus, once assembled, the mature spliced
/// sequence and a parallel map from transcript index to genomic coordinate.
#[derive(Debug)]
pub struct Transcript {
    /// Transcript identifier (e.g. Ensembl transcript id)
    pub id: String,
    /// Strand the transcript is transcribed from
    pub strand: Strand,
    exons: Vec<Exon>,
    sequence: Vec<u8>,
    genomic_map: Vec<u64>,
}

impl Transcript {
    /// Creates an empty transcript; exons are added during annotation
    /// loading and the sequence is filled in by [`assemble`](Self::assemble).
    #[must_use]
    pub fn new(id: impl Into<String>, strand: Strand) -> Self {
        Self {
            id: id.into(),
            strand,
            exons: Vec::new(),
            sequence: Vec::new(),
            genomic_map: Vec::new(),
        }
    }

    /// Registers an exon interval.
    pub fn add_exon(&mut self, exon: Exon) {
        self.exons.push(exon);
    }

    /// The exon intervals, in insertion order until assembly sorts them.
    #[must_use]
    pub fn exons(&self) -> &[Exon] {
        &self.exons
    }

    /// The assembled mature sequence (empty before assembly).
    #[must_use]
    pub fn sequence(&self) -> &[u8] {
        &self.sequence
    }

    /// Length of the assembled sequence.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    /// Whether the transcript has been assembled yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    /// Builds the mature sequence and coordinate map from the reference.
    ///
    /// Exons are sorted ascending by genomic start, fetched in genomic order
    /// and concatenated; the coordinate map is filled with each exon's
    /// genomic positions in ascending order regardless of strand. For
    /// minus-strand transcripts the whole assembled buffer is then
    /// reverse-complemented in place; the map is left ascending and
    /// [`genomic_position`](Self::genomic_position) mirrors the index.
    ///
    /// Calling with a closed reader is a no-op with a logged diagnostic.
    ///
    /// # Errors
    ///
    /// Propagates index-lookup and I/O failures from the reader.
    pub fn assemble(&mut self, chromosome: &str, reader: &mut IndexedFastaReader) -> Result<()> {
        if !reader.is_open() {
            warn!("Cannot assemble transcript {}: FASTA reader is not open", self.id);
            return Ok(());
        }
        self.exons.sort_by_key(|exon| exon.start);

        let total: u64 = self.exons.iter().map(Exon::len).sum();
        self.sequence = Vec::with_capacity(total as usize);
        self.genomic_map = Vec::with_capacity(total as usize);

        for exon in &self.exons {
            let bases = reader.fetch(chromosome, exon.start, exon.end)?;
            self.sequence.extend_from_slice(&bases);
            self.genomic_map.extend(exon.start..=exon.end);
        }

        if self.strand == Strand::Reverse {
            reverse_complement_in_place(&mut self.sequence);
        }

        debug_assert_eq!(self.sequence.len(), self.genomic_map.len());
        Ok(())
    }

    /// Maps a transcript coordinate to its genomic coordinate.
    ///
    /// The map is stored in ascending genomic order for both strands, so
    /// minus-strand transcripts index it mirrored: transcript base `i` sits
    /// at `map[len - 1 - i]`.
    ///
    /// # Panics
    ///
    /// Panics if `i` is out of bounds of the assembled sequence.
    #[must_use]
    pub fn genomic_position(&self, i: usize) -> u64 {
        match self.strand {
            Strand::Forward => self.genomic_map[i],
            Strand::Reverse => self.genomic_map[self.genomic_map.len() - 1 - i],
        }
    }
}

/// A gene and the transcripts it owns.
#[derive(Debug)]
pub struct Gene {
    /// Gene identifier
    pub id: String,
    /// Chromosome (reference sequence name) the gene lies on
    pub chromosome: String,
    transcripts: HashMap<String, Transcript>,
}

impl Gene {
    /// Creates a gene with no transcripts.
    #[must_use]
    pub fn new(id: impl Into<String>, chromosome: impl Into<String>) -> Self {
        Self { id: id.into(), chromosome: chromosome.into(), transcripts: HashMap::new() }
    }

    /// Returns the transcript for `id`, creating it if absent.
    pub fn transcript_entry(&mut self, id: &str, strand: Strand) -> &mut Transcript {
        self.transcripts
            .entry(id.to_string())
            .or_insert_with(|| Transcript::new(id, strand))
    }

    /// Looks up a transcript by id.
    #[must_use]
    pub fn transcript(&self, id: &str) -> Option<&Transcript> {
        self.transcripts.get(id)
    }

    /// Iterates over the gene's transcripts.
    pub fn transcripts(&self) -> impl Iterator<Item = &Transcript> {
        self.transcripts.values()
    }

    /// Number of transcripts owned by the gene.
    #[must_use]
    pub fn transcript_count(&self) -> usize {
        self.transcripts.len()
    }

    /// Assembles every transcript of the gene.
    ///
    /// # Errors
    ///
    /// Propagates the first assembly failure.
    pub fn assemble_transcripts(&mut self, reader: &mut IndexedFastaReader) -> Result<()> {
        for transcript in self.transcripts.values_mut() {
            transcript.assemble(&self.chromosome, reader)?;
        }
        Ok(())
    }
}
