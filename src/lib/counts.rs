//! Requested read-count table.
//!
//! Tab-separated `gene\ttranscript\tcount` rows, loaded once and read-only
//! during simulation.

use crate::errors::Result;
use log::{debug, warn};
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Per-gene, per-transcript requested read-pair counts.
#[derive(Debug, Default)]
pub struct ReadCounts {
    counts: HashMap<String, HashMap<String, u64>>,
}

impl ReadCounts {
    /// Loads the count table, skipping the header and malformed rows.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or read.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let reader = BufReader::new(file);

        let mut counts: HashMap<String, HashMap<String, u64>> = HashMap::new();
        let mut skipped = 0u64;

        for (line_no, line) in reader.lines().enumerate() {
            let line = line?;
            if line.is_empty() || line.starts_with("gene") {
                continue;
            }
            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() < 3 {
                warn!(
                    "Skipping count line {}: expected 3 tab-separated fields, found {}",
                    line_no + 1,
                    fields.len()
                );
                skipped += 1;
                continue;
            }
            let Ok(count) = fields[2].parse::<u64>() else {
                warn!("Skipping count line {}: unparsable count '{}'", line_no + 1, fields[2]);
                skipped += 1;
                continue;
            };
            counts
                .entry(fields[0].to_string())
                .or_default()
                .insert(fields[1].to_string(), count);
        }

        if skipped > 0 {
            warn!("Skipped {skipped} malformed count rows");
        }
        debug!("Loaded counts for {} genes from {}", counts.len(), path.display());
        Ok(Self { counts })
    }

    /// Requested counts per transcript for one gene.
    #[must_use]
    pub fn counts_for_gene(&self, gene_id: &str) -> Option<&HashMap<String, u64>> {
        self.counts.get(gene_id)
    }

    /// All transcript ids anywhere in the table.
    #[must_use]
    pub fn transcript_ids(&self) -> HashSet<String> {
        self.counts.values().flat_map(|transcripts| transcripts.keys().cloned()).collect()
    }

    /// Total number of read pairs requested across all transcripts.
    #[must_use]
    pub fn total_requested(&self) -> u64 {
        self.counts.values().flat_map(|transcripts| transcripts.values()).sum()
    }

    /// Number of genes with at least one requested transcript.
    #[must_use]
    pub fn gene_count(&self) -> usize {
        self.counts.len()
    }
}
