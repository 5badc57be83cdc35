//! GTF annotation loading.
//!
//! Scans exon records for the requested transcripts and groups them into a
//! gene arena. Attribute extraction is a plain text scan for `key "value"`
//! pairs. Malformed rows are skipped with a diagnostic; only an unreadable
//! file aborts the load.

use crate::errors::Result;
use crate::transcript::{Exon, Gene, Strand};
use log::{debug, warn};
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Extracts a quoted GTF attribute value, e.g. `gene_id "ENSG1"`.
///
/// Returns `None` if the key is absent or its value is not quoted.
#[must_use]
pub fn attribute<'a>(attributes: &'a str, key: &str) -> Option<&'a str> {
    let mut search = attributes;
    while let Some(idx) = search.find(key) {
        let prefix_ok = idx == 0
            || matches!(search.as_bytes()[idx - 1], b' ' | b'\t' | b';');
        let rest = &search[idx + key.len()..];
        let trimmed = rest.trim_start_matches([' ', '\t']);
        if prefix_ok && trimmed.len() < rest.len() && trimmed.starts_with('"') {
            let value = &trimmed[1..];
            if let Some(end) = value.find('"') {
                return Some(&value[..end]);
            }
        }
        search = rest;
    }
    None
}

/// Loads exon records for `relevant_transcripts` from a GTF file into genes.
///
/// Gene order follows first appearance in the file, so runs are
/// reproducible. Rows that are not exons or reference other transcripts are
/// ignored silently; rows that are malformed (too few columns, unparsable
/// coordinates or strand, missing attributes) are skipped with a `warn!`.
///
/// # Errors
///
/// Returns an error only if the file cannot be opened or read.
pub fn load_genes<P: AsRef<Path>>(
    path: P,
    relevant_transcripts: &HashSet<String>,
) -> Result<Vec<Gene>> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let reader = BufReader::new(file);

    let mut genes: Vec<Gene> = Vec::new();
    let mut gene_index: HashMap<String, usize> = HashMap::new();
    let mut skipped = 0u64;

    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 9 {
            warn!("Skipping GTF line {}: expected 9 columns, found {}", line_no + 1, fields.len());
            skipped += 1;
            continue;
        }
        if fields[2] != "exon" {
            continue;
        }

        let Some(transcript_id) = attribute(fields[8], "transcript_id") else {
            warn!("Skipping GTF line {}: no transcript_id attribute", line_no + 1);
            skipped += 1;
            continue;
        };
        if !relevant_transcripts.contains(transcript_id) {
            continue;
        }
        let Some(gene_id) = attribute(fields[8], "gene_id") else {
            warn!("Skipping GTF line {}: no gene_id attribute", line_no + 1);
            skipped += 1;
            continue;
        };

        let (Ok(start), Ok(end)) = (fields[3].parse::<u64>(), fields[4].parse::<u64>()) else {
            warn!(
                "Skipping GTF line {}: unparsable exon coordinates '{}'-'{}'",
                line_no + 1,
                fields[3],
                fields[4]
            );
            skipped += 1;
            continue;
        };
        if start == 0 || end < start {
            warn!("Skipping GTF line {}: invalid exon interval {start}-{end}", line_no + 1);
            skipped += 1;
            continue;
        }
        let strand = match Strand::from_symbol(fields[6]) {
            Ok(strand) => strand,
            Err(_) => {
                warn!("Skipping GTF line {}: invalid strand '{}'", line_no + 1, fields[6]);
                skipped += 1;
                continue;
            }
        };

        let gene_idx = *gene_index.entry(gene_id.to_string()).or_insert_with(|| {
            genes.push(Gene::new(gene_id, fields[0]));
            genes.len() - 1
        });
        genes[gene_idx].transcript_entry(transcript_id, strand).add_exon(Exon { start, end });
    }

    if skipped > 0 {
        warn!("Skipped {skipped} malformed GTF rows");
    }
    debug!(
        "Loaded {} genes / {} transcripts from {}",
        genes.len(),
        genes.iter().map(Gene::transcript_count).sum::<usize>(),
        path.display()
    );
    Ok(genes)
}
