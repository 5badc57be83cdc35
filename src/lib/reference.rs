//! Random access to a line-wrapped reference FASTA via its FAI index.
//!
//! The reader holds a single file handle and serves 1-based inclusive
//! interval queries. Because FASTA lines are fixed-width with a known
//! terminator, a query seeks directly to the byte of the first base, reads a
//! slightly padded span, strips embedded terminators and truncates to the
//! requested length.
//!
//! The reader is not safe for concurrent use on the same handle. All
//! fetching happens during the single-threaded transcript assembly phase,
//! before the generation pipeline starts; no reads occur afterwards.

use crate::errors::{ReadsimError, Result};
use crate::fai::FastaIndex;
use log::debug;
use std::fs::File;
use std::io::{ErrorKind, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

/// Indexed reader over a reference FASTA file.
pub struct IndexedFastaReader {
    index: FastaIndex,
    fasta_path: PathBuf,
    file: Option<File>,
}

impl IndexedFastaReader {
    /// Creates a reader by parsing the FAI index. The FASTA file itself is
    /// not opened until [`open`](Self::open) is called.
    ///
    /// # Errors
    ///
    /// Returns an error if the index cannot be read or parsed.
    pub fn new<P: AsRef<Path>, Q: AsRef<Path>>(fai_path: P, fasta_path: Q) -> Result<Self> {
        let index = FastaIndex::from_path(fai_path)?;
        debug!("Loaded FAI index with {} sequences", index.len());
        Ok(Self { index, fasta_path: fasta_path.as_ref().to_path_buf(), file: None })
    }

    /// Opens the single file handle used for all subsequent fetches.
    ///
    /// # Errors
    ///
    /// Returns an error if the FASTA file cannot be opened.
    pub fn open(&mut self) -> Result<()> {
        self.file = Some(File::open(&self.fasta_path)?);
        Ok(())
    }

    /// Closes the file handle. Further fetches fail until reopened.
    pub fn close(&mut self) {
        self.file = None;
    }

    /// Whether the file handle is currently open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }

    /// Fetches the bases of `[start, end]` (1-based, inclusive) for `name`.
    ///
    /// Returns exactly `end - start + 1` bases, independent of how the
    /// sequence is line-wrapped on disk.
    ///
    /// # Errors
    ///
    /// * [`ReadsimError::SequenceNotFound`] if `name` is not in the index
    ///   (recoverable; the caller decides whether to skip or abort).
    /// * [`ReadsimError::InvalidParameter`] if the interval is empty or runs
    ///   past the end of the sequence.
    /// * [`ReadsimError::Io`] if the reader is closed or the underlying read
    ///   comes up short.
    pub fn fetch(&mut self, name: &str, start: u64, end: u64) -> Result<Vec<u8>> {
        let record = self
            .index
            .get(name)
            .ok_or_else(|| ReadsimError::SequenceNotFound { name: name.to_string() })?;
        if start == 0 || end < start || end > record.length {
            return Err(ReadsimError::InvalidParameter {
                parameter: "interval".to_string(),
                reason: format!(
                    "{name}:{start}-{end} is not a valid 1-based interval within {} bases",
                    record.length
                ),
            });
        }
        let file = self.file.as_mut().ok_or_else(|| {
            ReadsimError::Io(std::io::Error::new(
                ErrorKind::NotConnected,
                "FASTA reader is not open",
            ))
        })?;

        let bases = end - start + 1;

        // Skip whole lines by integer division, then remaining bases in the
        // final partial line.
        let start_byte = record.offset
            + ((start - 1) / record.line_bases) * record.line_width
            + ((start - 1) % record.line_bases);

        // Padded span: requested bases plus an estimate of embedded
        // terminator bytes and a little slack, trimmed after stripping.
        let terminator_width = record.line_width - record.line_bases;
        let span = bases + (bases / record.line_bases) * terminator_width + 2 * terminator_width;

        file.seek(SeekFrom::Start(start_byte))?;
        let mut raw = vec![0u8; span as usize];
        let mut filled = 0;
        while filled < raw.len() {
            let n = file.read(&mut raw[filled..])?;
            if n == 0 {
                break;
            }
            filled += n;
        }

        let wanted = bases as usize;
        let mut out = Vec::with_capacity(wanted);
        for &b in &raw[..filled] {
            if b != b'\n' && b != b'\r' {
                out.push(b);
                if out.len() == wanted {
                    break;
                }
            }
        }

        if out.len() < wanted {
            return Err(ReadsimError::Io(std::io::Error::new(
                ErrorKind::UnexpectedEof,
                format!(
                    "short read for {name}:{start}-{end}: wanted {wanted} bases, got {}",
                    out.len()
                ),
            )));
        }
        Ok(out)
    }
}
