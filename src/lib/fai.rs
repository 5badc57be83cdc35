//! FASTA index (FAI) parsing.
//!
//! An FAI file describes where each sequence lives inside a line-wrapped
//! FASTA file: one tab-separated row per sequence with the sequence name,
//! total length, byte offset of the first base, bases per line, and bytes
//! per line including the line terminator.

use crate::errors::{ReadsimError, Result};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// One row of an FAI index.
///
/// `line_width >= line_bases` always holds; the difference is the width of
/// the line terminator (1 for `\n`, 2 for `\r\n`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaiRecord {
    /// Sequence name (first FASTA header token)
    pub name: String,
    /// Total number of bases in the sequence
    pub length: u64,
    /// Byte offset of the sequence's first base in the FASTA file
    pub offset: u64,
    /// Number of bases per line
    pub line_bases: u64,
    /// Number of bytes per line, including the terminator
    pub line_width: u64,
}

/// Parsed FAI index with lookup by sequence name.
#[derive(Debug, Default)]
pub struct FastaIndex {
    records: HashMap<String, FaiRecord>,
}

impl FastaIndex {
    /// Reads and parses an FAI file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or if any row does not
    /// have five tab-separated fields with parsable integers.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let reader = BufReader::new(file);

        let format_error = |line_no: usize, reason: String| ReadsimError::InvalidFileFormat {
            file_type: "FAI".to_string(),
            path: path.display().to_string(),
            reason: format!("line {line_no}: {reason}"),
        };

        let mut records = HashMap::new();
        for (line_no, line) in reader.lines().enumerate() {
            let line = line?;
            if line.is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() < 5 {
                return Err(format_error(
                    line_no + 1,
                    format!("expected 5 tab-separated fields, found {}", fields.len()),
                ));
            }
            let parse = |field: &str, what: &str| {
                field.parse::<u64>().map_err(|_| {
                    format_error(line_no + 1, format!("unparsable {what} '{field}'"))
                })
            };
            let record = FaiRecord {
                name: fields[0].to_string(),
                length: parse(fields[1], "sequence length")?,
                offset: parse(fields[2], "offset")?,
                line_bases: parse(fields[3], "bases-per-line")?,
                line_width: parse(fields[4], "bytes-per-line")?,
            };
            if record.line_bases == 0 || record.line_width < record.line_bases {
                return Err(format_error(
                    line_no + 1,
                    format!(
                        "inconsistent line geometry ({} bases, {} bytes per line)",
                        record.line_bases, record.line_width
                    ),
                ));
            }
            records.insert(record.name.clone(), record);
        }

        Ok(Self { records })
    }

    /// Looks up the index record for a sequence name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FaiRecord> {
        self.records.get(name)
    }

    /// Number of sequences in the index.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the index contains no sequences.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_fai(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_parse_two_records() {
        let file = write_fai("chr1\t248956422\t112\t70\t71\nchr2\t242193529\t252513167\t70\t71\n");
        let index = FastaIndex::from_path(file.path()).unwrap();
        assert_eq!(index.len(), 2);

        let chr1 = index.get("chr1").unwrap();
        assert_eq!(chr1.length, 248_956_422);
        assert_eq!(chr1.offset, 112);
        assert_eq!(chr1.line_bases, 70);
        assert_eq!(chr1.line_width, 71);
    }

    #[test]
    fn test_unknown_name_is_none() {
        let file = write_fai("chr1\t100\t6\t70\t71\n");
        let index = FastaIndex::from_path(file.path()).unwrap();
        assert!(index.get("chrX").is_none());
    }

    #[test]
    fn test_short_row_is_error() {
        let file = write_fai("chr1\t100\t6\n");
        let err = FastaIndex::from_path(file.path()).unwrap_err();
        assert!(format!("{err}").contains("expected 5 tab-separated fields"));
    }

    #[test]
    fn test_unparsable_field_is_error() {
        let file = write_fai("chr1\tlots\t6\t70\t71\n");
        let err = FastaIndex::from_path(file.path()).unwrap_err();
        assert!(format!("{err}").contains("unparsable sequence length"));
    }

    #[test]
    fn test_bad_line_geometry_is_error() {
        let file = write_fai("chr1\t100\t6\t70\t69\n");
        let err = FastaIndex::from_path(file.path()).unwrap_err();
        assert!(format!("{err}").contains("inconsistent line geometry"));
    }

    #[test]
    fn test_empty_lines_skipped() {
        let file = write_fai("chr1\t100\t6\t70\t71\n\n");
        let index = FastaIndex::from_path(file.path()).unwrap();
        assert_eq!(index.len(), 1);
    }
}
