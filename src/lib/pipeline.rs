//! The dispatch/writer pipeline.
//!
//! Producers hand [`ReadGenerationEventChunk`]s over a bounded channel to a
//! single consumer that assigns each event a strictly increasing global id
//! and writes three correlated streams: forward FASTQ, reverse FASTQ, and a
//! tab-separated mapping-info row per event. The channel's bounded capacity
//! is the sole backpressure mechanism; producers block on a full channel and
//! never drop a chunk.
//!
//! Shutdown is a tagged message, not a sentinel value: after all producers
//! finish, exactly one [`PipelineMessage::Shutdown`] is sent. The consumer
//! also stops if the channel disconnects, so a failed producer side cannot
//! wedge the writer.

use crate::engine::{ReadGenerationEvent, ReadGenerationEventChunk};
use crate::errors::Result;
use crate::progress::ProgressTracker;
use crossbeam_channel::Receiver;
use log::debug;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::thread::{self, JoinHandle};

/// Message over the pipeline channel.
#[derive(Debug)]
pub enum PipelineMessage {
    /// A batch of events to write
    Data(ReadGenerationEventChunk),
    /// Stop the consumer permanently
    Shutdown,
}

/// Filler quality character for simulated reads.
const QUALITY_CHAR: &str = "I";

const WRITE_BUFFER_SIZE: usize = 1 << 16;

/// The single consumer of the pipeline: owns all three output streams, the
/// id counter and the per-read-length quality-string cache.
pub struct OutputWriter {
    forward: BufWriter<File>,
    reverse: BufWriter<File>,
    mapping_info: BufWriter<File>,
    quality_cache: HashMap<usize, String>,
    next_id: u64,
    progress: ProgressTracker,
}

impl OutputWriter {
    /// Creates the three output files.
    ///
    /// # Errors
    ///
    /// Returns an error if any file cannot be created.
    pub fn create<P: AsRef<Path>>(fw_path: P, rv_path: P, mapping_info_path: P) -> Result<Self> {
        Ok(Self {
            forward: BufWriter::with_capacity(WRITE_BUFFER_SIZE, File::create(fw_path)?),
            reverse: BufWriter::with_capacity(WRITE_BUFFER_SIZE, File::create(rv_path)?),
            mapping_info: BufWriter::with_capacity(
                WRITE_BUFFER_SIZE,
                File::create(mapping_info_path)?,
            ),
            quality_cache: HashMap::new(),
            next_id: 0,
            progress: ProgressTracker::new("Wrote read pairs").with_interval(1_000_000),
        })
    }

    /// Consumes messages until `Shutdown` or channel disconnect, then
    /// flushes all three streams. The flush runs on every exit path, so
    /// partially written output is never left buffered.
    ///
    /// Returns the number of events written.
    ///
    /// # Errors
    ///
    /// Returns the first write failure, after attempting the flush.
    pub fn run(mut self, receiver: &Receiver<PipelineMessage>) -> Result<u64> {
        let drained = self.drain(receiver);
        let flushed = self.flush_all();
        drained?;
        flushed?;
        Ok(self.next_id)
    }

    fn drain(&mut self, receiver: &Receiver<PipelineMessage>) -> Result<()> {
        for message in receiver {
            match message {
                PipelineMessage::Data(chunk) => self.write_chunk(&chunk)?,
                PipelineMessage::Shutdown => {
                    debug!("Writer received shutdown after {} events", self.next_id);
                    break;
                }
            }
        }
        self.progress.log_final();
        Ok(())
    }

    fn write_chunk(&mut self, chunk: &ReadGenerationEventChunk) -> Result<()> {
        for event in &chunk.events {
            self.next_id += 1;
            let id = self.next_id;

            let fw_quality = quality_string(&mut self.quality_cache, event.forward_seq.len());
            write_fastq_entry(&mut self.forward, id, &event.forward_seq, fw_quality)?;

            let rv_quality = quality_string(&mut self.quality_cache, event.reverse_seq.len());
            write_fastq_entry(&mut self.reverse, id, &event.reverse_seq, rv_quality)?;

            write_mapping_info(&mut self.mapping_info, id, event)?;
            self.progress.log_if_needed(1);
        }
        Ok(())
    }

    fn flush_all(&mut self) -> Result<()> {
        self.forward.flush()?;
        self.reverse.flush()?;
        self.mapping_info.flush()?;
        Ok(())
    }
}

/// Quality strings are memoized per read length; read lengths come from a
/// tiny set of values relative to the total read count.
fn quality_string(cache: &mut HashMap<usize, String>, len: usize) -> &str {
    cache.entry(len).or_insert_with(|| QUALITY_CHAR.repeat(len))
}

fn write_fastq_entry(writer: &mut impl Write, id: u64, seq: &[u8], quality: &str) -> Result<()> {
    writeln!(writer, "@{id}")?;
    writer.write_all(seq)?;
    writeln!(writer)?;
    writeln!(writer, "+")?;
    writeln!(writer, "{quality}")?;
    Ok(())
}

fn write_mapping_info(
    writer: &mut impl Write,
    id: u64,
    event: &ReadGenerationEvent,
) -> Result<()> {
    writeln!(
        writer,
        "{id}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
        event.chromosome,
        event.gene_id,
        event.transcript_id,
        event.genomic_fw_range,
        event.genomic_rv_range,
        event.transcript_fw_range,
        event.transcript_rv_range,
        format_positions(&event.fw_mutations),
        format_positions(&event.rv_mutations),
    )?;
    Ok(())
}

fn format_positions(positions: &[usize]) -> String {
    positions.iter().map(ToString::to_string).collect::<Vec<_>>().join(",")
}

/// Spawns the writer on its own thread; exactly one thread ever drains the
/// channel, so id assignment and write ordering need no further
/// synchronization.
#[must_use]
pub fn spawn_writer(
    writer: OutputWriter,
    receiver: Receiver<PipelineMessage>,
) -> JoinHandle<Result<u64>> {
    thread::spawn(move || writer.run(&receiver))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::bounded;
    use std::fs;
    use tempfile::TempDir;

    fn event(n: usize) -> ReadGenerationEvent {
        ReadGenerationEvent {
            chromosome: "chr1".to_string(),
            gene_id: "G1".to_string(),
            transcript_id: format!("T{n}"),
            forward_seq: b"ACGT".to_vec(),
            reverse_seq: b"TTAA".to_vec(),
            transcript_fw_range: "0-4".to_string(),
            transcript_rv_range: "6-10".to_string(),
            genomic_fw_range: "100-103".to_string(),
            genomic_rv_range: "106-109".to_string(),
            fw_mutations: vec![1, 3],
            rv_mutations: Vec::new(),
        }
    }

    fn chunk(events: usize) -> ReadGenerationEventChunk {
        ReadGenerationEventChunk { events: (0..events).map(event).collect() }
    }

    struct Paths {
        fw: std::path::PathBuf,
        rv: std::path::PathBuf,
        info: std::path::PathBuf,
    }

    fn paths(dir: &TempDir) -> Paths {
        Paths {
            fw: dir.path().join("fw.fastq"),
            rv: dir.path().join("rw.fastq"),
            info: dir.path().join("read.mappinginfo"),
        }
    }

    #[test]
    fn test_ids_contiguous_across_chunks() {
        let dir = TempDir::new().unwrap();
        let out = paths(&dir);
        let writer = OutputWriter::create(&out.fw, &out.rv, &out.info).unwrap();

        let (sender, receiver) = bounded(10);
        sender.send(PipelineMessage::Data(chunk(3))).unwrap();
        sender.send(PipelineMessage::Data(chunk(2))).unwrap();
        sender.send(PipelineMessage::Shutdown).unwrap();

        let written = writer.run(&receiver).unwrap();
        assert_eq!(written, 5);

        let info = fs::read_to_string(&out.info).unwrap();
        let ids: Vec<u64> = info
            .lines()
            .map(|line| line.split('\t').next().unwrap().parse().unwrap())
            .collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_fastq_and_mapping_formats() {
        let dir = TempDir::new().unwrap();
        let out = paths(&dir);
        let writer = OutputWriter::create(&out.fw, &out.rv, &out.info).unwrap();

        let (sender, receiver) = bounded(10);
        sender.send(PipelineMessage::Data(chunk(1))).unwrap();
        sender.send(PipelineMessage::Shutdown).unwrap();
        writer.run(&receiver).unwrap();

        let fw = fs::read_to_string(&out.fw).unwrap();
        assert_eq!(fw, "@1\nACGT\n+\nIIII\n");
        let rv = fs::read_to_string(&out.rv).unwrap();
        assert_eq!(rv, "@1\nTTAA\n+\nIIII\n");

        let info = fs::read_to_string(&out.info).unwrap();
        assert_eq!(info, "1\tchr1\tG1\tT0\t100-103\t106-109\t0-4\t6-10\t1,3\t\n");
    }

    #[test]
    fn test_shutdown_on_full_channel() {
        let dir = TempDir::new().unwrap();
        let out = paths(&dir);
        let writer = OutputWriter::create(&out.fw, &out.rv, &out.info).unwrap();

        // Capacity 1: the producer repeatedly blocks until the consumer
        // drains, then the shutdown message still terminates it.
        let (sender, receiver) = bounded(1);
        let handle = spawn_writer(writer, receiver);
        for _ in 0..100 {
            sender.send(PipelineMessage::Data(chunk(10))).unwrap();
        }
        sender.send(PipelineMessage::Shutdown).unwrap();

        let written = handle.join().unwrap().unwrap();
        assert_eq!(written, 1_000);
    }

    #[test]
    fn test_disconnect_terminates_consumer() {
        let dir = TempDir::new().unwrap();
        let out = paths(&dir);
        let writer = OutputWriter::create(&out.fw, &out.rv, &out.info).unwrap();

        let (sender, receiver) = bounded(10);
        sender.send(PipelineMessage::Data(chunk(2))).unwrap();
        drop(sender);

        // No shutdown message was ever sent; disconnect ends the loop
        let written = writer.run(&receiver).unwrap();
        assert_eq!(written, 2);
    }

    #[test]
    fn test_no_messages_after_shutdown_are_read() {
        let dir = TempDir::new().unwrap();
        let out = paths(&dir);
        let writer = OutputWriter::create(&out.fw, &out.rv, &out.info).unwrap();

        let (sender, receiver) = bounded(10);
        sender.send(PipelineMessage::Shutdown).unwrap();
        sender.send(PipelineMessage::Data(chunk(5))).unwrap();

        let written = writer.run(&receiver).unwrap();
        assert_eq!(written, 0);
        assert_eq!(fs::read_to_string(&out.info).unwrap(), "");
    }

    #[test]
    fn test_format_positions() {
        assert_eq!(format_positions(&[]), "");
        assert_eq!(format_positions(&[0]), "0");
        assert_eq!(format_positions(&[1, 5, 9]), "1,5,9");
    }
}
