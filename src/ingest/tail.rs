//! Bounded reads of an append-only transcript.
//!
//! Only the trailing window of a large file is read, so the cost of a refresh
//! does not grow with the session.

use std::fs::{self, File};
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

use crate::config::Limits;

/// The lines selected from a transcript for one refresh.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranscriptLines {
    /// First record of the file. Only set when the file was tailed, since a
    /// full read already includes it in `lines`.
    pub first_record: Option<String>,
    /// Complete lines, oldest first.
    pub lines: Vec<String>,
}

impl TranscriptLines {
    pub fn is_empty(&self) -> bool {
        self.first_record.is_none() && self.lines.is_empty()
    }
}

/// Read the lines needed to reconstruct state. A missing or unreadable file
/// is the same as an empty transcript.
pub fn read_transcript(path: &Path, limits: &Limits) -> TranscriptLines {
    match read_bounded(path, limits.tail_window_bytes, limits.head_probe_bytes) {
        Ok(lines) => lines,
        Err(e) => {
            tracing::debug!("transcript {} unavailable: {e}", path.display());
            TranscriptLines::default()
        }
    }
}

/// Files up to `window` bytes are read whole. Larger files get one read of
/// the first `head_probe` bytes and one read of the last `window` bytes.
pub fn read_bounded(path: &Path, window: u64, head_probe: usize) -> io::Result<TranscriptLines> {
    let size = fs::metadata(path)?.len();

    if size <= window {
        tracing::debug!(size, "reading transcript in full");
        let bytes = fs::read(path)?;
        return Ok(TranscriptLines {
            first_record: None,
            lines: split_lines(&bytes),
        });
    }

    tracing::debug!(size, window, "tailing transcript");
    let mut file = File::open(path)?;
    let first_record = read_first_record(&mut file, size, head_probe)?;

    let start = size - window;
    let mut tail = vec![0u8; window as usize];
    file.seek(SeekFrom::Start(start))?;
    file.read_exact(&mut tail)?;

    let mut lines = split_lines(&tail);
    // The first piece straddles the cut and is only part of a record.
    if !lines.is_empty() {
        lines.remove(0);
    }

    Ok(TranscriptLines {
        first_record,
        lines,
    })
}

fn read_first_record(file: &mut File, size: u64, head_probe: usize) -> io::Result<Option<String>> {
    let len = (head_probe as u64).min(size) as usize;
    let mut head = vec![0u8; len];
    file.seek(SeekFrom::Start(0))?;
    file.read_exact(&mut head)?;
    let first = head.split(|b| *b == b'\n').next().unwrap_or(&[]);
    let first = String::from_utf8_lossy(first).trim().to_string();
    Ok((!first.is_empty()).then_some(first))
}

fn split_lines(bytes: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(bytes)
        .split('\n')
        .map(|l| l.strip_suffix('\r').unwrap_or(l).to_string())
        .collect()
}
