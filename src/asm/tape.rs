//! Program tapes.
//!
//! A tape is a raw binary file with one instruction per byte. The UE1
//! reads it in a loop: after the last byte it starts again at byte 0.

use std::io::Read;
use std::path::Path;
use thiserror::Error;

/// Largest tape the emulator will load.
pub const MAX_TAPE: usize = 4096;

/// A loaded, non-empty program tape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tape {
    bytes: Vec<u8>,
}

impl Tape {
    /// Wrap raw bytes. Anything past [`MAX_TAPE`] is dropped.
    pub fn from_bytes(mut bytes: Vec<u8>) -> Result<Self, TapeError> {
        if bytes.is_empty() {
            return Err(TapeError::Empty);
        }
        bytes.truncate(MAX_TAPE);
        Ok(Self { bytes })
    }

    /// Instruction byte at `pc`.
    ///
    /// # Panics
    /// Panics if `pc` is past the end of the tape.
    #[inline]
    pub fn fetch(&self, pc: usize) -> u8 {
        self.bytes[pc]
    }

    /// Number of instructions on the tape.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Always false: empty tapes are rejected at load time.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// The raw tape contents.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Load a tape from disk, reading at most [`MAX_TAPE`] bytes.
pub fn load_tape<P: AsRef<Path>>(path: P) -> Result<Tape, TapeError> {
    let file = std::fs::File::open(path.as_ref())?;

    let mut bytes = Vec::with_capacity(MAX_TAPE);
    file.take(MAX_TAPE as u64).read_to_end(&mut bytes)?;

    Tape::from_bytes(bytes)
}

/// Save raw tape bytes to disk.
pub fn save_tape<P: AsRef<Path>>(path: P, bytes: &[u8]) -> Result<(), TapeError> {
    std::fs::write(path.as_ref(), bytes)?;
    Ok(())
}

/// Render bytes as `.db` data directives, eight to a line.
///
/// The output always ends with a newline of its own, so a full last line
/// (or no bytes at all) leaves a trailing blank line.
pub fn to_data_directives(bytes: &[u8]) -> String {
    let mut output = String::new();

    for chunk in bytes.chunks(8) {
        let values: Vec<String> = chunk.iter().map(|b| format!("${:02X}", b)).collect();
        output.push_str("        .db ");
        output.push_str(&values.join(", "));
        if chunk.len() == 8 {
            output.push('\n');
        }
    }

    output.push('\n');
    output
}

/// Errors that can occur while loading or saving tapes.
#[derive(Debug, Error)]
pub enum TapeError {
    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("empty tape")]
    Empty,
}
