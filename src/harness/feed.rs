//! Input feeds for the NOPF input request.
//!
//! Every NOPF that is not the last byte on the tape asks for seven new
//! input bits. Where those bits come from is up to the feed: an operator
//! typing binary numbers, or the sweep harness supplying operand pairs.

use std::collections::VecDeque;
use std::io::{BufRead, Write};
use serde::{Serialize, Deserialize};

/// Prompt printed before each interactive input line.
pub const PROMPT: &str = "Enter IR: ";

/// A source of input register values.
pub trait InputFeed {
    /// Next value for IR1-IR7 (bit 0 lands in IR1), or `None` to stop the run.
    fn next_inputs(&mut self) -> Option<u32>;
}

/// Which operand the sweep feed will supply next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputPhase {
    AwaitingA,
    AwaitingB,
}

/// Feeds one operand pair to a tape: A on the first request, B after that.
#[derive(Debug, Clone)]
pub struct SweepFeed {
    a: u32,
    b: u32,
    fold_dividend_msb: bool,
    phase: InputPhase,
}

impl SweepFeed {
    /// Create a feed for `(a, b)`.
    ///
    /// With `fold_dividend_msb` set, bit 7 of `b` travels as bit 6 of the
    /// A input, since only seven input bits exist. The 8-by-4 divide tapes
    /// expect this.
    pub fn new(a: u32, b: u32, fold_dividend_msb: bool) -> Self {
        Self { a, b, fold_dividend_msb, phase: InputPhase::AwaitingA }
    }

    /// The operand the next request will receive.
    pub fn phase(&self) -> InputPhase {
        self.phase
    }
}

impl InputFeed for SweepFeed {
    fn next_inputs(&mut self) -> Option<u32> {
        match self.phase {
            InputPhase::AwaitingA => {
                self.phase = InputPhase::AwaitingB;
                let mut inputs = self.a;
                if self.fold_dividend_msb && self.b & 0x80 != 0 {
                    inputs |= 0x40;
                }
                Some(inputs)
            }
            // Any further requests keep receiving B.
            InputPhase::AwaitingB => Some(self.b & 0x7F),
        }
    }
}

/// Prompts on `output` and reads binary numbers line by line from `input`.
pub struct InteractiveFeed<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> InteractiveFeed<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl<R: BufRead, W: Write> InputFeed for InteractiveFeed<R, W> {
    fn next_inputs(&mut self) -> Option<u32> {
        // The prompt is cosmetic; a broken output stream does not stop the run.
        let _ = write!(self.output, "{}", PROMPT);
        let _ = self.output.flush();

        // Raw bytes: a line that is not UTF-8 still parses up to its first
        // non-binary byte.
        let mut line = Vec::new();
        match self.input.read_until(b'\n', &mut line) {
            Ok(0) | Err(_) => {
                let _ = writeln!(self.output);
                None
            }
            Ok(_) => Some(parse_binary(&line)),
        }
    }
}

/// A fixed list of inputs, then end of input.
#[derive(Debug, Clone, Default)]
pub struct ScriptedFeed {
    inputs: VecDeque<u32>,
}

impl ScriptedFeed {
    pub fn new(inputs: &[u32]) -> Self {
        Self { inputs: inputs.iter().copied().collect() }
    }
}

impl InputFeed for ScriptedFeed {
    fn next_inputs(&mut self) -> Option<u32> {
        self.inputs.pop_front()
    }
}

/// Parse the leading base-2 numeral of `text`.
///
/// Leading whitespace and one sign character are accepted; parsing stops
/// at the first byte that is not `0` or `1`. No digits yields 0. The value
/// is accumulated in 64 bits and saturates only past `u64::MAX`; the low
/// 32 bits are returned, which covers the seven bits the latch keeps.
pub fn parse_binary(text: &[u8]) -> u32 {
    let start = text
        .iter()
        .position(|&b| !matches!(b, b' ' | b'\t'..=b'\r'))
        .unwrap_or(text.len());
    let text = &text[start..];

    let (negative, digits) = match text.first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };

    let mut value = Some(0u64);
    for &c in digits {
        let bit = match c {
            b'0' => 0,
            b'1' => 1,
            _ => break,
        };
        value = value.and_then(|v| v.checked_mul(2)).and_then(|v| v.checked_add(bit));
    }

    // An overflowed value saturates regardless of sign.
    let value = match value {
        Some(v) if negative => v.wrapping_neg(),
        Some(v) => v,
        None => u64::MAX,
    };
    value as u32
}
