//! Exhaustive verification of multiply and divide tapes.
//!
//! The tape is run once for every operand pair. Afterwards the result is
//! read back out of the register file and checked against ordinary
//! integer arithmetic.

use crate::asm::tape::Tape;
use crate::cpu::{Cpu, Memory, RunEnd, Step};
use crate::harness::feed::SweepFeed;
use serde::{Serialize, Deserialize};

/// What the tape under test computes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
pub enum Operation {
    /// Product in SR7-SR0:OR7-OR0
    #[default]
    #[value(name = "mul")]
    Multiply,
    /// Quotient in OR7-OR0, remainder in SR3-SR0
    #[value(name = "div")]
    Divide,
}

/// Widest operand a sweep can feed: seven input bits plus the folded
/// dividend MSB.
pub const MAX_OPERAND_BITS: u8 = 8;

/// Operand widths and mode for a sweep.
///
/// Widths above [`MAX_OPERAND_BITS`] are treated as [`MAX_OPERAND_BITS`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepConfig {
    /// Width of operand A (the divisor when dividing).
    pub bits_a: u8,
    /// Width of operand B (the dividend when dividing).
    pub bits_b: u8,
    pub operation: Operation,
    /// Instruction limit per run, if any.
    pub max_cycles: Option<u64>,
}

impl SweepConfig {
    /// Both widths zero means a single interactive run instead.
    pub fn is_sweep(&self) -> bool {
        self.bits_a != 0 || self.bits_b != 0
    }

    /// An 8-bit dividend does not fit the seven input bits, so its top
    /// bit rides along with the divisor.
    pub fn fold_dividend_msb(&self) -> bool {
        self.operation == Operation::Divide && self.bits_b == 8
    }

    /// The divisor the tape actually receives for operand `a`.
    pub fn divisor(&self, a: u32) -> u32 {
        if self.fold_dividend_msb() { a & 0x0F } else { a }
    }

    /// Quotient a divide tape must report for a zero divisor.
    pub fn max_quotient(&self) -> u32 {
        operand_count(self.bits_b) - 1
    }

    /// Every `(a, b)` pair, A in the outer loop.
    pub fn pairs(&self) -> impl Iterator<Item = (u32, u32)> {
        let count_b = operand_count(self.bits_b);
        (0..operand_count(self.bits_a)).flat_map(move |a| (0..count_b).map(move |b| (a, b)))
    }
}

/// Number of distinct operands of width `bits`.
fn operand_count(bits: u8) -> u32 {
    1 << bits.min(MAX_OPERAND_BITS)
}

/// The decoded result of one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Outcome {
    Product {
        a: u32,
        b: u32,
        result: u32,
        end: RunEnd,
    },
    Quotient {
        dividend: u32,
        divisor: u32,
        quotient: u32,
        remainder: u32,
        /// Expected quotient when dividing by zero.
        max_quotient: u32,
        end: RunEnd,
    },
}

impl Outcome {
    /// Read the result of the run for `(a, b)` out of `mem`.
    pub fn decode(config: &SweepConfig, a: u32, b: u32, mem: &Memory, end: RunEnd) -> Self {
        match config.operation {
            Operation::Multiply => Outcome::Product {
                a,
                b,
                result: product_bits(mem),
                end,
            },
            Operation::Divide => {
                let (quotient, remainder) = quotient_bits(mem);
                Outcome::Quotient {
                    dividend: b,
                    divisor: config.divisor(a),
                    quotient,
                    remainder,
                    max_quotient: config.max_quotient(),
                    end,
                }
            }
        }
    }

    /// How the run ended.
    pub fn end(&self) -> RunEnd {
        match self {
            Outcome::Product { end, .. } | Outcome::Quotient { end, .. } => *end,
        }
    }

    /// Whether the tape halted with the arithmetically correct answer.
    pub fn is_correct(&self) -> bool {
        if self.end() != RunEnd::Halted {
            return false;
        }

        match *self {
            Outcome::Product { a, b, result, .. } => result == a * b,
            Outcome::Quotient { divisor: 0, quotient, max_quotient, .. } => {
                quotient == max_quotient
            }
            Outcome::Quotient { dividend, divisor, quotient, remainder, .. } => {
                quotient == dividend / divisor && remainder == dividend % divisor
            }
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            Outcome::Product { a, b, result, .. } => {
                write!(f, "{} x {} = {}", a, b, result)?;
            }
            Outcome::Quotient { dividend, divisor: 0, quotient, .. } => {
                write!(f, "{} / 0 = {}", dividend, quotient)?;
            }
            Outcome::Quotient { dividend, divisor, quotient, remainder, .. } => {
                write!(f, "{} / {} = {}, remainder {}", dividend, divisor, quotient, remainder)?;
            }
        }

        if !self.is_correct() {
            write!(f, "  WRONG!")?;
        }
        Ok(())
    }
}

/// SR7-SR0 followed by OR7-OR0, as a 16-bit number.
pub fn product_bits(mem: &Memory) -> u32 {
    let bits = (0..8).rev().map(|i| mem.store(i))
        .chain((0..8).rev().map(|i| mem.output(i)));
    bits.fold(0, |acc, bit| (acc << 1) | bit as u32)
}

/// Quotient from the output bank and remainder from SR3-SR0.
///
/// The quotient field is nine bits wide but there is no OR8, so its top
/// bit always reads as zero.
pub fn quotient_bits(mem: &Memory) -> (u32, u32) {
    let quotient = (0..8).rev().fold(0, |acc, i| (acc << 1) | mem.output(i) as u32);
    let remainder = (0..4).rev().fold(0, |acc, i| (acc << 1) | mem.store(i) as u32);
    (quotient, remainder)
}

/// Totals for a finished sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepReport {
    /// Operand pairs run.
    pub checked: u64,
    /// Pairs with a wrong or missing answer.
    pub failures: u64,
    /// Pairs that hit the instruction limit.
    pub cycle_limited: u64,
}

impl SweepReport {
    fn record(&mut self, outcome: &Outcome) {
        self.checked += 1;
        if !outcome.is_correct() {
            self.failures += 1;
        }
        if outcome.end() == RunEnd::CycleLimit {
            self.cycle_limited += 1;
        }
    }

    /// True when every pair was correct.
    pub fn passed(&self) -> bool {
        self.failures == 0
    }
}

/// Runs a tape over every operand pair of a [`SweepConfig`].
pub struct Sweep<'a> {
    tape: &'a Tape,
    config: SweepConfig,
}

impl<'a> Sweep<'a> {
    pub fn new(tape: &'a Tape, config: SweepConfig) -> Self {
        Self { tape, config }
    }

    /// Run one pair on a fresh CPU.
    pub fn run_pair<S>(&self, a: u32, b: u32, on_step: S) -> Outcome
    where
        S: FnMut(&Step, &Cpu),
    {
        let mut cpu = Cpu::new();
        let mut feed = SweepFeed::new(a, b, self.config.fold_dividend_msb());
        let end = cpu.run_with(self.tape, &mut feed, self.config.max_cycles, on_step);
        Outcome::decode(&self.config, a, b, &cpu.mem, end)
    }

    /// Run every pair, reporting each outcome as it is produced.
    pub fn run<S, O>(&self, mut on_step: S, mut on_outcome: O) -> SweepReport
    where
        S: FnMut(&Step, &Cpu),
        O: FnMut(&Outcome),
    {
        let mut report = SweepReport::default();
        for (a, b) in self.config.pairs() {
            let outcome = self.run_pair(a, b, &mut on_step);
            report.record(&outcome);
            on_outcome(&outcome);
        }
        report
    }
}
