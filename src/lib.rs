//! # UE1 Emulator
//!
//! An emulator of the UE1, a one-bit computer built around the
//! MC14500B instruction set, plus a harness that exhaustively checks
//! multiply and divide programs against integer arithmetic.
//!
//! The UE1 runs a program tape in a loop. Every byte is one instruction;
//! a NOPF in the middle of the tape asks for new input bits and a NOPF
//! at the very end halts the machine.

pub mod cpu;
pub mod asm;
pub mod harness;

// Re-export commonly used types
pub use cpu::{Cpu, Instruction, Memory, Opcode, Registers, RunEnd, Step, StepKind};
pub use asm::{assemble, disassemble, load_tape, AssemblerError, Tape, TapeError};
pub use harness::{InputFeed, InteractiveFeed, Operation, Outcome, Sweep, SweepConfig, SweepReport};
