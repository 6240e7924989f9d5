//! CPU emulation for the UE1.
//!
//! This module implements the complete UE1 architecture:
//! - 8 scratchpad, 8 output and 7 input one-bit registers
//! - RR (result), CAR (carry), IEN, OEN and the skip latch
//! - The 16-instruction MC14500B-style instruction set

pub mod memory;
pub mod registers;
pub mod decode;
pub mod execute;

pub use memory::Memory;
pub use registers::Registers;
pub use decode::{Instruction, Opcode};
pub use execute::{Cpu, RunEnd, Step, StepKind};
