//! Assembler, disassembler and tape files for UE1 programs.
//!
//! This module provides:
//! - A one-pass assembler (text → tape bytes)
//! - A disassembler (tape bytes → text)
//! - Tape loading and `.db` data export

pub mod assembler;
pub mod disasm;
pub mod tape;

pub use assembler::{assemble, assemble_with_listing, AssemblerError, Assembly};
pub use disasm::disassemble;
pub use tape::{load_tape, save_tape, to_data_directives, Tape, TapeError, MAX_TAPE};
