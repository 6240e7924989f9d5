//! UE1 memory subsystem.
//!
//! The UE1 addresses 16 one-bit locations with the low nibble of each
//! instruction:
//! - 0-7: scratchpad store registers SR0-SR7 (read/write)
//! - 8: reads the result register RR, writes output register OR0
//! - 9-15: reads input registers IR1-IR7, writes output registers OR1-OR7
//!
//! Input and output registers share addresses but are separate storage.

use serde::{Serialize, Deserialize};

/// Number of cells in each register bank.
pub const BANK_SIZE: usize = 8;

/// Address that reads back the result register.
pub const RR_ADDR: u8 = 0x08;

/// The UE1 register file: store, output and input banks.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Memory {
    store: [bool; BANK_SIZE],
    output: [bool; BANK_SIZE],
    /// IR0 is never written by the input latch and always reads as zero.
    input: [bool; BANK_SIZE],
}

impl Memory {
    /// Create a register file with every cell cleared.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the bit at `addr` (masked to 4 bits).
    ///
    /// `rr` is the current result register, which address 8 mirrors.
    #[inline]
    pub fn read(&self, addr: u8, rr: bool) -> bool {
        let addr = addr & 0x0F;
        if addr < 8 {
            self.store[addr as usize]
        } else if addr == RR_ADDR {
            rr
        } else {
            self.input[(addr & 0x07) as usize]
        }
    }

    /// Write `value` to `addr` (masked to 4 bits).
    #[inline]
    pub fn write(&mut self, addr: u8, value: bool) {
        let addr = addr & 0x0F;
        if addr < 8 {
            self.store[addr as usize] = value;
        } else {
            self.output[(addr & 0x07) as usize] = value;
        }
    }

    /// Latch seven input bits: bit `i` of `inputs` lands in IR(i+1).
    pub fn latch_inputs(&mut self, inputs: u32) {
        for i in 0..7 {
            self.input[i + 1] = (inputs >> i) & 1 != 0;
        }
    }

    /// Store register SRn.
    pub fn store(&self, index: usize) -> bool {
        self.store[index]
    }

    /// Output register ORn.
    pub fn output(&self, index: usize) -> bool {
        self.output[index]
    }

    /// Input register IRn.
    pub fn input(&self, index: usize) -> bool {
        self.input[index]
    }

    /// Render SR7..SR0 then OR7..OR0 as four space-separated nibbles.
    pub fn register_dump(&self) -> String {
        let bits: Vec<char> = self.store.iter().rev()
            .chain(self.output.iter().rev())
            .map(|&b| if b { '1' } else { '0' })
            .collect();

        bits.chunks(4)
            .map(|nibble| nibble.iter().collect::<String>())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl std::fmt::Debug for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Memory")
            .field("registers", &self.register_dump())
            .finish()
    }
}
