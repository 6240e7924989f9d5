//! UE1 CPU registers.
//!
//! The UE1 has a single one-bit result register plus four latches:
//! - RR: result register (accumulator)
//! - CAR: carry from ADD/SUB
//! - IEN: input enable, gates memory reads of the ALU instructions
//! - OEN: output enable, gates STO/STOC
//! - SKIP: one-shot latch that discards the next instruction

use serde::{Serialize, Deserialize};

/// The UE1 register file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registers {
    /// RR: result register
    pub rr: bool,

    /// CAR: carry latch
    pub carry: bool,

    /// IEN: input enable
    pub ien: bool,

    /// OEN: output enable
    pub oen: bool,

    /// Set by RTN/SKZ; cleared once the next instruction has been skipped.
    pub skip: bool,
}

impl Registers {
    /// Create a register file with everything cleared.
    pub fn new() -> Self {
        Self::default()
    }

    /// Gate a memory operand through IEN.
    #[inline]
    pub fn gated(&self, data_in: bool) -> bool {
        self.ien && data_in
    }

    /// One-bit full adder: RR + operand + CAR, updating RR and CAR.
    pub fn add_with_carry(&mut self, operand: bool) {
        let sum = self.rr as u8 + operand as u8 + self.carry as u8;
        self.rr = sum & 1 != 0;
        self.carry = (sum >> 1) & 1 != 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_adder_truth_table() {
        for rr in [false, true] {
            for operand in [false, true] {
                for carry in [false, true] {
                    let mut regs = Registers { rr, carry, ..Registers::new() };
                    regs.add_with_carry(operand);

                    let total = rr as u8 + operand as u8 + carry as u8;
                    assert_eq!(regs.rr, total & 1 == 1);
                    assert_eq!(regs.carry, total >= 2);
                }
            }
        }
    }

    #[test]
    fn test_gated_by_ien() {
        let mut regs = Registers::new();
        assert!(!regs.gated(true));
        regs.ien = true;
        assert!(regs.gated(true));
        assert!(!regs.gated(false));
    }
}
