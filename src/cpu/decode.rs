//! Instruction decoder for the UE1.
//!
//! Every tape byte is one instruction: the high nibble selects one of
//! 16 opcodes and the low nibble is a memory address.

use serde::{Serialize, Deserialize};

/// The 16 UE1 opcodes, numbered by their high-nibble value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Opcode {
    /// No operation (0x0)
    Nop0,
    /// RR := [addr]
    Ld,
    /// RR, CAR := RR + [addr] + CAR
    Add,
    /// RR, CAR := RR + ![addr] + CAR
    Sub,
    /// RR := 1, CAR := 0
    One,
    /// RR := !(RR & [addr])
    Nand,
    /// RR := RR | [addr]
    Or,
    /// RR := RR ^ [addr]
    Xor,
    /// [addr] := RR
    Sto,
    /// [addr] := !RR
    Stoc,
    /// IEN := [addr]
    Ien,
    /// OEN := [addr]
    Oen,
    /// I/O control pulse (rings the bell on real hardware)
    Ioc,
    /// Skip the next instruction unconditionally
    Rtn,
    /// Skip the next instruction if RR is zero
    Skz,
    /// Request input, or halt when it is the last instruction on the tape (0xF)
    Nopf,
}

impl Opcode {
    /// All opcodes in encoding order.
    pub const ALL: [Opcode; 16] = [
        Opcode::Nop0, Opcode::Ld, Opcode::Add, Opcode::Sub,
        Opcode::One, Opcode::Nand, Opcode::Or, Opcode::Xor,
        Opcode::Sto, Opcode::Stoc, Opcode::Ien, Opcode::Oen,
        Opcode::Ioc, Opcode::Rtn, Opcode::Skz, Opcode::Nopf,
    ];

    /// Decode an opcode from the low 4 bits of `nibble`.
    pub fn from_nibble(nibble: u8) -> Self {
        Self::ALL[(nibble & 0x0F) as usize]
    }

    /// The 4-bit encoding of this opcode.
    pub fn nibble(self) -> u8 {
        self as u8
    }

    /// Assembler mnemonic.
    pub fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Nop0 => "NOP0",
            Opcode::Ld => "LD",
            Opcode::Add => "ADD",
            Opcode::Sub => "SUB",
            Opcode::One => "ONE",
            Opcode::Nand => "NAND",
            Opcode::Or => "OR",
            Opcode::Xor => "XOR",
            Opcode::Sto => "STO",
            Opcode::Stoc => "STOC",
            Opcode::Ien => "IEN",
            Opcode::Oen => "OEN",
            Opcode::Ioc => "IOC",
            Opcode::Rtn => "RTN",
            Opcode::Skz => "SKZ",
            Opcode::Nopf => "NOPF",
        }
    }

    /// Look up a mnemonic (case-insensitive). `HLT` is accepted for NOPF.
    pub fn from_mnemonic(text: &str) -> Option<Self> {
        let upper = text.to_ascii_uppercase();
        if upper == "HLT" {
            return Some(Opcode::Nopf);
        }
        Self::ALL.into_iter().find(|op| op.mnemonic() == upper)
    }

    /// Whether the instruction does anything with its address nibble.
    pub fn uses_operand(self) -> bool {
        matches!(
            self,
            Opcode::Ld | Opcode::Add | Opcode::Sub | Opcode::Nand | Opcode::Or
                | Opcode::Xor | Opcode::Sto | Opcode::Stoc | Opcode::Ien | Opcode::Oen
        )
    }

    /// Whether the operand is a write target rather than a read source.
    pub fn writes_memory(self) -> bool {
        matches!(self, Opcode::Sto | Opcode::Stoc)
    }
}

/// A decoded tape byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    pub opcode: Opcode,
    /// Memory address, 0-15.
    pub addr: u8,
}

impl Instruction {
    /// Build an instruction, masking the address to 4 bits.
    pub fn new(opcode: Opcode, addr: u8) -> Self {
        Self { opcode, addr: addr & 0x0F }
    }
}

/// Decode a tape byte. Every byte is a valid instruction.
pub fn decode(byte: u8) -> Instruction {
    Instruction {
        opcode: Opcode::from_nibble(byte >> 4),
        addr: byte & 0x0F,
    }
}

/// Encode an instruction back to a tape byte.
pub fn encode(instr: &Instruction) -> u8 {
    (instr.opcode.nibble() << 4) | (instr.addr & 0x0F)
}

/// Name of an address when it is read from (SRn, RR, IRn).
pub fn read_operand_name(addr: u8) -> String {
    match addr & 0x0F {
        a @ 0..=7 => format!("SR{}", a),
        8 => "RR".to_string(),
        a => format!("IR{}", a & 0x07),
    }
}

/// Name of an address when it is written to (SRn, ORn).
pub fn write_operand_name(addr: u8) -> String {
    match addr & 0x0F {
        a @ 0..=7 => format!("SR{}", a),
        a => format!("OR{}", a & 0x07),
    }
}

/// Parse an operand name (case-insensitive) to its address.
pub fn parse_operand(text: &str) -> Option<u8> {
    let upper = text.to_ascii_uppercase();
    if upper == "RR" {
        return Some(8);
    }

    let (bank, index) = (upper.get(..2)?, upper.get(2..)?);
    let index: u8 = match index.as_bytes() {
        [d @ b'0'..=b'7'] => d - b'0',
        _ => return None,
    };

    match bank {
        "SR" => Some(index),
        "OR" => Some(8 + index),
        "IR" if index > 0 => Some(8 + index),
        _ => None,
    }
}
