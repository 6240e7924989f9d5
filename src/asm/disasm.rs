//! Disassembler for UE1 tapes.
//!
//! Converts tape bytes back to assembler source.

use crate::cpu::decode::{decode, read_operand_name, write_operand_name, Instruction};

/// Disassemble a single tape byte to text.
pub fn disassemble_instruction(byte: u8) -> String {
    format_instruction(&decode(byte))
}

/// Disassemble a whole tape.
pub fn disassemble(bytes: &[u8]) -> String {
    let mut output = String::new();
    output.push_str("; UE1 Disassembly\n");
    output.push_str("; ---------------\n\n");

    for (addr, byte) in bytes.iter().enumerate() {
        let line = disassemble_instruction(*byte);
        output.push_str(&format!("{:<12}; {:04X}: {:02X}\n", line, addr, byte));
    }

    output
}

/// Format a decoded instruction as assembly text.
///
/// Instructions that ignore their address only show it when it is not SR0,
/// so the output always reassembles to the same byte.
fn format_instruction(instr: &Instruction) -> String {
    let mnemonic = instr.opcode.mnemonic();

    if instr.opcode.writes_memory() {
        format!("{} {}", mnemonic, write_operand_name(instr.addr))
    } else if instr.opcode.uses_operand() || instr.addr != 0 {
        format!("{} {}", mnemonic, read_operand_name(instr.addr))
    } else {
        mnemonic.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asm::assembler::assemble;

    #[test]
    fn test_disassemble_halt() {
        assert_eq!(disassemble_instruction(0xF0), "NOPF");
    }

    #[test]
    fn test_disassemble_operands() {
        assert_eq!(disassemble_instruction(0x19), "LD IR1");
        assert_eq!(disassemble_instruction(0xA8), "IEN RR");
        assert_eq!(disassemble_instruction(0x98), "STOC OR0");
        assert_eq!(disassemble_instruction(0x83), "STO SR3");
        assert_eq!(disassemble_instruction(0x40), "ONE");
        assert_eq!(disassemble_instruction(0xD5), "RTN SR5");
    }

    #[test]
    fn test_reassembles_every_byte() {
        for byte in 0..=u8::MAX {
            let text = disassemble_instruction(byte);
            assert_eq!(assemble(&text).unwrap(), vec![byte], "{}", text);
        }
    }

    #[test]
    fn test_disassemble_listing() {
        let text = disassemble(&[0x40, 0xF0]);
        assert!(text.contains("ONE         ; 0000: 40"));
        assert!(text.contains("NOPF        ; 0001: F0"));
        // The listing itself is valid source.
        assert_eq!(assemble(&text).unwrap(), vec![0x40, 0xF0]);
    }
}
