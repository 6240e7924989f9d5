//! Simple assembler for UE1 tapes.
//!
//! Syntax:
//! ```text
//! ; Comment
//!     ONE         ; RR := 1
//!     IEN RR      ; enable inputs
//!     LD IR1      ; load input bit 1
//!     STOC OR0    ; store complement to output 0
//!     NOPF        ; request input (or halt when last)
//!     HLT         ; same as NOPF
//! ```
//!
//! One instruction per line. A missing operand means SR0.

use crate::asm::tape::MAX_TAPE;
use crate::cpu::decode::{encode, parse_operand, Instruction, Opcode};
use thiserror::Error;

/// Assembled tape bytes plus a listing of every source line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Assembly {
    pub bytes: Vec<u8>,
    pub listing: Vec<String>,
}

/// Assemble source code to tape bytes.
pub fn assemble(source: &str) -> Result<Vec<u8>, AssemblerError> {
    assemble_with_listing(source).map(|assembly| assembly.bytes)
}

/// Assemble source code, also producing a listing.
pub fn assemble_with_listing(source: &str) -> Result<Assembly, AssemblerError> {
    let mut assembly = Assembly::default();

    for (line_num, line) in source.lines().enumerate() {
        let line_num = line_num + 1;
        let trimmed = line.trim();

        match parse_line(trimmed, line_num)? {
            Some(instr) => {
                let byte = encode(&instr);
                assembly.listing.push(format!(
                    "{:04X}: {:02X}        {:<8}{}",
                    assembly.bytes.len(), byte, line_num, trimmed
                ));
                assembly.bytes.push(byte);
            }
            None => {
                assembly.listing.push(format!("                {:<8}{}", line_num, trimmed));
            }
        }
    }

    if assembly.bytes.len() > MAX_TAPE {
        return Err(AssemblerError::TapeTooLong { size: assembly.bytes.len() });
    }

    Ok(assembly)
}

/// Parse one trimmed line; `None` for blank and comment-only lines.
fn parse_line(line: &str, line_num: usize) -> Result<Option<Instruction>, AssemblerError> {
    let code = match line.find(';') {
        Some(idx) => line[..idx].trim(),
        None => line,
    };

    let parts: Vec<&str> = code.split_whitespace().collect();
    let (mnemonic, operand) = match parts.as_slice() {
        [] => return Ok(None),
        [mnemonic] => (*mnemonic, "SR0"),
        [mnemonic, operand] => (*mnemonic, *operand),
        _ => {
            return Err(AssemblerError::SyntaxError {
                line: line_num,
                message: format!("unexpected '{}'", parts[2..].join(" ")),
            })
        }
    };

    let opcode = Opcode::from_mnemonic(mnemonic).ok_or_else(|| AssemblerError::UnknownMnemonic {
        line: line_num,
        mnemonic: mnemonic.to_uppercase(),
    })?;

    let addr = parse_operand(operand).ok_or_else(|| AssemblerError::UnknownOperand {
        line: line_num,
        operand: operand.to_uppercase(),
    })?;

    Ok(Some(Instruction::new(opcode, addr)))
}

/// Errors that can occur during assembly.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssemblerError {
    #[error("syntax error on line {line}: {message}")]
    SyntaxError { line: usize, message: String },

    #[error("unknown mnemonic on line {line}: {mnemonic}")]
    UnknownMnemonic { line: usize, mnemonic: String },

    #[error("unknown operand on line {line}: {operand}")]
    UnknownOperand { line: usize, operand: String },

    #[error("program is {size} instructions, tapes hold at most {}", MAX_TAPE)]
    TapeTooLong { size: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assemble_simple() {
        let source = r#"
            ; Enable I/O and halt
            ONE
            IEN RR
            OEN RR
            LD IR1
            STOC OR7
            HLT
        "#;

        let result = assemble(source).unwrap();
        assert_eq!(result, vec![0x40, 0xA8, 0xB8, 0x19, 0x9F, 0xF0]);
    }

    #[test]
    fn test_default_operand_and_case() {
        let result = assemble("nand\nsto sr3 ; trailing comment\nskz").unwrap();
        assert_eq!(result, vec![0x50, 0x83, 0xE0]);
    }

    #[test]
    fn test_listing() {
        let assembly = assemble_with_listing("; header\nONE\nSTO OR1").unwrap();
        assert_eq!(assembly.listing, vec![
            "                1       ; header",
            "0000: 40        2       ONE",
            "0001: 89        3       STO OR1",
        ]);
    }

    #[test]
    fn test_errors() {
        assert_eq!(
            assemble("ONE\nJMP SR0"),
            Err(AssemblerError::UnknownMnemonic { line: 2, mnemonic: "JMP".into() })
        );
        assert_eq!(
            assemble("LD IR0"),
            Err(AssemblerError::UnknownOperand { line: 1, operand: "IR0".into() })
        );
        assert!(matches!(
            assemble("LD SR1 SR2"),
            Err(AssemblerError::SyntaxError { line: 1, .. })
        ));
    }

    #[test]
    fn test_tape_too_long() {
        let source = "NOP0\n".repeat(MAX_TAPE + 1);
        assert_eq!(
            assemble(&source),
            Err(AssemblerError::TapeTooLong { size: MAX_TAPE + 1 })
        );
    }
}
