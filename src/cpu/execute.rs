//! CPU execution engine for the UE1.
//!
//! Implements the fetch-decode-execute cycle and all instruction behaviors.

use crate::asm::tape::Tape;
use crate::cpu::{Memory, Registers};
use crate::cpu::decode::{self, Instruction, Opcode};
use crate::harness::feed::InputFeed;
use serde::{Serialize, Deserialize};

/// What a single fetch did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepKind {
    /// The instruction was executed.
    Executed,
    /// The skip latch was set; the instruction had no effect.
    Skipped,
    /// NOPF before the end of the tape: new input bits are wanted.
    InputRequest,
    /// NOPF as the last instruction on the tape.
    Halt,
}

/// Record of one fetched instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    /// Tape address the instruction was fetched from.
    pub pc: usize,
    pub instr: Instruction,
    pub kind: StepKind,
}

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunEnd {
    /// NOPF coincided with the tape wrapping around.
    Halted,
    /// The input feed had nothing more to give.
    EndOfInput,
    /// The configured instruction limit was reached.
    CycleLimit,
}

/// The UE1 CPU.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cpu {
    /// CPU registers.
    pub regs: Registers,
    /// Register file.
    pub mem: Memory,
    /// Index of the next tape byte to fetch.
    pub pc: usize,
    /// Instructions fetched so far, skipped ones included.
    pub cycles: u64,
}

impl Cpu {
    /// Create a new CPU with zeroed state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch and execute a single instruction.
    ///
    /// NOPF is reported back rather than acted upon: the caller decides
    /// whether to feed inputs or stop.
    pub fn step(&mut self, tape: &Tape) -> Step {
        let pc = self.pc;
        let instr = decode::decode(tape.fetch(pc));

        self.pc += 1;
        let wrapped = self.pc >= tape.len();
        if wrapped {
            self.pc = 0;
        }
        self.cycles += 1;

        if self.regs.skip {
            self.regs.skip = false;
            return Step { pc, instr, kind: StepKind::Skipped };
        }

        // Operand fetch happens before dispatch, NOPF included.
        let data_in = self.mem.read(instr.addr, self.regs.rr);

        let kind = if instr.opcode == Opcode::Nopf {
            if wrapped { StepKind::Halt } else { StepKind::InputRequest }
        } else {
            self.execute(instr, data_in);
            StepKind::Executed
        };

        Step { pc, instr, kind }
    }

    /// Run until halt, end of input, or the cycle limit.
    pub fn run<F>(&mut self, tape: &Tape, feed: &mut F, max_cycles: Option<u64>) -> RunEnd
    where
        F: InputFeed + ?Sized,
    {
        self.run_with(tape, feed, max_cycles, |_, _| {})
    }

    /// Like [`Cpu::run`], calling `on_step` after every fetch.
    pub fn run_with<F, T>(
        &mut self,
        tape: &Tape,
        feed: &mut F,
        max_cycles: Option<u64>,
        mut on_step: T,
    ) -> RunEnd
    where
        F: InputFeed + ?Sized,
        T: FnMut(&Step, &Cpu),
    {
        loop {
            if max_cycles.is_some_and(|limit| self.cycles >= limit) {
                return RunEnd::CycleLimit;
            }

            let step = self.step(tape);
            on_step(&step, self);

            match step.kind {
                StepKind::Halt => return RunEnd::Halted,
                StepKind::InputRequest => match feed.next_inputs() {
                    Some(inputs) => self.mem.latch_inputs(inputs),
                    None => return RunEnd::EndOfInput,
                },
                StepKind::Executed | StepKind::Skipped => {}
            }
        }
    }

    /// Apply one instruction to the processor state.
    ///
    /// `data_in` is the bit already read from `instr.addr`. NOPF is a
    /// no-op here; the run loop handles it.
    pub fn execute(&mut self, instr: Instruction, data_in: bool) {
        let regs = &mut self.regs;

        match instr.opcode {
            Opcode::Nop0 | Opcode::Ioc | Opcode::Nopf => {}

            Opcode::Ld => {
                regs.rr = regs.gated(data_in);
            }

            Opcode::Add => {
                let operand = regs.gated(data_in);
                regs.add_with_carry(operand);
            }

            Opcode::Sub => {
                let operand = !regs.gated(data_in);
                regs.add_with_carry(operand);
            }

            Opcode::One => {
                regs.rr = true;
                regs.carry = false;
            }

            Opcode::Nand => {
                regs.rr = !(regs.rr && regs.gated(data_in));
            }

            Opcode::Or => {
                regs.rr = regs.rr || regs.gated(data_in);
            }

            Opcode::Xor => {
                regs.rr ^= regs.gated(data_in);
            }

            Opcode::Sto => {
                if regs.oen {
                    self.mem.write(instr.addr, regs.rr);
                }
            }

            Opcode::Stoc => {
                if regs.oen {
                    self.mem.write(instr.addr, !regs.rr);
                }
            }

            Opcode::Ien => {
                regs.ien = data_in;
            }

            Opcode::Oen => {
                regs.oen = data_in;
            }

            Opcode::Rtn => {
                regs.skip = true;
            }

            Opcode::Skz => {
                regs.skip = !regs.rr;
            }
        }
    }

    /// Pure form of [`Cpu::execute`].
    pub fn transition(mut self, instr: Instruction, data_in: bool) -> Self {
        self.execute(instr, data_in);
        self
    }
}

impl std::fmt::Debug for Cpu {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cpu")
            .field("pc", &self.pc)
            .field("cycles", &self.cycles)
            .field("regs", &self.regs)
            .field("mem", &self.mem)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::decode::encode;
    use crate::harness::feed::ScriptedFeed;
    use proptest::prelude::*;

    fn make_tape(instructions: &[(Opcode, u8)]) -> Tape {
        let bytes: Vec<u8> = instructions
            .iter()
            .map(|&(op, addr)| encode(&Instruction::new(op, addr)))
            .collect();
        Tape::from_bytes(bytes).unwrap()
    }

    fn enabled_cpu() -> Cpu {
        let mut cpu = Cpu::new();
        cpu.regs.ien = true;
        cpu.regs.oen = true;
        cpu
    }

    fn arb_opcode() -> impl Strategy<Value = Opcode> {
        (0u8..16).prop_map(Opcode::from_nibble)
    }

    fn arb_cpu() -> impl Strategy<Value = Cpu> {
        (any::<[bool; 4]>(), any::<u8>(), any::<u8>()).prop_map(|(flags, store, out)| {
            let mut cpu = Cpu::new();
            cpu.regs = Registers {
                rr: flags[0],
                carry: flags[1],
                ien: flags[2],
                oen: flags[3],
                skip: false,
            };
            for i in 0..8u8 {
                cpu.mem.write(i, (store >> i) & 1 != 0);
                cpu.mem.write(8 + i, (out >> i) & 1 != 0);
            }
            cpu
        })
    }

    #[test]
    fn test_halt_tape() {
        let tape = make_tape(&[(Opcode::Nopf, 0)]);
        let mut cpu = Cpu::new();
        let end = cpu.run(&tape, &mut ScriptedFeed::new(&[]), None);

        assert_eq!(end, RunEnd::Halted);
        assert_eq!(cpu.cycles, 1);
        assert_eq!(cpu.mem.register_dump(), "0000 0000 0000 0000");
    }

    #[test]
    fn test_nopf_before_end_requests_input() {
        let tape = make_tape(&[
            (Opcode::Nopf, 0),
            (Opcode::Nopf, 0),
        ]);
        let mut cpu = Cpu::new();

        assert_eq!(cpu.step(&tape).kind, StepKind::InputRequest);
        assert_eq!(cpu.step(&tape).kind, StepKind::Halt);
        assert_eq!(cpu.pc, 0);
    }

    #[test]
    fn test_input_latch_and_end_of_input() {
        let tape = make_tape(&[
            (Opcode::Nopf, 0),
            (Opcode::Nop0, 0),
            (Opcode::Nopf, 0),
        ]);
        let mut cpu = Cpu::new();
        let end = cpu.run(&tape, &mut ScriptedFeed::new(&[0b101]), None);

        assert_eq!(end, RunEnd::Halted);
        assert!(cpu.mem.input(1));
        assert!(!cpu.mem.input(2));
        assert!(cpu.mem.input(3));

        let mut cpu = Cpu::new();
        let end = cpu.run(&tape, &mut ScriptedFeed::new(&[]), None);
        assert_eq!(end, RunEnd::EndOfInput);
    }

    #[test]
    fn test_cycle_limit() {
        // No NOPF anywhere, so the tape loops forever.
        let tape = make_tape(&[(Opcode::Nop0, 0), (Opcode::One, 0)]);
        let mut cpu = Cpu::new();
        let end = cpu.run(&tape, &mut ScriptedFeed::new(&[]), Some(25));

        assert_eq!(end, RunEnd::CycleLimit);
        assert_eq!(cpu.cycles, 25);
    }

    #[test]
    fn test_load_store() {
        let tape = make_tape(&[
            (Opcode::One, 0),
            (Opcode::Ien, 8),
            (Opcode::Oen, 8),
            (Opcode::Sto, 3),
            (Opcode::Stoc, 0x0A),
            (Opcode::Nopf, 0),
        ]);
        let mut cpu = Cpu::new();
        cpu.run(&tape, &mut ScriptedFeed::new(&[]), None);

        assert!(cpu.regs.ien);
        assert!(cpu.regs.oen);
        assert!(cpu.mem.store(3));
        assert!(!cpu.mem.output(2));
        assert_eq!(cpu.mem.register_dump(), "0000 1000 0000 0000");
    }

    #[test]
    fn test_add_and_sub_carry() {
        let mut cpu = enabled_cpu();
        cpu.mem.write(0, true);

        // 1 + 1 = 10
        cpu.regs.rr = true;
        cpu.execute(Instruction::new(Opcode::Add, 0), true);
        assert!(!cpu.regs.rr);
        assert!(cpu.regs.carry);

        // 0 - 0 with carry-in set: 0 + 1 + 1 = 10
        let mut cpu = enabled_cpu();
        cpu.regs.carry = true;
        cpu.execute(Instruction::new(Opcode::Sub, 0), false);
        assert!(!cpu.regs.rr);
        assert!(cpu.regs.carry);
    }

    #[test]
    fn test_one_clears_carry() {
        let mut cpu = Cpu::new();
        cpu.regs.carry = true;
        cpu.execute(Instruction::new(Opcode::One, 5), false);
        assert!(cpu.regs.rr);
        assert!(!cpu.regs.carry);
    }

    #[test]
    fn test_logic_ops() {
        let cases = [
            (Opcode::Nand, true, true, false),
            (Opcode::Nand, true, false, true),
            (Opcode::Or, false, true, true),
            (Opcode::Or, false, false, false),
            (Opcode::Xor, true, true, false),
            (Opcode::Xor, false, true, true),
        ];
        for (op, rr, data_in, expected) in cases {
            let mut cpu = enabled_cpu();
            cpu.regs.rr = rr;
            cpu.execute(Instruction::new(op, 0), data_in);
            assert_eq!(cpu.regs.rr, expected, "{:?} rr={} in={}", op, rr, data_in);
        }
    }

    #[test]
    fn test_rtn_skips_exactly_one() {
        let tape = make_tape(&[
            (Opcode::Rtn, 0),
            (Opcode::One, 0),
            (Opcode::Nop0, 0),
            (Opcode::Nopf, 0),
        ]);
        let mut cpu = Cpu::new();

        assert_eq!(cpu.step(&tape).kind, StepKind::Executed);
        assert!(cpu.regs.skip);
        assert_eq!(cpu.step(&tape).kind, StepKind::Skipped);
        assert!(!cpu.regs.skip);
        assert!(!cpu.regs.rr);
        assert_eq!(cpu.step(&tape).kind, StepKind::Executed);
    }

    #[test]
    fn test_skipped_nopf_at_end_does_not_halt() {
        let tape = make_tape(&[
            (Opcode::Xor, 0),
            (Opcode::Skz, 0),
            (Opcode::Rtn, 0),
            (Opcode::Nopf, 0),
        ]);
        let mut cpu = enabled_cpu();
        cpu.mem.write(0, true);
        let end = cpu.run(&tape, &mut ScriptedFeed::new(&[]), None);

        // First pass RR is 1 and RTN skips the halt; second pass SKZ skips RTN.
        assert_eq!(end, RunEnd::Halted);
        assert_eq!(cpu.cycles, 8);
    }

    #[test]
    fn test_skz() {
        let tape = make_tape(&[
            (Opcode::Skz, 0),
            (Opcode::One, 0),
            (Opcode::Nopf, 0),
        ]);
        let mut cpu = Cpu::new();
        cpu.run(&tape, &mut ScriptedFeed::new(&[]), None);
        assert!(!cpu.regs.rr);

        let mut cpu = Cpu::new();
        cpu.regs.rr = true;
        cpu.run(&tape, &mut ScriptedFeed::new(&[]), None);
        assert!(cpu.regs.rr);
        assert!(!cpu.regs.skip);
    }

    proptest! {
        #[test]
        fn prop_ien_low_reads_zero(cpu in arb_cpu(), op in arb_opcode(), data_in in any::<bool>()) {
            prop_assume!(matches!(
                op,
                Opcode::Ld | Opcode::Add | Opcode::Sub | Opcode::Nand | Opcode::Or | Opcode::Xor
            ));
            let cpu = Cpu { regs: Registers { ien: false, ..cpu.regs }, ..cpu };
            let instr = Instruction::new(op, 0);

            let actual = cpu.clone().transition(instr, data_in);
            let expected = cpu.transition(instr, false);
            prop_assert_eq!(actual, expected);
        }

        #[test]
        fn prop_oen_low_blocks_writes(cpu in arb_cpu(), stoc in any::<bool>(), addr in 0u8..16) {
            let cpu = Cpu { regs: Registers { oen: false, ..cpu.regs }, ..cpu };
            let op = if stoc { Opcode::Stoc } else { Opcode::Sto };

            let after = cpu.clone().transition(Instruction::new(op, addr), false);
            prop_assert_eq!(after, cpu);
        }

        #[test]
        fn prop_skipped_instruction_is_inert(cpu in arb_cpu(), byte in any::<u8>()) {
            let tape = Tape::from_bytes(vec![0xD0, byte, 0x00, 0xF0]).unwrap();
            let mut cpu = cpu;
            cpu.step(&tape);
            prop_assert!(cpu.regs.skip);

            let before = cpu.clone();
            let step = cpu.step(&tape);
            prop_assert_eq!(step.kind, StepKind::Skipped);
            prop_assert!(!cpu.regs.skip);
            prop_assert_eq!(cpu.regs, Registers { skip: false, ..before.regs });
            prop_assert_eq!(cpu.mem, before.mem);
        }

        #[test]
        fn prop_skz_skips_iff_rr_zero(cpu in arb_cpu()) {
            let rr = cpu.regs.rr;
            let after = cpu.transition(Instruction::new(Opcode::Skz, 0), false);
            prop_assert_eq!(after.regs.skip, !rr);
        }
    }
}
