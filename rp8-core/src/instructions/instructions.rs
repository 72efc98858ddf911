use super::Instruction;
use crate::constants::{fpu, operate, WORD_MASK};
use crate::cpu::Cpu;
use crate::fpu::FloatingPoint;
use crate::utils::{add_12, bit};
use log::warn;

/// Memory-reference instructions (opcodes 0..5). Each handler resolves
/// its effective address exactly once and returns its clock charge.
pub trait MemoryReference {
    fn and(&mut self, cmd: &Instruction) -> u16;
    fn tad(&mut self, cmd: &Instruction) -> u16;
    fn isz(&mut self, cmd: &Instruction) -> u16;
    fn dca(&mut self, cmd: &Instruction) -> u16;
    fn jms(&mut self, cmd: &Instruction) -> u16;
    fn jmp(&mut self, cmd: &Instruction) -> u16;
}

impl MemoryReference for Cpu {
    fn and(&mut self, cmd: &Instruction) -> u16 {
        let (ea, penalty) = self.resolve_address(cmd);
        self.ac &= self.mem.read(ea);
        cmd.clocks + penalty
    }

    fn tad(&mut self, cmd: &Instruction) -> u16 {
        // 13-bit sum of AC, the operand, and the incoming link; the
        // carry becomes the new link
        let (ea, penalty) = self.resolve_address(cmd);
        let (carry, sum) = add_12(self.ac, self.mem.read(ea), self.link);
        self.link = carry;
        self.ac = sum;
        cmd.clocks + penalty
    }

    fn isz(&mut self, cmd: &Instruction) -> u16 {
        let (ea, penalty) = self.resolve_address(cmd);
        let bumped = (self.mem.read(ea) + 1) & WORD_MASK;
        self.mem.write(ea, bumped);
        if bumped == 0 {
            self.pc = (self.pc + 1) & WORD_MASK;
        }
        cmd.clocks + penalty
    }

    fn dca(&mut self, cmd: &Instruction) -> u16 {
        let (ea, penalty) = self.resolve_address(cmd);
        let value = self.ac;
        self.mem.write(ea, value);
        self.ac = 0;
        cmd.clocks + penalty
    }

    fn jms(&mut self, cmd: &Instruction) -> u16 {
        // PC already stepped past the JMS at fetch, so it is the return
        // address to plant at the subroutine entry
        let (ea, penalty) = self.resolve_address(cmd);
        let return_address = self.pc;
        self.mem.write(ea, return_address);
        self.pc = (ea + 1) & WORD_MASK;
        cmd.clocks + penalty
    }

    fn jmp(&mut self, cmd: &Instruction) -> u16 {
        let (ea, penalty) = self.resolve_address(cmd);
        self.pc = ea;
        cmd.clocks + penalty
    }
}

/// The operate group (opcode 7). The microinstruction bits are decoded
/// as a set and applied in the fixed hardware order, never as mutually
/// exclusive cases.
pub trait Operate {
    fn opr(&mut self, cmd: &Instruction) -> u16;
}

impl Operate for Cpu {
    fn opr(&mut self, cmd: &Instruction) -> u16 {
        if cmd.word & operate::GROUP_BIT == 0 {
            self.operate_group1(cmd);
            cmd.clocks
        } else if cmd.word & operate::GROUP3_BIT == 0 {
            self.operate_group2(cmd);
            cmd.clocks
        } else {
            // Group 3 drives the EAE, which this machine does not have
            warn!(
                "group 3 microinstruction {:04o} at {:04o}",
                cmd.word, cmd.pc
            );
            0
        }
    }
}

impl Cpu {
    /// Group 1: clear, complement, increment, rotate. Order matters when
    /// several bits are set at once.
    fn operate_group1(&mut self, cmd: &Instruction) {
        let word = cmd.word;
        if word & operate::CLA != 0 {
            self.ac = 0;
        }
        if word & operate::CLL != 0 {
            self.link = 0;
        }
        if word & operate::CMA != 0 {
            self.ac = !self.ac & WORD_MASK;
        }
        if word & operate::CML != 0 {
            self.link ^= 1;
        }
        if word & operate::IAC != 0 {
            // 13-bit increment of (L, AC)
            let (carry, sum) = add_12(self.ac, 1, 0);
            self.ac = sum;
            self.link ^= carry;
        }
        match (word >> operate::ROTATE_SHIFT) & operate::ROTATE_MASK {
            operate::ROTATE_NOP => {}
            operate::ROTATE_BSW => {
                self.ac = ((self.ac & 0o77) << 6) | (self.ac >> 6);
            }
            operate::ROTATE_RAL => self.rotate_left(1),
            operate::ROTATE_RTL => self.rotate_left(2),
            operate::ROTATE_RAR => self.rotate_right(1),
            operate::ROTATE_RTR => self.rotate_right(2),
            code => warn!("unsupported rotate code {} at {:04o}", code, cmd.pc),
        }
    }

    /// Group 2: conditional skip, then clear, switch read, halt.
    fn operate_group2(&mut self, cmd: &Instruction) {
        let word = cmd.word;
        let negative = bit(self.ac, 0) != 0;

        // With the invert-sense bit the conditions read SPA/SNA/SZL:
        // the skip starts true and any enabled, failing condition
        // clears it
        let skip = if word & operate::INVERT_SENSE == 0 {
            (word & operate::SNL != 0 && self.link != 0)
                || (word & operate::SZA != 0 && self.ac == 0)
                || (word & operate::SMA != 0 && negative)
        } else {
            let mut skip = true;
            if word & operate::SNL != 0 && self.link != 0 {
                skip = false;
            }
            if word & operate::SZA != 0 && self.ac == 0 {
                skip = false;
            }
            if word & operate::SMA != 0 && negative {
                skip = false;
            }
            skip
        };
        if skip {
            self.pc = (self.pc + 1) & WORD_MASK;
        }

        if word & operate::CLA != 0 {
            self.ac = 0;
        }
        if word & operate::OSR != 0 {
            self.ac |= self.sr;
        }
        if word & operate::HLT != 0 {
            self.running = false;
        }
    }

    /// 13-bit left rotation of (L, AC).
    fn rotate_left(&mut self, count: u32) {
        let mut combined = (self.link << 12) | self.ac;
        for _ in 0..count {
            combined = ((combined << 1) | (combined >> 12)) & 0o17777;
        }
        self.link = combined >> 12;
        self.ac = combined & WORD_MASK;
    }

    /// 13-bit right rotation of (L, AC).
    fn rotate_right(&mut self, count: u32) {
        let mut combined = (self.link << 12) | self.ac;
        for _ in 0..count {
            combined = ((combined >> 1) | ((combined & 1) << 12)) & 0o17777;
        }
        self.link = combined >> 12;
        self.ac = combined & WORD_MASK;
    }
}

/// I/O transfer (opcode 6). Only the floating-point device is wired up;
/// anything else is reported and charged nothing.
pub trait InputOutput {
    fn iot(&mut self, cmd: &Instruction) -> u16;
}

impl InputOutput for Cpu {
    fn iot(&mut self, cmd: &Instruction) -> u16 {
        if cmd.device() != fpu::DEVICE_CODE {
            warn!(
                "unsupported I/O device {:02o} at {:04o}",
                cmd.device(),
                cmd.pc
            );
            return 0;
        }
        match cmd.extended_op() {
            fpu::OP_CLEAR => self.fpclac(cmd),
            fpu::OP_LOAD => self.fpload(cmd),
            fpu::OP_STORE => self.fpstor(cmd),
            fpu::OP_ADD => self.fpadd(cmd),
            fpu::OP_MULT => self.fpmult(cmd),
            code => {
                warn!(
                    "unsupported floating-point operation {} at {:04o}",
                    code, cmd.pc
                );
                0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::Memory;

    fn cpu_with_program(origin: u16, words: &[u16]) -> Cpu {
        let mut mem = Memory::new();
        for (index, &word) in words.iter().enumerate() {
            mem.write(origin + index as u16, word);
        }
        let mut cpu = Cpu::new(mem);
        cpu.pc = origin;
        cpu
    }

    fn run_until_halt(cpu: &mut Cpu) {
        let mut fuse = 0;
        while cpu.running {
            cpu.step();
            fuse += 1;
            assert!(fuse < 10_000, "program did not halt");
        }
    }

    #[test]
    fn add_two_constants() {
        // CLA CLL / TAD 250 / TAD 251 / DCA 252 / HLT / JMP 200
        let mut cpu = cpu_with_program(
            0o200,
            &[0o7300, 0o1250, 0o1251, 0o3252, 0o7402, 0o5200],
        );
        cpu.mem.write(0o250, 2);
        cpu.mem.write(0o251, 3);
        run_until_halt(&mut cpu);
        assert_eq!(cpu.mem.read(0o252), 5);
        assert_eq!(cpu.ac, 0);
        assert_eq!(cpu.link, 0);
        assert_eq!(cpu.counters.instructions(0o1), 2);
        assert_eq!(cpu.counters.instructions(0o3), 1);
        assert!(cpu.counters.instructions(0o7) >= 2);
        assert_eq!(cpu.counters.total_clocks(), 8);
    }

    #[test]
    fn tad_carry_toggles_link() {
        let mut cpu = cpu_with_program(0o200, &[0o1250]);
        cpu.mem.write(0o250, 1);
        cpu.ac = 0o7777;
        cpu.step();
        assert_eq!(cpu.ac, 0);
        assert_eq!(cpu.link, 1);
    }

    #[test]
    fn tad_folds_incoming_link_into_sum() {
        let mut cpu = cpu_with_program(0o200, &[0o1250]);
        cpu.mem.write(0o250, 0o10);
        cpu.ac = 0o5;
        cpu.link = 1;
        cpu.step();
        assert_eq!(cpu.ac, 0o16);
        assert_eq!(cpu.link, 0);
    }

    #[test]
    fn isz_skips_when_cell_wraps_to_zero() {
        let mut cpu = cpu_with_program(0o200, &[0o2300, 0o7402, 0o7402]);
        cpu.mem.write(0o300, 0o7777);
        cpu.step();
        assert_eq!(cpu.mem.read(0o300), 0);
        assert_eq!(cpu.pc, 0o202); // the word after the ISZ was skipped
    }

    #[test]
    fn isz_without_wrap_does_not_skip() {
        let mut cpu = cpu_with_program(0o200, &[0o2300]);
        cpu.mem.write(0o300, 0o5);
        cpu.step();
        assert_eq!(cpu.mem.read(0o300), 0o6);
        assert_eq!(cpu.pc, 0o201);
    }

    #[test]
    fn dca_then_tad_restores_accumulator() {
        let mut cpu = cpu_with_program(0o200, &[0o3250, 0o1250, 0o7402]);
        cpu.ac = 0o1234;
        run_until_halt(&mut cpu);
        assert_eq!(cpu.ac, 0o1234);
        assert_eq!(cpu.link, 0);
        assert_eq!(cpu.mem.read(0o250), 0o1234);
    }

    #[test]
    fn jms_plants_return_address() {
        let mut cpu = cpu_with_program(0o200, &[0o4250]);
        cpu.step();
        assert_eq!(cpu.mem.read(0o250), 0o201);
        assert_eq!(cpu.pc, 0o251);
    }

    #[test]
    fn rotate_left_through_link() {
        // RAL twice walks the sign bit through L and back in at the bottom
        let mut cpu = cpu_with_program(0o200, &[0o7004, 0o7004]);
        cpu.ac = 0o4000;
        cpu.step();
        assert_eq!((cpu.link, cpu.ac), (1, 0));
        cpu.step();
        assert_eq!((cpu.link, cpu.ac), (0, 1));
    }

    #[test]
    fn double_rotates_match_two_singles() {
        for &(ac, link) in &[(0o1234u16, 0u16), (0o4001, 1), (0o7777, 0), (0, 1)] {
            let mut twice = cpu_with_program(0o200, &[0o7004, 0o7004]);
            twice.ac = ac;
            twice.link = link;
            twice.step();
            twice.step();

            let mut once = cpu_with_program(0o200, &[0o7006]); // RTL
            once.ac = ac;
            once.link = link;
            once.step();
            assert_eq!((once.link, once.ac), (twice.link, twice.ac));

            let mut twice = cpu_with_program(0o200, &[0o7010, 0o7010]);
            twice.ac = ac;
            twice.link = link;
            twice.step();
            twice.step();

            let mut once = cpu_with_program(0o200, &[0o7012]); // RTR
            once.ac = ac;
            once.link = link;
            once.step();
            assert_eq!((once.link, once.ac), (twice.link, twice.ac));
        }
    }

    #[test]
    fn bsw_swaps_the_halves() {
        let mut cpu = cpu_with_program(0o200, &[0o7002]);
        cpu.ac = 0o1234;
        cpu.step();
        assert_eq!(cpu.ac, 0o3412);
    }

    #[test]
    fn cla_cma_loads_all_ones() {
        let mut cpu = cpu_with_program(0o200, &[0o7240]);
        cpu.ac = 0o123;
        cpu.step();
        assert_eq!(cpu.ac, 0o7777);
    }

    #[test]
    fn cma_twice_is_identity() {
        let mut cpu = cpu_with_program(0o200, &[0o7040, 0o7040]);
        cpu.ac = 0o2741;
        cpu.step();
        assert_eq!(cpu.ac, 0o5036);
        cpu.step();
        assert_eq!(cpu.ac, 0o2741);
    }

    #[test]
    fn cml_twice_is_identity() {
        let mut cpu = cpu_with_program(0o200, &[0o7020, 0o7020]);
        cpu.step();
        assert_eq!(cpu.link, 1);
        cpu.step();
        assert_eq!(cpu.link, 0);
    }

    #[test]
    fn iac_carries_into_link() {
        let mut cpu = cpu_with_program(0o200, &[0o7001]);
        cpu.ac = 0o7777;
        cpu.step();
        assert_eq!(cpu.ac, 0);
        assert_eq!(cpu.link, 1);
    }

    #[test]
    fn or_group_skips() {
        // SZA skips only on a zero accumulator
        for &(ac, expect) in &[(0u16, true), (0o5u16, false)] {
            let mut cpu = cpu_with_program(0o200, &[0o7440]);
            cpu.ac = ac;
            cpu.step();
            assert_eq!(cpu.pc == 0o202, expect, "SZA with ac={:o}", ac);
        }
        // SNL skips only on a set link
        for &(link, expect) in &[(1u16, true), (0u16, false)] {
            let mut cpu = cpu_with_program(0o200, &[0o7420]);
            cpu.link = link;
            cpu.step();
            assert_eq!(cpu.pc == 0o202, expect, "SNL with link={}", link);
        }
        // SMA skips only on a negative accumulator
        for &(ac, expect) in &[(0o4000u16, true), (0o3777u16, false)] {
            let mut cpu = cpu_with_program(0o200, &[0o7500]);
            cpu.ac = ac;
            cpu.step();
            assert_eq!(cpu.pc == 0o202, expect, "SMA with ac={:o}", ac);
        }
    }

    #[test]
    fn and_group_skips_iff_all_enabled_conditions_hold() {
        // SPA SNA SZL: skip only when AC is positive, nonzero, and L clear
        let cases = [
            (0o0000u16, 0u16),
            (0o0001, 0),
            (0o4000, 0),
            (0o0001, 1),
            (0o4000, 1),
            (0o0000, 1),
        ];
        for &(ac, link) in &cases {
            let mut cpu = cpu_with_program(0o200, &[0o7570]);
            cpu.ac = ac;
            cpu.link = link;
            cpu.step();
            let expect = ac != 0 && ac & 0o4000 == 0 && link == 0;
            assert_eq!(cpu.pc == 0o202, expect, "ac={:o} link={}", ac, link);
        }
    }

    #[test]
    fn bare_invert_sense_always_skips() {
        let mut cpu = cpu_with_program(0o200, &[0o7410]); // SKP
        cpu.ac = 0o123;
        cpu.step();
        assert_eq!(cpu.pc, 0o202);
    }

    #[test]
    fn skip_is_evaluated_before_cla() {
        // SZA CLA: the skip sees the accumulator before it is cleared
        let mut cpu = cpu_with_program(0o200, &[0o7640]);
        cpu.ac = 0o55;
        cpu.step();
        assert_eq!(cpu.pc, 0o201); // no skip
        assert_eq!(cpu.ac, 0);
    }

    #[test]
    fn osr_ors_switches_after_cla() {
        let mut cpu = cpu_with_program(0o200, &[0o7606]); // CLA OSR HLT
        cpu.ac = 0o7070;
        cpu.sr = 0o1234;
        cpu.step();
        assert_eq!(cpu.ac, 0o1234);
        assert!(!cpu.running);
    }

    #[test]
    fn group3_is_diagnosed_and_charges_nothing() {
        let mut cpu = cpu_with_program(0o200, &[0o7401]);
        cpu.ac = 0o321;
        let clocks = cpu.step();
        assert_eq!(clocks, 0);
        assert_eq!(cpu.ac, 0o321);
        assert!(cpu.running);
        assert_eq!(cpu.counters.instructions(0o7), 1);
        assert_eq!(cpu.counters.clocks(0o7), 0);
    }

    #[test]
    fn unsupported_rotate_code_leaves_other_bits_applied() {
        // CLA with rotate code 6: the clear happens, the rotate is
        // reported and skipped
        let mut cpu = cpu_with_program(0o200, &[0o7214]);
        cpu.ac = 0o1234;
        cpu.link = 1;
        let clocks = cpu.step();
        assert_eq!(cpu.ac, 0);
        assert_eq!(cpu.link, 1);
        assert_eq!(clocks, 1);
    }

    #[test]
    fn unknown_device_is_diagnosed_and_charges_nothing() {
        let mut cpu = cpu_with_program(0o200, &[0o6031]);
        cpu.ac = 0o55;
        let clocks = cpu.step();
        assert_eq!(clocks, 0);
        assert_eq!(cpu.ac, 0o55);
        assert_eq!(cpu.pc, 0o201);
        assert_eq!(cpu.counters.instructions(0o6), 1);
        assert_eq!(cpu.counters.clocks(0o6), 0);
    }
}
