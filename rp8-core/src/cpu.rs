use crate::constants::{addressing, START_ADDRESS, WORD_MASK};
use crate::decoder::decode;
use crate::fpu::FloatAccumulator;
use crate::instructions::{InputOutput, Instruction, MemoryReference, Mnemonic, Operate};
use crate::memory::Memory;
use crate::trace::Counters;

/// The processor: register file, main memory, the floating-point
/// coprocessor registers, and the per-opcode counters.
pub struct Cpu {
    pub mem: Memory,
    pub pc: u16,       // next fetch address
    pub ir: u16,       // current instruction word
    pub ac: u16,       // accumulator
    pub link: u16,     // 1-bit carry above the accumulator
    pub sr: u16,       // front-panel switch register, host supplied
    pub ma: u16,       // latched effective address
    cpage: u16,        // page field of the PC at fetch time (5 bits)
    pub running: bool, // cleared by the HLT microinstruction

    // Tracked but never raised; interrupt delivery is not wired up
    pub interrupts_on: bool,
    pub interrupt_req: bool,

    pub fp: FloatAccumulator,    // floating-point primary accumulator
    pub fp_op: FloatAccumulator, // second operand register

    pub counters: Counters,
}

impl Cpu {
    pub fn new(mem: Memory) -> Cpu {
        let mut cpu = Cpu {
            mem,
            pc: 0,
            ir: 0,
            ac: 0,
            link: 0,
            sr: 0,
            ma: 0,
            cpage: 0,
            running: false,
            interrupts_on: false,
            interrupt_req: false,
            fp: FloatAccumulator::new(),
            fp_op: FloatAccumulator::new(),
            counters: Counters::new(),
        };
        cpu.reset();
        cpu
    }

    /// Cold-start state: registers clear, PC at the entry address, run
    /// flag set. Memory and the counters are left alone.
    pub fn reset(&mut self) {
        self.pc = START_ADDRESS;
        self.ir = 0;
        self.ac = 0;
        self.link = 0;
        self.ma = 0;
        self.cpage = 0;
        self.running = true;
    }

    /// Fetches and executes one instruction, folds its clocks into the
    /// per-opcode counters, and returns them. Fetch itself charges
    /// nothing; the handlers charge their own clocks.
    pub fn step(&mut self) -> u16 {
        let fetch_pc = self.pc;
        self.ir = self.mem.read(fetch_pc);
        self.cpage = (fetch_pc >> addressing::PAGE_SHIFT) & addressing::PAGE_FIELD_MASK;
        self.pc = (fetch_pc + 1) & WORD_MASK;

        let cmd = decode(fetch_pc, self.ir);
        let clocks = match cmd.mnem {
            Mnemonic::AND => self.and(&cmd),
            Mnemonic::TAD => self.tad(&cmd),
            Mnemonic::ISZ => self.isz(&cmd),
            Mnemonic::DCA => self.dca(&cmd),
            Mnemonic::JMS => self.jms(&cmd),
            Mnemonic::JMP => self.jmp(&cmd),
            Mnemonic::IOT => self.iot(&cmd),
            Mnemonic::OPR => self.opr(&cmd),
        };
        self.counters.record(cmd.opcode(), clocks);
        clocks
    }

    /// Resolves the effective address of a memory-reference instruction
    /// and returns it together with the clock penalty of any
    /// indirection. The result is latched in MA.
    ///
    /// Indirect references through octal 10..17 increment the pointer
    /// cell in place before dereferencing it, so this must run exactly
    /// once per executed instruction.
    pub(crate) fn resolve_address(&mut self, cmd: &Instruction) -> (u16, u16) {
        let offset = cmd.page_offset();
        let mut ea = if cmd.references_current_page() {
            (self.cpage << addressing::PAGE_SHIFT) | offset
        } else {
            offset
        };

        let mut penalty = 0;
        if cmd.is_indirect() {
            penalty += 1;
            if (addressing::AUTO_INDEX_FIRST..=addressing::AUTO_INDEX_LAST).contains(&ea) {
                penalty += 1;
                let bumped = (self.mem.read(ea) + 1) & WORD_MASK;
                self.mem.write(ea, bumped);
            }
            ea = self.mem.read(ea);
        }

        self.ma = ea;
        (ea, penalty)
    }
}
