pub mod instructions;

// Execution traits implemented on the CPU, one per instruction family
pub use instructions::InputOutput;
pub use instructions::MemoryReference;
pub use instructions::Operate;

use crate::constants::{addressing, opcodes};
use crate::utils::field;

/// Primary opcode mnemonics (IR bits 0..2).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Mnemonic {
    AND, // Logical and with memory
    TAD, // Add memory and the link into the accumulator
    ISZ, // Increment memory, skip if the result is zero
    DCA, // Deposit and clear accumulator
    JMS, // Jump to subroutine
    JMP, // Jump
    IOT, // I/O transfer
    OPR, // Operate microinstructions
}

impl Mnemonic {
    pub fn from_opcode(opcode: u16) -> Mnemonic {
        match opcode & 0o7 {
            opcodes::AND => Mnemonic::AND,
            opcodes::TAD => Mnemonic::TAD,
            opcodes::ISZ => Mnemonic::ISZ,
            opcodes::DCA => Mnemonic::DCA,
            opcodes::JMS => Mnemonic::JMS,
            opcodes::JMP => Mnemonic::JMP,
            opcodes::IOT => Mnemonic::IOT,
            _ => Mnemonic::OPR,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Mnemonic::AND => "AND",
            Mnemonic::TAD => "TAD",
            Mnemonic::ISZ => "ISZ",
            Mnemonic::DCA => "DCA",
            Mnemonic::JMS => "JMS",
            Mnemonic::JMP => "JMP",
            Mnemonic::IOT => "IOT",
            Mnemonic::OPR => "OPR",
        }
    }
}

/// A fetched instruction together with its decode products.
pub struct Instruction {
    pub pc: u16, // fetch address, before the post-increment
    pub word: u16,
    pub mnem: Mnemonic,
    pub clocks: u16, // base clock charge; addressing penalties add to it
}

impl Instruction {
    /// Primary opcode, IR bits 0..2.
    pub fn opcode(&self) -> u16 {
        field(self.word, 0, 2)
    }

    /// Memory-reference indirect bit (IR bit 3).
    pub fn is_indirect(&self) -> bool {
        self.word & addressing::INDIRECT_BIT != 0
    }

    /// Memory-reference page bit (IR bit 4): set selects the current page.
    pub fn references_current_page(&self) -> bool {
        self.word & addressing::PAGE_BIT != 0
    }

    /// Within-page offset, IR bits 5..11.
    pub fn page_offset(&self) -> u16 {
        self.word & addressing::OFFSET_MASK
    }

    /// I/O device code, IR bits 3..8.
    pub fn device(&self) -> u16 {
        field(self.word, 3, 8)
    }

    /// Extended opcode under an I/O device, IR bits 9..11.
    pub fn extended_op(&self) -> u16 {
        field(self.word, 9, 11)
    }
}
