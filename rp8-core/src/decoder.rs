use crate::instructions::{Instruction, Mnemonic};

/// Decodes a fetched word into an instruction record carrying its base
/// clock charge. All eight primary opcodes are defined, so primary
/// decode cannot fail; unsupported sub-encodings are diagnosed by the
/// handlers, where execution is expected to continue.
pub fn decode(pc: u16, word: u16) -> Instruction {
    let mnem = Mnemonic::from_opcode(word >> 9);
    let clocks = match mnem {
        Mnemonic::AND | Mnemonic::TAD | Mnemonic::ISZ | Mnemonic::DCA | Mnemonic::JMS => 2,
        Mnemonic::JMP | Mnemonic::OPR => 1,
        // I/O charges nothing; the floating-point unit keeps it that way
        Mnemonic::IOT => 0,
    };
    Instruction {
        pc,
        word,
        mnem,
        clocks,
    }
}
