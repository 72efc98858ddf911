// Main memory geometry: 4096 words of 12 bits, word addressed
pub const MEMORY_WORDS: usize = 4096;
pub const WORD_MASK: u16 = 0o7777;

// Cold-start fetch address
pub const START_ADDRESS: u16 = 0o200;

// The primary opcode is a 3-bit field
pub const NUM_OPCODES: usize = 8;

pub mod opcodes {
    // Primary opcode numbers (IR bits 0..2, MSB-first)
    pub const AND: u16 = 0;
    pub const TAD: u16 = 1;
    pub const ISZ: u16 = 2;
    pub const DCA: u16 = 3;
    pub const JMS: u16 = 4;
    pub const JMP: u16 = 5;
    pub const IOT: u16 = 6;
    pub const OPR: u16 = 7;
}

pub mod addressing {
    // Memory-reference instruction fields
    pub const INDIRECT_BIT: u16 = 0o400; // IR bit 3
    pub const PAGE_BIT: u16 = 0o200; // IR bit 4: set selects the current page
    pub const OFFSET_MASK: u16 = 0o177; // IR bits 5..11
    pub const PAGE_SHIFT: u32 = 7;
    pub const PAGE_FIELD_MASK: u16 = 0o37; // 5-bit page number

    // Indirect references through these cells bump the pointer first
    pub const AUTO_INDEX_FIRST: u16 = 0o10;
    pub const AUTO_INDEX_LAST: u16 = 0o17;
}

pub mod operate {
    // Group select: bit 3 clear is Group 1; set with bit 11 clear is
    // Group 2; set with bit 11 set selects the absent EAE (Group 3)
    pub const GROUP_BIT: u16 = 0o400;
    pub const GROUP3_BIT: u16 = 0o1;

    // Shared by both groups
    pub const CLA: u16 = 0o200;

    // Group 1 logical transforms
    pub const CLL: u16 = 0o100;
    pub const CMA: u16 = 0o40;
    pub const CML: u16 = 0o20;
    pub const IAC: u16 = 0o1;

    // Group 1 rotate/swap field (IR bits 8..10)
    pub const ROTATE_SHIFT: u32 = 1;
    pub const ROTATE_MASK: u16 = 0o7;
    pub const ROTATE_NOP: u16 = 0;
    pub const ROTATE_BSW: u16 = 1;
    pub const ROTATE_RAL: u16 = 2;
    pub const ROTATE_RTL: u16 = 3;
    pub const ROTATE_RAR: u16 = 4;
    pub const ROTATE_RTR: u16 = 5;

    // Group 2 skip conditions; with INVERT_SENSE they read SPA/SNA/SZL
    pub const SMA: u16 = 0o100;
    pub const SZA: u16 = 0o40;
    pub const SNL: u16 = 0o20;
    pub const INVERT_SENSE: u16 = 0o10;

    pub const OSR: u16 = 0o4;
    pub const HLT: u16 = 0o2;
}

pub mod fpu {
    // Device code that routes an IOT into the floating-point unit
    pub const DEVICE_CODE: u16 = 0o55;

    // Extended opcodes (IR bits 9..11)
    pub const OP_CLEAR: u16 = 0;
    pub const OP_LOAD: u16 = 1;
    pub const OP_STORE: u16 = 2;
    pub const OP_ADD: u16 = 3;
    pub const OP_MULT: u16 = 4;

    // Three-word layout fields
    pub const EXPONENT_MASK: u16 = 0o377; // word P, bits 4..11
    pub const SIGN_BIT: u16 = 0o4000; // word P+1, bit 0
    pub const MANTISSA_HIGH_MASK: u16 = 0o3777; // word P+1, bits 1..11
    pub const MANTISSA_LOW_BITS: u32 = 12; // word P+2 holds the low word
    pub const MANTISSA_MASK: u32 = 0o37777777; // 23 bits in all
}
