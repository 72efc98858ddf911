use rp8_core::constants::NUM_OPCODES;
use rp8_core::instructions::Mnemonic;
use rp8_core::memory::Memory;
use rp8_core::trace::Counters;

/// One line per nonzero cell, address and value in octal.
pub fn print_memory(mem: &Memory) {
    for (address, word) in mem.nonzero_cells() {
        println!("{:04o}  {:04o}", address, word);
    }
}

/// Per-opcode execution summary with totals and the average CPI.
pub fn print_summary(counters: &Counters) {
    for opcode in 0..NUM_OPCODES as u16 {
        println!(
            "{} {} instructions executed, using {} clocks",
            counters.instructions(opcode),
            Mnemonic::from_opcode(opcode).name(),
            counters.clocks(opcode)
        );
    }
    println!(
        "{} total instructions executed, using {} clocks",
        counters.total_instructions(),
        counters.total_clocks()
    );
    println!(
        "average clocks per instruction: {:.2}",
        counters.average_cpi()
    );
}
