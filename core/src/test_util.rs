//! Shared helpers for unit tests: synthetic cartridge images with valid
//! headers, plus an assembled-at-offset-0x100 program loader.

/// A blank image with a valid header for the given type/size codes.
pub fn test_rom(cartridge_type: u8, rom_size: u8, ram_size: u8) -> Vec<u8> {
    let banks = match rom_size {
        0x00..=0x08 => 2usize << rom_size,
        _ => 2,
    };
    let mut rom = vec![0u8; banks * 0x4000];
    rom[0x134..0x134 + 4].copy_from_slice(b"TEST");
    rom[0x147] = cartridge_type;
    rom[0x148] = rom_size;
    rom[0x149] = ram_size;
    finalize_header(&mut rom);
    rom
}

/// A ROM-only image with `program` placed at the entry point 0x100.
pub fn program_rom(program: &[u8]) -> Vec<u8> {
    let mut rom = test_rom(0x00, 0x00, 0x00);
    rom[0x100..0x100 + program.len()].copy_from_slice(program);
    finalize_header(&mut rom);
    rom
}

/// Recompute the header checksum after any header byte edits.
pub fn finalize_header(rom: &mut [u8]) {
    rom[0x14D] = rom[0x134..=0x14C]
        .iter()
        .fold(0u8, |x, &byte| x.wrapping_sub(byte).wrapping_sub(1));
}

/// Mark the image color-capable.
pub fn make_cgb(rom: &mut [u8]) {
    rom[0x143] = 0x80;
    finalize_header(rom);
}
