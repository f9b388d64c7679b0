use criterion::{criterion_group, criterion_main, Criterion};

use chromatic_core::Emulator;

/// A ROM-only image whose entry point spins in a tight NOP/JR loop,
/// enough to exercise the full dot pipeline.
fn spin_rom() -> Vec<u8> {
    let mut rom = vec![0u8; 0x8000];
    rom[0x134..0x134 + 4].copy_from_slice(b"BNCH");
    // NOP; JR -3
    rom[0x100] = 0x00;
    rom[0x101] = 0x18;
    rom[0x102] = 0xFD;
    rom[0x14D] = rom[0x134..=0x14C]
        .iter()
        .fold(0u8, |x, &byte| x.wrapping_sub(byte).wrapping_sub(1));
    rom
}

fn frame_benchmark(c: &mut Criterion) {
    let rom = spin_rom();
    let mut emulator = Emulator::new();
    emulator.load_cartridge(&rom, "bench.gb").unwrap();

    c.bench_function("emulate frame", |b| {
        b.iter(|| while !emulator.tick() {})
    });
}

criterion_group!(benches, frame_benchmark);

criterion_main!(benches);
