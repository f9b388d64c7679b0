//! Machine-cycle counts per instruction against the published timing
//! table, including the branch taken/not-taken split.

use crate::hardware::cpu::tests::{harness, step_instruction};

#[test]
fn unconditional_timings() {
    // (program, expected machine cycles for the first instruction)
    let cases: &[(&[u8], u32)] = &[
        (&[0x00], 1),             // NOP
        (&[0x41], 1),             // LD B,C
        (&[0x06, 0x12], 2),       // LD B,n
        (&[0x46], 2),             // LD B,(HL)
        (&[0x70], 2),             // LD (HL),B
        (&[0x36, 0x55], 3),       // LD (HL),n
        (&[0x0A], 2),             // LD A,(BC)
        (&[0x02], 2),             // LD (BC),A
        (&[0x2A], 2),             // LD A,(HL+)
        (&[0x32], 2),             // LD (HL-),A
        (&[0x01, 0x34, 0x12], 3), // LD BC,nn
        (&[0x31, 0x34, 0x12], 3), // LD SP,nn
        (&[0x08, 0x00, 0xC1], 5), // LD (nn),SP
        (&[0xF9], 2),             // LD SP,HL
        (&[0xF8, 0x01], 3),       // LD HL,SP+e8
        (&[0xE8, 0x01], 4),       // ADD SP,e8
        (&[0x04], 1),             // INC B
        (&[0x05], 1),             // DEC B
        (&[0x34], 3),             // INC (HL)
        (&[0x35], 3),             // DEC (HL)
        (&[0x03], 2),             // INC BC
        (&[0x0B], 2),             // DEC BC
        (&[0x09], 2),             // ADD HL,BC
        (&[0x80], 1),             // ADD A,B
        (&[0xC6, 0x01], 2),       // ADD A,n
        (&[0x86], 2),             // ADD A,(HL)
        (&[0x97], 1),             // SUB A
        (&[0xA1], 1),             // AND C
        (&[0xBE], 2),             // CP (HL)
        (&[0xE0, 0x80], 3),       // LDH (n),A
        (&[0xF0, 0x80], 3),       // LDH A,(n)
        (&[0xE2], 2),             // LD (C),A
        (&[0xF2], 2),             // LD A,(C)
        (&[0xEA, 0x00, 0xC0], 4), // LD (nn),A
        (&[0xFA, 0x00, 0xC0], 4), // LD A,(nn)
        (&[0x07], 1),             // RLCA
        (&[0x1F], 1),             // RRA
        (&[0x27], 1),             // DAA
        (&[0x2F], 1),             // CPL
        (&[0x37], 1),             // SCF
        (&[0x3F], 1),             // CCF
        (&[0x18, 0x00], 3),       // JR e8
        (&[0xC3, 0x00, 0x02], 4), // JP nn
        (&[0xE9], 1),             // JP HL
        (&[0xCD, 0x00, 0x02], 6), // CALL nn
        (&[0xC9], 4),             // RET
        (&[0xD9], 4),             // RETI
        (&[0xC7], 4),             // RST 00
        (&[0xC5], 4),             // PUSH BC
        (&[0xC1], 3),             // POP BC
        (&[0xF3], 1),             // DI
        (&[0xFB], 1),             // EI
        (&[0xCB, 0x00], 2),       // RLC B
        (&[0xCB, 0x37], 2),       // SWAP A
        (&[0xCB, 0x46], 3),       // BIT 0,(HL)
        (&[0xCB, 0x86], 4),       // RES 0,(HL)
        (&[0xCB, 0xC6], 4),       // SET 0,(HL)
        (&[0xD3], 1),             // unused opcode behaves as NOP
    ];

    for (program, expected) in cases {
        let (mut cpu, mut mmu) = harness(program);
        assert_eq!(
            step_instruction(&mut cpu, &mut mmu),
            *expected,
            "program {:02X?}",
            program
        );
    }
}

#[test]
fn conditional_branches_take_longer_when_taken() {
    // (program, flag setup: (zero, carry), expected cycles)
    let cases: &[(&[u8], (bool, bool), u32)] = &[
        (&[0x20, 0x00], (false, false), 3), // JR NZ taken
        (&[0x20, 0x00], (true, false), 2),  // JR NZ not taken
        (&[0x28, 0x00], (true, false), 3),  // JR Z taken
        (&[0x38, 0x00], (false, false), 2), // JR C not taken
        (&[0xC2, 0x00, 0x02], (false, false), 4), // JP NZ taken
        (&[0xC2, 0x00, 0x02], (true, false), 3),  // JP NZ not taken
        (&[0xDA, 0x00, 0x02], (false, true), 4),  // JP C taken
        (&[0xC4, 0x00, 0x02], (false, false), 6), // CALL NZ taken
        (&[0xC4, 0x00, 0x02], (true, false), 3),  // CALL NZ not taken
        (&[0xC0], (false, false), 5),       // RET NZ taken
        (&[0xC0], (true, false), 2),        // RET NZ not taken
        (&[0xD8], (false, true), 5),        // RET C taken
    ];

    for (program, (zero, carry), expected) in cases {
        let (mut cpu, mut mmu) = harness(program);
        cpu.registers.set_zf(*zero);
        cpu.registers.set_cf(*carry);
        assert_eq!(
            step_instruction(&mut cpu, &mut mmu),
            *expected,
            "program {:02X?} with Z={} C={}",
            program,
            zero,
            carry
        );
    }
}

#[test]
fn interrupt_service_takes_five_cycles() {
    let (mut cpu, mut mmu) = harness(&[0x00, 0x00]);
    cpu.ime = true;
    mmu.interrupts.write_enable(0x04);
    mmu.interrupts.write_flag(0x04);

    assert_eq!(step_instruction(&mut cpu, &mut mmu), 5);
    assert_eq!(cpu.registers.pc, 0x0050);
}
