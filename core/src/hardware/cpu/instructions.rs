//! Opcode decode: both 256-entry pages collapse into a sum type per
//! instruction category, so the execution engine needs one step function
//! per shape instead of one per opcode.

use crate::hardware::cpu::registers::{Reg16, Reg8};

/// An 8-bit source: register, (HL), or the next immediate byte.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Operand8 {
    Reg(Reg8),
    HlIndirect,
    Immediate,
}

/// An 8-bit read-modify-write target.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Target8 {
    Reg(Reg8),
    HlIndirect,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Condition {
    Always,
    Zero,
    NotZero,
    Carry,
    NotCarry,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum AluOp {
    Add,
    Adc,
    Sub,
    Sbc,
    And,
    Xor,
    Or,
    Cp,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum RotateOp {
    Rlc,
    Rrc,
    Rl,
    Rr,
    Sla,
    Sra,
    Swap,
    Srl,
}

/// Addressing forms for the accumulator load/store family.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Addressing {
    Bc,
    De,
    HlInc,
    HlDec,
    /// 16-bit immediate address.
    Direct,
    /// 0xFF00 + immediate byte.
    High,
    /// 0xFF00 + C.
    HighC,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Instruction {
    Nop,
    Stop,
    Halt,
    DisableInterrupts,
    EnableInterrupts,
    /// 0xCB: the next fetch indexes the prefixed page.
    Prefix,

    Load(Reg8, Operand8),
    StoreHl(Operand8),
    LoadAccumulator(Addressing),
    StoreAccumulator(Addressing),

    Load16(Reg16),
    StoreStackPointer,
    LoadStackPointerHl,
    LoadHlStackOffset,
    AddStackPointer,

    Inc(Target8),
    Dec(Target8),
    Inc16(Reg16),
    Dec16(Reg16),
    AddHl(Reg16),
    Alu(AluOp, Operand8),

    RotateAccumulator(RotateOp),
    DecimalAdjust,
    Complement,
    SetCarry,
    ComplementCarry,

    JumpRelative(Condition),
    Jump(Condition),
    JumpHl,
    Call(Condition),
    Return(Condition),
    ReturnInterrupt,
    Restart(u8),
    Push(Reg16),
    Pop(Reg16),

    /// Pseudo-instruction installed when a pending interrupt hijacks the
    /// fetch slot.
    ServiceInterrupt,

    // 0xCB page
    Rotate(RotateOp, Target8),
    Bit(u8, Target8),
    Res(u8, Target8),
    Set(u8, Target8),
}

fn operand_from_bits(bits: u8) -> Operand8 {
    match bits & 0x07 {
        6 => Operand8::HlIndirect,
        other => Operand8::Reg(reg_from_bits(other)),
    }
}

fn target_from_bits(bits: u8) -> Target8 {
    match bits & 0x07 {
        6 => Target8::HlIndirect,
        other => Target8::Reg(reg_from_bits(other)),
    }
}

fn reg_from_bits(bits: u8) -> Reg8 {
    match bits & 0x07 {
        0 => Reg8::B,
        1 => Reg8::C,
        2 => Reg8::D,
        3 => Reg8::E,
        4 => Reg8::H,
        5 => Reg8::L,
        _ => Reg8::A,
    }
}

fn alu_from_bits(bits: u8) -> AluOp {
    match bits & 0x07 {
        0 => AluOp::Add,
        1 => AluOp::Adc,
        2 => AluOp::Sub,
        3 => AluOp::Sbc,
        4 => AluOp::And,
        5 => AluOp::Xor,
        6 => AluOp::Or,
        _ => AluOp::Cp,
    }
}

fn rotate_from_bits(bits: u8) -> RotateOp {
    match bits & 0x07 {
        0 => RotateOp::Rlc,
        1 => RotateOp::Rrc,
        2 => RotateOp::Rl,
        3 => RotateOp::Rr,
        4 => RotateOp::Sla,
        5 => RotateOp::Sra,
        6 => RotateOp::Swap,
        _ => RotateOp::Srl,
    }
}

/// The unprefixed page. The eleven unused opcodes execute as NOP.
pub fn decode(opcode: u8) -> Instruction {
    use Instruction::*;

    match opcode {
        0x00 => Nop,
        0x01 => Load16(Reg16::BC),
        0x02 => StoreAccumulator(Addressing::Bc),
        0x03 => Inc16(Reg16::BC),
        0x07 => RotateAccumulator(RotateOp::Rlc),
        0x08 => StoreStackPointer,
        0x09 => AddHl(Reg16::BC),
        0x0A => LoadAccumulator(Addressing::Bc),
        0x0B => Dec16(Reg16::BC),
        0x0F => RotateAccumulator(RotateOp::Rrc),

        0x10 => Stop,
        0x11 => Load16(Reg16::DE),
        0x12 => StoreAccumulator(Addressing::De),
        0x13 => Inc16(Reg16::DE),
        0x17 => RotateAccumulator(RotateOp::Rl),
        0x18 => JumpRelative(Condition::Always),
        0x19 => AddHl(Reg16::DE),
        0x1A => LoadAccumulator(Addressing::De),
        0x1B => Dec16(Reg16::DE),
        0x1F => RotateAccumulator(RotateOp::Rr),

        0x20 => JumpRelative(Condition::NotZero),
        0x21 => Load16(Reg16::HL),
        0x22 => StoreAccumulator(Addressing::HlInc),
        0x23 => Inc16(Reg16::HL),
        0x27 => DecimalAdjust,
        0x28 => JumpRelative(Condition::Zero),
        0x29 => AddHl(Reg16::HL),
        0x2A => LoadAccumulator(Addressing::HlInc),
        0x2B => Dec16(Reg16::HL),
        0x2F => Complement,

        0x30 => JumpRelative(Condition::NotCarry),
        0x31 => Load16(Reg16::SP),
        0x32 => StoreAccumulator(Addressing::HlDec),
        0x33 => Inc16(Reg16::SP),
        0x36 => StoreHl(Operand8::Immediate),
        0x37 => SetCarry,
        0x38 => JumpRelative(Condition::Carry),
        0x39 => AddHl(Reg16::SP),
        0x3A => LoadAccumulator(Addressing::HlDec),
        0x3B => Dec16(Reg16::SP),
        0x3F => ComplementCarry,

        // INC r / DEC r / LD r,n columns.
        0x04 | 0x0C | 0x14 | 0x1C | 0x24 | 0x2C | 0x34 | 0x3C => Inc(target_from_bits(opcode >> 3)),
        0x05 | 0x0D | 0x15 | 0x1D | 0x25 | 0x2D | 0x35 | 0x3D => Dec(target_from_bits(opcode >> 3)),
        0x06 | 0x0E | 0x16 | 0x1E | 0x26 | 0x2E | 0x3E => Load(reg_from_bits(opcode >> 3), Operand8::Immediate),

        0x76 => Halt,
        // The LD r,r' quadrant.
        0x40..=0x7F => {
            let source = operand_from_bits(opcode);
            match (opcode >> 3) & 0x07 {
                6 => StoreHl(source),
                dst => Load(reg_from_bits(dst), source),
            }
        }

        0x80..=0xBF => Alu(alu_from_bits(opcode >> 3), operand_from_bits(opcode)),

        0xC0 => Return(Condition::NotZero),
        0xC1 => Pop(Reg16::BC),
        0xC2 => Jump(Condition::NotZero),
        0xC3 => Jump(Condition::Always),
        0xC4 => Call(Condition::NotZero),
        0xC5 => Push(Reg16::BC),
        0xC6 => Alu(AluOp::Add, Operand8::Immediate),
        0xC7 => Restart(0x00),
        0xC8 => Return(Condition::Zero),
        0xC9 => Return(Condition::Always),
        0xCA => Jump(Condition::Zero),
        0xCB => Prefix,
        0xCC => Call(Condition::Zero),
        0xCD => Call(Condition::Always),
        0xCE => Alu(AluOp::Adc, Operand8::Immediate),
        0xCF => Restart(0x08),

        0xD0 => Return(Condition::NotCarry),
        0xD1 => Pop(Reg16::DE),
        0xD2 => Jump(Condition::NotCarry),
        0xD4 => Call(Condition::NotCarry),
        0xD5 => Push(Reg16::DE),
        0xD6 => Alu(AluOp::Sub, Operand8::Immediate),
        0xD7 => Restart(0x10),
        0xD8 => Return(Condition::Carry),
        0xD9 => ReturnInterrupt,
        0xDA => Jump(Condition::Carry),
        0xDC => Call(Condition::Carry),
        0xDE => Alu(AluOp::Sbc, Operand8::Immediate),
        0xDF => Restart(0x18),

        0xE0 => StoreAccumulator(Addressing::High),
        0xE1 => Pop(Reg16::HL),
        0xE2 => StoreAccumulator(Addressing::HighC),
        0xE5 => Push(Reg16::HL),
        0xE6 => Alu(AluOp::And, Operand8::Immediate),
        0xE7 => Restart(0x20),
        0xE8 => AddStackPointer,
        0xE9 => JumpHl,
        0xEA => StoreAccumulator(Addressing::Direct),
        0xEE => Alu(AluOp::Xor, Operand8::Immediate),
        0xEF => Restart(0x28),

        0xF0 => LoadAccumulator(Addressing::High),
        0xF1 => Pop(Reg16::AF),
        0xF2 => LoadAccumulator(Addressing::HighC),
        0xF3 => DisableInterrupts,
        0xF5 => Push(Reg16::AF),
        0xF6 => Alu(AluOp::Or, Operand8::Immediate),
        0xF7 => Restart(0x30),
        0xF8 => LoadHlStackOffset,
        0xF9 => LoadStackPointerHl,
        0xFA => LoadAccumulator(Addressing::Direct),
        0xFB => EnableInterrupts,
        0xFE => Alu(AluOp::Cp, Operand8::Immediate),
        0xFF => Restart(0x38),

        // 0xD3, 0xDB, 0xDD, 0xE3, 0xE4, 0xEB, 0xEC, 0xED, 0xF4, 0xFC, 0xFD
        _ => Nop,
    }
}

/// The 0xCB page is fully regular: four quadrants indexed by bit triplets.
pub fn decode_prefixed(opcode: u8) -> Instruction {
    use Instruction::*;

    let target = target_from_bits(opcode);
    let triplet = (opcode >> 3) & 0x07;

    match opcode {
        0x00..=0x3F => Rotate(rotate_from_bits(triplet), target),
        0x40..=0x7F => Bit(triplet, target),
        0x80..=0xBF => Res(triplet, target),
        _ => Set(triplet, target),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ld_quadrant_decodes() {
        assert_eq!(decode(0x41), Instruction::Load(Reg8::B, Operand8::Reg(Reg8::C)));
        assert_eq!(decode(0x7E), Instruction::Load(Reg8::A, Operand8::HlIndirect));
        assert_eq!(decode(0x70), Instruction::StoreHl(Operand8::Reg(Reg8::B)));
        assert_eq!(decode(0x76), Instruction::Halt);
    }

    #[test]
    fn alu_quadrant_decodes() {
        assert_eq!(decode(0x80), Instruction::Alu(AluOp::Add, Operand8::Reg(Reg8::B)));
        assert_eq!(decode(0x9E), Instruction::Alu(AluOp::Sbc, Operand8::HlIndirect));
        assert_eq!(decode(0xBF), Instruction::Alu(AluOp::Cp, Operand8::Reg(Reg8::A)));
    }

    #[test]
    fn unused_opcodes_are_nops() {
        for opcode in [0xD3, 0xDB, 0xDD, 0xE3, 0xE4, 0xEB, 0xEC, 0xED, 0xF4, 0xFC, 0xFD].iter() {
            assert_eq!(decode(*opcode), Instruction::Nop);
        }
    }

    #[test]
    fn prefixed_quadrants_decode() {
        assert_eq!(
            decode_prefixed(0x00),
            Instruction::Rotate(RotateOp::Rlc, Target8::Reg(Reg8::B))
        );
        assert_eq!(
            decode_prefixed(0x36),
            Instruction::Rotate(RotateOp::Swap, Target8::HlIndirect)
        );
        assert_eq!(decode_prefixed(0x7C), Instruction::Bit(7, Target8::Reg(Reg8::H)));
        assert_eq!(decode_prefixed(0x87), Instruction::Res(0, Target8::Reg(Reg8::A)));
        assert_eq!(decode_prefixed(0xFE), Instruction::Set(7, Target8::HlIndirect));
    }
}
