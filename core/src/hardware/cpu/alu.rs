//! Arithmetic helpers: every function mutates the register file and leaves
//! the flags exactly as the hardware documents them.

use crate::hardware::cpu::instructions::{AluOp, RotateOp};
use crate::hardware::cpu::registers::Reg16;
use crate::hardware::cpu::Cpu;

impl Cpu {
    pub(super) fn alu_apply(&mut self, op: AluOp, value: u8) {
        match op {
            AluOp::Add => self.add(value),
            AluOp::Adc => self.adc(value),
            AluOp::Sub => self.sub(value),
            AluOp::Sbc => self.sbc(value),
            AluOp::And => self.and(value),
            AluOp::Xor => self.xor(value),
            AluOp::Or => self.or(value),
            AluOp::Cp => self.compare(value),
        }
    }

    /// `A = A + value`, flags `Z0HC`.
    fn add(&mut self, value: u8) {
        let a = self.registers.a;
        let (result, overflowed) = a.overflowing_add(value);

        self.registers.set_zf(result == 0);
        self.registers.set_nf(false);
        self.registers.set_hf((a & 0x0F) + (value & 0x0F) > 0x0F);
        self.registers.set_cf(overflowed);
        self.registers.a = result;
    }

    /// `A = A + value + carry`, flags `Z0HC`.
    fn adc(&mut self, value: u8) {
        let a = self.registers.a;
        let carry = self.registers.cf() as u8;
        let result = a.wrapping_add(value).wrapping_add(carry);

        self.registers.set_zf(result == 0);
        self.registers.set_nf(false);
        self.registers.set_hf((a & 0x0F) + (value & 0x0F) + carry > 0x0F);
        self.registers.set_cf(a as u16 + value as u16 + carry as u16 > 0xFF);
        self.registers.a = result;
    }

    /// `A = A - value`, flags `Z1HC`.
    fn sub(&mut self, value: u8) {
        let a = self.registers.a;
        let result = a.wrapping_sub(value);

        self.registers.set_zf(result == 0);
        self.registers.set_nf(true);
        self.registers.set_hf(a & 0x0F < value & 0x0F);
        self.registers.set_cf(a < value);
        self.registers.a = result;
    }

    /// `A = A - value - carry`, flags `Z1HC`.
    fn sbc(&mut self, value: u8) {
        let a = self.registers.a;
        let carry = self.registers.cf() as u8;
        let result = a.wrapping_sub(value).wrapping_sub(carry);

        self.registers.set_zf(result == 0);
        self.registers.set_nf(true);
        self.registers.set_hf((a & 0x0F) < (value & 0x0F) + carry);
        self.registers.set_cf((a as u16) < value as u16 + carry as u16);
        self.registers.a = result;
    }

    /// Flags `Z010`.
    fn and(&mut self, value: u8) {
        self.registers.a &= value;
        let zero = self.registers.a == 0;
        self.registers.set_zf(zero);
        self.registers.set_nf(false);
        self.registers.set_hf(true);
        self.registers.set_cf(false);
    }

    /// Flags `Z000`.
    fn xor(&mut self, value: u8) {
        self.registers.a ^= value;
        let zero = self.registers.a == 0;
        self.registers.set_zf(zero);
        self.registers.set_nf(false);
        self.registers.set_hf(false);
        self.registers.set_cf(false);
    }

    /// Flags `Z000`.
    fn or(&mut self, value: u8) {
        self.registers.a |= value;
        let zero = self.registers.a == 0;
        self.registers.set_zf(zero);
        self.registers.set_nf(false);
        self.registers.set_hf(false);
        self.registers.set_cf(false);
    }

    /// SUB without the writeback, flags `Z1HC`.
    fn compare(&mut self, value: u8) {
        let a = self.registers.a;
        self.registers.set_zf(a == value);
        self.registers.set_nf(true);
        self.registers.set_hf(a & 0x0F < value & 0x0F);
        self.registers.set_cf(a < value);
    }

    /// 8-bit increment, flags `Z0H-`.
    pub(super) fn increment_8bit(&mut self, value: u8) -> u8 {
        let result = value.wrapping_add(1);
        self.registers.set_zf(result == 0);
        self.registers.set_nf(false);
        self.registers.set_hf(value & 0x0F == 0x0F);
        result
    }

    /// 8-bit decrement, flags `Z1H-`.
    pub(super) fn decrement_8bit(&mut self, value: u8) -> u8 {
        let result = value.wrapping_sub(1);
        self.registers.set_zf(result == 0);
        self.registers.set_nf(true);
        self.registers.set_hf(value & 0x0F == 0);
        result
    }

    /// `HL = HL + rr`, flags `-0HC`.
    pub(super) fn add_hl(&mut self, reg: Reg16) {
        let hl = self.registers.hl();
        let value = self.registers.read_reg16(reg);
        let (result, overflowed) = hl.overflowing_add(value);

        self.registers.set_nf(false);
        self.registers.set_hf((hl & 0x0FFF) + (value & 0x0FFF) > 0x0FFF);
        self.registers.set_cf(overflowed);
        self.registers.set_hl(result);
    }

    /// `SP + e8` for ADD SP / LD HL,SP+e8: flags come from the low byte,
    /// `00HC`.
    pub(super) fn stack_offset_add(&mut self, offset: u8) -> u16 {
        let sp = self.registers.sp;
        let signed = offset as i8 as u16;

        self.registers.set_zf(false);
        self.registers.set_nf(false);
        self.registers.set_hf((sp & 0x0F) + (signed & 0x0F) > 0x0F);
        self.registers.set_cf((sp & 0xFF) + (signed & 0xFF) > 0xFF);
        sp.wrapping_add(signed)
    }

    /// BCD fixup of A after an add or subtract, flags `Z-0C`.
    pub(super) fn decimal_adjust(&mut self) {
        let mut correction = 0u8;
        let carry = self.registers.cf();

        if !self.registers.nf() {
            if self.registers.hf() || self.registers.a & 0x0F > 0x09 {
                correction |= 0x06;
            }
            if carry || self.registers.a > 0x99 {
                correction |= 0x60;
                self.registers.set_cf(true);
            } else {
                self.registers.set_cf(false);
            }
            self.registers.a = self.registers.a.wrapping_add(correction);
        } else {
            if self.registers.hf() {
                correction |= 0x06;
            }
            if carry {
                correction |= 0x60;
            }
            self.registers.a = self.registers.a.wrapping_sub(correction);
        }

        let zero = self.registers.a == 0;
        self.registers.set_zf(zero);
        self.registers.set_hf(false);
    }

    /// The shared rotate/shift core of both opcode pages; flags `Z00C`
    /// (the accumulator forms clear Z afterwards).
    pub(super) fn rotate_value(&mut self, op: RotateOp, value: u8) -> u8 {
        let carry_in = self.registers.cf() as u8;

        let (result, carry_out) = match op {
            RotateOp::Rlc => (value.rotate_left(1), value & 0x80 != 0),
            RotateOp::Rrc => (value.rotate_right(1), value & 0x01 != 0),
            RotateOp::Rl => (value << 1 | carry_in, value & 0x80 != 0),
            RotateOp::Rr => (value >> 1 | carry_in << 7, value & 0x01 != 0),
            RotateOp::Sla => (value << 1, value & 0x80 != 0),
            RotateOp::Sra => (value & 0x80 | value >> 1, value & 0x01 != 0),
            RotateOp::Swap => (value << 4 | value >> 4, false),
            RotateOp::Srl => (value >> 1, value & 0x01 != 0),
        };

        self.registers.set_zf(result == 0);
        self.registers.set_nf(false);
        self.registers.set_hf(false);
        self.registers.set_cf(carry_out);
        result
    }
}
