//! The per-machine-cycle step functions. Each call performs exactly the
//! bus traffic and ALU work due in the current m-cycle of the in-flight
//! instruction and reports whether the instruction just completed.

use crate::hardware::cpu::instructions::{Addressing, AluOp, Condition, Instruction, Operand8, RotateOp, Target8};
use crate::hardware::cpu::registers::{Reg16, Reg8};
use crate::hardware::cpu::Cpu;
use crate::hardware::mmu::Memory;
use crate::io::interrupts::Interrupt;

impl Cpu {
    pub(super) fn execute_cycle(&mut self, mmu: &mut Memory) -> bool {
        use Instruction::*;

        match self.ins.instruction {
            Nop => true,
            Halt => {
                self.halt(mmu);
                true
            }
            Stop => {
                self.stop(mmu);
                true
            }
            DisableInterrupts => {
                self.ime = false;
                self.ime_scheduled = false;
                true
            }
            EnableInterrupts => {
                if !self.ime && !self.ime_scheduled {
                    self.ime_scheduled = true;
                    self.ime_delay = 2;
                }
                true
            }
            Prefix => {
                self.ins.cb_prefixed = true;
                true
            }

            Load(reg, operand) => self.load_8bit(mmu, reg, operand),
            StoreHl(operand) => self.store_hl(mmu, operand),
            LoadAccumulator(addressing) => self.load_accumulator(mmu, addressing),
            StoreAccumulator(addressing) => self.store_accumulator(mmu, addressing),

            Load16(reg) => self.load_16bit(mmu, reg),
            StoreStackPointer => self.store_stack_pointer(mmu),
            LoadStackPointerHl => match self.ins.mcycle {
                1 => false,
                _ => {
                    self.registers.sp = self.registers.hl();
                    true
                }
            },
            LoadHlStackOffset => match self.ins.mcycle {
                1 => false,
                2 => {
                    self.ins.low = self.fetch(mmu);
                    false
                }
                _ => {
                    let result = self.stack_offset_add(self.ins.low);
                    self.registers.set_hl(result);
                    true
                }
            },
            AddStackPointer => match self.ins.mcycle {
                1 => false,
                2 => {
                    self.ins.low = self.fetch(mmu);
                    false
                }
                3 => false,
                _ => {
                    self.registers.sp = self.stack_offset_add(self.ins.low);
                    true
                }
            },

            Inc(target) => self.inc_dec(mmu, target, true),
            Dec(target) => self.inc_dec(mmu, target, false),
            Inc16(reg) => match self.ins.mcycle {
                1 => false,
                _ => {
                    let value = self.registers.read_reg16(reg).wrapping_add(1);
                    self.registers.write_reg16(reg, value);
                    true
                }
            },
            Dec16(reg) => match self.ins.mcycle {
                1 => false,
                _ => {
                    let value = self.registers.read_reg16(reg).wrapping_sub(1);
                    self.registers.write_reg16(reg, value);
                    true
                }
            },
            AddHl(reg) => match self.ins.mcycle {
                1 => false,
                _ => {
                    self.add_hl(reg);
                    true
                }
            },
            Alu(op, operand) => self.alu_operand(mmu, op, operand),

            RotateAccumulator(op) => {
                let result = self.rotate_value(op, self.registers.a);
                self.registers.a = result;
                self.registers.set_zf(false);
                true
            }
            DecimalAdjust => {
                self.decimal_adjust();
                true
            }
            Complement => {
                self.registers.a = !self.registers.a;
                self.registers.set_nf(true);
                self.registers.set_hf(true);
                true
            }
            SetCarry => {
                self.registers.set_nf(false);
                self.registers.set_hf(false);
                self.registers.set_cf(true);
                true
            }
            ComplementCarry => {
                let carry = self.registers.cf();
                self.registers.set_nf(false);
                self.registers.set_hf(false);
                self.registers.set_cf(!carry);
                true
            }

            JumpRelative(condition) => self.jump_relative(mmu, condition),
            Jump(condition) => self.jump_direct(mmu, condition),
            JumpHl => {
                self.registers.pc = self.registers.hl();
                true
            }
            Call(condition) => self.call(mmu, condition),
            Return(Condition::Always) => self.return_always(mmu, false),
            Return(condition) => self.return_conditional(mmu, condition),
            ReturnInterrupt => self.return_always(mmu, true),
            Restart(vector) => self.restart(mmu, vector),
            Push(reg) => self.push(mmu, reg),
            Pop(reg) => self.pop(mmu, reg),

            ServiceInterrupt => self.service_cycle(mmu),

            Rotate(op, target) => self.prefixed_rmw(mmu, target, PrefixedOp::Rotate(op)),
            Bit(bit, target) => self.prefixed_bit(mmu, bit, target),
            Res(bit, target) => self.prefixed_rmw(mmu, target, PrefixedOp::Res(bit)),
            Set(bit, target) => self.prefixed_rmw(mmu, target, PrefixedOp::Set(bit)),
        }
    }

    // 8-bit loads

    fn load_8bit(&mut self, mmu: &mut Memory, reg: Reg8, operand: Operand8) -> bool {
        match operand {
            Operand8::Reg(source) => {
                let value = self.registers.read_reg8(source);
                self.registers.write_reg8(reg, value);
                true
            }
            _ => match self.ins.mcycle {
                1 => false,
                _ => {
                    let value = self.read_operand_late(mmu, operand);
                    self.registers.write_reg8(reg, value);
                    true
                }
            },
        }
    }

    fn store_hl(&mut self, mmu: &mut Memory, operand: Operand8) -> bool {
        match (operand, self.ins.mcycle) {
            (_, 1) => false,
            (Operand8::Reg(source), _) => {
                let value = self.registers.read_reg8(source);
                mmu.write_byte(self.registers.hl(), value);
                true
            }
            (Operand8::Immediate, 2) => {
                self.ins.low = self.fetch(mmu);
                false
            }
            (Operand8::Immediate, _) => {
                mmu.write_byte(self.registers.hl(), self.ins.low);
                true
            }
            (Operand8::HlIndirect, _) => true,
        }
    }

    fn load_accumulator(&mut self, mmu: &mut Memory, addressing: Addressing) -> bool {
        match (addressing, self.ins.mcycle) {
            (_, 1) => false,
            (Addressing::Bc, _) => {
                self.registers.a = mmu.read_byte(self.registers.bc());
                true
            }
            (Addressing::De, _) => {
                self.registers.a = mmu.read_byte(self.registers.de());
                true
            }
            (Addressing::HlInc, _) => {
                let hl = self.registers.hl();
                self.registers.a = mmu.read_byte(hl);
                self.registers.set_hl(hl.wrapping_add(1));
                true
            }
            (Addressing::HlDec, _) => {
                let hl = self.registers.hl();
                self.registers.a = mmu.read_byte(hl);
                self.registers.set_hl(hl.wrapping_sub(1));
                true
            }
            (Addressing::HighC, _) => {
                self.registers.a = mmu.read_byte(0xFF00 | self.registers.c as u16);
                true
            }
            (Addressing::High, 2) => {
                self.ins.address = 0xFF00 | self.fetch(mmu) as u16;
                false
            }
            (Addressing::High, _) => {
                self.registers.a = mmu.read_byte(self.ins.address);
                true
            }
            (Addressing::Direct, 2) => {
                self.ins.low = self.fetch(mmu);
                false
            }
            (Addressing::Direct, 3) => {
                self.ins.high = self.fetch(mmu);
                false
            }
            (Addressing::Direct, _) => {
                self.registers.a = mmu.read_byte(self.ins.formed_address());
                true
            }
        }
    }

    fn store_accumulator(&mut self, mmu: &mut Memory, addressing: Addressing) -> bool {
        let a = self.registers.a;
        match (addressing, self.ins.mcycle) {
            (_, 1) => false,
            (Addressing::Bc, _) => {
                mmu.write_byte(self.registers.bc(), a);
                true
            }
            (Addressing::De, _) => {
                mmu.write_byte(self.registers.de(), a);
                true
            }
            (Addressing::HlInc, _) => {
                let hl = self.registers.hl();
                mmu.write_byte(hl, a);
                self.registers.set_hl(hl.wrapping_add(1));
                true
            }
            (Addressing::HlDec, _) => {
                let hl = self.registers.hl();
                mmu.write_byte(hl, a);
                self.registers.set_hl(hl.wrapping_sub(1));
                true
            }
            (Addressing::HighC, _) => {
                mmu.write_byte(0xFF00 | self.registers.c as u16, a);
                true
            }
            (Addressing::High, 2) => {
                self.ins.address = 0xFF00 | self.fetch(mmu) as u16;
                false
            }
            (Addressing::High, _) => {
                mmu.write_byte(self.ins.address, a);
                true
            }
            (Addressing::Direct, 2) => {
                self.ins.low = self.fetch(mmu);
                false
            }
            (Addressing::Direct, 3) => {
                self.ins.high = self.fetch(mmu);
                false
            }
            (Addressing::Direct, _) => {
                mmu.write_byte(self.ins.formed_address(), a);
                true
            }
        }
    }

    // 16-bit loads

    fn load_16bit(&mut self, mmu: &mut Memory, reg: Reg16) -> bool {
        match self.ins.mcycle {
            1 => false,
            2 => {
                self.ins.low = self.fetch(mmu);
                false
            }
            _ => {
                self.ins.high = self.fetch(mmu);
                let value = self.ins.formed_address();
                self.registers.write_reg16(reg, value);
                true
            }
        }
    }

    fn store_stack_pointer(&mut self, mmu: &mut Memory) -> bool {
        match self.ins.mcycle {
            1 => false,
            2 => {
                self.ins.low = self.fetch(mmu);
                false
            }
            3 => {
                self.ins.high = self.fetch(mmu);
                self.ins.address = self.ins.formed_address();
                false
            }
            4 => {
                mmu.write_byte(self.ins.address, self.registers.sp as u8);
                false
            }
            _ => {
                mmu.write_byte(self.ins.address.wrapping_add(1), (self.registers.sp >> 8) as u8);
                true
            }
        }
    }

    // 8-bit arithmetic

    fn inc_dec(&mut self, mmu: &mut Memory, target: Target8, increment: bool) -> bool {
        match (target, self.ins.mcycle) {
            (Target8::Reg(reg), _) => {
                let value = self.registers.read_reg8(reg);
                let result = if increment {
                    self.increment_8bit(value)
                } else {
                    self.decrement_8bit(value)
                };
                self.registers.write_reg8(reg, result);
                true
            }
            (Target8::HlIndirect, 1) => false,
            (Target8::HlIndirect, 2) => {
                self.ins.low = mmu.read_byte(self.registers.hl());
                false
            }
            (Target8::HlIndirect, _) => {
                let result = if increment {
                    self.increment_8bit(self.ins.low)
                } else {
                    self.decrement_8bit(self.ins.low)
                };
                mmu.write_byte(self.registers.hl(), result);
                true
            }
        }
    }

    fn alu_operand(&mut self, mmu: &mut Memory, op: AluOp, operand: Operand8) -> bool {
        match operand {
            Operand8::Reg(source) => {
                let value = self.registers.read_reg8(source);
                self.alu_apply(op, value);
                true
            }
            _ => match self.ins.mcycle {
                1 => false,
                _ => {
                    let value = self.read_operand_late(mmu, operand);
                    self.alu_apply(op, value);
                    true
                }
            },
        }
    }

    /// Second-cycle operand read for the immediate and (HL) forms.
    fn read_operand_late(&mut self, mmu: &mut Memory, operand: Operand8) -> u8 {
        match operand {
            Operand8::Immediate => self.fetch(mmu),
            Operand8::HlIndirect => mmu.read_byte(self.registers.hl()),
            Operand8::Reg(reg) => self.registers.read_reg8(reg),
        }
    }

    // Control flow

    fn condition_met(&self, condition: Condition) -> bool {
        match condition {
            Condition::Always => true,
            Condition::Zero => self.registers.zf(),
            Condition::NotZero => !self.registers.zf(),
            Condition::Carry => self.registers.cf(),
            Condition::NotCarry => !self.registers.cf(),
        }
    }

    fn jump_relative(&mut self, mmu: &mut Memory, condition: Condition) -> bool {
        match self.ins.mcycle {
            1 => false,
            2 => {
                self.ins.low = self.fetch(mmu);
                !self.condition_met(condition)
            }
            _ => {
                let offset = self.ins.low as i8;
                self.registers.pc = self.registers.pc.wrapping_add(offset as u16);
                true
            }
        }
    }

    fn jump_direct(&mut self, mmu: &mut Memory, condition: Condition) -> bool {
        match self.ins.mcycle {
            1 => false,
            2 => {
                self.ins.low = self.fetch(mmu);
                false
            }
            3 => {
                self.ins.high = self.fetch(mmu);
                !self.condition_met(condition)
            }
            _ => {
                self.registers.pc = self.ins.formed_address();
                true
            }
        }
    }

    fn call(&mut self, mmu: &mut Memory, condition: Condition) -> bool {
        match self.ins.mcycle {
            1 => false,
            2 => {
                self.ins.low = self.fetch(mmu);
                false
            }
            3 => {
                self.ins.high = self.fetch(mmu);
                !self.condition_met(condition)
            }
            4 => false,
            5 => {
                let high = (self.registers.pc >> 8) as u8;
                self.push_stack(mmu, high);
                false
            }
            _ => {
                let low = self.registers.pc as u8;
                self.push_stack(mmu, low);
                self.registers.pc = self.ins.formed_address();
                true
            }
        }
    }

    fn return_always(&mut self, mmu: &mut Memory, enable_ime: bool) -> bool {
        match self.ins.mcycle {
            1 => false,
            2 => {
                self.ins.low = self.pop_stack(mmu);
                false
            }
            3 => {
                self.ins.high = self.pop_stack(mmu);
                false
            }
            _ => {
                self.registers.pc = self.ins.formed_address();
                if enable_ime {
                    self.ime = true;
                }
                true
            }
        }
    }

    fn return_conditional(&mut self, mmu: &mut Memory, condition: Condition) -> bool {
        match self.ins.mcycle {
            1 => false,
            2 => !self.condition_met(condition),
            3 => {
                self.ins.low = self.pop_stack(mmu);
                false
            }
            4 => {
                self.ins.high = self.pop_stack(mmu);
                false
            }
            _ => {
                self.registers.pc = self.ins.formed_address();
                true
            }
        }
    }

    fn restart(&mut self, mmu: &mut Memory, vector: u8) -> bool {
        match self.ins.mcycle {
            1 => false,
            2 => false,
            3 => {
                let high = (self.registers.pc >> 8) as u8;
                self.push_stack(mmu, high);
                false
            }
            _ => {
                let low = self.registers.pc as u8;
                self.push_stack(mmu, low);
                self.registers.pc = vector as u16;
                true
            }
        }
    }

    fn push(&mut self, mmu: &mut Memory, reg: Reg16) -> bool {
        match self.ins.mcycle {
            1 => false,
            2 => false,
            3 => {
                let high = (self.registers.read_reg16(reg) >> 8) as u8;
                self.push_stack(mmu, high);
                false
            }
            _ => {
                let low = self.registers.read_reg16(reg) as u8;
                self.push_stack(mmu, low);
                true
            }
        }
    }

    fn pop(&mut self, mmu: &mut Memory, reg: Reg16) -> bool {
        match self.ins.mcycle {
            1 => false,
            2 => {
                self.ins.low = self.pop_stack(mmu);
                false
            }
            _ => {
                self.ins.high = self.pop_stack(mmu);
                let value = self.ins.formed_address();
                self.registers.write_reg16(reg, value);
                true
            }
        }
    }

    /// The interrupt-service pseudo-instruction: two idle cycles, the high
    /// push (after which the dispatch target is re-evaluated), the low
    /// push, then the vector jump and the IF acknowledge.
    fn service_cycle(&mut self, mmu: &mut Memory) -> bool {
        match self.ins.mcycle {
            1 | 2 => false,
            3 => {
                let high = (self.registers.pc >> 8) as u8;
                self.push_stack(mmu, high);

                let pending = mmu.interrupts.pending();
                if pending.is_empty() {
                    // Everything got cancelled mid-dispatch.
                    self.registers.pc = 0x0000;
                    return true;
                }
                if pending.bits() & self.ins.serviced == 0 {
                    // The selected interrupt was cleared: retarget to the
                    // highest-priority survivor and repeat this cycle's
                    // bookkeeping (the push already happened).
                    if let Some(interrupt) = Interrupt::highest_priority(pending) {
                        self.ins.address = interrupt.vector();
                        self.ins.serviced = interrupt.flag().bits();
                    }
                }
                false
            }
            4 => {
                let low = self.registers.pc as u8;
                self.push_stack(mmu, low);
                false
            }
            _ => {
                self.registers.pc = self.ins.address;
                let serviced = self.ins.serviced;
                mmu.interrupts.flag.remove(crate::io::interrupts::InterruptFlags::from_bits_truncate(serviced));
                true
            }
        }
    }

    // Prefixed read-modify-write forms

    fn prefixed_bit(&mut self, mmu: &mut Memory, bit: u8, target: Target8) -> bool {
        let (value, done) = match (target, self.ins.mcycle) {
            (Target8::Reg(reg), _) => (self.registers.read_reg8(reg), true),
            (Target8::HlIndirect, 1) => return false,
            (Target8::HlIndirect, _) => (mmu.read_byte(self.registers.hl()), true),
        };

        self.registers.set_zf(value & 1 << bit == 0);
        self.registers.set_nf(false);
        self.registers.set_hf(true);
        done
    }

    fn prefixed_rmw(&mut self, mmu: &mut Memory, target: Target8, op: PrefixedOp) -> bool {
        match (target, self.ins.mcycle) {
            (Target8::Reg(reg), _) => {
                let value = self.registers.read_reg8(reg);
                let result = self.apply_prefixed(op, value);
                self.registers.write_reg8(reg, result);
                true
            }
            (Target8::HlIndirect, 1) => false,
            (Target8::HlIndirect, 2) => {
                self.ins.low = mmu.read_byte(self.registers.hl());
                false
            }
            (Target8::HlIndirect, _) => {
                let result = self.apply_prefixed(op, self.ins.low);
                mmu.write_byte(self.registers.hl(), result);
                true
            }
        }
    }

    fn apply_prefixed(&mut self, op: PrefixedOp, value: u8) -> u8 {
        match op {
            PrefixedOp::Rotate(rotate) => self.rotate_value(rotate, value),
            PrefixedOp::Res(bit) => value & !(1 << bit),
            PrefixedOp::Set(bit) => value | 1 << bit,
        }
    }
}

#[derive(Debug, Copy, Clone)]
enum PrefixedOp {
    Rotate(RotateOp),
    Res(u8),
    Set(u8),
}
