use rand::{Rng, RngCore};

use crate::display::DisplayBuffer;
use crate::error::Fault;
use crate::font;
use crate::keypad::Keypad;
use crate::memory::{MEMORY_SIZE, Memory, ROM_START_ADDRESS};
use crate::nibble::u4;
use crate::opcode::{AluOp, Opcode};
use crate::quirks::Quirks;
use crate::registers::{Logic, Registers};

/// What an executed instruction asks of the machine besides its state change.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Effect {
    Continue,
    Drew,
    AwaitKey(u4),
}

/// Everything one instruction may touch, borrowed for the duration of a step.
///
/// Each arm of [`Executor::execute`] does all of its fallible work (PC target,
/// stack depth, memory range) before its first write, so a fault leaves the
/// machine untouched.
pub(crate) struct Executor<'a> {
    pub memory: &'a mut Memory,
    pub regs: &'a mut Registers,
    pub display: &'a mut DisplayBuffer,
    pub keypad: &'a mut Keypad,
    pub rng: &'a mut dyn RngCore,
    pub quirks: Quirks,
}

impl Executor<'_> {
    pub fn execute(mut self, opcode: Opcode) -> Result<Effect, Fault> {
        let mut effect = Effect::Continue;

        let next_pc = match opcode {
            Opcode::Sys { nnn } => {
                let next = self.advance(2)?;
                log::debug!("ignoring machine code call to {nnn:#05X}");
                next
            }
            Opcode::ClearDisplay => {
                let next = self.advance(2)?;
                self.display.clear();
                next
            }
            Opcode::Jump { nnn } => checked_pc(nnn)?,
            Opcode::JumpWithOffset { nnn } => checked_pc(nnn + u16::from(self.regs.v[0]))?,
            Opcode::Call { nnn } => {
                let target = checked_pc(nnn)?;
                self.regs.push(self.regs.pc + 2, target)?;
                target
            }
            Opcode::Return => {
                let target = checked_pc(self.regs.peek()?)?;
                self.regs.pop()?;
                target
            }
            Opcode::SkipRegEqualImm { x, nn } => self.skip_if(self.regs.v[x] == nn)?,
            Opcode::SkipRegNotEqualImm { x, nn } => self.skip_if(self.regs.v[x] != nn)?,
            Opcode::SkipRegEqualReg { x, y } => self.skip_if(self.regs.v[x] == self.regs.v[y])?,
            Opcode::SkipRegNotEqualReg { x, y } => {
                self.skip_if(self.regs.v[x] != self.regs.v[y])?
            }
            Opcode::SetRegImm { x, nn } => {
                let next = self.advance(2)?;
                self.regs.v[x] = nn;
                next
            }
            Opcode::AddRegImm { x, nn } => {
                let next = self.advance(2)?;
                self.regs.v[x] = self.regs.v[x].wrapping_add(nn);
                next
            }
            Opcode::Alu { x, y, op } => {
                let next = self.advance(2)?;
                self.execute_alu(x, y, op);
                next
            }
            Opcode::Random { x, nn } => {
                let next = self.advance(2)?;
                let rand_byte: u8 = self.rng.random();
                self.regs.v[x] = rand_byte & nn;
                next
            }
            Opcode::SetIndexImm { nnn } => {
                let next = self.advance(2)?;
                self.regs.i = nnn;
                next
            }
            Opcode::AddIndexReg { x } => {
                let next = self.advance(2)?;
                self.regs.add_index(x);
                next
            }
            Opcode::Draw { x, y, n } => {
                let next = self.advance(2)?;
                let sprite = self.memory.slice(self.regs.i, usize::from(n))?;
                let x_pos = usize::from(self.regs.v[x]);
                let y_pos = usize::from(self.regs.v[y]);
                let collided = self.display.draw_sprite(x_pos, y_pos, sprite);
                self.regs.v[u4::MAX] = collided as u8;
                effect = Effect::Drew;
                next
            }
            Opcode::SkipIfPressed { x } => {
                let key = u4::from_low_bits(self.regs.v[x]);
                self.skip_if(self.keypad.is_pressed(key))?
            }
            Opcode::SkipIfNotPressed { x } => {
                let key = u4::from_low_bits(self.regs.v[x]);
                self.skip_if(!self.keypad.is_pressed(key))?
            }
            Opcode::WaitForKey { x } => {
                let next = self.advance(2)?;
                self.keypad.arm();
                effect = Effect::AwaitKey(x);
                next
            }
            Opcode::ReadDelayTimer { x } => {
                let next = self.advance(2)?;
                self.regs.v[x] = self.regs.dt;
                next
            }
            Opcode::SetDelayTimer { x } => {
                let next = self.advance(2)?;
                self.regs.dt = self.regs.v[x];
                next
            }
            Opcode::SetSoundTimer { x } => {
                let next = self.advance(2)?;
                self.regs.st = self.regs.v[x];
                next
            }
            Opcode::FontChar { x } => {
                let next = self.advance(2)?;
                self.regs.i = font::glyph_address(self.regs.v[x]);
                next
            }
            Opcode::Bcd { x } => {
                let next = self.advance(2)?;
                let value = self.regs.v[x];
                self.memory
                    .slice_mut(self.regs.i, 3)?
                    .copy_from_slice(&[value / 100, (value / 10) % 10, value % 10]);
                next
            }
            Opcode::StoreRegs { x } => {
                let next = self.advance(2)?;
                let count = usize::from(x) + 1;
                self.memory
                    .slice_mut(self.regs.i, count)?
                    .copy_from_slice(&self.regs.v[..count]);
                self.bump_index(count);
                next
            }
            Opcode::LoadRegs { x } => {
                let next = self.advance(2)?;
                let count = usize::from(x) + 1;
                let bytes = self.memory.slice(self.regs.i, count)?;
                self.regs.v[..count].copy_from_slice(bytes);
                self.bump_index(count);
                next
            }
            Opcode::Unknown(opcode) => {
                return Err(Fault::UnknownOpcode { opcode });
            }
        };

        self.regs.pc = next_pc;
        Ok(effect)
    }

    fn execute_alu(&mut self, x: u4, y: u4, op: AluOp) {
        let reset_flag = self.quirks.logic_resets_vf;
        let shift_source = if self.quirks.shift_uses_vy { y } else { x };

        match op {
            AluOp::Set => self.regs.v[x] = self.regs.v[y],
            AluOp::Or => self.regs.logic(x, y, Logic::Or, reset_flag),
            AluOp::And => self.regs.logic(x, y, Logic::And, reset_flag),
            AluOp::Xor => self.regs.logic(x, y, Logic::Xor, reset_flag),
            AluOp::Add => self.regs.add_with_carry(x, y),
            AluOp::Sub => self.regs.sub_with_borrow(x, y),
            AluOp::SubReverse => self.regs.sub_reverse(x, y),
            AluOp::ShiftRight => self.regs.shift_right(x, shift_source),
            AluOp::ShiftLeft => self.regs.shift_left(x, shift_source),
        }
    }

    /// PC of the instruction `bytes` past the current one.
    ///
    /// Stepping off the last word of memory is allowed here; the following
    /// fetch is what faults.
    fn advance(&self, bytes: u16) -> Result<u16, Fault> {
        let next = self.regs.pc + bytes;
        if usize::from(next) <= MEMORY_SIZE {
            Ok(next)
        } else {
            Err(Fault::OutOfBounds { address: next })
        }
    }

    fn skip_if(&self, condition: bool) -> Result<u16, Fault> {
        self.advance(if condition { 4 } else { 2 })
    }

    fn bump_index(&mut self, count: usize) {
        if self.quirks.load_store_increments_i {
            self.regs.i = (self.regs.i + count as u16) % MEMORY_SIZE as u16;
        }
    }
}

/// Accepts `address` as a jump or return target only if it is an even
/// address in program memory.
pub(crate) fn checked_pc(address: u16) -> Result<u16, Fault> {
    if address % 2 == 0 && (ROM_START_ADDRESS..MEMORY_SIZE).contains(&usize::from(address)) {
        Ok(address)
    } else {
        Err(Fault::OutOfBounds { address })
    }
}
