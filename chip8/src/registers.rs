use std::fmt;

use crate::error::Fault;
use crate::memory::{MEMORY_SIZE, ROM_START_ADDRESS};
use crate::nibble::u4;

pub const STACK_DEPTH: usize = 16;

const VF: u4 = u4::MAX;

/// Bitwise operations of the 8XY1..8XY3 family.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Logic {
    Or,
    And,
    Xor,
}

/// CPU register file: V0-VF, I, PC, the call stack and both timers.
///
/// The flag-producing arithmetic lives here so the VF conventions are
/// written once. Every helper computes its result from the operand values
/// first, stores it, and only then writes VF, so when the destination is VF
/// the flag wins.
#[derive(Clone, PartialEq, Eq)]
pub struct Registers {
    /// General-purpose registers V0-VF (VF is used as a flag register)
    pub v: [u8; 16],
    /// Index register: used for memory operations
    pub i: u16,
    /// Program counter: address of the next instruction to execute
    pub pc: u16,
    /// Stack pointer: number of live return addresses in `stack`
    pub sp: u8,
    pub stack: [u16; STACK_DEPTH],
    /// Delay timer: decrements at 60Hz until it reaches 0
    pub dt: u8,
    /// Sound timer: decrements at 60Hz, beeps while non-zero
    pub st: u8,
}

impl Registers {
    pub fn new() -> Self {
        Self {
            v: [0; 16],
            i: 0,
            pc: ROM_START_ADDRESS as u16,
            sp: 0,
            stack: [0; STACK_DEPTH],
            dt: 0,
            st: 0,
        }
    }

    pub fn get(&self, reg: u4) -> u8 {
        self.v[reg]
    }

    pub fn set(&mut self, reg: u4, value: u8) {
        self.v[reg] = value;
    }

    pub fn flag(&self) -> u8 {
        self.v[VF]
    }

    /// Live part of the call stack, oldest frame first.
    pub fn frames(&self) -> &[u16] {
        &self.stack[..self.sp as usize]
    }

    pub fn push(&mut self, return_address: u16, target: u16) -> Result<(), Fault> {
        let sp = self.sp as usize;
        if sp == STACK_DEPTH {
            return Err(Fault::StackOverflow { address: target });
        }
        self.stack[sp] = return_address;
        self.sp += 1;
        Ok(())
    }

    pub fn pop(&mut self) -> Result<u16, Fault> {
        let address = self.peek()?;
        self.sp -= 1;
        Ok(address)
    }

    /// Return address `pop` would yield, without removing it.
    pub fn peek(&self) -> Result<u16, Fault> {
        self.frames().last().copied().ok_or(Fault::StackUnderflow)
    }

    /// Vx = Vx + Vy, VF = 1 on carry.
    pub fn add_with_carry(&mut self, x: u4, y: u4) {
        let (res, carry) = self.v[x].overflowing_add(self.v[y]);
        self.v[x] = res;
        self.v[VF] = carry as u8;
    }

    /// Vx = Vx - Vy, VF = 1 when there was no borrow (Vx >= Vy).
    pub fn sub_with_borrow(&mut self, x: u4, y: u4) {
        let (res, borrow) = self.v[x].overflowing_sub(self.v[y]);
        self.v[x] = res;
        self.v[VF] = !borrow as u8;
    }

    /// Vx = Vy - Vx, VF = 1 when there was no borrow (Vy >= Vx).
    pub fn sub_reverse(&mut self, x: u4, y: u4) {
        let (res, borrow) = self.v[y].overflowing_sub(self.v[x]);
        self.v[x] = res;
        self.v[VF] = !borrow as u8;
    }

    /// Vx = Vsrc >> 1, VF = the bit shifted out.
    pub fn shift_right(&mut self, x: u4, src: u4) {
        let value = self.v[src];
        self.v[x] = value >> 1;
        self.v[VF] = value & 0x01;
    }

    /// Vx = Vsrc << 1, VF = the bit shifted out.
    pub fn shift_left(&mut self, x: u4, src: u4) {
        let value = self.v[src];
        self.v[x] = value << 1;
        self.v[VF] = (value >> 7) & 0x01;
    }

    pub fn logic(&mut self, x: u4, y: u4, op: Logic, reset_flag: bool) {
        let (a, b) = (self.v[x], self.v[y]);
        self.v[x] = match op {
            Logic::Or => a | b,
            Logic::And => a & b,
            Logic::Xor => a ^ b,
        };
        if reset_flag {
            self.v[VF] = 0;
        }
    }

    /// I = I + Vx, wrapping within addressable memory.
    pub fn add_index(&mut self, x: u4) {
        self.i = (self.i.wrapping_add(self.v[x].into())) % MEMORY_SIZE as u16;
    }

    /// Counts both timers down by one, stopping at zero.
    pub fn tick_timers(&mut self) {
        self.dt = self.dt.saturating_sub(1);
        self.st = self.st.saturating_sub(1);
    }
}

impl Default for Registers {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Registers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut dbg = f.debug_struct("Registers");
        for reg in u4::all() {
            dbg.field(&format!("V{reg}"), &format_args!("{:02X}", self.v[reg]));
        }
        dbg.field("i", &format_args!("{:03X}", self.i))
            .field("pc", &format_args!("{:03X}", self.pc))
            .field("sp", &self.sp)
            .field("stack", &format_args!("{:03X?}", self.frames()))
            .field("dt", &format_args!("{:02X}", self.dt))
            .field("st", &format_args!("{:02X}", self.st))
            .finish()
    }
}
