use std::fmt;

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

use crate::display::{DisplayBuffer, Framebuffer};
use crate::error::{Fault, LoadError};
use crate::execute::{Effect, Executor};
use crate::keypad::{KEY_COUNT, Keypad};
use crate::memory::Memory;
use crate::nibble::u4;
use crate::opcode::Opcode;
use crate::quirks::Quirks;
use crate::registers::Registers;

/// Whether the machine is executing or parked on Fx0A.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    Running,
    /// Waiting for a fresh key press to store in the given register.
    AwaitingKey(u4),
}

/// Result of a successful [`Machine::step`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepResult {
    /// An instruction ran (or a pending key wait completed).
    Continue,
    /// A sprite was drawn; hosts emulating display wait render before stepping again.
    Drew,
    /// No instruction ran because the machine is waiting for a key press.
    AwaitingKey,
}

/// CHIP-8 virtual machine.
///
/// The host drives it with two independent clocks: [`step`](Self::step) at
/// the CPU rate and [`tick_timers`](Self::tick_timers) at 60Hz. The machine
/// never sleeps or reads the time itself.
pub struct Machine {
    memory: Memory,
    regs: Registers,
    display: DisplayBuffer,
    keypad: Keypad,
    mode: Mode,
    quirks: Quirks,
    rng: Box<dyn RngCore + Send>,
}

impl Machine {
    /// Creates a machine with an OS-seeded random source and modern quirks.
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_os_rng())
    }

    /// Creates a machine whose `Cxnn` results come from `rng`.
    pub fn with_rng(rng: impl RngCore + Send + 'static) -> Self {
        Self {
            memory: Memory::new(),
            regs: Registers::new(),
            display: DisplayBuffer::new(),
            keypad: Keypad::new(),
            mode: Mode::Running,
            quirks: Quirks::default(),
            rng: Box::new(rng),
        }
    }

    /// Creates a machine with a reproducible random sequence.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    pub fn with_quirks(mut self, quirks: Quirks) -> Self {
        log::debug!("using quirks {quirks:?}");
        self.quirks = quirks;
        self
    }

    /// Resets all state and loads `rom` at 0x200.
    ///
    /// On error the machine is left as it was.
    pub fn load(&mut self, rom: &[u8]) -> Result<(), LoadError> {
        let mut memory = Memory::new();
        memory.load_rom(rom)?;

        self.memory = memory;
        self.regs = Registers::new();
        self.display = DisplayBuffer::new();
        self.keypad = Keypad::new();
        self.mode = Mode::Running;

        log::debug!("loaded {} byte ROM", rom.len());
        Ok(())
    }

    /// Executes exactly one instruction.
    ///
    /// While waiting on Fx0A no instruction runs; the step only checks
    /// whether a key has been pressed. A fault leaves the machine exactly as
    /// it was before the call.
    pub fn step(&mut self) -> Result<StepResult, Fault> {
        if let Mode::AwaitingKey(x) = self.mode {
            return Ok(self.poll_key(x));
        }

        let pc = self.regs.pc;
        let result = self.fetch().and_then(|word| {
            let opcode = Opcode::decode(word);
            log::trace!("{pc:03X}: {word:04X}  {opcode}");
            self.executor().execute(opcode)
        });

        match result {
            Ok(Effect::Continue) => Ok(StepResult::Continue),
            Ok(Effect::Drew) => Ok(StepResult::Drew),
            Ok(Effect::AwaitKey(x)) => {
                self.mode = Mode::AwaitingKey(x);
                Ok(StepResult::AwaitingKey)
            }
            Err(fault) => {
                log::warn!("fault at {pc:#05X}: {fault}");
                Err(fault)
            }
        }
    }

    /// Counts both timers down by one. Should be called at 60Hz.
    pub fn tick_timers(&mut self) {
        self.regs.tick_timers();
    }

    /// Returns true if the sound timer is greater than zero, indicating a beep should be played.
    pub fn wants_sound(&self) -> bool {
        self.regs.st > 0
    }

    pub fn framebuffer(&self) -> &Framebuffer {
        self.display.snapshot()
    }

    /// Get the state of a pixel on the display (true = on, false = off).
    pub fn pixel(&self, x: usize, y: usize) -> bool {
        self.display.pixel(x, y)
    }

    /// Replaces the whole keypad snapshot. Call once per host frame.
    pub fn set_keys(&mut self, state: [bool; KEY_COUNT]) {
        self.keypad.set_keys(state);
    }

    /// Set the state of a key on the keypad.
    pub fn set_key(&mut self, key: u4, pressed: bool) {
        self.keypad.set_key(key, pressed);
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn quirks(&self) -> Quirks {
        self.quirks
    }

    pub fn pc(&self) -> u16 {
        self.regs.pc
    }

    pub fn index(&self) -> u16 {
        self.regs.i
    }

    pub fn v(&self, reg: u4) -> u8 {
        self.regs.get(reg)
    }

    pub fn registers(&self) -> &Registers {
        &self.regs
    }

    /// Live return addresses, oldest first.
    pub fn stack(&self) -> &[u16] {
        self.regs.frames()
    }

    pub fn delay_timer(&self) -> u8 {
        self.regs.dt
    }

    pub fn sound_timer(&self) -> u8 {
        self.regs.st
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    fn fetch(&self) -> Result<u16, Fault> {
        self.memory.read_word(self.regs.pc)
    }

    fn executor(&mut self) -> Executor<'_> {
        Executor {
            memory: &mut self.memory,
            regs: &mut self.regs,
            display: &mut self.display,
            keypad: &mut self.keypad,
            rng: &mut *self.rng,
            quirks: self.quirks,
        }
    }

    fn poll_key(&mut self, x: u4) -> StepResult {
        match self.keypad.wait_for_key() {
            Some(key) => {
                log::debug!("key {key} pressed, storing in V{x}");
                self.regs.set(x, key.get());
                self.mode = Mode::Running;
                StepResult::Continue
            }
            None => StepResult::AwaitingKey,
        }
    }
}

impl Default for Machine {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Machine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Machine")
            .field("regs", &self.regs)
            .field("mode", &self.mode)
            .field("quirks", &self.quirks)
            .finish_non_exhaustive()
    }
}
