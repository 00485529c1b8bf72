//! CHIP-8 virtual machine core.
//!
//! [`Machine`] owns memory, registers, the display buffer and the keypad.
//! A host loads a ROM, calls [`Machine::step`] at the CPU rate and
//! [`Machine::tick_timers`] at 60Hz, and reads back the framebuffer and the
//! sound flag. [`Runner`] does that bookkeeping for hosts that measure frame
//! time.

mod display;
mod error;
mod execute;
mod font;
mod keypad;
mod machine;
mod memory;
mod nibble;
mod opcode;
mod quirks;
mod registers;
mod runner;

pub use display::{DISPLAY_X, DISPLAY_Y, DisplayBuffer, Framebuffer, Grid};
pub use error::{Fault, LoadError};
pub use font::{FONT, FONT_START_ADDRESS, GLYPH_HEIGHT};
pub use keypad::{KEY_COUNT, Keypad};
pub use machine::{Machine, Mode, StepResult};
pub use memory::{MAX_ROM_SIZE, MEMORY_SIZE, Memory, ROM_START_ADDRESS};
pub use nibble::u4;
pub use opcode::{AluOp, Opcode};
pub use quirks::Quirks;
pub use registers::{Logic, Registers, STACK_DEPTH};
pub use runner::{CPU_HZ, Runner, TIMER_HZ};
