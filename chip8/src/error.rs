/// Error returned when a ROM cannot be installed into memory.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoadError {
    #[error("ROM is too large ({size} bytes), max size is {max_size} bytes")]
    RomTooLarge { size: usize, max_size: usize },
}

/// A terminal condition raised by a single [`Machine::step`](crate::Machine::step).
///
/// A step that faults leaves the machine exactly as it was before the step.
/// The host decides whether to halt or to reload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Fault {
    #[error("Memory access out of bounds at address {address:#06X}")]
    OutOfBounds { address: u16 },

    #[error("Stack overflow: call to {address:#05X} exceeds the 16-entry call stack")]
    StackOverflow { address: u16 },

    #[error("Stack underflow: attempted to return from a subroutine with empty call stack")]
    StackUnderflow,

    #[error("Unknown opcode: {opcode:#06X}")]
    UnknownOpcode { opcode: u16 },
}
