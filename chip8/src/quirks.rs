/// Opcode behaviors that differ between CHIP-8 interpreters.
///
/// `Quirks::default()` is the modern convention most ROMs written after the
/// HP-48 era expect. [`Quirks::cosmac`] reproduces the original COSMAC VIP
/// interpreter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Quirks {
    /// 8xy6/8xyE shift Vy into Vx instead of shifting Vx in place.
    pub shift_uses_vy: bool,
    /// 8xy1/8xy2/8xy3 clear VF.
    pub logic_resets_vf: bool,
    /// Fx55/Fx65 leave I pointing past the last register transferred.
    pub load_store_increments_i: bool,
    /// Draws wait for the next frame, capping sprite draws at 60 per second.
    pub display_wait: bool,
}

impl Quirks {
    pub const fn modern() -> Self {
        Self {
            shift_uses_vy: false,
            logic_resets_vf: false,
            load_store_increments_i: false,
            display_wait: false,
        }
    }

    pub const fn cosmac() -> Self {
        Self {
            shift_uses_vy: true,
            logic_resets_vf: true,
            load_store_increments_i: true,
            display_wait: true,
        }
    }
}
