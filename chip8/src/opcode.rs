use std::fmt;

use crate::nibble::u4;

/// CHIP-8 instruction opcodes.
///
/// The fields (x, y, n, nn, nnn) correspond to the operands encoded in the opcode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Opcode {
    /// 0nnn - Call machine code routine at nnn (ignored).
    Sys { nnn: u16 },

    /// 1nnn - Jump to location nnn.
    Jump { nnn: u16 },
    /// Bnnn - Jump to location nnn + V0.
    JumpWithOffset { nnn: u16 },

    /// 2nnn - Call subroutine at nnn.
    Call { nnn: u16 },
    /// 00EE - Return from a subroutine.
    Return,

    /// 3xnn - Skip next instruction if Vx == nn.
    SkipRegEqualImm { x: u4, nn: u8 },
    /// 4xnn - Skip next instruction if Vx != nn.
    SkipRegNotEqualImm { x: u4, nn: u8 },
    /// 5xy0 - Skip next instruction if Vx == Vy.
    SkipRegEqualReg { x: u4, y: u4 },
    /// 9xy0 - Skip next instruction if Vx != Vy.
    SkipRegNotEqualReg { x: u4, y: u4 },

    /// 6xnn - Set Vx = nn.
    SetRegImm { x: u4, nn: u8 },
    /// 7xnn - Set Vx = Vx + nn.
    AddRegImm { x: u4, nn: u8 },
    /// Annn - Set I = nnn.
    SetIndexImm { nnn: u16 },
    /// Fx1E - Set I = I + Vx.
    AddIndexReg { x: u4 },

    /// 8xyN - ALU operations
    Alu { x: u4, y: u4, op: AluOp },
    /// Cxnn - Set Vx = random byte AND nn.
    Random { x: u4, nn: u8 },

    /// 00E0 - Clear the display.
    ClearDisplay,
    /// Dxyn - Draw n-byte sprite from memory at I at (Vx, Vy), set VF = collision.
    Draw { x: u4, y: u4, n: u4 },

    /// Ex9E - Skip next instruction if key Vx is pressed.
    SkipIfPressed { x: u4 },
    /// ExA1 - Skip next instruction if key Vx is not pressed.
    SkipIfNotPressed { x: u4 },
    /// Fx0A - Wait for a key press, store the key in Vx.
    WaitForKey { x: u4 },

    /// Fx07 - Set Vx = delay timer.
    ReadDelayTimer { x: u4 },
    /// Fx15 - Set delay timer = Vx.
    SetDelayTimer { x: u4 },
    /// Fx18 - Set sound timer = Vx.
    SetSoundTimer { x: u4 },

    /// Fx29 - Set I = address of the font glyph for digit Vx.
    FontChar { x: u4 },
    /// Fx33 - Store BCD of Vx at I, I+1, I+2.
    Bcd { x: u4 },

    /// Fx55 - Store V0..=Vx in memory starting at I.
    StoreRegs { x: u4 },
    /// Fx65 - Read V0..=Vx from memory starting at I.
    LoadRegs { x: u4 },

    /// Any word that is not a CHIP-8 instruction.
    Unknown(u16),
}

/// The 8xyN family.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AluOp {
    Set,
    Or,
    And,
    Xor,
    Add,
    Sub,
    ShiftRight,
    SubReverse,
    ShiftLeft,
}

impl Opcode {
    /// Decode a 16-bit raw opcode into an Opcode enum variant
    pub fn decode(opcode: u16) -> Self {
        let nibble = (
            ((opcode & 0xF000) >> 12) as u8,
            ((opcode & 0x0F00) >> 8) as u8,
            ((opcode & 0x00F0) >> 4) as u8,
            (opcode & 0x000F) as u8,
        );

        let x = u4::new(nibble.1);
        let y = u4::new(nibble.2);
        let n = u4::new(nibble.3);
        let nn = (opcode & 0x00FF) as u8;
        let nnn = opcode & 0x0FFF;

        match nibble {
            (0x0, 0x0, 0xE, 0x0) => Opcode::ClearDisplay,
            (0x0, 0x0, 0xE, 0xE) => Opcode::Return,
            (0x0, _, _, _) => Opcode::Sys { nnn },
            (0x1, _, _, _) => Opcode::Jump { nnn },
            (0x2, _, _, _) => Opcode::Call { nnn },
            (0x3, _, _, _) => Opcode::SkipRegEqualImm { x, nn },
            (0x4, _, _, _) => Opcode::SkipRegNotEqualImm { x, nn },
            (0x5, _, _, 0x0) => Opcode::SkipRegEqualReg { x, y },
            (0x6, _, _, _) => Opcode::SetRegImm { x, nn },
            (0x7, _, _, _) => Opcode::AddRegImm { x, nn },
            (0x8, _, _, _) => Opcode::Alu {
                x,
                y,
                op: match nibble.3 {
                    0x0 => AluOp::Set,
                    0x1 => AluOp::Or,
                    0x2 => AluOp::And,
                    0x3 => AluOp::Xor,
                    0x4 => AluOp::Add,
                    0x5 => AluOp::Sub,
                    0x6 => AluOp::ShiftRight,
                    0x7 => AluOp::SubReverse,
                    0xE => AluOp::ShiftLeft,
                    _ => return Opcode::Unknown(opcode),
                },
            },
            (0x9, _, _, 0x0) => Opcode::SkipRegNotEqualReg { x, y },
            (0xA, _, _, _) => Opcode::SetIndexImm { nnn },
            (0xB, _, _, _) => Opcode::JumpWithOffset { nnn },
            (0xC, _, _, _) => Opcode::Random { x, nn },
            (0xD, _, _, _) => Opcode::Draw { x, y, n },
            (0xE, _, 0x9, 0xE) => Opcode::SkipIfPressed { x },
            (0xE, _, 0xA, 0x1) => Opcode::SkipIfNotPressed { x },
            (0xF, _, 0x0, 0x7) => Opcode::ReadDelayTimer { x },
            (0xF, _, 0x0, 0xA) => Opcode::WaitForKey { x },
            (0xF, _, 0x1, 0x5) => Opcode::SetDelayTimer { x },
            (0xF, _, 0x1, 0x8) => Opcode::SetSoundTimer { x },
            (0xF, _, 0x1, 0xE) => Opcode::AddIndexReg { x },
            (0xF, _, 0x2, 0x9) => Opcode::FontChar { x },
            (0xF, _, 0x3, 0x3) => Opcode::Bcd { x },
            (0xF, _, 0x5, 0x5) => Opcode::StoreRegs { x },
            (0xF, _, 0x6, 0x5) => Opcode::LoadRegs { x },

            _ => Opcode::Unknown(opcode),
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Opcode::Sys { nnn } => write!(f, "SYS {nnn:#05X}"),
            Opcode::Jump { nnn } => write!(f, "JP {nnn:#05X}"),
            Opcode::JumpWithOffset { nnn } => write!(f, "JP V0, {nnn:#05X}"),
            Opcode::Call { nnn } => write!(f, "CALL {nnn:#05X}"),
            Opcode::Return => write!(f, "RET"),
            Opcode::SkipRegEqualImm { x, nn } => write!(f, "SE V{x}, {nn:#04X}"),
            Opcode::SkipRegNotEqualImm { x, nn } => write!(f, "SNE V{x}, {nn:#04X}"),
            Opcode::SkipRegEqualReg { x, y } => write!(f, "SE V{x}, V{y}"),
            Opcode::SkipRegNotEqualReg { x, y } => write!(f, "SNE V{x}, V{y}"),
            Opcode::SetRegImm { x, nn } => write!(f, "LD V{x}, {nn:#04X}"),
            Opcode::AddRegImm { x, nn } => write!(f, "ADD V{x}, {nn:#04X}"),
            Opcode::SetIndexImm { nnn } => write!(f, "LD I, {nnn:#05X}"),
            Opcode::AddIndexReg { x } => write!(f, "ADD I, V{x}"),
            Opcode::Alu { x, y, op } => {
                let mnemonic = match op {
                    AluOp::Set => "LD",
                    AluOp::Or => "OR",
                    AluOp::And => "AND",
                    AluOp::Xor => "XOR",
                    AluOp::Add => "ADD",
                    AluOp::Sub => "SUB",
                    AluOp::ShiftRight => "SHR",
                    AluOp::SubReverse => "SUBN",
                    AluOp::ShiftLeft => "SHL",
                };
                write!(f, "{mnemonic} V{x}, V{y}")
            }
            Opcode::Random { x, nn } => write!(f, "RND V{x}, {nn:#04X}"),
            Opcode::ClearDisplay => write!(f, "CLS"),
            Opcode::Draw { x, y, n } => write!(f, "DRW V{x}, V{y}, {}", n.get()),
            Opcode::SkipIfPressed { x } => write!(f, "SKP V{x}"),
            Opcode::SkipIfNotPressed { x } => write!(f, "SKNP V{x}"),
            Opcode::WaitForKey { x } => write!(f, "LD V{x}, K"),
            Opcode::ReadDelayTimer { x } => write!(f, "LD V{x}, DT"),
            Opcode::SetDelayTimer { x } => write!(f, "LD DT, V{x}"),
            Opcode::SetSoundTimer { x } => write!(f, "LD ST, V{x}"),
            Opcode::FontChar { x } => write!(f, "LD F, V{x}"),
            Opcode::Bcd { x } => write!(f, "LD B, V{x}"),
            Opcode::StoreRegs { x } => write!(f, "LD [I], V{x}"),
            Opcode::LoadRegs { x } => write!(f, "LD V{x}, [I]"),
            Opcode::Unknown(word) => write!(f, "DW {word:#06X}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn r(n: u8) -> u4 {
        u4::new(n)
    }

    #[test]
    fn decodes_the_full_table() {
        let table = [
            (0x00E0, Opcode::ClearDisplay),
            (0x00EE, Opcode::Return),
            (0x0123, Opcode::Sys { nnn: 0x123 }),
            (0x1ABC, Opcode::Jump { nnn: 0xABC }),
            (0x2ABC, Opcode::Call { nnn: 0xABC }),
            (0x31AA, Opcode::SkipRegEqualImm { x: r(1), nn: 0xAA }),
            (0x42BB, Opcode::SkipRegNotEqualImm { x: r(2), nn: 0xBB }),
            (0x5340, Opcode::SkipRegEqualReg { x: r(3), y: r(4) }),
            (0x65CC, Opcode::SetRegImm { x: r(5), nn: 0xCC }),
            (0x76DD, Opcode::AddRegImm { x: r(6), nn: 0xDD }),
            (0x8120, Opcode::Alu { x: r(1), y: r(2), op: AluOp::Set }),
            (0x8121, Opcode::Alu { x: r(1), y: r(2), op: AluOp::Or }),
            (0x8122, Opcode::Alu { x: r(1), y: r(2), op: AluOp::And }),
            (0x8123, Opcode::Alu { x: r(1), y: r(2), op: AluOp::Xor }),
            (0x8124, Opcode::Alu { x: r(1), y: r(2), op: AluOp::Add }),
            (0x8125, Opcode::Alu { x: r(1), y: r(2), op: AluOp::Sub }),
            (0x8126, Opcode::Alu { x: r(1), y: r(2), op: AluOp::ShiftRight }),
            (0x8127, Opcode::Alu { x: r(1), y: r(2), op: AluOp::SubReverse }),
            (0x812E, Opcode::Alu { x: r(1), y: r(2), op: AluOp::ShiftLeft }),
            (0x9AB0, Opcode::SkipRegNotEqualReg { x: r(0xA), y: r(0xB) }),
            (0xA123, Opcode::SetIndexImm { nnn: 0x123 }),
            (0xB456, Opcode::JumpWithOffset { nnn: 0x456 }),
            (0xC70F, Opcode::Random { x: r(7), nn: 0x0F }),
            (0xD125, Opcode::Draw { x: r(1), y: r(2), n: r(5) }),
            (0xE39E, Opcode::SkipIfPressed { x: r(3) }),
            (0xE4A1, Opcode::SkipIfNotPressed { x: r(4) }),
            (0xF507, Opcode::ReadDelayTimer { x: r(5) }),
            (0xF60A, Opcode::WaitForKey { x: r(6) }),
            (0xF715, Opcode::SetDelayTimer { x: r(7) }),
            (0xF818, Opcode::SetSoundTimer { x: r(8) }),
            (0xF91E, Opcode::AddIndexReg { x: r(9) }),
            (0xFA29, Opcode::FontChar { x: r(0xA) }),
            (0xFB33, Opcode::Bcd { x: r(0xB) }),
            (0xFC55, Opcode::StoreRegs { x: r(0xC) }),
            (0xFD65, Opcode::LoadRegs { x: r(0xD) }),
        ];

        for (word, expected) in table {
            assert_eq!(Opcode::decode(word), expected, "decoding {word:#06X}");
        }
    }

    #[test]
    fn reserved_patterns_decode_as_unknown() {
        for word in [0x5121, 0x900F, 0x8008, 0x800F, 0xE000, 0xE19F, 0xF000, 0xFF66] {
            assert_eq!(Opcode::decode(word), Opcode::Unknown(word), "{word:#06X}");
        }
    }

    #[test]
    fn decode_is_total() {
        // Fixed-pattern families contribute one word per operand combination,
        // so the count of known words is determined by the table.
        let known = (0..=u16::MAX)
            .filter(|&word| !matches!(Opcode::decode(word), Opcode::Unknown(_)))
            .count();

        let full = 0x1000;
        let xy = 0x100;
        let x = 0x10;
        // 0 (all of 0nnn), 1, 2, 3, 4, 6, 7, A, B, C, D take every operand;
        // 5, 9 take one low nibble; 8 takes nine; E takes two; F takes nine.
        let expected = 11 * full + 2 * xy + 9 * xy + 2 * x + 9 * x;
        assert_eq!(known, expected);
    }

    #[test]
    fn renders_mnemonics() {
        assert_eq!(Opcode::decode(0x6005).to_string(), "LD V0, 0x05");
        assert_eq!(Opcode::decode(0x8014).to_string(), "ADD V0, V1");
        assert_eq!(Opcode::decode(0xD015).to_string(), "DRW V0, V1, 5");
        assert_eq!(Opcode::decode(0x2ABC).to_string(), "CALL 0xABC");
        assert_eq!(Opcode::decode(0xFA55).to_string(), "LD [I], VA");
        assert_eq!(Opcode::decode(0x812E).to_string(), "SHL V1, V2");
        assert_eq!(Opcode::decode(0x5121).to_string(), "DW 0x5121");
    }
}
