use chip8::{KEY_COUNT, u4};
use winit::keyboard::{KeyCode, PhysicalKey};

/// Physical keyboard keys for the CHIP-8 hex keypad, indexed by key value.
///
/// The left-hand 4x4 block `1234/QWER/ASDF/ZXCV` stands in for the
/// `123C/456D/789E/A0BF` pad.
pub const KEY_MAP: [KeyCode; KEY_COUNT] = [
    KeyCode::KeyX,   // 0x00
    KeyCode::Digit1, // 0x01
    KeyCode::Digit2, // 0x02
    KeyCode::Digit3, // 0x03
    KeyCode::KeyQ,   // 0x04
    KeyCode::KeyW,   // 0x05
    KeyCode::KeyE,   // 0x06
    KeyCode::KeyA,   // 0x07
    KeyCode::KeyS,   // 0x08
    KeyCode::KeyD,   // 0x09
    KeyCode::KeyZ,   // 0x0A
    KeyCode::KeyC,   // 0x0B
    KeyCode::Digit4, // 0x0C
    KeyCode::KeyR,   // 0x0D
    KeyCode::KeyF,   // 0x0E
    KeyCode::KeyV,   // 0x0F
];

/// Keypad key bound to `physical`, if any.
pub fn chip8_key(physical: PhysicalKey) -> Option<u4> {
    let PhysicalKey::Code(code) = physical else {
        return None;
    };
    KEY_MAP
        .iter()
        .position(|&k| k == code)
        .map(|index| u4::new(index as u8))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_matches_hex_pad() {
        let rows = [
            [KeyCode::Digit1, KeyCode::Digit2, KeyCode::Digit3, KeyCode::Digit4],
            [KeyCode::KeyQ, KeyCode::KeyW, KeyCode::KeyE, KeyCode::KeyR],
            [KeyCode::KeyA, KeyCode::KeyS, KeyCode::KeyD, KeyCode::KeyF],
            [KeyCode::KeyZ, KeyCode::KeyX, KeyCode::KeyC, KeyCode::KeyV],
        ];
        let pad = [
            [0x1, 0x2, 0x3, 0xC],
            [0x4, 0x5, 0x6, 0xD],
            [0x7, 0x8, 0x9, 0xE],
            [0xA, 0x0, 0xB, 0xF],
        ];

        for (codes, values) in rows.iter().zip(pad) {
            for (&code, value) in codes.iter().zip(values) {
                assert_eq!(chip8_key(PhysicalKey::Code(code)), Some(u4::new(value)));
            }
        }
    }

    #[test]
    fn other_keys_are_ignored() {
        assert_eq!(chip8_key(PhysicalKey::Code(KeyCode::KeyP)), None);
        assert_eq!(chip8_key(PhysicalKey::Code(KeyCode::Escape)), None);
    }
}
