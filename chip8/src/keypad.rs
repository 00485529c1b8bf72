use crate::nibble::u4;

pub const KEY_COUNT: usize = 16;

/// Host-written state of the 16-key hex pad.
///
/// Besides the current key states the keypad latches presses (released to
/// pressed transitions) once armed, so a tap that starts and ends between two
/// steps is not lost by the blocking key wait.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Keypad {
    keys: [bool; KEY_COUNT],
    fresh: [bool; KEY_COUNT],
    armed: bool,
}

impl Keypad {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole key snapshot.
    pub fn set_keys(&mut self, state: [bool; KEY_COUNT]) {
        for key in u4::all() {
            self.set_key(key, state[key]);
        }
    }

    /// Set the state of a key on the keypad.
    pub fn set_key(&mut self, key: u4, pressed: bool) {
        if self.armed && pressed && !self.keys[key] {
            self.fresh[key] = true;
        }
        self.keys[key] = pressed;
    }

    pub fn is_pressed(&self, key: u4) -> bool {
        self.keys[key]
    }

    /// Starts latching presses, forgetting any made before now.
    pub fn arm(&mut self) {
        self.fresh = [false; KEY_COUNT];
        self.armed = true;
    }

    /// Returns the lowest key pressed since [`arm`](Self::arm) and disarms.
    ///
    /// Keys already held down when arming only count once released and
    /// pressed again.
    pub fn wait_for_key(&mut self) -> Option<u4> {
        if !self.armed {
            return None;
        }

        let key = u4::all().find(|&key| self.fresh[key])?;
        self.armed = false;
        self.fresh = [false; KEY_COUNT];
        Some(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys_with(pressed: &[u8]) -> [bool; KEY_COUNT] {
        let mut keys = [false; KEY_COUNT];
        for &key in pressed {
            keys[key as usize] = true;
        }
        keys
    }

    #[test]
    fn set_keys_is_last_write_wins() {
        let mut keypad = Keypad::new();
        keypad.set_keys(keys_with(&[1, 2]));
        keypad.set_keys(keys_with(&[2]));
        assert!(!keypad.is_pressed(u4::new(1)));
        assert!(keypad.is_pressed(u4::new(2)));
    }

    #[test]
    fn unarmed_keypad_reports_nothing() {
        let mut keypad = Keypad::new();
        keypad.set_keys(keys_with(&[5]));
        assert_eq!(keypad.wait_for_key(), None);
    }

    #[test]
    fn held_keys_do_not_count_as_fresh() {
        let mut keypad = Keypad::new();
        keypad.set_keys(keys_with(&[5]));
        keypad.arm();
        keypad.set_keys(keys_with(&[5]));
        assert_eq!(keypad.wait_for_key(), None);

        keypad.set_keys(keys_with(&[]));
        keypad.set_keys(keys_with(&[5]));
        assert_eq!(keypad.wait_for_key(), Some(u4::new(5)));
    }

    #[test]
    fn lowest_fresh_key_wins_and_disarms() {
        let mut keypad = Keypad::new();
        keypad.arm();
        keypad.set_keys(keys_with(&[0xC, 0x3]));
        assert_eq!(keypad.wait_for_key(), Some(u4::new(0x3)));
        assert_eq!(keypad.wait_for_key(), None);
    }

    #[test]
    fn taps_between_polls_are_latched() {
        let mut keypad = Keypad::new();
        keypad.arm();
        keypad.set_key(u4::new(0xA), true);
        keypad.set_key(u4::new(0xA), false);
        assert_eq!(keypad.wait_for_key(), Some(u4::new(0xA)));
    }
}
