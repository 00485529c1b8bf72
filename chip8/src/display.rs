pub const DISPLAY_X: usize = 64;
pub const DISPLAY_Y: usize = 32;

/// A value per screen pixel, indexed `[y][x]`.
pub type Grid<T> = [[T; DISPLAY_X]; DISPLAY_Y];
/// Monochrome screen contents (true = on).
pub type Framebuffer = Grid<bool>;

/// The 64x32 monochrome screen. Only `clear` and `draw_sprite` mutate it.
#[derive(Clone, PartialEq, Eq)]
pub struct DisplayBuffer {
    pixels: Framebuffer,
}

impl DisplayBuffer {
    pub fn new() -> Self {
        Self {
            pixels: [[false; DISPLAY_X]; DISPLAY_Y],
        }
    }

    pub fn clear(&mut self) {
        self.pixels = [[false; DISPLAY_X]; DISPLAY_Y];
    }

    /// XORs `sprite` onto the screen with its top-left corner at (x, y).
    ///
    /// Each byte is one row, most significant bit leftmost. Pixels that fall
    /// off an edge wrap around to the opposite side. Returns true if any
    /// pixel was switched off.
    pub fn draw_sprite(&mut self, x: usize, y: usize, sprite: &[u8]) -> bool {
        let mut any_erased = false;

        for (row, sprite_byte) in sprite.iter().enumerate() {
            let py = (y + row) % DISPLAY_Y;

            for col in 0..8 {
                if sprite_byte & (0x80 >> col) == 0 {
                    continue;
                }

                let px = (x + col) % DISPLAY_X;
                let pixel = &mut self.pixels[py][px];
                *pixel ^= true;

                if !*pixel {
                    any_erased = true;
                }
            }
        }

        any_erased
    }

    pub fn snapshot(&self) -> &Framebuffer {
        &self.pixels
    }

    /// Get the state of a pixel (true = on, false = off).
    pub fn pixel(&self, x: usize, y: usize) -> bool {
        self.pixels[y][x]
    }
}

impl Default for DisplayBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(display: &DisplayBuffer) -> Vec<(usize, usize)> {
        let mut on = Vec::new();
        for (y, row) in display.snapshot().iter().enumerate() {
            for (x, &pixel) in row.iter().enumerate() {
                if pixel {
                    on.push((x, y));
                }
            }
        }
        on
    }

    #[test]
    fn draws_bits_msb_first() {
        let mut display = DisplayBuffer::new();
        let collided = display.draw_sprite(2, 3, &[0b1000_0001]);
        assert!(!collided);
        assert_eq!(lit(&display), vec![(2, 3), (9, 3)]);
    }

    #[test]
    fn drawing_twice_restores_and_reports_collision() {
        let mut display = DisplayBuffer::new();
        display.draw_sprite(0, 0, &[0xFF]);
        let before = display.clone();

        let sprite = [0x3C, 0x42, 0x81];
        assert!(display.draw_sprite(5, 1, &sprite));
        assert!(display.draw_sprite(5, 1, &sprite));
        assert!(display == before);
    }

    #[test]
    fn sprite_wraps_horizontally_and_vertically() {
        let mut display = DisplayBuffer::new();
        display.draw_sprite(62, 31, &[0b1110_0000, 0b1000_0000]);
        assert_eq!(lit(&display), vec![(62, 0), (0, 31), (62, 31), (63, 31)]);
    }

    #[test]
    fn overlapping_without_erasing_is_not_a_collision() {
        let mut display = DisplayBuffer::new();
        display.draw_sprite(0, 0, &[0b1010_0000]);
        assert!(!display.draw_sprite(0, 0, &[0b0101_0000]));
        assert!(display.pixel(0, 0) && display.pixel(1, 0));
    }

    #[test]
    fn clear_turns_everything_off() {
        let mut display = DisplayBuffer::new();
        display.draw_sprite(10, 10, &[0xFF; 15]);
        display.clear();
        assert!(lit(&display).is_empty());
    }
}
