use std::fmt;
use std::ops::{Index, IndexMut};

/// A 4-bit unsigned integer (nibble).
///
/// Register operands and key indices are both nibbles, so indexing a
/// 16-element array with a `u4` can never go out of bounds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[allow(non_camel_case_types)]
pub struct u4(u8);

impl u4 {
    pub const MAX: u4 = u4(0x0F);

    /// Creates a new `u4` from a `u8`.
    ///
    /// Panics if the value is greater than 0x0F.
    pub const fn new(value: u8) -> Self {
        assert!(value <= 0x0F, "u4 value must be in range 0x0-0xF");
        Self(value)
    }

    /// Keeps only the low four bits of `value`.
    pub const fn from_low_bits(value: u8) -> Self {
        Self(value & 0x0F)
    }

    pub const fn get(self) -> u8 {
        self.0
    }

    /// All sixteen nibbles in ascending order.
    pub fn all() -> impl Iterator<Item = u4> {
        (0..=0x0F).map(u4)
    }
}

impl TryFrom<u8> for u4 {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if value <= 0x0F {
            Ok(Self(value))
        } else {
            Err(value)
        }
    }
}

impl From<u4> for usize {
    fn from(v: u4) -> usize {
        v.0 as usize
    }
}

impl From<u4> for u8 {
    fn from(v: u4) -> u8 {
        v.0
    }
}

impl From<u4> for u16 {
    fn from(v: u4) -> u16 {
        v.0 as u16
    }
}

impl fmt::Display for u4 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:X}", self.0)
    }
}

impl<T> Index<u4> for [T; 16] {
    type Output = T;

    fn index(&self, index: u4) -> &Self::Output {
        &self[index.0 as usize]
    }
}

impl<T> IndexMut<u4> for [T; 16] {
    fn index_mut(&mut self, index: u4) -> &mut Self::Output {
        &mut self[index.0 as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[should_panic]
    fn new_rejects_values_above_0xf() {
        u4::new(0x10);
    }

    #[test]
    fn from_low_bits_masks() {
        assert_eq!(u4::from_low_bits(0xAB), u4::new(0xB));
    }

    #[test]
    fn try_from_reports_the_rejected_byte() {
        assert_eq!(u4::try_from(0x0C), Ok(u4::new(0xC)));
        assert_eq!(u4::try_from(0x42), Err(0x42));
    }

    #[test]
    fn indexes_sixteen_element_arrays() {
        let mut regs = [0u8; 16];
        regs[u4::new(0xF)] = 7;
        assert_eq!(regs[15], 7);
        assert_eq!(regs[u4::MAX], 7);
    }

    #[test]
    fn all_yields_every_nibble_in_order() {
        let values: Vec<u8> = u4::all().map(u4::get).collect();
        assert_eq!(values, (0..16).collect::<Vec<u8>>());
    }
}
