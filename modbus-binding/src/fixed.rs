use std::fmt;

use crate::codec::{part, Native, Quantity, Value, Word};
use crate::order::Layout;

/// Signed Q15.16 fixed-point number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Hash)]
pub struct Fixed(i32);

impl Fixed {
    const SCALE: f64 = 65536.0;

    pub const fn from_raw(raw: i32) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> i32 {
        self.0
    }

    /// Convert from floating point, truncating toward zero and saturating at the range ends.
    pub fn from_f64(value: f64) -> Self {
        Self((value * Self::SCALE) as i32)
    }

    pub fn to_f64(self) -> f64 {
        f64::from(self.0) / Self::SCALE
    }

    /// The integer part and the fraction bits as two halves.
    pub fn to_parts(self) -> (Word, Word) {
        let bits = self.0 as u32;
        (part::high(bits), part::low(bits))
    }

    pub fn from_parts(high: Word, low: Word) -> Self {
        Self(part::combine(high, low) as i32)
    }
}

impl From<f64> for Fixed {
    fn from(value: f64) -> Self {
        Self::from_f64(value)
    }
}

impl From<f32> for Fixed {
    fn from(value: f32) -> Self {
        Self::from_f64(f64::from(value))
    }
}

impl From<Fixed> for f64 {
    fn from(value: Fixed) -> Self {
        value.to_f64()
    }
}

impl fmt::Display for Fixed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_f64())
    }
}

impl Native for Fixed {
    const UNITS: Quantity = 2;
}

impl Value for Fixed {
    fn encode(self, layout: Layout, words: &mut [Word]) {
        self.0.encode(layout, words)
    }

    fn decode(words: &[Word], layout: Layout) -> Self {
        Self(i32::decode(words, layout))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{decode_words, encode_words};

    #[test]
    fn test_parts() {
        let value = Fixed::from_f64(1.2345);
        assert_eq!(value.raw(), 0x0001_3c08);
        assert_eq!(value.to_parts(), (0x0001, 0x3c08));
        assert_eq!(Fixed::from_parts(0x0001, 0x3c08), value);
        assert!((value.to_f64() - 1.2345).abs() < 1.0 / 65536.0);
    }

    #[test]
    fn test_negative() {
        let value = Fixed::from(-2.5f32);
        assert_eq!(value.raw(), -0x0002_8000);
        assert_eq!(value.to_f64(), -2.5);
    }

    #[test]
    fn test_registers() {
        let value = Fixed::from_f64(0.01);
        let words = encode_words(value, Layout::default());
        assert_eq!(words.len(), 2);
        assert_eq!(decode_words::<Fixed>(&words, Layout::default()), Ok(value));
    }
}
