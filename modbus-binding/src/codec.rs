use std::fmt::Debug;

pub use tokio_modbus::{Address, Quantity};

use crate::error::Error;
use crate::order::{first_byte, second_byte, ByteOrder, Layout};

/// 16-bit value stored in Modbus register.
pub type Word = u16;

/// A native type that can be bound to Modbus addresses.
pub trait Native: Copy + PartialEq + Debug {
    /// Number of addressable units one value occupies.
    const UNITS: Quantity;
}

impl Native for bool {
    const UNITS: Quantity = 1;
}

/// Encode into and decode from `Native::UNITS` consecutive registers.
///
/// Both methods expect a slice of exactly `UNITS` words.
pub trait Value: Native {
    fn encode(self, layout: Layout, words: &mut [Word]);
    fn decode(words: &[Word], layout: Layout) -> Self;
}

macro_rules! impl_value {
    ($num_type:ty) => {
        impl Native for $num_type {
            const UNITS: Quantity = (std::mem::size_of::<$num_type>() / 2) as Quantity;
        }

        impl Value for $num_type {
            fn encode(self, layout: Layout, words: &mut [Word]) {
                let count = Self::UNITS as usize;
                for (i, chunk) in self.to_be_bytes().chunks_exact(2).enumerate() {
                    let word = crate::order::combine(chunk[0], chunk[1], ByteOrder::BigEndian);
                    words[layout.slot(i, count)] = layout.store(word);
                }
            }

            fn decode(words: &[Word], layout: Layout) -> Self {
                let count = Self::UNITS as usize;
                let mut bytes = [0u8; std::mem::size_of::<$num_type>()];
                for (i, chunk) in bytes.chunks_exact_mut(2).enumerate() {
                    let word = layout.load(words[layout.slot(i, count)]);
                    chunk[0] = first_byte(word, ByteOrder::BigEndian);
                    chunk[1] = second_byte(word, ByteOrder::BigEndian);
                }
                <$num_type>::from_be_bytes(bytes)
            }
        }
    };
}

impl_value!(i16);
impl_value!(i32);
impl_value!(i64);
impl_value!(u16);
impl_value!(u32);
impl_value!(u64);
impl_value!(f32);
impl_value!(f64);

/// Encode a value into a fresh vector of registers.
pub fn encode_words<T: Value>(value: T, layout: Layout) -> Vec<Word> {
    let mut words = vec![0; T::UNITS as usize];
    value.encode(layout, &mut words);
    words
}

/// Decode a value, checking the number of words first.
pub fn decode_words<T: Value>(words: &[Word], layout: Layout) -> Result<T, Error> {
    let expected = T::UNITS as usize;
    if words.len() != expected {
        return Err(Error::WordCount {
            expected,
            actual: words.len(),
        });
    }
    Ok(T::decode(words, layout))
}

/// Split 32-bit values into 16-bit halves and back.
pub mod part {
    use super::Word;

    pub fn high(value: u32) -> Word {
        (value >> 16) as Word
    }

    pub fn low(value: u32) -> Word {
        (value & 0xffff) as Word
    }

    pub fn combine(high: Word, low: Word) -> u32 {
        (u32::from(high) << 16) | u32::from(low)
    }
}
