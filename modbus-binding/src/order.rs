use crate::codec::Word;
use crate::error::Error;

/// Order of the two bytes inside a 16-bit register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ByteOrder {
    /// No order configured. Every conversion yields zero.
    Undefined,
    LittleEndian,
    #[default]
    BigEndian,
}

/// Order of the registers holding a multi-word value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WordOrder {
    /// Most significant word at the lowest address.
    #[default]
    HighFirst,
    /// Least significant word at the lowest address.
    LowFirst,
}

/// Opposite byte order; `Undefined` maps to itself.
pub fn contrary(order: ByteOrder) -> ByteOrder {
    match order {
        ByteOrder::BigEndian => ByteOrder::LittleEndian,
        ByteOrder::LittleEndian => ByteOrder::BigEndian,
        ByteOrder::Undefined => ByteOrder::Undefined,
    }
}

/// Assemble a word from two bytes.
///
/// With `BigEndian` the first byte is the high byte, with `LittleEndian` the
/// second one is.
pub fn combine(first: u8, second: u8, order: ByteOrder) -> Word {
    match order {
        ByteOrder::BigEndian => (Word::from(first) << 8) | Word::from(second),
        ByteOrder::LittleEndian => (Word::from(second) << 8) | Word::from(first),
        ByteOrder::Undefined => 0x0000,
    }
}

/// Byte that `combine` expects as its first argument.
pub fn first_byte(word: Word, order: ByteOrder) -> u8 {
    match order {
        ByteOrder::BigEndian => ((word & 0xff00) >> 8) as u8,
        ByteOrder::LittleEndian => (word & 0x00ff) as u8,
        ByteOrder::Undefined => 0x00,
    }
}

/// Byte that `combine` expects as its second argument.
pub fn second_byte(word: Word, order: ByteOrder) -> u8 {
    first_byte(word, contrary(order))
}

/// Word and byte order used when values are moved in and out of registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Layout {
    words: WordOrder,
    bytes: ByteOrder,
}

impl Layout {
    pub fn new(words: WordOrder, bytes: ByteOrder) -> Result<Self, Error> {
        if bytes == ByteOrder::Undefined {
            return Err(Error::UndefinedOrder);
        }
        Ok(Self { words, bytes })
    }

    pub fn words(&self) -> WordOrder {
        self.words
    }

    pub fn bytes(&self) -> ByteOrder {
        self.bytes
    }

    /// Register slot of the `index`-th big-endian word of a `count`-word value.
    pub(crate) fn slot(&self, index: usize, count: usize) -> usize {
        match self.words {
            WordOrder::HighFirst => index,
            WordOrder::LowFirst => count - 1 - index,
        }
    }

    /// Turn a native word into the register representation.
    pub(crate) fn store(&self, word: Word) -> Word {
        combine(
            first_byte(word, ByteOrder::BigEndian),
            second_byte(word, ByteOrder::BigEndian),
            self.bytes,
        )
    }

    /// Inverse of [`Layout::store`].
    pub(crate) fn load(&self, register: Word) -> Word {
        combine(
            first_byte(register, self.bytes),
            second_byte(register, self.bytes),
            ByteOrder::BigEndian,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_combine() {
        assert_eq!(combine(0x12, 0x34, ByteOrder::BigEndian), 0x1234);
        assert_eq!(combine(0x12, 0x34, ByteOrder::LittleEndian), 0x3412);
        assert_eq!(combine(0x12, 0x34, ByteOrder::Undefined), 0x0000);
    }

    #[test]
    fn test_extract() {
        assert_eq!(first_byte(0x1234, ByteOrder::BigEndian), 0x12);
        assert_eq!(second_byte(0x1234, ByteOrder::BigEndian), 0x34);
        assert_eq!(first_byte(0x1234, ByteOrder::LittleEndian), 0x34);
        assert_eq!(second_byte(0x1234, ByteOrder::LittleEndian), 0x12);
        assert_eq!(first_byte(0x1234, ByteOrder::Undefined), 0x00);
        assert_eq!(second_byte(0x1234, ByteOrder::Undefined), 0x00);
    }

    #[test]
    fn test_contrary() {
        assert_eq!(contrary(ByteOrder::BigEndian), ByteOrder::LittleEndian);
        assert_eq!(contrary(ByteOrder::LittleEndian), ByteOrder::BigEndian);
        assert_eq!(contrary(ByteOrder::Undefined), ByteOrder::Undefined);
    }

    #[test]
    fn test_layout() {
        assert!(matches!(
            Layout::new(WordOrder::HighFirst, ByteOrder::Undefined),
            Err(Error::UndefinedOrder)
        ));

        let swapped = Layout::new(WordOrder::LowFirst, ByteOrder::LittleEndian).unwrap();
        assert_eq!(swapped.store(0x1234), 0x3412);
        assert_eq!(swapped.load(0x3412), 0x1234);
        assert_eq!(swapped.slot(0, 2), 1);

        let plain = Layout::default();
        assert_eq!(plain.store(0x1234), 0x1234);
        assert_eq!(plain.slot(0, 2), 0);
    }

    proptest! {
        #[test]
        fn bytes_round_trip(word: u16, big: bool) {
            let order = if big { ByteOrder::BigEndian } else { ByteOrder::LittleEndian };
            prop_assert_eq!(combine(first_byte(word, order), second_byte(word, order), order), word);
        }

        #[test]
        fn layout_round_trip(word: u16, big: bool) {
            let order = if big { ByteOrder::BigEndian } else { ByteOrder::LittleEndian };
            let layout = Layout::new(WordOrder::HighFirst, order).unwrap();
            prop_assert_eq!(layout.load(layout.store(word)), word);
        }
    }
}
