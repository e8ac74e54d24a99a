//! Bit-packed coil and discrete input buffers, least significant bit first.

use crate::codec::Quantity;

pub fn num_bytes_for_bits(count: Quantity) -> usize {
    (count as usize).div_ceil(8)
}

pub fn get(bytes: &[u8], index: usize) -> bool {
    bytes[index / 8] & (1 << (index % 8)) != 0
}

/// Set or clear exactly one bit, leaving its siblings untouched.
pub fn set(bytes: &mut [u8], index: usize, value: bool) {
    let mask = 1 << (index % 8);
    if value {
        bytes[index / 8] |= mask;
    } else {
        bytes[index / 8] &= !mask;
    }
}

pub fn pack(values: &[bool]) -> Vec<u8> {
    let mut bytes = vec![0; values.len().div_ceil(8)];
    for (index, value) in values.iter().enumerate() {
        set(&mut bytes, index, *value);
    }
    bytes
}

pub fn unpack(bytes: &[u8], count: Quantity) -> Vec<bool> {
    (0..count as usize).map(|index| get(bytes, index)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn calculates_number_of_bytes_needed_for_count_of_packed_bits() {
        assert_eq!(num_bytes_for_bits(0), 0);
        assert_eq!(num_bytes_for_bits(7), 1);
        assert_eq!(num_bytes_for_bits(8), 1);
        assert_eq!(num_bytes_for_bits(9), 2);
        assert_eq!(num_bytes_for_bits(0xFFFF), 8192);
    }

    #[test]
    fn set_leaves_siblings_untouched() {
        let mut bytes = [0b1010_1010, 0xff];
        set(&mut bytes, 0, true);
        assert_eq!(bytes, [0b1010_1011, 0xff]);
        set(&mut bytes, 9, false);
        assert_eq!(bytes, [0b1010_1011, 0b1111_1101]);
        set(&mut bytes, 1, true);
        assert_eq!(bytes[0], 0b1010_1011);
    }

    #[test]
    fn pack_and_unpack() {
        let values = [true, false, true, true, false, false, false, false, true];
        let bytes = pack(&values);
        assert_eq!(bytes, vec![0b0000_1101, 0b0000_0001]);
        assert_eq!(unpack(&bytes, 9), values.to_vec());
    }
}
