//! Typed transfer between bound variables and request buffers.
//!
//! *assign* copies bound values into a buffer to answer a read request,
//! *access* copies buffer contents into bound values after a write request.
//! The buffer index 0 always corresponds to the request start address and
//! the callers guarantee that the buffer covers the whole request window.

use crate::binding::Binding;
use crate::bits;
use crate::codec::{Value, Word};
use crate::order::Layout;
use crate::range::Overlap;

fn positions(overlap: Overlap, size: usize) -> impl Iterator<Item = (usize, usize)> {
    overlap
        .entries()
        .enumerate()
        .map(move |(k, index)| (index, overlap.offset + k * size))
}

pub fn assign_registers<T: Value>(
    binding: &Binding<'_, T>,
    overlap: Overlap,
    layout: Layout,
    buffer: &mut [Word],
) {
    let words = T::UNITS as usize;
    for (index, at) in positions(overlap, binding.size() as usize) {
        if let Some(value) = binding.get(index) {
            value.encode(layout, &mut buffer[at..at + words]);
        }
    }
}

/// Returns the number of entries whose value changed.
pub fn access_registers<T: Value>(
    binding: &mut Binding<'_, T>,
    overlap: Overlap,
    layout: Layout,
    buffer: &[Word],
) -> usize {
    let words = T::UNITS as usize;
    let mut changed = 0;
    for (index, at) in positions(overlap, binding.size() as usize) {
        let value = T::decode(&buffer[at..at + words], layout);
        if binding.update(index, value) {
            changed += 1;
        }
    }
    changed
}

pub fn assign_bits(binding: &Binding<'_, bool>, overlap: Overlap, buffer: &mut [u8]) {
    for (index, at) in positions(overlap, binding.size() as usize) {
        if let Some(value) = binding.get(index) {
            bits::set(buffer, at, value);
        }
    }
}

/// Returns the number of entries whose value changed.
pub fn access_bits(binding: &mut Binding<'_, bool>, overlap: Overlap, buffer: &[u8]) -> usize {
    let mut changed = 0;
    for (index, at) in positions(overlap, binding.size() as usize) {
        if binding.update(index, bits::get(buffer, at)) {
            changed += 1;
        }
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::part;
    use crate::fixed::Fixed;
    use crate::order::{ByteOrder, WordOrder};
    use proptest::prelude::*;
    use std::cell::Cell;

    #[test]
    fn test_int32_registers() {
        let mut ints = [-6i32, -4, -2, 0, 2, 4];
        let cells = Cell::from_mut(&mut ints[..]).as_slice_of_cells();
        let mut binding = Binding::from_cells(0, 2, cells).unwrap();

        // window [2, 10) touches entries 1..5
        let overlap = binding.overlap(2, 8).unwrap();
        let mut buffer = [0u16; 8];
        assign_registers(&binding, overlap, Layout::default(), &mut buffer);
        for (k, index) in overlap.entries().enumerate() {
            let at = overlap.offset + 2 * k;
            let value = part::combine(buffer[at], buffer[at + 1]) as i32;
            assert_eq!(value, cells[index].get());
        }

        buffer.reverse();
        let changed = access_registers(&mut binding, overlap, Layout::default(), &buffer);
        assert_eq!(changed, 4);
        assert_eq!(cells[0].get(), -6);
        assert_eq!(cells[5].get(), 4);
        for (k, index) in overlap.entries().enumerate() {
            let at = overlap.offset + 2 * k;
            let value = part::combine(buffer[at], buffer[at + 1]) as i32;
            assert_eq!(value, cells[index].get());
        }
    }

    #[test]
    fn test_low_word_first() {
        let value = Cell::new(Fixed::from_f64(1.2345));
        let mut binding = Binding::with_width(1).unwrap();
        binding.push(&value).unwrap();

        let layout = Layout::new(WordOrder::LowFirst, ByteOrder::BigEndian).unwrap();
        let overlap = binding.overlap(0, 4).unwrap();
        let mut buffer = [0u16; 4];
        assign_registers(&binding, overlap, layout, &mut buffer);
        assert_eq!(buffer, [0x0000, 0x3c08, 0x0001, 0x0000]);

        buffer[1] = 0x8000;
        access_registers(&mut binding, overlap, layout, &buffer);
        assert_eq!(value.get().to_f64(), 1.5);
        assert!(binding.is_changed(0));
    }

    #[test]
    fn test_padded_entries() {
        let mut floats = [1.0f32, 2.0];
        let cells = Cell::from_mut(&mut floats[..]).as_slice_of_cells();
        let binding = Binding::from_cells(0, 4, cells).unwrap();

        let overlap = binding.overlap(0, 8).unwrap();
        let mut buffer = [0xffffu16; 8];
        assign_registers(&binding, overlap, Layout::default(), &mut buffer);
        assert_eq!(
            buffer,
            [0x3f80, 0x0000, 0xffff, 0xffff, 0x4000, 0x0000, 0xffff, 0xffff]
        );
    }

    #[test]
    fn test_bits() {
        let mut coils = [true, false, true, true, false, true];
        let cells = Cell::from_mut(&mut coils[..]).as_slice_of_cells();
        let mut binding = Binding::from_cells(4, 1, cells).unwrap();

        // window [0, 10): entries start at bit 4
        let overlap = binding.overlap(0, 10).unwrap();
        let mut buffer = [0b0000_0101u8, 0b1111_1100];
        assign_bits(&binding, overlap, &mut buffer);
        assert_eq!(buffer, [0b1101_0101, 0b1111_1110]);

        let incoming = [0b0010_0000u8, 0b0000_0010];
        let changed = access_bits(&mut binding, overlap, &incoming);
        assert_eq!(
            cells.iter().map(Cell::get).collect::<Vec<_>>(),
            vec![false, true, false, false, false, true]
        );
        assert_eq!(changed, 4);
        assert_eq!(binding.changed().collect::<Vec<_>>(), vec![0, 1, 2, 3]);
    }

    proptest! {
        #[test]
        fn registers_round_trip(
            first in 0u16..64,
            mut values in prop::collection::vec(any::<u32>(), 0..8),
            size in 2u16..5,
            start in 0u16..96,
            length in 0u16..48,
            low_first in any::<bool>(),
            little in any::<bool>(),
            incoming in prop::collection::vec(any::<u16>(), 48),
        ) {
            let words = if low_first { WordOrder::LowFirst } else { WordOrder::HighFirst };
            let bytes = if little { ByteOrder::LittleEndian } else { ByteOrder::BigEndian };
            let layout = Layout::new(words, bytes).unwrap();
            let original = values.clone();
            let cells = Cell::from_mut(&mut values[..]).as_slice_of_cells();
            let mut binding = Binding::from_cells(first, size, cells).unwrap();
            let Some(overlap) = binding.overlap(start, length) else {
                return Ok(());
            };
            // value words only, padding units stay out
            let touched = positions(overlap, size as usize)
                .flat_map(|(_, at)| at..at + 2)
                .collect::<Vec<_>>();

            let before = incoming[..length as usize].to_vec();
            let mut buffer = before.clone();
            assign_registers(&binding, overlap, layout, &mut buffer);
            for (at, (word, old)) in buffer.iter().zip(&before).enumerate() {
                if !touched.contains(&at) {
                    prop_assert_eq!(word, old);
                }
            }

            for cell in cells {
                cell.set(!cell.get());
            }
            access_registers(&mut binding, overlap, layout, &buffer);
            for (index, value) in original.iter().enumerate() {
                if overlap.entries().contains(&index) {
                    prop_assert_eq!(cells[index].get(), *value);
                } else {
                    prop_assert_eq!(cells[index].get(), !*value);
                }
            }

            access_registers(&mut binding, overlap, layout, &before);
            let mut echoed = vec![0; length as usize];
            assign_registers(&binding, overlap, layout, &mut echoed);
            for &at in &touched {
                prop_assert_eq!(echoed[at], before[at]);
            }
        }
    }
}
