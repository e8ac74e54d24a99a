//! Request-level access to one binding per Modbus data class.
//!
//! Every function resolves the entries of the binding that fall inside the
//! request window and transfers them. A binding with nothing to contribute
//! to the request is not an error: the functions then return `Ok(0)`.

use tracing::trace;

use crate::binding::Binding;
use crate::bits::num_bytes_for_bits;
use crate::codec::{Address, Quantity};
use crate::exception::ExceptionCode;
use crate::range::Overlap;

fn window(start: Address, quantity: usize) -> Result<Quantity, ExceptionCode> {
    let quantity = Quantity::try_from(quantity).map_err(|_| ExceptionCode::IllegalDataAddress)?;
    if u32::from(start) + u32::from(quantity) > 0x1_0000 {
        return Err(ExceptionCode::IllegalDataAddress);
    }
    Ok(quantity)
}

fn bit_window(start: Address, quantity: Quantity, buffer: usize) -> Result<(), ExceptionCode> {
    window(start, quantity as usize)?;
    if buffer < num_bytes_for_bits(quantity) {
        return Err(ExceptionCode::IllegalDataValue);
    }
    Ok(())
}

fn resolve<T: crate::codec::Native>(
    binding: &Binding<'_, T>,
    start: Address,
    quantity: Quantity,
) -> Option<Overlap> {
    let overlap = binding.overlap(start, quantity);
    trace!(
        first = binding.first(),
        count = binding.count(),
        start,
        quantity,
        ?overlap,
        "resolved binding overlap"
    );
    overlap
}

/// Read-write, bit packed coils.
pub mod coil {
    use super::*;
    use crate::transfer::{access_bits, assign_bits};

    pub fn assign(
        binding: &Binding<'_, bool>,
        start: Address,
        quantity: Quantity,
        buffer: &mut [u8],
    ) -> Result<usize, ExceptionCode> {
        bit_window(start, quantity, buffer.len())?;
        Ok(match resolve(binding, start, quantity) {
            Some(overlap) => {
                assign_bits(binding, overlap, buffer);
                overlap.count
            }
            None => 0,
        })
    }

    pub fn access(
        binding: &mut Binding<'_, bool>,
        start: Address,
        quantity: Quantity,
        buffer: &[u8],
    ) -> Result<usize, ExceptionCode> {
        bit_window(start, quantity, buffer.len())?;
        Ok(match resolve(binding, start, quantity) {
            Some(overlap) => {
                access_bits(binding, overlap, buffer);
                overlap.count
            }
            None => 0,
        })
    }
}

/// Read-only, bit packed discrete inputs.
pub mod discrete {
    use super::*;
    use crate::transfer::assign_bits;

    pub fn assign(
        binding: &Binding<'_, bool>,
        start: Address,
        quantity: Quantity,
        buffer: &mut [u8],
    ) -> Result<usize, ExceptionCode> {
        bit_window(start, quantity, buffer.len())?;
        Ok(match resolve(binding, start, quantity) {
            Some(overlap) => {
                assign_bits(binding, overlap, buffer);
                overlap.count
            }
            None => 0,
        })
    }
}

/// Holding and input registers; the request window is the whole buffer.
pub mod registers {
    use super::*;
    use crate::codec::{Value, Word};
    use crate::order::Layout;
    use crate::transfer::{access_registers, assign_registers};

    pub fn assign<T: Value>(
        binding: &Binding<'_, T>,
        start: Address,
        layout: Layout,
        buffer: &mut [Word],
    ) -> Result<usize, ExceptionCode> {
        let quantity = window(start, buffer.len())?;
        Ok(match resolve(binding, start, quantity) {
            Some(overlap) => {
                assign_registers(binding, overlap, layout, buffer);
                overlap.count
            }
            None => 0,
        })
    }

    pub fn access<T: Value>(
        binding: &mut Binding<'_, T>,
        start: Address,
        layout: Layout,
        buffer: &[Word],
    ) -> Result<usize, ExceptionCode> {
        let quantity = window(start, buffer.len())?;
        Ok(match resolve(binding, start, quantity) {
            Some(overlap) => {
                access_registers(binding, overlap, layout, buffer);
                overlap.count
            }
            None => 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bits;
    use crate::codec::{decode_words, Word};
    use crate::fixed::Fixed;
    use crate::order::Layout;
    use std::cell::Cell;

    /// Registers holding the values `0.01 + n + n / 10` as high/low word pairs.
    fn decimal_pattern<T: crate::codec::Value + From<f32>>(count: usize) -> Vec<Word> {
        let mut registers = Vec::with_capacity(count * 2);
        for n in 0..count {
            let n = n as f32;
            let value = T::from(0.01 + n + n / 10.0);
            registers.extend(crate::codec::encode_words(value, Layout::default()));
        }
        registers
    }

    fn round_trip<T>(mut values: Vec<T>, start: Address, length: usize)
    where
        T: crate::codec::Value + From<f32>,
    {
        let cells = Cell::from_mut(&mut values[..]).as_slice_of_cells();
        let mut binding = Binding::from_cells(0, 2, cells).unwrap();
        let mut buffer = decimal_pattern::<T>(length / 2);

        let assigned = registers::assign(&binding, start, Layout::default(), &mut buffer).unwrap();
        let overlap = binding.overlap(start, length as Quantity).unwrap();
        assert_eq!(assigned, overlap.count);
        for (k, index) in overlap.entries().enumerate() {
            let at = overlap.offset + 2 * k;
            let value = decode_words::<T>(&buffer[at..at + 2], Layout::default()).unwrap();
            assert_eq!(value, cells[index].get());
        }

        let before = buffer.clone();
        cells.reverse_values();
        let accessed = registers::access(&mut binding, start, Layout::default(), &buffer).unwrap();
        assert_eq!(accessed, overlap.count);
        assert_eq!(buffer, before);
        for (k, index) in overlap.entries().enumerate() {
            let at = overlap.offset + 2 * k;
            let value = decode_words::<T>(&buffer[at..at + 2], Layout::default()).unwrap();
            assert_eq!(value, cells[index].get());
        }
    }

    trait ReverseValues {
        fn reverse_values(&self);
    }

    impl<T: Copy> ReverseValues for [Cell<T>] {
        fn reverse_values(&self) {
            let values = self.iter().map(Cell::get).collect::<Vec<_>>();
            for (cell, value) in self.iter().zip(values.into_iter().rev()) {
                cell.set(value);
            }
        }
    }

    #[test]
    fn test_fixed_point_binding() {
        let values = (0..6).map(|n| Fixed::from_f64(f64::from(n) * 2.5)).collect();
        round_trip::<Fixed>(values, 0, 12);
    }

    #[test]
    fn test_float_binding() {
        let values = (0..6).map(|n| n as f32 * -1.25).collect();
        round_trip::<f32>(values, 0, 12);
    }

    #[test]
    fn test_holding_binding() {
        for (first, start, length) in [(0u16, 0u16, 6usize), (4, 0, 6)] {
            let mut ints = [0u16; 6];
            let cells = Cell::from_mut(&mut ints[..]).as_slice_of_cells();
            let mut binding = Binding::from_cells(first, 1, cells).unwrap();
            let mut buffer = (0..length as Word).collect::<Vec<_>>();

            let count = registers::access(&mut binding, start, Layout::default(), &buffer).unwrap();
            let overlap = binding.overlap(start, length as Quantity).unwrap();
            assert_eq!(count, overlap.count);
            for (k, index) in overlap.entries().enumerate() {
                assert_eq!(buffer[overlap.offset + k], cells[index].get());
            }

            cells.reverse_values();
            registers::assign(&binding, start, Layout::default(), &mut buffer).unwrap();
            for (k, index) in overlap.entries().enumerate() {
                assert_eq!(buffer[overlap.offset + k], cells[index].get());
            }
        }
    }

    #[test]
    fn test_coil_binding() {
        for (first, quantity) in [(0u16, 6u16), (4, 6)] {
            let mut states = [false; 6];
            let cells = Cell::from_mut(&mut states[..]).as_slice_of_cells();
            let mut binding = Binding::from_cells(first, 1, cells).unwrap();
            let alternating = (0..quantity).map(|i| i % 2 == 0).collect::<Vec<_>>();
            let mut buffer = bits::pack(&alternating);

            coil::access(&mut binding, 0, quantity, &buffer).unwrap();
            let overlap = binding.overlap(0, quantity).unwrap();
            for (k, index) in overlap.entries().enumerate() {
                assert_eq!(bits::get(&buffer, overlap.offset + k), cells[index].get());
            }

            for cell in cells {
                cell.set(!cell.get());
            }
            coil::assign(&binding, 0, quantity, &mut buffer).unwrap();
            for (k, index) in overlap.entries().enumerate() {
                assert_eq!(bits::get(&buffer, overlap.offset + k), cells[index].get());
            }
        }
    }

    #[test]
    fn test_mixed_coils() {
        let (coil_03, coil_04) = (Cell::new(true), Cell::new(true));
        let mut binding = Binding::with_width(2).unwrap();
        binding.push(&coil_03).unwrap();
        binding.push(&coil_04).unwrap();

        let mut buffer = [0u8; 1];
        assert_eq!(coil::assign(&binding, 0, 6, &mut buffer), Ok(2));
        assert_eq!(buffer, [0b0000_1100]);
        assert_eq!(discrete::assign(&binding, 4, 2, &mut buffer), Ok(0));
    }

    #[test]
    fn test_empty_overlap_is_ok() {
        let value = Cell::new(7i32);
        let mut binding = Binding::with_width(10).unwrap();
        binding.push(&value).unwrap();

        let mut buffer = [0u16; 4];
        assert_eq!(registers::assign(&binding, 0, Layout::default(), &mut buffer), Ok(0));
        assert_eq!(buffer, [0; 4]);
        // only the high word of the value is inside the window
        assert_eq!(registers::access(&mut binding, 7, Layout::default(), &buffer), Ok(0));
        assert_eq!(value.get(), 7);
    }

    #[test]
    fn test_invalid_windows() {
        let value = Cell::new(true);
        let mut binding = Binding::with_width(0).unwrap();
        binding.push(&value).unwrap();

        let mut short = [0u8; 1];
        assert_eq!(
            coil::assign(&binding, 0, 9, &mut short),
            Err(ExceptionCode::IllegalDataValue)
        );
        assert_eq!(
            coil::access(&mut binding, 0xfffc, 8, &short),
            Err(ExceptionCode::IllegalDataAddress)
        );

        let word = Cell::new(1u16);
        let mut binding = Binding::with_width(0).unwrap();
        binding.push(&word).unwrap();
        let mut words = [0u16; 4];
        assert_eq!(
            registers::assign(&binding, 0xfffe, Layout::default(), &mut words),
            Err(ExceptionCode::IllegalDataAddress)
        );
        assert_eq!(words, [0; 4]);
    }
}
