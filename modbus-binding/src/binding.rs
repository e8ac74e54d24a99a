use std::cell::Cell;

use crate::codec::{Address, Native, Quantity};
use crate::error::Error;
use crate::range::{self, intersect, Overlap};

const ADDRESS_SPACE: u32 = 0x1_0000;

/// Native variables bound to consecutive Modbus addresses.
///
/// Entry `i` occupies the addresses `[first + i * size, first + (i + 1) * size)`.
/// The binding only borrows the variables; the caller keeps owning them.
#[derive(Debug)]
pub struct Binding<'a, T: Native> {
    first: Address,
    size: Quantity,
    pointers: Vec<&'a Cell<T>>,
    changes: Vec<u8>,
}

impl<'a, T: Native> Binding<'a, T> {
    /// Create an empty binding whose entries take `size` units each.
    pub fn new(first: Address, size: Quantity) -> Result<Self, Error> {
        if size == 0 {
            return Err(Error::ZeroSize { first });
        }
        if size < T::UNITS {
            return Err(Error::SizeTooSmall {
                first,
                size,
                needed: T::UNITS,
            });
        }
        Ok(Self {
            first,
            size,
            pointers: Vec::new(),
            changes: Vec::new(),
        })
    }

    /// Create an empty binding sized to the native width of `T`.
    pub fn with_width(first: Address) -> Result<Self, Error> {
        Self::new(first, T::UNITS)
    }

    /// Bind every cell of a caller owned array.
    pub fn from_cells(first: Address, size: Quantity, cells: &'a [Cell<T>]) -> Result<Self, Error> {
        let mut binding = Self::new(first, size)?;
        for cell in cells {
            binding.push(cell)?;
        }
        Ok(binding)
    }

    /// Append the next entry and return the address following it.
    pub fn push(&mut self, pointer: &'a Cell<T>) -> Result<u32, Error> {
        let next = self.next_address() + u32::from(self.size);
        if next > ADDRESS_SPACE {
            return Err(Error::AddressOverflow { first: self.first });
        }
        self.pointers.push(pointer);
        if self.changes.len() * 8 < self.pointers.len() {
            self.changes.push(0);
        }
        Ok(next)
    }

    /// Point entry `index` at another variable.
    pub fn set(&mut self, index: usize, pointer: &'a Cell<T>) -> Result<(), Error> {
        let count = self.count();
        let slot = self
            .pointers
            .get_mut(index)
            .ok_or(Error::IndexOutOfRange { index, count })?;
        *slot = pointer;
        Ok(())
    }

    pub fn first(&self) -> Address {
        self.first
    }

    pub fn size(&self) -> Quantity {
        self.size
    }

    pub fn count(&self) -> usize {
        self.pointers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pointers.is_empty()
    }

    /// Address following the last entry, which may be `0x10000`.
    pub fn next_address(&self) -> u32 {
        u32::from(self.first) + self.count() as u32 * u32::from(self.size)
    }

    /// Whether any address in `[low, high)` belongs to this binding.
    pub fn overlaps(&self, low: u32, high: u32) -> bool {
        u32::from(self.first) < high && low < self.next_address()
    }

    /// Entries lying completely inside `[start, start + length)`.
    pub fn overlap(&self, start: Address, length: Quantity) -> Option<Overlap> {
        intersect(self.first, self.count(), self.size, start, length)
    }

    /// Whether `[start, start + length)` takes only some units of an entry.
    pub fn cuts(&self, start: Address, length: Quantity) -> bool {
        range::cuts(self.first, self.count(), self.size, start, length)
    }

    pub fn get(&self, index: usize) -> Option<T> {
        self.pointers.get(index).map(|pointer| pointer.get())
    }

    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        self.pointers.iter().map(|pointer| pointer.get())
    }

    /// Store `value` in entry `index`, marking the entry if the value differs.
    ///
    /// Returns whether the stored value changed.
    pub(crate) fn update(&mut self, index: usize, value: T) -> bool {
        let pointer = self.pointers[index];
        let changed = pointer.get() != value;
        pointer.set(value);
        if changed {
            self.mark(index, true);
        }
        changed
    }

    pub fn is_changed(&self, index: usize) -> bool {
        index < self.count() && self.changes[index / 8] & (1 << (index % 8)) != 0
    }

    pub fn mark(&mut self, index: usize, changed: bool) {
        if index >= self.count() {
            return;
        }
        let mask = 1 << (index % 8);
        if changed {
            self.changes[index / 8] |= mask;
        } else {
            self.changes[index / 8] &= !mask;
        }
    }

    /// Indices of the entries marked as changed.
    pub fn changed(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.count()).filter(|&index| self.is_changed(index))
    }

    pub fn clear_changes(&mut self) {
        self.changes.iter_mut().for_each(|byte| *byte = 0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixed::Fixed;

    fn check<T: Native + Default>(first: Address, count: usize, size: Quantity) {
        let mut owned = vec![T::default(); count];
        let cells = Cell::from_mut(&mut owned[..]).as_slice_of_cells();
        let binding = Binding::from_cells(first, size, cells).unwrap();
        assert_eq!(
            binding.next_address(),
            u32::from(first) + count as u32 * u32::from(size)
        );
        assert_eq!(binding.first(), first);
        assert_eq!(binding.count(), count);
        assert_eq!(binding.size(), size);
        for (i, cell) in cells.iter().enumerate() {
            assert!(std::ptr::eq(binding.pointers[i], cell));
        }
    }

    #[test]
    fn test_create() {
        for (first, count, size) in [(0, 8, 2), (0, 8, 4), (2, 4, 2), (2, 2, 4)] {
            check::<Fixed>(first, count, size);
            check::<f32>(first, count, size);
            check::<i32>(first, count, size);
        }
    }

    #[test]
    fn test_push_returns_next_address() {
        let (a, b) = (Cell::new(1u16), Cell::new(2u16));
        let mut binding = Binding::with_width(0x0c).unwrap();
        assert_eq!(binding.push(&a), Ok(0x0d));
        assert_eq!(binding.push(&b), Ok(0x0e));
        assert_eq!(binding.iter().collect::<Vec<_>>(), vec![1, 2]);

        let c = Cell::new(3u16);
        binding.set(1, &c).unwrap();
        assert_eq!(binding.get(1), Some(3));
        assert_eq!(
            binding.set(2, &c),
            Err(Error::IndexOutOfRange { index: 2, count: 2 })
        );
    }

    #[test]
    fn test_invalid_size() {
        assert_eq!(
            Binding::<u16>::new(4, 0).unwrap_err(),
            Error::ZeroSize { first: 4 }
        );
        assert_eq!(
            Binding::<f32>::new(4, 1).unwrap_err(),
            Error::SizeTooSmall {
                first: 4,
                size: 1,
                needed: 2
            }
        );
    }

    #[test]
    fn test_address_overflow() {
        let (a, b) = (Cell::new(0i32), Cell::new(0i32));
        let mut binding = Binding::with_width(0xfffe).unwrap();
        assert_eq!(binding.push(&a), Ok(0x1_0000));
        assert_eq!(
            binding.push(&b),
            Err(Error::AddressOverflow { first: 0xfffe })
        );
        assert_eq!(binding.count(), 1);
    }

    #[test]
    fn test_changes() {
        let mut values = [0.0f32; 20];
        let cells = Cell::from_mut(&mut values[..]).as_slice_of_cells();
        let mut binding = Binding::from_cells(3, 2, cells).unwrap();
        assert_eq!(binding.changed().count(), 0);
        assert!(binding.changes.iter().all(|byte| *byte == 0x00));

        for i in 0..20 {
            binding.mark(i, true);
            assert!(binding.is_changed(i));
        }
        assert_eq!(binding.changes[..2], [0xff, 0xff]);

        binding.clear_changes();
        assert!(!binding.update(4, 0.0));
        assert!(binding.update(5, 1.5));
        assert_eq!(binding.changed().collect::<Vec<_>>(), vec![5]);
        assert_eq!(cells[5].get(), 1.5);
    }
}
