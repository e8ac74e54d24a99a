use std::collections::HashMap;

use tracing::warn;

use crate::codec::{Address, Quantity, Word};
use crate::exception::ExceptionCode;

#[derive(Debug, Clone)]
/// Raw Modbus cells for the addresses no binding covers.
pub struct Table<V>(HashMap<Address, V>);

impl<V> Default for Table<V> {
    fn default() -> Self {
        Self(HashMap::new())
    }
}

/// Raw holding or input registers.
pub type Registers = Table<Word>;
/// Raw coils or discrete inputs.
pub type Bits = Table<bool>;

impl<V: Copy + Default> Table<V> {
    /// Insert new consecutive cells with `values` starting at `addr` address.
    ///
    /// Values that would land past address `0xFFFF` are dropped.
    pub fn insert(&mut self, addr: Address, values: impl IntoIterator<Item = V>) {
        let mut values = values.into_iter();
        for (cell_addr, value) in (addr..=Address::MAX).zip(&mut values) {
            self.0.insert(cell_addr, value);
        }
        if values.next().is_some() {
            warn!(addr, "raw cells past address 0xFFFF dropped");
        }
    }

    /// Helper method to shrink the container size.
    pub fn shrink(&mut self) {
        self.0.shrink_to_fit()
    }

    pub fn contains(&self, addr: Address) -> bool {
        self.0.contains_key(&addr)
    }

    pub fn get(&self, addr: Address) -> Option<V> {
        self.0.get(&addr).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Read `cnt` consecutive cells starting at `addr`.
    pub fn read(&self, addr: Address, cnt: Quantity) -> Result<Vec<V>, ExceptionCode> {
        let mut values = vec![V::default(); cnt.into()];
        for (i, value) in values.iter_mut().enumerate() {
            let cell_addr = cell_address(addr, i)?;
            match self.0.get(&cell_addr) {
                Some(v) => *value = *v,
                None => {
                    warn!(cell_addr, "no raw cell at address");
                    return Err(ExceptionCode::IllegalDataAddress);
                }
            }
        }

        Ok(values)
    }

    /// Write `values` into existing consecutive cells starting at `addr`.
    ///
    /// Nothing is written unless every cell exists.
    pub fn write(&mut self, addr: Address, values: &[V]) -> Result<(), ExceptionCode> {
        for i in 0..values.len() {
            let cell_addr = cell_address(addr, i)?;
            if !self.0.contains_key(&cell_addr) {
                warn!(cell_addr, "no raw cell at address");
                return Err(ExceptionCode::IllegalDataAddress);
            }
        }
        for (i, value) in values.iter().enumerate() {
            self.0.insert(addr + i as Address, *value);
        }

        Ok(())
    }

    /// Copy the cells present in the table into `buffer`, index 0 being `addr`.
    pub(crate) fn fill(&self, addr: Address, mut put: impl FnMut(usize, V), cnt: usize) {
        for i in 0..cnt {
            if let Some(value) = cell_address(addr, i).ok().and_then(|a| self.get(a)) {
                put(i, value);
            }
        }
    }

    /// Overwrite the cells present in the table with values taken from the request.
    pub(crate) fn apply(&mut self, addr: Address, mut take: impl FnMut(usize) -> V, cnt: usize) {
        for i in 0..cnt {
            if let Ok(cell_addr) = cell_address(addr, i) {
                if let Some(value) = self.0.get_mut(&cell_addr) {
                    *value = take(i);
                }
            }
        }
    }
}

fn cell_address(addr: Address, offset: usize) -> Result<Address, ExceptionCode> {
    let cell_addr = usize::from(addr) + offset;
    Address::try_from(cell_addr).map_err(|_| ExceptionCode::IllegalDataAddress)
}

/// Raw cells of all four Modbus data classes.
#[derive(Debug, Clone, Default)]
pub struct Store {
    pub coils: Bits,
    pub discrete_inputs: Bits,
    pub holding_registers: Registers,
    pub input_registers: Registers,
}
