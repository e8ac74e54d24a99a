use tokio_modbus::{Request, Response};
use tracing::{debug, trace, warn};

use crate::access;
use crate::binding::Binding;
use crate::bits;
use crate::codec::{Address, Quantity, Value, Word};
use crate::error::Error;
use crate::exception::ExceptionCode;
use crate::order::Layout;
use crate::store::Store;

/// Register binding of any native type.
pub trait RegisterBlock {
    fn first(&self) -> Address;
    /// Address following the last entry.
    fn next_address(&self) -> u32;
    fn assign(&self, start: Address, layout: Layout, buffer: &mut [Word]) -> Result<usize, ExceptionCode>;
    fn access(&mut self, start: Address, layout: Layout, buffer: &[Word]) -> Result<usize, ExceptionCode>;
    /// Whether the window takes only some registers of an entry.
    fn cuts(&self, start: Address, length: Quantity) -> bool;
    fn clear_changes(&mut self);
    fn has_changes(&self) -> bool;
}

impl<T: Value> RegisterBlock for Binding<'_, T> {
    fn first(&self) -> Address {
        Binding::first(self)
    }

    fn next_address(&self) -> u32 {
        Binding::next_address(self)
    }

    fn assign(&self, start: Address, layout: Layout, buffer: &mut [Word]) -> Result<usize, ExceptionCode> {
        access::registers::assign(self, start, layout, buffer)
    }

    fn access(&mut self, start: Address, layout: Layout, buffer: &[Word]) -> Result<usize, ExceptionCode> {
        access::registers::access(self, start, layout, buffer)
    }

    fn cuts(&self, start: Address, length: Quantity) -> bool {
        Binding::cuts(self, start, length)
    }

    fn clear_changes(&mut self) {
        Binding::clear_changes(self)
    }

    fn has_changes(&self) -> bool {
        self.changed().next().is_some()
    }
}

/// Bindings of one device, grouped by Modbus data class.
pub struct BindingMap<'a> {
    layout: Layout,
    coils: Vec<Binding<'a, bool>>,
    discrete_inputs: Vec<Binding<'a, bool>>,
    holding_registers: Vec<Box<dyn RegisterBlock + 'a>>,
    input_registers: Vec<Box<dyn RegisterBlock + 'a>>,
}

impl Default for BindingMap<'_> {
    fn default() -> Self {
        Self::new(Layout::default())
    }
}

impl std::fmt::Debug for BindingMap<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BindingMap")
            .field("layout", &self.layout)
            .field("coils", &self.coils.len())
            .field("discrete_inputs", &self.discrete_inputs.len())
            .field("holding_registers", &self.holding_registers.len())
            .field("input_registers", &self.input_registers.len())
            .finish()
    }
}

fn check_free(
    first: Address,
    next: u32,
    taken: impl IntoIterator<Item = (Address, u32)>,
) -> Result<(), Error> {
    for (other, other_next) in taken {
        if u32::from(first) < other_next && u32::from(other) < next {
            warn!(first, other, "overlapping bindings");
            return Err(Error::Overlapping { first, other });
        }
    }
    Ok(())
}

fn covered(spans: &[(Address, u32)], address: u32) -> bool {
    spans
        .iter()
        .any(|&(first, next)| u32::from(first) <= address && address < next)
}

/// `IllegalDataAddress` unless every address of the window is bound or stored raw.
fn check_coverage(
    spans: &[(Address, u32)],
    raw: impl Fn(Address) -> bool,
    start: Address,
    quantity: Quantity,
) -> Result<(), ExceptionCode> {
    let end = u32::from(start) + u32::from(quantity);
    if end > 0x1_0000 {
        return Err(ExceptionCode::IllegalDataAddress);
    }
    for address in u32::from(start)..end {
        if !covered(spans, address) && !raw(address as Address) {
            warn!(address, "address is neither bound nor stored");
            return Err(ExceptionCode::IllegalDataAddress);
        }
    }
    Ok(())
}

fn bit_spans(bindings: &[Binding<'_, bool>]) -> Vec<(Address, u32)> {
    bindings
        .iter()
        .map(|binding| (binding.first(), binding.next_address()))
        .collect()
}

fn register_spans(bindings: &[Box<dyn RegisterBlock + '_>]) -> Vec<(Address, u32)> {
    bindings
        .iter()
        .map(|binding| (binding.first(), binding.next_address()))
        .collect()
}

impl<'a> BindingMap<'a> {
    pub fn new(layout: Layout) -> Self {
        Self {
            layout,
            coils: Vec::new(),
            discrete_inputs: Vec::new(),
            holding_registers: Vec::new(),
            input_registers: Vec::new(),
        }
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    pub fn bind_coils(&mut self, binding: Binding<'a, bool>) -> Result<(), Error> {
        check_free(binding.first(), binding.next_address(), bit_spans(&self.coils))?;
        self.coils.push(binding);
        Ok(())
    }

    pub fn bind_discrete_inputs(&mut self, binding: Binding<'a, bool>) -> Result<(), Error> {
        check_free(
            binding.first(),
            binding.next_address(),
            bit_spans(&self.discrete_inputs),
        )?;
        self.discrete_inputs.push(binding);
        Ok(())
    }

    pub fn bind_holding_registers<T: Value + 'a>(&mut self, binding: Binding<'a, T>) -> Result<(), Error> {
        check_free(
            binding.first(),
            binding.next_address(),
            register_spans(&self.holding_registers),
        )?;
        self.holding_registers.push(Box::new(binding));
        Ok(())
    }

    pub fn bind_input_registers<T: Value + 'a>(&mut self, binding: Binding<'a, T>) -> Result<(), Error> {
        check_free(
            binding.first(),
            binding.next_address(),
            register_spans(&self.input_registers),
        )?;
        self.input_registers.push(Box::new(binding));
        Ok(())
    }

    pub fn coils(&self) -> &[Binding<'a, bool>] {
        &self.coils
    }

    pub fn discrete_inputs(&self) -> &[Binding<'a, bool>] {
        &self.discrete_inputs
    }

    /// Whether an access changed any bound coil or register since the last clear.
    pub fn has_changes(&self) -> bool {
        self.coils.iter().any(|binding| binding.changed().next().is_some())
            || self.holding_registers.iter().any(|binding| binding.has_changes())
            || self.input_registers.iter().any(|binding| binding.has_changes())
    }

    pub fn clear_changes(&mut self) {
        self.coils.iter_mut().for_each(|binding| binding.clear_changes());
        self.holding_registers
            .iter_mut()
            .chain(self.input_registers.iter_mut())
            .for_each(|binding| binding.clear_changes());
    }

    // Binding-only transfers

    pub fn assign_coils(&self, start: Address, quantity: Quantity, buffer: &mut [u8]) -> Result<usize, ExceptionCode> {
        let mut count = 0;
        for binding in &self.coils {
            count += access::coil::assign(binding, start, quantity, buffer)?;
        }
        Ok(count)
    }

    pub fn access_coils(&mut self, start: Address, quantity: Quantity, buffer: &[u8]) -> Result<usize, ExceptionCode> {
        let mut count = 0;
        for binding in &mut self.coils {
            count += access::coil::access(binding, start, quantity, buffer)?;
        }
        Ok(count)
    }

    pub fn assign_discrete_inputs(
        &self,
        start: Address,
        quantity: Quantity,
        buffer: &mut [u8],
    ) -> Result<usize, ExceptionCode> {
        let mut count = 0;
        for binding in &self.discrete_inputs {
            count += access::discrete::assign(binding, start, quantity, buffer)?;
        }
        Ok(count)
    }

    pub fn assign_holding_registers(&self, start: Address, buffer: &mut [Word]) -> Result<usize, ExceptionCode> {
        let mut count = 0;
        for binding in &self.holding_registers {
            count += binding.assign(start, self.layout, buffer)?;
        }
        Ok(count)
    }

    /// Reject a window that takes only some registers of a bound holding entry.
    pub fn check_whole_holding_registers(&self, start: Address, quantity: Quantity) -> Result<(), ExceptionCode> {
        match self.holding_registers.iter().find(|binding| binding.cuts(start, quantity)) {
            Some(binding) => {
                warn!(start, quantity, first = binding.first(), "window cuts a bound holding entry");
                Err(ExceptionCode::IllegalDataAddress)
            }
            None => Ok(()),
        }
    }

    pub fn access_holding_registers(&mut self, start: Address, buffer: &[Word]) -> Result<usize, ExceptionCode> {
        let mut count = 0;
        for binding in &mut self.holding_registers {
            count += binding.access(start, self.layout, buffer)?;
        }
        Ok(count)
    }

    pub fn assign_input_registers(&self, start: Address, buffer: &mut [Word]) -> Result<usize, ExceptionCode> {
        let mut count = 0;
        for binding in &self.input_registers {
            count += binding.assign(start, self.layout, buffer)?;
        }
        Ok(count)
    }

    /// Apply words read from a remote input register block.
    pub fn access_input_registers(&mut self, start: Address, buffer: &[Word]) -> Result<usize, ExceptionCode> {
        let mut count = 0;
        for binding in &mut self.input_registers {
            count += binding.access(start, self.layout, buffer)?;
        }
        Ok(count)
    }

    // Request handling backed by raw cells

    /// Packed coil states for a read request.
    pub fn read_coils(&self, store: &Store, start: Address, quantity: Quantity) -> Result<Vec<u8>, ExceptionCode> {
        check_coverage(&bit_spans(&self.coils), |a| store.coils.contains(a), start, quantity)?;
        let mut buffer = vec![0; bits::num_bytes_for_bits(quantity)];
        store
            .coils
            .fill(start, |i, v| bits::set(&mut buffer, i, v), quantity.into());
        let count = self.assign_coils(start, quantity, &mut buffer)?;
        trace!(start, quantity, count, "read coils");
        Ok(buffer)
    }

    /// Packed discrete input states for a read request.
    pub fn read_discrete_inputs(
        &self,
        store: &Store,
        start: Address,
        quantity: Quantity,
    ) -> Result<Vec<u8>, ExceptionCode> {
        check_coverage(
            &bit_spans(&self.discrete_inputs),
            |a| store.discrete_inputs.contains(a),
            start,
            quantity,
        )?;
        let mut buffer = vec![0; bits::num_bytes_for_bits(quantity)];
        store
            .discrete_inputs
            .fill(start, |i, v| bits::set(&mut buffer, i, v), quantity.into());
        let count = self.assign_discrete_inputs(start, quantity, &mut buffer)?;
        trace!(start, quantity, count, "read discrete inputs");
        Ok(buffer)
    }

    pub fn read_holding_registers(
        &self,
        store: &Store,
        start: Address,
        quantity: Quantity,
    ) -> Result<Vec<Word>, ExceptionCode> {
        check_coverage(
            &register_spans(&self.holding_registers),
            |a| store.holding_registers.contains(a),
            start,
            quantity,
        )?;
        let mut buffer = vec![0; quantity.into()];
        store
            .holding_registers
            .fill(start, |i, v| buffer[i] = v, quantity.into());
        let count = self.assign_holding_registers(start, &mut buffer)?;
        trace!(start, quantity, count, "read holding registers");
        Ok(buffer)
    }

    pub fn read_input_registers(
        &self,
        store: &Store,
        start: Address,
        quantity: Quantity,
    ) -> Result<Vec<Word>, ExceptionCode> {
        check_coverage(
            &register_spans(&self.input_registers),
            |a| store.input_registers.contains(a),
            start,
            quantity,
        )?;
        let mut buffer = vec![0; quantity.into()];
        store
            .input_registers
            .fill(start, |i, v| buffer[i] = v, quantity.into());
        let count = self.assign_input_registers(start, &mut buffer)?;
        trace!(start, quantity, count, "read input registers");
        Ok(buffer)
    }

    /// Apply packed coil states of a write request. Returns the number of bound entries written.
    pub fn write_coils(
        &mut self,
        store: &mut Store,
        start: Address,
        quantity: Quantity,
        buffer: &[u8],
    ) -> Result<usize, ExceptionCode> {
        if buffer.len() < bits::num_bytes_for_bits(quantity) {
            return Err(ExceptionCode::IllegalDataValue);
        }
        check_coverage(&bit_spans(&self.coils), |a| store.coils.contains(a), start, quantity)?;
        store
            .coils
            .apply(start, |i| bits::get(buffer, i), quantity.into());
        let count = self.access_coils(start, quantity, buffer)?;
        trace!(start, quantity, count, "wrote coils");
        Ok(count)
    }

    /// Apply the words of a write request. Returns the number of bound entries written.
    pub fn write_holding_registers(
        &mut self,
        store: &mut Store,
        start: Address,
        buffer: &[Word],
    ) -> Result<usize, ExceptionCode> {
        let quantity = Quantity::try_from(buffer.len()).map_err(|_| ExceptionCode::IllegalDataValue)?;
        check_coverage(
            &register_spans(&self.holding_registers),
            |a| store.holding_registers.contains(a),
            start,
            quantity,
        )?;
        store
            .holding_registers
            .apply(start, |i| buffer[i], buffer.len());
        let count = self.access_holding_registers(start, buffer)?;
        trace!(start, quantity, count, "wrote holding registers");
        Ok(count)
    }

    /// Serve a tokio-modbus request.
    pub fn call(&mut self, store: &mut Store, request: Request<'_>) -> Result<Response, ExceptionCode> {
        debug!(?request, "serving request");
        match request {
            Request::ReadCoils(addr, cnt) => {
                let packed = self.read_coils(store, addr, cnt)?;
                Ok(Response::ReadCoils(bits::unpack(&packed, cnt)))
            }
            Request::ReadDiscreteInputs(addr, cnt) => {
                let packed = self.read_discrete_inputs(store, addr, cnt)?;
                Ok(Response::ReadDiscreteInputs(bits::unpack(&packed, cnt)))
            }
            Request::ReadHoldingRegisters(addr, cnt) => {
                Ok(Response::ReadHoldingRegisters(self.read_holding_registers(store, addr, cnt)?))
            }
            Request::ReadInputRegisters(addr, cnt) => {
                Ok(Response::ReadInputRegisters(self.read_input_registers(store, addr, cnt)?))
            }
            Request::WriteSingleCoil(addr, coil) => {
                self.write_coils(store, addr, 1, &bits::pack(&[coil]))?;
                Ok(Response::WriteSingleCoil(addr, coil))
            }
            Request::WriteMultipleCoils(addr, coils) => {
                let cnt = Quantity::try_from(coils.len()).map_err(|_| ExceptionCode::IllegalDataValue)?;
                self.write_coils(store, addr, cnt, &bits::pack(&coils))?;
                Ok(Response::WriteMultipleCoils(addr, cnt))
            }
            Request::WriteSingleRegister(addr, word) => {
                self.write_holding_registers(store, addr, std::slice::from_ref(&word))?;
                Ok(Response::WriteSingleRegister(addr, word))
            }
            Request::WriteMultipleRegisters(addr, words) => {
                self.write_holding_registers(store, addr, &words)?;
                Ok(Response::WriteMultipleRegisters(addr, words.len() as Quantity))
            }
            other => {
                warn!(request = ?other, "unsupported function code in request");
                Err(ExceptionCode::IllegalFunction)
            }
        }
    }
}
