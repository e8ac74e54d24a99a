//! Processing of Modbus RTU request frames against a [`BindingMap`].

use tracing::{debug, trace, warn};

use crate::bits::num_bytes_for_bits;
use crate::codec::{Address, Quantity, Word};
use crate::exception::ExceptionCode;
use crate::frame::Frame;
use crate::function::FunctionCode;
use crate::map::BindingMap;
use crate::store::Store;

pub mod constants {
    pub const DEFAULT_UNIT: u8 = 1;
    pub const MAX_READ_COILS_COUNT: u16 = 0x07D0;
    pub const MAX_READ_REGISTERS_COUNT: u16 = 0x007D;
    pub const MAX_WRITE_COILS_COUNT: u16 = 0x07B0;
    pub const MAX_WRITE_REGISTERS_COUNT: u16 = 0x007B;
    pub const COIL_ON: u16 = 0xFF00;
    pub const COIL_OFF: u16 = 0x0000;
}

use constants::*;

/// Modbus slave identified by its unit address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slave {
    pub unit: u8,
    /// Answer to Read Exception Status.
    pub exception_status: u8,
}

impl Default for Slave {
    fn default() -> Self {
        Self::new(DEFAULT_UNIT)
    }
}

fn word(data: &[u8], at: usize) -> Result<Word, ExceptionCode> {
    match data.get(at..at + 2) {
        Some(bytes) => Ok(Word::from_be_bytes([bytes[0], bytes[1]])),
        None => Err(ExceptionCode::IllegalDataValue),
    }
}

fn exact(data: &[u8], length: usize) -> Result<(), ExceptionCode> {
    if data.len() != length {
        warn!(expected = length, actual = data.len(), "malformed request payload");
        return Err(ExceptionCode::IllegalDataValue);
    }
    Ok(())
}

fn quantity(data: &[u8], max: Quantity) -> Result<Quantity, ExceptionCode> {
    let quantity = word(data, 2)?;
    if quantity == 0 || quantity > max {
        warn!(quantity, max, "request quantity out of range");
        return Err(ExceptionCode::IllegalDataValue);
    }
    Ok(quantity)
}

fn full(_: crate::frame::FrameError) -> ExceptionCode {
    ExceptionCode::ServerDeviceFailure
}

impl Slave {
    pub fn new(unit: u8) -> Self {
        Self {
            unit,
            exception_status: 0,
        }
    }

    /// Process one request frame.
    ///
    /// Returns the response frame, or `None` when no reply is due: the frame
    /// is corrupt, addressed to another unit or broadcast.
    pub fn process(&self, map: &mut BindingMap<'_>, store: &mut Store, request: &[u8]) -> Option<Frame> {
        let frame = match Frame::parse(request) {
            Ok(frame) => frame,
            Err(err) => {
                warn!(%err, "dropping request frame");
                return None;
            }
        };
        if frame.unit() != self.unit && !frame.is_broadcast() {
            trace!(unit = frame.unit(), "frame addressed to another unit");
            return None;
        }

        let result = self.execute(map, store, &frame);
        if frame.is_broadcast() {
            debug!(function = frame.function(), ?result, "broadcast processed");
            return None;
        }
        let response = match result {
            Ok(response) => response,
            Err(ex) => {
                warn!(function = frame.function(), %ex, "exception response");
                let mut response = Frame::new(self.unit, frame.function() | 0x80);
                response.push(ex.into()).ok()?;
                response
            }
        };
        Some(response.seal())
    }

    fn execute(&self, map: &mut BindingMap<'_>, store: &mut Store, frame: &Frame) -> Result<Frame, ExceptionCode> {
        let function = FunctionCode::try_from(frame.function())?;
        let data = frame.data();
        debug!(%function, "processing request");

        let mut response = Frame::new(self.unit, function.get_value());
        match function {
            FunctionCode::ReadCoils | FunctionCode::ReadDiscreteInputs => {
                exact(data, 4)?;
                let start: Address = word(data, 0)?;
                let cnt = quantity(data, MAX_READ_COILS_COUNT)?;
                let packed = if function == FunctionCode::ReadCoils {
                    map.read_coils(store, start, cnt)?
                } else {
                    map.read_discrete_inputs(store, start, cnt)?
                };
                response.push(packed.len() as u8).map_err(full)?;
                response.extend(&packed).map_err(full)?;
            }
            FunctionCode::ReadHoldingRegisters | FunctionCode::ReadInputRegisters => {
                exact(data, 4)?;
                let start: Address = word(data, 0)?;
                let cnt = quantity(data, MAX_READ_REGISTERS_COUNT)?;
                let words = if function == FunctionCode::ReadHoldingRegisters {
                    map.read_holding_registers(store, start, cnt)?
                } else {
                    map.read_input_registers(store, start, cnt)?
                };
                response.push((words.len() * 2) as u8).map_err(full)?;
                for w in words {
                    response.push_word(w).map_err(full)?;
                }
            }
            FunctionCode::WriteSingleCoil => {
                exact(data, 4)?;
                let start: Address = word(data, 0)?;
                let state = match word(data, 2)? {
                    COIL_ON => true,
                    COIL_OFF => false,
                    other => {
                        warn!(value = other, "invalid single coil value");
                        return Err(ExceptionCode::IllegalDataValue);
                    }
                };
                map.write_coils(store, start, 1, &[u8::from(state)])?;
                response.extend(data).map_err(full)?;
            }
            FunctionCode::WriteSingleRegister => {
                exact(data, 4)?;
                let start: Address = word(data, 0)?;
                map.write_holding_registers(store, start, &[word(data, 2)?])?;
                response.extend(data).map_err(full)?;
            }
            FunctionCode::ReadExceptionStatus => {
                exact(data, 0)?;
                response.push(self.exception_status).map_err(full)?;
            }
            FunctionCode::WriteMultipleCoils => {
                let start: Address = word(data, 0)?;
                let cnt = quantity(data, MAX_WRITE_COILS_COUNT)?;
                let byte_count = num_bytes_for_bits(cnt);
                if data.get(4).map(|b| *b as usize) != Some(byte_count) {
                    return Err(ExceptionCode::IllegalDataValue);
                }
                exact(data, 5 + byte_count)?;
                map.write_coils(store, start, cnt, &data[5..])?;
                response.extend(&data[..4]).map_err(full)?;
            }
            FunctionCode::WriteMultipleRegisters => {
                let start: Address = word(data, 0)?;
                let cnt = quantity(data, MAX_WRITE_REGISTERS_COUNT)?;
                let byte_count = 2 * cnt as usize;
                if data.get(4).map(|b| *b as usize) != Some(byte_count) {
                    return Err(ExceptionCode::IllegalDataValue);
                }
                exact(data, 5 + byte_count)?;
                let words = (0..cnt as usize)
                    .map(|i| word(data, 5 + 2 * i))
                    .collect::<Result<Vec<_>, _>>()?;
                map.write_holding_registers(store, start, &words)?;
                response.extend(&data[..4]).map_err(full)?;
            }
        }
        Ok(response)
    }
}
