use async_trait::async_trait;
use tokio_modbus::client::{Reader, Writer};
use tracing::debug;

use crate::codec::{Address, Quantity, Word};
use crate::error::Error;
use crate::exception::ExceptionCode;
use crate::map::BindingMap;

/// Type whose fields can be bound to Modbus addresses.
///
/// The returned map borrows `self`, so the bindings always reflect the
/// current field values and are dropped before the fields are used again.
pub trait BindingSource {
    fn bind(&mut self) -> Result<BindingMap<'_>, Error>;
}

fn transport(err: Error) -> tokio_modbus::Error {
    tokio_modbus::Error::Transport(std::io::Error::new(std::io::ErrorKind::InvalidInput, err))
}

fn reply(result: Result<usize, ExceptionCode>) -> tokio_modbus::Result<usize> {
    Ok(result.map_err(tokio_modbus::ExceptionCode::from))
}

fn access_holding<S: BindingSource + ?Sized>(
    source: &mut S,
    start: Address,
    words: &[Word],
) -> tokio_modbus::Result<usize> {
    let mut map = source.bind().map_err(transport)?;
    reply(map.access_holding_registers(start, words))
}

fn access_input<S: BindingSource + ?Sized>(
    source: &mut S,
    start: Address,
    words: &[Word],
) -> tokio_modbus::Result<usize> {
    let mut map = source.bind().map_err(transport)?;
    reply(map.access_input_registers(start, words))
}

fn assign_holding<S: BindingSource + ?Sized>(
    source: &mut S,
    start: Address,
    cnt: Quantity,
) -> Result<(Vec<Word>, Result<usize, ExceptionCode>), Error> {
    let map = source.bind()?;
    let mut words = vec![0; cnt.into()];
    let count = map
        .check_whole_holding_registers(start, cnt)
        .and_then(|()| map.assign_holding_registers(start, &mut words));
    Ok((words, count))
}

#[async_trait]
/// Keep bound fields in sync with the registers of a remote device.
///
/// Only whole bound values inside the requested window are transferred.
pub trait RegisterMirror: BindingSource + Send {
    /// Read holding registers and store them into the bound fields.
    ///
    /// Returns the number of bound entries updated.
    async fn pull_holding_registers(
        &mut self,
        client: &mut dyn Reader,
        start: Address,
        cnt: Quantity,
    ) -> tokio_modbus::Result<usize> {
        let words = match client.read_holding_registers(start, cnt).await? {
            Ok(words) => words,
            Err(ex) => return Ok(Err(ex)),
        };
        debug!(start, cnt, "pulled holding registers");
        access_holding(self, start, &words)
    }

    async fn pull_input_registers(
        &mut self,
        client: &mut dyn Reader,
        start: Address,
        cnt: Quantity,
    ) -> tokio_modbus::Result<usize> {
        let words = match client.read_input_registers(start, cnt).await? {
            Ok(words) => words,
            Err(ex) => return Ok(Err(ex)),
        };
        debug!(start, cnt, "pulled input registers");
        access_input(self, start, &words)
    }

    /// Write the bound fields inside the window to holding registers.
    ///
    /// Unbound addresses in the window are written as zero. A window that
    /// takes only part of a bound value is refused with `IllegalDataAddress`
    /// and nothing is sent.
    async fn push_holding_registers(
        &mut self,
        client: &mut dyn Writer,
        start: Address,
        cnt: Quantity,
    ) -> tokio_modbus::Result<usize> {
        let (words, count) = assign_holding(self, start, cnt).map_err(transport)?;
        let count = match count {
            Ok(count) => count,
            Err(ex) => return Ok(Err(ex.into())),
        };
        if let Err(ex) = client.write_multiple_registers(start, &words).await? {
            return Ok(Err(ex));
        }
        debug!(start, cnt, count, "pushed holding registers");
        Ok(Ok(count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::Binding;
    use std::cell::Cell;

    #[derive(Default)]
    struct Meter {
        voltage: f32,
        serial: [u16; 2],
    }

    impl BindingSource for Meter {
        fn bind(&mut self) -> Result<BindingMap<'_>, Error> {
            let mut map = BindingMap::default();
            let mut voltage = Binding::with_width(0)?;
            voltage.push(Cell::from_mut(&mut self.voltage))?;
            map.bind_holding_registers(voltage)?;

            let serial = Cell::from_mut(&mut self.serial[..]).as_slice_of_cells();
            map.bind_input_registers(Binding::from_cells(10, 1, serial)?)?;
            Ok(map)
        }
    }

    #[test]
    fn test_local_transfers() {
        let mut meter = Meter::default();
        assert_eq!(
            access_holding(&mut meter, 0, &[0x4366, 0x0000]).unwrap(),
            Ok(1)
        );
        assert_eq!(meter.voltage, 230.0);

        assert_eq!(access_input(&mut meter, 9, &[1, 2, 3]).unwrap(), Ok(2));
        assert_eq!(meter.serial, [2, 3]);

        let (words, count) = assign_holding(&mut meter, 0, 3).unwrap();
        assert_eq!(words, vec![0x4366, 0x0000, 0x0000]);
        assert_eq!(count, Ok(1));
    }

    #[test]
    fn test_push_window_cutting_a_value() {
        let mut meter = Meter {
            voltage: 230.0,
            ..Default::default()
        };
        for (start, cnt) in [(0, 1), (1, 2)] {
            let (_, count) = assign_holding(&mut meter, start, cnt).unwrap();
            assert_eq!(count, Err(ExceptionCode::IllegalDataAddress));
        }
        let (words, count) = assign_holding(&mut meter, 2, 2).unwrap();
        assert_eq!((words, count), (vec![0, 0], Ok(0)));
    }
}
