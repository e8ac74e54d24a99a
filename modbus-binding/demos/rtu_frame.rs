/// RTU frame processing without use of macros
use modbus_binding::binding::Binding;
use modbus_binding::frame::Frame;
use modbus_binding::map::BindingMap;
use modbus_binding::slave::Slave;
use modbus_binding::store::Store;
use std::cell::Cell;
use tracing::info;

fn request(unit: u8, function: u8, payload: &[u8]) -> Vec<u8> {
    let mut frame = Frame::new(unit, function);
    frame.extend(payload).unwrap();
    frame.seal().as_bytes().to_vec()
}

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .init();

    let mut outputs = [false; 8];
    let mut counters = [0u32; 4];
    let mut store = Store::default();
    store.input_registers.insert(8, [0xffff]);

    let slave = Slave {
        unit: 1,
        exception_status: 0x00,
    };
    let requests = [
        // write outputs 0..8 as 0b1010_0101
        request(1, 0x0f, &[0x00, 0x00, 0x00, 0x08, 0x01, 0xa5]),
        request(1, 0x01, &[0x00, 0x00, 0x00, 0x08]),
        // counter 1 = 0x00010002
        request(1, 0x10, &[0x00, 0x02, 0x00, 0x02, 0x04, 0x00, 0x01, 0x00, 0x02]),
        // half of counter 2 is acknowledged but never applied
        request(1, 0x06, &[0x00, 0x04, 0x00, 0x07]),
        request(1, 0x03, &[0x00, 0x00, 0x00, 0x08]),
        // address 0x0008 is not bound
        request(1, 0x03, &[0x00, 0x00, 0x00, 0x09]),
        request(1, 0x04, &[0x00, 0x08, 0x00, 0x01]),
        request(1, 0x07, &[]),
    ];

    for bytes in &requests {
        let response = {
            let mut map = BindingMap::default();
            let coils = Cell::from_mut(&mut outputs[..]).as_slice_of_cells();
            map.bind_coils(Binding::from_cells(0, 1, coils).unwrap())
                .unwrap();
            let registers = Cell::from_mut(&mut counters[..]).as_slice_of_cells();
            map.bind_holding_registers(Binding::from_cells(0, 2, registers).unwrap())
                .unwrap();

            slave.process(&mut map, &mut store, bytes)
        };
        info!(request = ?bytes, response = ?response.as_ref().map(Frame::as_bytes), "processed");
    }
    info!(?outputs, ?counters, "final state");
}
