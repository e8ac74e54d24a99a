/// TCP Modbus client mirroring the battery device
use modbus_binding::core::RegisterMirror;
use modbus_binding::derive::BindingSource;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use tokio_modbus::{client::tcp::connect_slave, slave::Slave};
use tracing::info;

#[derive(Debug, Clone, Default, BindingSource)]
pub struct BatteryView {
    #[modbus(table = "input", addr = 0)]
    pub power: f32,
    #[modbus(table = "input", addr = 2)]
    pub state_of_energy: f32,
    #[modbus(table = "input", addr = 4)]
    pub voltage: f32,
    #[modbus(table = "input", addr = 6)]
    pub grid_frequency: f32,
    #[modbus(table = "holding", addr = 0)]
    pub setpoint: i32,
}

impl RegisterMirror for BatteryView {}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let socket_addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)), 5502);
    let mut client = connect_slave(socket_addr, Slave(1)).await.unwrap();

    let mut view = BatteryView {
        setpoint: 1_500,
        ..Default::default()
    };
    let written = view
        .push_holding_registers(&mut client, 0, 2)
        .await
        .unwrap()
        .unwrap();
    info!(written, "setpoint written");

    loop {
        let updated = view
            .pull_input_registers(&mut client, 0, 8)
            .await
            .unwrap()
            .unwrap();
        info!(updated, ?view, "input registers read");
        tokio::time::sleep(std::time::Duration::from_millis(200)).await;
    }
}
