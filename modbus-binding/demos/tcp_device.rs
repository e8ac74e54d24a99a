/// Battery TCP Modbus device
use modbus_binding::derive::{modbus_doc, BindingSource};
use modbus_binding::server::{spawn_tcp_server, Server};
use modbus_binding::store::Store;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use tracing::info;

#[modbus_doc]
#[derive(Debug, Clone, Default, BindingSource)]
#[modbus(words = "high_first", bytes = "be")]
struct Battery {
    #[modbus(table = "input", addr = 0)]
    power: f32,
    #[modbus(table = "input", addr = 2)]
    state_of_energy: f32,
    #[modbus(table = "input", addr = 4)]
    voltage: f32,
    #[modbus(table = "input", addr = 6)]
    grid_frequency: f32,
    #[modbus(table = "holding", addr = 0)]
    setpoint: i32,
    #[modbus(table = "coil", addr = 0)]
    running: bool,
    #[modbus(table = "discrete", addr = 0)]
    alarms: [bool; 4],
}

impl Battery {
    fn update_state(&mut self) {
        if self.running {
            self.power = self.setpoint as f32;
            self.state_of_energy -= self.power / 18_000.0;
        } else {
            self.power = 0.0;
        }
        self.alarms[0] = self.state_of_energy < 500.0;
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let battery = Battery {
        state_of_energy: 3_000.0,
        voltage: 220.0,
        grid_frequency: 50.0,
        ..Default::default()
    };
    let mut store = Store::default();
    // serial number of the device
    store.holding_registers.insert(100, [0x0bad, 0xcafe]);
    let server = Server::new(battery, store);

    let socket_addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)), 5502);
    let handle = spawn_tcp_server(socket_addr, server.clone());

    let mut interval = tokio::time::interval(std::time::Duration::from_millis(200));
    while !handle.is_finished() {
        interval.tick().await;
        let battery = server
            .with(|battery, _| {
                battery.update_state();
                battery.clone()
            })
            .unwrap();
        info!(?battery, "updated state");
    }
}
