/// Thermostat RTU Modbus device
use modbus_binding::derive::BindingSource;
use modbus_binding::fixed::Fixed;
use modbus_binding::server::{spawn_rtu_server, Server};
use modbus_binding::store::Store;
use tracing::info;

#[derive(Debug, Clone, Default, BindingSource)]
#[modbus(words = "low_first")]
struct Thermostat {
    #[modbus(table = "input", addr = 0)]
    temperature: Fixed,
    #[modbus(table = "holding", addr = 0)]
    target: Fixed,
    #[modbus(table = "holding", addr = 2)]
    hysteresis: Fixed,
    #[modbus(table = "coil", addr = 0)]
    heating: bool,
}

impl Thermostat {
    fn update_state(&mut self) {
        let (temperature, target) = (self.temperature.to_f64(), self.target.to_f64());
        let hysteresis = self.hysteresis.to_f64();
        if temperature < target - hysteresis {
            self.heating = true;
        } else if temperature > target + hysteresis {
            self.heating = false;
        }
        let drift = if self.heating { 0.25 } else { -0.125 };
        self.temperature = Fixed::from_f64(temperature + drift);
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let thermostat = Thermostat {
        temperature: Fixed::from_f64(18.0),
        target: Fixed::from_f64(21.5),
        hysteresis: Fixed::from_f64(0.5),
        heating: false,
    };
    let server = Server::new(thermostat, Store::default());

    let path = "/tmp/ttys001";
    let baud_rate = 19_200;
    let handle = spawn_rtu_server(path, baud_rate, server.clone()).unwrap();

    let mut interval = tokio::time::interval(std::time::Duration::from_secs(1));
    while !handle.is_finished() {
        interval.tick().await;
        let thermostat = server
            .with(|thermostat, _| {
                thermostat.update_state();
                thermostat.clone()
            })
            .unwrap();
        info!(?thermostat, "updated state");
    }
}
