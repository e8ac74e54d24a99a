use std::{
    net::SocketAddr,
    sync::{Arc, Mutex},
};

use futures::future;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_modbus::{server, Request, Response};
use tracing::{error, info};

use crate::core::BindingSource;
use crate::exception::ExceptionCode;
use crate::store::Store;

#[derive(Debug)]
struct Shared<D> {
    device: D,
    store: Store,
}

/// Modbus server exposing the bindings of a device, backed by raw cells
/// for the addresses the device does not bind.
///
/// Requests are processed one at a time under the device lock.
#[derive(Debug)]
pub struct Server<D>(Arc<Mutex<Shared<D>>>);

impl<D> Clone for Server<D> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<D: BindingSource> Server<D> {
    pub fn new(device: D, store: Store) -> Self {
        Self(Arc::new(Mutex::new(Shared { device, store })))
    }

    /// Run `f` with exclusive access to the device and its raw cells.
    pub fn with<R>(&self, f: impl FnOnce(&mut D, &mut Store) -> R) -> Result<R, ExceptionCode> {
        let mut shared = self.0.lock().map_err(|_| {
            error!("device lock poisoned");
            ExceptionCode::ServerDeviceFailure
        })?;
        let Shared { device, store } = &mut *shared;
        Ok(f(device, store))
    }

    /// Serve one request against freshly bound device fields.
    pub fn process(&self, req: Request<'_>) -> Result<Response, ExceptionCode> {
        self.with(|device, store| {
            let mut map = device.bind().map_err(|err| {
                error!(%err, "failed to bind device");
                ExceptionCode::ServerDeviceFailure
            })?;
            map.call(store, req)
        })?
    }
}

impl<D: BindingSource> tokio_modbus::server::Service for Server<D> {
    type Request = Request<'static>;
    type Response = Response;
    type Exception = tokio_modbus::ExceptionCode;
    type Future = future::Ready<Result<Self::Response, Self::Exception>>;

    fn call(&self, req: Self::Request) -> Self::Future {
        future::ready(self.process(req).map_err(Into::into))
    }
}

/// Serve Modbus TCP connections accepted on `listener` until an I/O error occurs.
pub async fn serve_tcp<D>(listener: TcpListener, device_server: Server<D>) -> std::io::Result<()>
where
    D: BindingSource + Send + 'static,
{
    let server = server::tcp::Server::new(listener);
    let new_service = |_socket_addr| Ok(Some(device_server.clone()));
    let on_connected = |stream, socket_addr| async move {
        server::tcp::accept_tcp_connection(stream, socket_addr, new_service)
    };
    let on_process_error = |err| {
        error!(%err, "failed to process request");
    };
    server.serve(&on_connected, on_process_error).await?;
    Ok(())
}

/// Utility function to spawn a TCP server running forever.
pub fn spawn_tcp_server<D>(socket_addr: SocketAddr, device_server: Server<D>) -> JoinHandle<()>
where
    D: BindingSource + Send + 'static,
{
    tokio::spawn(async move {
        let listener = match TcpListener::bind(socket_addr).await {
            Ok(listener) => listener,
            Err(err) => {
                error!(%err, %socket_addr, "failed to bind TCP listener");
                return;
            }
        };
        info!(%socket_addr, "serving Modbus TCP");
        if let Err(err) = serve_tcp(listener, device_server).await {
            error!(%err, "TCP server stopped");
        }
    })
}

/// Utility function to spawn an RTU server running forever.
#[cfg(feature = "serial")]
pub fn spawn_rtu_server<D>(
    path: &str,
    baud_rate: u32,
    device_server: Server<D>,
) -> Result<JoinHandle<()>, tokio_serial::Error>
where
    D: BindingSource + Send + 'static,
{
    let builder = tokio_serial::new(path, baud_rate);
    let serial_stream = tokio_serial::SerialStream::open(&builder)?;
    let server = server::rtu::Server::new(serial_stream);
    info!(path, baud_rate, "serving Modbus RTU");

    Ok(tokio::spawn(async move {
        if let Err(err) = server.serve_forever(device_server).await {
            error!(%err, "RTU server stopped");
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::Binding;
    use crate::error::Error;
    use crate::map::BindingMap;
    use std::cell::Cell;

    #[derive(Debug, Default)]
    struct Thermostat {
        target: i16,
        heating: bool,
    }

    impl BindingSource for Thermostat {
        fn bind(&mut self) -> Result<BindingMap<'_>, Error> {
            let mut map = BindingMap::default();
            let mut target = Binding::with_width(0)?;
            target.push(Cell::from_mut(&mut self.target))?;
            map.bind_holding_registers(target)?;
            let mut heating = Binding::with_width(0)?;
            heating.push(Cell::from_mut(&mut self.heating))?;
            map.bind_coils(heating)?;
            Ok(map)
        }
    }

    #[test]
    fn test_process() {
        let server = Server::new(Thermostat::default(), Store::default());
        assert_eq!(
            server.process(Request::WriteSingleRegister(0, 215)),
            Ok(Response::WriteSingleRegister(0, 215))
        );
        assert_eq!(
            server.process(Request::ReadHoldingRegisters(0, 2)),
            Err(ExceptionCode::IllegalDataAddress)
        );
        server.with(|device, _| device.heating = true).unwrap();
        assert_eq!(
            server.process(Request::ReadCoils(0, 1)),
            Ok(Response::ReadCoils(vec![true]))
        );
        assert_eq!(server.with(|device, _| device.target).unwrap(), 215);
    }
}
