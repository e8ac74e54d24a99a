/// Raw exception code values.
pub mod codes {
    pub const ILLEGAL_FUNCTION: u8 = 0x01;
    pub const ILLEGAL_DATA_ADDRESS: u8 = 0x02;
    pub const ILLEGAL_DATA_VALUE: u8 = 0x03;
    pub const SERVER_DEVICE_FAILURE: u8 = 0x04;
    pub const ACKNOWLEDGE: u8 = 0x05;
    pub const SERVER_DEVICE_BUSY: u8 = 0x06;
    pub const NEGATIVE_ACKNOWLEDGE: u8 = 0x07;
    pub const MEMORY_PARITY_ERROR: u8 = 0x08;
    pub const GATEWAY_PATH_UNAVAILABLE: u8 = 0x0A;
    pub const GATEWAY_TARGET_DEVICE_FAILED_TO_RESPOND: u8 = 0x0B;
}

/// Status value of a request that completed normally.
pub const STATUS_OK: u8 = 0x00;

/// Outcome of a request the device refused to carry out.
///
/// Only the first three codes are raised by this crate. The others exist so
/// that any exception byte read off the wire maps to a value.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Ord, Eq)]
pub enum ExceptionCode {
    IllegalFunction,
    /// Some address of the window is neither bound nor backed by a raw cell.
    IllegalDataAddress,
    /// Quantity, byte count or coil value out of range.
    IllegalDataValue,
    ServerDeviceFailure,
    Acknowledge,
    ServerDeviceBusy,
    NegativeAcknowledge,
    MemoryParityError,
    GatewayPathUnavailable,
    GatewayTargetDeviceFailedToRespond,
    Unknown(u8),
}

const KNOWN: [(u8, ExceptionCode); 10] = [
    (codes::ILLEGAL_FUNCTION, ExceptionCode::IllegalFunction),
    (codes::ILLEGAL_DATA_ADDRESS, ExceptionCode::IllegalDataAddress),
    (codes::ILLEGAL_DATA_VALUE, ExceptionCode::IllegalDataValue),
    (codes::SERVER_DEVICE_FAILURE, ExceptionCode::ServerDeviceFailure),
    (codes::ACKNOWLEDGE, ExceptionCode::Acknowledge),
    (codes::SERVER_DEVICE_BUSY, ExceptionCode::ServerDeviceBusy),
    (codes::NEGATIVE_ACKNOWLEDGE, ExceptionCode::NegativeAcknowledge),
    (codes::MEMORY_PARITY_ERROR, ExceptionCode::MemoryParityError),
    (codes::GATEWAY_PATH_UNAVAILABLE, ExceptionCode::GatewayPathUnavailable),
    (
        codes::GATEWAY_TARGET_DEVICE_FAILED_TO_RESPOND,
        ExceptionCode::GatewayTargetDeviceFailedToRespond,
    ),
];

impl From<u8> for ExceptionCode {
    fn from(value: u8) -> Self {
        KNOWN
            .iter()
            .find(|(code, _)| *code == value)
            .map_or(ExceptionCode::Unknown(value), |(_, ex)| *ex)
    }
}

impl From<ExceptionCode> for u8 {
    fn from(ex: ExceptionCode) -> Self {
        match ex {
            ExceptionCode::Unknown(value) => value,
            known => KNOWN
                .iter()
                .find(|(_, ex)| *ex == known)
                .map_or(codes::SERVER_DEVICE_FAILURE, |(code, _)| *code),
        }
    }
}

impl From<ExceptionCode> for tokio_modbus::ExceptionCode {
    fn from(ex: ExceptionCode) -> Self {
        match ex {
            ExceptionCode::IllegalFunction => Self::IllegalFunction,
            ExceptionCode::IllegalDataAddress => Self::IllegalDataAddress,
            ExceptionCode::IllegalDataValue => Self::IllegalDataValue,
            ExceptionCode::ServerDeviceFailure => Self::ServerDeviceFailure,
            other => Self::Custom(other.into()),
        }
    }
}

/// Status byte of an access result: `STATUS_OK` or the exception code.
pub fn status<T>(result: &Result<T, ExceptionCode>) -> u8 {
    match result {
        Ok(_) => STATUS_OK,
        Err(ex) => (*ex).into(),
    }
}

impl std::error::Error for ExceptionCode {}

impl std::fmt::Display for ExceptionCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            ExceptionCode::IllegalFunction => "illegal function",
            ExceptionCode::IllegalDataAddress => "illegal data address",
            ExceptionCode::IllegalDataValue => "illegal data value",
            ExceptionCode::ServerDeviceFailure => "server device failure",
            ExceptionCode::Acknowledge => "acknowledge",
            ExceptionCode::ServerDeviceBusy => "server device busy",
            ExceptionCode::NegativeAcknowledge => "negative acknowledge",
            ExceptionCode::MemoryParityError => "memory parity error",
            ExceptionCode::GatewayPathUnavailable => "gateway path unavailable",
            ExceptionCode::GatewayTargetDeviceFailedToRespond => "gateway target device failed to respond",
            ExceptionCode::Unknown(code) => return write!(f, "unknown exception 0x{code:02X}"),
        };
        write!(f, "{text} (0x{:02X})", u8::from(*self))
    }
}
