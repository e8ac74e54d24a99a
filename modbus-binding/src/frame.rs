//! Modbus RTU application data units.

use thiserror::Error;

use crate::codec::Word;

pub mod constants {
    pub const MAX_FRAME_LENGTH: usize = 256;
    pub const UNIT_OFFSET: usize = 0;
    pub const FUNCTION_OFFSET: usize = 1;
    pub const DATA_OFFSET: usize = 2;
    pub const CRC_LENGTH: usize = 2;
    /// Unit, function code and CRC.
    pub const MIN_FRAME_LENGTH: usize = DATA_OFFSET + CRC_LENGTH;
    pub const BROADCAST_UNIT: u8 = 0;
}

use constants::*;

// table computed at compile time
const CRC: crc::Crc<u16> = crc::Crc::<u16>::new(&crc::CRC_16_MODBUS);

/// CRC-16/MODBUS of `bytes`. The value goes on the wire low byte first.
pub fn crc16(bytes: &[u8]) -> u16 {
    CRC.checksum(bytes)
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameError {
    #[error("frame of {0} bytes is shorter than the minimum of {min}", min = MIN_FRAME_LENGTH)]
    TooShort(usize),
    #[error("frame of {0} bytes exceeds the maximum of {max}", max = MAX_FRAME_LENGTH)]
    TooLong(usize),
    #[error("received CRC {received:#06X} does not match the computed {expected:#06X}")]
    Crc { received: u16, expected: u16 },
}

/// Fixed capacity RTU frame: unit, function code, payload and trailing CRC.
#[derive(Clone)]
pub struct Frame {
    buffer: [u8; MAX_FRAME_LENGTH],
    length: usize,
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("bytes", &self.as_bytes())
            .finish()
    }
}

impl PartialEq for Frame {
    fn eq(&self, other: &Self) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl Eq for Frame {}

impl Frame {
    /// Start a frame holding the unit address and function code.
    pub fn new(unit: u8, function: u8) -> Self {
        let mut buffer = [0; MAX_FRAME_LENGTH];
        buffer[UNIT_OFFSET] = unit;
        buffer[FUNCTION_OFFSET] = function;
        Self {
            buffer,
            length: DATA_OFFSET,
        }
    }

    /// Validate length and CRC of received bytes.
    pub fn parse(bytes: &[u8]) -> Result<Self, FrameError> {
        if bytes.len() < MIN_FRAME_LENGTH {
            return Err(FrameError::TooShort(bytes.len()));
        }
        if bytes.len() > MAX_FRAME_LENGTH {
            return Err(FrameError::TooLong(bytes.len()));
        }
        let (body, tail) = bytes.split_at(bytes.len() - CRC_LENGTH);
        let received = u16::from_le_bytes([tail[0], tail[1]]);
        let expected = crc16(body);
        if received != expected {
            return Err(FrameError::Crc { received, expected });
        }

        let mut buffer = [0; MAX_FRAME_LENGTH];
        buffer[..bytes.len()].copy_from_slice(bytes);
        Ok(Self {
            buffer,
            length: bytes.len(),
        })
    }

    pub fn unit(&self) -> u8 {
        self.buffer[UNIT_OFFSET]
    }

    pub fn function(&self) -> u8 {
        self.buffer[FUNCTION_OFFSET]
    }

    pub fn is_broadcast(&self) -> bool {
        self.unit() == BROADCAST_UNIT
    }

    /// Payload between the function code and the CRC of a sealed frame.
    pub fn data(&self) -> &[u8] {
        let end = self.length.saturating_sub(CRC_LENGTH).max(DATA_OFFSET);
        &self.buffer[DATA_OFFSET..end]
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer[..self.length]
    }

    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Append payload bytes, keeping room for the CRC.
    pub fn extend(&mut self, bytes: &[u8]) -> Result<(), FrameError> {
        let end = self.length + bytes.len();
        if end + CRC_LENGTH > MAX_FRAME_LENGTH {
            return Err(FrameError::TooLong(end + CRC_LENGTH));
        }
        self.buffer[self.length..end].copy_from_slice(bytes);
        self.length = end;
        Ok(())
    }

    pub fn push(&mut self, byte: u8) -> Result<(), FrameError> {
        self.extend(&[byte])
    }

    /// Append a big-endian word.
    pub fn push_word(&mut self, word: Word) -> Result<(), FrameError> {
        self.extend(&word.to_be_bytes())
    }

    /// Append the CRC of everything written so far.
    pub fn seal(mut self) -> Self {
        let crc = crc16(&self.buffer[..self.length]).to_le_bytes();
        self.buffer[self.length..self.length + CRC_LENGTH].copy_from_slice(&crc);
        self.length += CRC_LENGTH;
        self
    }
}
