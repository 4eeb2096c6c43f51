// SPDX-FileCopyrightText: Copyright (c) 2017-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Frame and protocol data types.

use std::{
    borrow::Cow,
    error,
    fmt::{self, Display},
};

use bytes::Bytes;

/// A single byte addressing the device behind the link.
///
/// Called *unit identifier* or *slave id* by the protocol specification.
pub type UnitId = u8;

/// A Modbus protocol address is represented by 16 bit from `0` to `65535`.
///
/// This *protocol address* uses 0-based indexing, while the *register
/// address* is often specified with 1-based indexing. Please consult the
/// specification of your devices if 1-based register addresses need to be
/// converted to 0-based protocol addresses by subtracting 1.
pub type Address = u16;

/// Number of 16 bit registers to process.
pub type Quantity = u16;

/// A Modbus function code.
///
/// Only the two codes used by this client are supported. Responses with
/// any other code fail with
/// [`Error::UnsupportedFunction`](crate::Error::UnsupportedFunction).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionCode {
    /// 03 (0x03) Read Holding Registers
    ReadHoldingRegisters,

    /// 16 (0x10) Write Multiple Registers
    WriteMultipleRegisters,
}

impl FunctionCode {
    /// Map a raw function code to a supported [`FunctionCode`].
    #[must_use]
    pub const fn from_value(value: u8) -> Option<Self> {
        match value {
            0x03 => Some(Self::ReadHoldingRegisters),
            0x10 => Some(Self::WriteMultipleRegisters),
            _ => None,
        }
    }

    /// Gets the [`u8`] value of the current [`FunctionCode`].
    #[must_use]
    pub const fn value(self) -> u8 {
        match self {
            Self::ReadHoldingRegisters => 0x03,
            Self::WriteMultipleRegisters => 0x10,
        }
    }
}

impl Display for FunctionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.value().fmt(f)
    }
}

/// A request sent from the client to the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request<'a> {
    /// A request to read multiple holding registers.
    /// The first parameter is the address of the first register to read.
    /// The second parameter is the number of registers to read.
    ReadHoldingRegisters(Address, Quantity),

    /// A request to write multiple registers.
    /// The first parameter is the address of the first register to write.
    /// The second parameter holds the register bytes to write, two bytes
    /// per register in big-endian order. The length must be even.
    WriteMultipleRegisters(Address, Cow<'a, [u8]>),
}

impl Request<'_> {
    /// Converts the request into an owned instance with `'static'` lifetime.
    #[must_use]
    pub fn into_owned(self) -> Request<'static> {
        use Request::*;

        match self {
            ReadHoldingRegisters(addr, qty) => ReadHoldingRegisters(addr, qty),
            WriteMultipleRegisters(addr, data) => {
                WriteMultipleRegisters(addr, Cow::Owned(data.into_owned()))
            }
        }
    }

    /// Get the [`FunctionCode`] of the [`Request`].
    #[must_use]
    pub const fn function_code(&self) -> FunctionCode {
        use Request::*;

        match self {
            ReadHoldingRegisters(_, _) => FunctionCode::ReadHoldingRegisters,
            WriteMultipleRegisters(_, _) => FunctionCode::WriteMultipleRegisters,
        }
    }
}

/// The data of a successfully decoded response frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Response to a `ReadHoldingRegisters` request.
    /// The parameter contains the register bytes as transmitted, without
    /// the byte-count header and without the checksum.
    ReadHoldingRegisters(Bytes),

    /// Response to a `WriteMultipleRegisters` request.
    /// The first parameter contains the echoed start address.
    /// The second parameter contains the echoed number of registers.
    WriteMultipleRegisters(Address, Quantity),
}

impl Response {
    /// Get the [`FunctionCode`] of the [`Response`].
    #[must_use]
    pub const fn function_code(&self) -> FunctionCode {
        use Response::*;

        match self {
            ReadHoldingRegisters(_) => FunctionCode::ReadHoldingRegisters,
            WriteMultipleRegisters(_, _) => FunctionCode::WriteMultipleRegisters,
        }
    }
}

/// The fields a completed write is confirmed against.
///
/// Also returned to the caller as the result of a successful write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteConfirmation {
    /// Device the registers were written to.
    pub unit_id: UnitId,
    /// Start address of the written register range.
    pub address: Address,
    /// Number of registers written.
    pub quantity: Quantity,
}

/// A device exception code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExceptionCode {
    /// 0x01
    IllegalFunction,
    /// 0x02
    IllegalDataAddress,
    /// 0x03
    IllegalDataValue,
    /// 0x04
    ServerDeviceFailure,
    /// 0x05
    Acknowledge,
    /// 0x06
    ServerDeviceBusy,
    /// 0x08
    MemoryParityError,
    /// 0x0A
    GatewayPathUnavailable,
    /// 0x0B
    GatewayTargetDevice,
    /// None of the above.
    Unknown(u8),
}

impl ExceptionCode {
    /// Create a new [`ExceptionCode`] with `value`.
    #[must_use]
    pub const fn new(value: u8) -> Self {
        use crate::frame::ExceptionCode::*;

        match value {
            0x01 => IllegalFunction,
            0x02 => IllegalDataAddress,
            0x03 => IllegalDataValue,
            0x04 => ServerDeviceFailure,
            0x05 => Acknowledge,
            0x06 => ServerDeviceBusy,
            0x08 => MemoryParityError,
            0x0A => GatewayPathUnavailable,
            0x0B => GatewayTargetDevice,
            other => Unknown(other),
        }
    }

    /// Gets the [`u8`] value of the current [`ExceptionCode`].
    #[must_use]
    pub const fn value(self) -> u8 {
        use crate::frame::ExceptionCode::*;

        match self {
            IllegalFunction => 0x01,
            IllegalDataAddress => 0x02,
            IllegalDataValue => 0x03,
            ServerDeviceFailure => 0x04,
            Acknowledge => 0x05,
            ServerDeviceBusy => 0x06,
            MemoryParityError => 0x08,
            GatewayPathUnavailable => 0x0A,
            GatewayTargetDevice => 0x0B,
            Unknown(code) => code,
        }
    }
}

impl fmt::Display for ExceptionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use crate::frame::ExceptionCode::*;

        match *self {
            IllegalFunction => f.write_str("Illegal function"),
            IllegalDataAddress => f.write_str("Illegal data address"),
            IllegalDataValue => f.write_str("Illegal data value"),
            ServerDeviceFailure => f.write_str("Server device failure"),
            Acknowledge => f.write_str("Acknowledge"),
            ServerDeviceBusy => f.write_str("Server device busy"),
            MemoryParityError => f.write_str("Memory parity error"),
            GatewayPathUnavailable => f.write_str("Gateway path unavailable"),
            GatewayTargetDevice => f.write_str("Gateway target device failed to respond"),
            Unknown(code) => write!(f, "Unknown exception (0x{code:02X})"),
        }
    }
}

impl error::Error for ExceptionCode {}

/// A device exception response.
///
/// Distinguished on the wire by the high bit of the function code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExceptionResponse {
    /// The original function code, without the exception bit.
    pub function: u8,
    /// The exception raised by the device.
    pub exception: ExceptionCode,
}

impl fmt::Display for ExceptionResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Modbus function {}: {}", self.function, self.exception)
    }
}

impl error::Error for ExceptionResponse {}
