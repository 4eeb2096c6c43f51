// SPDX-FileCopyrightText: Copyright (c) 2017-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types.

use std::io;

use thiserror::Error as ThisError;

use crate::frame::{Address, ExceptionResponse, WriteConfirmation};

/// Error type for all codec, client, and monitor operations.
///
/// Every variant is terminal for the call that raised it. Retry and
/// recovery decisions live exclusively in the
/// [`monitor`](crate::monitor) layer.
#[derive(Debug, ThisError)]
pub enum Error {
    /// Register data must cover whole 16 bit registers.
    #[error("odd register data length: {0} bytes")]
    OddLength(usize),

    /// Register data exceeds what a single request can carry.
    #[error("register data too long: {0} bytes")]
    TooLong(usize),

    /// The buffer is shorter than the smallest valid frame.
    #[error("response too short: {0} bytes")]
    TooShort(usize),

    /// The trailing checksum does not match the frame contents.
    #[error("CRC mismatch: calculated 0x{expected:04X}, received 0x{received:04X}")]
    CrcMismatch {
        /// CRC calculated over the received frame contents.
        expected: u16,
        /// CRC carried by the received frame.
        received: u16,
    },

    /// The device responded with a _Modbus_ exception.
    #[error("exception: {0}")]
    Exception(#[from] ExceptionResponse),

    /// The write echo differs from what was requested.
    ///
    /// A write only counts as successful when the device echoes the
    /// request exactly.
    #[error("write confirmation mismatch: requested {request:?}, echoed {response:?}")]
    WriteConfirmationMismatch {
        /// Fields of the original request.
        request: WriteConfirmation,
        /// Fields echoed by the device.
        response: WriteConfirmation,
    },

    /// The response carries a function code this client does not handle.
    #[error("unsupported function code 0x{0:02X}")]
    UnsupportedFunction(u8),

    /// No matching notification arrived within the configured timeout.
    #[error("request timed out")]
    Timeout,

    /// Writing the request to the transport failed.
    #[error("send failed: {0}")]
    Send(#[source] io::Error),

    /// The simulated register store holds no value at this address.
    #[error("no simulated value at register 0x{0:04X}")]
    NoSimulatedValue(Address),

    /// No client is installed for the current peer.
    #[error("no client available")]
    NoClientAvailable,
}

/// Result type for all fallible operations of this crate.
pub type Result<T> = std::result::Result<T, Error>;
