// SPDX-FileCopyrightText: Copyright (c) 2017-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Encoding of request frames and decoding of response frames.
//!
//! Frames are complete RTU ADUs: unit id, function code, payload, and a
//! trailing little-endian CRC16. Multi-byte protocol fields are
//! big-endian. The optional frame prefix some links require is *not*
//! part of a frame; it is prepended by the transport client at send time
//! and excluded from the CRC.

use byteorder::{BigEndian, ByteOrder as _};
use bytes::{BufMut as _, Bytes, BytesMut};

use crate::{
    error::{Error, Result},
    frame::{
        Address, ExceptionCode, ExceptionResponse, FunctionCode, Quantity, Request, Response,
        UnitId, WriteConfirmation,
    },
};

/// Smallest complete frame: unit id, function code, one payload byte, CRC.
const MIN_FRAME_LEN: usize = 5;

/// High bit of the function code, set in exception responses.
const EXCEPTION_BIT: u8 = 0x80;

/// Largest payload of a single write request: 123 registers, the
/// protocol limit for function code 0x10.
const MAX_WRITE_DATA_LEN: usize = 123 * 2;

/// Calculate the CRC-16 of `data` as defined by the Modbus RTU spec.
///
/// Initial value `0xFFFF`, polynomial `0xA001` (reflected), input bytes
/// processed LSB-first. The empty buffer yields `0xFFFF`.
#[must_use]
pub fn crc16(data: &[u8]) -> u16 {
    let mut crc = 0xFFFF;
    for x in data {
        crc ^= u16::from(*x);
        for _ in 0..8 {
            if (crc & 0x0001) != 0 {
                crc >>= 1;
                crc ^= 0xA001;
            } else {
                crc >>= 1;
            }
        }
    }
    crc
}

#[allow(clippy::cast_possible_truncation)]
pub(crate) fn u16_len(len: usize) -> u16 {
    // This type conversion should always be safe, because either
    // the caller is responsible to pass a valid usize or the
    // possible values are limited by the protocol.
    debug_assert!(len <= u16::MAX.into());
    len as u16
}

#[allow(clippy::cast_possible_truncation)]
pub(crate) fn u8_len(len: usize) -> u8 {
    // This type conversion should always be safe, because either
    // the caller is responsible to pass a valid usize or the
    // possible values are limited by the protocol.
    debug_assert!(len <= u8::MAX.into());
    len as u8
}

/// The expected shape of the response to an in-flight request.
///
/// Exists for the lifetime of one call. Used both to filter stray
/// notifications before decoding and to confirm write echoes afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseShape {
    /// Device the request was addressed to.
    pub unit_id: UnitId,
    /// Function code of the request.
    pub function: FunctionCode,
    /// Start address of the request.
    pub address: Address,
    /// Register count of the request.
    pub quantity: Quantity,
}

impl ResponseShape {
    /// Whether a raw notification can be the response to this request.
    ///
    /// Compares the unit id and the function code (with the exception
    /// bit masked out, so exception replies still correlate). Guards
    /// against accepting cross-talk from other units as the response.
    #[must_use]
    pub fn matches_frame(&self, raw: &[u8]) -> bool {
        raw.len() >= 2
            && raw[0] == self.unit_id
            && (raw[1] & !EXCEPTION_BIT) == self.function.value()
    }
}

/// Encode `request` for `unit_id` into a complete frame.
///
/// # Errors
///
/// Fails with [`Error::OddLength`] if a write payload does not cover
/// whole registers, or with [`Error::TooLong`] if it exceeds the 123
/// register limit of a single write request.
pub fn encode_request(unit_id: UnitId, request: &Request<'_>) -> Result<Bytes> {
    let mut buf = BytesMut::with_capacity(MIN_FRAME_LEN + 4);
    buf.put_u8(unit_id);
    buf.put_u8(request.function_code().value());
    match request {
        Request::ReadHoldingRegisters(address, quantity) => {
            buf.put_u16(*address);
            buf.put_u16(*quantity);
        }
        Request::WriteMultipleRegisters(address, data) => {
            if data.len() % 2 != 0 {
                return Err(Error::OddLength(data.len()));
            }
            if data.len() > MAX_WRITE_DATA_LEN {
                return Err(Error::TooLong(data.len()));
            }
            buf.put_u16(*address);
            buf.put_u16(u16_len(data.len() / 2));
            buf.put_u8(u8_len(data.len()));
            buf.put_slice(data);
        }
    }
    let crc = crc16(&buf);
    buf.put_u16_le(crc);
    Ok(buf.freeze())
}

/// Decode and validate a raw response frame.
///
/// Decoding is all-or-nothing: a frame that fails any check is discarded
/// entirely and never returned partially decoded. The checks run in this
/// order:
///
/// 1. minimum length,
/// 2. exception bit (before the CRC, matching device behavior on the
///    shortened exception frame),
/// 3. trailing CRC against all preceding bytes,
/// 4. per-function payload extraction; for writes with an `expected`
///    shape, the echoed fields must match the request exactly.
///
/// # Errors
///
/// [`Error::TooShort`], [`Error::Exception`], [`Error::CrcMismatch`],
/// [`Error::UnsupportedFunction`], or
/// [`Error::WriteConfirmationMismatch`].
pub fn decode_response(raw: &[u8], expected: Option<&ResponseShape>) -> Result<Response> {
    if raw.len() < MIN_FRAME_LEN {
        return Err(Error::TooShort(raw.len()));
    }
    let unit_id = raw[0];
    let function = raw[1];
    if function & EXCEPTION_BIT != 0 {
        return Err(ExceptionResponse {
            function: function & !EXCEPTION_BIT,
            exception: ExceptionCode::new(raw[2]),
        }
        .into());
    }
    let (body, crc_bytes) = raw.split_at(raw.len() - 2);
    let received = u16::from_le_bytes([crc_bytes[0], crc_bytes[1]]);
    let calculated = crc16(body);
    if calculated != received {
        return Err(Error::CrcMismatch {
            expected: calculated,
            received,
        });
    }
    match FunctionCode::from_value(function) {
        Some(FunctionCode::ReadHoldingRegisters) => {
            let byte_count = usize::from(raw[2]);
            if body.len() < 3 + byte_count {
                return Err(Error::TooShort(raw.len()));
            }
            let data = Bytes::copy_from_slice(&raw[3..3 + byte_count]);
            Ok(Response::ReadHoldingRegisters(data))
        }
        Some(FunctionCode::WriteMultipleRegisters) => {
            if body.len() < 6 {
                return Err(Error::TooShort(raw.len()));
            }
            let address = BigEndian::read_u16(&raw[2..4]);
            let quantity = BigEndian::read_u16(&raw[4..6]);
            let response = WriteConfirmation {
                unit_id,
                address,
                quantity,
            };
            if let Some(shape) = expected {
                let request = WriteConfirmation {
                    unit_id: shape.unit_id,
                    address: shape.address,
                    quantity: shape.quantity,
                };
                if shape.function != FunctionCode::WriteMultipleRegisters || request != response {
                    return Err(Error::WriteConfirmationMismatch { request, response });
                }
            }
            Ok(Response::WriteMultipleRegisters(address, quantity))
        }
        None => Err(Error::UnsupportedFunction(function)),
    }
}
