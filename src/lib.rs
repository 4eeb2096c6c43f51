// SPDX-FileCopyrightText: Copyright (c) 2017-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A pure [Rust](https://www.rust-lang.org)
//! [Modbus](https://en.wikipedia.org/wiki/Modbus) RTU client
//! based on [tokio](https://tokio.rs) for notification-based transports.
//!
//! Some links, typically BLE GATT bridges, carry Modbus RTU frames over a
//! half-duplex channel where the response arrives as an asynchronous push
//! notification instead of as a read on the request stream. This crate
//! implements the client side of that arrangement:
//!
//! - frame construction and validation (CRC16, exception decoding,
//!   write-echo confirmation) for function codes 0x03 and 0x10,
//! - request/response correlation with at most one request in flight per
//!   client, raced against a configurable timeout,
//! - decoding of multi-register values into decimal or hex strings,
//!   using arbitrary precision beyond the native integer range,
//! - a drop-in simulated client for development without hardware,
//! - a polling policy that escalates repeated read failures into a
//!   disconnect and a recovery hand-off.
//!
//! Service discovery on the peer and radio enablement are out of scope;
//! the transport is consumed through the
//! [`NotificationTransport`] capability trait.
//!
//! ## Installation
//!
//! Add this to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! modbus-notify = "*"
//! ```

pub mod client;

mod codec;

mod error;

mod frame;

pub mod monitor;

pub mod prelude;

mod transport;

pub mod value;

pub use crate::{
    codec::{crc16, decode_response, encode_request, ResponseShape},
    error::{Error, Result},
    frame::{
        Address, ExceptionCode, ExceptionResponse, FunctionCode, Quantity, Request, Response,
        UnitId, WriteConfirmation,
    },
    transport::{EndpointId, LinkConfig, NotificationTransport, Subscription},
};
