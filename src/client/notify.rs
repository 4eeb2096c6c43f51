// SPDX-FileCopyrightText: Copyright (c) 2017-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Modbus RTU client for notification-based links.

use std::{borrow::Cow, io};

use async_trait::async_trait;
use bytes::{BufMut as _, Bytes, BytesMut};
use tokio::{
    sync::Mutex,
    time::{sleep, timeout_at, Instant},
};

use crate::{
    codec::{self, ResponseShape},
    frame::{Address, FunctionCode, Quantity, Request, Response, UnitId, WriteConfirmation},
    transport::{LinkConfig, NotificationTransport},
    value, Error, Result,
};

use super::{Client, RegisterReading};

/// Modbus RTU client for half-duplex links that deliver responses as
/// push notifications.
///
/// The client owns one connected transport handle. Requests are
/// serialized through an internal mutex: at most one request is in
/// flight at any time, and concurrent callers complete in the order
/// they acquired the mutex.
#[derive(Debug)]
pub struct NotifyClient<T> {
    transport: T,
    config: LinkConfig,
    /// Guards the whole exchange from pre-send delay to response.
    exchange: Mutex<()>,
}

impl<T> NotifyClient<T>
where
    T: NotificationTransport,
{
    /// Create a client for a connected peer.
    pub fn new(transport: T, config: LinkConfig) -> Self {
        Self {
            transport,
            config,
            exchange: Mutex::new(()),
        }
    }

    /// Perform one raw request/response exchange.
    ///
    /// Arms the configured timeout and subscribes to the read endpoint
    /// before writing so the response cannot be missed, then races the
    /// deadline against incoming notifications. The same deadline bounds
    /// the write itself. Notifications that do not correlate with
    /// the pending request (wrong unit id or function code) are logged
    /// and skipped. The subscription is dropped on every exit path,
    /// which unsubscribes from the transport.
    async fn send_frame(&self, frame: &[u8], shape: &ResponseShape) -> Result<Bytes> {
        let _exchange = self.exchange.lock().await;

        if !self.config.use_notifications {
            return Err(Error::Send(io::Error::new(
                io::ErrorKind::Unsupported,
                "transports without notifications are not yet supported",
            )));
        }

        if !self.config.pre_send_delay.is_zero() {
            sleep(self.config.pre_send_delay).await;
        }

        // The deadline covers the write as well: a wedged transport must
        // not hold the exchange mutex forever.
        let deadline = Instant::now() + self.config.response_timeout;

        let mut subscription = self
            .transport
            .subscribe(&self.config.read_endpoint)
            .await
            .map_err(Error::Send)?;

        let wire = match self.config.frame_prefix {
            Some(prefix) => {
                let mut buf = BytesMut::with_capacity(frame.len() + 1);
                buf.put_u8(prefix);
                buf.put_slice(frame);
                buf.freeze()
            }
            None => Bytes::copy_from_slice(frame),
        };
        log::debug!(
            "sending {} bytes to endpoint {}",
            wire.len(),
            self.config.write_endpoint
        );
        timeout_at(deadline, self.transport.write(&self.config.write_endpoint, &wire))
            .await
            .map_err(|_elapsed| Error::Timeout)?
            .map_err(Error::Send)?;

        loop {
            match timeout_at(deadline, subscription.next()).await {
                Err(_) => return Err(Error::Timeout),
                Ok(None) => {
                    return Err(Error::Send(io::Error::from(io::ErrorKind::BrokenPipe)));
                }
                Ok(Some(raw)) => {
                    if shape.matches_frame(&raw) {
                        return Ok(raw);
                    }
                    log::debug!(
                        "ignoring stray notification ({} bytes) while waiting for unit 0x{:02X}",
                        raw.len(),
                        shape.unit_id
                    );
                }
            }
        }
    }
}

#[async_trait]
impl<T> Client for NotifyClient<T>
where
    T: NotificationTransport,
{
    async fn read_holding_registers(
        &self,
        unit_id: UnitId,
        address: Address,
        quantity: Quantity,
        as_hex: bool,
    ) -> Result<RegisterReading> {
        let request = Request::ReadHoldingRegisters(address, quantity);
        let shape = ResponseShape {
            unit_id,
            function: FunctionCode::ReadHoldingRegisters,
            address,
            quantity,
        };
        let frame = codec::encode_request(unit_id, &request)?;
        let raw = self.send_frame(&frame, &shape).await?;
        match codec::decode_response(&raw, Some(&shape))? {
            Response::ReadHoldingRegisters(data) => {
                let value = value::registers_to_string(&data, as_hex)?;
                Ok(RegisterReading {
                    unit_id,
                    address,
                    raw: data,
                    value,
                })
            }
            Response::WriteMultipleRegisters(..) => {
                unreachable!("send_frame() rejects mismatching responses")
            }
        }
    }

    async fn write_multiple_registers(
        &self,
        unit_id: UnitId,
        address: Address,
        value: &str,
    ) -> Result<WriteConfirmation> {
        let data = value::string_to_registers(value);
        let quantity = codec::u16_len(data.len() / 2);
        let request = Request::WriteMultipleRegisters(address, Cow::Borrowed(&data));
        let shape = ResponseShape {
            unit_id,
            function: FunctionCode::WriteMultipleRegisters,
            address,
            quantity,
        };
        let frame = codec::encode_request(unit_id, &request)?;
        let raw = self.send_frame(&frame, &shape).await?;
        match codec::decode_response(&raw, Some(&shape))? {
            Response::WriteMultipleRegisters(rsp_address, rsp_quantity) => Ok(WriteConfirmation {
                unit_id,
                address: rsp_address,
                quantity: rsp_quantity,
            }),
            Response::ReadHoldingRegisters(_) => {
                unreachable!("send_frame() rejects mismatching responses")
            }
        }
    }

    async fn disconnect(&self) -> io::Result<()> {
        self.transport.disconnect().await
    }
}
